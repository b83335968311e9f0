//! Strobe-driven bit-vector memories.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use crate::common::bits::Bits;
use crate::common::error::MemoryError;
use crate::signal::clock::Clock;
use crate::signal::{Net, Node, PortId};

/// Per-strobe completion delay, counted in clock ticks.
///
/// Counters idle at `delay + 1`. Asserting the strobe while idle arms the
/// counter at zero; deasserting it disarms. Each tick advances an armed
/// counter, and the access completes on the tick where it lands on the delay.
/// Re-asserts while counting are absorbed.
#[derive(Debug)]
struct DelayLine {
    delay_read: usize,
    delay_write: usize,
    counter_read: usize,
    counter_write: usize,
}

/// A word-addressed memory driven by read/write strobe ports.
///
/// Built immediate ([`Memory::attach`]) the access happens inside the strobe
/// notification; built delayed ([`Memory::attach_delayed`]) the strobe only
/// arms a counter and the access completes a fixed number of clock ticks
/// later, reading whatever the address and data ports hold at completion
/// time. Either strobe may be absent for read-only or write-only wiring.
pub struct Memory {
    name: &'static str,
    cells: Vec<Bits>,
    cell_width: usize,
    address: PortId,
    data_in: Option<PortId>,
    read_strobe: Option<PortId>,
    write_strobe: Option<PortId>,
    tick: Option<PortId>,
    out: PortId,
    delay: Option<DelayLine>,
}

impl Memory {
    /// Creates a memory whose accesses complete inside the strobe
    /// notification.
    #[allow(clippy::too_many_arguments)]
    pub fn attach(
        net: &mut Net,
        cells: usize,
        cell_width: usize,
        address: PortId,
        data_in: Option<PortId>,
        read_strobe: Option<PortId>,
        write_strobe: Option<PortId>,
        name: &'static str,
    ) -> Rc<RefCell<Self>> {
        Self::build(
            net,
            cells,
            cell_width,
            address,
            data_in,
            read_strobe,
            write_strobe,
            None,
            None,
            name,
        )
    }

    /// Creates a memory whose accesses complete `delay_read` / `delay_write`
    /// clock ticks after the strobe arms them.
    #[allow(clippy::too_many_arguments)]
    pub fn attach_delayed(
        net: &mut Net,
        clock: &Clock,
        cells: usize,
        cell_width: usize,
        delay_read: usize,
        delay_write: usize,
        address: PortId,
        data_in: Option<PortId>,
        read_strobe: Option<PortId>,
        write_strobe: Option<PortId>,
        name: &'static str,
    ) -> Rc<RefCell<Self>> {
        let delay = DelayLine {
            delay_read,
            delay_write,
            counter_read: delay_read + 1,
            counter_write: delay_write + 1,
        };
        Self::build(
            net,
            cells,
            cell_width,
            address,
            data_in,
            read_strobe,
            write_strobe,
            Some(clock.tick()),
            Some(delay),
            name,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn build(
        net: &mut Net,
        cells: usize,
        cell_width: usize,
        address: PortId,
        data_in: Option<PortId>,
        read_strobe: Option<PortId>,
        write_strobe: Option<PortId>,
        tick: Option<PortId>,
        delay: Option<DelayLine>,
        name: &'static str,
    ) -> Rc<RefCell<Self>> {
        let out = net.add_port(cell_width);
        let memory = Rc::new(RefCell::new(Self {
            name,
            cells: vec![Bits::new(cell_width); cells],
            cell_width,
            address,
            data_in,
            read_strobe,
            write_strobe,
            tick,
            out,
            delay,
        }));
        let id = net.add_node(memory.clone());
        if let Some(strobe) = read_strobe {
            net.subscribe(strobe, id);
        }
        if let Some(strobe) = write_strobe {
            net.subscribe(strobe, id);
        }
        if let Some(tick) = tick {
            net.subscribe(tick, id);
        }
        memory
    }

    /// The port carrying the most recently read cell.
    pub fn out(&self) -> PortId {
        self.out
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the memory has zero cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Reads a cell directly, bypassing the strobe protocol.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::AddressOutOfRange`] if `index` is past the end;
    /// addresses never wrap.
    pub fn cell(&self, index: usize) -> Result<&Bits, MemoryError> {
        self.cells.get(index).ok_or(MemoryError::AddressOutOfRange {
            address: index,
            cells: self.cells.len(),
        })
    }

    /// Writes a cell directly, width-adapting the value.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::AddressOutOfRange`] if `index` is past the end.
    pub fn set_cell(&mut self, index: usize, value: &Bits) -> Result<(), MemoryError> {
        if index >= self.cells.len() {
            return Err(MemoryError::AddressOutOfRange {
                address: index,
                cells: self.cells.len(),
            });
        }
        self.cells[index] = value.resized(self.cell_width);
        debug!(memory = self.name, cell = index, value = %self.cells[index], "cell write");
        Ok(())
    }

    /// Clears every cell to all-zero.
    pub fn reset(&mut self) {
        for cell in &mut self.cells {
            cell.set_all(false);
        }
    }

    fn complete_read(&self, net: &Net) {
        let address = net.value(self.address).to_index();
        net.set(self.out, &self.cells[address]);
    }

    fn complete_write(&mut self, net: &Net) {
        let Some(data_in) = self.data_in else { return };
        let address = net.value(self.address).to_index();
        let value = net.value(data_in).resized(self.cell_width);
        debug!(memory = self.name, cell = address, value = %value, "cell write");
        self.cells[address] = value;
    }

    fn on_read_strobe(&mut self, net: &Net) {
        let Some(strobe) = self.read_strobe else { return };
        let asserted = net.value(strobe).all_set();
        match &mut self.delay {
            None => {
                if asserted {
                    self.complete_read(net);
                }
            }
            Some(line) => {
                if !asserted {
                    line.counter_read = line.delay_read + 1;
                    return;
                }
                if line.counter_read < line.delay_read {
                    return;
                }
                line.counter_read = 0;
            }
        }
    }

    fn on_write_strobe(&mut self, net: &Net) {
        let Some(strobe) = self.write_strobe else { return };
        let asserted = net.value(strobe).all_set();
        match &mut self.delay {
            None => {
                if asserted {
                    self.complete_write(net);
                }
            }
            Some(line) => {
                if !asserted {
                    line.counter_write = line.delay_write + 1;
                    return;
                }
                if line.counter_write < line.delay_write {
                    return;
                }
                line.counter_write = 0;
            }
        }
    }

    fn on_tick(&mut self, net: &Net) {
        let (read_due, write_due) = {
            let Some(line) = &mut self.delay else { return };
            if line.counter_read <= line.delay_read {
                line.counter_read += 1;
            }
            if line.counter_write <= line.delay_write {
                line.counter_write += 1;
            }
            (
                line.counter_read == line.delay_read,
                line.counter_write == line.delay_write,
            )
        };
        if read_due {
            self.complete_read(net);
        }
        if write_due {
            self.complete_write(net);
        }
    }
}

impl Node for Memory {
    fn on_signal(&mut self, net: &Net, origin: PortId) {
        if Some(origin) == self.read_strobe {
            self.on_read_strobe(net);
        } else if Some(origin) == self.write_strobe {
            self.on_write_strobe(net);
        } else if Some(origin) == self.tick {
            self.on_tick(net);
        }
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memory")
            .field("name", &self.name)
            .field("cells", &self.cells.len())
            .field("cell_width", &self.cell_width)
            .finish()
    }
}
