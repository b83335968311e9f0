//! The multi-phase clock and tick-delayed taps.
//!
//! The clock owns one 1-bit port per phase plus a shared tick line:
//! 1. **Phase ports:** Exactly one is high at a time; a step lowers the active
//!    phase and raises the next.
//! 2. **Tick line:** Toggled between lowering and raising, so per-tick
//!    bookkeeping (memory delays, taps) observes the step while no phase is
//!    high.
//! 3. **Delayed taps:** [`DelayedTap`] republishes a source port a fixed
//!    number of ticks after it arms.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::trace;

use crate::common::bits::Bits;
use crate::signal::{Net, Node, NodeId, PortId};

/// A cyclic n-phase clock.
///
/// After construction (and after [`Clock::reset`]) no phase is active; the
/// first [`Clock::step`] raises phase 0 without firing the tick line, so
/// components that count ticks do not observe a partial cycle.
#[derive(Debug)]
pub struct Clock {
    phases: Vec<PortId>,
    tick: PortId,
    current: Option<usize>,
}

impl Clock {
    /// Creates a clock with `phases` phase ports in the given arena.
    pub fn new(net: &mut Net, phases: usize) -> Self {
        let phases = (0..phases).map(|_| net.add_port(1)).collect();
        let tick = net.add_port(1);
        Self {
            phases,
            tick,
            current: None,
        }
    }

    /// The 1-bit port for phase `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not a valid phase.
    pub fn phase(&self, index: usize) -> PortId {
        self.phases[index]
    }

    /// The 1-bit line toggled once per completed step.
    pub fn tick(&self) -> PortId {
        self.tick
    }

    /// Index of the active phase, or `None` before the first step and after
    /// a reset.
    pub fn current_phase(&self) -> Option<usize> {
        self.current
    }

    /// Lowers the active phase, if any, and returns to the pre-start state.
    pub fn reset(&mut self, net: &Net) {
        if let Some(active) = self.current {
            net.drive_bit(self.phases[active], false);
        }
        self.current = None;
    }

    /// Advances the clock by one phase.
    ///
    /// With a phase active: that phase is lowered, the tick line toggles, and
    /// the following phase (wrapping) is raised. From the pre-start state:
    /// phase 0 is raised without a tick.
    pub fn step(&mut self, net: &Net) {
        let next = match self.current {
            Some(active) => {
                net.drive_bit(self.phases[active], false);
                let toggled = !net.value(self.tick).all_set();
                net.set(self.tick, &Bits::from_u32(u32::from(toggled), 1));
                (active + 1) % self.phases.len()
            }
            None => 0,
        };
        trace!(phase = next, "clock step");
        self.current = Some(next);
        net.drive_bit(self.phases[next], true);
    }
}

/// Republishes a source port `delay` ticks after the source arms it.
///
/// The counter idles above the delay. A source change while idle arms the tap
/// (counter to zero); changes while counting are absorbed. Each tick advances
/// the counter, and when it lands on the delay the source value is copied to
/// the output port. A zero-delay tap copies immediately on arming.
#[derive(Debug)]
pub struct DelayedTap {
    source: PortId,
    tick: PortId,
    out: PortId,
    delay: usize,
    counter: usize,
}

impl DelayedTap {
    /// Creates a tap on `source`, clocked by `clock`, and wires it into the
    /// arena.
    pub fn attach(
        net: &mut Net,
        clock: &Clock,
        source: PortId,
        delay: usize,
    ) -> Rc<RefCell<Self>> {
        let out = net.add_port(net.width(source));
        let tap = Rc::new(RefCell::new(Self {
            source,
            tick: clock.tick(),
            out,
            delay,
            counter: 0,
        }));
        let id: NodeId = net.add_node(tap.clone());
        net.subscribe(source, id);
        net.subscribe(clock.tick(), id);
        tap
    }

    /// The delayed copy of the source.
    pub fn out(&self) -> PortId {
        self.out
    }
}

impl Node for DelayedTap {
    fn on_signal(&mut self, net: &Net, origin: PortId) {
        if origin == self.tick {
            if self.counter <= self.delay {
                self.counter += 1;
            }
            if self.counter == self.delay {
                net.set(self.out, &net.value(self.source));
            }
        } else {
            if self.counter < self.delay {
                return;
            }
            self.counter = 0;
            if self.delay == 0 {
                net.set(self.out, &net.value(self.source));
            }
        }
    }
}
