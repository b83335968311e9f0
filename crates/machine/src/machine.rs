//! The assembled machine.
//!
//! Wires the full datapath: sixteen general registers feeding two selection
//! muxes, phase-1 operand latches, the A-side mux between the latch and the
//! memory read buffer, the ALU and shifter, the phase-3 write-back network,
//! the delayed main memory behind its address and buffer registers, and the
//! microprogram control unit.
//!
//! Construction order is load-bearing: it fixes every subscriber list, and
//! with it the converged state of each phase. The control unit is built last
//! so the microprogram counter is the final phase-3 subscriber, sampling its
//! next address only after the write-back network has settled.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::trace;

use crate::common::bits::Bits;
use crate::common::error::{MemoryError, WiringError};
use crate::components::{Alu, Latch, Memory, Mux, Register, Shifter};
use crate::config::Config;
use crate::control::{ControlUnit, MirFields, MICROWORD_WIDTH, MPC_WIDTH};
use crate::signal::clock::{Clock, DelayedTap};
use crate::signal::Net;

/// Width of every datapath register and memory cell.
pub const WORD_WIDTH: usize = 16;
/// Number of clock phases per microcycle.
pub const PHASES: usize = 4;

/// Program counter.
pub const PC: usize = 0;
/// Accumulator.
pub const AC: usize = 1;
/// Stack pointer.
pub const SP: usize = 2;
/// Instruction register.
pub const IR: usize = 3;
/// Temporary instruction register.
pub const TIR: usize = 4;
/// Constant 0.
pub const ZERO: usize = 5;
/// Constant 1.
pub const PLUS1: usize = 6;
/// Constant -1.
pub const MINUS1: usize = 7;
/// Constant 0x0FFF, the address-operand mask.
pub const AMASK: usize = 8;
/// Constant 0x00FF, the short-operand mask.
pub const SMASK: usize = 9;

/// Display names of the sixteen registers, in selector order.
pub const REGISTER_NAMES: [&str; 16] = [
    "PC", "AC", "SP", "IR", "TIR", "ZERO", "PLUS1", "MINUS1", "AMASK", "SMASK", "A", "B", "C",
    "D", "E", "F",
];

/// Power-on values of the constant registers, as (index, value) pairs.
const CONSTANTS: [(usize, u32); 5] = [
    (SP, 0x1000),
    (PLUS1, 0x0001),
    (MINUS1, 0xFFFF),
    (AMASK, 0x0FFF),
    (SMASK, 0x00FF),
];

/// The complete simulated machine.
///
/// All stepping goes through the three-level protocol: [`Machine::step_phase`]
/// advances one clock phase, [`Machine::step_micro`] completes the current
/// microcycle, and [`Machine::step_macro`] runs microcycles until the
/// microprogram counter returns to zero, i.e. one macroinstruction.
#[derive(Debug)]
pub struct Machine {
    net: Net,
    clock: Clock,
    registers: Vec<Rc<RefCell<Register>>>,
    a_select: Rc<RefCell<Mux>>,
    b_select: Rc<RefCell<Mux>>,
    latch_a: Rc<RefCell<Latch>>,
    latch_b: Rc<RefCell<Latch>>,
    mbr_read: Rc<RefCell<Register>>,
    a_mux: Rc<RefCell<Mux>>,
    alu: Rc<RefCell<Alu>>,
    shifter: Rc<RefCell<Shifter>>,
    mbr_write: Rc<RefCell<Register>>,
    mar: Rc<RefCell<Register>>,
    memory: Rc<RefCell<Memory>>,
    control: ControlUnit,
}

impl Machine {
    /// Builds a machine from a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`WiringError::AddressRangeTooWide`] if `memory_words` is not
    /// a power of two or `control_store_words` is smaller than the
    /// microprogram counter's range: a strobed access reads its address port
    /// unchecked, so every slice value must land on a cell.
    pub fn new(config: &Config) -> Result<Self, WiringError> {
        let memory_address_width = address_width(config.memory_words);
        if config.memory_words < 1 << memory_address_width {
            return Err(WiringError::AddressRangeTooWide {
                cells: config.memory_words,
                width: memory_address_width,
            });
        }
        if config.control_store_words < 1 << MPC_WIDTH {
            return Err(WiringError::AddressRangeTooWide {
                cells: config.control_store_words,
                width: MPC_WIDTH,
            });
        }

        let mut net = Net::new();
        let clock = Clock::new(&mut net, PHASES);

        // The microinstruction register exists before everything it drives;
        // its data and control are bound by the control unit at the end.
        let mir = Register::attach(&mut net, MICROWORD_WIDTH, "MIR");
        let mir_out = mir.borrow().out();
        let fields = MirFields::split(&mut net, mir_out);

        let registers: Vec<_> = REGISTER_NAMES
            .iter()
            .map(|&name| Register::attach(&mut net, WORD_WIDTH, name))
            .collect();
        for (index, value) in CONSTANTS {
            registers[index]
                .borrow()
                .store(&net, &Bits::from_u32(value, WORD_WIDTH));
        }

        let register_outs: Vec<_> = registers.iter().map(|r| r.borrow().out()).collect();
        let a_select = Mux::attach(&mut net, WORD_WIDTH, register_outs.clone(), fields.a);
        let b_select = Mux::attach(&mut net, WORD_WIDTH, register_outs, fields.b);
        let c_decode = net.decoder_4_to_16(fields.c);

        let latch_a = Latch::attach(&mut net, a_select.borrow().out(), clock.phase(1));
        let latch_b = Latch::attach(&mut net, b_select.borrow().out(), clock.phase(1));

        let mbr_read = Register::attach(&mut net, WORD_WIDTH, "MBR.rd");
        let a_mux = Mux::attach(
            &mut net,
            WORD_WIDTH,
            vec![latch_a.borrow().out(), mbr_read.borrow().out()],
            fields.a_mux,
        );

        let alu = Alu::attach(
            &mut net,
            a_mux.borrow().out(),
            latch_b.borrow().out(),
            fields.alu,
        )?;
        let shifter = Shifter::attach(&mut net, alu.borrow().out(), fields.shifter);

        // Write-back network: register i loads the shifter output when the
        // decoded C field selects it, ENC is set, and phase 3 is high.
        for (index, register) in registers.iter().enumerate() {
            let selected = net.interval(c_decode, index, 1);
            let enable = net.and_all(&[selected, fields.enc, clock.phase(3)]);
            let mut register = register.borrow_mut();
            register.set_data(shifter.borrow().out());
            register.set_control(&net, enable);
        }

        let mbr_write = Register::attach(&mut net, WORD_WIDTH, "MBR.wr");
        {
            let enable = net.and_all(&[fields.mbr, fields.wr, clock.phase(3)]);
            let mut mbr_write = mbr_write.borrow_mut();
            mbr_write.set_data(shifter.borrow().out());
            mbr_write.set_control(&net, enable);
        }

        let mar = Register::attach(&mut net, WORD_WIDTH, "MAR");
        {
            let mut mar = mar.borrow_mut();
            mar.set_data(latch_b.borrow().out());
            mar.set_control(&net, clock.phase(2));
        }

        let address = net.interval(mar.borrow().out(), 0, memory_address_width);
        let memory = Memory::attach_delayed(
            &mut net,
            &clock,
            config.memory_words,
            WORD_WIDTH,
            config.read_delay,
            config.write_delay,
            address,
            Some(mbr_write.borrow().out()),
            Some(fields.rd),
            Some(fields.wr),
            "main memory",
        );

        // The read buffer latches the memory output on the phase 3 after a
        // read strobe; the tap holds RD across the tick boundary.
        let read_done = DelayedTap::attach(&mut net, &clock, fields.rd, 0);
        {
            let enable = net.and_all(&[read_done.borrow().out(), clock.phase(3)]);
            let mut mbr_read = mbr_read.borrow_mut();
            mbr_read.set_data(memory.borrow().out());
            mbr_read.set_control(&net, enable);
        }

        let negative = alu.borrow().negative();
        let zero = alu.borrow().zero();
        let control = ControlUnit::new(
            &mut net,
            &clock,
            negative,
            zero,
            mir,
            &fields,
            config.control_store_words,
        );

        Ok(Self {
            net,
            clock,
            registers,
            a_select,
            b_select,
            latch_a,
            latch_b,
            mbr_read,
            a_mux,
            alu,
            shifter,
            mbr_write,
            mar,
            memory,
            control,
        })
    }

    /// Advances the clock by one phase.
    pub fn step_phase(&mut self) {
        self.clock.step(&self.net);
    }

    /// Completes one microcycle: advances to phase 0 (starting the clock if
    /// needed) and steps until the cycle wraps.
    pub fn step_micro(&mut self) {
        if self.clock.current_phase().is_none() {
            self.step_phase();
        }
        self.step_phase();
        while self.clock.current_phase().is_some_and(|phase| phase > 0) {
            self.step_phase();
        }
        trace!(mpc = %self.control.mpc(&self.net), "microcycle complete");
    }

    /// Runs one macroinstruction: microcycles until the microprogram counter
    /// returns to zero.
    ///
    /// Does not terminate if the loaded microprogram never returns to
    /// microaddress 0.
    pub fn step_macro(&mut self) {
        self.step_micro();
        while self.control.mpc(&self.net).any_set() {
            self.step_micro();
        }
    }

    /// Returns the machine to its power-on state.
    ///
    /// Clears every register and memory cell, restores the constants, and
    /// stops the clock. The control store contents survive.
    pub fn reset(&mut self) {
        for register in &self.registers {
            register.borrow().reset(&self.net);
        }
        for (index, value) in CONSTANTS {
            self.registers[index]
                .borrow()
                .store(&self.net, &Bits::from_u32(value, WORD_WIDTH));
        }
        self.clock.reset(&self.net);
        self.control.reset(&self.net);
        self.latch_a.borrow().reset(&self.net);
        self.latch_b.borrow().reset(&self.net);
        self.memory.borrow_mut().reset();
        self.mbr_read.borrow().reset(&self.net);
        self.mbr_write.borrow().reset(&self.net);
        self.mar.borrow().reset(&self.net);
    }

    /// Index of the active clock phase, or `None` while the clock is stopped.
    pub fn current_phase(&self) -> Option<usize> {
        self.clock.current_phase()
    }

    /// Value of register `index` (see the selector constants and
    /// [`REGISTER_NAMES`]).
    ///
    /// # Panics
    ///
    /// Panics if `index` is not one of the sixteen registers.
    pub fn register(&self, index: usize) -> Bits {
        self.registers[index].borrow().value(&self.net)
    }

    /// Overwrites register `index`, propagating to anything watching it.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not one of the sixteen registers.
    pub fn set_register(&self, index: usize, value: &Bits) {
        self.registers[index].borrow().store(&self.net, value);
    }

    /// Reads a main memory cell.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::AddressOutOfRange`] if `address` is past the
    /// end of memory.
    pub fn memory_cell(&self, address: usize) -> Result<Bits, MemoryError> {
        self.memory.borrow().cell(address).cloned()
    }

    /// Writes a main memory cell directly, bypassing the strobe protocol.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::AddressOutOfRange`] if `address` is past the
    /// end of memory.
    pub fn set_memory_cell(&self, address: usize, value: &Bits) -> Result<(), MemoryError> {
        self.memory.borrow_mut().set_cell(address, value)
    }

    /// Loads a program image into memory starting at cell 0.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::AddressOutOfRange`] if the image is larger than
    /// memory.
    pub fn load_program(&self, words: &[Bits]) -> Result<(), MemoryError> {
        let mut memory = self.memory.borrow_mut();
        for (address, word) in words.iter().enumerate() {
            memory.set_cell(address, word)?;
        }
        Ok(())
    }

    /// Installs a microcode image, given as (cell, word) pairs.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::AddressOutOfRange`] if a cell index is past the
    /// end of the control store.
    pub fn load_microcode(&self, image: &[(usize, Bits)]) -> Result<(), MemoryError> {
        for (cell, word) in image {
            self.control.load_microword(*cell, word)?;
        }
        Ok(())
    }

    /// The microprogram sequencer, for inspection.
    pub fn control(&self) -> &ControlUnit {
        &self.control
    }

    /// The port arena, for inspecting sequencer state.
    pub fn net(&self) -> &Net {
        &self.net
    }

    /// Current value of the microprogram counter.
    pub fn mpc(&self) -> Bits {
        self.control.mpc(&self.net)
    }

    /// Current value of the microinstruction register.
    pub fn microinstruction(&self) -> Bits {
        self.control.microinstruction(&self.net)
    }

    /// Register index the A bus currently selects.
    pub fn a_source(&self) -> usize {
        self.a_select.borrow().selected()
    }

    /// Register index the B bus currently selects.
    pub fn b_source(&self) -> usize {
        self.b_select.borrow().selected()
    }

    /// Value held by the A-side operand latch.
    pub fn a_latch(&self) -> Bits {
        self.net.value(self.latch_a.borrow().out())
    }

    /// Value held by the B-side operand latch.
    pub fn b_latch(&self) -> Bits {
        self.net.value(self.latch_b.borrow().out())
    }

    /// Whether the operand latches are currently transparent.
    pub fn latches_open(&self) -> bool {
        self.latch_a.borrow().enabled() && self.latch_b.borrow().enabled()
    }

    /// Whether the A-side mux is currently taking the memory read buffer.
    pub fn a_mux_takes_mbr(&self) -> bool {
        self.a_mux.borrow().selected() == 1
    }

    /// Current ALU result.
    pub fn alu_out(&self) -> Bits {
        self.net.value(self.alu.borrow().out())
    }

    /// Current shifter result, the value on the write-back bus.
    pub fn shifter_out(&self) -> Bits {
        self.net.value(self.shifter.borrow().out())
    }

    /// Value held by the memory address register.
    pub fn mar_value(&self) -> Bits {
        self.mar.borrow().value(&self.net)
    }

    /// Value held by the memory read buffer.
    pub fn mbr_read_value(&self) -> Bits {
        self.mbr_read.borrow().value(&self.net)
    }

    /// Value held by the memory write buffer.
    pub fn mbr_write_value(&self) -> Bits {
        self.mbr_write.borrow().value(&self.net)
    }
}

/// Bits needed to address `cells` cells (12 for the stock 4096-word memory).
fn address_width(cells: usize) -> usize {
    let width = usize::BITS - cells.next_power_of_two().leading_zeros() - 1;
    (width as usize).max(1)
}
