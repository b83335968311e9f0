//! Microprogram sequencing.
//!
//! The control unit closes the loop between the datapath and the microcode:
//! 1. **Flags:** The condition evaluator gating microprogram jumps.
//! 2. **Microprogram counter:** An 8-bit register clocked on the last phase,
//!    fed by a 2-way mux between its own increment and the microword's
//!    address field.
//! 3. **Control store:** A 256-word read-only memory strobed on phase 0, so
//!    each microcycle opens by fetching the word the counter selects.
//! 4. **Microinstruction register:** Also clocked on phase 0, after the
//!    store's fetch, so it always latches the freshly fetched word.

use std::cell::RefCell;
use std::rc::Rc;

use crate::common::bits::Bits;
use crate::common::error::MemoryError;
use crate::components::{Memory, Mux, Register};
use crate::signal::clock::Clock;
use crate::signal::{Net, PortId};

/// Microword jump-condition evaluator.
pub mod flags;
/// Microword field layout.
pub mod mir;

pub use flags::FlagsRegister;
pub use mir::MirFields;

/// Width of a microword in bits.
pub const MICROWORD_WIDTH: usize = 32;
/// Width of the microprogram counter.
pub const MPC_WIDTH: usize = 8;

/// The microprogram sequencer.
///
/// Owns the flags evaluator, the microprogram counter with its next-address
/// mux, and the control store, and rebinds the shared microinstruction
/// register onto the store's output. The store starts unpopulated (all
/// microwords zero), which is a valid idle state; images are installed cell
/// by cell through [`ControlUnit::load_microword`].
#[derive(Debug)]
pub struct ControlUnit {
    flags: Rc<RefCell<FlagsRegister>>,
    mpc: Rc<RefCell<Register>>,
    next_address: Rc<RefCell<Mux>>,
    store: Rc<RefCell<Memory>>,
    mir: Rc<RefCell<Register>>,
}

impl ControlUnit {
    /// Builds the sequencer around an existing microinstruction register and
    /// its split fields.
    ///
    /// Subscription order is load-bearing: the store must fetch before the
    /// microinstruction register latches, so the register's control binding
    /// is moved to the end of the phase-0 list here, after the store
    /// subscribes.
    pub fn new(
        net: &mut Net,
        clock: &Clock,
        negative: PortId,
        zero: PortId,
        mir: Rc<RefCell<Register>>,
        fields: &MirFields,
        store_words: usize,
    ) -> Self {
        let flags = FlagsRegister::attach(net, negative, zero, fields.cond);
        let mpc = Register::attach(net, MPC_WIDTH, "MPC");
        let mpc_out = mpc.borrow().out();
        let incremented = net.increment(mpc_out, 1);
        let next_address = Mux::attach(
            net,
            MPC_WIDTH,
            vec![incremented, fields.addr],
            flags.borrow().out(),
        );
        {
            let mut mpc = mpc.borrow_mut();
            mpc.set_data(next_address.borrow().out());
            mpc.set_control(net, clock.phase(3));
        }

        let store = Memory::attach(
            net,
            store_words,
            MICROWORD_WIDTH,
            mpc_out,
            None,
            Some(clock.phase(0)),
            None,
            "control store",
        );
        {
            let mut mir = mir.borrow_mut();
            mir.set_data(store.borrow().out());
            mir.set_control(net, clock.phase(0));
        }

        Self {
            flags,
            mpc,
            next_address,
            store,
            mir,
        }
    }

    /// Current value of the microprogram counter.
    pub fn mpc(&self, net: &Net) -> Bits {
        self.mpc.borrow().value(net)
    }

    /// Current value of the microinstruction register.
    pub fn microinstruction(&self, net: &Net) -> Bits {
        self.mir.borrow().value(net)
    }

    /// Whether the flags evaluator is currently asserting a jump.
    pub fn jump_taken(&self, net: &Net) -> bool {
        net.value(self.flags.borrow().out()).all_set()
    }

    /// Index of the next-address mux input currently feeding the counter.
    pub fn next_address_source(&self) -> usize {
        self.next_address.borrow().selected()
    }

    /// Installs one microword in the control store.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::AddressOutOfRange`] if `cell` is past the end
    /// of the store.
    pub fn load_microword(&self, cell: usize, word: &Bits) -> Result<(), MemoryError> {
        self.store.borrow_mut().set_cell(cell, word)
    }

    /// Reads one microword back from the control store.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::AddressOutOfRange`] if `cell` is past the end
    /// of the store.
    pub fn microword(&self, cell: usize) -> Result<Bits, MemoryError> {
        self.store.borrow().cell(cell).cloned()
    }

    /// Number of cells in the control store.
    pub fn store_words(&self) -> usize {
        self.store.borrow().len()
    }

    /// Returns the counter and microinstruction register to zero.
    ///
    /// The clock itself is reset by the owning machine; the control store
    /// contents survive a reset.
    pub fn reset(&self, net: &Net) {
        self.mir.borrow().reset(net);
        self.mpc.borrow().reset(net);
    }
}
