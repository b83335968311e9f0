//! The storage and combinational component library.
//!
//! Every component follows the same pattern: an `attach` constructor adds its
//! output ports to the [`Net`](crate::signal::Net) arena, registers the
//! component as a listener, and subscribes it to its input ports. The
//! returned `Rc<RefCell<_>>` is the same handle the arena holds, so the
//! embedding machine can inspect component state between steps.
//!
//! Subscription happens in `attach`, so machine construction order fixes the
//! propagation order.

/// Arithmetic-logic unit with negative/zero flag outputs.
pub mod alu;
/// Word-addressed bit-vector memories, immediate or tick-delayed.
pub mod memory;
/// N-way multiplexer that follows exactly one input at a time.
pub mod mux;
/// Edge-sampled registers and transparent latches.
pub mod register;
/// Single-position shifter.
pub mod shifter;

pub use alu::{Alu, AluOp};
pub use memory::Memory;
pub use mux::Mux;
pub use register::{Latch, Register};
pub use shifter::{ShiftOp, Shifter};
