//! Cycle-accurate simulator of a microcoded 16-bit von Neumann machine.
//!
//! The machine is modelled structurally: every wire is a port in a signal
//! arena, every component is a listener that reacts to port changes, and the
//! four-phase clock drives propagation through the same graph a hardware
//! schematic would show. On top of the datapath sit the collaborators an
//! embedding application needs: a microcode image loader and a two-pass
//! macro assembler.
//!
//! ```no_run
//! use mic1_core::asm;
//! use mic1_core::config::Config;
//! use mic1_core::loader;
//! use mic1_core::machine::{Machine, AC};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! let mut machine = Machine::new(&config)?;
//!
//! let image = loader::read_image(Path::new("microcode.txt"), 256, 32)?;
//! machine.load_microcode(&image)?;
//!
//! let program = asm::assemble("LOCO 7\nSTOD result\nresult: 0\n")?;
//! machine.load_program(&program)?;
//!
//! machine.step_macro();
//! println!("AC = {}", machine.register(AC));
//! # Ok(())
//! # }
//! ```

/// Two-pass macro assembler.
pub mod asm;
/// Shared value types and fault definitions.
pub mod common;
/// Storage and combinational components.
pub mod components;
/// Machine configuration.
pub mod config;
/// Microprogram sequencing.
pub mod control;
/// Microcode image parsing.
pub mod loader;
/// The assembled machine and its stepping protocol.
pub mod machine;
/// Signal ports and the propagation engine.
pub mod signal;

pub use common::bits::Bits;
pub use config::Config;
pub use machine::Machine;
