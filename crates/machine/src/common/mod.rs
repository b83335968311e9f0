//! Shared value types and fault definitions.
//!
//! This module collects the leaf types used throughout the simulator:
//! 1. **Bit vectors:** The fixed-width value type every wire and cell carries.
//! 2. **Errors:** Fault enums for conversion, wiring, memory, loader, and assembler surfaces.

/// Fixed-width bit vectors (index 0 = least significant bit).
pub mod bits;
/// Fault types for the public API surfaces.
pub mod error;
