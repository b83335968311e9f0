//! Microword field layout.
//!
//! A microword is 32 bits, with bit 0 the least significant. Field positions,
//! high to low:
//!
//! ```text
//! | 31   | 30 29 | 28 27 | 26 25 | 24  | 23  | 22 | 21 | 20  | 19-16 | 15-12 | 11-8 | 7-0  |
//! | amux | cond  | alu   | shift | mbr | mar | rd | wr | enc | c     | b     | a    | addr |
//! ```
//!
//! The thirteen fields account for all 32 bits.

use crate::signal::{Net, PortId};

/// Offset of the A-side mux select bit.
pub const AMUX_OFFSET: usize = 31;
/// Offset of the 2-bit jump condition field.
pub const COND_OFFSET: usize = 29;
/// Offset of the 2-bit ALU function field.
pub const ALU_OFFSET: usize = 27;
/// Offset of the 2-bit shifter function field.
pub const SHIFTER_OFFSET: usize = 25;
/// Offset of the memory-buffer write enable bit.
pub const MBR_OFFSET: usize = 24;
/// Offset of the memory-address load enable bit.
pub const MAR_OFFSET: usize = 23;
/// Offset of the memory read strobe bit.
pub const RD_OFFSET: usize = 22;
/// Offset of the memory write strobe bit.
pub const WR_OFFSET: usize = 21;
/// Offset of the register write enable bit.
pub const ENC_OFFSET: usize = 20;
/// Offset of the 4-bit destination register field.
pub const C_OFFSET: usize = 16;
/// Offset of the 4-bit B-side source register field.
pub const B_OFFSET: usize = 12;
/// Offset of the 4-bit A-side source register field.
pub const A_OFFSET: usize = 8;
/// Offset of the 8-bit next-address field.
pub const ADDR_OFFSET: usize = 0;

/// Derived ports exposing each field of a 32-bit microword port.
///
/// Splitting is pure wiring: every field is an interval projection of the
/// word, so it tracks the microinstruction register with no extra state.
#[derive(Clone, Copy, Debug)]
pub struct MirFields {
    /// A-side mux select (1 bit).
    pub a_mux: PortId,
    /// Jump condition (2 bits).
    pub cond: PortId,
    /// ALU function (2 bits).
    pub alu: PortId,
    /// Shifter function (2 bits).
    pub shifter: PortId,
    /// Memory-buffer write enable (1 bit).
    pub mbr: PortId,
    /// Memory-address load enable (1 bit).
    pub mar: PortId,
    /// Memory read strobe (1 bit).
    pub rd: PortId,
    /// Memory write strobe (1 bit).
    pub wr: PortId,
    /// Register write enable (1 bit).
    pub enc: PortId,
    /// Destination register selector (4 bits).
    pub c: PortId,
    /// B-side source register selector (4 bits).
    pub b: PortId,
    /// A-side source register selector (4 bits).
    pub a: PortId,
    /// Next microprogram address (8 bits).
    pub addr: PortId,
}

impl MirFields {
    /// Splits a 32-bit microword port into its fields.
    pub fn split(net: &mut Net, word: PortId) -> Self {
        Self {
            a_mux: net.interval(word, AMUX_OFFSET, 1),
            cond: net.interval(word, COND_OFFSET, 2),
            alu: net.interval(word, ALU_OFFSET, 2),
            shifter: net.interval(word, SHIFTER_OFFSET, 2),
            mbr: net.interval(word, MBR_OFFSET, 1),
            mar: net.interval(word, MAR_OFFSET, 1),
            rd: net.interval(word, RD_OFFSET, 1),
            wr: net.interval(word, WR_OFFSET, 1),
            enc: net.interval(word, ENC_OFFSET, 1),
            c: net.interval(word, C_OFFSET, 4),
            b: net.interval(word, B_OFFSET, 4),
            a: net.interval(word, A_OFFSET, 4),
            addr: net.interval(word, ADDR_OFFSET, 8),
        }
    }
}
