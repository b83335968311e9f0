//! Shared helpers for the simulator tests.

use mic1_core::common::bits::Bits;
use mic1_core::config::Config;
use mic1_core::control::mir::{
    ADDR_OFFSET, ALU_OFFSET, AMUX_OFFSET, A_OFFSET, B_OFFSET, COND_OFFSET, C_OFFSET, ENC_OFFSET,
    MBR_OFFSET, RD_OFFSET, SHIFTER_OFFSET, WR_OFFSET,
};
use mic1_core::machine::Machine;

/// Builds a bit vector from an MSB-first string, panicking on bad input.
pub fn bits(source: &str) -> Bits {
    Bits::from_bit_string(source).unwrap()
}

/// Bit vector as an unsigned integer, panicking past 32 bits.
pub fn as_u32(value: &Bits) -> u32 {
    value.to_u32().unwrap()
}

/// A machine with the stock configuration.
pub fn machine() -> Machine {
    Machine::new(&Config::default()).unwrap()
}

/// A machine with custom memory delays.
pub fn machine_with_delays(read_delay: usize, write_delay: usize) -> Machine {
    let config = Config {
        read_delay,
        write_delay,
        ..Config::default()
    };
    Machine::new(&config).unwrap()
}

/// Fluent encoder for 32-bit microwords.
///
/// Starts all-zero: no condition, ALU sum, no shift, nothing enabled,
/// registers 0/0/0, next address 0.
#[derive(Clone, Debug, Default)]
pub struct Microword {
    word: u32,
}

impl Microword {
    /// An all-zero microword.
    pub fn new() -> Self {
        Self::default()
    }

    fn field(mut self, offset: usize, value: u32) -> Self {
        self.word |= value << offset;
        self
    }

    /// Feed the ALU A side from the memory read buffer.
    pub fn a_from_mbr(self) -> Self {
        self.field(AMUX_OFFSET, 1)
    }

    /// Jump condition (0 never, 1 negative, 2 zero, 3 always).
    pub fn cond(self, value: u32) -> Self {
        self.field(COND_OFFSET, value)
    }

    /// ALU function (0 sum, 1 and, 2 pass A, 3 invert A).
    pub fn alu(self, value: u32) -> Self {
        self.field(ALU_OFFSET, value)
    }

    /// Shifter function (0 pass, 1 low, 2 high).
    pub fn shift(self, value: u32) -> Self {
        self.field(SHIFTER_OFFSET, value)
    }

    /// Gate the shifter output into the memory write buffer.
    pub fn mbr(self) -> Self {
        self.field(MBR_OFFSET, 1)
    }

    /// Assert the memory read strobe.
    pub fn rd(self) -> Self {
        self.field(RD_OFFSET, 1)
    }

    /// Assert the memory write strobe.
    pub fn wr(self) -> Self {
        self.field(WR_OFFSET, 1)
    }

    /// Enable the register write-back.
    pub fn enc(self) -> Self {
        self.field(ENC_OFFSET, 1)
    }

    /// Destination register selector.
    pub fn c(self, register: u32) -> Self {
        self.field(C_OFFSET, register)
    }

    /// B-side source register selector.
    pub fn b(self, register: u32) -> Self {
        self.field(B_OFFSET, register)
    }

    /// A-side source register selector.
    pub fn a(self, register: u32) -> Self {
        self.field(A_OFFSET, register)
    }

    /// Next microprogram address.
    pub fn addr(self, address: u32) -> Self {
        self.field(ADDR_OFFSET, address)
    }

    /// Encodes the word.
    pub fn build(self) -> Bits {
        Bits::from_u32(self.word, 32)
    }
}
