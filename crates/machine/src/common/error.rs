//! Fault definitions for the simulator's public surfaces.
//!
//! One error enum per API boundary:
//! 1. **Conversion faults:** Bit-vector/integer range violations.
//! 2. **Construction faults:** Wiring mistakes caught while building a machine.
//! 3. **Access faults:** Out-of-range memory cell addressing.
//! 4. **Collaborator faults:** Microcode image and assembly source diagnostics,
//!    each carrying enough line context to report to a user.

use thiserror::Error;

/// Faults raised by bit-vector conversions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BitsError {
    /// The vector is too wide to convert to a 32-bit integer.
    #[error("bit vector of width {width} does not fit a 32-bit integer")]
    WidthTooLarge {
        /// Width of the offending vector.
        width: usize,
    },

    /// A bit string contained a character other than `'0'` or `'1'`.
    #[error("bit strings may contain only '0' and '1', found {found:?}")]
    InvalidBitChar {
        /// The offending character.
        found: char,
    },
}

/// Faults raised while wiring components together.
///
/// These are fatal to building the machine and are never recovered
/// internally.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WiringError {
    /// Two ports that must share a width do not.
    #[error("port widths must match: {left} vs {right}")]
    WidthMismatch {
        /// Width of the first port.
        left: usize,
        /// Width of the second port.
        right: usize,
    },

    /// A memory's address port can index past its last cell.
    #[error("a {cells}-cell memory cannot back a {width}-bit address port")]
    AddressRangeTooWide {
        /// Number of cells in the memory.
        cells: usize,
        /// Width of the address port.
        width: usize,
    },
}

/// Faults raised by explicit memory cell access.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MemoryError {
    /// The cell index is outside the memory. There is no wraparound.
    #[error("address {address} out of range for a memory of {cells} cells")]
    AddressOutOfRange {
        /// The requested cell index.
        address: usize,
        /// Number of cells in the memory.
        cells: usize,
    },
}

/// Faults raised while reading a microcode image.
///
/// Every malformed-line case is distinct and carries the 1-based line number
/// (and where useful the line content), so an embedding application can
/// report exactly what is wrong. A loader failure is not fatal to the
/// machine: an unpopulated control store is a valid state.
#[derive(Debug, Error)]
pub enum MicrocodeError {
    /// The image file does not exist or could not be read.
    #[error("microcode image {path:?} could not be read")]
    NotFound {
        /// Path that was attempted.
        path: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// A line contained no `:` separator.
    #[error("line {line}: no ':' separator in {content:?}")]
    MissingSeparator {
        /// 1-based line number.
        line: usize,
        /// The offending line.
        content: String,
    },

    /// A line contained more than one `:` separator.
    #[error("line {line}: more than one ':' separator in {content:?}")]
    ExtraSeparator {
        /// 1-based line number.
        line: usize,
        /// The offending line.
        content: String,
    },

    /// The text before the separator is not a decimal cell index.
    #[error("line {line}: invalid cell index {index:?}")]
    BadIndex {
        /// 1-based line number.
        line: usize,
        /// The text that failed to parse.
        index: String,
    },

    /// The cell index does not fit the control store.
    #[error("line {line}: cell index {index} out of range for a {cells}-word store")]
    IndexOutOfRange {
        /// 1-based line number.
        line: usize,
        /// The parsed index.
        index: usize,
        /// Number of cells in the store.
        cells: usize,
    },

    /// The bit string does not have the microword width.
    #[error("line {line}: expected {expected} bits, found {found}")]
    BadWidth {
        /// 1-based line number.
        line: usize,
        /// Required bit count.
        expected: usize,
        /// Actual bit count.
        found: usize,
    },

    /// The bit string contained a non-binary character.
    #[error("line {line}: {source}")]
    BadBits {
        /// 1-based line number.
        line: usize,
        /// The character-level fault.
        #[source]
        source: BitsError,
    },
}

/// Faults raised by the two-pass assembler.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AsmError {
    /// The line matches no recognized form.
    #[error("syntax error on line {line}: {content:?}")]
    Syntax {
        /// 1-based line number.
        line: usize,
        /// The offending line.
        content: String,
    },

    /// The mnemonic is not in the instruction set.
    #[error("opcode {mnemonic:?} not defined on line {line}")]
    UnknownOpcode {
        /// 1-based line number.
        line: usize,
        /// The unrecognized mnemonic.
        mnemonic: String,
    },

    /// A label, constant, or symbol name was declared twice.
    #[error("duplicated declaration of symbol {symbol:?} on line {line}")]
    DuplicateSymbol {
        /// 1-based line number.
        line: usize,
        /// The symbol name.
        symbol: String,
    },

    /// An operand refers to a symbol that was never declared or allocated.
    #[error("use of undefined symbol {symbol:?} on line {line}")]
    UndefinedSymbol {
        /// 1-based line number.
        line: usize,
        /// The symbol name.
        symbol: String,
    },
}
