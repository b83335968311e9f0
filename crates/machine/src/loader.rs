//! Microcode image parsing.
//!
//! An image is plain text, one cell per line, in the form
//! `index : bitstring` — a decimal cell index, a `:` separator, and an
//! MSB-first microword. Spaces are insignificant and blank lines are
//! skipped:
//!
//! ```text
//! 0: 00000000000000000011000000000000
//! 1: 00011100000000000000000000001010
//! ```
//!
//! Parsing produces (cell, word) pairs; installing them is the machine's
//! job, so an embedding application can validate an image without a machine.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::common::bits::Bits;
use crate::common::error::MicrocodeError;

/// Parses a microcode image for a store of `cells` words of `word_width`
/// bits.
///
/// # Errors
///
/// Returns a [`MicrocodeError`] identifying the first malformed line: a
/// missing or duplicated separator, a non-decimal or out-of-range cell
/// index, a wrong-width word, or a non-binary character.
pub fn parse_image(
    text: &str,
    cells: usize,
    word_width: usize,
) -> Result<Vec<(usize, Bits)>, MicrocodeError> {
    let mut image = Vec::new();
    for (number, raw) in text.lines().enumerate() {
        let line = number + 1;
        let trimmed: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
        if trimmed.is_empty() {
            continue;
        }
        let mut parts = trimmed.split(':');
        let (index, word) = match (parts.next(), parts.next(), parts.next()) {
            (Some(index), Some(word), None) => (index, word),
            (_, None, _) => {
                return Err(MicrocodeError::MissingSeparator {
                    line,
                    content: raw.to_owned(),
                });
            }
            _ => {
                return Err(MicrocodeError::ExtraSeparator {
                    line,
                    content: raw.to_owned(),
                });
            }
        };
        let index: usize = index.parse().map_err(|_| MicrocodeError::BadIndex {
            line,
            index: index.to_owned(),
        })?;
        if index >= cells {
            return Err(MicrocodeError::IndexOutOfRange { line, index, cells });
        }
        if word.len() != word_width {
            return Err(MicrocodeError::BadWidth {
                line,
                expected: word_width,
                found: word.len(),
            });
        }
        let word =
            Bits::from_bit_string(word).map_err(|source| MicrocodeError::BadBits { line, source })?;
        image.push((index, word));
    }
    Ok(image)
}

/// Reads and parses a microcode image file.
///
/// # Errors
///
/// Returns [`MicrocodeError::NotFound`] if the file cannot be read, or any
/// [`parse_image`] error for malformed content.
pub fn read_image(
    path: &Path,
    cells: usize,
    word_width: usize,
) -> Result<Vec<(usize, Bits)>, MicrocodeError> {
    let text = fs::read_to_string(path).map_err(|source| MicrocodeError::NotFound {
        path: path.display().to_string(),
        source,
    })?;
    let image = parse_image(&text, cells, word_width)?;
    info!(path = %path.display(), words = image.len(), "microcode image loaded");
    Ok(image)
}
