//! Two-pass macro assembler.
//!
//! The source language is one statement per line, with `/` starting a
//! comment:
//!
//! ```text
//! size = 100          / symbol: operand references resolve to its address
//! start: LODD count   / labelled instruction
//!        SUBD one
//!        JNZE start
//! halt:  JUMP halt
//! one: 1              / constant: operand references resolve to the value
//! ```
//!
//! Pass one classifies every line and collects the symbol table; pass two
//! resolves operands and encodes. Storage for symbols and for operands that
//! name no declared symbol (implicit variables, initialised to zero) is
//! allocated directly after the last instruction, in first-use order, and
//! the initial values are part of the produced image.

use std::collections::HashMap;

use tracing::debug;

use crate::common::bits::Bits;
use crate::common::error::AsmError;
use crate::machine::WORD_WIDTH;

/// The instruction set: mnemonic and opcode bit pattern.
///
/// The operand occupies whatever the opcode leaves of the 16-bit word: 12
/// bits after a 4-bit opcode, 9 after a 7-bit one.
pub const INSTRUCTION_SET: [(&str, &str); 23] = [
    ("LODD", "0000"),
    ("STOD", "0001"),
    ("ADDD", "0010"),
    ("SUBD", "0011"),
    ("JPOS", "0100"),
    ("JZER", "0101"),
    ("JUMP", "0110"),
    ("LOCO", "0111"),
    ("LODL", "1000"),
    ("STOL", "1001"),
    ("ADDL", "1010"),
    ("SUBL", "1011"),
    ("JNEG", "1100"),
    ("JNZE", "1101"),
    ("CALL", "1110"),
    ("PSHI", "1111000"),
    ("POPI", "1111001"),
    ("PUSH", "1111010"),
    ("POP", "1111011"),
    ("RETN", "1111100"),
    ("SWAP", "1111101"),
    ("INSP", "1111110"),
    ("DESP", "1111111"),
];

/// An instruction recorded by pass one.
struct Pending {
    line: usize,
    opcode: &'static str,
    operand: Option<String>,
}

/// Assembles a source text into a memory image based at cell 0.
///
/// The image holds the encoded instructions followed by the cells allocated
/// for symbols and implicit variables.
///
/// # Errors
///
/// Returns an [`AsmError`] naming the first offending line: unparseable
/// syntax, an unknown mnemonic, a symbol declared twice, or an operand
/// naming a symbol that is never declared.
pub fn assemble(source: &str) -> Result<Vec<Bits>, AsmError> {
    let mut symbols: HashMap<String, usize> = HashMap::new();
    // (name, initial value), in allocation order.
    let mut variables: Vec<(String, u32)> = Vec::new();
    let mut instructions: Vec<Pending> = Vec::new();

    for (number, raw) in source.lines().enumerate() {
        let line = number + 1;
        let text = strip_comment(raw).trim();
        if text.is_empty() {
            continue;
        }

        if let Some((name, value)) = split_symbol(text) {
            let value = parse_literal(value, line, raw)?;
            set_variable(&mut variables, name, value);
            if symbols.contains_key(name) {
                return Err(AsmError::DuplicateSymbol {
                    line,
                    symbol: name.to_owned(),
                });
            }
            symbols.insert(name.to_owned(), 0);
            continue;
        }

        let (label, body) = split_label(text);
        if let Some(label) = label {
            if body.is_empty() {
                declare_position(&mut symbols, &mut variables, label, instructions.len())
                    .map_err(|symbol| AsmError::DuplicateSymbol { line, symbol })?;
                continue;
            }
            if is_literal(body) {
                // Constant declaration: references resolve to the value.
                let value = parse_literal(body, line, raw)?;
                if symbols.contains_key(label) {
                    return Err(AsmError::DuplicateSymbol {
                        line,
                        symbol: label.to_owned(),
                    });
                }
                symbols.insert(label.to_owned(), value as usize);
                variables.retain(|(name, _)| name != label);
                continue;
            }
            declare_position(&mut symbols, &mut variables, label, instructions.len())
                .map_err(|symbol| AsmError::DuplicateSymbol { line, symbol })?;
        }

        let (mnemonic, operand) = split_instruction(body, line, raw)?;
        let Some(opcode) = lookup_opcode(mnemonic) else {
            return Err(AsmError::UnknownOpcode {
                line,
                mnemonic: mnemonic.to_owned(),
            });
        };
        if let Some(operand) = operand {
            if !is_literal(operand)
                && !symbols.contains_key(operand)
                && !variables.iter().any(|(name, _)| name == operand)
            {
                // Implicit variable, allocated after the program.
                variables.push((operand.to_owned(), 0));
            }
        }
        instructions.push(Pending {
            line,
            opcode,
            operand: operand.map(str::to_owned),
        });
    }

    // Pass two: place variables after the program, then resolve and encode.
    let program_size = instructions.len();
    for (offset, (name, _)) in variables.iter().enumerate() {
        symbols.insert(name.clone(), program_size + offset);
    }

    let mut image = Vec::with_capacity(program_size + variables.len());
    for pending in &instructions {
        let value = match &pending.operand {
            None => 0,
            Some(operand) if is_literal(operand) => {
                parse_literal(operand, pending.line, operand)?
            }
            Some(operand) => match symbols.get(operand.as_str()) {
                Some(&address) => address as u32,
                None => {
                    return Err(AsmError::UndefinedSymbol {
                        line: pending.line,
                        symbol: operand.clone(),
                    });
                }
            },
        };
        image.push(encode(pending.opcode, value));
    }
    for (_, value) in &variables {
        image.push(Bits::from_u32(*value, WORD_WIDTH));
    }
    debug!(
        instructions = program_size,
        variables = variables.len(),
        "assembly complete"
    );
    Ok(image)
}

/// Encodes one instruction: the opcode pattern in the high bits, the operand
/// truncated to the remaining width.
fn encode(opcode: &str, value: u32) -> Bits {
    let operand_width = WORD_WIDTH - opcode.len();
    let mut word = Bits::from_u32(value, operand_width).resized(WORD_WIDTH);
    for (position, ch) in opcode.chars().rev().enumerate() {
        word.set_bit(operand_width + position, ch == '1');
    }
    word
}

fn lookup_opcode(mnemonic: &str) -> Option<&'static str> {
    let upper = mnemonic.to_ascii_uppercase();
    INSTRUCTION_SET
        .iter()
        .find(|(name, _)| *name == upper)
        .map(|(_, opcode)| *opcode)
}

/// Records `name` as marking position `at`, displacing any variable of the
/// same name. Returns the name on a duplicate declaration.
fn declare_position(
    symbols: &mut HashMap<String, usize>,
    variables: &mut Vec<(String, u32)>,
    name: &str,
    at: usize,
) -> Result<(), String> {
    variables.retain(|(variable, _)| variable != name);
    if symbols.contains_key(name) {
        return Err(name.to_owned());
    }
    symbols.insert(name.to_owned(), at);
    Ok(())
}

fn set_variable(variables: &mut Vec<(String, u32)>, name: &str, value: u32) {
    match variables.iter_mut().find(|(existing, _)| existing == name) {
        Some((_, existing)) => *existing = value,
        None => variables.push((name.to_owned(), value)),
    }
}

fn strip_comment(line: &str) -> &str {
    line.find('/').map_or(line, |at| &line[..at])
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric())
}

fn is_literal(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_ascii_digit())
}

fn parse_literal(text: &str, line: usize, content: &str) -> Result<u32, AsmError> {
    text.parse().map_err(|_| AsmError::Syntax {
        line,
        content: content.to_owned(),
    })
}

/// Splits a `name = literal` symbol declaration, if the line is one.
fn split_symbol(text: &str) -> Option<(&str, &str)> {
    let (name, value) = text.split_once('=')?;
    let name = name.trim();
    let value = value.trim();
    (is_identifier(name) && is_literal(value)).then_some((name, value))
}

/// Splits an optional leading `label:` off a statement.
fn split_label(text: &str) -> (Option<&str>, &str) {
    if let Some((head, tail)) = text.split_once(':') {
        let head = head.trim();
        if is_identifier(head) {
            return (Some(head), tail.trim());
        }
    }
    (None, text)
}

/// Splits a statement body into mnemonic and optional operand.
fn split_instruction<'a>(
    body: &'a str,
    line: usize,
    raw: &str,
) -> Result<(&'a str, Option<&'a str>), AsmError> {
    let mut tokens = body.split_whitespace();
    let syntax = || AsmError::Syntax {
        line,
        content: raw.to_owned(),
    };
    let mnemonic = tokens.next().ok_or_else(syntax)?;
    if !mnemonic.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(syntax());
    }
    let operand = tokens.next();
    if let Some(operand) = operand {
        if !is_literal(operand) && !is_identifier(operand) {
            return Err(syntax());
        }
    }
    if tokens.next().is_some() {
        return Err(syntax());
    }
    Ok((mnemonic, operand))
}
