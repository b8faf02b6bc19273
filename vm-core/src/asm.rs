//! The one-pass assembler: a character-at-a-time lexer feeding a
//! write-through encoder. There is no label table and no second pass —
//! every byte written to the output is final the moment it is written,
//! mirroring the grammar the original assembler implements:
//!
//! ```text
//! program   ::= ORG number statement* EOF
//! statement ::= newline | comment | mnemonic [addressing_mode] [operand] [comment]
//! number    ::= decimal | '$' hex | '%' pseudo-binary
//! ```

use std::iter::Peekable;
use std::str::Chars;

use colored::Colorize;

use crate::error::AsmError;
use crate::opcodes::{self, AddressingMode, Operation};

/// Controls the one documented behavior switch the assembler exposes.
#[derive(Debug, Clone, Copy, Default)]
pub struct AsmOptions {
    /// When `false` (the default), a `%` literal is parsed the way the
    /// original assembler's `bin_to_decimal` does: the digits after `%`
    /// are read as a *decimal* number, then that decimal value's digits
    /// are reinterpreted positionally as bits (so `%101` is decimal 101,
    /// whose digits `1,0,1` at positions 0,1,2 sum to `2^0 + 2^2 = 5`).
    /// When `true`, `%` is parsed as ordinary base-2 digits instead.
    pub strict_binary_literals: bool,
}

/// A single parsed instruction, ready to be written to the image body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub line: u64,
    pub opcode: u8,
    pub operand: Vec<u8>,
}

/// The result of assembling a source file: the origin address and the
/// instruction stream that follows it.
#[derive(Debug, Clone)]
pub struct Program {
    pub origin: u16,
    pub bytes: Vec<u8>,
}

/// A character classifier mirroring the original lexer's `is_alpha`/
/// `is_digit` predicates (digits are restricted to ASCII `0`-`9`; hex
/// digit characters beyond that are accepted separately by the number
/// reader once a `$` prefix has been seen).
fn is_alpha(c: char) -> bool {
    c.is_ascii_alphabetic()
}

fn is_digit(c: char) -> bool {
    c.is_ascii_digit()
}

fn is_hex_digit(c: char) -> bool {
    c.is_ascii_hexdigit()
}

/// Single-character-lookahead reader over the source text, tracking line
/// number the way the original `la()` (look-ahead) function does.
struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    look: Option<char>,
    line: u64,
}

impl<'a> Lexer<'a> {
    fn new(text: &'a str) -> Self {
        let mut chars = text.chars().peekable();
        let look = chars.next();
        Lexer {
            chars,
            look,
            line: 1,
        }
    }

    fn advance(&mut self) {
        if self.look == Some('\n') {
            self.line += 1;
        }
        self.look = self.chars.next();
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.look, Some(' ') | Some('\t')) {
            self.advance();
        }
    }

    fn skip_comment(&mut self) {
        while self.look.is_some() && self.look != Some('\n') {
            self.advance();
        }
        if self.look.is_some() {
            self.advance();
        }
    }

    fn expect_newline(&mut self) -> Result<(), AsmError> {
        if self.look == Some('\r') {
            self.advance();
        }
        match self.look {
            Some('\n') => {
                self.advance();
                Ok(())
            }
            _ => Err(AsmError::ExpectedNewline { line: self.line }),
        }
    }

    fn read_mnemonic(&mut self) -> Result<String, AsmError> {
        let mut buf = String::new();
        while is_alpha(self.look.unwrap_or(' ')) {
            buf.push(self.look.unwrap());
            self.advance();
            if buf.len() >= 80 {
                return Err(AsmError::MnemonicTooLong { line: self.line });
            }
        }
        Ok(buf)
    }

    /// Reads `#` for immediate mode or `(` for indirect mode; defaults to
    /// absolute. Only consumes the prefix character — the caller is
    /// responsible for validating it against what the mnemonic supports.
    fn read_addressing_prefix(&mut self) -> AddressingMode {
        self.skip_whitespace();
        match self.look {
            Some('#') => {
                self.advance();
                AddressingMode::Immediate
            }
            Some('(') => {
                self.advance();
                AddressingMode::Indirect
            }
            _ => AddressingMode::Absolute,
        }
    }

    fn read_number(&mut self, options: AsmOptions) -> Result<u32, AsmError> {
        self.skip_whitespace();
        enum Base {
            Hex,
            Bin,
            Dec,
        }
        let base = match self.look {
            Some('$') => {
                self.advance();
                Base::Hex
            }
            Some('%') => {
                self.advance();
                Base::Bin
            }
            _ => Base::Dec,
        };

        let mut digits = String::new();
        let accepts = |c: char| match base {
            Base::Hex => is_hex_digit(c),
            Base::Bin | Base::Dec => is_digit(c) || is_alpha(c),
        };
        while self.look.map(accepts).unwrap_or(false) {
            digits.push(self.look.unwrap());
            self.advance();
        }

        if digits.is_empty() {
            return Err(AsmError::ExpectedNumber {
                line: self.line,
                found: self.look.unwrap_or('\0'),
            });
        }

        let value: u64 = match base {
            Base::Hex => u64::from_str_radix(&digits, 16).unwrap_or(u64::MAX),
            Base::Dec => digits.parse().unwrap_or(u64::MAX),
            Base::Bin => {
                if options.strict_binary_literals {
                    u64::from_str_radix(&digits, 2).unwrap_or(u64::MAX)
                } else {
                    bin_to_decimal_bug_compatible(&digits)
                }
            }
        };

        if value > 65535 {
            return Err(AsmError::OperandOutOfRange {
                line: self.line,
                value,
            });
        }
        Ok(value as u32)
    }
}

/// Reproduces `bin_to_decimal` from the original assembler: treats the
/// digit string as a base-10 number, then reinterprets *that* decimal
/// value's own digits positionally as bits, least-significant digit first.
/// This is a documented historical quirk, not a sensible binary parse —
/// see [`AsmOptions::strict_binary_literals`] for the alternative.
fn bin_to_decimal_bug_compatible(digits: &str) -> u64 {
    let mut n: u64 = digits.parse().unwrap_or(0);
    let mut value: u64 = 0;
    let mut bit = 0u32;
    while n != 0 {
        let rem = n % 10;
        n /= 10;
        value += rem * (1u64 << bit);
        bit += 1;
    }
    value
}

/// Assembles a complete source file into an origin address plus program
/// bytes. This is the single entry point the `nanoasm` binary calls.
pub fn assemble(source: &str, options: AsmOptions) -> Result<Program, AsmError> {
    let mut lexer = Lexer::new(source);
    let origin = read_org_directive(&mut lexer, options)?;

    lexer.skip_whitespace();
    if lexer.look == Some(';') {
        lexer.skip_comment();
    }
    lexer.skip_whitespace();

    let mut bytes = Vec::new();
    while lexer.look.is_some() {
        if matches!(lexer.look, Some('\n') | Some('\r')) {
            lexer.expect_newline()?;
            continue;
        }
        lexer.skip_whitespace();
        match lexer.look {
            Some(';') => lexer.skip_comment(),
            Some(c) if is_alpha(c) => {
                let instruction = read_statement(&mut lexer, options)?;
                bytes.push(instruction.opcode);
                bytes.extend_from_slice(&instruction.operand);
                lexer.skip_whitespace();
                if lexer.look == Some(';') {
                    lexer.skip_comment();
                }
            }
            Some(_) | None => break,
        }
    }

    Ok(Program { origin, bytes })
}

fn read_org_directive(lexer: &mut Lexer<'_>, options: AsmOptions) -> Result<u16, AsmError> {
    lexer.skip_whitespace();
    let mnemonic = lexer.read_mnemonic()?;
    let op = opcodes::match_mnemonic(&mnemonic);
    if op != Some(Operation::Org) {
        return Err(AsmError::MissingOrg { line: lexer.line });
    }
    let value = lexer.read_number(options)?;
    if value <= 0xff {
        tracing::warn!(
            origin = value,
            "program originates in the reserved system memory area ($0000-$00FF)"
        );
    }
    Ok(value as u16)
}

fn read_statement(lexer: &mut Lexer<'_>, options: AsmOptions) -> Result<Instruction, AsmError> {
    let line = lexer.line;
    let mnemonic = lexer.read_mnemonic()?;
    let op = opcodes::match_mnemonic(&mnemonic).ok_or(AsmError::UnknownMnemonic {
        line,
        mnemonic: mnemonic.clone(),
    })?;

    let modes = opcodes::supported_modes(op);
    let takes_operand = !matches!(modes, [AddressingMode::Implied]);

    let mode = if takes_operand {
        let requested = lexer.read_addressing_prefix();
        if !modes.contains(&requested) {
            return Err(AsmError::UnsupportedAddressingMode {
                line,
                mnemonic: mnemonic.clone(),
            });
        }
        requested
    } else {
        AddressingMode::Implied
    };

    let opcode = opcodes::operation_mode_to_opcode(op, mode).ok_or(
        AsmError::UnsupportedAddressingMode {
            line,
            mnemonic: mnemonic.clone(),
        },
    )?;

    let operand = if takes_operand {
        let value = lexer.read_number(options)?;
        if mode == AddressingMode::Immediate && value > 255 {
            return Err(AsmError::ImmediateOperandTooLarge { line, value });
        }
        if mode == AddressingMode::Indirect {
            lexer.skip_whitespace();
            if lexer.look != Some(')') {
                return Err(AsmError::ExpectedCloseParen {
                    line,
                    found: lexer.look.unwrap_or('\0'),
                });
            }
            lexer.advance();
        }
        encode_operand(mode, value)
    } else {
        Vec::new()
    };

    Ok(Instruction {
        line,
        opcode: opcode.byte(),
        operand,
    })
}

/// Writes the operand bytes on the wire: immediate is a single byte,
/// absolute/indirect is the 16-bit address written high byte first.
fn encode_operand(mode: AddressingMode, value: u32) -> Vec<u8> {
    match mode {
        AddressingMode::Immediate => vec![value as u8],
        AddressingMode::Absolute | AddressingMode::Indirect => {
            vec![(value >> 8) as u8, (value & 0xff) as u8]
        }
        AddressingMode::Implied => Vec::new(),
    }
}

/// Renders an [`AsmError`] with a line of source context and a caret, the
/// way the original assembler's colored diagnostics did, but returned as a
/// string instead of being printed directly (so the caller decides whether
/// and where to print it).
pub fn render_error(source: &str, error: &AsmError) -> String {
    let line_no = error.line();
    let context = source
        .lines()
        .nth(line_no.saturating_sub(1) as usize)
        .unwrap_or("");
    format!(
        "{} {}\n  {} {}",
        "error:".red().bold(),
        error,
        format!("{line_no} |").dimmed(),
        context
    )
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn assemble_ok(source: &str) -> Program {
        assemble(source, AsmOptions::default()).expect("assembly should succeed")
    }

    #[test]
    fn org_sets_the_origin_and_emits_no_bytes() {
        let program = assemble_ok("ORG $200\nHALT\n");
        assert_eq!(program.origin, 0x200);
        assert_eq!(program.bytes, vec![opcodes::OpCode::Halt.byte()]);
    }

    #[test]
    fn immediate_mode_encodes_mnemonic_then_one_byte() {
        let program = assemble_ok("ORG $200\nLDA #5\nHALT\n");
        assert_eq!(
            program.bytes,
            vec![opcodes::OpCode::LdaImm.byte(), 5, opcodes::OpCode::Halt.byte()]
        );
    }

    #[test]
    fn absolute_mode_encodes_a_big_endian_address() {
        let program = assemble_ok("ORG $200\nLDA $1234\nHALT\n");
        assert_eq!(
            program.bytes,
            vec![
                opcodes::OpCode::LdaAbs.byte(),
                0x12,
                0x34,
                opcodes::OpCode::Halt.byte()
            ]
        );
    }

    #[test]
    fn mnemonics_are_case_insensitive() {
        let program = assemble_ok("org $200\nlda #5\nhalt\n");
        assert_eq!(program.bytes[0], opcodes::OpCode::LdaImm.byte());
    }

    #[test]
    fn jcs_and_jcc_now_carry_a_trailing_address() {
        let program = assemble_ok("ORG $200\nJCS $300\nJCC $400\nHALT\n");
        assert_eq!(
            program.bytes,
            vec![
                opcodes::OpCode::Jcs.byte(),
                0x03,
                0x00,
                opcodes::OpCode::Jcc.byte(),
                0x04,
                0x00,
                opcodes::OpCode::Halt.byte()
            ]
        );
    }

    #[test]
    fn comments_and_blank_lines_are_ignored() {
        let program = assemble_ok("ORG $200 ; entry point\n\n; a comment line\nHALT ; stop\n");
        assert_eq!(program.bytes, vec![opcodes::OpCode::Halt.byte()]);
    }

    #[test]
    fn unknown_mnemonic_is_an_error() {
        let err = assemble("ORG $200\nWAT\n", AsmOptions::default()).unwrap_err();
        assert!(matches!(err, AsmError::UnknownMnemonic { .. }));
    }

    #[test]
    fn missing_org_is_an_error() {
        let err = assemble("HALT\n", AsmOptions::default()).unwrap_err();
        assert!(matches!(err, AsmError::MissingOrg { .. }));
    }

    #[test]
    fn immediate_operand_over_255_is_rejected() {
        let err = assemble("ORG $200\nLDA #300\n", AsmOptions::default()).unwrap_err();
        assert!(matches!(err, AsmError::ImmediateOperandTooLarge { .. }));
    }

    #[test]
    fn default_binary_literal_reproduces_the_historical_bug() {
        // "%101" -> decimal 101 -> digits 1,0,1 at bit positions 0,1,2 -> 5
        let program = assemble_ok("ORG $200\nLDA #%101\nHALT\n");
        assert_eq!(program.bytes[1], 5);
    }

    #[test]
    fn strict_binary_literal_parses_natural_base_two() {
        let options = AsmOptions {
            strict_binary_literals: true,
        };
        let program = assemble("ORG $200\nLDA #%101\nHALT\n", options).unwrap();
        assert_eq!(program.bytes[1], 0b101);
    }

    #[test]
    fn jmp_indirect_requires_matching_parens() {
        let program = assemble_ok("ORG $200\nJMP($300)\nHALT\n");
        assert_eq!(program.bytes[0], opcodes::OpCode::JmpInd.byte());
    }

    #[test]
    fn sta_rejects_immediate_mode() {
        let err = assemble("ORG $200\nSTA #5\n", AsmOptions::default()).unwrap_err();
        assert!(matches!(err, AsmError::UnsupportedAddressingMode { .. }));
    }
}
