//! The mnemonic table, the numeric opcode table, and the mapping between
//! them. Mirrors the shape of a 6502-style `opcodes.rs`: a small `enum` for
//! the mnemonic, a numeric `enum` for the wire opcode, and parallel tables
//! indexed by opcode byte rather than a scattered set of `if`s.

use std::fmt;

/// One of the 48 assembler mnemonics. `Org` is a pseudo-operation: it never
/// appears in the program body, only as the leading directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Org,
    Lda,
    Sta,
    Add,
    Sub,
    Mul,
    Div,
    Jmp,
    Jeq,
    Jne,
    Halt,
    In,
    Out,
    Jsr,
    Rts,
    Cmp,
    Pusha,
    Popa,
    Shl,
    Shr,
    Inc,
    Dec,
    Nop,
    Ldx,
    Ldy,
    Stx,
    Sty,
    Cpx,
    Cpy,
    Tax,
    Tay,
    Txa,
    Tya,
    Inx,
    Iny,
    Dex,
    Dey,
    Neg,
    Dup,
    Swap,
    And,
    Or,
    Xor,
    Not,
    Clc,
    Sec,
    Jcs,
    Jcc,
}

/// The mnemonic table in declaration order. Order is not load-bearing for
/// this implementation (the original assembler used positional indices into
/// this exact list; we match by name instead), but it is kept in the
/// original's order for readability when comparing against the C source.
pub const MNEMONICS: &[(&str, Operation)] = &[
    ("LDA", Operation::Lda),
    ("STA", Operation::Sta),
    ("ADD", Operation::Add),
    ("SUB", Operation::Sub),
    ("MUL", Operation::Mul),
    ("DIV", Operation::Div),
    ("JMP", Operation::Jmp),
    ("JEQ", Operation::Jeq),
    ("JNE", Operation::Jne),
    ("HALT", Operation::Halt),
    ("IN", Operation::In),
    ("OUT", Operation::Out),
    ("ORG", Operation::Org),
    ("JSR", Operation::Jsr),
    ("RTS", Operation::Rts),
    ("CMP", Operation::Cmp),
    ("PUSHA", Operation::Pusha),
    ("POPA", Operation::Popa),
    ("SHL", Operation::Shl),
    ("SHR", Operation::Shr),
    ("INC", Operation::Inc),
    ("DEC", Operation::Dec),
    ("NOP", Operation::Nop),
    ("LDX", Operation::Ldx),
    ("LDY", Operation::Ldy),
    ("STX", Operation::Stx),
    ("STY", Operation::Sty),
    ("CPX", Operation::Cpx),
    ("CPY", Operation::Cpy),
    ("TAX", Operation::Tax),
    ("TAY", Operation::Tay),
    ("TXA", Operation::Txa),
    ("TYA", Operation::Tya),
    ("INX", Operation::Inx),
    ("INY", Operation::Iny),
    ("DEX", Operation::Dex),
    ("DEY", Operation::Dey),
    ("NEG", Operation::Neg),
    ("DUP", Operation::Dup),
    ("SWAP", Operation::Swap),
    ("AND", Operation::And),
    ("OR", Operation::Or),
    ("XOR", Operation::Xor),
    ("NOT", Operation::Not),
    ("CLC", Operation::Clc),
    ("SEC", Operation::Sec),
    ("JCS", Operation::Jcs),
    ("JCC", Operation::Jcc),
];

/// Looks up a mnemonic case-insensitively, the way `striccmp` does in the
/// original assembler.
pub fn match_mnemonic(text: &str) -> Option<Operation> {
    MNEMONICS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(text))
        .map(|(_, op)| *op)
}

/// The addressing mode an encoded instruction carries. `Implied` means the
/// instruction has no operand bytes at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressingMode {
    Absolute,
    Immediate,
    Indirect,
    Implied,
}

/// Which addressing modes a mnemonic accepts. Used by both the encoder (to
/// reject `LDA (1234)`) and by documentation/tests.
pub fn supported_modes(op: Operation) -> &'static [AddressingMode] {
    use AddressingMode::*;
    match op {
        Operation::Lda
        | Operation::Add
        | Operation::Sub
        | Operation::Mul
        | Operation::Div
        | Operation::Cmp
        | Operation::Ldx
        | Operation::Ldy
        | Operation::And
        | Operation::Or
        | Operation::Xor => &[Absolute, Immediate],
        Operation::Jmp => &[Absolute, Indirect],
        Operation::Sta
        | Operation::Jeq
        | Operation::Jne
        | Operation::Jsr
        | Operation::Stx
        | Operation::Sty
        | Operation::Cpx
        | Operation::Cpy
        | Operation::Jcs
        | Operation::Jcc => &[Absolute],
        Operation::Org => &[Absolute],
        _ => &[Implied],
    }
}

/// The 61 numeric wire opcodes, 0 through 60, exactly as laid out in the
/// original `opcodes.h`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OpCode {
    LdaImm = 0,
    LdaAbs = 1,
    Sta = 2,
    AddImm = 3,
    AddAbs = 4,
    SubImm = 5,
    SubAbs = 6,
    MulImm = 7,
    MulAbs = 8,
    DivImm = 9,
    DivAbs = 10,
    Jmp = 11,
    Jeq = 12,
    Jne = 13,
    Halt = 14,
    In = 15,
    Out = 16,
    Jsr = 17,
    Rts = 18,
    CmpImm = 19,
    CmpAbs = 20,
    JmpInd = 21,
    Pusha = 22,
    Popa = 23,
    Shl = 24,
    Shr = 25,
    Inc = 26,
    Dec = 27,
    Nop = 28,
    LdxImm = 29,
    LdxAbs = 30,
    LdyImm = 31,
    LdyAbs = 32,
    Stx = 33,
    Sty = 34,
    CpxImm = 35,
    CpxAbs = 36,
    CpyImm = 37,
    CpyAbs = 38,
    Tax = 39,
    Tay = 40,
    Txa = 41,
    Tya = 42,
    Inx = 43,
    Iny = 44,
    Dex = 45,
    Dey = 46,
    Neg = 47,
    Dup = 48,
    Swap = 49,
    AndImm = 50,
    AndAbs = 51,
    OrImm = 52,
    OrAbs = 53,
    XorImm = 54,
    XorAbs = 55,
    Not = 56,
    Clc = 57,
    Sec = 58,
    Jcs = 59,
    Jcc = 60,
}

impl OpCode {
    pub fn from_byte(byte: u8) -> Option<OpCode> {
        OPCODE_TABLE.get(byte as usize).copied().flatten()
    }

    pub const fn byte(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", OPCODE_STRING_TABLE[self.byte() as usize])
    }
}

/// Resolves `(Operation, AddressingMode)` to the numeric opcode that
/// encodes it. This is the single source of truth the encoder writes from;
/// `ADDRESSING_MODE_TABLE` below is its inverse, derived from the same
/// pairs, so the two can never drift apart from one another.
pub fn operation_mode_to_opcode(op: Operation, mode: AddressingMode) -> Option<OpCode> {
    use AddressingMode::*;
    use OpCode::*;
    use Operation as P;
    Some(match (op, mode) {
        (P::Lda, Absolute) => LdaAbs,
        (P::Lda, Immediate) => LdaImm,
        (P::Sta, Absolute) => Sta,
        (P::Add, Absolute) => AddAbs,
        (P::Add, Immediate) => AddImm,
        (P::Sub, Absolute) => SubAbs,
        (P::Sub, Immediate) => SubImm,
        (P::Mul, Absolute) => MulAbs,
        (P::Mul, Immediate) => MulImm,
        (P::Div, Absolute) => DivAbs,
        (P::Div, Immediate) => DivImm,
        (P::Jmp, Absolute) => Jmp,
        (P::Jmp, Indirect) => JmpInd,
        (P::Jeq, Absolute) => Jeq,
        (P::Jne, Absolute) => Jne,
        (P::Halt, Implied) => Halt,
        (P::In, Implied) => In,
        (P::Out, Implied) => Out,
        (P::Jsr, Absolute) => Jsr,
        (P::Rts, Implied) => Rts,
        (P::Cmp, Absolute) => CmpAbs,
        (P::Cmp, Immediate) => CmpImm,
        (P::Pusha, Implied) => Pusha,
        (P::Popa, Implied) => Popa,
        (P::Shl, Implied) => Shl,
        (P::Shr, Implied) => Shr,
        (P::Inc, Implied) => Inc,
        (P::Dec, Implied) => Dec,
        (P::Nop, Implied) => Nop,
        (P::Ldx, Absolute) => LdxAbs,
        (P::Ldx, Immediate) => LdxImm,
        (P::Ldy, Absolute) => LdyAbs,
        (P::Ldy, Immediate) => LdyImm,
        (P::Stx, Absolute) => Stx,
        (P::Sty, Absolute) => Sty,
        (P::Cpx, Absolute) => CpxAbs,
        (P::Cpx, Immediate) => CpxImm,
        (P::Cpy, Absolute) => CpyAbs,
        (P::Cpy, Immediate) => CpyImm,
        (P::Tax, Implied) => Tax,
        (P::Tay, Implied) => Tay,
        (P::Txa, Implied) => Txa,
        (P::Tya, Implied) => Tya,
        (P::Inx, Implied) => Inx,
        (P::Iny, Implied) => Iny,
        (P::Dex, Implied) => Dex,
        (P::Dey, Implied) => Dey,
        (P::Neg, Implied) => Neg,
        (P::Dup, Implied) => Dup,
        (P::Swap, Implied) => Swap,
        (P::And, Absolute) => AndAbs,
        (P::And, Immediate) => AndImm,
        (P::Or, Absolute) => OrAbs,
        (P::Or, Immediate) => OrImm,
        (P::Xor, Absolute) => XorAbs,
        (P::Xor, Immediate) => XorImm,
        (P::Not, Implied) => Not,
        (P::Clc, Implied) => Clc,
        (P::Sec, Implied) => Sec,
        // JCS/JCC now carry a trailing absolute address like every other
        // conditional jump; see the design notes on why this diverges from
        // the original assembler, which emitted them with no operand at
        // all.
        (P::Jcs, Absolute) => Jcs,
        (P::Jcc, Absolute) => Jcc,
        (P::Org, _) => return None,
        _ => return None,
    })
}

/// How many operand bytes follow an opcode on the wire.
pub const fn operand_len(mode: AddressingMode) -> usize {
    match mode {
        AddressingMode::Absolute | AddressingMode::Indirect => 2,
        AddressingMode::Immediate => 1,
        AddressingMode::Implied => 0,
    }
}

macro_rules! opcode_tables {
    ($($byte:expr => $variant:ident, $mode:ident, $name:expr;)*) => {
        /// `OPCODE_TABLE[byte]` is `Some(OpCode)` for every byte that is a
        /// valid wire opcode.
        pub static OPCODE_TABLE: [Option<OpCode>; 61] = {
            let mut table = [None; 61];
            $(table[$byte] = Some(OpCode::$variant);)*
            table
        };

        /// `ADDRESSING_MODE_TABLE[byte]` is the addressing mode the VM uses
        /// to fetch that opcode's operand.
        pub static ADDRESSING_MODE_TABLE: [AddressingMode; 61] = {
            let mut table = [AddressingMode::Implied; 61];
            $(table[$byte] = AddressingMode::$mode;)*
            table
        };

        /// `OPCODE_STRING_TABLE[byte]` names the opcode for diagnostics.
        pub static OPCODE_STRING_TABLE: [&str; 61] = {
            let mut table = [""; 61];
            $(table[$byte] = $name;)*
            table
        };
    };
}

opcode_tables! {
    0 => LdaImm, Immediate, "LDA_IMM";
    1 => LdaAbs, Absolute, "LDA_ABS";
    2 => Sta, Absolute, "STA";
    3 => AddImm, Immediate, "ADD_IMM";
    4 => AddAbs, Absolute, "ADD_ABS";
    5 => SubImm, Immediate, "SUB_IMM";
    6 => SubAbs, Absolute, "SUB_ABS";
    7 => MulImm, Immediate, "MUL_IMM";
    8 => MulAbs, Absolute, "MUL_ABS";
    9 => DivImm, Immediate, "DIV_IMM";
    10 => DivAbs, Absolute, "DIV_ABS";
    11 => Jmp, Absolute, "JMP";
    12 => Jeq, Absolute, "JEQ";
    13 => Jne, Absolute, "JNE";
    14 => Halt, Implied, "HALT";
    15 => In, Implied, "IN";
    16 => Out, Implied, "OUT";
    17 => Jsr, Absolute, "JSR";
    18 => Rts, Implied, "RTS";
    19 => CmpImm, Immediate, "CMP_IMM";
    20 => CmpAbs, Absolute, "CMP_ABS";
    21 => JmpInd, Indirect, "JMP_IND";
    22 => Pusha, Implied, "PUSHA";
    23 => Popa, Implied, "POPA";
    24 => Shl, Implied, "SHL";
    25 => Shr, Implied, "SHR";
    26 => Inc, Implied, "INC";
    27 => Dec, Implied, "DEC";
    28 => Nop, Implied, "NOP";
    29 => LdxImm, Immediate, "LDX_IMM";
    30 => LdxAbs, Absolute, "LDX_ABS";
    31 => LdyImm, Immediate, "LDY_IMM";
    32 => LdyAbs, Absolute, "LDY_ABS";
    33 => Stx, Absolute, "STX";
    34 => Sty, Absolute, "STY";
    35 => CpxImm, Immediate, "CPX_IMM";
    36 => CpxAbs, Absolute, "CPX_ABS";
    37 => CpyImm, Immediate, "CPY_IMM";
    38 => CpyAbs, Absolute, "CPY_ABS";
    39 => Tax, Implied, "TAX";
    40 => Tay, Implied, "TAY";
    41 => Txa, Implied, "TXA";
    42 => Tya, Implied, "TYA";
    43 => Inx, Implied, "INX";
    44 => Iny, Implied, "INY";
    45 => Dex, Implied, "DEX";
    46 => Dey, Implied, "DEY";
    47 => Neg, Implied, "NEG";
    48 => Dup, Implied, "DUP";
    49 => Swap, Implied, "SWAP";
    50 => AndImm, Immediate, "AND_IMM";
    51 => AndAbs, Absolute, "AND_ABS";
    52 => OrImm, Immediate, "OR_IMM";
    53 => OrAbs, Absolute, "OR_ABS";
    54 => XorImm, Immediate, "XOR_IMM";
    55 => XorAbs, Absolute, "XOR_ABS";
    56 => Not, Implied, "NOT";
    57 => Clc, Implied, "CLC";
    58 => Sec, Implied, "SEC";
    59 => Jcs, Absolute, "JCS";
    60 => Jcc, Absolute, "JCC";
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn mnemonics_are_case_insensitive() {
        assert_eq!(match_mnemonic("lda"), Some(Operation::Lda));
        assert_eq!(match_mnemonic("Lda"), Some(Operation::Lda));
        assert_eq!(match_mnemonic("LDA"), Some(Operation::Lda));
        assert_eq!(match_mnemonic("nope"), None);
    }

    #[test]
    fn every_opcode_round_trips_through_the_tables() {
        for byte in 0u8..=60 {
            let opcode = OpCode::from_byte(byte).expect("opcode table is dense 0..=60");
            assert_eq!(opcode.byte(), byte);
        }
        assert!(OpCode::from_byte(61).is_none());
    }

    #[test]
    fn dual_mode_mnemonics_encode_to_distinct_opcodes() {
        let abs = operation_mode_to_opcode(Operation::Lda, AddressingMode::Absolute).unwrap();
        let imm = operation_mode_to_opcode(Operation::Lda, AddressingMode::Immediate).unwrap();
        assert_ne!(abs.byte(), imm.byte());
    }

    #[test]
    fn jcs_jcc_now_require_an_absolute_operand() {
        assert!(operation_mode_to_opcode(Operation::Jcs, AddressingMode::Absolute).is_some());
        assert!(operation_mode_to_opcode(Operation::Jcs, AddressingMode::Implied).is_none());
    }
}
