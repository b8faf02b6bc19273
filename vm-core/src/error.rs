use thiserror::Error;

/// Errors produced while lexing or encoding an assembly source file.
#[derive(Debug, Error)]
pub enum AsmError {
    #[error("line {line}: expected an ORG directive as the first statement")]
    MissingOrg { line: u64 },

    #[error("line {line}: unknown mnemonic '{mnemonic}'")]
    UnknownMnemonic { line: u64, mnemonic: String },

    #[error("line {line}: expected a number after the mnemonic, found '{found}'")]
    ExpectedNumber { line: u64, found: char },

    #[error("line {line}: operand {value} is out of range for this addressing mode (0-255)")]
    ImmediateOperandTooLarge { line: u64, value: u32 },

    #[error("line {line}: operand {value} is out of range (0-65535)")]
    OperandOutOfRange { line: u64, value: u64 },

    #[error("line {line}: '{mnemonic}' does not support this addressing mode")]
    UnsupportedAddressingMode { line: u64, mnemonic: String },

    #[error("line {line}: expected closing parenthesis ')', found '{found}'")]
    ExpectedCloseParen { line: u64, found: char },

    #[error("line {line}: expected a newline")]
    ExpectedNewline { line: u64 },

    #[error("mnemonic on line {line} is longer than 80 characters")]
    MnemonicTooLong { line: u64 },
}

impl AsmError {
    pub fn line(&self) -> u64 {
        match self {
            AsmError::MissingOrg { line }
            | AsmError::UnknownMnemonic { line, .. }
            | AsmError::ExpectedNumber { line, .. }
            | AsmError::ImmediateOperandTooLarge { line, .. }
            | AsmError::OperandOutOfRange { line, .. }
            | AsmError::UnsupportedAddressingMode { line, .. }
            | AsmError::ExpectedCloseParen { line, .. }
            | AsmError::ExpectedNewline { line }
            | AsmError::MnemonicTooLong { line } => *line,
        }
    }
}

/// Errors produced while loading an image or executing a program.
#[derive(Debug, Error)]
pub enum VmError {
    #[error("not a nanovm program image: bad magic number")]
    BadMagic,

    #[error("program is too large for {max_mem} bytes of memory")]
    ProgramTooLarge { max_mem: usize },

    #[error("{memory_size} bytes of memory is too small to hold the stack ({stack_bottom} bytes)")]
    MemoryTooSmallForStack {
        memory_size: usize,
        stack_bottom: usize,
    },

    #[error("image is truncated or unreadable: {0}")]
    Io(#[from] std::io::Error),

    #[error("unhandled instruction opcode {opcode} at PC ${pc:04x}")]
    UnhandledOpcode { opcode: u8, pc: u16 },

    #[error("fetch at address ${address:04x} is out of RAM bounds")]
    OutOfBounds { address: u32 },

    #[error("division by zero at PC ${pc:04x}")]
    DivisionByZero { pc: u16 },

    #[error("stack overflow: stack holds at most {max_stack} bytes")]
    StackOverflow { max_stack: usize },

    #[error("stack underflow")]
    StackUnderflow,
}
