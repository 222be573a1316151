use std::fmt;

use alvm::OpCode;

/// A 1-based line/column pair into the original source text.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn start() -> Position {
        Position { line: 1, column: 1 }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// What went wrong while lexing or assembling, independent of where
/// (`Position` carries the where).
#[derive(Clone, PartialEq, Debug)]
pub enum AsmErrorKind {
    UnexpectedToken(String),
    BadNumeric(String),
    UnknownMnemonic(String),
    UnknownRegister(String),
    BadOperandShape { opcode: OpCode, shape: &'static str },
    UnresolvedSymbol(String),
    DuplicateSymbol(String),
    UnterminatedLiteral,
}

impl fmt::Display for AsmErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AsmErrorKind::UnexpectedToken(text) => write!(f, "unexpected token {:?}", text),
            AsmErrorKind::BadNumeric(text) => write!(f, "invalid numeric literal {:?}", text),
            AsmErrorKind::UnknownMnemonic(name) => write!(f, "unknown mnemonic {:?}", name),
            AsmErrorKind::UnknownRegister(name) => write!(f, "unknown register {:?}", name),
            AsmErrorKind::BadOperandShape { opcode, shape } => {
                write!(f, "{} does not accept operand shape {}", opcode, shape)
            }
            AsmErrorKind::UnresolvedSymbol(name) => write!(f, "unresolved symbol {:?}", name),
            AsmErrorKind::DuplicateSymbol(name) => write!(f, "duplicate symbol {:?}", name),
            AsmErrorKind::UnterminatedLiteral => write!(f, "unterminated string or char literal"),
        }
    }
}

/// An assembly-time error: a `Position` plus what went wrong there.
#[derive(Clone, PartialEq, Debug)]
pub struct AsmError {
    pub pos: Position,
    pub kind: AsmErrorKind,
}

impl AsmError {
    pub fn new(pos: Position, kind: AsmErrorKind) -> AsmError {
        AsmError { pos, kind }
    }
}

impl fmt::Display for AsmError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.pos, self.kind)
    }
}

impl std::error::Error for AsmError {}
