//! Groups a flat token stream into one [`Statement`] per source line
//! (the "token stream" boundary between lexing and the two
//! assembler passes).

use alvm::{RegisterId, Width};

use crate::error::{AsmError, AsmErrorKind, Position};
use crate::token::{Token, TokenKind};

#[derive(Clone, Debug)]
pub enum DataType {
    Byte,
    Word,
    Dword,
    Str,
}

#[derive(Clone, Debug)]
pub enum DataLiteral {
    Int(u32),
    Str(String),
}

/// An operand as written in source, before pass 1/2 resolve identifiers
/// and inline literals into addresses.
#[derive(Clone, Debug)]
pub enum RawOperand {
    Register { reg: RegisterId, indirect: bool },
    Immediate(u32),
    StrLiteral(String),
    CharLiteral(u8),
    Ident(String),
}

#[derive(Clone, Debug)]
pub enum Statement {
    Section { name: String, pos: Position },
    Label { name: String, pos: Position },
    Data { name: String, ty: DataType, literal: DataLiteral, pos: Position },
    Instruction { mnemonic: String, width: Option<Width>, operands: Vec<RawOperand>, pos: Position },
}

impl Statement {
    pub fn pos(&self) -> Position {
        match self {
            Statement::Section { pos, .. }
            | Statement::Label { pos, .. }
            | Statement::Data { pos, .. }
            | Statement::Instruction { pos, .. } => *pos,
        }
    }
}

struct Lines<'t> {
    tokens: &'t [Token],
    i: usize,
}

impl<'t> Lines<'t> {
    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.i)
    }

    fn next(&mut self) -> Option<&'t Token> {
        let t = self.tokens.get(self.i)?;
        self.i += 1;
        Some(t)
    }

    fn expect_ident(&mut self) -> Result<(String, Position), AsmError> {
        match self.next() {
            Some(Token { kind: TokenKind::Ident(name), pos }) => Ok((name.clone(), *pos)),
            Some(t) => Err(unexpected(t)),
            None => Err(AsmError::new(Position::start(), AsmErrorKind::UnterminatedLiteral)),
        }
    }
}

fn unexpected(t: &Token) -> AsmError {
    AsmError::new(t.pos, AsmErrorKind::UnexpectedToken(t.kind.describe()))
}

/// Splits `mnemonic.suffix` into the bare mnemonic and an optional width.
fn split_width(ident: &str, pos: Position) -> Result<(String, Option<Width>), AsmError> {
    match ident.split_once('.') {
        Some((base, suffix)) => {
            let width = suffix
                .parse::<Width>()
                .map_err(|_| AsmError::new(pos, AsmErrorKind::UnknownMnemonic(ident.to_string())))?;
            Ok((base.to_string(), Some(width)))
        }
        None => Ok((ident.to_string(), None)),
    }
}

fn parse_register(name: &str, pos: Position) -> Result<RegisterId, AsmError> {
    name.parse::<RegisterId>()
        .map_err(|_| AsmError::new(pos, AsmErrorKind::UnknownRegister(name.to_string())))
}

/// Parses one operand starting at the current token, consuming it (and,
/// for `[reg]`, the matching bracket pair).
fn parse_operand(lines: &mut Lines) -> Result<RawOperand, AsmError> {
    match lines.next() {
        Some(Token { kind: TokenKind::LBracket, pos }) => {
            let (name, reg_pos) = lines.expect_ident()?;
            let reg = parse_register(&name, reg_pos)?;
            match lines.next() {
                Some(Token { kind: TokenKind::RBracket, .. }) => {
                    Ok(RawOperand::Register { reg, indirect: true })
                }
                Some(t) => Err(unexpected(t)),
                None => Err(AsmError::new(*pos, AsmErrorKind::UnterminatedLiteral)),
            }
        }
        Some(Token { kind: TokenKind::Integer(n), .. }) => Ok(RawOperand::Immediate(*n)),
        Some(Token { kind: TokenKind::Str(s), .. }) => Ok(RawOperand::StrLiteral(s.clone())),
        Some(Token { kind: TokenKind::Char(c), .. }) => Ok(RawOperand::CharLiteral(*c)),
        Some(Token { kind: TokenKind::Ident(name), .. }) => match name.parse::<RegisterId>() {
            Ok(reg) => Ok(RawOperand::Register { reg, indirect: false }),
            Err(_) => Ok(RawOperand::Ident(name.clone())),
        },
        Some(t) => Err(unexpected(t)),
        None => Err(AsmError::new(Position::start(), AsmErrorKind::UnterminatedLiteral)),
    }
}

fn parse_operands(lines: &mut Lines) -> Result<Vec<RawOperand>, AsmError> {
    let mut operands = Vec::new();
    loop {
        match lines.peek() {
            None | Some(Token { kind: TokenKind::Newline, .. }) => break,
            _ => {}
        }
        operands.push(parse_operand(lines)?);
        match lines.peek() {
            Some(Token { kind: TokenKind::Comma, .. }) => {
                lines.next();
            }
            _ => break,
        }
    }
    Ok(operands)
}

fn parse_data_type(name: &str, pos: Position) -> Result<DataType, AsmError> {
    match name {
        "byte" => Ok(DataType::Byte),
        "word" => Ok(DataType::Word),
        "dword" => Ok(DataType::Dword),
        "string" => Ok(DataType::Str),
        _ => Err(AsmError::new(pos, AsmErrorKind::UnexpectedToken(name.to_string()))),
    }
}

fn parse_data_literal(lines: &mut Lines) -> Result<DataLiteral, AsmError> {
    match lines.next() {
        Some(Token { kind: TokenKind::Integer(n), .. }) => Ok(DataLiteral::Int(*n)),
        Some(Token { kind: TokenKind::Char(c), .. }) => Ok(DataLiteral::Int(*c as u32)),
        Some(Token { kind: TokenKind::Str(s), .. }) => Ok(DataLiteral::Str(s.clone())),
        Some(t) => Err(unexpected(t)),
        None => Err(AsmError::new(Position::start(), AsmErrorKind::UnterminatedLiteral)),
    }
}

fn finish_line(lines: &mut Lines) -> Result<(), AsmError> {
    match lines.next() {
        Some(Token { kind: TokenKind::Newline, .. }) => Ok(()),
        Some(t) => Err(unexpected(t)),
        None => Ok(()),
    }
}

/// Groups `tokens` into one [`Statement`] per non-blank source line.
pub fn group_statements(tokens: &[Token]) -> Result<Vec<Statement>, AsmError> {
    let mut lines = Lines { tokens, i: 0 };
    let mut statements = Vec::new();

    loop {
        while matches!(lines.peek(), Some(Token { kind: TokenKind::Newline, .. })) {
            lines.next();
        }
        if lines.peek().is_none() {
            break;
        }

        let (first, pos) = lines.expect_ident()?;

        if first == "section" {
            let (name, _) = lines.expect_ident()?;
            finish_line(&mut lines)?;
            statements.push(Statement::Section { name, pos });
            continue;
        }

        if matches!(lines.peek(), Some(Token { kind: TokenKind::Colon, .. })) {
            lines.next();
            if let Some(Token { kind: TokenKind::Ident(ty_name), .. }) = lines.peek().cloned() {
                if matches!(ty_name.as_str(), "byte" | "word" | "dword" | "string") {
                    let (ty_name, ty_pos) = lines.expect_ident()?;
                    let ty = parse_data_type(&ty_name, ty_pos)?;
                    let literal = parse_data_literal(&mut lines)?;
                    finish_line(&mut lines)?;
                    statements.push(Statement::Data { name: first, ty, literal, pos });
                    continue;
                }
            }
            finish_line(&mut lines)?;
            statements.push(Statement::Label { name: first, pos });
            continue;
        }

        let (mnemonic, width) = split_width(&first, pos)?;
        let operands = parse_operands(&mut lines)?;
        finish_line(&mut lines)?;
        statements.push(Statement::Instruction { mnemonic, width, operands, pos });
    }

    Ok(statements)
}
