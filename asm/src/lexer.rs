//! Turns source text into a flat token stream, per the assembly dialect's
//! informal grammar. Whitespace-separated tokens, `;` comments to end of
//! line, newlines kept as explicit statement separators.

use crate::error::{AsmError, AsmErrorKind, Position};
use crate::token::{Token, TokenKind};

struct Lexer {
    chars: Vec<char>,
    i: usize,
    line: u32,
    column: u32,
}

impl Lexer {
    fn new(source: &str) -> Lexer {
        Lexer { chars: source.chars().collect(), i: 0, line: 1, column: 1 }
    }

    fn pos(&self) -> Position {
        Position { line: self.line, column: self.column }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.i).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.i + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.i += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn error(&self, pos: Position, kind: AsmErrorKind) -> AsmError {
        AsmError::new(pos, kind)
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

/// Tokenizes `source` into a flat stream ending in a trailing `Newline`.
pub fn lex(source: &str) -> Result<Vec<Token>, AsmError> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();

    while let Some(c) = lexer.peek() {
        let pos = lexer.pos();
        match c {
            ' ' | '\t' | '\r' => {
                lexer.advance();
            }
            ';' => {
                while let Some(c) = lexer.peek() {
                    if c == '\n' {
                        break;
                    }
                    lexer.advance();
                }
            }
            '\n' => {
                lexer.advance();
                tokens.push(Token { kind: TokenKind::Newline, pos });
            }
            ',' => {
                lexer.advance();
                tokens.push(Token { kind: TokenKind::Comma, pos });
            }
            ':' => {
                lexer.advance();
                tokens.push(Token { kind: TokenKind::Colon, pos });
            }
            '[' => {
                lexer.advance();
                tokens.push(Token { kind: TokenKind::LBracket, pos });
            }
            ']' => {
                lexer.advance();
                tokens.push(Token { kind: TokenKind::RBracket, pos });
            }
            '"' => tokens.push(lex_string(&mut lexer, pos)?),
            '\'' => tokens.push(lex_char(&mut lexer, pos)?),
            c if c.is_ascii_digit() => tokens.push(lex_number(&mut lexer, pos)?),
            '-' if lexer.peek_at(1).is_some_and(|n| n.is_ascii_digit()) => {
                tokens.push(lex_number(&mut lexer, pos)?)
            }
            c if is_ident_start(c) => tokens.push(lex_ident(&mut lexer, pos)),
            other => {
                lexer.advance();
                return Err(lexer.error(pos, AsmErrorKind::UnexpectedToken(other.to_string())));
            }
        }
    }

    tokens.push(Token { kind: TokenKind::Newline, pos: lexer.pos() });
    Ok(tokens)
}

fn lex_ident(lexer: &mut Lexer, pos: Position) -> Token {
    let mut text = String::new();
    while let Some(c) = lexer.peek() {
        if !is_ident_continue(c) {
            break;
        }
        text.push(c);
        lexer.advance();
    }
    Token { kind: TokenKind::Ident(text), pos }
}

fn lex_number(lexer: &mut Lexer, pos: Position) -> Result<Token, AsmError> {
    let mut text = String::new();
    if lexer.peek() == Some('-') {
        text.push('-');
        lexer.advance();
    }

    if lexer.peek() == Some('0') && matches!(lexer.peek_at(1), Some('x') | Some('X')) {
        text.push(lexer.advance().unwrap());
        text.push(lexer.advance().unwrap());
        let mut digits = String::new();
        while let Some(c) = lexer.peek() {
            if !c.is_ascii_hexdigit() {
                break;
            }
            digits.push(c);
            lexer.advance();
        }
        let value = u32::from_str_radix(&digits, 16)
            .map_err(|_| lexer.error(pos, AsmErrorKind::BadNumeric(format!("{}{}", text, digits))))?;
        return Ok(Token { kind: TokenKind::Integer(value), pos });
    }

    while let Some(c) = lexer.peek() {
        if !c.is_ascii_digit() {
            break;
        }
        text.push(c);
        lexer.advance();
    }

    let signed: i64 =
        text.parse().map_err(|_| lexer.error(pos, AsmErrorKind::BadNumeric(text.clone())))?;
    Ok(Token { kind: TokenKind::Integer(signed as u32), pos })
}

fn lex_string(lexer: &mut Lexer, pos: Position) -> Result<Token, AsmError> {
    lexer.advance(); // opening quote
    let mut text = String::new();
    loop {
        match lexer.peek() {
            None | Some('\n') => return Err(lexer.error(pos, AsmErrorKind::UnterminatedLiteral)),
            Some('"') => {
                lexer.advance();
                break;
            }
            Some('\\') => {
                lexer.advance();
                text.push(unescape(lexer.advance(), lexer, pos)?);
            }
            Some(c) => {
                text.push(c);
                lexer.advance();
            }
        }
    }
    Ok(Token { kind: TokenKind::Str(text), pos })
}

fn lex_char(lexer: &mut Lexer, pos: Position) -> Result<Token, AsmError> {
    lexer.advance(); // opening quote
    let value = match lexer.peek() {
        Some('\\') => {
            lexer.advance();
            unescape(lexer.advance(), lexer, pos)?
        }
        Some(c) => {
            lexer.advance();
            c
        }
        None => return Err(lexer.error(pos, AsmErrorKind::UnterminatedLiteral)),
    };
    if lexer.peek() != Some('\'') {
        return Err(lexer.error(pos, AsmErrorKind::UnterminatedLiteral));
    }
    lexer.advance();
    Ok(Token { kind: TokenKind::Char(value as u8), pos })
}

fn unescape(c: Option<char>, lexer: &Lexer, pos: Position) -> Result<char, AsmError> {
    match c {
        Some('n') => Ok('\n'),
        Some('t') => Ok('\t'),
        Some('0') => Ok('\0'),
        Some('\\') => Ok('\\'),
        Some('\'') => Ok('\''),
        Some('"') => Ok('"'),
        _ => Err(lexer.error(pos, AsmErrorKind::UnterminatedLiteral)),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn lexes_an_instruction_line() {
        let tokens = lex("mov r0, 2\n").unwrap();
        assert_eq!(
            tokens.iter().map(|t| t.kind.clone()).collect::<Vec<_>>(),
            vec![
                TokenKind::Ident("mov".to_string()),
                TokenKind::Ident("r0".to_string()),
                TokenKind::Comma,
                TokenKind::Integer(2),
                TokenKind::Newline,
                TokenKind::Newline,
            ]
        );
    }

    #[test]
    fn strips_comments_to_end_of_line() {
        let tokens = lex("nop ; a comment\nend\n").unwrap();
        let idents: Vec<_> = tokens
            .iter()
            .filter_map(|t| match &t.kind {
                TokenKind::Ident(s) => Some(s.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(idents, vec!["nop", "end"]);
    }

    #[test]
    fn lexes_hex_and_decimal_integers() {
        let tokens = lex("0x2A 42\n").unwrap();
        let ints: Vec<_> = tokens
            .iter()
            .filter_map(|t| match t.kind {
                TokenKind::Integer(n) => Some(n),
                _ => None,
            })
            .collect();
        assert_eq!(ints, vec![42, 42]);
    }

    #[test]
    fn lexes_string_and_char_literals() {
        let tokens = lex("\"hi\" 'a'\n").unwrap();
        assert!(matches!(tokens[0].kind, TokenKind::Str(ref s) if s == "hi"));
        assert!(matches!(tokens[1].kind, TokenKind::Char(b'a')));
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let err = lex("\"oops\n").unwrap_err();
        assert_eq!(err.kind, AsmErrorKind::UnterminatedLiteral);
    }

    #[test]
    fn unknown_character_is_an_error() {
        let err = lex("mov r0, 2 $\n").unwrap_err();
        assert_eq!(err.kind, AsmErrorKind::UnexpectedToken("$".to_string()));
    }
}
