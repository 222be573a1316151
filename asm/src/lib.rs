//! Lexer and two-pass assembler for ALVM assembly source. Given source
//! text, [`assemble`] produces either an instruction sequence plus a data
//! blob, ready to hand to `alvm::Engine::new`, or a structured
//! [`AsmError`] naming the offending position.

pub mod context;
pub mod error;
pub mod lexer;
pub mod pass1;
pub mod pass2;
pub mod statement;
pub mod token;

use alvm::{Instruction, OpCode};

pub use context::AssemblerContext;
pub use error::{AsmError, AsmErrorKind, Position};

/// Assembles `source` into an instruction sequence and a data blob.
///
/// # Examples
/// ```
/// let (instructions, data) = alasm::assemble("section code\nmov r0, 2\nadd r0, 40\nend\n").unwrap();
/// assert_eq!(instructions.len(), 3);
/// assert!(data.is_empty());
/// ```
pub fn assemble(source: &str) -> Result<(Vec<Instruction>, Vec<u8>), AsmError> {
    let tokens = lexer::lex(source)?;
    let statements = statement::group_statements(&tokens)?;
    let (ctx, statements) = pass1::run(statements)?;
    let mut instructions = pass2::run(&statements, &ctx)?;

    if !matches!(instructions.last(), Some(i) if i.opcode == OpCode::End) {
        instructions.push(Instruction::new(OpCode::End));
    }

    Ok((instructions, ctx.data_blob))
}
