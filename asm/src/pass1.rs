//! Pass 1 (preprocess): walks the statement stream once, building the
//! [`AssemblerContext`] and resolving every inline string/char literal
//! operand into a plain immediate, so pass 2 never touches the data blob.

use crate::context::{AssemblerContext, DataEntry};
use crate::error::AsmError;
use crate::statement::{DataLiteral, RawOperand, Statement};

const DEFAULT_SECTION: &str = "code";

fn data_bytes(ty: &crate::statement::DataType, literal: &DataLiteral) -> Vec<u8> {
    use crate::statement::DataType;
    match (ty, literal) {
        (DataType::Byte, DataLiteral::Int(n)) => vec![*n as u8],
        (DataType::Word, DataLiteral::Int(n)) => (*n as u16).to_le_bytes().to_vec(),
        (DataType::Dword, DataLiteral::Int(n)) => n.to_le_bytes().to_vec(),
        (DataType::Str, DataLiteral::Str(s)) => {
            let mut bytes = s.as_bytes().to_vec();
            bytes.push(0);
            bytes
        }
        // A string-typed item given a bare int literal, or a numeric item
        // given a string literal, is a shape the grammar never produces
        // (`parse_data_literal` only emits a `Str` for `DataType::Str` and
        // an `Int` otherwise), so this arm is unreachable in practice.
        (_, DataLiteral::Int(n)) => n.to_le_bytes().to_vec(),
        (_, DataLiteral::Str(s)) => s.as_bytes().to_vec(),
    }
}

/// Runs pass 1 over `statements`, returning the built context and the
/// statements with every inline literal operand folded into a resolved
/// `Immediate`.
pub fn run(mut statements: Vec<Statement>) -> Result<(AssemblerContext, Vec<Statement>), AsmError> {
    let mut ctx = AssemblerContext::new();
    let mut current_section = DEFAULT_SECTION.to_string();

    for stmt in &mut statements {
        match stmt {
            Statement::Section { name, .. } => current_section = name.clone(),
            Statement::Label { name, pos } => {
                ctx.claim_name(name, *pos)?;
                let addr = ctx.section(&current_section).next_address;
                log::trace!("label {}:{} -> {}", current_section, name, addr);
                ctx.section(&current_section).locals.insert(name.clone(), addr);
            }
            Statement::Data { name, ty, literal, pos } => {
                ctx.claim_name(name, *pos)?;
                let bytes = data_bytes(ty, literal);
                let size = bytes.len() as u32;
                let addr = ctx.push_bytes(&bytes);
                log::trace!("data {} -> addr {} size {}", name, addr, size);
                ctx.data_table.insert(name.clone(), DataEntry { addr, size, ty: ty.clone() });
            }
            Statement::Instruction { operands, .. } => {
                for operand in operands.iter_mut() {
                    resolve_inline_literal(operand, &mut ctx);
                }
                ctx.section(&current_section).next_address += 1;
            }
        }
    }

    Ok((ctx, statements))
}

fn resolve_inline_literal(operand: &mut RawOperand, ctx: &mut AssemblerContext) {
    match operand {
        RawOperand::StrLiteral(s) => {
            let mut bytes = s.as_bytes().to_vec();
            bytes.push(0);
            let addr = ctx.push_bytes(&bytes);
            *operand = RawOperand::Immediate(addr);
        }
        RawOperand::CharLiteral(c) => {
            *operand = RawOperand::Immediate(*c as u32);
        }
        _ => {}
    }
}
