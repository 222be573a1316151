//! Pass 2 (emit): re-walks the statements with a complete
//! [`AssemblerContext`] and emits one [`Instruction`] per instruction
//! statement.

use std::str::FromStr;

use alvm::{Instruction, OpCode, Operand, RegisterId, Width};

use crate::context::AssemblerContext;
use crate::error::{AsmError, AsmErrorKind};
use crate::statement::{RawOperand, Statement};

/// A resolved operand: either a register (possibly indirect) or a plain
/// 32-bit value, with every identifier already folded to an address.
enum Resolved {
    Reg(RegisterId, bool),
    Imm(u32),
}

fn resolve(raw: &RawOperand, ctx: &AssemblerContext, pos: crate::error::Position) -> Result<Resolved, AsmError> {
    match raw {
        RawOperand::Register { reg, indirect } => Ok(Resolved::Reg(*reg, *indirect)),
        RawOperand::Immediate(n) => Ok(Resolved::Imm(*n)),
        RawOperand::StrLiteral(_) | RawOperand::CharLiteral(_) => {
            unreachable!("pass 1 folds every inline literal into RawOperand::Immediate")
        }
        RawOperand::Ident(name) => ctx
            .resolve(name)
            .map(Resolved::Imm)
            .ok_or_else(|| AsmError::new(pos, AsmErrorKind::UnresolvedSymbol(name.clone()))),
    }
}

fn bad_shape(opcode: OpCode, shape: &'static str, pos: crate::error::Position) -> AsmError {
    AsmError::new(pos, AsmErrorKind::BadOperandShape { opcode, shape })
}

fn as_direct_reg(
    r: Resolved,
    opcode: OpCode,
    shape: &'static str,
    pos: crate::error::Position,
) -> Result<RegisterId, AsmError> {
    match r {
        Resolved::Reg(reg, false) => Ok(reg),
        _ => Err(bad_shape(opcode, shape, pos)),
    }
}

/// Builds one [`Instruction`] from a fully-resolved instruction statement.
fn build(
    opcode: OpCode,
    width: Width,
    operands: Vec<Resolved>,
    pos: crate::error::Position,
) -> Result<Instruction, AsmError> {
    let mut instr = Instruction::new(opcode);
    instr.width = width;
    let mut ops = operands.into_iter();

    macro_rules! shape_err {
        ($shape:expr) => {
            return Err(bad_shape(opcode, $shape, pos))
        };
    }

    match opcode {
        OpCode::End | OpCode::Nop | OpCode::Return => {
            if ops.next().is_some() {
                shape_err!("no operands");
            }
        }
        OpCode::Push => match (ops.next(), ops.next()) {
            (Some(Resolved::Reg(r, false)), None) => instr.reg1 = Operand::direct(r, width),
            (Some(Resolved::Imm(n)), None) => instr.imm32 = n,
            _ => shape_err!("reg | imm32"),
        },
        OpCode::Pop => match (ops.next(), ops.next()) {
            (None, None) => {}
            (Some(Resolved::Reg(r, false)), None) => instr.reg1 = Operand::direct(r, width),
            _ => shape_err!("[reg]?"),
        },
        OpCode::Mov => match (ops.next(), ops.next(), ops.next()) {
            (Some(Resolved::Reg(dst, dst_ind)), Some(Resolved::Reg(src, src_ind)), None) => {
                instr.reg1 = Operand { reg: dst, indirect: dst_ind, width };
                instr.reg2 = Operand { reg: src, indirect: src_ind, width };
            }
            (Some(Resolved::Reg(dst, dst_ind)), Some(Resolved::Imm(n)), None) => {
                instr.reg1 = Operand { reg: dst, indirect: dst_ind, width };
                instr.imm32 = n;
            }
            _ => shape_err!("(reg|[reg]), (reg|[reg]|imm)"),
        },
        OpCode::Add | OpCode::Sub => match (ops.next(), ops.next(), ops.next()) {
            (Some(Resolved::Imm(n)), None, None) => instr.imm32 = n,
            (Some(Resolved::Reg(dst, dst_ind)), Some(Resolved::Reg(src, src_ind)), None) => {
                instr.reg1 = Operand { reg: dst, indirect: dst_ind, width };
                instr.reg2 = Operand { reg: src, indirect: src_ind, width };
            }
            (Some(Resolved::Reg(dst, dst_ind)), Some(Resolved::Imm(n)), None) => {
                instr.reg1 = Operand { reg: dst, indirect: dst_ind, width };
                instr.imm32 = n;
            }
            _ => shape_err!("imm32 | (reg|[reg]), (reg|[reg]|imm)"),
        },
        OpCode::Mul | OpCode::Div | OpCode::Malloc => match (ops.next(), ops.next()) {
            (Some(Resolved::Reg(r, ind)), None) => instr.reg1 = Operand { reg: r, indirect: ind, width },
            (Some(Resolved::Imm(n)), None) => instr.imm32 = n,
            _ => shape_err!("reg | [reg] | imm"),
        },
        OpCode::Inc | OpCode::Dec => match (ops.next(), ops.next()) {
            (Some(Resolved::Reg(r, ind)), None) => instr.reg1 = Operand { reg: r, indirect: ind, width },
            _ => shape_err!("reg | [reg]"),
        },
        OpCode::Cmp => match (ops.next(), ops.next(), ops.next()) {
            (Some(Resolved::Reg(a, a_ind)), Some(Resolved::Reg(b, b_ind)), None) => {
                instr.reg1 = Operand { reg: a, indirect: a_ind, width };
                instr.reg2 = Operand { reg: b, indirect: b_ind, width };
            }
            (Some(Resolved::Reg(a, a_ind)), Some(Resolved::Imm(n)), None) => {
                instr.reg1 = Operand { reg: a, indirect: a_ind, width };
                instr.imm32 = n;
            }
            _ => shape_err!("(reg|[reg]), (reg|[reg]|imm)"),
        },
        OpCode::Jump | OpCode::CJump | OpCode::CNJump | OpCode::Call => match (ops.next(), ops.next()) {
            (Some(r @ Resolved::Reg(..)), None) => {
                instr.reg1 = Operand::direct(as_direct_reg(r, opcode, "reg | imm", pos)?, width)
            }
            (Some(Resolved::Imm(n)), None) => instr.imm32 = n,
            _ => shape_err!("reg | imm"),
        },
        OpCode::PrintInt => match (ops.next(), ops.next()) {
            (Some(Resolved::Reg(r, ind)), None) => instr.reg1 = Operand { reg: r, indirect: ind, width },
            _ => shape_err!("reg | [reg]"),
        },
        OpCode::PrintStr | OpCode::Free => match (ops.next(), ops.next()) {
            (Some(r @ Resolved::Reg(..)), None) => {
                instr.reg1 = Operand::direct(as_direct_reg(r, opcode, "reg", pos)?, width)
            }
            _ => shape_err!("reg"),
        },
    }

    Ok(instr)
}

/// Runs pass 2 over `statements`, producing the final instruction
/// sequence. `ctx` must already hold the complete result of pass 1.
pub fn run(statements: &[Statement], ctx: &AssemblerContext) -> Result<Vec<Instruction>, AsmError> {
    let mut instructions = Vec::new();

    for stmt in statements {
        let Statement::Instruction { mnemonic, width, operands, pos } = stmt else { continue };
        let pos = *pos;

        let opcode = OpCode::from_str(mnemonic)
            .map_err(|_| AsmError::new(pos, AsmErrorKind::UnknownMnemonic(mnemonic.clone())))?;
        let width = width.unwrap_or_default();

        let resolved: Vec<Resolved> =
            operands.iter().map(|op| resolve(op, ctx, pos)).collect::<Result<_, _>>()?;

        log::trace!("{}: emitting {}", pos, opcode);
        instructions.push(build(opcode, width, resolved, pos)?);
    }

    Ok(instructions)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::lexer::lex;
    use crate::pass1;
    use crate::statement::group_statements;

    fn assemble_instructions(src: &str) -> Vec<Instruction> {
        let stmts = group_statements(&lex(src).unwrap()).unwrap();
        let (ctx, stmts) = pass1::run(stmts).unwrap();
        run(&stmts, &ctx).unwrap()
    }

    #[test]
    fn add_and_mov_emit_expected_operands() {
        let instrs = assemble_instructions("section code\nmov r0, 2\nadd r0, 40\nend\n");
        assert_eq!(instrs[0].opcode, OpCode::Mov);
        assert_eq!(instrs[0].imm32, 2);
        assert_eq!(instrs[1].opcode, OpCode::Add);
        assert_eq!(instrs[1].reg1.reg, RegisterId::R0);
        assert_eq!(instrs[1].imm32, 40);
    }

    #[test]
    fn resolves_a_data_label_to_its_blob_address() {
        let instrs =
            assemble_instructions("section data\nmsg: string \"hi\"\nsection code\nmov r0, msg\npstr r0\nend\n");
        assert_eq!(instrs[0].imm32, 0);
    }

    #[test]
    fn resolves_a_code_label_to_its_instruction_index() {
        let instrs = assemble_instructions(
            "section code\nmov r1, 0\nloop:\ninc r1\ncmp r1, 3\ncjp loop\nmov r0, r1\nend\n",
        );
        let cjp = &instrs[3];
        assert_eq!(cjp.opcode, OpCode::CNJump);
        assert_eq!(cjp.imm32, 1);
    }

    #[test]
    fn unresolved_symbol_is_an_error() {
        let stmts = group_statements(&lex("section code\nmov r0, missing\nend\n").unwrap()).unwrap();
        let (ctx, stmts) = pass1::run(stmts).unwrap();
        let err = run(&stmts, &ctx).unwrap_err();
        assert!(matches!(err.kind, AsmErrorKind::UnresolvedSymbol(ref n) if n == "missing"));
    }

    #[test]
    fn unknown_mnemonic_is_an_error() {
        let stmts = group_statements(&lex("section code\nfrobnicate r0\n").unwrap()).unwrap();
        let (ctx, stmts) = pass1::run(stmts).unwrap();
        let err = run(&stmts, &ctx).unwrap_err();
        assert!(matches!(err.kind, AsmErrorKind::UnknownMnemonic(ref n) if n == "frobnicate"));
    }

    #[test]
    fn bad_operand_shape_is_an_error() {
        let stmts = group_statements(&lex("section code\nfree 5\n").unwrap()).unwrap();
        let (ctx, stmts) = pass1::run(stmts).unwrap();
        let err = run(&stmts, &ctx).unwrap_err();
        assert!(matches!(err.kind, AsmErrorKind::BadOperandShape { opcode: OpCode::Free, .. }));
    }
}
