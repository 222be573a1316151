use super::*;

fn push_imm(width: Width, imm32: u32) -> Instruction {
    let mut instr = Instruction::new(OpCode::Push);
    instr.width = width;
    instr.imm32 = imm32;
    instr
}

fn pop_into(reg: RegisterId, width: Width) -> Instruction {
    let mut instr = Instruction::new(OpCode::Pop);
    instr.reg1 = Operand::direct(reg, width);
    instr.width = width;
    instr
}

#[test]
fn push_pop_round_trip_leaves_sp_unchanged() {
    for width in [Width::Bit8, Width::Bit16, Width::Bit32] {
        let mut out = Vec::new();
        let mut engine = Engine::new(
            vec![push_imm(width, 0x2A), pop_into(RegisterId::R0, width), end()],
            &[],
            EngineConfig::default(),
            &mut out,
        );
        let sp_before = engine.register(RegisterId::Sp);
        let r0 = engine.run().unwrap();
        assert_eq!(r0, 0x2A, "width {:?}", width);
        assert_eq!(engine.register(RegisterId::Sp), sp_before, "width {:?}", width);
    }
}

#[test]
fn pop_with_no_register_discards() {
    let mut pop = Instruction::new(OpCode::Pop);
    pop.width = Width::Bit32;

    let (_, _) = run(vec![push_imm(Width::Bit32, 7), pop, end()]);
}

#[test]
fn push_past_stack_base_overflows() {
    let fault = run_expect_fault_with_config(
        vec![push_imm(Width::Bit32, 1), push_imm(Width::Bit32, 2), end()],
        EngineConfig { stack_size: 8 },
    );
    assert_eq!(fault, Fault::StackOverflow);
}

#[test]
fn pop_past_top_of_stack_underflows() {
    let mut pop = Instruction::new(OpCode::Pop);
    pop.reg1 = Operand::direct(RegisterId::R0, Width::Bit32);

    let fault = run_expect_fault(vec![pop]);
    assert_eq!(fault, Fault::StackUnderflow);
}

#[test]
fn call_and_return_keeps_sp_balanced() {
    let mut mul = Instruction::new(OpCode::Mul);
    mul.reg1 = Operand::direct(RegisterId::R0, Width::Bit32);

    let mut jump_call = Instruction::new(OpCode::Call);
    jump_call.imm32 = 3;

    let program = vec![
        mov_imm(RegisterId::R0, 7),
        jump_call,
        end(),
        mul,
        Instruction::new(OpCode::Return),
    ];

    let mut out = Vec::new();
    let mut engine = Engine::new(program, &[], EngineConfig::default(), &mut out);
    let sp_before = engine.register(RegisterId::Sp);
    engine.run().unwrap();
    assert_eq!(engine.register(RegisterId::Sp), sp_before);
}

fn run_expect_fault_with_config(instructions: Vec<Instruction>, config: EngineConfig) -> Fault {
    let mut out = Vec::new();
    let mut engine = Engine::new(instructions, &[], config, &mut out);
    engine.run().expect_err("program should fault")
}
