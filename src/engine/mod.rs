//! Fetch-decode-execute loop and per-opcode semantics.

use std::io::Write;

use log::{debug, trace};

use crate::constants::{REGISTER_COUNT, STACK_SIZE};
use crate::error::Fault;
use crate::heap::Heap;
use crate::instruction::{Instruction, OpCode, Operand};
use crate::memory::Memory;
use crate::register::{RegisterId, Width};

/// Tunables for a fresh [`Engine`], made configurable rather than hardwired.
#[derive(Clone, Copy, Debug)]
pub struct EngineConfig {
    pub stack_size: u32,
}

impl Default for EngineConfig {
    fn default() -> EngineConfig {
        EngineConfig { stack_size: STACK_SIZE }
    }
}

/// Outcome of one [`Engine::step`].
pub enum Step {
    Running,
    Halted,
}

/// A single VM instance: registers, memory image, managed heap, and the
/// compiled instruction sequence it runs.
///
/// Jump and call targets are instruction indices into this sequence; `CS`
/// is carried as an informational register only; since the instruction
/// stream is not part of the addressable memory image, the "code base"
/// every target is relative to is always zero.
pub struct Engine<'out> {
    registers: [u32; REGISTER_COUNT],
    memory: Memory,
    heap: Heap,
    instructions: Vec<Instruction>,
    pc: usize,
    out: &'out mut dyn Write,
}

impl<'out> Engine<'out> {
    /// Builds a freshly initialised engine: `data` is placed at the base of
    /// the memory image, the stack region follows it, and the register file
    /// is set up to match.
    pub fn new(
        instructions: Vec<Instruction>,
        data: &[u8],
        config: EngineConfig,
        out: &'out mut dyn Write,
    ) -> Engine<'out> {
        let data_len = data.len() as u32;
        let memory = Memory::with_prefix(data, data_len + config.stack_size);

        let mut registers = [0u32; REGISTER_COUNT];
        registers[RegisterId::Ds.index()] = 0;
        registers[RegisterId::Ss.index()] = data_len.saturating_sub(1);
        registers[RegisterId::Sp.index()] = memory.length();
        registers[RegisterId::Cs.index()] = 0;

        Engine { registers, memory, heap: Heap::new(), instructions, pc: 0, out }
    }

    pub fn register(&self, id: RegisterId) -> u32 {
        self.registers[id.index()]
    }

    /// Runs until `End` or a fault, returning the final `R0`.
    pub fn run(&mut self) -> Result<u32, Fault> {
        loop {
            match self.step() {
                Ok(Step::Running) => continue,
                Ok(Step::Halted) => {
                    let result = self.registers[RegisterId::R0.index()];
                    debug!("halted, R0 = {}", result);
                    return Ok(result);
                }
                Err(fault) => {
                    debug!("fault: {}", fault);
                    return Err(fault);
                }
            }
        }
    }

    /// Executes the instruction at `PC` and advances, returning whether the
    /// program is still running.
    pub fn step(&mut self) -> Result<Step, Fault> {
        let instr = self.instructions.get(self.pc).cloned().ok_or(Fault::BadJumpTarget)?;
        trace!("pc={} opcode={}", self.pc, instr.opcode);

        match instr.opcode {
            OpCode::Nop => {
                self.pc += 1;
            }
            OpCode::End => return Ok(Step::Halted),
            OpCode::Push => {
                self.exec_push(&instr)?;
                self.pc += 1;
            }
            OpCode::Pop => {
                self.exec_pop(&instr)?;
                self.pc += 1;
            }
            OpCode::Mov => {
                self.exec_mov(&instr)?;
                self.pc += 1;
            }
            OpCode::Add => {
                self.exec_binary(&instr, u32::wrapping_add)?;
                self.pc += 1;
            }
            OpCode::Sub => {
                self.exec_binary(&instr, u32::wrapping_sub)?;
                self.pc += 1;
            }
            OpCode::Cmp => {
                self.exec_cmp(&instr)?;
                self.pc += 1;
            }
            OpCode::Inc => {
                self.exec_step_by_one(&instr, u32::wrapping_add)?;
                self.pc += 1;
            }
            OpCode::Dec => {
                self.exec_step_by_one(&instr, u32::wrapping_sub)?;
                self.pc += 1;
            }
            OpCode::Mul => {
                self.exec_mul(&instr)?;
                self.pc += 1;
            }
            OpCode::Div => {
                self.exec_div(&instr)?;
                self.pc += 1;
            }
            OpCode::Jump => {
                let target = self.jump_target(&instr)?;
                self.jump_to(target)?;
            }
            OpCode::CJump => {
                if self.registers[RegisterId::Cf.index()] == 1 {
                    let target = self.jump_target(&instr)?;
                    self.jump_to(target)?;
                } else {
                    self.pc += 1;
                }
            }
            OpCode::CNJump => {
                if self.registers[RegisterId::Cf.index()] == 0 {
                    let target = self.jump_target(&instr)?;
                    self.jump_to(target)?;
                } else {
                    self.pc += 1;
                }
            }
            OpCode::Call => {
                let target = self.jump_target(&instr)?;
                let return_to = (self.pc + 1) as u32;
                self.push_word(return_to)?;
                self.jump_to(target)?;
            }
            OpCode::Return => {
                let target = self.pop_word()?;
                self.jump_to(target)?;
            }
            OpCode::PrintInt => {
                self.exec_print_int(&instr)?;
                self.pc += 1;
            }
            OpCode::PrintStr => {
                self.exec_print_str(&instr)?;
                self.pc += 1;
            }
            OpCode::Malloc => {
                self.exec_malloc(&instr)?;
                self.pc += 1;
            }
            OpCode::Free => {
                self.exec_free(&instr)?;
                self.pc += 1;
            }
        }

        Ok(Step::Running)
    }

    fn read_value(&self, op: &Operand) -> Result<u32, Fault> {
        let raw = self.registers[op.reg.index()];
        if op.indirect {
            self.read_memory(raw, op.width)
        } else {
            Ok(op.width.truncate(raw))
        }
    }

    fn write_value(&mut self, op: &Operand, value: u32) -> Result<(), Fault> {
        if op.indirect {
            let addr = self.registers[op.reg.index()];
            self.write_memory(addr, op.width, value)
        } else {
            self.registers[op.reg.index()] = op.width.truncate(value);
            Ok(())
        }
    }

    fn read_memory(&self, addr: u32, width: Width) -> Result<u32, Fault> {
        if Heap::is_handle(addr) {
            self.heap.read(addr, width.bytes())
        } else {
            self.memory.read(addr, width.bytes())
        }
    }

    fn write_memory(&mut self, addr: u32, width: Width, value: u32) -> Result<(), Fault> {
        if Heap::is_handle(addr) {
            self.heap.write(addr, width.bytes(), value)
        } else {
            self.memory.write(addr, width.bytes(), value)
        }
    }

    fn set_flags(&mut self, res: u32, op1: u32, op2: u32, width: Width) {
        let zf = res == 0;
        let cf = res < op1 || res < op2;
        let sf = (res >> (width.bits() - 1)) & 1 == 1;
        let pf = (res & 0xFF).count_ones() % 2 == 0;

        self.registers[RegisterId::Zf.index()] = zf as u32;
        self.registers[RegisterId::Cf.index()] = cf as u32;
        self.registers[RegisterId::Sf.index()] = sf as u32;
        self.registers[RegisterId::Pf.index()] = pf as u32;
    }

    fn exec_mov(&mut self, instr: &Instruction) -> Result<(), Fault> {
        let src = if instr.reg2.is_present() {
            self.read_value(&instr.reg2)?
        } else {
            instr.width.truncate(instr.imm32)
        };
        self.write_value(&instr.reg1, src)
    }

    /// Resolves `dst`/`op1`/`op2` for `Add`/`Sub`: an absent `reg1` means
    /// the implicit `(R0, imm32)` form.
    fn binary_operands(&self, instr: &Instruction) -> Result<(Operand, u32, u32), Fault> {
        if instr.reg1.is_present() {
            let dst = instr.reg1;
            let op1 = self.read_value(&dst)?;
            let op2 = if instr.reg2.is_present() {
                self.read_value(&instr.reg2)?
            } else {
                instr.width.truncate(instr.imm32)
            };
            Ok((dst, op1, op2))
        } else {
            let dst = Operand::direct(RegisterId::R0, instr.width);
            let op1 = self.read_value(&dst)?;
            let op2 = instr.width.truncate(instr.imm32);
            Ok((dst, op1, op2))
        }
    }

    fn exec_binary(&mut self, instr: &Instruction, apply: fn(u32, u32) -> u32) -> Result<(), Fault> {
        let (dst, op1, op2) = self.binary_operands(instr)?;
        let res = instr.width.truncate(apply(op1, op2));
        self.write_value(&dst, res)?;
        self.set_flags(res, op1, op2, instr.width);
        Ok(())
    }

    fn exec_cmp(&mut self, instr: &Instruction) -> Result<(), Fault> {
        let op1 = self.read_value(&instr.reg1)?;
        let op2 = if instr.reg2.is_present() {
            self.read_value(&instr.reg2)?
        } else {
            instr.width.truncate(instr.imm32)
        };
        let res = instr.width.truncate(op1.wrapping_sub(op2));
        self.set_flags(res, op1, op2, instr.width);
        Ok(())
    }

    fn exec_step_by_one(&mut self, instr: &Instruction, apply: fn(u32, u32) -> u32) -> Result<(), Fault> {
        let op1 = self.read_value(&instr.reg1)?;
        let res = instr.width.truncate(apply(op1, 1));
        self.write_value(&instr.reg1, res)?;
        self.set_flags(res, op1, 1, Width::Bit32);
        Ok(())
    }

    fn exec_mul(&mut self, instr: &Instruction) -> Result<(), Fault> {
        let src = self.unary_source(instr)?;
        let r0 = self.registers[RegisterId::R0.index()];
        self.registers[RegisterId::R0.index()] = r0.wrapping_mul(src);
        Ok(())
    }

    fn exec_div(&mut self, instr: &Instruction) -> Result<(), Fault> {
        let src = self.unary_source(instr)?;
        if src == 0 {
            return Err(Fault::DivideByZero);
        }
        let r0 = self.registers[RegisterId::R0.index()];
        self.registers[RegisterId::R0.index()] = r0 / src;
        self.registers[RegisterId::R3.index()] = r0 % src;
        Ok(())
    }

    /// Reads a single-operand instruction's source: `reg1` (direct or
    /// indirect) if present, else the immediate (`Mul`/`Div`/`Malloc`).
    fn unary_source(&self, instr: &Instruction) -> Result<u32, Fault> {
        if instr.reg1.is_present() {
            self.read_value(&instr.reg1)
        } else {
            Ok(instr.imm32)
        }
    }

    fn push_word(&mut self, value: u32) -> Result<(), Fault> {
        self.push_raw(Width::Bit32, value)
    }

    fn pop_word(&mut self) -> Result<u32, Fault> {
        self.pop_raw(Width::Bit32)
    }

    fn push_raw(&mut self, width: Width, value: u32) -> Result<(), Fault> {
        let sp = self.registers[RegisterId::Sp.index()];
        let ss = self.registers[RegisterId::Ss.index()];
        let new_sp = sp.checked_sub(width.bytes()).ok_or(Fault::StackOverflow)?;
        if new_sp <= ss {
            return Err(Fault::StackOverflow);
        }
        self.memory.write(new_sp, width.bytes(), value)?;
        self.registers[RegisterId::Sp.index()] = new_sp;
        Ok(())
    }

    fn pop_raw(&mut self, width: Width) -> Result<u32, Fault> {
        let sp = self.registers[RegisterId::Sp.index()];
        if sp >= self.memory.length() {
            return Err(Fault::StackUnderflow);
        }
        let value = self.memory.read(sp, width.bytes())?;
        self.registers[RegisterId::Sp.index()] = sp + width.bytes();
        Ok(value)
    }

    fn exec_push(&mut self, instr: &Instruction) -> Result<(), Fault> {
        let value = if instr.reg1.is_present() {
            self.registers[instr.reg1.reg.index()]
        } else {
            instr.imm32
        };
        self.push_raw(instr.width, instr.width.truncate(value))
    }

    fn exec_pop(&mut self, instr: &Instruction) -> Result<(), Fault> {
        let value = self.pop_raw(instr.width)?;
        if instr.reg1.is_present() {
            self.registers[instr.reg1.reg.index()] = value;
        }
        Ok(())
    }

    /// Resolves a control-transfer target: the register's value if `reg1`
    /// is present, else the immediate. Both are plain instruction indices.
    fn jump_target(&self, instr: &Instruction) -> Result<u32, Fault> {
        if instr.reg1.is_present() {
            Ok(self.registers[instr.reg1.reg.index()])
        } else {
            Ok(instr.imm32)
        }
    }

    fn jump_to(&mut self, target: u32) -> Result<(), Fault> {
        if (target as usize) >= self.instructions.len() {
            return Err(Fault::BadJumpTarget);
        }
        self.pc = target as usize;
        Ok(())
    }

    fn exec_print_int(&mut self, instr: &Instruction) -> Result<(), Fault> {
        let value = self.read_value(&instr.reg1)?;
        write!(self.out, "{}", value).map_err(|_| Fault::BadAddress)
    }

    fn exec_print_str(&mut self, instr: &Instruction) -> Result<(), Fault> {
        let mut addr = self.registers[instr.reg1.reg.index()];
        loop {
            let byte = self.read_memory(addr, Width::Bit8)? as u8;
            if byte == 0 {
                break;
            }
            self.out.write_all(&[byte]).map_err(|_| Fault::BadAddress)?;
            addr += 1;
        }
        Ok(())
    }

    fn exec_malloc(&mut self, instr: &Instruction) -> Result<(), Fault> {
        let size = self.unary_source(instr)?;
        let handle = self.heap.malloc(size)?;
        self.registers[RegisterId::R0.index()] = handle;
        Ok(())
    }

    fn exec_free(&mut self, instr: &Instruction) -> Result<(), Fault> {
        let handle = self.registers[instr.reg1.reg.index()];
        self.heap.free(handle)
    }
}

#[cfg(test)]
mod tests;
