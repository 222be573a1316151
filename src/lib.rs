//! Register-based virtual machine: instruction model, bounds-checked memory
//! image, managed heap, and the fetch-decode-execute engine.
//!
//! Assembly of textual source into an [`instruction::Instruction`] sequence
//! lives in the separate `alasm` crate; this crate only runs an already
//! compiled program.

pub mod constants;
pub mod engine;
pub mod error;
pub mod heap;
pub mod instruction;
pub mod memory;
pub mod register;

pub use engine::{Engine, EngineConfig, Step};
pub use error::Fault;
pub use instruction::{Instruction, OpCode, Operand};
pub use register::{RegisterId, Width};
