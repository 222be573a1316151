//! Thin external-collaborator glue: reads a source file, drives `alasm`
//! then `alvm`, and maps the outcome to an exit code.

pub mod error;

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use alvm::{Engine, EngineConfig, Fault};

pub use error::Error;

pub struct Options {
    pub source_path: PathBuf,
}

/// What running a source program produced: a clean result, an assembler
/// error, or a runtime fault. Each maps to a distinct exit code.
pub enum Outcome {
    Success(u32),
    AsmFailure(alasm::AsmError),
    RuntimeFailure(Fault),
}

impl Outcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Success(_) => 0,
            Outcome::AsmFailure(_) => 2,
            Outcome::RuntimeFailure(_) => 3,
        }
    }
}

/// Assembles and runs `source`, writing program output to `out`.
pub fn run_source(source: &str, out: &mut dyn Write) -> Outcome {
    let (instructions, data) = match alasm::assemble(source) {
        Ok(program) => program,
        Err(err) => return Outcome::AsmFailure(err),
    };

    let mut engine = Engine::new(instructions, &data, EngineConfig::default(), out);
    match engine.run() {
        Ok(r0) => Outcome::Success(r0),
        Err(fault) => Outcome::RuntimeFailure(fault),
    }
}

/// Reads `options.source_path` and runs it. The only `Err` case is a
/// failure to read the file; assembler/runtime outcomes are `Ok`.
pub fn run(options: &Options, out: &mut dyn Write) -> Result<Outcome, Error> {
    let source = fs::read_to_string(&options.source_path)
        .map_err(|err| Error::Io(err, options.source_path.clone()))?;
    Ok(run_source(&source, out))
}
