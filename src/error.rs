use std::fmt;

/// A fatal runtime fault. Distinct from assembler errors,
/// which live in `alasm` and never reach a running program.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Fault {
    DivideByZero,
    StackUnderflow,
    StackOverflow,
    BadJumpTarget,
    AllocFailed,
    /// Access through an indirect operand or a heap handle fell outside
    /// every addressable region. Not one of the classic runtime faults, but
    /// required by this crate's bounds-checked addressing, which it
    /// implements unconditionally.
    BadAddress,
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let text = match self {
            Fault::DivideByZero => "division by zero",
            Fault::StackUnderflow => "stack underflow",
            Fault::StackOverflow => "stack overflow",
            Fault::BadJumpTarget => "jump target out of range",
            Fault::AllocFailed => "allocation failed",
            Fault::BadAddress => "address out of bounds",
        };
        write!(f, "{}", text)
    }
}

impl std::error::Error for Fault {}
