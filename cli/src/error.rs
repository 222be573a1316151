use std::fmt;
use std::path::PathBuf;

/// Failures that abort the CLI before assembly even starts.
///
/// Assembler errors and runtime faults are not modeled here: they are
/// ordinary outcomes of running a program, reported via
/// [`crate::Outcome`] and mapped to an exit code rather than propagated
/// as a `Result::Err`.
#[derive(Debug)]
pub enum Error {
    Io(std::io::Error, PathBuf),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(err, path) => write!(f, "reading \"{}\" failed: {}", path.display(), err),
        }
    }
}

impl std::error::Error for Error {}
