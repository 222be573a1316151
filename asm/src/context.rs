//! The single owned value threaded through both assembler passes
//! (no process-wide statics).

use std::collections::{HashMap, HashSet};

use crate::error::{AsmError, AsmErrorKind, Position};
use crate::statement::DataType;

/// One entry in the data table: where a named datum landed in the data
/// blob, how big it is, and what kind it was declared as.
#[derive(Clone, Debug)]
pub struct DataEntry {
    pub addr: u32,
    pub size: u32,
    pub ty: DataType,
}

/// Per-section bookkeeping: how many instructions have been counted in
/// this section so far, and the labels defined within it.
#[derive(Default)]
pub struct SectionLabels {
    pub next_address: u32,
    pub locals: HashMap<String, u32>,
}

/// Everything pass 1 accumulates and pass 2 reads back: the data blob,
/// the data table, and one label table per section. Owned by the single
/// call to [`crate::assemble`]; never a `static`.
#[derive(Default)]
pub struct AssemblerContext {
    pub data_blob: Vec<u8>,
    pub data_table: HashMap<String, DataEntry>,
    pub sections: HashMap<String, SectionLabels>,
    defined_names: HashSet<String>,
}

impl AssemblerContext {
    pub fn new() -> AssemblerContext {
        AssemblerContext::default()
    }

    /// Registers `name` as used. A name is shared across the data table
    /// and every section's label table; the second definition of a name,
    /// anywhere, is a `DuplicateSymbol` error.
    pub fn claim_name(&mut self, name: &str, pos: Position) -> Result<(), AsmError> {
        if !self.defined_names.insert(name.to_string()) {
            return Err(AsmError::new(pos, AsmErrorKind::DuplicateSymbol(name.to_string())));
        }
        Ok(())
    }

    pub fn section(&mut self, name: &str) -> &mut SectionLabels {
        self.sections.entry(name.to_string()).or_default()
    }

    /// Appends `bytes` to the data blob and returns the address they
    /// landed at.
    pub fn push_bytes(&mut self, bytes: &[u8]) -> u32 {
        let addr = self.data_blob.len() as u32;
        self.data_blob.extend_from_slice(bytes);
        addr
    }

    /// Resolves an identifier operand: data table first, then every
    /// section's label table.
    pub fn resolve(&self, name: &str) -> Option<u32> {
        if let Some(entry) = self.data_table.get(name) {
            return Some(entry.addr);
        }
        for section in self.sections.values() {
            if let Some(addr) = section.locals.get(name) {
                return Some(*addr);
            }
        }
        None
    }
}
