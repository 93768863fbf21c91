//! The capability set a module must provide.
//!
//! Every module the bridge talks to exposes one linear memory and four
//! functions. `ModuleAbi` is that contract as a trait so the bridge and the
//! invocation protocol can run against a wasmtime instance or an in-process
//! fake alike.

use std::fmt;

use crate::config::ExportNames;
use crate::error::Result;

/// A text operation implemented by the module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Evaluate a program and return its rendered result.
    Evaluate,
    /// Pretty-print a program. Empty output means "leave the source alone".
    Format,
}

impl Operation {
    /// The export implementing this operation.
    pub fn export_name(self, names: &ExportNames) -> &str {
        match self {
            Operation::Evaluate => &names.evaluate,
            Operation::Format => &names.format,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Evaluate => write!(f, "evaluate"),
            Operation::Format => write!(f, "format"),
        }
    }
}

/// Memory plus the allocate/deallocate/evaluate/format exports.
///
/// Memory views are borrowed from `self`, so no caller can hold one across
/// a call that might grow the memory.
pub trait ModuleAbi {
    /// Current view of the module's linear memory.
    fn memory(&self) -> &[u8];

    /// Current mutable view of the module's linear memory.
    fn memory_mut(&mut self) -> &mut [u8];

    /// Ask the module for `size` bytes. Returns the buffer's location.
    fn allocate(&mut self, size: u32) -> Result<u32>;

    /// Hand a buffer back to the module. `size` is the allocated length,
    /// for modules whose deallocator wants it.
    fn deallocate(&mut self, location: u32, size: u32) -> Result<()>;

    /// Run `operation` on the string at `location`. The returned location
    /// is a fresh module-allocated string owned by the caller.
    fn call(&mut self, operation: Operation, location: u32) -> Result<u32>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_export_names() {
        let names = ExportNames::default();
        assert_eq!(Operation::Evaluate.export_name(&names), "eval");
        assert_eq!(Operation::Format.export_name(&names), "format");
    }

    #[test]
    fn operation_display() {
        assert_eq!(Operation::Evaluate.to_string(), "evaluate");
        assert_eq!(Operation::Format.to_string(), "format");
    }
}
