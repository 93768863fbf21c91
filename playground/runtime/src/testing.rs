//! In-process fake module for unit tests.

use crate::abi::{ModuleAbi, Operation};
use crate::codec;
use crate::error::{BridgeError, Result};

/// A host-visible call made against the fake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Allocate(u32),
    Deallocate(u32, u32),
    Invoke(Operation, u32),
}

/// What the fake does when an operation is invoked.
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Return the input location unchanged.
    Echo,
    /// Allocate a fresh buffer holding this text and return it.
    Respond(String),
    /// Return a location whose bytes run to the end of memory unterminated.
    Unterminated,
    /// Return a buffer holding invalid UTF-8.
    InvalidUtf8,
    /// Fail as if the module trapped.
    Trap,
}

/// A module backed by a `Vec<u8>` with a bump allocator and a call log.
pub struct FakeModule {
    memory: Vec<u8>,
    next: usize,
    behavior: Behavior,
    /// Location returned by `allocate` instead of a real one.
    pub bogus_allocation: Option<u32>,
    /// Location whose release fails.
    pub failing_release: Option<u32>,
    /// Every call the host made, in order.
    pub calls: Vec<Call>,
}

impl FakeModule {
    pub fn new(memory_size: usize, behavior: Behavior) -> Self {
        Self {
            memory: vec![0; memory_size],
            // Keep location 0 unused, like a real allocator would.
            next: 8,
            behavior,
            bogus_allocation: None,
            failing_release: None,
            calls: Vec::new(),
        }
    }

    fn bump(&mut self, size: usize) -> Result<u32> {
        if self.next + size > self.memory.len() {
            return Err(BridgeError::Allocation {
                size,
                reason: "fake memory exhausted".to_string(),
            });
        }
        let location = self.next;
        self.next += size;
        Ok(location as u32)
    }

    /// Place raw bytes into memory at `location`.
    pub fn poke(&mut self, location: usize, bytes: &[u8]) {
        self.memory[location..location + bytes.len()].copy_from_slice(bytes);
    }

    pub fn releases(&self) -> Vec<u32> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Deallocate(location, _) => Some(*location),
                _ => None,
            })
            .collect()
    }
}

impl ModuleAbi for FakeModule {
    fn memory(&self) -> &[u8] {
        &self.memory
    }

    fn memory_mut(&mut self) -> &mut [u8] {
        &mut self.memory
    }

    fn allocate(&mut self, size: u32) -> Result<u32> {
        self.calls.push(Call::Allocate(size));
        match self.bogus_allocation {
            Some(location) => Ok(location),
            None => self.bump(size as usize),
        }
    }

    fn deallocate(&mut self, location: u32, size: u32) -> Result<()> {
        self.calls.push(Call::Deallocate(location, size));
        if self.failing_release == Some(location) {
            return Err(BridgeError::Trap {
                export: "dealloc".to_string(),
                message: "double free".to_string(),
            });
        }
        Ok(())
    }

    fn call(&mut self, operation: Operation, location: u32) -> Result<u32> {
        self.calls.push(Call::Invoke(operation, location));
        match self.behavior.clone() {
            Behavior::Echo => Ok(location),
            Behavior::Respond(text) => {
                let bytes = codec::encode(&text);
                let result = self.bump(bytes.len())?;
                self.poke(result as usize, &bytes);
                Ok(result)
            }
            Behavior::Unterminated => {
                let start = self.memory.len() - 4;
                self.poke(start, b"tail");
                Ok(start as u32)
            }
            Behavior::InvalidUtf8 => {
                let result = self.bump(3)?;
                self.poke(result as usize, &[0xFF, 0xFE, 0]);
                Ok(result)
            }
            Behavior::Trap => Err(BridgeError::Trap {
                export: operation.to_string(),
                message: "unreachable".to_string(),
            }),
        }
    }
}
