//! Reading and writing strings in module memory.
//!
//! Two allocators share one memory region: buffers the host asks the module
//! to allocate for input ([`HostBuffer`]) and buffers the module allocates
//! for its results ([`ModuleBuffer`]). They are distinct types with their own
//! release methods, and both are consumed on release so a buffer cannot be
//! freed twice.
//!
//! Nothing here caches a memory view. Each access borrows a fresh slice from
//! the module, since the module may grow (and relocate) its memory during any
//! export call.

use tracing::warn;

use crate::abi::{ModuleAbi, Operation};
use crate::codec::{self, SENTINEL};
use crate::error::{BridgeError, Result};

/// Return the bytes from `location` up to, not including, the sentinel.
///
/// Fails with `OutOfBounds` if the sentinel is not found before the end of
/// `memory`. Never looks past the slice.
pub fn scan_terminated(memory: &[u8], location: u32) -> Result<&[u8]> {
    let out_of_bounds = || BridgeError::OutOfBounds {
        location,
        memory_size: memory.len(),
    };

    let tail = memory.get(location as usize..).ok_or_else(out_of_bounds)?;
    let end = tail
        .iter()
        .position(|&b| b == SENTINEL)
        .ok_or_else(out_of_bounds)?;
    Ok(&tail[..end])
}

/// Length of a buffer holding `content` bytes plus the sentinel.
fn terminated_len(location: u32, content: usize, memory_size: usize) -> Result<u32> {
    content
        .checked_add(1)
        .and_then(|len| u32::try_from(len).ok())
        .ok_or(BridgeError::OutOfBounds {
            location,
            memory_size,
        })
}

/// Scan and decode the string at `location`.
pub fn read_terminated(memory: &[u8], location: u32) -> Result<String> {
    codec::decode(scan_terminated(memory, location)?)
}

/// An input buffer the host had the module allocate and then filled.
#[must_use = "host buffers must be released or surrendered to the module"]
#[derive(Debug, PartialEq, Eq)]
pub struct HostBuffer {
    location: u32,
    len: u32,
}

impl HostBuffer {
    pub fn location(&self) -> u32 {
        self.location
    }

    /// Allocated length, sentinel included.
    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len <= 1
    }

    /// Give up the buffer without releasing it. The module now owns it.
    pub fn surrender(self) {}

    /// The module returned this buffer as its result; it is released by the
    /// result rule from here on.
    pub fn into_result(self) -> ModuleBuffer {
        ModuleBuffer {
            location: self.location,
            len: self.len,
        }
    }
}

/// A result buffer allocated by the module and handed to the host.
#[must_use = "module buffers must be released after reading"]
#[derive(Debug, PartialEq, Eq)]
pub struct ModuleBuffer {
    location: u32,
    len: u32,
}

impl ModuleBuffer {
    pub fn location(&self) -> u32 {
        self.location
    }

    /// Length up to and including the sentinel.
    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len <= 1
    }
}

/// The only path through which the host touches module memory.
pub struct MemoryBridge<'a, M: ModuleAbi + ?Sized> {
    module: &'a mut M,
}

impl<'a, M: ModuleAbi + ?Sized> MemoryBridge<'a, M> {
    pub fn new(module: &'a mut M) -> Self {
        Self { module }
    }

    /// Encode `text`, allocate room for it in the module and copy it in.
    pub fn write(&mut self, text: &str) -> Result<HostBuffer> {
        let bytes = codec::encode(text);
        let size = u32::try_from(bytes.len()).map_err(|_| BridgeError::Allocation {
            size: bytes.len(),
            reason: "exceeds the 32-bit address space".to_string(),
        })?;

        let location = self.module.allocate(size)?;

        let memory = self.module.memory_mut();
        let memory_size = memory.len();
        let region = (location as usize)
            .checked_add(bytes.len())
            .and_then(|end| memory.get_mut(location as usize..end))
            .ok_or_else(|| BridgeError::Allocation {
                size: bytes.len(),
                reason: format!(
                    "module returned location {} outside {} bytes of memory",
                    location, memory_size
                ),
            })?;
        region.copy_from_slice(&bytes);

        Ok(HostBuffer {
            location,
            len: size,
        })
    }

    /// Read the sentinel-terminated string at `location`.
    pub fn read(&self, location: u32) -> Result<String> {
        read_terminated(self.module.memory(), location)
    }

    /// Invoke an export on a host buffer. Returns the result location.
    pub fn call(&mut self, operation: Operation, input: &HostBuffer) -> Result<u32> {
        self.module.call(operation, input.location)
    }

    /// Take ownership of a result location returned by the module.
    ///
    /// The location is validated first: if no sentinel exists before the end
    /// of memory it is not a buffer, and nothing is handed out to release.
    pub fn adopt(&self, location: u32) -> Result<ModuleBuffer> {
        let memory = self.module.memory();
        let content = scan_terminated(memory, location)?;
        Ok(ModuleBuffer {
            location,
            len: terminated_len(location, content.len(), memory.len())?,
        })
    }

    /// Copy a result buffer's text out of module memory.
    pub fn read_buffer(&self, buffer: &ModuleBuffer) -> Result<String> {
        self.read(buffer.location)
    }

    /// Return an input buffer to the module's allocator.
    pub fn release_input(&mut self, buffer: HostBuffer) -> Result<()> {
        self.module.deallocate(buffer.location, buffer.len)
    }

    /// Return a result buffer to the module's allocator.
    pub fn release_result(&mut self, buffer: ModuleBuffer) -> Result<()> {
        self.module.deallocate(buffer.location, buffer.len)
    }

    /// Release an input buffer on an error path, where the original error
    /// matters more than a failed release.
    pub(crate) fn release_input_quietly(&mut self, buffer: HostBuffer) {
        let location = buffer.location;
        if let Err(e) = self.release_input(buffer) {
            warn!(location, error = %e, "failed to release input buffer");
        }
    }
}
