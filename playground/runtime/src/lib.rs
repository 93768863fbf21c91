//! # Playground Runtime
//!
//! The host side of the playground: it loads a separately compiled,
//! sandboxed evaluator module and moves strings in and out of it.
//!
//! ## The Module
//!
//! The module is a WebAssembly binary that exposes one linear memory and
//! four functions:
//!
//! - `alloc(size) -> location` reserves bytes in the module's memory
//! - `dealloc(location)` (or `dealloc(location, size)`) frees them
//! - `eval(location) -> location` evaluates the program stored at `location`
//! - `format(location) -> location` pretty-prints it
//!
//! It imports a single host function, `env.print(location)`, which it may
//! call any number of times while evaluating.
//!
//! Strings travel as UTF-8 terminated by a zero byte. Locations are byte
//! offsets into the module's memory and mean nothing outside it.
//!
//! ## Layers
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │ ModuleLifecycle   load once, Unloaded → Loading → Ready   │
//! │                                            └──→ Failed    │
//! │  ┌─────────────────────────────────────────────────────┐  │
//! │  │ InvocationProtocol  write → call → adopt → release  │  │
//! │  │  ┌───────────────────────────────────────────────┐  │  │
//! │  │  │ MemoryBridge   HostBuffer / ModuleBuffer      │  │  │
//! │  │  │  ┌─────────────────────────────────────────┐  │  │  │
//! │  │  │  │ codec   text ⇄ bytes + sentinel         │  │  │  │
//! │  │  │  └─────────────────────────────────────────┘  │  │  │
//! │  │  └───────────────────────────────────────────────┘  │  │
//! │  └─────────────────────────────────────────────────────┘  │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ownership
//!
//! Host and module allocate from the same memory but own different buffers.
//! The host owns the input buffer it writes (unless the configured
//! [`DisposalPolicy`] hands it to the module) and the result buffer the
//! module returns. The bridge releases each exactly once. Buffers the module
//! passes to `print` stay with the module.
//!
//! ## Concurrency
//!
//! Host and module share one mutable memory with no locking, so at most one
//! operation may be in flight per module. Every operation takes the
//! lifecycle by `&mut`, which makes overlapping calls impossible without an
//! outer lock. Loading is the only asynchronous step.

pub mod abi;
pub mod codec;
pub mod config;
pub mod error;
pub mod handle;
pub mod lifecycle;
pub mod memory;
pub mod protocol;
pub mod readiness;
pub mod source;

#[cfg(test)]
mod testing;

pub use abi::{ModuleAbi, Operation};
pub use config::{BridgeConfig, DisposalPolicy, ExportNames};
pub use error::{BridgeError, LoadError, Result};
pub use handle::{BridgeStats, HostCallbacks, ModuleHandle};
pub use lifecycle::ModuleLifecycle;
pub use memory::{HostBuffer, MemoryBridge, ModuleBuffer};
pub use protocol::InvocationProtocol;
pub use readiness::{ModuleId, Readiness, ReadinessLatch, ReadinessState};
pub use source::{BytesSource, FileSource, ModuleSource, UrlSource};
