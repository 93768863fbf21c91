//! Playground: run and format programs in a sandboxed evaluator module.
//!
//! The front end calls [`Playground`] commands; the module itself is driven
//! by [`playground_runtime`].

pub mod commands;
pub mod output;

pub use commands::Playground;
pub use output::{OutputRecord, SharedOutput};
pub use playground_runtime::{
    BridgeConfig, BridgeError, BytesSource, DisposalPolicy, FileSource, LoadError, ModuleSource,
    ReadinessState, Result, UrlSource,
};
