//! Error types for the module bridge.

use std::time::Duration;

use thiserror::Error;

/// Errors raised while fetching, compiling or linking a module.
///
/// A load error is terminal: the lifecycle moves to `Failed` and the
/// module is never retried.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The module binary could not be fetched.
    #[error("failed to fetch module from {source_name}: {message}")]
    Fetch {
        source_name: String,
        message: String,
    },

    /// Reading the module from disk failed.
    #[error("io error: {0}")]
    Read(#[from] std::io::Error),

    /// The HTTP request for the module failed.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The module URL could not be parsed.
    #[error("invalid module url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The bytes are not a valid module.
    #[error("failed to compile module: {0}")]
    Compile(String),

    /// Host imports could not be registered.
    #[error("failed to link host imports: {0}")]
    Link(String),

    /// The module failed to instantiate (unresolved import, start trap, ...).
    #[error("failed to instantiate module: {0}")]
    Instantiate(String),

    /// A required export is absent.
    #[error("missing export: {0}")]
    MissingExport(String),

    /// A required export exists but has the wrong signature.
    #[error("export {name} has the wrong signature: expected {expected}")]
    ExportSignature { name: String, expected: &'static str },

    /// The module does not export its linear memory.
    #[error("missing memory export: {0}")]
    MissingMemory(String),

    /// Loading did not settle in time.
    #[error("module load timed out after {0:?}")]
    Timeout(Duration),
}

/// Errors surfaced by the bridge.
///
/// Apart from `Load`, every variant is local to a single call and leaves
/// the readiness state untouched.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// `load` was called while a load is in flight.
    #[error("module is already loading")]
    AlreadyLoading,

    /// `load` was called after the lifecycle settled.
    #[error("module has already been loaded")]
    AlreadyLoaded,

    /// Loading the module failed.
    #[error("load error: {0}")]
    Load(#[from] LoadError),

    /// The module could not provide a usable buffer.
    #[error("allocation of {size} bytes failed: {reason}")]
    Allocation { size: usize, reason: String },

    /// No sentinel was found before the end of the mapped memory.
    #[error("no terminator found from location {location} within {memory_size} bytes of memory")]
    OutOfBounds { location: u32, memory_size: usize },

    /// Bytes read from the module are not valid UTF-8.
    #[error("decode error: {0}")]
    Decode(#[from] std::str::Utf8Error),

    /// The module trapped inside an export.
    #[error("module trapped in {export}: {message}")]
    Trap { export: String, message: String },

    /// Configuration could not be parsed.
    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
}

/// Result type alias for bridge operations.
pub type Result<T> = std::result::Result<T, BridgeError>;
