//! Loading a module and gating operations on its readiness.
//!
//! The lifecycle is responsible for:
//! - Fetching and instantiating the module exactly once
//! - Wiring host callbacks into the module's imports
//! - Advancing the readiness latch to `Ready` or `Failed`
//! - Routing operations through the invocation protocol

use tracing::{error, info};

use crate::abi::Operation;
use crate::config::BridgeConfig;
use crate::error::{BridgeError, LoadError, Result};
use crate::handle::{BridgeStats, HostCallbacks, ModuleHandle};
use crate::protocol::InvocationProtocol;
use crate::readiness::{ModuleId, Readiness, ReadinessLatch, ReadinessState};
use crate::source::ModuleSource;

/// Owner of one module instance.
///
/// # Example
///
/// ```ignore
/// let mut lifecycle = ModuleLifecycle::new(BridgeConfig::default());
/// let readiness = lifecycle.readiness();
///
/// lifecycle
///     .load(&FileSource::new("pua-lang.wasm"), HostCallbacks::new())
///     .await?;
///
/// assert!(readiness.is_ready());
/// let result = lifecycle.invoke(Operation::Evaluate, "(10 + 2) * 30 + 5")?;
/// ```
pub struct ModuleLifecycle {
    id: ModuleId,
    config: BridgeConfig,
    latch: ReadinessLatch,
    handle: Option<ModuleHandle>,
    failure: Option<String>,
}

impl ModuleLifecycle {
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            id: ModuleId::new(),
            config,
            latch: ReadinessLatch::new(),
            handle: None,
            failure: None,
        }
    }

    pub fn id(&self) -> ModuleId {
        self.id
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn state(&self) -> ReadinessState {
        self.latch.state()
    }

    /// True iff the module is ready. Safe to call at any time.
    pub fn is_ready(&self) -> bool {
        self.latch.state() == ReadinessState::Ready
    }

    /// An observer that can be queried while a load is in flight.
    pub fn readiness(&self) -> Readiness {
        self.latch.subscribe()
    }

    /// Why the load failed, if it did.
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Allocation counters, once loaded.
    pub fn stats(&self) -> Option<BridgeStats> {
        self.handle.as_ref().map(ModuleHandle::stats)
    }

    /// Fetch and instantiate the module, then settle the readiness latch.
    ///
    /// Only the first call does anything. Later calls are rejected with
    /// `AlreadyLoading` or `AlreadyLoaded` and leave the state alone.
    pub async fn load(
        &mut self,
        source: &dyn ModuleSource,
        callbacks: HostCallbacks,
    ) -> Result<()> {
        match self.latch.state() {
            ReadinessState::Unloaded => {}
            ReadinessState::Loading => return Err(BridgeError::AlreadyLoading),
            ReadinessState::Ready | ReadinessState::Failed => {
                return Err(BridgeError::AlreadyLoaded)
            }
        }

        self.latch.advance(ReadinessState::Loading);
        info!(module = %self.id, source = %source.describe(), "loading module");

        let attempt = fetch_and_instantiate(&self.config, source, callbacks);
        let outcome = match self.config.load_timeout() {
            Some(limit) => tokio::time::timeout(limit, attempt)
                .await
                .unwrap_or(Err(LoadError::Timeout(limit))),
            None => attempt.await,
        };

        match outcome {
            Ok(handle) => {
                self.handle = Some(handle);
                self.latch.advance(ReadinessState::Ready);
                info!(module = %self.id, "module ready");
                Ok(())
            }
            Err(e) => {
                error!(module = %self.id, error = %e, "module failed to load");
                self.failure = Some(e.to_string());
                self.latch.advance(ReadinessState::Failed);
                Err(e.into())
            }
        }
    }

    /// Run an operation. Returns empty text while the module is not ready.
    pub fn invoke(&mut self, operation: Operation, input: &str) -> Result<String> {
        let readiness = self.latch.subscribe();
        let protocol = InvocationProtocol::new(self.config.disposal);
        match self.handle.as_mut() {
            Some(handle) => protocol.invoke(&readiness, handle, operation, input),
            None => Ok(String::new()),
        }
    }
}

async fn fetch_and_instantiate(
    config: &BridgeConfig,
    source: &dyn ModuleSource,
    callbacks: HostCallbacks,
) -> std::result::Result<ModuleHandle, LoadError> {
    let bytes = source.fetch().await?;
    ModuleHandle::instantiate(config, &bytes, callbacks)
}
