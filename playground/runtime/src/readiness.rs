//! Module identity and the one-way readiness latch.
//!
//! A module starts `Unloaded`, moves to `Loading` when a load begins, and
//! settles exactly once into `Ready` or `Failed`. Settled states never
//! change again. [`Readiness`] observers may be handed out before loading
//! starts and queried at any time, including while the load is in flight.

use tokio::sync::watch;
use uuid::Uuid;

/// Unique identifier for a loaded module, used to correlate log records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(Uuid);

impl ModuleId {
    /// Create a new random ModuleId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the inner UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ModuleId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ModuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a module is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessState {
    /// No load has been attempted.
    Unloaded,
    /// A load is in flight.
    Loading,
    /// Exports and memory are captured; operations may run.
    Ready,
    /// Loading failed. Terminal.
    Failed,
}

impl ReadinessState {
    /// Whether this state can never change again.
    pub fn is_settled(self) -> bool {
        matches!(self, ReadinessState::Ready | ReadinessState::Failed)
    }

    fn can_advance_to(self, next: ReadinessState) -> bool {
        matches!(
            (self, next),
            (ReadinessState::Unloaded, ReadinessState::Loading)
                | (ReadinessState::Loading, ReadinessState::Ready)
                | (ReadinessState::Loading, ReadinessState::Failed)
        )
    }
}

/// Owner side of the readiness state. Only the lifecycle advances it.
#[derive(Debug)]
pub struct ReadinessLatch {
    tx: watch::Sender<ReadinessState>,
}

impl ReadinessLatch {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ReadinessState::Unloaded);
        Self { tx }
    }

    pub fn state(&self) -> ReadinessState {
        *self.tx.borrow()
    }

    /// Hand out an observer.
    pub fn subscribe(&self) -> Readiness {
        Readiness {
            rx: self.tx.subscribe(),
        }
    }

    /// Move to `next` if that is a legal transition. Returns whether the
    /// state changed; illegal transitions are ignored.
    pub fn advance(&self, next: ReadinessState) -> bool {
        self.tx.send_if_modified(|state| {
            if state.can_advance_to(next) {
                *state = next;
                true
            } else {
                false
            }
        })
    }
}

impl Default for ReadinessLatch {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only view of a module's readiness.
#[derive(Debug, Clone)]
pub struct Readiness {
    rx: watch::Receiver<ReadinessState>,
}

impl Readiness {
    pub fn state(&self) -> ReadinessState {
        *self.rx.borrow()
    }

    /// True iff the module is `Ready`. No side effects.
    pub fn is_ready(&self) -> bool {
        self.state() == ReadinessState::Ready
    }

    /// Wait until the latch settles and return the settled state.
    ///
    /// If the latch is dropped before settling, returns whatever state it
    /// was last in.
    pub async fn settled(&mut self) -> ReadinessState {
        if let Ok(state) = self.rx.wait_for(|state| state.is_settled()).await {
            return *state;
        }
        *self.rx.borrow()
    }
}
