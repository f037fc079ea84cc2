//! Lifecycle controller bridging an orchestrator to a reactive UI runtime.
//!
//! The host calls [`FetchController::activate`] on every render/update
//! cycle with the key it wants. The controller diffs the canonical key
//! against the one seen on the previous activation and starts runs:
//!
//! - first activation: one run if `initial && enabled`
//! - later activations: one run whenever the canonical key changed,
//!   regardless of `enabled` and `initial`
//!
//! State changes reach the host through [`FetchController::subscribe`].

use crate::error::{Error, Result};
use crate::key::{CanonicalKey, KeyNormalizer};
use crate::orchestrator::FetchOrchestrator;
use crate::state::FetchState;
use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Handle of a run started by an activation.
pub type RunHandle = JoinHandle<Result<()>>;

/// Diffing/trigger layer around a [`FetchOrchestrator`].
///
/// # Example
///
/// ```no_run
/// use fetch_kit::FetchBuilder;
///
/// # async fn demo() -> fetch_kit::Result<()> {
/// let mut controller = FetchBuilder::new(("posts", 1u32), |key: (&'static str, u32), _params: Option<()>| async move {
///     Ok::<_, String>(key.1)
/// })
/// .mount();
///
/// // First render: starts the initial run.
/// controller.activate(("posts", 1))?;
/// // Same key: nothing to do.
/// assert!(controller.activate(("posts", 1))?.is_none());
/// // Key changed: starts a run for page 2.
/// if let Some(run) = controller.activate(("posts", 2))? {
///     run.await.expect("run panicked")?;
/// }
/// assert_eq!(controller.state().data(), Some(&2));
/// # Ok(())
/// # }
/// ```
pub struct FetchController<K, P, T> {
    orchestrator: FetchOrchestrator<K, P, T>,
    enabled: bool,
    initial_pending: bool,
    last_key: Option<CanonicalKey>,
}

impl<K, P, T> FetchController<K, P, T>
where
    K: Serialize + Clone + Send + Sync + 'static,
    P: Send + 'static,
    T: Send + Sync + 'static,
{
    /// Wrap an orchestrator. Nothing runs until the first activation.
    pub fn mount(orchestrator: FetchOrchestrator<K, P, T>) -> Self {
        let enabled = orchestrator.options().enabled;
        FetchController {
            orchestrator,
            enabled,
            initial_pending: true,
            last_key: None,
        }
    }

    /// Process one activation with the key the host currently wants.
    ///
    /// Must be called from within a Tokio runtime when a run is due; the
    /// run is spawned and its handle returned.
    ///
    /// # Errors
    ///
    /// - `Error::SerializationError`: `key` cannot be canonicalized; nothing
    ///   is recorded or run
    /// - `Error::Other`: a run is due but no Tokio runtime is available
    pub fn activate(&mut self, key: K) -> Result<Option<RunHandle>> {
        let canonical = KeyNormalizer::canonicalize(&key)?;

        let changed = self
            .last_key
            .as_ref()
            .is_some_and(|last| *last != canonical);
        let initial_due =
            self.initial_pending && self.enabled && self.orchestrator.options().initial;
        let due = initial_due || changed;

        let runtime = if due {
            Some(Handle::try_current().map_err(|e| Error::Other(e.to_string()))?)
        } else {
            None
        };

        self.orchestrator.set_key(key);
        self.last_key = Some(canonical);

        let Some(runtime) = runtime else {
            return Ok(None);
        };

        if initial_due {
            debug!("» Initial run for {:?}", self.last_key);
        } else {
            debug!("» Key changed to {:?}, running", self.last_key);
        }
        self.initial_pending = false;

        let orchestrator = self.orchestrator.clone();
        Ok(Some(runtime.spawn(async move { orchestrator.refetch(None).await })))
    }

    /// Toggle the gate for the initial run.
    ///
    /// Enabling a controller whose initial run has not happened yet makes
    /// the next activation run it. Key-change runs ignore this flag.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Canonical key seen on the latest activation.
    pub fn last_key(&self) -> Option<&CanonicalKey> {
        self.last_key.as_ref()
    }

    /// Latest published state.
    pub fn state(&self) -> FetchState<T> {
        self.orchestrator.state()
    }

    /// Receiver notified after every published transition.
    pub fn subscribe(&self) -> watch::Receiver<FetchState<T>> {
        self.orchestrator.subscribe()
    }

    /// Manual re-run for the current key, served from cache when possible.
    ///
    /// # Errors
    ///
    /// See [`FetchOrchestrator::run`].
    pub async fn refetch(&self, params: Option<P>) -> Result<()> {
        self.orchestrator.refetch(params).await
    }

    /// Manual re-run for the current key, always calling the source.
    ///
    /// # Errors
    ///
    /// See [`FetchOrchestrator::run`].
    pub async fn hard_refetch(&self, params: Option<P>) -> Result<()> {
        self.orchestrator.hard_refetch(params).await
    }

    /// Get a reference to the underlying orchestrator.
    pub fn orchestrator(&self) -> &FetchOrchestrator<K, P, T> {
        &self.orchestrator
    }
}
