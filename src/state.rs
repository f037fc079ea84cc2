//! Fetch lifecycle state and its transition function.
//!
//! State changes are expressed as [`FetchAction`]s applied by the pure
//! [`reduce`] function. The orchestrator applies actions in batches and
//! publishes one snapshot per batch.

use crate::error::Error;
use std::fmt;
use std::sync::Arc;

/// Lifecycle status of an orchestrator instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum FetchStatus {
    /// Nothing has run yet.
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

impl fmt::Display for FetchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchStatus::Idle => write!(f, "Idle"),
            FetchStatus::Loading => write!(f, "Loading"),
            FetchStatus::Success => write!(f, "Success"),
            FetchStatus::Error => write!(f, "Error"),
        }
    }
}

/// Snapshot published to consumers.
///
/// `data` and `error` persist across runs: a failed run keeps the previous
/// `data`, and a successful run does not clear a previous `error`. Use
/// `status` to tell which one is authoritative.
pub struct FetchState<T> {
    pub status: FetchStatus,
    pub loading: bool,
    pub data: Option<Arc<T>>,
    pub error: Option<Error>,
}

impl<T> FetchState<T> {
    /// Idle state seeded with optional initial data.
    pub fn new(initial_data: Option<Arc<T>>) -> Self {
        FetchState {
            status: FetchStatus::Idle,
            loading: false,
            data: initial_data,
            error: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_deref()
    }

    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }
}

impl<T> Default for FetchState<T> {
    fn default() -> Self {
        FetchState::new(None)
    }
}

// Manual impl: cloning only bumps the Arc, so T need not be Clone.
impl<T> Clone for FetchState<T> {
    fn clone(&self) -> Self {
        FetchState {
            status: self.status,
            loading: self.loading,
            data: self.data.clone(),
            error: self.error.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for FetchState<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchState")
            .field("status", &self.status)
            .field("loading", &self.loading)
            .field("data", &self.data)
            .field("error", &self.error)
            .finish()
    }
}

/// A single state transition.
pub enum FetchAction<T> {
    SetLoading(bool),
    Resolve(Arc<T>),
    Reject(Error),
    /// Clear `loading` and put `status` back to what it was before the run.
    Abort(FetchStatus),
}

impl<T> fmt::Debug for FetchAction<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchAction::SetLoading(loading) => write!(f, "SetLoading({})", loading),
            FetchAction::Resolve(_) => write!(f, "Resolve(..)"),
            FetchAction::Reject(e) => write!(f, "Reject({})", e),
            FetchAction::Abort(status) => write!(f, "Abort({})", status),
        }
    }
}

/// Apply one action to a state.
///
/// Never clears `data` or `error`.
pub fn reduce<T>(state: FetchState<T>, action: FetchAction<T>) -> FetchState<T> {
    match action {
        FetchAction::SetLoading(true) => FetchState {
            status: FetchStatus::Loading,
            loading: true,
            ..state
        },
        FetchAction::SetLoading(false) => FetchState {
            loading: false,
            ..state
        },
        FetchAction::Resolve(data) => FetchState {
            status: FetchStatus::Success,
            data: Some(data),
            ..state
        },
        FetchAction::Reject(error) => FetchState {
            status: FetchStatus::Error,
            error: Some(error),
            ..state
        },
        FetchAction::Abort(status) => FetchState {
            status,
            loading: false,
            ..state
        },
    }
}
