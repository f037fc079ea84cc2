//! Configuration for an orchestrator instance.

use std::time::Duration;

/// Default time-to-live for cached results.
pub const DEFAULT_TTL: Duration = Duration::from_secs(10);

/// Options controlling caching and automatic runs.
///
/// # Example
///
/// ```
/// use fetch_kit::FetchOptions;
/// use std::time::Duration;
///
/// // Mount without fetching, cache results for a minute
/// let options = FetchOptions::default()
///     .with_enabled(false)
///     .with_ttl(Duration::from_secs(60));
///
/// assert!(options.initial);
/// assert!(!options.enabled);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchOptions {
    /// Run once on the first activation.
    pub initial: bool,

    /// Gate for the first automatic run only.
    ///
    /// Key changes trigger a run even when this is `false`.
    pub enabled: bool,

    /// Read and write the cache store.
    pub enable_cache: bool,

    /// Lifetime of a cached result.
    pub ttl: Duration,

    /// Drop the outcome of a run that resolves after a newer run started.
    ///
    /// Off by default: whichever fetch resolves last publishes its result.
    pub discard_stale: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        FetchOptions {
            initial: true,
            enabled: true,
            enable_cache: true,
            ttl: DEFAULT_TTL,
            discard_stale: false,
        }
    }
}

impl FetchOptions {
    pub fn with_initial(mut self, initial: bool) -> Self {
        self.initial = initial;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_cache(mut self, enable_cache: bool) -> Self {
        self.enable_cache = enable_cache;
        self
    }

    /// Override the cache TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Same as [`with_ttl`](Self::with_ttl), in whole seconds.
    pub fn with_ttl_secs(self, secs: u64) -> Self {
        self.with_ttl(Duration::from_secs(secs))
    }

    pub fn with_discard_stale(mut self, discard_stale: bool) -> Self {
        self.discard_stale = discard_stale;
        self
    }
}
