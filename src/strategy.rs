//! Cache strategies for a single fetch run.
//!
//! Replaces the `hard: bool` flag of a run with an explicit enum.
//!
//! | Strategy | Live cache entry | No entry / expired |
//! |----------|------------------|--------------------|
//! | **CacheFirst** | Serve it, no fetch | Fetch, store |
//! | **Hard** | Ignore it, fetch, overwrite | Fetch, store |
//!
//! Storing only happens when caching is enabled for the orchestrator.

/// Strategy controlling whether a run may be served from the cache.
///
/// # Examples
///
/// ```
/// use fetch_kit::strategy::FetchStrategy;
///
/// // Serve a live cache entry if there is one
/// let _strategy = FetchStrategy::CacheFirst;
///
/// // Always call the fetch source
/// let _strategy = FetchStrategy::Hard;
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum FetchStrategy {
    /// **CacheFirst**: Serve a live cache entry, otherwise fetch.
    ///
    /// Flow:
    /// 1. Check cache (if enabled)
    /// 2. If hit: publish cached value, no fetch
    /// 3. If miss: fetch, transform, store, publish
    #[default]
    CacheFirst,

    /// **Hard**: Bypass the cache lookup, always fetch.
    ///
    /// The fresh result still refreshes the cache entry.
    Hard,
}

impl FetchStrategy {
    /// Whether this strategy consults the cache before fetching.
    pub fn reads_cache(self) -> bool {
        matches!(self, FetchStrategy::CacheFirst)
    }
}

impl From<bool> for FetchStrategy {
    /// `true` means a hard run.
    fn from(hard: bool) -> Self {
        if hard {
            FetchStrategy::Hard
        } else {
            FetchStrategy::CacheFirst
        }
    }
}

impl std::fmt::Display for FetchStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchStrategy::CacheFirst => write!(f, "CacheFirst"),
            FetchStrategy::Hard => write!(f, "Hard"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_display() {
        assert_eq!(FetchStrategy::CacheFirst.to_string(), "CacheFirst");
        assert_eq!(FetchStrategy::Hard.to_string(), "Hard");
    }

    #[test]
    fn test_strategy_default() {
        assert_eq!(FetchStrategy::default(), FetchStrategy::CacheFirst);
    }

    #[test]
    fn test_strategy_from_hard_flag() {
        assert_eq!(FetchStrategy::from(true), FetchStrategy::Hard);
        assert_eq!(FetchStrategy::from(false), FetchStrategy::CacheFirst);
        assert!(FetchStrategy::CacheFirst.reads_cache());
        assert!(!FetchStrategy::Hard.reads_cache());
    }
}
