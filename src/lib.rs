//! # fetch-kit
//!
//! Key-driven async fetch orchestration with a TTL cache.
//!
//! Given a fetch key describing what data is wanted, an orchestrator decides
//! whether to serve a cached value or call the fetch source, tracks the
//! loading/success/error lifecycle and publishes every transition to
//! subscribers. A controller re-runs automatically when the key changes.
//!
//! ## Features
//!
//! - **Canonical keys:** Any `Serialize` key; object field order never matters
//! - **Shared TTL cache:** One process-wide store, lazy expiry on read
//! - **Explicit state machine:** Pure reducer over tagged actions
//! - **No uncaught failures:** Fetch and transform errors become state
//!
//! ## Quick Start
//!
//! ```ignore
//! use fetch_kit::{FetchBuilder, FetchOptions};
//! use serde::Serialize;
//!
//! #[derive(Clone, Serialize)]
//! struct Page {
//!     _limit: u32,
//!     _page: u32,
//! }
//!
//! // 1. Describe the fetch
//! let mut controller = FetchBuilder::new(
//!     ("posts", Page { _limit: 10, _page: 1 }),
//!     |key: (&'static str, Page), _params: Option<()>| async move {
//!         client.get_posts(&key.1).await
//!     },
//! )
//! .transform(|response: Response| Ok::<_, String>(response.data))
//! .options(FetchOptions::default().with_ttl_secs(30))
//! .mount();
//!
//! // 2. Activate on every render with the current key
//! controller.activate(("posts", Page { _limit: 10, _page: 2 }))?;
//!
//! // 3. Re-render on every transition
//! let mut rx = controller.subscribe();
//! while rx.changed().await.is_ok() {
//!     let state = rx.borrow_and_update().clone();
//!     render(state.loading, state.data, state.error);
//! }
//! ```

#[macro_use]
extern crate log;

pub mod controller;
pub mod error;
pub mod key;
pub mod observability;
pub mod options;
pub mod orchestrator;
pub mod source;
pub mod state;
pub mod store;
pub mod strategy;

// Re-exports for convenience
pub use controller::FetchController;
pub use error::{Error, Result};
pub use key::{CanonicalKey, FetchKey, KeyNormalizer};
pub use options::FetchOptions;
pub use orchestrator::{FetchBuilder, FetchOrchestrator};
pub use source::FetchSource;
pub use state::{FetchState, FetchStatus};
pub use store::CacheStore;
pub use strategy::FetchStrategy;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
