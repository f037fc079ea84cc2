//! Fetch source trait for abstracting the remote data source.
//!
//! The orchestrator never talks to the network itself. It calls a
//! [`FetchSource`] with the current fetch key and optional parameters and
//! awaits the raw response. Any HTTP client, RPC stub, or in-memory fake
//! can be plugged in.
//!
//! Plain async closures are adapted with [`source_fn`]:
//!
//! ```
//! use fetch_kit::source::{source_fn, FetchSource};
//!
//! let source = source_fn(|key: (String, u32), _params: Option<()>| async move {
//!     Ok::<_, String>(format!("{} page {}", key.0, key.1))
//! });
//! # let _ = source.fetch(("posts".to_string(), 1), None);
//! ```

use crate::error::{Error, Result};
use futures::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Trait for fetch source implementations.
///
/// `fetch` receives an owned copy of the current key and the parameters
/// passed to the run. The returned future must not borrow from `self`,
/// so implementations typically clone a client handle into it.
///
/// Errors are captured into the orchestrator's state as returned.
/// Nothing is retried and nothing is cancelled: a future that never
/// resolves leaves the orchestrator loading.
pub trait FetchSource<K, P>: Send + Sync + 'static {
    /// Raw response type.
    type Output: Send + Sync + 'static;

    /// Fetch the raw response for `key`.
    fn fetch(&self, key: K, params: Option<P>) -> BoxFuture<'static, Result<Self::Output>>;
}

/// [`FetchSource`] backed by an async closure.
pub struct FnSource<F> {
    f: F,
}

/// Adapt an async closure into a [`FetchSource`].
///
/// Closure errors are turned into `Error::FetchFailure` via `Display`.
pub fn source_fn<F>(f: F) -> FnSource<F> {
    FnSource { f }
}

impl<K, P, F, Fut, R, E> FetchSource<K, P> for FnSource<F>
where
    F: Fn(K, Option<P>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = std::result::Result<R, E>> + Send + 'static,
    R: Send + Sync + 'static,
    E: fmt::Display + 'static,
{
    type Output = R;

    fn fetch(&self, key: K, params: Option<P>) -> BoxFuture<'static, Result<R>> {
        let fut = (self.f)(key, params);
        Box::pin(async move { fut.await.map_err(Error::fetch_failure) })
    }
}

/// Erased transform from a raw response to the published value.
pub type Transform<R, T> = Arc<dyn Fn(R) -> Result<T> + Send + Sync>;

/// The identity transform.
pub fn identity<R: 'static>() -> Transform<R, R> {
    Arc::new(|raw: R| -> Result<R> { Ok(raw) })
}

/// Wrap a fallible closure as a [`Transform`].
///
/// Closure errors are turned into `Error::TransformFailure` via `Display`.
pub fn transform_fn<R, T, E, F>(f: F) -> Transform<R, T>
where
    F: Fn(R) -> std::result::Result<T, E> + Send + Sync + 'static,
    R: 'static,
    T: 'static,
    E: fmt::Display + 'static,
{
    Arc::new(move |raw: R| -> Result<T> { f(raw).map_err(Error::transform_failure) })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoSource;

    impl FetchSource<String, u32> for EchoSource {
        type Output = String;

        fn fetch(&self, key: String, params: Option<u32>) -> BoxFuture<'static, Result<String>> {
            Box::pin(async move {
                match params {
                    Some(0) => Err(Error::FetchFailure("page 0".to_string())),
                    Some(page) => Ok(format!("{}#{}", key, page)),
                    None => Ok(key),
                }
            })
        }
    }

    #[tokio::test]
    async fn test_trait_source() {
        let source = EchoSource;
        assert_eq!(source.fetch("posts".into(), Some(2)).await.unwrap(), "posts#2");
        assert_eq!(source.fetch("posts".into(), None).await.unwrap(), "posts");
        assert!(source.fetch("posts".into(), Some(0)).await.is_err());
    }

    #[tokio::test]
    async fn test_closure_source_maps_errors() {
        let source = source_fn(|key: u32, _params: Option<()>| async move {
            if key == 0 {
                Err("no such page".to_string())
            } else {
                Ok(key * 10)
            }
        });

        assert_eq!(source.fetch(3, None).await.unwrap(), 30);
        assert_eq!(
            source.fetch(0, None).await.unwrap_err(),
            Error::FetchFailure("no such page".to_string())
        );
    }

    #[test]
    fn test_transform_fn_maps_errors() {
        let parse = transform_fn(|raw: String| raw.parse::<u32>());

        assert_eq!(parse("42".to_string()).unwrap(), 42);
        assert!(matches!(
            parse("x".to_string()).unwrap_err(),
            Error::TransformFailure(_)
        ));
    }

    #[test]
    fn test_identity_transform() {
        let id = identity::<u32>();
        assert_eq!(id(5).unwrap(), 5);
    }
}
