//! Fetch key normalization.
//!
//! A fetch key is any ordered, serializable description of "what data is
//! wanted": a tuple such as `("posts", Page { limit: 10, page: 2 })`, a
//! `Vec`, or the dynamic [`FetchKey`]. [`KeyNormalizer`] turns it into a
//! [`CanonicalKey`] that is used both as the cache index and as the token
//! for detecting that the requested data changed.
//!
//! Object field order never matters:
//!
//! ```
//! use fetch_kit::key::KeyNormalizer;
//! use serde_json::json;
//!
//! let a = KeyNormalizer::canonicalize(&("posts", json!({"x": 1, "y": 2}))).unwrap();
//! let b = KeyNormalizer::canonicalize(&("posts", json!({"y": 2, "x": 1}))).unwrap();
//! assert_eq!(a, b);
//! ```

use crate::error::{Error, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// Deterministic string form of a fetch key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalKey(String);

impl CanonicalKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Builder for canonical keys.
pub struct KeyNormalizer;

impl KeyNormalizer {
    /// Canonicalize any serializable key.
    ///
    /// Structurally equal inputs produce identical output regardless of
    /// object field insertion order.
    ///
    /// # Errors
    ///
    /// Returns `Error::SerializationError` if the key cannot be serialized
    /// (failing `Serialize` impl, map with non-string keys).
    pub fn canonicalize<K: Serialize + ?Sized>(key: &K) -> Result<CanonicalKey> {
        let value = serde_json::to_value(key)?;
        let rendered = serde_json::to_string(&Self::sorted(value))?;
        Ok(CanonicalKey(rendered))
    }

    // serde_json's `preserve_order` feature can be switched on by any crate
    // in the build graph, so object order is fixed here instead of relying
    // on the default BTreeMap.
    fn sorted(value: Value) -> Value {
        match value {
            Value::Object(map) => {
                let mut entries: Vec<(String, Value)> = map.into_iter().collect();
                entries.sort_by(|a, b| a.0.cmp(&b.0));
                let mut out = Map::new();
                for (k, v) in entries {
                    out.insert(k, Self::sorted(v));
                }
                Value::Object(out)
            }
            Value::Array(items) => Value::Array(items.into_iter().map(Self::sorted).collect()),
            other => other,
        }
    }
}

/// Dynamic, ordered fetch key built from heterogeneous parts.
///
/// # Example
///
/// ```
/// use fetch_kit::key::FetchKey;
/// use serde_json::json;
///
/// # fn main() -> fetch_kit::Result<()> {
/// let key = FetchKey::new()
///     .with("posts")?
///     .with(json!({"_limit": 10, "_page": 1}))?;
/// assert_eq!(key.len(), 2);
/// assert_eq!(key.canonicalize()?.as_str(), r#"["posts",{"_limit":10,"_page":1}]"#);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FetchKey {
    parts: Vec<Value>,
}

impl FetchKey {
    pub fn new() -> Self {
        FetchKey { parts: Vec::new() }
    }

    /// Append a part.
    ///
    /// # Errors
    ///
    /// Returns `Error::SerializationError` if the part cannot be serialized.
    pub fn with<P: Serialize>(mut self, part: P) -> Result<Self> {
        self.parts.push(serde_json::to_value(part)?);
        Ok(self)
    }

    pub fn parts(&self) -> &[Value] {
        &self.parts
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Canonicalize this key.
    ///
    /// # Errors
    ///
    /// Returns `Error::SerializationError` if rendering fails.
    pub fn canonicalize(&self) -> Result<CanonicalKey> {
        KeyNormalizer::canonicalize(self)
    }
}

impl From<Vec<Value>> for FetchKey {
    fn from(parts: Vec<Value>) -> Self {
        FetchKey { parts }
    }
}

impl TryFrom<&FetchKey> for CanonicalKey {
    type Error = Error;

    fn try_from(key: &FetchKey) -> Result<Self> {
        key.canonicalize()
    }
}
