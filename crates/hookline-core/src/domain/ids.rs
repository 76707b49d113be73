//! Callback identifiers.
//!
//! ID の中身は store に注入された `IdGenerator` が決める（連番 or ULID）。
//! ここでは「文字列として一意」であることだけを型で表現します。

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier assigned to a callback by the store at save time.
///
/// `Default` is the empty id, which only ever shows up in logs for a
/// callback that has not been saved yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallbackId(String);

impl CallbackId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for CallbackId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for CallbackId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for CallbackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_as_plain_string() {
        let id = CallbackId::new("42");
        assert_eq!(id.to_string(), "42");
        assert_eq!(id.as_str(), "42");
    }

    #[test]
    fn default_is_empty() {
        assert!(CallbackId::default().is_empty());
        assert!(!CallbackId::from("1").is_empty());
    }

    #[test]
    fn serializes_transparently() {
        let id = CallbackId::from("7");
        let s = serde_json::to_string(&id).unwrap();
        assert_eq!(s, "\"7\"");

        let back: CallbackId = serde_json::from_str(&s).unwrap();
        assert_eq!(back, id);
    }
}
