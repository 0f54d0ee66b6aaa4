use serde::{Deserialize, Serialize};
use std::fmt;

/// Immutable unit of data flowing through compilation
///
/// Transforms never mutate a `Content` in place; filters and layouts always
/// return a new value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Content {
    Textual(String),
    Binary(Vec<u8>),
}

impl Content {
    pub fn text(string: impl Into<String>) -> Self {
        Content::Textual(string.into())
    }

    pub fn binary(bytes: impl Into<Vec<u8>>) -> Self {
        Content::Binary(bytes.into())
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, Content::Binary(_))
    }

    /// Text of textual content, `None` for binary content
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Content::Textual(string) => Some(string),
            Content::Binary(_) => None,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Content::Textual(string) => string.as_bytes(),
            Content::Binary(bytes) => bytes,
        }
    }
}

impl From<&str> for Content {
    fn from(string: &str) -> Self {
        Content::text(string)
    }
}

impl From<String> for Content {
    fn from(string: String) -> Self {
        Content::Textual(string)
    }
}

impl fmt::Display for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Content::Textual(string) => write!(f, "{}", string),
            Content::Binary(bytes) => write!(f, "<binary content, {} bytes>", bytes.len()),
        }
    }
}
