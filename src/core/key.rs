//! Named key signals.
//!
//! Traits react to trigger signals delivered by the input layer. A signal
//! is either a named command ("xyzzy", "F2") or a raw key stroke (key code
//! plus modifier mask). Two keys match when they are equal.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Text that is not a valid key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid key text `{0}`")]
pub struct KeyParseError(pub String);

/// A trigger signal.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NamedKey {
    /// A named signal.
    Named(String),
    /// A key code with a modifier mask.
    Stroke { code: u16, modifiers: u8 },
}

impl NamedKey {
    /// Create a named signal.
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// Create a key stroke signal.
    #[must_use]
    pub const fn stroke(code: u16, modifiers: u8) -> Self {
        Self::Stroke { code, modifiers }
    }

    /// Text form: `n:<name>` or `k:<code>,<modifiers>`.
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            NamedKey::Named(name) => format!("n:{}", name),
            NamedKey::Stroke { code, modifiers } => format!("k:{},{}", code, modifiers),
        }
    }

    /// Parse the text form. An empty string is "no key".
    pub fn parse_optional(text: &str) -> Result<Option<Self>, KeyParseError> {
        if text.is_empty() {
            return Ok(None);
        }
        let invalid = || KeyParseError(text.to_string());
        let (tag, body) = text.split_once(':').ok_or_else(invalid)?;
        match tag {
            "n" => Ok(Some(NamedKey::Named(body.to_string()))),
            "k" => {
                let (code, modifiers) = body.split_once(',').ok_or_else(invalid)?;
                let code = code.parse().map_err(|_| invalid())?;
                let modifiers = modifiers.parse().map_err(|_| invalid())?;
                Ok(Some(NamedKey::Stroke { code, modifiers }))
            }
            _ => Err(invalid()),
        }
    }

    /// Text form of an optional key (empty for `None`).
    #[must_use]
    pub fn optional_text(key: Option<&NamedKey>) -> String {
        key.map(NamedKey::to_text).unwrap_or_default()
    }
}

impl std::fmt::Display for NamedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NamedKey::Named(name) => f.write_str(name),
            NamedKey::Stroke { code, modifiers } => write!(f, "Key({}+{})", code, modifiers),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_round_trip() {
        let keys = [
            NamedKey::named("xyzzy"),
            NamedKey::named(""),
            NamedKey::named("a:b,c"),
            NamedKey::stroke(65, 0),
            NamedKey::stroke(113, 2),
        ];
        for key in keys {
            assert_eq!(NamedKey::parse_optional(&key.to_text()), Ok(Some(key)));
        }
    }

    #[test]
    fn test_empty_is_none() {
        assert_eq!(NamedKey::parse_optional(""), Ok(None));
        assert_eq!(NamedKey::optional_text(None), "");
    }

    #[test]
    fn test_invalid() {
        assert!(NamedKey::parse_optional("k:65").is_err());
        assert!(NamedKey::parse_optional("k:x,0").is_err());
        assert!(NamedKey::parse_optional("z:1").is_err());
        assert!(NamedKey::parse_optional("plain").is_err());
    }

    #[test]
    fn test_equality() {
        assert_eq!(NamedKey::named("F2"), NamedKey::named("F2"));
        assert_ne!(NamedKey::named("F2"), NamedKey::named("F3"));
        assert_ne!(NamedKey::stroke(65, 0), NamedKey::stroke(65, 1));
    }
}
