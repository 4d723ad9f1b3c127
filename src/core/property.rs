//! Piece property values.
//!
//! Pieces expose named properties ("Label", "Strength", "InvisibleToMe",
//! ...) that traits and match expressions query. Names are plain strings;
//! values are typed.
//!
//! ## PropertyValue Types
//!
//! - `Int`: Numbers (strength, level, counters)
//! - `Bool`: Flags (active, hidden)
//! - `Text`: Strings (labels, names)
//!
//! Every value has a lossless text form used by the codec: `i:42`,
//! `b:true`, `s:Tank`.

use im::OrdMap;
use serde::{Deserialize, Serialize};

/// Value of a piece property.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyValue {
    /// Integer value.
    Int(i64),
    /// Boolean flag.
    Bool(bool),
    /// Text value.
    Text(String),
}

impl PropertyValue {
    /// Get as integer if this is an Int value.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            PropertyValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as bool if this is a Bool value.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as string reference if this is a Text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Whether this value counts as "true" for visibility-style flags.
    ///
    /// `Bool(true)`, and text equal to `"true"` (case-insensitive).
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            PropertyValue::Bool(b) => *b,
            PropertyValue::Text(s) => s.eq_ignore_ascii_case("true"),
            PropertyValue::Int(_) => false,
        }
    }

    /// Tagged text form used inside encoded piece state.
    #[must_use]
    pub fn to_tagged(&self) -> String {
        match self {
            PropertyValue::Int(v) => format!("i:{}", v),
            PropertyValue::Bool(v) => format!("b:{}", v),
            PropertyValue::Text(s) => format!("s:{}", s),
        }
    }

    /// Parse the tagged text form produced by [`to_tagged`](Self::to_tagged).
    #[must_use]
    pub fn from_tagged(text: &str) -> Option<Self> {
        let (tag, body) = text.split_once(':')?;
        match tag {
            "i" => body.parse().ok().map(PropertyValue::Int),
            "b" => body.parse().ok().map(PropertyValue::Bool),
            "s" => Some(PropertyValue::Text(body.to_string())),
            _ => None,
        }
    }
}

impl std::fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PropertyValue::Int(v) => write!(f, "{}", v),
            PropertyValue::Bool(v) => write!(f, "{}", v),
            PropertyValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        PropertyValue::Int(v)
    }
}

impl From<i32> for PropertyValue {
    fn from(v: i32) -> Self {
        PropertyValue::Int(v as i64)
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        PropertyValue::Bool(v)
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        PropertyValue::Text(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        PropertyValue::Text(v.to_string())
    }
}

/// Ordered property map.
///
/// Ordered so that encoding a piece is a pure function of its contents.
pub type Properties = OrdMap<String, PropertyValue>;

/// Well-known property names.
pub mod names {
    /// True when the piece is hidden from the observer asking.
    pub const INVISIBLE_TO_ME: &str = "InvisibleToMe";
    /// True when the piece is hidden from everyone except its hider.
    pub const INVISIBLE_TO_OTHERS: &str = "InvisibleToOthers";
    /// Base piece name.
    pub const NAME: &str = "Name";
    /// Piece id.
    pub const ID: &str = "Id";
    /// Zone the piece is in.
    pub const ZONE: &str = "Zone";
    /// X coordinate.
    pub const X: &str = "X";
    /// Y coordinate.
    pub const Y: &str = "Y";
    /// Owning player index.
    pub const OWNER: &str = "Owner";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_value_accessors() {
        assert_eq!(PropertyValue::Int(5).as_int(), Some(5));
        assert_eq!(PropertyValue::Int(5).as_bool(), None);
        assert_eq!(PropertyValue::Bool(true).as_bool(), Some(true));
        assert_eq!(PropertyValue::Text("x".into()).as_text(), Some("x"));
    }

    #[test]
    fn test_truthy() {
        assert!(PropertyValue::Bool(true).is_truthy());
        assert!(PropertyValue::Text("TRUE".into()).is_truthy());
        assert!(!PropertyValue::Bool(false).is_truthy());
        assert!(!PropertyValue::Int(1).is_truthy());
    }

    #[test]
    fn test_tagged_form() {
        let values = [
            PropertyValue::Int(-3),
            PropertyValue::Bool(false),
            PropertyValue::Text("a:b:c".into()),
            PropertyValue::Text(String::new()),
        ];
        for v in values {
            assert_eq!(PropertyValue::from_tagged(&v.to_tagged()), Some(v));
        }
    }

    #[test]
    fn test_tagged_rejects_garbage() {
        assert_eq!(PropertyValue::from_tagged("i:abc"), None);
        assert_eq!(PropertyValue::from_tagged("q:1"), None);
        assert_eq!(PropertyValue::from_tagged("no-tag"), None);
    }

    #[test]
    fn test_from_impls() {
        let int: PropertyValue = 42i32.into();
        assert_eq!(int.as_int(), Some(42));

        let text: PropertyValue = "Tank".into();
        assert_eq!(text.to_string(), "Tank");
    }

    #[test]
    fn test_serialization() {
        let v = PropertyValue::Text("Tank".into());
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(serde_json::from_str::<PropertyValue>(&json).unwrap(), v);
    }
}
