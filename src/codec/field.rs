//! Typed trait fields.
//!
//! Each registered trait declares a schema: the number and kind of fields
//! in its segment. Decoding checks the segment against the schema before
//! the trait is built, so a trait constructor only ever sees well-typed
//! values.

use crate::core::NamedKey;

use super::sequence::{decode_list, encode_list};
use super::CodecError;

/// Delimiter for lists nested inside a single field.
pub const LIST_DELIMITER: char = ',';

/// Kind of a single field in a trait segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    /// Signed integer.
    Int,
    /// `true` / `false`.
    Bool,
    /// Free text.
    Text,
    /// Optional trigger key (empty for none).
    Key,
    /// One token out of a fixed set.
    Choice(&'static [&'static str]),
    /// List of free-text items.
    TextList,
    /// List of trigger keys.
    KeyList,
}

impl FieldKind {
    /// Short name used in error messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            FieldKind::Int => "int",
            FieldKind::Bool => "bool",
            FieldKind::Text => "text",
            FieldKind::Key => "key",
            FieldKind::Choice(_) => "choice",
            FieldKind::TextList => "text list",
            FieldKind::KeyList => "key list",
        }
    }

    /// Parse a raw field according to this kind.
    pub fn parse(self, index: usize, text: &str) -> Result<FieldValue, CodecError> {
        let invalid = || CodecError::InvalidField {
            index,
            kind: self.name(),
            text: text.to_string(),
        };

        match self {
            FieldKind::Int => text.parse().map(FieldValue::Int).map_err(|_| invalid()),
            FieldKind::Bool => match text {
                "true" => Ok(FieldValue::Bool(true)),
                "false" => Ok(FieldValue::Bool(false)),
                _ => Err(invalid()),
            },
            FieldKind::Text => Ok(FieldValue::Text(text.to_string())),
            FieldKind::Key => NamedKey::parse_optional(text)
                .map(FieldValue::Key)
                .map_err(|_| invalid()),
            FieldKind::Choice(options) => {
                if options.contains(&text) {
                    Ok(FieldValue::Choice(text.to_string()))
                } else {
                    Err(invalid())
                }
            }
            FieldKind::TextList => decode_list(text, LIST_DELIMITER)
                .map(FieldValue::TextList)
                .ok_or_else(invalid),
            FieldKind::KeyList => {
                let items = decode_list(text, LIST_DELIMITER).ok_or_else(invalid)?;
                let mut keys = Vec::with_capacity(items.len());
                for item in items {
                    match NamedKey::parse_optional(&item) {
                        Ok(Some(key)) => keys.push(key),
                        _ => return Err(invalid()),
                    }
                }
                Ok(FieldValue::KeyList(keys))
            }
        }
    }
}

/// A typed field value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldValue {
    Int(i64),
    Bool(bool),
    Text(String),
    Key(Option<NamedKey>),
    Choice(String),
    TextList(Vec<String>),
    KeyList(Vec<NamedKey>),
}

impl FieldValue {
    /// Raw text form, before sequence escaping.
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            FieldValue::Int(v) => v.to_string(),
            FieldValue::Bool(v) => v.to_string(),
            FieldValue::Text(s) | FieldValue::Choice(s) => s.clone(),
            FieldValue::Key(key) => NamedKey::optional_text(key.as_ref()),
            FieldValue::TextList(items) => encode_list(items, LIST_DELIMITER),
            FieldValue::KeyList(keys) => {
                let items: Vec<String> = keys.iter().map(NamedKey::to_text).collect();
                encode_list(&items, LIST_DELIMITER)
            }
        }
    }

    /// The kind name of this value, for error messages.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            FieldValue::Int(_) => "int",
            FieldValue::Bool(_) => "bool",
            FieldValue::Text(_) => "text",
            FieldValue::Key(_) => "key",
            FieldValue::Choice(_) => "choice",
            FieldValue::TextList(_) => "text list",
            FieldValue::KeyList(_) => "key list",
        }
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

impl From<Option<NamedKey>> for FieldValue {
    fn from(v: Option<NamedKey>) -> Self {
        FieldValue::Key(v)
    }
}

/// Sequential reader over validated field values.
///
/// Trait constructors pull their fields in declaration order.
pub struct Fields {
    values: std::vec::IntoIter<FieldValue>,
    index: usize,
}

impl Fields {
    /// Wrap already-parsed values.
    #[must_use]
    pub fn new(values: Vec<FieldValue>) -> Self {
        Self {
            values: values.into_iter(),
            index: 0,
        }
    }

    fn take(&mut self, expected: &'static str) -> Result<FieldValue, CodecError> {
        let index = self.index;
        self.index += 1;
        self.values
            .next()
            .ok_or(CodecError::MissingField { index, expected })
    }

    fn mismatch(&self, expected: &'static str, found: &FieldValue) -> CodecError {
        CodecError::FieldType {
            index: self.index - 1,
            expected,
            found: found.kind_name(),
        }
    }

    pub fn int(&mut self) -> Result<i64, CodecError> {
        match self.take("int")? {
            FieldValue::Int(v) => Ok(v),
            other => Err(self.mismatch("int", &other)),
        }
    }

    pub fn bool(&mut self) -> Result<bool, CodecError> {
        match self.take("bool")? {
            FieldValue::Bool(v) => Ok(v),
            other => Err(self.mismatch("bool", &other)),
        }
    }

    pub fn text(&mut self) -> Result<String, CodecError> {
        match self.take("text")? {
            FieldValue::Text(v) => Ok(v),
            other => Err(self.mismatch("text", &other)),
        }
    }

    pub fn key(&mut self) -> Result<Option<NamedKey>, CodecError> {
        match self.take("key")? {
            FieldValue::Key(v) => Ok(v),
            other => Err(self.mismatch("key", &other)),
        }
    }

    pub fn choice(&mut self) -> Result<String, CodecError> {
        match self.take("choice")? {
            FieldValue::Choice(v) => Ok(v),
            other => Err(self.mismatch("choice", &other)),
        }
    }

    pub fn text_list(&mut self) -> Result<Vec<String>, CodecError> {
        match self.take("text list")? {
            FieldValue::TextList(v) => Ok(v),
            other => Err(self.mismatch("text list", &other)),
        }
    }

    pub fn key_list(&mut self) -> Result<Vec<NamedKey>, CodecError> {
        match self.take("key list")? {
            FieldValue::KeyList(v) => Ok(v),
            other => Err(self.mismatch("key list", &other)),
        }
    }
}
