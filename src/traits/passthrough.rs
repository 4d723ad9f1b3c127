//! Passthrough for segments no registered trait understands.

use std::any::Any;

use crate::codec::{split_segment, unescape, FieldValue, SEGMENT_DELIMITER};

use super::PieceTrait;

/// A trait segment kept as raw text.
///
/// It has no behavior of its own: properties, keys and descriptions all
/// fall through to the next trait inward. Re-encoding yields the original
/// segment byte for byte, so a piece created by a newer module survives a
/// round trip through an older one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Unrecognized {
    raw: String,
    tag: String,
    chain: Option<String>,
}

impl Unrecognized {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let (tag, _) = split_segment(&raw);
        Self { raw, tag, chain: None }
    }

    /// Keep a segment as it appeared inside a chain, escapes and all.
    pub(crate) fn from_chain(slice: &str) -> Self {
        Self {
            chain: Some(slice.to_string()),
            ..Self::new(unescape(slice, SEGMENT_DELIMITER))
        }
    }

    /// The segment exactly as it was read.
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

impl PieceTrait for Unrecognized {
    fn tag(&self) -> &str {
        &self.tag
    }

    fn fields(&self) -> Vec<FieldValue> {
        split_segment(&self.raw).1.into_iter().map(FieldValue::Text).collect()
    }

    fn encode(&self) -> String {
        self.raw.clone()
    }

    fn chain_text(&self) -> Option<&str> {
        self.chain.as_deref()
    }

    fn box_clone(&self) -> Box<dyn PieceTrait> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_kept_verbatim() {
        // Non-canonical escaping must survive too.
        let t = Unrecognized::new("odd;\\x;a\\;b");
        assert_eq!(t.tag(), "odd");
        assert_eq!(t.encode(), "odd;\\x;a\\;b");
        assert_eq!(t.fields(), vec![FieldValue::Text("x".into()), FieldValue::Text("a;b".into())]);
        assert_eq!(t.describe(), None);
        assert_eq!(t.chain_text(), None);
    }

    #[test]
    fn test_chain_slice_kept() {
        let t = Unrecognized::from_chain("odd;\\x\\\\t");
        assert_eq!(t.raw(), "odd;x\\t");
        assert_eq!(t.chain_text(), Some("odd;\\x\\\\t"));
    }
}
