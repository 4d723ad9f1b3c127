//! Canonical text codec for trait chains.
//!
//! A piece is encoded as one string:
//!
//! ```text
//! segment \t segment \t ... \t base-segment
//! ```
//!
//! Segments are listed outer trait first. Each segment is `tag;field;...`
//! where the tag selects the trait type. The last segment is always the
//! base piece (`piece;...`).
//!
//! ## Determinism
//!
//! Encoding is a pure function of the piece state. Two peers holding the
//! same logical state produce byte-identical text, which is what state
//! digests compare.
//!
//! ## Key Components
//!
//! - [`SequenceEncoder`] / [`SequenceDecoder`]: escaped token sequences
//! - [`FieldKind`] / [`FieldValue`] / [`Fields`]: typed field schema
//! - [`encode_segment`] / [`split_segment`] / [`parse_fields`]: segment helpers

mod field;
mod sequence;

pub use field::{FieldKind, FieldValue, Fields, LIST_DELIMITER};
pub use sequence::{
    decode_list, encode_list, split_verbatim, unescape, SequenceDecoder, SequenceEncoder,
};

use thiserror::Error;

/// Separates segments in a chain.
pub const SEGMENT_DELIMITER: char = '\t';

/// Separates fields in a segment.
pub const FIELD_DELIMITER: char = ';';

/// Errors raised while decoding encoded pieces.
///
/// Trait-level errors never escape a chain decode: the offending segment
/// becomes a passthrough trait. Only base-segment errors are fatal.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("no trait registered for tag `{0}`")]
    UnknownTag(String),

    #[error("segment `{tag}` has {found} fields, schema expects {expected}")]
    FieldCount {
        tag: String,
        expected: usize,
        found: usize,
    },

    #[error("field {index} is not a valid {kind}: `{text}`")]
    InvalidField {
        index: usize,
        kind: &'static str,
        text: String,
    },

    #[error("field {index} missing, expected {expected}")]
    MissingField { index: usize, expected: &'static str },

    #[error("field {index} is a {found}, expected {expected}")]
    FieldType {
        index: usize,
        expected: &'static str,
        found: &'static str,
    },

    #[error("encoded piece is empty")]
    Empty,

    #[error("malformed base piece segment: {0}")]
    BadBase(String),
}

/// Encode one segment from its tag and typed fields.
#[must_use]
pub fn encode_segment(tag: &str, fields: &[FieldValue]) -> String {
    let mut se = SequenceEncoder::new(FIELD_DELIMITER);
    se.append(tag);
    for field in fields {
        se.append(&field.to_text());
    }
    se.finish()
}

/// Split a segment into its tag and raw field texts.
#[must_use]
pub fn split_segment(segment: &str) -> (String, Vec<String>) {
    let mut sd = SequenceDecoder::new(segment, FIELD_DELIMITER);
    let tag = sd.next().unwrap_or_default();
    (tag, sd.collect())
}

/// Check raw fields against a schema and parse them.
pub fn parse_fields(
    tag: &str,
    schema: &[FieldKind],
    raw: &[String],
) -> Result<Vec<FieldValue>, CodecError> {
    if raw.len() != schema.len() {
        return Err(CodecError::FieldCount {
            tag: tag.to_string(),
            expected: schema.len(),
            found: raw.len(),
        });
    }
    schema
        .iter()
        .zip(raw)
        .enumerate()
        .map(|(index, (kind, text))| kind.parse(index, text))
        .collect()
}

/// Join already-encoded segments into a chain.
#[must_use]
pub fn join_segments<S: AsRef<str>>(segments: &[S]) -> String {
    let mut se = SequenceEncoder::new(SEGMENT_DELIMITER);
    for segment in segments {
        se.append(segment.as_ref());
    }
    se.finish()
}

/// Split a chain into its segments.
pub fn split_segments(text: &str) -> Result<Vec<String>, CodecError> {
    if text.is_empty() {
        return Err(CodecError::Empty);
    }
    Ok(SequenceDecoder::new(text, SEGMENT_DELIMITER).collect())
}

/// Split a chain into its segments without resolving chain-level escapes.
///
/// Joining the slices with [`SequenceEncoder::append_verbatim`] gives back
/// `text` exactly, even when it was escaped non-canonically.
pub fn split_segments_verbatim(text: &str) -> Result<Vec<&str>, CodecError> {
    if text.is_empty() {
        return Err(CodecError::Empty);
    }
    Ok(split_verbatim(text, SEGMENT_DELIMITER))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::NamedKey;

    const SCHEMA: &[FieldKind] = &[FieldKind::Text, FieldKind::Int, FieldKind::Key];

    #[test]
    fn test_segment_round_trip() {
        let fields = vec![
            FieldValue::Text("semi;colon\ttab".into()),
            FieldValue::Int(7),
            FieldValue::Key(Some(NamedKey::named("F2"))),
        ];
        let segment = encode_segment("label", &fields);
        let (tag, raw) = split_segment(&segment);

        assert_eq!(tag, "label");
        assert_eq!(parse_fields(&tag, SCHEMA, &raw).unwrap(), fields);
    }

    #[test]
    fn test_field_count_mismatch() {
        let (tag, raw) = split_segment("label;only-one");
        assert_eq!(
            parse_fields(&tag, SCHEMA, &raw),
            Err(CodecError::FieldCount { tag: "label".into(), expected: 3, found: 1 })
        );
    }

    #[test]
    fn test_chain_round_trip() {
        let segments = vec![
            encode_segment("a", &[FieldValue::Text("x\ty".into())]),
            encode_segment("piece", &[FieldValue::Int(1)]),
        ];
        let chain = join_segments(&segments);
        assert_eq!(split_segments(&chain).unwrap(), segments);
    }

    #[test]
    fn test_empty_chain() {
        assert_eq!(split_segments(""), Err(CodecError::Empty));
        assert_eq!(split_segments_verbatim(""), Err(CodecError::Empty));
    }
}
