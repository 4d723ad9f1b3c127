//! Trait registry for decoding.
//!
//! The `TraitRegistry` maps a segment tag to the field schema and builder
//! for that trait type. Decoding a chain looks every segment up here.

use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::codec::{
    parse_fields, split_segment, unescape, CodecError, FieldKind, Fields, SEGMENT_DELIMITER,
};

use super::passthrough::Unrecognized;
use super::PieceTrait;
use super::{
    AreaOfEffect, Cloneable, Counter, Deletable, Hideable, Label, Layer, Marker, Restrict,
    ReturnToDeck, Translate,
};

/// Builds a trait from fields already checked against its schema.
pub type TraitBuilder = fn(&mut Fields) -> Result<Box<dyn PieceTrait>, CodecError>;

/// A trait type that can be rebuilt from its encoded fields.
pub trait TraitDecode: PieceTrait + Sized + 'static {
    /// Segment tag.
    const TAG: &'static str;

    /// Field kinds, in encoding order.
    const SCHEMA: &'static [FieldKind];

    /// Build from parsed fields.
    fn from_fields(fields: &mut Fields) -> Result<Self, CodecError>;
}

#[derive(Clone, Copy)]
struct Entry {
    schema: &'static [FieldKind],
    build: TraitBuilder,
}

/// Registry of trait decoders.
///
/// ## Example
///
/// ```
/// use rust_tabletop::traits::{Label, TraitRegistry};
///
/// let mut registry = TraitRegistry::new();
/// registry.register::<Label>();
///
/// let label = registry.decode_trait("label;Tank");
/// assert_eq!(label.encode(), "label;Tank");
///
/// // Nobody knows `mystery`; it survives verbatim.
/// let unknown = registry.decode_trait("mystery;1;2");
/// assert_eq!(unknown.encode(), "mystery;1;2");
/// ```
#[derive(Clone, Default)]
pub struct TraitRegistry {
    entries: FxHashMap<&'static str, Entry>,
}

impl std::fmt::Debug for TraitRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut tags: Vec<&str> = self.entries.keys().copied().collect();
        tags.sort_unstable();
        f.debug_struct("TraitRegistry").field("tags", &tags).finish()
    }
}

impl TraitRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in trait.
    #[must_use]
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry
            .register::<Label>()
            .register::<Marker>()
            .register::<Counter>()
            .register::<Layer>()
            .register::<Hideable>()
            .register::<Restrict>()
            .register::<Translate>()
            .register::<AreaOfEffect>()
            .register::<Cloneable>()
            .register::<Deletable>()
            .register::<ReturnToDeck>();
        registry
    }

    /// Register a trait type.
    ///
    /// Panics if the tag is already registered.
    pub fn register<T: TraitDecode>(&mut self) -> &mut Self {
        fn build<T: TraitDecode>(fields: &mut Fields) -> Result<Box<dyn PieceTrait>, CodecError> {
            Ok(Box::new(T::from_fields(fields)?))
        }
        self.register_raw(T::TAG, T::SCHEMA, build::<T>)
    }

    /// Register a decoder by hand, for traits defined outside this crate
    /// that don't implement [`TraitDecode`].
    ///
    /// Panics if the tag is already registered.
    pub fn register_raw(
        &mut self,
        tag: &'static str,
        schema: &'static [FieldKind],
        build: TraitBuilder,
    ) -> &mut Self {
        if self.entries.contains_key(tag) {
            panic!("Trait tag `{}` already registered", tag);
        }
        self.entries.insert(tag, Entry { schema, build });
        self
    }

    /// Check if a tag is registered.
    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.entries.contains_key(tag)
    }

    /// Field schema for a tag.
    #[must_use]
    pub fn schema(&self, tag: &str) -> Option<&'static [FieldKind]> {
        self.entries.get(tag).map(|e| e.schema)
    }

    /// Number of registered tags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Decode one segment, reporting why it failed.
    pub fn try_decode_trait(&self, segment: &str) -> Result<Box<dyn PieceTrait>, CodecError> {
        let (tag, raw) = split_segment(segment);
        let entry = self
            .entries
            .get(tag.as_str())
            .ok_or_else(|| CodecError::UnknownTag(tag.clone()))?;
        let values = parse_fields(&tag, entry.schema, &raw)?;
        (entry.build)(&mut Fields::new(values))
    }

    /// Decode one segment, falling back to an [`Unrecognized`] passthrough.
    ///
    /// Never fails: an unknown tag or a field that doesn't fit the schema
    /// keeps the raw segment so it re-encodes unchanged.
    #[must_use]
    pub fn decode_trait(&self, segment: &str) -> Box<dyn PieceTrait> {
        self.try_decode_trait(segment)
            .unwrap_or_else(|err| Self::passthrough(err, segment, Unrecognized::new(segment)))
    }

    /// Decode one segment as sliced from a chain, escapes unresolved.
    ///
    /// A passthrough keeps the slice itself, so the chain re-encodes byte
    /// for byte even when its escaping was not canonical.
    #[must_use]
    pub fn decode_chain_segment(&self, slice: &str) -> Box<dyn PieceTrait> {
        let segment = unescape(slice, SEGMENT_DELIMITER);
        self.try_decode_trait(&segment)
            .unwrap_or_else(|err| Self::passthrough(err, &segment, Unrecognized::from_chain(slice)))
    }

    fn passthrough(err: CodecError, segment: &str, kept: Unrecognized) -> Box<dyn PieceTrait> {
        match err {
            CodecError::UnknownTag(tag) => {
                debug!(%tag, "unknown trait tag, keeping segment as passthrough");
            }
            err => {
                warn!(%err, segment, "trait segment failed to decode, keeping as passthrough");
            }
        }
        Box::new(kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::FieldValue;

    #[derive(Clone, Debug)]
    struct Flag(bool);

    impl PieceTrait for Flag {
        fn tag(&self) -> &str {
            "flag"
        }

        fn fields(&self) -> Vec<FieldValue> {
            vec![self.0.into()]
        }

        fn box_clone(&self) -> Box<dyn PieceTrait> {
            Box::new(self.clone())
        }

        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    }

    fn build_flag(fields: &mut Fields) -> Result<Box<dyn PieceTrait>, CodecError> {
        Ok(Box::new(Flag(fields.bool()?)))
    }

    #[test]
    fn test_standard_tags() {
        let registry = TraitRegistry::standard();
        for tag in [
            "label", "mark", "counter", "layer", "hide", "restrict", "translate", "aoe", "clone",
            "delete", "return",
        ] {
            assert!(registry.contains(tag), "missing {}", tag);
        }
        assert_eq!(registry.len(), 11);
    }

    #[test]
    fn test_register_raw() {
        let mut registry = TraitRegistry::new();
        registry.register_raw("flag", &[FieldKind::Bool], build_flag);

        let t = registry.try_decode_trait("flag;true").unwrap();
        assert!(t.as_any().downcast_ref::<Flag>().unwrap().0);
        assert_eq!(t.encode(), "flag;true");
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn test_duplicate_tag_panics() {
        let mut registry = TraitRegistry::new();
        registry.register::<Label>().register::<Label>();
    }

    #[test]
    fn test_errors() {
        let registry = TraitRegistry::standard();
        assert_eq!(
            registry.try_decode_trait("nope;1").unwrap_err(),
            CodecError::UnknownTag("nope".into())
        );
        assert!(matches!(
            registry.try_decode_trait("label;a;b"),
            Err(CodecError::FieldCount { expected: 1, found: 2, .. })
        ));
        assert!(matches!(
            registry.try_decode_trait("counter;Ammo;x;1;0;9;false;;;"),
            Err(CodecError::InvalidField { index: 1, .. })
        ));
    }

    #[test]
    fn test_bad_fields_fall_back() {
        let registry = TraitRegistry::standard();
        let segment = "counter;Ammo;not-a-number;1;0;9;false;;;";
        let t = registry.decode_trait(segment);
        assert!(t.as_any().is::<Unrecognized>());
        assert_eq!(t.encode(), segment);
    }
}
