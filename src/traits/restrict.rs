//! Key restrictions.

use std::any::Any;

use crate::codec::{CodecError, FieldKind, FieldValue, Fields};
use crate::core::NamedKey;
use crate::filter::{ExpressionError, PropertyExpression};

use super::{KeyContext, KeyOutcome, Piece, PieceTrait, TraitDecode};

/// Disables a set of keys while the piece matches an expression.
///
/// A restricted key is consumed here, so traits further in never see it.
/// An empty expression always matches.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Restrict {
    expression: PropertyExpression,
    keys: Vec<NamedKey>,
}

impl Restrict {
    pub fn new(expression: &str, keys: Vec<NamedKey>) -> Result<Self, ExpressionError> {
        Ok(Self {
            expression: PropertyExpression::parse(expression)?,
            keys,
        })
    }

    pub fn expression(&self) -> &PropertyExpression {
        &self.expression
    }

    pub fn keys(&self) -> &[NamedKey] {
        &self.keys
    }
}

impl PieceTrait for Restrict {
    fn tag(&self) -> &str {
        Self::TAG
    }

    fn fields(&self) -> Vec<FieldValue> {
        vec![
            self.expression.source().into(),
            FieldValue::KeyList(self.keys.clone()),
        ]
    }

    fn key_command(
        &self,
        key: &NamedKey,
        piece: &Piece,
        _ctx: &mut KeyContext<'_>,
    ) -> Option<KeyOutcome> {
        (self.keys.contains(key) && self.expression.matches(piece)).then_some(KeyOutcome::Consume)
    }

    fn box_clone(&self) -> Box<dyn PieceTrait> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl TraitDecode for Restrict {
    const TAG: &'static str = "restrict";
    const SCHEMA: &'static [FieldKind] = &[FieldKind::Text, FieldKind::KeyList];

    fn from_fields(fields: &mut Fields) -> Result<Self, CodecError> {
        let source = fields.text()?;
        let keys = fields.key_list()?;
        Self::new(&source, keys).map_err(|_| CodecError::InvalidField {
            index: 0,
            kind: "expression",
            text: source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::test_support::{press, state_with, unit};
    use crate::traits::{Deletable, TraitRegistry};

    fn guarded(expression: &str) -> Piece {
        unit(1, "Unit")
            .with_property("Locked", true)
            .decorate(Deletable::new(NamedKey::named("del")))
            .decorate(Restrict::new(expression, vec![NamedKey::named("del")]).unwrap())
    }

    #[test]
    fn test_round_trip() {
        let registry = TraitRegistry::standard();
        let t = Restrict::new("Side = \"Red; Team\"", vec![NamedKey::named("a"), NamedKey::stroke(1, 0)])
            .unwrap();
        let decoded = registry.try_decode_trait(&t.encode()).unwrap();
        assert_eq!(decoded.as_any().downcast_ref::<Restrict>(), Some(&t));
    }

    #[test]
    fn test_bad_expression_falls_back() {
        let registry = TraitRegistry::standard();
        assert!(matches!(
            registry.try_decode_trait("restrict;Locked =;1,n:del"),
            Err(CodecError::InvalidField { index: 0, .. })
        ));
    }

    #[test]
    fn test_blocks_when_matching() {
        let state = state_with(vec![guarded("Locked = true")]);
        assert_eq!(press(&state, 1, &NamedKey::named("del")), None);
    }

    #[test]
    fn test_passes_when_not_matching() {
        let state = state_with(vec![guarded("Locked = false")]);
        assert!(press(&state, 1, &NamedKey::named("del")).is_some());
    }

    #[test]
    fn test_other_keys_pass() {
        let state = state_with(vec![guarded("")]);
        assert_eq!(press(&state, 1, &NamedKey::named("other")), None);
        assert_eq!(press(&state, 1, &NamedKey::named("del")), None);
    }
}
