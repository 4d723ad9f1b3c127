//! Traits that move their piece.

use std::any::Any;

use crate::codec::{CodecError, FieldKind, FieldValue, Fields};
use crate::command::Command;
use crate::core::{Location, NamedKey, ZoneId};
use crate::filter::{ExpressionError, PropertyExpression};

use super::{expression_field, KeyContext, KeyOutcome, Piece, PieceTrait, TraitDecode};

/// Build a move of `piece` to the top of `to`'s zone.
fn move_to_top(piece: &Piece, to: Location, ctx: &KeyContext<'_>) -> Option<KeyOutcome> {
    let from_index = ctx.state.index_of(piece.id())?;
    let to_index = ctx.state.landing_index(piece.id(), &to.zone);
    Some(KeyOutcome::Command(Command::MovePiece {
        id: piece.id(),
        from: piece.location().clone(),
        from_index,
        to,
        to_index,
    }))
}

/// Moves the piece by a fixed offset within its zone.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Translate {
    command_name: String,
    key: Option<NamedKey>,
    dx: i32,
    dy: i32,
    condition: PropertyExpression,
}

impl Translate {
    pub fn new(key: NamedKey, dx: i32, dy: i32) -> Self {
        Self {
            command_name: "Move".to_string(),
            key: Some(key),
            dx,
            dy,
            condition: PropertyExpression::empty(),
        }
    }

    #[must_use]
    pub fn with_command_name(mut self, name: impl Into<String>) -> Self {
        self.command_name = name.into();
        self
    }

    /// Only respond while the piece matches `expression`.
    pub fn with_condition(mut self, expression: &str) -> Result<Self, ExpressionError> {
        self.condition = PropertyExpression::parse(expression)?;
        Ok(self)
    }

    pub fn offset(&self) -> (i32, i32) {
        (self.dx, self.dy)
    }
}

impl Default for Translate {
    fn default() -> Self {
        Self {
            command_name: "Move".to_string(),
            key: None,
            dx: 0,
            dy: 0,
            condition: PropertyExpression::empty(),
        }
    }
}

impl PieceTrait for Translate {
    fn tag(&self) -> &str {
        Self::TAG
    }

    fn fields(&self) -> Vec<FieldValue> {
        vec![
            self.command_name.as_str().into(),
            self.key.clone().into(),
            i64::from(self.dx).into(),
            i64::from(self.dy).into(),
            self.condition.source().into(),
        ]
    }

    fn key_command(
        &self,
        key: &NamedKey,
        piece: &Piece,
        ctx: &mut KeyContext<'_>,
    ) -> Option<KeyOutcome> {
        if self.key.as_ref() != Some(key) || !self.condition.matches(piece) {
            return None;
        }
        move_to_top(piece, piece.location().offset(self.dx, self.dy), ctx)
    }

    fn command_name(&self) -> Option<&str> {
        Some(&self.command_name)
    }

    fn box_clone(&self) -> Box<dyn PieceTrait> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn coordinate(index: usize, value: i64) -> Result<i32, CodecError> {
    i32::try_from(value).map_err(|_| CodecError::InvalidField {
        index,
        kind: "int",
        text: value.to_string(),
    })
}

impl TraitDecode for Translate {
    const TAG: &'static str = "translate";
    const SCHEMA: &'static [FieldKind] = &[
        FieldKind::Text,
        FieldKind::Key,
        FieldKind::Int,
        FieldKind::Int,
        FieldKind::Text,
    ];

    fn from_fields(fields: &mut Fields) -> Result<Self, CodecError> {
        Ok(Self {
            command_name: fields.text()?,
            key: fields.key()?,
            dx: coordinate(2, fields.int()?)?,
            dy: coordinate(3, fields.int()?)?,
            condition: expression_field(fields, 4)?,
        })
    }
}

/// Sends the piece to the top of a deck zone.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReturnToDeck {
    command_name: String,
    key: Option<NamedKey>,
    deck: ZoneId,
    condition: PropertyExpression,
}

impl ReturnToDeck {
    pub fn new(key: NamedKey, deck: impl Into<ZoneId>) -> Self {
        Self {
            command_name: "Return to Deck".to_string(),
            key: Some(key),
            deck: deck.into(),
            condition: PropertyExpression::empty(),
        }
    }

    #[must_use]
    pub fn with_command_name(mut self, name: impl Into<String>) -> Self {
        self.command_name = name.into();
        self
    }

    /// Only respond while the piece matches `expression`.
    pub fn with_condition(mut self, expression: &str) -> Result<Self, ExpressionError> {
        self.condition = PropertyExpression::parse(expression)?;
        Ok(self)
    }

    pub fn deck(&self) -> &ZoneId {
        &self.deck
    }
}

impl PieceTrait for ReturnToDeck {
    fn tag(&self) -> &str {
        Self::TAG
    }

    fn fields(&self) -> Vec<FieldValue> {
        vec![
            self.command_name.as_str().into(),
            self.key.clone().into(),
            self.deck.as_str().into(),
            self.condition.source().into(),
        ]
    }

    fn key_command(
        &self,
        key: &NamedKey,
        piece: &Piece,
        ctx: &mut KeyContext<'_>,
    ) -> Option<KeyOutcome> {
        if self.key.as_ref() != Some(key) || !self.condition.matches(piece) {
            return None;
        }
        if self.deck.as_str().is_empty() {
            return Some(KeyOutcome::Consume);
        }
        move_to_top(piece, Location::from(self.deck.clone()), ctx)
    }

    fn command_name(&self) -> Option<&str> {
        Some(&self.command_name)
    }

    fn box_clone(&self) -> Box<dyn PieceTrait> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl TraitDecode for ReturnToDeck {
    const TAG: &'static str = "return";
    const SCHEMA: &'static [FieldKind] = &[FieldKind::Text, FieldKind::Key, FieldKind::Text, FieldKind::Text];

    fn from_fields(fields: &mut Fields) -> Result<Self, CodecError> {
        Ok(Self {
            command_name: fields.text()?,
            key: fields.key()?,
            deck: ZoneId(fields.text()?),
            condition: expression_field(fields, 3)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EntityId;
    use crate::traits::test_support::{press, state_with, unit};
    use crate::traits::TraitRegistry;

    #[test]
    fn test_translate_round_trip() {
        let registry = TraitRegistry::standard();
        for t in [
            Translate::default(),
            Translate::new(NamedKey::named("xyzzy"), 1, -2).with_command_name("testCommand"),
        ] {
            let decoded = registry.try_decode_trait(&t.encode()).unwrap();
            assert_eq!(decoded.as_any().downcast_ref::<Translate>(), Some(&t));
        }
        assert!(registry.try_decode_trait("translate;Move;;99999999999;0;").is_err());
    }

    #[test]
    fn test_return_round_trip() {
        let registry = TraitRegistry::standard();
        let t = ReturnToDeck::new(NamedKey::named("xyzzy"), "aDeck")
            .with_command_name("Plugh")
            .with_condition("Zone != aDeck")
            .unwrap();
        let decoded = registry.try_decode_trait(&t.encode()).unwrap();
        assert_eq!(decoded.as_any().downcast_ref::<ReturnToDeck>(), Some(&t));
    }

    #[test]
    fn test_translate_moves_to_top_of_same_zone() {
        let state = state_with(vec![
            unit(1, "Unit").decorate(Translate::new(NamedKey::named("east"), 3, 0)),
            unit(2, "Other"),
        ]);

        let result = press(&state, 1, &NamedKey::named("east")).unwrap();
        assert_eq!(result.report, "Unit: Move");
        assert_eq!(
            result.command,
            Command::MovePiece {
                id: EntityId(1),
                from: Location::new("board", 0, 0),
                from_index: 0,
                to: Location::new("board", 3, 0),
                to_index: 1,
            }
        );
    }

    #[test]
    fn test_return_to_deck() {
        let deck_card = Piece::basic(EntityId(2), "Card", Location::new("deck", 0, 0));
        let state = state_with(vec![
            unit(1, "Unit").decorate(ReturnToDeck::new(NamedKey::named("ret"), "deck")),
            deck_card,
        ]);

        let result = press(&state, 1, &NamedKey::named("ret")).unwrap();
        let Command::MovePiece { to, to_index, .. } = result.command else {
            panic!("expected a move");
        };
        assert_eq!(to, Location::new("deck", 0, 0));
        assert_eq!(to_index, 1);
    }

    #[test]
    fn test_condition_gates_moves() {
        let east = NamedKey::named("east");
        let scout = |fuel: i64| {
            unit(1, "Scout")
                .with_property("Fuel", fuel)
                .decorate(Translate::new(east.clone(), 1, 0).with_condition("Fuel > 0").unwrap())
        };

        let state = state_with(vec![scout(2)]);
        assert!(press(&state, 1, &east).is_some());

        let state = state_with(vec![scout(0)]);
        assert_eq!(press(&state, 1, &east), None);

        let ret = NamedKey::named("ret");
        let card = Piece::basic(EntityId(1), "Card", Location::new("deck", 0, 0))
            .decorate(ReturnToDeck::new(ret.clone(), "deck").with_condition("Zone != deck").unwrap());
        assert_eq!(press(&state_with(vec![card]), 1, &ret), None);
    }

    #[test]
    fn test_return_without_deck_is_consumed() {
        let state = state_with(vec![unit(1, "Unit").decorate(ReturnToDeck::new(NamedKey::named("ret"), ""))]);
        assert_eq!(press(&state, 1, &NamedKey::named("ret")), None);
    }
}
