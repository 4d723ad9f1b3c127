//! Traits that create or destroy pieces.

use std::any::Any;

use crate::codec::{CodecError, FieldKind, FieldValue, Fields};
use crate::command::Command;
use crate::core::NamedKey;
use crate::filter::{ExpressionError, PropertyExpression};

use super::{expression_field, KeyContext, KeyOutcome, Piece, PieceTrait, TraitDecode};

/// Spawns a copy of the whole piece, with a fresh id, on top of its zone.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cloneable {
    command_name: String,
    key: Option<NamedKey>,
    condition: PropertyExpression,
}

impl Cloneable {
    pub fn new(key: NamedKey) -> Self {
        Self {
            command_name: "Clone".to_string(),
            key: Some(key),
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
}

impl PieceTrait for Cloneable {
    fn tag(&self) -> &str {
        Self::TAG
    }

    fn fields(&self) -> Vec<FieldValue> {
        vec![
            self.command_name.as_str().into(),
            self.key.clone().into(),
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
        let id = ctx.allocate_id();
        let index = ctx.state.zone_size(&piece.location().zone);
        Some(KeyOutcome::Command(Command::AddPiece {
            id,
            state: piece.with_id(id).encode(),
            index,
        }))
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

impl TraitDecode for Cloneable {
    const TAG: &'static str = "clone";
    const SCHEMA: &'static [FieldKind] = &[FieldKind::Text, FieldKind::Key, FieldKind::Text];

    fn from_fields(fields: &mut Fields) -> Result<Self, CodecError> {
        Ok(Self {
            command_name: fields.text()?,
            key: fields.key()?,
            condition: expression_field(fields, 2)?,
        })
    }
}

/// Removes the piece from the game.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Deletable {
    command_name: String,
    key: Option<NamedKey>,
    condition: PropertyExpression,
}

impl Deletable {
    pub fn new(key: NamedKey) -> Self {
        Self {
            command_name: "Delete".to_string(),
            key: Some(key),
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
}

impl PieceTrait for Deletable {
    fn tag(&self) -> &str {
        Self::TAG
    }

    fn fields(&self) -> Vec<FieldValue> {
        vec![
            self.command_name.as_str().into(),
            self.key.clone().into(),
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
        let index = ctx.state.index_of(piece.id())?;
        Some(KeyOutcome::Command(Command::RemovePiece {
            id: piece.id(),
            state: piece.encode(),
            index,
        }))
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

impl TraitDecode for Deletable {
    const TAG: &'static str = "delete";
    const SCHEMA: &'static [FieldKind] = &[FieldKind::Text, FieldKind::Key, FieldKind::Text];

    fn from_fields(fields: &mut Fields) -> Result<Self, CodecError> {
        Ok(Self {
            command_name: fields.text()?,
            key: fields.key()?,
            condition: expression_field(fields, 2)?,
        })
    }
}
