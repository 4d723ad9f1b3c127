//! Hiding pieces from other players.

use std::any::Any;

use crate::codec::{CodecError, FieldKind, FieldValue, Fields};
use crate::core::property::names;
use crate::core::{NamedKey, PlayerId, PropertyValue};

use super::{KeyContext, KeyOutcome, Piece, PieceTrait, TraitDecode};

/// Properties still answered for a piece the observer can't see.
const ALWAYS_VISIBLE: &[&str] = &[
    names::INVISIBLE_TO_ME,
    names::INVISIBLE_TO_OTHERS,
    names::ID,
    names::ZONE,
    names::X,
    names::Y,
];

/// Lets the player who hides a piece keep seeing it while everyone else
/// sees only where it is.
///
/// While hidden, observers other than the hider get `InvisibleToMe = true`
/// and no other property from further in the chain, and every key they
/// press on the piece is swallowed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Hideable {
    key: Option<NamedKey>,
    command_name: String,
    hidden_by: Option<PlayerId>,
}

impl Hideable {
    pub fn new(key: Option<NamedKey>) -> Self {
        Self {
            key,
            command_name: "Hide".to_string(),
            hidden_by: None,
        }
    }

    #[must_use]
    pub fn with_command_name(mut self, name: impl Into<String>) -> Self {
        self.command_name = name.into();
        self
    }

    /// Start hidden by `player`.
    #[must_use]
    pub fn hidden_by(mut self, player: PlayerId) -> Self {
        self.hidden_by = Some(player);
        self
    }

    pub fn hider(&self) -> Option<PlayerId> {
        self.hidden_by
    }

    /// Whether `observer` is shut out. The unrestricted view sees everything.
    #[must_use]
    pub fn is_invisible_to(&self, observer: Option<PlayerId>) -> bool {
        match (self.hidden_by, observer) {
            (Some(hider), Some(observer)) => hider != observer,
            _ => false,
        }
    }
}

impl PieceTrait for Hideable {
    fn tag(&self) -> &str {
        Self::TAG
    }

    fn fields(&self) -> Vec<FieldValue> {
        let hidden_by = self.hidden_by.map_or(-1, |p| i64::from(p.0));
        vec![
            self.key.clone().into(),
            self.command_name.as_str().into(),
            hidden_by.into(),
        ]
    }

    fn property(&self, name: &str, observer: Option<PlayerId>) -> Option<PropertyValue> {
        match name {
            names::INVISIBLE_TO_ME => Some(self.is_invisible_to(observer).into()),
            names::INVISIBLE_TO_OTHERS => Some(self.hidden_by.is_some().into()),
            _ => None,
        }
    }

    fn masks(&self, name: &str, observer: Option<PlayerId>) -> bool {
        self.is_invisible_to(observer) && !ALWAYS_VISIBLE.contains(&name)
    }

    fn key_command(
        &self,
        key: &NamedKey,
        _piece: &Piece,
        ctx: &mut KeyContext<'_>,
    ) -> Option<KeyOutcome> {
        if self.is_invisible_to(Some(ctx.actor)) {
            return Some(KeyOutcome::Consume);
        }
        if self.key.as_ref() != Some(key) {
            return None;
        }
        let hidden_by = match self.hidden_by {
            Some(_) => None,
            None => Some(ctx.actor),
        };
        Some(KeyOutcome::Replace(Box::new(Self {
            hidden_by,
            ..self.clone()
        })))
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

impl TraitDecode for Hideable {
    const TAG: &'static str = "hide";
    const SCHEMA: &'static [FieldKind] = &[FieldKind::Key, FieldKind::Text, FieldKind::Int];

    fn from_fields(fields: &mut Fields) -> Result<Self, CodecError> {
        let key = fields.key()?;
        let command_name = fields.text()?;
        let raw = fields.int()?;
        let hidden_by = match raw {
            -1 => None,
            n => Some(u8::try_from(n).map(PlayerId::new).map_err(|_| {
                CodecError::InvalidField {
                    index: 2,
                    kind: "int",
                    text: n.to_string(),
                }
            })?),
        };
        Ok(Self {
            key,
            command_name,
            hidden_by,
        })
    }
}
