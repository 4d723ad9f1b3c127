//! Switchable image layers.

use std::any::Any;

use crate::codec::{CodecError, FieldKind, FieldValue, Fields};
use crate::core::{NamedKey, PlayerId, PropertyValue};

use super::{KeyContext, KeyOutcome, Piece, PieceTrait, TraitDecode};

/// A stack of named levels, one of which is shown while the layer is active.
///
/// Properties, for a layer named `N`:
///
/// - `N_Level`: current level, 1-based
/// - `N_Active`: whether the layer is showing
/// - `N_Name`: name of the current level
///
/// Level keys cycle through the levels and wrap at either end.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layer {
    name: String,
    levels: Vec<String>,
    level: usize,
    active: bool,
    always_active: bool,
    activate: Option<NamedKey>,
    up: Option<NamedKey>,
    down: Option<NamedKey>,
}

impl Layer {
    /// An inactive layer at its first level, with no keys.
    pub fn new<S: Into<String>>(name: impl Into<String>, levels: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: name.into(),
            levels: levels.into_iter().map(Into::into).collect(),
            level: 0,
            active: false,
            always_active: false,
            activate: None,
            up: None,
            down: None,
        }
    }

    #[must_use]
    pub fn always_active(mut self) -> Self {
        self.always_active = true;
        self
    }

    #[must_use]
    pub fn with_activate_key(mut self, key: NamedKey) -> Self {
        self.activate = Some(key);
        self
    }

    #[must_use]
    pub fn with_level_keys(mut self, up: Option<NamedKey>, down: Option<NamedKey>) -> Self {
        self.up = up;
        self.down = down;
        self
    }

    /// Panics if `level` is out of range.
    #[must_use]
    pub fn at_level(mut self, level: usize) -> Self {
        assert!(level < self.levels.len().max(1), "Layer level out of range");
        self.level = level;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn is_active(&self) -> bool {
        self.active || self.always_active
    }

    /// Name of the current level, if there are any levels.
    pub fn level_name(&self) -> Option<&str> {
        self.levels.get(self.level).map(String::as_str)
    }

    fn cycled(&self, forward: bool) -> usize {
        let count = self.levels.len().max(1);
        if forward {
            (self.level + 1) % count
        } else {
            (self.level + count - 1) % count
        }
    }
}

impl PieceTrait for Layer {
    fn tag(&self) -> &str {
        Self::TAG
    }

    fn fields(&self) -> Vec<FieldValue> {
        vec![
            self.name.as_str().into(),
            FieldValue::TextList(self.levels.clone()),
            (self.level as i64).into(),
            self.active.into(),
            self.always_active.into(),
            self.activate.clone().into(),
            self.up.clone().into(),
            self.down.clone().into(),
        ]
    }

    fn property(&self, name: &str, _observer: Option<PlayerId>) -> Option<PropertyValue> {
        let suffix = name.strip_prefix(self.name.as_str())?.strip_prefix('_')?;
        match suffix {
            "Level" => Some(PropertyValue::Int(self.level as i64 + 1)),
            "Active" => Some(self.is_active().into()),
            "Name" => Some(self.level_name().unwrap_or_default().into()),
            _ => None,
        }
    }

    fn describe(&self) -> Option<String> {
        if !self.is_active() {
            return None;
        }
        self.level_name().filter(|n| !n.is_empty()).map(str::to_string)
    }

    fn key_command(
        &self,
        key: &NamedKey,
        _piece: &Piece,
        _ctx: &mut KeyContext<'_>,
    ) -> Option<KeyOutcome> {
        let mut next = self.clone();
        if self.activate.as_ref() == Some(key) {
            if self.always_active {
                return Some(KeyOutcome::Consume);
            }
            next.active = !self.active;
        } else if self.up.as_ref() == Some(key) {
            next.level = self.cycled(true);
            next.active = true;
        } else if self.down.as_ref() == Some(key) {
            next.level = self.cycled(false);
            next.active = true;
        } else {
            return None;
        }

        if next == *self {
            return Some(KeyOutcome::Consume);
        }
        Some(KeyOutcome::Replace(Box::new(next)))
    }

    fn box_clone(&self) -> Box<dyn PieceTrait> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl TraitDecode for Layer {
    const TAG: &'static str = "layer";
    const SCHEMA: &'static [FieldKind] = &[
        FieldKind::Text,
        FieldKind::TextList,
        FieldKind::Int,
        FieldKind::Bool,
        FieldKind::Bool,
        FieldKind::Key,
        FieldKind::Key,
        FieldKind::Key,
    ];

    fn from_fields(fields: &mut Fields) -> Result<Self, CodecError> {
        let name = fields.text()?;
        let levels = fields.text_list()?;
        let raw_level = fields.int()?;
        let level = usize::try_from(raw_level)
            .ok()
            .filter(|&l| l < levels.len().max(1))
            .ok_or_else(|| CodecError::InvalidField {
                index: 2,
                kind: "int",
                text: raw_level.to_string(),
            })?;
        Ok(Self {
            name,
            levels,
            level,
            active: fields.bool()?,
            always_active: fields.bool()?,
            activate: fields.key()?,
            up: fields.key()?,
            down: fields.key()?,
        })
    }
}
