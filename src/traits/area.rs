//! Area of effect around a piece.

use std::any::Any;

use crate::codec::{CodecError, FieldKind, FieldValue, Fields};
use crate::core::{GameState, NamedKey, PlayerId, PropertyValue};
use crate::filter::{Both, ExpressionError, PieceIter, PropertyExpression, Visible};

use super::{expression_field, KeyContext, KeyOutcome, Piece, PieceTrait, TraitDecode};

/// Property holding the radius.
pub const RADIUS_PROPERTY: &str = "AreaRadius";

/// Property telling whether the area is showing.
pub const ACTIVE_PROPERTY: &str = "AreaActive";

/// A circular area around the piece, drawn as a translucent overlay.
///
/// The area covers every position within the radius of the piece in the
/// same zone. [`affected`](AreaOfEffect::affected) lists the other pieces
/// inside it that match the configured expression.
///
/// The radius is either fixed or read from a property of the whole chain,
/// so another trait (a counter, a marker) can drive it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AreaOfEffect {
    radius: u32,
    fixed_radius: bool,
    radius_property: String,
    always_active: bool,
    active: bool,
    command_name: String,
    activate: Option<NamedKey>,
    color: u32,
    transparency: u8,
    shader: String,
    filter: PropertyExpression,
}

impl Default for AreaOfEffect {
    fn default() -> Self {
        Self {
            radius: 1,
            fixed_radius: true,
            radius_property: String::new(),
            always_active: true,
            active: false,
            command_name: String::new(),
            activate: None,
            color: 0x80_80_80,
            transparency: 30,
            shader: String::new(),
            filter: PropertyExpression::empty(),
        }
    }
}

impl AreaOfEffect {
    /// An always-active area of `radius` that affects everything.
    pub fn new(radius: u32) -> Self {
        Self {
            radius,
            ..Self::default()
        }
    }

    /// Make the area switchable with `key`, starting inactive.
    #[must_use]
    pub fn with_activate_key(mut self, key: NamedKey) -> Self {
        self.always_active = false;
        self.activate = Some(key);
        self
    }

    /// Read the radius from `property` instead of the fixed value.
    #[must_use]
    pub fn with_variable_radius(mut self, property: impl Into<String>) -> Self {
        self.fixed_radius = false;
        self.radius_property = property.into();
        self
    }

    /// Name reported when the activate key toggles the area.
    #[must_use]
    pub fn with_command_name(mut self, name: impl Into<String>) -> Self {
        self.command_name = name.into();
        self
    }

    /// Shade the area with the named map shader instead of a plain color.
    #[must_use]
    pub fn with_shader(mut self, name: impl Into<String>) -> Self {
        self.shader = name.into();
        self
    }

    /// Panics if `transparency` is above 100.
    #[must_use]
    pub fn with_shading(mut self, color: u32, transparency: u8) -> Self {
        assert!(transparency <= 100, "Transparency is a percentage");
        self.color = color & 0xFF_FF_FF;
        self.transparency = transparency;
        self
    }

    /// Only pieces matching `expression` count as affected.
    pub fn with_filter(mut self, expression: &str) -> Result<Self, ExpressionError> {
        self.filter = PropertyExpression::parse(expression)?;
        Ok(self)
    }

    /// The configured fixed radius.
    pub fn radius(&self) -> u32 {
        self.radius
    }

    pub fn shader(&self) -> &str {
        &self.shader
    }

    /// Radius in effect for `piece`.
    ///
    /// A variable radius whose property is missing or not a non-negative
    /// integer is 0.
    #[must_use]
    pub fn radius_for(&self, piece: &Piece) -> u32 {
        if self.fixed_radius {
            return self.radius;
        }
        let value = piece.property(&self.radius_property).and_then(|v| match v {
            PropertyValue::Int(n) => Some(n),
            PropertyValue::Text(text) => text.trim().parse().ok(),
            PropertyValue::Bool(_) => None,
        });
        value.and_then(|n| u32::try_from(n).ok()).unwrap_or(0)
    }

    pub fn is_active(&self) -> bool {
        self.always_active || self.active
    }

    /// Other pieces within the area that `observer` can see and the filter
    /// accepts, bottom first.
    ///
    /// `piece` must be the chain this trait belongs to.
    #[must_use]
    pub fn affected<'a>(&self, piece: &Piece, state: &'a GameState, observer: PlayerId) -> Vec<&'a Piece> {
        if !self.is_active() {
            return Vec::new();
        }
        let center = piece.location();
        let reach = i64::from(self.radius_for(piece)).pow(2);
        let in_area = |other: &Piece| {
            other.id() != piece.id()
                && center
                    .distance_squared(other.location())
                    .is_some_and(|d| d <= reach)
                && self.filter.matches(other)
        };
        PieceIter::new(
            state.pieces_in_zone(&center.zone),
            Both(Visible::to(observer), in_area),
        )
        .collect()
    }
}

impl PieceTrait for AreaOfEffect {
    fn tag(&self) -> &str {
        Self::TAG
    }

    fn fields(&self) -> Vec<FieldValue> {
        vec![
            i64::from(self.radius).into(),
            self.fixed_radius.into(),
            self.radius_property.as_str().into(),
            self.always_active.into(),
            self.active.into(),
            self.command_name.as_str().into(),
            self.activate.clone().into(),
            i64::from(self.color).into(),
            i64::from(self.transparency).into(),
            self.shader.as_str().into(),
            self.filter.source().into(),
        ]
    }

    fn property(&self, name: &str, _observer: Option<PlayerId>) -> Option<PropertyValue> {
        match name {
            RADIUS_PROPERTY => Some(PropertyValue::Int(i64::from(self.radius))),
            ACTIVE_PROPERTY => Some(self.is_active().into()),
            _ => None,
        }
    }

    fn key_command(
        &self,
        key: &NamedKey,
        _piece: &Piece,
        _ctx: &mut KeyContext<'_>,
    ) -> Option<KeyOutcome> {
        if self.activate.as_ref() != Some(key) {
            return None;
        }
        if self.always_active {
            return Some(KeyOutcome::Consume);
        }
        Some(KeyOutcome::Replace(Box::new(Self {
            active: !self.active,
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

impl TraitDecode for AreaOfEffect {
    const TAG: &'static str = "aoe";
    const SCHEMA: &'static [FieldKind] = &[
        FieldKind::Int,
        FieldKind::Bool,
        FieldKind::Text,
        FieldKind::Bool,
        FieldKind::Bool,
        FieldKind::Text,
        FieldKind::Key,
        FieldKind::Int,
        FieldKind::Int,
        FieldKind::Text,
        FieldKind::Text,
    ];

    fn from_fields(fields: &mut Fields) -> Result<Self, CodecError> {
        fn ranged<T: TryFrom<i64>>(index: usize, value: i64, max: i64) -> Result<T, CodecError> {
            let invalid = || CodecError::InvalidField {
                index,
                kind: "int",
                text: value.to_string(),
            };
            if value > max {
                return Err(invalid());
            }
            T::try_from(value).map_err(|_| invalid())
        }

        Ok(Self {
            radius: ranged(0, fields.int()?, i64::from(u32::MAX))?,
            fixed_radius: fields.bool()?,
            radius_property: fields.text()?,
            always_active: fields.bool()?,
            active: fields.bool()?,
            command_name: fields.text()?,
            activate: fields.key()?,
            color: ranged(7, fields.int()?, 0xFF_FF_FF)?,
            transparency: ranged(8, fields.int()?, 100)?,
            shader: fields.text()?,
            filter: expression_field(fields, 10)?,
        })
    }
}
