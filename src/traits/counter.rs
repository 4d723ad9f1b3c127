//! Numeric counters.

use std::any::Any;

use crate::codec::{CodecError, FieldKind, FieldValue, Fields};
use crate::core::{NamedKey, PlayerId, PropertyValue};
use crate::filter::{ExpressionError, PropertyExpression};

use super::{expression_field, KeyContext, KeyOutcome, Piece, PieceTrait, TraitDecode};

/// A named integer property that keys step up or down.
///
/// The value stays within `[min, max]`. Past a bound it either clamps or,
/// with `wrap`, jumps to the other bound.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Counter {
    name: String,
    value: i64,
    step: i64,
    min: i64,
    max: i64,
    wrap: bool,
    increase: Option<NamedKey>,
    decrease: Option<NamedKey>,
    condition: PropertyExpression,
}

impl Counter {
    /// Unbounded counter with step 1 and no keys.
    pub fn new(name: impl Into<String>, value: i64) -> Self {
        Self {
            name: name.into(),
            value,
            step: 1,
            min: i64::MIN,
            max: i64::MAX,
            wrap: false,
            increase: None,
            decrease: None,
            condition: PropertyExpression::empty(),
        }
    }

    /// Panics if `min > max`.
    #[must_use]
    pub fn with_range(mut self, min: i64, max: i64) -> Self {
        assert!(min <= max, "Counter range is empty");
        self.min = min;
        self.max = max;
        self.value = self.value.clamp(min, max);
        self
    }

    #[must_use]
    pub fn with_step(mut self, step: i64) -> Self {
        self.step = step;
        self
    }

    #[must_use]
    pub fn with_wrap(mut self, wrap: bool) -> Self {
        self.wrap = wrap;
        self
    }

    /// Set the keys that step the value up and down.
    #[must_use]
    pub fn with_keys(mut self, increase: Option<NamedKey>, decrease: Option<NamedKey>) -> Self {
        self.increase = increase;
        self.decrease = decrease;
        self
    }

    /// Only respond to keys while the piece matches `expression`.
    pub fn with_condition(mut self, expression: &str) -> Result<Self, ExpressionError> {
        self.condition = PropertyExpression::parse(expression)?;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> i64 {
        self.value
    }

    /// Value after adding `delta`, honoring the range.
    #[must_use]
    pub fn stepped(&self, delta: i64) -> i64 {
        match self.value.checked_add(delta) {
            Some(v) if v > self.max => {
                if self.wrap {
                    self.min
                } else {
                    self.max
                }
            }
            Some(v) if v < self.min => {
                if self.wrap {
                    self.max
                } else {
                    self.min
                }
            }
            Some(v) => v,
            None if delta > 0 => self.max,
            None => self.min,
        }
    }
}

impl PieceTrait for Counter {
    fn tag(&self) -> &str {
        Self::TAG
    }

    fn fields(&self) -> Vec<FieldValue> {
        vec![
            self.name.as_str().into(),
            self.value.into(),
            self.step.into(),
            self.min.into(),
            self.max.into(),
            self.wrap.into(),
            self.increase.clone().into(),
            self.decrease.clone().into(),
            self.condition.source().into(),
        ]
    }

    fn property(&self, name: &str, _observer: Option<PlayerId>) -> Option<PropertyValue> {
        (name == self.name).then_some(PropertyValue::Int(self.value))
    }

    fn describe(&self) -> Option<String> {
        Some(format!("{} {}", self.name, self.value))
    }

    fn key_command(
        &self,
        key: &NamedKey,
        piece: &Piece,
        _ctx: &mut KeyContext<'_>,
    ) -> Option<KeyOutcome> {
        if !self.condition.matches(piece) {
            return None;
        }
        let delta = if self.increase.as_ref() == Some(key) {
            self.step
        } else if self.decrease.as_ref() == Some(key) {
            self.step.checked_neg().unwrap_or(i64::MAX)
        } else {
            return None;
        };

        let value = self.stepped(delta);
        if value == self.value {
            return Some(KeyOutcome::Consume);
        }
        Some(KeyOutcome::Replace(Box::new(Self {
            value,
            ..self.clone()
        })))
    }

    fn box_clone(&self) -> Box<dyn PieceTrait> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl TraitDecode for Counter {
    const TAG: &'static str = "counter";
    const SCHEMA: &'static [FieldKind] = &[
        FieldKind::Text,
        FieldKind::Int,
        FieldKind::Int,
        FieldKind::Int,
        FieldKind::Int,
        FieldKind::Bool,
        FieldKind::Key,
        FieldKind::Key,
        FieldKind::Text,
    ];

    fn from_fields(fields: &mut Fields) -> Result<Self, CodecError> {
        let name = fields.text()?;
        let value = fields.int()?;
        let step = fields.int()?;
        let min = fields.int()?;
        let max = fields.int()?;
        if min > max {
            return Err(CodecError::InvalidField {
                index: 3,
                kind: "int",
                text: format!("{} > {}", min, max),
            });
        }
        Ok(Self {
            name,
            value,
            step,
            min,
            max,
            wrap: fields.bool()?,
            increase: fields.key()?,
            decrease: fields.key()?,
            condition: expression_field(fields, 8)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Command;
    use crate::traits::test_support::{press, state_with, unit};
    use crate::traits::TraitRegistry;

    fn ammo() -> Counter {
        Counter::new("Ammo", 2)
            .with_range(0, 3)
            .with_keys(Some(NamedKey::named("up")), Some(NamedKey::named("down")))
    }

    #[test]
    fn test_round_trip() {
        let registry = TraitRegistry::standard();
        let counter = ammo()
            .with_step(2)
            .with_wrap(true)
            .with_condition("Side = Red")
            .unwrap();
        let decoded = registry.try_decode_trait(&counter.encode()).unwrap();
        assert_eq!(decoded.as_any().downcast_ref::<Counter>(), Some(&counter));
    }

    #[test]
    fn test_stepping() {
        let c = ammo();
        assert_eq!(c.stepped(1), 3);
        assert_eq!(c.stepped(5), 3);
        assert_eq!(c.stepped(-5), 0);

        let w = ammo().with_wrap(true);
        assert_eq!(w.stepped(2), 0);
        assert_eq!(w.stepped(-3), 3);

        let unbounded = Counter::new("n", i64::MAX);
        assert_eq!(unbounded.stepped(1), i64::MAX);
    }

    #[test]
    fn test_key_changes_value() {
        let state = state_with(vec![unit(1, "Unit").decorate(ammo())]);

        let result = press(&state, 1, &NamedKey::named("up")).unwrap();
        let Command::ChangePiece { old, new, .. } = &result.command else {
            panic!("expected a change, got {:?}", result.command);
        };
        assert!(old.contains("counter;Ammo;2;"));
        assert!(new.contains("counter;Ammo;3;"));
        assert_eq!(result.report, "Ammo 2 - Unit");
    }

    #[test]
    fn test_key_at_bound_is_consumed() {
        let state = state_with(vec![unit(1, "Unit")
            .decorate(Counter::new("Inner", 0).with_keys(Some(NamedKey::named("up")), None))
            .decorate(ammo().with_range(0, 2))]);

        // Outer counter is at its max and claims the key; inner never sees it.
        assert_eq!(press(&state, 1, &NamedKey::named("up")), None);
    }

    #[test]
    fn test_condition_gates_keys() {
        let up = NamedKey::named("up");
        let counter = ammo().with_condition("Side = Red").unwrap();

        let red = state_with(vec![unit(1, "Unit").with_property("Side", "Red").decorate(counter.clone())]);
        assert!(press(&red, 1, &up).is_some());

        let blue = state_with(vec![unit(1, "Unit").with_property("Side", "Blue").decorate(counter)]);
        assert_eq!(press(&blue, 1, &up), None);
    }

    #[test]
    fn test_reversed_range_rejected() {
        let registry = TraitRegistry::standard();
        assert!(registry.try_decode_trait("counter;n;0;1;5;1;false;;;").is_err());
    }
}
