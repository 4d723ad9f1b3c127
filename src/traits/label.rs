//! Text labels and fixed markers.

use std::any::Any;

use crate::codec::{CodecError, FieldKind, FieldValue, Fields};
use crate::core::{PlayerId, PropertyValue};

use super::{PieceTrait, TraitDecode};

/// Name of the property a [`Label`] answers.
pub const LABEL_PROPERTY: &str = "Label";

/// A text label drawn on the piece.
///
/// Exposes the text as the `Label` property and leads the description.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Label {
    text: String,
}

impl Label {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl PieceTrait for Label {
    fn tag(&self) -> &str {
        Self::TAG
    }

    fn fields(&self) -> Vec<FieldValue> {
        vec![self.text.as_str().into()]
    }

    fn property(&self, name: &str, _observer: Option<PlayerId>) -> Option<PropertyValue> {
        (name == LABEL_PROPERTY).then(|| self.text.as_str().into())
    }

    fn describe(&self) -> Option<String> {
        (!self.text.is_empty()).then(|| self.text.clone())
    }

    fn box_clone(&self) -> Box<dyn PieceTrait> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl TraitDecode for Label {
    const TAG: &'static str = "label";
    const SCHEMA: &'static [FieldKind] = &[FieldKind::Text];

    fn from_fields(fields: &mut Fields) -> Result<Self, CodecError> {
        Ok(Self::new(fields.text()?))
    }
}

/// A fixed named property, such as `Type = Tank`.
///
/// Markers have no visible effect and don't respond to keys.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Marker {
    name: String,
    value: String,
}

impl Marker {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl PieceTrait for Marker {
    fn tag(&self) -> &str {
        Self::TAG
    }

    fn fields(&self) -> Vec<FieldValue> {
        vec![self.name.as_str().into(), self.value.as_str().into()]
    }

    fn property(&self, name: &str, _observer: Option<PlayerId>) -> Option<PropertyValue> {
        (name == self.name).then(|| self.value.as_str().into())
    }

    fn box_clone(&self) -> Box<dyn PieceTrait> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl TraitDecode for Marker {
    const TAG: &'static str = "mark";
    const SCHEMA: &'static [FieldKind] = &[FieldKind::Text, FieldKind::Text];

    fn from_fields(fields: &mut Fields) -> Result<Self, CodecError> {
        Ok(Self::new(fields.text()?, fields.text()?))
    }
}
