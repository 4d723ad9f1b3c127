//! The piece: a base record plus its trait chain.

use tracing::debug;

use crate::codec::{
    decode_list, encode_list, split_segment, split_segments_verbatim, unescape, CodecError,
    SequenceEncoder, FIELD_DELIMITER, LIST_DELIMITER, SEGMENT_DELIMITER,
};
use crate::command::Command;
use crate::core::property::names;
use crate::core::{EntityId, Location, NamedKey, PlayerId, Properties, PropertyValue, ZoneId};
use crate::filter::PropertySource;

use super::registry::TraitRegistry;
use super::{KeyContext, KeyOutcome, KeyResult, PieceTrait};

/// Tag of the base piece segment.
pub const BASE_TAG: &str = "piece";

/// The innermost record of every piece: identity, location, properties.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BasePiece {
    pub id: EntityId,
    pub name: String,
    pub location: Location,
    pub owner: Option<PlayerId>,
    pub properties: Properties,
}

impl BasePiece {
    /// Create a base record with no owner and no properties.
    pub fn new(id: EntityId, name: impl Into<String>, location: Location) -> Self {
        Self {
            id,
            name: name.into(),
            location,
            owner: None,
            properties: Properties::new(),
        }
    }

    /// Built-in properties plus the property map.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<PropertyValue> {
        match name {
            names::NAME => Some(self.name.clone().into()),
            names::ID => Some(PropertyValue::Text(self.id.raw().to_string())),
            names::ZONE => Some(self.location.zone.as_str().into()),
            names::X => Some(self.location.x.into()),
            names::Y => Some(self.location.y.into()),
            names::OWNER => self.owner.map(|p| PropertyValue::Int(i64::from(p.0))),
            _ => self.properties.get(name).cloned(),
        }
    }

    /// Encoded base segment:
    /// `piece;id;name;zone;x;y;owner;properties`.
    #[must_use]
    pub fn encode(&self) -> String {
        let mut props = Vec::with_capacity(self.properties.len() * 2);
        for (key, value) in &self.properties {
            props.push(key.clone());
            props.push(value.to_tagged());
        }

        let mut se = SequenceEncoder::new(FIELD_DELIMITER);
        se.append(BASE_TAG)
            .append(&self.id.raw().to_string())
            .append(&self.name)
            .append(self.location.zone.as_str())
            .append_int(i64::from(self.location.x))
            .append_int(i64::from(self.location.y))
            .append(&self.owner.map(|p| p.0.to_string()).unwrap_or_default())
            .append(&encode_list(&props, LIST_DELIMITER));
        se.finish()
    }

    /// Decode a base segment.
    pub fn decode(segment: &str) -> Result<Self, CodecError> {
        let (tag, fields) = split_segment(segment);
        if tag != BASE_TAG {
            return Err(CodecError::BadBase(format!("expected `{}` tag, found `{}`", BASE_TAG, tag)));
        }
        let [id, name, zone, x, y, owner, props] = <[String; 7]>::try_from(fields)
            .map_err(|f| CodecError::BadBase(format!("expected 7 fields, found {}", f.len())))?;

        let bad = |what: &str, text: &str| CodecError::BadBase(format!("invalid {} `{}`", what, text));

        let id: EntityId = id.parse().map_err(|_| bad("id", &id))?;
        let x: i32 = x.parse().map_err(|_| bad("x", &x))?;
        let y: i32 = y.parse().map_err(|_| bad("y", &y))?;
        let owner = if owner.is_empty() {
            None
        } else {
            Some(owner.parse::<PlayerId>().map_err(|_| bad("owner", &owner))?)
        };

        let items = decode_list(&props, LIST_DELIMITER).ok_or_else(|| bad("properties", &props))?;
        if items.len() % 2 != 0 {
            return Err(bad("properties", &props));
        }
        let mut properties = Properties::new();
        for pair in items.chunks_exact(2) {
            let value = PropertyValue::from_tagged(&pair[1]).ok_or_else(|| bad("property value", &pair[1]))?;
            properties.insert(pair[0].clone(), value);
        }

        Ok(Self {
            id,
            name,
            location: Location {
                zone: ZoneId(zone),
                x,
                y,
            },
            owner,
            properties,
        })
    }
}

/// A piece: traits (outer first) around a base record.
///
/// ```
/// use rust_tabletop::core::{EntityId, Location};
/// use rust_tabletop::traits::{Label, Marker, Piece, TraitRegistry};
///
/// let piece = Piece::basic(EntityId(1), "Unit", Location::new("board", 0, 0))
///     .decorate(Marker::new("Type", "Tank"))
///     .decorate(Label::new("Tank"));
///
/// assert_eq!(piece.property("Label").unwrap().to_string(), "Tank");
/// assert_eq!(piece.property("Type").unwrap().to_string(), "Tank");
/// assert_eq!(piece.describe(), "Tank - Unit");
///
/// let registry = TraitRegistry::standard();
/// let copy = Piece::decode(&piece.encode(), &registry).unwrap();
/// assert_eq!(copy, piece);
/// ```
#[derive(Clone, Debug)]
pub struct Piece {
    traits: Vec<Box<dyn PieceTrait>>,
    base: BasePiece,
}

impl Piece {
    /// Create a piece from its traits (outer first) and base record.
    #[must_use]
    pub fn new(traits: Vec<Box<dyn PieceTrait>>, base: BasePiece) -> Self {
        Self { traits, base }
    }

    /// A piece with no traits.
    pub fn basic(id: EntityId, name: impl Into<String>, location: Location) -> Self {
        Self::new(Vec::new(), BasePiece::new(id, name, location))
    }

    /// Wrap the chain in another trait, which becomes the outermost one.
    #[must_use]
    pub fn decorate(mut self, outer: impl PieceTrait + 'static) -> Self {
        self.traits.insert(0, Box::new(outer));
        self
    }

    /// Set a base property.
    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.base.properties.insert(name.into(), value.into());
        self
    }

    /// Set the owning player.
    #[must_use]
    pub fn with_owner(mut self, owner: PlayerId) -> Self {
        self.base.owner = Some(owner);
        self
    }

    /// The same chain under a different id.
    #[must_use]
    pub fn with_id(&self, id: EntityId) -> Self {
        let mut copy = self.clone();
        copy.base.id = id;
        copy
    }

    /// The same chain at a different location.
    #[must_use]
    pub fn with_location(&self, location: Location) -> Self {
        let mut copy = self.clone();
        copy.base.location = location;
        copy
    }

    /// The same chain with the trait at `index` replaced.
    ///
    /// Panics if `index` is out of range.
    #[must_use]
    pub fn with_trait_replaced(&self, index: usize, replacement: Box<dyn PieceTrait>) -> Self {
        let mut copy = self.clone();
        copy.traits[index] = replacement;
        copy
    }

    pub fn id(&self) -> EntityId {
        self.base.id
    }

    pub fn name(&self) -> &str {
        &self.base.name
    }

    pub fn location(&self) -> &Location {
        &self.base.location
    }

    pub fn owner(&self) -> Option<PlayerId> {
        self.base.owner
    }

    pub fn base(&self) -> &BasePiece {
        &self.base
    }

    /// Traits, outer first.
    pub fn traits(&self) -> &[Box<dyn PieceTrait>] {
        &self.traits
    }

    pub(crate) fn set_location(&mut self, location: Location) {
        self.base.location = location;
    }

    /// Find the outermost trait of type `T`.
    #[must_use]
    pub fn find_trait<T: PieceTrait + 'static>(&self) -> Option<&T> {
        self.traits.iter().find_map(|t| t.as_any().downcast_ref::<T>())
    }

    /// Look up `name` as seen by `observer` (`None` for an unrestricted view).
    ///
    /// Walks outer to inner; the first trait defining the name wins, and a
    /// trait masking the name ends the walk with `None`.
    #[must_use]
    pub fn property_for(&self, name: &str, observer: Option<PlayerId>) -> Option<PropertyValue> {
        for t in &self.traits {
            if t.masks(name, observer) {
                return None;
            }
            if let Some(value) = t.property(name, observer) {
                return Some(value);
            }
        }
        self.base.property(name)
    }

    /// Each visible trait's description (outer first), then the base name,
    /// joined with `" - "`.
    #[must_use]
    pub fn describe(&self) -> String {
        let mut parts: Vec<String> = self.traits.iter().filter_map(|t| t.describe()).collect();
        parts.push(self.base.name.clone());
        parts.join(" - ")
    }

    /// Dispatch a trigger key through the chain.
    ///
    /// The outermost trait that responds wins. Returns `None` when no trait
    /// responds or the responding trait consumes the key without a change.
    pub fn key_command(&self, key: &NamedKey, ctx: &mut KeyContext<'_>) -> Option<KeyResult> {
        for (index, t) in self.traits.iter().enumerate() {
            let Some(outcome) = t.key_command(key, self, ctx) else {
                continue;
            };

            let command = match outcome {
                KeyOutcome::Consume => {
                    debug!(piece = %self.id(), trait_tag = t.tag(), %key, "key consumed");
                    return None;
                }
                KeyOutcome::Command(command) => command,
                KeyOutcome::Replace(replacement) => {
                    let changed = self.with_trait_replaced(index, replacement);
                    Command::ChangePiece {
                        id: self.id(),
                        old: self.encode(),
                        new: changed.encode(),
                    }
                }
            };

            let report = match t.command_name() {
                Some(action) if !action.is_empty() => format!("{}: {}", self.describe(), action),
                _ => self.describe(),
            };
            return Some(KeyResult { command, report });
        }
        None
    }

    /// Canonical encoding of the whole chain.
    #[must_use]
    pub fn encode(&self) -> String {
        let mut se = SequenceEncoder::new(SEGMENT_DELIMITER);
        for t in &self.traits {
            match t.chain_text() {
                Some(text) => se.append_verbatim(text),
                None => se.append(&t.encode()),
            };
        }
        se.append(&self.base.encode());
        se.finish()
    }

    /// Decode a chain.
    ///
    /// Trait segments that fail to decode become [`Unrecognized`](super::Unrecognized)
    /// passthroughs; only a malformed base segment is an error.
    pub fn decode(text: &str, registry: &TraitRegistry) -> Result<Self, CodecError> {
        let mut slices = split_segments_verbatim(text)?;
        let base_slice = slices.pop().ok_or(CodecError::Empty)?;
        let base = BasePiece::decode(&unescape(base_slice, SEGMENT_DELIMITER))?;
        let traits = slices.iter().map(|s| registry.decode_chain_segment(s)).collect();
        Ok(Self { traits, base })
    }
}

impl PartialEq for Piece {
    fn eq(&self, other: &Self) -> bool {
        self.encode() == other.encode()
    }
}

impl Eq for Piece {}

impl PropertySource for Piece {
    fn property(&self, name: &str) -> Option<PropertyValue> {
        self.property_for(name, None)
    }

    fn property_as(&self, name: &str, observer: PlayerId) -> Option<PropertyValue> {
        self.property_for(name, Some(observer))
    }
}

impl Piece {
    /// Look up `name` with an unrestricted view.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<PropertyValue> {
        self.property_for(name, None)
    }

    /// Look up `name` as `observer` sees it.
    #[must_use]
    pub fn property_as(&self, name: &str, observer: PlayerId) -> Option<PropertyValue> {
        self.property_for(name, Some(observer))
    }
}
