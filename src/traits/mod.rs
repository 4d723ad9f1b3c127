//! Composable piece traits.
//!
//! A piece is a base record wrapped by an ordered chain of traits. Each
//! trait adds one behavior (a label, a counter, a "clone me" key) without
//! knowing about the others. From the outside the chain behaves as one
//! piece exposing the union of its traits' capabilities.
//!
//! ## Chain Semantics
//!
//! Traits are stored outer-first. Every chain operation walks them in that
//! order:
//!
//! - **Properties**: the first trait that defines a name wins; an outer
//!   trait can also mask a name so inner traits never answer it.
//! - **Keys**: the first trait that responds to a key handles it; inner
//!   traits are not consulted.
//! - **Description**: every trait with a visible effect contributes.
//!
//! Ordering is part of the piece's identity: the encoded form keeps it,
//! and reordering traits changes behavior.
//!
//! ## Key Components
//!
//! - [`PieceTrait`]: the capability interface every trait implements
//! - [`Piece`] / [`BasePiece`]: the chain and its innermost record
//! - [`TraitRegistry`]: tag → decoder mapping used by the codec
//! - [`Unrecognized`]: passthrough for segments nobody understands
//!
//! ## Trait Catalog
//!
//! | tag         | type            | behavior |
//! |-------------|-----------------|----------|
//! | `label`     | [`Label`]       | text label, `Label` property |
//! | `mark`      | [`Marker`]      | fixed named property |
//! | `counter`   | [`Counter`]     | numeric property with inc/dec keys |
//! | `layer`     | [`Layer`]       | switchable levels (embellishment) |
//! | `hide`      | [`Hideable`]    | hides the piece from other players |
//! | `restrict`  | [`Restrict`]    | disables keys while an expression holds |
//! | `translate` | [`Translate`]   | moves by a fixed offset |
//! | `aoe`       | [`AreaOfEffect`]| radius-based area around the piece |
//! | `clone`     | [`Cloneable`]   | spawns a copy with a fresh id |
//! | `delete`    | [`Deletable`]   | removes the piece |
//! | `return`    | [`ReturnToDeck`]| sends the piece to a deck zone |

mod area;
mod counter;
mod hideable;
mod label;
mod layer;
mod lifecycle;
mod movement;
mod passthrough;
mod piece;
mod registry;
mod restrict;

pub use area::AreaOfEffect;
pub use counter::Counter;
pub use hideable::Hideable;
pub use label::{Label, Marker};
pub use layer::Layer;
pub use lifecycle::{Cloneable, Deletable};
pub use movement::{ReturnToDeck, Translate};
pub use passthrough::Unrecognized;
pub use piece::{BasePiece, Piece, BASE_TAG};
pub use registry::{TraitBuilder, TraitDecode, TraitRegistry};
pub use restrict::Restrict;

use std::any::Any;

use crate::codec::{encode_segment, CodecError, FieldValue, Fields};
use crate::command::Command;
use crate::core::{EntityId, GameState, IdAllocator, NamedKey, PlayerId, PropertyValue};
use crate::filter::PropertyExpression;

/// The capability interface shared by every trait.
///
/// Only `tag`, `fields` and `box_clone` are required; everything else
/// defaults to "this trait doesn't do that", which forwards the request to
/// the next trait inward.
pub trait PieceTrait: std::fmt::Debug + Send + Sync {
    /// Type tag written at the start of the encoded segment.
    fn tag(&self) -> &str;

    /// Current field values, in schema order.
    fn fields(&self) -> Vec<FieldValue>;

    /// Encoded segment for this trait.
    fn encode(&self) -> String {
        encode_segment(self.tag(), &self.fields())
    }

    /// Value of `name` if this trait defines it.
    ///
    /// `observer` is the player asking, or `None` for an unrestricted view.
    fn property(&self, _name: &str, _observer: Option<PlayerId>) -> Option<PropertyValue> {
        None
    }

    /// Hide `name` from traits further in.
    fn masks(&self, _name: &str, _observer: Option<PlayerId>) -> bool {
        false
    }

    /// Human-readable summary, or `None` if the trait shows nothing.
    fn describe(&self) -> Option<String> {
        None
    }

    /// Respond to a trigger key.
    ///
    /// `piece` is the whole chain this trait belongs to.
    fn key_command(
        &self,
        _key: &NamedKey,
        _piece: &Piece,
        _ctx: &mut KeyContext<'_>,
    ) -> Option<KeyOutcome> {
        None
    }

    /// Name of the action this trait performed, for reports.
    fn command_name(&self) -> Option<&str> {
        None
    }

    /// Chain-level text to write instead of escaping [`encode`](Self::encode).
    ///
    /// Only passthroughs set this, so segments read from a chain go back
    /// out exactly as they came in.
    fn chain_text(&self) -> Option<&str> {
        None
    }

    /// Clone into a box.
    fn box_clone(&self) -> Box<dyn PieceTrait>;

    /// Downcasting support.
    fn as_any(&self) -> &dyn Any;
}

impl Clone for Box<dyn PieceTrait> {
    fn clone(&self) -> Self {
        self.box_clone()
    }
}

/// What a trait wants to happen in response to a key.
#[derive(Debug)]
pub enum KeyOutcome {
    /// Replace this trait with a new state. The chain turns this into a
    /// `ChangePiece` command carrying the old and new encodings.
    Replace(Box<dyn PieceTrait>),

    /// A ready-made command (spawn, remove, move).
    Command(Command),

    /// The key was claimed but nothing happens.
    Consume,
}

/// Read-only view of the session handed to traits during key dispatch.
pub struct KeyContext<'a> {
    /// Authoritative state the piece lives in.
    pub state: &'a GameState,

    /// Player who pressed the key.
    pub actor: PlayerId,

    ids: &'a mut IdAllocator,
}

impl<'a> KeyContext<'a> {
    /// Create a context.
    pub fn new(state: &'a GameState, actor: PlayerId, ids: &'a mut IdAllocator) -> Self {
        Self { state, actor, ids }
    }

    /// Reserve a fresh entity id for a piece this command will create.
    pub fn allocate_id(&mut self) -> EntityId {
        self.ids.allocate()
    }
}

/// Result of dispatching a key through a chain.
#[derive(Clone, Debug, PartialEq)]
pub struct KeyResult {
    /// The command capturing the change.
    pub command: Command,

    /// Short text for the input layer to display.
    pub report: String,
}

/// Read a text field holding a property expression.
pub(crate) fn expression_field(fields: &mut Fields, index: usize) -> Result<PropertyExpression, CodecError> {
    let source = fields.text()?;
    PropertyExpression::parse(&source).map_err(|_| CodecError::InvalidField {
        index,
        kind: "expression",
        text: source,
    })
}
