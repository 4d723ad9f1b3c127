//! # rust-tabletop
//!
//! A replicated game-piece engine for tabletop board and counter games.
//!
//! ## Design Principles
//!
//! 1. **Composition Over Hierarchy**: A piece is a base record wrapped by
//!    an ordered chain of small traits. New behavior is a new trait, not a
//!    new piece type.
//!
//! 2. **Text Is Canonical**: Every piece has one deterministic text
//!    encoding. Replication, saves and divergence checks all work on it.
//!
//! 3. **Commands Carry Both Sides**: Every change records old and new
//!    values, so any change can be replicated to peers and undone.
//!
//! 4. **Explicit Context**: All state lives in a `GameSession`; nothing is
//!    global, and several sessions can run side by side.
//!
//! ## Architecture
//!
//! - **Persistent Data Structures**: O(1) cloning via `im-rs`, so a
//!   session can try a batch of changes on a scratch copy.
//!
//! - **Forward Compatibility**: Trait segments no registered decoder
//!   understands are kept verbatim and re-encoded unchanged.
//!
//! ## Modules
//!
//! - `core`: Entity IDs, players, properties, keys, configuration, state
//! - `codec`: Escaped sequence encoding and typed trait fields
//! - `filter`: Piece filters, property expressions, filtered iteration
//! - `zones`: Stacking order within zones
//! - `traits`: The trait chain, registry and trait catalog
//! - `command`: Undoable, replicable commands and undo history
//! - `compression`: zstd compression and the packed envelope
//! - `session`: Local play, undo, replication, save and load

pub mod core;
pub mod codec;
pub mod filter;
pub mod zones;
pub mod traits;
pub mod command;
pub mod compression;
pub mod session;

// Re-export commonly used types
pub use crate::core::{
    EntityId, PlayerId, IdAllocator,
    PropertyValue, Properties, NamedKey,
    ZoneId, Location, CompressionConfig, SessionConfig,
    GameState,
};

pub use crate::codec::{CodecError, FieldKind, FieldValue, Fields, SequenceDecoder, SequenceEncoder};

pub use crate::filter::{PieceFilter, PieceIter, PropertyExpression, PropertySource, Visible};

pub use crate::zones::{ZoneManager, ZonePosition};

pub use crate::traits::{
    BasePiece, Piece, PieceTrait, KeyOutcome, KeyContext, KeyResult,
    TraitDecode, TraitRegistry, Unrecognized,
};

pub use crate::command::{Command, CommandError, CommandHistory, CommandId};

pub use crate::compression::{pack, unpack, CompressionError};

pub use crate::session::{GameSession, KeyReport, MemoryTransport, Recipient, SessionError, Transport};
