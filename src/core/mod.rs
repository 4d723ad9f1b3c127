//! Core engine types: entities, players, properties, keys, configuration, state.
//!
//! This module contains the fundamental building blocks every other module
//! uses. Nothing here knows about specific traits or games.

pub mod entity;
pub mod player;
pub mod property;
pub mod key;
pub mod config;
pub mod state;

pub use entity::{EntityId, IdAllocator};
pub use player::PlayerId;
pub use property::{Properties, PropertyValue};
pub use key::{KeyParseError, NamedKey};
pub use config::{CompressionConfig, Location, SessionConfig, ZoneId};
pub use state::GameState;
