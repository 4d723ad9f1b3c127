//! Zone system for piece locations.
//!
//! Zones are **game-configured**, not hardcoded. Boards, decks, stacks and
//! holding areas are all just named zones; a piece's `Location` names the
//! zone it sits in.
//!
//! ## Key Types
//!
//! - `ZoneId`: Opaque zone identifier (from `core::config`)
//! - `ZoneManager`: Piece ordering within zones
//! - `ZonePosition`: Position specifier for inserts

pub mod manager;

pub use manager::{ZoneManager, ZonePosition};

// Re-export zone types from core for convenience
pub use crate::core::config::{Location, ZoneId};
