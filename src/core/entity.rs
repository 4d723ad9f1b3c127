//! Entity identification system.
//!
//! Every live piece has a unique `EntityId` that never changes for the
//! lifetime of the piece.
//!
//! ## ID Layout
//!
//! Peers allocate ids without talking to each other, so an id carries the
//! player that created it:
//! - high 16 bits: origin player index
//! - low 48 bits: serial number local to that player
//!
//! ```
//! use rust_tabletop::core::{EntityId, PlayerId};
//!
//! let id = EntityId::compose(PlayerId::new(2), 7);
//! assert_eq!(id.origin(), PlayerId::new(2));
//! assert_eq!(id.serial(), 7);
//!
//! // Two players never collide, even with the same serial.
//! assert_ne!(id, EntityId::compose(PlayerId::new(3), 7));
//! ```

use serde::{Deserialize, Serialize};

use super::player::PlayerId;

const SERIAL_BITS: u32 = 48;
const SERIAL_MASK: u64 = (1 << SERIAL_BITS) - 1;

/// Unique identifier for a game piece.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl EntityId {
    /// Build an id from its origin player and serial number.
    #[must_use]
    pub const fn compose(origin: PlayerId, serial: u64) -> Self {
        Self(((origin.0 as u64) << SERIAL_BITS) | (serial & SERIAL_MASK))
    }

    /// The player whose session allocated this id.
    #[must_use]
    pub const fn origin(self) -> PlayerId {
        PlayerId((self.0 >> SERIAL_BITS) as u8)
    }

    /// Serial number within the origin player's allocation space.
    #[must_use]
    pub const fn serial(self) -> u64 {
        self.0 & SERIAL_MASK
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

impl std::str::FromStr for EntityId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>().map(Self)
    }
}

/// Hands out fresh ids for one player.
///
/// Every session owns one allocator for its local player. Ids created by
/// other players are fed back through [`observe`](Self::observe) so that a
/// restored or re-synced session never reuses a serial.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdAllocator {
    origin: PlayerId,
    next_serial: u64,
}

impl IdAllocator {
    /// Create an allocator for `origin`, starting at serial 1.
    #[must_use]
    pub const fn new(origin: PlayerId) -> Self {
        Self {
            origin,
            next_serial: 1,
        }
    }

    /// Allocate the next id.
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId::compose(self.origin, self.next_serial);
        self.next_serial += 1;
        id
    }

    /// Peek at the id the next `allocate` call would return.
    #[must_use]
    pub const fn peek(&self) -> EntityId {
        EntityId::compose(self.origin, self.next_serial)
    }

    /// Record that `id` exists, skipping past it if it is ours.
    pub fn observe(&mut self, id: EntityId) {
        if id.origin() == self.origin && id.serial() >= self.next_serial {
            self.next_serial = id.serial() + 1;
        }
    }

    /// The player this allocator serves.
    #[must_use]
    pub const fn origin(&self) -> PlayerId {
        self.origin
    }
}
