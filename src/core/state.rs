//! Authoritative game state.
//!
//! ## GameState
//!
//! Every live piece, keyed by id, plus the stacking order of each zone.
//! Commands are the only thing that mutate it during play; each mutator
//! reports enough (old index, old piece) for the caller to build an exact
//! inverse.
//!
//! Uses `im` persistent maps so snapshots and clones are cheap.
//!
//! ## Canonical Snapshot
//!
//! [`GameState::snapshot`] lists every piece's encoding zone by zone
//! (zones sorted by name, pieces bottom to top). Restoring a snapshot
//! rebuilds the same stacking order, and two peers with the same logical
//! state produce identical snapshots and digests.

use im::OrdMap;
use sha2::{Digest, Sha256};
use tracing::warn;

use super::config::{Location, ZoneId};
use super::entity::EntityId;
use crate::codec::{CodecError, SequenceEncoder};
use crate::traits::{Piece, TraitRegistry};
use crate::zones::{ZoneManager, ZonePosition};

/// Complete game state.
#[derive(Clone, Debug, Default)]
pub struct GameState {
    pieces: OrdMap<EntityId, Piece>,
    zones: ZoneManager,
}

impl GameState {
    /// Create an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a piece.
    #[must_use]
    pub fn piece(&self, id: EntityId) -> Option<&Piece> {
        self.pieces.get(&id)
    }

    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.pieces.contains_key(&id)
    }

    /// Number of live pieces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    /// All pieces in id order.
    pub fn pieces(&self) -> impl Iterator<Item = &Piece> {
        self.pieces.values()
    }

    /// Pieces in a zone, bottom first.
    pub fn pieces_in_zone<'a>(&'a self, zone: &ZoneId) -> impl Iterator<Item = &'a Piece> + 'a {
        self.zones
            .pieces_in_zone(zone)
            .iter()
            .filter_map(move |id| self.pieces.get(id))
    }

    /// Non-empty zones, sorted by name.
    #[must_use]
    pub fn zones(&self) -> Vec<&ZoneId> {
        self.zones.zones()
    }

    /// Number of pieces in a zone.
    #[must_use]
    pub fn zone_size(&self, zone: &ZoneId) -> usize {
        self.zones.zone_size(zone)
    }

    /// A piece's stacking index within its zone (0 = bottom).
    #[must_use]
    pub fn index_of(&self, id: EntityId) -> Option<usize> {
        self.zones.index_of(id)
    }

    /// Index `id` would occupy if moved to the top of `zone`.
    #[must_use]
    pub fn landing_index(&self, id: EntityId, zone: &ZoneId) -> usize {
        let size = self.zones.zone_size(zone);
        if self.zones.is_in_zone(id, zone) {
            size - 1
        } else {
            size
        }
    }

    /// Add a piece to the zone named by its location.
    ///
    /// `index` of `None` puts it on top. Returns the index it landed at, or
    /// `None` if a piece with the same id already exists.
    pub fn insert_piece(&mut self, piece: Piece, index: Option<usize>) -> Option<usize> {
        let id = piece.id();
        if self.pieces.contains_key(&id) {
            return None;
        }
        let position = index.map_or(ZonePosition::Top, ZonePosition::Index);
        let landed = self
            .zones
            .add_to_zone(id, piece.location().zone.clone(), position)?;
        self.pieces.insert(id, piece);
        Some(landed)
    }

    /// Remove a piece, returning it and the index it occupied.
    pub fn remove_piece(&mut self, id: EntityId) -> Option<(Piece, usize)> {
        let piece = self.pieces.remove(&id)?;
        let index = self.zones.remove(id).map_or(0, |(_, index)| index);
        Some((piece, index))
    }

    /// Swap in a new state for an existing piece.
    ///
    /// If the new state names a different zone the piece goes on top of
    /// it, which a command cannot undo; commands only replace within a
    /// zone. Returns the previous state, or `None` if the id is unknown.
    pub fn replace_piece(&mut self, piece: Piece) -> Option<Piece> {
        let id = piece.id();
        let old = self.pieces.get(&id)?.clone();
        if old.location().zone != piece.location().zone {
            self.zones
                .move_to_zone(id, piece.location().zone.clone(), ZonePosition::Top);
        }
        self.pieces.insert(id, piece);
        Some(old)
    }

    /// Move a piece to `to`, at stacking index `index` of the target zone.
    ///
    /// Returns `false` if the id is unknown.
    pub fn move_piece(&mut self, id: EntityId, to: Location, index: usize) -> bool {
        let Some(piece) = self.pieces.get_mut(&id) else {
            return false;
        };
        self.zones
            .move_to_zone(id, to.zone.clone(), ZonePosition::Index(index));
        piece.set_location(to);
        true
    }

    /// Every piece's encoding, zone by zone, bottom first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<String> {
        self.zones
            .zones()
            .into_iter()
            .flat_map(|zone| self.pieces_in_zone(zone))
            .map(Piece::encode)
            .collect()
    }

    /// Rebuild a state from [`snapshot`](Self::snapshot) output.
    ///
    /// A repeated id keeps the first occurrence.
    pub fn restore<S: AsRef<str>>(
        encodings: &[S],
        registry: &TraitRegistry,
    ) -> Result<Self, CodecError> {
        let mut state = Self::new();
        for text in encodings {
            let piece = Piece::decode(text.as_ref(), registry)?;
            let id = piece.id();
            if state.insert_piece(piece, None).is_none() {
                warn!(%id, "duplicate piece in snapshot, keeping the first");
            }
        }
        Ok(state)
    }

    /// Hex SHA-256 of the canonical snapshot.
    #[must_use]
    pub fn digest(&self) -> String {
        let mut se = SequenceEncoder::new('\n');
        for encoding in self.snapshot() {
            se.append(&encoding);
        }
        hex::encode(Sha256::digest(se.finish().as_bytes()))
    }
}
