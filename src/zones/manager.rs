//! Zone manager for piece stacking order.
//!
//! The `ZoneManager` tracks which zone each piece is in and the order of
//! pieces within a zone (bottom to top). It supports:
//! - Explicit position control for inserts (top, bottom, index)
//! - Exact index restore, so moves and removals can be undone
//! - Index lookup by entity ID

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::core::config::ZoneId;
use crate::core::entity::EntityId;

/// Position for inserting a piece into a zone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZonePosition {
    /// Add to top of zone (end of the order).
    Top,
    /// Add to bottom of zone.
    Bottom,
    /// Insert at specific index (0 = bottom). Clamped to the zone size.
    Index(usize),
}

/// Manages piece ordering across zones.
///
/// ## Usage
///
/// ```
/// use rust_tabletop::zones::{ZoneManager, ZonePosition};
/// use rust_tabletop::core::{ZoneId, EntityId};
///
/// let mut manager = ZoneManager::new();
/// let deck = ZoneId::new("Deck");
///
/// manager.add_to_zone(EntityId(10), deck.clone(), ZonePosition::Top);
/// manager.add_to_zone(EntityId(11), deck.clone(), ZonePosition::Bottom);
///
/// assert_eq!(manager.pieces_in_zone(&deck), &[EntityId(11), EntityId(10)]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct ZoneManager {
    /// Piece locations: entity_id -> zone_id
    locations: FxHashMap<EntityId, ZoneId>,

    /// Piece order per zone, bottom first.
    zone_order: FxHashMap<ZoneId, Vec<EntityId>>,
}

impl ZoneManager {
    /// Create a new empty zone manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a piece to a zone.
    ///
    /// Returns the index it landed at, or `None` if the piece is already
    /// tracked (nothing changes in that case).
    pub fn add_to_zone(
        &mut self,
        entity: EntityId,
        zone: ZoneId,
        position: ZonePosition,
    ) -> Option<usize> {
        if self.locations.contains_key(&entity) {
            return None;
        }

        let order = self.zone_order.entry(zone.clone()).or_default();
        let index = match position {
            ZonePosition::Top => order.len(),
            ZonePosition::Bottom => 0,
            ZonePosition::Index(i) => i.min(order.len()),
        };
        order.insert(index, entity);
        self.locations.insert(entity, zone);
        Some(index)
    }

    /// Move a piece to another zone (or another position in the same zone).
    ///
    /// Returns the old zone and index, or `None` if the piece wasn't found.
    pub fn move_to_zone(
        &mut self,
        entity: EntityId,
        new_zone: ZoneId,
        position: ZonePosition,
    ) -> Option<(ZoneId, usize)> {
        let old = self.remove(entity)?;
        self.add_to_zone(entity, new_zone, position);
        Some(old)
    }

    /// Remove a piece from the manager entirely.
    ///
    /// Returns the zone it was in and its index, or `None` if not found.
    pub fn remove(&mut self, entity: EntityId) -> Option<(ZoneId, usize)> {
        let zone = self.locations.remove(&entity)?;

        let mut index = 0;
        if let Some(order) = self.zone_order.get_mut(&zone) {
            if let Some(i) = order.iter().position(|&e| e == entity) {
                order.remove(i);
                index = i;
            }
            if order.is_empty() {
                self.zone_order.remove(&zone);
            }
        }

        Some((zone, index))
    }

    /// Get a piece's index within its zone (0 = bottom).
    #[must_use]
    pub fn index_of(&self, entity: EntityId) -> Option<usize> {
        let zone = self.locations.get(&entity)?;
        self.zone_order.get(zone)?.iter().position(|&e| e == entity)
    }

    /// Check if a piece is in a specific zone.
    #[must_use]
    pub fn is_in_zone(&self, entity: EntityId, zone: &ZoneId) -> bool {
        self.locations.get(&entity) == Some(zone)
    }

    /// Get pieces in a zone, bottom first.
    #[must_use]
    pub fn pieces_in_zone(&self, zone: &ZoneId) -> &[EntityId] {
        self.zone_order.get(zone).map_or(&[], |v| v.as_slice())
    }

    /// Get the number of pieces in a zone.
    #[must_use]
    pub fn zone_size(&self, zone: &ZoneId) -> usize {
        self.pieces_in_zone(zone).len()
    }

    /// All non-empty zones, sorted by name.
    #[must_use]
    pub fn zones(&self) -> Vec<&ZoneId> {
        let mut zones: Vec<&ZoneId> = self.zone_order.keys().collect();
        zones.sort();
        zones
    }
}
