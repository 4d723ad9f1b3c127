//! Locations and session configuration.
//!
//! - `ZoneId` / `Location`: where a piece sits (board, stack, deck)
//! - `CompressionConfig`: when and how payloads are compressed
//! - `SessionConfig`: combines everything a session needs at startup

use serde::{Deserialize, Serialize};

use super::PlayerId;

/// Zone identifier. Boards, decks and holding areas are all zones.
///
/// The engine doesn't interpret zone names - they're opaque identifiers
/// that games assign meaning to.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ZoneId(pub String);

impl ZoneId {
    /// Create a new zone ID.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the zone name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ZoneId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl std::fmt::Display for ZoneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Zone({})", self.0)
    }
}

/// Position of a piece: a zone plus a point inside it.
///
/// Decks ignore the point; boards use it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// Containing zone.
    pub zone: ZoneId,
    /// X coordinate within the zone.
    pub x: i32,
    /// Y coordinate within the zone.
    pub y: i32,
}

impl Location {
    /// Create a location.
    pub fn new(zone: impl Into<ZoneId>, x: i32, y: i32) -> Self {
        Self {
            zone: zone.into(),
            x,
            y,
        }
    }

    /// This location shifted by `(dx, dy)` in the same zone.
    #[must_use]
    pub fn offset(&self, dx: i32, dy: i32) -> Self {
        Self {
            zone: self.zone.clone(),
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }

    /// Squared distance to `other`, or `None` if they are in different zones.
    #[must_use]
    pub fn distance_squared(&self, other: &Location) -> Option<i64> {
        if self.zone != other.zone {
            return None;
        }
        let dx = i64::from(self.x) - i64::from(other.x);
        let dy = i64::from(self.y) - i64::from(other.y);
        Some(dx * dx + dy * dy)
    }
}

impl From<ZoneId> for Location {
    fn from(zone: ZoneId) -> Self {
        Self { zone, x: 0, y: 0 }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@({},{})", self.zone.0, self.x, self.y)
    }
}

/// Payload compression settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressionConfig {
    /// zstd compression level.
    pub level: i32,

    /// Payloads of at least this many bytes are compressed.
    ///
    /// `usize::MAX` disables compression; `0` compresses everything.
    pub threshold: usize,
}

impl CompressionConfig {
    /// Never compress.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            level: 0,
            threshold: usize::MAX,
        }
    }

    /// Compress everything.
    #[must_use]
    pub const fn always() -> Self {
        Self {
            level: 3,
            threshold: 0,
        }
    }

    /// Should a payload of `len` bytes be compressed?
    #[must_use]
    pub const fn should_compress(&self, len: usize) -> bool {
        len >= self.threshold
    }
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            level: 3,
            threshold: 512,
        }
    }
}

/// Complete session configuration.
///
/// Sessions are configured at startup:
///
/// ```
/// use rust_tabletop::core::{CompressionConfig, PlayerId, SessionConfig};
///
/// let config = SessionConfig::new(PlayerId::new(1))
///     .with_compression(CompressionConfig::always())
///     .with_history_limit(100);
///
/// assert_eq!(config.local_player, PlayerId::new(1));
/// assert_eq!(config.history_limit, Some(100));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// The player acting and observing locally.
    pub local_player: PlayerId,

    /// Transport/persistence compression.
    pub compression: CompressionConfig,

    /// Maximum undo depth. `None` for unlimited.
    pub history_limit: Option<usize>,
}

impl SessionConfig {
    /// Create a configuration for the given local player.
    #[must_use]
    pub fn new(local_player: PlayerId) -> Self {
        Self {
            local_player,
            compression: CompressionConfig::default(),
            history_limit: None,
        }
    }

    /// Set compression settings.
    #[must_use]
    pub fn with_compression(mut self, compression: CompressionConfig) -> Self {
        self.compression = compression;
        self
    }

    /// Cap the undo history.
    ///
    /// Panics if `limit` is zero.
    #[must_use]
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        assert!(limit > 0, "History limit must be at least 1");
        self.history_limit = Some(limit);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_id() {
        let zone = ZoneId::new("Main Map");
        assert_eq!(zone.as_str(), "Main Map");
        assert_eq!(format!("{}", zone), "Zone(Main Map)");
    }

    #[test]
    fn test_location_offset() {
        let loc = Location::new("board", 10, 20);
        let moved = loc.offset(-3, 5);
        assert_eq!(moved, Location::new("board", 7, 25));
    }

    #[test]
    fn test_location_distance() {
        let a = Location::new("board", 0, 0);
        let b = Location::new("board", 3, 4);
        let c = Location::new("other", 3, 4);

        assert_eq!(a.distance_squared(&b), Some(25));
        assert_eq!(a.distance_squared(&c), None);
    }

    #[test]
    fn test_compression_thresholds() {
        assert!(!CompressionConfig::disabled().should_compress(1 << 30));
        assert!(CompressionConfig::always().should_compress(0));

        let default = CompressionConfig::default();
        assert!(!default.should_compress(511));
        assert!(default.should_compress(512));
    }

    #[test]
    fn test_session_config_builder() {
        let config = SessionConfig::new(PlayerId::new(2))
            .with_compression(CompressionConfig::disabled())
            .with_history_limit(5);

        assert_eq!(config.local_player, PlayerId::new(2));
        assert_eq!(config.compression, CompressionConfig::disabled());
        assert_eq!(config.history_limit, Some(5));
    }

    #[test]
    #[should_panic(expected = "History limit must be at least 1")]
    fn test_zero_history_limit() {
        let _ = SessionConfig::new(PlayerId::new(0)).with_history_limit(0);
    }

    #[test]
    fn test_config_serialization() {
        let config = SessionConfig::new(PlayerId::new(1)).with_history_limit(3);
        let json = serde_json::to_string(&config).unwrap();
        let back: SessionConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }
}
