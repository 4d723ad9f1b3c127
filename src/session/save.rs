//! Saved-session container.

use serde::{Deserialize, Serialize};

use crate::core::PlayerId;

/// Current saved-session format version.
pub const SAVE_VERSION: u32 = 1;

/// Facts about a save, checked on load.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveMetadata {
    /// Format version the save was written with.
    pub version: u32,

    /// Player whose session wrote the save.
    pub saved_by: PlayerId,

    /// Digest of the canonical snapshot at save time.
    pub digest: String,
}

/// A saved game: metadata plus the canonical snapshot.
///
/// Serialized with bincode, then wrapped in the compression envelope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedSession {
    pub metadata: SaveMetadata,
    pub pieces: Vec<String>,
}

impl SavedSession {
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bincode_round_trip() {
        let saved = SavedSession {
            metadata: SaveMetadata {
                version: SAVE_VERSION,
                saved_by: PlayerId::new(3),
                digest: "ab".repeat(32),
            },
            pieces: vec!["piece;1;Unit;board;0;0;;0".into()],
        };
        let bytes = saved.to_bytes().unwrap();
        assert_eq!(SavedSession::from_bytes(&bytes).unwrap(), saved);
        assert!(SavedSession::from_bytes(&bytes[..bytes.len() - 3]).is_err());
    }
}
