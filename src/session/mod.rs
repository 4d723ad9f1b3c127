//! Game sessions: local play, undo and replication.
//!
//! A [`GameSession`] is the explicit context one participant plays in. It
//! owns the authoritative [`GameState`], the undo history, the trait
//! registry, the configuration and an outbound [`Transport`]. Nothing is
//! global: two sessions in one process are fully independent, which is
//! how the replication tests run.
//!
//! ## Flow
//!
//! - Local changes go through [`GameSession::perform`]: apply, record for
//!   undo, encode, pack, send to everyone else.
//! - Incoming payloads go through [`GameSession::receive`]: unpack,
//!   decode, apply. Remote commands never enter the local undo history.
//! - A snapshot message replaces the whole state; it is how a late joiner
//!   or a diverged peer catches up.
//!
//! ## Usage
//!
//! ```
//! use rust_tabletop::core::{Location, NamedKey, PlayerId, SessionConfig, EntityId};
//! use rust_tabletop::session::{GameSession, MemoryTransport};
//! use rust_tabletop::traits::{Cloneable, Label, Piece, TraitRegistry};
//!
//! let transport = MemoryTransport::new();
//! let outbox = transport.outbox();
//! let mut session = GameSession::new(
//!     SessionConfig::new(PlayerId::new(0)),
//!     TraitRegistry::standard(),
//!     Box::new(transport),
//! );
//!
//! let tank = Piece::basic(EntityId(0), "Unit", Location::new("board", 0, 0))
//!     .decorate(Cloneable::new(NamedKey::named("F2")))
//!     .decorate(Label::new("Tank"));
//! let (id, _) = session.add_piece(tank).unwrap();
//!
//! let report = session.key_command(id, &NamedKey::named("F2")).unwrap().unwrap();
//! assert_eq!(report.report, "Tank - Unit: Clone");
//! assert_eq!(session.state().len(), 2);
//! assert_eq!(outbox.len(), 2);
//!
//! session.undo(report.command).unwrap();
//! assert_eq!(session.state().len(), 1);
//! ```

mod message;
mod save;
mod transport;

pub use message::Message;
pub use save::{SaveMetadata, SavedSession, SAVE_VERSION};
pub use transport::{MemoryTransport, Outbox, Recipient, SentPayloads, Transport, TransportError};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::codec::CodecError;
use crate::command::{Command, CommandError, CommandHistory, CommandId};
use crate::compression::{pack, unpack, CompressionError};
use crate::core::{EntityId, GameState, IdAllocator, NamedKey, PlayerId, SessionConfig};
use crate::filter::{Both, PieceIter, PropertyExpression, Visible};
use crate::traits::{KeyContext, Piece, TraitRegistry};

/// Errors raised by session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Compression(#[from] CompressionError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("saved session is unreadable")]
    Format(#[from] bincode::Error),

    #[error("payload is not valid text: {0}")]
    Payload(String),

    #[error("{0} is not in the game")]
    UnknownPiece(EntityId),

    #[error("saved session version {found} is not supported (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("saved session does not match its digest")]
    DigestMismatch,
}

/// Outcome of a key that changed something.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyReport {
    /// History entry for the change, for undo.
    pub command: CommandId,

    /// Text for the input layer to display.
    pub report: String,
}

/// One participant's view of a game.
pub struct GameSession {
    config: SessionConfig,
    state: GameState,
    history: CommandHistory,
    registry: TraitRegistry,
    transport: Box<dyn Transport>,
    ids: IdAllocator,
}

impl GameSession {
    /// Create a session with an empty state.
    pub fn new(config: SessionConfig, registry: TraitRegistry, transport: Box<dyn Transport>) -> Self {
        let history = match config.history_limit {
            Some(limit) => CommandHistory::with_limit(limit),
            None => CommandHistory::new(),
        };
        let ids = IdAllocator::new(config.local_player);
        Self {
            config,
            state: GameState::new(),
            history,
            registry,
            transport,
            ids,
        }
    }

    /// Restore a session from [`save`](Self::save) output.
    pub fn load(
        bytes: &[u8],
        config: SessionConfig,
        registry: TraitRegistry,
        transport: Box<dyn Transport>,
    ) -> Result<Self, SessionError> {
        let saved = SavedSession::from_bytes(&unpack(bytes)?)?;
        if saved.metadata.version != SAVE_VERSION {
            return Err(SessionError::UnsupportedVersion {
                found: saved.metadata.version,
                expected: SAVE_VERSION,
            });
        }
        let state = GameState::restore(&saved.pieces, &registry)?;
        if state.digest() != saved.metadata.digest {
            return Err(SessionError::DigestMismatch);
        }

        info!(
            pieces = state.len(),
            saved_by = %saved.metadata.saved_by,
            "loaded saved session"
        );
        let mut session = Self::new(config, registry, transport);
        session.replace_state(state);
        Ok(session)
    }

    /// Serialize the current state into a packed save.
    pub fn save(&self) -> Result<Vec<u8>, SessionError> {
        let saved = SavedSession {
            metadata: SaveMetadata {
                version: SAVE_VERSION,
                saved_by: self.config.local_player,
                digest: self.state.digest(),
            },
            pieces: self.state.snapshot(),
        };
        Ok(pack(&saved.to_bytes()?, &self.config.compression)?)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn local_player(&self) -> PlayerId {
        self.config.local_player
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn history(&self) -> &CommandHistory {
        &self.history
    }

    pub fn registry(&self) -> &TraitRegistry {
        &self.registry
    }

    /// Hex digest of the canonical state, for divergence checks.
    #[must_use]
    pub fn state_digest(&self) -> String {
        self.state.digest()
    }

    /// Apply a command locally, record it for undo and send it to peers.
    ///
    /// What gets recorded and sent is the part that took effect. A command
    /// that changed nothing is neither recorded nor sent, and `None` is
    /// returned. If the send fails the local change stands; peers can
    /// catch up from a snapshot.
    pub fn perform(&mut self, command: Command) -> Result<Option<CommandId>, SessionError> {
        let applied = command.apply(&mut self.state, &self.registry)?;
        if applied.is_null() {
            debug!("command changed nothing");
            return Ok(None);
        }
        self.commit(applied).map(Some)
    }

    fn commit(&mut self, applied: Command) -> Result<CommandId, SessionError> {
        let id = self.history.push(applied.clone());
        debug!(command = %id, "performed");
        self.send(Recipient::All, &Message::Command(applied))?;
        Ok(id)
    }

    /// Put a new piece on top of its zone.
    ///
    /// The piece's id is replaced with a freshly allocated one, which is
    /// returned along with the history entry.
    pub fn add_piece(&mut self, piece: Piece) -> Result<(EntityId, CommandId), SessionError> {
        let id = self.ids.allocate();
        let piece = piece.with_id(id);
        let index = self.state.zone_size(&piece.location().zone);
        let add = Command::AddPiece {
            id,
            state: piece.encode(),
            index,
        };
        let applied = add.apply(&mut self.state, &self.registry)?;
        Ok((id, self.commit(applied)?))
    }

    /// Deliver a trigger key to one piece as the local player.
    ///
    /// Returns `None` when no trait acted on the key or the result
    /// changed nothing.
    pub fn key_command(&mut self, id: EntityId, key: &NamedKey) -> Result<Option<KeyReport>, SessionError> {
        let piece = self.state.piece(id).ok_or(SessionError::UnknownPiece(id))?;
        let mut ctx = KeyContext::new(&self.state, self.config.local_player, &mut self.ids);
        let Some(result) = piece.key_command(key, &mut ctx) else {
            return Ok(None);
        };
        Ok(self.perform(result.command)?.map(|command| KeyReport {
            command,
            report: result.report,
        }))
    }

    /// Deliver a key to every piece the local player can see that
    /// matches `filter`, as one undoable command.
    ///
    /// Pieces are visited in id order and each sees the effects of the
    /// ones before it. Returns `None` if nothing changed.
    pub fn global_key(
        &mut self,
        filter: &PropertyExpression,
        key: &NamedKey,
    ) -> Result<Option<KeyReport>, SessionError> {
        let observer = self.config.local_player;
        let targets: Vec<EntityId> = PieceIter::new(
            self.state.pieces(),
            Both(Visible::to(observer), |p: &Piece| filter.matches(p)),
        )
        .map(Piece::id)
        .collect();

        let mut scratch = self.state.clone();
        let mut steps = Vec::new();
        let mut reports = Vec::new();
        for id in targets {
            let Some(piece) = scratch.piece(id) else {
                continue;
            };
            let mut ctx = KeyContext::new(&scratch, observer, &mut self.ids);
            let Some(result) = piece.key_command(key, &mut ctx) else {
                continue;
            };
            steps.push(result.command.apply(&mut scratch, &self.registry)?);
            reports.push(result.report);
        }

        debug!(pieces = reports.len(), %key, "global key");
        Ok(self.perform(Command::from_steps(steps))?.map(|command| KeyReport {
            command,
            report: reports.join("; "),
        }))
    }

    /// Undo a local command. Only the most recent one can be undone.
    pub fn undo(&mut self, id: CommandId) -> Result<(), SessionError> {
        let inverse = match self.history.peek_for_undo(id) {
            Ok(command) => command.inverse(),
            Err(err) => {
                warn!(%err, "undo rejected");
                return Err(err.into());
            }
        };
        let applied = inverse.apply(&mut self.state, &self.registry)?;
        self.history.take_last()?;
        if !applied.is_null() {
            self.send(Recipient::All, &Message::Command(applied))?;
        }
        Ok(())
    }

    /// Undo the most recent local command and return its id.
    pub fn undo_last(&mut self) -> Result<CommandId, SessionError> {
        let (id, _) = self.history.last().ok_or(CommandError::NothingToUndo)?;
        self.undo(id)?;
        Ok(id)
    }

    /// Handle a payload from a peer.
    pub fn receive(&mut self, payload: &[u8]) -> Result<(), SessionError> {
        let text = String::from_utf8(unpack(payload)?).map_err(|e| SessionError::Payload(e.to_string()))?;
        match Message::decode(&text)? {
            Message::Command(command) => {
                let applied = command.apply(&mut self.state, &self.registry)?;
                self.observe_ids(&applied);
            }
            Message::Snapshot(pieces) => {
                let state = GameState::restore(&pieces, &self.registry)?;
                info!(pieces = state.len(), "replaced state from snapshot");
                self.replace_state(state);
            }
        }
        Ok(())
    }

    /// Packed snapshot of the whole state.
    pub fn snapshot_message(&self) -> Result<Vec<u8>, SessionError> {
        self.packed(&Message::Snapshot(self.state.snapshot()))
    }

    /// Send a snapshot to `to`.
    pub fn send_snapshot(&mut self, to: Recipient) -> Result<(), SessionError> {
        self.send(to, &Message::Snapshot(self.state.snapshot()))
    }

    fn packed(&self, message: &Message) -> Result<Vec<u8>, SessionError> {
        Ok(pack(message.encode().as_bytes(), &self.config.compression)?)
    }

    fn send(&mut self, to: Recipient, message: &Message) -> Result<(), SessionError> {
        let payload = self.packed(message)?;
        self.transport.send(to, payload).map_err(|err| {
            warn!(%err, "send failed");
            SessionError::from(err)
        })
    }

    fn replace_state(&mut self, state: GameState) {
        self.state = state;
        self.history.clear();
        for piece in self.state.pieces() {
            self.ids.observe(piece.id());
        }
    }

    fn observe_ids(&mut self, command: &Command) {
        match command {
            Command::AddPiece { id, .. } => self.ids.observe(*id),
            Command::Sequence(steps) => steps.iter().for_each(|c| self.observe_ids(c)),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CompressionConfig, Location};
    use crate::traits::{Counter, Deletable, Label};

    fn session(player: u8) -> (GameSession, Outbox) {
        let transport = MemoryTransport::new();
        let outbox = transport.outbox();
        let session = GameSession::new(
            SessionConfig::new(PlayerId::new(player)),
            TraitRegistry::standard(),
            Box::new(transport),
        );
        (session, outbox)
    }

    fn unit(name: &str) -> Piece {
        Piece::basic(EntityId(0), name, Location::new("board", 0, 0))
    }

    #[test]
    fn test_add_piece_allocates_ids() {
        let (mut s, _) = session(3);
        let (a, _) = s.add_piece(unit("a")).unwrap();
        let (b, _) = s.add_piece(unit("b")).unwrap();
        assert_ne!(a, b);
        assert_eq!(a.origin(), PlayerId::new(3));
        assert_eq!(s.state().piece(b).unwrap().name(), "b");
    }

    #[test]
    fn test_unknown_piece_key() {
        let (mut s, _) = session(0);
        assert!(matches!(
            s.key_command(EntityId(42), &NamedKey::named("x")),
            Err(SessionError::UnknownPiece(_))
        ));
    }

    #[test]
    fn test_unhandled_key_sends_nothing() {
        let (mut s, outbox) = session(0);
        let (id, _) = s.add_piece(unit("a")).unwrap();
        outbox.drain();
        assert_eq!(s.key_command(id, &NamedKey::named("nothing")).unwrap(), None);
        assert!(outbox.is_empty());
    }

    #[test]
    fn test_no_op_is_not_recorded() {
        let (mut s, outbox) = session(0);
        let (id, _) = s.add_piece(unit("a")).unwrap();
        outbox.drain();

        let stale = Command::RemovePiece {
            id: EntityId(999),
            state: unit("gone").with_id(EntityId(999)).encode(),
            index: 0,
        };
        assert_eq!(s.perform(stale.clone()).unwrap(), None);
        assert_eq!(s.perform(Command::Sequence(vec![stale, Command::Null])).unwrap(), None);
        assert_eq!(s.history().len(), 1);
        assert!(outbox.is_empty());

        // Undo still reaches the last real change.
        s.undo_last().unwrap();
        assert!(s.state().piece(id).is_none());
    }

    #[test]
    fn test_undo_out_of_order() {
        let (mut s, _) = session(0);
        let (_, first) = s.add_piece(unit("a")).unwrap();
        let (_, second) = s.add_piece(unit("b")).unwrap();

        assert!(matches!(
            s.undo(first),
            Err(SessionError::Command(CommandError::UndoOutOfOrder { .. }))
        ));
        s.undo(second).unwrap();
        s.undo(first).unwrap();
        assert!(s.state().is_empty());
        assert!(matches!(
            s.undo_last(),
            Err(SessionError::Command(CommandError::NothingToUndo))
        ));
    }

    #[test]
    fn test_undo_sends_inverse() {
        let (mut a, outbox) = session(0);
        let (mut b, _) = session(1);

        let (id, _) = a.add_piece(unit("x")).unwrap();
        a.undo_last().unwrap();
        for (_, payload) in outbox.drain() {
            b.receive(&payload).unwrap();
        }
        assert!(b.state().piece(id).is_none());
        assert_eq!(a.state_digest(), b.state_digest());
    }

    #[test]
    fn test_global_key_is_one_command() {
        let (mut s, outbox) = session(0);
        let counter = Counter::new("Ammo", 0).with_keys(Some(NamedKey::named("up")), None);
        for side in ["Red", "Red", "Blue"] {
            s.add_piece(unit("u").with_property("Side", side).decorate(counter.clone()))
                .unwrap();
        }
        outbox.drain();

        let filter = PropertyExpression::parse("Side = Red").unwrap();
        let report = s.global_key(&filter, &NamedKey::named("up")).unwrap().unwrap();
        assert_eq!(outbox.len(), 1);
        assert_eq!(report.report, "Ammo 0 - u; Ammo 0 - u");

        let ammo: Vec<i64> = s
            .state()
            .pieces()
            .map(|p| p.property("Ammo").and_then(|v| v.as_int()).unwrap())
            .collect();
        assert_eq!(ammo, vec![1, 1, 0]);

        s.undo(report.command).unwrap();
        assert!(s.state().pieces().all(|p| p.property("Ammo") == Some(0i64.into())));
    }

    #[test]
    fn test_global_key_sees_earlier_effects() {
        let (mut s, _) = session(0);
        let del = NamedKey::named("del");
        s.add_piece(unit("a").decorate(Deletable::new(del.clone()))).unwrap();
        s.add_piece(unit("b").decorate(Deletable::new(del.clone()))).unwrap();

        s.global_key(&PropertyExpression::empty(), &del).unwrap().unwrap();
        assert!(s.state().is_empty());
        s.undo_last().unwrap();
        assert_eq!(s.state().len(), 2);
        assert_eq!(s.global_key(&PropertyExpression::parse("Name = zzz").unwrap(), &del).unwrap(), None);
    }

    #[test]
    fn test_send_failure_keeps_local_change() {
        let mut s = GameSession::new(
            SessionConfig::new(PlayerId::new(0)),
            TraitRegistry::standard(),
            Box::new(MemoryTransport::disconnected()),
        );
        assert!(matches!(
            s.add_piece(unit("a")),
            Err(SessionError::Transport(TransportError::Disconnected))
        ));
        assert_eq!(s.state().len(), 1);
    }

    #[test]
    fn test_save_load() {
        let (mut s, _) = session(2);
        s.add_piece(unit("a").decorate(Label::new("Tank"))).unwrap();
        let (b, _) = s.add_piece(unit("b")).unwrap();

        let bytes = s.save().unwrap();
        let mut loaded = GameSession::load(
            &bytes,
            SessionConfig::new(PlayerId::new(2)).with_compression(CompressionConfig::always()),
            TraitRegistry::standard(),
            Box::new(MemoryTransport::new()),
        )
        .unwrap();
        assert_eq!(loaded.state_digest(), s.state_digest());
        assert_eq!(loaded.state().index_of(b), Some(1));
        assert!(loaded.history().is_empty());

        // Ids keep counting past what the save contained.
        let (c, _) = loaded.add_piece(unit("c")).unwrap();
        assert!(c.serial() > b.serial());
    }

    #[test]
    fn test_load_rejects_garbage() {
        let load = |bytes: &[u8]| {
            GameSession::load(
                bytes,
                SessionConfig::new(PlayerId::new(0)),
                TraitRegistry::standard(),
                Box::new(MemoryTransport::new()),
            )
        };
        assert!(matches!(load(b"RTnonsense"), Err(SessionError::Format(_))));
        assert!(matches!(load(b"??"), Err(SessionError::Compression(_))));

        let tampered = SavedSession {
            metadata: SaveMetadata {
                version: SAVE_VERSION,
                saved_by: PlayerId::new(0),
                digest: "00".into(),
            },
            pieces: vec![unit("a").encode()],
        };
        let bytes = pack(&tampered.to_bytes().unwrap(), &CompressionConfig::disabled()).unwrap();
        assert!(matches!(load(&bytes), Err(SessionError::DigestMismatch)));

        let future = SavedSession {
            metadata: SaveMetadata {
                version: SAVE_VERSION + 1,
                ..tampered.metadata
            },
            pieces: vec![],
        };
        let bytes = pack(&future.to_bytes().unwrap(), &CompressionConfig::disabled()).unwrap();
        assert!(matches!(load(&bytes), Err(SessionError::UnsupportedVersion { .. })));
    }
}
