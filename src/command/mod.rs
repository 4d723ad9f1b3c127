//! Commands: replicable, undoable state changes.
//!
//! Every change to a [`GameState`] during play is a [`Command`]. A command
//! is an immutable value that carries both the old and the new value of
//! whatever it touches, so it can be:
//!
//! - applied locally,
//! - encoded as text and applied by every peer ([`Command::encode`]),
//! - inverted for undo ([`Command::inverse`]).
//!
//! ## Composites
//!
//! [`Command::Sequence`] applies its steps in order. If one step fails,
//! the steps already applied are rolled back and the error names the
//! failing step; the state is left as it was before the sequence.
//!
//! ## Unknown References
//!
//! A command naming a piece that doesn't exist (it was deleted locally
//! while the command was in flight) logs a warning and does nothing.
//! Only genuine conflicts, like adding an id that already exists, are
//! errors.
//!
//! ## Undo Law
//!
//! For any command `c` that applies cleanly to state `s`:
//!
//! ```text
//! apply(inverse(c), apply(c, s)) == s
//! ```

mod codec;
mod history;

pub use history::{CommandHistory, CommandId};

use thiserror::Error;
use tracing::{debug, warn};

use crate::codec::CodecError;
use crate::core::{EntityId, GameState, Location};
use crate::traits::{Piece, TraitRegistry};

/// Errors raised while applying, decoding or undoing commands.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("{0} already exists")]
    DuplicateEntity(EntityId),

    #[error("command carries an undecodable piece: {0}")]
    Codec(#[from] CodecError),

    #[error("malformed command: {0}")]
    Malformed(String),

    #[error("step {step} of a command sequence failed")]
    Composite {
        step: usize,
        #[source]
        source: Box<CommandError>,
    },

    #[error("cannot undo {requested}: {top} is the most recent command")]
    UndoOutOfOrder { requested: CommandId, top: CommandId },

    #[error("nothing to undo")]
    NothingToUndo,
}

/// A state change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Create a piece at stacking `index` of the zone its state names.
    AddPiece {
        id: EntityId,
        state: String,
        index: usize,
    },

    /// Delete a piece. `state` and `index` are what it had, for undo.
    RemovePiece {
        id: EntityId,
        state: String,
        index: usize,
    },

    /// Replace a piece's encoded state. The piece stays in its zone.
    ChangePiece {
        id: EntityId,
        old: String,
        new: String,
    },

    /// Move a piece between locations and stacking positions.
    MovePiece {
        id: EntityId,
        from: Location,
        from_index: usize,
        to: Location,
        to_index: usize,
    },

    /// Several commands applied as one.
    Sequence(Vec<Command>),

    /// Does nothing.
    Null,
}

impl Command {
    /// Build a command from steps, collapsing trivial cases.
    #[must_use]
    pub fn from_steps(steps: Vec<Command>) -> Self {
        let mut steps: Vec<Command> = steps.into_iter().filter(|c| !c.is_null()).collect();
        match steps.len() {
            0 => Command::Null,
            1 => steps.remove(0),
            _ => Command::Sequence(steps),
        }
    }

    /// This command followed by `next`.
    #[must_use]
    pub fn then(self, next: Command) -> Self {
        match self {
            Command::Sequence(mut steps) => {
                steps.push(next);
                Command::from_steps(steps)
            }
            first => Command::from_steps(vec![first, next]),
        }
    }

    /// Whether applying this command can't change anything.
    #[must_use]
    pub fn is_null(&self) -> bool {
        match self {
            Command::Null => true,
            Command::Sequence(steps) => steps.iter().all(Command::is_null),
            _ => false,
        }
    }

    /// The command that undoes this one.
    #[must_use]
    pub fn inverse(&self) -> Command {
        match self {
            Command::AddPiece { id, state, index } => Command::RemovePiece {
                id: *id,
                state: state.clone(),
                index: *index,
            },
            Command::RemovePiece { id, state, index } => Command::AddPiece {
                id: *id,
                state: state.clone(),
                index: *index,
            },
            Command::ChangePiece { id, old, new } => Command::ChangePiece {
                id: *id,
                old: new.clone(),
                new: old.clone(),
            },
            Command::MovePiece {
                id,
                from,
                from_index,
                to,
                to_index,
            } => Command::MovePiece {
                id: *id,
                from: to.clone(),
                from_index: *to_index,
                to: from.clone(),
                to_index: *from_index,
            },
            Command::Sequence(steps) => {
                Command::Sequence(steps.iter().rev().map(Command::inverse).collect())
            }
            Command::Null => Command::Null,
        }
    }

    /// Apply to `state`.
    ///
    /// Returns the part of the command that took effect: steps skipped
    /// because they named unknown pieces are left out, so inverting the
    /// result undoes exactly what happened. On error `state` is unchanged.
    pub fn apply(&self, state: &mut GameState, registry: &TraitRegistry) -> Result<Command, CommandError> {
        let mut applied = Vec::new();
        match self.apply_logged(state, registry, &mut applied) {
            Ok(()) => Ok(Command::from_steps(applied)),
            Err(err) => {
                rollback(state, registry, &mut applied, 0);
                Err(err)
            }
        }
    }

    fn apply_logged(
        &self,
        state: &mut GameState,
        registry: &TraitRegistry,
        applied: &mut Vec<Command>,
    ) -> Result<(), CommandError> {
        match self {
            Command::AddPiece { id, state: encoded, index } => {
                if state.contains(*id) {
                    return Err(CommandError::DuplicateEntity(*id));
                }
                let piece = decode_for(*id, encoded, registry)?;
                state.insert_piece(piece, Some(*index));
            }
            Command::RemovePiece { id, .. } => {
                if state.remove_piece(*id).is_none() {
                    warn!(%id, "remove of unknown piece ignored");
                    return Ok(());
                }
            }
            Command::ChangePiece { id, new, .. } => {
                if !state.contains(*id) {
                    warn!(%id, "change of unknown piece ignored");
                    return Ok(());
                }
                let piece = decode_for(*id, new, registry)?;
                let zone = state.piece(*id).map(|p| p.location().zone.clone());
                if zone.as_ref() != Some(&piece.location().zone) {
                    return Err(CommandError::Malformed(format!(
                        "change of {} cannot leave its zone; use a move",
                        id
                    )));
                }
                state.replace_piece(piece);
            }
            Command::MovePiece { id, to, to_index, .. } => {
                if !state.move_piece(*id, to.clone(), *to_index) {
                    warn!(%id, "move of unknown piece ignored");
                    return Ok(());
                }
            }
            Command::Sequence(steps) => {
                let mark = applied.len();
                for (step, command) in steps.iter().enumerate() {
                    if let Err(err) = command.apply_logged(state, registry, applied) {
                        rollback(state, registry, applied, mark);
                        return Err(CommandError::Composite {
                            step,
                            source: Box::new(err),
                        });
                    }
                }
                return Ok(());
            }
            Command::Null => return Ok(()),
        }
        applied.push(self.clone());
        Ok(())
    }
}

/// Undo everything in `applied` past `mark`, newest first.
fn rollback(state: &mut GameState, registry: &TraitRegistry, applied: &mut Vec<Command>, mark: usize) {
    if applied.len() > mark {
        debug!(steps = applied.len() - mark, "rolling back partially applied sequence");
    }
    while applied.len() > mark {
        let Some(done) = applied.pop() else {
            break;
        };
        let mut scratch = Vec::new();
        if let Err(err) = done.inverse().apply_logged(state, registry, &mut scratch) {
            warn!(%err, "rollback step failed");
        }
    }
}

/// Decode a piece carried by a command and check it has the expected id.
fn decode_for(id: EntityId, encoded: &str, registry: &TraitRegistry) -> Result<Piece, CommandError> {
    let piece = Piece::decode(encoded, registry)?;
    if piece.id() != id {
        return Err(CommandError::Malformed(format!(
            "command for {} carries state of {}",
            id,
            piece.id()
        )));
    }
    Ok(piece)
}
