//! Undo history.

use im::Vector;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Command, CommandError};

/// Identifier of a performed command, unique within one session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CommandId(pub u64);

impl std::fmt::Display for CommandId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Command({})", self.0)
    }
}

/// LIFO stack of locally performed commands.
///
/// Only the most recent command can be undone. With a limit set, the
/// oldest entries fall off the bottom.
///
/// ## Example
///
/// ```
/// use rust_tabletop::command::{Command, CommandHistory};
///
/// let mut history = CommandHistory::new();
/// let first = history.push(Command::Null);
/// let second = history.push(Command::Null);
///
/// assert!(history.take_for_undo(first).is_err());
/// assert!(history.take_for_undo(second).is_ok());
/// assert!(history.take_for_undo(first).is_ok());
/// ```
#[derive(Clone, Debug, Default)]
pub struct CommandHistory {
    entries: Vector<(CommandId, Command)>,
    next_id: u64,
    limit: Option<usize>,
}

impl CommandHistory {
    /// Create an unbounded history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a history keeping at most `limit` entries.
    ///
    /// Panics if `limit` is 0.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        assert!(limit > 0, "History limit must be at least 1");
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    /// Record a command and return its id.
    pub fn push(&mut self, command: Command) -> CommandId {
        let id = CommandId(self.next_id);
        self.next_id += 1;
        self.entries.push_back((id, command));
        if let Some(limit) = self.limit {
            while self.entries.len() > limit {
                if let Some((dropped, _)) = self.entries.pop_front() {
                    debug!(%dropped, "history limit reached, dropping oldest command");
                }
            }
        }
        id
    }

    /// The most recent entry.
    #[must_use]
    pub fn last(&self) -> Option<(CommandId, &Command)> {
        self.entries.back().map(|(id, c)| (*id, c))
    }

    /// The command recorded as `id`, if it is the most recent entry.
    pub fn peek_for_undo(&self, id: CommandId) -> Result<&Command, CommandError> {
        let (top, command) = self.last().ok_or(CommandError::NothingToUndo)?;
        if top != id {
            return Err(CommandError::UndoOutOfOrder { requested: id, top });
        }
        Ok(command)
    }

    /// Remove and return `id` if it is the most recent entry.
    pub fn take_for_undo(&mut self, id: CommandId) -> Result<Command, CommandError> {
        self.peek_for_undo(id)?;
        self.take_last().map(|(_, command)| command)
    }

    /// Remove and return the most recent entry.
    pub fn take_last(&mut self) -> Result<(CommandId, Command), CommandError> {
        self.entries.pop_back().ok_or(CommandError::NothingToUndo)
    }

    /// Number of undoable commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = (CommandId, &Command)> {
        self.entries.iter().map(|(id, c)| (*id, c))
    }

    /// Forget every entry. Ids keep counting up.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
