//! Wire messages between sessions.

use crate::codec::{SequenceDecoder, SequenceEncoder};
use crate::command::{Command, CommandError};

const DELIMITER: char = '\n';

/// What one session tells another.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Message {
    /// Apply this command.
    Command(Command),

    /// Replace the whole state with these piece encodings.
    Snapshot(Vec<String>),
}

impl Message {
    /// Text form: a kind line, then the body.
    #[must_use]
    pub fn encode(&self) -> String {
        let mut se = SequenceEncoder::new(DELIMITER);
        match self {
            Message::Command(command) => {
                se.append("command").append(&command.encode());
            }
            Message::Snapshot(pieces) => {
                se.append("snapshot");
                for piece in pieces {
                    se.append(piece);
                }
            }
        }
        se.finish()
    }

    pub fn decode(text: &str) -> Result<Self, CommandError> {
        let mut sd = SequenceDecoder::new(text, DELIMITER);
        match sd.next().as_deref() {
            Some("command") => {
                let body = sd.next().ok_or_else(|| CommandError::Malformed(text.to_string()))?;
                if sd.has_more() {
                    return Err(CommandError::Malformed(text.to_string()));
                }
                Command::decode(&body).map(Message::Command)
            }
            Some("snapshot") => Ok(Message::Snapshot(sd.collect())),
            _ => Err(CommandError::Malformed(text.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EntityId;

    #[test]
    fn test_round_trip() {
        let messages = [
            Message::Command(Command::ChangePiece {
                id: EntityId(1),
                old: "a\nb".into(),
                new: "c\\".into(),
            }),
            Message::Snapshot(vec![]),
            Message::Snapshot(vec!["piece;1\n".into(), "".into()]),
        ];
        for message in messages {
            assert_eq!(Message::decode(&message.encode()).unwrap(), message);
        }
    }

    #[test]
    fn test_malformed() {
        assert!(Message::decode("").is_err());
        assert!(Message::decode("command").is_err());
        assert!(Message::decode("command\nnull\nnull").is_err());
        assert!(Message::decode("hello\nnull").is_err());
    }
}
