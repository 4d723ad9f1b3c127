//! Text form of commands.
//!
//! Fields are joined with `/` through the escaping sequence encoder, so
//! piece encodings (which contain tabs, semicolons and backslashes) and
//! nested commands ride along unchanged:
//!
//! ```text
//! null
//! add/<id>/<index>/<state>
//! remove/<id>/<index>/<state>
//! change/<id>/<old>/<new>
//! move/<id>/<zone>/<x>/<y>/<index>/<zone>/<x>/<y>/<index>
//! seq/<command>/<command>/...
//! ```

use smallvec::SmallVec;

use super::{Command, CommandError};
use crate::codec::{SequenceDecoder, SequenceEncoder};
use crate::core::{EntityId, Location, ZoneId};

const DELIMITER: char = '/';

impl Command {
    /// Encode as text for the wire.
    ///
    /// ```
    /// use rust_tabletop::command::Command;
    /// use rust_tabletop::core::EntityId;
    ///
    /// let command = Command::RemovePiece { id: EntityId(3), state: "x/y".into(), index: 1 };
    /// let text = command.encode();
    /// assert_eq!(text, "remove/3/1/x\\/y");
    /// assert_eq!(Command::decode(&text).unwrap(), command);
    /// ```
    #[must_use]
    pub fn encode(&self) -> String {
        let mut se = SequenceEncoder::new(DELIMITER);
        match self {
            Command::Null => {
                se.append("null");
            }
            Command::AddPiece { id, state, index } => {
                se.append("add")
                    .append(&id.raw().to_string())
                    .append(&index.to_string())
                    .append(state);
            }
            Command::RemovePiece { id, state, index } => {
                se.append("remove")
                    .append(&id.raw().to_string())
                    .append(&index.to_string())
                    .append(state);
            }
            Command::ChangePiece { id, old, new } => {
                se.append("change").append(&id.raw().to_string()).append(old).append(new);
            }
            Command::MovePiece {
                id,
                from,
                from_index,
                to,
                to_index,
            } => {
                se.append("move").append(&id.raw().to_string());
                append_position(&mut se, from, *from_index);
                append_position(&mut se, to, *to_index);
            }
            Command::Sequence(steps) => {
                se.append("seq");
                for step in steps {
                    se.append(&step.encode());
                }
            }
        }
        se.finish()
    }

    /// Decode text written by [`encode`](Self::encode).
    pub fn decode(text: &str) -> Result<Command, CommandError> {
        let fields: SmallVec<[String; 10]> = SequenceDecoder::new(text, DELIMITER).collect();
        let malformed = || CommandError::Malformed(text.to_string());
        let (verb, rest) = fields.split_first().ok_or_else(malformed)?;

        match (verb.as_str(), rest) {
            ("null", []) => Ok(Command::Null),
            ("add", [id, index, state]) => Ok(Command::AddPiece {
                id: parse_id(id)?,
                index: parse_index(index)?,
                state: state.clone(),
            }),
            ("remove", [id, index, state]) => Ok(Command::RemovePiece {
                id: parse_id(id)?,
                index: parse_index(index)?,
                state: state.clone(),
            }),
            ("change", [id, old, new]) => Ok(Command::ChangePiece {
                id: parse_id(id)?,
                old: old.clone(),
                new: new.clone(),
            }),
            ("move", [id, fz, fx, fy, fi, tz, tx, ty, ti]) => Ok(Command::MovePiece {
                id: parse_id(id)?,
                from: parse_location(fz, fx, fy)?,
                from_index: parse_index(fi)?,
                to: parse_location(tz, tx, ty)?,
                to_index: parse_index(ti)?,
            }),
            ("seq", steps) => steps
                .iter()
                .map(|s| Command::decode(s))
                .collect::<Result<Vec<_>, _>>()
                .map(Command::Sequence),
            _ => Err(malformed()),
        }
    }
}

fn append_position(se: &mut SequenceEncoder, location: &Location, index: usize) {
    se.append(location.zone.as_str())
        .append_int(i64::from(location.x))
        .append_int(i64::from(location.y))
        .append(&index.to_string());
}

fn parse_id(text: &str) -> Result<EntityId, CommandError> {
    text.parse()
        .map_err(|_| CommandError::Malformed(format!("invalid entity id `{}`", text)))
}

fn parse_index(text: &str) -> Result<usize, CommandError> {
    text.parse()
        .map_err(|_| CommandError::Malformed(format!("invalid index `{}`", text)))
}

fn parse_location(zone: &str, x: &str, y: &str) -> Result<Location, CommandError> {
    let coordinate = |text: &str| {
        text.parse::<i32>()
            .map_err(|_| CommandError::Malformed(format!("invalid coordinate `{}`", text)))
    };
    Ok(Location {
        zone: ZoneId::new(zone),
        x: coordinate(x)?,
        y: coordinate(y)?,
    })
}
