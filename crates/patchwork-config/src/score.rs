//! Score files: timed sends and resets.
//!
//! ```json
//! [
//!   {
//!     "on": 0.0,
//!     "action": "send",
//!     "payload": { "poly": { "duration": 1.0, "settings": { "frequency": 440 } } }
//!   },
//!   { "on": 4.0, "action": "reset" }
//! ]
//! ```
//!
//! TOML has no top-level arrays, so TOML scores wrap the list in an
//! `events` table array.

use std::collections::BTreeMap;
use std::path::Path;

use patchwork_core::{Address, Message, Score, ScoreAction, ScoreEvent};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::format::read_file;

/// What a score event does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    /// Deliver the payload messages.
    Send,
    /// Rewind the score.
    Reset,
}

/// One event as written in a score file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreEventDescriptor {
    /// Time in seconds.
    pub on: f64,
    /// Action to run.
    pub action: ActionKind,
    /// Messages by address, for `send`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub payload: BTreeMap<String, Message>,
}

impl ScoreEventDescriptor {
    fn into_event(self) -> Result<ScoreEvent, ConfigError> {
        let action = match self.action {
            ActionKind::Reset => ScoreAction::Reset,
            ActionKind::Send => {
                let deliveries = self
                    .payload
                    .into_iter()
                    .map(|(address, message)| {
                        let parsed = address
                            .parse::<Address>()
                            .map_err(|source| ConfigError::InvalidAddress { address, source })?;
                        Ok((parsed, message))
                    })
                    .collect::<Result<Vec<_>, ConfigError>>()?;
                ScoreAction::Send(deliveries)
            }
        };
        Ok(ScoreEvent { on: self.on, action })
    }
}

/// A list of score events, bare or under `events`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScoreFile {
    /// Top-level array (JSON).
    List(Vec<ScoreEventDescriptor>),
    /// `events = [...]` table (TOML).
    Table {
        /// The events.
        events: Vec<ScoreEventDescriptor>,
    },
}

impl ScoreFile {
    /// Converts into a playable, time-sorted score.
    ///
    /// Deliveries of one event are ordered by address.
    pub fn into_score(self) -> Result<Score, ConfigError> {
        let descriptors = match self {
            ScoreFile::List(events) | ScoreFile::Table { events } => events,
        };
        let events = descriptors
            .into_iter()
            .map(ScoreEventDescriptor::into_event)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Score::new(events))
    }
}

/// Loads a score file (TOML for `.toml`, JSON otherwise).
pub fn load_score(path: impl AsRef<Path>) -> Result<Score, ConfigError> {
    let path = path.as_ref();
    let score = read_file::<ScoreFile>(path)?.into_score()?;
    tracing::debug!(path = %path.display(), events = score.len(), "loaded score");
    Ok(score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> Result<Score, ConfigError> {
        serde_json::from_value::<ScoreFile>(value)?.into_score()
    }

    #[test]
    fn events_are_sorted() {
        let score = parse(json!([
            { "on": 2.0, "action": "reset" },
            { "on": 0.5, "action": "send", "payload": { "b/x": 1, "a": 2 } },
        ]))
        .unwrap();
        assert_eq!(score.len(), 2);
        assert_eq!(score.events()[0].on, 0.5);
        let ScoreAction::Send(deliveries) = &score.events()[0].action else {
            panic!("expected send");
        };
        assert_eq!(deliveries[0].0, "a".parse::<Address>().unwrap());
        assert_eq!(deliveries[1].1, json!(1));
        assert_eq!(score.events()[1].action, ScoreAction::Reset);
    }

    #[test]
    fn bad_address_is_reported() {
        let err = parse(json!([{ "on": 0, "action": "send", "payload": { "a//b": 1 } }]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidAddress { ref address, .. } if address == "a//b"
        ));
    }

    #[test]
    fn unknown_action_is_rejected() {
        assert!(parse(json!([{ "on": 0, "action": "explode" }])).is_err());
    }

    #[test]
    fn toml_table_form() {
        let file: ScoreFile = toml::from_str(
            r#"
            [[events]]
            on = 1.0
            action = "send"
            payload = { poly = { duration = 0.5 } }
            "#,
        )
        .unwrap();
        let score = file.into_score().unwrap();
        assert_eq!(score.len(), 1);
    }
}
