use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{RelayError, RelayResult};

pub type PlayerKey = String;

/// Frames accepted from peers, discriminated by their `type` field.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    PlayerJoin {
        player_key: PlayerKey,
    },
    AdminJoin,
    AssignCartones {
        player_key: PlayerKey,
        cartones: Vec<Value>,
    },
    NewNumber {
        number: i64,
    },
    ResetNumbers,
    Report {
        #[serde(default)]
        report: Option<Value>,
    },
    RequestPlayerList,
}

impl ClientMessage {
    fn validate(self) -> RelayResult<Self> {
        let missing = match &self {
            ClientMessage::PlayerJoin { player_key }
            | ClientMessage::AssignCartones { player_key, .. } => {
                player_key.is_empty().then_some("playerKey")
            }
            ClientMessage::Report { report } => {
                (!report.as_ref().is_some_and(is_truthy)).then_some("report")
            }
            _ => None,
        };

        match missing {
            Some(field) => Err(RelayError::MissingField { field }),
            None => Ok(self),
        }
    }
}

/// Reports are relayed only when the payload is truthy: `null`, `false`,
/// `0` and `""` are treated as missing.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerResponse {
    #[serde(rename = "state")]
    PlayerState { last_numbers: Vec<i64> },
    #[serde(rename = "state")]
    AdminState {
        players: Vec<PlayerKey>,
        last_numbers: Vec<i64>,
    },
    PlayerList {
        players: Vec<PlayerKey>,
    },
    Number {
        number: i64,
    },
    Reset,
    AssignCartones {
        cartones: Vec<Value>,
    },
    AssignConfirm {
        player_key: PlayerKey,
        cartones_count: usize,
    },
    Report {
        report: Value,
    },
}

pub fn deserialize_message(json: &str) -> RelayResult<ClientMessage> {
    let message: ClientMessage = serde_json::from_str(json)?;
    message.validate()
}

pub fn serialize_response(response: &ServerResponse) -> RelayResult<String> {
    serde_json::to_string(response).map_err(|e| RelayError::Serialization {
        message: e.to_string(),
    })
}
