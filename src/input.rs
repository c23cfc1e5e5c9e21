//! Inbound player messages
//!
//! Steering and boost messages arrive as small JSON objects such as
//! `{"type":"steer","heading":1.2}` or `{"type":"speed","on":true}`.
//! Malformed messages become [`SimError::InvalidInput`]; the caller drops them.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::sim::SnakeId;
use crate::sim::state::Room;

/// A decoded player input
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputMessage {
    /// Desired heading in radians
    Steer { heading: f32 },
    /// Boost on/off
    Speed { on: bool },
}

impl InputMessage {
    /// Apply to a snake's input slot
    pub fn apply(self, room: &mut Room, snake: SnakeId) -> Result<()> {
        match self {
            InputMessage::Steer { heading } => room.steer(snake, heading),
            InputMessage::Speed { on } => room.set_boost(snake, on),
        }
    }
}

/// Parse and validate a raw message
pub fn decode(raw: &str) -> Result<InputMessage> {
    let message: InputMessage =
        serde_json::from_str(raw).map_err(|e| SimError::InvalidInput(e.to_string()))?;
    if let InputMessage::Steer { heading } = message {
        if !heading.is_finite() {
            return Err(SimError::InvalidInput(format!("heading {heading}")));
        }
    }
    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Settings;
    use crate::sim::economy::MicroTokens;
    use crate::sim::state::JoinRequest;

    #[test]
    fn test_decode_steer_and_speed() {
        assert_eq!(
            decode(r#"{"type":"steer","heading":1.5}"#).expect("valid"),
            InputMessage::Steer { heading: 1.5 }
        );
        assert_eq!(
            decode(r#"{"type":"speed","on":true}"#).expect("valid"),
            InputMessage::Speed { on: true }
        );
    }

    #[test]
    fn test_decode_rejects_garbage() {
        for raw in [
            "",
            "not json",
            r#"{"type":"steer"}"#,
            r#"{"type":"jump"}"#,
            r#"{"type":"steer","heading":"north"}"#,
            r#"{"type":"steer","heading":1e300}"#,
        ] {
            assert!(
                matches!(decode(raw), Err(SimError::InvalidInput(_))),
                "accepted {raw:?}"
            );
        }
    }

    #[test]
    fn test_apply_routes_to_snake() {
        let mut room = Room::new(Settings::default(), 1, MicroTokens::ZERO);
        let id = room.join(JoinRequest::default()).expect("space");
        InputMessage::Steer { heading: 0.5 }.apply(&mut room, id).expect("alive");
        InputMessage::Speed { on: true }.apply(&mut room, id).expect("alive");
        assert!(InputMessage::Speed { on: false }.apply(&mut room, SnakeId(99)).is_err());
    }
}
