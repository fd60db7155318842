//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use serde::{Deserialize, Deserializer, Serialize};

/// Text sent with every welcome message
pub const WELCOME_TEXT: &str = "Connected to game server";

/// Movement direction requested by a peer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    Stop,
    /// Any move string the server does not know. Applying it leaves the
    /// mover's velocity untouched.
    #[serde(other)]
    Unrecognized,
}

impl Direction {
    /// Wire name of the direction
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
            Direction::Stop => "stop",
            Direction::Unrecognized => "unrecognized",
        }
    }

    fn unrecognized() -> Self {
        Direction::Unrecognized
    }
}

/// Accept any JSON value for `move`; anything that is not a known direction
/// string becomes [`Direction::Unrecognized`].
fn lenient_direction<'de, D>(deserializer: D) -> Result<Direction, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(Direction::deserialize(value).unwrap_or(Direction::Unrecognized))
}

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    /// Direction change for the sender's mover
    Input {
        /// Sender's player id as it was assigned in the welcome; informational
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(
            rename = "move",
            default = "Direction::unrecognized",
            deserialize_with = "lenient_direction"
        )]
        direction: Direction,
    },

    /// Any other message type; ignored by the server
    #[serde(other)]
    Unknown,
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    /// Identity assignment, sent once right after connect
    Welcome { player_id: String, message: String },

    /// World state, broadcast once per tick
    State(WorldSnapshot),

    /// Error message
    Error { message: String },
}

impl ServerMsg {
    pub fn welcome(player_id: impl Into<String>) -> Self {
        Self::Welcome {
            player_id: player_id.into(),
            message: WELCOME_TEXT.to_string(),
        }
    }
}

/// A timestamped capture of every mover and pickup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// Authoritative server clock at capture, in seconds
    pub timestamp: f64,
    #[serde(default)]
    pub players: Vec<MoverSnapshot>,
    #[serde(default)]
    pub coins: Vec<PickupSnapshot>,
}

impl WorldSnapshot {
    pub fn empty(timestamp: f64) -> Self {
        Self {
            timestamp,
            players: Vec::new(),
            coins: Vec::new(),
        }
    }

    pub fn player(&self, id: &str) -> Option<&MoverSnapshot> {
        self.players.iter().find(|p| p.id == id)
    }
}

/// Mover state in a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoverSnapshot {
    pub id: String,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub vx: f64,
    #[serde(default)]
    pub vy: f64,
    #[serde(default)]
    pub score: u32,
    #[serde(default = "default_mover_color")]
    pub color: [u8; 3],
    #[serde(default = "default_mover_radius")]
    pub radius: f64,
}

fn default_mover_color() -> [u8; 3] {
    [255, 100, 100]
}

fn default_mover_radius() -> f64 {
    20.0
}

/// Pickup state in a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickupSnapshot {
    pub id: String,
    pub x: f64,
    pub y: f64,
    #[serde(default = "default_pickup_value")]
    pub value: u32,
    #[serde(default = "default_pickup_radius")]
    pub radius: f64,
}

fn default_pickup_value() -> u32 {
    1
}

fn default_pickup_radius() -> f64 {
    10.0
}

/// Encode a message as a single JSON text frame
pub fn encode<T: Serialize>(msg: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string(msg)
}

/// Decode a client message from a text frame
pub fn decode_client(text: &str) -> Result<ClientMsg, serde_json::Error> {
    serde_json::from_str(text)
}

/// Decode a server message from a text frame
pub fn decode_server(text: &str) -> Result<ServerMsg, serde_json::Error> {
    serde_json::from_str(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn input_uses_move_field() {
        let msg = decode_client(r#"{"type":"input","id":"p1","move":"left"}"#).unwrap();
        match msg {
            ClientMsg::Input { id, direction } => {
                assert_eq!(id.as_deref(), Some("p1"));
                assert_eq!(direction, Direction::Left);
            }
            other => panic!("unexpected message {other:?}"),
        }
    }

    #[test]
    fn unknown_move_decodes_as_unrecognized() {
        let msg = decode_client(r#"{"type":"input","id":"p1","move":"jump"}"#).unwrap();
        assert!(matches!(
            msg,
            ClientMsg::Input {
                direction: Direction::Unrecognized,
                ..
            }
        ));
    }

    #[test]
    fn unknown_type_is_not_an_error() {
        let msg = decode_client(r#"{"type":"ping"}"#).unwrap();
        assert!(matches!(msg, ClientMsg::Unknown));
    }

    #[test]
    fn input_without_id_still_decodes() {
        let msg = tokio_test::assert_ok!(decode_client(r#"{"type":"input","move":"up"}"#));
        match msg {
            ClientMsg::Input { id, direction } => {
                assert_eq!(id, None);
                assert_eq!(direction, Direction::Up);
            }
            other => panic!("unexpected message {other:?}"),
        }
    }

    #[test]
    fn non_string_or_missing_move_is_unrecognized() {
        for text in [
            r#"{"type":"input","id":"x","move":5}"#,
            r#"{"type":"input","id":"x","move":null}"#,
            r#"{"type":"input","id":"x","move":{"dir":"up"}}"#,
            r#"{"type":"input","id":"x"}"#,
        ] {
            let msg = tokio_test::assert_ok!(decode_client(text));
            assert!(
                matches!(
                    msg,
                    ClientMsg::Input {
                        direction: Direction::Unrecognized,
                        ..
                    }
                ),
                "{text}"
            );
        }
    }

    #[test]
    fn garbage_fails_to_decode() {
        tokio_test::assert_err!(decode_client("not json"));
        tokio_test::assert_err!(decode_client(r#"{"move":"up"}"#));
        tokio_test::assert_err!(decode_client("42"));
    }

    #[test]
    fn input_without_id_omits_it_on_the_wire() {
        let msg = ClientMsg::Input {
            id: None,
            direction: Direction::Left,
        };
        let value: Value = serde_json::from_str(&encode(&msg).unwrap()).unwrap();
        assert_eq!(value, json!({"type": "input", "move": "left"}));
    }

    #[test]
    fn sparse_state_fills_defaults() {
        let text = r#"{"type":"state","timestamp":3.0,
            "players":[{"id":"p1","x":1.0,"y":2.0}],
            "coins":[{"id":"c1","x":5.0,"y":6.0}]}"#;

        let ServerMsg::State(state) = decode_server(text).unwrap() else {
            panic!("expected state");
        };
        let p = &state.players[0];
        assert_eq!((p.vx, p.vy, p.score), (0.0, 0.0, 0));
        assert_eq!(p.color, [255, 100, 100]);
        assert_eq!(p.radius, 20.0);
        assert_eq!(state.coins[0].value, 1);
        assert_eq!(state.coins[0].radius, 10.0);

        let ServerMsg::State(empty) = decode_server(r#"{"type":"state","timestamp":4.0}"#).unwrap()
        else {
            panic!("expected state");
        };
        assert!(empty.players.is_empty() && empty.coins.is_empty());
    }

    #[test]
    fn state_message_shape() {
        let msg = ServerMsg::State(WorldSnapshot {
            timestamp: 12.5,
            players: vec![MoverSnapshot {
                id: "p1".into(),
                x: 1.0,
                y: 2.0,
                vx: 200.0,
                vy: 0.0,
                score: 3,
                color: [255, 100, 100],
                radius: 20.0,
            }],
            coins: vec![PickupSnapshot {
                id: "c1".into(),
                x: 5.0,
                y: 6.0,
                value: 2,
                radius: 10.0,
            }],
        });

        let value: Value = serde_json::from_str(&encode(&msg).unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "state",
                "timestamp": 12.5,
                "players": [{
                    "id": "p1", "x": 1.0, "y": 2.0, "vx": 200.0, "vy": 0.0,
                    "score": 3, "color": [255, 100, 100], "radius": 20.0
                }],
                "coins": [{"id": "c1", "x": 5.0, "y": 6.0, "value": 2, "radius": 10.0}]
            })
        );
    }

    #[test]
    fn welcome_shape() {
        let value: Value =
            serde_json::from_str(&encode(&ServerMsg::welcome("player_1")).unwrap()).unwrap();
        assert_eq!(
            value,
            json!({"type": "welcome", "player_id": "player_1", "message": WELCOME_TEXT})
        );
    }
}
