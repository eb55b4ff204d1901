// Wire protocol: `{ "type", "data", "origin" }` frames and their payload DTOs.
// Payload fields are camelCase on the wire.

use crate::domain::action::tags;
use crate::domain::ports::SendError;
use crate::domain::{
    Action, Bomb, BombAction, Direction, Origin, Player, PlayerAction, SessionAction, Shot,
    ShotAction,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// One action as it travels over the socket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireAction {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Value,
    pub origin: Origin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdPayload {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerIdPayload {
    pub player_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRequestPayload {
    pub player_id: String,
    pub direction: Direction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovedPayload {
    pub id: String,
    pub x: f32,
    pub y: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facing: Option<Direction>,
}

/// Bomb as sent in `BOMB_SET`. `version` is omitted when unversioned.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BombDto {
    pub id: String,
    pub player_id: String,
    pub x: f32,
    pub y: f32,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub version: u64,
}

fn is_zero(version: &u64) -> bool {
    *version == 0
}

impl From<&Bomb> for BombDto {
    fn from(bomb: &Bomb) -> Self {
        Self {
            id: bomb.id.clone(),
            player_id: bomb.player_id.clone(),
            x: bomb.x,
            y: bomb.y,
            version: bomb.version,
        }
    }
}

impl From<BombDto> for Bomb {
    fn from(dto: BombDto) -> Self {
        Bomb::new(dto.id, dto.player_id, dto.x, dto.y).with_version(dto.version)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerDto {
    pub id: String,
    pub name: String,
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub facing: Direction,
}

impl From<&Player> for PlayerDto {
    fn from(player: &Player) -> Self {
        Self {
            id: player.id.clone(),
            name: player.name.clone(),
            x: player.x,
            y: player.y,
            facing: player.facing,
        }
    }
}

impl From<PlayerDto> for Player {
    fn from(dto: PlayerDto) -> Self {
        Player {
            facing: dto.facing,
            ..Player::new(dto.id, dto.name, dto.x, dto.y)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShotDto {
    pub id: String,
    pub player_id: String,
    pub x: f32,
    pub y: f32,
    pub direction: Direction,
}

impl From<&Shot> for ShotDto {
    fn from(shot: &Shot) -> Self {
        Self {
            id: shot.id.clone(),
            player_id: shot.player_id.clone(),
            x: shot.x,
            y: shot.y,
            direction: shot.direction,
        }
    }
}

impl From<ShotDto> for Shot {
    fn from(dto: ShotDto) -> Self {
        Shot {
            id: dto.id,
            player_id: dto.player_id,
            x: dto.x,
            y: dto.y,
            direction: dto.direction,
        }
    }
}

#[derive(Debug)]
pub enum EncodeError {
    NotTransmittable(&'static str),
    Json(serde_json::Error),
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeError::NotTransmittable(kind) => write!(f, "{kind} is client-local"),
            EncodeError::Json(e) => write!(f, "json: {e}"),
        }
    }
}

impl From<serde_json::Error> for EncodeError {
    fn from(e: serde_json::Error) -> Self {
        EncodeError::Json(e)
    }
}

impl From<EncodeError> for SendError {
    fn from(e: EncodeError) -> Self {
        match e {
            EncodeError::NotTransmittable(kind) => SendError::NotTransmittable(kind),
            EncodeError::Json(e) => SendError::Encode(e),
        }
    }
}

#[derive(Debug)]
pub enum DecodeError {
    // Frame is not a `{type, data, origin}` object.
    Json(serde_json::Error),
    UnknownType(String),
    // Known type that only exists inside a client.
    NotTransmittable(String),
    OriginMismatch {
        kind: &'static str,
        declared: Origin,
    },
    Payload {
        kind: &'static str,
        source: serde_json::Error,
    },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Json(e) => write!(f, "malformed frame: {e}"),
            DecodeError::UnknownType(kind) => write!(f, "unknown action type `{kind}`"),
            DecodeError::NotTransmittable(kind) => write!(f, "`{kind}` is client-local"),
            DecodeError::OriginMismatch { kind, declared } => {
                write!(f, "{kind} declared with origin {declared}")
            }
            DecodeError::Payload { kind, source } => write!(f, "bad {kind} payload: {source}"),
        }
    }
}

impl From<serde_json::Error> for DecodeError {
    fn from(e: serde_json::Error) -> Self {
        DecodeError::Json(e)
    }
}

pub fn to_wire(action: &Action) -> Result<WireAction, EncodeError> {
    let data = match action {
        Action::KeyDown { .. } | Action::Connection(_) => {
            return Err(EncodeError::NotTransmittable(action.kind()));
        }
        Action::Session(SessionAction::SignedIn { player_id }) => {
            serde_json::to_value(PlayerIdPayload {
                player_id: player_id.clone(),
            })?
        }
        Action::Session(SessionAction::SignedOut) => Value::Object(Default::default()),
        Action::Player(action) => match action {
            PlayerAction::MoveKeyPressed { .. } => {
                return Err(EncodeError::NotTransmittable(action.kind()));
            }
            PlayerAction::MoveRequested {
                player_id,
                direction,
            } => serde_json::to_value(MoveRequestPayload {
                player_id: player_id.clone(),
                direction: *direction,
            })?,
            PlayerAction::Joined(player) => serde_json::to_value(PlayerDto::from(player))?,
            PlayerAction::Moved { id, x, y, facing } => serde_json::to_value(MovedPayload {
                id: id.clone(),
                x: *x,
                y: *y,
                facing: *facing,
            })?,
            PlayerAction::Left { id } => serde_json::to_value(IdPayload { id: id.clone() })?,
        },
        Action::Bomb(action) => match action {
            BombAction::SetKeyPressed | BombAction::DetonateKeyPressed => {
                return Err(EncodeError::NotTransmittable(action.kind()));
            }
            BombAction::SetRequested { player_id } => serde_json::to_value(PlayerIdPayload {
                player_id: player_id.clone(),
            })?,
            BombAction::Set(bomb) => serde_json::to_value(BombDto::from(bomb))?,
            BombAction::DetonateRequested { id } | BombAction::Detonated { id } => {
                serde_json::to_value(IdPayload { id: id.clone() })?
            }
        },
        Action::Shot(action) => match action {
            ShotAction::FireKeyPressed => {
                return Err(EncodeError::NotTransmittable(action.kind()));
            }
            ShotAction::FireRequested { player_id } => serde_json::to_value(PlayerIdPayload {
                player_id: player_id.clone(),
            })?,
            ShotAction::Fired(shot) => serde_json::to_value(ShotDto::from(shot))?,
            ShotAction::Removed { id } => serde_json::to_value(IdPayload { id: id.clone() })?,
        },
    };

    Ok(WireAction {
        kind: action.kind().to_string(),
        data,
        origin: action.origin(),
    })
}

pub fn encode(action: &Action) -> Result<String, EncodeError> {
    Ok(serde_json::to_string(&to_wire(action)?)?)
}

fn payload<T: DeserializeOwned>(kind: &'static str, data: &Value) -> Result<T, DecodeError> {
    T::deserialize(data).map_err(|source| DecodeError::Payload { kind, source })
}

/// Maps a frame onto its action, checking the declared origin against the type's.
pub fn from_wire(wire: WireAction) -> Result<Action, DecodeError> {
    let data = &wire.data;
    let action: Action = match wire.kind.as_str() {
        tags::SIGNED_IN => {
            let p: PlayerIdPayload = payload(tags::SIGNED_IN, data)?;
            SessionAction::SignedIn {
                player_id: p.player_id,
            }
            .into()
        }
        tags::SIGNED_OUT => SessionAction::SignedOut.into(),

        tags::PLAYER_MOVE_REQUESTED => {
            let p: MoveRequestPayload = payload(tags::PLAYER_MOVE_REQUESTED, data)?;
            PlayerAction::MoveRequested {
                player_id: p.player_id,
                direction: p.direction,
            }
            .into()
        }
        tags::PLAYER_JOINED => {
            let p: PlayerDto = payload(tags::PLAYER_JOINED, data)?;
            PlayerAction::Joined(p.into()).into()
        }
        tags::PLAYER_MOVED => {
            let p: MovedPayload = payload(tags::PLAYER_MOVED, data)?;
            PlayerAction::Moved {
                id: p.id,
                x: p.x,
                y: p.y,
                facing: p.facing,
            }
            .into()
        }
        tags::PLAYER_LEFT => {
            let p: IdPayload = payload(tags::PLAYER_LEFT, data)?;
            PlayerAction::Left { id: p.id }.into()
        }

        tags::BOMB_SET_REQUESTED => {
            let p: PlayerIdPayload = payload(tags::BOMB_SET_REQUESTED, data)?;
            BombAction::SetRequested {
                player_id: p.player_id,
            }
            .into()
        }
        tags::BOMB_SET => {
            let p: BombDto = payload(tags::BOMB_SET, data)?;
            BombAction::Set(p.into()).into()
        }
        tags::BOMB_DETONATE_REQUESTED => {
            let p: IdPayload = payload(tags::BOMB_DETONATE_REQUESTED, data)?;
            BombAction::DetonateRequested { id: p.id }.into()
        }
        tags::BOMB_DETONATED => {
            let p: IdPayload = payload(tags::BOMB_DETONATED, data)?;
            BombAction::Detonated { id: p.id }.into()
        }

        tags::SHOT_FIRE_REQUESTED => {
            let p: PlayerIdPayload = payload(tags::SHOT_FIRE_REQUESTED, data)?;
            ShotAction::FireRequested {
                player_id: p.player_id,
            }
            .into()
        }
        tags::SHOT_FIRED => {
            let p: ShotDto = payload(tags::SHOT_FIRED, data)?;
            ShotAction::Fired(p.into()).into()
        }
        tags::SHOT_REMOVED => {
            let p: IdPayload = payload(tags::SHOT_REMOVED, data)?;
            ShotAction::Removed { id: p.id }.into()
        }

        tags::KEY_DOWN
        | tags::CONNECTION_LOST
        | tags::CONNECTION_RESTORED
        | tags::LATENCY_MEASURED
        | tags::PLAYER_MOVE_KEY_PRESSED
        | tags::BOMB_SET_KEY_PRESSED
        | tags::BOMB_DETONATE_KEY_PRESSED
        | tags::SHOT_FIRE_KEY_PRESSED => return Err(DecodeError::NotTransmittable(wire.kind)),
        _ => return Err(DecodeError::UnknownType(wire.kind)),
    };

    if action.origin() != wire.origin {
        return Err(DecodeError::OriginMismatch {
            kind: action.kind(),
            declared: wire.origin,
        });
    }
    Ok(action)
}

pub fn decode(text: &str) -> Result<Action, DecodeError> {
    from_wire(serde_json::from_str(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn when_set_request_is_encoded_then_frame_has_canonical_shape() {
        let action: Action = BombAction::SetRequested {
            player_id: "p1".to_string(),
        }
        .into();

        let frame: Value = serde_json::from_str(&encode(&action).expect("encodes")).expect("json");

        assert_eq!(
            frame,
            json!({ "type": "BOMB_SET_REQUESTED", "data": { "playerId": "p1" }, "origin": "client" })
        );
    }

    #[test]
    fn when_unversioned_bomb_is_encoded_then_version_is_omitted() {
        let action: Action = BombAction::Set(Bomb::new("p1", "p1", 3.0, 4.0)).into();

        let wire = to_wire(&action).expect("encodes");

        assert_eq!(
            wire.data,
            json!({ "id": "p1", "playerId": "p1", "x": 3.0, "y": 4.0 })
        );
        assert_eq!(wire.origin, Origin::Server);
    }

    #[test]
    fn when_server_bomb_set_is_decoded_then_action_carries_bomb() {
        let text = r#"{"type":"BOMB_SET","data":{"id":"p1","playerId":"p1","x":1.5,"y":2},"origin":"server"}"#;

        let action = decode(text).expect("decodes");

        assert_eq!(
            action,
            Action::from(BombAction::Set(Bomb::new("p1", "p1", 1.5, 2.0)))
        );
    }

    #[test]
    fn when_versioned_bomb_is_decoded_then_version_is_kept() {
        let text = r#"{"type":"BOMB_SET","data":{"id":"b","playerId":"p2","x":0,"y":0,"version":7},"origin":"server"}"#;

        let Action::Bomb(BombAction::Set(bomb)) = decode(text).expect("decodes") else {
            panic!("expected BOMB_SET");
        };
        assert_eq!(bomb.version, 7);
    }

    #[test]
    fn when_declared_origin_disagrees_then_frame_is_rejected() {
        let text = r#"{"type":"BOMB_DETONATED","data":{"id":"p1"},"origin":"client"}"#;

        assert!(matches!(
            decode(text),
            Err(DecodeError::OriginMismatch {
                kind: tags::BOMB_DETONATED,
                declared: Origin::Client
            })
        ));
    }

    #[test]
    fn when_type_is_unknown_then_frame_is_rejected() {
        let text = r#"{"type":"BOMB_DEFUSED","data":{},"origin":"server"}"#;

        assert!(matches!(decode(text), Err(DecodeError::UnknownType(kind)) if kind == "BOMB_DEFUSED"));
    }

    #[test]
    fn when_payload_is_partial_then_frame_is_rejected() {
        let text = r#"{"type":"BOMB_SET","data":{"id":"p1"},"origin":"server"}"#;

        assert!(matches!(
            decode(text),
            Err(DecodeError::Payload {
                kind: tags::BOMB_SET,
                ..
            })
        ));
    }

    #[test]
    fn when_key_press_is_encoded_or_decoded_then_it_is_refused() {
        assert!(matches!(
            encode(&BombAction::SetKeyPressed.into()),
            Err(EncodeError::NotTransmittable(tags::BOMB_SET_KEY_PRESSED))
        ));
        assert!(matches!(
            decode(r#"{"type":"KEY_DOWN","data":{"key":"b"},"origin":"client"}"#),
            Err(DecodeError::NotTransmittable(_))
        ));
    }

    #[test]
    fn when_signed_out_has_no_data_then_it_still_decodes() {
        let action = decode(r#"{"type":"SIGNED_OUT","origin":"server"}"#).expect("decodes");

        assert_eq!(action, Action::from(SessionAction::SignedOut));
    }

    #[test]
    fn when_player_moved_is_encoded_then_facing_is_lowercase() {
        let action: Action = PlayerAction::Moved {
            id: "p1".to_string(),
            x: 1.0,
            y: 0.0,
            facing: Some(Direction::Right),
        }
        .into();

        assert_eq!(
            to_wire(&action).expect("encodes").data,
            json!({ "id": "p1", "x": 1.0, "y": 0.0, "facing": "right" })
        );
    }
}
