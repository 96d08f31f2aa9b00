// Wire protocol DTOs and conversions for public room messages.
// Internal HTTP DTOs live next to their handlers in `net::internal`.

use crate::domain::{EntitySnapshot, PlayerInput, ProjectileSnapshot};
use crate::use_cases::events::RoomEvent;
use crate::use_cases::{RoomStatus, WorldUpdate};
use serde::{Deserialize, Serialize};

/// Messages the server sends to connected clients over the WebSocket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum ServerMessage {
    // Assigned identity for the connection after Join is accepted.
    Identity { player_id: String },
    // Snapshot of the room for a given tick.
    WorldUpdate(WorldUpdateDto),
    // Room lifecycle transitions.
    RoomStatus(RoomStatusDto),
}

/// Messages the client sends to the server over the WebSocket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ClientMessage {
    // Initial handshake message.
    Join(JoinPayload),
    // Input messages sent after a successful Join.
    Input(PlayerInputDto),
    // Hands control of the player to the AI, or takes it back.
    SetBotMode(SetBotModePayload),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JoinPayload {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub bot_mode: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetBotModePayload {
    pub enabled: bool,
}

/// Per-tick input payload sent by the client after joining.
#[derive(Debug, Clone, Deserialize)]
pub struct PlayerInputDto {
    #[serde(default)]
    pub move_x: f32,
    #[serde(default)]
    pub move_y: f32,
    #[serde(default)]
    pub attack: bool,
    #[serde(default)]
    pub aim_x: Option<f32>,
    #[serde(default)]
    pub aim_y: Option<f32>,
}

/// Input carried a non-finite movement component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidInput;

impl TryFrom<PlayerInputDto> for PlayerInput {
    type Error = InvalidInput;

    /// Movement is clamped per axis; an aim point missing a coordinate or holding a
    /// non-finite one is dropped.
    fn try_from(input: PlayerInputDto) -> Result<Self, Self::Error> {
        if !input.move_x.is_finite() || !input.move_y.is_finite() {
            return Err(InvalidInput);
        }
        let (aim_x, aim_y) = match (input.aim_x, input.aim_y) {
            (Some(x), Some(y)) if x.is_finite() && y.is_finite() => (Some(x), Some(y)),
            _ => (None, None),
        };
        Ok(Self {
            move_x: input.move_x.clamp(-1.0, 1.0),
            move_y: input.move_y.clamp(-1.0, 1.0),
            attack: input.attack,
            aim_x,
            aim_y,
        })
    }
}

/// Snapshot of the room sent to clients on each tick.
#[derive(Debug, Clone, Serialize)]
pub struct WorldUpdateDto {
    pub tick: u64,
    pub time_ms: u64,
    pub entities: Vec<EntityStateDto>,
    pub projectiles: Vec<ProjectileStateDto>,
    pub events: Vec<RoomEvent>,
}

impl From<WorldUpdate> for WorldUpdateDto {
    fn from(update: WorldUpdate) -> Self {
        Self {
            tick: update.tick,
            time_ms: update.time_ms,
            entities: update.entities.iter().map(EntityStateDto::from).collect(),
            projectiles: update
                .projectiles
                .iter()
                .map(ProjectileStateDto::from)
                .collect(),
            events: update.events,
        }
    }
}

/// Flattened entity state for wire transmission in world updates.
#[derive(Debug, Clone, Serialize)]
pub struct EntityStateDto {
    pub id: String,
    pub label: String,
    pub x: f32,
    pub y: f32,
    pub heading: f32,
    pub hp: i32,
    pub max_hp: i32,
    pub alive: bool,
    pub attacking: bool,
    pub casting: bool,
    pub behavior: &'static str,
}

impl From<&EntitySnapshot> for EntityStateDto {
    fn from(entity: &EntitySnapshot) -> Self {
        Self {
            id: entity.id.to_string(),
            label: entity.label.clone(),
            x: entity.x,
            y: entity.y,
            heading: entity.heading,
            hp: entity.hp,
            max_hp: entity.max_hp,
            alive: entity.alive,
            attacking: entity.attacking,
            casting: entity.casting,
            behavior: entity.behavior.as_str(),
        }
    }
}

/// Flattened projectile state for wire transmission in world updates.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectileStateDto {
    pub id: String,
    pub owner_id: String,
    pub x: f32,
    pub y: f32,
    pub heading: f32,
    pub deflected: bool,
}

impl From<&ProjectileSnapshot> for ProjectileStateDto {
    fn from(projectile: &ProjectileSnapshot) -> Self {
        Self {
            id: projectile.id.to_string(),
            owner_id: projectile.owner_id.to_string(),
            x: projectile.x,
            y: projectile.y,
            heading: projectile.heading,
            deflected: projectile.deflected,
        }
    }
}

/// Room lifecycle state sent to clients.
#[derive(Debug, Clone, Serialize)]
pub enum RoomStatusDto {
    Starting,
    Running,
    Stopped,
}

impl From<RoomStatus> for RoomStatusDto {
    fn from(status: RoomStatus) -> Self {
        match status {
            RoomStatus::Starting => RoomStatusDto::Starting,
            RoomStatus::Running => RoomStatusDto::Running,
            RoomStatus::Stopped => RoomStatusDto::Stopped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn when_join_has_no_fields_then_defaults_apply() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"Join","data":{}}"#).expect("parse");
        match msg {
            ClientMessage::Join(payload) => {
                assert!(payload.display_name.is_none());
                assert!(!payload.bot_mode);
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn when_input_omits_aim_then_aim_is_none() {
        let msg: ClientMessage = serde_json::from_str(
            r#"{"type":"Input","data":{"move_x":1.0,"attack":true}}"#,
        )
        .expect("parse");
        let ClientMessage::Input(dto) = msg else {
            panic!("expected input");
        };
        let input = PlayerInput::try_from(dto).expect("valid input");
        assert_eq!(input.move_x, 1.0);
        assert_eq!(input.move_y, 0.0);
        assert!(input.attack);
        assert!(input.aim_x.is_none());
    }

    #[test]
    fn when_input_has_nan_then_it_is_rejected() {
        let dto = PlayerInputDto {
            move_x: f32::NAN,
            move_y: 0.0,
            attack: false,
            aim_x: None,
            aim_y: None,
        };
        assert_eq!(PlayerInput::try_from(dto), Err(InvalidInput));
    }

    #[test]
    fn when_input_out_of_range_then_it_is_clamped_and_partial_aim_cleared() {
        let dto = PlayerInputDto {
            move_x: 3.0,
            move_y: -2.0,
            attack: true,
            aim_x: Some(4.0),
            aim_y: None,
        };
        let input = PlayerInput::try_from(dto).expect("valid input");
        assert_eq!((input.move_x, input.move_y), (1.0, -1.0));
        assert!(input.aim_x.is_none() && input.aim_y.is_none());
    }

    #[test]
    fn when_identity_serialized_then_uses_tagged_layout() {
        let txt = serde_json::to_string(&ServerMessage::Identity {
            player_id: "7".to_string(),
        })
        .expect("serialize");
        assert_eq!(txt, r#"{"type":"Identity","data":{"player_id":"7"}}"#);
    }
}
