//! Wire protocol: tagged JSON records exchanged between the relay and clients.
//!
//! Every record is a JSON object carrying a `type` tag from a closed set.
//! Traffic is split by direction into [`ClientMessage`] (client → relay) and
//! [`ServerMessage`] (relay → client); `block_update` and `chat` exist in both
//! because the relay re-broadcasts them. Anything outside the set fails to
//! decode with [`CodecError::Malformed`], which callers treat as non-fatal.
//!
//! Defaults for absent or `null` fields are applied here, at decode time,
//! so handlers never see a missing name or skin.

use std::fmt;

use glam::{DVec2, DVec3};
use serde::de::{self, DeserializeOwned, Unexpected};
use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// Shared value types
// ---------------------------------------------------------------------------

/// Relay-assigned player identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Three floating-point components, used for positions and velocities.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

impl From<DVec3> for Vector3 {
    fn from(v: DVec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl From<Vector3> for DVec3 {
    fn from(v: Vector3) -> Self {
        DVec3::new(v.x, v.y, v.z)
    }
}

/// View rotation in radians. `y` is yaw; `x` is pitch and may be omitted.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rotation {
    #[serde(default)]
    pub x: f64,
    pub y: f64,
}

impl Rotation {
    pub const fn new(pitch: f64, yaw: f64) -> Self {
        Self { x: pitch, y: yaw }
    }
}

impl From<DVec2> for Rotation {
    fn from(v: DVec2) -> Self {
        Self { x: v.x, y: v.y }
    }
}

impl From<Rotation> for DVec2 {
    fn from(r: Rotation) -> Self {
        DVec2::new(r.x, r.y)
    }
}

/// Integer voxel coordinate.
///
/// Clients send plain JSON numbers, so `5.0` is accepted as `5`. A value
/// with a fractional part is malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BlockPos {
    #[serde(deserialize_with = "whole_number")]
    pub x: i32,
    #[serde(deserialize_with = "whole_number")]
    pub y: i32,
    #[serde(deserialize_with = "whole_number")]
    pub z: i32,
}

impl BlockPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

/// Block type identifier. `0` is air, i.e. a removed block.
///
/// The relay never interprets the id; any whole number that fits is relayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct BlockType(pub u32);

impl BlockType {
    pub const AIR: Self = Self(0);

    pub fn is_air(self) -> bool {
        self.0 == 0
    }
}

impl<'de> Deserialize<'de> for BlockType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        whole_number(deserializer).map(Self)
    }
}

/// Opaque appearance bag (colours, skin keys). Passed through unvalidated.
///
/// Only a JSON object is kept. Any other value, `null` included, decodes as
/// an empty bag so a client with an odd skin can still join.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct Skin(pub serde_json::Map<String, serde_json::Value>);

impl<'de> Deserialize<'de> for Skin {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::Object(map) => Ok(Self(map)),
            _ => Ok(Self::default()),
        }
    }
}

/// Animation a player is currently showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationState {
    #[default]
    Idle,
    Walk,
    Sprint,
    Sneak,
    Jump,
}

// ---------------------------------------------------------------------------
// Payload records
// ---------------------------------------------------------------------------

/// Join request sent once per connection.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JoinRequest {
    /// Display name. Empty means "let the relay pick one".
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub skin: Skin,
}

/// Public roster entry for a player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub id: PlayerId,
    /// Display name as assigned by the relay.
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub skin: Skin,
    pub position: Vector3,
    pub rotation: Rotation,
}

/// Movement state published by a client and relayed to its peers.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    /// Feet position in world units.
    pub position: Vector3,
    pub rotation: Rotation,
    /// World units per second. Informational; peers do not extrapolate.
    #[serde(default)]
    pub velocity: Vector3,
    #[serde(default)]
    pub on_ground: bool,
    /// Derived by the sender; the relay passes it through.
    #[serde(default)]
    pub animation: AnimationState,
}

/// One world edit: the block at `position` becomes `block_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockChange {
    pub position: BlockPos,
    pub block_type: BlockType,
}

/// Replay of the relay's world-change log.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldData {
    pub changes: Vec<BlockChange>,
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// Records a client sends to the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Join(JoinRequest),
    Position(PlayerState),
    BlockUpdate(BlockChange),
    Chat { message: String },
    Leave,
}

impl ClientMessage {
    /// The wire `type` tag, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Join(_) => "join",
            Self::Position(_) => "position",
            Self::BlockUpdate(_) => "block_update",
            Self::Chat { .. } => "chat",
            Self::Leave => "leave",
        }
    }
}

/// Records the relay sends to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    Welcome {
        player_id: PlayerId,
    },
    PlayersList {
        players: Vec<PlayerInfo>,
    },
    PlayerJoin {
        player: PlayerInfo,
    },
    PlayerLeave {
        player_id: PlayerId,
        player_name: String,
    },
    PlayerUpdate {
        player_id: PlayerId,
        data: PlayerState,
    },
    BlockUpdate(BlockChange),
    Chat {
        player_id: PlayerId,
        player_name: String,
        message: String,
    },
    WorldData {
        data: WorldData,
    },
}

impl ServerMessage {
    /// The wire `type` tag, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Welcome { .. } => "welcome",
            Self::PlayersList { .. } => "players_list",
            Self::PlayerJoin { .. } => "player_join",
            Self::PlayerLeave { .. } => "player_leave",
            Self::PlayerUpdate { .. } => "player_update",
            Self::BlockUpdate(_) => "block_update",
            Self::Chat { .. } => "chat",
            Self::WorldData { .. } => "world_data",
        }
    }
}

// ---------------------------------------------------------------------------
// Codec
// ---------------------------------------------------------------------------

/// Errors produced by the message codec.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The payload is not a record of a known `type`, or a field is invalid.
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Serialize a message into a JSON payload.
pub fn encode<M: Serialize>(msg: &M) -> Result<Vec<u8>, CodecError> {
    Ok(serde_json::to_vec(msg)?)
}

/// Decode a JSON payload into one of the message enums.
pub fn decode<M: DeserializeOwned>(payload: &[u8]) -> Result<M, CodecError> {
    Ok(serde_json::from_slice(payload)?)
}

/// Integer field written as any JSON number without a fractional part.
fn whole_number<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<i64>,
{
    let value = f64::deserialize(deserializer)?;
    if !value.is_finite() || value.fract() != 0.0 {
        return Err(de::Error::invalid_value(
            Unexpected::Float(value),
            &"a whole number",
        ));
    }
    // `as` saturates, and `try_from` rejects anything outside `T`.
    T::try_from(value as i64).map_err(|_| {
        de::Error::invalid_value(Unexpected::Float(value), &"a whole number in range")
    })
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
