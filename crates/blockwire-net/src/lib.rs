//! Relay wire protocol: tagged JSON messages, length-prefixed TCP framing,
//! relay addresses, and client connection state.

pub mod address;
pub mod framing;
pub mod messages;
pub mod state;

pub use address::{AddressError, DEFAULT_PORT, RelayAddress};
pub use framing::{
    DEFAULT_MAX_FRAME_BYTES, FrameConfig, FrameError, ReadError, read_frame, read_message,
    write_frame, write_message,
};
pub use messages::{
    AnimationState, BlockChange, BlockPos, BlockType, ClientMessage, CodecError, JoinRequest,
    PlayerId, PlayerInfo, PlayerState, Rotation, ServerMessage, Skin, Vector3, WorldData, decode,
    encode,
};
pub use state::{ConnectionState, ConnectionStateWatch};
