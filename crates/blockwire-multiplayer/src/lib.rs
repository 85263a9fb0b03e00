//! Client-side multiplayer: the relay connection, outbound state publishing,
//! and smoothed mirrors of other players.

pub mod animation;
pub mod events;
pub mod network_manager;
pub mod remote;
pub mod throttle;

pub use animation::{LimbPose, LocalPlayer, derive_animation, limb_pose};
pub use events::{ClientEvent, ClientEvents};
pub use network_manager::{ClientError, NetworkManager, NetworkSettings};
pub use remote::{RemoteEntity, RemoteEntityStore};
pub use throttle::PublishThrottle;
