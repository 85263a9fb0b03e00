//! The relay: session registry, world-change log, per-connection dispatch,
//! and the TCP accept loop.

pub mod dispatcher;
pub mod server;
pub mod session;
pub mod world_log;

pub use dispatcher::{ConnectionDispatcher, DispatchError, Phase, RelayState};
pub use server::{RelayServer, ServerConfig};
pub use session::{Outbox, Player, SPAWN_POSITION, SessionRegistry};
pub use world_log::WorldLog;
