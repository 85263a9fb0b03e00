//! Per-connection message handling.
//!
//! A connection moves through `Connected → Joined → Closed`. Only `join`
//! leaves `Connected`; everything else arriving before it is dropped.
//! `Closed` is terminal and reached at most once, by `leave`, transport close
//! or transport error, whichever comes first.
//!
//! Errors returned from [`ConnectionDispatcher::handle_frame`] are for the
//! caller to log. None of them close the connection.

use std::sync::Arc;

use blockwire_net::{BlockChange, ClientMessage, CodecError, PlayerId, PlayerState, ServerMessage};

use crate::session::{Outbox, SessionRegistry};
use crate::world_log::WorldLog;

/// Relay-wide state shared by every connection.
#[derive(Default)]
pub struct RelayState {
    pub sessions: SessionRegistry,
    pub world: WorldLog,
}

impl RelayState {
    pub fn new(sessions: SessionRegistry, world: WorldLog) -> Self {
        Self { sessions, world }
    }
}

/// Where a connection is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Connected,
    Joined(PlayerId),
    Closed,
}

/// Recoverable per-message failures.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    Malformed(#[from] CodecError),

    #[error("`{kind}` is not valid while {phase:?}")]
    ProtocolViolation { kind: &'static str, phase: Phase },
}

/// Reacts to one connection's inbound messages.
pub struct ConnectionDispatcher {
    relay: Arc<RelayState>,
    outbox: Outbox,
    phase: Phase,
}

impl ConnectionDispatcher {
    /// Start in [`Phase::Connected`]. `outbox` feeds this connection's writer.
    pub fn new(relay: Arc<RelayState>, outbox: Outbox) -> Self {
        Self {
            relay,
            outbox,
            phase: Phase::Connected,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_closed(&self) -> bool {
        self.phase == Phase::Closed
    }

    /// Decode one frame and handle it.
    pub async fn handle_frame(&mut self, payload: &[u8]) -> Result<(), DispatchError> {
        let msg: ClientMessage = blockwire_net::decode(payload)?;
        self.handle(msg).await
    }

    pub async fn handle(&mut self, msg: ClientMessage) -> Result<(), DispatchError> {
        tracing::trace!("{:?} <- {}", self.phase, msg.kind());

        match (self.phase, msg) {
            (Phase::Connected, ClientMessage::Join(join)) => {
                let player = self
                    .relay
                    .sessions
                    .create_session(self.outbox.clone(), join, &self.relay.world)
                    .await;
                self.phase = Phase::Joined(player.id);

                self.relay
                    .sessions
                    .broadcast(
                        &ServerMessage::PlayerJoin {
                            player: player.info(),
                        },
                        Some(player.id),
                    )
                    .await;
                tracing::info!("{} joined (ID: {})", player.name, player.id);
                Ok(())
            }
            (Phase::Joined(id), ClientMessage::Position(state)) => {
                self.on_position(id, state).await;
                Ok(())
            }
            (Phase::Joined(_), ClientMessage::BlockUpdate(change)) => {
                self.on_block_update(change).await;
                Ok(())
            }
            (Phase::Joined(id), ClientMessage::Chat { message }) => {
                self.on_chat(id, message).await;
                Ok(())
            }
            (Phase::Connected | Phase::Joined(_), ClientMessage::Leave) => {
                self.close().await;
                Ok(())
            }
            (phase, msg) => Err(DispatchError::ProtocolViolation {
                kind: msg.kind(),
                phase,
            }),
        }
    }

    /// Enter [`Phase::Closed`]. From `Joined` this removes the session and
    /// tells everyone else; repeated calls do nothing.
    pub async fn close(&mut self) {
        let phase = std::mem::replace(&mut self.phase, Phase::Closed);
        let Phase::Joined(id) = phase else {
            return;
        };

        if let Some(player) = self.relay.sessions.remove(id).await {
            tracing::info!("{} left (ID: {})", player.name, player.id);
            self.relay
                .sessions
                .broadcast(
                    &ServerMessage::PlayerLeave {
                        player_id: player.id,
                        player_name: player.name,
                    },
                    None,
                )
                .await;
        }
    }

    async fn on_position(&self, id: PlayerId, state: PlayerState) {
        if !self.relay.sessions.update_state(id, state).await {
            return;
        }
        self.relay
            .sessions
            .broadcast(
                &ServerMessage::PlayerUpdate {
                    player_id: id,
                    data: state,
                },
                Some(id),
            )
            .await;
    }

    async fn on_block_update(&self, change: BlockChange) {
        self.relay.world.append(change).await;
        // The sender gets its own edit back like everyone else.
        self.relay
            .sessions
            .broadcast(&ServerMessage::BlockUpdate(change), None)
            .await;
    }

    async fn on_chat(&self, id: PlayerId, message: String) {
        let Some(player) = self.relay.sessions.get(id).await else {
            return;
        };
        tracing::info!("<{}> {}", player.name, message);
        self.relay
            .sessions
            .broadcast(
                &ServerMessage::Chat {
                    player_id: id,
                    player_name: player.name,
                    message,
                },
                None,
            )
            .await;
    }
}
