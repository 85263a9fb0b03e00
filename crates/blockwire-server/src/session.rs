//! Session registry: connection ↔ player identity and last-known state.
//!
//! Each live session pairs a [`Player`] with the [`Outbox`] of the connection
//! that owns it. Only that connection's dispatcher mutates the player, so a
//! single registry-wide lock is enough. Broadcasts hold the read lock for the
//! whole fan-out; a concurrent removal waits for it and is never seen half
//! done.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use blockwire_net::{
    JoinRequest, PlayerId, PlayerInfo, PlayerState, Rotation, ServerMessage, Skin, Vector3,
    WorldData, encode,
};
use tokio::sync::{RwLock, mpsc};

use crate::world_log::WorldLog;

/// Where a freshly joined player appears.
pub const SPAWN_POSITION: Vector3 = Vector3::new(0.0, 70.0, 0.0);

// ---------------------------------------------------------------------------
// Outbox
// ---------------------------------------------------------------------------

/// Fire-and-forget sender feeding one connection's writer task.
///
/// Sends never block. If the writer task is gone the payload is dropped and
/// `false` is returned; nothing propagates to other recipients.
#[derive(Debug, Clone)]
pub struct Outbox {
    tx: mpsc::UnboundedSender<Arc<[u8]>>,
}

impl Outbox {
    /// Create an outbox and the receiver its writer task drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Arc<[u8]>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Encode and queue one message.
    pub fn send(&self, msg: &ServerMessage) -> bool {
        match encode(msg) {
            Ok(payload) => self.send_encoded(Arc::from(payload)),
            Err(e) => {
                tracing::warn!("Failed to encode {}: {e}", msg.kind());
                false
            }
        }
    }

    /// Queue an already-encoded payload (shared across a broadcast).
    pub fn send_encoded(&self, payload: Arc<[u8]>) -> bool {
        self.tx.send(payload).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// Server-side record of one joined player.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    /// Assigned on join, never reused.
    pub id: PlayerId,
    /// Display name after defaulting; never empty.
    pub name: String,
    /// Appearance bag from `join`, relayed verbatim.
    pub skin: Skin,
    /// Last movement state reported by the owning connection.
    pub state: PlayerState,
}

impl Player {
    fn spawn(id: PlayerId, name: String, skin: Skin) -> Self {
        Self {
            id,
            name,
            skin,
            state: PlayerState {
                position: SPAWN_POSITION,
                rotation: Rotation::default(),
                ..PlayerState::default()
            },
        }
    }

    /// Public roster fields.
    pub fn info(&self) -> PlayerInfo {
        PlayerInfo {
            id: self.id,
            name: self.name.clone(),
            skin: self.skin.clone(),
            position: self.state.position,
            rotation: self.state.rotation,
        }
    }
}

struct Session {
    player: Player,
    outbox: Outbox,
}

// ---------------------------------------------------------------------------
// SessionRegistry
// ---------------------------------------------------------------------------

/// All joined players, keyed by id.
pub struct SessionRegistry {
    sessions: RwLock<BTreeMap<PlayerId, Session>>,
    next_player_id: AtomicU64,
}

impl SessionRegistry {
    /// Empty registry. The first joiner gets id 1.
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(BTreeMap::new()),
            next_player_id: AtomicU64::new(1),
        }
    }

    /// Admit a connection as a new player.
    ///
    /// Under the registry write lock this allocates an id that has never been
    /// handed out, queues `welcome`, `players_list` (everyone else) and, if
    /// the log is non-empty, `world_data` on `outbox`, then makes the session
    /// visible. Any broadcast therefore reaches the newcomer only after its
    /// greeting. Call once per connection.
    pub async fn create_session(
        &self,
        outbox: Outbox,
        join: JoinRequest,
        world: &WorldLog,
    ) -> Player {
        let mut sessions = self.sessions.write().await;

        let id = PlayerId(self.next_player_id.fetch_add(1, Ordering::Relaxed));
        let name = if join.name.trim().is_empty() {
            format!("Player{id}")
        } else {
            join.name
        };
        let player = Player::spawn(id, name, join.skin);

        outbox.send(&ServerMessage::Welcome { player_id: id });
        outbox.send(&ServerMessage::PlayersList {
            players: sessions.values().map(|s| s.player.info()).collect(),
        });
        let changes = world.snapshot().await;
        if !changes.is_empty() {
            outbox.send(&ServerMessage::WorldData {
                data: WorldData { changes },
            });
        }

        sessions.insert(
            id,
            Session {
                player: player.clone(),
                outbox,
            },
        );
        player
    }

    /// Copy of a live player's record, `None` once the session is removed.
    pub async fn get(&self, id: PlayerId) -> Option<Player> {
        self.sessions.read().await.get(&id).map(|s| s.player.clone())
    }

    /// Every joined player except `excluding`, in id order.
    pub async fn list_others(&self, excluding: PlayerId) -> Vec<Player> {
        self.sessions
            .read()
            .await
            .values()
            .filter(|s| s.player.id != excluding)
            .map(|s| s.player.clone())
            .collect()
    }

    /// Overwrite a live player's movement state. Returns `false` if the
    /// session is already gone.
    pub async fn update_state(&self, id: PlayerId, state: PlayerState) -> bool {
        match self.sessions.write().await.get_mut(&id) {
            Some(session) => {
                session.player.state = state;
                true
            }
            None => false,
        }
    }

    /// Remove a session. Only the first call for an id returns the player.
    pub async fn remove(&self, id: PlayerId) -> Option<Player> {
        self.sessions.write().await.remove(&id).map(|s| s.player)
    }

    /// Send `msg` to every joined connection except `except`.
    ///
    /// The message is encoded once. A recipient whose writer has gone away is
    /// skipped. Returns how many outboxes accepted it.
    pub async fn broadcast(&self, msg: &ServerMessage, except: Option<PlayerId>) -> usize {
        let payload: Arc<[u8]> = match encode(msg) {
            Ok(bytes) => Arc::from(bytes),
            Err(e) => {
                tracing::warn!("Failed to encode {} for broadcast: {e}", msg.kind());
                return 0;
            }
        };

        let sessions = self.sessions.read().await;
        let mut delivered = 0;
        for (id, session) in sessions.iter() {
            if Some(*id) == except {
                continue;
            }
            if session.outbox.send_encoded(Arc::clone(&payload)) {
                delivered += 1;
            } else {
                tracing::debug!("Dropped {} for player {id}: outbox closed", msg.kind());
            }
        }
        delivered
    }

    /// Number of joined players.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
