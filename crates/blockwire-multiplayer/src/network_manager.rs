//! Client connection to the relay.
//!
//! [`NetworkManager::connect`] opens the TCP stream, sends `join`, and
//! returns only once the relay's `welcome` has assigned an id. Two background
//! tasks then own the socket: a writer draining outbound messages and a
//! reader forwarding decoded relay messages into a channel.
//!
//! Nothing inbound is applied until the game loop calls
//! [`NetworkManager::poll`], so the remote entity store is only touched
//! between frames and never races with [`NetworkManager::interpolate`].
//! A dropped connection is noticed passively: the reader flips the
//! [`ConnectionStateWatch`] and closes the channel.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use blockwire_config::ClientConfig;
use blockwire_net::{
    AddressError, BlockChange, BlockPos, BlockType, ClientMessage, ConnectionState,
    ConnectionStateWatch, FrameConfig, JoinRequest, PlayerId, ReadError, RelayAddress,
    ServerMessage, Skin, read_message, write_message,
};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::task::JoinHandle;

use crate::animation::{LocalPlayer, WALK_SPEED_THRESHOLD};
use crate::events::ClientEvents;
use crate::remote::{DEFAULT_LERP_FACTOR, RemoteEntityStore};
use crate::throttle::{DEFAULT_PUBLISH_INTERVAL, PublishThrottle};

/// Errors surfaced by [`NetworkManager::connect`].
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Unparseable address, transport failure, or the relay hung up before
    /// `welcome`.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
}

/// Client tuning knobs.
#[derive(Debug, Clone)]
pub struct NetworkSettings {
    pub publish_interval: Duration,
    pub interpolation_factor: f64,
    pub walk_speed_threshold: f64,
    pub frame: FrameConfig,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            publish_interval: DEFAULT_PUBLISH_INTERVAL,
            interpolation_factor: DEFAULT_LERP_FACTOR,
            walk_speed_threshold: WALK_SPEED_THRESHOLD,
            frame: FrameConfig::default(),
        }
    }
}

impl From<&ClientConfig> for NetworkSettings {
    fn from(config: &ClientConfig) -> Self {
        Self {
            publish_interval: Duration::from_millis(config.publish_interval_ms),
            interpolation_factor: config.interpolation_factor,
            walk_speed_threshold: config.walk_speed_threshold,
            frame: FrameConfig::default(),
        }
    }
}

/// A joined session with the relay.
pub struct NetworkManager {
    player_id: PlayerId,
    player_name: String,
    state: Arc<ConnectionStateWatch>,
    outbound: Option<mpsc::UnboundedSender<ClientMessage>>,
    inbound: mpsc::UnboundedReceiver<ServerMessage>,
    /// Messages read while waiting for `welcome`, replayed by the first poll.
    pending: VecDeque<ServerMessage>,
    reader: JoinHandle<()>,
    throttle: PublishThrottle,
    walk_speed_threshold: f64,
    remotes: RemoteEntityStore,
    lost_reported: bool,
}

impl NetworkManager {
    /// Connect to `address` (`host[:port]`) and join as `player_name`.
    ///
    /// Resolves once the relay's `welcome` arrives.
    pub async fn connect(
        address: &str,
        player_name: &str,
        skin: Skin,
        settings: NetworkSettings,
    ) -> Result<Self, ClientError> {
        let address: RelayAddress = address.parse().map_err(|e: AddressError| {
            ClientError::ConnectionFailed(format!("invalid relay address {address:?}: {e}"))
        })?;

        let state = Arc::new(ConnectionStateWatch::new());
        state.set(ConnectionState::Connecting);

        let stream = match TcpStream::connect((address.host.as_str(), address.port)).await {
            Ok(stream) => stream,
            Err(e) => {
                state.set(ConnectionState::Disconnected);
                return Err(ClientError::ConnectionFailed(format!("{address}: {e}")));
            }
        };
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!("Could not set TCP_NODELAY: {e}");
        }

        let (reader, writer) = stream.into_split();
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (in_tx, mut in_rx) = mpsc::unbounded_channel();

        tokio::spawn(write_loop(writer, out_rx, settings.frame.clone()));
        let reader = tokio::spawn(read_loop(
            reader,
            in_tx,
            Arc::clone(&state),
            settings.frame.clone(),
        ));

        let _ = out_tx.send(ClientMessage::Join(JoinRequest {
            name: player_name.to_string(),
            skin,
        }));

        let mut pending = VecDeque::new();
        let player_id = loop {
            match in_rx.recv().await {
                Some(ServerMessage::Welcome { player_id }) => break player_id,
                Some(other) => pending.push_back(other),
                None => {
                    reader.abort();
                    state.set(ConnectionState::Disconnected);
                    return Err(ClientError::ConnectionFailed(format!(
                        "{address} closed the connection before welcome"
                    )));
                }
            }
        };
        // Report "Connected as …" on the first poll.
        pending.push_front(ServerMessage::Welcome { player_id });

        state.set(ConnectionState::Connected);
        tracing::info!("Connected to {address} as player {player_id}");

        Ok(Self {
            player_id,
            player_name: player_name.to_string(),
            state,
            outbound: Some(out_tx),
            inbound: in_rx,
            pending,
            reader,
            throttle: PublishThrottle::new(settings.publish_interval),
            walk_speed_threshold: settings.walk_speed_threshold,
            remotes: RemoteEntityStore::new(settings.interpolation_factor),
            lost_reported: false,
        })
    }

    /// [`connect`](Self::connect) using the relay address, player name and
    /// tuning from `config`.
    pub async fn connect_with_config(
        config: &ClientConfig,
        skin: Skin,
    ) -> Result<Self, ClientError> {
        Self::connect(
            &config.server_address,
            &config.player_name,
            skin,
            NetworkSettings::from(config),
        )
        .await
    }

    pub fn player_id(&self) -> PlayerId {
        self.player_id
    }

    pub fn player_name(&self) -> &str {
        &self.player_name
    }

    pub fn state(&self) -> &Arc<ConnectionStateWatch> {
        &self.state
    }

    pub fn is_connected(&self) -> bool {
        self.outbound.is_some() && self.state.is_connected()
    }

    /// Read-only view for rendering.
    pub fn remote_players(&self) -> &RemoteEntityStore {
        &self.remotes
    }

    /// Send `leave` if still connected and release the transport. Calling it
    /// again is a no-op.
    pub fn disconnect(&mut self) {
        if let Some(outbound) = self.outbound.take() {
            if self.state.is_connected() {
                let _ = outbound.send(ClientMessage::Leave);
            }
            // Dropping the sender lets the writer flush `leave` and close.
            drop(outbound);
            self.reader.abort();
            self.state.set(ConnectionState::Disconnected);
            self.remotes.clear();
            tracing::info!("Disconnected from relay");
        }
    }

    /// Publish the local player's state if the throttle allows. Call every
    /// simulation tick. Returns whether a `position` message was sent.
    pub fn update(&mut self, now: Instant, local: &LocalPlayer) -> bool {
        if !self.is_connected() || !self.throttle.ready(now) {
            return false;
        }
        self.send(ClientMessage::Position(
            local.to_state(self.walk_speed_threshold),
        ))
    }

    /// Report a block edit. Dropped when offline; nothing is queued.
    pub fn send_block_edit(&self, position: BlockPos, block_type: BlockType) -> bool {
        self.send(ClientMessage::BlockUpdate(BlockChange {
            position,
            block_type,
        }))
    }

    /// Dropped when offline.
    pub fn send_chat(&self, message: &str) -> bool {
        self.send(ClientMessage::Chat {
            message: message.to_string(),
        })
    }

    /// Apply every relay message received since the last call. Returns how
    /// many were handled.
    pub fn poll<E: ClientEvents + ?Sized>(&mut self, events: &mut E) -> usize {
        let mut handled = 0;
        while let Some(msg) = self.pending.pop_front() {
            self.dispatch(msg, events);
            handled += 1;
        }

        loop {
            match self.inbound.try_recv() {
                Ok(msg) => {
                    self.dispatch(msg, events);
                    handled += 1;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.on_connection_lost(events);
                    break;
                }
            }
        }
        handled
    }

    /// Advance remote player smoothing by one frame.
    pub fn interpolate(&mut self) {
        self.remotes.interpolate();
    }

    fn send(&self, msg: ClientMessage) -> bool {
        if !self.is_connected() {
            return false;
        }
        self.outbound
            .as_ref()
            .is_some_and(|outbound| outbound.send(msg).is_ok())
    }

    fn dispatch<E: ClientEvents + ?Sized>(&mut self, msg: ServerMessage, events: &mut E) {
        tracing::trace!("Relay -> {}", msg.kind());
        match msg {
            ServerMessage::Welcome { player_id } => {
                self.player_id = player_id;
                events.on_system_message(&format!("Connected as {}", self.player_name));
            }
            ServerMessage::PlayersList { players } => {
                for player in players {
                    if player.id != self.player_id {
                        self.remotes.spawn(player);
                    }
                }
            }
            ServerMessage::PlayerJoin { player } => {
                if player.id == self.player_id {
                    return;
                }
                let notice = format!("{} joined the game", player.name);
                if self.remotes.spawn(player) {
                    events.on_system_message(&notice);
                }
            }
            ServerMessage::PlayerLeave {
                player_id,
                player_name,
            } => {
                self.remotes.despawn(player_id);
                events.on_system_message(&format!("{player_name} left the game"));
            }
            ServerMessage::PlayerUpdate { player_id, data } => {
                self.remotes.apply_update(player_id, &data);
            }
            ServerMessage::BlockUpdate(change) => events.on_block_update(change),
            ServerMessage::Chat {
                player_id,
                player_name,
                message,
            } => events.on_chat(player_id, &player_name, &message),
            ServerMessage::WorldData { data } => events.on_world_replay(&data.changes),
        }
    }

    fn on_connection_lost<E: ClientEvents + ?Sized>(&mut self, events: &mut E) {
        if self.lost_reported {
            return;
        }
        self.lost_reported = true;
        self.outbound = None;
        self.state.set(ConnectionState::Disconnected);
        self.remotes.clear();
        tracing::info!("Relay connection lost");
        events.on_system_message("Disconnected from server");
    }
}

impl Drop for NetworkManager {
    fn drop(&mut self) {
        self.disconnect();
    }
}

async fn read_loop(
    mut reader: OwnedReadHalf,
    inbound: mpsc::UnboundedSender<ServerMessage>,
    state: Arc<ConnectionStateWatch>,
    config: FrameConfig,
) {
    loop {
        match read_message::<ServerMessage, _>(&mut reader, &config).await {
            Ok(msg) => {
                if inbound.send(msg).is_err() {
                    break;
                }
            }
            Err(ReadError::Malformed(e)) => {
                tracing::debug!("Ignoring unrecognised relay message: {e}");
            }
            Err(ReadError::Transport(e)) => {
                tracing::debug!("Relay connection ended: {e}");
                break;
            }
        }
    }
    state.set(ConnectionState::Disconnected);
}

async fn write_loop(
    mut writer: OwnedWriteHalf,
    mut outbound: mpsc::UnboundedReceiver<ClientMessage>,
    config: FrameConfig,
) {
    while let Some(msg) = outbound.recv().await {
        if let Err(e) = write_message(&mut writer, &msg, &config).await {
            tracing::debug!("Write to relay failed: {e}");
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ClientEvent;
    use blockwire_net::{
        AnimationState, PlayerInfo, PlayerState, Rotation, Vector3, WorldData, write_frame,
    };
    use glam::DVec3;
    use std::net::SocketAddr;
    use tokio::net::TcpListener;

    /// A hand-driven relay stand-in: accepts one client and hands back the
    /// stream after reading its `join`.
    async fn fake_relay() -> (SocketAddr, JoinHandle<(TcpStream, JoinRequest)>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accept = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let msg: ClientMessage = read_message(&mut stream, &FrameConfig::default())
                .await
                .unwrap();
            let ClientMessage::Join(join) = msg else {
                panic!("expected join, got {msg:?}");
            };
            (stream, join)
        });
        (addr, accept)
    }

    async fn send(stream: &mut TcpStream, msg: ServerMessage) {
        write_message(stream, &msg, &FrameConfig::default())
            .await
            .unwrap();
    }

    async fn recv(stream: &mut TcpStream) -> ClientMessage {
        read_message(stream, &FrameConfig::default()).await.unwrap()
    }

    fn roster_entry(id: u64, name: &str) -> PlayerInfo {
        PlayerInfo {
            id: PlayerId(id),
            name: name.to_string(),
            skin: Skin::default(),
            position: Vector3::new(0.0, 70.0, 0.0),
            rotation: Rotation::default(),
        }
    }

    async fn connected() -> (NetworkManager, TcpStream) {
        let (addr, accept) = fake_relay().await;
        let relay = tokio::spawn(async move {
            let (mut stream, _) = accept.await.unwrap();
            send(&mut stream, ServerMessage::Welcome { player_id: PlayerId(3) }).await;
            send(&mut stream, ServerMessage::PlayersList { players: vec![] }).await;
            stream
        });
        let client = NetworkManager::connect(
            &addr.to_string(),
            "Steve",
            Skin::default(),
            NetworkSettings::default(),
        )
        .await
        .unwrap();
        (client, relay.await.unwrap())
    }

    /// Poll until `n` messages have been handled or a second passes.
    async fn poll_until(client: &mut NetworkManager, events: &mut Vec<ClientEvent>, n: usize) {
        let deadline = Instant::now() + Duration::from_secs(1);
        let mut handled = 0;
        while handled < n && Instant::now() < deadline {
            handled += client.poll(events);
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[tokio::test]
    async fn test_connect_sends_join_and_waits_for_welcome() {
        let (addr, accept) = fake_relay().await;
        let relay = tokio::spawn(async move {
            let (mut stream, join) = accept.await.unwrap();
            // Delay so a premature return would be observable.
            tokio::time::sleep(Duration::from_millis(50)).await;
            send(&mut stream, ServerMessage::Welcome { player_id: PlayerId(7) }).await;
            (stream, join)
        });

        let mut skin = Skin::default();
        skin.0.insert("shirtColor".into(), serde_json::json!("#00aaff"));
        let client = NetworkManager::connect(
            &addr.to_string(),
            "Steve",
            skin.clone(),
            NetworkSettings::default(),
        )
        .await
        .unwrap();

        assert_eq!(client.player_id(), PlayerId(7));
        assert!(client.is_connected());
        let (_stream, join) = relay.await.unwrap();
        assert_eq!(join.name, "Steve");
        assert_eq!(join.skin, skin);
    }

    #[tokio::test]
    async fn test_connect_refused_is_connection_failed() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = NetworkManager::connect(
            &addr.to_string(),
            "Steve",
            Skin::default(),
            NetworkSettings::default(),
        )
        .await;
        assert!(matches!(result, Err(ClientError::ConnectionFailed(_))));
    }

    #[tokio::test]
    async fn test_close_before_welcome_is_connection_failed() {
        let (addr, accept) = fake_relay().await;
        tokio::spawn(async move {
            let (stream, _) = accept.await.unwrap();
            drop(stream);
        });

        let result = NetworkManager::connect(
            &addr.to_string(),
            "Steve",
            Skin::default(),
            NetworkSettings::default(),
        )
        .await;
        assert!(matches!(result, Err(ClientError::ConnectionFailed(_))));
    }

    #[tokio::test]
    async fn test_invalid_address_is_connection_failed() {
        let result = NetworkManager::connect(
            "host:nope",
            "Steve",
            Skin::default(),
            NetworkSettings::default(),
        )
        .await;
        let Err(ClientError::ConnectionFailed(reason)) = result else {
            panic!("expected connection failure");
        };
        assert!(reason.contains("host:nope"));
    }

    #[tokio::test]
    async fn test_connect_with_config_uses_address_and_name() {
        let (addr, accept) = fake_relay().await;
        let relay = tokio::spawn(async move {
            let (mut stream, join) = accept.await.unwrap();
            send(&mut stream, ServerMessage::Welcome { player_id: PlayerId(5) }).await;
            (stream, join)
        });

        let config = ClientConfig {
            server_address: addr.to_string(),
            player_name: "Alex".into(),
            ..ClientConfig::default()
        };
        let client = NetworkManager::connect_with_config(&config, Skin::default())
            .await
            .unwrap();

        assert_eq!(client.player_id(), PlayerId(5));
        assert_eq!(client.player_name(), "Alex");
        let (_stream, join) = relay.await.unwrap();
        assert_eq!(join.name, "Alex");
    }

    #[tokio::test]
    async fn test_first_poll_reports_connected() {
        let (mut client, _relay) = connected().await;
        let mut events = Vec::new();
        poll_until(&mut client, &mut events, 2).await;
        assert_eq!(
            events.first(),
            Some(&ClientEvent::System("Connected as Steve".into()))
        );
    }

    #[tokio::test]
    async fn test_roster_and_join_create_entities_except_self() {
        let (mut client, mut relay) = connected().await;
        send(
            &mut relay,
            ServerMessage::PlayersList {
                players: vec![roster_entry(1, "Alex"), roster_entry(3, "Steve")],
            },
        )
        .await;
        send(
            &mut relay,
            ServerMessage::PlayerJoin {
                player: roster_entry(4, "Notch"),
            },
        )
        .await;
        send(
            &mut relay,
            ServerMessage::PlayerJoin {
                player: roster_entry(3, "Steve"),
            },
        )
        .await;

        let mut events = Vec::new();
        poll_until(&mut client, &mut events, 5).await;

        let ids: Vec<_> = client.remote_players().iter().map(|e| e.id()).collect();
        assert_eq!(ids, vec![PlayerId(1), PlayerId(4)]);
        assert!(events.contains(&ClientEvent::System("Notch joined the game".into())));
    }

    #[tokio::test]
    async fn test_repeated_join_notice_is_reported_once() {
        let (mut client, mut relay) = connected().await;
        send(
            &mut relay,
            ServerMessage::PlayersList {
                players: vec![roster_entry(1, "Alex")],
            },
        )
        .await;
        for _ in 0..2 {
            send(
                &mut relay,
                ServerMessage::PlayerJoin {
                    player: roster_entry(1, "Alex"),
                },
            )
            .await;
        }
        send(
            &mut relay,
            ServerMessage::PlayerJoin {
                player: roster_entry(4, "Notch"),
            },
        )
        .await;

        let mut events = Vec::new();
        poll_until(&mut client, &mut events, 6).await;

        assert_eq!(client.remote_players().len(), 2);
        let alex_notices = events
            .iter()
            .filter(|e| **e == ClientEvent::System("Alex joined the game".into()))
            .count();
        assert_eq!(alex_notices, 0);
        assert!(events.contains(&ClientEvent::System("Notch joined the game".into())));
    }

    #[tokio::test]
    async fn test_update_then_leave() {
        let (mut client, mut relay) = connected().await;
        send(
            &mut relay,
            ServerMessage::PlayerJoin {
                player: roster_entry(1, "Alex"),
            },
        )
        .await;
        send(
            &mut relay,
            ServerMessage::PlayerUpdate {
                player_id: PlayerId(1),
                data: PlayerState {
                    position: Vector3::new(10.0, 70.0, 0.0),
                    animation: AnimationState::Sprint,
                    ..PlayerState::default()
                },
            },
        )
        .await;

        let mut events = Vec::new();
        poll_until(&mut client, &mut events, 4).await;

        let alex = client.remote_players().get(PlayerId(1)).unwrap();
        assert_eq!(alex.position().x, 0.0);
        assert_eq!(alex.target_position().x, 10.0);
        assert_eq!(alex.animation(), AnimationState::Sprint);

        client.interpolate();
        let alex = client.remote_players().get(PlayerId(1)).unwrap();
        assert!((alex.position().x - 2.0).abs() < 1e-12);

        send(
            &mut relay,
            ServerMessage::PlayerLeave {
                player_id: PlayerId(1),
                player_name: "Alex".into(),
            },
        )
        .await;
        poll_until(&mut client, &mut events, 1).await;
        assert!(client.remote_players().is_empty());
        assert!(events.contains(&ClientEvent::System("Alex left the game".into())));
    }

    #[tokio::test]
    async fn test_world_and_chat_go_to_collaborators() {
        let (mut client, mut relay) = connected().await;
        let change = BlockChange {
            position: BlockPos::new(5, 64, 5),
            block_type: BlockType::AIR,
        };
        send(
            &mut relay,
            ServerMessage::WorldData {
                data: WorldData {
                    changes: vec![change],
                },
            },
        )
        .await;
        send(
            &mut relay,
            ServerMessage::Chat {
                player_id: PlayerId(1),
                player_name: "Alex".into(),
                message: "hi".into(),
            },
        )
        .await;

        let mut events = Vec::new();
        poll_until(&mut client, &mut events, 4).await;
        assert!(events.contains(&ClientEvent::BlockUpdate(change)));
        assert!(events.contains(&ClientEvent::Chat {
            player_id: PlayerId(1),
            player_name: "Alex".into(),
            message: "hi".into(),
        }));
    }

    #[tokio::test]
    async fn test_unknown_message_type_is_ignored() {
        let (mut client, mut relay) = connected().await;
        write_frame(
            &mut relay,
            br#"{"type":"weather","rain":true}"#,
            &FrameConfig::default(),
        )
        .await
        .unwrap();
        send(
            &mut relay,
            ServerMessage::PlayerJoin {
                player: roster_entry(1, "Alex"),
            },
        )
        .await;

        let mut events = Vec::new();
        poll_until(&mut client, &mut events, 3).await;
        assert!(client.is_connected());
        assert_eq!(client.remote_players().len(), 1);
    }

    #[tokio::test]
    async fn test_update_is_rate_limited() {
        let (mut client, mut relay) = connected().await;
        let local = LocalPlayer {
            position: DVec3::new(1.0, 70.0, 1.0),
            on_ground: true,
            ..LocalPlayer::default()
        };

        let start = Instant::now();
        assert!(client.update(start, &local));
        assert!(!client.update(start + Duration::from_millis(16), &local));
        assert!(!client.update(start + Duration::from_millis(32), &local));
        assert!(client.update(start + Duration::from_millis(50), &local));

        for _ in 0..2 {
            let ClientMessage::Position(state) = recv(&mut relay).await else {
                panic!("expected position");
            };
            assert_eq!(state.position, Vector3::new(1.0, 70.0, 1.0));
            assert_eq!(state.animation, AnimationState::Idle);
        }
    }

    #[tokio::test]
    async fn test_sends_pass_through_while_connected() {
        let (client, mut relay) = connected().await;
        assert!(client.send_block_edit(BlockPos::new(1, 2, 3), BlockType(9)));
        assert!(client.send_chat("hello"));

        assert_eq!(
            recv(&mut relay).await,
            ClientMessage::BlockUpdate(BlockChange {
                position: BlockPos::new(1, 2, 3),
                block_type: BlockType(9),
            })
        );
        assert_eq!(
            recv(&mut relay).await,
            ClientMessage::Chat {
                message: "hello".into()
            }
        );
    }

    #[tokio::test]
    async fn test_disconnect_sends_leave_once_and_goes_offline() {
        let (mut client, mut relay) = connected().await;
        client.disconnect();
        client.disconnect();

        assert!(!client.is_connected());
        assert!(!client.send_chat("anyone?"));
        assert!(!client.send_block_edit(BlockPos::new(0, 0, 0), BlockType(1)));
        assert!(!client.update(Instant::now(), &LocalPlayer::default()));

        assert_eq!(recv(&mut relay).await, ClientMessage::Leave);
        let next = read_message::<ClientMessage, _>(&mut relay, &FrameConfig::default()).await;
        assert!(next.is_err(), "transport should be closed after leave");
    }

    #[tokio::test]
    async fn test_relay_hangup_is_detected_passively() {
        let (mut client, relay) = connected().await;
        let mut events = Vec::new();
        poll_until(&mut client, &mut events, 2).await;
        drop(relay);

        let notice = ClientEvent::System("Disconnected from server".into());
        let deadline = Instant::now() + Duration::from_secs(1);
        while !events.contains(&notice) && Instant::now() < deadline {
            client.poll(&mut events);
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        client.poll(&mut events);

        assert!(!client.is_connected());
        assert_eq!(client.state().current(), ConnectionState::Disconnected);
        let notices = events.iter().filter(|e| **e == notice).count();
        assert_eq!(notices, 1);
    }

    #[test]
    fn test_settings_from_config() {
        let config = ClientConfig {
            publish_interval_ms: 100,
            interpolation_factor: 0.5,
            ..ClientConfig::default()
        };
        let settings = NetworkSettings::from(&config);
        assert_eq!(settings.publish_interval, Duration::from_millis(100));
        assert_eq!(settings.interpolation_factor, 0.5);
    }
}
