//! Effects of relay messages that belong to collaborators outside the
//! multiplayer layer: the voxel world and the chat/notice UI.

use blockwire_net::{BlockChange, PlayerId};

/// Receiver for non-entity effects of inbound relay messages.
///
/// Every method defaults to doing nothing.
pub trait ClientEvents {
    /// A block changed, including edits this client made itself.
    fn on_block_update(&mut self, _change: BlockChange) {}

    /// The relay's edit log on join, oldest first.
    fn on_world_replay(&mut self, changes: &[BlockChange]) {
        for change in changes {
            self.on_block_update(*change);
        }
    }

    fn on_chat(&mut self, _player_id: PlayerId, _player_name: &str, _message: &str) {}

    /// Status line such as "Alex joined the game".
    fn on_system_message(&mut self, _text: &str) {}
}

impl ClientEvents for () {}

/// Owned record of one effect, for consumers that prefer to drain a queue.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    BlockUpdate(BlockChange),
    Chat {
        player_id: PlayerId,
        player_name: String,
        message: String,
    },
    System(String),
}

impl ClientEvents for Vec<ClientEvent> {
    fn on_block_update(&mut self, change: BlockChange) {
        self.push(ClientEvent::BlockUpdate(change));
    }

    fn on_chat(&mut self, player_id: PlayerId, player_name: &str, message: &str) {
        self.push(ClientEvent::Chat {
            player_id,
            player_name: player_name.to_string(),
            message: message.to_string(),
        });
    }

    fn on_system_message(&mut self, text: &str) {
        self.push(ClientEvent::System(text.to_string()));
    }
}
