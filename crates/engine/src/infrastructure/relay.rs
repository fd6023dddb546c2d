//! In-process message relay over a bounded tokio channel.

use async_trait::async_trait;
use shadowdark_domain::UserId;
use shadowdark_shared::{RelayEnvelope, RelayMessage};
use tokio::sync::mpsc;

use crate::infrastructure::ports::{MessageRelayPort, RelayError};

pub const DEFAULT_RELAY_CAPACITY: usize = 64;

/// Publishes relay messages onto an mpsc channel read by the authoritative
/// process. Sends never wait: a full channel drops the message.
pub struct ChannelRelay {
    sender: mpsc::Sender<RelayEnvelope>,
    user: Option<UserId>,
}

impl ChannelRelay {
    /// Create a relay and the receiving end of its channel.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<RelayEnvelope>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self { sender, user: None }, receiver)
    }

    /// A relay publishing on an existing channel on behalf of `user`.
    pub fn for_user(sender: mpsc::Sender<RelayEnvelope>, user: Option<UserId>) -> Self {
        Self { sender, user }
    }
}

#[async_trait]
impl MessageRelayPort for ChannelRelay {
    async fn send(&self, message: RelayMessage) -> Result<(), RelayError> {
        let type_name = message.type_name();
        let envelope = RelayEnvelope::new(self.user.map(UserId::to_uuid), message);

        match self.sender.try_send(envelope) {
            Ok(()) => {
                tracing::debug!(message_type = type_name, "Relayed message");
                Ok(())
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(message_type = type_name, "Relay full, message dropped");
                Err(RelayError::Full)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::warn!(message_type = type_name, "Relay closed, message dropped");
                Err(RelayError::Closed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shadowdark_shared::RELAY_CHANNEL;
    use uuid::Uuid;

    #[tokio::test]
    async fn wraps_messages_in_system_channel_envelope() {
        let (sender, mut receiver) = mpsc::channel(4);
        let user = UserId::new();
        let relay = ChannelRelay::for_user(sender, Some(user));
        let message = RelayMessage::ToggleLightSource {
            actor_id: Uuid::new_v4(),
            item_id: Uuid::new_v4(),
        };

        relay.send(message.clone()).await.expect("sent");

        let envelope = receiver.recv().await.expect("delivered");
        assert_eq!(envelope.channel, RELAY_CHANNEL);
        assert_eq!(envelope.sender, Some(user.to_uuid()));
        assert_eq!(envelope.message, message);
    }

    #[tokio::test]
    async fn full_channel_drops_instead_of_waiting() {
        let (relay, _receiver) = ChannelRelay::channel(1);
        relay.send(RelayMessage::Unknown).await.expect("first fits");
        assert!(matches!(
            relay.send(RelayMessage::Unknown).await,
            Err(RelayError::Full)
        ));
    }

    #[tokio::test]
    async fn closed_channel_reports_closed() {
        let (relay, receiver) = ChannelRelay::channel(1);
        drop(receiver);
        assert!(matches!(
            relay.send(RelayMessage::Unknown).await,
            Err(RelayError::Closed)
        ));
    }
}
