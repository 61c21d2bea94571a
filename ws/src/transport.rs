use async_trait::async_trait;
use dashmap::DashMap;
use std::error::Error as StdError;
use std::fmt;
use tokio::sync::mpsc::UnboundedSender;

/// Outcome of a failed point-to-point delivery. `Gone` is the only terminal
/// signal: it proves the peer endpoint no longer exists and licenses
/// eviction. Everything else leaves the registry entry intact.
#[derive(Debug)]
pub enum DeliveryError {
    Gone,
    Other(String),
}

impl fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DeliveryError::Gone => write!(f, "peer endpoint is gone"),
            DeliveryError::Other(reason) => write!(f, "delivery failed: {reason}"),
        }
    }
}

impl StdError for DeliveryError {}

/// Point-to-point delivery of a serialized event to one subscriber channel.
#[async_trait]
pub trait DeliveryTransport: Send + Sync {
    async fn deliver(&self, connection_id: &str, payload: &str) -> Result<(), DeliveryError>;
}

/// Live transport backed by per-connection channels - O(1) sender lookup.
///
/// The socket handler attaches a sender when a subscriber connects and
/// detaches it when the socket closes. A delivery to a connection with no
/// attached (or closed) channel reports `Gone`, which is how registry entries
/// that outlived their socket get pruned.
#[derive(Default)]
pub struct ChannelTransport {
    senders: DashMap<String, UnboundedSender<String>>,
}

impl ChannelTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&self, connection_id: &str, sender: UnboundedSender<String>) {
        self.senders.insert(connection_id.to_string(), sender);
    }

    pub fn detach(&self, connection_id: &str) {
        self.senders.remove(connection_id);
    }
}

#[async_trait]
impl DeliveryTransport for ChannelTransport {
    async fn deliver(&self, connection_id: &str, payload: &str) -> Result<(), DeliveryError> {
        match self.senders.get(connection_id) {
            Some(sender) => sender
                .send(payload.to_string())
                .map_err(|_| DeliveryError::Gone),
            None => Err(DeliveryError::Gone),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_deliver_reaches_an_attached_channel() {
        let transport = ChannelTransport::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        transport.attach("c-1", tx);

        transport.deliver("c-1", "payload").await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), "payload");
    }

    #[tokio::test]
    async fn test_unattached_or_closed_channels_report_gone() {
        let transport = ChannelTransport::new();
        assert!(matches!(
            transport.deliver("c-missing", "payload").await,
            Err(DeliveryError::Gone)
        ));

        let (tx, rx) = mpsc::unbounded_channel();
        transport.attach("c-1", tx);
        drop(rx);
        assert!(matches!(
            transport.deliver("c-1", "payload").await,
            Err(DeliveryError::Gone)
        ));
    }
}
