use crate::connection::ConnectionRegistry;
use crate::message::WireEvent;
use crate::transport::{DeliveryError, DeliveryTransport};
use futures::StreamExt;
use log::*;
use std::sync::Arc;
use std::time::Duration;
use store::connections::Model as Connection;
use store::users::Role;

/// Fans a domain event out to every matching registry entry.
///
/// Deliveries run as independent tasks with bounded concurrency so latency
/// stays flat as the subscriber count grows; a partial failure never aborts
/// sibling deliveries, and each attempt is time-bounded so a hung peer cannot
/// stall the rest of the fan-out. At most one attempt per event per
/// connection - there are no retries within a broadcast.
pub struct Broadcaster {
    registry: Arc<ConnectionRegistry>,
    transport: Arc<dyn DeliveryTransport>,
    concurrency: usize,
    delivery_timeout: Duration,
}

impl Broadcaster {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        transport: Arc<dyn DeliveryTransport>,
        concurrency: usize,
        delivery_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            transport,
            concurrency,
            delivery_timeout,
        }
    }

    /// Broadcast never fails its caller: every error path is contained here
    /// and reported through logs only.
    pub async fn broadcast(&self, event: &WireEvent) {
        let payload = match serde_json::to_string(event) {
            Ok(payload) => payload,
            Err(err) => {
                error!("Failed to serialize broadcast event: {err}");
                return;
            }
        };

        let connections = match self.registry.list_all().await {
            Ok(connections) => connections,
            Err(err) => {
                error!("Failed to load connection snapshot: {err}");
                return;
            }
        };

        let category = event.category();
        let recipients: Vec<Connection> = connections
            .into_iter()
            .filter(|connection| Self::should_receive(connection, category))
            .collect();

        debug!(
            "Broadcasting {} to {} connection(s)",
            category,
            recipients.len()
        );

        futures::stream::iter(recipients)
            .for_each_concurrent(self.concurrency, |connection| {
                let payload = payload.clone();
                async move {
                    self.deliver_one(connection, &payload).await;
                }
            })
            .await;
    }

    /// Department-scoped workers only see their own department's events;
    /// unscoped roles always receive.
    fn should_receive(connection: &Connection, category: &str) -> bool {
        connection.role != Role::Worker || connection.department == category
    }

    async fn deliver_one(&self, connection: Connection, payload: &str) {
        let connection_id = connection.connection_id;
        let attempt = self.transport.deliver(&connection_id, payload);

        match tokio::time::timeout(self.delivery_timeout, attempt).await {
            Ok(Ok(())) => {}
            Ok(Err(DeliveryError::Gone)) => {
                info!("Deleting stale connection {connection_id}");
                if let Err(err) = self.registry.remove(&connection_id).await {
                    warn!("Failed to remove stale connection {connection_id}: {err}");
                }
            }
            Ok(Err(err)) => {
                // Non-terminal failure: the entry stays; the peer may recover.
                warn!("Broadcast delivery to {connection_id} failed: {err}");
            }
            Err(_) => {
                // A timeout does not prove the peer is gone, so no eviction.
                warn!("Broadcast delivery to {connection_id} timed out");
            }
        }
    }
}
