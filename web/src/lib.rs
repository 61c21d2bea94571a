//! HTTP and WebSocket surface of the incident platform. Controllers stay
//! thin: they extract, call into `domain`, and translate the outcome into a
//! response through `web::Error`.

use events::EventPublisher;
use service::config::Config;
use std::sync::Arc;
use std::time::Duration;
use store::{ConnectionStoreRef, IncidentStoreRef, UserStoreRef};
use ws::{Broadcaster, ChannelTransport, ConnectionRegistry, NotificationEventHandler};

mod controller;
mod error;
mod extractors;
mod notifications;
pub mod router;

pub use error::{Error, Result};

/// Shared application state handed to every handler via `Router::with_state`.
/// Needs to implement Clone to be able to be passed into Router as State.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub user_store: UserStoreRef,
    pub incident_store: IncidentStoreRef,
    pub registry: Arc<ConnectionRegistry>,
    pub live_transport: Arc<ChannelTransport>,
    pub event_publisher: EventPublisher,
}

impl AppState {
    /// Wires the notification pipeline: registry and live transport feed a
    /// broadcaster, which is registered as an event handler so domain writes
    /// fan out to subscribers without the domain knowing about sockets.
    pub fn new(
        config: Config,
        user_store: UserStoreRef,
        incident_store: IncidentStoreRef,
        connection_store: ConnectionStoreRef,
    ) -> Self {
        let registry = Arc::new(ConnectionRegistry::new(
            connection_store,
            config.connection_ttl_secs,
        ));
        let live_transport = Arc::new(ChannelTransport::new());
        let broadcaster = Arc::new(Broadcaster::new(
            registry.clone(),
            live_transport.clone(),
            config.broadcast_concurrency,
            Duration::from_millis(config.delivery_timeout_ms),
        ));
        let event_publisher =
            EventPublisher::new().with_handler(Arc::new(NotificationEventHandler::new(broadcaster)));

        Self {
            config,
            user_store,
            incident_store,
            registry,
            live_transport,
            event_publisher,
        }
    }
}
