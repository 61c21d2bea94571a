use crate::broadcaster::Broadcaster;
use crate::message::WireEvent;
use async_trait::async_trait;
use events::{DomainEvent, EventHandler};
use std::sync::Arc;

/// Bridges domain events onto the subscriber fan-out: each event is reshaped
/// into its wire form and handed to the broadcaster.
pub struct NotificationEventHandler {
    broadcaster: Arc<Broadcaster>,
}

impl NotificationEventHandler {
    pub fn new(broadcaster: Arc<Broadcaster>) -> Self {
        Self { broadcaster }
    }
}

#[async_trait]
impl EventHandler for NotificationEventHandler {
    async fn handle(&self, event: &DomainEvent) {
        let wire_event = match event {
            DomainEvent::IncidentCreated { incident, category } => WireEvent::IncidentCreated {
                category: category.clone(),
                incident: incident.clone(),
            },
            DomainEvent::IncidentStatusUpdated {
                incident_id,
                previous_status,
                new_status,
                updated_by,
                category,
            } => WireEvent::IncidentUpdated {
                incident_id: incident_id.clone(),
                previous_status: previous_status.clone(),
                new_status: new_status.clone(),
                updated_by: updated_by.clone(),
                category: category.clone(),
            },
        };

        self.broadcaster.broadcast(&wire_event).await;
    }
}
