//! Event system infrastructure for the incident platform.
//!
//! This crate provides the event system that enables loose coupling between
//! domain logic and infrastructure concerns (like WebSocket notifications).
//!
//! # Architecture
//!
//! - **DomainEvent**: Enum representing all business events in the system
//! - **EventHandler**: Trait for implementing event handlers
//! - **EventPublisher**: Publishes events to registered handlers
//!
//! This crate has no dependencies on internal crates (store, domain, etc.),
//! avoiding circular dependencies. Entity data is carried as serialized JSON
//! values and statuses/roles as plain strings.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Domain events that represent business-level changes in the system.
/// These events are emitted after a domain write commits successfully.
///
/// Events carry the incident `category`, which the notification layer matches
/// against each subscriber's department scope. Who actually receives an event
/// is the broadcaster's concern, not the domain's.
#[derive(Debug, Clone)]
pub enum DomainEvent {
    /// Emitted when a new incident is created.
    IncidentCreated {
        /// Complete serialized incident record, sent to subscribers as-is.
        incident: Value,
        /// Incident category, matched against worker department scopes.
        category: String,
    },
    /// Emitted when an incident status transition is accepted and stored.
    IncidentStatusUpdated {
        incident_id: String,
        previous_status: String,
        new_status: String,
        /// The principal whose request caused the transition.
        updated_by: String,
        /// Incident category, matched against worker department scopes.
        category: String,
    },
}

/// Trait for handling domain events.
/// Implementations can perform side effects like sending notifications,
/// updating caches, logging, etc.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &DomainEvent);
}

/// Publishes domain events to registered handlers.
/// Handlers are called sequentially in registration order.
#[derive(Clone)]
pub struct EventPublisher {
    handlers: Arc<Vec<Arc<dyn EventHandler>>>,
}

impl EventPublisher {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(Vec::new()),
        }
    }

    /// Register a new event handler.
    /// Note: This creates a new publisher instance with the additional handler.
    /// Store the returned publisher in your application state.
    pub fn with_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        let mut handlers = (*self.handlers).clone();
        handlers.push(handler);
        self.handlers = Arc::new(handlers);
        self
    }

    /// Publish an event to all registered handlers.
    /// Handlers run sequentially; a failing handler never affects the caller
    /// of the write that produced the event.
    pub async fn publish(&self, event: DomainEvent) {
        for handler in self.handlers.iter() {
            handler.handle(&event).await;
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}
