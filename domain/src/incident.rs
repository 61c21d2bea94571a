//! Incident operations: create, list, and status updates.
//!
//! Each operation validates against the state machine and writes through the
//! opaque store boundary. Notification is best-effort: events are published
//! from a spawned task after the write commits, and a publication failure is
//! observable only in logs, never in the operation's return value.

use crate::error::{invalid, not_found, Error};
use crate::status::{self, Principal};
use chrono::Utc;
use events::{DomainEvent, EventPublisher};
use log::debug;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use store::incidents::{IncidentStatus, Model as Incident};
use store::IncidentStoreRef;
use utoipa::ToSchema;

pub const ALLOWED_CATEGORIES: &[&str] =
    &["Limpieza", "infraestructura", "TI", "Seguridad", "Emergencia"];
pub const ALLOWED_URGENCY: &[&str] = &["low", "medium", "high"];

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewIncident {
    pub category: String,
    pub urgency: Option<String>,
    pub place: String,
    pub description: String,
}

/// The outcome of an accepted status transition, echoed back to the caller.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub incident_id: String,
    pub previous_status: IncidentStatus,
    pub new_status: IncidentStatus,
}

/// Creates a new incident owned by `principal`, starting in `reported`.
pub async fn create(
    incident_store: &IncidentStoreRef,
    publisher: &EventPublisher,
    principal: &Principal,
    params: NewIncident,
) -> Result<Incident, Error> {
    if !ALLOWED_CATEGORIES.contains(&params.category.as_str()) {
        return Err(invalid(format!(
            "category must be one of: {}",
            ALLOWED_CATEGORIES.join(", ")
        )));
    }
    if let Some(urgency) = params.urgency.as_deref() {
        if !ALLOWED_URGENCY.contains(&urgency) {
            return Err(invalid(format!(
                "urgency must be one of: {}",
                ALLOWED_URGENCY.join(", ")
            )));
        }
    }
    let place = params.place.trim();
    if place.is_empty() {
        return Err(invalid("place is required and must be a non-empty string"));
    }
    let description = params.description.trim();
    if description.is_empty() {
        return Err(invalid(
            "description is required and must be a non-empty string",
        ));
    }

    let incident = Incident {
        incident_id: generate_incident_id(),
        created_at: Utc::now(),
        created_by: principal.user_id.clone(),
        category: params.category,
        status: IncidentStatus::Reported,
        urgency: params.urgency,
        place: place.to_string(),
        description: description.to_string(),
        solved_by: None,
        solved_at: None,
    };

    // The conditional insert turns an id collision into a Conflict instead of
    // a silent overwrite.
    let incident = incident_store.insert_new(incident).await?;
    debug!("Created incident {}", incident.incident_id);

    let event = DomainEvent::IncidentCreated {
        incident: serde_json::to_value(&incident)?,
        category: incident.category.clone(),
    };
    spawn_publish(publisher, event);

    Ok(incident)
}

/// Full snapshot of stored incidents.
pub async fn list(incident_store: &IncidentStoreRef) -> Result<Vec<Incident>, Error> {
    Ok(incident_store.scan().await?)
}

/// Runs a requested transition through the state machine and commits it.
pub async fn update_status(
    incident_store: &IncidentStoreRef,
    publisher: &EventPublisher,
    principal: &Principal,
    incident_id: &str,
    requested: IncidentStatus,
) -> Result<StatusChange, Error> {
    let mut incident = incident_store
        .get(incident_id)
        .await?
        .ok_or_else(not_found)?;

    status::validate(incident.status, requested, principal, &incident.created_by)?;

    let previous_status = incident.status;
    status::apply(&mut incident, requested, principal, Utc::now());
    let incident = incident_store.update(incident).await?;

    debug!(
        "Incident {} moved {previous_status} -> {requested}",
        incident.incident_id
    );

    let event = DomainEvent::IncidentStatusUpdated {
        incident_id: incident.incident_id.clone(),
        previous_status: previous_status.to_string(),
        new_status: requested.to_string(),
        updated_by: principal.user_id.clone(),
        category: incident.category.clone(),
    };
    spawn_publish(publisher, event);

    Ok(StatusChange {
        incident_id: incident.incident_id,
        previous_status,
        new_status: requested,
    })
}

/// Publication happens on its own task after the committed write; the
/// triggering operation never blocks on, or fails with, notification.
fn spawn_publish(publisher: &EventPublisher, event: DomainEvent) {
    let publisher = publisher.clone();
    tokio::spawn(async move {
        publisher.publish(event).await;
    });
}

/// Server-generated incident id, content-addressed from random entropy.
/// 64 bits of hash output make a collision negligible, and the conditional
/// insert guards the rest.
fn generate_incident_id() -> String {
    let mut entropy = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut entropy);

    let mut hasher = Sha256::new();
    hasher.update(
        Utc::now()
            .timestamp_nanos_opt()
            .unwrap_or_default()
            .to_be_bytes(),
    );
    hasher.update(entropy);
    let digest = hex::encode(hasher.finalize());

    format!("INC-{}", &digest[..16])
}
