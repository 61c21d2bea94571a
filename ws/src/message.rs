use serde::Serialize;
use serde_json::Value;

/// Serialized events delivered to subscribers. The `event` tag is the
/// discriminator clients switch on; field names stay camelCase on the wire.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum WireEvent {
    #[serde(rename = "incidentCreated")]
    IncidentCreated { category: String, incident: Value },

    #[serde(rename = "incidentUpdated")]
    #[serde(rename_all = "camelCase")]
    IncidentUpdated {
        incident_id: String,
        previous_status: String,
        new_status: String,
        updated_by: String,
        category: String,
    },
}

impl WireEvent {
    /// The category a department-scoped subscriber must match to receive
    /// this event.
    pub fn category(&self) -> &str {
        match self {
            WireEvent::IncidentCreated { category, .. } => category,
            WireEvent::IncidentUpdated { category, .. } => category,
        }
    }
}
