use crate::error::Error;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Lifecycle state of an incident. `Reported` is the creation state and is
/// never a settable target; `Solved` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum IncidentStatus {
    Reported,
    Assigned,
    Working,
    Solved,
    Cancelled,
}

impl IncidentStatus {
    pub const ALL: [IncidentStatus; 5] = [
        IncidentStatus::Reported,
        IncidentStatus::Assigned,
        IncidentStatus::Working,
        IncidentStatus::Solved,
        IncidentStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentStatus::Reported => "reported",
            IncidentStatus::Assigned => "assigned",
            IncidentStatus::Working => "working",
            IncidentStatus::Solved => "solved",
            IncidentStatus::Cancelled => "cancelled",
        }
    }

    /// Parse a client-supplied status value, case-insensitively.
    pub fn parse(value: &str) -> Option<IncidentStatus> {
        match value.to_lowercase().as_str() {
            "reported" => Some(IncidentStatus::Reported),
            "assigned" => Some(IncidentStatus::Assigned),
            "working" => Some(IncidentStatus::Working),
            "solved" => Some(IncidentStatus::Solved),
            "cancelled" => Some(IncidentStatus::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for IncidentStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A stored incident record.
///
/// `solved_by` and `solved_at` are set when the incident enters `Solved` and
/// are never cleared by any later write.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    pub incident_id: String,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub category: String,
    pub status: IncidentStatus,
    pub urgency: Option<String>,
    pub place: String,
    pub description: String,
    pub solved_by: Option<String>,
    pub solved_at: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait IncidentStore: Send + Sync {
    /// Atomic conditional insert keyed on `incident_id` uniqueness. A
    /// collision surfaces as `RecordConflict`, never a silent overwrite.
    async fn insert_new(&self, incident: Model) -> Result<Model, Error>;

    async fn get(&self, incident_id: &str) -> Result<Option<Model>, Error>;

    /// Single conditional update keyed on incident identity. Two concurrent
    /// conflicting writers race last-write-wins; this is accepted here and
    /// callers must not assume an optimistic version check.
    async fn update(&self, incident: Model) -> Result<Model, Error>;

    /// Full, eventually-consistent snapshot with no ordering guarantee.
    async fn scan(&self) -> Result<Vec<Model>, Error>;
}
