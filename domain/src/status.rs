//! Legality and permission checks for incident lifecycle transitions.
//!
//! Status only ever moves forward through a fixed graph:
//! `reported -> {assigned, cancelled}`, `assigned -> {working, cancelled}`,
//! `working -> {solved, cancelled}`; `solved` and `cancelled` are terminal.
//! The machine is a pure decision function plus a side-effect contract;
//! storage I/O belongs to the caller.

use crate::error::{forbidden, illegal_transition, invalid, Error};
use crate::token::Claims;
use chrono::{DateTime, Utc};
use store::incidents::{IncidentStatus, Model as Incident};
use store::users::Role;

/// The authenticated identity attached to a request after verification. All
/// downstream authorization decisions are pure functions of this value plus
/// the target resource state.
#[derive(Debug, Clone)]
pub struct Principal {
    pub user_id: String,
    pub role: Role,
    pub email: String,
    pub department: Option<String>,
}

impl From<Claims> for Principal {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.user_id,
            role: claims.role,
            email: claims.email,
            department: claims.department,
        }
    }
}

/// Whether `(current, requested)` is an edge of the transition graph.
pub fn is_legal_transition(current: IncidentStatus, requested: IncidentStatus) -> bool {
    use IncidentStatus::*;
    match current {
        Reported => matches!(requested, Assigned | Cancelled),
        Assigned => matches!(requested, Working | Cancelled),
        Working => matches!(requested, Solved | Cancelled),
        Solved | Cancelled => false,
    }
}

/// Whether `role` may request `requested` at all, independent of the current
/// status. Admins may request any valid status, workers drive the forward
/// path, plain users may only cancel.
pub fn role_permits(role: Role, requested: IncidentStatus) -> bool {
    use IncidentStatus::*;
    match role {
        Role::Admin => true,
        Role::Worker => matches!(requested, Assigned | Working | Solved),
        Role::User => requested == Cancelled,
        Role::Unknown => false,
    }
}

/// Validates a requested transition. All four rules must hold: the target is
/// a settable status, the edge exists, the role permits the target, and a
/// plain user must own the incident they cancel.
pub fn validate(
    current: IncidentStatus,
    requested: IncidentStatus,
    principal: &Principal,
    created_by: &str,
) -> Result<(), Error> {
    if requested == IncidentStatus::Reported {
        return Err(invalid(
            "Cannot change status to 'reported'. This is the initial state and cannot be set manually.",
        ));
    }

    if !is_legal_transition(current, requested) {
        return Err(illegal_transition(current.as_str(), requested.as_str()));
    }

    if !role_permits(principal.role, requested) {
        return Err(forbidden(format!(
            "Your role ({}) does not have permission to change status to {requested}",
            principal.role
        )));
    }

    if principal.role == Role::User && principal.user_id != created_by {
        return Err(forbidden(
            "You can only cancel incidents that you created",
        ));
    }

    Ok(())
}

/// Applies an accepted transition to the incident record. Entering `Solved`
/// stamps `solved_by`/`solved_at`; no other transition touches those fields.
pub fn apply(incident: &mut Incident, requested: IncidentStatus, principal: &Principal, now: DateTime<Utc>) {
    incident.status = requested;
    if requested == IncidentStatus::Solved {
        incident.solved_by = Some(principal.user_id.clone());
        incident.solved_at = Some(now);
    }
}
