use serde::Deserialize;
use utoipa::ToSchema;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::controller::ApiResponse;
use crate::extractors::authenticated_principal::AuthenticatedPrincipal;
use crate::{AppState, Error};
use domain::error::invalid;
use domain::incident as IncidentApi;
use domain::incident::NewIncident;
use domain::IncidentStatus;
use log::*;

/// Request body for moving an incident to a new lifecycle state.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    /// Target status name, matched case-insensitively.
    pub new_status: String,
}

/// POST create a new Incident
#[utoipa::path(
    post,
    path = "/incidents",
    request_body = domain::incident::NewIncident,
    responses(
        (status = 201, description = "Successfully created a new Incident", body = domain::Incident),
        (status = 400, description = "Invalid incident fields"),
        (status = 401, description = "Unauthorized"),
        (status = 503, description = "Service temporarily unavailable")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create(
    AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
    State(app_state): State<AppState>,
    Json(params): Json<NewIncident>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST Create a new Incident from: {:?}", params.category);

    let incident = IncidentApi::create(
        &app_state.incident_store,
        &app_state.event_publisher,
        &principal,
        params,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(StatusCode::CREATED.into(), incident)),
    ))
}

/// GET all Incidents
#[utoipa::path(
    get,
    path = "/incidents",
    responses(
        (status = 200, description = "Successfully retrieved all Incidents", body = [domain::Incident]),
        (status = 401, description = "Unauthorized"),
        (status = 503, description = "Service temporarily unavailable")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn index(
    AuthenticatedPrincipal(_principal): AuthenticatedPrincipal,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, Error> {
    let incidents = IncidentApi::list(&app_state.incident_store).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), incidents)))
}

/// PUT update the status of an Incident specified by its id.
#[utoipa::path(
    put,
    path = "/incidents/{id}/status",
    params(
        ("id" = String, Path, description = "Incident id to update")
    ),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Successfully updated the Incident status", body = domain::incident::StatusChange),
        (status = 400, description = "Unknown status or illegal transition"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Principal's role may not perform this transition"),
        (status = 404, description = "Incident not found"),
        (status = 503, description = "Service temporarily unavailable")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_status(
    AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
    State(app_state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, Error> {
    debug!("PUT update Incident {id} status to {}", request.new_status);

    let requested = IncidentStatus::parse(&request.new_status).ok_or_else(|| {
        invalid(format!(
            "newStatus must be one of: {}",
            IncidentStatus::ALL.map(|status| status.as_str()).join(", ")
        ))
    })?;

    let change = IncidentApi::update_status(
        &app_state.incident_store,
        &app_state.event_publisher,
        &principal,
        &id,
        requested,
    )
    .await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), change)))
}
