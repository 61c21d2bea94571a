use crate::controller::ApiResponse;
use crate::error::Result as WebResult;
use crate::AppState;
use axum::extract::State;
use axum::{http::StatusCode, response::IntoResponse, Json};
use domain::user as UserApi;
use domain::user::{Credentials, NewUser};
use log::*;

/// POST register a new user account.
///
/// The password is salted and digested before storage; the plaintext never
/// leaves this request's scope and the stored digest is never serialized back.
#[utoipa::path(
    post,
    path = "/register",
    request_body = domain::user::NewUser,
    responses(
        (status = 201, description = "Successfully registered a new user", body = domain::User),
        (status = 400, description = "Invalid registration fields"),
        (status = 409, description = "Email or username already registered"),
        (status = 503, description = "Service temporarily unavailable")
    )
)]
pub async fn register(
    State(app_state): State<AppState>,
    Json(params): Json<NewUser>,
) -> WebResult<impl IntoResponse> {
    debug!("POST Register a new user: {:?}", params.username);

    let user = UserApi::register(&app_state.user_store, params).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(StatusCode::CREATED.into(), user)),
    ))
}

/// POST logs the user into the platform and returns a signed bearer token.
///
/// Pass the token back on every subsequent API call, e.g.:
/// curl -v --header "Authorization: Bearer <token>" --request GET http://localhost:4000/incidents
#[utoipa::path(
    post,
    path = "/login",
    request_body = domain::user::Credentials,
    responses(
        (status = 200, description = "Logs in and returns a bearer token", body = domain::user::AuthToken),
        (status = 401, description = "Unauthorized"),
        (status = 405, description = "Method not allowed"),
        (status = 503, description = "Service temporarily unavailable")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> WebResult<impl IntoResponse> {
    let auth_token = UserApi::login(&app_state.user_store, &app_state.config, credentials).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), auth_token)))
}
