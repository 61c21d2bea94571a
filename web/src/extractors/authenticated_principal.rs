use crate::error::Error;
use crate::AppState;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use domain::error::{auth_error, config_error, AuthErrorKind};
use domain::{token, Principal};
use log::*;

/// Extracts the verified token principal from the `Authorization` header.
///
/// Handlers that take this extractor are only invoked with a principal whose
/// token passed signature, expiry, and required-claim checks; everything else
/// is rejected before the handler body runs. Rejections go through
/// `web::Error`, which collapses all auth failures to an opaque 401.
pub(crate) struct AuthenticatedPrincipal(pub Principal);

impl FromRequestParts<AppState> for AuthenticatedPrincipal {
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                trace!("Request carried no usable Authorization header");
                auth_error(AuthErrorKind::Unauthenticated)
            })?;

        let secret = state
            .config
            .jwt_secret()
            .ok_or_else(|| config_error("JWT secret not configured"))?;

        let claims = token::verify(header, &secret).inspect_err(|err| {
            debug!("Token verification failed: {:?}", err.error_kind);
        })?;

        Ok(AuthenticatedPrincipal(Principal::from(claims)))
    }
}
