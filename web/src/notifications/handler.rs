use crate::error::Error;
use crate::AppState;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::Response;
use domain::error::{auth_error, config_error, AuthErrorKind};
use domain::{token, Principal};
use futures::{SinkExt, StreamExt};
use log::*;
use serde::Deserialize;
use tokio::sync::mpsc;
use uuid::Uuid;

/// The token is optional at the extractor level so that its absence reaches
/// the same opaque 401 path as a token that fails verification, instead of
/// surfacing as an extractor-shaped 400.
#[derive(Debug, Deserialize)]
pub(crate) struct SubscribeParams {
    token: Option<String>,
}

/// WebSocket handler that establishes a long-lived notification subscription.
///
/// Browsers cannot set headers on WebSocket handshakes, so the token arrives
/// as a query parameter and is verified before the upgrade is accepted; a
/// missing or bad token is refused at the HTTP layer with the usual opaque
/// 401 and the connection is never registered.
pub(crate) async fn subscribe(
    ws: WebSocketUpgrade,
    Query(params): Query<SubscribeParams>,
    State(app_state): State<AppState>,
) -> Result<Response, Error> {
    let principal = authenticate_subscriber(&app_state, params.token.as_deref())?;

    Ok(ws.on_upgrade(move |socket| serve_subscriber(socket, app_state, principal)))
}

fn authenticate_subscriber(
    app_state: &AppState,
    token: Option<&str>,
) -> Result<Principal, Error> {
    let token = token.ok_or_else(|| {
        trace!("Subscribe request carried no token parameter");
        auth_error(AuthErrorKind::Unauthenticated)
    })?;

    let secret = app_state
        .config
        .jwt_secret()
        .ok_or_else(|| config_error("JWT secret not configured"))?;

    Ok(Principal::from(token::verify(token, &secret)?))
}

/// Registers the subscriber in the durable registry under its department
/// scope, or the explicit no-scope sentinel.
async fn register_subscriber(
    app_state: &AppState,
    principal: &Principal,
    connection_id: &str,
) -> Result<(), store::Error> {
    // "none" marks a subscriber with no department scope; it can never match
    // a category, so scoped filtering skips nothing by accident.
    let department = principal.department.as_deref().unwrap_or("none");

    app_state
        .registry
        .put(connection_id, &principal.user_id, principal.role, department)
        .await
}

/// Idempotent teardown: detaches the live channel and removes the registry
/// entry, tolerating a connection already pruned by a failed delivery.
async fn deregister_subscriber(app_state: &AppState, connection_id: &str) {
    app_state.live_transport.detach(connection_id);
    if let Err(err) = app_state.registry.remove(connection_id).await {
        warn!("Failed to deregister connection {connection_id}: {err}");
    }
}

async fn serve_subscriber(socket: WebSocket, app_state: AppState, principal: Principal) {
    let connection_id = Uuid::new_v4().to_string();

    if let Err(err) = register_subscriber(&app_state, &principal, &connection_id).await {
        error!("Failed to register connection {connection_id}: {err}");
        return;
    }

    let (tx, mut rx) = mpsc::unbounded_channel();
    app_state.live_transport.attach(&connection_id, tx);
    debug!(
        "Subscriber {} connected as {connection_id}",
        principal.user_id
    );

    let (mut sink, mut stream) = socket.split();
    loop {
        tokio::select! {
            outbound = rx.recv() => match outbound {
                Some(payload) => {
                    if sink.send(Message::Text(payload.into())).await.is_err() {
                        break;
                    }
                }
                None => break,
            },
            inbound = stream.next() => match inbound {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                // This is a one-way notification channel; other inbound
                // frames are ignored.
                Some(Ok(_)) => {}
            },
        }
    }

    deregister_subscriber(&app_state, &connection_id).await;
    debug!("Subscriber connection {connection_id} closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use domain::token::Claims;
    use domain::Role;
    use service::config::Config;
    use std::sync::Arc;
    use store::memory::InMemoryStore;
    use ws::DeliveryError;
    use ws::DeliveryTransport;

    const SECRET: &str = "subscribe-secret";

    fn test_state() -> AppState {
        let store = Arc::new(InMemoryStore::new());
        AppState::new(
            Config::default().set_jwt_secret(SECRET.to_string()),
            store.clone(),
            store.clone(),
            store,
        )
    }

    fn signed_token(department: Option<&str>) -> String {
        let claims = Claims {
            user_id: "USR-42".to_string(),
            role: Role::Worker,
            email: "worker@example.com".to_string(),
            department: department.map(str::to_string),
            exp: None,
        };
        token::sign(&claims, SECRET, 60).unwrap()
    }

    #[tokio::test]
    async fn test_missing_token_is_rejected_as_unauthorized() {
        let err = authenticate_subscriber(&test_state(), None).unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_bad_token_is_rejected_as_unauthorized() {
        for token in ["not.a.token", ""] {
            let err = authenticate_subscriber(&test_state(), Some(token)).unwrap_err();
            assert_eq!(
                err.into_response().status(),
                StatusCode::UNAUTHORIZED,
                "token {token:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_valid_token_yields_the_subscriber_principal() {
        let principal =
            authenticate_subscriber(&test_state(), Some(&signed_token(Some("TI")))).unwrap();
        assert_eq!(principal.user_id, "USR-42");
        assert_eq!(principal.role, Role::Worker);
        assert_eq!(principal.department.as_deref(), Some("TI"));
    }

    #[tokio::test]
    async fn test_registration_records_the_department_scope() {
        let state = test_state();
        let scoped = Principal::from(token::verify(&signed_token(Some("TI")), SECRET).unwrap());
        let unscoped = Principal::from(token::verify(&signed_token(None), SECRET).unwrap());

        register_subscriber(&state, &scoped, "c-scoped").await.unwrap();
        register_subscriber(&state, &unscoped, "c-unscoped").await.unwrap();

        let mut connections = state.registry.list_all().await.unwrap();
        connections.sort_by(|a, b| a.connection_id.cmp(&b.connection_id));
        assert_eq!(connections.len(), 2);
        assert_eq!(connections[0].connection_id, "c-scoped");
        assert_eq!(connections[0].user_id, "USR-42");
        assert_eq!(connections[0].role, Role::Worker);
        assert_eq!(connections[0].department, "TI");
        assert_eq!(
            connections[1].department, "none",
            "no department scope stores the explicit sentinel"
        );
    }

    #[tokio::test]
    async fn test_deregistration_is_idempotent_and_detaches_the_channel() {
        let state = test_state();
        let principal = Principal::from(token::verify(&signed_token(None), SECRET).unwrap());

        register_subscriber(&state, &principal, "c-1").await.unwrap();
        let (tx, _rx) = mpsc::unbounded_channel();
        state.live_transport.attach("c-1", tx);

        deregister_subscriber(&state, "c-1").await;
        assert!(state.registry.list_all().await.unwrap().is_empty());
        assert!(matches!(
            state.live_transport.deliver("c-1", "payload").await,
            Err(DeliveryError::Gone)
        ));

        // A second teardown of the same connection must be a no-op.
        deregister_subscriber(&state, "c-1").await;
        assert!(state.registry.list_all().await.unwrap().is_empty());
    }
}
