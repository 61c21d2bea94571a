use crate::controller::{
    health_check_controller, incident_controller, user_session_controller,
};
use crate::notifications;
use crate::AppState;
use axum::http::{
    header::{AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use axum::{
    routing::{get, post, put},
    Router,
};
use log::warn;
use service::config::Config;
use tower_http::cors::CorsLayer;

use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_rapidoc::RapiDoc;

// This is the global definition of our OpenAPI spec. To be a part
// of the rendered spec, a path and schema must be listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "Incident Platform API"
        ),
        paths(
            health_check_controller::health_check,
            user_session_controller::register,
            user_session_controller::login,
            incident_controller::create,
            incident_controller::index,
            incident_controller::update_status,
        ),
        components(
            schemas(
                domain::Incident,
                domain::User,
                domain::IncidentStatus,
                domain::Role,
                domain::user::NewUser,
                domain::user::Credentials,
                domain::user::AuthToken,
                domain::incident::NewIncident,
                domain::incident::StatusChange,
                incident_controller::UpdateStatusRequest,
            )
        ),
        modifiers(&SecurityAddon),
        tags(
            (name = "incident_platform", description = "Incident reporting & notification API")
        )
    )]
struct ApiDoc;

struct SecurityAddon;

// Defines our bearer token authentication requirement for gaining access to our
// API endpoints for OpenAPI.
impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "Signed token returned from a successful login, passed as \
                             `Authorization: Bearer <token>`",
                        ))
                        .build(),
                ),
            )
        }
    }
}

pub fn define_routes(app_state: AppState) -> Router {
    let cors = cors_layer(&app_state.config);

    Router::new()
        .merge(health_routes())
        .merge(user_session_routes(app_state.clone()))
        .merge(incident_routes(app_state.clone()))
        .merge(notification_routes(app_state))
        // **** FIXME: protect the OpenAPI web UI
        .merge(RapiDoc::with_openapi("/api-docs/openapi2.json", ApiDoc::openapi()).path("/rapidoc"))
        .layer(cors)
}

fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}

fn user_session_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/register", post(user_session_controller::register))
        .route("/login", post(user_session_controller::login))
        .with_state(app_state)
}

fn incident_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/incidents", post(incident_controller::create))
        .route("/incidents", get(incident_controller::index))
        .route(
            "/incidents/{id}/status",
            put(incident_controller::update_status),
        )
        .with_state(app_state)
}

fn notification_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/ws", get(notifications::handler::subscribe))
        .with_state(app_state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Skipping unparseable allowed origin: {origin}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use store::memory::InMemoryStore;
    use tower::ServiceExt;

    fn test_router() -> Router {
        let store = Arc::new(InMemoryStore::new());
        define_routes(AppState::new(
            Config::default().set_jwt_secret("router-test-secret".to_string()),
            store.clone(),
            store.clone(),
            store,
        ))
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn json_request(method: &str, uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn register_and_login(router: &Router, role: &str, department: Value) -> String {
        let (status, _) = send(
            router,
            json_request(
                "POST",
                "/register",
                json!({
                    "email": format!("{role}@example.com"),
                    "username": format!("{role}1"),
                    "password": "sturdy-pass1",
                    "role": role,
                    "department": department,
                }),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send(
            router,
            json_request(
                "POST",
                "/login",
                json!({
                    "email": format!("{role}@example.com"),
                    "password": "sturdy-pass1",
                }),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body["data"]["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health_check() {
        let router = test_router();
        let response = router
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_full_incident_lifecycle_over_http() {
        let router = test_router();
        let token = register_and_login(&router, "admin", Value::Null).await;

        let (status, body) = send(
            &router,
            json_request(
                "POST",
                "/incidents",
                json!({
                    "category": "TI",
                    "urgency": "high",
                    "place": "lab",
                    "description": "router down",
                }),
                Some(&token),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let incident_id = body["data"]["incidentId"].as_str().unwrap().to_string();
        assert_eq!(body["data"]["status"], "reported");

        let (status, body) = send(
            &router,
            json_request(
                "PUT",
                &format!("/incidents/{incident_id}/status"),
                json!({"newStatus": "Assigned"}),
                Some(&token),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["newStatus"], "assigned");
        assert_eq!(body["data"]["previousStatus"], "reported");

        let (status, body) = send(
            &router,
            json_request("GET", "/incidents", Value::Null, Some(&token)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let incidents = body["data"].as_array().unwrap();
        assert_eq!(incidents.len(), 1);
        assert_eq!(incidents[0]["status"], "assigned");
    }

    #[tokio::test]
    async fn test_incident_routes_require_a_valid_token() {
        let router = test_router();

        let (status, _) = send(
            &router,
            json_request("GET", "/incidents", Value::Null, None),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(
            &router,
            json_request("GET", "/incidents", Value::Null, Some("not.a.token")),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_login_with_wrong_password_is_unauthorized() {
        let router = test_router();
        register_and_login(&router, "user", Value::Null).await;

        let (status, _) = send(
            &router,
            json_request(
                "POST",
                "/login",
                json!({"email": "user@example.com", "password": "wrong-pass1"}),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unknown_status_value_is_a_bad_request() {
        let router = test_router();
        let token = register_and_login(&router, "admin", Value::Null).await;

        let (status, _) = send(
            &router,
            json_request(
                "PUT",
                "/incidents/INC-0000000000000000/status",
                json!({"newStatus": "done"}),
                Some(&token),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_worker_may_not_cancel_someone_elses_incident() {
        let router = test_router();
        let user_token = register_and_login(&router, "user", Value::Null).await;
        let worker_token = register_and_login(&router, "worker", json!("IT")).await;

        let (_, body) = send(
            &router,
            json_request(
                "POST",
                "/incidents",
                json!({
                    "category": "TI",
                    "place": "lab",
                    "description": "router down",
                }),
                Some(&user_token),
            ),
        )
        .await;
        let incident_id = body["data"]["incidentId"].as_str().unwrap().to_string();

        let (status, _) = send(
            &router,
            json_request(
                "PUT",
                &format!("/incidents/{incident_id}/status"),
                json!({"newStatus": "cancelled"}),
                Some(&worker_token),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_duplicate_registration_conflicts() {
        let router = test_router();
        register_and_login(&router, "user", Value::Null).await;

        let (status, _) = send(
            &router,
            json_request(
                "POST",
                "/register",
                json!({
                    "email": "user@example.com",
                    "username": "someone-else",
                    "password": "sturdy-pass1",
                    "role": "user",
                    "department": null,
                }),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }
}
