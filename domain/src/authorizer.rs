//! Gateway-style access decisions.
//!
//! Turns a request descriptor carrying a bearer token into a single
//! allow/deny decision for a perimeter gateway. Every failure collapses to
//! `Deny` with no further detail: the boundary is deliberately opaque about
//! why authorization failed. Resource-level checks downstream remain
//! mandatory regardless of the grant this produces.

use crate::error::{auth_error, config_error, AuthErrorKind, Error};
use crate::token::{self, Claims};
use log::warn;
use service::config::Config;

/// Request descriptor as seen by the perimeter: a token in either the
/// `Authorization` header or the legacy single-token field, an optional
/// explicit target resource, and whatever routing metadata is available for
/// synthesizing one.
#[derive(Debug, Default, Clone)]
pub struct GatewayRequest {
    pub authorization: Option<String>,
    /// Legacy single-token field from TOKEN-style authorizer invocations.
    pub authorization_token: Option<String>,
    pub method_arn: Option<String>,
    pub route_arn: Option<String>,
    pub api_id: Option<String>,
    pub region: Option<String>,
    pub account_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Allow,
    Deny,
}

/// The access decision consumed by the gateway. On `Allow`, the verified
/// claims ride along as request-scoped context for downstream components.
#[derive(Debug, Clone)]
pub struct Decision {
    pub principal_id: String,
    pub effect: Effect,
    pub resource_pattern: String,
    pub context: Option<Claims>,
}

impl Decision {
    fn deny() -> Self {
        Self {
            principal_id: String::new(),
            effect: Effect::Deny,
            resource_pattern: "*".to_string(),
            context: None,
        }
    }
}

/// Produces the access decision for `request`. Infallible by contract: any
/// internal failure is logged and reported as a plain `Deny`.
pub fn authorize(request: &GatewayRequest, config: &Config) -> Decision {
    match check(request, config) {
        Ok(decision) => decision,
        Err(err) => {
            warn!("Authorization denied: {err:?}");
            Decision::deny()
        }
    }
}

fn check(request: &GatewayRequest, config: &Config) -> Result<Decision, Error> {
    let token = request
        .authorization
        .as_deref()
        .or(request.authorization_token.as_deref())
        .ok_or_else(|| auth_error(AuthErrorKind::MalformedToken))?;

    let secret = config
        .jwt_secret()
        .ok_or_else(|| config_error("JWT secret not configured"))?;

    let claims = token::verify(token, &secret)?;

    let resource_pattern = match explicit_resource(request) {
        Some(resource) => widen(resource),
        None => synthesize_pattern(request),
    };

    Ok(Decision {
        principal_id: claims.user_id.clone(),
        effect: Effect::Allow,
        resource_pattern,
        context: Some(claims),
    })
}

fn explicit_resource(request: &GatewayRequest) -> Option<&str> {
    request
        .method_arn
        .as_deref()
        .or(request.route_arn.as_deref())
}

/// Widens a specific method/path resource to a wildcard over method and path
/// segments, keeping region/account/API-id/stage. One cached decision must
/// cover every route the principal may call next.
fn widen(resource: &str) -> String {
    if resource.ends_with("*/*") {
        return resource.to_string();
    }
    let segments: Vec<&str> = resource.split('/').collect();
    if segments.len() >= 2 {
        format!("{}/*/*", segments[..segments.len() - 2].join("/"))
    } else {
        resource.to_string()
    }
}

/// No explicit target resource: synthesize the widest pattern the request
/// metadata allows, falling back to a full wildcard. A policy-widening
/// convenience, not a security boundary.
fn synthesize_pattern(request: &GatewayRequest) -> String {
    match request.api_id.as_deref() {
        Some(api_id) => {
            let region = request.region.as_deref().unwrap_or("us-east-1");
            let account_id = request.account_id.as_deref().unwrap_or("*");
            format!("arn:aws:execute-api:{region}:{account_id}:{api_id}/*/*")
        }
        None => "*".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Role;

    fn config() -> Config {
        Config::default().set_jwt_secret("authorizer-secret".to_string())
    }

    fn signed_token() -> String {
        let claims = Claims {
            user_id: "USR-77".to_string(),
            role: Role::Admin,
            email: "admin@example.com".to_string(),
            department: None,
            exp: None,
        };
        token::sign(&claims, "authorizer-secret", 60).unwrap()
    }

    #[test]
    fn test_allow_widens_explicit_resource() {
        let request = GatewayRequest {
            authorization: Some(format!("Bearer {}", signed_token())),
            method_arn: Some(
                "arn:aws:execute-api:us-east-1:123:api9/dev/PUT/incidents".to_string(),
            ),
            ..Default::default()
        };

        let decision = authorize(&request, &config());
        assert_eq!(decision.effect, Effect::Allow);
        assert_eq!(decision.principal_id, "USR-77");
        assert_eq!(
            decision.resource_pattern,
            "arn:aws:execute-api:us-east-1:123:api9/dev/*/*"
        );
        assert!(decision.context.is_some());
    }

    #[test]
    fn test_already_wildcarded_resource_is_untouched() {
        let request = GatewayRequest {
            authorization: Some(signed_token()),
            method_arn: Some("arn:aws:execute-api:us-east-1:123:api9/dev/*/*".to_string()),
            ..Default::default()
        };

        let decision = authorize(&request, &config());
        assert_eq!(
            decision.resource_pattern,
            "arn:aws:execute-api:us-east-1:123:api9/dev/*/*"
        );
    }

    #[test]
    fn test_legacy_token_field_is_accepted() {
        let request = GatewayRequest {
            authorization_token: Some(signed_token()),
            ..Default::default()
        };

        let decision = authorize(&request, &config());
        assert_eq!(decision.effect, Effect::Allow);
        assert_eq!(decision.resource_pattern, "*");
    }

    #[test]
    fn test_pattern_synthesis_from_request_metadata() {
        let request = GatewayRequest {
            authorization: Some(signed_token()),
            api_id: Some("api9".to_string()),
            region: Some("eu-west-1".to_string()),
            ..Default::default()
        };

        let decision = authorize(&request, &config());
        assert_eq!(
            decision.resource_pattern,
            "arn:aws:execute-api:eu-west-1:*:api9/*/*"
        );
    }

    #[test]
    fn test_failures_collapse_to_an_opaque_deny() {
        let no_token = GatewayRequest::default();
        let bad_token = GatewayRequest {
            authorization: Some("Bearer not.a.token".to_string()),
            ..Default::default()
        };
        let unconfigured = GatewayRequest {
            authorization: Some(signed_token()),
            ..Default::default()
        };

        for (request, config) in [
            (no_token, config()),
            (bad_token, config()),
            (unconfigured, Config::default()),
        ] {
            let decision = authorize(&request, &config);
            assert_eq!(decision.effect, Effect::Deny);
            assert!(decision.principal_id.is_empty());
            assert!(decision.context.is_none());
        }
    }
}
