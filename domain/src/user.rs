//! User registration and login.
//!
//! Passwords are stored as `salt:hex(sha256(salt || password))`; login
//! verifies the digest and issues a signed bearer token carrying the user's
//! identity and role attributes. Credential failures all collapse to a single
//! unauthenticated outcome so nothing leaks about which check failed.

use crate::error::{auth_error, config_error, invalid, AuthErrorKind, Error};
use crate::token::{self, Claims};
use chrono::Utc;
use email_address::EmailAddress;
use log::warn;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use service::config::Config;
use sha2::{Digest, Sha256};
use store::users::{Model as User, Role};
use store::UserStoreRef;
use utoipa::ToSchema;

pub const ALLOWED_DEPARTMENTS: &[&str] = &[
    "IT",
    "Cleaner",
    "Infrastructure",
    "Security",
    "Emergency",
    "None",
];

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub password: String,
    pub role: Role,
    pub department: Option<String>,
}

/// Login credentials. The `email` field also accepts a username; the lookup
/// matches either, email first.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthToken {
    pub token: String,
}

/// Registers a new user. Field checks here are limited to identity concerns:
/// email shape, password strength, closed role and department sets.
pub async fn register(user_store: &UserStoreRef, params: NewUser) -> Result<User, Error> {
    let email = params.email.trim().to_lowercase();
    if !EmailAddress::is_valid(&email) {
        return Err(invalid("Invalid email format"));
    }

    let username = params.username.trim().to_string();
    if username.is_empty() {
        return Err(invalid("username is required"));
    }

    check_password_strength(&params.password)?;

    if params.role == Role::Unknown {
        return Err(invalid("role must be one of: admin, worker, user"));
    }

    let department = match params.department.as_deref() {
        None | Some("") => None,
        Some(department) if ALLOWED_DEPARTMENTS.contains(&department) => {
            // "None" is the explicit no-department sentinel.
            (department != "None").then(|| department.to_string())
        }
        Some(_) => {
            return Err(invalid(format!(
                "department must be one of: {}",
                ALLOWED_DEPARTMENTS.join(", ")
            )))
        }
    };

    let user = User {
        user_id: generate_user_id(&email, &username),
        email,
        username,
        password: hash_password(&params.password),
        role: params.role,
        department,
        created_at: Utc::now(),
    };

    Ok(user_store.insert_new(user).await?)
}

/// Authenticates credentials and issues a signed bearer token.
pub async fn login(
    user_store: &UserStoreRef,
    config: &Config,
    credentials: Credentials,
) -> Result<AuthToken, Error> {
    let identifier = credentials.email.trim().to_lowercase();

    let user = user_store
        .find_by_identifier(&identifier)
        .await?
        .ok_or_else(|| auth_error(AuthErrorKind::Unauthenticated))?;

    if !verify_password(&credentials.password, &user.password) {
        warn!("Login failed for {identifier}");
        return Err(auth_error(AuthErrorKind::Unauthenticated));
    }

    let secret = config.jwt_secret().ok_or_else(|| {
        warn!("JWT secret not configured; refusing to issue a token");
        config_error("JWT secret not configured")
    })?;

    let claims = Claims {
        user_id: user.user_id,
        role: user.role,
        email: user.email,
        department: user.department,
        exp: None,
    };

    let token = token::sign(&claims, &secret, config.token_ttl_secs)?;
    Ok(AuthToken { token })
}

fn check_password_strength(password: &str) -> Result<(), Error> {
    if password.len() < 8 {
        return Err(invalid("Password must be at least 8 characters long"));
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(invalid(
            "Password must contain at least one lowercase letter",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(invalid("Password must contain at least one number"));
    }
    Ok(())
}

fn hash_password(password: &str) -> String {
    let mut salt_bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt_bytes);
    let salt = hex::encode(salt_bytes);

    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{salt}:{}", hex::encode(hasher.finalize()))
}

fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt, expected)) = stored.split_once(':') else {
        return false;
    };
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize()) == expected
}

fn generate_user_id(email: &str, username: &str) -> String {
    let mut entropy = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut entropy);

    let mut hasher = Sha256::new();
    hasher.update(email.as_bytes());
    hasher.update(b":");
    hasher.update(username.as_bytes());
    hasher.update(
        Utc::now()
            .timestamp_nanos_opt()
            .unwrap_or_default()
            .to_be_bytes(),
    );
    hasher.update(entropy);
    let digest = hex::encode(hasher.finalize());

    format!("USR-{}", &digest[..16])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DomainErrorKind;
    use std::sync::Arc;
    use store::memory::InMemoryStore;

    fn store() -> UserStoreRef {
        Arc::new(InMemoryStore::new())
    }

    fn config() -> Config {
        Config::default().set_jwt_secret("login-secret".to_string())
    }

    fn new_user() -> NewUser {
        NewUser {
            email: "Worker@Example.com".to_string(),
            username: "worker1".to_string(),
            password: "sturdy-pass1".to_string(),
            role: Role::Worker,
            department: Some("IT".to_string()),
        }
    }

    #[tokio::test]
    async fn test_register_normalizes_and_hashes() {
        let store = store();
        let user = register(&store, new_user()).await.unwrap();

        assert!(user.user_id.starts_with("USR-"));
        assert_eq!(user.user_id.len(), 20);
        assert_eq!(user.email, "worker@example.com");
        assert_eq!(user.department.as_deref(), Some("IT"));
        assert_ne!(user.password, "sturdy-pass1");
        assert!(user.password.contains(':'));
    }

    #[tokio::test]
    async fn test_register_rejects_weak_passwords() {
        for password in ["short1", "nodigitshere", "NOLOWERCASE1"] {
            let mut params = new_user();
            params.password = password.to_string();
            assert!(register(&store(), params).await.is_err(), "{password}");
        }
    }

    #[tokio::test]
    async fn test_register_rejects_bad_email_role_and_department() {
        let mut bad_email = new_user();
        bad_email.email = "not an email".to_string();
        assert!(register(&store(), bad_email).await.is_err());

        let mut bad_role = new_user();
        bad_role.role = Role::Unknown;
        assert!(register(&store(), bad_role).await.is_err());

        let mut bad_department = new_user();
        bad_department.department = Some("Catering".to_string());
        assert!(register(&store(), bad_department).await.is_err());
    }

    #[tokio::test]
    async fn test_register_treats_none_department_as_unset() {
        let mut params = new_user();
        params.department = Some("None".to_string());
        let user = register(&store(), params).await.unwrap();
        assert!(user.department.is_none());
    }

    #[tokio::test]
    async fn test_login_issues_a_verifiable_token() {
        let store = store();
        let registered = register(&store, new_user()).await.unwrap();

        let issued_at = Utc::now().timestamp();
        let auth = login(
            &store,
            &config(),
            Credentials {
                email: "worker@example.com".to_string(),
                password: "sturdy-pass1".to_string(),
            },
        )
        .await
        .unwrap();

        let claims = token::verify(&auth.token, "login-secret").unwrap();
        assert_eq!(claims.user_id, registered.user_id);
        assert_eq!(claims.role, Role::Worker);
        assert_eq!(claims.email, "worker@example.com");
        assert_eq!(claims.department.as_deref(), Some("IT"));
        let exp = claims.exp.unwrap();
        assert!((exp - issued_at - 3600).abs() <= 2);
    }

    #[tokio::test]
    async fn test_login_accepts_username_identifier() {
        let store = store();
        register(&store, new_user()).await.unwrap();

        let auth = login(
            &store,
            &config(),
            Credentials {
                email: "worker1".to_string(),
                password: "sturdy-pass1".to_string(),
            },
        )
        .await;
        assert!(auth.is_ok());
    }

    #[tokio::test]
    async fn test_login_failures_collapse_to_unauthenticated() {
        let store = store();
        register(&store, new_user()).await.unwrap();

        for (identifier, password) in [
            ("worker@example.com", "wrong-pass1"),
            ("nobody@example.com", "sturdy-pass1"),
        ] {
            let err = login(
                &store,
                &config(),
                Credentials {
                    email: identifier.to_string(),
                    password: password.to_string(),
                },
            )
            .await
            .unwrap_err();
            assert_eq!(
                err.error_kind,
                DomainErrorKind::Auth(AuthErrorKind::Unauthenticated)
            );
        }
    }

    #[tokio::test]
    async fn test_login_without_secret_is_a_misconfiguration() {
        let store = store();
        register(&store, new_user()).await.unwrap();

        let err = login(
            &store,
            &Config::default(),
            Credentials {
                email: "worker@example.com".to_string(),
                password: "sturdy-pass1".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err.error_kind,
            DomainErrorKind::Internal(crate::error::InternalErrorKind::Config(_))
        ));
    }
}
