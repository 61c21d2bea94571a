//! Error types for the `domain` layer.
use std::error::Error as StdError;
use std::fmt;
use store::error::{Error as StoreError, StoreErrorKind};

/// Top-level domain error type.
/// Errors in the Domain layer are modeled as a tree structure
/// with `domain::error::Error` as the root type holding a tree of `error_kind`
/// enums that represent the kinds of errors that can occur in the domain layer or
/// in lower layers. The `source` field is used to hold the original error that caused
/// the domain error. The intent is to translate errors between layers while maintaining
/// layer boundaries: `domain` depends on `store`, and `web` depends on `domain`, but
/// `web` never depends directly on `store`. Ultimately the various `error_kind`s are
/// used by `web` to return appropriate HTTP status codes and messages to the client.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: DomainErrorKind,
}

/// Enum representing the major categories of errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum DomainErrorKind {
    /// Identity/crypto failures. All collapse externally to a generic
    /// "unauthorized" outcome; the specific kind never leaks to the caller.
    Auth(AuthErrorKind),
    /// Permission and state-legality failures, surfaced with the specific
    /// reason since the caller can act on them.
    Access(AccessErrorKind),
    Internal(InternalErrorKind),
    External(ExternalErrorKind),
}

/// Token verification failure kinds. Logged with detail, reported opaquely.
#[derive(Debug, PartialEq)]
pub enum AuthErrorKind {
    MalformedToken,
    BadSignature,
    Expired,
    MissingClaims,
    /// Credentials did not match a stored principal.
    Unauthenticated,
}

#[derive(Debug, PartialEq)]
pub enum AccessErrorKind {
    Forbidden(String),
    IllegalTransition { current: String, requested: String },
}

/// Enum representing the various kinds of internal errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum InternalErrorKind {
    Entity(EntityErrorKind),
    /// Missing shared secret or store handle. Fatal to the operation, logged,
    /// never silently defaulted.
    Config(String),
    Other(String),
}

/// Enum representing the kinds of record errors that bubble up from the store layer,
/// reduced to the subset that is relevant to the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum EntityErrorKind {
    NotFound,
    Invalid(String),
    Conflict,
    Other(String),
}

/// Enum representing the various kinds of external errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum ExternalErrorKind {
    Network,
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Domain Error: {self:?}")
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

// This is where we translate errors from the `store` layer to the `domain` layer.
impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        let entity_error_kind = match err.error_kind {
            StoreErrorKind::RecordNotFound => EntityErrorKind::NotFound,
            StoreErrorKind::RecordConflict => EntityErrorKind::Conflict,
            StoreErrorKind::InvalidRecord => {
                EntityErrorKind::Invalid("invalid record".to_string())
            }
            _ => EntityErrorKind::Other("StoreErrorKind".to_string()),
        };

        Error {
            source: Some(Box::new(err)),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Entity(entity_error_kind)),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Other(
                "JSON serialization error".to_string(),
            )),
        }
    }
}

pub fn auth_error(kind: AuthErrorKind) -> Error {
    Error {
        source: None,
        error_kind: DomainErrorKind::Auth(kind),
    }
}

pub fn forbidden(message: impl Into<String>) -> Error {
    Error {
        source: None,
        error_kind: DomainErrorKind::Access(AccessErrorKind::Forbidden(message.into())),
    }
}

pub fn illegal_transition(current: impl Into<String>, requested: impl Into<String>) -> Error {
    Error {
        source: None,
        error_kind: DomainErrorKind::Access(AccessErrorKind::IllegalTransition {
            current: current.into(),
            requested: requested.into(),
        }),
    }
}

pub fn invalid(message: impl Into<String>) -> Error {
    Error {
        source: None,
        error_kind: DomainErrorKind::Internal(InternalErrorKind::Entity(
            EntityErrorKind::Invalid(message.into()),
        )),
    }
}

pub fn not_found() -> Error {
    Error {
        source: None,
        error_kind: DomainErrorKind::Internal(InternalErrorKind::Entity(EntityErrorKind::NotFound)),
    }
}

pub fn config_error(message: impl Into<String>) -> Error {
    Error {
        source: None,
        error_kind: DomainErrorKind::Internal(InternalErrorKind::Config(message.into())),
    }
}
