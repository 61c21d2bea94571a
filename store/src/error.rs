//! Error types for the store layer.
use std::error::Error as StdError;
use std::fmt;

use serde::Serialize;

/// Errors while executing operations against the backing store.
/// The intent is to categorize errors into two major types:
///  * Errors related to data. Ex `StoreErrorKind::RecordNotFound`
///  * Errors related to interactions with the store itself. Ex `StoreErrorKind::SystemError`
#[derive(Debug)]
pub struct Error {
    // Underlying error emitted by the store implementation, if any
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    // Enum representing which category of error
    pub error_kind: StoreErrorKind,
}

#[derive(Debug, PartialEq, Serialize)]
pub enum StoreErrorKind {
    // Record not found
    RecordNotFound,
    // Conditional insert failed because the key already exists
    RecordConflict,
    // Record failed a store-level validity check
    InvalidRecord,
    // Errors related to interactions with the store itself. Ex a lost connection
    SystemError,
    // Other errors
    Other,
}

impl Error {
    pub fn new(error_kind: StoreErrorKind) -> Self {
        Self {
            source: None,
            error_kind,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Store Error: {:?}", self)
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}
