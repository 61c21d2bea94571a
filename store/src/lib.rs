//! Opaque key-value persistence boundary for the incident platform.
//!
//! Higher layers reach the backing store only through the Get/Put/Update/Scan
//! style traits defined here; the concrete backing (the in-memory
//! implementation in [`memory`], or an external table store) is chosen at
//! process startup and shared as a lazily-created, process-wide handle.

pub mod connections;
pub mod error;
pub mod incidents;
pub mod memory;
pub mod users;

pub use error::{Error, StoreErrorKind};

use std::sync::Arc;

pub type UserStoreRef = Arc<dyn users::UserStore>;
pub type IncidentStoreRef = Arc<dyn incidents::IncidentStore>;
pub type ConnectionStoreRef = Arc<dyn connections::ConnectionStore>;
