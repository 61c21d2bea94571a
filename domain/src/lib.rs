//! Business core of the incident platform: token signing/verification,
//! gateway authorization, the incident status state machine, and the
//! orchestration that ties them to the store and the event publisher.
//!
//! The layering follows store -> domain -> web: this crate translates store
//! errors into its own kind tree and never exposes store internals upward.

pub mod authorizer;
pub mod error;
pub mod incident;
pub mod status;
pub mod token;
pub mod user;

pub use status::Principal;
pub use store::incidents::{IncidentStatus, Model as Incident};
pub use store::users::{Model as User, Role};
