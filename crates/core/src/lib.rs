//! `dashgate-core`: wire-level building blocks shared by the gateway and the console.
//!
//! Nothing in here performs IO.

pub mod envelope;
pub mod error;
pub mod id;

pub use envelope::ErrorEnvelope;
pub use error::IdError;
pub use id::{RequestId, RoleId, UserId};
