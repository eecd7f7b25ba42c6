//! `dashgate-auth`: permission catalog, operator profile and the RBAC predicate.
//!
//! This crate is intentionally decoupled from HTTP, storage and UI. Both the
//! gateway and the console depend on it for the one definition of "permitted".

pub mod authorize;
pub mod permissions;
pub mod roles;
pub mod routes;
pub mod user;

pub use authorize::{authorize, has_permission, AuthzError};
pub use permissions::Permission;
pub use roles::Role;
pub use routes::{RouteEntry, RouteMap};
pub use user::UserProfile;
