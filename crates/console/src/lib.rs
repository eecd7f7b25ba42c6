//! `dashgate-console`: the operator console's client-side core.
//!
//! - `session`: the signed-in operator, shared by everything below
//! - `gate`: page guard, capability queries and action guard
//! - `client`: talks to the gateway and keeps the session in step

pub mod client;
pub mod gate;
pub mod session;

pub use client::{ConsoleClient, ConsoleError};
pub use gate::{
    ActionGuard, Capability, CapabilityWatch, GateError, GuardedAction, Navigation, Notice, Notifier,
    PageGuard, TracingNotifier,
};
pub use session::{Session, SessionContext, SessionEvent, Subscription};
