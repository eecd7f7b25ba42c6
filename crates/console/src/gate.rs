//! RBAC gate: the three places the console enforces permissions.
//!
//! - [`PageGuard`]: route changes
//! - [`Capability`]: show/hide decisions for a single permission
//! - [`ActionGuard`]: user-triggered actions
//!
//! All three read the live [`SessionContext`] on every check and go through
//! [`dashgate_auth::authorize`]. Nothing is cached between attempts, and a
//! denial is a value, never a panic.

use std::fmt;
use std::future::Future;
use std::sync::mpsc::{RecvTimeoutError, TryRecvError};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use dashgate_auth::{authorize, has_permission, AuthzError, Permission, RouteMap};

use crate::session::{SessionContext, SessionEvent, Subscription};

/// User-visible notice raised by a denial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    InsufficientPermission { permission: Permission },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::InsufficientPermission { .. } => {
                f.write_str("You do not have permission to perform this action")
            }
        }
    }
}

/// Where notices go. The console UI plugs its toast layer in here.
pub trait Notifier {
    fn notify(&self, notice: &Notice);
}

impl<N: Notifier + ?Sized> Notifier for Arc<N> {
    fn notify(&self, notice: &Notice) {
        (**self).notify(notice)
    }
}

impl<N: Notifier + ?Sized> Notifier for &N {
    fn notify(&self, notice: &Notice) {
        (**self).notify(notice)
    }
}

/// Logs notices at `warn`. Used when no UI is attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: &Notice) {
        match notice {
            Notice::InsufficientPermission { permission } => {
                tracing::warn!(%permission, "{notice}");
            }
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GateError {
    #[error("action denied: {0}")]
    Denied(AuthzError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// The route changed.
    Entered { path: String },
    /// Denied; the current route is unchanged.
    Cancelled { stay_on: String },
    /// Nobody is signed in. The route changed without a check.
    Unguarded { path: String },
}

/// Guards route changes against the route permission map.
#[derive(Debug)]
pub struct PageGuard<N> {
    session: SessionContext,
    routes: RouteMap,
    notifier: N,
    current: String,
}

impl<N: Notifier> PageGuard<N> {
    pub fn new(session: SessionContext, notifier: N) -> Self {
        Self::with_routes(session, RouteMap::default(), notifier)
    }

    pub fn with_routes(session: SessionContext, routes: RouteMap, notifier: N) -> Self {
        Self {
            session,
            routes,
            notifier,
            current: "/".to_string(),
        }
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    pub fn navigate(&mut self, to: &str) -> Navigation {
        let Some(session) = self.session.current() else {
            // Unauthenticated routing is someone else's job.
            self.current = to.to_string();
            return Navigation::Unguarded {
                path: self.current.clone(),
            };
        };

        let required = self.routes.required_permission(to);
        match authorize(Some(&session.user), required) {
            Ok(()) => {
                self.current = to.to_string();
                Navigation::Entered {
                    path: self.current.clone(),
                }
            }
            Err(err) => {
                tracing::debug!(from = %self.current, to, error = %err, "navigation cancelled");
                if let Some(permission) = err.missing_permission() {
                    self.notifier.notify(&Notice::InsufficientPermission {
                        permission: permission.clone(),
                    });
                }
                Navigation::Cancelled {
                    stay_on: self.current.clone(),
                }
            }
        }
    }
}

/// "Does the operator hold this permission right now?"
#[derive(Debug, Clone)]
pub struct Capability {
    session: SessionContext,
    permission: Permission,
}

impl Capability {
    pub fn new(session: SessionContext, permission: impl Into<Permission>) -> Self {
        Self {
            session,
            permission: permission.into(),
        }
    }

    pub fn permission(&self) -> &Permission {
        &self.permission
    }

    pub fn is_granted(&self) -> bool {
        let session = self.session.current();
        has_permission(session.as_ref().map(|s| &s.user), Some(&self.permission))
    }

    /// Follow the answer across session changes.
    pub fn watch(&self) -> CapabilityWatch {
        CapabilityWatch {
            permission: self.permission.clone(),
            events: self.session.subscribe(),
        }
    }
}

/// Yields the recomputed answer after every session event.
#[derive(Debug)]
pub struct CapabilityWatch {
    permission: Permission,
    events: Subscription<SessionEvent>,
}

impl CapabilityWatch {
    fn evaluate(&self, event: &SessionEvent) -> bool {
        has_permission(event.session().map(|s| &s.user), Some(&self.permission))
    }

    /// Block for the next change. `None` once the session context is gone.
    pub fn recv(&self) -> Option<bool> {
        self.events.recv().ok().map(|event| self.evaluate(&event))
    }

    pub fn try_recv(&self) -> Result<bool, TryRecvError> {
        self.events.try_recv().map(|event| self.evaluate(&event))
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<bool, RecvTimeoutError> {
        self.events.recv_timeout(timeout).map(|event| self.evaluate(&event))
    }
}

/// Runs an action only if the operator holds the permission at call time.
///
/// A denied action is never invoked, not even partially; for async actions
/// the future is never constructed.
#[derive(Debug, Clone)]
pub struct ActionGuard<N> {
    session: SessionContext,
    notifier: N,
}

impl<N: Notifier> ActionGuard<N> {
    pub fn new(session: SessionContext, notifier: N) -> Self {
        Self { session, notifier }
    }

    pub fn check(&self, permission: &Permission) -> Result<(), GateError> {
        let session = self.session.current();
        authorize(session.as_ref().map(|s| &s.user), Some(permission)).map_err(|err| {
            tracing::debug!(%permission, error = %err, "action blocked");
            self.notifier.notify(&Notice::InsufficientPermission {
                permission: permission.clone(),
            });
            GateError::Denied(err)
        })
    }

    pub fn run<T>(&self, permission: &Permission, action: impl FnOnce() -> T) -> Result<T, GateError> {
        self.check(permission)?;
        Ok(action())
    }

    pub async fn run_async<F, Fut, T>(&self, permission: &Permission, make: F) -> Result<T, GateError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        self.check(permission)?;
        Ok(make().await)
    }

    /// Bind an action to a permission for repeated invocation.
    pub fn wrap<F>(&self, permission: impl Into<Permission>, action: F) -> GuardedAction<N, F>
    where
        N: Clone,
    {
        GuardedAction {
            guard: self.clone(),
            permission: permission.into(),
            action,
        }
    }
}

/// An action that re-checks its permission on every call.
#[derive(Debug)]
pub struct GuardedAction<N, F> {
    guard: ActionGuard<N>,
    permission: Permission,
    action: F,
}

impl<N: Notifier, F> GuardedAction<N, F> {
    pub fn permission(&self) -> &Permission {
        &self.permission
    }

    pub fn invoke<T>(&mut self) -> Result<T, GateError>
    where
        F: FnMut() -> T,
    {
        self.guard.check(&self.permission)?;
        Ok((self.action)())
    }
}
