//! Session/user context.
//!
//! One explicit handle, cloned into the gate and the client. Reads are
//! lock-free snapshots; the subscriber list is only locked on publish and
//! subscribe.
//!
//! Lifecycle: empty → `sign_in` → `refresh`* → `sign_out` → empty. A refresh
//! that lands after sign-out is dropped, so a slow profile fetch can never
//! bring a logged-out operator back.

use std::sync::mpsc::{self, Receiver, RecvError, RecvTimeoutError, TryRecvError};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};

use dashgate_auth::UserProfile;

/// Snapshot of the signed-in operator.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user: UserProfile,
    pub signed_in_at: DateTime<Utc>,
    pub refreshed_at: DateTime<Utc>,
}

impl Session {
    fn start(user: UserProfile) -> Self {
        let now = Utc::now();
        Self {
            user,
            signed_in_at: now,
            refreshed_at: now,
        }
    }

    fn refreshed(&self, user: UserProfile) -> Self {
        Self {
            user,
            signed_in_at: self.signed_in_at,
            refreshed_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    SignedIn(Arc<Session>),
    Refreshed(Arc<Session>),
    SignedOut,
}

impl SessionEvent {
    /// The session in effect after this event.
    pub fn session(&self) -> Option<&Arc<Session>> {
        match self {
            SessionEvent::SignedIn(session) | SessionEvent::Refreshed(session) => Some(session),
            SessionEvent::SignedOut => None,
        }
    }
}

/// Receiving end of [`SessionContext::subscribe`].
#[derive(Debug)]
pub struct Subscription<M> {
    receiver: Receiver<M>,
}

impl<M> Subscription<M> {
    fn new(receiver: Receiver<M>) -> Self {
        Self { receiver }
    }

    /// Block until the next message is available.
    pub fn recv(&self) -> Result<M, RecvError> {
        self.receiver.recv()
    }

    pub fn try_recv(&self) -> Result<M, TryRecvError> {
        self.receiver.try_recv()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<M, RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }
}

#[derive(Debug, Default)]
struct Inner {
    current: ArcSwapOption<Session>,
    subscribers: Mutex<Vec<mpsc::Sender<SessionEvent>>>,
}

/// Cloneable handle to the operator's session.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    inner: Arc<Inner>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Arc<Session>> {
        self.inner.current.load_full()
    }

    pub fn current_user(&self) -> Option<UserProfile> {
        self.current().map(|session| session.user.clone())
    }

    pub fn is_signed_in(&self) -> bool {
        self.inner.current.load().is_some()
    }

    /// Replace whatever was there with a fresh session for `user`.
    pub fn sign_in(&self, user: UserProfile) -> Arc<Session> {
        let session = Arc::new(Session::start(user));
        self.inner.current.store(Some(session.clone()));
        tracing::info!(user_id = %session.user.id, "operator signed in");
        self.publish(SessionEvent::SignedIn(session.clone()));
        session
    }

    /// Swap in an updated profile, keeping the sign-in time.
    ///
    /// Returns `None` (and changes nothing) when nobody is signed in.
    pub fn refresh(&self, user: UserProfile) -> Option<Arc<Session>> {
        let mut updated = None;
        self.inner.current.rcu(|current| {
            updated = current
                .as_ref()
                .map(|session| Arc::new(session.refreshed(user.clone())));
            updated.clone()
        });

        match updated {
            Some(session) => {
                tracing::debug!(user_id = %session.user.id, "operator profile refreshed");
                self.publish(SessionEvent::Refreshed(session.clone()));
                Some(session)
            }
            None => {
                tracing::debug!("profile refresh ignored: no active session");
                None
            }
        }
    }

    pub fn sign_out(&self) {
        if self.inner.current.swap(None).is_some() {
            tracing::info!("operator signed out");
        }
        self.publish(SessionEvent::SignedOut);
    }

    pub fn subscribe(&self) -> Subscription<SessionEvent> {
        let (tx, rx) = mpsc::channel();
        if let Ok(mut subs) = self.inner.subscribers.lock() {
            subs.push(tx);
        }
        Subscription::new(rx)
    }

    fn publish(&self, event: SessionEvent) {
        match self.inner.subscribers.lock() {
            // Drop dead subscribers while publishing.
            Ok(mut subs) => subs.retain(|tx| tx.send(event.clone()).is_ok()),
            Err(_) => tracing::error!("session subscriber list poisoned; event dropped"),
        }
    }
}
