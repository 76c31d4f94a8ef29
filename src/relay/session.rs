//! At most one active relay per chat session
//!
//! A caller that sends a new message while the previous answer is still
//! streaming wants the old answer abandoned. Each relay registers under its
//! session ID; registering again aborts the earlier relay's stream, which
//! drops its upstream connection.

use futures::Stream;
use futures::stream::{AbortHandle, AbortRegistration, Abortable};
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};

/// Header carrying the caller's chat session ID
pub const SESSION_HEADER: &str = "x-session-id";

#[derive(Debug)]
struct ActiveRelay {
    ticket: u64,
    abort: AbortHandle,
}

#[derive(Debug, Default)]
struct Inner {
    active: Mutex<HashMap<String, ActiveRelay>>,
    next_ticket: AtomicU64,
}

impl Inner {
    // The map is only touched in short non-async sections, so a poisoned
    // lock still holds a consistent map.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, ActiveRelay>> {
        self.active.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Registry of in-flight relays keyed by session ID
///
/// Cheap to clone; clones share the same registry.
#[derive(Clone, Debug, Default)]
pub struct SessionRegistry {
    inner: Arc<Inner>,
}

/// Result of registering a relay for a session
#[derive(Debug)]
pub struct Registration {
    lease: SessionLease,
    abort: AbortRegistration,
    superseded: bool,
}

impl Registration {
    /// Whether an earlier relay of the same session was aborted
    pub fn superseded(&self) -> bool {
        self.superseded
    }

    /// Bind a stream to this registration
    ///
    /// The returned stream ends early if a newer relay supersedes it, and
    /// releases the session slot when dropped.
    pub fn bind<S>(self, stream: S) -> SessionBound<S>
    where
        S: Stream,
    {
        SessionBound {
            inner: Box::pin(Abortable::new(stream, self.abort)),
            _lease: self.lease,
        }
    }
}

/// Holds a session slot; releases it on drop unless a newer relay took it
#[derive(Debug)]
pub struct SessionLease {
    registry: Arc<Inner>,
    session_id: String,
    ticket: u64,
}

impl Drop for SessionLease {
    fn drop(&mut self) {
        let mut active = self.registry.lock();
        if active
            .get(&self.session_id)
            .is_some_and(|relay| relay.ticket == self.ticket)
        {
            active.remove(&self.session_id);
        }
    }
}

impl SessionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new relay for `session_id`, aborting any relay already active
    pub fn register(&self, session_id: &str) -> Registration {
        let ticket = self.inner.next_ticket.fetch_add(1, Ordering::Relaxed);
        let (handle, registration) = AbortHandle::new_pair();

        let previous = self.inner.lock().insert(
            session_id.to_string(),
            ActiveRelay {
                ticket,
                abort: handle,
            },
        );

        let superseded = match previous {
            Some(previous) => {
                previous.abort.abort();
                tracing::debug!(
                    session_id = %session_id,
                    "Aborted in-flight relay superseded by a newer message"
                );
                true
            }
            None => false,
        };

        Registration {
            lease: SessionLease {
                registry: Arc::clone(&self.inner),
                session_id: session_id.to_string(),
                ticket,
            },
            abort: registration,
            superseded,
        }
    }

    /// Number of sessions with an active relay
    pub fn active_count(&self) -> usize {
        self.inner.lock().len()
    }

    /// Whether `session_id` has an active relay
    pub fn is_active(&self, session_id: &str) -> bool {
        self.inner.lock().contains_key(session_id)
    }
}

/// A stream tied to a session slot
pub struct SessionBound<S> {
    inner: Pin<Box<Abortable<S>>>,
    _lease: SessionLease,
}

impl<S> Stream for SessionBound<S>
where
    S: Stream,
{
    type Item = S::Item;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}
