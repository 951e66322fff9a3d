//! Cross-context change notification.
//!
//! Every committed store write is announced on a broadcast channel. Each
//! execution context (a "tab") holds a [`ContextId`]; subscribers never see
//! notifications for their own writes, which prevents self-triggered reload
//! loops. Rapid writes are deliberately not deduplicated — handlers must be
//! cheap, idempotent re-reads.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

// ============================================================================
// ContextId
// ============================================================================

/// Identity of one execution context participating in the shared store.
///
/// Two store handles with different context ids behave like two browser
/// tabs: each sees the other's writes, never its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(u64);

impl std::fmt::Display for ContextId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ctx-{}", self.0)
    }
}

// ============================================================================
// ChangeEvent
// ============================================================================

/// A committed write to the shared store.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    /// The key that was written.
    pub key: String,
    /// The context that performed the write.
    pub writer: ContextId,
}

// ============================================================================
// ChangeNotifier
// ============================================================================

/// Broadcasts store changes to every other open execution context.
///
/// Built on a tokio broadcast channel. Notifications are sent only after
/// the triggering write has been committed; no observer sees a write that
/// is still in flight. No ordering is guaranteed between writes from two
/// different contexts.
#[derive(Debug, Clone)]
pub struct ChangeNotifier {
    sender: broadcast::Sender<ChangeEvent>,
    next_context: Arc<AtomicU64>,
}

impl ChangeNotifier {
    /// Creates a new `ChangeNotifier` with the specified buffer capacity.
    ///
    /// The buffer determines how many events can be queued per subscriber
    /// before old events are dropped.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            next_context: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Allocates an identity for a new execution context.
    #[must_use]
    pub fn context(&self) -> ContextId {
        ContextId(self.next_context.fetch_add(1, Ordering::Relaxed))
    }

    /// Announces a committed write to all subscribers.
    ///
    /// Returns the number of active receivers. A return value of 0 means
    /// no other context is currently listening, which is fine.
    pub fn notify(&self, key: &str, writer: ContextId) -> usize {
        let event = ChangeEvent {
            key: key.to_string(),
            writer,
        };
        // send() returns Err only if there are no receivers, which is fine
        self.sender.send(event).unwrap_or(0)
    }

    /// Low-level subscription to the raw event stream.
    ///
    /// The receiver sees every event, including ones from the caller's own
    /// context; most callers want [`ChangeNotifier::subscribe`] instead.
    #[must_use]
    pub fn watch(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }

    /// Subscribes a handler to external writes of matching keys.
    ///
    /// `handler` runs once per write performed by a context other than
    /// `context` whose key satisfies `predicate`. The returned
    /// [`Subscription`] must be kept alive for as long as the owning
    /// context wants notifications; dropping it (or calling
    /// [`Subscription::unsubscribe`]) stops delivery and releases the
    /// observer.
    pub fn subscribe<P, F>(&self, context: ContextId, predicate: P, mut handler: F) -> Subscription
    where
        P: Fn(&str) -> bool + Send + 'static,
        F: FnMut() + Send + 'static,
    {
        let mut receiver = self.sender.subscribe();
        let handle = tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(event) => {
                        if event.writer == context {
                            // Never notify the writer's own context.
                            continue;
                        }
                        if !predicate(&event.key) {
                            continue;
                        }
                        debug!(key = %event.key, writer = %event.writer, "External change");
                        handler();
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        // Handlers are idempotent re-reads, so a single
                        // catch-up invocation covers the missed events.
                        warn!(missed = n, "Change subscriber lagged");
                        handler();
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        Subscription { handle }
    }

    /// Returns the number of active subscribers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new(100)
    }
}

// ============================================================================
// Subscription
// ============================================================================

/// Handle to an active change subscription.
///
/// Dropping the subscription unsubscribes the handler; contexts must not
/// leak these past their own teardown.
#[derive(Debug)]
pub struct Subscription {
    handle: JoinHandle<()>,
}

impl Subscription {
    /// Stops delivery and releases the observer.
    pub fn unsubscribe(self) {
        self.handle.abort();
    }

    /// Returns `true` if the subscription is still delivering events.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

// ============================================================================
// Tests
// ============================================================================
