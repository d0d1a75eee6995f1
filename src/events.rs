//! Lifecycle and status event delivery
//!
//! Events are pushed to zero-or-more subscribers, decoupled from request
//! completion. Delivery is fire-and-forget: each subscriber has its own
//! unbounded channel, so a slow subscriber never blocks the publisher, and
//! there is no replay buffer. A subscriber registered after an event was
//! published never sees it.

use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use uuid::Uuid;

/// Events pushed across the boundary to the host.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Event {
    /// The engine finished initializing. No payload.
    Ready,
    /// A human-readable progress update.
    Status { status: String, message: String },
    /// A generated response. Part of the host contract; the facade currently
    /// resolves generations directly instead of publishing them.
    Response { text: String },
    /// A failure announcement. Carries only boundary-safe fields.
    Error { code: String, message: String },
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Ready => EventKind::Ready,
            Event::Status { .. } => EventKind::Status,
            Event::Response { .. } => EventKind::Response,
            Event::Error { .. } => EventKind::Error,
        }
    }

    /// The event name the host subscribes under.
    pub fn wire_name(&self) -> &'static str {
        self.kind().wire_name()
    }
}

/// Event categories a subscriber can register for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Ready,
    Status,
    Response,
    Error,
}

impl EventKind {
    pub fn wire_name(&self) -> &'static str {
        match self {
            EventKind::Ready => "onLLMReady",
            EventKind::Status => "onLLMStatus",
            EventKind::Response => "onLLMResponse",
            EventKind::Error => "onLLMError",
        }
    }
}

/// Handle identifying one subscription.
pub type SubscriptionId = Uuid;

/// Receiving side of a subscription.
///
/// Dropping the subscription is enough to stop delivery; the notifier prunes
/// the registration on the next publish. `unsubscribe` removes it eagerly.
pub struct Subscription {
    id: SubscriptionId,
    receiver: UnboundedReceiver<Event>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Waits for the next event of the subscribed kind.
    ///
    /// Returns `None` once the notifier is gone.
    pub async fn recv(&mut self) -> Option<Event> {
        self.receiver.recv().await
    }

    /// Returns the next already-delivered event, if any.
    pub fn try_recv(&mut self) -> Option<Event> {
        self.receiver.try_recv().ok()
    }
}

struct Registration {
    kind: EventKind,
    sender: UnboundedSender<Event>,
}

/// Fan-out registry delivering events to current subscribers.
pub struct EventNotifier {
    subscribers: DashMap<SubscriptionId, Registration>,
}

impl EventNotifier {
    pub fn new() -> Self {
        Self {
            subscribers: DashMap::new(),
        }
    }

    /// Registers a subscriber for one event kind.
    pub fn subscribe(&self, kind: EventKind) -> Subscription {
        let id = Uuid::new_v4();
        let (sender, receiver) = mpsc::unbounded_channel();
        self.subscribers.insert(id, Registration { kind, sender });
        tracing::debug!("subscriber {} registered for {}", id, kind.wire_name());
        Subscription { id, receiver }
    }

    /// Removes a subscription. Returns false if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscribers.remove(&id).is_some()
    }

    /// Delivers `event` to every matching subscriber.
    ///
    /// Registrations whose receiver has been dropped are pruned here.
    pub fn publish(&self, event: &Event) {
        self.subscribers.retain(|_, registration| {
            if registration.kind != event.kind() {
                return true;
            }
            registration.sender.send(event.clone()).is_ok()
        });
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl Default for EventNotifier {
    fn default() -> Self {
        Self::new()
    }
}
