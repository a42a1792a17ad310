use glam::IVec2;

use crate::generator::GeneratedChunk;

/// Lifecycle events published by the chunk manager.
#[derive(Clone, Debug, PartialEq)]
pub enum ChunkEvent {
    /// A chunk was generated and is about to be registered.
    Generated(GeneratedChunk),
    /// A chunk was unregistered.
    Destroyed(IVec2),
}

/// Handle returned by [`EventBus::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Box<dyn FnMut(&ChunkEvent)>;

/// Single-threaded publish/subscribe bus for [`ChunkEvent`]s. Subscribers
/// are called in subscription order.
#[derive(Default)]
pub struct EventBus {
    handlers: Vec<(SubscriptionId, Handler)>,
    next_id: u64,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, handler: impl FnMut(&ChunkEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.handlers.push((id, Box::new(handler)));
        id
    }

    /// Returns `false` if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(sub, _)| *sub != id);
        self.handlers.len() != before
    }

    pub fn publish(&mut self, event: &ChunkEvent) {
        for (_, handler) in &mut self.handlers {
            handler(event);
        }
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.handlers.len()
    }
}
