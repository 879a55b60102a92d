//! In-page change notification (the `starjar:updated` event).
//!
//! Views subscribe once when mounted and reload from the store on every
//! publish. Publishing is synchronous and in subscription order; there is no
//! payload, so listeners must re-read the store, which is why mutations write
//! through *before* they publish.

use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Jar or collection changed: spawn, wish, reset, or another tab wrote
    /// one of the collection keys.
    Updated,
}

/// Returned by [`ChangeBus::subscribe`]; pass to `unsubscribe` to detach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionToken(u64);

type Handler = Rc<dyn Fn()>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    handlers: Vec<(u64, Topic, Handler)>,
}

/// Cheap to clone; clones share one registry.
#[derive(Clone, Default)]
pub struct ChangeBus {
    registry: Rc<RefCell<Registry>>,
}

impl ChangeBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, topic: Topic, handler: F) -> SubscriptionToken
    where
        F: Fn() + 'static,
    {
        let mut reg = self.registry.borrow_mut();
        let id = reg.next_id;
        reg.next_id += 1;
        reg.handlers.push((id, topic, Rc::new(handler)));
        SubscriptionToken(id)
    }

    /// Returns false if the token was already detached.
    pub fn unsubscribe(&self, token: SubscriptionToken) -> bool {
        let mut reg = self.registry.borrow_mut();
        let before = reg.handlers.len();
        reg.handlers.retain(|(id, _, _)| *id != token.0);
        reg.handlers.len() != before
    }

    /// Call every handler for `topic`. Handlers may subscribe or unsubscribe
    /// while running; such changes take effect from the next publish.
    pub fn publish(&self, topic: Topic) {
        let handlers: Vec<Handler> = self
            .registry
            .borrow()
            .handlers
            .iter()
            .filter(|(_, t, _)| *t == topic)
            .map(|(_, _, h)| Rc::clone(h))
            .collect();
        for handler in handlers {
            handler();
        }
    }

    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.registry
            .borrow()
            .handlers
            .iter()
            .filter(|(_, t, _)| *t == topic)
            .count()
    }
}
