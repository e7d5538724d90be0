//! In-process event bus for downstream consumers.
//!
//! Subscribers register by event-type name and are invoked after the
//! repository has durably appended the events. Subscriber failures are
//! logged at the publishing boundary and never reach the aggregate.

use crate::events::DomainEvent;
use crate::Result;
use std::collections::HashMap;

type Handler = Box<dyn Fn(&DomainEvent) -> Result<()> + Send + Sync>;

/// Subscribe-by-name event bus
#[derive(Default)]
pub struct EventBus {
    subscribers: HashMap<String, Vec<Handler>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for one event-type name (e.g. "SessionTicked")
    pub fn subscribe<F>(&mut self, event_type: impl Into<String>, handler: F)
    where
        F: Fn(&DomainEvent) -> Result<()> + Send + Sync + 'static,
    {
        self.subscribers
            .entry(event_type.into())
            .or_default()
            .push(Box::new(handler));
    }

    /// Deliver events to their subscribers in order
    ///
    /// Handler errors are logged and swallowed; publication never fails.
    pub fn publish(&self, events: &[DomainEvent]) {
        for event in events {
            let Some(handlers) = self.subscribers.get(event.event_type()) else {
                continue;
            };
            for handler in handlers {
                if let Err(e) = handler(event) {
                    tracing::warn!("Subscriber failed on {}: {}", event.event_type(), e);
                }
            }
        }
    }
}
