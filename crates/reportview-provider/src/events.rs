use std::sync::{Arc, Mutex, PoisonError};

use crate::types::UpdateEvent;

/// Receiving end of a provider subscription.
#[derive(Clone)]
pub struct EventSink {
    deliver: Arc<dyn Fn(UpdateEvent) + Send + Sync>,
}

impl EventSink {
    pub fn new(deliver: impl Fn(UpdateEvent) + Send + Sync + 'static) -> Self {
        Self {
            deliver: Arc::new(deliver),
        }
    }

    pub fn emit(&self, event: UpdateEvent) {
        (self.deliver)(event);
    }
}

impl std::fmt::Debug for EventSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSink").finish_non_exhaustive()
    }
}

/// Fan-out of provider events to every subscribed sink, in subscription order.
#[derive(Debug, Default)]
pub struct EventHub {
    sinks: Mutex<Vec<EventSink>>,
}

impl EventHub {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, sink: EventSink) {
        self.sinks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(sink);
    }

    pub fn emit(&self, event: &UpdateEvent) {
        log::debug!("Provider event: {}", event.name());
        let sinks = self
            .sinks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for sink in sinks {
            sink.emit(event.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.sinks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
