use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::Instrument;

use crate::handler::EventHandler;
use crate::StoreEvent;

type Handlers = HashMap<String, Vec<Arc<dyn EventHandler>>>;

/// In-process publish/subscribe for committed events.
///
/// The bus is a plain value: the service composing the store creates it (or lets the store builder
/// create one), registers handlers on it and hands it to the store. Clones share the same
/// registrations.
///
/// Delivery is best-effort: handlers run after the append committed, their errors and panics are
/// logged and swallowed.
#[derive(Clone, Default)]
pub struct EventBus {
    handlers: Arc<RwLock<Handlers>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for every event stored under `event_type`.
    ///
    /// Since it appends the handler to a [`RwLock`] this function needs to be `async`.
    pub async fn subscribe(&self, event_type: impl Into<String>, handler: impl EventHandler + 'static) {
        self.subscribe_shared(event_type, Arc::new(handler)).await
    }

    /// Same as [`EventBus::subscribe`], for a handler that is already shared.
    pub async fn subscribe_shared(&self, event_type: impl Into<String>, handler: Arc<dyn EventHandler>) {
        let mut guard = self.handlers.write().await;
        guard.entry(event_type.into()).or_default().push(handler);
    }

    /// How many handlers are registered for `event_type`.
    pub async fn handler_count(&self, event_type: &str) -> usize {
        self.handlers
            .read()
            .await
            .get(event_type)
            .map_or(0, Vec::len)
    }

    /// Delivers the events, in order. For every event the handlers registered for its type run
    /// concurrently, and the next event is delivered once all of them are done.
    pub async fn publish(&self, store_events: &[StoreEvent<Value>]) {
        for store_event in store_events {
            // Handlers are cloned out so that one of them can subscribe without deadlocking.
            let handlers: Vec<Arc<dyn EventHandler>> = match self.handlers.read().await.get(&store_event.event_type) {
                Some(handlers) => handlers.clone(),
                None => continue,
            };

            let futures = handlers.iter().map(|handler| dispatch(handler.as_ref(), store_event));

            let _ = futures::future::join_all(futures).await;
        }
    }
}

async fn dispatch(handler: &dyn EventHandler, store_event: &StoreEvent<Value>) {
    let span = tracing::debug_span!(
        "esledger.event_handler",
        event_id = %store_event.id,
        event_type = %store_event.event_type,
        aggregate_id = %store_event.aggregate_id,
        event_handler = handler.name()
    );

    let outcome = AssertUnwindSafe(handler.handle(store_event))
        .catch_unwind()
        .instrument(span)
        .await;

    match outcome {
        Ok(Ok(())) => (),
        Ok(Err(error)) => tracing::error!({
            event_id = %store_event.id,
            aggregate_id = %store_event.aggregate_id,
            event_handler = handler.name(),
            error = ?error,
        }, "event handler failed to handle event"),
        Err(_) => tracing::error!({
            event_id = %store_event.id,
            aggregate_id = %store_event.aggregate_id,
            event_handler = handler.name(),
        }, "event handler panicked while handling event"),
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus").finish_non_exhaustive()
    }
}
