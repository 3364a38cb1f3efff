use std::marker::PhantomData;
use std::ops::Deref;

use async_trait::async_trait;
use serde_json::Value;

use crate::{Aggregate, StoreEvent};

/// Error type returned by event handlers. It is only ever logged.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// This trait is used to implement an `EventHandler`. An event handler is intended to be an entity
/// which can create, update and delete a read side and perform side effects.
///
/// Handlers are registered on an [`crate::EventBus`] for an event type and run after the events
/// are committed. Whatever they return (or if they panic) the append they react to stays
/// committed: failures are logged and never retried.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Handle an event and perform an action. This action could be over a read model or a side-effect.
    async fn handle(&self, event: &StoreEvent<Value>) -> Result<(), HandlerError>;

    /// The name of the event handler. By default, this is the type name of the event handler,
    /// but it can be overridden to provide a custom name. This name is used as
    /// part of tracing spans, to identify the event handler being run.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

#[async_trait]
impl<Q, T> EventHandler for T
where
    Q: EventHandler + ?Sized,
    T: Deref<Target = Q> + Send + Sync,
{
    /// Deref call to [`EventHandler::handle`].
    async fn handle(&self, event: &StoreEvent<Value>) -> Result<(), HandlerError> {
        self.deref().handle(event).await
    }

    /// Deref call to [`EventHandler::name`].
    fn name(&self) -> &'static str {
        self.deref().name()
    }
}

/// An event handler receiving the decoded events of a single aggregate type. Register it on a bus
/// wrapped in [`Typed`].
#[async_trait]
pub trait AggregateEventHandler<A>: Send + Sync
where
    A: Aggregate,
{
    async fn handle(&self, event: &StoreEvent<A::Event>) -> Result<(), HandlerError>;

    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Adapter turning an [`AggregateEventHandler`] into an [`EventHandler`].
///
/// Events of other aggregate types sharing the same event type name are skipped. A payload that
/// does not decode into `A::Event` is reported as a handler error.
pub struct Typed<A, H> {
    handler: H,
    _aggregate: PhantomData<fn() -> A>,
}

impl<A, H> Typed<A, H>
where
    A: Aggregate,
    H: AggregateEventHandler<A>,
{
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            _aggregate: PhantomData,
        }
    }

    pub fn inner(&self) -> &H {
        &self.handler
    }
}

#[async_trait]
impl<A, H> EventHandler for Typed<A, H>
where
    A: Aggregate,
    H: AggregateEventHandler<A>,
{
    async fn handle(&self, event: &StoreEvent<Value>) -> Result<(), HandlerError> {
        if event.aggregate_type != A::NAME {
            return Ok(());
        }

        let event: StoreEvent<A::Event> = event.decode()?;
        self.handler.handle(&event).await
    }

    fn name(&self) -> &'static str {
        self.handler.name()
    }
}
