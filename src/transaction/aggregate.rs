use uuid::Uuid;

use crate::transaction::{TransactionCommand, TransactionError, TransactionEvent, TransactionState, TransactionStatus};
use crate::{Aggregate, AggregateRoot, EventContext};

pub struct TransactionAggregate;

impl Aggregate for TransactionAggregate {
    const NAME: &'static str = "transaction";
    type State = TransactionState;
    type Command = TransactionCommand;
    type Event = TransactionEvent;
    type Error = TransactionError;

    fn handle_command(state: &Self::State, command: Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match (state.status, command) {
            (
                None,
                TransactionCommand::Create {
                    order_id,
                    amount,
                    currency,
                },
            ) => Ok(vec![TransactionEvent::TransactionCreated {
                order_id,
                amount,
                currency,
            }]),
            (
                Some(TransactionStatus::Pending),
                TransactionCommand::CompletePayment {
                    gateway_transaction_id,
                },
            ) => Ok(vec![TransactionEvent::PaymentCompleted {
                gateway_transaction_id,
            }]),
            (Some(TransactionStatus::Pending), TransactionCommand::FailPayment { reason }) => {
                Ok(vec![TransactionEvent::PaymentFailed { reason }])
            }
            (Some(TransactionStatus::Completed), TransactionCommand::RefundPayment { reason }) => {
                Ok(vec![TransactionEvent::PaymentRefunded { reason }])
            }
            (status, command) => Err(TransactionError::IllegalStateTransition {
                command: command.name(),
                status,
            }),
        }
    }

    fn apply_event(state: Self::State, payload: &Self::Event) -> Self::State {
        match payload {
            TransactionEvent::TransactionCreated {
                order_id,
                amount,
                currency,
            } => TransactionState {
                status: Some(TransactionStatus::Pending),
                order_id: Some(order_id.clone()),
                amount: *amount,
                currency: currency.clone(),
                ..state
            },
            TransactionEvent::PaymentCompleted {
                gateway_transaction_id,
            } => TransactionState {
                status: Some(TransactionStatus::Completed),
                gateway_transaction_id: Some(gateway_transaction_id.clone()),
                ..state
            },
            TransactionEvent::PaymentFailed { reason } => TransactionState {
                status: Some(TransactionStatus::Failed),
                failure_reason: Some(reason.clone()),
                ..state
            },
            TransactionEvent::PaymentRefunded { reason } => TransactionState {
                status: Some(TransactionStatus::Refunded),
                refund_reason: Some(reason.clone()),
                ..state
            },
        }
    }
}

/// A live financial transaction.
pub type PaymentTransaction = AggregateRoot<TransactionAggregate>;

impl AggregateRoot<TransactionAggregate> {
    /// Starts a new, pending, transaction. The returned root holds the `TransactionCreated` event
    /// until it is saved.
    pub fn create_new(
        id: impl Into<Uuid>,
        order_id: impl Into<String>,
        amount: i64,
        currency: impl Into<String>,
        context: &EventContext,
    ) -> Result<Self, TransactionError> {
        let mut root = Self::new(id);

        root.handle(
            TransactionCommand::Create {
                order_id: order_id.into(),
                amount,
                currency: currency.into(),
            },
            context,
        )?;

        Ok(root)
    }

    pub fn complete_payment(
        &mut self,
        gateway_transaction_id: impl Into<String>,
        context: &EventContext,
    ) -> Result<(), TransactionError> {
        self.handle(
            TransactionCommand::CompletePayment {
                gateway_transaction_id: gateway_transaction_id.into(),
            },
            context,
        )
    }

    pub fn fail_payment(&mut self, reason: impl Into<String>, context: &EventContext) -> Result<(), TransactionError> {
        self.handle(TransactionCommand::FailPayment { reason: reason.into() }, context)
    }

    pub fn refund_payment(
        &mut self,
        reason: impl Into<String>,
        context: &EventContext,
    ) -> Result<(), TransactionError> {
        self.handle(TransactionCommand::RefundPayment { reason: reason.into() }, context)
    }

    pub fn status(&self) -> Option<TransactionStatus> {
        self.state().status
    }
}
