use serde::{Deserialize, Serialize};

use crate::Event;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum TransactionEvent {
    TransactionCreated {
        order_id: String,
        amount: i64,
        currency: String,
    },
    PaymentCompleted {
        gateway_transaction_id: String,
    },
    PaymentFailed {
        reason: String,
    },
    PaymentRefunded {
        reason: String,
    },
}

impl Event for TransactionEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::TransactionCreated { .. } => "TransactionCreated",
            Self::PaymentCompleted { .. } => "PaymentCompleted",
            Self::PaymentFailed { .. } => "PaymentFailed",
            Self::PaymentRefunded { .. } => "PaymentRefunded",
        }
    }
}
