pub enum TransactionCommand {
    Create {
        order_id: String,
        amount: i64,
        currency: String,
    },
    CompletePayment {
        gateway_transaction_id: String,
    },
    FailPayment {
        reason: String,
    },
    RefundPayment {
        reason: String,
    },
}

impl TransactionCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::CompletePayment { .. } => "complete",
            Self::FailPayment { .. } => "fail",
            Self::RefundPayment { .. } => "refund",
        }
    }
}
