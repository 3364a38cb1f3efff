use crate::transaction::TransactionStatus;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    /// The command is not allowed in the current status. Nothing was emitted.
    #[error("illegal state transition: cannot {command} a transaction that {}", describe(.status))]
    IllegalStateTransition {
        command: &'static str,
        status: Option<TransactionStatus>,
    },
}

fn describe(status: &Option<TransactionStatus>) -> String {
    match status {
        Some(status) => format!("is {}", status),
        None => "does not exist".to_string(),
    }
}
