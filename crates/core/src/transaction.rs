use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::category::Category;
use super::policy::ValidationPolicy;

/// A record as produced by the extractor, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub transaction_id: Option<String>,
    /// `None` when no rule matched the body.
    pub transaction_type: Option<Category>,
    /// Whole RWF.
    pub amount: Option<i64>,
    pub receiver: Option<String>,
    pub sender: Option<String>,
    pub phone_number: Option<String>,
    pub agent: Option<String>,
    pub code: Option<String>,
    /// `YYYY-MM-DD HH:MM:SS`.
    pub date: Option<String>,
    pub message: String,
    pub raw_body: String,
}

impl TransactionRecord {
    /// An empty candidate carrying only the body.
    pub fn new(body: &str, transaction_type: Option<Category>) -> Self {
        TransactionRecord {
            transaction_id: None,
            transaction_type,
            amount: None,
            receiver: None,
            sender: None,
            phone_number: None,
            agent: None,
            code: None,
            date: None,
            message: body.to_string(),
            raw_body: body.to_string(),
        }
    }
}

/// Why a candidate record was not stored. Exactly one per rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    #[error("Uncategorized message")]
    Uncategorized,
    #[error("Message with missing amount")]
    MissingAmount,
    #[error("Message with missing date")]
    MissingDate,
    #[error("Message with missing transaction id")]
    MissingTransactionId,
}

/// A record that satisfies the active [`ValidationPolicy`]; maps 1:1 onto a
/// `transactions` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedTransaction {
    pub id: Option<i64>,
    pub transaction_id: Option<String>,
    pub transaction_type: Category,
    pub amount: i64,
    pub receiver: Option<String>,
    pub sender: Option<String>,
    pub phone_number: Option<String>,
    pub agent: Option<String>,
    pub code: Option<String>,
    pub date: String,
    pub message: Option<String>,
    pub raw_body: Option<String>,
}

impl ValidatedTransaction {
    pub fn validate(
        tx: TransactionRecord,
        policy: ValidationPolicy,
    ) -> Result<ValidatedTransaction, RejectionReason> {
        let transaction_type = tx.transaction_type.ok_or(RejectionReason::Uncategorized)?;
        let amount = tx
            .amount
            .filter(|a| *a >= 0)
            .ok_or(RejectionReason::MissingAmount)?;
        let date = tx.date.ok_or(RejectionReason::MissingDate)?;

        if policy == ValidationPolicy::Strict && tx.transaction_id.is_none() {
            return Err(RejectionReason::MissingTransactionId);
        }

        Ok(ValidatedTransaction {
            id: None,
            transaction_id: tx.transaction_id,
            transaction_type,
            amount,
            receiver: tx.receiver,
            sender: tx.sender,
            phone_number: tx.phone_number,
            agent: tx.agent,
            code: tx.code,
            date,
            message: Some(tx.message),
            raw_body: Some(tx.raw_body),
        })
    }
}
