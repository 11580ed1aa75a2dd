use std::convert::Infallible;
use std::future::Future;
use std::sync::Mutex;

use super::transaction::ValidatedTransaction;

/// Destination for validated records. Inserts are append-only.
pub trait TransactionSink {
    type Error: std::fmt::Display;

    /// Store one record, returning its row id.
    fn insert(
        &self,
        tx: &ValidatedTransaction,
    ) -> impl Future<Output = Result<i64, Self::Error>> + Send;
}

/// Keeps records in memory; used for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<ValidatedTransaction>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<ValidatedTransaction> {
        self.records
            .lock()
            .map(|r| r.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TransactionSink for MemorySink {
    type Error = Infallible;

    fn insert(
        &self,
        tx: &ValidatedTransaction,
    ) -> impl Future<Output = Result<i64, Self::Error>> + Send {
        let mut records = self
            .records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut stored = tx.clone();
        let id = records.len() as i64 + 1;
        stored.id = Some(id);
        records.push(stored);
        std::future::ready(Ok(id))
    }
}
