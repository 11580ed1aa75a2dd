use std::path::Path;

use chrono::{Local, NaiveDateTime};
use momo_core::{
    DatePolicy, RejectionReason, TransactionSink, ValidatedTransaction, ValidationPolicy,
};
use serde::Serialize;
use thiserror::Error;

use crate::extract::Extractor;
use crate::report::{Rejection, RejectionReporter};
use crate::rules::RuleTable;
use crate::source::{self, RawMessage, SourceError};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Source(#[from] SourceError),
}

/// Counts for one batch. Always produced, even when nothing was accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub accepted: usize,
    pub uncategorized: usize,
    pub missing_amount: usize,
    pub missing_date: usize,
    pub missing_transaction_id: usize,
    pub sink_failures: usize,
}

impl BatchSummary {
    pub fn rejected(&self) -> usize {
        self.uncategorized
            + self.missing_amount
            + self.missing_date
            + self.missing_transaction_id
            + self.sink_failures
    }

    fn count(&mut self, reason: RejectionReason) {
        match reason {
            RejectionReason::Uncategorized => self.uncategorized += 1,
            RejectionReason::MissingAmount => self.missing_amount += 1,
            RejectionReason::MissingDate => self.missing_date += 1,
            RejectionReason::MissingTransactionId => self.missing_transaction_id += 1,
        }
    }
}

/// Orchestrates: categorize → extract → validate → sink | reporter.
pub struct ImportPipeline {
    rules: RuleTable,
    validation: ValidationPolicy,
    date_policy: DatePolicy,
}

impl ImportPipeline {
    pub fn new(rules: RuleTable, validation: ValidationPolicy, date_policy: DatePolicy) -> Self {
        Self {
            rules,
            validation,
            date_policy,
        }
    }

    /// Run one body through categorization, extraction and validation.
    /// Pure apart from `now`, which backs synthesized dates.
    pub fn process_body(
        &self,
        body: &str,
        now: NaiveDateTime,
    ) -> Result<ValidatedTransaction, RejectionReason> {
        let category = self.rules.categorize(body);
        let record = Extractor::new(&self.rules, self.date_policy).extract_at(body, category, now);
        ValidatedTransaction::validate(record, self.validation)
    }

    /// Load the document at `path` and run it. Only source errors are fatal.
    pub async fn run_file<S, R>(
        &self,
        path: &Path,
        sink: &S,
        reporter: &R,
    ) -> Result<BatchSummary, PipelineError>
    where
        S: TransactionSink,
        R: RejectionReporter,
    {
        let messages = source::load_file(path)?;
        tracing::info!(path = %path.display(), messages = messages.len(), "loaded SMS export");
        Ok(self.run(&messages, sink, reporter).await)
    }

    pub async fn run<S, R>(&self, messages: &[RawMessage], sink: &S, reporter: &R) -> BatchSummary
    where
        S: TransactionSink,
        R: RejectionReporter,
    {
        self.run_at(messages, Local::now().naive_local(), sink, reporter)
            .await
    }

    /// Process `messages` in document order. `now` is the batch processing
    /// time used for synthesized dates.
    pub async fn run_at<S, R>(
        &self,
        messages: &[RawMessage],
        now: NaiveDateTime,
        sink: &S,
        reporter: &R,
    ) -> BatchSummary
    where
        S: TransactionSink,
        R: RejectionReporter,
    {
        let mut summary = BatchSummary {
            total: messages.len(),
            ..BatchSummary::default()
        };

        for msg in messages {
            let seq = msg.index;
            match self.process_body(&msg.body, now) {
                Ok(tx) => match sink.insert(&tx).await {
                    Ok(id) => {
                        tracing::debug!(seq, id, category = %tx.transaction_type, amount = tx.amount, "stored transaction");
                        summary.accepted += 1;
                    }
                    Err(e) => {
                        tracing::error!(seq, raw_body = %msg.body, "failed to store transaction: {e}");
                        summary.sink_failures += 1;
                        reporter.report(seq, &msg.body, &Rejection::SinkFailed(e.to_string()));
                    }
                },
                Err(reason) => {
                    tracing::debug!(seq, %reason, "rejected message");
                    summary.count(reason);
                    reporter.report(seq, &msg.body, &Rejection::Invalid(reason));
                }
            }
        }

        tracing::info!(
            total = summary.total,
            accepted = summary.accepted,
            rejected = summary.rejected(),
            sink_failures = summary.sink_failures,
            "batch complete"
        );
        summary
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
