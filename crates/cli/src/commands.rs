use std::path::Path;

use anyhow::Context;
use momo_core::{format_rwf, Category, Config, MemorySink, ValidatedTransaction};
use momo_import::{BatchSummary, FileRejectionLog, ImportPipeline, MemoryRejectionLog, RuleTable};
use momo_storage::{DbPool, SqliteSink, Summary, TransactionFilter};
use serde::Serialize;

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn load_rules(config: &Config) -> anyhow::Result<RuleTable> {
    match &config.rules {
        Some(path) => RuleTable::load(path)
            .with_context(|| format!("Failed to load rule table {}", path.display())),
        None => Ok(RuleTable::builtin()),
    }
}

fn log_filter(filter: &TransactionFilter) {
    if let Some(category) = filter.transaction_type {
        tracing::debug!(%category, "filtering by type");
    }
    if !filter.range.is_unbounded() {
        tracing::debug!(range = %filter.range, "filtering by date");
    }
}

async fn open_db(config: &Config) -> anyhow::Result<DbPool> {
    momo_storage::create_db(&config.database)
        .await
        .with_context(|| format!("Failed to open database {}", config.database.display()))
}

/// Run one export through the pipeline. A dry run keeps records and
/// rejections in memory.
pub async fn import(config: &Config, input: &Path, dry_run: bool) -> anyhow::Result<BatchSummary> {
    let rules = load_rules(config)?;
    tracing::info!(
        input = %input.display(),
        rules = rules.len(),
        validation = %config.validation,
        date_policy = %config.date_policy,
        dry_run,
        "starting import"
    );
    let pipeline = ImportPipeline::new(rules, config.validation, config.date_policy);

    if dry_run {
        let sink = MemorySink::new();
        let log = MemoryRejectionLog::new();
        let summary = pipeline.run_file(input, &sink, &log).await?;
        for tx in sink.records() {
            tracing::info!(date = %tx.date, "would store: {} {}", tx.transaction_type, format_rwf(tx.amount));
        }
        for entry in log.entries() {
            tracing::info!(seq = entry.seq, "would reject: {}", entry.rejection);
        }
        return Ok(summary);
    }

    let log = FileRejectionLog::open(&config.rejection_log).with_context(|| {
        format!("Failed to open rejection log {}", config.rejection_log.display())
    })?;
    let sink = SqliteSink::new(open_db(config).await?);
    let summary = pipeline.run_file(input, &sink, &log).await?;
    sink.pool().close().await;
    Ok(summary)
}

pub async fn list(
    config: &Config,
    filter: &TransactionFilter,
) -> anyhow::Result<Vec<ValidatedTransaction>> {
    log_filter(filter);
    let pool = open_db(config).await?;
    Ok(momo_storage::get_transactions(&pool, filter).await?)
}

pub async fn summary(config: &Config, filter: &TransactionFilter) -> anyhow::Result<Summary> {
    log_filter(filter);
    let pool = open_db(config).await?;
    Ok(momo_storage::get_summary(&pool, filter).await?)
}

pub async fn types(config: &Config) -> anyhow::Result<Vec<Category>> {
    let pool = open_db(config).await?;
    Ok(momo_storage::get_transaction_types(&pool).await?)
}
