use std::future::Future;
use std::path::Path;
use std::str::FromStr;

use momo_core::{Category, TransactionSink, ValidatedTransaction};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};

pub type DbPool = Pool<Sqlite>;

pub async fn create_db(path: &Path) -> Result<DbPool, sqlx::Error> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous = NORMAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA cache_size = -32000")
        .execute(&pool)
        .await?;

    run_migrations(&pool).await?;
    tracing::debug!(path = %path.display(), "database ready");

    Ok(pool)
}

async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS transactions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            transaction_id TEXT,
            transaction_type TEXT NOT NULL,
            amount INTEGER NOT NULL,
            receiver TEXT,
            sender TEXT,
            phone_number TEXT,
            agent TEXT,
            code TEXT,
            date TEXT NOT NULL,
            message TEXT,
            raw_body TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions (date)")
        .execute(pool)
        .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_transactions_type ON transactions (transaction_type)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Append one row. Replays are not deduplicated.
pub async fn insert_transaction(
    pool: &DbPool,
    tx: &ValidatedTransaction,
) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO transactions (transaction_id, transaction_type, amount, receiver, sender, phone_number, agent, code, date, message, raw_body) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
    )
    .bind(&tx.transaction_id)
    .bind(tx.transaction_type.label())
    .bind(tx.amount)
    .bind(&tx.receiver)
    .bind(&tx.sender)
    .bind(&tx.phone_number)
    .bind(&tx.agent)
    .bind(&tx.code)
    .bind(&tx.date)
    .bind(&tx.message)
    .bind(&tx.raw_body)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

pub async fn get_transaction_by_id(
    pool: &DbPool,
    id: i64,
) -> Result<Option<ValidatedTransaction>, sqlx::Error> {
    let row = sqlx::query(
        "SELECT id, transaction_id, transaction_type, amount, receiver, sender, phone_number, agent, code, date, message, raw_body FROM transactions WHERE id = ?"
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(row_to_transaction).transpose()
}

pub(crate) fn parse_category(label: &str) -> Result<Category, sqlx::Error> {
    Category::from_str(label).map_err(|e| sqlx::Error::Decode(e.into()))
}

pub(crate) fn row_to_transaction(r: &SqliteRow) -> Result<ValidatedTransaction, sqlx::Error> {
    let label: String = r.try_get("transaction_type")?;
    Ok(ValidatedTransaction {
        id: Some(r.try_get("id")?),
        transaction_id: r.try_get("transaction_id")?,
        transaction_type: parse_category(&label)?,
        amount: r.try_get("amount")?,
        receiver: r.try_get("receiver")?,
        sender: r.try_get("sender")?,
        phone_number: r.try_get("phone_number")?,
        agent: r.try_get("agent")?,
        code: r.try_get("code")?,
        date: r.try_get("date")?,
        message: r.try_get("message")?,
        raw_body: r.try_get("raw_body")?,
    })
}

// ── Sink ──────────────────────────────────────────────────────────────────────

/// Persists validated records into the `transactions` table.
#[derive(Debug, Clone)]
pub struct SqliteSink {
    pool: DbPool,
}

impl SqliteSink {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

impl TransactionSink for SqliteSink {
    type Error = sqlx::Error;

    fn insert(
        &self,
        tx: &ValidatedTransaction,
    ) -> impl Future<Output = Result<i64, Self::Error>> + Send {
        insert_transaction(&self.pool, tx)
    }
}
