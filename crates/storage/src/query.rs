//! Read side of the `transactions` table.

use momo_core::{Category, DateRange, ValidatedTransaction};
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Row, Sqlite};

use crate::db::{parse_category, row_to_transaction, DbPool};

/// Optional type and inclusive date range shared by the read queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionFilter {
    pub transaction_type: Option<Category>,
    #[serde(flatten)]
    pub range: DateRange,
}

impl TransactionFilter {
    pub fn new(transaction_type: Option<Category>, range: DateRange) -> Self {
        Self {
            transaction_type,
            range,
        }
    }

    fn push_where(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        let mut sep = " WHERE ";
        if let Some(category) = self.transaction_type {
            qb.push(sep).push("transaction_type = ").push_bind(category.label());
            sep = " AND ";
        }
        if let Some(start) = self.range.lower_bound() {
            qb.push(sep).push("date >= ").push_bind(start);
            sep = " AND ";
        }
        if let Some(end) = self.range.upper_bound() {
            qb.push(sep).push("date <= ").push_bind(end);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_transactions: i64,
    pub total_amount: i64,
    pub average_amount: f64,
    pub by_type: Vec<TypeStat>,
    pub by_month: Vec<MonthStat>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeStat {
    pub transaction_type: Category,
    pub count: i64,
    pub total_amount: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthStat {
    /// `YYYY-MM`
    pub month: String,
    pub count: i64,
    pub total_amount: i64,
}

/// Newest first; rows sharing a date come back in reverse insertion order.
pub async fn get_transactions(
    pool: &DbPool,
    filter: &TransactionFilter,
) -> Result<Vec<ValidatedTransaction>, sqlx::Error> {
    let mut qb = QueryBuilder::<Sqlite>::new(
        "SELECT id, transaction_id, transaction_type, amount, receiver, sender, phone_number, agent, code, date, message, raw_body FROM transactions",
    );
    filter.push_where(&mut qb);
    qb.push(" ORDER BY date DESC, id DESC");

    let rows = qb.build().fetch_all(pool).await?;
    rows.iter().map(row_to_transaction).collect()
}

pub async fn get_summary(
    pool: &DbPool,
    filter: &TransactionFilter,
) -> Result<Summary, sqlx::Error> {
    let mut qb = QueryBuilder::<Sqlite>::new(
        "SELECT COUNT(*) AS count, COALESCE(SUM(amount), 0) AS total, COALESCE(AVG(amount), 0.0) AS average FROM transactions",
    );
    filter.push_where(&mut qb);
    let totals = qb.build().fetch_one(pool).await?;

    let mut qb = QueryBuilder::<Sqlite>::new(
        "SELECT transaction_type, COUNT(*) AS count, SUM(amount) AS total FROM transactions",
    );
    filter.push_where(&mut qb);
    qb.push(" GROUP BY transaction_type ORDER BY total DESC, transaction_type");
    let by_type = qb
        .build()
        .fetch_all(pool)
        .await?
        .iter()
        .map(|r| {
            let label: String = r.try_get("transaction_type")?;
            Ok(TypeStat {
                transaction_type: parse_category(&label)?,
                count: r.try_get("count")?,
                total_amount: r.try_get("total")?,
            })
        })
        .collect::<Result<Vec<_>, sqlx::Error>>()?;

    let mut qb = QueryBuilder::<Sqlite>::new(
        "SELECT strftime('%Y-%m', date) AS month, COUNT(*) AS count, SUM(amount) AS total FROM transactions",
    );
    filter.push_where(&mut qb);
    qb.push(" GROUP BY month ORDER BY month");
    let by_month = qb
        .build()
        .fetch_all(pool)
        .await?
        .iter()
        .map(|r| {
            Ok(MonthStat {
                month: r.try_get("month")?,
                count: r.try_get("count")?,
                total_amount: r.try_get("total")?,
            })
        })
        .collect::<Result<Vec<_>, sqlx::Error>>()?;

    Ok(Summary {
        total_transactions: totals.try_get("count")?,
        total_amount: totals.try_get("total")?,
        average_amount: totals.try_get("average")?,
        by_type,
        by_month,
    })
}

/// Distinct stored categories, sorted by label.
pub async fn get_transaction_types(pool: &DbPool) -> Result<Vec<Category>, sqlx::Error> {
    let labels: Vec<String> = sqlx::query_scalar(
        "SELECT DISTINCT transaction_type FROM transactions ORDER BY transaction_type",
    )
    .fetch_all(pool)
    .await?;

    labels.iter().map(|l| parse_category(l)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_db, insert_transaction};
    use chrono::NaiveDate;

    fn tx(category: Category, amount: i64, date: &str) -> ValidatedTransaction {
        ValidatedTransaction {
            id: None,
            transaction_id: None,
            transaction_type: category,
            amount,
            receiver: None,
            sender: None,
            phone_number: None,
            agent: None,
            code: None,
            date: date.to_string(),
            message: None,
            raw_body: None,
        }
    }

    async fn seeded() -> (tempfile::TempDir, DbPool) {
        let dir = tempfile::tempdir().unwrap();
        let pool = create_db(&dir.path().join("transactions.db")).await.unwrap();
        for t in [
            tx(Category::IncomingMoney, 5000, "2024-05-10 16:30:51"),
            tx(Category::CodeHolderPayment, 1000, "2024-05-10 16:31:39"),
            tx(Category::IncomingMoney, 2000, "2024-05-31 23:59:59"),
            tx(Category::AgentWithdrawal, 20000, "2024-06-01 00:00:00"),
            tx(Category::CodeHolderPayment, 1500, "2024-06-15 12:00:00"),
        ] {
            insert_transaction(&pool, &t).await.unwrap();
        }
        (dir, pool)
    }

    fn day(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let (_dir, pool) = seeded().await;
        let all = get_transactions(&pool, &TransactionFilter::default()).await.unwrap();
        let dates: Vec<&str> = all.iter().map(|t| t.date.as_str()).collect();
        assert_eq!(
            dates,
            vec![
                "2024-06-15 12:00:00",
                "2024-06-01 00:00:00",
                "2024-05-31 23:59:59",
                "2024-05-10 16:31:39",
                "2024-05-10 16:30:51",
            ]
        );
    }

    #[tokio::test]
    async fn equal_dates_order_by_id_desc() {
        let dir = tempfile::tempdir().unwrap();
        let pool = create_db(&dir.path().join("t.db")).await.unwrap();
        let first = insert_transaction(&pool, &tx(Category::BankDeposit, 1, "2024-01-01 00:00:00"))
            .await
            .unwrap();
        let second = insert_transaction(&pool, &tx(Category::BankDeposit, 2, "2024-01-01 00:00:00"))
            .await
            .unwrap();

        let rows = get_transactions(&pool, &TransactionFilter::default()).await.unwrap();
        assert_eq!(rows[0].id, Some(second));
        assert_eq!(rows[1].id, Some(first));
    }

    #[tokio::test]
    async fn range_bounds_are_inclusive_days() {
        let (_dir, pool) = seeded().await;
        let filter = TransactionFilter::new(None, DateRange::new(day(2024, 5, 31), day(2024, 6, 1)));
        let rows = get_transactions(&pool, &filter).await.unwrap();
        let amounts: Vec<i64> = rows.iter().map(|t| t.amount).collect();
        assert_eq!(amounts, vec![20000, 2000]);
    }

    #[tokio::test]
    async fn type_and_open_ended_range() {
        let (_dir, pool) = seeded().await;
        let filter = TransactionFilter::new(
            Some(Category::CodeHolderPayment),
            DateRange::new(day(2024, 6, 1), None),
        );
        let rows = get_transactions(&pool, &filter).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].amount, 1500);
    }

    #[tokio::test]
    async fn summary_totals_and_groups() {
        let (_dir, pool) = seeded().await;
        let summary = get_summary(&pool, &TransactionFilter::default()).await.unwrap();

        assert_eq!(summary.total_transactions, 5);
        assert_eq!(summary.total_amount, 29500);
        assert_eq!(summary.average_amount, 5900.0);

        assert_eq!(
            summary.by_type,
            vec![
                TypeStat { transaction_type: Category::AgentWithdrawal, count: 1, total_amount: 20000 },
                TypeStat { transaction_type: Category::IncomingMoney, count: 2, total_amount: 7000 },
                TypeStat { transaction_type: Category::CodeHolderPayment, count: 2, total_amount: 2500 },
            ]
        );
        assert_eq!(
            summary.by_month,
            vec![
                MonthStat { month: "2024-05".into(), count: 3, total_amount: 8000 },
                MonthStat { month: "2024-06".into(), count: 2, total_amount: 21500 },
            ]
        );
    }

    #[tokio::test]
    async fn summary_of_empty_selection() {
        let (_dir, pool) = seeded().await;
        let filter = TransactionFilter::new(Some(Category::BankTransfer), DateRange::default());
        let summary = get_summary(&pool, &filter).await.unwrap();
        assert_eq!(summary.total_transactions, 0);
        assert_eq!(summary.total_amount, 0);
        assert_eq!(summary.average_amount, 0.0);
        assert!(summary.by_type.is_empty());
        assert!(summary.by_month.is_empty());
    }

    #[tokio::test]
    async fn distinct_types_sorted_by_label() {
        let (_dir, pool) = seeded().await;
        assert_eq!(
            get_transaction_types(&pool).await.unwrap(),
            vec![
                Category::IncomingMoney,
                Category::CodeHolderPayment,
                Category::AgentWithdrawal,
            ]
        );
    }
}
