pub mod db;
pub mod query;

pub use db::{create_db, get_transaction_by_id, insert_transaction, DbPool, SqliteSink};
pub use query::{
    get_summary, get_transaction_types, get_transactions, MonthStat, Summary, TransactionFilter,
    TypeStat,
};
