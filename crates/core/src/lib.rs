pub mod category;
pub mod config;
pub mod money;
pub mod period;
pub mod policy;
pub mod sink;
pub mod transaction;

pub use category::Category;
pub use config::{Config, ConfigError, DEFAULT_CONFIG_FILE};
pub use money::{format_rwf, whole_units};
pub use period::{format_timestamp, DateRange, TIMESTAMP_FORMAT};
pub use policy::{DatePolicy, ValidationPolicy};
pub use sink::{MemorySink, TransactionSink};
pub use transaction::{RejectionReason, TransactionRecord, ValidatedTransaction};
