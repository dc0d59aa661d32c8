pub mod csv_store;
pub mod database;
pub mod time;
pub mod types;

pub use csv_store::CsvLogStore;
pub use database::DatabaseLogger;
pub use types::{ChatLogRecord, RecentLogs};
