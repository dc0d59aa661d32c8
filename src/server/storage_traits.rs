use std::future::Future;
use std::pin::Pin;

use crate::error::Result;
use crate::logging::{ChatLogRecord, CsvLogStore, DatabaseLogger, RecentLogs};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

// 请求记录存储抽象（CSV、SQLite 等实现可互换）
pub trait ChatLogStore: Send + Sync {
    fn append<'a>(&'a self, record: ChatLogRecord) -> BoxFuture<'a, Result<()>>;
    fn read_recent<'a>(&'a self, limit: usize) -> BoxFuture<'a, Result<RecentLogs>>;
}

impl ChatLogStore for CsvLogStore {
    fn append<'a>(&'a self, record: ChatLogRecord) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move { CsvLogStore::append(self, record).await })
    }

    fn read_recent<'a>(&'a self, limit: usize) -> BoxFuture<'a, Result<RecentLogs>> {
        Box::pin(async move { CsvLogStore::read_recent(self, limit).await })
    }
}

impl ChatLogStore for DatabaseLogger {
    fn append<'a>(&'a self, record: ChatLogRecord) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            DatabaseLogger::append(self, &record).await?;
            Ok(())
        })
    }

    fn read_recent<'a>(&'a self, limit: usize) -> BoxFuture<'a, Result<RecentLogs>> {
        Box::pin(async move { Ok(DatabaseLogger::read_recent(self, limit).await?) })
    }
}
