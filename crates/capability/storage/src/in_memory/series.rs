//! 时序写入内存实现
//!
//! 仅用于本地测试和占位。

use crate::error::StorageError;
use crate::models::{Batch, Point};
use crate::traits::SeriesStore;
use std::sync::RwLock;

/// 时序写入内存存储
///
/// 保留每次提交的完整批次，可注入写入失败。
pub struct InMemorySeriesStore {
    batches: RwLock<Vec<Batch>>,
    failure: RwLock<Option<String>>,
}

impl InMemorySeriesStore {
    /// 创建新的时序写入存储
    pub fn new() -> Self {
        Self {
            batches: RwLock::new(Vec::new()),
            failure: RwLock::new(None),
        }
    }

    /// 创建每次写入都失败的存储（用于测试）
    pub fn failing(message: impl Into<String>) -> Self {
        let store = Self::new();
        store.set_failure(Some(message.into()));
        store
    }

    /// 设置或清除注入的写入失败
    pub fn set_failure(&self, message: Option<String>) {
        if let Ok(mut failure) = self.failure.write() {
            *failure = message;
        }
    }

    /// 已提交的批次（按提交顺序）
    pub fn batches(&self) -> Vec<Batch> {
        self.batches.read().map(|b| b.clone()).unwrap_or_default()
    }

    /// 已写入的全部点（按提交顺序）
    pub fn points(&self) -> Vec<Point> {
        self.batches()
            .iter()
            .flat_map(|batch| batch.points().iter().cloned())
            .collect()
    }

    /// 已提交的批次数
    pub fn batch_count(&self) -> usize {
        self.batches.read().map(|b| b.len()).unwrap_or(0)
    }

    /// 获取当前累计的点数量（用于测试）
    pub fn len(&self) -> usize {
        self.batches
            .read()
            .map(|b| b.iter().map(Batch::len).sum())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemorySeriesStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SeriesStore for InMemorySeriesStore {
    async fn write_batch(&self, batch: &Batch) -> Result<usize, StorageError> {
        let failure = self
            .failure
            .read()
            .map_err(|_| StorageError::new("lock failed"))?
            .clone();
        if let Some(message) = failure {
            return Err(StorageError::new(message));
        }
        let mut batches = self
            .batches
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        batches.push(batch.clone());
        Ok(batch.len())
    }
}
