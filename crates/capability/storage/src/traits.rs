//! 存储接口 Trait 定义
//!
//! - SeriesStore：时序批次写入
//!
//! 设计原则：
//! - 一个批次一次调用，不做单点重试
//! - 实现必须可被多个任务并发调用
//! - 使用 async_trait 支持动态分发

use crate::error::StorageError;
use crate::models::Batch;
use async_trait::async_trait;

/// 时序存储接口
#[async_trait]
pub trait SeriesStore: Send + Sync {
    /// 写入整个批次，返回写入的点数
    ///
    /// 失败时整个批次视为未写入。
    async fn write_batch(&self, batch: &Batch) -> Result<usize, StorageError>;
}
