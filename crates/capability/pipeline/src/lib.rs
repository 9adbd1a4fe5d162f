//! 消息写入流水线：内容类型分发 → 组装点 → 单批次提交。
//!
//! 每条消息独立处理：记录、点、批次均为调用内局部状态，
//! `Writer` 只持有不可变的存储句柄、批次配置与转换器注册表，可并发调用。

pub mod assemble;
pub mod fields;
pub mod transform;

use chrono::{DateTime, Utc};
use domain::InboundMessage;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use tsw_storage::{Batch, BatchConfig, SeriesStore};

pub use assemble::{assemble, assemble_blob, format_created};
pub use fields::FieldSet;
pub use transform::{BlobTransform, MessageTransform, SenmlTransform, TransformRegistry};

/// Pipeline 处理错误。
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("decode error: {0}")]
    Decode(String),
    #[error("normalization error: {0}")]
    Normalization(String),
    #[error("point construction error: {0}")]
    PointConstruction(String),
    #[error("write error: {0}")]
    Write(String),
}

/// 单条消息的处理结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// 批次已提交。
    Written { points: usize },
    /// 未注册的内容类型或无点可写，未调用存储。
    Skipped,
}

struct WriterInner {
    store: Arc<dyn SeriesStore>,
    config: BatchConfig,
    registry: TransformRegistry,
}

/// 批次写入器。
#[derive(Clone)]
pub struct Writer {
    inner: Arc<WriterInner>,
}

impl Writer {
    pub fn new(store: Arc<dyn SeriesStore>, config: BatchConfig) -> Self {
        Self::with_registry(store, config, TransformRegistry::default())
    }

    pub fn with_registry(
        store: Arc<dyn SeriesStore>,
        config: BatchConfig,
        registry: TransformRegistry,
    ) -> Self {
        Self {
            inner: Arc::new(WriterInner {
                store,
                config,
                registry,
            }),
        }
    }

    pub fn registry(&self) -> &TransformRegistry {
        &self.inner.registry
    }

    /// 写入一条消息，接收时刻取当前时间。
    pub async fn write_message(&self, msg: &InboundMessage) -> Result<WriteOutcome, PipelineError> {
        self.write_message_at(msg, Utc::now()).await
    }

    /// 写入一条消息。
    ///
    /// 任一步骤失败即中止，不提交部分批次，也不重试。
    pub async fn write_message_at(
        &self,
        msg: &InboundMessage,
        now: DateTime<Utc>,
    ) -> Result<WriteOutcome, PipelineError> {
        let content_type = msg.content_type.as_str();
        let Some(transform) = self.inner.registry.get(content_type) else {
            debug!(
                target: "tsw.pipeline",
                channel = %msg.channel,
                content_type = %content_type,
                "message_skipped"
            );
            return Ok(WriteOutcome::Skipped);
        };

        let points = transform.transform(msg, now).map_err(|err| {
            warn!(
                target: "tsw.pipeline",
                channel = %msg.channel,
                content_type = %content_type,
                error = %err,
                "message_transform_failed"
            );
            err
        })?;
        if points.is_empty() {
            return Ok(WriteOutcome::Skipped);
        }

        let mut batch = Batch::new(self.inner.config.clone());
        batch.extend(points);

        let started_at = Instant::now();
        let written = self.inner.store.write_batch(&batch).await.map_err(|err| {
            warn!(
                target: "tsw.pipeline",
                channel = %msg.channel,
                content_type = %content_type,
                points = batch.len(),
                error = %err,
                "message_write_failed"
            );
            PipelineError::Write(err.to_string())
        })?;

        info!(
            target: "tsw.pipeline",
            channel = %msg.channel,
            content_type = %content_type,
            points = written,
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            "message_written"
        );
        Ok(WriteOutcome::Written { points: written })
    }
}
