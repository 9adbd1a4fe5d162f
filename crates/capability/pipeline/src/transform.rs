//! 内容类型 → 转换器注册表。

use crate::PipelineError;
use crate::assemble::{assemble, assemble_blob, format_created};
use chrono::{DateTime, Utc};
use domain::{InboundMessage, OCTET_STREAM, SENML_JSON};
use std::collections::HashMap;
use std::sync::Arc;
use tsw_normalize::{NormalizeError, normalize_at};
use tsw_storage::Point;

/// 单条消息 → 时序点。
///
/// `now` 为接收时刻，同一条消息内的所有点共享。
pub trait MessageTransform: Send + Sync {
    fn transform(
        &self,
        msg: &InboundMessage,
        now: DateTime<Utc>,
    ) -> Result<Vec<Point>, PipelineError>;
}

/// SenML JSON：规整后每条记录一个点。
#[derive(Debug, Default)]
pub struct SenmlTransform;

impl MessageTransform for SenmlTransform {
    fn transform(
        &self,
        msg: &InboundMessage,
        now: DateTime<Utc>,
    ) -> Result<Vec<Point>, PipelineError> {
        // 相对时间以接收时刻的整秒为基准
        let now_secs = now.timestamp() as f64;
        let records = normalize_at(&msg.payload, now_secs).map_err(|err| match err {
            NormalizeError::Decode(_) => PipelineError::Decode(err.to_string()),
            NormalizeError::Malformed(_) => PipelineError::Normalization(err.to_string()),
        })?;
        let created = format_created(&now);
        assemble(&records, msg, &created)
            .map_err(|err| PipelineError::PointConstruction(err.to_string()))
    }
}

/// 二进制负载：整条消息一个点。
#[derive(Debug, Default)]
pub struct BlobTransform;

impl MessageTransform for BlobTransform {
    fn transform(
        &self,
        msg: &InboundMessage,
        now: DateTime<Utc>,
    ) -> Result<Vec<Point>, PipelineError> {
        let point = assemble_blob(msg, now)
            .map_err(|err| PipelineError::PointConstruction(err.to_string()))?;
        Ok(vec![point])
    }
}

/// 转换器注册表。
///
/// 未注册的内容类型由写入端直接跳过。
#[derive(Clone)]
pub struct TransformRegistry {
    transforms: HashMap<String, Arc<dyn MessageTransform>>,
}

impl TransformRegistry {
    /// 空注册表。
    pub fn empty() -> Self {
        Self {
            transforms: HashMap::new(),
        }
    }

    /// 注册（或替换）某内容类型的转换器，返回被替换的旧转换器。
    pub fn register(
        &mut self,
        content_type: impl Into<String>,
        transform: Arc<dyn MessageTransform>,
    ) -> Option<Arc<dyn MessageTransform>> {
        self.transforms.insert(content_type.into(), transform)
    }

    pub fn with(mut self, content_type: impl Into<String>, transform: Arc<dyn MessageTransform>) -> Self {
        self.register(content_type, transform);
        self
    }

    pub fn get(&self, content_type: &str) -> Option<&Arc<dyn MessageTransform>> {
        self.transforms.get(content_type)
    }

    pub fn content_types(&self) -> Vec<&str> {
        let mut types = self.transforms.keys().map(String::as_str).collect::<Vec<_>>();
        types.sort_unstable();
        types
    }
}

impl Default for TransformRegistry {
    /// `senml+json` 与 `octet-stream`。
    fn default() -> Self {
        Self::empty()
            .with(SENML_JSON, Arc::new(SenmlTransform))
            .with(OCTET_STREAM, Arc::new(BlobTransform))
    }
}
