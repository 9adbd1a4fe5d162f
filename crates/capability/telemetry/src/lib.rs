//! 追踪初始化、消息 ID 生成与进程内计数器。

use serde::Serialize;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::{EnvFilter, fmt};

/// 基础指标快照。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub messages_received: u64,
    pub messages_written: u64,
    pub messages_skipped: u64,
    pub points_written: u64,
    pub decode_failures: u64,
    pub normalize_failures: u64,
    pub point_failures: u64,
    pub write_failures: u64,
    pub write_latency_ms_total: u64,
    pub write_latency_ms_count: u64,
}

/// 写入链路计数器。
#[derive(Debug, Default)]
pub struct TelemetryMetrics {
    messages_received: AtomicU64,
    messages_written: AtomicU64,
    messages_skipped: AtomicU64,
    points_written: AtomicU64,
    decode_failures: AtomicU64,
    normalize_failures: AtomicU64,
    point_failures: AtomicU64,
    write_failures: AtomicU64,
    write_latency_ms_total: AtomicU64,
    write_latency_ms_count: AtomicU64,
}

impl TelemetryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            messages_received: self.messages_received.load(Ordering::Relaxed),
            messages_written: self.messages_written.load(Ordering::Relaxed),
            messages_skipped: self.messages_skipped.load(Ordering::Relaxed),
            points_written: self.points_written.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            normalize_failures: self.normalize_failures.load(Ordering::Relaxed),
            point_failures: self.point_failures.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
            write_latency_ms_total: self.write_latency_ms_total.load(Ordering::Relaxed),
            write_latency_ms_count: self.write_latency_ms_count.load(Ordering::Relaxed),
        }
    }

    pub fn record_message_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    /// 记录一次成功写入（含写入点数）。
    pub fn record_message_written(&self, points: usize) {
        self.messages_written.fetch_add(1, Ordering::Relaxed);
        self.points_written.fetch_add(points as u64, Ordering::Relaxed);
    }

    /// 记录未识别内容类型或空结果的跳过。
    pub fn record_message_skipped(&self) {
        self.messages_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_decode_failure(&self) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_normalize_failure(&self) {
        self.normalize_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_point_failure(&self) {
        self.point_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_write_failure(&self) {
        self.write_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// 记录写入延迟（毫秒）。
    pub fn record_write_latency_ms(&self, latency_ms: u64) {
        self.write_latency_ms_total.fetch_add(latency_ms, Ordering::Relaxed);
        self.write_latency_ms_count.fetch_add(1, Ordering::Relaxed);
    }
}

static METRICS: OnceLock<TelemetryMetrics> = OnceLock::new();

/// 获取全局指标实例。
pub fn metrics() -> &'static TelemetryMetrics {
    METRICS.get_or_init(TelemetryMetrics::new)
}

/// 初始化 tracing（默认 info）。
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

/// 生成新的 message_id，用于串联单条消息的处理日志。
pub fn new_message_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
