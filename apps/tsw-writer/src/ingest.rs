//! 采集链路装配模块
//!
//! 将 MQTT 消息源与写入流水线连接：每条信封解码后交给 `Writer::write_message`，
//! 并按处理结果更新进程内计数器。

use domain::InboundMessage;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use tsw_config::AppConfig;
use tsw_ingest::{IngestError, MessageHandler, MqttSource, MqttSourceConfig, NoopSource, Source};
use tsw_pipeline::{PipelineError, WriteOutcome, Writer};
use tsw_telemetry::{TelemetryMetrics, metrics, new_message_id};

/// 写入处理器
///
/// 实现 `MessageHandler`，每条消息独立调用一次 `write_message`。
pub struct WriterHandler {
    writer: Writer,
    metrics: &'static TelemetryMetrics,
}

impl WriterHandler {
    pub fn new(writer: Writer, metrics: &'static TelemetryMetrics) -> Self {
        Self { writer, metrics }
    }
}

#[async_trait::async_trait]
impl MessageHandler for WriterHandler {
    async fn handle(&self, msg: InboundMessage) -> Result<(), IngestError> {
        self.metrics.record_message_received();
        let message_id = new_message_id();
        info!(
            target: "tsw.ingest",
            message_id = %message_id,
            channel = %msg.channel,
            publisher = %msg.publisher,
            content_type = %msg.content_type,
            payload_size = msg.payload.len(),
            "message_received"
        );

        let started_at = Instant::now();
        match self.writer.write_message(&msg).await {
            Ok(WriteOutcome::Written { points }) => {
                self.metrics.record_message_written(points);
                self.metrics.record_write_latency_ms(started_at.elapsed().as_millis() as u64);
                info!(
                    target: "tsw.ingest",
                    message_id = %message_id,
                    channel = %msg.channel,
                    points = points,
                    "message_handled"
                );
                Ok(())
            }
            Ok(WriteOutcome::Skipped) => {
                self.metrics.record_message_skipped();
                info!(
                    target: "tsw.ingest",
                    message_id = %message_id,
                    channel = %msg.channel,
                    content_type = %msg.content_type,
                    "message_skipped"
                );
                Ok(())
            }
            Err(err) => {
                match &err {
                    PipelineError::Decode(_) => self.metrics.record_decode_failure(),
                    PipelineError::Normalization(_) => self.metrics.record_normalize_failure(),
                    PipelineError::PointConstruction(_) => self.metrics.record_point_failure(),
                    PipelineError::Write(_) => self.metrics.record_write_failure(),
                }
                warn!(
                    target: "tsw.ingest",
                    message_id = %message_id,
                    channel = %msg.channel,
                    content_type = %msg.content_type,
                    error = %err,
                    "message_failed"
                );
                Err(IngestError::Handler(err.to_string()))
            }
        }
    }
}

/// 启动采集任务
///
/// `TSW_INGEST` 关闭时使用占位源，任务立即结束。
pub fn spawn_ingest(config: &AppConfig, writer: Writer) -> tokio::task::JoinHandle<()> {
    let handler: Arc<dyn MessageHandler> = Arc::new(WriterHandler::new(writer, metrics()));
    let source: Box<dyn Source> = if config.ingest_enabled {
        Box::new(MqttSource::new(MqttSourceConfig {
            host: config.mqtt_host.clone(),
            port: config.mqtt_port,
            username: config.mqtt_username.clone(),
            password: config.mqtt_password.clone(),
            topic_prefix: config.mqtt_topic_prefix.clone(),
        }))
    } else {
        info!(target: "tsw.ingest", "ingest_disabled");
        Box::new(NoopSource)
    };

    tokio::spawn(async move {
        if let Err(err) = source.run(handler).await {
            warn!(target: "tsw.ingest", error = %err, "ingest_source_stopped");
        }
    })
}
