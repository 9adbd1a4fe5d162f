use async_trait::async_trait;
use domain::{ContentType, InboundMessage};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// 接入错误。
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("handler error: {0}")]
    Handler(String),
    #[error("invalid envelope: {0}")]
    Envelope(String),
}

/// InboundMessage 处理器。
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, msg: InboundMessage) -> Result<(), IngestError>;
}

/// 消息源抽象。
#[async_trait]
pub trait Source: Send + Sync {
    async fn run(&self, handler: Arc<dyn MessageHandler>) -> Result<(), IngestError>;
}

/// 占位源（用于接线与测试）。
#[derive(Debug, Default)]
pub struct NoopSource;

#[async_trait]
impl Source for NoopSource {
    async fn run(&self, _handler: Arc<dyn MessageHandler>) -> Result<(), IngestError> {
        Ok(())
    }
}

/// 连接错误后的重连退避。
pub const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// MQTT 消息源配置。
#[derive(Debug, Clone)]
pub struct MqttSourceConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub topic_prefix: String,
}

/// MQTT 消息源。
///
/// 订阅 `{topic_prefix}/#`，每条发布消息的负载为 JSON 信封：
/// `{"channel", "publisher", "protocol", "content_type", "payload"}`。
#[derive(Debug, Clone)]
pub struct MqttSource {
    config: MqttSourceConfig,
}

impl MqttSource {
    pub fn new(config: MqttSourceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MqttSourceConfig {
        &self.config
    }
}

#[async_trait]
impl Source for MqttSource {
    /// 持续轮询事件循环；连接错误后等待 `RECONNECT_DELAY` 再继续，由 rumqttc 重连。
    async fn run(&self, handler: Arc<dyn MessageHandler>) -> Result<(), IngestError> {
        let client_id = format!("tsw-writer-{}", now_epoch_ms());
        let mut options =
            rumqttc::MqttOptions::new(client_id, self.config.host.clone(), self.config.port);
        options.set_keep_alive(Duration::from_secs(30));
        if let (Some(username), Some(password)) =
            (self.config.username.as_ref(), self.config.password.as_ref())
        {
            options.set_credentials(username, password);
        }

        let (client, mut eventloop) = rumqttc::AsyncClient::new(options, 10);
        let topic = format!("{}/#", self.config.topic_prefix.trim_end_matches('/'));

        loop {
            match eventloop.poll().await {
                Ok(rumqttc::Event::Incoming(rumqttc::Packet::ConnAck(_))) => {
                    // clean session：每次（重）连接后都要重新订阅
                    if let Err(err) = client.try_subscribe(topic.clone(), rumqttc::QoS::AtLeastOnce) {
                        warn!(target: "tsw.ingest", topic = %topic, error = %err, "mqtt_subscribe_failed");
                    } else {
                        info!(target: "tsw.ingest", topic = %topic, "mqtt_subscribed");
                    }
                }
                Ok(rumqttc::Event::Incoming(rumqttc::Packet::Publish(publish))) => {
                    let msg = match decode_envelope(
                        &self.config.topic_prefix,
                        &publish.topic,
                        &publish.payload,
                    ) {
                        Ok(msg) => msg,
                        Err(err) => {
                            warn!(target: "tsw.ingest", topic = %publish.topic, error = %err, "mqtt_message_skipped");
                            continue;
                        }
                    };
                    if let Err(err) = handler.handle(msg).await {
                        warn!(target: "tsw.ingest", topic = %publish.topic, error = %err, "message_handler_failed");
                    }
                }
                Ok(_) => {}
                Err(err) => {
                    warn!(
                        target: "tsw.ingest",
                        host = %self.config.host,
                        port = self.config.port,
                        error = %err,
                        "mqtt_connection_error"
                    );
                    tokio::time::sleep(RECONNECT_DELAY).await;
                }
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    publisher: Option<String>,
    #[serde(default)]
    protocol: Option<String>,
    content_type: String,
    payload: EnvelopePayload,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EnvelopePayload {
    Text(String),
    Bytes(Vec<u8>),
}

/// 解码 MQTT 信封为 InboundMessage。
///
/// 信封缺少 `channel` 时取主题前缀后的第一段；缺少 `protocol` 时为 `mqtt`。
pub fn decode_envelope(
    prefix: &str,
    topic: &str,
    payload: &[u8],
) -> Result<InboundMessage, IngestError> {
    let envelope: Envelope =
        serde_json::from_slice(payload).map_err(|err| IngestError::Envelope(err.to_string()))?;

    let channel = match envelope.channel.filter(|c| !c.is_empty()) {
        Some(channel) => channel,
        None => extract_channel(prefix, topic)
            .ok_or_else(|| IngestError::Envelope(format!("no channel for topic {}", topic)))?,
    };
    let payload = match envelope.payload {
        EnvelopePayload::Text(text) => text.into_bytes(),
        EnvelopePayload::Bytes(bytes) => bytes,
    };

    Ok(InboundMessage {
        payload,
        content_type: ContentType::parse(&envelope.content_type),
        channel,
        publisher: envelope.publisher.unwrap_or_default(),
        protocol: envelope
            .protocol
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| "mqtt".to_string()),
    })
}

fn extract_channel(prefix: &str, topic: &str) -> Option<String> {
    let prefix = prefix.trim_matches('/');
    let topic = topic.trim_matches('/');
    let rest = if prefix.is_empty() {
        topic
    } else {
        topic.strip_prefix(prefix)?
    };
    let channel = rest.trim_start_matches('/').split('/').next()?;
    if channel.is_empty() {
        return None;
    }
    Some(channel.to_string())
}

fn now_epoch_ms() -> i64 {
    let now = std::time::SystemTime::now();
    let duration = now
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    duration.as_millis() as i64
}
