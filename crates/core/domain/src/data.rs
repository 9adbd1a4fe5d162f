use std::fmt;

/// SenML JSON 内容类型字面量。
pub const SENML_JSON: &str = "senml+json";
/// 二进制内容类型字面量。
pub const OCTET_STREAM: &str = "octet-stream";

/// 消息负载的内容类型。
///
/// 只有 `senml+json` 与 `octet-stream` 会被写入；其余类型原样保留，由写入端直接跳过。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ContentType {
    SenmlJson,
    OctetStream,
    Other(String),
}

impl ContentType {
    /// 从内容类型字符串解析。
    pub fn parse(value: &str) -> Self {
        match value {
            SENML_JSON => Self::SenmlJson,
            OCTET_STREAM => Self::OctetStream,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::SenmlJson => SENML_JSON,
            Self::OctetStream => OCTET_STREAM,
            Self::Other(value) => value,
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for ContentType {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

/// 消息源投递的原始消息（接收后不可变）。
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub payload: Vec<u8>,
    pub content_type: ContentType,
    pub channel: String,
    pub publisher: String,
    pub protocol: String,
}

impl InboundMessage {
    pub fn new(
        channel: impl Into<String>,
        publisher: impl Into<String>,
        protocol: impl Into<String>,
        content_type: ContentType,
        payload: Vec<u8>,
    ) -> Self {
        Self {
            payload,
            content_type,
            channel: channel.into(),
            publisher: publisher.into(),
            protocol: protocol.into(),
        }
    }
}

/// 规整后的测量记录。
///
/// 所有基础字段（bn/bt/bu/bv/bs）均已展开为绝对值。
/// 源格式允许同时出现多个值字段，这里全部保留。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedRecord {
    pub name: String,
    pub unit: Option<String>,
    /// 绝对时间（Unix 秒，可带小数）。
    pub time: f64,
    pub update_time: Option<f64>,
    pub value: Option<f64>,
    pub string_value: Option<String>,
    pub data_value: Option<String>,
    pub bool_value: Option<bool>,
    pub sum: Option<f64>,
}

/// 时序点字段值。
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Float(f64),
    Bool(bool),
    String(String),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Float(v) => write!(f, "{}", v),
            Self::Bool(v) => write!(f, "{}", v),
            Self::String(v) => f.write_str(v),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}
