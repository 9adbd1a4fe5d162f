//! 写入链路共享的领域模型。

pub mod data;

pub use data::{ContentType, FieldValue, InboundMessage, OCTET_STREAM, ResolvedRecord, SENML_JSON};
