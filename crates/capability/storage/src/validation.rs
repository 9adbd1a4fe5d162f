//! 点校验
//!
//! 时序库的点模型约束，构造 `Point` 时统一检查：
//! - measurement 与字段集非空
//! - tag / field 键非空、不使用保留键 `time`、互不重名
//! - measurement 与 tag / field 键值不含控制字符（换行会拆分 line protocol 行）
//! - 浮点字段必须为有限值
//! - 序列键长度与时间戳范围

use chrono::{DateTime, Utc};
use domain::FieldValue;
use std::collections::BTreeMap;

/// 序列键（measurement + tags）最大字节数。
pub const MAX_KEY_LENGTH: usize = 65535;

const RESERVED_KEY: &str = "time";

/// 点构造错误。
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PointError {
    #[error("measurement required")]
    EmptyMeasurement,
    #[error("point without fields is unsupported")]
    NoFields,
    #[error("tag key required")]
    EmptyTagKey,
    #[error("field key required")]
    EmptyFieldKey,
    #[error("reserved key: {0}")]
    ReservedKey(String),
    #[error("invalid token: {0:?}")]
    InvalidToken(String),
    #[error("key used as both tag and field: {0}")]
    KeyCollision(String),
    #[error("non-finite value for field: {0}")]
    NonFinite(String),
    #[error("series key exceeds 65535 bytes")]
    KeyTooLong,
    #[error("timestamp out of range")]
    TimeOutOfRange,
}

pub fn validate_point(
    measurement: &str,
    tags: &BTreeMap<String, String>,
    fields: &BTreeMap<String, FieldValue>,
    timestamp: &DateTime<Utc>,
) -> Result<(), PointError> {
    if measurement.is_empty() {
        return Err(PointError::EmptyMeasurement);
    }
    check_token(measurement)?;
    if fields.is_empty() {
        return Err(PointError::NoFields);
    }

    let mut key_len = measurement.len();
    for (key, value) in tags {
        if key.is_empty() {
            return Err(PointError::EmptyTagKey);
        }
        if key == RESERVED_KEY {
            return Err(PointError::ReservedKey(key.clone()));
        }
        check_token(key)?;
        check_token(value)?;
        if fields.contains_key(key) {
            return Err(PointError::KeyCollision(key.clone()));
        }
        // ",key=value"
        key_len += key.len() + value.len() + 2;
    }
    if key_len > MAX_KEY_LENGTH {
        return Err(PointError::KeyTooLong);
    }

    for (key, value) in fields {
        if key.is_empty() {
            return Err(PointError::EmptyFieldKey);
        }
        if key == RESERVED_KEY {
            return Err(PointError::ReservedKey(key.clone()));
        }
        check_token(key)?;
        if let FieldValue::Float(v) = value {
            if !v.is_finite() {
                return Err(PointError::NonFinite(key.clone()));
            }
        }
    }

    if timestamp.timestamp_nanos_opt().is_none() {
        return Err(PointError::TimeOutOfRange);
    }
    Ok(())
}

fn check_token(token: &str) -> Result<(), PointError> {
    if token.chars().any(char::is_control) {
        return Err(PointError::InvalidToken(token.to_string()));
    }
    Ok(())
}
