//! 数据模型
//!
//! 定义时序库写入相关的数据模型：
//! - 时间精度：Precision
//! - 批次配置：BatchConfig（数据库名 + 精度）
//! - 时序点：Point（measurement、tags、fields、timestamp）
//! - 批次：Batch（单次写入单元）

use crate::validation::{PointError, validate_point};
use chrono::{DateTime, Utc};
use domain::FieldValue;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// 写入时间精度。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Precision {
    Nanoseconds,
    Microseconds,
    Milliseconds,
    #[default]
    Seconds,
    Minutes,
    Hours,
}

impl Precision {
    /// InfluxDB `precision` 参数取值。
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nanoseconds => "ns",
            Self::Microseconds => "u",
            Self::Milliseconds => "ms",
            Self::Seconds => "s",
            Self::Minutes => "m",
            Self::Hours => "h",
        }
    }

    /// 将时间点编码为该精度下的整数时间戳。
    pub fn encode(&self, ts: &DateTime<Utc>) -> i64 {
        match self {
            // 超出范围的时间点在构造 Point 时已被拒绝
            Self::Nanoseconds => ts.timestamp_nanos_opt().unwrap_or_default(),
            Self::Microseconds => ts.timestamp_micros(),
            Self::Milliseconds => ts.timestamp_millis(),
            Self::Seconds => ts.timestamp(),
            Self::Minutes => ts.timestamp().div_euclid(60),
            Self::Hours => ts.timestamp().div_euclid(3600),
        }
    }

    /// 将时间点截断到该精度。
    pub fn truncate(&self, ts: &DateTime<Utc>) -> DateTime<Utc> {
        let value = self.encode(ts);
        let truncated = match self {
            Self::Nanoseconds => Some(DateTime::from_timestamp_nanos(value)),
            Self::Microseconds => DateTime::from_timestamp_micros(value),
            Self::Milliseconds => DateTime::from_timestamp_millis(value),
            Self::Seconds => DateTime::from_timestamp(value, 0),
            Self::Minutes => DateTime::from_timestamp(value * 60, 0),
            Self::Hours => DateTime::from_timestamp(value * 3600, 0),
        };
        truncated.unwrap_or(*ts)
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Precision {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "n" | "ns" => Ok(Self::Nanoseconds),
            "u" | "us" | "µs" => Ok(Self::Microseconds),
            "ms" => Ok(Self::Milliseconds),
            "s" => Ok(Self::Seconds),
            "m" => Ok(Self::Minutes),
            "h" => Ok(Self::Hours),
            other => Err(format!("unknown precision: {}", other)),
        }
    }
}

/// 批次配置（外部注入，原样透传给后端）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchConfig {
    pub database: String,
    pub precision: Precision,
}

impl BatchConfig {
    pub fn new(database: impl Into<String>, precision: Precision) -> Self {
        Self {
            database: database.into(),
            precision,
        }
    }
}

/// 时序点。
///
/// 只能通过 [`Point::new`] 构造，构造时执行点模型校验。
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    measurement: String,
    tags: BTreeMap<String, String>,
    fields: BTreeMap<String, FieldValue>,
    timestamp: DateTime<Utc>,
}

impl Point {
    pub fn new(
        measurement: impl Into<String>,
        tags: BTreeMap<String, String>,
        fields: BTreeMap<String, FieldValue>,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, PointError> {
        let measurement = measurement.into();
        validate_point(&measurement, &tags, &fields, &timestamp)?;
        Ok(Self {
            measurement,
            tags,
            fields,
            timestamp,
        })
    }

    pub fn measurement(&self) -> &str {
        &self.measurement
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    pub fn field(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }
}

/// 点批次：单条消息的全部点，一次提交。
#[derive(Debug, Clone)]
pub struct Batch {
    config: BatchConfig,
    points: Vec<Point>,
}

impl Batch {
    pub fn new(config: BatchConfig) -> Self {
        Self {
            config,
            points: Vec::new(),
        }
    }

    pub fn add_point(&mut self, point: Point) {
        self.points.push(point);
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl Extend<Point> for Batch {
    fn extend<T: IntoIterator<Item = Point>>(&mut self, iter: T) {
        self.points.extend(iter);
    }
}
