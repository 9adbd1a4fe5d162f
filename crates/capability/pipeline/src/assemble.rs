//! 规整记录 / 二进制负载 → 时序点。

use crate::fields::FieldSet;
use chrono::{DateTime, SecondsFormat, Utc};
use domain::{InboundMessage, ResolvedRecord};
use std::collections::BTreeMap;
use tsw_storage::{Point, PointError};

/// 每条规整记录构造一个点，任一记录失败即中止。
///
/// - measurement：消息通道
/// - tags：`name`、`content_type`
/// - fields：记录中存在的值 + `channel`/`publisher`/`protocol`/`created`
/// - timestamp：记录时间截断到整秒
pub fn assemble(
    records: &[ResolvedRecord],
    msg: &InboundMessage,
    created: &str,
) -> Result<Vec<Point>, PointError> {
    let mut points = Vec::with_capacity(records.len());
    for record in records {
        let mut tags = BTreeMap::new();
        tags.insert("name".to_string(), record.name.clone());
        tags.insert("content_type".to_string(), msg.content_type.to_string());

        let mut fields = FieldSet::new();
        fields
            .insert_text("unit", record.unit.as_deref())
            .insert_nonzero("update_time", record.update_time)
            .insert_opt("value", record.value)
            .insert_text("string_value", record.string_value.as_deref())
            .insert_text("data_value", record.data_value.as_deref())
            .insert_opt("bool_value", record.bool_value)
            .insert_opt("sum", record.sum)
            .insert("channel", msg.channel.as_str())
            .insert("publisher", msg.publisher.as_str())
            .insert("protocol", msg.protocol.as_str())
            .insert("created", created);

        let point = Point::new(
            msg.channel.as_str(),
            tags,
            fields.into_inner(),
            record_timestamp(record.time)?,
        )?;
        points.push(point);
    }
    Ok(points)
}

/// 二进制负载整体作为一个点，`blob` 字段为负载文本，时间为接收时刻。
pub fn assemble_blob(msg: &InboundMessage, now: DateTime<Utc>) -> Result<Point, PointError> {
    let mut tags = BTreeMap::new();
    tags.insert("content_type".to_string(), msg.content_type.to_string());

    let mut fields = FieldSet::new();
    fields.insert("blob", String::from_utf8_lossy(&msg.payload).into_owned());

    Point::new(msg.channel.as_str(), tags, fields.into_inner(), now)
}

/// `created` 字段：接收时刻，RFC 3339 整秒精度。
pub fn format_created(now: &DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Secs, true)
}

// 亚秒部分丢弃
fn record_timestamp(time: f64) -> Result<DateTime<Utc>, PointError> {
    DateTime::from_timestamp(time.trunc() as i64, 0).ok_or(PointError::TimeOutOfRange)
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{ContentType, FieldValue};

    const CREATED: &str = "2026-10-19T08:00:00Z";
    const ALWAYS: [&str; 4] = ["channel", "created", "protocol", "publisher"];

    fn message(content_type: ContentType, payload: &[u8]) -> InboundMessage {
        InboundMessage::new("sensors", "thing-1", "mqtt", content_type, payload.to_vec())
    }

    fn record(name: &str, time: f64) -> ResolvedRecord {
        ResolvedRecord {
            name: name.to_string(),
            time,
            ..Default::default()
        }
    }

    fn field_keys(point: &Point) -> Vec<&str> {
        point.fields().keys().map(String::as_str).collect()
    }

    #[test]
    fn one_point_per_record_with_metadata_fields() {
        let msg = message(ContentType::SenmlJson, b"");
        let records = vec![record("a", 1.0), record("b", 2.0), record("c", 3.0)];
        let points = assemble(&records, &msg, CREATED).expect("assemble");
        assert_eq!(points.len(), 3);
        for point in &points {
            assert_eq!(field_keys(point), ALWAYS.to_vec());
            assert_eq!(point.field("channel"), Some(&FieldValue::from("sensors")));
            assert_eq!(point.field("publisher"), Some(&FieldValue::from("thing-1")));
            assert_eq!(point.field("protocol"), Some(&FieldValue::from("mqtt")));
            assert_eq!(point.field("created"), Some(&FieldValue::from(CREATED)));
            assert_eq!(point.measurement(), "sensors");
        }
    }

    #[test]
    fn present_values_map_to_fields() {
        let msg = message(ContentType::SenmlJson, b"");
        let records = vec![ResolvedRecord {
            name: "dev1/temp".to_string(),
            unit: Some("Cel".to_string()),
            time: 1000.0,
            update_time: Some(60.0),
            value: Some(21.5),
            string_value: Some("warm".to_string()),
            data_value: Some("aGk=".to_string()),
            bool_value: Some(true),
            sum: Some(0.0),
        }];
        let points = assemble(&records, &msg, CREATED).expect("assemble");
        let point = &points[0];
        assert_eq!(point.field("unit"), Some(&FieldValue::from("Cel")));
        assert_eq!(point.field("update_time"), Some(&FieldValue::Float(60.0)));
        assert_eq!(point.field("value"), Some(&FieldValue::Float(21.5)));
        assert_eq!(point.field("string_value"), Some(&FieldValue::from("warm")));
        assert_eq!(point.field("data_value"), Some(&FieldValue::from("aGk=")));
        assert_eq!(point.field("bool_value"), Some(&FieldValue::Bool(true)));
        assert_eq!(point.field("sum"), Some(&FieldValue::Float(0.0)));
        assert_eq!(point.tag("name"), Some("dev1/temp"));
        assert_eq!(point.tag("content_type"), Some("senml+json"));
    }

    #[test]
    fn sentinel_values_are_omitted() {
        let msg = message(ContentType::SenmlJson, b"");
        let records = vec![ResolvedRecord {
            name: "x".to_string(),
            unit: Some(String::new()),
            time: 5.0,
            update_time: Some(0.0),
            value: None,
            string_value: Some(String::new()),
            data_value: Some(String::new()),
            bool_value: None,
            sum: None,
        }];
        let points = assemble(&records, &msg, CREATED).expect("assemble");
        assert_eq!(field_keys(&points[0]), ALWAYS.to_vec());
    }

    #[test]
    fn timestamp_is_truncated_to_seconds() {
        let msg = message(ContentType::SenmlJson, b"");
        let points = assemble(&[record("a", 1000.999)], &msg, CREATED).expect("assemble");
        assert_eq!(points[0].timestamp().timestamp(), 1000);
        assert_eq!(points[0].timestamp().timestamp_subsec_nanos(), 0);
    }

    #[test]
    fn first_invalid_record_aborts() {
        let msg = message(ContentType::SenmlJson, b"");
        let records = vec![record("a", 1.0), record("b", 1e11), record("c", 3.0)];
        let err = assemble(&records, &msg, CREATED).expect_err("out of range");
        assert_eq!(err, PointError::TimeOutOfRange);
    }

    #[test]
    fn blob_is_single_text_field() {
        let msg = message(ContentType::OctetStream, b"\x01raw bytes");
        let now = DateTime::from_timestamp(1_700_000_000, 250).expect("now");
        let point = assemble_blob(&msg, now).expect("blob");
        assert_eq!(field_keys(&point), vec!["blob"]);
        assert_eq!(point.field("blob"), Some(&FieldValue::from("\u{1}raw bytes")));
        assert_eq!(point.tag("content_type"), Some("octet-stream"));
        assert_eq!(point.tags().len(), 1);
        assert_eq!(point.timestamp(), now);
    }

    #[test]
    fn created_uses_whole_seconds() {
        let now = DateTime::from_timestamp(1_792_396_800, 987_000_000).expect("now");
        assert_eq!(format_created(&now), "2026-10-19T08:00:00Z");
    }
}
