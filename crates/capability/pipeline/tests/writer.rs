use chrono::{DateTime, Utc};
use domain::{ContentType, FieldValue, InboundMessage};
use std::sync::Arc;
use tsw_pipeline::{MessageTransform, PipelineError, TransformRegistry, WriteOutcome, Writer};
use tsw_storage::{BatchConfig, InMemorySeriesStore, Point, Precision};

fn setup() -> (Arc<InMemorySeriesStore>, Writer) {
    let store = Arc::new(InMemorySeriesStore::new());
    let writer = Writer::new(store.clone(), BatchConfig::new("messages", Precision::Seconds));
    (store, writer)
}

fn message(content_type: &str, payload: &[u8]) -> InboundMessage {
    InboundMessage::new(
        "sensors",
        "thing-1",
        "mqtt",
        ContentType::parse(content_type),
        payload.to_vec(),
    )
}

fn now() -> DateTime<Utc> {
    DateTime::from_timestamp(1_792_396_800, 0).expect("now")
}

#[tokio::test]
async fn senml_scenario_writes_one_point() {
    let (store, writer) = setup();
    let msg = message(
        "senml+json",
        br#"[{"bn":"dev1/","n":"temp","u":"Cel","t":1000,"v":21.5}]"#,
    );

    let outcome = writer.write_message_at(&msg, now()).await.expect("write");
    assert_eq!(outcome, WriteOutcome::Written { points: 1 });

    let batches = store.batches();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].config().database, "messages");
    let point = &batches[0].points()[0];
    assert_eq!(point.measurement(), "sensors");
    assert_eq!(point.tags().len(), 2);
    assert_eq!(point.tag("name"), Some("dev1/temp"));
    assert_eq!(point.tag("content_type"), Some("senml+json"));
    assert_eq!(point.field("unit"), Some(&FieldValue::from("Cel")));
    assert_eq!(point.field("value"), Some(&FieldValue::Float(21.5)));
    assert_eq!(
        point.field("created"),
        Some(&FieldValue::from("2026-10-19T08:00:00Z"))
    );
    assert_eq!(point.timestamp().timestamp(), 1000);
}

#[tokio::test]
async fn senml_records_share_one_batch() {
    let (store, writer) = setup();
    let msg = message(
        "senml+json",
        br#"[{"bn":"dev/","bt":1000,"n":"a","v":1},{"n":"b","t":1,"vs":"on"},{"n":"c","t":2,"vb":true}]"#,
    );

    let outcome = writer.write_message_at(&msg, now()).await.expect("write");
    assert_eq!(outcome, WriteOutcome::Written { points: 3 });
    assert_eq!(store.batch_count(), 1);
    let seconds = store
        .points()
        .iter()
        .map(|p| p.timestamp().timestamp())
        .collect::<Vec<_>>();
    assert_eq!(seconds, vec![1000, 1001, 1002]);
}

#[tokio::test]
async fn empty_senml_list_is_normalization_error() {
    let (store, writer) = setup();
    let err = writer
        .write_message(&message("senml+json", b"[]"))
        .await
        .expect_err("empty list");
    assert!(matches!(err, PipelineError::Normalization(_)));
    assert_eq!(store.batch_count(), 0);
}

#[tokio::test]
async fn invalid_senml_is_decode_error() {
    let (store, writer) = setup();
    let err = writer
        .write_message(&message("senml+json", b"not json"))
        .await
        .expect_err("decode");
    assert!(matches!(err, PipelineError::Decode(_)));
    assert_eq!(store.batch_count(), 0);
}

#[tokio::test]
async fn failing_point_voids_whole_message() {
    let (store, writer) = setup();
    let msg = message(
        "senml+json",
        br#"[{"n":"a","t":1000,"v":1},{"n":"b","t":1e11,"v":2}]"#,
    );
    let err = writer.write_message(&msg).await.expect_err("out of range");
    assert_eq!(
        err.to_string(),
        "point construction error: timestamp out of range"
    );
    assert_eq!(store.batch_count(), 0);
}

#[tokio::test]
async fn record_name_with_line_break_is_rejected() {
    let (store, writer) = setup();
    let msg = message(
        "senml+json",
        br#"[{"n":"temp\nother_channel,name=evil value=666 1","t":1000,"v":1}]"#,
    );

    let err = writer
        .write_message_at(&msg, now())
        .await
        .expect_err("control character");
    assert!(matches!(err, PipelineError::PointConstruction(_)));
    assert!(err.to_string().starts_with("point construction error: invalid token"));
    assert_eq!(store.batch_count(), 0);
}

#[tokio::test]
async fn relative_time_uses_whole_receive_second() {
    let (store, writer) = setup();
    let msg = message("senml+json", br#"[{"n":"temp","t":-0.5,"v":1}]"#);
    let received = DateTime::from_timestamp(1_792_396_800, 900_000_000).expect("now");

    writer.write_message_at(&msg, received).await.expect("write");
    assert_eq!(store.points()[0].timestamp().timestamp(), 1_792_396_799);
}

#[tokio::test]
async fn blob_writes_payload_as_text() {
    let (store, writer) = setup();
    let msg = message("octet-stream", b"hello world");

    let outcome = writer.write_message_at(&msg, now()).await.expect("write");
    assert_eq!(outcome, WriteOutcome::Written { points: 1 });

    let points = store.points();
    assert_eq!(points.len(), 1);
    assert_eq!(points[0].fields().len(), 1);
    assert_eq!(points[0].field("blob"), Some(&FieldValue::from("hello world")));
    assert_eq!(points[0].tag("content_type"), Some("octet-stream"));
    assert_eq!(points[0].timestamp(), now());
}

#[tokio::test]
async fn unknown_content_type_is_noop() {
    let (store, writer) = setup();
    let outcome = writer
        .write_message(&message("application/json", br#"{"a":1}"#))
        .await
        .expect("noop");
    assert_eq!(outcome, WriteOutcome::Skipped);
    assert_eq!(store.batch_count(), 0);
}

#[tokio::test]
async fn same_message_twice_writes_two_points() {
    let (store, writer) = setup();
    let msg = message("senml+json", br#"[{"n":"temp","t":1000,"v":1}]"#);

    writer.write_message(&msg).await.expect("first");
    writer.write_message(&msg).await.expect("second");

    // 不做去重：两次写入产生两个独立的点
    let points = store.points();
    assert_eq!(points.len(), 2);
    assert_eq!(points[0].timestamp(), points[1].timestamp());
    assert_eq!(store.batch_count(), 2);
}

#[tokio::test]
async fn storage_failure_is_write_error() {
    let store = Arc::new(InMemorySeriesStore::failing("connection refused"));
    let writer = Writer::new(store.clone(), BatchConfig::new("messages", Precision::Seconds));

    let err = writer
        .write_message(&message("octet-stream", b"x"))
        .await
        .expect_err("write failure");
    assert_eq!(err.to_string(), "write error: connection refused");
    assert!(store.is_empty());
}

struct UpperTransform;

impl MessageTransform for UpperTransform {
    fn transform(
        &self,
        msg: &InboundMessage,
        now: DateTime<Utc>,
    ) -> Result<Vec<Point>, PipelineError> {
        let mut fields = tsw_pipeline::FieldSet::new();
        fields.insert(
            "text",
            String::from_utf8_lossy(&msg.payload).to_uppercase(),
        );
        let point = Point::new(
            msg.channel.as_str(),
            Default::default(),
            fields.into_inner(),
            now,
        )
        .map_err(|err| PipelineError::PointConstruction(err.to_string()))?;
        Ok(vec![point])
    }
}

struct EmptyTransform;

impl MessageTransform for EmptyTransform {
    fn transform(
        &self,
        _msg: &InboundMessage,
        _now: DateTime<Utc>,
    ) -> Result<Vec<Point>, PipelineError> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn registry_accepts_new_content_types() {
    let store = Arc::new(InMemorySeriesStore::new());
    let registry = TransformRegistry::default()
        .with("text/plain", Arc::new(UpperTransform))
        .with("application/x-empty", Arc::new(EmptyTransform));
    assert_eq!(
        registry.content_types(),
        vec!["application/x-empty", "octet-stream", "senml+json", "text/plain"]
    );
    let writer = Writer::with_registry(
        store.clone(),
        BatchConfig::new("messages", Precision::Seconds),
        registry,
    );

    writer
        .write_message(&message("text/plain", b"abc"))
        .await
        .expect("write");
    assert_eq!(store.points()[0].field("text"), Some(&FieldValue::from("ABC")));

    let outcome = writer
        .write_message(&message("application/x-empty", b"abc"))
        .await
        .expect("empty");
    assert_eq!(outcome, WriteOutcome::Skipped);
    assert_eq!(store.batch_count(), 1);
}

#[tokio::test]
async fn empty_registry_skips_everything() {
    let store = Arc::new(InMemorySeriesStore::new());
    let writer = Writer::with_registry(
        store.clone(),
        BatchConfig::new("messages", Precision::Seconds),
        TransformRegistry::empty(),
    );
    let outcome = writer
        .write_message(&message("senml+json", br#"[{"n":"a","v":1}]"#))
        .await
        .expect("skip");
    assert_eq!(outcome, WriteOutcome::Skipped);
    assert!(store.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_messages_write_independent_batches() {
    let (store, writer) = setup();
    let mut handles = Vec::new();
    for index in 0..16 {
        let writer = writer.clone();
        handles.push(tokio::spawn(async move {
            let payload = format!(r#"[{{"n":"sensor-{}","t":1000,"v":{}}}]"#, index, index);
            let msg = message("senml+json", payload.as_bytes());
            writer.write_message(&msg).await
        }));
    }
    for handle in handles {
        let outcome = handle.await.expect("join").expect("write");
        assert_eq!(outcome, WriteOutcome::Written { points: 1 });
    }
    assert_eq!(store.batch_count(), 16);
    assert_eq!(store.len(), 16);
}
