use chrono::DateTime;
use domain::FieldValue;
use std::collections::BTreeMap;
use tsw_storage::{Batch, BatchConfig, InMemorySeriesStore, Point, Precision, SeriesStore};

fn sample_point(name: &str, secs: i64) -> Point {
    let mut tags = BTreeMap::new();
    tags.insert("name".to_string(), name.to_string());
    let mut fields = BTreeMap::new();
    fields.insert("value".to_string(), FieldValue::Float(1.0));
    Point::new(
        "sensors",
        tags,
        fields,
        DateTime::from_timestamp(secs, 0).expect("timestamp"),
    )
    .expect("point")
}

#[tokio::test]
async fn in_memory_keeps_batches_in_order() {
    let store = InMemorySeriesStore::new();
    let config = BatchConfig::new("messages", Precision::Seconds);

    let mut first = Batch::new(config.clone());
    first.add_point(sample_point("a", 1));
    first.add_point(sample_point("b", 2));
    let mut second = Batch::new(config);
    second.add_point(sample_point("c", 3));

    assert_eq!(store.write_batch(&first).await.expect("write"), 2);
    assert_eq!(store.write_batch(&second).await.expect("write"), 1);

    assert_eq!(store.batch_count(), 2);
    assert_eq!(store.len(), 3);
    let names = store
        .points()
        .iter()
        .map(|p| p.tag("name").unwrap_or_default().to_string())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["a", "b", "c"]);
    assert_eq!(store.batches()[0].config().database, "messages");
}

#[tokio::test]
async fn in_memory_injected_failure_rejects_whole_batch() {
    let store = InMemorySeriesStore::failing("database unavailable");
    let mut batch = Batch::new(BatchConfig::new("messages", Precision::Seconds));
    batch.add_point(sample_point("a", 1));

    let err = store.write_batch(&batch).await.expect_err("failure");
    assert_eq!(err.to_string(), "database unavailable");
    assert!(store.is_empty());

    store.set_failure(None);
    store.write_batch(&batch).await.expect("write");
    assert_eq!(store.len(), 1);
}
