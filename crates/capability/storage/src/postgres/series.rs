//! Postgres 时序写入实现
//!
//! 每个点一行，tags / fields 存为 jsonb；
//! 一个批次在同一事务内写入，按块拆分以避开绑定参数上限。

use crate::error::StorageError;
use crate::models::{Batch, Point};
use crate::traits::SeriesStore;
use domain::FieldValue;
use serde_json::{Map, Number, Value};
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};

/// 每条 INSERT 的最大行数（5 个参数/行，低于 65535 上限）
const ROWS_PER_INSERT: usize = 10_000;

const CREATE_TABLE: &str = "create table if not exists series_points (\
     database text not null, \
     measurement text not null, \
     tags jsonb not null, \
     fields jsonb not null, \
     ts timestamptz not null)";

const CREATE_INDEX: &str = "create index if not exists series_points_measurement_ts \
     on series_points (database, measurement, ts)";

pub struct PgSeriesStore {
    pub pool: PgPool,
}

impl PgSeriesStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 建立连接池（最大连接数 8）
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(8)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    /// 创建 series_points 表与索引（已存在则跳过）
    pub async fn ensure_schema(&self) -> Result<(), StorageError> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        sqlx::query(CREATE_INDEX).execute(&self.pool).await?;
        Ok(())
    }
}

fn tags_to_json(point: &Point) -> Value {
    let map = point
        .tags()
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect::<Map<_, _>>();
    Value::Object(map)
}

fn field_to_json(value: &FieldValue) -> Value {
    match value {
        FieldValue::Float(v) => Number::from_f64(*v).map(Value::Number).unwrap_or(Value::Null),
        FieldValue::Bool(v) => Value::Bool(*v),
        FieldValue::String(v) => Value::String(v.clone()),
    }
}

fn fields_to_json(point: &Point) -> Value {
    let map = point
        .fields()
        .iter()
        .map(|(k, v)| (k.clone(), field_to_json(v)))
        .collect::<Map<_, _>>();
    Value::Object(map)
}

#[async_trait::async_trait]
impl SeriesStore for PgSeriesStore {
    async fn write_batch(&self, batch: &Batch) -> Result<usize, StorageError> {
        if batch.is_empty() {
            return Ok(0);
        }
        let config = batch.config();
        let mut tx = self.pool.begin().await?;
        let mut written = 0usize;
        for chunk in batch.points().chunks(ROWS_PER_INSERT) {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
                "insert into series_points (database, measurement, tags, fields, ts) ",
            );
            builder.push_values(chunk.iter(), |mut b, point| {
                b.push_bind(&config.database)
                    .push_bind(point.measurement())
                    .push_bind(Json(tags_to_json(point)))
                    .push_bind(Json(fields_to_json(point)))
                    .push_bind(config.precision.truncate(&point.timestamp()));
            });
            let result = builder.build().execute(&mut *tx).await?;
            written += result.rows_affected() as usize;
        }
        tx.commit().await?;
        Ok(written)
    }
}
