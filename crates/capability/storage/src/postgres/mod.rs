//! # PostgreSQL 存储实现模块
//!
//! 提供 SeriesStore 的 PostgreSQL 实现（可配合 TimescaleDB 使用）。
//!
//! ## 数据库模式要求
//!
//! - `series_points`：时序点表（database, measurement, tags jsonb, fields jsonb, ts timestamptz）
//!
//! 可通过 `PgSeriesStore::ensure_schema` 自动创建。

pub mod series;

pub use series::*;
