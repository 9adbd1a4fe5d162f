//! # TSW Storage 模块
//!
//! 本模块提供时序库写入的统一抽象层，支持多种存储后端实现。
//!
//! ## 架构设计
//!
//! 1. **接口抽象层** (`traits.rs`)：`SeriesStore` 批次写入接口
//! 2. **数据模型层** (`models.rs`)：时序点、批次、批次配置、时间精度
//! 3. **错误处理层** (`error.rs`)：统一的存储错误类型
//! 4. **校验层** (`validation.rs`)：点模型约束（`PointError`）
//! 5. **实现层**：
//!    - `in_memory/`：内存存储实现（用于测试和演示）
//!    - `influx/`：InfluxDB 1.x HTTP 写入（line protocol）
//!    - `postgres/`：PostgreSQL 存储实现（jsonb tags / fields）
//!
//! ## 写入契约
//!
//! 后端对外提供三个操作：
//!
//! - **批次构造**：`Batch::new(BatchConfig { database, precision })`
//! - **点构造**：`Point::new(measurement, tags, fields, timestamp)`，校验失败返回 `PointError`
//! - **批次提交**：`SeriesStore::write_batch(&batch)`，一次调用，失败即整批失败
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! use tsw_storage::{Batch, BatchConfig, InfluxSeriesStore, Point, Precision, SeriesStore};
//!
//! let store = InfluxSeriesStore::new("http://127.0.0.1:8086");
//! let mut batch = Batch::new(BatchConfig::new("messages", Precision::Seconds));
//! batch.add_point(Point::new("sensors", tags, fields, timestamp)?);
//! store.write_batch(&batch).await?;
//! ```
//!
//! ## 并发
//!
//! 所有实现均为 `Send + Sync`，可在多个任务间共享同一个 `Arc<dyn SeriesStore>`：
//!
//! - 内存实现使用 `RwLock<Vec<Batch>>`
//! - InfluxDB 实现复用同一个 `reqwest::Client`
//! - PostgreSQL 实现使用 sqlx 连接池（最大连接数 8）

// 模块导出：将子模块的内容导出到 crate 根目录
pub mod error;
pub mod in_memory;
pub mod influx;
pub mod models;
pub mod postgres;
pub mod traits;
pub mod validation;

// 导出常用类型到 crate 根目录，方便外部引用
pub use error::*;
pub use models::*;
pub use traits::*;
pub use validation::*;

pub use in_memory::InMemorySeriesStore;
pub use influx::InfluxSeriesStore;
pub use postgres::PgSeriesStore;
