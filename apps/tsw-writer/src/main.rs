//! 时序写入服务：MQTT 接入 → 写入流水线 → 时序库，附带 /health 与 /metrics。

mod ingest;
mod routes;

use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;
use tsw_config::{AppConfig, StorageKind};
use tsw_pipeline::Writer;
use tsw_storage::{BatchConfig, InMemorySeriesStore, InfluxSeriesStore, PgSeriesStore, SeriesStore};
use tsw_telemetry::init_tracing;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 加载本地 .env（如存在），便于直接 cargo run 启动
    dotenvy::dotenv().ok();
    // 从环境变量加载运行配置
    let config = AppConfig::from_env()?;
    // 初始化结构化日志
    init_tracing();

    let store = build_store(&config).await?;
    let writer = Writer::new(
        store,
        BatchConfig::new(config.db_name.clone(), config.db_precision),
    );
    info!(
        target: "tsw.writer",
        storage = ?config.storage,
        database = %config.db_name,
        precision = %config.db_precision,
        content_types = ?writer.registry().content_types(),
        "writer_ready"
    );

    let _ingest = ingest::spawn_ingest(&config, writer);

    let app = routes::create_router().layer(TraceLayer::new_for_http());
    let listener = tokio::net::TcpListener::bind(&config.http_addr).await?;
    info!(target: "tsw.writer", addr = %config.http_addr, "http_listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!(target: "tsw.writer", "shutdown");
    Ok(())
}

/// 按配置构造存储后端。
async fn build_store(
    config: &AppConfig,
) -> Result<Arc<dyn SeriesStore>, Box<dyn std::error::Error>> {
    let store: Arc<dyn SeriesStore> = match config.storage {
        StorageKind::Influx => Arc::new(
            InfluxSeriesStore::new(config.influx_url.clone()).with_credentials(
                config.influx_username.clone(),
                config.influx_password.clone(),
            ),
        ),
        StorageKind::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .ok_or("TSW_DATABASE_URL is required for postgres storage")?;
            let store = PgSeriesStore::connect(url).await?;
            // 首次启动自动建表
            store.ensure_schema().await?;
            Arc::new(store)
        }
        StorageKind::Memory => Arc::new(InMemorySeriesStore::new()),
    };
    Ok(store)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(target: "tsw.writer", error = %err, "shutdown_signal_failed");
    }
}
