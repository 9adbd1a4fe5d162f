//! InfluxDB 1.x 时序写入实现
//!
//! 通过 HTTP `/write` 接口提交 line protocol，一个批次一次请求。

pub mod line_protocol;

use crate::error::StorageError;
use crate::models::Batch;
use crate::traits::SeriesStore;
use reqwest::Client;
use tracing::debug;

pub struct InfluxSeriesStore {
    client: Client,
    url: String,
    username: Option<String>,
    password: Option<String>,
}

impl InfluxSeriesStore {
    /// 创建 InfluxDB 写入存储
    ///
    /// # 参数
    /// - `url`：InfluxDB 根地址，如 `http://127.0.0.1:8086`
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), url)
    }

    pub fn with_client(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into().trim_end_matches('/').to_string(),
            username: None,
            password: None,
        }
    }

    /// 设置 basic auth 凭据
    pub fn with_credentials(mut self, username: Option<String>, password: Option<String>) -> Self {
        self.username = username;
        self.password = password;
        self
    }

    pub fn write_url(&self) -> String {
        format!("{}/write", self.url)
    }
}

#[async_trait::async_trait]
impl SeriesStore for InfluxSeriesStore {
    async fn write_batch(&self, batch: &Batch) -> Result<usize, StorageError> {
        if batch.is_empty() {
            return Ok(0);
        }
        let config = batch.config();
        let body = line_protocol::encode_batch(batch);

        let mut request = self
            .client
            .post(self.write_url())
            .query(&[
                ("db", config.database.as_str()),
                ("precision", config.precision.as_str()),
            ])
            .body(body);
        if let Some(username) = self.username.as_ref() {
            request = request.basic_auth(username, self.password.as_ref());
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::new(format!(
                "influxdb write failed: {} {}",
                status,
                body.trim()
            )));
        }
        debug!(
            target: "tsw.storage",
            database = %config.database,
            points = batch.len(),
            "influx_batch_written"
        );
        Ok(batch.len())
    }
}
