//! HTTP 客户端模块 - 三个只读列表接口
//!
//! | 接口 | 信封键 |
//! |------|--------|
//! | `GET {base}/entities` | `entities` |
//! | `GET {base}/timeline/{entity_id}` | `events` |
//! | `GET {base}/alert/` | `alerts` |
//!
//! 失败分类：请求发不出去 → `NetworkFailure`；非 2xx → `HttpError`；
//! 响应体不是 JSON 对象或记录解析失败 → `MalformedResponse`。
//! 信封键缺失或为 null 视为空列表，不是错误。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, info};

use crate::config::{DashboardConfig, HttpClientConfig};
use crate::error::{DashboardError, Result};
use crate::models::{Alert, Entity, EntityId, TimelineEvent};

pub const ENTITIES_PATH: &str = "entities";
pub const ALERTS_PATH: &str = "alert/";

pub const ENTITIES_ENVELOPE: &str = "entities";
pub const EVENTS_ENVELOPE: &str = "events";
pub const ALERTS_ENVELOPE: &str = "alerts";

/// 时间线接口路径
pub fn timeline_path(entity_id: EntityId) -> String {
    format!("timeline/{}", entity_id)
}

/// 后端数据源（由 HTTP 实现，测试中可替换为内存实现）
#[async_trait]
pub trait DashboardApi: Send + Sync {
    /// 拉取全部实体
    async fn fetch_entities(&self) -> Result<Vec<Entity>>;

    /// 拉取某个实体的活动时间线
    async fn fetch_timeline(&self, entity_id: EntityId) -> Result<Vec<TimelineEvent>>;

    /// 拉取告警列表
    async fn fetch_alerts(&self) -> Result<Vec<Alert>>;
}

/// 从信封中取出列表
///
/// 键缺失或为 null → 空列表；body 不是对象、或列表元素解析失败 → MalformedResponse。
pub fn parse_envelope<T: DeserializeOwned>(body: Value, key: &str) -> Result<Vec<T>> {
    let mut object = match body {
        Value::Object(map) => map,
        other => {
            return Err(DashboardError::MalformedResponse(format!(
                "expected a JSON object with key {:?}, got {}",
                key,
                json_kind(&other)
            )))
        }
    };

    match object.remove(key) {
        None | Some(Value::Null) => {
            debug!("信封键 {:?} 缺失，按空列表处理", key);
            Ok(Vec::new())
        }
        Some(items @ Value::Array(_)) => serde_json::from_value(items).map_err(|e| {
            DashboardError::MalformedResponse(format!("invalid {:?} payload: {}", key, e))
        }),
        Some(other) => Err(DashboardError::MalformedResponse(format!(
            "expected {:?} to be an array, got {}",
            key,
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// 基于 reqwest 的实现
#[derive(Debug, Clone)]
pub struct HttpApiClient {
    client: Client,
    base_url: String,
}

impl HttpApiClient {
    /// 创建新的 HTTP 客户端
    pub fn new(config: &DashboardConfig) -> Result<Self> {
        let base_url = config.resolved_base_url()?;
        let client = build_client(&config.http_client_config)?;

        info!("✅ HTTP 客户端已创建 (base_url: {})", base_url);

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// GET 并解析信封
    async fn get_envelope<T: DeserializeOwned>(&self, path: &str, key: &str) -> Result<Vec<T>> {
        let url = self.url(path);
        debug!("🔗 GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| DashboardError::NetworkFailure(format!("GET {} 失败: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "无法读取错误信息".to_string());
            error!("❌ GET {} 失败，HTTP 状态码: {}, 错误: {}", url, status, error_text);
            return Err(DashboardError::HttpError {
                status: status.as_u16(),
                body: error_text,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| DashboardError::NetworkFailure(format!("读取 {} 响应失败: {}", url, e)))?;
        let body: Value = serde_json::from_slice(&bytes)?;

        parse_envelope(body, key)
    }
}

fn build_client(config: &HttpClientConfig) -> Result<Client> {
    let mut builder = Client::builder();

    if let Some(timeout) = config.connect_timeout_secs {
        builder = builder.connect_timeout(Duration::from_secs(timeout));
    }

    if let Some(timeout) = config.request_timeout_secs {
        builder = builder.timeout(Duration::from_secs(timeout));
    }

    builder
        .build()
        .map_err(|e| DashboardError::Config(format!("创建 HTTP 客户端失败: {}", e)))
}

#[async_trait]
impl DashboardApi for HttpApiClient {
    async fn fetch_entities(&self) -> Result<Vec<Entity>> {
        self.get_envelope(ENTITIES_PATH, ENTITIES_ENVELOPE).await
    }

    async fn fetch_timeline(&self, entity_id: EntityId) -> Result<Vec<TimelineEvent>> {
        self.get_envelope(&timeline_path(entity_id), EVENTS_ENVELOPE).await
    }

    async fn fetch_alerts(&self) -> Result<Vec<Alert>> {
        self.get_envelope(ALERTS_PATH, ALERTS_ENVELOPE).await
    }
}
