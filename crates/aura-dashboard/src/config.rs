//! Dashboard 配置
//!
//! 唯一真正需要外部覆盖的是 API 基础路径。默认是同源相对路径 `/api`，
//! 开发时由反向代理转发到真实后端；相对路径通过 `origin` 解析成绝对 URL。

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

use crate::error::{DashboardError, Result};

/// API 基础路径环境变量
pub const ENV_API_URL: &str = "AURA_API_URL";
/// 相对路径解析用的源站环境变量
pub const ENV_ORIGIN: &str = "AURA_ORIGIN";

pub const DEFAULT_API_BASE_URL: &str = "/api";
pub const DEFAULT_ORIGIN: &str = "http://localhost:5000";

/// HTTP 客户端配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpClientConfig {
    /// 连接超时（秒）
    pub connect_timeout_secs: Option<u64>,
    /// 请求超时（秒）
    pub request_timeout_secs: Option<u64>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: Some(10),
            request_timeout_secs: Some(30),
        }
    }
}

/// Dashboard 配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// API 基础路径，可以是相对路径（`/api`）或绝对 URL
    pub api_base_url: String,
    /// 相对基础路径所挂载的源站
    pub origin: String,
    /// HTTP 客户端配置
    pub http_client_config: HttpClientConfig,
    /// 被新请求取代时是否中止旧的时间线请求（仅是优化，正确性不依赖它）
    pub abort_superseded: bool,
    /// 事件缓冲区大小
    pub event_buffer_size: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            origin: DEFAULT_ORIGIN.to_string(),
            http_client_config: HttpClientConfig::default(),
            abort_superseded: false,
            event_buffer_size: 256,
        }
    }
}

impl DashboardConfig {
    pub fn builder() -> DashboardConfigBuilder {
        DashboardConfigBuilder::new()
    }

    /// 默认配置 + 环境变量覆盖
    pub fn from_env() -> Self {
        Self::default().with_env_overrides(|key| std::env::var(key).ok())
    }

    /// 从 JSON 文件加载（缺省字段取默认值），再应用环境变量覆盖
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_json_file_with(path, |key| std::env::var(key).ok())
    }

    /// 从 JSON 文件加载，覆盖项由 `lookup` 提供
    pub fn from_json_file_with<P, F>(path: P, lookup: F) -> Result<Self>
    where
        P: AsRef<Path>,
        F: Fn(&str) -> Option<String>,
    {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| DashboardError::Config(format!("读取配置文件失败 {}: {}", path.display(), e)))?;
        let config: DashboardConfig = serde_json::from_str(&raw)
            .map_err(|e| DashboardError::Config(format!("解析配置文件失败 {}: {}", path.display(), e)))?;
        info!("✅ 已加载配置文件: {}", path.display());
        Ok(config.with_env_overrides(lookup))
    }

    /// 应用覆盖项（空字符串视为未设置）
    fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            debug!("{} 覆盖 api_base_url: {}", ENV_API_URL, base);
            self.api_base_url = base;
        }
        if let Some(origin) = lookup(ENV_ORIGIN).filter(|v| !v.trim().is_empty()) {
            debug!("{} 覆盖 origin: {}", ENV_ORIGIN, origin);
            self.origin = origin;
        }
        self
    }

    /// 解析后的绝对 API 基础 URL（不带末尾 `/`）
    pub fn resolved_base_url(&self) -> Result<String> {
        let base = self.api_base_url.trim();
        if base.starts_with("http://") || base.starts_with("https://") {
            return Ok(base.trim_end_matches('/').to_string());
        }
        let origin = self.origin.trim().trim_end_matches('/');
        if !(origin.starts_with("http://") || origin.starts_with("https://")) {
            return Err(DashboardError::Config(format!(
                "相对 API 路径 {:?} 需要一个 http(s) 源站，当前 origin={:?}",
                base, self.origin
            )));
        }
        let path = base.trim_matches('/');
        if path.is_empty() {
            Ok(origin.to_string())
        } else {
            Ok(format!("{}/{}", origin, path))
        }
    }
}

/// Dashboard 配置构建器
pub struct DashboardConfigBuilder {
    config: DashboardConfig,
}

impl DashboardConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: DashboardConfig::default(),
        }
    }

    /// 设置 API 基础路径
    pub fn api_base_url<S: Into<String>>(mut self, url: S) -> Self {
        self.config.api_base_url = url.into();
        self
    }

    pub fn origin<S: Into<String>>(mut self, origin: S) -> Self {
        self.config.origin = origin.into();
        self
    }

    /// 设置 HTTP 客户端配置
    pub fn http_client_config(mut self, config: HttpClientConfig) -> Self {
        self.config.http_client_config = config;
        self
    }

    pub fn abort_superseded(mut self, enabled: bool) -> Self {
        self.config.abort_superseded = enabled;
        self
    }

    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.config.event_buffer_size = size.max(1);
        self
    }

    pub fn build(self) -> DashboardConfig {
        self.config
    }
}

impl Default for DashboardConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
