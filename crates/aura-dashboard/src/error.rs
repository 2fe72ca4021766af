//! 错误类型
//!
//! 所有拉取失败在 ResourceSync 边界被折叠成 `SyncStatus::Error` + 可读消息，
//! 这里的分类只用于日志与测试断言，展示层不需要区分。

/// Dashboard 核心错误
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DashboardError {
    /// 请求无法发出或未能完成（连接失败、超时、读取响应体失败）
    #[error("Network failure: {0}")]
    NetworkFailure(String),

    /// 服务端返回非 2xx 状态码
    #[error("HTTP error {status}: {body}")]
    HttpError { status: u16, body: String },

    /// 响应体无法解析或不是预期的信封结构
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// 配置错误
    #[error("Config error: {0}")]
    Config(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl DashboardError {
    /// 错误分类名（用于日志）
    pub fn kind(&self) -> &'static str {
        match self {
            DashboardError::NetworkFailure(_) => "network_failure",
            DashboardError::HttpError { .. } => "http_error",
            DashboardError::MalformedResponse(_) => "malformed_response",
            DashboardError::Config(_) => "config",
            DashboardError::Other(_) => "other",
        }
    }

    /// 是否是 HTTP 状态码错误
    pub fn http_status(&self) -> Option<u16> {
        match self {
            DashboardError::HttpError { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for DashboardError {
    fn from(error: serde_json::Error) -> Self {
        DashboardError::MalformedResponse(error.to_string())
    }
}

impl From<std::io::Error> for DashboardError {
    fn from(error: std::io::Error) -> Self {
        DashboardError::Other(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;
