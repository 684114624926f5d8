//! # 分析服务错误模型
//!
//! 4xx 与 5xx 分开表达：前者是请求本身被拒绝（换一张图或修正参数），
//! 后者是服务端故障。两者都不自动重试，直接交给调用方展示。

/// 分析服务调用错误。
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// 提交前的本地校验失败，请求未发出。
    #[error("提交内容无效：{0}")]
    InvalidPayload(String),

    #[error("分析服务拒绝请求（HTTP {status}）：{message}")]
    Rejected { status: u16, message: String },

    #[error("分析服务内部错误（HTTP {status}）：{message}")]
    Server { status: u16, message: String },

    #[error("网络错误：{0}")]
    Transport(String),

    #[error("响应格式无效：{0}")]
    InvalidResponse(String),

    #[error("配置错误：{0}")]
    Config(String),
}

impl AnalysisError {
    /// 稳定错误码，供日志与前端匹配。
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidPayload(_) => "E_ANALYSIS_INVALID_PAYLOAD",
            Self::Rejected { .. } => "E_ANALYSIS_REJECTED",
            Self::Server { .. } => "E_ANALYSIS_SERVER",
            Self::Transport(_) => "E_ANALYSIS_TRANSPORT",
            Self::InvalidResponse(_) => "E_ANALYSIS_INVALID_RESPONSE",
            Self::Config(_) => "E_ANALYSIS_CONFIG",
        }
    }

    /// 请求本身有问题（本地校验失败或服务端返回 4xx）。
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidPayload(_) | Self::Rejected { .. })
    }

    /// 服务端返回的 HTTP 状态码（如有）。
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } | Self::Server { status, .. } => Some(*status),
            _ => None,
        }
    }
}
