//! # 分析服务配置

use serde::{Deserialize, Serialize};

use super::{AnalysisError, validation::MAX_UPLOAD_BYTES};

/// 分析服务客户端配置。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// 服务地址：POST 提交分析，GET 查询服务信息。
    pub endpoint: String,
    /// 单次请求总超时（秒）。
    pub timeout_secs: u64,
    /// 建连超时（秒）。
    pub connect_timeout_secs: u64,
    /// 本地预检使用的上传体积上限（字节）。
    pub max_upload_bytes: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:3000/api/crop".to_string(),
            timeout_secs: 30,
            connect_timeout_secs: 8,
            max_upload_bytes: MAX_UPLOAD_BYTES,
        }
    }
}

impl AnalysisConfig {
    /// 使用指定地址，其余字段取默认值。
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), AnalysisError> {
        let url = reqwest::Url::parse(self.endpoint.trim())
            .map_err(|e| AnalysisError::Config(format!("endpoint 无效：{}", e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(AnalysisError::Config(format!(
                "endpoint 仅支持 http/https：{}",
                url.scheme()
            )));
        }
        if !(1..=600).contains(&self.timeout_secs) {
            return Err(AnalysisError::Config("timeout_secs 必须在 1~600 秒之间".to_string()));
        }
        if !(1..=120).contains(&self.connect_timeout_secs) {
            return Err(AnalysisError::Config(
                "connect_timeout_secs 必须在 1~120 秒之间".to_string(),
            ));
        }
        if self.max_upload_bytes == 0 {
            return Err(AnalysisError::Config("max_upload_bytes 必须大于 0".to_string()));
        }

        Ok(())
    }
}
