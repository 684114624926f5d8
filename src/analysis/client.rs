//! # 分析服务客户端
//!
//! ## 设计思路
//!
//! 分析服务对本 crate 是不透明的外部协作者：提交图片字节，拿回建议裁剪或错误。
//! `AnalysisService` trait 作为接缝，会话层只依赖 trait，测试与替代实现都可以注入。
//!
//! ## 实现思路
//!
//! - POST `multipart/form-data`，单字段 `image`（字节 + 内容类型 + 文件名）。
//! - 发送前先做本地校验，注定被拒的请求不出网。
//! - 非 2xx 响应按 `{"error": "..."}` 解析消息，4xx → `Rejected`，5xx → `Server`。
//! - 不做自动重试。

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};

use super::{
    AnalysisConfig, AnalysisError, AnalysisResponse, ErrorBody, ImagePayload, ServiceInfo,
    validate_submission,
};

/// 分析服务接口。
#[async_trait]
pub trait AnalysisService: Send + Sync {
    /// 提交一张图片做分析。
    async fn analyze(&self, payload: ImagePayload) -> Result<AnalysisResponse, AnalysisError>;

    /// 查询服务信息。
    async fn service_info(&self) -> Result<ServiceInfo, AnalysisError>;
}

/// 基于 HTTP 的分析服务客户端。
pub struct HttpAnalysisClient {
    client: reqwest::Client,
    config: AnalysisConfig,
}

impl HttpAnalysisClient {
    /// 校验配置并构建复用型 HTTP 客户端。
    pub fn new(config: AnalysisConfig) -> Result<Self, AnalysisError> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| AnalysisError::Config(format!("无法创建 HTTP 客户端：{}", e)))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    fn endpoint(&self) -> &str {
        self.config.endpoint.trim()
    }

    /// 统一映射 reqwest 错误到业务错误。
    fn map_reqwest_error(&self, e: reqwest::Error) -> AnalysisError {
        if e.is_timeout() {
            AnalysisError::Transport(format!("请求超时（{}秒）", self.config.timeout_secs))
        } else if e.is_connect() {
            AnalysisError::Transport(format!("无法连接 {}：{}", self.endpoint(), e))
        } else {
            AnalysisError::Transport(format!("请求失败：{}", e))
        }
    }

    /// 非 2xx 响应：优先取 `{"error": "..."}` 中的消息。
    fn map_status_error(status: StatusCode, body: &[u8]) -> AnalysisError {
        let message = serde_json::from_slice::<ErrorBody>(body)
            .map(|b| b.error)
            .unwrap_or_else(|_| String::from_utf8_lossy(body).trim().to_string());
        let code = status.as_u16();

        if status.is_client_error() {
            AnalysisError::Rejected { status: code, message }
        } else if status.is_server_error() {
            AnalysisError::Server { status: code, message }
        } else {
            AnalysisError::InvalidResponse(format!("意外的 HTTP 状态 {}：{}", code, message))
        }
    }

    async fn read_body(&self, response: reqwest::Response) -> Result<(StatusCode, Vec<u8>), AnalysisError> {
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        if !status.is_success() {
            return Err(Self::map_status_error(status, &body));
        }

        Ok((status, body.to_vec()))
    }
}

#[async_trait]
impl AnalysisService for HttpAnalysisClient {
    async fn analyze(&self, payload: ImagePayload) -> Result<AnalysisResponse, AnalysisError> {
        validate_submission(&payload, self.config.max_upload_bytes)?;

        log::info!(
            "🛰️ 提交图片分析 - {} {}KB {}",
            payload.file_name,
            payload.bytes.len() / 1024,
            payload.content_type
        );
        let start = Instant::now();

        let part = Part::bytes(payload.bytes.to_vec())
            .file_name(payload.file_name.clone())
            .mime_str(&payload.content_type)
            .map_err(|e| AnalysisError::InvalidPayload(format!("内容类型无效：{}", e)))?;
        let form = Form::new().part("image", part);

        let response = self
            .client
            .post(self.endpoint())
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        let (status, body) = match self.read_body(response).await {
            Ok(ok) => ok,
            Err(err) => {
                log::warn!("⚠️ 图片分析失败 [{}]：{}", err.code(), err);
                return Err(err);
            }
        };

        let parsed: AnalysisResponse = serde_json::from_slice(&body)
            .map_err(|e| AnalysisError::InvalidResponse(format!("无法解析分析结果：{}", e)))?;

        if !parsed.success {
            return Err(AnalysisError::InvalidResponse(format!(
                "服务端返回 success=false（HTTP {}）：{}",
                status.as_u16(),
                parsed.message
            )));
        }

        log::info!(
            "✅ 图片分析完成 - 有建议裁剪: {} 服务端耗时: {:?}ms 总耗时: {}ms",
            parsed.result.is_some(),
            parsed.processing_time,
            start.elapsed().as_millis()
        );

        Ok(parsed)
    }

    async fn service_info(&self) -> Result<ServiceInfo, AnalysisError> {
        let response = self
            .client
            .get(self.endpoint())
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        let (_, body) = self.read_body(response).await?;

        serde_json::from_slice(&body)
            .map_err(|e| AnalysisError::InvalidResponse(format!("无法解析服务信息：{}", e)))
    }
}
