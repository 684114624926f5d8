//! # 图片分析协作者（analysis）
//!
//! ## 设计思路
//!
//! 远端分析服务只作为接口建模：提交原始图片字节，返回建议裁剪与标题，或返回错误。
//! 本模块不实现任何构图分析逻辑。
//!
//! 建议矩形被视为不可信输入，经 `AnalysisResult::clamped_crop` 收敛后
//! 才交给导出器，与手动选区走同一条越界收敛逻辑。
//!
//! ## 模块划分
//!
//! - `client`：`AnalysisService` trait 与 HTTP 实现
//! - `types`：请求/响应模型
//! - `validation`：提交前校验（类型、空内容、体积上限）
//! - `config/error`：配置与错误

mod client;
mod config;
mod error;
mod types;
mod validation;

pub use client::{AnalysisService, HttpAnalysisClient};
pub use config::AnalysisConfig;
pub use error::AnalysisError;
pub use types::{
    AnalysisResponse, AnalysisResult, Dimensions, ErrorBody, ImagePayload, ServiceInfo,
    UploadMetadata,
};
pub use validation::{MAX_UPLOAD_BYTES, is_image_content_type, validate_submission};
