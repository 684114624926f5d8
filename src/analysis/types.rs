//! # 分析服务请求/响应模型
//!
//! 响应结构按服务端 JSON 的 camelCase 命名反序列化。
//! 服务端可能返回建议裁剪 `result`，也可能只返回上传元数据 `metadata`，两者都是可选的。

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geometry::{self, NativeRect, Size};

/// 待提交的图片：字节 + 声明的内容类型 + 文件名。
#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub bytes: Bytes,
    pub content_type: String,
    pub file_name: String,
}

impl ImagePayload {
    pub fn new(bytes: Bytes, content_type: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            bytes,
            content_type: content_type.into(),
            file_name: file_name.into(),
        }
    }

    /// 通过文件头魔数推断内容类型；无法识别时退化为 `application/octet-stream`，
    /// 交由提交前校验拒绝。
    pub fn from_bytes(bytes: impl Into<Bytes>, file_name: impl Into<String>) -> Self {
        let bytes = bytes.into();
        let content_type = infer::get(&bytes)
            .map(|kind| kind.mime_type())
            .unwrap_or("application/octet-stream");

        Self::new(bytes, content_type, file_name)
    }
}

/// 宽高（像素）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// 服务端给出的建议裁剪。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// 原图像素坐标下的建议矩形（不可信，使用前必须收敛）。
    pub crop: NativeRect,
    pub title: String,
    pub original_size: Dimensions,
    pub cropped_size: Dimensions,
}

impl AnalysisResult {
    /// 将建议矩形收敛到原图范围内。
    pub fn clamped_crop(&self, natural: Size) -> NativeRect {
        geometry::clamp_native(&self.crop, natural)
    }
}

/// 服务端回显的上传信息。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadMetadata {
    /// 上传体积（字节）。
    pub original_size: u64,
    pub original_type: String,
    pub original_name: String,
}

/// 分析成功响应。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub result: Option<AnalysisResult>,
    #[serde(default)]
    pub metadata: Option<UploadMetadata>,
    #[serde(default)]
    pub cropped_image_url: Option<String>,
    /// 服务端处理耗时（毫秒）。
    #[serde(default)]
    pub processing_time: Option<u64>,
}

/// 错误响应：`{"error": "..."}`。
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// 服务信息（GET）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub service: String,
    pub version: String,
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

impl ServiceInfo {
    pub fn is_active(&self) -> bool {
        self.status.eq_ignore_ascii_case("active")
    }
}
