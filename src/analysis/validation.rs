//! # 提交前校验
//!
//! 与服务端边界约束保持一致：内容类型必须以 `image/` 开头、不能为空、体积不超过上限。
//! 本地先拦一次，避免把注定被拒的大文件传上去。

use super::{AnalysisError, ImagePayload};

/// 单张图片的上传体积上限（10 MiB）。
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// 判断 `Content-Type` 是否为图片类型（忽略参数与大小写）。
///
/// # 示例
/// ```
/// use image_cropper::analysis::is_image_content_type;
///
/// assert!(is_image_content_type("image/png; charset=utf-8"));
/// assert!(!is_image_content_type("text/html"));
/// ```
pub fn is_image_content_type(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .map(|base| base.trim().to_ascii_lowercase().starts_with("image/"))
        .unwrap_or(false)
}

/// 校验待提交的图片。
pub fn validate_submission(payload: &ImagePayload, max_bytes: u64) -> Result<(), AnalysisError> {
    if payload.bytes.is_empty() {
        return Err(AnalysisError::InvalidPayload("No image file provided".to_string()));
    }

    if !is_image_content_type(&payload.content_type) {
        return Err(AnalysisError::InvalidPayload(format!(
            "Invalid file type: {}",
            payload.content_type
        )));
    }

    let len = payload.bytes.len() as u64;
    if len > max_bytes {
        return Err(AnalysisError::InvalidPayload(format!(
            "File too large: {:.2} MB (limit: {:.2} MB)",
            len as f64 / 1024.0 / 1024.0,
            max_bytes as f64 / 1024.0 / 1024.0
        )));
    }

    Ok(())
}
