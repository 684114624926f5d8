//! # 加载与校验模块
//!
//! ## 设计思路
//!
//! 统一处理不同来源（本地文件 / Base64 / 内存字节）的原始字节加载，
//! 并在“尽可能早”的阶段执行输入校验。目标是尽快失败，减少不必要内存与 CPU 消耗。
//!
//! ## 实现思路
//!
//! - 文件：存在性 + metadata 体积限制 + 读取。
//! - Base64：格式解析 + 解码前体积估算 + 解码后体积限制。
//! - 内存字节：体积限制。
//! - 所有来源最后都做一次文件签名校验（`infer`），拒绝伪装成图片的内容。

use base64::{Engine as _, engine::general_purpose};
use std::path::Path;

use super::source::RawImageData;
use super::{CropError, CropExporter, ExportConfig, ImageSource};

impl CropExporter {
    /// 按来源加载原始字节。
    pub(super) fn load_raw(
        &self,
        source: ImageSource,
        config: &ExportConfig,
    ) -> Result<RawImageData, CropError> {
        match source {
            ImageSource::FilePath(path) => self.load_from_file(&path, config),
            ImageSource::Base64(data) => self.load_from_base64(&data, config),
            ImageSource::Bytes(bytes) => self.load_from_bytes(bytes, config),
        }
    }

    /// 从本地路径加载图片原始字节。
    pub(super) fn load_from_file(
        &self,
        path: &Path,
        config: &ExportConfig,
    ) -> Result<RawImageData, CropError> {
        log::info!("📁 开始读取本地图片 - 路径: {}", path.display());

        if !path.exists() {
            return Err(CropError::FileSystem(format!("文件不存在：{}", path.display())));
        }

        let metadata = std::fs::metadata(path)
            .map_err(|e| CropError::FileSystem(format!("无法读取文件信息：{}", e)))?;

        Self::validate_file_size(metadata.len(), config, "文件过大")?;

        let bytes = std::fs::read(path)
            .map_err(|e| CropError::FileSystem(format!("无法读取图片文件：{}", e)))?;
        Self::validate_image_signature(&bytes)?;

        Ok(RawImageData {
            bytes,
            source_hint: "file",
        })
    }

    /// 从 Base64 字符串加载图片原始字节。
    pub(super) fn load_from_base64(
        &self,
        data: &str,
        config: &ExportConfig,
    ) -> Result<RawImageData, CropError> {
        log::info!("📝 开始处理 base64 图片");

        let bytes = Self::parse_base64_with_limit(data, config.max_file_size)?;
        Self::validate_file_size(bytes.len() as u64, config, "Base64 解码后体积过大")?;
        Self::validate_image_signature(&bytes)?;

        Ok(RawImageData {
            bytes,
            source_hint: "base64",
        })
    }

    /// 从内存字节加载（拖拽、上传等场景）。
    pub(super) fn load_from_bytes(
        &self,
        bytes: Vec<u8>,
        config: &ExportConfig,
    ) -> Result<RawImageData, CropError> {
        log::debug!("📦 开始处理内存图片 - {} 字节", bytes.len());

        Self::validate_file_size(bytes.len() as u64, config, "图片体积过大")?;
        Self::validate_image_signature(&bytes)?;

        Ok(RawImageData {
            bytes,
            source_hint: "bytes",
        })
    }

    fn validate_file_size(len: u64, config: &ExportConfig, label: &str) -> Result<(), CropError> {
        if len > config.max_file_size {
            return Err(CropError::ResourceLimit(format!(
                "{}：{:.2} MB（限制：{:.2} MB）",
                label,
                len as f64 / 1024.0 / 1024.0,
                config.max_file_size as f64 / 1024.0 / 1024.0
            )));
        }

        Ok(())
    }

    fn estimate_base64_decoded_upper_bound_len(base64_data: &str) -> Result<u64, CropError> {
        let len = base64_data.trim().len() as u64;
        let groups = len
            .checked_add(3)
            .ok_or_else(|| CropError::ResourceLimit("Base64 输入长度溢出".to_string()))?
            / 4;

        groups
            .checked_mul(3)
            .ok_or_else(|| CropError::ResourceLimit("Base64 解码体积估算溢出".to_string()))
    }

    /// 解析 Data URL 或纯 Base64，解码前先按长度估算体积。
    pub(crate) fn parse_base64_with_limit(
        data: &str,
        max_file_size: u64,
    ) -> Result<Vec<u8>, CropError> {
        let normalized = data.trim();

        let payload = if normalized.starts_with("data:") {
            let base64_start = normalized
                .find(";base64,")
                .ok_or_else(|| CropError::InvalidFormat("缺少 base64 标记".to_string()))?;
            &normalized[base64_start + 8..]
        } else {
            normalized
        };

        let estimated_len = Self::estimate_base64_decoded_upper_bound_len(payload)?;
        if estimated_len > max_file_size {
            return Err(CropError::ResourceLimit(format!(
                "Base64 预计解码体积过大：{:.2} MB（限制：{:.2} MB）",
                estimated_len as f64 / 1024.0 / 1024.0,
                max_file_size as f64 / 1024.0 / 1024.0
            )));
        }

        general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| CropError::Decode(format!("Base64 解码失败：{}", e)))
    }

    /// 通过文件头魔数确认内容确实是图片。
    pub(crate) fn validate_image_signature(bytes: &[u8]) -> Result<(), CropError> {
        if bytes.is_empty() {
            return Err(CropError::InvalidFormat("图片内容为空".to_string()));
        }

        let kind = infer::get(bytes)
            .ok_or_else(|| CropError::InvalidFormat("无法识别图片类型".to_string()))?;

        if kind.matcher_type() != infer::MatcherType::Image {
            return Err(CropError::InvalidFormat(format!(
                "文件签名不是图片类型：{}",
                kind.mime_type()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_bytes() -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba([1, 2, 3, 255])));
        let mut cursor = Cursor::new(Vec::new());
        img.write_to(&mut cursor, ImageFormat::Png)
            .expect("failed to encode test image");
        cursor.into_inner()
    }

    fn exporter() -> CropExporter {
        CropExporter::new(ExportConfig::default()).expect("exporter init failed")
    }

    #[test]
    fn load_from_base64_rejects_non_image_payload() {
        let result = exporter().load_from_base64("SGVsbG8=", &ExportConfig::default());

        assert!(matches!(result, Err(CropError::InvalidFormat(_))));
    }

    #[test]
    fn load_from_base64_accepts_data_url() {
        let encoded = general_purpose::STANDARD.encode(png_bytes());
        let data_url = format!("data:image/png;base64,{}", encoded);

        let raw = exporter()
            .load_from_base64(&data_url, &ExportConfig::default())
            .expect("data url should load");

        assert_eq!(raw.source_hint, "base64");
        assert_eq!(raw.bytes, png_bytes());
    }

    #[test]
    fn parse_base64_with_limit_rejects_large_payload_before_decode() {
        let huge = "A".repeat(1024 * 1024);
        let result = CropExporter::parse_base64_with_limit(&huge, 32);

        assert!(matches!(result, Err(CropError::ResourceLimit(_))));
    }

    #[test]
    fn load_from_missing_file_fails() {
        let result = exporter().load_from_file(
            Path::new("/definitely/not/here/photo.png"),
            &ExportConfig::default(),
        );

        assert!(matches!(result, Err(CropError::FileSystem(_))));
    }

    #[test]
    fn load_from_bytes_enforces_size_limit() {
        let mut config = ExportConfig::default();
        config.max_file_size = 16;

        let result = exporter().load_from_bytes(png_bytes(), &config);

        assert!(matches!(result, Err(CropError::ResourceLimit(_))));
    }

    #[test]
    fn signature_check_rejects_html() {
        let result = CropExporter::validate_image_signature(b"<html><body>nope</body></html>");

        assert!(matches!(result, Err(CropError::InvalidFormat(_))));
    }

    #[test]
    fn signature_check_rejects_empty() {
        assert!(matches!(
            CropExporter::validate_image_signature(&[]),
            Err(CropError::InvalidFormat(_))
        ));
    }
}
