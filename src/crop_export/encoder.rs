//! # JPEG 编码模块
//!
//! JPEG 不带透明通道：编码前丢弃 alpha，只保留 RGB 分量。

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbaImage};

use super::{CropError, CropExporter};

impl CropExporter {
    /// 将输出画布编码为 JPEG 字节流。
    pub(super) fn encode_jpeg(surface: RgbaImage, quality: u8) -> Result<Vec<u8>, CropError> {
        let (width, height) = surface.dimensions();
        if width == 0 || height == 0 {
            return Err(CropError::Encode("输出画布尺寸为 0".to_string()));
        }

        let rgb = DynamicImage::ImageRgba8(surface).into_rgb8();

        let mut buffer = Vec::with_capacity((width as usize * height as usize) / 4);
        JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100))
            .encode_image(&rgb)
            .map_err(|e| CropError::Encode(format!("JPEG 编码失败：{}", e)))?;

        if buffer.is_empty() {
            return Err(CropError::Encode("JPEG 编码结果为空".to_string()));
        }

        Ok(buffer)
    }
}
