//! # 解码与区域渲染流水线模块
//!
//! ## 设计思路
//!
//! 将“字节 → 图像”与“原生矩形 → 输出画布”的过程集中管理，并在关键节点增加资源上限控制。
//! 优先做尺寸检查，再进行完整解码，降低恶意输入触发高内存开销的风险。
//!
//! ## 实现思路
//!
//! 解码：
//! 1. 猜测格式并读取 header 尺寸
//! 2. 按像素/内存上限快速拒绝
//! 3. 完整解码
//!
//! 渲染：
//! 1. 先按外接整数矩形截出子图，避免整张原图做 RGBA 拷贝
//! 2. 矩形整数对齐时直接 1:1 拷贝
//! 3. 否则用 `fast_image_resize` 最近邻 + 小数裁剪框采样，失败时回退到逐像素最近邻采样

use fast_image_resize as fr;
use image::{DynamicImage, GenericImageView, ImageBuffer, Rgba, RgbaImage};
use std::io::Cursor;

use super::source::{RawImageData, SourceImage};
use super::{CropError, CropExporter, ExportConfig};
use crate::geometry::NativeRect;

impl CropExporter {
    /// 将原始字节解码为可裁剪的源图片。
    pub(super) fn decode_source(
        &self,
        raw: RawImageData,
        config: &ExportConfig,
    ) -> Result<SourceImage, CropError> {
        let (header_width, header_height) = Self::inspect_dimensions_from_memory(&raw.bytes)?;
        Self::validate_pixel_limits(config, header_width, header_height)?;
        Self::validate_decoded_memory_limits(config, header_width, header_height)?;

        let decoded = image::load_from_memory(&raw.bytes)
            .map_err(|e| CropError::Decode(format!("图片解码失败：{}", e)))?;

        let (width, height) = decoded.dimensions();
        if width == 0 || height == 0 {
            return Err(CropError::SourceUnavailable("解码结果尺寸为 0".to_string()));
        }
        Self::validate_pixel_limits(config, width, height)?;
        Self::validate_decoded_memory_limits(config, width, height)?;

        log::info!(
            "✅ 图片解码成功 - 来源: {} 原始尺寸: {}x{}",
            raw.source_hint,
            width,
            height
        );

        Ok(SourceImage::decoded(decoded, raw.source_hint))
    }

    /// 仅通过内存中的图片头信息读取宽高。
    ///
    /// 用于在完整解码前做像素限制检查。
    fn inspect_dimensions_from_memory(bytes: &[u8]) -> Result<(u32, u32), CropError> {
        let reader = image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| CropError::InvalidFormat(format!("无法识别图片格式：{}", e)))?;

        reader
            .into_dimensions()
            .map_err(|e| CropError::InvalidFormat(format!("无法读取图片尺寸：{}", e)))
    }

    /// 校验像素数量是否超过配置上限。
    fn validate_pixel_limits(
        config: &ExportConfig,
        width: u32,
        height: u32,
    ) -> Result<(), CropError> {
        let pixels = u64::from(width)
            .checked_mul(u64::from(height))
            .ok_or_else(|| CropError::ResourceLimit("图片像素数溢出".to_string()))?;

        if pixels > config.max_decoded_pixels {
            return Err(CropError::ResourceLimit(format!(
                "图片像素过大：{} 像素（限制：{} 像素）",
                pixels, config.max_decoded_pixels
            )));
        }

        Ok(())
    }

    fn validate_decoded_memory_limits(
        config: &ExportConfig,
        width: u32,
        height: u32,
    ) -> Result<(), CropError> {
        let estimated = u64::from(width)
            .checked_mul(u64::from(height))
            .and_then(|pixels| pixels.checked_mul(4))
            .ok_or_else(|| CropError::ResourceLimit("图片解码内存估算溢出".to_string()))?;

        if estimated > config.max_decoded_bytes {
            return Err(CropError::ResourceLimit(format!(
                "图片解码预计内存过大：{:.2} MB（限制：{:.2} MB）",
                estimated as f64 / 1024.0 / 1024.0,
                config.max_decoded_bytes as f64 / 1024.0 / 1024.0
            )));
        }

        Ok(())
    }

    /// 将源图中 `rect` 覆盖的像素渲染到一块新画布。
    ///
    /// 画布尺寸为 `round(rect.width) × round(rect.height)`，
    /// 每个目标像素取其中心点映射到的源像素（最近邻）。
    /// 调用方保证 `rect` 已收敛到源图边界内且取整后面积非 0。
    pub(super) fn render_region(
        source: &DynamicImage,
        rect: &NativeRect,
    ) -> Result<RgbaImage, CropError> {
        let bounds = rect.to_pixel_bounds();
        if bounds.is_empty() {
            return Err(CropError::Render(format!(
                "输出画布尺寸为 0：{}x{}",
                bounds.width, bounds.height
            )));
        }

        let (source_width, source_height) = source.dimensions();

        // 外接整数矩形
        let left = bounds.x.min(source_width.saturating_sub(1));
        let top = bounds.y.min(source_height.saturating_sub(1));
        let right = (rect.right().ceil() as u32).clamp(left + 1, source_width);
        let bottom = (rect.bottom().ceil() as u32).clamp(top + 1, source_height);

        let region = source.crop_imm(left, top, right - left, bottom - top).to_rgba8();

        let local = NativeRect::new(
            rect.x - f64::from(left),
            rect.y - f64::from(top),
            rect.width,
            rect.height,
        );

        if Self::is_pixel_aligned(&local, bounds.width, bounds.height) {
            let (x, y) = (local.x as u32, local.y as u32);
            return Ok(image::imageops::crop_imm(&region, x, y, bounds.width, bounds.height).to_image());
        }

        match Self::render_with_fast_image_resize(&region, &local, bounds.width, bounds.height) {
            Ok(surface) => Ok(surface),
            Err(err) => {
                log::warn!("⚠️ fast_image_resize 采样失败，回退逐像素最近邻：{}", err);
                Ok(Self::render_with_nearest_sampler(
                    &region,
                    &local,
                    bounds.width,
                    bounds.height,
                ))
            }
        }
    }

    /// 起点为整数且尺寸与画布一致：可直接 1:1 拷贝。
    fn is_pixel_aligned(rect: &NativeRect, width: u32, height: u32) -> bool {
        rect.x.fract() == 0.0
            && rect.y.fract() == 0.0
            && rect.width == f64::from(width)
            && rect.height == f64::from(height)
    }

    fn render_with_fast_image_resize(
        region: &RgbaImage,
        rect: &NativeRect,
        target_width: u32,
        target_height: u32,
    ) -> Result<RgbaImage, CropError> {
        let (src_width, src_height) = region.dimensions();

        let src_image = fr::images::Image::from_vec_u8(
            src_width,
            src_height,
            region.as_raw().clone(),
            fr::PixelType::U8x4,
        )
        .map_err(|e| CropError::Render(format!("构建源图像缓冲失败：{}", e)))?;

        let mut dst_image = fr::images::Image::new(target_width, target_height, fr::PixelType::U8x4);

        let mut resizer = fr::Resizer::new();
        let options = fr::ResizeOptions::new()
            .resize_alg(fr::ResizeAlg::Nearest)
            .crop(rect.x, rect.y, rect.width, rect.height);

        resizer
            .resize(&src_image, &mut dst_image, Some(&options))
            .map_err(|e| CropError::Render(format!("fast_image_resize 执行失败：{}", e)))?;

        ImageBuffer::<Rgba<u8>, Vec<u8>>::from_raw(target_width, target_height, dst_image.into_vec())
            .ok_or_else(|| CropError::Render("fast_image_resize 输出缓冲长度异常".to_string()))
    }

    /// 逐像素最近邻：目标像素中心映射回源坐标后向下取整，并收敛到子图范围内。
    fn render_with_nearest_sampler(
        region: &RgbaImage,
        rect: &NativeRect,
        target_width: u32,
        target_height: u32,
    ) -> RgbaImage {
        let (src_width, src_height) = region.dimensions();
        let step_x = rect.width / f64::from(target_width);
        let step_y = rect.height / f64::from(target_height);

        ImageBuffer::from_fn(target_width, target_height, |dx, dy| {
            let sx = (rect.x + (f64::from(dx) + 0.5) * step_x).floor();
            let sy = (rect.y + (f64::from(dy) + 0.5) * step_y).floor();
            let sx = (sx.max(0.0) as u32).min(src_width - 1);
            let sy = (sy.max(0.0) as u32).min(src_height - 1);
            *region.get_pixel(sx, sy)
        })
    }
}
