//! # 数据源与中间模型
//!
//! ## 设计思路
//!
//! 将“外部输入类型”和“流水线中间结果”解耦：
//! - `ImageSource` 表示外部来源语义
//! - `RawImageData` 表示已加载但未解码的字节
//! - `SourceImage` 表示已解码、可反复裁剪的全分辨率像素

use std::path::PathBuf;

use image::{DynamicImage, GenericImageView};

use crate::geometry::Size;

/// 图片输入来源。
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// 本地文件路径来源。
    FilePath(PathBuf),
    /// Base64（支持 Data URL 与纯 Base64 字符串）。
    Base64(String),
    /// 内存中的原始字节（拖拽、上传等场景）。
    Bytes(Vec<u8>),
}

/// 加载阶段输出：原始字节与来源标识。
pub(crate) struct RawImageData {
    /// 原始图片字节。
    pub(crate) bytes: Vec<u8>,
    /// 来源提示（用于日志与诊断）。
    pub(crate) source_hint: &'static str,
}

/// 解码后的源图片。
///
/// 导出流程只以只读方式借用其中的像素，从不修改源图。
#[derive(Debug, Clone)]
pub struct SourceImage {
    image: DynamicImage,
    source_hint: &'static str,
}

impl SourceImage {
    /// 直接包装已解码的图片（例如调用方已持有像素）。
    pub fn from_image(image: DynamicImage) -> Self {
        Self {
            image,
            source_hint: "memory",
        }
    }

    pub(crate) fn decoded(image: DynamicImage, source_hint: &'static str) -> Self {
        Self { image, source_hint }
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    /// 原图像素尺寸 `(width, height)`。
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// 原图尺寸，作为几何信息中的 `natural`。
    pub fn natural_size(&self) -> Size {
        let (width, height) = self.dimensions();
        Size::from_pixels(width, height)
    }

    pub fn source_hint(&self) -> &'static str {
        self.source_hint
    }
}
