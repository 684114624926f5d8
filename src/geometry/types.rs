//! 几何值对象
//!
//! 只承载数据与少量派生计算，不包含换算策略（策略集中在 `calculation`）。

use serde::{Deserialize, Serialize};

/// 选区单位。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RectUnit {
    /// 相对渲染区域的百分比，取值范围 `[0, 100]`。
    #[default]
    Percent,
    /// 渲染区域内的绝对像素。
    Pixel,
}

/// 宽高对。
///
/// 渲染尺寸可能是小数（CSS 缩放），因此统一使用 `f64`。
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// 由整数像素尺寸构造。
    pub fn from_pixels(width: u32, height: u32) -> Self {
        Self::new(f64::from(width), f64::from(height))
    }

    /// 两个维度均为有限正数。
    pub fn is_positive(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// 显示坐标系下的选区矩形。
///
/// # 不变量
/// - 各分量非负
/// - `unit = Percent` 时：`x + width <= 100` 且 `y + height <= 100`
/// - `unit = Pixel` 时：以渲染尺寸为上界
///
/// 不变量由 `calculation::clamp_display` 负责收敛，本类型本身不做校验，
/// 因为拖拽过程中出现临时越界是常态。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayRect {
    pub unit: RectUnit,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl DisplayRect {
    /// 构造百分比单位的选区。
    pub const fn percent(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            unit: RectUnit::Percent,
            x,
            y,
            width,
            height,
        }
    }

    /// 构造显示像素单位的选区。
    pub const fn pixel(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            unit: RectUnit::Pixel,
            x,
            y,
            width,
            height,
        }
    }

    /// 新载入图片时的默认选区：居中，偏移 25%/25%，大小 50%×50%。
    pub const fn initial() -> Self {
        Self::percent(25.0, 25.0, 50.0, 50.0)
    }

    /// 面积为 0 的选区（单击未拖动时常见）。
    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

/// 单张图片的几何信息：原始尺寸 + 渲染尺寸。
///
/// 允许构造出尚未就绪的几何（渲染尺寸为 0），
/// 是否可用于换算由 `is_ready` 判定。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageGeometry {
    /// 原图像素尺寸。
    pub natural: Size,
    /// 界面渲染尺寸。
    pub displayed: Size,
}

impl ImageGeometry {
    pub const fn new(natural: Size, displayed: Size) -> Self {
        Self { natural, displayed }
    }

    /// 原始尺寸与渲染尺寸均为正数时才可参与换算。
    pub fn is_ready(&self) -> bool {
        self.natural.is_positive() && self.displayed.is_positive()
    }

    /// 替换渲染尺寸（窗口缩放、响应式布局）。
    pub fn with_displayed(self, displayed: Size) -> Self {
        Self { displayed, ..self }
    }
}

/// 原图像素坐标系下的矩形（保留小数精度，供采样器使用）。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NativeRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl NativeRect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// 是否完整落在 `[0, bounds.width] × [0, bounds.height]` 内。
    pub fn is_within(&self, bounds: Size) -> bool {
        self.x >= 0.0
            && self.y >= 0.0
            && self.width >= 0.0
            && self.height >= 0.0
            && self.right() <= bounds.width
            && self.bottom() <= bounds.height
    }

    /// 收敛到整数像素。
    ///
    /// 原点向下取整，宽高四舍五入：输出画布尺寸恒为
    /// `round(width) × round(height)`。
    pub fn to_pixel_bounds(&self) -> PixelBounds {
        PixelBounds {
            x: to_u32(self.x.floor()),
            y: to_u32(self.y.floor()),
            width: to_u32(self.width.round()),
            height: to_u32(self.height.round()),
        }
    }
}

/// 整数像素矩形，描述输出画布尺寸与采样起点。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelBounds {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelBounds {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn as_tuple(&self) -> (u32, u32, u32, u32) {
        (self.x, self.y, self.width, self.height)
    }
}

fn to_u32(value: f64) -> u32 {
    if value.is_finite() && value > 0.0 {
        value.min(f64::from(u32::MAX)) as u32
    } else {
        0
    }
}
