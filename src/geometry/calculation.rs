//! 坐标换算模块
//!
//! 该模块实现“显示坐标 → 原生坐标”的核心几何算法：
//!
//! 1. **单位归一** (`to_pixel_rect`)：百分比选区按渲染尺寸换算为显示像素。
//! 2. **比例计算** (`scale_factors`)：X/Y 轴独立计算原始尺寸与渲染尺寸之比。
//! 3. **坐标换算** (`display_to_native`)：显示像素乘以比例得到原生矩形。
//! 4. **边界收敛** (`clamp_display` / `clamp_native`)：保证矩形不越过边界。
//!
//! # 设计思路
//!
//! - 算法纯函数化：输入为选区与几何信息，输出唯一矩形，便于测试。
//! - 先算理想矩形，再做边界收敛，逻辑清晰且可证明不会越界。
//! - 对异常输入（NaN、负数、越界）给出安全收敛，避免上层崩溃；
//!   只有“几何未就绪”会作为错误返回，因为此时继续计算必然除零。

use super::types::{DisplayRect, ImageGeometry, NativeRect, RectUnit, Size};
use super::GeometryError;

/// 百分比单位的上界。
const PERCENT_BOUND: f64 = 100.0;

/// 计算 X/Y 两轴的缩放比例。
///
/// # 返回
/// - `Ok((scale_x, scale_y))`
/// - `Err(GeometryError::NotReady)`：任一尺寸为 0 / 非有限数
///
/// # 示例
/// ```
/// use image_cropper::geometry::{scale_factors, ImageGeometry, Size};
///
/// let geometry = ImageGeometry::new(Size::new(2000.0, 1000.0), Size::new(1000.0, 500.0));
/// assert_eq!(scale_factors(&geometry), Ok((2.0, 2.0)));
/// ```
pub fn scale_factors(geometry: &ImageGeometry) -> Result<(f64, f64), GeometryError> {
    if !geometry.is_ready() {
        return Err(GeometryError::NotReady {
            displayed_width: geometry.displayed.width,
            displayed_height: geometry.displayed.height,
            natural_width: geometry.natural.width,
            natural_height: geometry.natural.height,
        });
    }

    Ok((
        geometry.natural.width / geometry.displayed.width,
        geometry.natural.height / geometry.displayed.height,
    ))
}

/// 将选区统一换算为显示像素单位。
///
/// 像素单位的选区原样返回；百分比选区按 `value * displayed / 100` 换算。
pub fn to_pixel_rect(rect: &DisplayRect, displayed: Size) -> DisplayRect {
    match rect.unit {
        RectUnit::Pixel => *rect,
        RectUnit::Percent => DisplayRect::pixel(
            rect.x * displayed.width / PERCENT_BOUND,
            rect.y * displayed.height / PERCENT_BOUND,
            rect.width * displayed.width / PERCENT_BOUND,
            rect.height * displayed.height / PERCENT_BOUND,
        ),
    }
}

/// 将选区收敛到显示边界内。
///
/// - 百分比单位：收敛到 `[0, 100]`
/// - 像素单位：收敛到渲染尺寸；渲染尺寸未就绪时只做非负收敛
///
/// 拖拽越过左/上边界时保留右/下边缘，只裁掉越界部分。
pub fn clamp_display(rect: &DisplayRect, displayed: Size) -> DisplayRect {
    let (bound_x, bound_y) = match rect.unit {
        RectUnit::Percent => (PERCENT_BOUND, PERCENT_BOUND),
        RectUnit::Pixel if displayed.is_positive() => (displayed.width, displayed.height),
        RectUnit::Pixel => (f64::INFINITY, f64::INFINITY),
    };

    let (x, width) = clamp_axis(rect.x, rect.width, bound_x);
    let (y, height) = clamp_axis(rect.y, rect.height, bound_y);

    DisplayRect {
        unit: rect.unit,
        x,
        y,
        width,
        height,
    }
}

/// 将显示坐标系下的选区换算为原生像素矩形。
///
/// # 实现步骤
/// 1. 选区收敛到显示边界
/// 2. 百分比换算为显示像素
/// 3. 乘以 X/Y 独立缩放比例
/// 4. 收敛到原始尺寸（吸收浮点误差）
///
/// # 后置条件
/// - 成功时结果完整落在 `[0, natural.width] × [0, natural.height]` 内
///
/// # 示例
/// ```
/// use image_cropper::geometry::{display_to_native, DisplayRect, ImageGeometry, NativeRect, Size};
///
/// let geometry = ImageGeometry::new(Size::new(2000.0, 1000.0), Size::new(1000.0, 500.0));
/// let native = display_to_native(&DisplayRect::percent(25.0, 25.0, 50.0, 50.0), &geometry)?;
/// assert_eq!(native, NativeRect::new(500.0, 250.0, 1000.0, 500.0));
/// # Ok::<(), image_cropper::geometry::GeometryError>(())
/// ```
pub fn display_to_native(
    rect: &DisplayRect,
    geometry: &ImageGeometry,
) -> Result<NativeRect, GeometryError> {
    let (scale_x, scale_y) = scale_factors(geometry)?;

    let clamped = clamp_display(rect, geometry.displayed);
    let pixel = to_pixel_rect(&clamped, geometry.displayed);

    let native = NativeRect::new(
        pixel.x * scale_x,
        pixel.y * scale_y,
        pixel.width * scale_x,
        pixel.height * scale_y,
    );

    Ok(clamp_native(&native, geometry.natural))
}

/// 将原生矩形收敛到给定边界内。
///
/// 用于两类场景：
/// - 几何快照过期（用户在拖拽中途缩放窗口），换算结果超出真实原图
/// - 远端分析服务返回的矩形不可信
///
/// 该函数从不失败：完全落在边界外的矩形收敛为面积 0。
pub fn clamp_native(rect: &NativeRect, bounds: Size) -> NativeRect {
    let (x, width) = clamp_axis(rect.x, rect.width, bounds.width);
    let (y, height) = clamp_axis(rect.y, rect.height, bounds.height);

    if (x, y, width, height) != (rect.x, rect.y, rect.width, rect.height) {
        log::debug!(
            "📐 矩形已收敛到边界 {}x{}：({:.2}, {:.2}, {:.2}, {:.2}) -> ({:.2}, {:.2}, {:.2}, {:.2})",
            bounds.width,
            bounds.height,
            rect.x,
            rect.y,
            rect.width,
            rect.height,
            x,
            y,
            width,
            height
        );
    }

    NativeRect::new(x, y, width, height)
}

/// 单轴收敛：返回 `(起点, 长度)`，保证 `0 <= 起点 <= 起点 + 长度 <= bound`。
fn clamp_axis(origin: f64, extent: f64, bound: f64) -> (f64, f64) {
    let bound = if bound.is_nan() { 0.0 } else { bound.max(0.0) };
    let origin = if origin.is_finite() { origin } else { 0.0 };
    let extent = if extent.is_finite() { extent.max(0.0) } else { 0.0 };

    // 已在边界内：原样返回，避免 (x + w) - x 引入浮点误差
    if origin >= 0.0 && origin + extent <= bound {
        return (origin, extent);
    }

    let start = origin.max(0.0).min(bound);
    let end = (origin + extent).max(start).min(bound);

    (start, end - start)
}
