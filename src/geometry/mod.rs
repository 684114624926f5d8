//! 坐标映射模块（显示坐标 → 原生像素坐标）
//!
//! 该模块负责以下核心能力：
//! - 描述用户在预览图上框选的矩形（百分比或显示像素两种单位）
//! - 描述一张图片的几何信息（原始尺寸 + 当前渲染尺寸）
//! - 将显示坐标系下的矩形换算为原图像素坐标系下的矩形
//! - 保证换算结果不会超出原图边界
//!
//! # 设计思路
//!
//! 1. **纯函数化**：所有计算只依赖入参，不读取任何全局状态，便于单元测试与属性测试。
//! 2. **先换算再收敛**：先按比例算出理想矩形，再统一做边界收敛，逻辑清晰且可证明不会越界。
//! 3. **失败早暴露**：渲染尺寸为 0（布局尚未完成）时直接返回 `GeometryError::NotReady`，
//!    绝不做除零运算，由调用方在布局完成后重试。
//!
//! # 坐标系统说明
//!
//! - **显示坐标**：图片在界面上实际渲染后的坐标系，左上角为原点，Y 轴向下增大。
//! - **原生坐标**：原图像素坐标系，同样左上角为原点。
//! - X/Y 两个轴的缩放比例独立计算：`scale_x = natural.width / displayed.width`，
//!   `scale_y = natural.height / displayed.height`。

pub mod calculation;
pub mod types;

pub use calculation::{
    clamp_display, clamp_native, display_to_native, scale_factors, to_pixel_rect,
};
pub use types::{DisplayRect, ImageGeometry, NativeRect, PixelBounds, RectUnit, Size};

/// 几何换算错误。
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    /// 渲染尺寸或原始尺寸尚不可用（例如图片尚未完成布局）。
    #[error("图片几何信息未就绪：显示尺寸 {displayed_width}x{displayed_height}，原始尺寸 {natural_width}x{natural_height}")]
    NotReady {
        displayed_width: f64,
        displayed_height: f64,
        natural_width: f64,
        natural_height: f64,
    },
}
