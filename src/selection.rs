//! 选区状态模块（Crop Selector）
//!
//! # 设计思路
//!
//! 拖拽中的选区与“松手后确认”的选区用两个字段显式区分：
//! - `current`：拖拽/缩放过程中的最新矩形，高频更新
//! - `committed`：用户结束一次调整手势后确认的矩形 + 当时的几何快照
//!
//! 导出只读取 `committed`，从不读取 `current`，
//! 因此导出结果与 UI 事件时序无关，可在脱离事件循环的情况下测试。
//!
//! # 实现思路
//!
//! - 载入新图片时（`set_initial_selection`）重置状态，并给出 50%×50% 的居中默认选区。
//! - `update_selection` / `commit_selection` 都只做边界收敛，不做额外校验：
//!   拖拽过程中出现临时非法矩形是常态，不应该以错误形式打断交互。
//! - 确认时对几何信息做快照，之后窗口缩放只影响后续确认，不影响已确认的选区。

use crate::geometry::{
    self, DisplayRect, GeometryError, ImageGeometry, NativeRect, Size,
};

/// 已确认的选区：矩形 + 确认时的几何快照。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommittedSelection {
    /// 确认时（已收敛）的显示坐标矩形。
    pub rect: DisplayRect,
    /// 确认时的几何快照。
    pub geometry: ImageGeometry,
}

impl CommittedSelection {
    /// 按快照几何换算原生矩形。
    pub fn native_rect(&self) -> Result<NativeRect, GeometryError> {
        geometry::display_to_native(&self.rect, &self.geometry)
    }
}

/// 单张图片上的交互选区。
#[derive(Debug, Clone, Default)]
pub struct CropSelector {
    geometry: Option<ImageGeometry>,
    current: Option<DisplayRect>,
    committed: Option<CommittedSelection>,
}

impl CropSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// 新图片载入：记录几何信息并放置默认选区。
    ///
    /// 上一张图片的已确认选区同时失效。
    ///
    /// # 示例
    /// ```
    /// use image_cropper::geometry::{DisplayRect, ImageGeometry, Size};
    /// use image_cropper::selection::CropSelector;
    ///
    /// let mut selector = CropSelector::new();
    /// let seeded = selector.set_initial_selection(ImageGeometry::new(
    ///     Size::new(1200.0, 900.0),
    ///     Size::new(600.0, 450.0),
    /// ));
    /// assert_eq!(seeded, DisplayRect::percent(25.0, 25.0, 50.0, 50.0));
    /// assert!(selector.committed().is_none());
    /// ```
    pub fn set_initial_selection(&mut self, geometry: ImageGeometry) -> DisplayRect {
        let initial = DisplayRect::initial();

        self.geometry = Some(geometry);
        self.current = Some(initial);
        self.committed = None;

        log::debug!(
            "🖼️ 新图片选区已初始化 - 原始尺寸: {}x{} 显示尺寸: {}x{}",
            geometry.natural.width,
            geometry.natural.height,
            geometry.displayed.width,
            geometry.displayed.height
        );

        initial
    }

    /// 拖拽过程中更新选区，返回收敛后的矩形。
    pub fn update_selection(&mut self, rect: DisplayRect) -> DisplayRect {
        let clamped = geometry::clamp_display(&rect, self.displayed_size());
        self.current = Some(clamped);
        clamped
    }

    /// 结束一次调整手势：确认选区并对几何信息做快照。
    ///
    /// 尚未载入图片时无法快照几何，返回 `None` 且不改变状态。
    pub fn commit_selection(&mut self, rect: DisplayRect) -> Option<CommittedSelection> {
        let Some(geometry) = self.geometry else {
            log::warn!("⚠️ 尚未载入图片，忽略选区确认");
            return None;
        };

        let clamped = geometry::clamp_display(&rect, geometry.displayed);
        let committed = CommittedSelection {
            rect: clamped,
            geometry,
        };

        self.current = Some(clamped);
        self.committed = Some(committed);

        log::debug!(
            "✅ 选区已确认 - {:?} ({:.2}, {:.2}, {:.2}, {:.2})",
            clamped.unit,
            clamped.x,
            clamped.y,
            clamped.width,
            clamped.height
        );

        Some(committed)
    }

    /// 渲染尺寸变化（窗口缩放、响应式布局）。
    ///
    /// 只影响后续的 `update_selection` / `commit_selection`，
    /// 已确认选区保留其快照。
    pub fn set_displayed_size(&mut self, displayed: Size) {
        if let Some(geometry) = self.geometry.as_mut() {
            *geometry = geometry.with_displayed(displayed);
        }
    }

    /// 清空全部状态（例如移除当前图片）。
    pub fn reset(&mut self) {
        self.geometry = None;
        self.current = None;
        self.committed = None;
    }

    pub fn geometry(&self) -> Option<ImageGeometry> {
        self.geometry
    }

    pub fn current(&self) -> Option<DisplayRect> {
        self.current
    }

    pub fn committed(&self) -> Option<CommittedSelection> {
        self.committed
    }

    pub fn has_committed(&self) -> bool {
        self.committed.is_some()
    }

    fn displayed_size(&self) -> Size {
        self.geometry
            .map(|geometry| geometry.displayed)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded_selector() -> CropSelector {
        let mut selector = CropSelector::new();
        selector.set_initial_selection(ImageGeometry::new(
            Size::new(1200.0, 900.0),
            Size::new(600.0, 450.0),
        ));
        selector
    }

    #[test]
    fn initial_selection_is_centered_half() {
        let selector = loaded_selector();

        assert_eq!(selector.current(), Some(DisplayRect::percent(25.0, 25.0, 50.0, 50.0)));
        assert!(!selector.has_committed());
    }

    #[test]
    fn update_does_not_commit() {
        let mut selector = loaded_selector();

        selector.update_selection(DisplayRect::pixel(10.0, 10.0, 100.0, 100.0));

        assert_eq!(selector.current(), Some(DisplayRect::pixel(10.0, 10.0, 100.0, 100.0)));
        assert!(selector.committed().is_none());
    }

    #[test]
    fn update_clamps_to_displayed_bounds() {
        let mut selector = loaded_selector();

        let clamped = selector.update_selection(DisplayRect::pixel(500.0, -20.0, 300.0, 100.0));

        assert_eq!(clamped, DisplayRect::pixel(500.0, 0.0, 100.0, 80.0));
    }

    #[test]
    fn commit_snapshots_geometry() {
        let mut selector = loaded_selector();
        selector
            .commit_selection(DisplayRect::pixel(100.0, 50.0, 200.0, 150.0))
            .expect("image is loaded");

        // 窗口缩放不影响已确认选区
        selector.set_displayed_size(Size::new(300.0, 225.0));

        let committed = selector.committed().expect("selection committed");
        assert_eq!(committed.geometry.displayed, Size::new(600.0, 450.0));
        assert_eq!(
            committed.native_rect().expect("geometry is ready"),
            NativeRect::new(200.0, 100.0, 400.0, 300.0)
        );
        assert_eq!(
            selector.geometry().map(|g| g.displayed),
            Some(Size::new(300.0, 225.0))
        );
    }

    #[test]
    fn later_drag_keeps_last_committed_value() {
        let mut selector = loaded_selector();
        selector.commit_selection(DisplayRect::percent(0.0, 0.0, 50.0, 50.0));

        selector.update_selection(DisplayRect::percent(10.0, 10.0, 10.0, 10.0));

        let committed = selector.committed().expect("selection committed");
        assert_eq!(committed.rect, DisplayRect::percent(0.0, 0.0, 50.0, 50.0));
    }

    #[test]
    fn commit_without_image_is_ignored() {
        let mut selector = CropSelector::new();

        let result = selector.commit_selection(DisplayRect::initial());

        assert!(result.is_none());
        assert!(!selector.has_committed());
    }

    #[test]
    fn loading_new_image_drops_committed_selection() {
        let mut selector = loaded_selector();
        selector.commit_selection(DisplayRect::initial());

        selector.set_initial_selection(ImageGeometry::new(
            Size::new(640.0, 480.0),
            Size::new(320.0, 240.0),
        ));

        assert!(selector.committed().is_none());
        assert_eq!(selector.current(), Some(DisplayRect::initial()));
    }

    #[test]
    fn reset_clears_everything() {
        let mut selector = loaded_selector();
        selector.commit_selection(DisplayRect::initial());

        selector.reset();

        assert!(selector.geometry().is_none());
        assert!(selector.current().is_none());
        assert!(selector.committed().is_none());
    }
}
