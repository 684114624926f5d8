//! # 核心编排模块
//!
//! ## 设计思路
//!
//! `CropExporter` 只负责流程编排与配置管理，不关心选区如何产生。
//! 导出链路固定为：
//! 1. 读取配置快照
//! 2. 显示坐标 → 原生矩形（含越界收敛）
//! 3. 渲染原生矩形到输出画布
//! 4. JPEG 编码
//! 5. 登记本地引用
//!
//! ## 实现思路
//!
//! - 配置通过 `Arc<RwLock<ExportConfig>>` 支持运行时动态切档。
//! - 单次导出内使用“同一配置快照”，避免处理中途配置漂移。
//! - 记录 `map/render/encode/total` 阶段耗时，便于性能诊断。
//! - 无选区、收敛后面积为 0 都走 `ExportOutcome::NothingToExport`，不产生产物、不触碰登记表。

use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use bytes::Bytes;
use chrono::Utc;

use super::artifact::{ArtifactRegistry, CropArtifact, JPEG_MIME_TYPE};
use super::{CropError, ExportConfig, ExportQualityProfile, ImageSource, SourceImage};
use crate::geometry::{self, NativeRect};
use crate::selection::CommittedSelection;

/// 裁剪导出器。
///
/// 不持有单次调用状态，可在多个任务间共享。
pub struct CropExporter {
    pub(super) config: Arc<RwLock<ExportConfig>>,
    registry: Arc<ArtifactRegistry>,
}

/// 未产生产物的原因。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyReason {
    /// 尚未确认任何选区。
    NoCommittedSelection,
    /// 选区收敛到原图范围后面积为 0。
    EmptyRegion,
}

/// 一次导出请求的结果。
#[derive(Debug)]
pub enum ExportOutcome {
    Exported(CropArtifact),
    NothingToExport(EmptyReason),
}

impl ExportOutcome {
    pub fn artifact(&self) -> Option<&CropArtifact> {
        match self {
            Self::Exported(artifact) => Some(artifact),
            Self::NothingToExport(_) => None,
        }
    }

    pub fn into_artifact(self) -> Option<CropArtifact> {
        match self {
            Self::Exported(artifact) => Some(artifact),
            Self::NothingToExport(_) => None,
        }
    }

    pub fn is_nothing(&self) -> bool {
        matches!(self, Self::NothingToExport(_))
    }
}

impl CropExporter {
    /// 根据初始配置创建导出器，产物登记到进程级默认登记表。
    ///
    /// # 示例
    /// ```
    /// use image_cropper::crop_export::{CropExporter, ExportConfig};
    ///
    /// let exporter = CropExporter::new(ExportConfig::default())?;
    /// # Ok::<(), image_cropper::crop_export::CropError>(())
    /// ```
    pub fn new(config: ExportConfig) -> Result<Self, CropError> {
        Self::with_registry(config, ArtifactRegistry::shared())
    }

    /// 使用指定登记表创建导出器（测试或多窗口隔离）。
    pub fn with_registry(
        config: ExportConfig,
        registry: Arc<ArtifactRegistry>,
    ) -> Result<Self, CropError> {
        config.validate()?;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            registry,
        })
    }

    /// 获取配置快照。
    ///
    /// 作用：保证单次导出链路使用一致参数。
    pub(super) fn config_snapshot(&self) -> Result<ExportConfig, CropError> {
        self.config
            .read()
            .map(|cfg| cfg.clone())
            .map_err(|_| CropError::LockPoisoned("配置读取锁".to_string()))
    }

    /// 导出产物所登记的本地引用表。
    pub fn registry(&self) -> Arc<ArtifactRegistry> {
        Arc::clone(&self.registry)
    }

    /// 设置画质档位。
    pub fn set_quality_profile(&self, profile: ExportQualityProfile) -> Result<(), CropError> {
        let mut config = self
            .config
            .write()
            .map_err(|_| CropError::LockPoisoned("配置写入锁".to_string()))?;
        config.apply_quality_profile(profile);

        log::info!(
            "⚙️ 已切换导出画质档位：{:?}（jpeg_quality={}）",
            profile,
            config.jpeg_quality
        );

        Ok(())
    }

    /// 获取当前生效档位。
    pub fn get_quality_profile(&self) -> Result<ExportQualityProfile, CropError> {
        let config = self
            .config
            .read()
            .map_err(|_| CropError::LockPoisoned("配置读取锁".to_string()))?;
        Ok(config.infer_quality_profile())
    }

    /// 整体替换配置，写入前做范围检查。
    pub fn set_config(&self, new_config: ExportConfig) -> Result<(), CropError> {
        new_config.validate()?;

        let mut config = self
            .config
            .write()
            .map_err(|_| CropError::LockPoisoned("配置写入锁".to_string()))?;
        *config = new_config;

        Ok(())
    }

    pub fn get_config(&self) -> Result<ExportConfig, CropError> {
        self.config_snapshot()
    }

    /// 从任意来源加载并解码源图片。
    pub fn load_source(&self, source: ImageSource) -> Result<SourceImage, CropError> {
        let config = self.config_snapshot()?;

        let load_start = Instant::now();
        let raw = self.load_raw(source, &config)?;
        let load_elapsed = load_start.elapsed();

        let decode_start = Instant::now();
        let decoded = self.decode_source(raw, &config)?;
        let decode_elapsed = decode_start.elapsed();

        log::info!(
            "✅ 源图片就绪 - load={}ms decode={}ms",
            load_elapsed.as_millis(),
            decode_elapsed.as_millis()
        );

        Ok(decoded)
    }

    /// 导出主入口：按已确认选区裁剪源图片。
    ///
    /// - `committed` 为 `None`：返回 `NothingToExport(NoCommittedSelection)`
    /// - 渲染尺寸为 0：`CropError::GeometryNotReady`
    /// - 源图尺寸为 0：`CropError::SourceUnavailable`
    /// - 几何快照过期导致越界：收敛到真实源图范围
    ///
    /// # 示例
    /// ```
    /// use image::{DynamicImage, RgbaImage};
    /// use image_cropper::crop_export::{CropExporter, ExportConfig, SourceImage};
    /// use image_cropper::geometry::{DisplayRect, ImageGeometry, Size};
    /// use image_cropper::selection::CropSelector;
    ///
    /// let source = SourceImage::from_image(DynamicImage::ImageRgba8(RgbaImage::new(1200, 900)));
    /// let mut selector = CropSelector::new();
    /// selector.set_initial_selection(ImageGeometry::new(source.natural_size(), Size::new(600.0, 450.0)));
    /// let committed = selector.commit_selection(DisplayRect::pixel(100.0, 50.0, 200.0, 150.0));
    ///
    /// let exporter = CropExporter::new(ExportConfig::default())?;
    /// let artifact = exporter
    ///     .export(committed.as_ref(), &source)?
    ///     .into_artifact()
    ///     .expect("selection is not empty");
    /// assert_eq!(artifact.dimensions(), (400, 300));
    /// artifact.release(&exporter.registry());
    /// # Ok::<(), image_cropper::crop_export::CropError>(())
    /// ```
    pub fn export(
        &self,
        committed: Option<&CommittedSelection>,
        source: &SourceImage,
    ) -> Result<ExportOutcome, CropError> {
        let Some(committed) = committed else {
            log::debug!("🫥 没有已确认的选区，跳过导出");
            return Ok(ExportOutcome::NothingToExport(EmptyReason::NoCommittedSelection));
        };

        let total_start = Instant::now();
        Self::ensure_source_available(source)?;

        if !committed.geometry.natural.is_positive() {
            return Err(CropError::SourceUnavailable(format!(
                "选区快照中的原始尺寸无效：{}x{}",
                committed.geometry.natural.width, committed.geometry.natural.height
            )));
        }

        let map_start = Instant::now();
        let native = committed.native_rect()?;
        let map_elapsed = map_start.elapsed();

        self.export_mapped(&native, source, map_elapsed, total_start)
    }

    /// 直接按原生矩形导出（用于分析服务给出的建议裁剪）。
    pub fn export_native(
        &self,
        rect: &NativeRect,
        source: &SourceImage,
    ) -> Result<ExportOutcome, CropError> {
        let total_start = Instant::now();
        Self::ensure_source_available(source)?;

        self.export_mapped(rect, source, Duration::ZERO, total_start)
    }

    fn ensure_source_available(source: &SourceImage) -> Result<(), CropError> {
        let (width, height) = source.dimensions();
        if width == 0 || height == 0 {
            return Err(CropError::SourceUnavailable(format!(
                "源图片尺寸为 {}x{}",
                width, height
            )));
        }
        Ok(())
    }

    fn export_mapped(
        &self,
        native: &NativeRect,
        source: &SourceImage,
        map_elapsed: Duration,
        total_start: Instant,
    ) -> Result<ExportOutcome, CropError> {
        let config = self.config_snapshot()?;

        let rect = geometry::clamp_native(native, source.natural_size());
        if rect != *native {
            log::warn!(
                "⚠️ 原生矩形超出源图 {}x{}，已收敛：({:.2}, {:.2}, {:.2}, {:.2})",
                source.dimensions().0,
                source.dimensions().1,
                rect.x,
                rect.y,
                rect.width,
                rect.height
            );
        }

        if rect.to_pixel_bounds().is_empty() {
            log::debug!("🫥 选区收敛后面积为 0，跳过导出");
            return Ok(ExportOutcome::NothingToExport(EmptyReason::EmptyRegion));
        }

        let render_start = Instant::now();
        let surface = Self::render_region(source.image(), &rect)?;
        let (width, height) = surface.dimensions();
        let render_elapsed = render_start.elapsed();

        let encode_start = Instant::now();
        let bytes = Bytes::from(Self::encode_jpeg(surface, config.jpeg_quality)?);
        let encode_elapsed = encode_start.elapsed();

        let reference = self.registry.register(bytes.clone(), JPEG_MIME_TYPE);

        log::info!(
            "✅ 裁剪导出完成 - {}x{} {}KB map={}ms render={}ms encode={}ms total={}ms",
            width,
            height,
            bytes.len() / 1024,
            map_elapsed.as_millis(),
            render_elapsed.as_millis(),
            encode_elapsed.as_millis(),
            total_start.elapsed().as_millis()
        );

        Ok(ExportOutcome::Exported(CropArtifact {
            bytes,
            width,
            height,
            native_rect: rect,
            reference,
            file_name: config.download_file_name,
            created_at: Utc::now(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{DisplayRect, ImageGeometry, Size};
    use image::{DynamicImage, ImageBuffer, ImageFormat, Rgba};
    use std::io::Cursor;

    fn gradient_source(width: u32, height: u32) -> SourceImage {
        SourceImage::from_image(DynamicImage::ImageRgba8(ImageBuffer::from_fn(
            width,
            height,
            |x, y| Rgba([(x % 256) as u8, (y % 256) as u8, ((x * y) % 256) as u8, 255]),
        )))
    }

    fn isolated_exporter() -> CropExporter {
        CropExporter::with_registry(ExportConfig::default(), Arc::new(ArtifactRegistry::new()))
            .expect("exporter init failed")
    }

    fn committed(natural: (f64, f64), displayed: (f64, f64), rect: DisplayRect) -> CommittedSelection {
        CommittedSelection {
            rect,
            geometry: ImageGeometry::new(
                Size::new(natural.0, natural.1),
                Size::new(displayed.0, displayed.1),
            ),
        }
    }

    #[test]
    fn no_committed_selection_is_nothing_to_export() {
        let exporter = isolated_exporter();
        let source = gradient_source(10, 10);

        let outcome = exporter.export(None, &source).expect("export should not fail");

        assert!(matches!(
            outcome,
            ExportOutcome::NothingToExport(EmptyReason::NoCommittedSelection)
        ));
        assert!(exporter.registry().is_empty());
    }

    #[test]
    fn percent_selection_exports_scaled_region() {
        let exporter = isolated_exporter();
        let source = gradient_source(200, 100);
        let selection = committed(
            (200.0, 100.0),
            (100.0, 50.0),
            DisplayRect::percent(25.0, 25.0, 50.0, 50.0),
        );

        let artifact = exporter
            .export(Some(&selection), &source)
            .expect("export should succeed")
            .into_artifact()
            .expect("artifact expected");

        assert_eq!(artifact.native_rect(), NativeRect::new(50.0, 25.0, 100.0, 50.0));
        assert_eq!(artifact.dimensions(), (100, 50));
        assert_eq!(artifact.mime_type(), "image/jpeg");
        assert_eq!(artifact.file_name(), "cropped-image.jpg");
        assert_eq!(exporter.registry().len(), 1);

        let decoded = artifact.decode().expect("artifact should decode");
        assert_eq!((decoded.width(), decoded.height()), (100, 50));
    }

    #[test]
    fn zero_displayed_size_fails_fast() {
        let exporter = isolated_exporter();
        let source = gradient_source(10, 10);
        let selection = committed((10.0, 10.0), (0.0, 0.0), DisplayRect::initial());

        let result = exporter.export(Some(&selection), &source);

        assert!(matches!(result, Err(CropError::GeometryNotReady(_))));
        assert!(exporter.registry().is_empty());
    }

    #[test]
    fn zero_natural_size_is_source_unavailable() {
        let exporter = isolated_exporter();
        let source = gradient_source(10, 10);
        let selection = committed((0.0, 0.0), (10.0, 10.0), DisplayRect::initial());

        let result = exporter.export(Some(&selection), &source);

        assert!(matches!(result, Err(CropError::SourceUnavailable(_))));
    }

    #[test]
    fn empty_source_is_source_unavailable() {
        let exporter = isolated_exporter();
        let source = SourceImage::from_image(DynamicImage::new_rgba8(0, 0));

        let result = exporter.export_native(&NativeRect::new(0.0, 0.0, 4.0, 4.0), &source);

        assert!(matches!(result, Err(CropError::SourceUnavailable(_))));
    }

    #[test]
    fn stale_geometry_is_clamped_to_source() {
        let exporter = isolated_exporter();
        let source = gradient_source(200, 150);
        // 快照记录的原图比实际载入的大
        let selection = committed(
            (400.0, 300.0),
            (200.0, 150.0),
            DisplayRect::pixel(50.0, 50.0, 150.0, 100.0),
        );

        let artifact = exporter
            .export(Some(&selection), &source)
            .expect("export should succeed")
            .into_artifact()
            .expect("artifact expected");

        let (width, height) = artifact.dimensions();
        assert!(width <= 200 && height <= 150);
        assert_eq!(artifact.native_rect(), NativeRect::new(100.0, 100.0, 100.0, 50.0));
    }

    #[test]
    fn region_outside_source_is_nothing_to_export() {
        let exporter = isolated_exporter();
        let source = gradient_source(50, 50);

        let outcome = exporter
            .export_native(&NativeRect::new(80.0, 80.0, 20.0, 20.0), &source)
            .expect("export should not fail");

        assert!(matches!(
            outcome,
            ExportOutcome::NothingToExport(EmptyReason::EmptyRegion)
        ));
        assert!(exporter.registry().is_empty());
    }

    #[test]
    fn repeated_export_is_deterministic() {
        let exporter = isolated_exporter();
        let source = gradient_source(120, 90);
        let selection = committed(
            (120.0, 90.0),
            (60.0, 45.0),
            DisplayRect::pixel(10.3, 7.7, 33.1, 20.9),
        );

        let first = exporter
            .export(Some(&selection), &source)
            .expect("first export should succeed")
            .into_artifact()
            .expect("artifact expected");
        let second = exporter
            .export(Some(&selection), &source)
            .expect("second export should succeed")
            .into_artifact()
            .expect("artifact expected");

        assert_eq!(first.bytes(), second.bytes());
        assert_ne!(first.reference(), second.reference());
        assert_eq!(exporter.registry().len(), 2);
    }

    #[test]
    fn encode_failure_is_terminal_and_registers_nothing() {
        let exporter = isolated_exporter();
        // JPEG 单边上限 65535
        let source = gradient_source(65_536, 1);

        let result = exporter.export_native(&NativeRect::new(0.0, 0.0, 65_536.0, 1.0), &source);

        let error = result.expect_err("oversized jpeg should fail to encode");
        assert!(matches!(error, CropError::Encode(_)));
        assert_eq!(error.stage(), "encode");
        assert!(exporter.registry().is_empty());
    }

    #[test]
    fn poisoned_config_lock_is_reported() {
        let exporter = isolated_exporter();
        let source = gradient_source(10, 10);

        let config = Arc::clone(&exporter.config);
        let joined = std::thread::spawn(move || {
            let _guard = config.write().expect("lock should be free");
            panic!("poison the config lock");
        })
        .join();
        assert!(joined.is_err());

        let result = exporter.export_native(&NativeRect::new(0.0, 0.0, 4.0, 4.0), &source);

        let error = result.expect_err("poisoned config should fail the export");
        assert!(matches!(error, CropError::LockPoisoned(_)));
        assert_eq!(error.code(), "E_LOCK_POISONED");
        assert!(exporter.set_quality_profile(ExportQualityProfile::High).is_err());
        assert!(exporter.registry().is_empty());
    }

    #[test]
    fn quality_profile_switch_changes_config() {
        let exporter = isolated_exporter();

        exporter
            .set_quality_profile(ExportQualityProfile::Compact)
            .expect("set profile should succeed");

        assert_eq!(
            exporter.get_quality_profile().expect("get profile should succeed"),
            ExportQualityProfile::Compact
        );
        assert_eq!(exporter.get_config().expect("config readable").jpeg_quality, 75);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = ExportConfig::default();
        config.jpeg_quality = 0;

        assert!(matches!(
            CropExporter::new(config.clone()),
            Err(CropError::InvalidFormat(_))
        ));
        assert!(isolated_exporter().set_config(config).is_err());
    }

    #[test]
    fn load_source_decodes_png_bytes() {
        let exporter = isolated_exporter();
        let mut cursor = Cursor::new(Vec::new());
        gradient_source(32, 24)
            .image()
            .write_to(&mut cursor, ImageFormat::Png)
            .expect("failed to encode test image");

        let source = exporter
            .load_source(ImageSource::Bytes(cursor.into_inner()))
            .expect("load should succeed");

        assert_eq!(source.dimensions(), (32, 24));
        assert_eq!(source.natural_size(), Size::new(32.0, 24.0));
    }
}
