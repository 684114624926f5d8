//! # 服务层（可注入状态）
//!
//! ## 设计思路
//!
//! 使用 `CropServiceState` 作为会话与 CLI 的注入状态，替代全局单例函数。
//! 好处：
//! 1. 生命周期清晰（由 `main.rs` / `CropSession` 统一管理）
//! 2. 测试可创建独立实例，减少共享状态副作用
//! 3. 克隆只复制 `Arc`，多个会话可共享同一个导出器
//!
//! ## 实现思路
//!
//! 解码、渲染与编码都是 CPU 密集步骤，统一挪到 `tokio::task::spawn_blocking`，
//! 交互线程（选区拖拽）不会被导出阻塞。进行中的导出不会被隐式取消。

use std::sync::Arc;

use super::{
    ArtifactRegistry, CropError, CropExporter, ExportConfig, ExportOutcome, ExportQualityProfile,
    ImageSource, SourceImage,
};
use crate::geometry::NativeRect;
use crate::selection::CommittedSelection;

/// 裁剪导出服务状态。
#[derive(Clone)]
pub struct CropServiceState {
    exporter: Arc<CropExporter>,
}

impl CropServiceState {
    /// 使用默认配置创建服务状态。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use image_cropper::crop_export::CropServiceState;
    ///
    /// let service = CropServiceState::new()?;
    /// # Ok::<(), image_cropper::crop_export::CropError>(())
    /// ```
    pub fn new() -> Result<Self, CropError> {
        Self::with_config(ExportConfig::default())
    }

    /// 使用自定义配置创建服务状态。
    pub fn with_config(config: ExportConfig) -> Result<Self, CropError> {
        Ok(Self::with_exporter(CropExporter::new(config)?))
    }

    pub fn with_exporter(exporter: CropExporter) -> Self {
        Self {
            exporter: Arc::new(exporter),
        }
    }

    pub fn exporter(&self) -> &CropExporter {
        &self.exporter
    }

    pub fn registry(&self) -> Arc<ArtifactRegistry> {
        self.exporter.registry()
    }

    /// 在阻塞线程池中加载并解码源图片。
    pub async fn load_source(&self, source: ImageSource) -> Result<SourceImage, CropError> {
        let exporter = Arc::clone(&self.exporter);
        run_blocking(move || exporter.load_source(source)).await
    }

    /// 在阻塞线程池中执行一次导出。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use std::sync::Arc;
    /// use image_cropper::crop_export::{CropServiceState, ImageSource};
    ///
    /// # async fn demo() -> Result<(), image_cropper::crop_export::CropError> {
    /// let service = CropServiceState::new()?;
    /// let source = Arc::new(service.load_source(ImageSource::FilePath("photo.png".into())).await?);
    /// let outcome = service.export(None, source).await?;
    /// assert!(outcome.is_nothing());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn export(
        &self,
        committed: Option<CommittedSelection>,
        source: Arc<SourceImage>,
    ) -> Result<ExportOutcome, CropError> {
        let exporter = Arc::clone(&self.exporter);
        run_blocking(move || exporter.export(committed.as_ref(), &source)).await
    }

    pub async fn export_native(
        &self,
        rect: NativeRect,
        source: Arc<SourceImage>,
    ) -> Result<ExportOutcome, CropError> {
        let exporter = Arc::clone(&self.exporter);
        run_blocking(move || exporter.export_native(&rect, &source)).await
    }

    /// 按字符串切换画质档位（`high` / `balanced` / `compact`）。
    pub fn set_quality_profile(&self, profile: &str) -> Result<(), CropError> {
        let profile = ExportQualityProfile::from_str(profile)?;
        self.exporter.set_quality_profile(profile)
    }

    /// 获取当前生效画质档位（字符串）。
    pub fn get_quality_profile(&self) -> Result<String, CropError> {
        let profile = self.exporter.get_quality_profile()?;
        Ok(profile.as_str().to_string())
    }

    pub fn set_config(&self, config: ExportConfig) -> Result<(), CropError> {
        self.exporter.set_config(config)
    }

    pub fn get_config(&self) -> Result<ExportConfig, CropError> {
        self.exporter.get_config()
    }
}

async fn run_blocking<T, F>(task: F) -> Result<T, CropError>
where
    F: FnOnce() -> Result<T, CropError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| CropError::Task(format!("导出任务异常结束：{}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{DisplayRect, ImageGeometry, Size};
    use image::{DynamicImage, RgbaImage};
    use std::thread;

    fn isolated_service() -> CropServiceState {
        let exporter = CropExporter::with_registry(
            ExportConfig::default(),
            Arc::new(ArtifactRegistry::new()),
        )
        .expect("exporter init failed");
        CropServiceState::with_exporter(exporter)
    }

    #[test]
    fn service_set_and_get_profile_roundtrip() {
        let service = isolated_service();

        for profile in ["high", "balanced", "compact"] {
            service.set_quality_profile(profile).expect("set profile should succeed");
            let current = service.get_quality_profile().expect("get profile should succeed");
            assert_eq!(current, profile);
        }
    }

    #[test]
    fn service_rejects_invalid_profile() {
        let service = isolated_service();

        let result = service.set_quality_profile("lossless");
        assert!(matches!(result, Err(CropError::InvalidFormat(_))));
    }

    #[test]
    fn service_profile_concurrent_mixed_invalid_inputs() {
        let service = isolated_service();

        let workers = 8;
        let iterations = 120;

        let mut handles = Vec::with_capacity(workers);
        for worker_id in 0..workers {
            let service = service.clone();
            handles.push(thread::spawn(move || {
                let valid_profiles = ["high", "balanced", "compact"];
                let invalid_profiles = ["", "ultra", "max", "bal anced"];

                for i in 0..iterations {
                    if (worker_id + i) % 3 == 0 {
                        let invalid = invalid_profiles[(worker_id + i) % invalid_profiles.len()];
                        let result = service.set_quality_profile(invalid);
                        assert!(matches!(result, Err(CropError::InvalidFormat(_))));
                    } else {
                        let valid = valid_profiles[(worker_id + i) % valid_profiles.len()];
                        service.set_quality_profile(valid).expect("set valid profile should succeed");
                    }

                    let current = service.get_quality_profile().expect("get profile should succeed");
                    assert!(matches!(current.as_str(), "high" | "balanced" | "compact"));
                }
            }));
        }

        for handle in handles {
            handle.join().expect("worker thread should not panic");
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_exports_register_independent_references() {
        let service = isolated_service();
        let source = Arc::new(SourceImage::from_image(DynamicImage::ImageRgba8(
            RgbaImage::from_fn(160, 120, |x, y| image::Rgba([x as u8, y as u8, 90, 255])),
        )));
        let committed = CommittedSelection {
            rect: DisplayRect::initial(),
            geometry: ImageGeometry::new(source.natural_size(), Size::new(80.0, 60.0)),
        };

        let mut tasks = Vec::new();
        for _ in 0..6 {
            let service = service.clone();
            let source = Arc::clone(&source);
            tasks.push(tokio::spawn(async move {
                service.export(Some(committed), source).await
            }));
        }

        let mut artifacts = Vec::new();
        for task in tasks {
            let outcome = task
                .await
                .expect("task should not panic")
                .expect("export should succeed");
            artifacts.push(outcome.into_artifact().expect("artifact expected"));
        }

        assert_eq!(service.registry().len(), 6);
        for artifact in &artifacts {
            assert_eq!(artifact.dimensions(), (80, 60));
            assert_eq!(artifact.bytes(), artifacts[0].bytes());
        }

        let registry = service.registry();
        for artifact in artifacts {
            assert!(artifact.release(&registry));
        }
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn export_without_selection_leaves_registry_untouched() {
        let service = isolated_service();
        let source = Arc::new(SourceImage::from_image(DynamicImage::new_rgba8(4, 4)));

        let outcome = service.export(None, source).await.expect("export should not fail");

        assert!(outcome.is_nothing());
        assert!(service.registry().is_empty());
    }

    #[tokio::test]
    async fn load_source_reports_missing_file() {
        let service = isolated_service();

        let result = service
            .load_source(ImageSource::FilePath("/no/such/image.png".into()))
            .await;

        assert!(matches!(result, Err(CropError::FileSystem(_))));
    }
}
