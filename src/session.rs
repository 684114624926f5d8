//! # 裁剪会话
//!
//! ## 设计思路
//!
//! 一个会话 = 一张已载入的图片 + 它的选区状态 + 共享的导出服务。
//! 把“载入 → 放置默认选区 → 拖拽 → 确认 → 导出”串成一个单元，
//! 载入新图片时旧选区随之失效。
//!
//! 选区更新是纯内存操作，导出则交给 `CropServiceState` 在阻塞线程池中执行，
//! 两者互不等待。

use std::future::Future;
use std::sync::Arc;

use crate::analysis::{AnalysisResponse, AnalysisResult, AnalysisService, ImagePayload};
use crate::crop_export::{
    CropError, CropServiceState, EmptyReason, ExportOutcome, ImageSource, SourceImage,
};
use crate::error::AppError;
use crate::geometry::{DisplayRect, ImageGeometry, Size};
use crate::selection::{CommittedSelection, CropSelector};

/// 单张图片的裁剪会话。
pub struct CropSession {
    service: CropServiceState,
    source: Option<Arc<SourceImage>>,
    selector: CropSelector,
}

impl CropSession {
    pub fn new(service: CropServiceState) -> Self {
        Self {
            service,
            source: None,
            selector: CropSelector::new(),
        }
    }

    pub fn service(&self) -> &CropServiceState {
        &self.service
    }

    pub fn source(&self) -> Option<&Arc<SourceImage>> {
        self.source.as_ref()
    }

    pub fn selector(&self) -> &CropSelector {
        &self.selector
    }

    /// 加载并解码图片，返回放置好的默认选区。
    pub async fn load(&mut self, source: ImageSource, displayed: Size) -> Result<DisplayRect, CropError> {
        let decoded = self.service.load_source(source).await?;
        Ok(self.load_decoded(decoded, displayed))
    }

    /// 使用已解码的图片开始新会话。
    pub fn load_decoded(&mut self, image: SourceImage, displayed: Size) -> DisplayRect {
        let geometry = ImageGeometry::new(image.natural_size(), displayed);
        self.source = Some(Arc::new(image));
        self.selector.set_initial_selection(geometry)
    }

    pub fn update_selection(&mut self, rect: DisplayRect) -> DisplayRect {
        self.selector.update_selection(rect)
    }

    pub fn commit_selection(&mut self, rect: DisplayRect) -> Option<CommittedSelection> {
        self.selector.commit_selection(rect)
    }

    /// 界面重新布局，只影响之后的确认。
    pub fn set_displayed_size(&mut self, displayed: Size) {
        self.selector.set_displayed_size(displayed);
    }

    /// 导出当前已确认的选区。
    ///
    /// 选区与源图在调用时取快照，返回的 future 不借用会话：
    /// 导出进行中仍可继续拖拽、确认新选区，进行中的导出不受影响。
    pub fn export(&self) -> impl Future<Output = Result<ExportOutcome, CropError>> + Send + use<> {
        let service = self.service.clone();
        let committed = self.selector.committed();
        let source = self.require_source();

        async move {
            let Some(committed) = committed else {
                return Ok(ExportOutcome::NothingToExport(EmptyReason::NoCommittedSelection));
            };

            service.export(Some(committed), source?).await
        }
    }

    /// 按分析服务给出的建议裁剪导出（先收敛到原图范围）。
    pub fn apply_analysis(
        &self,
        result: &AnalysisResult,
    ) -> impl Future<Output = Result<ExportOutcome, CropError>> + Send + use<> {
        let service = self.service.clone();
        let planned = self.require_source().map(|source| {
            let rect = result.clamped_crop(source.natural_size());
            log::info!(
                "🪄 应用建议裁剪「{}」- ({:.0}, {:.0}, {:.0}, {:.0})",
                result.title,
                rect.x,
                rect.y,
                rect.width,
                rect.height
            );
            (rect, source)
        });

        async move {
            let (rect, source) = planned?;
            service.export_native(rect, source).await
        }
    }

    /// 提交分析，若服务端给出建议裁剪则立即导出。
    pub async fn analyze_and_apply(
        &self,
        analysis: &dyn AnalysisService,
        payload: ImagePayload,
    ) -> Result<(AnalysisResponse, Option<ExportOutcome>), AppError> {
        self.require_source()?;

        let response = analysis.analyze(payload).await?;
        let outcome = match response.result.as_ref() {
            Some(result) => Some(self.apply_analysis(result).await?),
            None => {
                log::info!("ℹ️ 分析服务未给出建议裁剪：{}", response.message);
                None
            }
        };

        Ok((response, outcome))
    }

    fn require_source(&self) -> Result<Arc<SourceImage>, CropError> {
        self.source
            .as_ref()
            .map(Arc::clone)
            .ok_or_else(|| CropError::SourceUnavailable("尚未载入图片".to_string()))
    }
}
