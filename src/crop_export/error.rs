//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 使用单一错误枚举承载导出链路中的所有错误来源，避免字符串拼接式错误处理。
//! 通过 `thiserror` 保持人类可读错误，同时让调用侧可按分支匹配。
//!
//! 注意：“没有已确认选区”与“选区越界”都不是错误，
//! 前者由 `ExportOutcome::NothingToExport` 表达，后者在几何层直接收敛。

use crate::geometry::GeometryError;

/// 裁剪导出统一错误类型。
#[derive(Debug, thiserror::Error)]
pub enum CropError {
    /// 渲染尺寸为 0 等布局未完成状态，调用方应在布局完成后重试。
    #[error("几何信息未就绪：{0}")]
    GeometryNotReady(String),

    /// 源像素不可用（尚未载入或尺寸为 0）。
    #[error("源图片不可用：{0}")]
    SourceUnavailable(String),

    #[error("格式错误：{0}")]
    InvalidFormat(String),

    #[error("解码错误：{0}")]
    Decode(String),

    #[error("渲染错误：{0}")]
    Render(String),

    /// 编码失败对本次导出是终态，不会自动重试。
    #[error("编码错误：{0}")]
    Encode(String),

    #[error("文件错误：{0}")]
    FileSystem(String),

    #[error("资源限制：{0}")]
    ResourceLimit(String),

    /// 配置锁被持锁线程 panic 后中毒；不会自动恢复。
    #[error("锁已中毒：{0}")]
    LockPoisoned(String),

    #[error("导出任务异常：{0}")]
    Task(String),
}

impl CropError {
    /// 稳定错误码，供上层做结构化上报。
    pub fn code(&self) -> &'static str {
        match self {
            Self::GeometryNotReady(_) => "E_GEOMETRY_NOT_READY",
            Self::SourceUnavailable(_) => "E_SOURCE_UNAVAILABLE",
            Self::InvalidFormat(_) => "E_INVALID_FORMAT",
            Self::Decode(_) => "E_DECODE",
            Self::Render(_) => "E_RENDER",
            Self::Encode(_) => "E_ENCODE",
            Self::FileSystem(_) => "E_FILE_SYSTEM",
            Self::ResourceLimit(_) => "E_RESOURCE_LIMIT",
            Self::LockPoisoned(_) => "E_LOCK_POISONED",
            Self::Task(_) => "E_TASK",
        }
    }

    /// 出错所在的流水线阶段。
    pub fn stage(&self) -> &'static str {
        match self {
            Self::GeometryNotReady(_) => "geometry",
            Self::SourceUnavailable(_) | Self::InvalidFormat(_) | Self::FileSystem(_) => "load",
            Self::Decode(_) | Self::ResourceLimit(_) => "decode",
            Self::Render(_) => "render",
            Self::Encode(_) => "encode",
            Self::LockPoisoned(_) => "config",
            Self::Task(_) => "export",
        }
    }

    /// 输入未就绪类错误：稍后重试可能成功。
    pub fn is_input_not_ready(&self) -> bool {
        matches!(self, Self::GeometryNotReady(_) | Self::SourceUnavailable(_))
    }
}

impl From<GeometryError> for CropError {
    fn from(error: GeometryError) -> Self {
        Self::GeometryNotReady(error.to_string())
    }
}
