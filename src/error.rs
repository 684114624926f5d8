//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 定义全局统一的 `AppError` 枚举，汇总各模块的错误类型，
//! 会话层与 CLI 统一返回 `Result<T, AppError>`。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 为 `CropError` / `AnalysisError` 提供 `From` 转换，无需手动 map。
//! - 实现 `Serialize` 将错误序列化为字符串，便于以 JSON 形式输出给调用方。

use serde::Serialize;

use crate::analysis::AnalysisError;
use crate::crop_export::CropError;

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 裁剪导出流水线错误（加载 / 解码 / 渲染 / 编码）
    #[error("{0}")]
    Crop(#[from] CropError),

    /// 分析服务调用失败
    #[error("{0}")]
    Analysis(#[from] AnalysisError),

    /// 文件系统 I/O 错误
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),

    /// 设置文件读写或解析失败
    #[error("设置错误: {0}")]
    Settings(String),

    /// 命令行参数无效
    #[error("参数错误: {0}")]
    InvalidArgument(String),
}

impl AppError {
    /// 稳定错误码。
    pub fn code(&self) -> &'static str {
        match self {
            Self::Crop(e) => e.code(),
            Self::Analysis(e) => e.code(),
            Self::Io(_) => "E_IO",
            Self::Settings(_) => "E_SETTINGS",
            Self::InvalidArgument(_) => "E_INVALID_ARGUMENT",
        }
    }
}

/// 将错误序列化为人类可读的字符串。
impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
