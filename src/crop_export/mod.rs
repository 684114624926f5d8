//! # 裁剪导出模块（crop_export）
//!
//! ## 设计思路
//!
//! 该模块将“来源加载 → 解码校验 → 坐标换算 → 区域渲染 → JPEG 编码 → 本地引用登记”
//! 按职责拆分为多个子模块，避免单文件膨胀与耦合。
//!
//! - `service`：承载可注入状态（`CropServiceState`），把耗时步骤挪出交互线程
//! - `handler`：编排整条导出流水线
//! - `loader`：负责 文件/Base64/内存字节 加载与安全校验
//! - `pipeline`：负责解码、像素限制、区域渲染
//! - `encoder`：负责 JPEG 编码
//! - `artifact`：导出产物与本地引用登记表
//! - `config/error/source`：配置、错误、中间数据模型
//!
//! ## 实现思路
//!
//! 对外仅暴露必要类型，内部细节保持 `mod` 私有。
//! 导出器本身无单次调用状态：同一个 `CropExporter` 可被多个任务并发调用。
//!
//! ## 新同事快速上手
//!
//! 可以按下面顺序理解调用链：
//!
//! ```text
//! CropSession / CLI
//!    ↓
//! service.rs（spawn_blocking，保证交互线程不被编码阻塞）
//!    ↓
//! handler.rs（统一编排 + 阶段耗时日志）
//!    ├─ loader.rs（来源加载 + 体积/签名校验）
//!    ├─ pipeline.rs（解码 + 像素限制 + 区域渲染）
//!    ├─ encoder.rs（JPEG 编码）
//!    └─ artifact.rs（登记本地引用）
//!    ↓
//! 返回 ExportOutcome / CropError
//! ```
//!
//! ## 分层职责建议
//!
//! - 配置与策略变更优先改 `config.rs`
//! - 业务流程顺序变更优先改 `handler.rs`
//! - 单阶段行为优化分别改 `loader/pipeline/encoder`
//! - 产物生命周期（登记/释放）问题优先看 `artifact.rs`

mod artifact;
mod config;
mod encoder;
mod error;
mod handler;
mod loader;
mod pipeline;
mod service;
mod source;

pub use artifact::{
    ArtifactGuard, ArtifactReference, ArtifactRegistry, CropArtifact, JPEG_MIME_TYPE,
};
pub use config::{ExportConfig, ExportQualityProfile};
pub use error::CropError;
pub use handler::{CropExporter, EmptyReason, ExportOutcome};
pub use service::CropServiceState;
pub use source::{ImageSource, SourceImage};
