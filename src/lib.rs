//! # 图片裁剪工具：库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                 调用方（CLI / 界面层）                     │
//! │                                                          │
//! │  CropSession ── 载入 → 默认选区 → 拖拽 → 确认 → 导出       │
//! └───────┼──────────────────────────────────────────────────┘
//!         ↕ Result<T, AppError>
//! ┌───────┼──────────────────────────────────────────────────┐
//! │       ↕            核心 (Rust)                            │
//! │                                                          │
//! │  ┌─ error ────── AppError (统一错误类型)                  │
//! │  │                                                       │
//! │  ├─ geometry ─── 显示坐标 ↔ 原生像素换算 + 越界收敛        │
//! │  ├─ selection ── 选区状态 (current / committed)           │
//! │  │                                                       │
//! │  ├─ crop_export       加载·解码·渲染·JPEG 编码            │
//! │  │   └─ artifact      本地引用登记 + ArtifactGuard (RAII) │
//! │  │                                                       │
//! │  ├─ analysis          远端分析服务接口 (reqwest)          │
//! │  └─ settings          JSON 设置文件                       │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError`，会话层与 CLI 的返回类型 |
//! | [`geometry`] | 百分比/像素选区换算、缩放比例、矩形收敛 |
//! | [`selection`] | 单张图片的交互选区与确认快照 |
//! | [`crop_export`] | 从文件/Base64/内存加载图片，按原生矩形导出 JPEG |
//! | [`analysis`] | 提交图片给分析服务，解析建议裁剪 |
//! | [`session`] | 串联一张图片的完整裁剪流程 |
//! | [`settings`] | 设置文件的读取、默认值回退与保存 |

pub mod analysis;
pub mod crop_export;
pub mod error;
pub mod geometry;
pub mod selection;
pub mod session;
pub mod settings;
