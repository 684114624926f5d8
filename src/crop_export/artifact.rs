//! # 导出产物与本地引用模块
//!
//! ## 设计思路
//!
//! 每次导出产生一个 `CropArtifact`：JPEG 字节 + 尺寸 + 一个可在本地解析的引用。
//! 引用登记在 `ArtifactRegistry` 中，它是导出链路里唯一的共享资源。
//!
//! 引用归创建者独占，必须显式释放（`revoke` / `release`），否则反复裁剪会无限累积。
//! 这是调用方义务而非导出器职责，因此额外提供 `ArtifactGuard`：
//! 离开作用域时自动释放，覆盖所有退出路径（含 `?` 提前返回与 panic 展开）。
//!
//! ## 实现思路
//!
//! - 字节用 `bytes::Bytes` 持有，产物与登记表共享同一份内存，克隆只增加引用计数。
//! - 引用格式固定为 `blob:image-cropper/<uuid>`，可由字符串解析回来。
//! - 进程级默认登记表通过 `once_cell::sync::Lazy` 惰性创建；测试可注入独立实例。

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use base64::{Engine as _, engine::general_purpose};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use uuid::Uuid;

use super::CropError;
use crate::geometry::NativeRect;

/// 导出产物的固定 MIME 类型。
pub const JPEG_MIME_TYPE: &str = "image/jpeg";

const REFERENCE_PREFIX: &str = "blob:image-cropper/";

static SHARED_REGISTRY: Lazy<Arc<ArtifactRegistry>> =
    Lazy::new(|| Arc::new(ArtifactRegistry::new()));

/// 本地引用（类似浏览器的 object URL）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArtifactReference {
    id: Uuid,
}

impl ArtifactReference {
    fn generate() -> Self {
        Self { id: Uuid::new_v4() }
    }

    /// 从 `blob:image-cropper/<uuid>` 形式的字符串解析。
    pub fn parse(value: &str) -> Option<Self> {
        let id = value.trim().strip_prefix(REFERENCE_PREFIX)?;
        Uuid::parse_str(id).ok().map(|id| Self { id })
    }
}

impl fmt::Display for ArtifactReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", REFERENCE_PREFIX, self.id)
    }
}

struct RegisteredArtifact {
    bytes: Bytes,
    mime_type: &'static str,
}

/// 本地引用登记表。
///
/// 锁中毒时一律取回内部数据继续使用：每次操作只做单个条目的插入、读取或删除，
/// 持锁线程 panic 不会留下半写的条目。
#[derive(Default)]
pub struct ArtifactRegistry {
    entries: Mutex<HashMap<ArtifactReference, RegisteredArtifact>>,
}

impl ArtifactRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 进程级默认登记表。
    pub fn shared() -> Arc<Self> {
        Arc::clone(&SHARED_REGISTRY)
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<ArtifactReference, RegisteredArtifact>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 登记一段字节并返回新引用。
    pub fn register(&self, bytes: Bytes, mime_type: &'static str) -> ArtifactReference {
        let reference = ArtifactReference::generate();
        let mut entries = self.entries();

        entries.insert(reference, RegisteredArtifact { bytes, mime_type });
        log::debug!("🔗 已登记本地引用 {}（当前 {} 个）", reference, entries.len());

        reference
    }

    /// 解析引用，返回字节与 MIME 类型；已释放或未知引用返回 `None`。
    pub fn resolve(&self, reference: &ArtifactReference) -> Option<(Bytes, &'static str)> {
        self.entries()
            .get(reference)
            .map(|entry| (entry.bytes.clone(), entry.mime_type))
    }

    /// 释放引用。返回该引用此前是否存在。
    pub fn revoke(&self, reference: &ArtifactReference) -> bool {
        let mut entries = self.entries();

        let removed = entries.remove(reference).is_some();
        if removed {
            log::debug!("🧹 已释放本地引用 {}（剩余 {} 个）", reference, entries.len());
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 一次导出的产物。
#[derive(Debug, Clone)]
pub struct CropArtifact {
    pub(super) bytes: Bytes,
    pub(super) width: u32,
    pub(super) height: u32,
    pub(super) native_rect: NativeRect,
    pub(super) reference: ArtifactReference,
    pub(super) file_name: String,
    pub(super) created_at: DateTime<Utc>,
}

impl CropArtifact {
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn mime_type(&self) -> &'static str {
        JPEG_MIME_TYPE
    }

    /// 输出像素尺寸 `(width, height)`。
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// 实际采样使用的原生矩形（已收敛）。
    pub fn native_rect(&self) -> NativeRect {
        self.native_rect
    }

    pub fn reference(&self) -> ArtifactReference {
        self.reference
    }

    /// 下载时建议的文件名。
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// 内联引用：`data:image/jpeg;base64,...`。
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            JPEG_MIME_TYPE,
            general_purpose::STANDARD.encode(&self.bytes)
        )
    }

    /// 解码产物像素（用于预览与校验）。
    pub fn decode(&self) -> Result<image::DynamicImage, CropError> {
        image::load_from_memory(&self.bytes)
            .map_err(|e| CropError::Decode(format!("产物解码失败：{}", e)))
    }

    /// 以建议文件名写入目录，目录不存在时自动创建。
    pub fn save_to(&self, dir: &Path) -> Result<PathBuf, CropError> {
        if !dir.exists() {
            fs::create_dir_all(dir).map_err(|e| {
                CropError::FileSystem(format!("创建目录 '{}' 失败：{}", dir.display(), e))
            })?;
        }

        let path = dir.join(&self.file_name);
        fs::write(&path, &self.bytes)
            .map_err(|e| CropError::FileSystem(format!("写入 '{}' 失败：{}", path.display(), e)))?;

        log::info!("💾 裁剪结果已保存 - {}", path.display());
        Ok(path)
    }

    /// 释放本地引用并消费产物。
    pub fn release(self, registry: &ArtifactRegistry) -> bool {
        registry.revoke(&self.reference)
    }
}

/// 本地引用的 RAII 守卫：`Drop` 时释放引用。
///
/// # 示例
/// ```no_run
/// use image_cropper::crop_export::{ArtifactGuard, CropArtifact, CropExporter};
///
/// fn show(exporter: &CropExporter, artifact: CropArtifact) {
///     let guard = ArtifactGuard::new(exporter.registry(), artifact);
///     println!("{}", guard.reference());
///     // guard 离开作用域时引用已被释放
/// }
/// ```
pub struct ArtifactGuard {
    registry: Arc<ArtifactRegistry>,
    artifact: CropArtifact,
    armed: bool,
}

impl ArtifactGuard {
    pub fn new(registry: Arc<ArtifactRegistry>, artifact: CropArtifact) -> Self {
        Self {
            registry,
            artifact,
            armed: true,
        }
    }

    /// 解除守卫，引用所有权交还调用方（此后需自行释放）。
    pub fn into_inner(mut self) -> CropArtifact {
        self.armed = false;
        self.artifact.clone()
    }
}

impl Deref for ArtifactGuard {
    type Target = CropArtifact;

    fn deref(&self) -> &Self::Target {
        &self.artifact
    }
}

impl Drop for ArtifactGuard {
    fn drop(&mut self) {
        if self.armed {
            self.registry.revoke(&self.artifact.reference);
        }
    }
}
