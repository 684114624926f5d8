//! # 配置模块
//!
//! ## 设计思路
//!
//! 将所有“可调策略”集中到 `ExportConfig`，保证运行时行为可观测、可调整、可测试。
//! 其中画质档位（high / balanced / compact）作为高层语义，映射到底层 JPEG 质量。
//!
//! ## 实现思路
//!
//! - `Default` 提供生产可用的平衡配置。
//! - `ExportQualityProfile` 负责档位字符串解析与反向输出。
//! - `apply_quality_profile` 将档位转换为具体参数。
//! - `infer_quality_profile` 用于从当前配置反推档位（给前端展示状态）。
//! - `validate` 在写入运行时配置前做范围检查。

use serde::{Deserialize, Serialize};

use super::CropError;

/// 导出配置。
///
/// 字段覆盖了来源读取、解码限制与编码三个阶段。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// JPEG 编码质量（1~100）。
    pub jpeg_quality: u8,
    /// 下载时建议的文件名。
    pub download_file_name: String,
    /// 读取原始字节时允许的最大文件体积（字节）。
    pub max_file_size: u64,
    /// 解码后的像素上限（`width * height`）。
    pub max_decoded_pixels: u64,
    /// 解码阶段允许的预计内存上限（按 RGBA 估算，字节）。
    pub max_decoded_bytes: u64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: 92,
            download_file_name: "cropped-image.jpg".to_string(),
            max_file_size: 50 * 1024 * 1024,
            max_decoded_pixels: 40_000_000,
            max_decoded_bytes: 160 * 1024 * 1024,
        }
    }
}

/// 画质档位（面向产品/用户语义）。
///
/// - `High`：尽量保真
/// - `Balanced`：质量与体积平衡
/// - `Compact`：优先体积
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportQualityProfile {
    High,
    Balanced,
    Compact,
}

impl ExportQualityProfile {
    /// 从外部字符串解析档位。
    ///
    /// # 示例
    /// ```
    /// use image_cropper::crop_export::ExportQualityProfile;
    ///
    /// let p = ExportQualityProfile::from_str("Balanced")?;
    /// assert_eq!(p.as_str(), "balanced");
    /// # Ok::<(), image_cropper::crop_export::CropError>(())
    /// ```
    pub fn from_str(profile: &str) -> Result<Self, CropError> {
        match profile.trim().to_lowercase().as_str() {
            "high" => Ok(Self::High),
            "balanced" => Ok(Self::Balanced),
            "compact" => Ok(Self::Compact),
            other => Err(CropError::InvalidFormat(format!(
                "未知画质档位：{}（可选：high / balanced / compact）",
                other
            ))),
        }
    }

    /// 将档位输出为稳定字符串，供前端展示与持久化。
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Balanced => "balanced",
            Self::Compact => "compact",
        }
    }

    fn jpeg_quality(self) -> u8 {
        match self {
            Self::High => 98,
            Self::Balanced => 92,
            Self::Compact => 75,
        }
    }
}

impl ExportConfig {
    /// 基于当前参数反推画质档位。
    pub fn infer_quality_profile(&self) -> ExportQualityProfile {
        if self.jpeg_quality >= ExportQualityProfile::High.jpeg_quality() {
            return ExportQualityProfile::High;
        }

        if self.jpeg_quality <= ExportQualityProfile::Compact.jpeg_quality() {
            return ExportQualityProfile::Compact;
        }

        ExportQualityProfile::Balanced
    }

    /// 应用指定画质档位到实际参数。
    pub fn apply_quality_profile(&mut self, profile: ExportQualityProfile) {
        self.jpeg_quality = profile.jpeg_quality();
    }

    /// 范围检查，失败时返回 `CropError::InvalidFormat`。
    pub fn validate(&self) -> Result<(), CropError> {
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(CropError::InvalidFormat(
                "jpeg_quality 必须在 1~100 之间".to_string(),
            ));
        }
        let file_name = self.download_file_name.trim();
        if file_name.is_empty() || file_name.contains(['/', '\\']) {
            return Err(CropError::InvalidFormat(
                "download_file_name 不能为空且不能包含路径分隔符".to_string(),
            ));
        }
        if self.max_file_size < 1024 {
            return Err(CropError::InvalidFormat("max_file_size 不能小于 1KB".to_string()));
        }
        if self.max_decoded_pixels == 0 {
            return Err(CropError::InvalidFormat("max_decoded_pixels 必须大于 0".to_string()));
        }
        if self.max_decoded_bytes < 8 * 1024 * 1024 {
            return Err(CropError::InvalidFormat("max_decoded_bytes 不能小于 8MB".to_string()));
        }

        Ok(())
    }
}
