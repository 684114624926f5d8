//! # 设置文件
//!
//! 设置以 JSON 存放在用户配置目录下（`<config_dir>/image-cropper/settings.json`）。
//! 文件不存在时使用默认值；缺失字段逐项回退到默认值，旧版本设置文件可直接读取。

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::analysis::AnalysisConfig;
use crate::crop_export::ExportConfig;
use crate::error::AppError;

const APP_DIR_NAME: &str = "image-cropper";
const SETTINGS_FILE_NAME: &str = "settings.json";

/// 应用设置。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub export: ExportConfig,
    pub analysis: AnalysisConfig,
    /// `env_logger` 过滤表达式，`RUST_LOG` 优先。
    pub log_filter: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            export: ExportConfig::default(),
            analysis: AnalysisConfig::default(),
            log_filter: "info".to_string(),
        }
    }
}

impl AppSettings {
    /// 默认设置文件路径。
    pub fn default_path() -> Result<PathBuf, AppError> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| AppError::Settings("无法定位用户配置目录".to_string()))?;

        Ok(config_dir.join(APP_DIR_NAME).join(SETTINGS_FILE_NAME))
    }

    /// 读取设置；文件不存在时返回默认值。
    pub fn load_from(path: &Path) -> Result<Self, AppError> {
        if !path.exists() {
            log::debug!("⚙️ 设置文件不存在，使用默认设置 - {}", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let settings: Self = serde_json::from_str(&content)
            .map_err(|e| AppError::Settings(format!("解析设置文件失败: {}", e)))?;

        settings.validate()?;
        Ok(settings)
    }

    /// 写入设置，目录不存在时自动创建。
    pub fn save_to(&self, path: &Path) -> Result<(), AppError> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| AppError::Settings(format!("序列化设置失败: {}", e)))?;
        fs::write(path, content)?;

        log::info!("💾 设置已保存 - {}", path.display());
        Ok(())
    }

    pub fn validate(&self) -> Result<(), AppError> {
        self.export.validate()?;
        self.analysis.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir should be created");

        let settings = AppSettings::load_from(&dir.path().join("settings.json"))
            .expect("load should succeed");

        assert_eq!(settings, AppSettings::default());
    }

    #[test]
    fn save_then_load_preserves_values() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = dir.path().join("nested").join("settings.json");

        let mut settings = AppSettings::default();
        settings.export.jpeg_quality = 80;
        settings.analysis.endpoint = "https://crop.example.com/api/crop".to_string();
        settings.log_filter = "image_cropper=debug".to_string();
        settings.save_to(&path).expect("save should succeed");

        let loaded = AppSettings::load_from(&path).expect("load should succeed");

        assert_eq!(loaded, settings);
    }

    #[test]
    fn partial_file_falls_back_per_field() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"export":{"jpeg_quality":70}}"#).expect("write should succeed");

        let loaded = AppSettings::load_from(&path).expect("load should succeed");

        assert_eq!(loaded.export.jpeg_quality, 70);
        assert_eq!(loaded.export.download_file_name, "cropped-image.jpg");
        assert_eq!(loaded.analysis, AnalysisConfig::default());
        assert_eq!(loaded.log_filter, "info");
    }

    #[test]
    fn invalid_values_are_rejected_on_load() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"export":{"jpeg_quality":0}}"#).expect("write should succeed");

        assert!(matches!(AppSettings::load_from(&path), Err(AppError::Crop(_))));
    }

    #[test]
    fn malformed_json_is_settings_error() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = dir.path().join("settings.json");
        fs::write(&path, "{not json").expect("write should succeed");

        assert!(matches!(AppSettings::load_from(&path), Err(AppError::Settings(_))));
    }
}
