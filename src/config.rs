/// 程序配置文件
use crate::error::{AppError, AppResult, ConfigError};
use serde::Deserialize;
use std::path::Path;

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 同时进行的抠图请求数量
    pub max_concurrent_transforms: usize,
    // --- 图像变换服务配置 ---
    pub transform_api_key: String,
    pub transform_api_base_url: String,
    pub transform_model_name: String,
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,
    /// 发送给变换服务的主体抠图指令
    pub background_instruction: String,
    // --- 文档配置（单位：pt） ---
    pub page_width_pt: f32,
    pub page_height_pt: f32,
    pub title_font_size: f32,
    pub title_margin_pt: f32,
    // --- 输出配置 ---
    /// 下载兜底写入的目录
    pub download_folder: String,
    /// 合并导出时的文件名（不含扩展名）
    pub combined_document_name: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_concurrent_transforms: 4,
            transform_api_key: String::new(),
            transform_api_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            transform_model_name: "gemini-2.5-flash-image".to_string(),
            request_timeout_secs: 120,
            background_instruction: "Remove the background of this image. Keep only the main subject, \
                                     unchanged, on a plain white background."
                .to_string(),
            // A4 竖版
            page_width_pt: 595.28,
            page_height_pt: 841.89,
            title_font_size: 16.0,
            title_margin_pt: 28.0,
            download_folder: "downloads".to_string(),
            combined_document_name: "all-groups".to_string(),
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            max_concurrent_transforms: std::env::var("MAX_CONCURRENT_TRANSFORMS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_concurrent_transforms),
            transform_api_key: std::env::var("TRANSFORM_API_KEY").unwrap_or(default.transform_api_key),
            transform_api_base_url: std::env::var("TRANSFORM_API_BASE_URL").unwrap_or(default.transform_api_base_url),
            transform_model_name: std::env::var("TRANSFORM_MODEL_NAME").unwrap_or(default.transform_model_name),
            request_timeout_secs: std::env::var("REQUEST_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.request_timeout_secs),
            background_instruction: std::env::var("BACKGROUND_INSTRUCTION").unwrap_or(default.background_instruction),
            page_width_pt: std::env::var("PAGE_WIDTH_PT").ok().and_then(|v| v.parse().ok()).unwrap_or(default.page_width_pt),
            page_height_pt: std::env::var("PAGE_HEIGHT_PT").ok().and_then(|v| v.parse().ok()).unwrap_or(default.page_height_pt),
            title_font_size: std::env::var("TITLE_FONT_SIZE").ok().and_then(|v| v.parse().ok()).unwrap_or(default.title_font_size),
            title_margin_pt: std::env::var("TITLE_MARGIN_PT").ok().and_then(|v| v.parse().ok()).unwrap_or(default.title_margin_pt),
            download_folder: std::env::var("DOWNLOAD_FOLDER").unwrap_or(default.download_folder),
            combined_document_name: std::env::var("COMBINED_DOCUMENT_NAME").unwrap_or(default.combined_document_name),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
        }
    }

    /// 从 TOML 文件加载配置，缺省字段使用默认值
    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// 校验配置取值
    pub fn validate(&self) -> AppResult<()> {
        if self.max_concurrent_transforms == 0 {
            return Err(AppError::Config(ConfigError::InvalidValue {
                field: "max_concurrent_transforms".to_string(),
                reason: "必须大于 0".to_string(),
            }));
        }
        if self.page_width_pt <= 0.0 || self.page_height_pt <= 0.0 {
            return Err(AppError::Config(ConfigError::InvalidValue {
                field: "page_width_pt/page_height_pt".to_string(),
                reason: "页面尺寸必须为正数".to_string(),
            }));
        }
        Ok(())
    }
}
