//! 持久化服务 - 业务能力层
//!
//! 把文档字节落到用户手里，三条路径：
//! - 交互式保存（平台支持时弹出保存框）
//! - 直接写入已授权目录
//! - 下载兜底
//!
//! 用户取消不是错误，也不会触发兜底下载。

use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::{debug, error, info, warn};

use crate::infrastructure::{DirectoryHandle, DownloadSink, PickResult, PlatformCapability};
use crate::models::BoardImage;

/// 文档的 MIME 类型
pub const PDF_MIME: &str = "application/pdf";

/// 文件名中不允许出现的字符（常量模式）
static FORBIDDEN_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[/\\?%*:|"<>]"#).expect("文件名字符模式合法"));

/// 交互式保存的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// 写入了用户选定的文件
    Saved,
    /// 走了下载兜底
    Downloaded,
    /// 用户取消
    Cancelled,
    /// 兜底下载也失败
    Failed,
}

impl SaveOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SaveOutcome::Saved | SaveOutcome::Downloaded)
    }
}

/// 替换非法字符为 `-`，结果再次清洗不变
pub fn sanitize_filename(name: &str) -> String {
    FORBIDDEN_CHARS.replace_all(name, "-").into_owned()
}

/// 文档文件名：`{清洗后的名称}.pdf`
pub fn pdf_filename(name: &str) -> String {
    format!("{}.pdf", sanitize_filename(name))
}

/// 持久化服务
#[derive(Clone)]
pub struct PersistenceGateway {
    capability: PlatformCapability,
    downloads: Arc<dyn DownloadSink>,
}

impl PersistenceGateway {
    /// 创建新的持久化服务
    pub fn new(capability: PlatformCapability, downloads: Arc<dyn DownloadSink>) -> Self {
        Self {
            capability,
            downloads,
        }
    }

    pub fn capability(&self) -> &PlatformCapability {
        &self.capability
    }

    /// 交互式保存
    ///
    /// - 平台不支持 → 下载
    /// - 用户取消 → `Cancelled`
    /// - 选择器或写入出错 → 下载
    pub async fn save_interactive(&self, bytes: &[u8], suggested_name: &str) -> SaveOutcome {
        let filename = pdf_filename(suggested_name);

        let picker = match &self.capability {
            PlatformCapability::Supported(picker) => picker.clone(),
            PlatformCapability::Unsupported => {
                debug!("平台不支持保存对话框，直接下载: {}", filename);
                return self.download_or_fail(bytes, &filename).await;
            }
        };

        match picker.pick_save_file(&filename, PDF_MIME).await {
            Ok(PickResult::Picked(mut file)) => match file.write(bytes).await {
                Ok(()) => {
                    info!("💾 已保存: {}", filename);
                    SaveOutcome::Saved
                }
                Err(e) => {
                    warn!("⚠️ 写入所选文件失败，改为下载 {}: {}", filename, e);
                    self.download_or_fail(bytes, &filename).await
                }
            },
            Ok(PickResult::Cancelled) => {
                info!("用户取消保存: {}", filename);
                SaveOutcome::Cancelled
            }
            Err(e) => {
                warn!("⚠️ 保存对话框出错，改为下载 {}: {}", filename, e);
                self.download_or_fail(bytes, &filename).await
            }
        }
    }

    /// 触发下载
    pub async fn trigger_download(&self, bytes: &[u8], filename: &str) -> bool {
        match self.downloads.trigger_download(bytes, filename).await {
            Ok(()) => {
                debug!("⬇️ 已下载: {}", filename);
                true
            }
            Err(e) => {
                error!("❌ 下载失败 {}: {}", filename, e);
                false
            }
        }
    }

    /// 写入已授权目录，文件存在时覆盖；不会抛错
    pub async fn save_to_directory(
        &self,
        bytes: &[u8],
        directory: &dyn DirectoryHandle,
        name: &str,
    ) -> bool {
        let filename = pdf_filename(name);
        match directory.write(&filename, bytes).await {
            Ok(()) => {
                info!("💾 已写入 {}/{}", directory.name(), filename);
                true
            }
            Err(e) => {
                error!("❌ 写入 {}/{} 失败: {}", directory.name(), filename, e);
                false
            }
        }
    }

    /// 单独下载一张图片（仅抠图、不生成文档时使用）
    pub async fn download_image(&self, image: &BoardImage) -> bool {
        let filename = sanitize_filename(&image.display_name);
        self.trigger_download(&image.src.bytes, &filename).await
    }

    async fn download_or_fail(&self, bytes: &[u8], filename: &str) -> SaveOutcome {
        if self.trigger_download(bytes, filename).await {
            SaveOutcome::Downloaded
        } else {
            SaveOutcome::Failed
        }
    }
}
