//! 文件能力 - 基础设施层
//!
//! 把平台提供的"保存对话框 / 目录选择 / 下载"抽象成 trait，
//! 平台是否支持交互式选择用 [`PlatformCapability`] 显式表达。

use std::fmt;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::{AppError, AppResult};

/// 交互式选择的结果：用户取消不是错误
#[derive(Debug)]
pub enum PickResult<T> {
    Picked(T),
    Cancelled,
}

/// 用户选定的单个文件
pub trait FileHandle: Send {
    fn write<'a>(&'a mut self, bytes: &'a [u8]) -> BoxFuture<'a, AppResult<()>>;
}

/// 用户授权的可写目录
pub trait DirectoryHandle: Send + Sync {
    /// 目录名称（用于日志和提示）
    fn name(&self) -> String;

    /// 在目录中创建或覆盖文件
    fn write<'a>(&'a self, name: &'a str, bytes: &'a [u8]) -> BoxFuture<'a, AppResult<()>>;
}

/// 平台的交互式选择器
pub trait FilePicker: Send + Sync {
    fn pick_save_file<'a>(
        &'a self,
        suggested_name: &'a str,
        mime_filter: &'a str,
    ) -> BoxFuture<'a, AppResult<PickResult<Box<dyn FileHandle>>>>;

    fn pick_directory(&self) -> BoxFuture<'_, AppResult<PickResult<Arc<dyn DirectoryHandle>>>>;
}

/// 下载兜底
pub trait DownloadSink: Send + Sync {
    fn trigger_download<'a>(&'a self, bytes: &'a [u8], filename: &'a str)
        -> BoxFuture<'a, AppResult<()>>;
}

/// 平台能力：要么支持交互式选择，要么不支持
#[derive(Clone)]
pub enum PlatformCapability {
    Supported(Arc<dyn FilePicker>),
    Unsupported,
}

impl PlatformCapability {
    pub fn is_supported(&self) -> bool {
        matches!(self, PlatformCapability::Supported(_))
    }
}

impl fmt::Debug for PlatformCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlatformCapability::Supported(_) => f.write_str("Supported"),
            PlatformCapability::Unsupported => f.write_str("Unsupported"),
        }
    }
}

// ========== 本地文件系统实现 ==========

/// 本地目录
#[derive(Debug, Clone)]
pub struct LocalDirectory {
    root: PathBuf,
}

impl LocalDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.root
    }
}

impl DirectoryHandle for LocalDirectory {
    fn name(&self) -> String {
        self.root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.root.display().to_string())
    }

    fn write<'a>(&'a self, name: &'a str, bytes: &'a [u8]) -> BoxFuture<'a, AppResult<()>> {
        Box::pin(async move {
            let path = self.root.join(name);
            debug!("写入文件: {}", path.display());
            tokio::fs::write(&path, bytes)
                .await
                .map_err(|e| AppError::write_failed(path.display().to_string(), e))
        })
    }
}

/// 本地文件
#[derive(Debug, Clone)]
pub struct LocalFile {
    path: PathBuf,
}

impl LocalFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl FileHandle for LocalFile {
    fn write<'a>(&'a mut self, bytes: &'a [u8]) -> BoxFuture<'a, AppResult<()>> {
        Box::pin(async move {
            tokio::fs::write(&self.path, bytes)
                .await
                .map_err(|e| AppError::write_failed(self.path.display().to_string(), e))
        })
    }
}

/// 下载目录：把"触发下载"落到一个固定文件夹
///
/// 与浏览器下载一致，从不覆盖已有文件：重名时依次尝试 `name (1).ext`、`name (2).ext`……
#[derive(Debug, Clone)]
pub struct DownloadFolder {
    folder: PathBuf,
}

impl DownloadFolder {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
        }
    }

    /// 第 `attempt` 次尝试使用的文件名，0 为原名
    fn candidate_name(filename: &str, attempt: usize) -> String {
        if attempt == 0 {
            return filename.to_string();
        }
        match filename.rfind('.') {
            Some(idx) if idx > 0 => {
                format!("{} ({}){}", &filename[..idx], attempt, &filename[idx..])
            }
            _ => format!("{} ({})", filename, attempt),
        }
    }

    /// 以 create_new 方式占用一个空闲文件名并写入，返回实际路径
    async fn write_new(&self, bytes: &[u8], filename: &str) -> AppResult<PathBuf> {
        let mut attempt = 0;
        loop {
            let path = self.folder.join(Self::candidate_name(filename, attempt));
            let opened = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await;

            match opened {
                Ok(mut file) => {
                    file.write_all(bytes)
                        .await
                        .map_err(|e| AppError::download_failed(filename, e))?;
                    file.flush()
                        .await
                        .map_err(|e| AppError::download_failed(filename, e))?;
                    return Ok(path);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => return Err(AppError::download_failed(filename, e)),
            }
        }
    }
}

impl DownloadSink for DownloadFolder {
    fn trigger_download<'a>(
        &'a self,
        bytes: &'a [u8],
        filename: &'a str,
    ) -> BoxFuture<'a, AppResult<()>> {
        Box::pin(async move {
            tokio::fs::create_dir_all(&self.folder)
                .await
                .map_err(|e| AppError::download_failed(filename, e))?;
            let path = self.write_new(bytes, filename).await?;
            debug!("下载到: {}", path.display());
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "image_board_export_{}_{}_{}",
            tag,
            std::process::id(),
            chrono::Local::now().timestamp_nanos_opt().unwrap_or_default()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_local_directory_create_then_overwrite() {
        let dir = scratch_dir("dir");
        let handle = LocalDirectory::new(&dir);

        assert_ok!(handle.write("a.pdf", b"first").await);
        assert_ok!(handle.write("a.pdf", b"second").await);

        assert_eq!(std::fs::read(dir.join("a.pdf")).unwrap(), b"second");
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_local_directory_missing_root_fails() {
        let handle = LocalDirectory::new(scratch_dir("missing").join("nope"));
        assert!(handle.write("a.pdf", b"x").await.is_err());
    }

    #[tokio::test]
    async fn test_download_folder_creates_folder() {
        let dir = scratch_dir("download").join("nested");
        let sink = DownloadFolder::new(&dir);

        assert_ok!(sink.trigger_download(b"pdf", "out.pdf").await);

        assert_eq!(std::fs::read(dir.join("out.pdf")).unwrap(), b"pdf");
    }

    #[tokio::test]
    async fn test_download_folder_never_overwrites() {
        let dir = scratch_dir("collide");
        let sink = DownloadFolder::new(&dir);

        assert_ok!(sink.trigger_download(b"first", "photo.png").await);
        assert_ok!(sink.trigger_download(b"second", "photo.png").await);
        assert_ok!(sink.trigger_download(b"third", "photo.png").await);
        assert_ok!(sink.trigger_download(b"plain", "README").await);
        assert_ok!(sink.trigger_download(b"plain2", "README").await);

        assert_eq!(std::fs::read(dir.join("photo.png")).unwrap(), b"first");
        assert_eq!(std::fs::read(dir.join("photo (1).png")).unwrap(), b"second");
        assert_eq!(std::fs::read(dir.join("photo (2).png")).unwrap(), b"third");
        assert_eq!(std::fs::read(dir.join("README (1)")).unwrap(), b"plain2");
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_candidate_name() {
        assert_eq!(DownloadFolder::candidate_name("a.pdf", 0), "a.pdf");
        assert_eq!(DownloadFolder::candidate_name("a.b.pdf", 2), "a.b (2).pdf");
        assert_eq!(DownloadFolder::candidate_name(".hidden", 1), ".hidden (1)");
    }

    #[tokio::test]
    async fn test_local_file_write() {
        let dir = scratch_dir("file");
        let mut file = LocalFile::new(dir.join("picked.pdf"));

        assert_ok!(file.write(b"abc").await);
        assert_eq!(std::fs::read(dir.join("picked.pdf")).unwrap(), b"abc");
    }

    #[test]
    fn test_capability_tag() {
        assert!(!PlatformCapability::Unsupported.is_supported());
        assert_eq!(format!("{:?}", PlatformCapability::Unsupported), "Unsupported");
    }
}
