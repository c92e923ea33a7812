//! 导出会话
//!
//! 持有用户授权的目录，直到显式清除。
//! 同一时间只有一个导出在跑，所以这里不需要额外加锁。

use std::fmt;
use std::sync::Arc;

use tracing::info;

use crate::error::{AppError, AppResult};
use crate::infrastructure::{DirectoryHandle, PickResult, PlatformCapability};

/// 导出会话
#[derive(Default, Clone)]
pub struct ExportSession {
    directory: Option<Arc<dyn DirectoryHandle>>,
}

impl ExportSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// 让用户选择目录
    ///
    /// 返回 `Ok(true)` 表示已持有目录，`Ok(false)` 表示用户取消；
    /// 平台不支持目录选择时返回配置错误。
    pub async fn acquire_directory(&mut self, capability: &PlatformCapability) -> AppResult<bool> {
        let picker = match capability {
            PlatformCapability::Supported(picker) => picker,
            PlatformCapability::Unsupported => {
                return Err(AppError::capability_unavailable("目录选择"));
            }
        };

        match picker.pick_directory().await? {
            PickResult::Picked(directory) => {
                info!("📂 已授权目录: {}", directory.name());
                self.directory = Some(directory);
                Ok(true)
            }
            PickResult::Cancelled => Ok(false),
        }
    }

    pub fn set_directory(&mut self, directory: Arc<dyn DirectoryHandle>) {
        self.directory = Some(directory);
    }

    pub fn clear_directory(&mut self) {
        if let Some(directory) = self.directory.take() {
            info!("已清除目录: {}", directory.name());
        }
    }

    pub fn directory(&self) -> Option<&Arc<dyn DirectoryHandle>> {
        self.directory.as_ref()
    }

    pub fn has_directory(&self) -> bool {
        self.directory.is_some()
    }
}

impl fmt::Debug for ExportSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportSession")
            .field("directory", &self.directory.as_ref().map(|d| d.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use crate::infrastructure::{FileHandle, FilePicker, LocalDirectory};
    use futures::future::BoxFuture;

    struct DirectoryPicker {
        cancel: bool,
    }

    impl FilePicker for DirectoryPicker {
        fn pick_save_file<'a>(
            &'a self,
            _suggested_name: &'a str,
            _mime_filter: &'a str,
        ) -> BoxFuture<'a, AppResult<PickResult<Box<dyn FileHandle>>>> {
            Box::pin(async { Ok(PickResult::Cancelled) })
        }

        fn pick_directory(
            &self,
        ) -> BoxFuture<'_, AppResult<PickResult<Arc<dyn DirectoryHandle>>>> {
            Box::pin(async move {
                if self.cancel {
                    return Ok(PickResult::Cancelled);
                }
                let directory: Arc<dyn DirectoryHandle> = Arc::new(LocalDirectory::new("exports"));
                Ok(PickResult::Picked(directory))
            })
        }
    }

    #[tokio::test]
    async fn test_acquire_and_clear() {
        let capability = PlatformCapability::Supported(Arc::new(DirectoryPicker { cancel: false }));
        let mut session = ExportSession::new();

        assert!(session.acquire_directory(&capability).await.unwrap());
        assert!(session.has_directory());
        assert_eq!(format!("{:?}", session), r#"ExportSession { directory: Some("exports") }"#);

        session.clear_directory();
        assert!(!session.has_directory());
    }

    #[tokio::test]
    async fn test_acquire_cancelled_keeps_previous() {
        let capability = PlatformCapability::Supported(Arc::new(DirectoryPicker { cancel: true }));
        let mut session = ExportSession::new();
        session.set_directory(Arc::new(LocalDirectory::new("old")));

        assert!(!session.acquire_directory(&capability).await.unwrap());
        assert_eq!(session.directory().map(|d| d.name()), Some("old".to_string()));
    }

    #[tokio::test]
    async fn test_acquire_unsupported_is_config_error() {
        let mut session = ExportSession::new();

        let err = session
            .acquire_directory(&PlatformCapability::Unsupported)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::Config(ConfigError::CapabilityUnavailable { .. })
        ));
    }
}
