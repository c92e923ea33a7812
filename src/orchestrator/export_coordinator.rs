//! 导出协调器 - 编排层
//!
//! ## 职责
//!
//! 接收选中的分组和导出选项，按决策表分派到对应流水线，
//! 汇总成功/失败/取消，最后给出唯一的一条提示。
//!
//! ## 设计特点
//!
//! - **互斥**：导出期间持有 processing 标志，重复请求直接返回 `Busy`
//! - **向下委托**：单个分组的处理交给 `workflow::GroupFlow`
//! - **失败隔离**：单个分组失败只计数，不影响其他分组

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::{
    DirectoryHandle, DocumentFactory, DownloadFolder, DownloadSink, GeminiTransformer,
    ImageTransformer, PdfDocumentFactory, PlatformCapability,
};
use crate::models::Group;
use crate::orchestrator::export_plan::{ExportOptions, ExportPipeline};
use crate::orchestrator::session::ExportSession;
use crate::services::{BackgroundRemover, DocumentComposer, PersistenceGateway, SaveOutcome};
use crate::utils::logging::{self, log_export_start, print_final_stats};
use crate::workflow::{ExportCtx, GroupFlow};

/// 导出结束后给用户的唯一提示
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    NoGroupSelected,
    Busy,
    NothingToDo,
    Success { count: usize },
    PartialSuccess { succeeded: usize, failed: usize },
    Cancelled,
    Failure { failed: usize },
}

impl Notification {
    /// 根据计数选出提示；什么都没产出时为 `NothingToDo`
    pub fn summarize(success: usize, failed: usize, cancelled: bool) -> Self {
        match (success, failed) {
            (0, 0) if cancelled => Notification::Cancelled,
            (0, 0) => Notification::NothingToDo,
            (0, failed) if failed > 0 => Notification::Failure { failed },
            (count, 0) => Notification::Success { count },
            (succeeded, failed) => Notification::PartialSuccess { succeeded, failed },
        }
    }
}

/// 导出报告
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    pub pipeline: ExportPipeline,
    pub success_count: usize,
    pub failure_count: usize,
    pub cancelled: bool,
    pub notification: Notification,
}

impl ExportReport {
    fn terminal(pipeline: ExportPipeline, notification: Notification) -> Self {
        Self {
            pipeline,
            success_count: 0,
            failure_count: 0,
            cancelled: false,
            notification,
        }
    }

    fn from_tally(pipeline: ExportPipeline, tally: ExportTally) -> Self {
        Self {
            pipeline,
            success_count: tally.success,
            failure_count: tally.failed,
            cancelled: tally.cancelled,
            notification: Notification::summarize(tally.success, tally.failed, tally.cancelled),
        }
    }
}

/// 导出计数
#[derive(Debug, Default)]
struct ExportTally {
    success: usize,
    failed: usize,
    cancelled: bool,
}

impl ExportTally {
    fn record(&mut self, ok: bool) {
        if ok {
            self.success += 1;
        } else {
            self.failed += 1;
        }
    }

    fn record_outcome(&mut self, outcome: SaveOutcome) {
        match outcome {
            SaveOutcome::Saved | SaveOutcome::Downloaded => self.success += 1,
            SaveOutcome::Cancelled => self.cancelled = true,
            SaveOutcome::Failed => self.failed += 1,
        }
    }
}

/// processing 标志的守卫，离开作用域时自动复位
struct ProcessingGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> ProcessingGuard<'a> {
    fn try_acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// 导出协调器
pub struct ExportCoordinator {
    flow: GroupFlow,
    persistence: PersistenceGateway,
    combined_name: String,
    processing: AtomicBool,
}

impl ExportCoordinator {
    /// 用已组装好的流程和持久化服务创建
    pub fn new(flow: GroupFlow, persistence: PersistenceGateway, config: &Config) -> Self {
        Self {
            flow,
            persistence,
            combined_name: config.combined_document_name.clone(),
            processing: AtomicBool::new(false),
        }
    }

    /// 注入外部协作者创建
    pub fn with_collaborators(
        config: &Config,
        transformer: Arc<dyn ImageTransformer>,
        factory: Arc<dyn DocumentFactory>,
        capability: PlatformCapability,
        downloads: Arc<dyn DownloadSink>,
    ) -> Self {
        let remover = Arc::new(BackgroundRemover::new(transformer, config));
        let composer = DocumentComposer::new(factory, config);
        let persistence = PersistenceGateway::new(capability, downloads);
        Self::new(GroupFlow::new(remover, composer), persistence, config)
    }

    /// 使用内置实现创建：HTTP 变换客户端 + PDF 输出 + 下载目录
    ///
    /// 同时按 `verbose_logging` 初始化日志（已初始化时不做任何事）。
    pub fn from_config(config: &Config, capability: PlatformCapability) -> AppResult<Self> {
        logging::init(config.verbose_logging);
        config.validate()?;
        let transformer: Arc<dyn ImageTransformer> = Arc::new(GeminiTransformer::new(config)?);
        let factory: Arc<dyn DocumentFactory> = Arc::new(PdfDocumentFactory::from_config(config));
        let downloads: Arc<dyn DownloadSink> = Arc::new(DownloadFolder::new(&config.download_folder));
        Ok(Self::with_collaborators(
            config,
            transformer,
            factory,
            capability,
            downloads,
        ))
    }

    pub fn persistence(&self) -> &PersistenceGateway {
        &self.persistence
    }

    /// 是否有导出正在进行
    pub fn is_processing(&self) -> bool {
        self.processing.load(Ordering::Acquire)
    }

    /// 导出选中的分组
    pub async fn export(
        &self,
        session: &ExportSession,
        groups: &[Group],
        options: ExportOptions,
    ) -> ExportReport {
        let pipeline = options.pipeline(session.has_directory());

        if groups.is_empty() {
            warn!("⚠️ 没有选中任何分组");
            return ExportReport::terminal(pipeline, Notification::NoGroupSelected);
        }

        let Some(_guard) = ProcessingGuard::try_acquire(&self.processing) else {
            warn!("⚠️ 已有导出正在进行，忽略本次请求");
            return ExportReport::terminal(pipeline, Notification::Busy);
        };

        let image_count = groups.iter().map(Group::len).sum();
        log_export_start(&format!("{:?}", pipeline), groups.len(), image_count);

        let remove_background = pipeline.removes_background();
        let tally = match (pipeline, session.directory()) {
            (ExportPipeline::NothingToDo, _) => {
                info!("没有勾选任何导出动作");
                return ExportReport::terminal(pipeline, Notification::NothingToDo);
            }
            (ExportPipeline::CleanedImagesOnly, _) => self.download_images(groups).await,
            (ExportPipeline::CleanedCombined | ExportPipeline::DirectCombined, Some(directory)) => {
                self.export_combined(groups, remove_background, directory.as_ref())
                    .await
            }
            (_, directory) => {
                self.export_per_group(groups, remove_background, directory)
                    .await
            }
        };

        print_final_stats(tally.success, tally.failed, tally.cancelled);
        ExportReport::from_tally(pipeline, tally)
    }

    // ========== 流水线 ==========

    /// 合并为一份文档，写入目录一次
    async fn export_combined(
        &self,
        groups: &[Group],
        remove_background: bool,
        directory: &dyn DirectoryHandle,
    ) -> ExportTally {
        let mut tally = ExportTally::default();
        let prepared = self.prepare_all(groups, remove_background).await;

        match self.flow.compose_combined(prepared).await {
            Ok(document) => {
                let saved = self
                    .persistence
                    .save_to_directory(&document.bytes, directory, &self.combined_name)
                    .await;
                tally.record(saved);
            }
            Err(e) => {
                error!("❌ 合并文档生成失败: {}", e);
                tally.failed += 1;
            }
        }
        tally
    }

    /// 每个分组单独生成文档：持有目录时写目录，否则交互式保存
    async fn export_per_group(
        &self,
        groups: &[Group],
        remove_background: bool,
        directory: Option<&Arc<dyn DirectoryHandle>>,
    ) -> ExportTally {
        let mut tally = ExportTally::default();

        for (index, group) in groups.iter().enumerate() {
            let ctx = ExportCtx::new(index + 1, groups.len(), &group.title);
            let prepared = self.flow.prepare(group, remove_background, &ctx).await;

            let document = match self.flow.compose_group(prepared, &ctx).await {
                Ok(document) if !document.is_empty() => document,
                Ok(_) => {
                    warn!("{} ⚠️ 文档为空，不保存", ctx);
                    tally.failed += 1;
                    continue;
                }
                Err(e) => {
                    error!("{} ❌ 文档生成失败: {}", ctx, e);
                    tally.failed += 1;
                    continue;
                }
            };

            match directory {
                Some(directory) => {
                    let saved = self
                        .persistence
                        .save_to_directory(&document.bytes, directory.as_ref(), &group.title)
                        .await;
                    tally.record(saved);
                }
                None => {
                    let outcome = self
                        .persistence
                        .save_interactive(&document.bytes, &group.title)
                        .await;
                    info!("{} 保存结果: {:?}", ctx, outcome);
                    tally.record_outcome(outcome);
                }
            }
        }
        tally
    }

    /// 只抠图，逐张下载
    async fn download_images(&self, groups: &[Group]) -> ExportTally {
        let mut tally = ExportTally::default();

        for (index, group) in groups.iter().enumerate() {
            let ctx = ExportCtx::new(index + 1, groups.len(), &group.title);
            let prepared = self.flow.prepare(group, true, &ctx).await;

            for image in &prepared.images {
                let downloaded = self.persistence.download_image(image).await;
                tally.record(downloaded);
            }
            info!("{} ⬇️ 图片下载完成", ctx);
        }
        tally
    }

    async fn prepare_all(&self, groups: &[Group], remove_background: bool) -> Vec<Group> {
        let mut prepared = Vec::with_capacity(groups.len());
        for (index, group) in groups.iter().enumerate() {
            let ctx = ExportCtx::new(index + 1, groups.len(), &group.title);
            prepared.push(self.flow.prepare(group, remove_background, &ctx).await);
        }
        prepared
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarize() {
        assert_eq!(Notification::summarize(3, 0, false), Notification::Success { count: 3 });
        assert_eq!(
            Notification::summarize(2, 1, false),
            Notification::PartialSuccess { succeeded: 2, failed: 1 }
        );
        assert_eq!(Notification::summarize(0, 2, true), Notification::Failure { failed: 2 });
        assert_eq!(Notification::summarize(0, 0, true), Notification::Cancelled);
        assert_eq!(Notification::summarize(1, 0, true), Notification::Success { count: 1 });
        assert_eq!(Notification::summarize(0, 0, false), Notification::NothingToDo);
    }

    #[test]
    fn test_guard_resets_flag() {
        let flag = AtomicBool::new(false);
        {
            let _guard = ProcessingGuard::try_acquire(&flag).unwrap();
            assert!(flag.load(Ordering::Acquire));
            assert!(ProcessingGuard::try_acquire(&flag).is_none());
        }
        assert!(!flag.load(Ordering::Acquire));
    }

    #[test]
    fn test_tally_ignores_cancel_in_counts() {
        let mut tally = ExportTally::default();
        tally.record_outcome(SaveOutcome::Saved);
        tally.record_outcome(SaveOutcome::Cancelled);
        tally.record_outcome(SaveOutcome::Failed);
        assert_eq!((tally.success, tally.failed, tally.cancelled), (1, 1, true));
    }

    #[test]
    fn test_from_config_rejects_invalid() {
        let config = Config {
            max_concurrent_transforms: 0,
            ..Default::default()
        };
        assert!(ExportCoordinator::from_config(&config, PlatformCapability::Unsupported).is_err());
    }
}
