//! 分组处理流程 - 流程层
//!
//! 核心职责：定义"一个分组"从原图到文档字节的完整流程
//!
//! 流程顺序：
//! 1. （可选）抠图
//! 2. 合成文档（放在阻塞线程池里做解码和编码）
//! 3. 序列化为字节

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::models::Group;
use crate::services::{BackgroundRemover, DocumentComposer};
use crate::workflow::export_ctx::ExportCtx;

/// 合成好的文档
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedDocument {
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

impl ComposedDocument {
    pub fn is_empty(&self) -> bool {
        self.page_count == 0
    }
}

/// 分组处理流程
///
/// - 决定是否抠图
/// - 把 CPU 密集的合成工作挪出异步线程
/// - 不关心文档写到哪里
#[derive(Clone)]
pub struct GroupFlow {
    remover: Arc<BackgroundRemover>,
    composer: DocumentComposer,
}

impl GroupFlow {
    /// 创建新的分组处理流程
    pub fn new(remover: Arc<BackgroundRemover>, composer: DocumentComposer) -> Self {
        Self { remover, composer }
    }

    /// 准备分组：需要时抠图，否则原样返回
    pub async fn prepare(&self, group: &Group, remove_background: bool, ctx: &ExportCtx) -> Group {
        if !remove_background {
            return group.clone();
        }

        info!("{} ✂️ 开始抠图，共 {} 张", ctx, group.len());
        let processed = self.remover.remove_group(group).await;

        let replaced = processed
            .images
            .iter()
            .zip(&group.images)
            .filter(|(after, before)| after.src != before.src)
            .count();
        info!("{} ✓ 抠图完成 {}/{}", ctx, replaced, group.len());
        processed
    }

    /// 单个分组合成一份文档
    pub async fn compose_group(&self, group: Group, ctx: &ExportCtx) -> AppResult<ComposedDocument> {
        let composer = self.composer.clone();
        let document = run_blocking(move || {
            let mut doc = composer.compose_group(&group);
            let page_count = doc.page_count();
            let bytes = doc.serialize()?;
            Ok(ComposedDocument { bytes, page_count })
        })
        .await?;

        if document.is_empty() {
            warn!("{} ⚠️ 没有可用的页面", ctx);
        } else {
            info!("{} 📄 合成完成，共 {} 页", ctx, document.page_count);
        }
        Ok(document)
    }

    /// 多个分组合并为一份文档
    pub async fn compose_combined(&self, groups: Vec<Group>) -> AppResult<ComposedDocument> {
        let composer = self.composer.clone();
        let group_count = groups.len();
        let document = run_blocking(move || {
            let mut doc = composer.compose_combined(&groups);
            let page_count = doc.page_count();
            let bytes = doc.serialize()?;
            Ok(ComposedDocument { bytes, page_count })
        })
        .await?;

        info!(
            "📚 合并文档完成: {} 个分组, {} 页",
            group_count, document.page_count
        );
        Ok(document)
    }
}

async fn run_blocking<F>(task: F) -> AppResult<ComposedDocument>
where
    F: FnOnce() -> AppResult<ComposedDocument> + Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| AppError::Other(format!("合成任务异常退出: {}", e)))?
}
