//! 抠图服务 - 业务能力层
//!
//! 只负责"去除背景"能力：单张失败时回退原图，批量时保持下标一一对应。

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::infrastructure::ImageTransformer;
use crate::models::{BoardImage, Group, ImageSource};

/// 抠图服务
///
/// 职责：
/// - 调用外部变换服务去除背景
/// - 任何失败都返回原图，不向调用方抛错
/// - 批量调用受信号量限制并发数
pub struct BackgroundRemover {
    transformer: Arc<dyn ImageTransformer>,
    instruction: String,
    max_concurrent: usize,
}

impl BackgroundRemover {
    /// 创建新的抠图服务
    pub fn new(transformer: Arc<dyn ImageTransformer>, config: &Config) -> Self {
        Self {
            transformer,
            instruction: config.background_instruction.clone(),
            max_concurrent: config.max_concurrent_transforms.max(1),
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// 处理单张图片
    ///
    /// 成功时替换图片内容并修正扩展名；失败时原样返回。
    pub async fn remove_one(&self, image: &BoardImage) -> BoardImage {
        let result = self
            .transformer
            .transform(&image.src.bytes, &image.src.mime_type, &self.instruction)
            .await;

        match result {
            Ok(output) if !output.bytes.is_empty() => {
                debug!(
                    "✓ 抠图成功: {} ({} → {} 字节)",
                    image.display_name,
                    image.src.len(),
                    output.bytes.len()
                );
                image.with_replaced_source(ImageSource::new(output.bytes, output.mime_type))
            }
            Ok(_) => {
                warn!("⚠️ 抠图结果为空，保留原图: {}", image.display_name);
                image.clone()
            }
            Err(e) => {
                warn!("⚠️ 抠图失败，保留原图: {} ({})", image.display_name, e);
                image.clone()
            }
        }
    }

    /// 批量处理图片
    ///
    /// 返回值与输入长度相同，`output[i]` 总是对应 `input[i]`。
    pub async fn remove_batch(&self, images: &[BoardImage]) -> Vec<BoardImage> {
        if images.is_empty() {
            return Vec::new();
        }

        let semaphore = Semaphore::new(self.max_concurrent);
        let semaphore = &semaphore;

        let tasks = images.iter().map(|image| async move {
            // 信号量不会被关闭，acquire 失败时直接继续
            let _permit = semaphore.acquire().await.ok();
            self.remove_one(image).await
        });

        join_all(tasks).await
    }

    /// 处理整个分组，返回处理后的分组副本
    pub async fn remove_group(&self, group: &Group) -> Group {
        info!(
            "✂️ 分组「{}」开始抠图，共 {} 张，最大并发 {}",
            group.title,
            group.len(),
            self.max_concurrent
        );
        let mut processed = group.clone();
        processed.images = self.remove_batch(&group.images).await;
        processed
    }
}
