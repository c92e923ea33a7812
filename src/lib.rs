//! # Image Board Export
//!
//! 图片看板的核心：分组管理 + 批量抠图 + 合成多页文档 + 保存
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 只暴露能力，不包含流程
//! - `ImageTransformer` - 外部图像变换能力（`GeminiTransformer`）
//! - `FilePicker` / `DirectoryHandle` / `DownloadSink` - 文件能力
//! - `DocumentSink` - 文档输出能力（`PdfDocument`）
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单张图片或单个分组
//! - `BackgroundRemover` - 抠图能力（失败回退原图）
//! - `DocumentComposer` - 旋转、缩放、排版能力
//! - `PersistenceGateway` - 保存 / 写目录 / 下载能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个分组"的完整处理流程
//! - `ExportCtx` - 上下文封装（分组序号 + 标题）
//! - `GroupFlow` - 流程编排（抠图 → 合成 → 序列化）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/export_coordinator` - 导出协调器，管理互斥和统计
//! - `orchestrator/export_plan` - 导出决策表
//! - `orchestrator/session` - 导出会话（授权目录）
//!
//! 数据模型 `models/` 位于各层之下：`Board` 持有全部分组和图片。
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{PlatformCapability, TransformOutput};
pub use models::{Board, BoardImage, Group, ImageSource};
pub use orchestrator::{ExportCoordinator, ExportOptions, ExportPipeline, ExportReport, ExportSession, Notification};
pub use services::SaveOutcome;
pub use workflow::{ExportCtx, GroupFlow};
