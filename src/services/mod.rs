//! 业务能力层（Services）
//!
//! 每个服务只描述"我能做什么"，处理单张图片或单个分组，
//! 不关心批量导出的分支与统计。

pub mod background_remover;
pub mod document_composer;
pub mod persistence;

pub use background_remover::BackgroundRemover;
pub use document_composer::{placement, render_canvas, Document, DocumentComposer};
pub use persistence::{pdf_filename, sanitize_filename, PersistenceGateway, SaveOutcome};
