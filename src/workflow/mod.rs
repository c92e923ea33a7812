pub mod export_ctx;
pub mod group_flow;

pub use export_ctx::ExportCtx;
pub use group_flow::{ComposedDocument, GroupFlow};
