//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责一次导出的调度和统计，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `export_plan` - 导出决策表
//! - 三个开关 → 有名字的流水线
//!
//! ### `session` - 导出会话
//! - 持有用户授权的目录，直到显式清除
//!
//! ### `export_coordinator` - 导出协调器
//! - 空选择、重复导出的前置检查
//! - 按流水线分派
//! - 汇总计数并给出唯一提示
//!
//! ## 层次关系
//!
//! ```text
//! export_coordinator (处理 Vec<Group>)
//!     ↓
//! workflow::GroupFlow (处理单个 Group)
//!     ↓
//! services (能力层：抠图 / 合成 / 持久化)
//!     ↓
//! infrastructure (基础设施：变换客户端 / 文件能力 / PDF 输出)
//! ```

pub mod export_coordinator;
pub mod export_plan;
pub mod session;

// 重新导出主要类型
pub use export_coordinator::{ExportCoordinator, ExportReport, Notification};
pub use export_plan::{ExportOptions, ExportPipeline};
pub use session::ExportSession;
