//! 分组导出上下文
//!
//! 封装"我正在导出第几个分组"这一信息

use std::fmt::Display;

/// 分组导出上下文
#[derive(Debug, Clone)]
pub struct ExportCtx {
    /// 分组序号（从1开始，仅用于日志显示）
    pub group_index: usize,

    /// 本次导出的分组总数
    pub group_count: usize,

    /// 分组标题
    pub group_title: String,
}

impl ExportCtx {
    /// 创建新的导出上下文
    pub fn new(group_index: usize, group_count: usize, group_title: impl Into<String>) -> Self {
        Self {
            group_index,
            group_count,
            group_title: group_title.into(),
        }
    }
}

impl Display for ExportCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[分组 {}/{} 「{}」]",
            self.group_index, self.group_count, self.group_title
        )
    }
}
