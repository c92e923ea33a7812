//! 导出决策表
//!
//! 把 (是否抠图, 是否生成文档, 是否合并到单一位置) 三个开关
//! 映射成一个有名字的流水线，编排层只需要按流水线分派。

/// 导出流水线
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportPipeline {
    /// 抠图后合并成一份文档写入目录
    CleanedCombined,
    /// 抠图后每个分组单独保存
    CleanedPerGroup,
    /// 原图合并成一份文档写入目录
    DirectCombined,
    /// 原图每个分组单独保存
    DirectPerGroup,
    /// 只抠图，逐张下载
    CleanedImagesOnly,
    /// 什么都不做
    NothingToDo,
}

impl ExportPipeline {
    /// 决策表
    ///
    /// `combined` 只有在"单一位置"且已持有目录时才为真。
    pub fn select(remove_background: bool, make_document: bool, combined: bool) -> Self {
        match (remove_background, make_document, combined) {
            (true, true, true) => ExportPipeline::CleanedCombined,
            (true, true, false) => ExportPipeline::CleanedPerGroup,
            (false, true, true) => ExportPipeline::DirectCombined,
            (false, true, false) => ExportPipeline::DirectPerGroup,
            (true, false, true) => ExportPipeline::CleanedImagesOnly,
            (true, false, false) => ExportPipeline::CleanedImagesOnly,
            (false, false, true) => ExportPipeline::NothingToDo,
            (false, false, false) => ExportPipeline::NothingToDo,
        }
    }

    pub fn removes_background(&self) -> bool {
        matches!(
            self,
            ExportPipeline::CleanedCombined
                | ExportPipeline::CleanedPerGroup
                | ExportPipeline::CleanedImagesOnly
        )
    }

    pub fn is_combined(&self) -> bool {
        matches!(
            self,
            ExportPipeline::CleanedCombined | ExportPipeline::DirectCombined
        )
    }
}

/// 用户勾选的导出选项
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExportOptions {
    pub remove_background: bool,
    pub make_document: bool,
    pub single_location: bool,
}

impl ExportOptions {
    pub fn new(remove_background: bool, make_document: bool, single_location: bool) -> Self {
        Self {
            remove_background,
            make_document,
            single_location,
        }
    }

    /// 结合会话是否持有目录，选出流水线
    pub fn pipeline(&self, has_directory: bool) -> ExportPipeline {
        ExportPipeline::select(
            self.remove_background,
            self.make_document,
            self.single_location && has_directory,
        )
    }
}
