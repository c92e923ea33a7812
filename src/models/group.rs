use super::image::BoardImage;

/// 图片分组，一个分组对应一份导出文档
///
/// 图片顺序即页面顺序。
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub id: String,
    pub title: String,
    pub images: Vec<BoardImage>,
    pub export_flag: bool,
}

impl Group {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            images: Vec::new(),
            export_flag: false,
        }
    }

    /// 按 id 查找图片位置
    pub fn position_of(&self, image_id: &str) -> Option<usize> {
        self.images.iter().position(|img| img.id == image_id)
    }

    pub fn image(&self, image_id: &str) -> Option<&BoardImage> {
        self.images.iter().find(|img| img.id == image_id)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}
