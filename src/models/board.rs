//! 画板状态
//!
//! 管理分组与图片的有序集合。所有操作都是同步、全函数的：
//! 未知 id 一律视为无操作，不会返回错误。

use std::collections::HashMap;

use tracing::{debug, warn};

use super::group::Group;
use super::image::{normalize_rotation, BoardImage, ImageSource};

/// 画板：拥有全部分组和图片
#[derive(Debug, Clone, Default)]
pub struct Board {
    groups: Vec<Group>,
    selection: HashMap<String, bool>,
    /// 第一个创建的分组，不可删除
    privileged_id: Option<String>,
    next_group_seq: u64,
    next_image_seq: u64,
}

impl Board {
    /// 创建空画板
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建画板并附带一个默认分组（即不可删除的首个分组）
    pub fn with_default_group() -> Self {
        let mut board = Self::new();
        board.add_group("");
        board
    }

    // ========== 查询 ==========

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn group(&self, group_id: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == group_id)
    }

    pub fn privileged_group_id(&self) -> Option<&str> {
        self.privileged_id.as_deref()
    }

    /// 画板上的图片总数
    pub fn image_count(&self) -> usize {
        self.groups.iter().map(Group::len).sum()
    }

    pub fn is_selected(&self, group_id: &str) -> bool {
        self.selection.get(group_id).copied().unwrap_or(false)
    }

    /// 至少有一个分组且全部被选中
    pub fn are_all_selected(&self) -> bool {
        !self.groups.is_empty() && self.groups.iter().all(|g| self.is_selected(&g.id))
    }

    /// 按画板顺序返回被选中分组的副本，供导出使用
    pub fn selected_groups(&self) -> Vec<Group> {
        self.groups
            .iter()
            .filter(|g| self.is_selected(&g.id))
            .cloned()
            .collect()
    }

    /// 生成一个带新 id 的图片
    pub fn import_image(&mut self, src: ImageSource, display_name: impl Into<String>) -> BoardImage {
        self.next_image_seq += 1;
        BoardImage::new(format!("image-{}", self.next_image_seq), src, display_name)
    }

    // ========== 分组操作 ==========

    /// 追加分组，返回新分组 id
    ///
    /// 标题为空时使用 "Group N"（N = 当前分组数 + 1）。
    pub fn add_group(&mut self, title: &str) -> String {
        self.next_group_seq += 1;
        let id = format!("group-{}", self.next_group_seq);
        let title = match title.trim() {
            "" => format!("Group {}", self.groups.len() + 1),
            t => t.to_string(),
        };

        self.groups.push(Group::new(id.clone(), title));
        self.selection.insert(id.clone(), false);
        if self.privileged_id.is_none() {
            self.privileged_id = Some(id.clone());
        }

        debug!("新增分组: {}", id);
        id
    }

    /// 删除分组及其选中状态；首个分组不可删除
    pub fn remove_group(&mut self, group_id: &str) {
        if self.privileged_id.as_deref() == Some(group_id) {
            debug!("忽略删除首个分组: {}", group_id);
            return;
        }
        let before = self.groups.len();
        self.groups.retain(|g| g.id != group_id);
        if self.groups.len() != before {
            self.selection.remove(group_id);
        }
    }

    /// 重命名分组，空白标题被忽略
    pub fn rename_group(&mut self, group_id: &str, title: &str) {
        let title = title.trim();
        if title.is_empty() {
            return;
        }
        if let Some(group) = self.group_mut(group_id) {
            group.title = title.to_string();
        }
    }

    pub fn set_export_flag(&mut self, group_id: &str, export_flag: bool) {
        if let Some(group) = self.group_mut(group_id) {
            group.export_flag = export_flag;
        }
    }

    /// 移动分组位置，目标位置超出范围时放到末尾
    pub fn move_group(&mut self, source_index: usize, dest_index: usize) {
        if source_index >= self.groups.len() {
            return;
        }
        let group = self.groups.remove(source_index);
        let dest_index = dest_index.min(self.groups.len());
        self.groups.insert(dest_index, group);
    }

    // ========== 图片操作 ==========

    /// 按顺序追加图片到分组末尾
    ///
    /// 与画板上已有 id 重复的图片会被跳过，保证 id 全局唯一。
    pub fn add_images(&mut self, group_id: &str, images: Vec<BoardImage>) {
        if self.group(group_id).is_none() {
            return;
        }
        for image in images {
            if self.contains_image(&image.id) {
                warn!("⚠️ 图片 id 重复，已跳过: {}", image.id);
                continue;
            }
            if let Some(group) = self.group_mut(group_id) {
                group.images.push(image);
            }
        }
    }

    pub fn remove_image(&mut self, group_id: &str, image_id: &str) {
        if let Some(group) = self.group_mut(group_id) {
            group.images.retain(|img| img.id != image_id);
        }
    }

    /// 设置角度为 `new_rotation mod 360`
    pub fn rotate_image(&mut self, group_id: &str, image_id: &str, new_rotation: f32) {
        if let Some(image) = self.image_mut(group_id, image_id) {
            image.rotation = normalize_rotation(new_rotation);
        }
    }

    /// 在当前角度上增加 `delta` 度，界面每次点击传入 90
    pub fn rotate_image_by(&mut self, group_id: &str, image_id: &str, delta: f32) {
        if let Some(image) = self.image_mut(group_id, image_id) {
            image.rotation = normalize_rotation(image.rotation + delta);
        }
    }

    /// 移动图片：先从源分组移除，再按移除后的状态插入目标位置
    ///
    /// 同一分组内的重新排序同样是"先删后插"，`dest_index` 以移除后的序列计算，
    /// 超出范围时放到末尾。
    pub fn move_image(
        &mut self,
        source_group_id: &str,
        dest_group_id: &str,
        image_id: &str,
        dest_index: usize,
    ) {
        if self.group(dest_group_id).is_none() {
            return;
        }
        let Some(source) = self.group_mut(source_group_id) else {
            return;
        };
        let Some(position) = source.position_of(image_id) else {
            return;
        };
        let image = source.images.remove(position);

        if let Some(dest) = self.group_mut(dest_group_id) {
            let index = dest_index.min(dest.images.len());
            dest.images.insert(index, image);
        }
    }

    // ========== 选择 ==========

    pub fn toggle_selection(&mut self, group_id: &str, selected: bool) {
        if let Some(entry) = self.selection.get_mut(group_id) {
            *entry = selected;
        }
    }

    pub fn toggle_all_selection(&mut self, selected: bool) {
        for entry in self.selection.values_mut() {
            *entry = selected;
        }
    }

    // ========== 内部辅助 ==========

    fn group_mut(&mut self, group_id: &str) -> Option<&mut Group> {
        self.groups.iter_mut().find(|g| g.id == group_id)
    }

    fn image_mut(&mut self, group_id: &str, image_id: &str) -> Option<&mut BoardImage> {
        self.group_mut(group_id)?
            .images
            .iter_mut()
            .find(|img| img.id == image_id)
    }

    fn contains_image(&self, image_id: &str) -> bool {
        self.groups
            .iter()
            .any(|g| g.images.iter().any(|img| img.id == image_id))
    }
}
