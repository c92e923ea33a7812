//! 文档合成服务 - 业务能力层
//!
//! 把分组内有序的图片排成多页文档：
//! 1. 解码像素
//! 2. 按角度旋转画布（90/270 度时宽高互换）
//! 3. 等比缩放到页面内并居中
//!
//! 单张图片失败只跳过那一页，文档照常生成。

use std::io::Cursor;
use std::sync::Arc;

use image::{imageops, DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use tracing::{debug, error};

use crate::config::Config;
use crate::error::{AppError, AppResult, ComposeError};
use crate::infrastructure::{DocumentFactory, DocumentSink, PageSize, Placement, RenderedImage};
use crate::models::image::normalize_rotation;
use crate::models::{BoardImage, Group};

/// 合成后的文档
pub type Document = Box<dyn DocumentSink>;

/// 文档合成服务
#[derive(Clone)]
pub struct DocumentComposer {
    factory: Arc<dyn DocumentFactory>,
    page_size: PageSize,
    title_margin: f32,
    title_font_size: f32,
}

impl DocumentComposer {
    /// 创建新的合成服务
    pub fn new(factory: Arc<dyn DocumentFactory>, config: &Config) -> Self {
        Self {
            factory,
            page_size: PageSize::from_config(config),
            title_margin: config.title_margin_pt,
            title_font_size: config.title_font_size,
        }
    }

    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    /// 单个分组合成一份文档：每张图片一页，空分组零页
    pub fn compose_group(&self, group: &Group) -> Document {
        let mut doc = self.factory.new_document(self.page_size);

        for (index, image) in group.images.iter().enumerate() {
            let Some(rendered) = self.render_or_skip(group, index, image) else {
                continue;
            };
            doc.add_page();
            self.draw(doc.as_mut(), &rendered);
        }

        debug!(
            "分组「{}」合成完成: {} 页 / {} 张",
            group.title,
            doc.page_count(),
            group.len()
        );
        doc
    }

    /// 多个分组合并为一份文档，每个分组前写入标题
    ///
    /// 第一个分组的标题与它的第一张图片共用一页；
    /// 之后每个分组的标题另起一页，图片各占一页。
    pub fn compose_combined(&self, groups: &[Group]) -> Document {
        let mut doc = self.factory.new_document(self.page_size);

        for (group_index, group) in groups.iter().enumerate() {
            doc.add_page();
            doc.draw_text(
                &group.title,
                self.title_margin,
                self.title_margin + self.title_font_size,
            );
            let mut share_title_page = group_index == 0;

            for (index, image) in group.images.iter().enumerate() {
                let Some(rendered) = self.render_or_skip(group, index, image) else {
                    continue;
                };
                if !share_title_page {
                    doc.add_page();
                }
                share_title_page = false;
                self.draw(doc.as_mut(), &rendered);
            }
        }

        debug!(
            "合并文档完成: {} 个分组, {} 页",
            groups.len(),
            doc.page_count()
        );
        doc
    }

    fn render_or_skip(&self, group: &Group, index: usize, image: &BoardImage) -> Option<RenderedImage> {
        match render_canvas(image) {
            Ok(rendered) => Some(rendered),
            Err(e) => {
                error!(
                    "[分组 {}] ❌ 第 {} 张图片 {} 渲染失败，已跳过: {}",
                    group.title,
                    index + 1,
                    image.display_name,
                    e
                );
                None
            }
        }
    }

    fn draw(&self, doc: &mut dyn DocumentSink, rendered: &RenderedImage) {
        let placement = placement(rendered.width, rendered.height, self.page_size);
        doc.draw_image(rendered, placement);
    }
}

// ========== 几何计算 ==========

/// 角度是否为直角，返回 0/90/180/270
fn right_angle(rotation: f32) -> Option<u32> {
    let r = normalize_rotation(rotation);
    for angle in [0u32, 90, 180, 270, 360] {
        if (r - angle as f32).abs() < 0.001 {
            return Some(angle % 360);
        }
    }
    None
}

/// 旋转后画布尺寸：90/270 度宽高互换，其余角度保持原尺寸
pub fn canvas_dimensions(width: u32, height: u32, rotation: f32) -> (u32, u32) {
    match right_angle(rotation) {
        Some(90) | Some(270) => (height, width),
        _ => (width, height),
    }
}

/// 等比缩放到页面内并居中
///
/// `scale = min(page_w / canvas_w, page_h / canvas_h)`
pub fn placement(canvas_width: u32, canvas_height: u32, page: PageSize) -> Placement {
    let canvas_width = canvas_width.max(1) as f32;
    let canvas_height = canvas_height.max(1) as f32;
    let scale = (page.width / canvas_width).min(page.height / canvas_height);
    let width = canvas_width * scale;
    let height = canvas_height * scale;

    Placement {
        x: (page.width - width) / 2.0,
        y: (page.height - height) / 2.0,
        width,
        height,
    }
}

// ========== 像素处理 ==========

/// 解码并按角度渲染画布，透明区域铺白后编码为 JPEG
pub fn render_canvas(image: &BoardImage) -> AppResult<RenderedImage> {
    let decoded = image::load_from_memory(&image.src.bytes)
        .map_err(|e| AppError::decode_failed(&image.id, e))?;

    let rotated = rotate_canvas(&decoded.to_rgba8(), image.rotation);
    let flattened = flatten_on_white(&rotated);
    let (width, height) = flattened.dimensions();

    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(flattened)
        .write_to(&mut buffer, ImageFormat::Jpeg)
        .map_err(|e| {
            AppError::Compose(ComposeError::EncodeFailed {
                image_id: image.id.clone(),
                source: Box::new(e),
            })
        })?;

    Ok(RenderedImage {
        jpeg: buffer.into_inner(),
        width,
        height,
    })
}

/// 以画布中心为轴旋转（顺时针为正）
fn rotate_canvas(source: &RgbaImage, rotation: f32) -> RgbaImage {
    match right_angle(rotation) {
        Some(0) => source.clone(),
        Some(90) => imageops::rotate90(source),
        Some(180) => imageops::rotate180(source),
        Some(270) => imageops::rotate270(source),
        _ => rotate_about_center(source, rotation),
    }
}

/// 任意角度：逆向映射 + 最近邻采样，画布尺寸不变，超出部分裁掉
fn rotate_about_center(source: &RgbaImage, rotation: f32) -> RgbaImage {
    let (width, height) = source.dimensions();
    let radians = normalize_rotation(rotation).to_radians();
    let (sin, cos) = radians.sin_cos();
    let cx = width as f32 / 2.0;
    let cy = height as f32 / 2.0;

    RgbaImage::from_fn(width, height, |x, y| {
        let dx = x as f32 + 0.5 - cx;
        let dy = y as f32 + 0.5 - cy;
        let src_x = dx * cos + dy * sin + cx;
        let src_y = -dx * sin + dy * cos + cy;

        if src_x >= 0.0 && src_y >= 0.0 && src_x < width as f32 && src_y < height as f32 {
            *source.get_pixel(src_x as u32, src_y as u32)
        } else {
            Rgba([0, 0, 0, 0])
        }
    })
}

fn flatten_on_white(source: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(source.width(), source.height(), |x, y| {
        let Rgba([r, g, b, a]) = *source.get_pixel(x, y);
        let alpha = u32::from(a);
        let blend = |c: u8| ((u32::from(c) * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    })
}
