//! 文档输出 - 基础设施层
//!
//! 合成器只会"加页 / 放图 / 写字"，具体文档格式由 [`DocumentSink`] 决定。
//! 坐标系以页面左上角为原点，单位 pt。

use std::fmt;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream, StringFormat};

use crate::config::Config;
use crate::error::{AppError, AppResult};

/// 页面尺寸（pt）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    pub const A4: PageSize = PageSize {
        width: 595.28,
        height: 841.89,
    };

    pub fn from_config(config: &Config) -> Self {
        Self {
            width: config.page_width_pt,
            height: config.page_height_pt,
        }
    }
}

/// 图片在页面上的位置与尺寸
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// 已渲染的画布（JPEG 编码）
#[derive(Clone, PartialEq, Eq)]
pub struct RenderedImage {
    pub jpeg: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl fmt::Debug for RenderedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("jpeg_len", &self.jpeg.len())
            .finish()
    }
}

/// 文档输出端
pub trait DocumentSink: Send {
    fn add_page(&mut self);
    fn draw_image(&mut self, image: &RenderedImage, placement: Placement);
    fn draw_text(&mut self, text: &str, x: f32, y: f32);
    fn page_count(&self) -> usize;
    fn serialize(&mut self) -> AppResult<Vec<u8>>;
}

/// 文档工厂
pub trait DocumentFactory: Send + Sync {
    fn new_document(&self, page_size: PageSize) -> Box<dyn DocumentSink>;
}

// ========== PDF 实现 ==========

/// 单页内容：文字在图片之后输出，始终叠在图片上方
#[derive(Default)]
struct PdfPage {
    image_ops: Vec<Operation>,
    text_ops: Vec<Operation>,
    images: Vec<(String, RenderedImage)>,
}

impl PdfPage {
    fn operations(&self) -> Vec<Operation> {
        self.image_ops
            .iter()
            .chain(&self.text_ops)
            .cloned()
            .collect()
    }
}

/// 按 WinAnsi 编码文字；标准字体无法显示的字符替换为 `?`
fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match u32::from(c) {
            code @ (0x20..=0x7E | 0xA0..=0xFF) => code as u8,
            _ => b'?',
        })
        .collect()
}

/// 基于 lopdf 的 PDF 文档
pub struct PdfDocument {
    page_size: PageSize,
    font_size: f32,
    pages: Vec<PdfPage>,
}

impl PdfDocument {
    pub fn new(page_size: PageSize, font_size: f32) -> Self {
        Self {
            page_size,
            font_size,
            pages: Vec::new(),
        }
    }

    /// 当前页；还没有页面时自动补一页
    fn current_page(&mut self) -> &mut PdfPage {
        if self.pages.is_empty() {
            self.pages.push(PdfPage::default());
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn real(value: f32) -> Object {
        Object::from(value)
    }

    fn build(&self) -> AppResult<Document> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });

        let mut kids = Vec::with_capacity(self.pages.len());
        for page in &self.pages {
            let mut xobjects = Dictionary::new();
            for (name, image) in &page.images {
                let stream = Stream::new(
                    dictionary! {
                        "Type" => "XObject",
                        "Subtype" => "Image",
                        "Width" => image.width as i64,
                        "Height" => image.height as i64,
                        "ColorSpace" => "DeviceRGB",
                        "BitsPerComponent" => 8_i64,
                        "Filter" => "DCTDecode",
                    },
                    image.jpeg.clone(),
                )
                .with_compression(false);
                let image_id = doc.add_object(stream);
                xobjects.set(name.clone(), image_id);
            }

            let content = Content {
                operations: page.operations(),
            };
            let encoded = content.encode().map_err(AppError::serialize_failed)?;
            let content_id = doc.add_object(Stream::new(Dictionary::new(), encoded));

            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => dictionary! {
                    "Font" => dictionary! { "F1" => font_id },
                    "XObject" => xobjects,
                },
            });
            kids.push(Object::Reference(page_id));
        }

        let page_count = kids.len() as i64;
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Self::real(self.page_size.width),
                Self::real(self.page_size.height),
            ],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        Ok(doc)
    }
}

impl DocumentSink for PdfDocument {
    fn add_page(&mut self) {
        self.pages.push(PdfPage::default());
    }

    fn draw_image(&mut self, image: &RenderedImage, placement: Placement) {
        let page_height = self.page_size.height;
        let page = self.current_page();
        let name = format!("Im{}", page.images.len() + 1);
        // PDF 原点在左下角
        let pdf_y = page_height - placement.y - placement.height;

        page.image_ops.push(Operation::new("q", vec![]));
        page.image_ops.push(Operation::new(
            "cm",
            vec![
                Self::real(placement.width),
                Self::real(0.0),
                Self::real(0.0),
                Self::real(placement.height),
                Self::real(placement.x),
                Self::real(pdf_y),
            ],
        ));
        page.image_ops
            .push(Operation::new("Do", vec![Object::Name(name.as_bytes().to_vec())]));
        page.image_ops.push(Operation::new("Q", vec![]));
        page.images.push((name, image.clone()));
    }

    fn draw_text(&mut self, text: &str, x: f32, y: f32) {
        let page_height = self.page_size.height;
        let font_size = self.font_size;
        let page = self.current_page();

        page.text_ops.push(Operation::new("BT", vec![]));
        page.text_ops.push(Operation::new(
            "Tf",
            vec![Object::Name(b"F1".to_vec()), Self::real(font_size)],
        ));
        page.text_ops.push(Operation::new(
            "Td",
            vec![Self::real(x), Self::real(page_height - y)],
        ));
        page.text_ops.push(Operation::new(
            "Tj",
            vec![Object::String(encode_win_ansi(text), StringFormat::Literal)],
        ));
        page.text_ops.push(Operation::new("ET", vec![]));
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn serialize(&mut self) -> AppResult<Vec<u8>> {
        let mut doc = self.build()?;
        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).map_err(AppError::serialize_failed)?;
        Ok(buffer)
    }
}

/// PDF 文档工厂
#[derive(Debug, Clone)]
pub struct PdfDocumentFactory {
    font_size: f32,
}

impl PdfDocumentFactory {
    pub fn new(font_size: f32) -> Self {
        Self { font_size }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.title_font_size)
    }
}

impl DocumentFactory for PdfDocumentFactory {
    fn new_document(&self, page_size: PageSize) -> Box<dyn DocumentSink> {
        Box::new(PdfDocument::new(page_size, self.font_size))
    }
}
