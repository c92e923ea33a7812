//! 集成测试共用的内存实现
#![allow(dead_code)]

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use tokio::sync::Semaphore;

use image_board_export::error::{AppError, AppResult, TransformError};
use image_board_export::infrastructure::{
    DirectoryHandle, DocumentFactory, DocumentSink, DownloadSink, FileHandle, FilePicker,
    ImageTransformer, PageSize, PickResult, Placement, RenderedImage, TransformOutput,
};
use image_board_export::{Board, BoardImage, ImageSource};

pub type Files = Arc<Mutex<Vec<(String, Vec<u8>)>>>;

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba([40, 80, 120, 255])))
        .write_to(&mut buffer, ImageFormat::Png)
        .unwrap();
    buffer.into_inner()
}

pub fn jpeg_image(board: &mut Board, name: &str, width: u32, height: u32) -> BoardImage {
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::new_rgb8(width, height)
        .write_to(&mut buffer, ImageFormat::Jpeg)
        .unwrap();
    board.import_image(ImageSource::new(buffer.into_inner(), "image/jpeg"), name)
}

// ========== 变换服务 ==========

/// 原样返回字节并声明为 PNG；可选闸门用来卡住调用
#[derive(Default)]
pub struct FakeTransformer {
    pub calls: AtomicUsize,
    pub gate: Option<Arc<Semaphore>>,
    pub fail: bool,
}

impl FakeTransformer {
    pub fn gated(gate: Arc<Semaphore>) -> Self {
        Self {
            gate: Some(gate),
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ImageTransformer for FakeTransformer {
    fn transform<'a>(
        &'a self,
        bytes: &'a [u8],
        _mime_type: &'a str,
        _instruction: &'a str,
    ) -> BoxFuture<'a, AppResult<TransformOutput>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                let _permit = gate.acquire().await.ok();
            }
            if self.fail {
                return Err(AppError::Transform(TransformError::EmptyPayload));
            }
            Ok(TransformOutput {
                bytes: bytes.to_vec(),
                mime_type: "image/png".to_string(),
            })
        })
    }
}

// ========== 文件能力 ==========

#[derive(Default)]
pub struct MemoryDirectory {
    pub files: Files,
    pub fail: bool,
}

impl MemoryDirectory {
    pub fn names(&self) -> Vec<String> {
        self.files.lock().unwrap().iter().map(|(n, _)| n.clone()).collect()
    }
}

impl DirectoryHandle for MemoryDirectory {
    fn name(&self) -> String {
        "memory".to_string()
    }

    fn write<'a>(&'a self, name: &'a str, bytes: &'a [u8]) -> BoxFuture<'a, AppResult<()>> {
        Box::pin(async move {
            if self.fail {
                return Err(AppError::write_failed(name, "read-only"));
            }
            let mut files = self.files.lock().unwrap();
            files.retain(|(n, _)| n != name);
            files.push((name.to_string(), bytes.to_vec()));
            Ok(())
        })
    }
}

#[derive(Default)]
pub struct MemoryDownloads {
    pub files: Files,
}

impl MemoryDownloads {
    pub fn names(&self) -> Vec<String> {
        self.files.lock().unwrap().iter().map(|(n, _)| n.clone()).collect()
    }
}

impl DownloadSink for MemoryDownloads {
    fn trigger_download<'a>(
        &'a self,
        bytes: &'a [u8],
        filename: &'a str,
    ) -> BoxFuture<'a, AppResult<()>> {
        Box::pin(async move {
            self.files
                .lock()
                .unwrap()
                .push((filename.to_string(), bytes.to_vec()));
            Ok(())
        })
    }
}

struct MemoryFile {
    files: Files,
    name: String,
}

impl FileHandle for MemoryFile {
    fn write<'a>(&'a mut self, bytes: &'a [u8]) -> BoxFuture<'a, AppResult<()>> {
        Box::pin(async move {
            self.files
                .lock()
                .unwrap()
                .push((self.name.clone(), bytes.to_vec()));
            Ok(())
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerMode {
    Pick,
    Cancel,
    Error,
}

/// 按预设模式回应的选择器
pub struct ScriptedPicker {
    pub mode: PickerMode,
    pub saved: Files,
    pub directory: Arc<MemoryDirectory>,
}

impl ScriptedPicker {
    pub fn new(mode: PickerMode) -> Self {
        Self {
            mode,
            saved: Files::default(),
            directory: Arc::new(MemoryDirectory::default()),
        }
    }
}

impl FilePicker for ScriptedPicker {
    fn pick_save_file<'a>(
        &'a self,
        suggested_name: &'a str,
        _mime_filter: &'a str,
    ) -> BoxFuture<'a, AppResult<PickResult<Box<dyn FileHandle>>>> {
        Box::pin(async move {
            match self.mode {
                PickerMode::Pick => Ok(PickResult::Picked(Box::new(MemoryFile {
                    files: self.saved.clone(),
                    name: suggested_name.to_string(),
                }) as Box<dyn FileHandle>)),
                PickerMode::Cancel => Ok(PickResult::Cancelled),
                PickerMode::Error => Err(AppError::Other("picker unavailable".into())),
            }
        })
    }

    fn pick_directory(&self) -> BoxFuture<'_, AppResult<PickResult<Arc<dyn DirectoryHandle>>>> {
        Box::pin(async move {
            match self.mode {
                PickerMode::Pick => {
                    let directory: Arc<dyn DirectoryHandle> = self.directory.clone();
                    Ok(PickResult::Picked(directory))
                }
                PickerMode::Cancel => Ok(PickResult::Cancelled),
                PickerMode::Error => Err(AppError::Other("picker unavailable".into())),
            }
        })
    }
}

// ========== 文档输出 ==========

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    AddPage,
    Image { width: u32, height: u32 },
    Text(String),
}

/// 记录每份文档的绘制操作
#[derive(Default)]
pub struct RecordingFactory {
    pub documents: Arc<Mutex<Vec<Arc<Mutex<Vec<DrawOp>>>>>>,
}

impl RecordingFactory {
    pub fn document_ops(&self) -> Vec<Vec<DrawOp>> {
        self.documents
            .lock()
            .unwrap()
            .iter()
            .map(|ops| ops.lock().unwrap().clone())
            .collect()
    }
}

struct RecordingSink {
    ops: Arc<Mutex<Vec<DrawOp>>>,
    pages: usize,
}

impl DocumentSink for RecordingSink {
    fn add_page(&mut self) {
        self.pages += 1;
        self.ops.lock().unwrap().push(DrawOp::AddPage);
    }

    fn draw_image(&mut self, image: &RenderedImage, _placement: Placement) {
        self.ops.lock().unwrap().push(DrawOp::Image {
            width: image.width,
            height: image.height,
        });
    }

    fn draw_text(&mut self, text: &str, _x: f32, _y: f32) {
        self.ops.lock().unwrap().push(DrawOp::Text(text.to_string()));
    }

    fn page_count(&self) -> usize {
        self.pages
    }

    fn serialize(&mut self) -> AppResult<Vec<u8>> {
        Ok(format!("%PDF-recorded pages={}", self.pages).into_bytes())
    }
}

impl DocumentFactory for RecordingFactory {
    fn new_document(&self, _page_size: PageSize) -> Box<dyn DocumentSink> {
        let ops = Arc::new(Mutex::new(Vec::new()));
        self.documents.lock().unwrap().push(ops.clone());
        Box::new(RecordingSink { ops, pages: 0 })
    }
}
