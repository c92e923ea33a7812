//! 基础设施层：只暴露能力，不包含业务流程

pub mod file_access;
pub mod pdf_sink;
pub mod transform_client;

pub use file_access::{
    DirectoryHandle, DownloadFolder, DownloadSink, FileHandle, FilePicker, LocalDirectory,
    LocalFile, PickResult, PlatformCapability,
};
pub use pdf_sink::{
    DocumentFactory, DocumentSink, PageSize, PdfDocument, PdfDocumentFactory, Placement,
    RenderedImage,
};
pub use transform_client::{GeminiTransformer, ImageTransformer, TransformOutput};
