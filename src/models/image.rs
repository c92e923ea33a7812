use std::fmt;
use std::sync::Arc;

/// MIME 类型到文件扩展名的映射
static MIME_EXTENSIONS: phf::Map<&'static str, &'static str> = phf::phf_map! {
    "image/png" => "png",
    "image/jpeg" => "jpg",
    "image/jpg" => "jpg",
    "image/webp" => "webp",
    "image/gif" => "gif",
    "image/bmp" => "bmp",
    "application/pdf" => "pdf",
};

/// 根据 MIME 类型获取扩展名
pub fn extension_for_mime(mime_type: &str) -> Option<&'static str> {
    MIME_EXTENSIONS
        .get(mime_type.trim().to_ascii_lowercase().as_str())
        .copied()
}

/// 图片字节来源
///
/// 字节内容不可变且可廉价克隆，移动/复制分组时不会拷贝像素数据。
#[derive(Clone, PartialEq, Eq)]
pub struct ImageSource {
    pub bytes: Arc<[u8]>,
    pub mime_type: String,
}

impl ImageSource {
    pub fn new(bytes: impl Into<Arc<[u8]>>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            mime_type: mime_type.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageSource")
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// 画板上的一张图片
#[derive(Debug, Clone, PartialEq)]
pub struct BoardImage {
    /// 在整个画板内唯一
    pub id: String,
    pub src: ImageSource,
    pub display_name: String,
    /// 角度，始终位于 [0, 360)
    pub rotation: f32,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub byte_size: Option<usize>,
}

impl BoardImage {
    /// 创建新图片，字节大小取自来源
    pub fn new(id: impl Into<String>, src: ImageSource, display_name: impl Into<String>) -> Self {
        let byte_size = Some(src.len());
        Self {
            id: id.into(),
            src,
            display_name: display_name.into(),
            rotation: 0.0,
            width: None,
            height: None,
            byte_size,
        }
    }

    /// 附带像素尺寸
    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// 设置角度（自动归一化）
    pub fn set_rotation(&mut self, degrees: f32) {
        self.rotation = normalize_rotation(degrees);
    }

    /// 用变换结果替换图片内容，保留 id 和角度
    pub fn with_replaced_source(&self, src: ImageSource) -> Self {
        let display_name = match extension_for_mime(&src.mime_type) {
            Some(ext) => replace_extension(&self.display_name, ext),
            None => self.display_name.clone(),
        };
        Self {
            id: self.id.clone(),
            byte_size: Some(src.len()),
            src,
            display_name,
            rotation: self.rotation,
            width: self.width,
            height: self.height,
        }
    }
}

/// 把角度归一化到 [0, 360)
pub fn normalize_rotation(degrees: f32) -> f32 {
    let normalized = degrees.rem_euclid(360.0);
    // rem_euclid 对极小的负数可能返回 360.0
    if normalized >= 360.0 {
        0.0
    } else {
        normalized
    }
}

/// 替换文件名扩展名，没有扩展名时直接追加
pub fn replace_extension(name: &str, extension: &str) -> String {
    let stem = match name.rfind('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    };
    format!("{}.{}", stem, extension)
}
