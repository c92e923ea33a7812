use std::fmt;

pub type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// 应用程序错误类型
#[derive(Debug)]
pub enum AppError {
    /// 图像变换服务错误（抠图失败，可回退到原图）
    Transform(TransformError),
    /// 文档合成错误（单张图片无法加载或渲染）
    Compose(ComposeError),
    /// 持久化错误（写入目录或下载失败）
    Persistence(PersistenceError),
    /// 文件读取错误
    File(FileError),
    /// 配置错误（缺少能力或配置值非法）
    Config(ConfigError),
    /// 其他错误（用于包装第三方库错误）
    Other(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Transform(e) => write!(f, "图像变换错误: {}", e),
            AppError::Compose(e) => write!(f, "文档合成错误: {}", e),
            AppError::Persistence(e) => write!(f, "保存错误: {}", e),
            AppError::File(e) => write!(f, "文件错误: {}", e),
            AppError::Config(e) => write!(f, "配置错误: {}", e),
            AppError::Other(msg) => write!(f, "错误: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Transform(e) => Some(e),
            AppError::Compose(e) => Some(e),
            AppError::Persistence(e) => Some(e),
            AppError::File(e) => Some(e),
            AppError::Config(e) => Some(e),
            AppError::Other(_) => None,
        }
    }
}

/// 图像变换服务错误
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    /// 网络请求失败
    #[error("请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: BoxedSource,
    },
    /// 服务返回非成功状态
    #[error("服务返回错误状态 {status}: {body}")]
    BadStatus { status: u16, body: String },
    /// 响应中没有图像数据
    #[error("响应中没有图像数据")]
    EmptyPayload,
    /// 响应格式无法解析
    #[error("响应格式错误: {source}")]
    MalformedResponse {
        #[source]
        source: BoxedSource,
    },
}

/// 文档合成错误
#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    /// 图片解码失败
    #[error("图片 {image_id} 解码失败: {source}")]
    DecodeFailed {
        image_id: String,
        #[source]
        source: BoxedSource,
    },
    /// 画布编码失败
    #[error("图片 {image_id} 编码失败: {source}")]
    EncodeFailed {
        image_id: String,
        #[source]
        source: BoxedSource,
    },
    /// 文档序列化失败
    #[error("文档序列化失败: {source}")]
    SerializeFailed {
        #[source]
        source: BoxedSource,
    },
}

/// 持久化错误
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    /// 写入目录失败
    #[error("写入 {name} 失败: {source}")]
    WriteFailed {
        name: String,
        #[source]
        source: BoxedSource,
    },
    /// 下载兜底失败
    #[error("下载 {filename} 失败: {source}")]
    DownloadFailed {
        filename: String,
        #[source]
        source: BoxedSource,
    },
}

/// 文件操作错误
#[derive(Debug, thiserror::Error)]
pub enum FileError {
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: BoxedSource,
    },
}

/// 配置错误
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 平台不提供所需能力（例如目录选择）
    #[error("平台不支持所需能力: {capability}")]
    CapabilityUnavailable { capability: String },
    /// 配置值非法
    #[error("配置项 {field} 非法: {reason}")]
    InvalidValue { field: String, reason: String },
    /// 配置文件解析失败
    #[error("配置文件解析失败: {source}")]
    ParseFailed {
        #[source]
        source: BoxedSource,
    },
}

// ========== 从常见错误类型转换 ==========

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Transform(TransformError::MalformedResponse {
            source: Box::new(err),
        })
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::Config(ConfigError::ParseFailed {
            source: Box::new(err),
        })
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: String::new(),
            source: Box::new(err),
        })
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建变换请求失败错误
    pub fn transform_request_failed(
        endpoint: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Transform(TransformError::RequestFailed {
            endpoint: endpoint.into(),
            source: Box::new(source),
        })
    }

    /// 创建图片解码失败错误
    pub fn decode_failed(
        image_id: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Compose(ComposeError::DecodeFailed {
            image_id: image_id.into(),
            source: Box::new(source),
        })
    }

    /// 创建文档序列化错误
    pub fn serialize_failed(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        AppError::Compose(ComposeError::SerializeFailed {
            source: Box::new(source),
        })
    }

    /// 创建写入失败错误
    pub fn write_failed(name: impl Into<String>, source: impl Into<BoxedSource>) -> Self {
        AppError::Persistence(PersistenceError::WriteFailed {
            name: name.into(),
            source: source.into(),
        })
    }

    /// 创建下载失败错误
    pub fn download_failed(filename: impl Into<String>, source: impl Into<BoxedSource>) -> Self {
        AppError::Persistence(PersistenceError::DownloadFailed {
            filename: filename.into(),
            source: source.into(),
        })
    }

    /// 创建文件读取错误
    pub fn file_read_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建能力缺失错误
    pub fn capability_unavailable(capability: impl Into<String>) -> Self {
        AppError::Config(ConfigError::CapabilityUnavailable {
            capability: capability.into(),
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
