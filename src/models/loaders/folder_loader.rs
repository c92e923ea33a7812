use crate::models::image::ImageSource;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// 扩展名到 MIME 类型的映射（只收录可解码的格式）
static EXTENSION_MIMES: phf::Map<&'static str, &'static str> = phf::phf_map! {
    "png" => "image/png",
    "jpg" => "image/jpeg",
    "jpeg" => "image/jpeg",
    "webp" => "image/webp",
};

/// 从磁盘读到的一张图片：字节 + 显示名称
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub src: ImageSource,
    pub display_name: String,
}

/// 根据扩展名推断 MIME 类型
pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    EXTENSION_MIMES.get(ext.as_str()).copied()
}

/// 加载单个图片文件
pub async fn load_image_file(path: &Path) -> Result<LoadedImage> {
    let mime_type = mime_for_path(path)
        .with_context(|| format!("不支持的图片格式: {}", path.display()))?;

    let bytes = fs::read(path)
        .await
        .with_context(|| format!("无法读取图片文件: {}", path.display()))?;

    let display_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    Ok(LoadedImage {
        src: ImageSource::new(bytes, mime_type),
        display_name,
    })
}

/// 从文件夹中加载所有图片，按文件名排序
///
/// 不支持的文件直接忽略，单个文件读取失败只记录警告。
pub async fn load_images_from_folder(folder_path: &str) -> Result<Vec<LoadedImage>> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        anyhow::bail!("文件夹不存在: {}", folder_path);
    }

    let mut paths = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .with_context(|| format!("无法读取文件夹: {}", folder_path))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if mime_for_path(&path).is_some() {
            paths.push(path);
        }
    }
    paths.sort();

    let mut images = Vec::with_capacity(paths.len());
    for path in paths {
        match load_image_file(&path).await {
            Ok(image) => {
                tracing::debug!("已加载: {} ({} 字节)", image.display_name, image.src.len());
                images.push(image);
            }
            Err(e) => {
                tracing::warn!("加载图片失败 {}: {:#}", path.display(), e);
            }
        }
    }

    tracing::info!("📁 从 {} 加载了 {} 张图片", folder_path, images.len());
    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "image_board_loader_{}_{}_{}",
            tag,
            std::process::id(),
            chrono::Local::now().timestamp_nanos_opt().unwrap_or_default()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_mime_for_path() {
        assert_eq!(mime_for_path(Path::new("a/b.PNG")), Some("image/png"));
        assert_eq!(mime_for_path(Path::new("photo.jpeg")), Some("image/jpeg"));
        assert_eq!(mime_for_path(Path::new("notes.txt")), None);
        assert_eq!(mime_for_path(Path::new("no_extension")), None);
    }

    #[tokio::test]
    async fn test_load_folder_sorted_and_filtered() {
        let dir = scratch_dir("folder");
        std::fs::write(dir.join("b.jpg"), [2u8]).unwrap();
        std::fs::write(dir.join("a.png"), [1u8]).unwrap();
        std::fs::write(dir.join("readme.txt"), b"skip").unwrap();

        let images = load_images_from_folder(dir.to_str().unwrap()).await.unwrap();

        let names: Vec<_> = images.iter().map(|i| i.display_name.as_str()).collect();
        assert_eq!(names, vec!["a.png", "b.jpg"]);
        assert_eq!(images[1].src.mime_type, "image/jpeg");
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_missing_folder_is_error() {
        let missing = scratch_dir("missing").join("nope");
        assert!(load_images_from_folder(missing.to_str().unwrap()).await.is_err());
    }
}
