use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tokio::fs;

use crate::error::SourceImageError;
use crate::models::SourceImage;

/// 根据扩展名推断 MIME 类型
pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}

/// 从文件加载源图片并编码为 data URL
pub async fn load_source_image(path: &Path) -> Result<SourceImage, SourceImageError> {
    let mime = mime_for_path(path).ok_or_else(|| SourceImageError::UnsupportedFormat {
        path: path.to_path_buf(),
    })?;

    let bytes = fs::read(path)
        .await
        .map_err(|source| SourceImageError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;

    if bytes.is_empty() {
        return Err(SourceImageError::Empty {
            path: path.to_path_buf(),
        });
    }

    tracing::info!(
        "已加载源图片: {} ({} 字节)",
        path.file_name().unwrap_or_default().to_string_lossy(),
        bytes.len()
    );

    Ok(SourceImage::from_data_url(format!(
        "data:{};base64,{}",
        mime,
        STANDARD.encode(&bytes)
    )))
}
