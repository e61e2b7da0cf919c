//! 结果写入服务 - 业务能力层
//!
//! 只负责"把生成结果和快照写到磁盘"的能力，不关心流程

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tokio::fs;
use tracing::debug;

use crate::models::{BatchSnapshot, ImageRef, Period};

/// 结果写入服务
///
/// 职责：
/// - 把单个年代的图像保存为 `{年代}.{扩展名}`
/// - data URL 直接解码，远程 URL 先下载
/// - 保存批次快照 `snapshot.json`
pub struct ImageWriter {
    dir: PathBuf,
    http: reqwest::Client,
}

impl ImageWriter {
    /// 创建写入服务，目录不存在时自动创建
    pub async fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("无法创建输出目录: {}", dir.display()))?;
        Ok(Self {
            dir,
            http: reqwest::Client::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 保存单个年代的图像
    ///
    /// # 返回
    /// 返回写入的文件路径
    pub async fn save(&self, period: Period, image: &ImageRef) -> Result<PathBuf> {
        let (bytes, ext) = if image.is_data_url() {
            decode_data_url(image.as_str())?
        } else {
            self.download(image.as_str()).await?
        };

        let path = self.dir.join(format!("{}.{}", period.label(), ext));
        fs::write(&path, &bytes)
            .await
            .with_context(|| format!("无法写入文件: {}", path.display()))?;

        debug!("已写入 {} ({} 字节)", path.display(), bytes.len());
        Ok(path)
    }

    /// 保存批次快照
    pub async fn write_snapshot(&self, snapshot: &BatchSnapshot) -> Result<PathBuf> {
        let path = self.dir.join("snapshot.json");
        let json = serde_json::to_string_pretty(snapshot)?;
        fs::write(&path, json)
            .await
            .with_context(|| format!("无法写入快照: {}", path.display()))?;
        Ok(path)
    }

    async fn download(&self, url: &str) -> Result<(Vec<u8>, &'static str)> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("下载图像失败: {}", url))?
            .error_for_status()
            .with_context(|| format!("下载图像失败: {}", url))?;

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response.bytes().await?.to_vec();
        let ext = content_type
            .as_deref()
            .and_then(extension_for_mime)
            .or_else(|| extension_from_url(url))
            .unwrap_or("png");

        Ok((bytes, ext))
    }
}

/// 解码 `data:{mime};base64,{payload}`
fn decode_data_url(url: &str) -> Result<(Vec<u8>, &'static str)> {
    let Some(rest) = url.strip_prefix("data:") else {
        bail!("不是 data URL");
    };
    let Some((meta, payload)) = rest.split_once(',') else {
        bail!("data URL 格式错误");
    };
    let Some(mime) = meta.strip_suffix(";base64") else {
        bail!("只支持 base64 编码的 data URL");
    };

    let bytes = STANDARD
        .decode(payload.trim())
        .context("data URL base64 解码失败")?;
    Ok((bytes, extension_for_mime(mime).unwrap_or("png")))
}

fn extension_for_mime(mime: &str) -> Option<&'static str> {
    let mime = mime.split(';').next()?.trim().to_lowercase();
    match mime.as_str() {
        "image/png" => Some("png"),
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}

fn extension_from_url(url: &str) -> Option<&'static str> {
    let path = url.split(['?', '#']).next()?;
    let ext = Path::new(path).extension()?.to_str()?;
    extension_for_mime(&format!("image/{}", ext.to_lowercase()))
}
