use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// 源图片
///
/// 以 data URL 形式保存，克隆只复制引用计数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    data_url: Arc<str>,
}

impl SourceImage {
    pub fn from_data_url(data_url: impl Into<Arc<str>>) -> Self {
        Self {
            data_url: data_url.into(),
        }
    }

    pub fn data_url(&self) -> &str {
        &self.data_url
    }
}

/// 生成结果的不透明引用（data URL 或远程 URL）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_data_url(&self) -> bool {
        self.0.starts_with("data:")
    }
}

impl std::fmt::Display for ImageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // data URL 可能很长，只显示前缀
        if self.is_data_url() {
            let head: String = self.0.chars().take(32).collect();
            write!(f, "{}...", head)
        } else {
            write!(f, "{}", self.0)
        }
    }
}
