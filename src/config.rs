use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 批量生成时同时运行的任务数量
    pub max_concurrent_jobs: usize,
    /// 生成结果输出目录
    pub output_dir: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,

    // --- 图像生成配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub image_model_name: String,
    /// 单次生成遇到暂时性错误时的最大尝试次数
    pub generation_max_attempts: u32,
    /// 重试间隔基数（毫秒），第 n 次重试等待 n 倍
    pub generation_retry_delay_ms: u64,

    // --- 摇晃手势配置 ---
    pub shake_velocity_threshold: f64,
    pub shake_cooldown_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 2,
            output_dir: "output".to_string(),
            verbose_logging: false,
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            image_model_name: "gemini-2.5-flash-image-preview".to_string(),
            generation_max_attempts: 3,
            generation_retry_delay_ms: 1000,
            shake_velocity_threshold: 1500.0,
            shake_cooldown_ms: 2000,
        }
    }
}

impl Config {
    /// 加载配置：`DECADE_CONFIG` 指向的 TOML 文件（可选）作为基础，环境变量覆盖
    pub fn load() -> Result<Self, ConfigError> {
        let base = match std::env::var("DECADE_CONFIG") {
            Ok(path) => Self::from_toml_file(path)?,
            Err(_) => Self::default(),
        };
        Ok(base.overlay_env())
    }

    /// 只从环境变量读取，缺失或无法解析的字段使用默认值
    pub fn from_env() -> Self {
        Self::default().overlay_env()
    }

    /// 从 TOML 文件读取，未出现的字段使用默认值
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::TomlParseFailed {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(config.normalized())
    }

    fn overlay_env(self) -> Self {
        Self {
            max_concurrent_jobs: env_parse("MAX_CONCURRENT_JOBS").unwrap_or(self.max_concurrent_jobs),
            output_dir: std::env::var("OUTPUT_DIR").unwrap_or(self.output_dir),
            verbose_logging: env_parse("VERBOSE_LOGGING").unwrap_or(self.verbose_logging),
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(self.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(self.llm_api_base_url),
            image_model_name: std::env::var("IMAGE_MODEL_NAME").unwrap_or(self.image_model_name),
            generation_max_attempts: env_parse("GENERATION_MAX_ATTEMPTS").unwrap_or(self.generation_max_attempts),
            generation_retry_delay_ms: env_parse("GENERATION_RETRY_DELAY_MS").unwrap_or(self.generation_retry_delay_ms),
            shake_velocity_threshold: env_parse("SHAKE_VELOCITY_THRESHOLD").unwrap_or(self.shake_velocity_threshold),
            shake_cooldown_ms: env_parse("SHAKE_COOLDOWN_MS").unwrap_or(self.shake_cooldown_ms),
        }
        .normalized()
    }

    fn normalized(mut self) -> Self {
        self.max_concurrent_jobs = self.max_concurrent_jobs.max(1);
        self.generation_max_attempts = self.generation_max_attempts.max(1);
        self
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}
