//! 应用配置管理
//!
//! 启动时从配置文件加载一次，再用环境变量覆盖，随后显式注入应用状态。

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::AppError;

const DEFAULT_GROQ_URL: &str = "https://api.groq.com/openai/v1";
const DEFAULT_GROQ_MODEL: &str = "llama-3.3-70b-versatile";
const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

/// 获取配置文件路径
///
/// 优先使用 `DOCGEN_CONFIG`，否则为可执行文件同级目录下的 config.json。
fn get_config_path() -> PathBuf {
    if let Ok(path) = std::env::var("DOCGEN_CONFIG") {
        return PathBuf::from(path);
    }
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("config.json")
}

/// 单个 LLM 提供方的配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// API 密钥，为空时该提供方不启用
    #[serde(default)]
    pub api_key: String,

    /// API 基础 URL
    #[serde(default)]
    pub base_url: String,

    /// 默认模型
    #[serde(default)]
    pub default_model: String,

    /// 请求超时（秒）
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ProviderSettings {
    fn with_defaults(base_url: &str, model: &str) -> Self {
        Self {
            api_key: String::new(),
            base_url: base_url.to_string(),
            default_model: model.to_string(),
            timeout_secs: default_timeout_secs(),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    fn fill_blanks(&mut self, base_url: &str, model: &str) {
        if self.base_url.trim().is_empty() {
            self.base_url = base_url.to_string();
        }
        if self.default_model.trim().is_empty() {
            self.default_model = model.to_string();
        }
        if self.timeout_secs == 0 {
            self.timeout_secs = default_timeout_secs();
        }
    }
}

/// 应用配置结构体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,

    /// Groq 配置
    #[serde(default = "default_groq")]
    pub groq: ProviderSettings,

    /// Gemini 配置
    #[serde(default = "default_gemini")]
    pub gemini: ProviderSettings,

    /// 文件存储服务地址，未设置时不投递
    #[serde(default)]
    pub file_storage_url: Option<String>,

    /// 诊断回复中的哨兵标记
    #[serde(default = "default_diagnosis_marker")]
    pub diagnosis_marker: String,

    /// 诊断卡片更新使用的模型
    #[serde(default = "default_card_update_model")]
    pub card_update_model: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_groq() -> ProviderSettings {
    ProviderSettings::with_defaults(DEFAULT_GROQ_URL, DEFAULT_GROQ_MODEL)
}

fn default_gemini() -> ProviderSettings {
    ProviderSettings::with_defaults(DEFAULT_GEMINI_URL, DEFAULT_GEMINI_MODEL)
}

fn default_diagnosis_marker() -> String {
    "Answer:".to_string()
}

fn default_card_update_model() -> String {
    "qwen/qwen3-32b".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            groq: default_groq(),
            gemini: default_gemini(),
            file_storage_url: None,
            diagnosis_marker: default_diagnosis_marker(),
            card_update_model: default_card_update_model(),
        }
    }
}

impl AppConfig {
    /// 加载配置：`.env` → 配置文件 → 环境变量
    pub fn load() -> Result<Self, AppError> {
        dotenv::dotenv().ok();

        let path = get_config_path();
        let mut config = Self::from_file(&path)?;
        config.apply_env(|key| std::env::var(key).ok())?;

        info!(
            "Configuration loaded: groq={}, gemini={}, file_storage={}",
            config.groq.is_configured(),
            config.gemini.is_configured(),
            config.file_storage_url.is_some()
        );
        Ok(config)
    }

    /// 从文件加载，文件不存在时使用默认值
    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        if !path.exists() {
            warn!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("读取配置文件失败: {}", e)))?;
        Self::from_json(&content)
    }

    /// 解析 JSON 配置，空字段补默认值
    pub fn from_json(content: &str) -> Result<Self, AppError> {
        let mut config: Self = serde_json::from_str(content)
            .map_err(|e| AppError::Config(format!("解析配置文件失败: {}", e)))?;
        config.fill_blanks();
        Ok(config)
    }

    fn fill_blanks(&mut self) {
        self.groq.fill_blanks(DEFAULT_GROQ_URL, DEFAULT_GROQ_MODEL);
        self.gemini.fill_blanks(DEFAULT_GEMINI_URL, DEFAULT_GEMINI_MODEL);
        if self.diagnosis_marker.is_empty() {
            self.diagnosis_marker = default_diagnosis_marker();
        }
        if self
            .file_storage_url
            .as_deref()
            .is_some_and(|url| url.trim().is_empty())
        {
            self.file_storage_url = None;
        }
    }

    /// 用环境变量覆盖，`lookup` 便于测试注入
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("GROQ_API_KEY") {
            self.groq.api_key = v;
        }
        if let Some(v) = get("GROQ_API_URL") {
            self.groq.base_url = v;
        }
        if let Some(v) = get("GEMINI_API_KEY") {
            self.gemini.api_key = v;
        }
        if let Some(v) = get("GEMINI_API_URL") {
            self.gemini.base_url = v;
        }
        if let Some(v) = get("FILE_STORAGE_URL") {
            self.file_storage_url = Some(v);
        }
        if let Some(v) = get("DOCGEN_HOST") {
            self.host = v;
        }
        if let Some(v) = get("DOCGEN_PORT") {
            self.port = v
                .trim()
                .parse()
                .map_err(|_| AppError::Config(format!("DOCGEN_PORT 无效: {}", v)))?;
        }

        self.fill_blanks();
        Ok(())
    }

    /// 监听地址
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
