use crate::core::worker_pool::PoolSettings;
use crate::utils::error::{IdentifyError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_positive_number, validate_range, validate_required_field,
    validate_url, Validate,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

static ENV_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([^}]+)\}").expect("valid placeholder regex"));

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub ocr: OcrConfig,
    #[serde(default)]
    pub structuring: StructuringConfig,
    #[serde(default)]
    pub lookup: LookupConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub timeout_seconds: Option<u64>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://vision.googleapis.com".to_string(),
            api_key: None,
            timeout_seconds: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StructuringConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_seconds: Option<u64>,
}

impl Default for StructuringConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "gpt-4".to_string(),
            max_tokens: 200,
            temperature: 0.7,
            timeout_seconds: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    pub endpoint: String,
    pub user_agent: String,
    /// 跨請求的並發查詢上限，未設定表示不限制
    pub max_concurrent: Option<usize>,
    /// 單次查詢逾時，逾時視為該卡查無結果
    pub timeout_seconds: Option<u64>,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.scryfall.com".to_string(),
            user_agent: format!("mtg-card-identifier/{}", env!("CARGO_PKG_VERSION")),
            max_concurrent: None,
            timeout_seconds: None,
        }
    }
}

impl LookupConfig {
    pub fn pool_settings(&self) -> PoolSettings {
        PoolSettings {
            max_concurrent: self.max_concurrent,
            timeout: self.timeout_seconds.map(Duration::from_secs),
        }
    }
}

impl ServiceConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| IdentifyError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 只使用預設值與環境變數
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// 載入順序：TOML 檔 (可選) → 環境變數
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let mut config = Self::from_file(path)?;
                config.apply_env()?;
                Ok(config)
            }
            None => Self::from_env(),
        }
    }

    /// 替換環境變數 (例如 ${OPENAI_API_KEY})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        ENV_PLACEHOLDER
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .to_string()
    }

    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_with(|name| std::env::var(name).ok())
    }

    fn apply_env_with<F>(&mut self, get: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = get("SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = parse_var(&get, "PORT")? {
            self.server.port = port;
        }
        if let Some(limit) = parse_var(&get, "MAX_UPLOAD_BYTES")? {
            self.server.max_upload_bytes = limit;
        }

        if let Some(key) = get("GOOGLE_VISION_API_KEY") {
            self.ocr.api_key = Some(key);
        }
        if let Some(endpoint) = get("GOOGLE_VISION_ENDPOINT") {
            self.ocr.endpoint = endpoint;
        }

        if let Some(key) = get("OPENAI_API_KEY") {
            self.structuring.api_key = Some(key);
        }
        if let Some(endpoint) = get("OPENAI_ENDPOINT") {
            self.structuring.endpoint = endpoint;
        }
        if let Some(model) = get("OPENAI_MODEL") {
            self.structuring.model = model;
        }

        if let Some(endpoint) = get("SCRYFALL_ENDPOINT") {
            self.lookup.endpoint = endpoint;
        }
        if let Some(max) = parse_var(&get, "MAX_CONCURRENT_LOOKUPS")? {
            self.lookup.max_concurrent = Some(max);
        }
        if let Some(timeout) = parse_var(&get, "LOOKUP_TIMEOUT_SECONDS")? {
            self.lookup.timeout_seconds = Some(timeout);
        }

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_var<T, F>(get: &F, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match get(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| IdentifyError::InvalidConfigValueError {
                field: name.to_string(),
                value: raw.clone(),
                reason: e.to_string(),
            }),
        None => Ok(None),
    }
}

fn validate_api_key(field_name: &str, value: &Option<String>) -> Result<()> {
    let key = validate_required_field(field_name, value)?;
    validate_non_empty_string(field_name, key)?;

    // 環境變數未設定時 ${VAR} 會原樣留下
    if ENV_PLACEHOLDER.is_match(key) {
        return Err(IdentifyError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: key.clone(),
            reason: "Unresolved environment variable placeholder".to_string(),
        });
    }
    Ok(())
}

impl Validate for ServiceConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("server.host", &self.server.host)?;
        validate_range("server.port", self.server.port, 1, u16::MAX)?;
        validate_positive_number("server.max_upload_bytes", self.server.max_upload_bytes, 1)?;

        validate_url("ocr.endpoint", &self.ocr.endpoint)?;
        validate_api_key("ocr.api_key", &self.ocr.api_key)?;

        validate_url("structuring.endpoint", &self.structuring.endpoint)?;
        validate_api_key("structuring.api_key", &self.structuring.api_key)?;
        validate_non_empty_string("structuring.model", &self.structuring.model)?;
        validate_range("structuring.max_tokens", self.structuring.max_tokens, 1, 4096)?;
        validate_range("structuring.temperature", self.structuring.temperature, 0.0, 2.0)?;

        validate_url("lookup.endpoint", &self.lookup.endpoint)?;
        validate_non_empty_string("lookup.user_agent", &self.lookup.user_agent)?;
        if let Some(max) = self.lookup.max_concurrent {
            validate_positive_number("lookup.max_concurrent", max, 1)?;
        }
        if let Some(timeout) = self.lookup.timeout_seconds {
            validate_range("lookup.timeout_seconds", timeout, 1, 600)?;
        }

        tracing::info!("✅ Configuration validation passed");
        Ok(())
    }
}
