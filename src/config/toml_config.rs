use crate::utils::error::{Result, SearchError};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

pub const SAM_GOV_API_KEY_ENV: &str = "SAM_GOV_API_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub server: ServerConfig,
    pub search: SearchConfig,
    pub sam_gov: SamGovConfig,
    pub fpds: FpdsConfig,
    pub municipal: MunicipalConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:3000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// 來源失敗時以示範資料替代
    pub demo_fallback: bool,
    /// 未設定時使用 HTTP client 預設值
    pub timeout_seconds: Option<u64>,
    pub max_results_per_platform: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            demo_fallback: true,
            timeout_seconds: None,
            max_results_per_platform: 25,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamGovConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub default_window_days: i64,
}

impl Default for SamGovConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.sam.gov/opportunities/v2/search".to_string(),
            api_key: None,
            default_window_days: 30,
        }
    }
}

impl SamGovConfig {
    /// 設定檔的值優先；未替換的 `${VAR}` 視為未設定，再退回環境變數
    pub fn resolved_api_key(&self) -> Option<String> {
        let configured = self
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty() && !key.starts_with("${"));

        match configured {
            Some(key) => Some(key.to_string()),
            None => std::env::var(SAM_GOV_API_KEY_ENV)
                .ok()
                .map(|key| key.trim().to_string())
                .filter(|key| !key.is_empty()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FpdsConfig {
    pub endpoint: String,
    pub feed: String,
}

impl Default for FpdsConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://www.fpds.gov/ezsearch/FEEDS/ATOM".to_string(),
            feed: "PUBLIC".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MunicipalConfig {
    pub enabled: bool,
    pub name: String,
    pub endpoint: String,
    /// 記錄沒有 url 欄位時使用的入口網址
    pub portal_url: Option<String>,
    pub date_field: String,
    pub app_token: Option<String>,
    /// 來源欄位 → 正規化欄位 (id/title/description/agency/postedDate/url/dueDate)
    pub field_mapping: HashMap<String, String>,
}

impl Default for MunicipalConfig {
    fn default() -> Self {
        let field_mapping = [
            ("purchase_order_contract_number", "id"),
            ("purchase_order_description", "title"),
            ("specification_number", "description"),
            ("department", "agency"),
            ("start_date", "postedDate"),
            ("end_date", "dueDate"),
            ("contract_pdf", "url"),
        ]
        .into_iter()
        .map(|(source, target)| (source.to_string(), target.to_string()))
        .collect();

        Self {
            enabled: false,
            name: "City of Chicago Contracts".to_string(),
            endpoint: "https://data.cityofchicago.org/resource/rsxa-ify5.json".to_string(),
            portal_url: None,
            date_field: "start_date".to_string(),
            app_token: None,
            field_mapping,
        }
    }
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(SearchError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| SearchError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 有指定路徑就讀檔，否則使用預設值
    pub fn load(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// 替換環境變數 (例如 ${SAM_GOV_API_KEY})；找不到的變數保留原樣
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        use std::sync::LazyLock;

        static ENV_VAR: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("valid regex"));

        ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .to_string()
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_socket_addr("server.bind", &self.server.bind)?;
        validation::validate_range(
            "search.max_results_per_platform",
            self.search.max_results_per_platform,
            1,
            1000,
        )?;
        if let Some(timeout) = self.search.timeout_seconds {
            validation::validate_range("search.timeout_seconds", timeout, 1, 600)?;
        }

        validation::validate_url("sam_gov.endpoint", &self.sam_gov.endpoint)?;
        validation::validate_range(
            "sam_gov.default_window_days",
            self.sam_gov.default_window_days,
            1,
            365,
        )?;

        validation::validate_url("fpds.endpoint", &self.fpds.endpoint)?;
        validation::validate_non_empty_string("fpds.feed", &self.fpds.feed)?;

        if self.municipal.enabled {
            validation::validate_url("municipal.endpoint", &self.municipal.endpoint)?;
            validation::validate_non_empty_string("municipal.name", &self.municipal.name)?;
            validation::validate_non_empty_string("municipal.date_field", &self.municipal.date_field)?;
            if let Some(portal_url) = &self.municipal.portal_url {
                validation::validate_url("municipal.portal_url", portal_url)?;
            }
            if !self.municipal.field_mapping.values().any(|target| target == "title") {
                return Err(SearchError::ConfigValidationError {
                    field: "municipal.field_mapping".to_string(),
                    message: "a source field must map to 'title'".to_string(),
                });
            }
        }

        Ok(())
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
