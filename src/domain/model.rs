use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// 支援的採購資料來源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    SamGov,
    Fpds,
    Municipal,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::SamGov, Platform::Fpds, Platform::Municipal];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::SamGov => "sam_gov",
            Platform::Fpds => "fpds",
            Platform::Municipal => "municipal",
        }
    }

    pub fn default_display_name(&self) -> &'static str {
        match self {
            Platform::SamGov => "SAM.gov",
            Platform::Fpds => "FPDS",
            Platform::Municipal => "Municipal Contracts",
        }
    }

    /// 無法辨識的識別字記錄警告後略過
    pub fn parse_lenient<S: AsRef<str>>(values: &[S]) -> Vec<Platform> {
        values
            .iter()
            .filter_map(|value| match value.as_ref().parse::<Platform>() {
                Ok(platform) => Some(platform),
                Err(e) => {
                    tracing::warn!("⚠️ {}, ignoring", e);
                    None
                }
            })
            .collect()
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    /// 前端送來的識別字格式不一 (sam.gov / samGov / SAM_GOV)，一律正規化後比對
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "samgov" | "sam" => Ok(Platform::SamGov),
            "fpds" | "fpdsng" => Ok(Platform::Fpds),
            "municipal" | "city" | "local" => Ok(Platform::Municipal),
            _ => Err(format!("Unknown platform: {}", s)),
        }
    }
}

/// 搜尋條件；所有欄位皆為選填，日期以字串保留原樣交給各 adapter 解析。
///
/// 型別不符的欄位 (null、負數的 limit、物件…) 視為未提供。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchFilters {
    #[serde(deserialize_with = "lenient_string")]
    pub keyword: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub naics_code: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub agency: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub posted_from: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub posted_to: Option<String>,
    #[serde(deserialize_with = "lenient_limit")]
    pub limit: Option<usize>,
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_limit<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<usize>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// 物件以外的值 (null、陣列…) 一律當作沒有條件
pub fn lenient_filters<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SearchFilters, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// 接受陣列或以逗號分隔的字串；非字串元素保留其文字，交由後續辨識
pub fn lenient_platform_list<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect(),
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .collect(),
        _ => Vec::new(),
    })
}

impl SearchFilters {
    pub fn keyword(&self) -> Option<&str> {
        trimmed(&self.keyword)
    }

    pub fn naics_code(&self) -> Option<&str> {
        trimmed(&self.naics_code)
    }

    pub fn agency(&self) -> Option<&str> {
        trimmed(&self.agency)
    }

    pub fn posted_from(&self) -> Option<&str> {
        trimmed(&self.posted_from)
    }

    pub fn posted_to(&self) -> Option<&str> {
        trimmed(&self.posted_to)
    }
}

pub(crate) fn trimmed(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// 正規化後的招標紀錄
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformSolicitation {
    pub id: String,
    pub title: String,
    pub description: String,
    pub agency: String,
    pub platform: Platform,
    pub platform_name: String,
    pub posted_date: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub naics_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
}

/// FPDS Atom feed 中單一合約紀錄
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FpdsContractRecord {
    pub piid: String,
    pub modification_number: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub vendor_name: Option<String>,
    pub agency_name: Option<String>,
    pub obligated_amount: Option<f64>,
    pub signed_date: Option<String>,
    pub naics_code: Option<String>,
    pub psc_code: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FpdsFeedPage {
    pub records: Vec<FpdsContractRecord>,
    pub next_start: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FpdsSortField {
    SignedDate,
    LastModDate,
    ObligatedAmount,
}

impl FpdsSortField {
    pub fn as_str(&self) -> &'static str {
        match self {
            FpdsSortField::SignedDate => "SIGNED_DATE",
            FpdsSortField::LastModDate => "LAST_MOD_DATE",
            FpdsSortField::ObligatedAmount => "OBLIGATED_AMOUNT",
        }
    }
}

impl FromStr for FpdsSortField {
    type Err = String;

    /// 接受 SIGNED_DATE / signedDate 等寫法
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "signeddate" => Ok(FpdsSortField::SignedDate),
            "lastmoddate" | "lastmodifieddate" => Ok(FpdsSortField::LastModDate),
            "obligatedamount" => Ok(FpdsSortField::ObligatedAmount),
            _ => Err(format!("Unknown sort field: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FpdsSort {
    pub field: FpdsSortField,
    #[serde(default)]
    pub descending: bool,
}

/// FPDS 結構化查詢條件
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FpdsQueryFilters {
    pub keyword: Option<String>,
    pub vendor_name: Option<String>,
    pub piid: Option<String>,
    pub agency: Option<String>,
    pub naics: Option<String>,
    pub psc: Option<String>,
    pub signed_date_from: Option<String>,
    pub signed_date_to: Option<String>,
    pub last_modified_from: Option<String>,
    pub last_modified_to: Option<String>,
    pub obligation_min: Option<String>,
    pub obligation_max: Option<String>,
    #[serde(skip)]
    pub sort: Option<FpdsSort>,
}

impl FpdsQueryFilters {
    pub fn is_empty(&self) -> bool {
        [
            &self.keyword,
            &self.vendor_name,
            &self.piid,
            &self.agency,
            &self.naics,
            &self.psc,
            &self.signed_date_from,
            &self.signed_date_to,
            &self.last_modified_from,
            &self.last_modified_to,
            &self.obligation_min,
            &self.obligation_max,
        ]
        .iter()
        .all(|value| trimmed(value).is_none())
    }
}

impl From<&SearchFilters> for FpdsQueryFilters {
    fn from(filters: &SearchFilters) -> Self {
        Self {
            keyword: filters.keyword.clone(),
            agency: filters.agency.clone(),
            naics: filters.naics_code.clone(),
            signed_date_from: filters.posted_from.clone(),
            signed_date_to: filters.posted_to.clone(),
            sort: Some(FpdsSort {
                field: FpdsSortField::SignedDate,
                descending: true,
            }),
            ..Default::default()
        }
    }
}

/// 聚合搜尋結果
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchOutcome {
    pub results: Vec<PlatformSolicitation>,
    /// 任一來源以示範資料替代時為 true
    pub synthetic: bool,
    pub total: usize,
}
