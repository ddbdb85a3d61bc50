//! 將結構化條件轉換成各來源的查詢語法。這裡的函式都是純函式。

use crate::core::normalize::parse_flexible_date;
use crate::domain::model::{trimmed, FpdsQueryFilters, FpdsSort, SearchFilters};
use chrono::{Duration, NaiveDate};

pub const FIELD_VENDOR_NAME: &str = "VENDOR_NAME";
pub const FIELD_PIID: &str = "PIID";
pub const FIELD_AGENCY_NAME: &str = "CONTRACTING_AGENCY_NAME";
pub const FIELD_NAICS: &str = "PRINCIPAL_NAICS_CODE";
pub const FIELD_PSC: &str = "PRODUCT_OR_SERVICE_CODE";
pub const FIELD_SIGNED_DATE: &str = "SIGNED_DATE";
pub const FIELD_LAST_MOD_DATE: &str = "LAST_MOD_DATE";
pub const FIELD_OBLIGATED_AMOUNT: &str = "OBLIGATED_AMOUNT";

fn quoted(value: &str) -> String {
    format!("\"{}\"", value)
}

fn push_token(tokens: &mut Vec<String>, field: &str, value: Option<&str>, quote: bool) {
    if let Some(value) = value {
        let value = if quote { quoted(value) } else { value.to_string() };
        tokens.push(format!("{}:{}", field, value));
    }
}

/// 包含兩端的範圍，缺少的一端以 `*` 表示；兩端皆空則不輸出
pub fn range_token(field: &str, start: Option<&str>, end: Option<&str>) -> Option<String> {
    if start.is_none() && end.is_none() {
        return None;
    }
    Some(format!(
        "{}:[{} TO {}]",
        field,
        start.unwrap_or("*"),
        end.unwrap_or("*")
    ))
}

/// 產生 FPDS ezsearch 的 `q` 參數
pub fn build_fpds_query(filters: &FpdsQueryFilters) -> String {
    let mut tokens = Vec::new();

    if let Some(keyword) = trimmed(&filters.keyword) {
        if keyword.contains(char::is_whitespace) {
            tokens.push(quoted(keyword));
        } else {
            tokens.push(keyword.to_string());
        }
    }

    push_token(&mut tokens, FIELD_VENDOR_NAME, trimmed(&filters.vendor_name), true);
    push_token(&mut tokens, FIELD_PIID, trimmed(&filters.piid), false);
    push_token(&mut tokens, FIELD_AGENCY_NAME, trimmed(&filters.agency), true);
    push_token(&mut tokens, FIELD_NAICS, trimmed(&filters.naics), false);
    push_token(&mut tokens, FIELD_PSC, trimmed(&filters.psc), false);

    let ranges = [
        (
            FIELD_SIGNED_DATE,
            trimmed(&filters.signed_date_from),
            trimmed(&filters.signed_date_to),
        ),
        (
            FIELD_LAST_MOD_DATE,
            trimmed(&filters.last_modified_from),
            trimmed(&filters.last_modified_to),
        ),
        (
            FIELD_OBLIGATED_AMOUNT,
            trimmed(&filters.obligation_min),
            trimmed(&filters.obligation_max),
        ),
    ];
    tokens.extend(
        ranges
            .into_iter()
            .filter_map(|(field, start, end)| range_token(field, start, end)),
    );

    tokens.join(" ")
}

/// 排序以獨立的 URL 參數送出，不放進 `q`
pub fn build_fpds_sort_params(sort: Option<&FpdsSort>) -> Vec<(String, String)> {
    match sort {
        Some(sort) => vec![
            ("sortBy".to_string(), sort.field.as_str().to_string()),
            (
                "desc".to_string(),
                if sort.descending { "Y" } else { "N" }.to_string(),
            ),
        ],
        None => Vec::new(),
    }
}

#[derive(Debug, Clone)]
pub struct SamQueryOptions<'a> {
    pub api_key: &'a str,
    pub limit: usize,
    pub default_window_days: i64,
    pub today: NaiveDate,
}

fn sam_date(raw: &str) -> String {
    match parse_flexible_date(raw) {
        Some(date) => date.format("%m/%d/%Y").to_string(),
        None => raw.to_string(),
    }
}

/// SAM.gov 要求 postedFrom/postedTo 必填，缺少時以預設天數補齊
fn sam_window(
    filters: &SearchFilters,
    window_days: i64,
    today: NaiveDate,
) -> (String, String) {
    let window = Duration::days(window_days);
    match (filters.posted_from(), filters.posted_to()) {
        (Some(from), Some(to)) => (sam_date(from), sam_date(to)),
        (Some(from), None) => (sam_date(from), sam_date(&today.to_string())),
        (None, Some(to)) => {
            let start = parse_flexible_date(to)
                .map(|end| (end - window).format("%m/%d/%Y").to_string())
                .unwrap_or_else(|| (today - window).format("%m/%d/%Y").to_string());
            (start, sam_date(to))
        }
        (None, None) => (
            (today - window).format("%m/%d/%Y").to_string(),
            today.format("%m/%d/%Y").to_string(),
        ),
    }
}

pub fn build_sam_params(
    filters: &SearchFilters,
    options: &SamQueryOptions<'_>,
) -> Vec<(String, String)> {
    let (posted_from, posted_to) =
        sam_window(filters, options.default_window_days, options.today);
    let limit = filters.limit.unwrap_or(options.limit).min(options.limit);

    let mut params = vec![
        ("api_key".to_string(), options.api_key.to_string()),
        ("postedFrom".to_string(), posted_from),
        ("postedTo".to_string(), posted_to),
        ("limit".to_string(), limit.to_string()),
        ("offset".to_string(), "0".to_string()),
    ];

    if let Some(keyword) = filters.keyword() {
        params.push(("title".to_string(), keyword.to_string()));
    }
    if let Some(naics) = filters.naics_code() {
        params.push(("ncode".to_string(), naics.to_string()));
    }
    if let Some(agency) = filters.agency() {
        params.push(("organizationName".to_string(), agency.to_string()));
    }

    params
}

fn soql_literal(raw: &str, end_of_day: bool) -> String {
    let value = match parse_flexible_date(raw) {
        Some(date) if end_of_day => format!("{}T23:59:59", date.format("%Y-%m-%d")),
        Some(date) => format!("{}T00:00:00", date.format("%Y-%m-%d")),
        None => raw.to_string(),
    };
    format!("'{}'", value.replace('\'', "''"))
}

/// Socrata (SoQL) 參數，供市政開放資料平台使用
pub fn build_municipal_params(
    filters: &SearchFilters,
    date_field: &str,
    limit: usize,
) -> Vec<(String, String)> {
    let limit = filters.limit.unwrap_or(limit).min(limit);
    let mut params = vec![
        ("$limit".to_string(), limit.to_string()),
        ("$order".to_string(), format!("{} DESC", date_field)),
    ];

    if let Some(keyword) = filters.keyword() {
        params.push(("$q".to_string(), keyword.to_string()));
    }

    let clause = match (filters.posted_from(), filters.posted_to()) {
        (Some(from), Some(to)) => Some(format!(
            "{} between {} and {}",
            date_field,
            soql_literal(from, false),
            soql_literal(to, true)
        )),
        (Some(from), None) => Some(format!("{} >= {}", date_field, soql_literal(from, false))),
        (None, Some(to)) => Some(format!("{} <= {}", date_field, soql_literal(to, true))),
        (None, None) => None,
    };
    if let Some(clause) = clause {
        params.push(("$where".to_string(), clause));
    }

    params
}
