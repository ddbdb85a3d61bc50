use crate::app::error::ApiError;
use crate::app::state::AppState;
use crate::core::demo::demo_contracts;
use crate::core::query_builder::build_fpds_query;
use crate::domain::model::{
    lenient_filters, lenient_platform_list, FpdsContractRecord, FpdsQueryFilters, FpdsSort,
    FpdsSortField, Platform, SearchFilters, SearchOutcome,
};
use crate::utils::error::SearchError;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const ATOM_CONTENT_TYPE: &str = "application/atom+xml; charset=utf-8";
pub const FEED_CACHE_CONTROL: &str = "public, max-age=60, s-maxage=60";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SearchRequest {
    #[serde(deserialize_with = "lenient_filters")]
    pub filters: SearchFilters,
    #[serde(deserialize_with = "lenient_platform_list")]
    pub platforms: Vec<String>,
}

impl SearchRequest {
    /// 任何合法的 JSON 都能轉成請求；非物件的 body 視為空請求
    pub fn from_json(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or_else(|e| {
            tracing::warn!("⚠️ Search request is not an object ({}), using defaults", e);
            Self::default()
        })
    }
}

/// POST /api/solicitations/search
///
/// 來源失敗不會讓請求失敗；只有 body 不是合法 JSON 時才回 400。
pub async fn search_solicitations(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<SearchOutcome>, ApiError> {
    let Json(body) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let request = SearchRequest::from_json(body);

    let outcome = state
        .aggregator
        .search_requested(&request.filters, &request.platforms)
        .await;
    tracing::info!(
        "🔍 Search returned {} records (synthetic: {})",
        outcome.total,
        outcome.synthetic
    );
    Ok(Json(outcome))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FeedProxyParams {
    pub q: Option<String>,
    pub start: Option<u32>,
    pub feed: Option<String>,
}

/// GET /api/fpds：原樣轉送 FPDS Atom feed
pub async fn fpds_feed_proxy(
    State(state): State<AppState>,
    params: Result<Query<FeedProxyParams>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let query = params
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| SearchError::MissingParameter {
            name: "q".to_string(),
        })?;

    let xml = state
        .fpds
        .fetch_raw(query, params.start.unwrap_or(0), params.feed.as_deref(), None)
        .await?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, ATOM_CONTENT_TYPE),
            (header::CACHE_CONTROL, FEED_CACHE_CONTROL),
        ],
        xml,
    ))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ContractSearchParams {
    #[serde(flatten)]
    pub filters: FpdsQueryFilters,
    // flatten 之下數字欄位無法直接反序列化，先以字串接收
    pub start: Option<String>,
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
    pub desc: Option<String>,
}

/// 未指定時依簽約日期新到舊排序
fn contract_sort(sort_by: Option<&str>, desc: Option<&str>) -> Result<FpdsSort, SearchError> {
    let field = match sort_by.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => raw
            .parse::<FpdsSortField>()
            .map_err(|message| SearchError::InvalidRequest { message })?,
        None => FpdsSortField::SignedDate,
    };

    let descending = match desc.map(|d| d.trim().to_ascii_lowercase()).as_deref() {
        None | Some("") | Some("y") | Some("yes") | Some("true") | Some("1") => true,
        Some("n") | Some("no") | Some("false") | Some("0") => false,
        Some(other) => {
            return Err(SearchError::InvalidRequest {
                message: format!("desc must be Y or N, got '{}'", other),
            })
        }
    };

    Ok(FpdsSort { field, descending })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractSearchResponse {
    pub query: String,
    pub records: Vec<FpdsContractRecord>,
    pub next_start: Option<u32>,
    pub synthetic: bool,
}

/// GET /api/fpds/contracts：結構化查詢並解析成合約紀錄
pub async fn fpds_contracts(
    State(state): State<AppState>,
    params: Result<Query<ContractSearchParams>, QueryRejection>,
) -> Result<Json<ContractSearchResponse>, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let mut filters = params.filters;
    if filters.is_empty() {
        return Err(SearchError::InvalidRequest {
            message: "at least one contract filter is required".to_string(),
        }
        .into());
    }
    filters.sort = Some(contract_sort(
        params.sort_by.as_deref(),
        params.desc.as_deref(),
    )?);

    let start = match params.start.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => raw.parse::<u32>().map_err(|_| SearchError::InvalidRequest {
            message: format!("start must be a non-negative integer, got '{}'", raw),
        })?,
        None => 0,
    };

    let query = build_fpds_query(&filters);
    let response = match state.fpds.search_contracts(&filters, start).await {
        Ok(page) => ContractSearchResponse {
            query,
            records: page.records,
            next_start: page.next_start,
            synthetic: false,
        },
        Err(e) => {
            tracing::error!("❌ FPDS contract search failed: {}", e);
            ContractSearchResponse {
                query,
                records: if state.demo_fallback {
                    demo_contracts()
                } else {
                    Vec::new()
                },
                next_start: None,
                synthetic: state.demo_fallback,
            }
        }
    };

    Ok(Json(response))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub platforms: Vec<Platform>,
}

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        platforms: state.aggregator.platforms(),
    })
}
