use crate::config::toml_config::FpdsConfig;
use crate::core::fpds_feed::parse_fpds_feed;
use crate::core::normalize::{normalize_fpds_record, parse_flexible_date};
use crate::core::query_builder::{build_fpds_query, build_fpds_sort_params};
use crate::domain::model::{
    FpdsFeedPage, FpdsQueryFilters, FpdsSort, Platform, PlatformSolicitation, SearchFilters,
};
use crate::domain::ports::SolicitationProvider;
use crate::utils::error::{Result, SearchError};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;

/// FPDS ezsearch Atom feed 的 HTTP client，供 proxy 與 provider 共用
pub struct FpdsClient {
    client: Client,
    endpoint: String,
    default_feed: String,
}

impl FpdsClient {
    pub fn new(client: Client, config: &FpdsConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
            default_feed: config.feed.clone(),
        }
    }

    /// 取得原始 Atom XML，不做任何解析
    pub async fn fetch_raw(
        &self,
        query: &str,
        start: u32,
        feed: Option<&str>,
        sort: Option<&FpdsSort>,
    ) -> Result<String> {
        let feed = feed
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .unwrap_or(&self.default_feed);

        let mut params = vec![
            ("FEEDNAME".to_string(), feed.to_string()),
            ("q".to_string(), query.to_string()),
            ("start".to_string(), start.to_string()),
        ];
        params.extend(build_fpds_sort_params(sort));

        tracing::debug!("Making FPDS request: q={} start={}", query, start);
        let response = self.client.get(&self.endpoint).query(&params).send().await?;

        let status = response.status();
        tracing::debug!("FPDS response status: {}", status);
        if !status.is_success() {
            return Err(SearchError::UpstreamStatus {
                platform: Platform::Fpds.default_display_name().to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }

    /// 以結構化條件查詢並解析成合約紀錄
    pub async fn search_contracts(
        &self,
        filters: &FpdsQueryFilters,
        start: u32,
    ) -> Result<FpdsFeedPage> {
        let query = build_fpds_query(filters);
        let xml = self
            .fetch_raw(&query, start, None, filters.sort.as_ref())
            .await?;
        parse_fpds_feed(&xml)
    }
}

/// FPDS 的日期語法是 YYYY/MM/DD
fn fpds_date(value: &Option<String>) -> Option<String> {
    let raw = value.as_deref().map(str::trim).filter(|v| !v.is_empty())?;
    Some(match parse_flexible_date(raw) {
        Some(date) => date.format("%Y/%m/%d").to_string(),
        None => raw.to_string(),
    })
}

/// 把通用搜尋條件轉成 FPDS 條件
pub fn contract_filters(filters: &SearchFilters) -> FpdsQueryFilters {
    let mut contract = FpdsQueryFilters::from(filters);
    contract.signed_date_from = fpds_date(&contract.signed_date_from);
    contract.signed_date_to = fpds_date(&contract.signed_date_to);
    contract
}

/// 將 FPDS 合約紀錄當作搜尋結果提供
pub struct FpdsProvider {
    client: Arc<FpdsClient>,
    max_results: usize,
}

impl FpdsProvider {
    pub fn new(client: Arc<FpdsClient>, max_results: usize) -> Self {
        Self {
            client,
            max_results,
        }
    }
}

#[async_trait]
impl SolicitationProvider for FpdsProvider {
    fn platform(&self) -> Platform {
        Platform::Fpds
    }

    async fn search(&self, filters: &SearchFilters) -> Result<Vec<PlatformSolicitation>> {
        let contract = contract_filters(filters);
        if contract.is_empty() {
            // 沒有任何條件時 FPDS 會回傳整個資料集
            tracing::debug!("FPDS search skipped: no filters");
            return Ok(Vec::new());
        }

        let page = self.client.search_contracts(&contract, 0).await?;
        let limit = filters.limit.unwrap_or(self.max_results).min(self.max_results);

        Ok(page
            .records
            .iter()
            .filter_map(|record| normalize_fpds_record(record, self.display_name()))
            .take(limit)
            .collect())
    }
}
