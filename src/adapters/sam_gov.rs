use crate::config::toml_config::SamGovConfig;
use crate::core::normalize::normalize_sam_opportunity;
use crate::core::query_builder::{build_sam_params, SamQueryOptions};
use crate::domain::model::{Platform, PlatformSolicitation, SearchFilters};
use crate::domain::ports::SolicitationProvider;
use crate::utils::error::{Result, SearchError};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde_json::Value;

/// SAM.gov opportunities API
pub struct SamGovProvider {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    default_window_days: i64,
    max_results: usize,
}

impl SamGovProvider {
    pub fn new(client: Client, config: &SamGovConfig, max_results: usize) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.resolved_api_key(),
            default_window_days: config.default_window_days,
            max_results,
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl SolicitationProvider for SamGovProvider {
    fn platform(&self) -> Platform {
        Platform::SamGov
    }

    async fn search(&self, filters: &SearchFilters) -> Result<Vec<PlatformSolicitation>> {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::warn!("⚠️ SAM_GOV_API_KEY is not set, SAM.gov returns no results");
            return Ok(Vec::new());
        };

        let params = build_sam_params(
            filters,
            &SamQueryOptions {
                api_key,
                limit: self.max_results,
                default_window_days: self.default_window_days,
                today: Utc::now().date_naive(),
            },
        );

        // URL 含 api_key，只記錄 endpoint
        tracing::debug!("Making SAM.gov request to: {}", self.endpoint);
        let response = self.client.get(&self.endpoint).query(&params).send().await?;

        let status = response.status();
        tracing::debug!("SAM.gov response status: {}", status);
        if !status.is_success() {
            return Err(SearchError::UpstreamStatus {
                platform: self.display_name().to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let json: Value = serde_json::from_str(&body).map_err(|e| SearchError::FeedParseError {
            platform: self.display_name().to_string(),
            message: e.to_string(),
        })?;

        let records: Vec<PlatformSolicitation> = json
            .get("opportunitiesData")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .enumerate()
                    .filter_map(|(index, item)| {
                        normalize_sam_opportunity(item, index, self.display_name())
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(records)
    }
}
