use crate::config::toml_config::MunicipalConfig;
use crate::core::normalize::normalize_municipal_record;
use crate::core::query_builder::build_municipal_params;
use crate::domain::model::{Platform, PlatformSolicitation, SearchFilters};
use crate::domain::ports::SolicitationProvider;
use crate::utils::error::{Result, SearchError};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

/// Socrata 開放資料平台上的市政合約資料集
pub struct MunicipalProvider {
    client: Client,
    config: MunicipalConfig,
    max_results: usize,
}

impl MunicipalProvider {
    pub fn new(client: Client, config: MunicipalConfig, max_results: usize) -> Self {
        Self {
            client,
            config,
            max_results,
        }
    }

    fn fallback_url(&self) -> &str {
        self.config
            .portal_url
            .as_deref()
            .unwrap_or(&self.config.endpoint)
    }
}

#[async_trait]
impl SolicitationProvider for MunicipalProvider {
    fn platform(&self) -> Platform {
        Platform::Municipal
    }

    fn display_name(&self) -> &str {
        &self.config.name
    }

    async fn search(&self, filters: &SearchFilters) -> Result<Vec<PlatformSolicitation>> {
        let params = build_municipal_params(filters, &self.config.date_field, self.max_results);

        tracing::debug!("Making {} request to: {}", self.config.name, self.config.endpoint);
        let mut request = self.client.get(&self.config.endpoint).query(&params);
        if let Some(token) = self.config.app_token.as_deref().filter(|t| !t.is_empty()) {
            request = request.header("X-App-Token", token);
        }
        let response = request.send().await?;

        let status = response.status();
        tracing::debug!("{} response status: {}", self.config.name, status);
        if !status.is_success() {
            return Err(SearchError::UpstreamStatus {
                platform: self.config.name.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let json: Value = serde_json::from_str(&body).map_err(|e| SearchError::FeedParseError {
            platform: self.config.name.clone(),
            message: e.to_string(),
        })?;

        let Value::Array(items) = json else {
            return Err(SearchError::FeedParseError {
                platform: self.config.name.clone(),
                message: "expected a JSON array of records".to_string(),
            });
        };

        Ok(items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| {
                normalize_municipal_record(
                    item,
                    index,
                    &self.config.field_mapping,
                    &self.config.name,
                    self.fallback_url(),
                )
            })
            .collect())
    }
}
