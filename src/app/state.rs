use crate::adapters::{
    build_http_client, FpdsClient, FpdsProvider, MunicipalProvider, SamGovProvider,
};
use crate::config::toml_config::TomlConfig;
use crate::core::aggregator::SearchAggregator;
use crate::domain::ports::SolicitationProvider;
use crate::utils::error::Result;
use std::sync::Arc;

/// 所有 handler 共用的狀態；內容在啟動後不再變動
#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<SearchAggregator>,
    pub fpds: Arc<FpdsClient>,
    pub demo_fallback: bool,
}

impl AppState {
    /// 依設定建立各來源 adapter；市政來源只在啟用時註冊
    pub fn from_config(config: &TomlConfig) -> Result<Self> {
        let client = build_http_client(config.search.timeout_seconds)?;
        let max_results = config.search.max_results_per_platform;

        let sam_gov = SamGovProvider::new(client.clone(), &config.sam_gov, max_results);
        if !sam_gov.has_api_key() {
            tracing::warn!("⚠️ SAM_GOV_API_KEY is not set, SAM.gov searches will return no results");
        }

        let fpds = Arc::new(FpdsClient::new(client.clone(), &config.fpds));

        let mut providers: Vec<Arc<dyn SolicitationProvider>> = vec![
            Arc::new(sam_gov),
            Arc::new(FpdsProvider::new(Arc::clone(&fpds), max_results)),
        ];
        if config.municipal.enabled {
            providers.push(Arc::new(MunicipalProvider::new(
                client,
                config.municipal.clone(),
                max_results,
            )));
        }

        let aggregator = SearchAggregator::new(providers, config.search.demo_fallback);
        tracing::info!("🔧 Registered platforms: {:?}", aggregator.platforms());

        Ok(Self {
            demo_fallback: aggregator.demo_fallback(),
            aggregator: Arc::new(aggregator),
            fpds,
        })
    }
}
