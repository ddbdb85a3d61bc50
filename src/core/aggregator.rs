use crate::core::demo::demo_solicitations;
use crate::domain::model::{Platform, PlatformSolicitation, SearchFilters, SearchOutcome};
use crate::domain::ports::SolicitationProvider;
use futures::future::join_all;
use std::sync::Arc;

/// 對選定的來源同時發出請求並串接結果。
///
/// 單一來源失敗不會中斷整批搜尋：錯誤只記錄在伺服器端，
/// 該來源改為提供示範資料 (或不提供任何資料)。
pub struct SearchAggregator {
    providers: Vec<Arc<dyn SolicitationProvider>>,
    demo_fallback: bool,
}

struct ProviderOutcome {
    records: Vec<PlatformSolicitation>,
    synthetic: bool,
}

impl SearchAggregator {
    pub fn new(providers: Vec<Arc<dyn SolicitationProvider>>, demo_fallback: bool) -> Self {
        Self {
            providers,
            demo_fallback,
        }
    }

    pub fn platforms(&self) -> Vec<Platform> {
        self.providers.iter().map(|p| p.platform()).collect()
    }

    pub fn demo_fallback(&self) -> bool {
        self.demo_fallback
    }

    fn provider_for(&self, platform: Platform) -> Option<&Arc<dyn SolicitationProvider>> {
        self.providers.iter().find(|p| p.platform() == platform)
    }

    /// 空的來源清單代表全部已註冊的來源；重複的識別字只查詢一次
    fn select(&self, platforms: &[Platform]) -> Vec<Arc<dyn SolicitationProvider>> {
        if platforms.is_empty() {
            return self.providers.clone();
        }

        let mut selected: Vec<Arc<dyn SolicitationProvider>> = Vec::new();
        for platform in platforms {
            if selected.iter().any(|p| p.platform() == *platform) {
                continue;
            }
            match self.provider_for(*platform) {
                Some(provider) => selected.push(Arc::clone(provider)),
                None => tracing::warn!("⚠️ Platform '{}' is not configured, skipping", platform),
            }
        }
        selected
    }

    async fn run_provider(
        &self,
        provider: Arc<dyn SolicitationProvider>,
        filters: &SearchFilters,
    ) -> ProviderOutcome {
        let name = provider.display_name().to_string();
        tracing::debug!("📡 Searching {}", name);

        match provider.search(filters).await {
            Ok(records) => {
                tracing::info!("📡 {}: {} records", name, records.len());
                ProviderOutcome {
                    records,
                    synthetic: false,
                }
            }
            Err(e) => {
                tracing::error!("❌ {} search failed: {}", name, e);
                if self.demo_fallback {
                    tracing::warn!("{}: substituting demo records", name);
                    ProviderOutcome {
                        records: demo_solicitations(provider.platform(), &name, filters),
                        synthetic: true,
                    }
                } else {
                    ProviderOutcome {
                        records: Vec::new(),
                        synthetic: false,
                    }
                }
            }
        }
    }

    /// 以呼叫端送來的識別字搜尋：空清單代表全部來源，
    /// 但全部無法辨識時不查詢任何來源
    pub async fn search_requested<S: AsRef<str>>(
        &self,
        filters: &SearchFilters,
        requested: &[S],
    ) -> SearchOutcome {
        if requested.is_empty() {
            return self.search(filters, &[]).await;
        }

        let platforms = Platform::parse_lenient(requested);
        if platforms.is_empty() {
            tracing::warn!("⚠️ No recognized platforms in request, nothing to search");
            return SearchOutcome::default();
        }
        self.search(filters, &platforms).await
    }

    pub async fn search(&self, filters: &SearchFilters, platforms: &[Platform]) -> SearchOutcome {
        let selected = self.select(platforms);

        let outcomes = join_all(
            selected
                .into_iter()
                .map(|provider| self.run_provider(provider, filters)),
        )
        .await;

        let synthetic = outcomes.iter().any(|o| o.synthetic);
        let results: Vec<PlatformSolicitation> =
            outcomes.into_iter().flat_map(|o| o.records).collect();

        SearchOutcome {
            total: results.len(),
            results,
            synthetic,
        }
    }
}
