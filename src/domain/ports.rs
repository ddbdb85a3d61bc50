use crate::domain::model::{Platform, PlatformSolicitation, SearchFilters};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// 單一外部採購來源的 adapter
#[async_trait]
pub trait SolicitationProvider: Send + Sync {
    fn platform(&self) -> Platform;

    fn display_name(&self) -> &str {
        self.platform().default_display_name()
    }

    /// 對來源發出一次請求並回傳正規化後的紀錄；不重試
    async fn search(&self, filters: &SearchFilters) -> Result<Vec<PlatformSolicitation>>;
}
