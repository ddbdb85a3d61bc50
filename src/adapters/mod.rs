//! 外部系統的具體實作：各採購來源的 HTTP adapter 與本機儲存。

pub mod fpds;
pub mod municipal;
pub mod sam_gov;
pub mod storage;

use crate::utils::error::Result;
use reqwest::Client;
use std::time::Duration;

pub use fpds::{FpdsClient, FpdsProvider};
pub use municipal::MunicipalProvider;
pub use sam_gov::SamGovProvider;
pub use storage::LocalStorage;

const USER_AGENT: &str = concat!("procure-search/", env!("CARGO_PKG_VERSION"));

/// 所有來源共用同一個 client；未設定 timeout 時沿用 reqwest 預設值
pub fn build_http_client(timeout_seconds: Option<u64>) -> Result<Client> {
    let mut builder = Client::builder().user_agent(USER_AGENT);
    if let Some(seconds) = timeout_seconds {
        builder = builder.timeout(Duration::from_secs(seconds));
    }
    Ok(builder.build()?)
}
