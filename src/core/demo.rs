//! 來源失敗時替代的示範資料。只在 `demo_fallback` 開啟時使用，
//! 回應會標記為 `synthetic`。

use crate::domain::model::{FpdsContractRecord, Platform, PlatformSolicitation, SearchFilters};
use chrono::{Duration, Utc};

const DEMO_COUNT: usize = 3;

const DEMO_TOPICS: [(&str, &str, &str); DEMO_COUNT] = [
    (
        "IT Modernization Support Services",
        "Department of Veterans Affairs",
        "541512",
    ),
    (
        "Cloud Infrastructure and Managed Services",
        "General Services Administration",
        "518210",
    ),
    (
        "Cybersecurity Assessment and Authorization",
        "Department of Homeland Security",
        "541519",
    ),
];

fn platform_home(platform: Platform) -> &'static str {
    match platform {
        Platform::SamGov => "https://sam.gov/search/?index=opp",
        Platform::Fpds => "https://www.fpds.gov/ezsearch/search.do",
        Platform::Municipal => "https://data.cityofchicago.org",
    }
}

pub fn demo_solicitations(
    platform: Platform,
    platform_name: &str,
    filters: &SearchFilters,
) -> Vec<PlatformSolicitation> {
    let today = Utc::now().date_naive();

    DEMO_TOPICS
        .iter()
        .enumerate()
        .map(|(index, (topic, agency, naics))| {
            let title = match filters.keyword() {
                Some(keyword) => format!("{}: {}", keyword, topic),
                None => topic.to_string(),
            };
            let posted = today - Duration::days(index as i64 * 3 + 1);

            PlatformSolicitation {
                id: format!("demo-{}-{}", platform, index + 1),
                title,
                description: format!(
                    "Sample {} record shown because the live source is unavailable.",
                    platform_name
                ),
                agency: filters
                    .agency()
                    .map(str::to_string)
                    .unwrap_or_else(|| agency.to_string()),
                platform,
                platform_name: platform_name.to_string(),
                posted_date: posted.format("%Y-%m-%d").to_string(),
                url: platform_home(platform).to_string(),
                naics_code: Some(
                    filters
                        .naics_code()
                        .map(str::to_string)
                        .unwrap_or_else(|| naics.to_string()),
                ),
                due_date: Some((posted + Duration::days(30)).format("%Y-%m-%d").to_string()),
            }
        })
        .collect()
}

pub fn demo_contracts() -> Vec<FpdsContractRecord> {
    let today = Utc::now().date_naive();

    DEMO_TOPICS
        .iter()
        .enumerate()
        .map(|(index, (topic, agency, naics))| FpdsContractRecord {
            piid: format!("DEMO{:04}", index + 1),
            modification_number: Some("0".to_string()),
            title: Some(format!("DEMO CONTRACT: {}", topic.to_uppercase())),
            description: Some(topic.to_uppercase()),
            vendor_name: Some("SAMPLE VENDOR LLC".to_string()),
            agency_name: Some(agency.to_uppercase()),
            obligated_amount: Some(250_000.0 * (index as f64 + 1.0)),
            signed_date: Some(
                (today - Duration::days(index as i64 * 7 + 2))
                    .format("%Y-%m-%d")
                    .to_string(),
            ),
            naics_code: Some(naics.to_string()),
            psc_code: Some("D399".to_string()),
            url: Some(platform_home(Platform::Fpds).to_string()),
        })
        .collect()
}
