//! 將各來源的異質欄位對應到 [`PlatformSolicitation`]。

use crate::domain::model::{FpdsContractRecord, Platform, PlatformSolicitation};
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};
use std::collections::HashMap;

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d", "%Y%m%d"];
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"];

/// 解析常見日期格式，含時間或時區的字串只取日期部分
pub fn parse_flexible_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Some(date);
        }
    }
    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(datetime.date());
        }
    }
    if let Ok(datetime) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(datetime.date_naive());
    }

    // 例如 SAM.gov 的 "2024-05-01T17:00:00-04:00" 以外的變體，退而取前 10 碼
    raw.get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
}

/// 可解析就轉成 YYYY-MM-DD，否則原樣保留
pub fn normalize_date(raw: &str) -> String {
    match parse_flexible_date(raw) {
        Some(date) => date.format("%Y-%m-%d").to_string(),
        None => raw.trim().to_string(),
    }
}

fn string_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn is_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

/// SAM.gov opportunities API 的單筆資料
pub fn normalize_sam_opportunity(
    item: &Value,
    index: usize,
    platform_name: &str,
) -> Option<PlatformSolicitation> {
    let obj = item.as_object()?;
    let title = string_field(obj, "title")?;

    let id = string_field(obj, "noticeId")
        .or_else(|| string_field(obj, "solicitationNumber"))
        .unwrap_or_else(|| format!("{}-{}", Platform::SamGov, index));

    // SAM 的 description 通常是另一個 API 的網址，不適合直接顯示
    let description = match string_field(obj, "description") {
        Some(text) if !is_url(&text) => text,
        _ => {
            let notice_type = string_field(obj, "type");
            let solicitation_number = string_field(obj, "solicitationNumber");
            match (notice_type, solicitation_number) {
                (Some(t), Some(n)) => format!("{} (Solicitation {})", t, n),
                (Some(t), None) => t,
                (None, Some(n)) => format!("Solicitation {}", n),
                (None, None) => String::new(),
            }
        }
    };

    let agency = string_field(obj, "fullParentPathName")
        .and_then(|path| path.split('.').next().map(|s| s.trim().to_string()))
        .filter(|s| !s.is_empty())
        .or_else(|| string_field(obj, "department"))
        .unwrap_or_default();

    let url = string_field(obj, "uiLink")
        .unwrap_or_else(|| format!("https://sam.gov/opp/{}/view", id));

    Some(PlatformSolicitation {
        id,
        title,
        description,
        agency,
        platform: Platform::SamGov,
        platform_name: platform_name.to_string(),
        posted_date: string_field(obj, "postedDate")
            .map(|d| normalize_date(&d))
            .unwrap_or_default(),
        url,
        naics_code: string_field(obj, "naicsCode"),
        due_date: string_field(obj, "responseDeadLine").map(|d| normalize_date(&d)),
    })
}

pub fn normalize_fpds_record(
    record: &FpdsContractRecord,
    platform_name: &str,
) -> Option<PlatformSolicitation> {
    let title = record
        .title
        .clone()
        .or_else(|| record.description.clone())
        .filter(|t| !t.trim().is_empty())?;

    let id = match record.modification_number.as_deref() {
        Some(m) if !m.is_empty() && m != "0" => format!("{}-{}", record.piid, m),
        _ => record.piid.clone(),
    };

    let mut description = record.description.clone().unwrap_or_default();
    if let Some(vendor) = &record.vendor_name {
        if description.is_empty() {
            description = format!("Awarded to {}", vendor);
        } else {
            description = format!("{} (Awarded to {})", description, vendor);
        }
    }

    let url = record.url.clone().unwrap_or_else(|| {
        format!(
            "https://www.fpds.gov/ezsearch/search.do?indexName=awardfull&q=PIID%3A{}",
            urlencode(&record.piid)
        )
    });

    Some(PlatformSolicitation {
        id,
        title,
        description,
        agency: record.agency_name.clone().unwrap_or_default(),
        platform: Platform::Fpds,
        platform_name: platform_name.to_string(),
        posted_date: record
            .signed_date
            .as_deref()
            .map(normalize_date)
            .unwrap_or_default(),
        url,
        naics_code: record.naics_code.clone(),
        due_date: None,
    })
}

fn urlencode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// 依點號路徑取值，例如 "department.name"
fn lookup_path<'a>(obj: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = obj.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// 套用欄位對應 (來源欄位 → 正規化欄位)，未列入對應的欄位保留原名
pub fn apply_field_mapping(
    obj: &Map<String, Value>,
    field_mapping: &HashMap<String, String>,
) -> HashMap<String, Value> {
    let mut data: HashMap<String, Value> = obj
        .iter()
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    for (source, target) in field_mapping {
        if let Some(value) = lookup_path(obj, source) {
            data.insert(target.clone(), value.clone());
        }
    }

    data
}

fn mapped_string(data: &HashMap<String, Value>, key: &str) -> Option<String> {
    match data.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        // Socrata 的 url 欄位是 {"url": "..."} 物件
        Value::Object(inner) => inner
            .get("url")
            .and_then(Value::as_str)
            .map(|s| s.to_string()),
        _ => None,
    }
}

pub fn normalize_municipal_record(
    item: &Value,
    index: usize,
    field_mapping: &HashMap<String, String>,
    platform_name: &str,
    fallback_url: &str,
) -> Option<PlatformSolicitation> {
    let obj = item.as_object()?;
    let data = apply_field_mapping(obj, field_mapping);
    let title = mapped_string(&data, "title")?;

    Some(PlatformSolicitation {
        id: mapped_string(&data, "id")
            .unwrap_or_else(|| format!("{}-{}", Platform::Municipal, index)),
        title,
        description: mapped_string(&data, "description").unwrap_or_default(),
        agency: mapped_string(&data, "agency").unwrap_or_default(),
        platform: Platform::Municipal,
        platform_name: platform_name.to_string(),
        posted_date: mapped_string(&data, "postedDate")
            .map(|d| normalize_date(&d))
            .unwrap_or_default(),
        url: mapped_string(&data, "url").unwrap_or_else(|| fallback_url.to_string()),
        naics_code: mapped_string(&data, "naicsCode"),
        due_date: mapped_string(&data, "dueDate").map(|d| normalize_date(&d)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_flexible_date() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(parse_flexible_date("2024-03-05"), Some(expected));
        assert_eq!(parse_flexible_date("03/05/2024"), Some(expected));
        assert_eq!(parse_flexible_date("2024/03/05"), Some(expected));
        assert_eq!(parse_flexible_date("2024-03-05 00:00:00"), Some(expected));
        assert_eq!(parse_flexible_date("2024-03-05T17:00:00-04:00"), Some(expected));
        assert_eq!(parse_flexible_date("next tuesday"), None);
    }

    #[test]
    fn test_normalize_date_passes_unparsable_through() {
        assert_eq!(normalize_date("03/05/2024"), "2024-03-05");
        assert_eq!(normalize_date(" FY2024 "), "FY2024");
    }

    #[test]
    fn test_normalize_sam_opportunity() {
        let item = json!({
            "noticeId": "abc123",
            "title": "Enterprise Help Desk Support",
            "solicitationNumber": "W912-24-R-0001",
            "fullParentPathName": "DEPT OF DEFENSE.DEPT OF THE ARMY.AMC",
            "postedDate": "2024-05-01",
            "type": "Combined Synopsis/Solicitation",
            "description": "https://api.sam.gov/prod/opportunities/v1/noticedesc?noticeid=abc123",
            "uiLink": "https://sam.gov/opp/abc123/view",
            "naicsCode": "541512",
            "responseDeadLine": "2024-06-01T17:00:00-04:00"
        });

        let record = normalize_sam_opportunity(&item, 0, "SAM.gov").unwrap();
        assert_eq!(record.id, "abc123");
        assert_eq!(record.agency, "DEPT OF DEFENSE");
        assert_eq!(
            record.description,
            "Combined Synopsis/Solicitation (Solicitation W912-24-R-0001)"
        );
        assert_eq!(record.url, "https://sam.gov/opp/abc123/view");
        assert_eq!(record.due_date.as_deref(), Some("2024-06-01"));
        assert_eq!(record.naics_code.as_deref(), Some("541512"));
    }

    #[test]
    fn test_normalize_sam_opportunity_requires_title() {
        let item = json!({"noticeId": "abc123"});
        assert!(normalize_sam_opportunity(&item, 0, "SAM.gov").is_none());
    }

    #[test]
    fn test_normalize_fpds_record() {
        let record = FpdsContractRecord {
            piid: "47QTCA19D00ABC".to_string(),
            modification_number: Some("P00002".to_string()),
            description: Some("CLOUD HOSTING SERVICES".to_string()),
            vendor_name: Some("ACME FEDERAL LLC".to_string()),
            agency_name: Some("GENERAL SERVICES ADMINISTRATION".to_string()),
            signed_date: Some("2023-09-28 00:00:00".to_string()),
            ..Default::default()
        };

        let normalized = normalize_fpds_record(&record, "FPDS").unwrap();
        assert_eq!(normalized.id, "47QTCA19D00ABC-P00002");
        assert_eq!(normalized.title, "CLOUD HOSTING SERVICES");
        assert_eq!(normalized.posted_date, "2023-09-28");
        assert!(normalized.description.contains("ACME FEDERAL LLC"));
        assert!(normalized.url.contains("PIID%3A47QTCA19D00ABC"));
    }

    #[test]
    fn test_apply_field_mapping_with_nested_path() {
        let item = json!({
            "contract_title": "Network Cabling",
            "department": {"name": "Department of Technology"}
        });
        let mapping = HashMap::from([
            ("contract_title".to_string(), "title".to_string()),
            ("department.name".to_string(), "agency".to_string()),
        ]);

        let data = apply_field_mapping(item.as_object().unwrap(), &mapping);
        assert_eq!(data["title"], "Network Cabling");
        assert_eq!(data["agency"], "Department of Technology");
        assert!(data.contains_key("contract_title"));
    }

    #[test]
    fn test_normalize_municipal_record() {
        let item = json!({
            "purchase_order_description": "Laptop Refresh",
            "department": "Fleet Management",
            "start_date": "2024-02-10T00:00:00.000",
            "contract_pdf": {"url": "https://city.example.gov/po/123.pdf"},
            "purchase_order_contract_number": "123"
        });
        let mapping = HashMap::from([
            ("purchase_order_description".to_string(), "title".to_string()),
            ("department".to_string(), "agency".to_string()),
            ("start_date".to_string(), "postedDate".to_string()),
            ("contract_pdf".to_string(), "url".to_string()),
            ("purchase_order_contract_number".to_string(), "id".to_string()),
        ]);

        let record =
            normalize_municipal_record(&item, 4, &mapping, "City Contracts", "https://city.example.gov")
                .unwrap();
        assert_eq!(record.id, "123");
        assert_eq!(record.title, "Laptop Refresh");
        assert_eq!(record.agency, "Fleet Management");
        assert_eq!(record.posted_date, "2024-02-10");
        assert_eq!(record.url, "https://city.example.gov/po/123.pdf");
    }

    #[test]
    fn test_normalize_municipal_record_synthesizes_id() {
        let item = json!({"title": "Snow Removal"});
        let record =
            normalize_municipal_record(&item, 7, &HashMap::new(), "City", "https://city.example.gov")
                .unwrap();
        assert_eq!(record.id, "municipal-7");
        assert_eq!(record.url, "https://city.example.gov");
    }
}
