//! FPDS Atom feed 解析。
//!
//! Feed 的每個 `<entry>` 內含 `<content>`，底下是帶命名空間前綴的
//! `award` 或 `IDV` 文件。這裡只擷取需要的扁平欄位，不建立完整的 DOM；
//! 命名空間前綴 (`ns1:` 等) 一律忽略。

use crate::domain::model::{FpdsContractRecord, FpdsFeedPage};
use crate::utils::error::{Result, SearchError};
use regex::Regex;
use std::sync::LazyLock;

const PLATFORM: &str = "FPDS";

static ENTRY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<entry\b[^>]*>(.*?)</entry>").expect("valid regex"));

static LINK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<link\b([^>]*?)/?>").expect("valid regex"));

static ATTRIBUTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"([\w:-]+)\s*=\s*"([^"]*)""#).expect("valid regex"));

static START_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[?&](?:amp;)?start=(\d+)").expect("valid regex"));

static CDATA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!\[CDATA\[(.*?)\]\]>").expect("valid regex"));

static NUMERIC_ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&#(x[0-9a-fA-F]+|[0-9]+);").expect("valid regex"));

/// 單一元素的擷取樣式：(?s)<prefix:name attrs>text</prefix:name>
struct ElementPattern(Regex);

impl ElementPattern {
    fn new(local_name: &str) -> Self {
        let pattern = format!(
            r"(?s)<(?:[\w.-]+:)?{name}\b([^>]*)>(.*?)</(?:[\w.-]+:)?{name}>",
            name = regex::escape(local_name)
        );
        Self(Regex::new(&pattern).expect("valid element pattern"))
    }

    fn text(&self, block: &str) -> Option<String> {
        let caps = self.0.captures(block)?;
        let text = decode_entities(caps.get(2)?.as_str());
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }

    fn attribute(&self, block: &str, attribute: &str) -> Option<String> {
        let caps = self.0.captures(block)?;
        find_attribute(caps.get(1)?.as_str(), attribute)
    }
}

struct ContractPatterns {
    title: ElementPattern,
    piid: ElementPattern,
    mod_number: ElementPattern,
    signed_date: ElementPattern,
    obligated_amount: ElementPattern,
    vendor_name: ElementPattern,
    agency_id: ElementPattern,
    description: ElementPattern,
    naics: ElementPattern,
    psc: ElementPattern,
}

static PATTERNS: LazyLock<ContractPatterns> = LazyLock::new(|| ContractPatterns {
    title: ElementPattern::new("title"),
    piid: ElementPattern::new("PIID"),
    mod_number: ElementPattern::new("modNumber"),
    signed_date: ElementPattern::new("signedDate"),
    obligated_amount: ElementPattern::new("obligatedAmount"),
    vendor_name: ElementPattern::new("vendorName"),
    agency_id: ElementPattern::new("contractingOfficeAgencyID"),
    description: ElementPattern::new("descriptionOfContractRequirement"),
    naics: ElementPattern::new("principalNAICSCode"),
    psc: ElementPattern::new("productOrServiceCode"),
});

fn find_attribute(attributes: &str, name: &str) -> Option<String> {
    ATTRIBUTE
        .captures_iter(attributes)
        .find(|caps| &caps[1] == name)
        .map(|caps| decode_entities(&caps[2]))
        .filter(|value| !value.trim().is_empty())
}

/// 處理 XML 預設實體與數字字元參照
pub fn decode_entities(raw: &str) -> String {
    let unwrapped = CDATA.replace_all(raw, "$1");
    let numeric = NUMERIC_ENTITY.replace_all(&unwrapped, |caps: &regex::Captures| {
        let code = &caps[1];
        let parsed = match code.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => code.parse::<u32>().ok(),
        };
        parsed
            .and_then(char::from_u32)
            .map(|c| c.to_string())
            .unwrap_or_else(|| caps[0].to_string())
    });

    numeric
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

fn link_href(block: &str, rel: &str) -> Option<String> {
    LINK.captures_iter(block).find_map(|caps| {
        let attributes = &caps[1];
        let link_rel = find_attribute(attributes, "rel").unwrap_or_else(|| "alternate".to_string());
        if link_rel == rel {
            find_attribute(attributes, "href")
        } else {
            None
        }
    })
}

fn parse_entry(entry: &str) -> Option<FpdsContractRecord> {
    let p = &*PATTERNS;
    let piid = p.piid.text(entry)?;

    // entry 標題在 <content> 之前；content 內也可能出現同名元素
    let header = entry.split("<content").next().unwrap_or(entry);

    Some(FpdsContractRecord {
        piid,
        modification_number: p.mod_number.text(entry),
        title: p.title.text(header),
        description: p.description.text(entry),
        vendor_name: p.vendor_name.text(entry),
        agency_name: p
            .agency_id
            .attribute(entry, "name")
            .or_else(|| p.agency_id.text(entry)),
        obligated_amount: p
            .obligated_amount
            .text(entry)
            .and_then(|amount| amount.replace(',', "").parse::<f64>().ok()),
        signed_date: p.signed_date.text(entry),
        naics_code: p.naics.text(entry),
        psc_code: p.psc.text(entry),
        url: link_href(header, "alternate"),
    })
}

/// 解析整份 feed；缺少 PIID 的 entry 會被略過
pub fn parse_fpds_feed(xml: &str) -> Result<FpdsFeedPage> {
    if !xml.contains("<feed") {
        return Err(SearchError::FeedParseError {
            platform: PLATFORM.to_string(),
            message: "response is not an Atom feed".to_string(),
        });
    }

    let mut records = Vec::new();
    let mut skipped = 0usize;
    for caps in ENTRY.captures_iter(xml) {
        match parse_entry(&caps[1]) {
            Some(record) => records.push(record),
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        tracing::debug!("Skipped {} FPDS entries without a PIID", skipped);
    }

    let feed_header = xml.split("<entry").next().unwrap_or(xml);
    let next_start = link_href(feed_header, "next").and_then(|href| {
        START_PARAM
            .captures(&href)
            .and_then(|caps| caps[1].parse::<u32>().ok())
    });

    Ok(FpdsFeedPage {
        records,
        next_start,
    })
}
