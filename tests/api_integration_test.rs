use anyhow::Result;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use httpmock::prelude::*;
use procure_search::{build_router, AppState, TomlConfig};
use serde_json::{json, Value};
use tower::ServiceExt;

const UNREACHABLE: &str = "http://127.0.0.1:9";

const FPDS_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:ns1="https://www.fpds.gov/FPDS">
  <title>FPDS Search Results</title>
  <link rel="next" href="https://www.fpds.gov/ezsearch/FEEDS/ATOM?FEEDNAME=PUBLIC&amp;q=cloud&amp;start=10"/>
  <entry>
    <title>DELIVERY ORDER 47QTCA19D00AA awarded to ACME CLOUD LLC</title>
    <content type="application/xml">
      <ns1:award>
        <ns1:awardID>
          <ns1:awardContractID>
            <ns1:PIID>47QTCA19D00AA</ns1:PIID>
            <ns1:modNumber>0</ns1:modNumber>
          </ns1:awardContractID>
        </ns1:awardID>
        <ns1:relevantContractDates>
          <ns1:signedDate>2024-02-03 00:00:00</ns1:signedDate>
        </ns1:relevantContractDates>
        <ns1:purchaserInformation>
          <ns1:contractingOfficeAgencyID name="GENERAL SERVICES ADMINISTRATION">4732</ns1:contractingOfficeAgencyID>
        </ns1:purchaserInformation>
        <ns1:vendor>
          <ns1:vendorHeader>
            <ns1:vendorName>ACME CLOUD LLC</ns1:vendorName>
          </ns1:vendorHeader>
        </ns1:vendor>
      </ns1:award>
    </content>
  </entry>
</feed>"#;

/// 所有來源都指向同一個 base URL
fn config_for(base_url: &str, demo_fallback: bool) -> TomlConfig {
    let mut config = TomlConfig::default();
    config.search.demo_fallback = demo_fallback;
    config.search.timeout_seconds = Some(5);
    config.sam_gov.endpoint = format!("{}/opportunities/v2/search", base_url);
    config.sam_gov.api_key = Some("test-key".to_string());
    config.fpds.endpoint = format!("{}/ezsearch/FEEDS/ATOM", base_url);
    config
}

fn app(config: &TomlConfig) -> Result<axum::Router> {
    Ok(build_router(AppState::from_config(config)?))
}

async fn send(app: axum::Router, req: Request<Body>) -> Result<(StatusCode, axum::http::HeaderMap, String)> {
    let response = app.oneshot(req).await?;
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await?.to_bytes();
    Ok((status, headers, String::from_utf8(body.to_vec())?))
}

async fn get(app: axum::Router, uri: &str) -> Result<(StatusCode, Value)> {
    let req = Request::builder().uri(uri).body(Body::empty())?;
    let (status, _, body) = send(app, req).await?;
    Ok((status, serde_json::from_str(&body).unwrap_or(Value::Null)))
}

async fn post_json(app: axum::Router, uri: &str, body: Value) -> Result<(StatusCode, Value)> {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))?;
    let (status, _, body) = send(app, req).await?;
    Ok((status, serde_json::from_str(&body).unwrap_or(Value::Null)))
}

#[tokio::test]
async fn search_with_unreachable_sources_returns_demo_records() -> Result<()> {
    let app = app(&config_for(UNREACHABLE, true))?;

    let (status, body) = post_json(
        app,
        "/api/solicitations/search",
        json!({
            "filters": { "keyword": "cloud" },
            "platforms": ["sam_gov", "fpds"]
        }),
    )
    .await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["synthetic"], true);
    let results = body["results"].as_array().expect("results array");
    assert_eq!(results.len(), 6);
    assert_eq!(body["total"], 6);
    assert_eq!(results[0]["platform"], "sam_gov");
    assert_eq!(results[5]["platform"], "fpds");
    assert!(results[0]["title"]
        .as_str()
        .unwrap_or_default()
        .starts_with("cloud: "));
    Ok(())
}

#[tokio::test]
async fn search_with_unreachable_sources_and_no_fallback_is_empty() -> Result<()> {
    let app = app(&config_for(UNREACHABLE, false))?;

    let (status, body) = post_json(
        app,
        "/api/solicitations/search",
        json!({ "filters": { "keyword": "cloud" }, "platforms": [] }),
    )
    .await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"], json!([]));
    assert_eq!(body["synthetic"], false);
    Ok(())
}

#[tokio::test]
async fn search_concatenates_live_results_in_platform_order() -> Result<()> {
    let server = MockServer::start_async().await;
    let sam = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/opportunities/v2/search")
                .query_param("title", "cloud");
            then.status(200).json_body(json!({
                "opportunitiesData": [{
                    "noticeId": "sam-1",
                    "title": "Cloud Migration",
                    "department": "GENERAL SERVICES ADMINISTRATION",
                    "postedDate": "2024-02-01"
                }]
            }));
        })
        .await;
    let fpds = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/ezsearch/FEEDS/ATOM")
                .query_param("q", "cloud");
            then.status(200).body(FPDS_FEED);
        })
        .await;

    let app = app(&config_for(&server.base_url(), true))?;
    let (status, body) = post_json(
        app,
        "/api/solicitations/search",
        json!({
            "filters": { "keyword": "cloud" },
            "platforms": ["FPDS", "sam.gov", "unknown"]
        }),
    )
    .await?;

    sam.assert_async().await;
    fpds.assert_async().await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["synthetic"], false);
    let ids: Vec<&str> = body["results"]
        .as_array()
        .expect("results array")
        .iter()
        .filter_map(|r| r["id"].as_str())
        .collect();
    assert_eq!(ids, vec!["47QTCA19D00AA", "sam-1"]);
    Ok(())
}

#[tokio::test]
async fn search_with_only_unknown_platforms_queries_nothing() -> Result<()> {
    let server = MockServer::start_async().await;
    let sam = server
        .mock_async(|when, then| {
            when.method(GET).path("/opportunities/v2/search");
            then.status(200).json_body(json!({ "opportunitiesData": [] }));
        })
        .await;
    let fpds = server
        .mock_async(|when, then| {
            when.method(GET).path("/ezsearch/FEEDS/ATOM");
            then.status(200).body(FPDS_FEED);
        })
        .await;

    let app = app(&config_for(&server.base_url(), true))?;
    let (status, body) = post_json(
        app,
        "/api/solicitations/search",
        json!({ "filters": { "keyword": "cloud" }, "platforms": ["ebay"] }),
    )
    .await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 0);
    assert_eq!(body["results"], json!([]));
    assert_eq!(body["synthetic"], false);
    sam.assert_hits_async(0).await;
    fpds.assert_hits_async(0).await;
    Ok(())
}

#[tokio::test]
async fn search_tolerates_null_and_mistyped_fields() -> Result<()> {
    let config = config_for(UNREACHABLE, true);

    let (status, body) = post_json(
        app(&config)?,
        "/api/solicitations/search",
        json!({ "filters": null, "platforms": ["fpds"] }),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 0);
    assert_eq!(body["synthetic"], false);

    let (status, body) = post_json(
        app(&config)?,
        "/api/solicitations/search",
        json!({ "filters": { "keyword": "cloud", "limit": -1 }, "platforms": "fpds" }),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["synthetic"], true);
    assert_eq!(body["total"], 3);
    let platforms: Vec<&str> = body["results"]
        .as_array()
        .expect("results array")
        .iter()
        .filter_map(|r| r["platform"].as_str())
        .collect();
    assert_eq!(platforms, vec!["fpds", "fpds", "fpds"]);

    let (status, body) = post_json(app(&config)?, "/api/solicitations/search", Value::Null).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body["results"].is_array());
    Ok(())
}

#[tokio::test]
async fn search_rejects_malformed_json() -> Result<()> {
    let app = app(&config_for(UNREACHABLE, true))?;
    let req = Request::builder()
        .method("POST")
        .uri("/api/solicitations/search")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"filters\": "))?;

    let (status, _, body) = send(app, req).await?;
    let body: Value = serde_json::from_str(&body)?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    Ok(())
}

#[tokio::test]
async fn fpds_proxy_requires_query() -> Result<()> {
    let config = config_for(UNREACHABLE, true);

    let (status, body) = get(app(&config)?, "/api/fpds").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required query parameter: q");

    let (status, _) = get(app(&config)?, "/api/fpds?q=%20%20").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn fpds_proxy_returns_raw_feed_with_cache_header() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/ezsearch/FEEDS/ATOM")
                .query_param("FEEDNAME", "PUBLIC")
                .query_param("q", "PIID:47QTCA19D00AA")
                .query_param("start", "10");
            then.status(200).body(FPDS_FEED);
        })
        .await;

    let app = app(&config_for(&server.base_url(), true))?;
    let req = Request::builder()
        .uri("/api/fpds?q=PIID%3A47QTCA19D00AA&start=10")
        .body(Body::empty())?;
    let (status, headers, body) = send(app, req).await?;

    mock.assert_async().await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()),
        Some("application/atom+xml; charset=utf-8")
    );
    assert_eq!(
        headers.get(header::CACHE_CONTROL).and_then(|v| v.to_str().ok()),
        Some("public, max-age=60, s-maxage=60")
    );
    assert_eq!(body, FPDS_FEED);
    Ok(())
}

#[tokio::test]
async fn fpds_proxy_upstream_failure_is_bad_gateway() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/ezsearch/FEEDS/ATOM");
            then.status(500).body("internal error");
        })
        .await;

    let app = app(&config_for(&server.base_url(), true))?;
    let (status, body) = get(app, "/api/fpds?q=cloud").await?;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap_or_default().contains("FPDS"));
    Ok(())
}

#[tokio::test]
async fn fpds_contracts_parses_feed() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/ezsearch/FEEDS/ATOM")
                .query_param("q", "VENDOR_NAME:\"ACME CLOUD LLC\"")
                .query_param("start", "0")
                .query_param("sortBy", "SIGNED_DATE");
            then.status(200).body(FPDS_FEED);
        })
        .await;

    let app = app(&config_for(&server.base_url(), true))?;
    let (status, body) = get(app, "/api/fpds/contracts?vendorName=ACME%20CLOUD%20LLC").await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["query"], "VENDOR_NAME:\"ACME CLOUD LLC\"");
    assert_eq!(body["records"][0]["piid"], "47QTCA19D00AA");
    assert_eq!(body["records"][0]["vendorName"], "ACME CLOUD LLC");
    assert_eq!(body["nextStart"], 10);
    assert_eq!(body["synthetic"], false);
    Ok(())
}

#[tokio::test]
async fn fpds_contracts_passes_requested_sort() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/ezsearch/FEEDS/ATOM")
                .query_param("q", "PIID:47QTCA19D00AA")
                .query_param("sortBy", "OBLIGATED_AMOUNT")
                .query_param("desc", "N");
            then.status(200).body(FPDS_FEED);
        })
        .await;

    let app = app(&config_for(&server.base_url(), true))?;
    let (status, body) = get(
        app,
        "/api/fpds/contracts?piid=47QTCA19D00AA&sortBy=obligatedAmount&desc=N",
    )
    .await?;

    mock.assert_async().await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["records"][0]["piid"], "47QTCA19D00AA");
    Ok(())
}

#[tokio::test]
async fn fpds_contracts_validates_parameters() -> Result<()> {
    let config = config_for(UNREACHABLE, true);

    let (status, body) = get(app(&config)?, "/api/fpds/contracts").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = get(app(&config)?, "/api/fpds/contracts?piid=ABC&start=minus").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get(app(&config)?, "/api/fpds/contracts?piid=ABC&sortBy=vendor").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get(app(&config)?, "/api/fpds/contracts?piid=ABC&desc=maybe").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn fpds_contracts_falls_back_to_demo_records() -> Result<()> {
    let app = app(&config_for(UNREACHABLE, true))?;
    let (status, body) = get(
        app,
        "/api/fpds/contracts?signedDateFrom=2024/01/01&signedDateTo=2024/03/31",
    )
    .await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["query"], "SIGNED_DATE:[2024/01/01 TO 2024/03/31]");
    assert_eq!(body["synthetic"], true);
    assert_eq!(body["records"].as_array().map(Vec::len), Some(3));
    Ok(())
}

#[tokio::test]
async fn health_lists_registered_platforms() -> Result<()> {
    let mut config = config_for(UNREACHABLE, true);
    let (status, body) = get(app(&config)?, "/api/health").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["platforms"], json!(["sam_gov", "fpds"]));

    config.municipal.enabled = true;
    let (_, body) = get(app(&config)?, "/api/health").await?;
    assert_eq!(body["platforms"], json!(["sam_gov", "fpds", "municipal"]));
    Ok(())
}
