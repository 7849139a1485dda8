//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for the directory site (and the
//! rendering API) and run the full crawl cycle end-to-end through the real
//! HTTP fetcher.

use doualazoom_crawler::config::Config;
use doualazoom_crawler::crawler::{crawl, Coordinator, HttpFetcher};
use doualazoom_crawler::output::{DedupSink, VecSink};
use doualazoom_crawler::Company;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointed at the mock server
fn create_test_config(base_url: &str, start_letter: &str) -> Config {
    let mut config = Config::default();
    config.crawler.start_letter = start_letter.to_string();
    config.crawler.max_concurrent_requests = 4;
    config.site.base_url = base_url.to_string();
    config.fetch.timeout_secs = 5;
    config.fetch.max_retries = 0;
    config.fetch.retry_delay_ms = 10;
    config
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8")
}

fn listing_page(hrefs: &[&str]) -> String {
    let items: String = hrefs
        .iter()
        .map(|href| {
            format!(
                r#"<div class="div_list_nomentreprise"><a href="{}">Company</a></div>"#,
                href
            )
        })
        .collect();
    format!("<html><body><div id=\"liste\">{}</div></body></html>", items)
}

fn acme_detail() -> String {
    r#"<html><head><title>Acme SARL - Doualazoom</title></head><body>
        <h2> Acme <span>SARL</span> </h2>
        <p>Téléphone : <a href="tel:+237600000001">+237 6 00 00 00 01</a></p>
        <p><img alt="WhatsApp"> WhatsApp <a href="tel:+237600000002">+237 6 00 00 00 02</a></p>
        <p><a href="mailto:contact@acme.cm">contact@acme.cm</a></p>
        <p><a href="https://www.acme.cm">Site web</a>
           <a href="https://www.doualazoom.com/fr/accueil">Accueil</a></p>
        <div class="adresse">Situé à Akwa, <b>Douala</b></div>
        <a href="/fr/activite/rubrique/42/btp">BTP</a>
        <a href="/fr/activite/rubrique/7/immobilier">Immobilier</a>
    </body></html>"#
        .to_string()
}

fn bare_detail() -> String {
    "<html><head><title>  Beta Services  </title></head><body><p>Aucune info</p></body></html>"
        .to_string()
}

/// Mounts a site with two companies under 'Z' and an empty second page
async fn mount_letter_z(server: &MockServer) {
    // page=2 first so it wins over the bare listing path
    Mock::given(method("GET"))
        .and(path("/fr/activite/alpha/Z"))
        .and(query_param("page", "2"))
        .respond_with(html(listing_page(&[])))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/fr/activite/alpha/Z"))
        .respond_with(html(listing_page(&["/fr/entreprise/1/acme", "/fr/entreprise/2/beta"])))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_details(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/fr/entreprise/1/acme"))
        .respond_with(html(acme_detail()))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/fr/entreprise/2/beta"))
        .respond_with(html(bare_detail()))
        .expect(1)
        .mount(server)
        .await;
}

fn find<'a>(records: &'a [Company], name: &str) -> &'a Company {
    records
        .iter()
        .find(|c| c.name == name)
        .unwrap_or_else(|| panic!("no record named {:?} in {:?}", name, records))
}

#[tokio::test]
async fn test_full_crawl_single_letter() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    mount_letter_z(&mock_server).await;
    mount_details(&mock_server).await;

    let config = create_test_config(&base_url, "Z");
    let fetcher = Arc::new(HttpFetcher::new(config.fetch.clone()).unwrap());
    let coordinator = Coordinator::new(&config, fetcher).unwrap();

    let (sink, stats) = coordinator
        .run(DedupSink::new(VecSink::new()))
        .await
        .expect("Crawl failed");
    let records = sink.into_inner().records;

    assert_eq!(records.len(), 2);
    assert_eq!(stats.listing_pages_fetched, 2);
    assert_eq!(stats.detail_pages_fetched, 2);
    assert_eq!(stats.fetch_failures, 0);

    let acme = find(&records, "Acme SARL");
    assert_eq!(acme.phones, vec!["+237 6 00 00 00 01"]);
    assert_eq!(acme.whatsapp, vec!["+237 6 00 00 00 02"]);
    assert_eq!(acme.emails, vec!["contact@acme.cm"]);
    assert_eq!(acme.website, vec!["https://www.acme.cm"]);
    assert_eq!(acme.localisation, "Situé à Akwa, Douala");
    assert_eq!(acme.sectors, vec!["BTP", "Immobilier"]);
    assert_eq!(acme.detail_url, format!("{}/fr/entreprise/1/acme", base_url));

    let beta = find(&records, "Beta Services");
    assert!(beta.phones.is_empty());
    assert!(beta.whatsapp.is_empty());
    assert!(beta.emails.is_empty());
    assert!(beta.website.is_empty());
    assert_eq!(beta.localisation, "");
    assert!(beta.sectors.is_empty());
}

#[tokio::test]
async fn test_crawl_writes_json_lines_file() {
    let mock_server = MockServer::start().await;
    mount_letter_z(&mock_server).await;
    mount_details(&mock_server).await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("companies.jsonl");

    let mut config = create_test_config(&mock_server.uri(), "Z");
    config.output.path = output.display().to_string();

    let stats = crawl(config).await.expect("Crawl failed");
    assert_eq!(stats.records_written, 2);

    let content = std::fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);

    for line in lines {
        let value: serde_json::Value = serde_json::from_str(line).unwrap();
        let object = value.as_object().unwrap();
        for key in [
            "name",
            "phones",
            "whatsapp",
            "emails",
            "website",
            "localisation",
            "sectors",
            "detail_url",
        ] {
            assert!(object.contains_key(key), "missing {} in {}", key, line);
        }
    }
}

#[tokio::test]
async fn test_failed_listing_emits_nothing() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/fr/activite/alpha/Z"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), "Z");
    let fetcher = Arc::new(HttpFetcher::new(config.fetch.clone()).unwrap());
    let (sink, stats) = Coordinator::new(&config, fetcher)
        .unwrap()
        .run(VecSink::new())
        .await
        .unwrap();

    assert!(sink.records.is_empty());
    assert_eq!(stats.fetch_failures, 1);
    assert_eq!(stats.listing_pages_fetched, 0);
}

#[tokio::test]
async fn test_non_html_listing_is_a_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/fr/activite/alpha/Z"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("%PDF-1.4", "application/pdf"))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), "Z");
    let fetcher = Arc::new(HttpFetcher::new(config.fetch.clone()).unwrap());
    let (sink, stats) = Coordinator::new(&config, fetcher)
        .unwrap()
        .run(VecSink::new())
        .await
        .unwrap();

    assert!(sink.records.is_empty());
    assert_eq!(stats.fetch_failures, 1);
}

#[tokio::test]
async fn test_detail_pages_go_through_render_endpoint() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    mount_letter_z(&mock_server).await;

    let acme_url = format!("{}/fr/entreprise/1/acme", base_url);
    let beta_url = format!("{}/fr/entreprise/2/beta", base_url);

    Mock::given(method("POST"))
        .and(path("/v1/extract"))
        .and(body_partial_json(serde_json::json!({ "url": acme_url, "browserHtml": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "url": acme_url,
            "browserHtml": acme_detail(),
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/extract"))
        .and(body_partial_json(serde_json::json!({ "url": beta_url })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "url": beta_url,
            "browserHtml": bare_detail(),
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&base_url, "Z");
    config.fetch.render_endpoint = Some(format!("{}/v1/extract", base_url));
    config.fetch.api_key = Some("test-key".to_string());

    let fetcher = Arc::new(HttpFetcher::new(config.fetch.clone()).unwrap());
    let (sink, _) = Coordinator::new(&config, fetcher)
        .unwrap()
        .run(VecSink::new())
        .await
        .unwrap();

    assert_eq!(sink.records.len(), 2);
    let acme = find(&sink.records, "Acme SARL");
    assert_eq!(acme.detail_url, acme_url);
    assert_eq!(acme.whatsapp, vec!["+237 6 00 00 00 02"]);

    // Detail pages must never be fetched directly when rendering is configured
    let direct_detail_hits = mock_server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.method.to_string() == "GET" && r.url.path().starts_with("/fr/entreprise/"))
        .count();
    assert_eq!(direct_detail_hits, 0);
}
