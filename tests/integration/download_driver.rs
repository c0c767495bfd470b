//! Download command driving a registry client end to end

use async_trait::async_trait;
use clap::Parser;
use eprel_downloader::cli::{Cli, CliError, Commands, DownloadArgs, OutputFormat};
use eprel_downloader::fetcher::{EprelClient, HttpRequest, HttpResponse, Transport, TransportError};
use eprel_downloader::shutdown::{ShutdownCoordinator, SharedShutdown};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::support::{listing, scripted_client, status, test_config, ScriptedTransport};

fn download_args(output: &Path, extra: &[&str]) -> DownloadArgs {
    let mut argv = vec![
        "eprel-downloader".to_string(),
        "download".to_string(),
        "--output".to_string(),
        output.display().to_string(),
    ];
    argv.extend(extra.iter().map(|s| s.to_string()));

    match Cli::try_parse_from(argv).unwrap().command {
        Commands::Download(args) => args,
        other => panic!("unexpected command: {other:?}"),
    }
}

fn snapshots(dir: &Path, category: &str) -> Vec<Value> {
    let prefix = format!("eprel_{category}_");
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    entries
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().starts_with(&prefix))
        .map(|e| serde_json::from_str(&std::fs::read_to_string(e.path()).unwrap()).unwrap())
        .collect()
}

fn http_client(server: &MockServer) -> EprelClient {
    let config = test_config()
        .with_base_url(format!("{}/api", server.uri()))
        .with_labels_base_url(format!("{}/labels", server.uri()))
        .with_max_requests_per_second(50)
        .with_retry_base_delay(Duration::from_millis(10));
    EprelClient::new(config).unwrap()
}

#[tokio::test]
async fn test_listing_only_writes_id_stubs() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/lamps"))
        .and(query_param("from", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"hits": [11, 12], "total": 3})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/lamps"))
        .and(query_param("from", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"hits": [13], "total": 3})))
        .mount(&server)
        .await;

    let out = TempDir::new().unwrap();
    let args = download_args(out.path(), &["-c", "lamps", "--page-size", "2"]);

    args.execute_with_client(&http_client(&server), OutputFormat::Json, ShutdownCoordinator::shared())
        .await
        .unwrap();

    let written = snapshots(out.path(), "lamps");
    assert_eq!(written.len(), 1);
    let snapshot = &written[0];
    assert_eq!(snapshot["source"], "EPREL");
    assert_eq!(snapshot["details_fetched"], false);
    assert_eq!(snapshot["total_products"], 3);
    assert_eq!(snapshot["products"][2], json!({"eprelRegistrationNumber": 13}));
}

#[tokio::test]
async fn test_fetch_details_skips_failed_products() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/televisions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"hits": [1, 2], "total": 2})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/televisions/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"eprelRegistrationNumber": 1, "energyClass": "E"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/televisions/2"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let out = TempDir::new().unwrap();
    let args = download_args(out.path(), &["-c", "televisions", "--fetch-details"]);

    args.execute_with_client(&http_client(&server), OutputFormat::Json, ShutdownCoordinator::shared())
        .await
        .unwrap();

    let snapshot = &snapshots(out.path(), "televisions")[0];
    assert_eq!(snapshot["details_fetched"], true);
    assert_eq!(snapshot["total_products"], 1);
    assert_eq!(snapshot["products"][0]["energyClass"], "E");
}

#[tokio::test]
async fn test_labels_saved_per_category() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/smartphonestablets20231669"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"hits": [5, 6], "total": 2})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/labels/smartphonestablets20231669/Label_5.svg"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<svg>5</svg>"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/labels/smartphonestablets20231669/Label_6.svg"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let out = TempDir::new().unwrap();
    let args = download_args(out.path(), &["-c", "smartphones", "--labels"]);

    args.execute_with_client(&http_client(&server), OutputFormat::Json, ShutdownCoordinator::shared())
        .await
        .unwrap();

    let label_dir = out.path().join("labels").join("smartphones");
    assert_eq!(
        std::fs::read_to_string(label_dir.join("Label_5.svg")).unwrap(),
        "<svg>5</svg>"
    );
    assert!(!label_dir.join("Label_6.svg").exists());
    assert_eq!(snapshots(out.path(), "smartphones").len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_listing_error_keeps_collected_and_moves_on() {
    let (client, transport) = scripted_client(vec![
        listing(0..2, 10),
        status(404),
        listing(100..101, 1),
    ]);

    let out = TempDir::new().unwrap();
    let args = download_args(out.path(), &["-c", "lamps", "-c", "ovens", "--page-size", "2"]);

    let result = args
        .execute_with_client(&client, OutputFormat::Json, ShutdownCoordinator::shared())
        .await;

    assert!(matches!(result, Err(CliError::CategoriesFailed(1))));
    assert_eq!(transport.call_count(), 3);
    assert_eq!(snapshots(out.path(), "lamps")[0]["total_products"], 2);
    assert_eq!(snapshots(out.path(), "ovens")[0]["total_products"], 1);
}

#[tokio::test(start_paused = true)]
async fn test_first_page_failure_fails_category_without_snapshot() {
    let (client, transport) = scripted_client(vec![status(401), listing(100..101, 1)]);

    let out = TempDir::new().unwrap();
    let args = download_args(out.path(), &["-c", "lamps", "-c", "ovens"]);

    let result = args
        .execute_with_client(&client, OutputFormat::Json, ShutdownCoordinator::shared())
        .await;

    assert!(matches!(result, Err(CliError::CategoriesFailed(1))));
    assert_eq!(transport.call_count(), 2);
    assert!(snapshots(out.path(), "lamps").is_empty());
    assert_eq!(snapshots(out.path(), "ovens")[0]["total_products"], 1);
}

#[tokio::test(start_paused = true)]
async fn test_unknown_category_rejected_before_requests() {
    let (client, transport) = scripted_client(vec![listing(0..1, 1)]);
    let out = TempDir::new().unwrap();
    let args = download_args(out.path(), &["-c", "lamps", "-c", "toasters"]);

    let result = args
        .execute_with_client(&client, OutputFormat::Json, ShutdownCoordinator::shared())
        .await;

    assert!(result.is_err());
    assert_eq!(transport.call_count(), 0);
}

/// Transport that requests shutdown as soon as the first page is served
struct InterruptingTransport {
    inner: Arc<ScriptedTransport>,
    shutdown: SharedShutdown,
}

#[async_trait]
impl Transport for InterruptingTransport {
    async fn get(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let response = self.inner.get(request).await;
        self.shutdown.request_shutdown();
        response
    }
}

#[tokio::test(start_paused = true)]
async fn test_interrupt_stops_after_current_page() {
    let shutdown = ShutdownCoordinator::shared();
    let inner = ScriptedTransport::new(vec![listing(0..2, 10), listing(2..4, 10)]);
    let transport = Arc::new(InterruptingTransport {
        inner: inner.clone(),
        shutdown: shutdown.clone(),
    });
    let client = EprelClient::with_transport(test_config(), transport).unwrap();

    let out = TempDir::new().unwrap();
    let args = download_args(
        out.path(),
        &["-c", "lamps", "-c", "ovens", "--page-size", "2", "--fetch-details"],
    );

    args.execute_with_client(&client, OutputFormat::Json, shutdown)
        .await
        .unwrap();

    assert_eq!(inner.call_count(), 1);
    let written = snapshots(out.path(), "lamps");
    assert_eq!(written.len(), 1);
    assert_eq!(written[0]["total_products"], 2);
    assert_eq!(
        written[0]["products"],
        json!([{"eprelRegistrationNumber": 0}, {"eprelRegistrationNumber": 1}])
    );
    assert!(snapshots(out.path(), "ovens").is_empty());
}
