//! Registry client against a mock HTTP server

use eprel_downloader::downloader::ClientConfig;
use eprel_downloader::fetcher::{EprelClient, FetcherError};
use eprel_downloader::LabelDownload;
use futures_util::StreamExt;
use serde_json::json;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer, api_key: Option<&str>) -> EprelClient {
    let config = ClientConfig::default()
        .with_base_url(format!("{}/api/v1", server.uri()))
        .with_labels_base_url(format!("{}/labels", server.uri()))
        .with_api_key(api_key.map(str::to_string))
        .with_max_requests_per_second(50)
        .with_retry_base_delay(Duration::from_millis(10));
    EprelClient::new(config).unwrap()
}

#[tokio::test]
async fn test_get_product_sends_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/televisions/123456"))
        .and(header("x-api-key", "test-key"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "eprelRegistrationNumber": 123456,
            "energyClass": "F"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Some("test-key"));
    let product = client.get_product("televisions", "123456").await.unwrap();

    assert_eq!(product["energyClass"], "F");
}

#[tokio::test]
async fn test_no_api_key_header_without_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/lamps/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    client.get_product("lamps", "1").await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(!requests[0].headers.contains_key("x-api-key"));
}

#[tokio::test]
async fn test_get_product_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/lamps/999"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such product"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let err = client.get_product("lamps", "999").await.unwrap_err();

    assert_eq!(err.status(), Some(404));
    assert!(err.to_string().contains("no such product"));
}

#[tokio::test]
async fn test_list_products_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/dishwashers"))
        .and(query_param("manufacturer", ""))
        .and(query_param("tradeMark", ""))
        .and(query_param("from", "20"))
        .and(query_param("size", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "hits": [21, 22, 23],
            "total": 23
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let page = client.list_products("dishwashers", 2, 10).await.unwrap();

    assert_eq!(page.len(), 3);
    assert_eq!(page.total, 23);
}

#[tokio::test]
async fn test_fetch_all_products_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/ovens"))
        .and(query_param("from", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "hits": [1, 2],
            "total": 3
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/ovens"))
        .and(query_param("from", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "hits": [3],
            "total": 3
        })))
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let ids: Vec<_> = client
        .fetch_all_products("ovens", None, 2)
        .unwrap()
        .map(|batch| batch.unwrap())
        .collect::<Vec<_>>()
        .await
        .concat();

    assert_eq!(ids, vec![json!(1), json!(2), json!(3)]);
}

#[tokio::test]
async fn test_server_error_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/tyres/5"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/tyres/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 5})))
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let product = client.get_product("tyres", "5").await.unwrap();

    assert_eq!(product["id"], 5);
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_download_label_writes_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/labels/smartphonestablets20231669/Label_77.svg"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<svg/>"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let target = dir.path().join("labels").join("smartphones");
    let client = client_for(&server, None);

    let result = client
        .download_label("smartphones", "77", &target)
        .await
        .unwrap();

    let path = result.path().unwrap();
    assert_eq!(path, target.join("Label_77.svg"));
    assert_eq!(std::fs::read_to_string(path).unwrap(), "<svg/>");
}

#[tokio::test]
async fn test_download_label_unavailable_leaves_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/labels/lamps/Label_404.svg"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let target = dir.path().join("labels");
    let client = client_for(&server, None);

    let result = client.download_label("lamps", "404", &target).await.unwrap();

    assert_eq!(result, LabelDownload::Unavailable);
    assert!(!target.join("Label_404.svg").exists());
    assert!(!target.exists(), "directory created for an unavailable label");
}

#[tokio::test]
async fn test_label_url_shape() {
    let server = MockServer::start().await;
    let client = client_for(&server, None);

    assert_eq!(
        client.label_url("washingmachines", "42").unwrap(),
        format!("{}/labels/washingmachines/Label_42.svg", server.uri())
    );
    assert!(matches!(
        client.label_url("toasters", "42"),
        Err(FetcherError::UnknownCategory { .. })
    ));
}

#[tokio::test]
async fn test_unknown_category_sends_nothing() {
    let server = MockServer::start().await;
    let client = client_for(&server, None);
    let dir = TempDir::new().unwrap();

    assert!(client.get_product("toasters", "1").await.is_err());
    assert!(client.list_products("toasters", 0, 10).await.is_err());
    assert!(client.download_label("toasters", "1", dir.path()).await.is_err());

    assert!(server.received_requests().await.unwrap().is_empty());
}
