//! Integration tests for the DataForSEO client against a mock server.

use std::time::Duration;

use keyplan_core::{Error, KeywordDataProvider, StatusKind};
use keyplan_provider::{DataForSeoClient, ProviderConfig, RequestScheduler, SchedulerConfig};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SEARCH_VOLUME_PATH: &str = "/keywords_data/google_ads/search_volume/live";
const IDEAS_PATH: &str = "/keywords_data/google_ads/keywords_for_keywords/live";

fn fast_scheduler() -> RequestScheduler {
    RequestScheduler::start(
        SchedulerConfig::default()
            .with_min_interval(Duration::ZERO)
            .with_queued_retry_delay(Duration::from_millis(10)),
    )
}

fn client_for(server: &MockServer, scheduler: RequestScheduler) -> DataForSeoClient {
    let config = ProviderConfig {
        base_url: server.uri(),
        ..Default::default()
    }
    .with_credentials("login", "secret");
    DataForSeoClient::new(config, scheduler).expect("Failed to create client")
}

fn task_response(status_code: i64, result: serde_json::Value) -> serde_json::Value {
    let status_message = if status_code == 20000 {
        "Ok."
    } else {
        "Task In Queue."
    };
    json!({
        "status_code": 20000,
        "status_message": "Ok.",
        "tasks": [{
            "status_code": status_code,
            "status_message": status_message,
            "result": result
        }]
    })
}

#[tokio::test]
async fn test_search_volume_sends_sanitized_payload_and_maps_metrics() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SEARCH_VOLUME_PATH))
        .and(header("Authorization", "Basic bG9naW46c2VjcmV0"))
        .and(body_json(json!([{
            "location_code": 2840,
            "language_code": "en",
            "keywords": ["lash serum", "brow gel"],
            "sort_by": "relevance"
        }])))
        .respond_with(ResponseTemplate::new(200).set_body_json(task_response(
            20000,
            json!([
                {"keyword": "lash serum", "search_volume": 1900, "cpc": 1.2, "competition_index": 80, "competition": "HIGH"},
                {"keyword": "brow gel", "search_volume": null, "competition": 0.3},
                {"search_volume": 5}
            ]),
        )))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, fast_scheduler());
    let keywords = vec![
        "lash serum!".to_string(),
        "  lash serum ".to_string(),
        "brow gel".to_string(),
    ];
    let metrics = client.search_volume(&keywords, 2840).await.unwrap();

    assert_eq!(metrics.len(), 2);
    assert_eq!(metrics[0].keyword, "lash serum");
    assert_eq!(metrics[0].search_volume, 1900.0);
    assert_eq!(metrics[0].competition, 80.0);
    assert_eq!(metrics[0].competition_level, "HIGH");
    assert_eq!(metrics[1].search_volume, 0.0);
    assert_eq!(metrics[1].competition, 0.3);
}

#[tokio::test]
async fn test_search_volume_caps_keywords_per_call() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SEARCH_VOLUME_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(task_response(20000, json!([]))))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, fast_scheduler());
    let keywords: Vec<String> = (0..250).map(|i| format!("keyword {i}")).collect();
    client.search_volume(&keywords, 2826).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body[0]["keywords"].as_array().unwrap().len(), 100);
}

#[tokio::test]
async fn test_queued_task_is_retried_transparently() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SEARCH_VOLUME_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(task_response(40202, json!(null))))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(SEARCH_VOLUME_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(task_response(
            20000,
            json!([{"items": [{"keyword": "lash serum", "search_volume": 90}]}]),
        )))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, fast_scheduler());
    let metrics = client
        .search_volume(&["lash serum".to_string()], 2826)
        .await
        .unwrap();

    assert_eq!(metrics.len(), 1);
    assert_eq!(metrics[0].search_volume, 90.0);
}

#[tokio::test]
async fn test_task_error_is_provider_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(IDEAS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status_code": 20000,
            "tasks": [{"status_code": 40501, "status_message": "Invalid Field: 'keywords'.", "result": null}]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server, fast_scheduler());
    let err = client
        .keyword_ideas(&["lash serum".to_string()], 2826)
        .await
        .unwrap_err();

    match err {
        Error::Provider(msg) => assert_eq!(msg, "task error: Invalid Field: 'keywords'."),
        other => panic!("expected provider error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_http_failure_is_provider_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SEARCH_VOLUME_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .mount(&server)
        .await;

    let client = client_for(&server, fast_scheduler());
    let err = client
        .search_volume(&["lash serum".to_string()], 2826)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Provider(ref m) if m.contains("Unauthorized")));
    assert!(err.is_upstream());
}

#[tokio::test]
async fn test_keyword_ideas_are_sanitized_and_deduplicated() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(IDEAS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(task_response(
            20000,
            json!([
                {"keyword": "Lash Serum, UK"},
                {"keyword": "lash serum uk"},
                {"keyword": "best eyelash growth serum"},
                {"keyword": null}
            ]),
        )))
        .mount(&server)
        .await;

    let client = client_for(&server, fast_scheduler());
    let ideas = client
        .keyword_ideas(&["lash serum".to_string()], 2826)
        .await
        .unwrap();

    assert_eq!(ideas, vec!["Lash Serum UK", "lash serum uk", "best eyelash growth serum"]);
}

#[tokio::test]
async fn test_keyword_ideas_by_seed_groups_nested_results() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(IDEAS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(task_response(
            20000,
            json!([
                {"keyword": "lash serum", "items": [{"keyword": "lash serum boots"}]},
                {"keyword": "brow gel", "items": []}
            ]),
        )))
        .mount(&server)
        .await;

    let client = client_for(&server, fast_scheduler());
    let groups = client
        .keyword_ideas_by_seed(&["lash serum".to_string(), "brow gel".to_string()], 2826)
        .await
        .unwrap();

    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].ideas[0].keyword(), Some("lash serum boots"));
    assert!(groups[1].ideas.is_empty());
}

#[tokio::test]
async fn test_check_reports_ok_and_empty() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SEARCH_VOLUME_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(task_response(
            20000,
            json!([{"keyword": "buy laptop", "search_volume": 90500}]),
        )))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(SEARCH_VOLUME_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(task_response(20000, json!([]))))
        .mount(&server)
        .await;

    let client = client_for(&server, fast_scheduler());

    let first = client.check(2840).await;
    assert_eq!(first.status, StatusKind::Ok);
    assert_eq!(first.status_code, Some(20000));
    assert_eq!(first.items_count, 1);

    let second = client.check(2840).await;
    assert_eq!(second.status, StatusKind::Empty);
    assert_eq!(second.items_count, 0);
}

#[tokio::test]
async fn test_check_reports_task_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SEARCH_VOLUME_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tasks": [{"status_code": 40100, "status_message": "You are not authorized.", "result": null}]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server, fast_scheduler());
    let check = client.check(2826).await;

    assert_eq!(check.status, StatusKind::Error);
    assert_eq!(check.message, "You are not authorized.");
    assert_eq!(check.status_code, Some(40100));
}
