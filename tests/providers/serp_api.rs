//! SerpApi wire-format and fail-soft checks against a local mock server.

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use reach::providers::{SearchProvider, SerpClient};

fn client(server: &MockServer) -> SerpClient {
    SerpClient::new(Some("test-key")).with_base_url(server.uri())
}

#[tokio::test]
async fn search_sends_the_full_query_set_and_caps_results() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("api_key", "test-key"))
        .and(query_param("q", "housing market trends"))
        .and(query_param("num", "2"))
        .and(query_param("location", "United States"))
        .and(query_param("hl", "en"))
        .and(query_param("engine", "google"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "organic_results": [
                {
                    "title": "Housing market cools",
                    "link": "https://example.com/cools",
                    "snippet": "Inventory is up 12% year over year."
                },
                {
                    "title": "Rates hold steady",
                    "link": "https://example.com/rates",
                    "snippet": "Thirty-year fixed stays near 6.5%."
                },
                {
                    "title": "Third result past the cap",
                    "link": "https://example.com/extra",
                    "snippet": "Should be dropped."
                }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let results = client(&server).search("housing market trends", 2).await;

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].title, "Housing market cools");
    assert_eq!(results[0].url, "https://example.com/cools");
    assert_eq!(results[0].snippet, "Inventory is up 12% year over year.");
    server.verify().await;
}

#[tokio::test]
async fn error_status_degrades_to_empty() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream blew up"))
        .expect(1)
        .mount(&server)
        .await;

    let results = client(&server).search("anything", 5).await;
    assert!(results.is_empty());
}

#[tokio::test]
async fn undecodable_body_degrades_to_empty() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>captcha</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let results = client(&server).search("anything", 5).await;
    assert!(results.is_empty());
}
