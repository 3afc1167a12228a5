use gridmate::proxy::{ProxyConfig, serve};

async fn spawn_relay(base_url: &str) -> String {
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let config = ProxyConfig {
        api_key: "test-key".to_string(),
        base_url: base_url.to_string(),
        model: "test-model".to_string(),
    };
    tokio::spawn(async move {
        let _ = serve(listener, config).await;
    });
    format!("http://{addr}/")
}

#[tokio::test]
async fn non_post_is_rejected_with_405() {
    let url = spawn_relay("http://127.0.0.1:1").await;
    let response = reqwest::get(&url).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn missing_fields_are_rejected_with_400() {
    let url = spawn_relay("http://127.0.0.1:1").await;
    let client = reqwest::Client::new();

    for body in ["{}", "{\"userPrompt\": \"x\"}", "{\"tableData\": []}", "not json"] {
        let response = client
            .post(&url)
            .header("content-type", "application/json")
            .body(body.to_string())
            .send()
            .await
            .unwrap();
        assert_eq!(
            response.status(),
            reqwest::StatusCode::BAD_REQUEST,
            "body: {body}"
        );
        let payload: serde_json::Value = response.json().await.unwrap();
        assert_eq!(payload["error"], "Invalid request body");
    }
}

#[tokio::test]
async fn upstream_failure_surfaces_as_500_with_detail() {
    // Nothing listens on the upstream address, so forwarding must fail.
    let url = spawn_relay("http://127.0.0.1:1").await;
    let client = reqwest::Client::new();
    let response = client
        .post(&url)
        .json(&serde_json::json!({
            "userPrompt": "sort by age",
            "tableData": [{"name": "a", "age": "3"}],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(
        response.status(),
        reqwest::StatusCode::INTERNAL_SERVER_ERROR
    );
    let payload: serde_json::Value = response.json().await.unwrap();
    assert!(payload["error"].is_string());
}
