use super::*;

#[tokio::test]
async fn test_generate_returns_response_text() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/generate")
        .match_header("content-type", "application/json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"model":"test-model","response":"preamble【【【【【 spec 【【【【【 summary","done":true}"#,
        )
        .create_async()
        .await;

    let client = reqwest::Client::new();
    let response = generate(
        &client,
        &server.url(),
        ModelName("test-model".to_string()),
        "prompt".to_string(),
    )
    .await
    .unwrap();

    assert_eq!(response.response, "preamble【【【【【 spec 【【【【【 summary");
    assert!(response.done);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_malformed_body_is_an_upstream_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/generate")
        .with_status(200)
        .with_body("not json")
        .create_async()
        .await;

    let client = reqwest::Client::new();
    let err = generate(
        &client,
        &server.url(),
        ModelName("test-model".to_string()),
        "prompt".to_string(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, AppError::Upstream(_)));
}

#[tokio::test]
async fn test_connection_failure_is_an_upstream_error() {
    let client = reqwest::Client::new();
    // 何も聞いていないポートに向ける
    let err = generate(
        &client,
        "http://127.0.0.1:1/api",
        ModelName("test-model".to_string()),
        "prompt".to_string(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, AppError::Upstream(_)));
}
