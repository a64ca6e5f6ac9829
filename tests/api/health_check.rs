use crate::helpers::spawn_app;

#[tokio::test]
async fn health_check_works() {
    // Arrange
    let app = spawn_app().await;

    // Act
    let response = app.get("/health").await;

    // Assert
    assert!(response.status().is_success());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, serde_json::json!({"ok": true}));
}

#[tokio::test]
async fn root_reports_the_service_as_running() {
    let app = spawn_app().await;

    let response = app.get("/").await;

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, serde_json::json!({"status": "running"}));
}

#[tokio::test]
async fn health_is_unaffected_by_a_failing_gateway() {
    let app = spawn_app().await;
    wiremock::Mock::given(wiremock::matchers::any())
        .respond_with(wiremock::ResponseTemplate::new(503))
        .mount(&app.gateway_server)
        .await;

    let run = app.post_run("?iterations=1", None).await;
    let health = app.get("/health").await;

    assert_eq!(run.status().as_u16(), 500);
    assert_eq!(health.status().as_u16(), 200);
}
