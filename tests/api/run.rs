use crate::helpers::{spawn_app, spawn_app_with_cards};
use serde_json::{Value, json};
use wiremock::matchers::{any, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn run_uses_the_configured_default_iterations() {
    // Arrange
    let app = spawn_app().await;
    app.mount_successful_gateway().await;

    // Act
    let response = app.post_run("", None).await;

    // Assert
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["iterations"], 2);
    assert_eq!(body["succeeded"], 2);
    assert!(body.get("failures").is_none());
    assert_eq!(app.requests_to("/payment").await.len(), 2);
}

#[tokio::test]
async fn run_accepts_iterations_in_the_query_string() {
    let app = spawn_app().await;
    app.mount_successful_gateway().await;

    let response = app.post_run("?iterations=3", None).await;

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["iterations"], 3);
    assert_eq!(app.requests_to("/tokenize").await.len(), 3);
}

#[tokio::test]
async fn run_accepts_iterations_in_a_json_body() {
    let app = spawn_app().await;
    app.mount_successful_gateway().await;

    let response = app
        .post_run("", Some(json!({"iterations": 1}).to_string()))
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["iterations"], 1);
    assert_eq!(app.requests_to("/checkout").await.len(), 1);
}

#[tokio::test]
async fn the_query_string_wins_over_the_body() {
    let app = spawn_app().await;
    app.mount_successful_gateway().await;

    let response = app
        .post_run("?iterations=1", Some(json!({"iterations": 3}).to_string()))
        .await;

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["iterations"], 1);
}

#[tokio::test]
async fn zero_iterations_means_the_configured_default() {
    let app = spawn_app().await;
    app.mount_successful_gateway().await;

    let response = app.post_run("?iterations=0", None).await;

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["iterations"], 2);
}

#[tokio::test]
async fn run_returns_a_400_for_invalid_data() {
    // Arrange
    let app = spawn_app().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.gateway_server)
        .await;
    let test_cases = vec![
        ("", Some("{iterations: 1".to_string()), "malformed JSON"),
        ("", Some(json!({"iterations": "many"}).to_string()), "non numeric iterations"),
        ("", Some(json!({"iterations": -2}).to_string()), "negative iterations"),
        ("?iterations=abc", None, "non numeric query iterations"),
        ("?iterations=-1", None, "negative query iterations"),
    ];

    for (query, body, description) in test_cases {
        // Act
        let response = app.post_run(query, body).await;

        // Assert
        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 Bad Request when the payload had {}.",
            description
        );
        let error: Value = response
            .json()
            .await
            .expect("The 400 response body was not JSON.");
        assert_eq!(error["status"], "error", "Unexpected body for {}.", description);
    }
}

#[tokio::test]
async fn run_returns_a_500_when_an_iteration_fails() {
    let app = spawn_app().await;
    // The first checkout fails, the second one succeeds
    Mock::given(path("/checkout"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&app.gateway_server)
        .await;
    app.mount_successful_gateway().await;

    let response = app.post_run("?iterations=2", None).await;

    assert_eq!(response.status().as_u16(), 500);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "error");
    assert_eq!(body["iterations"], 2);
    assert_eq!(body["succeeded"], 1);
    assert_eq!(body["failures"][0]["iteration"], 1);
    assert_eq!(body["failures"][0]["stage"], "checkout");
    // Only the iteration that got past checkout reaches the payment endpoint
    assert_eq!(app.requests_to("/payment").await.len(), 1);
}

#[tokio::test]
async fn a_missing_card_list_fails_the_run_but_not_the_service() {
    let app = spawn_app_with_cards(None).await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.gateway_server)
        .await;

    let response = app.post_run("?iterations=1", None).await;

    assert_eq!(response.status().as_u16(), 500);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["succeeded"], 0);
    assert!(body["failures"][0]["stage"].is_null());
    assert_eq!(app.get("/health").await.status().as_u16(), 200);
}

#[tokio::test]
async fn customer_details_from_the_dataset_reach_the_checkout() {
    let app = spawn_app().await;
    app.mount_successful_gateway().await;

    // Two rows, one of them blank: sample enough runs to see both
    let response = app.post_run("?iterations=10", None).await;
    assert_eq!(response.status().as_u16(), 200);

    let checkouts = app.requests_to("/checkout").await;
    assert_eq!(checkouts.len(), 10);
    for request in checkouts {
        let body: Value = serde_json::from_slice(&request.body).unwrap();
        let user = &body["userDetails"];
        for field in [
            "firstName",
            "lastName",
            "email",
            "phone",
            "address",
            "city",
            "state",
            "country",
            "postalCode",
        ] {
            assert!(
                !user[field].as_str().unwrap().trim().is_empty(),
                "{} was blank",
                field
            );
        }
        let phone = user["phone"].as_str().unwrap();
        assert!(phone.len() <= 12 && phone.chars().all(|c| c.is_ascii_digit()));
    }
}
