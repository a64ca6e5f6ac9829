use payment_simulator::configuration::get_configuration;
use payment_simulator::startup::Application;
use payment_simulator::telemetry::{get_subscriber, init_subscriber};
use serde_json::json;
use std::path::PathBuf;
use std::sync::LazyLock;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// Ensure that the `tracing` stack is only initialised once using `LazyLock`
static TRACING: LazyLock<()> = LazyLock::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();
    // We cannot assign the output of `get_subscriber` to a variable based on the
    // value of `TEST_LOG` because the sink is part of the type returned by
    // `get_subscriber`, therefore they are not the same type.
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::stdout);
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::sink);
        init_subscriber(subscriber);
    }
});

pub const TEST_CARDS: &str = r#"[
    {"number": "4242424242424242", "cvv": "123", "month": "06", "year": "30"},
    {"number": "5404000000000001", "cvv": "456", "month": 12, "year": 2031}
]"#;

pub const TEST_PROFILES: &str = "\
First_Name,Last_Name,Email_Address,Address_line1,City,State,Postal_Code
Ursula,Le Guin,ursula@example.com,1 Earthsea Road,Portland,Oregon,97201
,,,,,,
";

pub struct TestApp {
    pub address: String,
    pub gateway_server: MockServer,
    pub api_client: reqwest::Client,
    // Keeps the card list and profile dataset alive for the test's duration
    _data_dir: TempDir,
}

impl TestApp {
    pub async fn post_run(&self, query: &str, body: Option<String>) -> reqwest::Response {
        let mut request = self
            .api_client
            .post(format!("{}/run{}", &self.address, query));
        if let Some(body) = body {
            request = request
                .header("Content-Type", "application/json")
                .body(body);
        }
        request.send().await.expect("Failed to execute request.")
    }

    pub async fn get(&self, route: &str) -> reqwest::Response {
        self.api_client
            .get(format!("{}{}", &self.address, route))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Mount mocks that let every pipeline step succeed.
    pub async fn mount_successful_gateway(&self) {
        Mock::given(path("/tokenize"))
            .and(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "creditCard": "tok123",
                "cvv": "tok456"
            })))
            .mount(&self.gateway_server)
            .await;
        Mock::given(path("/checkout"))
            .and(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"checkoutId": "chk1"})))
            .mount(&self.gateway_server)
            .await;
        Mock::given(path("/payment"))
            .and(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "approved"})))
            .mount(&self.gateway_server)
            .await;
    }

    pub async fn requests_to(&self, route: &str) -> Vec<wiremock::Request> {
        self.gateway_server
            .received_requests()
            .await
            .unwrap()
            .into_iter()
            .filter(|r| r.url.path() == route)
            .collect()
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with_cards(Some(TEST_CARDS)).await
}

/// Spawn the application with the given card list; `None` leaves the
/// configured card file missing.
pub async fn spawn_app_with_cards(cards: Option<&str>) -> TestApp {
    // The first time `initialize` is invoked the code in `TRACING` is executed.
    // All other invocations will instead skip execution.
    LazyLock::force(&TRACING);

    let gateway_server = MockServer::start().await;
    let data_dir = TempDir::new().expect("Failed to create a data directory.");
    let cards_path = data_dir.path().join("cards.json");
    if let Some(cards) = cards {
        std::fs::write(&cards_path, cards).expect("Failed to write the card list.");
    }
    let csv_path: PathBuf = data_dir.path().join("profiles.csv");
    std::fs::write(&csv_path, TEST_PROFILES).expect("Failed to write the profile dataset.");

    // Randomise configuration to ensure test isolation
    let configuration = {
        let mut c = get_configuration();
        // Use a random OS port
        c.application.host = "127.0.0.1".into();
        c.application.port = 0;
        // Runs only happen when a test asks for them
        c.scheduler.enable_loop = false;
        c.scheduler.iterations_per_run = 2;
        c.scheduler.pacing_seconds = 0;
        c.data_sources.cards_path = cards_path;
        c.data_sources.csv_path = Some(csv_path);
        c.gateway.tokenization_url = format!("{}/tokenize", gateway_server.uri());
        c.gateway.checkout_url = format!("{}/checkout", gateway_server.uri());
        c.gateway.payment_url = format!("{}/payment", gateway_server.uri());
        c.gateway.tokenization_timeout_milliseconds = 2_000;
        c.gateway.checkout_timeout_milliseconds = 2_000;
        c.gateway.payment_timeout_milliseconds = 2_000;
        c
    };

    let application = Application::build(configuration)
        .await
        .expect("Failed to build application.");
    let address = format!("http://127.0.0.1:{}", application.port());

    #[allow(clippy::let_underscore_future)]
    let _ = tokio::spawn(application.run_until_stopped());

    TestApp {
        address,
        gateway_server,
        api_client: reqwest::Client::new(),
        _data_dir: data_dir,
    }
}
