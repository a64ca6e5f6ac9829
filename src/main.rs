use payment_simulator::configuration::get_configuration;
use payment_simulator::startup::Application;
use payment_simulator::telemetry::{get_subscriber, init_subscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = get_subscriber("payment_simulator".into(), "info".into(), std::io::stdout);
    init_subscriber(subscriber);

    let configuration = get_configuration();
    let application = Application::build(configuration).await?;
    application.run_until_stopped().await?;
    Ok(())
}
