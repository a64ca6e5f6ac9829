use std::sync::Arc;

use serde_json::Value;

use crate::domain::{AmountRange, CardRecord, Transaction};
use crate::payment_gateway::{
    CheckoutData, PaymentData, PaymentGatewayClient, RemoteCallError, Stage,
};
use crate::profile_source::{CustomerProfileSource, DataSourceError};
use crate::synthetic_data::SyntheticDataProvider;
use crate::telemetry::error_chain_fmt;

/// Runs one simulated purchase end to end: tokenize the card, open a
/// checkout for a sampled customer, then pay the checkout with the token.
pub struct PaymentPipeline {
    gateway: PaymentGatewayClient,
    profiles: Arc<CustomerProfileSource>,
    synthetic: Arc<SyntheticDataProvider>,
    amounts: AmountRange,
}

#[derive(Debug)]
pub struct PipelineResult {
    pub transaction: Transaction,
    pub checkout_id: String,
    pub payment: Value,
}

#[derive(thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    RemoteCall(#[from] RemoteCallError),
    #[error("No customer profile could be produced")]
    DataSource(#[from] DataSourceError),
}

impl std::fmt::Debug for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl PipelineError {
    /// The remote call that failed, if the failure happened at one.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PipelineError::RemoteCall(e) => Some(e.stage),
            PipelineError::DataSource(_) => None,
        }
    }
}

impl PaymentPipeline {
    pub fn new(
        gateway: PaymentGatewayClient,
        profiles: Arc<CustomerProfileSource>,
        synthetic: Arc<SyntheticDataProvider>,
        amounts: AmountRange,
    ) -> Self {
        Self {
            gateway,
            profiles,
            synthetic,
            amounts,
        }
    }

    /// Any failed step aborts the remaining ones.
    #[tracing::instrument(
        name = "Executing payment pipeline",
        skip_all,
        fields(card = %card.masked_number(), checkout_id = tracing::field::Empty)
    )]
    pub async fn execute(&self, card: &CardRecord) -> Result<PipelineResult, PipelineError> {
        let tokenization = self.gateway.tokenize(card).await?;

        let customer = self.profiles.sample().await?;
        let transaction = Transaction::random(self.amounts, &mut rand::thread_rng());
        let checkout = self
            .gateway
            .create_checkout(CheckoutData {
                client_order_id: self.synthetic.uuid(),
                customer: &customer,
                transaction,
            })
            .await?;

        let checkout_id = checkout.checkout_id();
        tracing::Span::current().record("checkout_id", tracing::field::display(&checkout_id));
        let card_holder_name = self.synthetic.full_name();
        let payment = self
            .gateway
            .create_payment(PaymentData {
                checkout_id: &checkout_id,
                card,
                card_holder_name: &card_holder_name,
                token: &tokenization,
                transaction,
            })
            .await?;

        tracing::info!(
            amount = transaction.amount,
            currency = %transaction.currency,
            "Payment pipeline completed"
        );
        Ok(PipelineResult {
            transaction,
            checkout_id,
            payment,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{PaymentPipeline, PipelineError};
    use crate::configuration::{DataSourceSettings, GatewaySettings};
    use crate::domain::{AmountRange, CardRecord, CardSelection};
    use crate::payment_gateway::Stage;
    use crate::profile_source::CustomerProfileSource;
    use crate::synthetic_data::SyntheticDataProvider;
    use claims::{assert_err, assert_matches, assert_ok};
    use serde_json::json;
    use std::path::PathBuf;
    use std::sync::Arc;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_card() -> CardRecord {
        serde_json::from_value(json!({
            "number": "4242424242424242",
            "cvv": "123",
            "month": "06",
            "year": "30"
        }))
        .unwrap()
    }

    fn pipeline_for(mock_server: &MockServer) -> PaymentPipeline {
        let gateway = GatewaySettings {
            client_id: "client_002".into(),
            form_id: "250729103005965673".into(),
            merchant_id: "1110020135".into(),
            tokenization_url: format!("{}/tokenize", mock_server.uri()),
            checkout_url: format!("{}/checkout", mock_server.uri()),
            payment_url: format!("{}/payment", mock_server.uri()),
            tokenization_timeout_milliseconds: 2_000,
            checkout_timeout_milliseconds: 2_000,
            payment_timeout_milliseconds: 2_000,
            amount_min: 1,
            amount_max: 4000,
        };
        let synthetic = Arc::new(SyntheticDataProvider::seeded(7));
        let data_sources = DataSourceSettings {
            csv_path: None,
            cards_path: PathBuf::from("unused.json"),
            card_selection: CardSelection::Random,
            synthetic_data_seed: Some(7),
        };
        let profiles = Arc::new(CustomerProfileSource::new(&data_sources, synthetic.clone()));
        PaymentPipeline::new(
            gateway.client().unwrap(),
            profiles,
            synthetic,
            AmountRange::new(gateway.amount_min, gateway.amount_max),
        )
    }

    async fn mount_tokenize(mock_server: &MockServer) {
        Mock::given(path("/tokenize"))
            .and(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "creditCard": "tok123",
                "cvv": "tok456",
                "transactionId": "250808"
            })))
            .expect(1)
            .mount(mock_server)
            .await;
    }

    #[tokio::test]
    async fn a_flat_checkout_id_is_forwarded_to_the_payment() {
        // Arrange
        let mock_server = MockServer::start().await;
        mount_tokenize(&mock_server).await;
        Mock::given(path("/checkout"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"checkoutId": "chk1"})))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(path("/payment"))
            .and(body_partial_json(json!({
                "checkoutId": "chk1",
                "cardData": {
                    "encryptedCreditCardNumber": "tok123",
                    "encryptedCvv": "tok456",
                    "pciProxyTransactionId": "250808"
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
            .expect(1)
            .mount(&mock_server)
            .await;
        let pipeline = pipeline_for(&mock_server);

        // Act
        let outcome = pipeline.execute(&test_card()).await;

        // Assert
        let result = assert_ok!(outcome);
        assert_eq!(result.checkout_id, "chk1");
        assert_eq!(result.payment["status"], "ok");
        assert!((1..=4000).contains(&result.transaction.amount));
    }

    #[tokio::test]
    async fn a_nested_checkout_id_is_forwarded_to_the_payment() {
        let mock_server = MockServer::start().await;
        mount_tokenize(&mock_server).await;
        Mock::given(path("/checkout"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"data": {"checkoutId": "chk2"}})),
            )
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(path("/payment"))
            .and(body_partial_json(json!({"checkoutId": "chk2"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let result = assert_ok!(pipeline_for(&mock_server).execute(&test_card()).await);

        assert_eq!(result.checkout_id, "chk2");
    }

    #[tokio::test]
    async fn the_checkout_and_payment_share_the_same_transaction() {
        let mock_server = MockServer::start().await;
        mount_tokenize(&mock_server).await;
        Mock::given(path("/checkout"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"checkoutId": "chk1"})))
            .mount(&mock_server)
            .await;
        Mock::given(path("/payment"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&mock_server)
            .await;

        assert_ok!(pipeline_for(&mock_server).execute(&test_card()).await);

        let requests = mock_server.received_requests().await.unwrap();
        let body_of = |p: &str| -> serde_json::Value {
            let request = requests.iter().find(|r| r.url.path() == p).unwrap();
            serde_json::from_slice(&request.body).unwrap()
        };
        assert_eq!(
            body_of("/checkout")["transaction"],
            body_of("/payment")["transaction"]
        );
    }

    #[tokio::test]
    async fn a_failed_checkout_aborts_before_the_payment() {
        let mock_server = MockServer::start().await;
        mount_tokenize(&mock_server).await;
        Mock::given(path("/checkout"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(path("/payment"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let error = assert_err!(pipeline_for(&mock_server).execute(&test_card()).await);

        assert_matches!(&error, PipelineError::RemoteCall(_));
        assert_eq!(error.stage(), Some(Stage::Checkout));
    }

    #[tokio::test]
    async fn a_failed_tokenization_aborts_before_the_checkout() {
        let mock_server = MockServer::start().await;
        Mock::given(path("/tokenize"))
            .respond_with(ResponseTemplate::new(400))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(path("/checkout"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let error = assert_err!(pipeline_for(&mock_server).execute(&test_card()).await);

        assert_eq!(error.stage(), Some(Stage::Tokenize));
    }
}
