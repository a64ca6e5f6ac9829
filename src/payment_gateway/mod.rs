mod error;
mod payloads;
mod responses;

pub use error::{RemoteCallError, RemoteCallFailure, Stage};
pub use payloads::{CardData, CheckoutRequest, PaymentRequest, TokenizeForm};
pub use responses::{CheckoutResult, TokenizationResult};

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use secrecy::ExposeSecret;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::{CardRecord, CustomerProfile, Transaction};

/// Identifiers the sandbox expects in every outbound payload.
#[derive(Clone, Debug)]
pub struct MerchantIdentifiers {
    pub client_id: String,
    pub form_id: String,
    pub merchant_id: String,
}

#[derive(Clone, Debug)]
pub struct Endpoint {
    pub url: String,
    pub timeout: Duration,
}

#[derive(Clone, Debug)]
pub struct GatewayEndpoints {
    pub tokenization: Endpoint,
    pub checkout: Endpoint,
    pub payment: Endpoint,
}

/// HTTP client for the tokenization, checkout and payment endpoints.
#[derive(Clone, Debug)]
pub struct PaymentGatewayClient {
    http_client: Client,
    identifiers: MerchantIdentifiers,
    endpoints: GatewayEndpoints,
}

#[derive(Debug)]
pub struct CheckoutData<'a> {
    pub client_order_id: Uuid,
    pub customer: &'a CustomerProfile,
    pub transaction: Transaction,
}

#[derive(Debug)]
pub struct PaymentData<'a> {
    pub checkout_id: &'a str,
    pub card: &'a CardRecord,
    pub card_holder_name: &'a str,
    pub token: &'a TokenizationResult,
    pub transaction: Transaction,
}

impl PaymentGatewayClient {
    pub fn new(
        identifiers: MerchantIdentifiers,
        endpoints: GatewayEndpoints,
    ) -> Result<Self, reqwest::Error> {
        // Timeouts differ per endpoint and are set on each request.
        let http_client = Client::builder().build()?;
        Ok(Self {
            http_client,
            identifiers,
            endpoints,
        })
    }

    #[tracing::instrument(
        name = "Tokenizing card",
        skip_all,
        fields(card = %card.masked_number())
    )]
    pub async fn tokenize(&self, card: &CardRecord) -> Result<TokenizationResult, RemoteCallError> {
        let stage = Stage::Tokenize;
        let form = TokenizeForm::new(
            &self.identifiers,
            card.number.expose_secret(),
            card.cvv.expose_secret(),
            &card.month,
            &card.year,
        );
        tracing::info!(
            %stage,
            url = %self.endpoints.tokenization.url,
            "Sending tokenization request"
        );
        let response = self
            .http_client
            .post(&self.endpoints.tokenization.url)
            .timeout(self.endpoints.tokenization.timeout)
            .form(&form)
            .send()
            .await
            .map_err(|e| RemoteCallError::new(stage, RemoteCallFailure::Transport(e)))?;
        let body = read_json_body(stage, response, |status| status.is_success()).await?;
        Ok(body.into())
    }

    #[tracing::instrument(name = "Creating checkout", skip_all)]
    pub async fn create_checkout(
        &self,
        data: CheckoutData<'_>,
    ) -> Result<CheckoutResult, RemoteCallError> {
        let stage = Stage::Checkout;
        let request = CheckoutRequest::new(
            &self.identifiers,
            data.client_order_id,
            data.customer,
            data.transaction,
        );
        tracing::info!(
            %stage,
            url = %self.endpoints.checkout.url,
            payload = %serde_json::to_string(&request).unwrap_or_default(),
            "Sending checkout request"
        );
        let response = self
            .http_client
            .post(&self.endpoints.checkout.url)
            .timeout(self.endpoints.checkout.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| RemoteCallError::new(stage, RemoteCallFailure::Transport(e)))?;
        // The checkout endpoint signals success with a plain 200 only.
        let body = read_json_body(stage, response, |status| status == StatusCode::OK).await?;
        Ok(body.into())
    }

    #[tracing::instrument(
        name = "Creating payment",
        skip_all,
        fields(checkout_id = %data.checkout_id)
    )]
    pub async fn create_payment(&self, data: PaymentData<'_>) -> Result<Value, RemoteCallError> {
        let stage = Stage::Payment;
        let encrypted_cvv = data.token.encrypted_cvv();
        let encrypted_credit_card_number = data.token.encrypted_card_number();
        let pci_proxy_transaction_id = data.token.transaction_id();
        let request = PaymentRequest::new(
            data.checkout_id,
            CardData {
                card_holder_name: data.card_holder_name,
                expiry_month: &data.card.month,
                expiry_year: &data.card.year,
                encrypted_cvv: &encrypted_cvv,
                encrypted_credit_card_number: &encrypted_credit_card_number,
                pci_proxy_transaction_id: &pci_proxy_transaction_id,
            },
            data.transaction,
        );
        tracing::info!(
            %stage,
            url = %self.endpoints.payment.url,
            payload = %serde_json::to_string(&request).unwrap_or_default(),
            "Sending payment request"
        );
        let response = self
            .http_client
            .post(&self.endpoints.payment.url)
            .timeout(self.endpoints.payment.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| RemoteCallError::new(stage, RemoteCallFailure::Transport(e)))?;
        read_json_body(stage, response, |status| status.is_success()).await
    }
}

async fn read_json_body(
    stage: Stage,
    response: Response,
    accept: impl Fn(StatusCode) -> bool,
) -> Result<Value, RemoteCallError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| RemoteCallError::new(stage, RemoteCallFailure::Transport(e)))?;
    if !accept(status) {
        tracing::error!(%stage, %status, %body, "Remote API returned an error");
        return Err(RemoteCallError::new(
            stage,
            RemoteCallFailure::UnexpectedStatus { status, body },
        ));
    }
    tracing::info!(%stage, %status, %body, "Received response");
    serde_json::from_str(&body)
        .map_err(|e| RemoteCallError::new(stage, RemoteCallFailure::InvalidBody(e)))
}
