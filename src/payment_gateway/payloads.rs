//! Outbound request bodies. Field names and fixed values mirror what the
//! sandbox endpoints expect and must not drift.
use uuid::Uuid;

use crate::domain::{CustomerProfile, Transaction};

use super::MerchantIdentifiers;

const TOKENIZE_MODE: &str = "TOKENIZE";
const PAYMENT_METHOD_VISA: &str = "VIS";
const ORDER_DESCRIPTION: &str = "Subscription payment for SamagyaanDataSolutions";
const SUCCESS_URL: &str = "https://example.com/success";
const CANCEL_URL: &str = "https://example.com/cancel";
const WEBHOOK_URL: &str = "https://example.com/webhook";

/// Form fields of the SecureFields tokenization call.
#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenizeForm<'a> {
    mode: &'static str,
    form_id: &'a str,
    card_number: &'a str,
    cvv: &'a str,
    payment_method: &'static str,
    merchant_id: &'a str,
    expy: &'a str,
    expm: &'a str,
    browser_user_agent: &'static str,
    browser_java_enabled: &'static str,
    browser_language: &'static str,
    browser_color_depth: &'static str,
    browser_screen_height: &'static str,
    browser_screen_width: &'static str,
    #[serde(rename = "browserTZ")]
    browser_tz: &'static str,
}

impl<'a> TokenizeForm<'a> {
    pub fn new(
        identifiers: &'a MerchantIdentifiers,
        card_number: &'a str,
        cvv: &'a str,
        expiry_month: &'a str,
        expiry_year: &'a str,
    ) -> Self {
        Self {
            mode: TOKENIZE_MODE,
            form_id: &identifiers.form_id,
            card_number,
            cvv,
            payment_method: PAYMENT_METHOD_VISA,
            merchant_id: &identifiers.merchant_id,
            expy: expiry_year,
            expm: expiry_month,
            browser_user_agent: "Mozilla/5.0+(Windows+NT+10.0;+Win64;+x64)",
            browser_java_enabled: "false",
            browser_language: "en-US",
            browser_color_depth: "24",
            browser_screen_height: "1080",
            browser_screen_width: "1920",
            browser_tz: "-330",
        }
    }
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest<'a> {
    client_id: &'a str,
    transaction: Transaction,
    client_order_details: ClientOrderDetails<'a>,
    user_details: UserDetails<'a>,
    notification: Notification,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct ClientOrderDetails<'a> {
    client_order_id: Uuid,
    description: &'static str,
    client_id: &'a str,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct UserDetails<'a> {
    client_user_id: Uuid,
    first_name: &'a str,
    last_name: &'a str,
    email: &'a str,
    phone: &'a str,
    address: &'a str,
    city: &'a str,
    state: &'a str,
    country: &'a str,
    postal_code: &'a str,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct Notification {
    success_url: &'static str,
    cancel_url: &'static str,
    webhook_url: &'static str,
}

impl<'a> CheckoutRequest<'a> {
    pub fn new(
        identifiers: &'a MerchantIdentifiers,
        client_order_id: Uuid,
        customer: &'a CustomerProfile,
        transaction: Transaction,
    ) -> Self {
        Self {
            client_id: &identifiers.client_id,
            transaction,
            client_order_details: ClientOrderDetails {
                client_order_id,
                description: ORDER_DESCRIPTION,
                client_id: &identifiers.client_id,
            },
            user_details: UserDetails {
                client_user_id: customer.client_user_id,
                first_name: &customer.first_name,
                last_name: &customer.last_name,
                email: &customer.email,
                phone: customer.phone.as_ref(),
                address: &customer.address,
                city: &customer.city,
                state: &customer.state,
                country: &customer.country,
                postal_code: &customer.postal_code,
            },
            notification: Notification {
                success_url: SUCCESS_URL,
                cancel_url: CANCEL_URL,
                webhook_url: WEBHOOK_URL,
            },
        }
    }
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest<'a> {
    checkout_id: &'a str,
    card_data: CardData<'a>,
    transaction: Transaction,
    browser_details: BrowserDetails,
    additional_data: AdditionalData,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardData<'a> {
    pub card_holder_name: &'a str,
    pub expiry_month: &'a str,
    pub expiry_year: &'a str,
    pub encrypted_cvv: &'a str,
    pub encrypted_credit_card_number: &'a str,
    pub pci_proxy_transaction_id: &'a str,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct BrowserDetails {
    user_agent: &'static str,
    accept_header: &'static str,
    java_enabled: bool,
    color_depth: u32,
    screen_height: u32,
    screen_width: u32,
    time_zone_offset: i32,
    language: &'static str,
}

impl Default for BrowserDetails {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (X11; U; Linux i686; en-US; rv:1.9) Gecko/2008052912 Firefox/3.0",
            accept_header: "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            java_enabled: true,
            color_depth: 24,
            screen_height: 2000,
            screen_width: 3000,
            time_zone_offset: 5,
            language: "en",
        }
    }
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct AdditionalData {
    additional_prop1: &'static str,
}

impl<'a> PaymentRequest<'a> {
    pub fn new(checkout_id: &'a str, card_data: CardData<'a>, transaction: Transaction) -> Self {
        Self {
            checkout_id,
            card_data,
            transaction,
            browser_details: BrowserDetails::default(),
            additional_data: AdditionalData {
                additional_prop1: "string",
            },
        }
    }
}
