use serde_json::Value;

const MISSING_CREDIT_CARD: &str = "dummyNumber";
const MISSING_CVV: &str = "dummyCvv";
const MISSING_TRANSACTION_ID: &str = "dummyTransaction";
const MISSING_CHECKOUT_ID: &str = "missing_checkoutId";

/// Reads `key` from a JSON object as an opaque string.
///
/// Strings are returned verbatim, other scalars in their JSON rendering;
/// `null` and absent keys yield `None`.
fn opaque_field(object: &Value, key: &str) -> Option<String> {
    match object.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Response of the tokenization endpoint.
#[derive(Debug, Clone)]
pub struct TokenizationResult(Value);

impl TokenizationResult {
    pub fn encrypted_card_number(&self) -> String {
        opaque_field(&self.0, "creditCard").unwrap_or_else(|| MISSING_CREDIT_CARD.into())
    }

    pub fn encrypted_cvv(&self) -> String {
        opaque_field(&self.0, "cvv").unwrap_or_else(|| MISSING_CVV.into())
    }

    pub fn transaction_id(&self) -> String {
        opaque_field(&self.0, "transactionId").unwrap_or_else(|| MISSING_TRANSACTION_ID.into())
    }
}

impl From<Value> for TokenizationResult {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Response of the checkout endpoint. The checkout id lives either under
/// a `data` object or at the top level.
#[derive(Debug, Clone)]
pub struct CheckoutResult(Value);

impl CheckoutResult {
    pub fn checkout_id(&self) -> String {
        let scope = match self.0.get("data") {
            Some(data) if data.is_object() => data,
            _ => &self.0,
        };
        opaque_field(scope, "checkoutId").unwrap_or_else(|| MISSING_CHECKOUT_ID.into())
    }
}

impl From<Value> for CheckoutResult {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
