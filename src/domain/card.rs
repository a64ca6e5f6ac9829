use secrecy::{ExposeSecret, Secret};
use serde_aux::field_attributes::deserialize_string_from_number;

/// A sandbox test card as stored in the card list.
///
/// Expiry fields are kept verbatim (e.g. `"06"` or `"2030"`) because they
/// are forwarded as-is to the tokenization and payment endpoints.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct CardRecord {
    pub number: Secret<String>,
    pub cvv: Secret<String>,
    #[serde(deserialize_with = "deserialize_string_from_number")]
    pub month: String,
    #[serde(deserialize_with = "deserialize_string_from_number")]
    pub year: String,
}

impl CardRecord {
    /// Card number with everything but the last four digits hidden.
    pub fn masked_number(&self) -> String {
        let number = self.number.expose_secret();
        let visible = number.len().saturating_sub(4);
        let tail: String = number.chars().skip(visible).collect();
        format!("{}{}", "*".repeat(visible), tail)
    }
}

/// How a run picks the card for each of its iterations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CardSelection {
    #[default]
    Random,
    /// Card `i % len` for iteration `i`.
    Sequential,
}

impl CardSelection {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardSelection::Random => "random",
            CardSelection::Sequential => "sequential",
        }
    }
}

impl std::fmt::Display for CardSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<String> for CardSelection {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "random" => Ok(Self::Random),
            "sequential" => Ok(Self::Sequential),
            other => Err(format!(
                "{} is not a supported card selection mode. \
                Use either `random` or `sequential`.",
                other
            )),
        }
    }
}
