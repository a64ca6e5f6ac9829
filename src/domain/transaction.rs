use rand::Rng;
use rand::seq::SliceRandom;

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub enum Currency {
    #[serde(rename = "EUR")]
    Eur,
    #[serde(rename = "GBP")]
    Gbp,
}

impl Currency {
    pub const ALL: [Currency; 2] = [Currency::Eur, Currency::Gbp];

    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Inclusive range of whole currency units a simulated transaction may use.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AmountRange {
    min: u32,
    max: u32,
}

impl AmountRange {
    /// Build a range, swapping the bounds if they are inverted.
    pub fn new(min: u32, max: u32) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            tracing::warn!(min, max, "Amount range bounds are inverted, swapping them");
            Self { min: max, max: min }
        }
    }
}

/// Amount and currency of one simulated purchase, serialised the way the
/// checkout and payment endpoints expect it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct Transaction {
    pub amount: u32,
    pub currency: Currency,
}

impl Transaction {
    pub fn random<R: Rng>(range: AmountRange, rng: &mut R) -> Self {
        let amount = rng.gen_range(range.min..=range.max);
        let currency = *Currency::ALL.choose(rng).unwrap_or(&Currency::Eur);
        Self { amount, currency }
    }
}
