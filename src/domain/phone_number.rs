/// Longest phone number the checkout schema accepts.
const MAX_PHONE_DIGITS: usize = 12;

/// A locally formatted phone number: digits only, at most 12 of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Normalise a raw phone number string.
    ///
    /// All non-digit characters are removed. A leading international `00`
    /// prefix is dropped; otherwise a leading `1` country code is dropped
    /// when more than ten digits remain. The result is truncated to twelve
    /// digits.
    pub fn normalize(raw: &str) -> Self {
        let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
        let local = if let Some(rest) = digits.strip_prefix("00") {
            rest
        } else if digits.starts_with('1') && digits.len() > 10 {
            &digits[1..]
        } else {
            digits.as_str()
        };
        // Only ASCII digits are left, so byte and char boundaries coincide.
        let end = local.len().min(MAX_PHONE_DIGITS);
        Self(local[..end].to_string())
    }
}

impl AsRef<str> for PhoneNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
