use crate::domain::PhoneNumber;
use uuid::Uuid;

/// One record of the customer profile dataset. Any column may be missing
/// from the file or blank in a given row.
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(default)]
pub struct ProfileRow {
    #[serde(rename = "First_Name")]
    pub first_name: Option<String>,
    #[serde(rename = "Last_Name")]
    pub last_name: Option<String>,
    #[serde(rename = "Email_Address")]
    pub email: Option<String>,
    #[serde(rename = "Address_line1")]
    pub address: Option<String>,
    #[serde(rename = "City")]
    pub city: Option<String>,
    #[serde(rename = "State")]
    pub state: Option<String>,
    #[serde(rename = "Postal_Code")]
    pub postal_code: Option<String>,
}

/// Returns the trimmed value if it carries any non-whitespace content.
pub fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// A fully populated customer, ready to be sent to the checkout endpoint.
#[derive(Debug, Clone)]
pub struct CustomerProfile {
    pub client_user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: PhoneNumber,
    pub address: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub postal_code: String,
}

#[cfg(test)]
mod tests {
    use super::non_blank;

    #[test]
    fn blank_values_are_discarded() {
        assert_eq!(non_blank(&None), None);
        assert_eq!(non_blank(&Some(String::new())), None);
        assert_eq!(non_blank(&Some(" \t ".to_string())), None);
    }

    #[test]
    fn present_values_are_trimmed() {
        assert_eq!(
            non_blank(&Some("  Ursula ".to_string())),
            Some("Ursula".to_string())
        );
    }
}
