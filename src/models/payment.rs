use serde::{Deserialize, Serialize};

use super::Money;

pub const BOOKING_REF_VARIABLE: &str = "booking_ref";

/// One gateway custom field: a display name, variable name and value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetadataField {
    pub display_name: String,
    pub variable_name: String,
    pub value: serde_json::Value,
}

impl MetadataField {
    pub fn booking_ref(reference: &str) -> Self {
        Self {
            display_name: "Booking Reference".to_string(),
            variable_name: BOOKING_REF_VARIABLE.to_string(),
            value: serde_json::Value::String(reference.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChargeRequest {
    pub email: String,
    /// Amount to charge; the adapter sends it in subunits.
    pub amount: Money,
    pub reference: String,
    pub callback_url: String,
    pub metadata: Vec<MetadataField>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChargeSession {
    pub authorization_url: String,
    pub access_code: Option<String>,
    pub reference: String,
}

/// Provider view of a previously initialized charge.
#[derive(Debug, Clone, PartialEq)]
pub struct Verification {
    pub status: String,
    pub reference: String,
    pub metadata: Vec<MetadataField>,
    pub raw: serde_json::Value,
}

impl Verification {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }

    /// Booking reference recovered from the charge metadata.
    pub fn booking_ref(&self) -> Option<String> {
        self.metadata
            .iter()
            .find(|f| f.variable_name == BOOKING_REF_VARIABLE)
            .and_then(|f| match &f.value {
                serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                _ => None,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn verification(metadata: Vec<MetadataField>) -> Verification {
        Verification {
            status: "success".to_string(),
            reference: "EBOMI-1-ABCDEF".to_string(),
            metadata,
            raw: json!({}),
        }
    }

    #[test]
    fn recovers_booking_ref_from_metadata() {
        let v = verification(vec![
            MetadataField {
                display_name: "Nights".to_string(),
                variable_name: "nights".to_string(),
                value: json!(3),
            },
            MetadataField::booking_ref("EBOMI-1-ABCDEF"),
        ]);
        assert_eq!(v.booking_ref().as_deref(), Some("EBOMI-1-ABCDEF"));
    }

    #[test]
    fn blank_or_missing_booking_ref_is_none() {
        assert_eq!(verification(vec![]).booking_ref(), None);
        let blank = MetadataField {
            value: json!("  "),
            ..MetadataField::booking_ref("x")
        };
        assert_eq!(verification(vec![blank]).booking_ref(), None);
    }
}
