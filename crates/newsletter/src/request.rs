use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use crate::customer::NewCustomer;
use crate::error::{NewsletterError, Result};

/// Tags attached to every newsletter customer.
pub const NEWSLETTER_TAGS: [&str; 2] = ["newsletter", "website-signup"];

/// Body of `POST /api/newsletter`.
///
/// `email` stays untyped so a missing or non-string value can be told apart
/// from a malformed body.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeRequest {
    #[serde(default)]
    pub email: Value,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl SubscribeRequest {
    pub fn from_json(body: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(body)?)
    }

    /// Validates the request and normalizes it into a customer record.
    ///
    /// # Example
    /// ```
    /// use newsletter::SubscribeRequest;
    ///
    /// let request = SubscribeRequest::from_json(br#"{"email":"Ada@Example.com "}"#)
    ///     .expect("valid json");
    /// assert!(request.into_customer().is_err());
    /// ```
    pub fn into_customer(self) -> Result<NewCustomer> {
        let email = match &self.email {
            Value::String(email) if !email.is_empty() => email,
            _ => return Err(NewsletterError::EmailRequired),
        };
        if !is_valid_email(email) {
            return Err(NewsletterError::InvalidEmail);
        }

        Ok(NewCustomer {
            email: email.trim().to_lowercase(),
            first_name: trimmed(self.first_name),
            last_name: trimmed(self.last_name),
            phone: trimmed(self.phone),
            tags: NEWSLETTER_TAGS.iter().map(|tag| (*tag).to_owned()).collect(),
            accepts_marketing: true,
        })
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|value| value.trim().to_owned())
}

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern should compile")
});

/// `local@domain.tld` with no whitespace and exactly one `@`.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

#[cfg(test)]
mod tests {
    use super::{SubscribeRequest, is_valid_email};
    use crate::error::NewsletterError;

    #[test]
    fn email_shape_matches_the_signup_form_rule() {
        assert!(is_valid_email("ada@example.com"));
        assert!(is_valid_email("a.b@mail.example.co"));
        assert!(!is_valid_email("ada@example"));
        assert!(!is_valid_email("ada@.com"));
        assert!(!is_valid_email("ada@example."));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("ada@@example.com"));
        assert!(!is_valid_email("ada lovelace@example.com"));
        assert!(!is_valid_email(" ada@example.com"));
        assert!(is_valid_email("a@a..com"));
        assert!(is_valid_email("a@b.c."));
        assert!(!is_valid_email("ada@example.com\n"));
    }

    #[test]
    fn missing_or_non_string_email_is_required() {
        for body in [r#"{}"#, r#"{"email":""}"#, r#"{"email":42}"#, r#"{"email":null}"#] {
            let request = SubscribeRequest::from_json(body.as_bytes()).expect("valid json");
            assert!(
                matches!(request.into_customer(), Err(NewsletterError::EmailRequired)),
                "{body}"
            );
        }
    }

    #[test]
    fn customer_is_normalized() {
        let request = SubscribeRequest::from_json(
            br#"{"email":"Ada@Example.COM","firstName":" Ada ","phone":" +44 20 "}"#,
        )
        .expect("valid json");

        let customer = request.into_customer().expect("valid request");
        assert_eq!(customer.email, "ada@example.com");
        assert_eq!(customer.first_name.as_deref(), Some("Ada"));
        assert_eq!(customer.last_name, None);
        assert_eq!(customer.phone.as_deref(), Some("+44 20"));
        assert_eq!(customer.tags, vec!["newsletter", "website-signup"]);
        assert!(customer.accepts_marketing);
    }
}
