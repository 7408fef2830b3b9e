use std::fmt::{Display, Formatter};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

const DEFAULT_API_VERSION: &str = "2024-10";

/// Normalized sign-up ready to be sent to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCustomer {
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub tags: Vec<String>,
    pub accepts_marketing: bool,
}

/// Successful customer creation.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerCreated {
    pub customer: Value,
}

/// Why the store refused or could not be reached.
#[derive(Debug, Clone, PartialEq)]
pub enum CustomerError {
    MissingCredentials,
    AlreadySubscribed,
    /// The store answered with an error body.
    Rejected { errors: Value },
    Network { message: String },
}

impl CustomerError {
    /// Classifies a non-success store response.
    pub fn from_response(body: &Value) -> Self {
        let taken = body
            .pointer("/errors/email")
            .and_then(Value::as_array)
            .is_some_and(|messages| {
                messages.iter().any(|message| {
                    message
                        .as_str()
                        .is_some_and(|message| message.contains("has already been taken"))
                })
            });
        if taken {
            return Self::AlreadySubscribed;
        }
        Self::Rejected {
            errors: body
                .get("errors")
                .filter(|errors| !errors.is_null())
                .cloned()
                .unwrap_or_else(|| Value::from("UNKNOWN_ERROR")),
        }
    }

    /// Machine-readable error code returned to the client.
    pub fn code(&self) -> Value {
        match self {
            Self::MissingCredentials => Value::from("MISSING_CREDENTIALS"),
            Self::AlreadySubscribed => Value::from("ALREADY_SUBSCRIBED"),
            Self::Rejected { errors } => errors.clone(),
            Self::Network { message } => Value::from(message.as_str()),
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::MissingCredentials => "Shopify API credentials not configured",
            Self::AlreadySubscribed => "This email is already subscribed to our newsletter.",
            Self::Rejected { .. } => "Failed to subscribe. Please try again.",
            Self::Network { .. } => "An error occurred. Please try again later.",
        }
    }

    pub fn status(&self) -> u16 {
        match self {
            Self::AlreadySubscribed => 409,
            Self::MissingCredentials => 500,
            Self::Rejected { .. } | Self::Network { .. } => 400,
        }
    }
}

impl Display for CustomerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingCredentials => write!(f, "store credentials are not configured"),
            Self::AlreadySubscribed => write!(f, "customer already exists"),
            Self::Rejected { errors } => write!(f, "store rejected the customer: {errors}"),
            Self::Network { message } => write!(f, "store request failed: {message}"),
        }
    }
}

impl std::error::Error for CustomerError {}

/// Creates customers in the store. Implementations own the HTTP call.
pub trait CustomerApi {
    fn create_customer(&self, customer: &NewCustomer) -> Result<CustomerCreated, CustomerError>;
}

/// Store admin credentials read from the environment.
#[derive(Clone, PartialEq, Eq)]
pub struct ShopifyCredentials {
    pub store_domain: String,
    pub access_token: String,
    pub api_version: String,
}

impl std::fmt::Debug for ShopifyCredentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyCredentials")
            .field("store_domain", &self.store_domain)
            .field("access_token", &"<redacted>")
            .field("api_version", &self.api_version)
            .finish()
    }
}

impl ShopifyCredentials {
    pub const DOMAIN_VAR: &'static str = "SHOPIFY_STORE_DOMAIN";
    pub const TOKEN_VAR: &'static str = "SHOPIFY_ADMIN_API_ACCESS_TOKEN";
    pub const VERSION_VAR: &'static str = "SHOPIFY_ADMIN_API_VERSION";

    pub fn from_env() -> Result<Self, CustomerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads credentials through `lookup`; empty values count as missing.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CustomerError> {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let (Some(store_domain), Some(access_token)) = (read(Self::DOMAIN_VAR), read(Self::TOKEN_VAR))
        else {
            return Err(CustomerError::MissingCredentials);
        };
        Ok(Self {
            store_domain,
            access_token,
            api_version: read(Self::VERSION_VAR).unwrap_or_else(|| DEFAULT_API_VERSION.to_owned()),
        })
    }

    pub fn customers_endpoint(&self) -> String {
        format!(
            "https://{}/admin/api/{}/customers.json",
            self.store_domain, self.api_version
        )
    }

    /// Headers the admin API expects on every request.
    pub fn headers(&self) -> [(&'static str, &str); 2] {
        [
            ("Content-Type", "application/json"),
            ("X-Shopify-Access-Token", self.access_token.as_str()),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsentState {
    Subscribed,
    NotSubscribed,
}

/// JSON body of the customer-creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerPayload {
    customer: CustomerRecord,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct CustomerRecord {
    email: String,
    first_name: String,
    last_name: String,
    phone: String,
    tags: String,
    accepts_marketing: bool,
    email_marketing_consent: MarketingConsent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct MarketingConsent {
    state: ConsentState,
    opt_in_level: &'static str,
    consent_updated_at: String,
}

impl CustomerPayload {
    /// Builds the payload; `consent_updated_at` is an RFC 3339 timestamp.
    pub fn new(customer: &NewCustomer, consent_updated_at: String) -> Self {
        let tags = if customer.tags.is_empty() {
            "newsletter".to_owned()
        } else {
            customer.tags.join(", ")
        };
        Self {
            customer: CustomerRecord {
                email: customer.email.clone(),
                first_name: customer.first_name.clone().unwrap_or_default(),
                last_name: customer.last_name.clone().unwrap_or_default(),
                phone: customer.phone.clone().unwrap_or_default(),
                tags,
                accepts_marketing: customer.accepts_marketing,
                email_marketing_consent: MarketingConsent {
                    state: if customer.accepts_marketing {
                        ConsentState::Subscribed
                    } else {
                        ConsentState::NotSubscribed
                    },
                    opt_in_level: "single_opt_in",
                    consent_updated_at,
                },
            },
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Formats `time` as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
pub fn rfc3339_utc(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::{Duration, UNIX_EPOCH};

    use chrono::{DateTime, Utc};

    use serde_json::json;

    use super::{CustomerError, CustomerPayload, NewCustomer, ShopifyCredentials, rfc3339_utc};

    fn customer() -> NewCustomer {
        NewCustomer {
            email: "ada@example.com".to_owned(),
            first_name: Some("Ada".to_owned()),
            last_name: None,
            phone: None,
            tags: vec!["newsletter".to_owned(), "website-signup".to_owned()],
            accepts_marketing: true,
        }
    }

    #[test]
    fn payload_matches_the_admin_api_shape() {
        let payload = CustomerPayload::new(&customer(), "2024-10-01T12:00:00.000Z".to_owned());
        let value = serde_json::to_value(&payload).expect("payload should serialize");

        assert_eq!(
            value,
            json!({
                "customer": {
                    "email": "ada@example.com",
                    "first_name": "Ada",
                    "last_name": "",
                    "phone": "",
                    "tags": "newsletter, website-signup",
                    "accepts_marketing": true,
                    "email_marketing_consent": {
                        "state": "subscribed",
                        "opt_in_level": "single_opt_in",
                        "consent_updated_at": "2024-10-01T12:00:00.000Z"
                    }
                }
            })
        );
    }

    #[test]
    fn credentials_require_domain_and_token_and_default_the_version() {
        let env: HashMap<&str, &str> = [
            (ShopifyCredentials::DOMAIN_VAR, "watches.myshopify.com"),
            (ShopifyCredentials::TOKEN_VAR, "shpat_secret"),
        ]
        .into_iter()
        .collect();

        let credentials = ShopifyCredentials::from_lookup(|key| env.get(key).map(|v| (*v).to_owned()))
            .expect("credentials should be present");
        assert_eq!(
            credentials.customers_endpoint(),
            "https://watches.myshopify.com/admin/api/2024-10/customers.json"
        );
        assert!(!format!("{credentials:?}").contains("shpat_secret"));

        let missing = ShopifyCredentials::from_lookup(|key| {
            (key == ShopifyCredentials::DOMAIN_VAR).then(|| "watches.myshopify.com".to_owned())
        });
        assert_eq!(missing, Err(CustomerError::MissingCredentials));
    }

    #[test]
    fn taken_email_is_classified_as_already_subscribed() {
        let body = json!({ "errors": { "email": ["has already been taken"] } });
        assert_eq!(CustomerError::from_response(&body), CustomerError::AlreadySubscribed);

        let other = json!({ "errors": { "phone": ["is invalid"] } });
        assert_eq!(
            CustomerError::from_response(&other).code(),
            json!({ "phone": ["is invalid"] })
        );
        assert_eq!(CustomerError::from_response(&json!({})).code(), json!("UNKNOWN_ERROR"));
    }

    #[test]
    fn timestamps_are_rfc3339_utc() {
        assert_eq!(
            rfc3339_utc(DateTime::<Utc>::UNIX_EPOCH),
            "1970-01-01T00:00:00.000Z"
        );
        let leap_day = DateTime::from_timestamp_millis(1_709_210_096_789)
            .expect("timestamp should be in range");
        assert_eq!(rfc3339_utc(leap_day), "2024-02-29T12:34:56.789Z");

        let from_system = DateTime::<Utc>::from(UNIX_EPOCH + Duration::from_millis(1_500));
        assert_eq!(rfc3339_utc(from_system), "1970-01-01T00:00:01.500Z");
    }
}
