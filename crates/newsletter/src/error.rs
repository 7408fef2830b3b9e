use std::fmt::{Display, Formatter};

/// Result type used by the newsletter crate.
pub type Result<T> = std::result::Result<T, NewsletterError>;

/// Request problems detected before the customer API is called.
#[derive(Debug)]
pub enum NewsletterError {
    EmailRequired,
    InvalidEmail,
    MalformedBody(serde_json::Error),
}

impl NewsletterError {
    /// Message shown to the visitor.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::EmailRequired => "Email is required.",
            Self::InvalidEmail => "Please enter a valid email address.",
            Self::MalformedBody(_) => "An unexpected error occurred. Please try again later.",
        }
    }

    pub fn status(&self) -> u16 {
        match self {
            Self::EmailRequired | Self::InvalidEmail => 400,
            Self::MalformedBody(_) => 500,
        }
    }
}

impl Display for NewsletterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmailRequired => write!(f, "email is required"),
            Self::InvalidEmail => write!(f, "email address is malformed"),
            Self::MalformedBody(err) => write!(f, "request body is not valid JSON ({err})"),
        }
    }
}

impl std::error::Error for NewsletterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::MalformedBody(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for NewsletterError {
    fn from(value: serde_json::Error) -> Self {
        Self::MalformedBody(value)
    }
}
