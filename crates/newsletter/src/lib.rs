//! Newsletter sign-up endpoint: request validation, customer payloads and
//! HTTP reply mapping. The store's customer API is reached through
//! [`CustomerApi`] so the transport stays outside this crate.

mod customer;
mod error;
mod reply;
mod request;

pub use customer::{
    ConsentState, CustomerApi, CustomerCreated, CustomerError, CustomerPayload, NewCustomer,
    ShopifyCredentials, rfc3339_utc,
};
pub use error::{NewsletterError, Result};
pub use reply::{HttpReply, describe, handle_subscribe, subscribe};
pub use request::{NEWSLETTER_TAGS, SubscribeRequest, is_valid_email};
