use serde_json::{Value, json};
use tracing::{error, info, warn};

use crate::customer::CustomerApi;
use crate::error::NewsletterError;
use crate::request::SubscribeRequest;

const SUCCESS_MESSAGE: &str = "Successfully subscribed to newsletter!";

/// Status code and JSON body of one response.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpReply {
    pub status: u16,
    pub body: Value,
}

impl HttpReply {
    fn failure(status: u16, message: &str, code: Option<Value>) -> Self {
        let mut body = json!({ "success": false, "message": message });
        if let Some(code) = code {
            body["error"] = code;
        }
        Self { status, body }
    }
}

/// Handles a raw `POST /api/newsletter` body.
pub fn handle_subscribe(body: &[u8], api: &impl CustomerApi) -> HttpReply {
    match SubscribeRequest::from_json(body) {
        Ok(request) => subscribe(request, api),
        Err(err) => {
            error!(error = %err, "newsletter request could not be parsed");
            reject(&err)
        }
    }
}

/// Validates `request` and creates the customer through `api`.
pub fn subscribe(request: SubscribeRequest, api: &impl CustomerApi) -> HttpReply {
    let customer = match request.into_customer() {
        Ok(customer) => customer,
        Err(err) => return reject(&err),
    };

    match api.create_customer(&customer) {
        Ok(_) => {
            info!(email = %customer.email, "newsletter subscription created");
            HttpReply {
                status: 200,
                body: json!({ "success": true, "message": SUCCESS_MESSAGE }),
            }
        }
        Err(err) => {
            warn!(error = %err, "newsletter subscription failed");
            HttpReply::failure(err.status(), err.user_message(), Some(err.code()))
        }
    }
}

fn reject(err: &NewsletterError) -> HttpReply {
    HttpReply::failure(err.status(), err.user_message(), None)
}

/// Reply to `GET /api/newsletter`.
pub fn describe() -> HttpReply {
    HttpReply {
        status: 200,
        body: json!({
            "message": "Newsletter API is running",
            "endpoint": "POST /api/newsletter",
            "requiredFields": ["email"],
            "optionalFields": ["firstName", "lastName", "phone"],
        }),
    }
}
