use std::sync::{Arc, Mutex};

use newsletter::{
    CustomerApi, CustomerCreated, CustomerError, NewCustomer, describe, handle_subscribe,
};
use serde_json::json;

/// Records every customer and answers with a fixed outcome.
struct MockStore {
    outcome: Result<(), CustomerError>,
    created: Arc<Mutex<Vec<NewCustomer>>>,
}

impl MockStore {
    fn answering(outcome: Result<(), CustomerError>) -> Self {
        Self {
            outcome,
            created: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl CustomerApi for MockStore {
    fn create_customer(&self, customer: &NewCustomer) -> Result<CustomerCreated, CustomerError> {
        self.created
            .lock()
            .expect("created lock should not be poisoned")
            .push(customer.clone());
        self.outcome.clone().map(|()| CustomerCreated {
            customer: json!({ "id": 1, "email": customer.email }),
        })
    }
}

#[test]
fn successful_signup_returns_200_and_sends_normalized_customer() {
    let store = MockStore::answering(Ok(()));
    let reply = handle_subscribe(
        br#"{"email":"Ada@Example.com","firstName":" Ada ","lastName":"Lovelace"}"#,
        &store,
    );

    assert_eq!(reply.status, 200);
    assert_eq!(
        reply.body,
        json!({ "success": true, "message": "Successfully subscribed to newsletter!" })
    );
    let created = store
        .created
        .lock()
        .expect("created lock should not be poisoned");
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].email, "ada@example.com");
    assert_eq!(created[0].first_name.as_deref(), Some("Ada"));
}

#[test]
fn validation_failures_never_reach_the_store() {
    let store = MockStore::answering(Ok(()));

    let missing = handle_subscribe(br#"{"firstName":"Ada"}"#, &store);
    assert_eq!(missing.status, 400);
    assert_eq!(
        missing.body,
        json!({ "success": false, "message": "Email is required." })
    );

    let malformed = handle_subscribe(br#"{"email":"not-an-email"}"#, &store);
    assert_eq!(malformed.status, 400);
    assert_eq!(
        malformed.body["message"],
        json!("Please enter a valid email address.")
    );

    assert!(
        store
            .created
            .lock()
            .expect("created lock should not be poisoned")
            .is_empty()
    );
}

#[test]
fn store_outcomes_map_to_status_codes() {
    let cases = [
        (CustomerError::AlreadySubscribed, 409, json!("ALREADY_SUBSCRIBED")),
        (CustomerError::MissingCredentials, 500, json!("MISSING_CREDENTIALS")),
        (
            CustomerError::Rejected {
                errors: json!({ "phone": ["is invalid"] }),
            },
            400,
            json!({ "phone": ["is invalid"] }),
        ),
        (
            CustomerError::Network {
                message: "connection reset".to_owned(),
            },
            400,
            json!("connection reset"),
        ),
    ];

    for (error, status, code) in cases {
        let store = MockStore::answering(Err(error));
        let reply = handle_subscribe(br#"{"email":"ada@example.com"}"#, &store);
        assert_eq!(reply.status, status);
        assert_eq!(reply.body["success"], json!(false));
        assert_eq!(reply.body["error"], code);
    }
}

#[test]
fn unparseable_body_is_an_unexpected_error() {
    let store = MockStore::answering(Ok(()));
    let reply = handle_subscribe(b"{not json", &store);

    assert_eq!(reply.status, 500);
    assert_eq!(
        reply.body,
        json!({
            "success": false,
            "message": "An unexpected error occurred. Please try again later."
        })
    );
}

#[test]
fn get_describes_the_endpoint() {
    let reply = describe();
    assert_eq!(reply.status, 200);
    assert_eq!(reply.body["requiredFields"], json!(["email"]));
    assert_eq!(
        reply.body["optionalFields"],
        json!(["firstName", "lastName", "phone"])
    );
}
