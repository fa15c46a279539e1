#![allow(dead_code)]

use std::sync::Arc;

use agritrace::{
    auth::TokenVerifier,
    build_router,
    models::Table,
    query::{InMemoryTableClient, TableClient},
    AppState,
};
use axum::{
    body::{to_bytes, Body},
    http::{Method, Request},
    Router,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_SECRET: &str = "test_secret_key_for_testing_purposes_only_32chars";
pub const TEST_AUDIENCE: &str = "authenticated";

/// Issues a session token the way the hosted auth service does.
pub fn token_for(user_id: Uuid) -> String {
    let claims = json!({
        "sub": user_id.to_string(),
        "aud": TEST_AUDIENCE,
        "exp": chrono::Utc::now().timestamp() + 3600,
        "email": "grower@example.com",
    });
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .expect("failed to sign test token")
}

/// Helper harness over an in-memory table backend.
pub struct TestApp {
    router: Router,
    pub client: Arc<InMemoryTableClient>,
    pub user_id: Uuid,
    /// A second registered user, used as supplier or assignee
    pub partner_id: Uuid,
    token: String,
}

impl TestApp {
    pub fn new() -> Self {
        let client = Arc::new(InMemoryTableClient::new());
        let user_id = Uuid::new_v4();
        let partner_id = Uuid::new_v4();
        client.seed(
            Table::Profiles,
            vec![
                json!({ "id": user_id, "full_name": "Asha Organic Farms", "created_at": "2024-01-01T00:00:00Z" }),
                json!({ "id": partner_id, "full_name": "Ravi Traders", "created_at": "2024-01-02T00:00:00Z" }),
            ],
        );

        let table_client: Arc<dyn TableClient> = client.clone();
        let state = AppState::new(
            table_client,
            TokenVerifier::new(TEST_SECRET, TEST_AUDIENCE),
        );

        Self {
            router: build_router(state),
            client,
            user_id,
            partner_id,
            token: token_for(user_id),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Convenience helper for authenticated JSON requests.
    pub async fn request_authenticated(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        self.request(method, uri, body, Some(self.token())).await
    }

    /// Registers a product owned by the test user and returns its id.
    pub async fn create_product(&self, name: &str) -> Uuid {
        let response = self
            .request_authenticated(
                Method::POST,
                "/api/v1/products",
                Some(json!({
                    "name": name,
                    "category": "Millets",
                    "unit": "kg",
                    "origin": "Karnataka",
                    "certification": "NPOP"
                })),
            )
            .await;
        let body = body_json(response).await;
        body["data"]
            .as_array()
            .and_then(|products| products.iter().find(|p| p["name"] == name))
            .and_then(|product| product["id"].as_str())
            .and_then(|id| Uuid::parse_str(id).ok())
            .expect("created product should be listed")
    }
}

pub async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    serde_json::from_slice(&bytes).expect("response body should be JSON")
}
