//! `/order` endpoints

use reqwest::Method;
use serde_json::Value;

use super::{ApiClient, ApiResponse, Endpoint, Payload, Session};
use crate::error::E2eResult;

pub struct OrderApi<'a> {
    client: &'a ApiClient,
}

impl<'a> OrderApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// POST `order` with `{prime, order}`
    pub async fn place(&self, session: &Session, payload: &Value) -> E2eResult<ApiResponse> {
        self.client.attachments().json("Order Detail", payload)?;
        self.client
            .send(Method::POST, &Endpoint::new("order"), session, Payload::Json(payload.clone()))
            .await
    }

    /// GET `order/{number}`. The path segment is the order number, not the
    /// row id.
    pub async fn by_number(&self, session: &Session, number: &str) -> E2eResult<ApiResponse> {
        self.client
            .send(Method::GET, &Endpoint::new(format!("order/{}", number)), session, Payload::Empty)
            .await
    }
}
