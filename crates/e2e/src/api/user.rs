//! `/user/*` endpoints

use reqwest::Method;
use serde_json::Value;
use stylish_common::Credentials;
use tracing::info;

use super::{ApiClient, ApiResponse, Endpoint, Payload, Session};
use crate::error::{E2eError, E2eResult};

pub struct UserApi<'a> {
    client: &'a ApiClient,
}

impl<'a> UserApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// POST `user/login`. On 200 `session` becomes authenticated; any other
    /// status leaves it untouched for the caller to assert on.
    pub async fn login(&self, session: &mut Session, credentials: &Credentials) -> E2eResult<ApiResponse> {
        let body = serde_json::to_value(credentials)?;
        self.client.attachments().json("Login Request Body", &body)?;

        let response = self
            .client
            .send(Method::POST, &Endpoint::new("user/login"), &Session::Anonymous, Payload::Json(body))
            .await?;

        if response.is_success() {
            let data = response.data().cloned().unwrap_or(Value::Null);
            let token = data
                .get("access_token")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    E2eError::assertion(
                        "login response",
                        "data.access_token",
                        &response.body,
                        "successful login carries no access token",
                    )
                })?
                .to_string();
            let user = data.get("user").cloned().unwrap_or(Value::Null);

            *session = Session::Authenticated { token, user };
        }
        Ok(response)
    }

    /// POST `user/logout`. `override_token` replaces whatever token the
    /// session holds; local state is cleared only when the server accepts.
    pub async fn logout(&self, session: &mut Session, override_token: Option<&str>) -> E2eResult<ApiResponse> {
        if let Some(token) = override_token {
            *session = session.with_token(token);
        }
        match session.token() {
            Some(_) => info!("Logout with access token"),
            None => info!("Logout without access token"),
        }

        let response = self
            .client
            .send(Method::POST, &Endpoint::new("user/logout"), session, Payload::Empty)
            .await?;

        if response.is_success() {
            *session = Session::Anonymous;
        }
        Ok(response)
    }

    /// GET `user/profile`; the profile is returned only on 200
    pub async fn profile(
        &self,
        session: &Session,
        override_token: Option<&str>,
    ) -> E2eResult<(u16, Option<Value>)> {
        let effective = match override_token {
            Some(token) => session.with_token(token),
            None => session.clone(),
        };

        let response = self
            .client
            .send(Method::GET, &Endpoint::new("user/profile"), &effective, Payload::Empty)
            .await?;

        let profile = if response.is_success() {
            response.data().cloned()
        } else {
            None
        };
        Ok((response.status, profile))
    }
}
