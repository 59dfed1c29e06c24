//! Stylish HTTP API client
//!
//! [`ApiClient`] is the requester: it owns the HTTP connection pool, the API
//! root and the scenario's attachment sink. Resource facades borrow it and
//! expose domain operations. Authentication is carried by an explicit
//! [`Session`] value instead of state hidden inside the client.

pub mod admin;
pub mod order;
pub mod products;
pub mod user;

use reqwest::header::{HeaderMap, AUTHORIZATION};
use reqwest::{Method, RequestBuilder};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::config::HarnessConfig;
use crate::error::E2eResult;
use crate::report::Attachments;

pub use admin::{AdminApi, ProductForm};
pub use order::OrderApi;
pub use products::ProductsApi;
pub use user::UserApi;

/// Authentication state threaded through API calls
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Session {
    #[default]
    Anonymous,
    /// Established by a successful login
    Authenticated { token: String, user: Value },
    /// A token supplied from outside, with no known user
    Bearer(String),
}

impl Session {
    pub fn token(&self) -> Option<&str> {
        match self {
            Session::Anonymous => None,
            Session::Authenticated { token, .. } => Some(token),
            Session::Bearer(token) => Some(token),
        }
    }

    pub fn user(&self) -> Option<&Value> {
        match self {
            Session::Authenticated { user, .. } => Some(user),
            _ => None,
        }
    }

    /// The same session presenting `token` instead of its own
    pub fn with_token(&self, token: &str) -> Session {
        match self {
            Session::Authenticated { user, .. } => Session::Authenticated {
                token: token.to_string(),
                user: user.clone(),
            },
            _ => Session::Bearer(token.to_string()),
        }
    }
}

/// Path relative to the API root plus query parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub path: String,
    pub query: Vec<(&'static str, String)>,
}

impl Endpoint {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: Vec::new(),
        }
    }

    pub fn param(mut self, key: &'static str, value: impl ToString) -> Self {
        self.query.push((key, value.to_string()));
        self
    }
}

/// A response decoded far enough to assert on
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    /// JSON body, or the raw text as a JSON string when it is not JSON
    pub body: Value,
}

impl ApiResponse {
    pub fn data(&self) -> Option<&Value> {
        self.body.get("data")
    }

    pub fn error_msg(&self) -> Option<&str> {
        self.body.get("errorMsg").and_then(Value::as_str)
    }

    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

/// Body of an outgoing request
pub enum Payload {
    Empty,
    Json(Value),
    Multipart(reqwest::multipart::Form),
}

pub struct ApiClient {
    http: reqwest::Client,
    root: String,
    attachments: Attachments,
}

impl ApiClient {
    pub fn new(config: &HarnessConfig, attachments: Attachments) -> E2eResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeouts.http())
            .build()?;

        Ok(Self {
            http,
            root: config.api_root(),
            attachments,
        })
    }

    pub fn user(&self) -> UserApi<'_> {
        UserApi::new(self)
    }

    pub fn products(&self) -> ProductsApi<'_> {
        ProductsApi::new(self)
    }

    pub fn order(&self) -> OrderApi<'_> {
        OrderApi::new(self)
    }

    pub fn admin(&self) -> AdminApi<'_> {
        AdminApi::new(self)
    }

    pub fn attachments(&self) -> &Attachments {
        &self.attachments
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.root, path)
    }

    /// Send one request, logging and attaching both sides of the exchange
    pub async fn send(
        &self,
        method: Method,
        endpoint: &Endpoint,
        session: &Session,
        payload: Payload,
    ) -> E2eResult<ApiResponse> {
        let url = self.url(&endpoint.path);
        info!("{} {}", method, url);

        let mut request: RequestBuilder = self.http.request(method, &url);
        if !endpoint.query.is_empty() {
            request = request.query(&endpoint.query);
        }
        if let Some(token) = session.token() {
            debug!("Presenting bearer token");
            request = request.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        request = match payload {
            Payload::Empty => request,
            Payload::Json(body) => {
                self.attachments.json("Request Body", &body)?;
                request.json(&body)
            }
            Payload::Multipart(form) => request.multipart(form),
        };

        let response = request.send().await?;
        let status = response.status().as_u16();
        let headers = header_map(response.headers());
        let text = response.text().await?;

        info!("Status code is {}", status);
        self.attachments.json("Response Headers", &headers)?;
        self.attachments.text("Response Body", &text)?;

        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
        Ok(ApiResponse { status, body })
    }
}

fn header_map(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .iter()
        .map(|(name, value)| {
            (
                name.to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect()
}

/// A JSON scalar as text; ids come back as numbers or strings
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
