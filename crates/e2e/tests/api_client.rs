//! API client and API scenarios against a mock Stylish server

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use stylish_common::{Account, DataSource, OrderRecord, ProductDetailRow, ProductTitle, UserRecord};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use stylish_e2e::api::{ApiClient, Session};
use stylish_e2e::report::Attachments;
use stylish_e2e::runner::Selection;
use stylish_e2e::scenarios::catalog;
use stylish_e2e::ui::{DriverFactory, UiDriver};
use stylish_e2e::{E2eError, E2eResult, Harness, HarnessConfig, Outcome, TableSet};

const EMAIL: &str = "user0@example";
const TOKEN: &str = "header.payload.signature";

fn config(server: &MockServer, output: &std::path::Path) -> HarnessConfig {
    HarnessConfig {
        base_url: server.uri(),
        output_dir: output.to_path_buf(),
        ..HarnessConfig::default()
    }
}

fn user() -> UserRecord {
    UserRecord {
        id: 10245,
        provider: "native".to_string(),
        email: EMAIL.to_string(),
        name: "user0".to_string(),
        picture: None,
    }
}

fn login_body(token: &str) -> Value {
    json!({
        "data": {
            "access_token": token,
            "access_expired": 3600,
            "user": serde_json::to_value(user()).unwrap(),
        }
    })
}

async fn mount_login(server: &MockServer, token: &str) {
    Mock::given(method("POST"))
        .and(path("/api/1.0/user/login"))
        .and(body_json(json!({"email": EMAIL, "password": "secret", "provider": "native"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(login_body(token)))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_login_then_profile_presents_bearer_token() {
    let server = MockServer::start().await;
    mount_login(&server, TOKEN).await;
    Mock::given(method("GET"))
        .and(path("/api/1.0/user/profile"))
        .and(header("authorization", format!("Bearer {}", TOKEN).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": user().profile()})))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let attachments = Attachments::new(dir.path());
    let api = ApiClient::new(&config(&server, dir.path()), attachments.clone()).unwrap();

    let mut session = Session::Anonymous;
    let account = Account::new(EMAIL, "secret");
    let response = api.user().login(&mut session, &account.native_credentials()).await.unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(session.token(), Some(TOKEN));

    let (status, profile) = api.user().profile(&session, None).await.unwrap();
    assert_eq!(status, 200);
    assert_eq!(profile.unwrap(), user().profile());

    let names: Vec<String> = attachments.entries().into_iter().map(|a| a.name).collect();
    assert!(names.contains(&"Login Request Body".to_string()));
    assert!(names.contains(&"Response Body".to_string()));
}

#[tokio::test]
async fn test_rejected_login_keeps_session_anonymous() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/1.0/user/login"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"errorMsg": "Request Error: provider is required."})))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let api = ApiClient::new(&config(&server, dir.path()), Attachments::new(dir.path())).unwrap();

    let mut session = Session::Anonymous;
    let credentials = Account::new(EMAIL, "secret").credentials_without_provider();
    let response = api.user().login(&mut session, &credentials).await.unwrap();
    assert_eq!(response.status, 400);
    assert_eq!(response.error_msg(), Some("Request Error: provider is required."));
    assert_eq!(session, Session::Anonymous);
}

#[tokio::test]
async fn test_expired_token_is_sent_on_second_logout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/1.0/user/logout"))
        .and(header("authorization", "Bearer expired"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"errorMsg": "Forbidden"})))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let api = ApiClient::new(&config(&server, dir.path()), Attachments::new(dir.path())).unwrap();

    let mut session = Session::Anonymous;
    let response = api.user().logout(&mut session, Some("expired")).await.unwrap();
    assert_eq!(response.status, 403);
    assert_eq!(session.token(), Some("expired"));
}

#[tokio::test]
async fn test_listing_sends_paging_and_keeps_non_json_bodies() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/1.0/products/women"))
        .and(query_param("paging", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [], "next_paging": null})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/1.0/products/search"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let api = ApiClient::new(&config(&server, dir.path()), Attachments::new(dir.path())).unwrap();

    let page = api.products().by_category(Some("women"), Some(2)).await.unwrap();
    assert_eq!(page.status, 200);
    assert_eq!(page.data(), Some(&json!([])));

    let broken = api.products().by_keyword(Some("洋裝"), Some(-1)).await.unwrap();
    assert_eq!(broken.status, 500);
    assert_eq!(broken.body, json!("Internal Server Error"));
    assert_eq!(broken.error_msg(), None);
}

/// Ground truth for one signed-in user
struct StaticStore {
    token: String,
}

impl DataSource for StaticStore {
    fn product_titles(&self) -> stylish_common::Result<Vec<ProductTitle>> {
        Ok(Vec::new())
    }

    fn product_details(&self, _product_id: Option<i64>) -> stylish_common::Result<Vec<ProductDetailRow>> {
        Ok(Vec::new())
    }

    fn color_codes(&self) -> stylish_common::Result<BTreeMap<String, String>> {
        Ok(BTreeMap::new())
    }

    fn user_record(&self, email: &str) -> stylish_common::Result<UserRecord> {
        if email == EMAIL {
            Ok(user())
        } else {
            Err(stylish_common::Error::not_found("user", email))
        }
    }

    fn access_token(&self, _email: &str) -> stylish_common::Result<String> {
        Ok(self.token.clone())
    }

    fn order_by_number(&self, number: &str) -> stylish_common::Result<OrderRecord> {
        Err(stylish_common::Error::not_found("order", number))
    }
}

struct NoBrowser;

#[async_trait]
impl DriverFactory for NoBrowser {
    async fn launch(&self) -> E2eResult<Arc<dyn UiDriver>> {
        Err(E2eError::Ui("no browser in API tests".to_string()))
    }
}

async fn run_login_scenario(stored_token: &str) -> Outcome {
    let server = MockServer::start().await;
    mount_login(&server, TOKEN).await;

    let dir = tempfile::tempdir().unwrap();
    let harness = Harness::new(
        config(&server, dir.path()),
        Account::new(EMAIL, "secret"),
        Arc::new(StaticStore {
            token: stored_token.to_string(),
        }),
        TableSet::default(),
        Arc::new(NoBrowser),
    );

    let scenarios = catalog(&TableSet::default());
    let selection = Selection {
        name: Some("API login with valid credentials".to_string()),
        ..Selection::default()
    };
    let suite = harness.run(&scenarios, &selection).await;
    assert_eq!(suite.total, 1);

    let path = suite.write(dir.path()).unwrap();
    assert!(path.is_file());
    suite.results[0].outcome
}

#[tokio::test]
async fn test_login_scenario_passes_when_token_matches_store() {
    assert_eq!(run_login_scenario(TOKEN).await, Outcome::Passed);
}

#[tokio::test]
async fn test_login_scenario_fails_when_token_differs_from_store() {
    assert_eq!(run_login_scenario("stale").await, Outcome::Failed);
}
