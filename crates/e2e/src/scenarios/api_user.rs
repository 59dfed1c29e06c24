//! `/user` login, logout and profile

use futures::FutureExt;
use serde_json::Value;

use crate::api::Session;
use crate::error::E2eResult;
use crate::runner::{Scenario, ScenarioContext};
use crate::verify::{ensure, expect_eq, expect_status};

const TAGS: &[&str] = &["api", "user"];

pub fn scenarios() -> Vec<Scenario> {
    vec![
        Scenario::new("API login with valid credentials", TAGS, |ctx| login_valid(ctx).boxed_local()),
        Scenario::new("API login without provider", TAGS, |ctx| login_without_provider(ctx).boxed_local()),
        Scenario::new("API logout with valid token", TAGS, |ctx| logout_valid(ctx).boxed_local()),
        Scenario::new("API logout without token", TAGS, |ctx| logout_without_token(ctx).boxed_local()),
        Scenario::new("API logout with expired token", TAGS, |ctx| logout_expired_token(ctx).boxed_local()),
        Scenario::new("API profile with valid token", TAGS, |ctx| profile_valid(ctx).boxed_local()),
        Scenario::new("API profile without login", TAGS, |ctx| profile_anonymous(ctx).boxed_local()),
        Scenario::new("API profile with invalid token", TAGS, |ctx| profile_invalid_token(ctx).boxed_local()),
    ]
}

async fn login_valid(ctx: &mut ScenarioContext) -> E2eResult<()> {
    let mut session = Session::Anonymous;
    let response = ctx
        .api
        .user()
        .login(&mut session, &ctx.account.native_credentials())
        .await?;
    expect_status("login", 200, &response)?;

    let token = ctx.db.access_token(&ctx.account.email)?;
    expect_eq("access token", &Some(token.as_str()), &session.token())?;

    let user = ctx.db.user_record(&ctx.account.email)?;
    expect_eq("login user", &user, &session.user().cloned().unwrap_or(Value::Null))
}

async fn login_without_provider(ctx: &mut ScenarioContext) -> E2eResult<()> {
    let mut session = Session::Anonymous;
    let response = ctx
        .api
        .user()
        .login(&mut session, &ctx.account.credentials_without_provider())
        .await?;
    expect_status("login without provider", 400, &response)?;
    ensure(
        session == Session::Anonymous,
        "session after rejected login",
        "a rejected login must not authenticate the session",
    )
}

async fn logout_valid(ctx: &mut ScenarioContext) -> E2eResult<()> {
    let mut session = ctx.api_login().await?;
    let response = ctx.api.user().logout(&mut session, None).await?;
    expect_status("logout", 200, &response)?;

    let token = ctx.db.access_token(&ctx.account.email)?;
    expect_eq("stored token after logout", "", &token)
}

async fn logout_without_token(ctx: &mut ScenarioContext) -> E2eResult<()> {
    let mut session = Session::Anonymous;
    let response = ctx.api.user().logout(&mut session, None).await?;
    expect_status("logout without token", 401, &response)
}

/// A token reused after logout is forbidden, not merely unauthenticated
async fn logout_expired_token(ctx: &mut ScenarioContext) -> E2eResult<()> {
    let mut session = ctx.api_login().await?;
    let token = session.token().unwrap_or_default().to_string();

    let first = ctx.api.user().logout(&mut session, None).await?;
    expect_status("first logout", 200, &first)?;

    let second = ctx.api.user().logout(&mut session, Some(&token)).await?;
    expect_status("logout with expired token", 403, &second)
}

async fn profile_valid(ctx: &mut ScenarioContext) -> E2eResult<()> {
    let session = ctx.api_login().await?;
    let (status, profile) = ctx.api.user().profile(&session, None).await?;
    expect_eq("profile status", &200, &status)?;

    let user = ctx.db.user_record(&ctx.account.email)?;
    expect_eq("profile", &user.profile(), &profile.unwrap_or(Value::Null))
}

async fn profile_anonymous(ctx: &mut ScenarioContext) -> E2eResult<()> {
    let (status, _) = ctx.api.user().profile(&Session::Anonymous, None).await?;
    expect_eq("profile status without login", &401, &status)
}

async fn profile_invalid_token(ctx: &mut ScenarioContext) -> E2eResult<()> {
    let (status, _) = ctx
        .api
        .user()
        .profile(&Session::Anonymous, Some("Invalid token"))
        .await?;
    expect_eq("profile status with invalid token", &403, &status)
}
