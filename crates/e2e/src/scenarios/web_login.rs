//! `login.html`: sign in, sign out and a revoked token

use futures::FutureExt;

use crate::error::E2eResult;
use crate::runner::{Scenario, ScenarioContext};
use crate::ui::pages::LoginPage;
use crate::verify::{ensure, expect_eq};

const TAGS: &[&str] = &["web", "login"];

/// Credentials no account is registered with
const UNKNOWN_EMAIL: &str = "user1@foo.bar";
const UNKNOWN_PASSWORD: &str = "abcdefg";

pub fn scenarios() -> Vec<Scenario> {
    vec![
        Scenario::new("Web login and logout success", TAGS, |ctx| login_logout(ctx).boxed_local()),
        Scenario::new("Web login failed with incorrect credentials", TAGS, |ctx| {
            login_failed(ctx).boxed_local()
        }),
        Scenario::new("Web login with invalid access token", TAGS, |ctx| {
            invalid_token(ctx).boxed_local()
        }),
    ]
}

async fn login_logout(ctx: &mut ScenarioContext) -> E2eResult<()> {
    let driver = ctx.web_login().await?;
    let login = LoginPage::new(driver.as_ref(), ctx.wait_ms());

    let jwt = login.jwt_token().await?;
    ctx.attachments.text("jwt_token", jwt.as_deref().unwrap_or_default())?;
    let stored = ctx.db.access_token(&ctx.account.email)?;
    expect_eq("jwt token after login", &Some(stored), &jwt)?;

    login.logout().await?;
    expect_eq("logout alert", "Logout Success", &login.alert().await?)?;

    let jwt = login.jwt_token().await?;
    ensure(jwt.is_none(), "jwt token after logout", format!("token {:?} is still stored", jwt))?;
    let stored = ctx.db.access_token(&ctx.account.email)?;
    expect_eq("stored token after logout", "", &stored)
}

async fn login_failed(ctx: &mut ScenarioContext) -> E2eResult<()> {
    let driver = ctx.browser().await?;
    let login = LoginPage::new(driver.as_ref(), ctx.wait_ms());
    login.open(&ctx.page_url("login.html")).await?;

    let alert = login.sign_in(UNKNOWN_EMAIL, UNKNOWN_PASSWORD).await?;
    expect_eq("login alert", "Login Failed", &alert)
}

/// A token put back into local storage after logout is refused
async fn invalid_token(ctx: &mut ScenarioContext) -> E2eResult<()> {
    let driver = ctx.web_login().await?;
    let login = LoginPage::new(driver.as_ref(), ctx.wait_ms());

    let jwt = login.jwt_token().await?.unwrap_or_default();
    ctx.attachments.text("jwt_token", &jwt)?;
    login.logout().await?;
    login.alert().await?;

    login.set_jwt_token(&jwt).await?;
    driver.goto(&ctx.page_url("profile.html")).await?;
    expect_eq("profile alert", "Invalid Access Token", &login.alert().await?)
}
