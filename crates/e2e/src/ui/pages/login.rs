//! `login.html` and the member profile's logout button

use serde_json::Value;
use tracing::info;

use crate::error::E2eResult;
use crate::ui::{xpath_literal, ClickMode, Locator, Presence, UiDriver};

use super::Header;

const TOKEN_KEY: &str = "jwtToken";

fn email_input() -> Locator {
    Locator::id("email")
}

fn password_input() -> Locator {
    Locator::id("pw")
}

fn login_button() -> Locator {
    Locator::css("button.login100-form-btn")
}

fn logout_button() -> Locator {
    Locator::xpath(format!("//button[text()={}]", xpath_literal("登出")))
}

pub struct LoginPage<'a> {
    driver: &'a dyn UiDriver,
    wait_ms: u64,
}

impl<'a> LoginPage<'a> {
    pub fn new(driver: &'a dyn UiDriver, wait_ms: u64) -> Self {
        Self { driver, wait_ms }
    }

    pub async fn open(&self, url: &str) -> E2eResult<()> {
        self.driver.goto(url).await
    }

    pub fn header(&self) -> Header<'a> {
        Header::new(self.driver, self.wait_ms)
    }

    pub async fn enter_credentials(&self, email: &str, password: &str) -> E2eResult<()> {
        self.driver.fill(&email_input(), email, self.wait_ms).await?;
        self.driver.fill(&password_input(), password, self.wait_ms).await
    }

    pub async fn submit(&self) -> E2eResult<()> {
        self.driver.click(&login_button(), ClickMode::Native, self.wait_ms).await
    }

    /// Enter credentials, submit and return the resulting dialog text
    pub async fn sign_in(&self, email: &str, password: &str) -> E2eResult<String> {
        info!("Signing in as {}", email);
        self.enter_credentials(email, password).await?;
        self.submit().await?;
        self.alert().await
    }

    pub async fn logout(&self) -> E2eResult<()> {
        self.driver.click(&logout_button(), ClickMode::Native, self.wait_ms).await
    }

    pub async fn alert(&self) -> E2eResult<String> {
        self.driver.wait_alert(self.wait_ms).await
    }

    /// Token kept in local storage, `None` when signed out
    pub async fn jwt_token(&self) -> E2eResult<Option<String>> {
        let value = self
            .driver
            .eval(&format!("localStorage.getItem('{}')", TOKEN_KEY))
            .await?;
        Ok(match value {
            Value::String(token) => Some(token),
            _ => None,
        })
    }

    pub async fn set_jwt_token(&self, token: &str) -> E2eResult<()> {
        let literal = serde_json::to_string(token)?;
        self.driver
            .eval(&format!("localStorage.setItem('{}', {})", TOKEN_KEY, literal))
            .await?;
        Ok(())
    }

    /// Whether the login form is on screen, e.g. after a redirect
    pub async fn is_login_form_shown(&self) -> E2eResult<Presence> {
        self.driver.find(&login_button(), self.wait_ms).await
    }
}
