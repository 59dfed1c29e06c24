//! Site header shared by every storefront page

use crate::error::E2eResult;
use crate::ui::{ClickMode, Locator, UiDriver};

use super::number_after;

fn cart_badge() -> Locator {
    Locator::class("header__link-icon-cart-number")
}

fn cart_link() -> Locator {
    Locator::css("a[href='./cart.html']")
}

fn profile_link() -> Locator {
    Locator::css("a[href='./profile.html']")
}

pub struct Header<'a> {
    driver: &'a dyn UiDriver,
    wait_ms: u64,
}

impl<'a> Header<'a> {
    pub fn new(driver: &'a dyn UiDriver, wait_ms: u64) -> Self {
        Self { driver, wait_ms }
    }

    /// Number on the cart badge
    pub async fn cart_count(&self) -> E2eResult<u32> {
        let text = self.driver.text(&cart_badge(), self.wait_ms).await?;
        number_after(&text, '.')
    }

    pub async fn enter_cart(&self) -> E2eResult<()> {
        self.driver.click(&cart_link(), ClickMode::Native, self.wait_ms).await
    }

    pub async fn open_profile(&self) -> E2eResult<()> {
        self.driver.click(&profile_link(), ClickMode::Native, self.wait_ms).await
    }
}
