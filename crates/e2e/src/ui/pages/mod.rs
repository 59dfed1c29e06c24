//! Page objects
//!
//! Each page borrows the driver and keeps its selectors to itself. Methods
//! are phrased as user intent; none of them hands an element back.

pub mod admin;
pub mod cart;
pub mod header;
pub mod home;
pub mod login;
pub mod prime;
pub mod product;

use std::time::{Duration, Instant};

use super::{Locator, Presence, UiDriver};
use crate::error::{E2eError, E2eResult};

pub use admin::{AdminPage, ProductEntry};
pub use cart::{CartPage, CheckoutForm, DeliverTime};
pub use header::Header;
pub use home::{Category, HomePage};
pub use login::LoginPage;
pub use prime::PrimePage;
pub use product::ProductPage;

/// Wait for `locator`, failing with a timeout when it never shows up
pub(crate) async fn require(driver: &dyn UiDriver, locator: &Locator, timeout_ms: u64) -> E2eResult<()> {
    match driver.find(locator, timeout_ms).await? {
        Presence::Found => Ok(()),
        Presence::NotFound => Err(E2eError::UiTimeout {
            what: locator.to_string(),
            timeout_ms,
        }),
    }
}

/// Poll the match count of `locator` until it equals `expected`
pub(crate) async fn wait_count(
    driver: &dyn UiDriver,
    locator: &Locator,
    expected: usize,
    timeout_ms: u64,
) -> E2eResult<usize> {
    let deadline = Instant::now() + Duration::from_millis(timeout_ms);
    loop {
        let count = driver.count(locator).await?;
        if count == expected {
            return Ok(count);
        }
        if Instant::now() >= deadline {
            return Err(E2eError::UiTimeout {
                what: format!("{} matches of {}", expected, locator),
                timeout_ms,
            });
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

/// Integer after the last `sep`, e.g. `NT.1299` or `數量｜2`
pub(crate) fn number_after(text: &str, sep: char) -> E2eResult<u32> {
    let tail = text.rsplit(sep).next().unwrap_or(text).trim();
    tail.parse()
        .map_err(|_| E2eError::Ui(format!("expected a number in '{}'", text)))
}

/// Text after the last `sep`
pub(crate) fn text_after(text: &str, sep: char) -> String {
    text.rsplit(sep).next().unwrap_or(text).trim().to_string()
}
