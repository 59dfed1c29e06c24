//! `get_prime.html`: turns a test card into a one-time payment prime

use tracing::info;

use crate::config::PaymentCard;
use crate::error::{E2eError, E2eResult};
use crate::ui::{ClickMode, Locator, UiDriver};

use super::cart::{fill_card, CardFields};

const PRIME_FIELDS: CardFields = CardFields {
    security_code_id: "cc-cvc",
};

fn get_prime_button() -> Locator {
    Locator::id("checkoutBtn")
}

pub struct PrimePage<'a> {
    driver: &'a dyn UiDriver,
    wait_ms: u64,
}

impl<'a> PrimePage<'a> {
    pub fn new(driver: &'a dyn UiDriver, wait_ms: u64) -> Self {
        Self { driver, wait_ms }
    }

    pub async fn open(&self, url: &str) -> E2eResult<()> {
        self.driver.goto(url).await
    }

    /// Fill the hosted card frames and read the prime from the dialog.
    /// Any failure on the way is a prime acquisition failure.
    pub async fn prime(&self, card: &PaymentCard) -> E2eResult<String> {
        let acquire = async {
            fill_card(self.driver, self.wait_ms, card, &PRIME_FIELDS).await?;
            self.driver
                .click(&get_prime_button(), ClickMode::Native, self.wait_ms)
                .await?;
            self.driver.wait_alert(self.wait_ms).await
        };

        let prime = acquire
            .await
            .map_err(|e| E2eError::PrimeAcquisition(e.to_string()))?;
        if prime.trim().is_empty() {
            return Err(E2eError::PrimeAcquisition("empty prime".to_string()));
        }
        info!("Acquired prime ({} chars)", prime.len());
        Ok(prime)
    }
}
