//! `index.html`: search box, category links and the product grid

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::E2eResult;
use crate::ui::{ClickMode, Locator, Presence, UiDriver};

use super::Header;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Women,
    Men,
    Accessories,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Women, Category::Men, Category::Accessories];

    /// Value used by the API and the store
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Women => "women",
            Category::Men => "men",
            Category::Accessories => "accessories",
        }
    }

    /// Link text in the header
    pub fn label(&self) -> &'static str {
        match self {
            Category::Women => "女裝",
            Category::Men => "男裝",
            Category::Accessories => "配件",
        }
    }
}

fn search_input() -> Locator {
    Locator::css("input.header__search-input")
}

/// Cells of a grid that holds at least one product
fn product_cells() -> Locator {
    Locator::xpath("//div[@class='products' and count(a)>0]/child::*")
}

fn product_titles() -> Locator {
    Locator::css("div.product__title")
}

const SCROLL_TO_BOTTOM: &str = "window.scrollTo(0, document.body.scrollHeight)";

pub struct HomePage<'a> {
    driver: &'a dyn UiDriver,
    wait_ms: u64,
}

impl<'a> HomePage<'a> {
    pub fn new(driver: &'a dyn UiDriver, wait_ms: u64) -> Self {
        Self { driver, wait_ms }
    }

    pub async fn open(&self, url: &str) -> E2eResult<()> {
        self.driver.goto(url).await
    }

    pub fn header(&self) -> Header<'a> {
        Header::new(self.driver, self.wait_ms)
    }

    /// Search and wait for the new grid. `NotFound` means no product showed up.
    pub async fn search(&self, keyword: &str) -> E2eResult<Presence> {
        info!("Searching for '{}'", keyword);
        self.driver.fill(&search_input(), keyword, self.wait_ms).await?;
        self.driver.press(&search_input(), "Enter", self.wait_ms).await?;
        self.await_grid().await
    }

    pub async fn switch_category(&self, category: Category) -> E2eResult<Presence> {
        info!("Switching to category {}", category.as_str());
        self.driver
            .click(&Locator::link_text(category.label()), ClickMode::Native, self.wait_ms)
            .await?;
        self.await_grid().await
    }

    async fn await_grid(&self) -> E2eResult<Presence> {
        self.driver.wait_gone(&product_cells(), self.wait_ms).await?;
        self.driver.find(&product_cells(), self.wait_ms).await
    }

    pub async fn presented_count(&self) -> E2eResult<usize> {
        self.driver.count(&product_cells()).await
    }

    /// Scroll until `total` products are presented; returns the final count
    pub async fn load_all(&self, total: usize) -> E2eResult<usize> {
        let mut presented = self.presented_count().await?;
        while presented < total {
            self.driver.eval(SCROLL_TO_BOTTOM).await?;
            presented = self
                .driver
                .wait_count_above(&product_cells(), presented, self.wait_ms)
                .await?;
            debug!("{} of {} products presented", presented, total);
        }
        Ok(presented)
    }

    pub async fn product_titles(&self) -> E2eResult<Vec<String>> {
        self.driver.texts(&product_titles(), self.wait_ms).await
    }
}
