//! `product.html?id=…`: color, size and quantity pickers

use rand::Rng;
use tracing::{debug, info};

use crate::error::{E2eError, E2eResult};
use crate::ui::{xpath_literal, ClickMode, Locator, UiDriver};

use super::{number_after, Header};

/// The quantity editor does not go past this
pub const MAX_QUANTITY: u32 = 9;

/// Add button text once a size has been picked
const ADD_TO_CART_READY: &str = "加入購物車";

const SELECTED_COLOR_CLASS: &str = "product__color--selected";

fn color_swatch(code: &str) -> Locator {
    Locator::css(format!("div[data_id='color_code_{}']", code))
}

fn size_option(size: &str) -> Locator {
    Locator::xpath(format!("//div[@class='product__size' and text()={}]", xpath_literal(size)))
}

fn colors() -> Locator {
    Locator::class("product__color")
}

fn sizes() -> Locator {
    Locator::class("product__size")
}

fn selected_color() -> Locator {
    Locator::class(SELECTED_COLOR_CLASS)
}

fn selected_size() -> Locator {
    Locator::class("product__size--selected")
}

fn add_to_cart() -> Locator {
    Locator::class("product__add-to-cart-button")
}

fn quantity_add() -> Locator {
    Locator::class("product__quantity-add")
}

fn quantity_minus() -> Locator {
    Locator::class("product__quantity-minus")
}

fn quantity_value() -> Locator {
    Locator::class("product__quantity-value")
}

fn price() -> Locator {
    Locator::class("product__price")
}

fn title() -> Locator {
    Locator::class("product__title")
}

pub struct ProductPage<'a> {
    driver: &'a dyn UiDriver,
    wait_ms: u64,
}

impl<'a> ProductPage<'a> {
    pub fn new(driver: &'a dyn UiDriver, wait_ms: u64) -> Self {
        Self { driver, wait_ms }
    }

    pub async fn open(&self, url: &str) -> E2eResult<()> {
        self.driver.goto(url).await
    }

    pub fn header(&self) -> Header<'a> {
        Header::new(self.driver, self.wait_ms)
    }

    pub async fn alert(&self) -> E2eResult<String> {
        self.driver.wait_alert(self.wait_ms).await
    }

    pub async fn select_color(&self, code: &str) -> E2eResult<()> {
        self.driver.click(&color_swatch(code), ClickMode::Script, self.wait_ms).await
    }

    pub async fn is_color_highlighted(&self, code: &str) -> E2eResult<bool> {
        let class = self.driver.attribute(&color_swatch(code), "class", self.wait_ms).await?;
        Ok(class.is_some_and(|c| c.split_whitespace().any(|c| c == SELECTED_COLOR_CLASS)))
    }

    pub async fn select_size(&self, size: &str) -> E2eResult<()> {
        self.driver.click(&size_option(size), ClickMode::Script, self.wait_ms).await
    }

    pub async fn title(&self) -> E2eResult<String> {
        self.driver.text(&title(), self.wait_ms).await
    }

    /// Unit price, rendered as `NT.<n>`
    pub async fn price(&self) -> E2eResult<u32> {
        number_after(&self.driver.text(&price(), self.wait_ms).await?, '.')
    }

    /// Code of the highlighted color, from its `data_id="color_code_<code>"`
    pub async fn selected_color_code(&self) -> E2eResult<String> {
        let data_id = self
            .driver
            .attribute(&selected_color(), "data_id", self.wait_ms)
            .await?
            .ok_or_else(|| E2eError::Ui("selected color has no data_id".to_string()))?;
        Ok(data_id.rsplit('_').next().unwrap_or_default().to_string())
    }

    pub async fn selected_size(&self) -> E2eResult<String> {
        self.driver.text(&selected_size(), self.wait_ms).await
    }

    pub async fn quantity(&self) -> E2eResult<u32> {
        number_after(&self.driver.text(&quantity_value(), self.wait_ms).await?, '.')
    }

    pub async fn is_add_to_cart_available(&self) -> E2eResult<bool> {
        Ok(self.driver.text(&add_to_cart(), self.wait_ms).await? == ADD_TO_CART_READY)
    }

    async fn require_size(&self) -> E2eResult<()> {
        if self.is_add_to_cart_available().await? {
            Ok(())
        } else {
            Err(E2eError::Ui("no size has been selected".to_string()))
        }
    }

    pub async fn increase_quantity(&self, times: u32) -> E2eResult<()> {
        self.require_size().await?;
        self.click_times(&quantity_add(), times).await
    }

    pub async fn decrease_quantity(&self, times: u32) -> E2eResult<()> {
        self.require_size().await?;
        self.click_times(&quantity_minus(), times).await
    }

    async fn click_times(&self, button: &Locator, times: u32) -> E2eResult<()> {
        for _ in 0..times {
            self.driver.click(button, ClickMode::Script, self.wait_ms).await?;
        }
        Ok(())
    }

    /// Requires a selected size
    pub async fn add_to_cart(&self) -> E2eResult<()> {
        self.require_size().await?;
        self.add_to_cart_forced().await
    }

    /// Click add-to-cart whatever the page state
    pub async fn add_to_cart_forced(&self) -> E2eResult<()> {
        info!("Adding product to cart");
        self.driver.click(&add_to_cart(), ClickMode::Script, self.wait_ms).await
    }

    /// Click a random swatch and report the code the page now highlights
    pub async fn select_random_color<R: Rng + ?Sized>(&self, rng: &mut R) -> E2eResult<String> {
        let index = self.random_index(&colors(), rng).await?;
        self.driver.click(&colors().nth(index), ClickMode::Script, self.wait_ms).await?;
        let code = self.selected_color_code().await?;
        debug!("Selected color {}", code);
        Ok(code)
    }

    pub async fn select_random_size<R: Rng + ?Sized>(&self, rng: &mut R) -> E2eResult<String> {
        let index = self.random_index(&sizes(), rng).await?;
        self.driver.click(&sizes().nth(index), ClickMode::Script, self.wait_ms).await?;
        let size = self.selected_size().await?;
        debug!("Selected size {}", size);
        Ok(size)
    }

    /// Move the quantity to a random value in `1..=9`; returns what the page shows
    pub async fn select_random_quantity<R: Rng + ?Sized>(&self, rng: &mut R) -> E2eResult<u32> {
        let target = rng.gen_range(1..=MAX_QUANTITY);
        let current = self.quantity().await?;
        if target > current {
            self.increase_quantity(target - current).await?;
        } else if target < current {
            self.decrease_quantity(current - target).await?;
        }
        let quantity = self.quantity().await?;
        debug!("Selected quantity {} (target {})", quantity, target);
        Ok(quantity)
    }

    async fn random_index<R: Rng + ?Sized>(&self, options: &Locator, rng: &mut R) -> E2eResult<usize> {
        let count = self.driver.wait_count_above(options, 0, self.wait_ms).await?;
        Ok(rng.gen_range(0..count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::fake::FakeDriver;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn page_with_size_selected() -> FakeDriver {
        FakeDriver::new()
            .with_text(&add_to_cart(), ADD_TO_CART_READY)
            .with_text(&quantity_value(), "1")
            .with_text(&price(), "NT.799")
            .with_texts(&colors(), &["", ""])
            .with_texts(&sizes(), &["S", "M"])
            .with_text(&selected_size(), "M")
            .with_attribute(&selected_color(), "data_id", "color_code_FFFFFF")
    }

    #[tokio::test]
    async fn test_random_selections_report_page_state() {
        let driver = page_with_size_selected();
        let page = ProductPage::new(&driver, 100);
        let mut rng = StdRng::seed_from_u64(7);

        assert_eq!(page.select_random_color(&mut rng).await.unwrap(), "FFFFFF");
        assert_eq!(page.select_random_size(&mut rng).await.unwrap(), "M");
        assert_eq!(page.price().await.unwrap(), 799);

        let actions = driver.actions();
        assert!(actions[0].starts_with("js-click css=.product__color >> nth="));
        assert!(actions[1].starts_with("js-click css=.product__size >> nth="));
    }

    #[tokio::test]
    async fn test_random_quantity_clicks_towards_target() {
        let driver = page_with_size_selected();
        let page = ProductPage::new(&driver, 100);
        let mut rng = StdRng::seed_from_u64(11);

        // The fake never changes the displayed value, so only the clicks are observable
        page.select_random_quantity(&mut rng).await.unwrap();
        let adds = driver
            .actions()
            .iter()
            .filter(|a| *a == "js-click css=.product__quantity-add")
            .count();
        assert!(adds <= (MAX_QUANTITY - 1) as usize);
        assert!(!driver.actions().iter().any(|a| a.contains("quantity-minus")));
    }

    #[tokio::test]
    async fn test_quantity_change_requires_size() {
        let driver = FakeDriver::new().with_text(&add_to_cart(), "請選擇尺寸");
        let page = ProductPage::new(&driver, 100);

        assert!(page.increase_quantity(1).await.is_err());
        assert!(page.add_to_cart().await.is_err());
        page.add_to_cart_forced().await.unwrap();
        assert_eq!(driver.actions(), ["js-click css=.product__add-to-cart-button"]);
    }

    #[tokio::test]
    async fn test_color_highlight() {
        let driver = FakeDriver::new()
            .with_attribute(&color_swatch("DDFFBB"), "class", "product__color product__color--selected")
            .with_attribute(&color_swatch("CCCCCC"), "class", "product__color");
        let page = ProductPage::new(&driver, 100);

        assert!(page.is_color_highlighted("DDFFBB").await.unwrap());
        assert!(!page.is_color_highlighted("CCCCCC").await.unwrap());
        assert_eq!(
            size_option("XL").as_str(),
            "xpath=//div[@class='product__size' and text()='XL']"
        );
    }
}
