//! `cart.html`: line items, removal and quantity edits

use futures::FutureExt;
use rand::Rng;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

use crate::error::{E2eError, E2eResult};
use crate::runner::{Scenario, ScenarioContext};
use crate::ui::pages::product::MAX_QUANTITY;
use crate::ui::pages::{CartPage, ProductPage};
use crate::ui::UiDriver;
use crate::verify::cart::{line_subtotal, reconcile, CartLineItem, Checkpoint};
use crate::verify::expect_eq;

use super::web_product::{product_url, random_product_ids};

const TAGS: &[&str] = &["web", "cart"];

/// Products put in the cart by each scenario
pub(super) const CART_PRODUCTS: usize = 2;

pub fn scenarios() -> Vec<Scenario> {
    vec![
        Scenario::new("Web shopping cart info correct", TAGS, |ctx| cart_info(ctx).boxed_local()),
        Scenario::new("Web remove product from cart", TAGS, |ctx| remove_item(ctx).boxed_local()),
        Scenario::new("Web edit quantity in cart", TAGS, |ctx| edit_quantity(ctx).boxed_local()),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum QuantityChoice {
    /// Keep what the page starts with
    Current,
    Random,
}

/// Put `CART_PRODUCTS` random products in the cart with random color and
/// size, recording what the page reports after each pick
pub(super) async fn fill_cart(
    ctx: &mut ScenarioContext,
    driver: &Arc<dyn UiDriver>,
    quantity: QuantityChoice,
) -> E2eResult<Vec<CartLineItem>> {
    let names_by_code: BTreeMap<String, String> = ctx
        .db
        .color_codes()?
        .into_iter()
        .map(|(name, code)| (code, name))
        .collect();
    let ids = random_product_ids(ctx, CART_PRODUCTS)?;

    let page = ProductPage::new(driver.as_ref(), ctx.wait_ms());
    let mut recorded = Vec::with_capacity(ids.len());
    for id in ids {
        page.open(&product_url(ctx, id)).await?;

        let name = page.title().await?;
        let code = page.select_random_color(&mut ctx.rng).await?;
        let color = color_name(&names_by_code, &code)?;
        let size = page.select_random_size(&mut ctx.rng).await?;
        let quantity = match quantity {
            QuantityChoice::Current => page.quantity().await?,
            QuantityChoice::Random => page.select_random_quantity(&mut ctx.rng).await?,
        };
        let line = CartLineItem::new(id.to_string(), name, color, size, quantity, page.price().await?)?;

        page.add_to_cart().await?;
        expect_eq("add to cart alert", "已加入購物車", &page.alert().await?)?;

        let shown = CartLineItem::new(
            id.to_string(),
            page.title().await?,
            color_name(&names_by_code, &page.selected_color_code().await?)?,
            page.selected_size().await?,
            page.quantity().await?,
            page.price().await?,
        )?;
        reconcile(Checkpoint::AddToCart, std::slice::from_ref(&line), std::slice::from_ref(&shown))?;
        info!("Added {:?}", line);
        recorded.push(line);
    }

    ctx.attachments.json("shop_list", &recorded)?;
    Ok(recorded)
}

/// Store name of a highlighted color code
fn color_name(names_by_code: &BTreeMap<String, String>, code: &str) -> E2eResult<String> {
    names_by_code
        .get(code)
        .cloned()
        .ok_or_else(|| E2eError::Ui(format!("highlighted color code {} is not in the store", code)))
}

/// Fill the cart and open it
async fn cart_with_products(ctx: &mut ScenarioContext) -> E2eResult<(Arc<dyn UiDriver>, Vec<CartLineItem>)> {
    let driver = ctx.browser().await?;
    let recorded = fill_cart(ctx, &driver, QuantityChoice::Random).await?;
    CartPage::new(driver.as_ref(), ctx.wait_ms()).header().enter_cart().await?;
    Ok((driver, recorded))
}

async fn cart_info(ctx: &mut ScenarioContext) -> E2eResult<()> {
    let (driver, recorded) = cart_with_products(ctx).await?;
    let cart = CartPage::new(driver.as_ref(), ctx.wait_ms());

    let shown = cart.line_items().await?;
    ctx.attachments.json("cart_item_list", &shown)?;
    reconcile(Checkpoint::CartView, &recorded, &shown)
}

async fn remove_item(ctx: &mut ScenarioContext) -> E2eResult<()> {
    let (driver, _) = cart_with_products(ctx).await?;
    let cart = CartPage::new(driver.as_ref(), ctx.wait_ms());

    let mut remaining = cart.line_items().await?;
    let index = ctx.rng.gen_range(0..remaining.len());
    let removed = remaining.remove(index);
    info!("Removing {:?}", removed);
    cart.remove(index).await?;
    expect_eq("remove alert", "已刪除商品", &cart.alert().await?)?;

    let count = cart.wait_item_count(remaining.len()).await?;
    let mut shown = Vec::with_capacity(count);
    for i in 0..count {
        shown.push(cart.line_item(i).await?);
    }
    expect_eq("cart after removal", &remaining, &shown)?;

    let badge = cart.header().cart_count().await?;
    expect_eq("cart badge after removal", &(shown.len() as u32), &badge)
}

async fn edit_quantity(ctx: &mut ScenarioContext) -> E2eResult<()> {
    let driver = ctx.browser().await?;
    fill_cart(ctx, &driver, QuantityChoice::Current).await?;
    let cart = CartPage::new(driver.as_ref(), ctx.wait_ms());
    cart.header().enter_cart().await?;

    let count = cart.item_count().await?;
    let index = ctx.rng.gen_range(0..count);
    let unit_price = cart.price(index).await?;
    let quantity = ctx.rng.gen_range(2..=MAX_QUANTITY);
    info!("Unit price {}, changing to quantity {}", unit_price, quantity);

    cart.change_quantity(index, quantity).await?;
    expect_eq("edit quantity alert", "已修改數量", &cart.alert().await?)?;

    expect_eq("edited quantity", &quantity, &cart.quantity(index).await?)?;
    let subtotal = line_subtotal(&format!("line {}", index), quantity, unit_price)?;
    expect_eq("edited subtotal", &subtotal, &cart.subtotal(index).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Outcome;
    use crate::scenarios::testing::{self, picked_ids, product_page, with_cart, CATALOG_SQL};
    use crate::ui::Locator;

    fn add_button() -> Locator {
        Locator::class("product__add-to-cart-button")
    }

    fn selected_color() -> Locator {
        Locator::class("product__color--selected")
    }

    fn cart_info_scenario() -> Scenario {
        Scenario::new("Web shopping cart info correct", TAGS, |ctx| cart_info(ctx).boxed_local())
    }

    #[tokio::test]
    async fn test_cart_info_matches_added_products() {
        let dir = tempfile::tempdir().unwrap();
        let driver = with_cart(product_page(), &picked_ids())
            .with_alert("已加入購物車")
            .with_alert("已加入購物車");
        let driver = Arc::new(driver);
        let harness = testing::harness(
            testing::config("http://stylish.test", dir.path()),
            testing::store(CATALOG_SQL),
            driver.clone(),
        );

        let result = testing::run(&harness, &cart_info_scenario()).await;
        assert_eq!(result.outcome, Outcome::Passed, "{:?}", result.error);

        let adds = driver
            .actions()
            .iter()
            .filter(|a| a.ends_with("product__add-to-cart-button"))
            .count();
        assert_eq!(adds, CART_PRODUCTS);
        assert!(result.attachments.iter().any(|a| a.name == "shop_list"));
    }

    #[tokio::test]
    async fn test_color_changed_by_add_to_cart_fails_the_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let driver = with_cart(product_page(), &picked_ids())
            .on_click_attribute(&add_button(), &selected_color(), "data_id", "color_code_DDFFBB")
            .with_alert("已加入購物車");
        let harness = testing::harness(
            testing::config("http://stylish.test", dir.path()),
            testing::store(CATALOG_SQL),
            Arc::new(driver),
        );

        let result = testing::run(&harness, &cart_info_scenario()).await;
        assert_eq!(result.outcome, Outcome::Failed);
        let error = result.error.unwrap();
        assert!(error.contains("cart at add to cart"), "{}", error);
        assert!(error.contains("亮綠"), "{}", error);
    }

    #[tokio::test]
    async fn test_unknown_highlighted_color_is_not_a_product_failure() {
        let dir = tempfile::tempdir().unwrap();
        let driver = product_page().with_attribute(&selected_color(), "data_id", "color_code_000000");
        let harness = testing::harness(
            testing::config("http://stylish.test", dir.path()),
            testing::store(CATALOG_SQL),
            Arc::new(driver),
        );

        let result = testing::run(&harness, &cart_info_scenario()).await;
        assert_eq!(result.outcome, Outcome::Errored);
    }
}
