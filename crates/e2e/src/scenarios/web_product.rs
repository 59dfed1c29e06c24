//! `product.html`: color, size and quantity pickers and add-to-cart

use futures::FutureExt;
use rand::seq::{IteratorRandom, SliceRandom};
use std::collections::BTreeMap;
use stylish_common::ProductDetailRow;
use tracing::info;

use crate::error::{E2eError, E2eResult};
use crate::runner::{Scenario, ScenarioContext};
use crate::ui::pages::product::MAX_QUANTITY;
use crate::ui::pages::ProductPage;
use crate::verify::{ensure, expect_eq};

const TAGS: &[&str] = &["web", "product"];

/// Clicks on `+` in the quantity scenarios
const QUANTITY_STEPS: u32 = 8;

pub fn scenarios() -> Vec<Scenario> {
    vec![
        Scenario::new("Web product color selection", TAGS, |ctx| color_selection(ctx).boxed_local()),
        Scenario::new("Web product size selection", TAGS, |ctx| size_selection(ctx).boxed_local()),
        Scenario::new("Web product increase quantity", TAGS, |ctx| {
            increase_quantity(ctx).boxed_local()
        }),
        Scenario::new("Web product decrease quantity", TAGS, |ctx| {
            decrease_quantity(ctx).boxed_local()
        }),
        Scenario::new("Web product add to cart success", TAGS, |ctx| {
            add_to_cart_success(ctx).boxed_local()
        }),
        Scenario::new("Web product add to cart without size", TAGS, |ctx| {
            add_to_cart_without_size(ctx).boxed_local()
        }),
    ]
}

/// Colors and sizes the store holds for one product
pub(super) struct ProductOptions {
    pub id: i64,
    /// Color name → code
    pub colors: BTreeMap<String, String>,
    /// In first-appearance order
    pub sizes: Vec<String>,
}

impl ProductOptions {
    pub fn from_rows(id: i64, rows: &[ProductDetailRow]) -> Self {
        let mut colors = BTreeMap::new();
        let mut sizes: Vec<String> = Vec::new();
        for row in rows.iter().filter(|r| r.id == id) {
            colors.insert(row.color_name.clone(), row.color_code.clone());
            if !sizes.contains(&row.size) {
                sizes.push(row.size.clone());
            }
        }
        Self { id, colors, sizes }
    }

    /// Name of the color with `code`
    pub fn color_name(&self, code: &str) -> Option<&str> {
        self.colors
            .iter()
            .find(|(_, c)| c.as_str() == code)
            .map(|(name, _)| name.as_str())
    }
}

/// Every distinct product id in the store
pub(super) fn product_ids(ctx: &ScenarioContext) -> E2eResult<Vec<i64>> {
    Ok(ctx.db.product_titles()?.into_iter().map(|t| t.id).collect())
}

/// `amount` distinct product ids, picked with the scenario's RNG
pub(super) fn random_product_ids(ctx: &mut ScenarioContext, amount: usize) -> E2eResult<Vec<i64>> {
    let ids = product_ids(ctx)?;
    if ids.len() < amount {
        return Err(E2eError::DataProvider(format!(
            "need {} products, the store has {}",
            amount,
            ids.len()
        )));
    }
    let picked: Vec<i64> = ids.choose_multiple(&mut ctx.rng, amount).copied().collect();
    info!("Picked products {:?}", picked);
    Ok(picked)
}

pub(super) fn product_url(ctx: &ScenarioContext, id: i64) -> String {
    ctx.page_url(&format!("product.html?id={}", id))
}

/// A random product and its options, with its page open
async fn open_random_product(ctx: &mut ScenarioContext) -> E2eResult<ProductOptions> {
    let id = random_product_ids(ctx, 1)?
        .into_iter()
        .next()
        .ok_or_else(|| E2eError::DataProvider("no product to open".to_string()))?;
    let rows = ctx.db.product_details(Some(id))?;
    let options = ProductOptions::from_rows(id, &rows);

    let driver = ctx.browser().await?;
    let page = ProductPage::new(driver.as_ref(), ctx.wait_ms());
    page.open(&product_url(ctx, id)).await?;
    Ok(options)
}

fn random_size(ctx: &mut ScenarioContext, options: &ProductOptions) -> E2eResult<String> {
    options
        .sizes
        .iter()
        .choose(&mut ctx.rng)
        .cloned()
        .ok_or_else(|| E2eError::DataProvider(format!("product {} has no sizes", options.id)))
}

/// Each color, once selected, is the one highlighted
async fn color_selection(ctx: &mut ScenarioContext) -> E2eResult<()> {
    let options = open_random_product(ctx).await?;
    let driver = ctx.browser().await?;
    let page = ProductPage::new(driver.as_ref(), ctx.wait_ms());

    for (name, code) in &options.colors {
        page.select_color(code).await?;
        let selected = page.selected_color_code().await?;
        let highlighted = options.color_name(&selected).unwrap_or(selected.as_str());
        info!("Highlighted color is {}", highlighted);
        expect_eq(&format!("highlighted color of product {}", options.id), name, highlighted)?;
    }
    Ok(())
}

async fn size_selection(ctx: &mut ScenarioContext) -> E2eResult<()> {
    let options = open_random_product(ctx).await?;
    let driver = ctx.browser().await?;
    let page = ProductPage::new(driver.as_ref(), ctx.wait_ms());

    for size in &options.sizes {
        page.select_size(size).await?;
        let highlighted = page.selected_size().await?;
        expect_eq(&format!("highlighted size of product {}", options.id), size, &highlighted)?;
    }
    Ok(())
}

/// Quantity follows `+` up to the cap and stays there
async fn increase_quantity(ctx: &mut ScenarioContext) -> E2eResult<()> {
    let options = open_random_product(ctx).await?;
    let size = random_size(ctx, &options)?;
    let driver = ctx.browser().await?;
    let page = ProductPage::new(driver.as_ref(), ctx.wait_ms());
    page.select_size(&size).await?;

    let origin = page.quantity().await?;
    page.increase_quantity(QUANTITY_STEPS).await?;
    let expected = (origin + QUANTITY_STEPS).min(MAX_QUANTITY);
    expect_eq("quantity after increase", &expected, &page.quantity().await?)?;

    page.increase_quantity(2).await?;
    expect_eq("quantity past the maximum", &expected, &page.quantity().await?)
}

async fn decrease_quantity(ctx: &mut ScenarioContext) -> E2eResult<()> {
    let options = open_random_product(ctx).await?;
    let size = random_size(ctx, &options)?;
    let driver = ctx.browser().await?;
    let page = ProductPage::new(driver.as_ref(), ctx.wait_ms());
    page.select_size(&size).await?;

    let origin = page.quantity().await?;
    page.increase_quantity(QUANTITY_STEPS).await?;
    page.decrease_quantity(QUANTITY_STEPS).await?;
    expect_eq("quantity after decrease", &origin, &page.quantity().await?)
}

async fn add_to_cart_success(ctx: &mut ScenarioContext) -> E2eResult<()> {
    let options = open_random_product(ctx).await?;
    let size = random_size(ctx, &options)?;
    let driver = ctx.browser().await?;
    let page = ProductPage::new(driver.as_ref(), ctx.wait_ms());
    page.select_size(&size).await?;

    page.add_to_cart().await?;
    expect_eq("add to cart alert", "已加入購物車", &page.alert().await?)?;
    let count = page.header().cart_count().await?;
    expect_eq("cart badge", &1, &count)
}

async fn add_to_cart_without_size(ctx: &mut ScenarioContext) -> E2eResult<()> {
    open_random_product(ctx).await?;
    let driver = ctx.browser().await?;
    let page = ProductPage::new(driver.as_ref(), ctx.wait_ms());

    ensure(
        !page.is_add_to_cart_available().await?,
        "add to cart button",
        "button is ready before a size is picked",
    )?;
    page.add_to_cart_forced().await?;
    expect_eq("add to cart alert", "請選擇尺寸", &page.alert().await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: i64, color: (&str, &str), size: &str) -> ProductDetailRow {
        ProductDetailRow {
            id,
            category: "women".to_string(),
            title: "洋裝".to_string(),
            description: String::new(),
            price: 799,
            texture: String::new(),
            wash: String::new(),
            place: String::new(),
            note: String::new(),
            story: String::new(),
            main_image: "main.jpg".to_string(),
            image_id: 1,
            image: "0.jpg".to_string(),
            variant_id: 1,
            color_id: 1,
            color_code: color.0.to_string(),
            color_name: color.1.to_string(),
            size: size.to_string(),
            stock: 1,
        }
    }

    #[test]
    fn test_product_options() {
        let rows = vec![
            row(1, ("FFFFFF", "白色"), "S"),
            row(1, ("FFFFFF", "白色"), "M"),
            row(1, ("DDFFBB", "亮綠"), "S"),
            row(2, ("CCCCCC", "淺灰"), "XL"),
        ];
        let options = ProductOptions::from_rows(1, &rows);

        assert_eq!(options.sizes, ["S", "M"]);
        assert_eq!(options.colors.len(), 2);
        assert_eq!(options.color_name("DDFFBB"), Some("亮綠"));
        assert_eq!(options.color_name("CCCCCC"), None);
    }
}
