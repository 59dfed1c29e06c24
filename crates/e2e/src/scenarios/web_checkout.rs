//! Checkout from `cart.html`, per checkout table row

use futures::FutureExt;
use tracing::info;

use crate::data::{ScenarioRecord, TableKind, TableSet};
use crate::error::E2eResult;
use crate::runner::{Scenario, ScenarioContext};
use crate::ui::pages::{CartPage, CheckoutForm};
use crate::verify::cart::{reconcile, Checkpoint};
use crate::verify::expect_eq;

use super::web_cart::{fill_cart, QuantityChoice};

const TAGS: &[&str] = &["web", "checkout"];

const PAYMENT_SUCCESS: &str = "付款成功";

pub fn scenarios(tables: &TableSet) -> Vec<Scenario> {
    let mut scenarios = vec![Scenario::new("Web checkout with empty cart", TAGS, |ctx| {
        empty_cart(ctx).boxed_local()
    })];

    for record in tables.records(TableKind::CheckoutInvalid) {
        scenarios.push(Scenario::new(
            format!("Web checkout with invalid values, row {}", record.row() + 1),
            TAGS,
            move |ctx| checkout(ctx, record.clone(), Expectation::Rejected).boxed_local(),
        ));
    }
    for record in tables.records(TableKind::CheckoutValid) {
        scenarios.push(Scenario::new(
            format!("Web checkout with valid values, row {}", record.row() + 1),
            TAGS,
            move |ctx| checkout(ctx, record.clone(), Expectation::Paid).boxed_local(),
        ));
    }

    scenarios
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expectation {
    /// The row's `Alert Msg` shows and nothing is paid
    Rejected,
    /// Payment succeeds and the thank-you view lists the cart
    Paid,
}

async fn empty_cart(ctx: &mut ScenarioContext) -> E2eResult<()> {
    let driver = ctx.web_login().await?;
    let cart = CartPage::new(driver.as_ref(), ctx.wait_ms());
    cart.header().enter_cart().await?;

    cart.checkout().await?;
    expect_eq("empty cart alert", "尚未選購商品", &cart.alert().await?)
}

async fn checkout(ctx: &mut ScenarioContext, record: ScenarioRecord, expectation: Expectation) -> E2eResult<()> {
    let form = CheckoutForm::from_record(&record)?;
    let expected_alert = match expectation {
        Expectation::Rejected => record.get("Alert Msg")?.to_string(),
        Expectation::Paid => PAYMENT_SUCCESS.to_string(),
    };

    let driver = ctx.web_login().await?;
    let recorded = fill_cart(ctx, &driver, QuantityChoice::Random).await?;
    let cart = CartPage::new(driver.as_ref(), ctx.wait_ms());
    cart.header().enter_cart().await?;

    let in_cart = cart.line_items().await?;
    ctx.attachments.json("cart_item_list", &in_cart)?;
    reconcile(Checkpoint::CartView, &recorded, &in_cart)?;

    ctx.attachments.json("checkout_info", &form)?;
    cart.fill_order_info(&form).await?;
    cart.fill_payment_info(&form.card).await?;
    cart.checkout().await?;
    let alert = cart.alert().await?;
    info!("Checkout alert is '{}'", alert);
    expect_eq("checkout alert", &expected_alert, &alert)?;

    if expectation == Expectation::Paid {
        cart.wait_for_thank_you().await?;
        let confirmed = cart.line_items().await?;
        ctx.attachments.json("checkout_item_list", &confirmed)?;
        reconcile(Checkpoint::Confirmation, &in_cart, &confirmed)?;
    }
    Ok(())
}
