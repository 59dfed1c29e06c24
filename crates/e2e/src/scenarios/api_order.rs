//! `/order` placement, validation messages and lookup

use futures::FutureExt;
use serde_json::Value;
use tracing::info;

use crate::api::{scalar_text, Session};
use crate::error::{E2eError, E2eResult};
use crate::runner::{Scenario, ScenarioContext};
use crate::ui::pages::PrimePage;
use crate::verify::cart::sample_order_lines;
use crate::verify::order::{FieldMutation, FieldTarget, Order, OrderField, OrderPayload};
use crate::verify::{expect_eq, expect_error_msg, expect_status, KnownGap};

const TAGS: &[&str] = &["api", "order"];

const ORDER_NOT_FOUND: &str = "Order Not Found.";
const UNAUTHORIZED: &str = "Unauthorized";

pub fn scenarios() -> Vec<Scenario> {
    let mut scenarios = vec![
        Scenario::new("API order with valid info", TAGS, |ctx| place_valid(ctx).boxed_local()),
        Scenario::new("API order without prime", TAGS, |ctx| place_without_prime(ctx).boxed_local()),
        Scenario::new("API order without login", TAGS, |ctx| place_without_login(ctx).boxed_local()),
    ];

    for target in FieldTarget::all() {
        for mutation in [FieldMutation::Omit, FieldMutation::Null] {
            let scenario = Scenario::new(
                format!("API order with {} {}", target, mutation.as_str()),
                TAGS,
                move |ctx| place_mutated(ctx, target, mutation).boxed_local(),
            );
            let scenario = if target == FieldTarget::Order(OrderField::List) && mutation == FieldMutation::Omit {
                scenario.known_gap(KnownGap::MissingOrderList)
            } else {
                scenario
            };
            scenarios.push(scenario);
        }
    }

    scenarios.push(Scenario::new("API order lookup by valid number", TAGS, |ctx| {
        lookup_valid(ctx).boxed_local()
    }));
    scenarios.push(Scenario::new("API order lookup is idempotent", TAGS, |ctx| {
        lookup_idempotent(ctx).boxed_local()
    }));
    scenarios.push(
        Scenario::new("API order lookup by number abc", TAGS, |ctx| {
            lookup_missing(ctx, "abc").boxed_local()
        })
        .known_gap(KnownGap::NonNumericOrderNumber),
    );
    scenarios.push(Scenario::new("API order lookup by number 123", TAGS, |ctx| {
        lookup_missing(ctx, "123").boxed_local()
    }));
    scenarios.push(Scenario::new("API order lookup without login", TAGS, |ctx| {
        lookup_without_login(ctx).boxed_local()
    }));

    scenarios
}

/// A random cart from the store, priced, plus a fresh payment prime
async fn prepare(ctx: &mut ScenarioContext) -> E2eResult<(Order, String)> {
    let rows = ctx.db.product_details(None)?;
    let lines = sample_order_lines(&rows, &ctx.config, &mut ctx.rng)?;
    let order = Order::from_lines(lines);
    order.expect_total()?;

    let driver = ctx.browser().await?;
    let page = PrimePage::new(driver.as_ref(), ctx.wait_ms());
    page.open(&ctx.page_url("get_prime.html")).await?;
    let prime = page.prime(&ctx.config.payment).await?;
    Ok((order, prime))
}

async fn place_valid(ctx: &mut ScenarioContext) -> E2eResult<()> {
    let (order, prime) = prepare(ctx).await?;
    let session = ctx.api_login().await?;

    let payload = OrderPayload::new(prime, order.clone()).to_json()?;
    let response = ctx.api.order().place(&session, &payload).await?;
    expect_status("order", 200, &response)?;

    let number = response
        .data()
        .and_then(|data| data.get("number"))
        .and_then(scalar_text)
        .ok_or_else(|| E2eError::assertion("order", "data.number", &response.body, "no order number returned"))?;
    info!("Placed order {}", number);

    let record = ctx.db.order_by_number(&number)?;
    expect_eq("stored order details", &order, &record.details)
}

async fn place_without_prime(ctx: &mut ScenarioContext) -> E2eResult<()> {
    let (order, _) = prepare(ctx).await?;
    let session = ctx.api_login().await?;

    let payload = OrderPayload::without_prime(order).to_json()?;
    let response = ctx.api.order().place(&session, &payload).await?;
    expect_status("order without prime", 400, &response)?;
    expect_error_msg("order without prime", "Prime value is required.", &response)
}

async fn place_without_login(ctx: &mut ScenarioContext) -> E2eResult<()> {
    let (order, prime) = prepare(ctx).await?;

    let payload = OrderPayload::new(prime, order).to_json()?;
    let response = ctx.api.order().place(&Session::Anonymous, &payload).await?;
    expect_status("order without login", 401, &response)?;
    expect_error_msg("order without login", UNAUTHORIZED, &response)
}

async fn place_mutated(ctx: &mut ScenarioContext, target: FieldTarget, mutation: FieldMutation) -> E2eResult<()> {
    let (order, prime) = prepare(ctx).await?;
    let session = ctx.api_login().await?;

    let mut payload = OrderPayload::new(prime, order).to_json()?;
    if !mutation.apply(&mut payload, target) {
        return Err(E2eError::DataProvider(format!("payload has no parent for {}", target)));
    }

    let context = format!("order with {} {}", target, mutation.as_str());
    let response = ctx.api.order().place(&session, &payload).await?;
    expect_status(&context, 400, &response)?;
    expect_error_msg(&context, target.error_message(), &response)
}

/// The order as the API returns it, `details` decoded
async fn lookup(ctx: &ScenarioContext, session: &Session, number: &str) -> E2eResult<Value> {
    let response = ctx.api.order().by_number(session, number).await?;
    expect_status(&format!("order {}", number), 200, &response)?;
    Ok(response.data().cloned().unwrap_or(Value::Null))
}

async fn lookup_valid(ctx: &mut ScenarioContext) -> E2eResult<()> {
    let number = ctx.config.fixtures.order_number.clone();
    let session = ctx.api_login().await?;

    let actual = lookup(ctx, &session, &number).await?;
    let record = ctx.db.order_by_number(&number)?;
    expect_eq(&format!("order {}", number), &record, &actual)
}

async fn lookup_idempotent(ctx: &mut ScenarioContext) -> E2eResult<()> {
    let number = ctx.config.fixtures.order_number.clone();
    let session = ctx.api_login().await?;

    let first = lookup(ctx, &session, &number).await?;
    let second = lookup(ctx, &session, &number).await?;
    expect_eq("repeated order lookup", &first, &second)
}

async fn lookup_missing(ctx: &mut ScenarioContext, number: &'static str) -> E2eResult<()> {
    let session = ctx.api_login().await?;
    let response = ctx.api.order().by_number(&session, number).await?;

    let context = format!("order {}", number);
    expect_status(&context, 400, &response)?;
    expect_error_msg(&context, ORDER_NOT_FOUND, &response)
}

async fn lookup_without_login(ctx: &mut ScenarioContext) -> E2eResult<()> {
    let number = ctx.config.fixtures.order_number.clone();
    let response = ctx.api.order().by_number(&Session::Anonymous, &number).await?;
    expect_status("order lookup without login", 401, &response)?;
    expect_error_msg("order lookup without login", UNAUTHORIZED, &response)
}
