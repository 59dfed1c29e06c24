//! `admin/products.html`: product creation through the form

use futures::FutureExt;
use tracing::info;

use crate::data::{ScenarioRecord, TableKind, TableSet};
use crate::error::E2eResult;
use crate::runner::{Cleanup, Scenario, ScenarioContext};
use crate::ui::pages::{AdminPage, LoginPage, ProductEntry};
use crate::ui::Presence;
use crate::verify::{ensure, expect_eq};

const TAGS: &[&str] = &["web", "admin"];

const ADMIN_PAGE: &str = "admin/products.html";

pub fn scenarios(tables: &TableSet) -> Vec<Scenario> {
    let mut scenarios = Vec::new();

    for record in tables.records(TableKind::ProductCreateValid) {
        let row = record.row() + 1;
        let without_login = record.clone();
        scenarios.push(Scenario::new(
            format!("Web create product success, row {}", row),
            TAGS,
            move |ctx| create(ctx, record.clone(), None).boxed_local(),
        ));
        scenarios.push(Scenario::new(
            format!("Web create product without login, row {}", row),
            TAGS,
            move |ctx| create_without_login(ctx, without_login.clone()).boxed_local(),
        ));
    }
    for record in tables.records(TableKind::ProductCreateInvalid) {
        scenarios.push(Scenario::new(
            format!("Web create product with invalid value, row {}", record.row() + 1),
            TAGS,
            move |ctx| create_invalid(ctx, record.clone()).boxed_local(),
        ));
    }

    scenarios
}

/// Every color name the form offers
fn all_colors(ctx: &ScenarioContext) -> E2eResult<Vec<String>> {
    Ok(ctx.db.color_codes()?.into_keys().collect())
}

/// `rejection` is the alert an invalid row must raise; `None` expects success
async fn create(ctx: &mut ScenarioContext, record: ScenarioRecord, rejection: Option<String>) -> E2eResult<()> {
    let entry = ProductEntry::from_record(&record)?;
    let colors = all_colors(ctx)?;
    ctx.attachments.json("product_info", &entry)?;

    let driver = ctx.web_login().await?;
    let admin = AdminPage::new(driver.as_ref(), ctx.wait_ms());
    admin.open(&ctx.page_url(ADMIN_PAGE)).await?;
    ctx.defer(Cleanup::DeleteProductByTitle {
        title: entry.title.clone(),
    });

    admin.open_create_form().await?;
    admin.fill_form(&entry, &colors).await?;
    admin.submit().await?;

    let alert = admin.alert(ctx.slow_ms()).await?;
    info!("Create product alert is '{}'", alert);
    let expected_alert = rejection.as_deref().unwrap_or("Create Product Success");
    expect_eq("create product alert", expected_alert, &alert)?;

    admin.back_to_list().await?;
    let listed = admin.product_listed(&entry.title).await?;
    let expected = if rejection.is_none() {
        Presence::Found
    } else {
        Presence::NotFound
    };
    ensure(
        listed == expected,
        "product list",
        format!("'{}' is {:?} in the list, expected {:?}", entry.title, listed, expected),
    )
}

async fn create_invalid(ctx: &mut ScenarioContext, record: ScenarioRecord) -> E2eResult<()> {
    let alert = record.get("Alert Msg")?.to_string();
    create(ctx, record, Some(alert)).await
}

/// A signed-out visitor is turned back to the login form
async fn create_without_login(ctx: &mut ScenarioContext, record: ScenarioRecord) -> E2eResult<()> {
    let entry = ProductEntry::from_record(&record)?;
    let colors = all_colors(ctx)?;

    let driver = ctx.browser().await?;
    let admin = AdminPage::new(driver.as_ref(), ctx.wait_ms());
    admin.open(&ctx.page_url(ADMIN_PAGE)).await?;
    expect_eq("admin page alert", "Unauthorized", &admin.alert(ctx.wait_ms()).await?)?;

    admin.open_create_form().await?;
    admin.fill_form(&entry, &colors).await?;
    admin.submit().await?;
    expect_eq("create product alert", "Please Login First", &admin.alert(ctx.slow_ms()).await?)?;

    let login = LoginPage::new(driver.as_ref(), ctx.wait_ms());
    let shown = login.is_login_form_shown().await?;
    ensure(shown.is_found(), "redirect after create", "login form is not shown")
}
