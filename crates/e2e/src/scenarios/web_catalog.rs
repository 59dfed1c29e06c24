//! Storefront category links and search box

use futures::FutureExt;

use crate::error::E2eResult;
use crate::runner::{Scenario, ScenarioContext};
use crate::ui::pages::{Category, HomePage};
use crate::ui::Presence;
use crate::verify::catalog::ProductFilter;
use crate::verify::{ensure, expect_eq};

const TAGS: &[&str] = &["web", "catalog"];

pub fn scenarios() -> Vec<Scenario> {
    let mut scenarios: Vec<Scenario> = Category::ALL
        .into_iter()
        .map(|category| {
            Scenario::new(
                format!("Web category {}", category.as_str()),
                TAGS,
                move |ctx| category_listing(ctx, category).boxed_local(),
            )
        })
        .collect();

    scenarios.push(Scenario::new("Web search by keyword 洋裝", TAGS, |ctx| {
        search_by_keyword(ctx, "洋裝").boxed_local()
    }));
    scenarios.push(Scenario::new("Web search without keyword", TAGS, |ctx| {
        search_blank(ctx).boxed_local()
    }));
    scenarios.push(Scenario::new("Web search with no product found", TAGS, |ctx| {
        search_no_result(ctx, "Hello").boxed_local()
    }));

    scenarios
}

async fn category_listing(ctx: &mut ScenarioContext, category: Category) -> E2eResult<()> {
    let titles = ctx.db.product_titles()?;
    let expected = ProductFilter::Category(category).titles(&titles);

    let driver = ctx.browser().await?;
    let home = HomePage::new(driver.as_ref(), ctx.wait_ms());
    home.open(&ctx.page_url("index.html")).await?;
    home.switch_category(category).await?;
    home.load_all(expected.len()).await?;

    let presented = home.product_titles().await?;
    ctx.attachments.json("presented_titles", &presented)?;
    for title in &presented {
        ensure(
            expected.contains(&title.as_str()),
            &format!("category {}", category.as_str()),
            format!("'{}' is not a {} product", title, category.as_str()),
        )?;
    }
    Ok(())
}

async fn search_by_keyword(ctx: &mut ScenarioContext, keyword: &'static str) -> E2eResult<()> {
    let driver = ctx.browser().await?;
    let home = HomePage::new(driver.as_ref(), ctx.wait_ms());
    home.open(&ctx.page_url("index.html")).await?;
    home.search(keyword).await?;

    let presented = home.product_titles().await?;
    ctx.attachments.json("presented_titles", &presented)?;
    for title in &presented {
        ensure(
            title.contains(keyword),
            &format!("search {}", keyword),
            format!("'{}' does not contain '{}'", title, keyword),
        )?;
    }
    Ok(())
}

/// A blank search lists every product
async fn search_blank(ctx: &mut ScenarioContext) -> E2eResult<()> {
    let total = ctx.db.product_titles()?.len();

    let driver = ctx.browser().await?;
    let home = HomePage::new(driver.as_ref(), ctx.wait_ms());
    home.open(&ctx.page_url("index.html")).await?;
    home.search("").await?;
    home.load_all(total).await?;

    let presented = home.product_titles().await?;
    expect_eq("products listed by blank search", &total, &presented.len())
}

/// The grid must stay empty; a presented product is the failure
async fn search_no_result(ctx: &mut ScenarioContext, keyword: &'static str) -> E2eResult<()> {
    let driver = ctx.browser().await?;
    let home = HomePage::new(driver.as_ref(), ctx.wait_ms());
    home.open(&ctx.page_url("index.html")).await?;

    match home.search(keyword).await? {
        Presence::NotFound => Ok(()),
        Presence::Found => {
            let presented = home.product_titles().await?;
            expect_eq(&format!("search {}", keyword), &Vec::<String>::new(), &presented)
        }
    }
}
