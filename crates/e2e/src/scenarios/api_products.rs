//! `/products` listing, search and details

use futures::FutureExt;
use serde_json::Value;

use crate::api::{ApiClient, ApiResponse};
use crate::error::{E2eError, E2eResult};
use crate::runner::{Scenario, ScenarioContext};
use crate::ui::pages::Category;
use crate::verify::catalog::{expect_products, expected_products, ProductFilter};
use crate::verify::pagination::{last_page, page_slice};
use crate::verify::{expect_eq, expect_status, KnownGap};

const TAGS: &[&str] = &["api", "products"];

/// A paginated product listing
#[derive(Debug, Clone, PartialEq, Eq)]
enum Listing {
    /// `None` is the `all` pseudo-category
    Category(Option<Category>),
    Keyword(&'static str),
}

impl Listing {
    fn filter(&self) -> ProductFilter {
        match self {
            Listing::Category(None) => ProductFilter::All,
            Listing::Category(Some(category)) => ProductFilter::Category(*category),
            Listing::Keyword(keyword) => ProductFilter::Keyword(keyword.to_string()),
        }
    }

    async fn fetch(&self, api: &ApiClient, page: Option<i64>) -> E2eResult<ApiResponse> {
        match self {
            Listing::Category(category) => {
                let name = category.map_or("all", |c| c.as_str());
                api.products().by_category(Some(name), page).await
            }
            Listing::Keyword(keyword) => api.products().by_keyword(Some(*keyword), page).await,
        }
    }
}

impl std::fmt::Display for Listing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Listing::Category(category) => write!(f, "category {}", category.map_or("all", |c| c.as_str())),
            Listing::Keyword(keyword) => write!(f, "keyword {}", keyword),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageChoice {
    First,
    Last,
    /// No `paging` parameter; behaves as page 0
    Omitted,
    BeyondLast,
}

impl PageChoice {
    /// Parameter to send and page index expected, for `total` products
    fn resolve(&self, total: usize) -> (Option<i64>, usize) {
        let page = match self {
            PageChoice::First | PageChoice::Omitted => 0,
            PageChoice::Last => last_page(total),
            PageChoice::BeyondLast => last_page(total) + 1,
        };
        let param = (*self != PageChoice::Omitted).then_some(page as i64);
        (param, page)
    }

    fn label(&self) -> &'static str {
        match self {
            PageChoice::First => "first page",
            PageChoice::Last => "last page",
            PageChoice::Omitted => "no page",
            PageChoice::BeyondLast => "page beyond last",
        }
    }
}

pub fn scenarios() -> Vec<Scenario> {
    let mut scenarios = Vec::new();

    let categories = std::iter::once(None).chain(Category::ALL.into_iter().map(Some));
    for category in categories {
        let listing = Listing::Category(category);
        for choice in [PageChoice::First, PageChoice::Last, PageChoice::Omitted, PageChoice::BeyondLast] {
            let listing = listing.clone();
            scenarios.push(Scenario::new(
                format!("API products by {}, {}", listing, choice.label()),
                TAGS,
                move |ctx| listing_page(ctx, listing.clone(), choice).boxed_local(),
            ));
        }
        scenarios.push(Scenario::new(
            format!("API products by {}, every page", listing),
            TAGS,
            move |ctx| every_page(ctx, listing.clone()).boxed_local(),
        ));
    }

    for keyword in ["洋裝", "Hello"] {
        for choice in [PageChoice::First, PageChoice::Last] {
            scenarios.push(Scenario::new(
                format!("API products by keyword {}, {}", keyword, choice.label()),
                TAGS,
                move |ctx| listing_page(ctx, Listing::Keyword(keyword), choice).boxed_local(),
            ));
        }
    }
    scenarios.push(Scenario::new(
        "API products by keyword 洋裝, page beyond last",
        TAGS,
        |ctx| listing_page(ctx, Listing::Keyword("洋裝"), PageChoice::BeyondLast).boxed_local(),
    ));
    scenarios.push(Scenario::new(
        "API products by keyword 洋裝, every page",
        TAGS,
        |ctx| every_page(ctx, Listing::Keyword("洋裝")).boxed_local(),
    ));

    scenarios.push(
        Scenario::new("API products by category women, negative page", TAGS, |ctx| {
            rejected(ctx, Listing::Category(Some(Category::Women)), Some(-1)).boxed_local()
        })
        .known_gap(KnownGap::NegativePaging),
    );
    scenarios.push(
        Scenario::new("API products by keyword 洋裝, negative page", TAGS, |ctx| {
            rejected(ctx, Listing::Keyword("洋裝"), Some(-1)).boxed_local()
        })
        .known_gap(KnownGap::NegativePaging),
    );
    scenarios.push(Scenario::new("API products by invalid category", TAGS, |ctx| {
        invalid_category(ctx).boxed_local()
    }));
    scenarios.push(Scenario::new("API products search without keyword", TAGS, |ctx| {
        search_without_keyword(ctx).boxed_local()
    }));

    scenarios.push(Scenario::new("API product details", TAGS, |ctx| details(ctx).boxed_local()));
    for id in [Some("123"), Some("abc"), None] {
        scenarios.push(Scenario::new(
            format!("API product details with invalid id {}", id.unwrap_or("(none)")),
            TAGS,
            move |ctx| details_rejected(ctx, id).boxed_local(),
        ));
    }

    scenarios
}

async fn listing_page(ctx: &mut ScenarioContext, listing: Listing, choice: PageChoice) -> E2eResult<()> {
    let rows = ctx.db.product_details(None)?;
    let products = expected_products(&rows, &listing.filter(), &ctx.config);
    let (param, page) = choice.resolve(products.len());

    let response = listing.fetch(&ctx.api, param).await?;
    let context = format!("products by {}, page {}", listing, page);
    expect_status(&context, 200, &response)?;
    expect_products(&context, page_slice(&products, page), response.data())
}

/// Pages 0..=last concatenate to the full listing and the next page is empty
async fn every_page(ctx: &mut ScenarioContext, listing: Listing) -> E2eResult<()> {
    let rows = ctx.db.product_details(None)?;
    let products = expected_products(&rows, &listing.filter(), &ctx.config);
    let last = last_page(products.len());

    let mut collected = Vec::with_capacity(products.len());
    for page in 0..=last {
        let response = listing.fetch(&ctx.api, Some(page as i64)).await?;
        expect_status(&format!("products by {}, page {}", listing, page), 200, &response)?;
        if let Some(Value::Array(items)) = response.data() {
            collected.extend(items.iter().cloned());
        }
    }
    expect_products(
        &format!("products by {}, all pages", listing),
        &products,
        Some(&Value::Array(collected)),
    )?;

    let beyond = listing.fetch(&ctx.api, Some(last as i64 + 1)).await?;
    expect_status("page beyond last", 200, &beyond)?;
    expect_eq("page beyond last", &Value::Array(Vec::new()), &beyond.data().cloned().unwrap_or(Value::Null))
}

async fn rejected(ctx: &mut ScenarioContext, listing: Listing, page: Option<i64>) -> E2eResult<()> {
    let response = listing.fetch(&ctx.api, page).await?;
    expect_status(&format!("products by {}, page {:?}", listing, page), 400, &response)
}

async fn invalid_category(ctx: &mut ScenarioContext) -> E2eResult<()> {
    let response = ctx.api.products().by_category(Some("invalid"), Some(0)).await?;
    expect_status("products by category invalid", 400, &response)
}

async fn search_without_keyword(ctx: &mut ScenarioContext) -> E2eResult<()> {
    let response = ctx.api.products().by_keyword(None, Some(0)).await?;
    expect_status("products search without keyword", 400, &response)
}

async fn details(ctx: &mut ScenarioContext) -> E2eResult<()> {
    let id = ctx.config.fixtures.detail_product_id;
    let rows = ctx.db.product_details(Some(id))?;
    let expected = expected_products(&rows, &ProductFilter::Id(id), &ctx.config)
        .into_iter()
        .next()
        .ok_or_else(|| E2eError::DataAccess(stylish_common::Error::not_found("product", id)))?;

    let response = ctx.api.products().by_id(Some(&id.to_string())).await?;
    let context = format!("product details {}", id);
    expect_status(&context, 200, &response)?;
    expect_products(&context, &expected, response.data())
}

async fn details_rejected(ctx: &mut ScenarioContext, id: Option<&'static str>) -> E2eResult<()> {
    let response = ctx.api.products().by_id(id).await?;
    expect_status(&format!("product details {:?}", id), 400, &response)
}
