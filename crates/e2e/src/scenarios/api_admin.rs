//! `/admin/product` create and delete round trips

use futures::FutureExt;
use tracing::info;

use crate::api::admin::created_product_id;
use crate::api::ProductForm;
use crate::data::{ScenarioRecord, TableKind, TableSet};
use crate::error::{E2eError, E2eResult};
use crate::runner::{Cleanup, Scenario, ScenarioContext};
use crate::verify::catalog::StoredProduct;
use crate::verify::{ensure, expect_error_msg, expect_status};

const TAGS: &[&str] = &["api", "admin"];

pub fn scenarios(tables: &TableSet) -> Vec<Scenario> {
    let mut scenarios = Vec::new();

    for record in tables.records(TableKind::ApiProductCreateValid) {
        scenarios.push(Scenario::new(
            format!("API create and delete product, row {}", record.row() + 1),
            TAGS,
            move |ctx| create_and_delete(ctx, record.clone()).boxed_local(),
        ));
    }
    for record in tables.records(TableKind::ApiProductCreateInvalid) {
        scenarios.push(Scenario::new(
            format!("API create product with invalid value, row {}", record.row() + 1),
            TAGS,
            move |ctx| create_rejected(ctx, record.clone()).boxed_local(),
        ));
    }

    scenarios
}

fn parse_id(id: &str) -> E2eResult<i64> {
    id.parse()
        .map_err(|_| E2eError::assertion("created product id", "a numeric id", id, "product id is not numeric"))
}

async fn create_and_delete(ctx: &mut ScenarioContext, record: ScenarioRecord) -> E2eResult<()> {
    let form = ProductForm::from_record(&record)?;
    let session = ctx.api_login().await?;

    let response = ctx.api.admin().create_product(&session, &form).await?;
    if let Some(id) = created_product_id(&response) {
        ctx.defer(Cleanup::DeleteProductApi { product_id: id });
    }
    expect_status("create product", 200, &response)?;
    let id = created_product_id(&response).ok_or_else(|| {
        E2eError::assertion("create product", "data.product_id", &response.body, "no product id returned")
    })?;
    info!("Created product {}", id);

    let rows = ctx.db.product_details(Some(parse_id(&id)?))?;
    let stored = StoredProduct::from_rows(&rows)
        .ok_or_else(|| E2eError::assertion("created product", &id, "no rows", "product is not in the store"))?;
    stored.expect_matches(&form)?;

    let deleted = ctx.api.admin().delete_product(&session, &id).await?;
    expect_status("delete product", 200, &deleted)?;
    let remaining = ctx.db.product_details(Some(parse_id(&id)?))?;
    ensure(
        remaining.is_empty(),
        "deleted product",
        format!("{} row(s) of product {} remain", remaining.len(), id),
    )?;

    let again = ctx.api.admin().delete_product(&session, &id).await?;
    expect_status("delete product again", 400, &again)?;
    expect_error_msg("delete product again", "Product ID not found.", &again)
}

async fn create_rejected(ctx: &mut ScenarioContext, record: ScenarioRecord) -> E2eResult<()> {
    let form = ProductForm::from_record(&record)?;
    let expected = record.get("Error Msg")?.to_string();
    let session = ctx.api_login().await?;

    let response = ctx.api.admin().create_product(&session, &form).await?;
    if let Some(id) = created_product_id(&response) {
        ctx.defer(Cleanup::DeleteProductApi { product_id: id });
    }
    expect_status("create product with invalid value", 400, &response)?;
    expect_error_msg("create product with invalid value", &expected, &response)
}
