//! Cart reconciliation and randomized order lines

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use stylish_common::{Color, ProductDetailRow};
use tracing::debug;

use super::{ensure, expect_eq};
use crate::config::HarnessConfig;
use crate::error::{E2eError, E2eResult};
use crate::ui::pages::product::MAX_QUANTITY;

/// Most distinct variants put into one generated order
pub const MAX_ORDER_LINES: usize = 5;

/// One cart line as the harness recorded it or the page rendered it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineItem {
    pub id: String,
    pub name: String,
    pub color: String,
    pub size: String,
    pub quantity: u32,
    pub price: u32,
    pub subtotal: u32,
}

impl CartLineItem {
    /// A line whose subtotal follows from quantity and price
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        color: impl Into<String>,
        size: impl Into<String>,
        quantity: u32,
        price: u32,
    ) -> E2eResult<Self> {
        let name = name.into();
        let subtotal = line_subtotal(&name, quantity, price)?;
        Ok(Self {
            id: id.into(),
            name,
            color: color.into(),
            size: size.into(),
            quantity,
            price,
            subtotal,
        })
    }

    pub fn with_quantity(&self, quantity: u32) -> E2eResult<Self> {
        Ok(Self {
            quantity,
            subtotal: line_subtotal(&self.name, quantity, self.price)?,
            ..self.clone()
        })
    }

    pub fn expect_subtotal(&self, context: &str) -> E2eResult<()> {
        let expected = quantity_times_price(self.quantity, self.price).map_err(|detail| {
            E2eError::assertion(context, (self.quantity, self.price), self.subtotal, detail)
        })?;
        ensure(
            self.subtotal == expected,
            context,
            format!(
                "subtotal {} of '{}' is not {} x {}",
                self.subtotal, self.name, self.quantity, self.price
            ),
        )
    }
}

fn quantity_times_price(quantity: u32, price: u32) -> Result<u32, String> {
    quantity
        .checked_mul(price)
        .ok_or_else(|| format!("{} x {} does not fit a subtotal", quantity, price))
}

/// Subtotal of one line; an unrepresentable product is a rendering defect
pub fn line_subtotal(name: &str, quantity: u32, price: u32) -> E2eResult<u32> {
    quantity_times_price(quantity, price)
        .map_err(|detail| E2eError::assertion(format!("subtotal of '{}'", name), (quantity, price), "overflow", detail))
}

/// Where in the journey a cart is compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Checkpoint {
    AddToCart,
    CartView,
    Confirmation,
}

impl fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Checkpoint::AddToCart => "add to cart",
            Checkpoint::CartView => "cart view",
            Checkpoint::Confirmation => "confirmation",
        };
        f.write_str(name)
    }
}

/// Check every rendered line's subtotal, then the lines themselves in order.
/// Failures name the checkpoint.
pub fn reconcile(checkpoint: Checkpoint, expected: &[CartLineItem], actual: &[CartLineItem]) -> E2eResult<()> {
    let context = format!("cart at {}", checkpoint);
    for line in actual {
        line.expect_subtotal(&context)?;
    }
    expect_eq(&context, expected, actual)?;
    debug!("{} line(s) reconciled at {}", actual.len(), checkpoint);
    Ok(())
}

/// One entry of an order's `list`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: i64,
    pub image: String,
    pub name: String,
    pub price: i64,
    pub size: String,
    pub color: Color,
    pub qty: u32,
}

impl OrderLine {
    pub fn subtotal(&self) -> i64 {
        self.price * i64::from(self.qty)
    }
}

/// Pick 1 to 5 distinct variants from the store with quantities 1 to 9
pub fn sample_order_lines<R: Rng + ?Sized>(
    rows: &[ProductDetailRow],
    config: &HarnessConfig,
    rng: &mut R,
) -> E2eResult<Vec<OrderLine>> {
    let mut seen = HashSet::new();
    let variants: Vec<&ProductDetailRow> = rows.iter().filter(|r| seen.insert(r.variant_id)).collect();
    if variants.is_empty() {
        return Err(E2eError::DataProvider("store holds no product variants".to_string()));
    }

    let count = rng.gen_range(1..=MAX_ORDER_LINES.min(variants.len()));
    let lines = variants
        .choose_multiple(rng, count)
        .map(|row| OrderLine {
            id: row.id,
            image: config.asset_url(row.id, &row.main_image),
            name: row.title.clone(),
            price: row.price,
            size: row.size.clone(),
            color: Color {
                code: row.color_code.clone(),
                name: row.color_name.clone(),
            },
            qty: rng.gen_range(1..=MAX_QUANTITY),
        })
        .collect::<Vec<_>>();

    debug!("Sampled {} order line(s)", lines.len());
    Ok(lines)
}
