//! The scenario catalog
//!
//! Families are generated from parameter lists and scenario table rows, so
//! the catalog depends on the loaded [`TableSet`]. Order is stable for a
//! given table set, which keeps worker sharding reproducible.

pub mod api_admin;
pub mod api_order;
pub mod api_products;
pub mod api_user;
pub mod web_admin;
pub mod web_cart;
pub mod web_catalog;
pub mod web_checkout;
pub mod web_login;
pub mod web_product;

#[cfg(test)]
pub(crate) mod testing;

use crate::data::TableSet;
use crate::runner::Scenario;

/// Every scenario, API families first
pub fn catalog(tables: &TableSet) -> Vec<Scenario> {
    let mut scenarios = Vec::new();
    scenarios.extend(api_user::scenarios());
    scenarios.extend(api_products::scenarios());
    scenarios.extend(api_order::scenarios());
    scenarios.extend(api_admin::scenarios(tables));
    scenarios.extend(web_login::scenarios());
    scenarios.extend(web_catalog::scenarios());
    scenarios.extend(web_product::scenarios());
    scenarios.extend(web_cart::scenarios());
    scenarios.extend(web_checkout::scenarios(tables));
    scenarios.extend(web_admin::scenarios(tables));
    scenarios
}
