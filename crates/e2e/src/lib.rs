//! Stylish verification suite
//!
//! Drives the Stylish e-commerce site through its HTTP API and through a real
//! browser, and checks what comes back against the backing store:
//! - Derives expected results from the database (`stylish-common`)
//! - Calls the JSON API with an explicit [`api::Session`]
//! - Drives the storefront and admin pages through a Playwright bridge
//! - Expands scenario tables with generated placeholder values
//! - Records request/response bodies, payloads and screenshots per scenario
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Suite runner (tests/e2e.rs)                │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Harness                                                    │
//! │    ├── Selection { tags, name, worker, workers }            │
//! │    ├── run_scenario(i, Scenario) -> ScenarioResult          │
//! │    └── ScenarioContext                                      │
//! │          ├── api: ApiClient  (user, products, order, admin) │
//! │          ├── browser(): UiDriver -> page objects            │
//! │          ├── db: DataSource  (ground truth)                 │
//! │          └── defer(Cleanup) -> finish()                    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  verify: expect_eq, pagination, catalog, cart, order        │
//! │  data:   scenario tables with placeholder expansion         │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod config;
pub mod data;
pub mod error;
pub mod report;
pub mod runner;
pub mod scenarios;
pub mod ui;
pub mod verify;

pub use config::HarnessConfig;
pub use data::{TableKind, TableSet};
pub use error::{E2eError, E2eResult};
pub use report::{Outcome, SuiteResult};
pub use runner::{Harness, Scenario, ScenarioContext, Selection};
