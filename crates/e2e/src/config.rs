//! Suite configuration
//!
//! Built-in defaults, then an optional TOML file, then `STYLISH_*`
//! environment overrides. The location of the system under test lives in
//! exactly one field, [`HarnessConfig::base_url`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use stylish_common::Account;
use tracing::{debug, info};

use crate::error::{E2eError, E2eResult};
use crate::ui::playwright::Browser;

pub const ENV_BASE_URL: &str = "STYLISH_BASE_URL";
pub const ENV_DB_PATH: &str = "STYLISH_DB_PATH";
pub const ENV_ACCOUNTS: &str = "STYLISH_ACCOUNTS";
pub const ENV_DATA_DIR: &str = "STYLISH_DATA_DIR";
pub const ENV_OUTPUT_DIR: &str = "STYLISH_OUTPUT_DIR";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Root of the Stylish site, e.g. `http://54.201.140.239`
    pub base_url: String,

    /// SQLite store holding ground truth. Checks read it right after the
    /// site writes, so a replica must be kept in step with the live store.
    pub db_path: PathBuf,

    /// Scenario tables and upload images
    pub data_dir: PathBuf,

    /// Where `test-results.json` and attachments land
    pub output_dir: PathBuf,

    pub timeouts: Timeouts,
    pub browser: BrowserConfig,
    pub payment: PaymentCard,
    pub fixtures: Fixtures,

    /// `user0`, `user1`, ... one per parallel worker
    pub accounts: BTreeMap<String, Account>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost".to_string(),
            db_path: PathBuf::from("stylish.db"),
            data_dir: PathBuf::from("data"),
            output_dir: PathBuf::from("test-results"),
            timeouts: Timeouts::default(),
            browser: BrowserConfig::default(),
            payment: PaymentCard::default(),
            fixtures: Fixtures::default(),
            accounts: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Bound for ordinary UI waits
    pub default_ms: u64,
    /// Bound for slow UI operations such as product creation
    pub slow_ms: u64,
    /// Per-request HTTP timeout
    pub http_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            default_ms: 5_000,
            slow_ms: 10_000,
            http_ms: 30_000,
        }
    }
}

impl Timeouts {
    pub fn http(&self) -> Duration {
        Duration::from_millis(self.http_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub kind: Browser,
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            kind: Browser::Chromium,
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
        }
    }
}

/// Test card accepted by the payment sandbox
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentCard {
    pub number: String,
    pub expiry: String,
    pub security_code: String,
}

impl Default for PaymentCard {
    fn default() -> Self {
        Self {
            number: "4242424242424242".to_string(),
            expiry: "12/30".to_string(),
            security_code: "123".to_string(),
        }
    }
}

/// Records the live store is known to hold
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Fixtures {
    pub detail_product_id: i64,
    pub order_number: String,
}

impl Default for Fixtures {
    fn default() -> Self {
        Self {
            detail_product_id: 201902191210,
            order_number: "71223749413".to_string(),
        }
    }
}

impl HarnessConfig {
    /// Load defaults, then `path` if given, then the process environment
    pub fn load(path: Option<&Path>) -> E2eResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;

        info!(
            "Configuration: base_url={}, db={}, {} account(s)",
            config.base_url,
            config.db_path.display(),
            config.accounts.len()
        );
        Ok(config)
    }

    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            E2eError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> E2eResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply `STYLISH_*` overrides read through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> E2eResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BASE_URL) {
            debug!("{} overrides base_url", ENV_BASE_URL);
            self.base_url = url;
        }
        if let Some(path) = lookup(ENV_DB_PATH) {
            self.db_path = PathBuf::from(path);
        }
        if let Some(path) = lookup(ENV_DATA_DIR) {
            self.data_dir = PathBuf::from(path);
        }
        if let Some(path) = lookup(ENV_OUTPUT_DIR) {
            self.output_dir = PathBuf::from(path);
        }
        if let Some(raw) = lookup(ENV_ACCOUNTS) {
            self.accounts = serde_json::from_str(&raw).map_err(|e| {
                E2eError::Config(format!("{} is not a JSON account map: {}", ENV_ACCOUNTS, e))
            })?;
        }
        Ok(())
    }

    fn root(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// `{base_url}/api/1.0/`
    pub fn api_root(&self) -> String {
        format!("{}/api/1.0/", self.root())
    }

    /// Public URL of a product asset
    pub fn asset_url(&self, product_id: i64, file: &str) -> String {
        format!("{}/assets/{}/{}", self.root(), product_id, file)
    }

    /// Absolute URL of a site page such as `index.html`
    pub fn page_url(&self, page: &str) -> String {
        format!("{}/{}", self.root(), page.trim_start_matches('/'))
    }

    /// Account reserved for parallel worker `worker`
    pub fn account_for_worker(&self, worker: usize) -> E2eResult<Account> {
        let key = format!("user{}", worker);
        self.accounts
            .get(&key)
            .cloned()
            .ok_or_else(|| E2eError::Config(format!("no account configured for {}", key)))
    }

    pub fn scenario_dir(&self) -> PathBuf {
        self.data_dir.join("scenarios")
    }

    pub fn image_dir(&self) -> PathBuf {
        self.data_dir.join("images")
    }
}
