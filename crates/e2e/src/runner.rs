//! Scenario runner
//!
//! Every scenario gets a fresh [`ScenarioContext`]: its own API session,
//! attachment sink, RNG and (on first use) browser. The runner calls
//! [`ScenarioContext::finish`] after the body whatever it returned, so
//! teardown and browser shutdown happen on every exit path.

use futures::future::LocalBoxFuture;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use stylish_common::{Account, DataSource};
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::api::{ApiClient, Session};
use crate::config::HarnessConfig;
use crate::data::TableSet;
use crate::error::{E2eError, E2eResult};
use crate::report::{Attachments, Outcome, ScenarioResult, SuiteResult};
use crate::ui::pages::{AdminPage, LoginPage};
use crate::ui::{DriverFactory, UiDriver};
use crate::verify::{expect_eq, expect_status, KnownGap};

pub type ScenarioFuture<'a> = LocalBoxFuture<'a, E2eResult<()>>;

type ScenarioFn = Box<dyn for<'a> Fn(&'a mut ScenarioContext) -> ScenarioFuture<'a> + Send + Sync>;

/// One named, tagged check
pub struct Scenario {
    pub name: String,
    pub tags: Vec<&'static str>,
    pub known_gap: Option<KnownGap>,
    run: ScenarioFn,
}

impl Scenario {
    pub fn new<F>(name: impl Into<String>, tags: &[&'static str], run: F) -> Self
    where
        F: for<'a> Fn(&'a mut ScenarioContext) -> ScenarioFuture<'a> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            tags: tags.to_vec(),
            known_gap: None,
            run: Box::new(run),
        }
    }

    pub fn known_gap(mut self, gap: KnownGap) -> Self {
        self.known_gap = Some(gap);
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| *t == tag)
    }
}

impl std::fmt::Debug for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scenario")
            .field("name", &self.name)
            .field("tags", &self.tags)
            .field("known_gap", &self.known_gap)
            .finish()
    }
}

/// Teardown registered by a scenario, run in reverse order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cleanup {
    /// Delete through the admin API, signing in again if needed
    DeleteProductApi { product_id: String },
    /// Delete from the admin product list in the open browser
    DeleteProductByTitle { title: String },
}

/// Per-scenario resources
pub struct ScenarioContext {
    pub config: Arc<HarnessConfig>,
    pub account: Account,
    pub db: Arc<dyn DataSource>,
    pub tables: Arc<TableSet>,
    pub rng: StdRng,
    pub attachments: Attachments,
    pub api: ApiClient,
    factory: Arc<dyn DriverFactory>,
    browser: Option<Arc<dyn UiDriver>>,
    cleanups: Vec<Cleanup>,
}

impl ScenarioContext {
    pub fn wait_ms(&self) -> u64 {
        self.config.timeouts.default_ms
    }

    pub fn slow_ms(&self) -> u64 {
        self.config.timeouts.slow_ms
    }

    pub fn page_url(&self, page: &str) -> String {
        self.config.page_url(page)
    }

    /// The scenario's browser, launched on first use
    pub async fn browser(&mut self) -> E2eResult<Arc<dyn UiDriver>> {
        if let Some(driver) = &self.browser {
            return Ok(driver.clone());
        }
        info!("Launching browser");
        let driver = self.factory.launch().await?;
        self.browser = Some(driver.clone());
        Ok(driver)
    }

    pub fn defer(&mut self, cleanup: Cleanup) {
        debug!("Registered cleanup {:?}", cleanup);
        self.cleanups.push(cleanup);
    }

    /// Sign in through the API with the worker's account
    pub async fn api_login(&self) -> E2eResult<Session> {
        let mut session = Session::Anonymous;
        let response = self
            .api
            .user()
            .login(&mut session, &self.account.native_credentials())
            .await?;
        expect_status("login", 200, &response)?;
        Ok(session)
    }

    /// Sign in through `login.html`; returns the browser
    pub async fn web_login(&mut self) -> E2eResult<Arc<dyn UiDriver>> {
        let driver = self.browser().await?;
        let login = LoginPage::new(driver.as_ref(), self.wait_ms());
        login.open(&self.page_url("login.html")).await?;
        let alert = login.sign_in(&self.account.email, &self.account.password).await?;
        expect_eq("login alert", "Login Success", &alert)?;
        Ok(driver)
    }

    /// Run teardown, capture a final screenshot and close the browser.
    /// Every step runs; the first failure is returned.
    pub async fn finish(&mut self) -> E2eResult<()> {
        let mut first_error = None;

        while let Some(cleanup) = self.cleanups.pop() {
            info!("Cleanup: {:?}", cleanup);
            if let Err(e) = self.run_cleanup(&cleanup).await {
                warn!("Cleanup {:?} failed: {}", cleanup, e);
                first_error.get_or_insert(e);
            }
        }

        if let Some(driver) = self.browser.take() {
            match driver.screenshot().await {
                Ok(png) => {
                    if let Err(e) = self.attachments.png("Final Screenshot", &png) {
                        warn!("Could not attach screenshot: {}", e);
                    }
                }
                Err(e) => warn!("Could not take screenshot: {}", e),
            }
            if let Err(e) = driver.close().await {
                warn!("Closing browser failed: {}", e);
                first_error.get_or_insert(e);
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    async fn run_cleanup(&mut self, cleanup: &Cleanup) -> E2eResult<()> {
        match cleanup {
            Cleanup::DeleteProductApi { product_id } => {
                let session = self.api_login().await?;
                let response = self.api.admin().delete_product(&session, product_id).await?;
                if !response.is_success() {
                    debug!("Product {} already gone ({})", product_id, response.status);
                }
                Ok(())
            }
            Cleanup::DeleteProductByTitle { title } => {
                let Some(driver) = self.browser.clone() else {
                    return Ok(());
                };
                let admin = AdminPage::new(driver.as_ref(), self.wait_ms());
                admin.back_to_list().await?;
                admin.delete_product(title).await?;
                Ok(())
            }
        }
    }
}

/// Which scenarios to run
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub tags: Vec<String>,
    pub name: Option<String>,
    pub worker: usize,
    pub workers: usize,
}

impl Selection {
    /// Shard on the catalog index, then filter by tag and name substring
    pub fn apply<'a>(&self, catalog: &'a [Scenario]) -> Vec<&'a Scenario> {
        let workers = self.workers.max(1);
        catalog
            .iter()
            .enumerate()
            .filter(|(index, _)| index % workers == self.worker)
            .map(|(_, scenario)| scenario)
            .filter(|s| self.tags.is_empty() || self.tags.iter().any(|t| s.has_tag(t)))
            .filter(|s| self.name.as_ref().map_or(true, |n| s.name.contains(n.as_str())))
            .collect()
    }
}

/// Everything a worker shares across its scenarios
pub struct Harness {
    config: Arc<HarnessConfig>,
    account: Account,
    db: Arc<dyn DataSource>,
    tables: Arc<TableSet>,
    factory: Arc<dyn DriverFactory>,
    seed: u64,
    worker: usize,
    workers: usize,
}

impl Harness {
    pub fn new(
        config: HarnessConfig,
        account: Account,
        db: Arc<dyn DataSource>,
        tables: TableSet,
        factory: Arc<dyn DriverFactory>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            account,
            db,
            tables: Arc::new(tables),
            factory,
            seed: 0,
            worker: 0,
            workers: 1,
        }
    }

    /// Base seed; scenario `i` uses `seed + i`
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_shard(mut self, worker: usize, workers: usize) -> Self {
        self.worker = worker;
        self.workers = workers.max(1);
        self
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    fn context(&self, index: usize, name: &str) -> E2eResult<ScenarioContext> {
        let dir: PathBuf = self
            .config
            .output_dir
            .join(format!("worker-{}", self.worker))
            .join(format!("{:03}-{}", index, slug(name)));
        let attachments = Attachments::new(dir);
        let api = ApiClient::new(&self.config, attachments.clone())?;

        Ok(ScenarioContext {
            config: self.config.clone(),
            account: self.account.clone(),
            db: self.db.clone(),
            tables: self.tables.clone(),
            rng: StdRng::seed_from_u64(self.seed.wrapping_add(index as u64)),
            attachments,
            api,
            factory: self.factory.clone(),
            browser: None,
            cleanups: Vec::new(),
        })
    }

    /// Run one scenario to an outcome
    pub async fn run_scenario(&self, index: usize, scenario: &Scenario) -> ScenarioResult {
        let start = Instant::now();
        debug!("Running scenario: {} (seed {})", scenario.name, self.seed.wrapping_add(index as u64));

        let (outcome, error, attachments) = match self.context(index, &scenario.name) {
            Ok(mut ctx) => {
                let body = (scenario.run)(&mut ctx).await;
                let teardown = ctx.finish().await;
                let result = body.and(teardown);

                let (outcome, error) = classify(&result);
                if let Err(e) = &result {
                    if let Err(attach_err) = ctx.attachments.text("Failure", &e.to_string()) {
                        warn!("Could not attach failure: {}", attach_err);
                    }
                }
                (outcome, error, ctx.attachments.entries())
            }
            Err(e) => (Outcome::Errored, Some(e.to_string()), Vec::new()),
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        match outcome {
            Outcome::Passed => info!("{} {} ({} ms)", outcome.symbol(), scenario.name, duration_ms),
            _ => {
                let gap = scenario
                    .known_gap
                    .map(|g| format!(" [known gap: {}]", g.note()))
                    .unwrap_or_default();
                error!(
                    "{} {} - {}{}",
                    outcome.symbol(),
                    scenario.name,
                    error.as_deref().unwrap_or("unknown error"),
                    gap
                );
            }
        }

        ScenarioResult {
            name: scenario.name.clone(),
            tags: scenario.tags.iter().map(|t| t.to_string()).collect(),
            outcome,
            duration_ms,
            error,
            known_gap: scenario.known_gap.map(|g| g.note().to_string()),
            attachments,
        }
    }

    /// Run this worker's share of `catalog`, strictly one after another
    pub async fn run(&self, catalog: &[Scenario], selection: &Selection) -> SuiteResult {
        let start = Instant::now();
        let selection = Selection {
            worker: self.worker,
            workers: self.workers,
            ..selection.clone()
        };
        let selected = selection.apply(catalog);
        info!(
            "Worker {}/{} running {} of {} scenario(s) as {}",
            self.worker,
            self.workers,
            selected.len(),
            catalog.len(),
            self.account.email
        );

        let mut results = Vec::with_capacity(selected.len());
        for scenario in selected {
            let index = catalog
                .iter()
                .position(|s| std::ptr::eq(s, scenario))
                .unwrap_or_default();
            results.push(self.run_scenario(index, scenario).await);
        }

        let suite = SuiteResult::new(
            self.worker,
            self.workers,
            start.elapsed().as_millis() as u64,
            results,
        );
        info!("");
        info!(
            "Test Results: {} passed, {} failed, {} errored ({} ms)",
            suite.passed, suite.failed, suite.errored, suite.duration_ms
        );
        suite
    }
}

/// Assertion failures are product defects, everything else is the suite
/// failing to reach a verdict
pub fn classify(result: &E2eResult<()>) -> (Outcome, Option<String>) {
    match result {
        Ok(()) => (Outcome::Passed, None),
        Err(e) if e.is_assertion() => (Outcome::Failed, Some(e.to_string())),
        Err(e) => (Outcome::Errored, Some(e.to_string())),
    }
}

fn slug(name: &str) -> String {
    let slug: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect();
    let slug = slug.split('-').filter(|s| !s.is_empty()).collect::<Vec<_>>().join("-");
    slug.chars().take(60).collect()
}

/// Poll the site root until it answers, before any scenario runs
pub async fn wait_for_site(config: &HarnessConfig, timeout: Duration) -> E2eResult<()> {
    let url = config.page_url("index.html");
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()?;

    let start = Instant::now();
    let mut attempts = 0;
    while start.elapsed() < timeout {
        attempts += 1;
        match client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => {
                info!("Site is up at {}", config.base_url);
                return Ok(());
            }
            Ok(resp) => warn!("Preflight returned {}", resp.status()),
            Err(e) => {
                if attempts == 1 {
                    info!("Waiting for {} ...", url);
                }
                if !e.is_connect() {
                    warn!("Preflight error: {}", e);
                }
            }
        }
        sleep(Duration::from_millis(500)).await;
    }

    Err(E2eError::Transport(format!(
        "{} did not answer after {} attempt(s)",
        url, attempts
    )))
}
