//! Playwright browser automation
//!
//! One Node process per browser. The process runs a small bridge script that
//! keeps the browser open and answers JSON-line requests on stdin, so every
//! [`UiDriver`] call is a single round trip against live page state.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::path::Path;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::{ClickMode, DriverFactory, Locator, Presence, UiDriver};
use crate::config::BrowserConfig;
use crate::error::{E2eError, E2eResult};

/// Budget for operations that take no explicit timeout (navigation, eval)
const PAGE_TIMEOUT_MS: u64 = 30_000;

/// Slack on top of an operation's own timeout before the bridge is presumed dead
const BRIDGE_GRACE_MS: u64 = 5_000;

const LAUNCH_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

/// Bridge program. Playwright is resolved from the working directory of the
/// suite, launch options arrive as the first argument.
const BRIDGE_SCRIPT: &str = r#"
const { createRequire } = require('module');
const readline = require('readline');
const playwright = createRequire(process.cwd() + '/')('playwright');
const options = JSON.parse(process.argv[2]);

let browser = null;
let pages = [];
let page = null;
let frame = null;
const dialogs = [];
const dialogWaiters = [];

function reply(message) {
  process.stdout.write(JSON.stringify(message) + '\n');
}

function timeoutError(what) {
  const error = new Error('Timed out waiting for ' + what);
  error.name = 'TimeoutError';
  return error;
}

function track(p) {
  if (pages.includes(p)) return;
  pages.push(p);
  p.on('dialog', async (dialog) => {
    const text = dialog.message();
    await dialog.accept().catch(() => {});
    const waiter = dialogWaiters.shift();
    if (waiter) waiter(text); else dialogs.push(text);
  });
  p.on('close', () => { pages = pages.filter((other) => other !== p); });
}

function scope() { return frame || page; }
function locate(selector) { return scope().locator(selector).first(); }
function pause(ms) { return new Promise((resolve) => setTimeout(resolve, ms)); }

function nextDialog(timeout) {
  if (dialogs.length > 0) return Promise.resolve(dialogs.shift());
  return new Promise((resolve, reject) => {
    const waiter = (text) => { clearTimeout(timer); resolve(text); };
    const timer = setTimeout(() => {
      const index = dialogWaiters.indexOf(waiter);
      if (index >= 0) dialogWaiters.splice(index, 1);
      reject(timeoutError('dialog'));
    }, timeout);
    dialogWaiters.push(waiter);
  });
}

async function countAbove(selector, above, timeout) {
  const deadline = Date.now() + timeout;
  for (;;) {
    const count = await scope().locator(selector).count();
    if (count > above) return count;
    if (Date.now() >= deadline) throw timeoutError('more than ' + above + ' of ' + selector);
    await pause(100);
  }
}

const ops = {
  goto: async (r) => { frame = null; await page.goto(r.url, { timeout: r.timeout }); },
  refresh: async (r) => { frame = null; await page.reload({ timeout: r.timeout }); },
  click: async (r) => {
    const target = locate(r.selector);
    if (r.mode === 'script') {
      await target.waitFor({ state: 'attached', timeout: r.timeout });
      await target.evaluate((el) => el.click());
    } else {
      await target.click({ timeout: r.timeout });
    }
  },
  fill: async (r) => locate(r.selector).fill(r.value, { timeout: r.timeout }),
  press: async (r) => locate(r.selector).press(r.key, { timeout: r.timeout }),
  text: async (r) => locate(r.selector).innerText({ timeout: r.timeout }),
  texts: async (r) => {
    await countAbove(r.selector, 0, r.timeout);
    return scope().locator(r.selector).allInnerTexts();
  },
  count: async (r) => scope().locator(r.selector).count(),
  attribute: async (r) => locate(r.selector).getAttribute(r.name, { timeout: r.timeout }),
  find: async (r) => {
    try {
      await locate(r.selector).waitFor({ state: 'attached', timeout: r.timeout });
      return true;
    } catch (error) {
      if (error.name === 'TimeoutError') return false;
      throw error;
    }
  },
  wait_gone: async (r) => locate(r.selector).waitFor({ state: 'hidden', timeout: r.timeout }),
  wait_count_above: async (r) => countAbove(r.selector, r.count, r.timeout),
  select_option: async (r) => { await locate(r.selector).selectOption({ label: r.label }, { timeout: r.timeout }); },
  selected_option: async (r) => locate(r.selector).evaluate(
    (el) => (el.options[el.selectedIndex] ? el.options[el.selectedIndex].text : ''),
    null,
    { timeout: r.timeout },
  ),
  set_input_files: async (r) => locate(r.selector).setInputFiles(r.path, { timeout: r.timeout }),
  enter_frame: async (r) => {
    const handle = await locate(r.selector).elementHandle({ timeout: r.timeout });
    const inner = handle && (await handle.contentFrame());
    if (!inner) throw new Error('Not a frame: ' + r.selector);
    frame = inner;
  },
  leave_frame: async () => { frame = null; },
  wait_alert: async (r) => nextDialog(r.timeout),
  switch_window: async (r) => {
    const deadline = Date.now() + r.timeout;
    while (pages.length <= r.index) {
      if (Date.now() >= deadline) throw timeoutError('window ' + r.index);
      await pause(100);
    }
    page = pages[r.index];
    frame = null;
    await page.bringToFront();
  },
  window_count: async () => pages.length,
  eval: async (r) => scope().evaluate(r.script),
  screenshot: async () => (await page.screenshot({ fullPage: true })).toString('hex'),
  close: async () => { await browser.close(); },
};

(async () => {
  browser = await playwright[options.browser].launch({ headless: options.headless });
  const context = await browser.newContext({ viewport: options.viewport });
  context.on('page', track);
  page = await context.newPage();
  track(page);
  reply({ ready: true });

  const lines = readline.createInterface({ input: process.stdin });
  for await (const line of lines) {
    if (!line.trim()) continue;
    const request = JSON.parse(line);
    try {
      const value = await ops[request.op](request);
      reply({ id: request.id, ok: true, value: value === undefined ? null : value });
    } catch (error) {
      reply({
        id: request.id,
        ok: false,
        kind: error.name === 'TimeoutError' ? 'timeout' : 'error',
        message: String(error.message || error),
      });
    }
    if (request.op === 'close') break;
  }
  process.exit(0);
})().catch((error) => {
  process.stderr.write(String(error.stack || error) + '\n');
  process.exit(1);
});
"#;

#[derive(Debug, Deserialize)]
struct BridgeReply {
    id: Option<u64>,
    #[serde(default)]
    ready: bool,
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    value: Value,
    kind: Option<String>,
    message: Option<String>,
}

impl BridgeReply {
    fn into_result(self, what: &str, timeout_ms: u64) -> E2eResult<Value> {
        if self.ok {
            return Ok(self.value);
        }
        let message = self.message.unwrap_or_default();
        match self.kind.as_deref() {
            Some("timeout") => Err(E2eError::UiTimeout {
                what: what.to_string(),
                timeout_ms,
            }),
            _ => Err(E2eError::Ui(format!("{}: {}", what, message))),
        }
    }
}

struct Channel {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
}

impl Channel {
    async fn read_reply(&mut self) -> E2eResult<BridgeReply> {
        loop {
            let line = self
                .stdout
                .next_line()
                .await?
                .ok_or_else(|| E2eError::Ui("Playwright bridge exited".to_string()))?;
            match serde_json::from_str::<BridgeReply>(&line) {
                Ok(reply) => return Ok(reply),
                Err(_) => debug!(target: "playwright", "{}", line),
            }
        }
    }
}

/// A live browser driven through the bridge process
pub struct PlaywrightDriver {
    channel: Mutex<Channel>,
    next_id: AtomicU64,
    pid: Option<u32>,
    _workdir: TempDir,
}

impl PlaywrightDriver {
    pub async fn launch(config: &BrowserConfig) -> E2eResult<Self> {
        let cwd = std::env::current_dir()?;
        check_playwright_installed(&cwd).await?;

        let workdir = tempfile::tempdir()?;
        let script_path = workdir.path().join("bridge.js");
        tokio::fs::write(&script_path, BRIDGE_SCRIPT).await?;

        let options = json!({
            "browser": config.kind.as_str(),
            "headless": config.headless,
            "viewport": { "width": config.viewport_width, "height": config.viewport_height },
        });

        info!("Launching {} (headless: {})", config.kind.as_str(), config.headless);
        let mut child = Command::new("node")
            .arg(&script_path)
            .arg(options.to_string())
            .current_dir(&cwd)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| E2eError::Ui(format!("Failed to spawn node: {}", e)))?;

        let stdin = child.stdin.take().ok_or_else(|| E2eError::Ui("bridge stdin unavailable".to_string()))?;
        let stdout = child.stdout.take().ok_or_else(|| E2eError::Ui("bridge stdout unavailable".to_string()))?;
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(target: "playwright", "{}", line);
                }
            });
        }

        let pid = child.id();
        let mut channel = Channel {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
        };

        let ready = timeout(LAUNCH_TIMEOUT, channel.read_reply())
            .await
            .map_err(|_| E2eError::UiTimeout {
                what: "browser launch".to_string(),
                timeout_ms: LAUNCH_TIMEOUT.as_millis() as u64,
            })??;
        if !ready.ready {
            return Err(E2eError::Ui("bridge answered before it was ready".to_string()));
        }
        debug!("Browser bridge ready (pid: {:?})", pid);

        Ok(Self {
            channel: Mutex::new(channel),
            next_id: AtomicU64::new(1),
            pid,
            _workdir: workdir,
        })
    }

    /// One request/response round trip
    async fn call(&self, op: &str, mut args: Map<String, Value>, timeout_ms: u64) -> E2eResult<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let what = args
            .get("selector")
            .and_then(Value::as_str)
            .map(|s| s.to_string())
            .unwrap_or_else(|| op.to_string());

        args.insert("id".to_string(), json!(id));
        args.insert("op".to_string(), json!(op));
        args.insert("timeout".to_string(), json!(timeout_ms));
        let mut line = serde_json::to_string(&args)?;
        line.push('\n');

        let mut channel = self.channel.lock().await;
        channel.stdin.write_all(line.as_bytes()).await?;
        channel.stdin.flush().await?;

        let budget = Duration::from_millis(timeout_ms + BRIDGE_GRACE_MS);
        let exchange = async {
            loop {
                let reply = channel.read_reply().await?;
                if reply.id == Some(id) {
                    return Ok::<_, E2eError>(reply);
                }
                warn!("Discarding stale bridge reply {:?}", reply.id);
            }
        };
        let reply = timeout(budget, exchange).await.map_err(|_| E2eError::UiTimeout {
            what: format!("bridge reply to {}", op),
            timeout_ms: budget.as_millis() as u64,
        })??;

        reply.into_result(&what, timeout_ms)
    }

    async fn on(&self, op: &str, locator: &Locator, mut args: Map<String, Value>, timeout_ms: u64) -> E2eResult<Value> {
        args.insert("selector".to_string(), json!(locator.as_str()));
        self.call(op, args, timeout_ms).await
    }

    /// Graceful stop, then force
    async fn stop(&self) {
        let mut channel = self.channel.lock().await;
        if let Ok(Ok(_)) = timeout(Duration::from_secs(5), channel.child.wait()).await {
            return;
        }

        #[cfg(unix)]
        if let Some(pid) = self.pid {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            if kill(Pid::from_raw(pid as i32), Signal::SIGTERM).is_ok()
                && timeout(Duration::from_millis(500), channel.child.wait()).await.is_ok()
            {
                return;
            }
        }

        let _ = channel.child.kill().await;
    }
}

async fn check_playwright_installed(cwd: &Path) -> E2eResult<()> {
    let status = Command::new("node")
        .args(["-e", "require.resolve('playwright')"])
        .current_dir(cwd)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;

    match status {
        Ok(status) if status.success() => Ok(()),
        _ => Err(E2eError::PlaywrightNotFound),
    }
}

fn args(pairs: &[(&str, Value)]) -> Map<String, Value> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

fn as_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn as_count(value: &Value) -> usize {
    value.as_u64().unwrap_or(0) as usize
}

#[async_trait]
impl UiDriver for PlaywrightDriver {
    async fn goto(&self, url: &str) -> E2eResult<()> {
        debug!("goto {}", url);
        self.call("goto", args(&[("url", json!(url))]), PAGE_TIMEOUT_MS).await?;
        Ok(())
    }

    async fn refresh(&self) -> E2eResult<()> {
        self.call("refresh", Map::new(), PAGE_TIMEOUT_MS).await?;
        Ok(())
    }

    async fn click(&self, locator: &Locator, mode: ClickMode, timeout_ms: u64) -> E2eResult<()> {
        let mode = match mode {
            ClickMode::Native => "native",
            ClickMode::Script => "script",
        };
        self.on("click", locator, args(&[("mode", json!(mode))]), timeout_ms).await?;
        Ok(())
    }

    async fn fill(&self, locator: &Locator, value: &str, timeout_ms: u64) -> E2eResult<()> {
        self.on("fill", locator, args(&[("value", json!(value))]), timeout_ms).await?;
        Ok(())
    }

    async fn press(&self, locator: &Locator, key: &str, timeout_ms: u64) -> E2eResult<()> {
        self.on("press", locator, args(&[("key", json!(key))]), timeout_ms).await?;
        Ok(())
    }

    async fn text(&self, locator: &Locator, timeout_ms: u64) -> E2eResult<String> {
        Ok(as_text(self.on("text", locator, Map::new(), timeout_ms).await?))
    }

    async fn texts(&self, locator: &Locator, timeout_ms: u64) -> E2eResult<Vec<String>> {
        let value = self.on("texts", locator, Map::new(), timeout_ms).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn count(&self, locator: &Locator) -> E2eResult<usize> {
        Ok(as_count(&self.on("count", locator, Map::new(), PAGE_TIMEOUT_MS).await?))
    }

    async fn attribute(&self, locator: &Locator, name: &str, timeout_ms: u64) -> E2eResult<Option<String>> {
        let value = self.on("attribute", locator, args(&[("name", json!(name))]), timeout_ms).await?;
        Ok(value.as_str().map(str::to_string))
    }

    async fn find(&self, locator: &Locator, timeout_ms: u64) -> E2eResult<Presence> {
        let found = self.on("find", locator, Map::new(), timeout_ms).await?;
        Ok(if found.as_bool().unwrap_or(false) {
            Presence::Found
        } else {
            Presence::NotFound
        })
    }

    async fn wait_gone(&self, locator: &Locator, timeout_ms: u64) -> E2eResult<()> {
        self.on("wait_gone", locator, Map::new(), timeout_ms).await?;
        Ok(())
    }

    async fn wait_count_above(&self, locator: &Locator, count: usize, timeout_ms: u64) -> E2eResult<usize> {
        let value = self
            .on("wait_count_above", locator, args(&[("count", json!(count))]), timeout_ms)
            .await?;
        Ok(as_count(&value))
    }

    async fn select_option(&self, locator: &Locator, label: &str, timeout_ms: u64) -> E2eResult<()> {
        self.on("select_option", locator, args(&[("label", json!(label))]), timeout_ms).await?;
        Ok(())
    }

    async fn selected_option(&self, locator: &Locator, timeout_ms: u64) -> E2eResult<String> {
        Ok(as_text(self.on("selected_option", locator, Map::new(), timeout_ms).await?))
    }

    async fn set_input_files(&self, locator: &Locator, path: &Path, timeout_ms: u64) -> E2eResult<()> {
        let path = path.to_string_lossy();
        self.on("set_input_files", locator, args(&[("path", json!(path))]), timeout_ms).await?;
        Ok(())
    }

    async fn enter_frame(&self, locator: &Locator, timeout_ms: u64) -> E2eResult<()> {
        self.on("enter_frame", locator, Map::new(), timeout_ms).await?;
        Ok(())
    }

    async fn leave_frame(&self) -> E2eResult<()> {
        self.call("leave_frame", Map::new(), PAGE_TIMEOUT_MS).await?;
        Ok(())
    }

    async fn wait_alert(&self, timeout_ms: u64) -> E2eResult<String> {
        let text = as_text(self.call("wait_alert", Map::new(), timeout_ms).await?);
        info!("Alert: {}", text);
        Ok(text)
    }

    async fn switch_window(&self, index: usize, timeout_ms: u64) -> E2eResult<()> {
        self.call("switch_window", args(&[("index", json!(index))]), timeout_ms).await?;
        Ok(())
    }

    async fn window_count(&self) -> E2eResult<usize> {
        Ok(as_count(&self.call("window_count", Map::new(), PAGE_TIMEOUT_MS).await?))
    }

    async fn eval(&self, script: &str) -> E2eResult<Value> {
        self.call("eval", args(&[("script", json!(script))]), PAGE_TIMEOUT_MS).await
    }

    async fn screenshot(&self) -> E2eResult<Vec<u8>> {
        let encoded = as_text(self.call("screenshot", Map::new(), PAGE_TIMEOUT_MS).await?);
        hex::decode(encoded).map_err(|e| E2eError::Ui(format!("screenshot encoding: {}", e)))
    }

    async fn close(&self) -> E2eResult<()> {
        info!("Closing browser (pid: {:?})", self.pid);
        if let Err(e) = self.call("close", Map::new(), PAGE_TIMEOUT_MS).await {
            warn!("Browser close request failed: {}", e);
        }
        self.stop().await;
        Ok(())
    }
}

/// Starts a fresh [`PlaywrightDriver`] for each scenario that asks for one
pub struct PlaywrightLauncher {
    config: BrowserConfig,
}

impl PlaywrightLauncher {
    pub fn new(config: BrowserConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl DriverFactory for PlaywrightLauncher {
    async fn launch(&self) -> E2eResult<Arc<dyn UiDriver>> {
        let driver = PlaywrightDriver::launch(&self.config).await?;
        Ok(Arc::new(driver))
    }
}
