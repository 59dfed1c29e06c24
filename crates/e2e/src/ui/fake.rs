//! Scripted in-process driver for page-object tests

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::Arc;

use super::{ClickMode, DriverFactory, Locator, Presence, UiDriver};
use crate::error::{E2eError, E2eResult};

/// Page change a click causes
enum Effect {
    Texts { locator: String, texts: Vec<String> },
    Attribute { locator: String, name: String, value: String },
}

#[derive(Default)]
struct Script {
    texts: HashMap<String, Vec<String>>,
    attributes: HashMap<(String, String), String>,
    selected: HashMap<String, String>,
    alerts: VecDeque<String>,
    evals: VecDeque<Value>,
    windows: usize,
    on_click: HashMap<String, Vec<Effect>>,
    actions: Vec<String>,
}

impl Script {
    fn apply(&mut self, effect: &Effect) {
        match effect {
            Effect::Texts { locator, texts } => {
                self.texts.insert(locator.clone(), texts.clone());
            }
            Effect::Attribute { locator, name, value } => {
                self.attributes.insert((locator.clone(), name.clone()), value.clone());
            }
        }
    }
}

/// Answers lookups from a fixed script and records every command
pub(crate) struct FakeDriver {
    script: Mutex<Script>,
}

impl FakeDriver {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(Script {
                windows: 1,
                ..Script::default()
            }),
        }
    }

    pub fn with_text(self, locator: &Locator, text: &str) -> Self {
        self.with_texts(locator, &[text])
    }

    pub fn with_texts(self, locator: &Locator, texts: &[&str]) -> Self {
        self.script
            .lock()
            .texts
            .insert(locator.to_string(), texts.iter().map(|t| t.to_string()).collect());
        self
    }

    pub fn with_attribute(self, locator: &Locator, name: &str, value: &str) -> Self {
        self.script
            .lock()
            .attributes
            .insert((locator.to_string(), name.to_string()), value.to_string());
        self
    }

    pub fn with_selected(self, locator: &Locator, option: &str) -> Self {
        self.script.lock().selected.insert(locator.to_string(), option.to_string());
        self
    }

    pub fn with_alert(self, text: &str) -> Self {
        self.script.lock().alerts.push_back(text.to_string());
        self
    }

    pub fn with_eval(self, value: Value) -> Self {
        self.script.lock().evals.push_back(value);
        self
    }

    pub fn with_windows(self, windows: usize) -> Self {
        self.script.lock().windows = windows;
        self
    }

    /// Clicking `clicked` replaces the texts of `target`
    pub fn on_click_texts(self, clicked: &Locator, target: &Locator, texts: &[&str]) -> Self {
        self.on_click(
            clicked,
            Effect::Texts {
                locator: target.to_string(),
                texts: texts.iter().map(|t| t.to_string()).collect(),
            },
        )
    }

    /// Clicking `clicked` sets attribute `name` of `target`
    pub fn on_click_attribute(self, clicked: &Locator, target: &Locator, name: &str, value: &str) -> Self {
        self.on_click(
            clicked,
            Effect::Attribute {
                locator: target.to_string(),
                name: name.to_string(),
                value: value.to_string(),
            },
        )
    }

    fn on_click(self, clicked: &Locator, effect: Effect) -> Self {
        self.script
            .lock()
            .on_click
            .entry(clicked.to_string())
            .or_default()
            .push(effect);
        self
    }

    pub fn actions(&self) -> Vec<String> {
        self.script.lock().actions.clone()
    }

    fn record(&self, action: String) {
        self.script.lock().actions.push(action);
    }

    fn present(&self, locator: &Locator) -> bool {
        let script = self.script.lock();
        let key = locator.to_string();
        script.texts.get(&key).is_some_and(|t| !t.is_empty())
            || script.selected.contains_key(&key)
            || script.attributes.keys().any(|(l, _)| *l == key)
    }
}

fn timeout(what: impl ToString, timeout_ms: u64) -> E2eError {
    E2eError::UiTimeout {
        what: what.to_string(),
        timeout_ms,
    }
}

#[async_trait]
impl UiDriver for FakeDriver {
    async fn goto(&self, url: &str) -> E2eResult<()> {
        self.record(format!("goto {}", url));
        Ok(())
    }

    async fn refresh(&self) -> E2eResult<()> {
        self.record("refresh".to_string());
        Ok(())
    }

    async fn click(&self, locator: &Locator, mode: ClickMode, _timeout_ms: u64) -> E2eResult<()> {
        let prefix = match mode {
            ClickMode::Native => "click",
            ClickMode::Script => "js-click",
        };
        self.record(format!("{} {}", prefix, locator));

        let mut script = self.script.lock();
        if let Some(effects) = script.on_click.remove(locator.as_str()) {
            for effect in &effects {
                script.apply(effect);
            }
            script.on_click.insert(locator.to_string(), effects);
        }
        Ok(())
    }

    async fn fill(&self, locator: &Locator, value: &str, _timeout_ms: u64) -> E2eResult<()> {
        self.record(format!("fill {} {}", locator, value));
        Ok(())
    }

    async fn press(&self, locator: &Locator, key: &str, _timeout_ms: u64) -> E2eResult<()> {
        self.record(format!("press {} {}", locator, key));
        Ok(())
    }

    async fn text(&self, locator: &Locator, timeout_ms: u64) -> E2eResult<String> {
        self.script
            .lock()
            .texts
            .get(locator.as_str())
            .and_then(|texts| texts.first().cloned())
            .ok_or_else(|| timeout(locator, timeout_ms))
    }

    async fn texts(&self, locator: &Locator, timeout_ms: u64) -> E2eResult<Vec<String>> {
        match self.script.lock().texts.get(locator.as_str()) {
            Some(texts) if !texts.is_empty() => Ok(texts.clone()),
            _ => Err(timeout(locator, timeout_ms)),
        }
    }

    async fn count(&self, locator: &Locator) -> E2eResult<usize> {
        Ok(self.script.lock().texts.get(locator.as_str()).map_or(0, Vec::len))
    }

    async fn attribute(&self, locator: &Locator, name: &str, timeout_ms: u64) -> E2eResult<Option<String>> {
        if !self.present(locator) {
            return Err(timeout(locator, timeout_ms));
        }
        Ok(self
            .script
            .lock()
            .attributes
            .get(&(locator.to_string(), name.to_string()))
            .cloned())
    }

    async fn find(&self, locator: &Locator, _timeout_ms: u64) -> E2eResult<Presence> {
        Ok(if self.present(locator) {
            Presence::Found
        } else {
            Presence::NotFound
        })
    }

    async fn wait_gone(&self, locator: &Locator, _timeout_ms: u64) -> E2eResult<()> {
        self.record(format!("wait-gone {}", locator));
        Ok(())
    }

    async fn wait_count_above(&self, locator: &Locator, count: usize, timeout_ms: u64) -> E2eResult<usize> {
        let current = self.count(locator).await?;
        if current > count {
            Ok(current)
        } else {
            Err(timeout(locator, timeout_ms))
        }
    }

    async fn select_option(&self, locator: &Locator, label: &str, _timeout_ms: u64) -> E2eResult<()> {
        self.record(format!("select {} {}", locator, label));
        self.script.lock().selected.insert(locator.to_string(), label.to_string());
        Ok(())
    }

    async fn selected_option(&self, locator: &Locator, timeout_ms: u64) -> E2eResult<String> {
        self.script
            .lock()
            .selected
            .get(locator.as_str())
            .cloned()
            .ok_or_else(|| timeout(locator, timeout_ms))
    }

    async fn set_input_files(&self, locator: &Locator, path: &Path, _timeout_ms: u64) -> E2eResult<()> {
        self.record(format!("upload {} {}", locator, path.display()));
        Ok(())
    }

    async fn enter_frame(&self, locator: &Locator, _timeout_ms: u64) -> E2eResult<()> {
        self.record(format!("enter-frame {}", locator));
        Ok(())
    }

    async fn leave_frame(&self) -> E2eResult<()> {
        self.record("leave-frame".to_string());
        Ok(())
    }

    async fn wait_alert(&self, timeout_ms: u64) -> E2eResult<String> {
        self.script
            .lock()
            .alerts
            .pop_front()
            .ok_or_else(|| timeout("dialog", timeout_ms))
    }

    async fn switch_window(&self, index: usize, timeout_ms: u64) -> E2eResult<()> {
        if index >= self.script.lock().windows {
            return Err(timeout(format!("window {}", index), timeout_ms));
        }
        self.record(format!("window {}", index));
        Ok(())
    }

    async fn window_count(&self) -> E2eResult<usize> {
        Ok(self.script.lock().windows)
    }

    async fn eval(&self, script: &str) -> E2eResult<Value> {
        self.record(format!("eval {}", script));
        Ok(self.script.lock().evals.pop_front().unwrap_or(Value::Null))
    }

    async fn screenshot(&self) -> E2eResult<Vec<u8>> {
        Ok(b"\x89PNG\r\n\x1a\n".to_vec())
    }

    async fn close(&self) -> E2eResult<()> {
        self.record("close".to_string());
        Ok(())
    }
}

/// Hands out one shared [`FakeDriver`] as the scenario browser
pub(crate) struct FakeFactory(pub Arc<FakeDriver>);

#[async_trait]
impl DriverFactory for FakeFactory {
    async fn launch(&self) -> E2eResult<Arc<dyn UiDriver>> {
        Ok(self.0.clone())
    }
}
