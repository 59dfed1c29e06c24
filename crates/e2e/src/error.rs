//! Error types for the verification suite

use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Data access error: {0}")]
    DataAccess(#[from] stylish_common::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Timeout after {timeout_ms} ms waiting for: {what}")]
    UiTimeout { what: String, timeout_ms: u64 },

    #[error("UI driver error: {0}")]
    Ui(String),

    #[error("Playwright not found. Install with: npm install playwright && npx playwright install")]
    PlaywrightNotFound,

    #[error("Assertion failed in {context}: {detail}\n  expected: {expected}\n  actual:   {actual}")]
    Assertion {
        context: String,
        expected: String,
        actual: String,
        detail: String,
    },

    #[error("Test data error: {0}")]
    DataProvider(String),

    #[error("Prime acquisition failed: {0}")]
    PrimeAcquisition(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl From<reqwest::Error> for E2eError {
    fn from(err: reqwest::Error) -> Self {
        E2eError::Transport(err.to_string())
    }
}

impl E2eError {
    /// Build an assertion failure from any two debuggable values
    pub fn assertion(
        context: impl Into<String>,
        expected: impl std::fmt::Debug,
        actual: impl std::fmt::Debug,
        detail: impl Into<String>,
    ) -> Self {
        E2eError::Assertion {
            context: context.into(),
            expected: format!("{:?}", expected),
            actual: format!("{:?}", actual),
            detail: detail.into(),
        }
    }

    /// Assertion failures are product defects; everything else is the
    /// suite failing to run.
    pub fn is_assertion(&self) -> bool {
        matches!(self, E2eError::Assertion { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, E2eError::UiTimeout { .. })
    }
}

pub type E2eResult<T> = Result<T, E2eError>;
