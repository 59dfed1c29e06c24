//! Parameterized scenario tables
//!
//! Each table family lives in one YAML file under `data/scenarios/`:
//!
//! ```yaml
//! name: Checkout with Invalid Value
//! columns: [Receiver, Email, Mobile, Address, Deliver Time, ...]
//! rows:
//!   - { Receiver: "101 chars", Email: abc@abc.com, ... }
//! ```
//!
//! Descriptive sentinels such as `"101 chars"` or `"sample image"` are
//! expanded at load time by the rules of the table's [`TableKind`]. A cell
//! that still looks like a sentinel after expansion is a load error.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{E2eError, E2eResult};

/// Column holding image file names, with the file `"sample image"` stands for
const IMAGE_COLUMNS: [(&str, &str); 3] = [
    ("Main Image", "mainImage.jpg"),
    ("Other Image 1", "otherImage0.jpg"),
    ("Other Image 2", "otherImage1.jpg"),
];

/// Prefix that marks products created by the suite
pub const TEST_TITLE_PREFIX: &str = "Mingchun_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    CheckoutValid,
    CheckoutInvalid,
    ProductCreateValid,
    ProductCreateInvalid,
    ApiProductCreateValid,
    ApiProductCreateInvalid,
}

impl TableKind {
    pub const ALL: [TableKind; 6] = [
        TableKind::CheckoutValid,
        TableKind::CheckoutInvalid,
        TableKind::ProductCreateValid,
        TableKind::ProductCreateInvalid,
        TableKind::ApiProductCreateValid,
        TableKind::ApiProductCreateInvalid,
    ];

    pub fn file_stem(&self) -> &'static str {
        match self {
            TableKind::CheckoutValid => "checkout_valid",
            TableKind::CheckoutInvalid => "checkout_invalid",
            TableKind::ProductCreateValid => "product_create_valid",
            TableKind::ProductCreateInvalid => "product_create_invalid",
            TableKind::ApiProductCreateValid => "api_product_create_valid",
            TableKind::ApiProductCreateInvalid => "api_product_create_invalid",
        }
    }

    pub fn from_file_stem(stem: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.file_stem() == stem)
    }

    fn has_images(&self) -> bool {
        !matches!(self, TableKind::CheckoutValid | TableKind::CheckoutInvalid)
    }

    /// Placeholder expansions declared for this family
    fn rules(&self) -> Vec<Rule> {
        let mut rules = match self {
            TableKind::CheckoutValid => vec![],
            TableKind::CheckoutInvalid => vec![
                Rule::column("Receiver", "101 chars", "陳".repeat(101)),
                Rule::column("Email", "51 chars", format!("abc@{}.com", "a".repeat(43))),
                Rule::column("Address", "256 chars", "台".repeat(256)),
            ],
            TableKind::ProductCreateValid => vec![
                Rule::column("Title", "連身裙", format!("{}連身裙", TEST_TITLE_PREFIX)),
                Rule::column("Title", "1 chars", "I"),
                Rule::column("Title", "255 chars", format!("{}{}", TEST_TITLE_PREFIX, "裙".repeat(246))),
                Rule::column("Description", "1 chars", "I"),
                Rule::column("Description", "255 chars", "連".repeat(255)),
                Rule::column("Texture", "1 chars", "I"),
                Rule::column("Texture", "127 chars", "棉".repeat(127)),
                Rule::column("Wash", "1 chars", "I"),
                Rule::column("Wash", "127 chars", "洗".repeat(127)),
                Rule::column("Place of Product", "1 chars", "I"),
                Rule::column("Place of Product", "127 chars", "台".repeat(127)),
                Rule::column("Note", "1 chars", "I"),
                Rule::column("Note", "127 chars", "筆".repeat(127)),
                Rule::column("Story", "1 chars", "I"),
            ],
            TableKind::ProductCreateInvalid => vec![
                Rule::column("Title", "256 chars", "裙".repeat(256)),
                Rule::column("Description", "256 chars", "詳細內容".repeat(64)),
                Rule::column("Texture", "128 chars", "棉".repeat(128)),
                Rule::column("Wash", "128 chars", "手洗".repeat(64)),
                Rule::column("Place of Product", "128 chars", "TW".repeat(64)),
                Rule::column("Note", "128 chars", "Note".repeat(32)),
            ],
            TableKind::ApiProductCreateValid => vec![
                Rule::column("Title", "連身裙", format!("{}連身裙", TEST_TITLE_PREFIX)),
                Rule::table("1 chars", "I"),
                Rule::table("255 chars", format!("{}{}", TEST_TITLE_PREFIX, "褲".repeat(246))),
                Rule::table("127 chars", format!("{}{}", TEST_TITLE_PREFIX, "裙".repeat(118))),
            ],
            TableKind::ApiProductCreateInvalid => vec![
                Rule::table("256 chars", format!("{}{}", TEST_TITLE_PREFIX, "褲".repeat(247))),
                Rule::table("128 chars", format!("{}{}", TEST_TITLE_PREFIX, "裙".repeat(119))),
            ],
        };

        if self.has_images() {
            for (column, file) in IMAGE_COLUMNS {
                rules.push(Rule::column(column, "sample image", file));
            }
        }
        rules
    }
}

impl std::fmt::Display for TableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.file_stem())
    }
}

#[derive(Debug, Clone)]
enum Scope {
    Column(&'static str),
    Table,
}

#[derive(Debug, Clone)]
struct Rule {
    scope: Scope,
    sentinel: &'static str,
    replacement: String,
}

impl Rule {
    fn column(column: &'static str, sentinel: &'static str, replacement: impl Into<String>) -> Self {
        Self {
            scope: Scope::Column(column),
            sentinel,
            replacement: replacement.into(),
        }
    }

    fn table(sentinel: &'static str, replacement: impl Into<String>) -> Self {
        Self {
            scope: Scope::Table,
            sentinel,
            replacement: replacement.into(),
        }
    }

    fn applies(&self, column: &str, cell: &str) -> bool {
        let in_scope = match self.scope {
            Scope::Column(c) => c == column,
            Scope::Table => true,
        };
        in_scope && cell == self.sentinel
    }
}

/// Shape of a cell that stands for generated content
const SENTINEL_PATTERN: &str = r"^(\d+ chars|sample image)$";

/// One resolved row. Cells are plain strings; blanks are `""`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioRecord {
    table: TableKind,
    row: usize,
    fields: BTreeMap<String, String>,
}

impl ScenarioRecord {
    pub fn table(&self) -> TableKind {
        self.table
    }

    /// Zero-based row index within its table
    pub fn row(&self) -> usize {
        self.row
    }

    pub fn get(&self, column: &str) -> E2eResult<&str> {
        self.fields.get(column).map(String::as_str).ok_or_else(|| {
            E2eError::DataProvider(format!("{} has no column '{}'", self.table, column))
        })
    }

    /// Cell split on `sep`, blanks dropped
    pub fn list(&self, column: &str, sep: &str) -> E2eResult<Vec<String>> {
        Ok(self
            .get(column)?
            .split(sep)
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Cell as a path, `None` when blank
    pub fn optional_path(&self, column: &str) -> E2eResult<Option<PathBuf>> {
        let value = self.get(column)?;
        Ok((!value.is_empty()).then(|| PathBuf::from(value)))
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }
}

#[derive(Debug, Deserialize)]
struct RawTable {
    name: String,
    columns: Vec<String>,
    #[serde(default)]
    rows: Vec<BTreeMap<String, serde_yaml::Value>>,
}

#[derive(Debug, Clone)]
pub struct ScenarioTable {
    pub kind: TableKind,
    pub name: String,
    pub columns: Vec<String>,
    pub records: Vec<ScenarioRecord>,
}

impl ScenarioTable {
    /// Parse and resolve one table. Image cells become paths under `image_dir`.
    pub fn from_yaml(kind: TableKind, yaml: &str, image_dir: &Path) -> E2eResult<Self> {
        let raw: RawTable = serde_yaml::from_str(yaml)?;
        let rules = kind.rules();
        let sentinel = Regex::new(SENTINEL_PATTERN).map_err(|e| E2eError::DataProvider(e.to_string()))?;

        let mut records = Vec::with_capacity(raw.rows.len());
        for (row, cells) in raw.rows.into_iter().enumerate() {
            if let Some(unknown) = cells.keys().find(|c| !raw.columns.contains(c)) {
                return Err(E2eError::DataProvider(format!(
                    "{} row {}: unknown column '{}'",
                    kind,
                    row + 1,
                    unknown
                )));
            }

            let mut fields = BTreeMap::new();
            for column in &raw.columns {
                let cell = match cells.get(column) {
                    Some(value) => cell_text(value).ok_or_else(|| {
                        E2eError::DataProvider(format!(
                            "{} row {}: column '{}' is not a scalar",
                            kind,
                            row + 1,
                            column
                        ))
                    })?,
                    None => String::new(),
                };
                let value = resolve(kind, &rules, &sentinel, column, cell, image_dir)
                    .map_err(|reason| E2eError::DataProvider(format!("{} row {}: {}", kind, row + 1, reason)))?;
                fields.insert(column.clone(), value);
            }

            records.push(ScenarioRecord { table: kind, row, fields });
        }

        debug!("Loaded {} ({} rows)", raw.name, records.len());
        Ok(Self {
            kind,
            name: raw.name,
            columns: raw.columns,
            records,
        })
    }

    pub fn from_file(kind: TableKind, path: &Path, image_dir: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(kind, &content, image_dir)
    }
}

fn cell_text(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::Null => Some(String::new()),
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn resolve(
    kind: TableKind,
    rules: &[Rule],
    sentinel: &Regex,
    column: &str,
    cell: String,
    image_dir: &Path,
) -> Result<String, String> {
    let value = match rules.iter().find(|rule| rule.applies(column, &cell)) {
        Some(rule) => rule.replacement.clone(),
        None => cell,
    };

    if sentinel.is_match(&value) {
        return Err(format!("no rule for placeholder '{}' in column '{}'", value, column));
    }

    let is_image = kind.has_images() && IMAGE_COLUMNS.iter().any(|(c, _)| *c == column);
    if is_image && !value.is_empty() {
        let path = image_dir.join(&value);
        if !path.is_file() {
            return Err(format!("image '{}' not found at {}", value, path.display()));
        }
        return Ok(path.to_string_lossy().into_owned());
    }
    Ok(value)
}

/// Every table family found under the scenario directory
#[derive(Debug, Clone, Default)]
pub struct TableSet {
    tables: BTreeMap<TableKind, ScenarioTable>,
}

impl TableSet {
    pub fn load(scenario_dir: &Path, image_dir: &Path) -> E2eResult<Self> {
        let mut tables = BTreeMap::new();

        for entry in walkdir::WalkDir::new(scenario_dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
        {
            let stem = entry
                .path()
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let kind = TableKind::from_file_stem(&stem).ok_or_else(|| {
                E2eError::DataProvider(format!("unknown scenario table {}", entry.path().display()))
            })?;

            let table = ScenarioTable::from_file(kind, entry.path(), image_dir)?;
            tables.insert(kind, table);
        }

        info!("Loaded {} scenario table(s) from {}", tables.len(), scenario_dir.display());
        Ok(Self { tables })
    }

    pub fn get(&self, kind: TableKind) -> E2eResult<&ScenarioTable> {
        self.tables
            .get(&kind)
            .ok_or_else(|| E2eError::DataProvider(format!("scenario table {} is missing", kind)))
    }

    /// Records of `kind`, empty when the table is absent
    pub fn records(&self, kind: TableKind) -> Vec<ScenarioRecord> {
        self.tables
            .get(&kind)
            .map(|t| t.records.clone())
            .unwrap_or_default()
    }
}
