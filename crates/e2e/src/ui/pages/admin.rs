//! `admin/products.html` and the creation form it opens in a new window

use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::data::ScenarioRecord;
use crate::error::E2eResult;
use crate::ui::{xpath_literal, ClickMode, Locator, Presence, UiDriver};

/// Cell value that ticks every option
const SELECT_ALL: &str = "全選";
const LIST_SEP: &str = ", ";

pub const ALL_SIZES: [&str; 5] = ["S", "M", "L", "XL", "F"];

/// One row of a web product-creation table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductEntry {
    pub category: String,
    pub title: String,
    pub description: String,
    pub price: String,
    pub texture: String,
    pub wash: String,
    pub place: String,
    pub note: String,
    pub story: String,
    /// Raw `Colors` cell: names, `全選` or blank
    pub colors: String,
    /// Raw `Sizes` cell: sizes, `全選` or blank
    pub sizes: String,
    pub main_image: Option<PathBuf>,
    pub other_images: [Option<PathBuf>; 2],
}

impl ProductEntry {
    pub fn from_record(record: &ScenarioRecord) -> E2eResult<Self> {
        let text = |column: &str| -> E2eResult<String> { Ok(record.get(column)?.to_string()) };
        Ok(Self {
            category: text("Category")?,
            title: text("Title")?,
            description: text("Description")?,
            price: text("Price")?,
            texture: text("Texture")?,
            wash: text("Wash")?,
            place: text("Place of Product")?,
            note: text("Note")?,
            story: text("Story")?,
            colors: text("Colors")?,
            sizes: text("Sizes")?,
            main_image: record.optional_path("Main Image")?,
            other_images: [
                record.optional_path("Other Image 1")?,
                record.optional_path("Other Image 2")?,
            ],
        })
    }

    /// Color names to tick, given every known color name
    pub fn color_names(&self, all: &[String]) -> Vec<String> {
        expand(&self.colors, || all.to_vec())
    }

    pub fn size_names(&self) -> Vec<String> {
        expand(&self.sizes, || ALL_SIZES.iter().map(|s| s.to_string()).collect())
    }
}

fn expand(cell: &str, all: impl FnOnce() -> Vec<String>) -> Vec<String> {
    match cell {
        "" => Vec::new(),
        SELECT_ALL => all(),
        list => list.split(LIST_SEP).map(str::to_string).collect(),
    }
}

fn create_product_button() -> Locator {
    Locator::xpath("//button[text()='Create New Product']")
}

fn category_select() -> Locator {
    Locator::name("category")
}

fn input(name: &str) -> Locator {
    Locator::css(format!("input[name='{}']", name))
}

fn description_input() -> Locator {
    Locator::css("textarea[name='description']")
}

fn create_button() -> Locator {
    Locator::css("input[value='Create']")
}

fn checkbox(label: &str) -> Locator {
    Locator::xpath(format!(
        "//label[contains(text(),{})]/preceding-sibling::input",
        xpath_literal(label)
    ))
}

fn title_cell(title: &str) -> Locator {
    Locator::xpath(format!("//td[@id='product_title' and text()={}]", xpath_literal(title)))
}

fn delete_button(title: &str) -> Locator {
    Locator::xpath(format!(
        "//td[@id='product_title' and text()={}]/following-sibling::td/button",
        xpath_literal(title)
    ))
}

pub struct AdminPage<'a> {
    driver: &'a dyn UiDriver,
    wait_ms: u64,
}

impl<'a> AdminPage<'a> {
    pub fn new(driver: &'a dyn UiDriver, wait_ms: u64) -> Self {
        Self { driver, wait_ms }
    }

    pub async fn open(&self, url: &str) -> E2eResult<()> {
        self.driver.goto(url).await
    }

    pub async fn alert(&self, timeout_ms: u64) -> E2eResult<String> {
        self.driver.wait_alert(timeout_ms).await
    }

    /// The form opens in a second window
    pub async fn open_create_form(&self) -> E2eResult<()> {
        self.driver
            .click(&create_product_button(), ClickMode::Script, self.wait_ms)
            .await?;
        self.driver.switch_window(1, self.wait_ms).await
    }

    /// Back to the product list window, reloaded
    pub async fn back_to_list(&self) -> E2eResult<()> {
        self.driver.switch_window(0, self.wait_ms).await?;
        self.driver.refresh().await
    }

    pub async fn fill_form(&self, entry: &ProductEntry, all_colors: &[String]) -> E2eResult<()> {
        debug!("Filling product form for '{}'", entry.title);
        self.driver
            .select_option(&category_select(), &entry.category, self.wait_ms)
            .await?;

        let fields = [
            (input("title"), &entry.title),
            (description_input(), &entry.description),
            (input("price"), &entry.price),
            (input("texture"), &entry.texture),
            (input("wash"), &entry.wash),
            (input("place"), &entry.place),
            (input("note"), &entry.note),
            (input("story"), &entry.story),
        ];
        for (locator, value) in &fields {
            self.driver.fill(locator, value, self.wait_ms).await?;
        }

        for label in entry.color_names(all_colors).iter().chain(entry.size_names().iter()) {
            self.driver.click(&checkbox(label), ClickMode::Script, self.wait_ms).await?;
        }

        if let Some(path) = &entry.main_image {
            self.driver.set_input_files(&input("main_image"), path, self.wait_ms).await?;
        }
        for (index, image) in entry.other_images.iter().enumerate() {
            if let Some(path) = image {
                self.driver
                    .set_input_files(&input("other_images").nth(index), path, self.wait_ms)
                    .await?;
            }
        }
        Ok(())
    }

    pub async fn submit(&self) -> E2eResult<()> {
        info!("Submitting product form");
        self.driver.click(&create_button(), ClickMode::Script, self.wait_ms).await
    }

    pub async fn product_listed(&self, title: &str) -> E2eResult<Presence> {
        self.driver.find(&title_cell(title), self.wait_ms).await
    }

    /// Delete the listed product titled `title`. Returns false when it is
    /// not listed.
    pub async fn delete_product(&self, title: &str) -> E2eResult<bool> {
        let button = delete_button(title);
        if !self.driver.find(&button, self.wait_ms).await?.is_found() {
            debug!("No listed product titled '{}'", title);
            return Ok(false);
        }
        self.driver.click(&button, ClickMode::Script, self.wait_ms).await?;
        let confirm = self.driver.wait_alert(self.wait_ms).await?;
        debug!("Confirmed '{}'", confirm);
        self.driver.wait_gone(&button, self.wait_ms).await?;
        info!("Deleted product '{}'", title);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ScenarioTable, TableKind};
    use crate::ui::fake::FakeDriver;

    fn entry(colors: &str, sizes: &str) -> ProductEntry {
        ProductEntry {
            category: "Women".to_string(),
            title: "Mingchun_連身裙".to_string(),
            description: "I".to_string(),
            price: "500".to_string(),
            texture: "棉".to_string(),
            wash: "手洗".to_string(),
            place: "台灣".to_string(),
            note: String::new(),
            story: "I".to_string(),
            colors: colors.to_string(),
            sizes: sizes.to_string(),
            main_image: Some(PathBuf::from("/data/images/mainImage.jpg")),
            other_images: [None, Some(PathBuf::from("/data/images/otherImage1.jpg"))],
        }
    }

    #[test]
    fn test_option_expansion() {
        let all = vec!["白色".to_string(), "深藍".to_string()];
        assert_eq!(entry("全選", "").color_names(&all), all);
        assert_eq!(entry("深藍", "").color_names(&all), ["深藍"]);
        assert!(entry("", "").color_names(&all).is_empty());
        assert_eq!(entry("", "S, XL").size_names(), ["S", "XL"]);
        assert_eq!(entry("", "全選").size_names().len(), 5);
    }

    #[test]
    fn test_entry_from_record() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("mainImage.jpg"), b"\xff\xd8\xff\xd9").unwrap();

        let yaml = r#"
name: Create Product Success
columns: [Category, Title, Description, Price, Texture, Wash, Place of Product, Note, Story, Colors, Sizes, Main Image, Other Image 1, Other Image 2]
rows:
  - { Category: Men, Title: 連身裙, Description: "1 chars", Price: 1000, Texture: 棉, Wash: 手洗,
      Place of Product: 台灣, Note: "1 chars", Story: "1 chars", Colors: 全選, Sizes: "S, M",
      Main Image: sample image }
"#;
        let table = ScenarioTable::from_yaml(TableKind::ProductCreateValid, yaml, dir.path()).unwrap();
        let entry = ProductEntry::from_record(&table.records[0]).unwrap();

        assert_eq!(entry.title, "Mingchun_連身裙");
        assert_eq!(entry.price, "1000");
        assert_eq!(entry.main_image, Some(dir.path().join("mainImage.jpg")));
        assert_eq!(entry.other_images, [None, None]);
    }

    #[tokio::test]
    async fn test_fill_form_uploads_into_matching_slots() {
        let driver = FakeDriver::new();
        let admin = AdminPage::new(&driver, 100);

        admin.fill_form(&entry("深藍", "F"), &[]).await.unwrap();
        let actions = driver.actions();
        assert_eq!(actions[0], "select css=[name=\"category\"] Women");
        assert!(actions.contains(&"js-click xpath=//label[contains(text(),'深藍')]/preceding-sibling::input".to_string()));
        assert!(actions.contains(&"upload css=input[name='main_image'] /data/images/mainImage.jpg".to_string()));
        assert_eq!(
            actions.last().unwrap(),
            "upload css=input[name='other_images'] >> nth=1 /data/images/otherImage1.jpg"
        );
    }

    #[tokio::test]
    async fn test_delete_missing_product_is_tolerated() {
        let driver = FakeDriver::new();
        let admin = AdminPage::new(&driver, 100);

        assert!(!admin.delete_product("Mingchun_連身裙").await.unwrap());
        assert!(driver.actions().is_empty());
    }

    #[tokio::test]
    async fn test_delete_listed_product() {
        let title = "Mingchun_連身裙";
        let driver = FakeDriver::new()
            .with_text(&delete_button(title), "刪除")
            .with_alert("確定刪除?");
        let admin = AdminPage::new(&driver, 100);

        assert!(admin.delete_product(title).await.unwrap());
        assert_eq!(driver.actions().len(), 2);
    }
}
