//! Harness wiring for scenario tests: a seeded store and a scripted browser

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;
use stylish_common::{Account, Database};

use crate::config::HarnessConfig;
use crate::data::TableSet;
use crate::report::ScenarioResult;
use crate::runner::{Harness, Scenario};
use crate::ui::fake::{FakeDriver, FakeFactory};
use crate::ui::Locator;

use super::web_cart::CART_PRODUCTS;

pub const EMAIL: &str = "user0@example";
pub const PASSWORD: &str = "secret";

/// Two products, two colors and the signed-in user
pub const CATALOG_SQL: &str = r#"
    INSERT INTO color (id, code, name) VALUES (1, 'FFFFFF', '白色'), (2, 'DDFFBB', '亮綠');
    INSERT INTO product VALUES
        (201807201824, 'women', '前開衩扭結洋裝', '厚薄：薄', 799, '棉 100%', '手洗', '中國', '', '故事', 'main.jpg'),
        (201807242211, 'men', '純色輕薄百搭襯衫', '厚薄：薄', 799, '棉 100%', '手洗', '中國', '', '故事', 'main.jpg');
    INSERT INTO product_images (id, product_id, image) VALUES (11, 201807201824, '0.jpg'), (21, 201807242211, '0.jpg');
    INSERT INTO variant (id, product_id, color_id, size, stock) VALUES
        (101, 201807201824, 1, 'M', 5), (201, 201807242211, 2, 'M', 5);
    INSERT INTO user (id, provider, email, password, name, picture, access_token) VALUES
        (1, 'native', 'user0@example', 'x', 'user0', NULL, 'token-0');
"#;

/// Product ids of [`CATALOG_SQL`], in store order
pub const PRODUCT_IDS: [i64; 2] = [201807201824, 201807242211];

/// Store with the Stylish schema and `seed` applied
pub fn store(seed: &str) -> Database {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(stylish_common::db::SCHEMA).unwrap();
    conn.execute_batch(seed).unwrap();
    Database::from_connection(conn).unwrap()
}

pub fn config(base_url: &str, output: &Path) -> HarnessConfig {
    HarnessConfig {
        base_url: base_url.to_string(),
        output_dir: output.to_path_buf(),
        ..HarnessConfig::default()
    }
}

pub fn harness(config: HarnessConfig, db: Database, driver: Arc<FakeDriver>) -> Harness {
    Harness::new(
        config,
        Account::new(EMAIL, PASSWORD),
        Arc::new(db),
        TableSet::default(),
        Arc::new(FakeFactory(driver)),
    )
}

/// Run `scenario` as catalog entry 0, so its RNG is seeded with 0
pub async fn run(harness: &Harness, scenario: &Scenario) -> ScenarioResult {
    harness.run_scenario(0, scenario).await
}

/// Title every scripted product page shows
pub const TITLE: &str = "前開衩扭結洋裝";

fn cart_field(index: usize, class: &str) -> Locator {
    Locator::css("div.cart__item").nth(index).within(&Locator::class(class))
}

/// A product page with white highlighted, size M picked and one piece
pub fn product_page() -> FakeDriver {
    FakeDriver::new()
        .with_text(&Locator::class("product__title"), TITLE)
        .with_texts(&Locator::class("product__color"), &["", ""])
        .with_attribute(&Locator::class("product__color--selected"), "data_id", "color_code_FFFFFF")
        .with_texts(&Locator::class("product__size"), &["S", "M"])
        .with_text(&Locator::class("product__size--selected"), "M")
        .with_text(&Locator::class("product__quantity-value"), "1")
        .with_text(&Locator::class("product__price"), "NT.799")
        .with_text(&Locator::class("product__add-to-cart-button"), "加入購物車")
}

/// Cart lines for `ids`, one white M piece at 799 each
pub fn with_cart(driver: FakeDriver, ids: &[i64]) -> FakeDriver {
    let rows: Vec<&str> = ids.iter().map(|_| "line").collect();
    let mut driver = driver.with_texts(&Locator::css("div.cart__item"), &rows);
    for (index, id) in ids.iter().enumerate() {
        let quantity = Locator::css("div.cart__item")
            .nth(index)
            .within(&Locator::css("select.cart__item-quantity-selector"));
        driver = driver
            .with_text(&cart_field(index, "cart__item-id"), &id.to_string())
            .with_text(&cart_field(index, "cart__item-name"), TITLE)
            .with_text(&cart_field(index, "cart__item-color"), "顏色｜白色")
            .with_text(&cart_field(index, "cart__item-size"), "尺寸｜M")
            .with_texts(&quantity, &[""])
            .with_selected(&quantity, "1")
            .with_text(&cart_field(index, "cart__item-price-content"), "NT.799")
            .with_text(&cart_field(index, "cart__item-subtotal-content"), "NT.799");
    }
    driver
}

/// Products a scenario run as entry 0 puts in the cart, in order
pub fn picked_ids() -> Vec<i64> {
    let mut rng = StdRng::seed_from_u64(0);
    PRODUCT_IDS.choose_multiple(&mut rng, CART_PRODUCTS).copied().collect()
}
