//! Expected catalog content, folded from the store's detail rows

use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use stylish_common::{Color, ProductDetailRow, ProductSnapshot, ProductTitle, Variant};

use super::pagination::page_slice;
use super::{expect_eq, expect_same_set};
use crate::api::ProductForm;
use crate::config::HarnessConfig;
use crate::error::E2eResult;
use crate::ui::pages::Category;

/// Which products a listing is expected to hold
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductFilter {
    All,
    Category(Category),
    /// Title contains the keyword
    Keyword(String),
    Id(i64),
}

impl ProductFilter {
    pub fn matches(&self, id: i64, category: &str, title: &str) -> bool {
        match self {
            ProductFilter::All => true,
            ProductFilter::Category(wanted) => category == wanted.as_str(),
            ProductFilter::Keyword(keyword) => title.contains(keyword.as_str()),
            ProductFilter::Id(wanted) => id == *wanted,
        }
    }

    /// Titles the filter keeps, in id order
    pub fn titles<'a>(&self, titles: &'a [ProductTitle]) -> Vec<&'a str> {
        titles
            .iter()
            .filter(|t| self.matches(t.id, &t.category, &t.title))
            .map(|t| t.title.as_str())
            .collect()
    }
}

/// Fold joined rows into one snapshot per product, keeping row order.
/// Images, variants and colors are de-duplicated by their own keys.
pub fn snapshots(rows: &[ProductDetailRow], config: &HarnessConfig) -> Vec<ProductSnapshot> {
    let mut order: Vec<i64> = Vec::new();
    let mut grouped: BTreeMap<i64, Vec<&ProductDetailRow>> = BTreeMap::new();
    for row in rows {
        grouped
            .entry(row.id)
            .or_insert_with(|| {
                order.push(row.id);
                Vec::new()
            })
            .push(row);
    }

    order
        .iter()
        .filter_map(|id| grouped.get(id))
        .filter_map(|rows| fold(rows, config))
        .collect()
}

fn fold(rows: &[&ProductDetailRow], config: &HarnessConfig) -> Option<ProductSnapshot> {
    let first = rows.first()?;

    let mut image_ids = HashSet::new();
    let mut variant_ids = HashSet::new();
    let mut color_codes = HashSet::new();
    let mut images = Vec::new();
    let mut variants = Vec::new();
    let mut colors = Vec::new();
    let mut sizes: Vec<String> = Vec::new();

    for row in rows {
        if image_ids.insert(row.image_id) {
            images.push(config.asset_url(row.id, &row.image));
        }
        if variant_ids.insert(row.variant_id) {
            variants.push(Variant {
                color_code: row.color_code.clone(),
                size: row.size.clone(),
                stock: row.stock,
            });
        }
        if color_codes.insert(row.color_code.as_str()) {
            colors.push(Color {
                code: row.color_code.clone(),
                name: row.color_name.clone(),
            });
        }
        if !sizes.contains(&row.size) {
            sizes.push(row.size.clone());
        }
    }

    Some(ProductSnapshot {
        id: first.id,
        category: first.category.clone(),
        title: first.title.clone(),
        description: first.description.clone(),
        price: first.price,
        texture: first.texture.clone(),
        wash: first.wash.clone(),
        place: first.place.clone(),
        note: first.note.clone(),
        story: first.story.clone(),
        main_image: config.asset_url(first.id, &first.main_image),
        images,
        variants,
        colors,
        sizes,
    })
}

/// Every product the filter keeps, in id order
pub fn expected_products(
    rows: &[ProductDetailRow],
    filter: &ProductFilter,
    config: &HarnessConfig,
) -> Vec<ProductSnapshot> {
    snapshots(rows, config)
        .into_iter()
        .filter(|p| filter.matches(p.id, &p.category, &p.title))
        .collect()
}

/// One page of [`expected_products`]
pub fn expected_page(
    rows: &[ProductDetailRow],
    filter: &ProductFilter,
    page: usize,
    config: &HarnessConfig,
) -> Vec<ProductSnapshot> {
    page_slice(&expected_products(rows, filter, config), page).to_vec()
}

/// The color list of each product sorted, so colors compare as a set
fn normalize_colors(value: &mut Value) {
    let products: Vec<&mut Value> = match value {
        Value::Array(items) => items.iter_mut().collect(),
        Value::Object(_) => vec![value],
        _ => Vec::new(),
    };
    for product in products {
        if let Some(Value::Array(colors)) = product.get_mut("colors") {
            colors.sort_by_key(|c| c.to_string());
        }
    }
}

/// Compare a product listing or detail body against the expectation
pub fn expect_products<T: serde::Serialize + ?Sized>(
    context: &str,
    expected: &T,
    actual: Option<&Value>,
) -> E2eResult<()> {
    let mut expected = serde_json::to_value(expected)?;
    let mut actual = actual.cloned().unwrap_or(Value::Null);
    normalize_colors(&mut expected);
    normalize_colors(&mut actual);
    expect_eq(context, &expected, &actual)
}

/// A created product as the store holds it, in the shape it was submitted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredProduct {
    pub fields: BTreeMap<String, String>,
    pub color_ids: Vec<String>,
    pub sizes: Vec<String>,
    pub images: Vec<String>,
}

impl StoredProduct {
    pub fn from_rows(rows: &[ProductDetailRow]) -> Option<Self> {
        let first = rows.first()?;
        let fields = [
            ("category", first.category.clone()),
            ("title", first.title.clone()),
            ("description", first.description.clone()),
            ("price", first.price.to_string()),
            ("texture", first.texture.clone()),
            ("wash", first.wash.clone()),
            ("place", first.place.clone()),
            ("note", first.note.clone()),
            ("story", first.story.clone()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        let mut color_ids = Vec::new();
        let mut sizes = Vec::new();
        let mut images = vec![first.main_image.clone()];
        for row in rows {
            let color_id = row.color_id.to_string();
            if !color_ids.contains(&color_id) {
                color_ids.push(color_id);
            }
            if !sizes.contains(&row.size) {
                sizes.push(row.size.clone());
            }
            if !images.contains(&row.image) {
                images.push(row.image.clone());
            }
        }

        Some(Self {
            fields,
            color_ids,
            sizes,
            images,
        })
    }

    /// Text fields string for string, color ids and sizes as sets,
    /// images by file name
    pub fn expect_matches(&self, form: &ProductForm) -> E2eResult<()> {
        let submitted: BTreeMap<String, String> = form
            .fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        expect_eq("created product fields", &submitted, &self.fields)?;
        expect_same_set("created product color ids", &form.color_ids, &self.color_ids)?;
        expect_same_set("created product sizes", &form.sizes, &self.sizes)?;
        expect_eq("created product images", &form.image_names(), &self.images)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::admin::ImageUpload;
    use std::path::PathBuf;

    fn row(id: i64, image_id: i64, variant_id: i64, color: (i64, &str, &str), size: &str) -> ProductDetailRow {
        ProductDetailRow {
            id,
            category: "women".to_string(),
            title: format!("洋裝{}", id),
            description: "厚薄：薄".to_string(),
            price: 799,
            texture: "棉 100%".to_string(),
            wash: "手洗".to_string(),
            place: "中國".to_string(),
            note: "實品顏色依單品照為主".to_string(),
            story: "O.N.S".to_string(),
            main_image: "main.jpg".to_string(),
            image_id,
            image: format!("{}.jpg", image_id),
            variant_id,
            color_id: color.0,
            color_code: color.1.to_string(),
            color_name: color.2.to_string(),
            size: size.to_string(),
            stock: 2,
        }
    }

    fn config() -> HarnessConfig {
        HarnessConfig {
            base_url: "http://stylish.test".to_string(),
            ..HarnessConfig::default()
        }
    }

    fn joined() -> Vec<ProductDetailRow> {
        let white = (1, "FFFFFF", "白色");
        let green = (2, "DDFFBB", "亮綠");
        vec![
            row(1, 10, 100, white, "S"),
            row(1, 10, 101, green, "M"),
            row(1, 11, 100, white, "S"),
            row(1, 11, 101, green, "M"),
            row(2, 20, 200, white, "F"),
        ]
    }

    #[test]
    fn test_rows_fold_into_snapshots() {
        let products = snapshots(&joined(), &config());
        assert_eq!(products.len(), 2);

        let first = &products[0];
        assert_eq!(first.main_image, "http://stylish.test/assets/1/main.jpg");
        assert_eq!(
            first.images,
            ["http://stylish.test/assets/1/10.jpg", "http://stylish.test/assets/1/11.jpg"]
        );
        assert_eq!(first.variants.len(), 2);
        assert_eq!(first.colors.len(), 2);
        assert_eq!(first.sizes, ["S", "M"]);
        assert_eq!(products[1].sizes, ["F"]);
    }

    #[test]
    fn test_filters() {
        let rows = joined();
        let cfg = config();
        assert_eq!(expected_products(&rows, &ProductFilter::All, &cfg).len(), 2);
        assert_eq!(expected_products(&rows, &ProductFilter::Id(2), &cfg)[0].id, 2);
        assert!(expected_products(&rows, &ProductFilter::Category(Category::Men), &cfg).is_empty());
        assert_eq!(
            expected_products(&rows, &ProductFilter::Keyword("洋裝1".to_string()), &cfg).len(),
            1
        );
        assert!(expected_page(&rows, &ProductFilter::All, 1, &cfg).is_empty());
    }

    #[test]
    fn test_colors_compare_as_set() {
        let cfg = config();
        let expected = expected_products(&joined(), &ProductFilter::Id(1), &cfg);
        let mut actual = serde_json::to_value(&expected).unwrap();
        actual[0]["colors"].as_array_mut().unwrap().reverse();

        expect_products("details", &expected, Some(&actual)).unwrap();

        actual[0]["sizes"].as_array_mut().unwrap().reverse();
        assert!(expect_products("details", &expected, Some(&actual)).is_err());
        assert!(expect_products("details", &expected, None).is_err());
    }

    #[test]
    fn test_stored_product_matches_form() {
        let stored = StoredProduct::from_rows(&joined()[..4]).unwrap();
        assert_eq!(stored.color_ids, ["1", "2"]);
        assert_eq!(stored.images, ["main.jpg", "10.jpg", "11.jpg"]);

        let form = ProductForm {
            fields: vec![
                ("category", "women".to_string()),
                ("title", "洋裝1".to_string()),
                ("description", "厚薄：薄".to_string()),
                ("price", "799".to_string()),
                ("texture", "棉 100%".to_string()),
                ("wash", "手洗".to_string()),
                ("place", "中國".to_string()),
                ("note", "實品顏色依單品照為主".to_string()),
                ("story", "O.N.S".to_string()),
            ],
            color_ids: vec!["2".to_string(), "1".to_string()],
            sizes: vec!["M".to_string(), "S".to_string()],
            images: ["main.jpg", "10.jpg", "11.jpg"]
                .iter()
                .map(|name| ImageUpload {
                    field: "other_images",
                    path: PathBuf::from("/data/images").join(name),
                })
                .collect(),
        };
        stored.expect_matches(&form).unwrap();

        let mut wrong_price = form.clone();
        wrong_price.fields[3].1 = "800".to_string();
        assert!(stored.expect_matches(&wrong_price).unwrap_err().is_assertion());
    }
}
