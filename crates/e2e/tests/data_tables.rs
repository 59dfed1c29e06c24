//! The scenario tables shipped under `data/` load and expand cleanly

use std::path::PathBuf;

use stylish_e2e::api::ProductForm;
use stylish_e2e::data::TEST_TITLE_PREFIX;
use stylish_e2e::scenarios::catalog;
use stylish_e2e::ui::pages::{CheckoutForm, ProductEntry};
use stylish_e2e::{TableKind, TableSet};

fn data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data")
}

fn tables() -> TableSet {
    let dir = data_dir();
    TableSet::load(&dir.join("scenarios"), &dir.join("images")).unwrap()
}

#[test]
fn test_every_family_is_shipped() {
    let tables = tables();
    for kind in TableKind::ALL {
        let table = tables.get(kind).unwrap();
        assert!(!table.records.is_empty(), "{} has no rows", kind);
    }
}

#[test]
fn test_no_placeholder_survives_expansion() {
    let tables = tables();
    for kind in TableKind::ALL {
        for record in tables.records(kind) {
            for (column, value) in record.fields() {
                assert!(!value.ends_with(" chars"), "{} row {} {}", kind, record.row(), column);
                assert_ne!(value, "sample image");
            }
        }
    }
}

#[test]
fn test_checkout_rows_build_forms() {
    let tables = tables();
    for record in tables.records(TableKind::CheckoutInvalid) {
        let form = CheckoutForm::from_record(&record).unwrap();
        assert!(form.receiver.chars().count() <= 101);
        assert!(!record.get("Alert Msg").unwrap().is_empty());
    }

    let long_receiver = tables
        .records(TableKind::CheckoutInvalid)
        .into_iter()
        .map(|r| CheckoutForm::from_record(&r).unwrap())
        .find(|f| f.receiver.chars().count() == 101);
    assert!(long_receiver.is_some());

    for record in tables.records(TableKind::CheckoutValid) {
        let form = CheckoutForm::from_record(&record).unwrap();
        assert!(form.deliver_time.is_some());
    }
}

#[test]
fn test_product_rows_resolve_images() {
    let tables = tables();
    for record in tables.records(TableKind::ProductCreateValid) {
        let entry = ProductEntry::from_record(&record).unwrap();
        assert!(entry.main_image.as_ref().is_some_and(|p| p.is_file()));
        assert!(entry.other_images.iter().flatten().all(|p| p.is_file()));
    }

    let valid = tables.records(TableKind::ApiProductCreateValid);
    let form = ProductForm::from_record(&valid[0]).unwrap();
    assert_eq!(form.title(), format!("{}連身裙", TEST_TITLE_PREFIX));
    assert_eq!(form.image_names(), ["mainImage.jpg", "otherImage0.jpg", "otherImage1.jpg"]);

    let longest = ProductForm::from_record(&valid[2]).unwrap();
    assert_eq!(longest.title().chars().count(), 255);
}

#[test]
fn test_catalog_covers_every_row() {
    let tables = tables();
    let scenarios = catalog(&tables);

    let rows = |kind: TableKind| tables.records(kind).len();
    let named = |prefix: &str| scenarios.iter().filter(|s| s.name.starts_with(prefix)).count();

    assert_eq!(named("Web checkout with invalid values"), rows(TableKind::CheckoutInvalid));
    assert_eq!(named("Web checkout with valid values"), rows(TableKind::CheckoutValid));
    assert_eq!(named("Web create product success"), rows(TableKind::ProductCreateValid));
    assert_eq!(named("Web create product without login"), rows(TableKind::ProductCreateValid));
    assert_eq!(named("Web create product with invalid value"), rows(TableKind::ProductCreateInvalid));
    assert_eq!(named("API create and delete product"), rows(TableKind::ApiProductCreateValid));
    assert_eq!(named("API create product with invalid value"), rows(TableKind::ApiProductCreateInvalid));
}
