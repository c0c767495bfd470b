//! Category catalog lookups

use eprel_downloader::registry::{CatalogError, CategoryCatalog};

use crate::support::scripted_client;

#[test]
fn test_embedded_catalog_is_sorted() {
    let catalog = CategoryCatalog::load().unwrap();
    let keys = catalog.keys();
    let mut sorted = keys.clone();
    sorted.sort_unstable();
    assert_eq!(keys, sorted);
    assert_eq!(keys.first(), Some(&"airconditioners"));
}

#[test]
fn test_resolve_mapped_and_plain_keys() {
    let catalog = CategoryCatalog::load().unwrap();
    assert_eq!(catalog.resolve("smartphones").unwrap(), "smartphonestablets20231669");
    assert_eq!(catalog.resolve("tyres").unwrap(), "tyres");
}

#[test]
fn test_unknown_key_lists_available() {
    let catalog = CategoryCatalog::load().unwrap();
    match catalog.resolve("Televisions") {
        Err(CatalogError::UnknownCategory { category, available }) => {
            assert_eq!(category, "Televisions");
            assert!(available.contains("televisions"));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_custom_catalog() {
    let catalog =
        CategoryCatalog::from_entries([("kettles", "kettles2025"), ("fans", "fans")]).unwrap();
    assert_eq!(catalog.len(), 2);
    assert_eq!(catalog.resolve("kettles").unwrap(), "kettles2025");
    assert!(!catalog.contains("lamps"));
}

#[test]
fn test_blank_entries_rejected() {
    assert!(matches!(
        CategoryCatalog::from_entries([("kettles", "")]),
        Err(CatalogError::EmptyEntry(_))
    ));
}

#[test]
fn test_client_uses_cached_catalog() {
    let (client, _) = scripted_client(Vec::new());
    assert_eq!(client.catalog(), CategoryCatalog::load().unwrap());
}
