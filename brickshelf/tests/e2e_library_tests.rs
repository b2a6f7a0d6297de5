//! End-to-end tests for the collection lifecycle
//!
//! Adding with enrichment, persistence across restarts, export and
//! re-import, and set-list imports.

mod common;

use brickshelf::collection::{AddOutcome, ImportOutcome};
use brickshelf::enrichment::derive_category;
use brickshelf::item::Item;
use brickshelf::view::{all_themes, filter_items, group_by_theme};
use common::{
    TestCollection, AT_AT_CODE, AT_AT_NAME, LAMBORGHINI_CODE, LAMBORGHINI_NAME,
};

fn sorted_by_code(items: &[Item]) -> Vec<Item> {
    let mut items = items.to_vec();
    items.sort_by(|a, b| a.code.cmp(&b.code));
    items
}

// =============================================================================
// Adding and persistence
// =============================================================================

#[tokio::test]
async fn test_add_enriches_and_persists() {
    let mut collection = TestCollection::new();

    let outcome = collection.service.add(AT_AT_CODE, None).await.unwrap();
    let AddOutcome::Added { item, enriched } = outcome else {
        panic!("expected the set to be added");
    };
    assert!(enriched);
    assert_eq!(item.resolved_name, AT_AT_NAME);
    assert_eq!(item.category.as_deref(), Some("Star Wars"));
    assert_eq!(item.requested_name, "LEGO Set 75313");
    assert_eq!(
        item.image_url.as_deref(),
        Some("https://cdn.rebrickable.com/media/sets/75313-1.jpg")
    );

    let reopened = collection.reopen();
    assert_eq!(reopened.items(), &[item]);
}

#[tokio::test]
async fn test_add_twice_reports_existing() {
    let mut collection = TestCollection::new();
    collection.service.add(AT_AT_CODE, None).await.unwrap();

    let outcome = collection.service.add(" 75313 ", None).await.unwrap();
    assert!(matches!(outcome, AddOutcome::AlreadyExists(ref item) if item.code == AT_AT_CODE));
    assert_eq!(collection.service.items().len(), 1);
}

#[tokio::test]
async fn test_unknown_set_is_saved_unenriched() {
    let mut collection = TestCollection::new();

    let outcome = collection.service.add("99999", None).await.unwrap();
    let AddOutcome::Added { item, .. } = outcome else {
        panic!("expected the set to be added");
    };
    assert!(item.is_pending());
    // Filed by the word after "LEGO" in its default requested name.
    assert_eq!(derive_category(&item), "Set");
    assert_eq!(collection.reopen().items().len(), 1);
}

#[tokio::test]
async fn test_delete_survives_restart() {
    let mut collection = TestCollection::new();
    collection.service.add(AT_AT_CODE, None).await.unwrap();
    collection.service.add(LAMBORGHINI_CODE, None).await.unwrap();

    collection.service.delete(AT_AT_CODE).unwrap();

    let reopened = collection.reopen();
    let codes: Vec<&str> = reopened.items().iter().map(|i| i.code.as_str()).collect();
    assert_eq!(codes, vec![LAMBORGHINI_CODE]);
}

#[tokio::test]
async fn test_stored_api_key_outlives_the_service() {
    let collection = TestCollection::new();
    collection.service.set_api_key("stored-key-1234").unwrap();

    let reopened = collection.reopen();
    assert_eq!(reopened.effective_api_key().as_deref(), Some("stored-key-1234"));
}

// =============================================================================
// Export and import
// =============================================================================

#[tokio::test]
async fn test_export_then_import_into_fresh_collection() {
    let mut source = TestCollection::new();
    source.service.add(AT_AT_CODE, None).await.unwrap();
    source.service.add(LAMBORGHINI_CODE, None).await.unwrap();

    let export_path = source.path("library.json");
    let written = source
        .service
        .export_file(Some(&export_path))
        .await
        .unwrap();
    assert_eq!(written, export_path);

    let mut target = TestCollection::new();
    let outcome = target.service.import_file(&export_path).await.unwrap();
    assert_eq!(
        outcome,
        ImportOutcome::Imported {
            added: 2,
            duplicates: 0
        }
    );
    assert_eq!(
        sorted_by_code(target.service.items()),
        sorted_by_code(source.service.items())
    );
    assert_eq!(
        sorted_by_code(target.reopen().items()),
        sorted_by_code(source.service.items())
    );

    // Importing the same file again adds nothing.
    let outcome = target.service.import_file(&export_path).await.unwrap();
    assert_eq!(outcome, ImportOutcome::NothingNew { duplicates: 2 });
    assert_eq!(target.service.items().len(), 2);
}

#[tokio::test]
async fn test_export_document_shape() {
    let mut collection = TestCollection::new();
    collection.service.add(AT_AT_CODE, None).await.unwrap();

    let json = collection.service.export_json().unwrap();
    let document: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(document["version"], "1.0");
    assert_eq!(document["totalSets"], 1);
    assert!(document["exportDate"].as_str().unwrap().ends_with('Z'));
    assert_eq!(document["sets"][0]["code"], AT_AT_CODE);
    assert_eq!(document["sets"][0]["resolvedName"], AT_AT_NAME);
    assert_eq!(document["sets"][0]["category"], "Star Wars");
}

#[tokio::test]
async fn test_export_empty_collection_fails() {
    let collection = TestCollection::new();
    let export_path = collection.path("empty.json");

    assert!(collection
        .service
        .export_file(Some(&export_path))
        .await
        .is_err());
    assert!(!export_path.exists());
}

#[tokio::test]
async fn test_set_list_import_then_sync() {
    let mut collection = TestCollection::new();
    collection.service.add(AT_AT_CODE, None).await.unwrap();

    let set_list = r#"{
        "lego_sets": [
            {"set_number": 75313, "theme": "Star Wars", "name": "AT-AT"},
            {"set_number": "42115", "theme": "Technic", "booklets": ["1", "2"]},
            {"set_number": " 10294 "}
        ],
        "total_sets": 3
    }"#;
    let list_path = collection.path("sets.json");
    std::fs::write(&list_path, set_list).unwrap();

    let outcome = collection.service.import_file(&list_path).await.unwrap();
    assert_eq!(
        outcome,
        ImportOutcome::Imported {
            added: 2,
            duplicates: 1
        }
    );

    let technic = collection.service.get(LAMBORGHINI_CODE).unwrap();
    assert_eq!(technic.requested_name, "LEGO Technic 42115");
    assert_eq!(technic.note.as_deref(), Some("Booklets: 1, 2"));
    assert!(technic.is_pending());
    assert!(collection.service.get("10294").unwrap().is_pending());

    let report = collection.service.sync().await.unwrap();
    assert_eq!(report.total, 3);
    assert!(!report.enrichment_skipped);

    let technic = collection.service.get(LAMBORGHINI_CODE).unwrap();
    assert_eq!(technic.resolved_name, LAMBORGHINI_NAME);
    assert_eq!(technic.category.as_deref(), Some("Technic"));
    assert_eq!(technic.note.as_deref(), Some("Booklets: 1, 2"));
}

#[tokio::test]
async fn test_invalid_import_leaves_collection_untouched() {
    let mut collection = TestCollection::new();
    collection.service.add(AT_AT_CODE, None).await.unwrap();

    let bad_path = collection.path("bad.json");
    std::fs::write(&bad_path, r#"{"version": "1.0", "sets": [{"code": ""}]}"#).unwrap();

    assert!(collection.service.import_file(&bad_path).await.is_err());
    assert_eq!(collection.reopen().items().len(), 1);
}

// =============================================================================
// Browsing
// =============================================================================

#[tokio::test]
async fn test_browse_after_sync() {
    let mut collection = TestCollection::new();
    collection.service.add(AT_AT_CODE, None).await.unwrap();
    collection.service.add(LAMBORGHINI_CODE, None).await.unwrap();
    collection.service.add("99999", None).await.unwrap();

    let items = collection.service.items();
    assert_eq!(
        all_themes(items),
        vec!["All", "Set", "Star Wars", "Technic"]
    );

    let star_wars = filter_items(items, "Star Wars", "");
    assert_eq!(star_wars.len(), 1);
    assert_eq!(star_wars[0].code, AT_AT_CODE);

    let groups = group_by_theme(filter_items(items, "All", "lamborghini"));
    assert_eq!(groups.len(), 1);
    assert_eq!(groups["Technic"][0].code, LAMBORGHINI_CODE);
}
