//! The tracked catalog entry.

use serde::{Deserialize, Serialize};

/// Placeholder name given to items whose official name is not known yet.
pub const LOADING_NAME: &str = "Loading...";

const BUILDING_INSTRUCTIONS_URL: &str = "https://www.lego.com/service/buildinginstructions";
const PLACEHOLDER_IMAGE_URL: &str = "https://picsum.photos/seed";

/// A set in the collection, keyed by its catalog `code`.
///
/// Serialized with the camelCase field names used by library exports.
/// `legoName` and `theme` are accepted on input so files written by the
/// first web release of the tracker still import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub code: String,
    pub requested_name: String,
    #[serde(alias = "legoName")]
    pub resolved_name: String,
    pub product_url: String,
    pub exists: bool,
    #[serde(default, alias = "theme", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Item {
    /// A freshly added item that has not been enriched yet.
    pub fn new_pending(code: &str, requested_name: String, product_url: String) -> Self {
        Self {
            code: code.to_string(),
            requested_name,
            resolved_name: LOADING_NAME.to_string(),
            product_url,
            exists: true,
            category: None,
            note: None,
            image_url: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.resolved_name == LOADING_NAME
    }
}

/// Label given to a set added by code alone.
pub fn default_requested_name(code: &str) -> String {
    format!("LEGO Set {}", code)
}

/// Product page used when the user didn't supply one.
pub fn default_product_url(code: &str) -> String {
    format!("{}/{}", BUILDING_INSTRUCTIONS_URL, code)
}

/// Deterministic stand-in thumbnail seeded by the set code.
pub fn placeholder_image_url(code: &str) -> String {
    format!("{}/{}/400/300", PLACEHOLDER_IMAGE_URL, code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_pending_item() {
        let item = Item::new_pending("75313", default_requested_name("75313"), default_product_url("75313"));
        assert_eq!(item.requested_name, "LEGO Set 75313");
        assert_eq!(item.resolved_name, LOADING_NAME);
        assert_eq!(
            item.product_url,
            "https://www.lego.com/service/buildinginstructions/75313"
        );
        assert!(item.exists);
        assert!(item.category.is_none());
        assert!(item.is_pending());
    }

    #[test]
    fn test_serializes_camel_case_and_omits_absent_fields() {
        let item = Item::new_pending("60411", "LEGO Set 60411".into(), String::new());
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["requestedName"], "LEGO Set 60411");
        assert_eq!(json["resolvedName"], "Loading...");
        assert_eq!(json["productUrl"], "");
        assert!(json.get("category").is_none());
        assert!(json.get("imageUrl").is_none());
    }

    #[test]
    fn test_accepts_legacy_field_names() {
        let json = r#"{
            "code": "10294-1",
            "requestedName": "LEGO Set 10294",
            "legoName": "Titanic",
            "productUrl": "https://rebrickable.com/sets/10294-1/",
            "exists": true,
            "theme": "Icons"
        }"#;
        let item: Item = serde_json::from_str(json).unwrap();
        assert_eq!(item.resolved_name, "Titanic");
        assert_eq!(item.category.as_deref(), Some("Icons"));
    }

    #[test]
    fn test_placeholder_image_url() {
        assert_eq!(
            placeholder_image_url("42115"),
            "https://picsum.photos/seed/42115/400/300"
        );
    }
}
