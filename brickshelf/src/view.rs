//! Read-side projections of the collection used for display.

use crate::enrichment::derive_category;
use crate::item::{placeholder_image_url, Item};
use std::collections::{BTreeMap, BTreeSet};

/// Filter value that matches every theme.
pub const ALL_THEMES: &str = "All";

/// `"All"` followed by every distinct theme in the collection, sorted.
pub fn all_themes(items: &[Item]) -> Vec<String> {
    let themes: BTreeSet<String> = items.iter().map(derive_category).collect();
    std::iter::once(ALL_THEMES.to_string())
        .chain(themes)
        .collect()
}

/// Items in `theme` (or all of them) that match `search`.
///
/// A blank search matches everything. Otherwise the term must appear,
/// ignoring case, in the code, requested name or resolved name.
pub fn filter_items<'a>(items: &'a [Item], theme: &str, search: &str) -> Vec<&'a Item> {
    let term = (!search.trim().is_empty()).then(|| search.to_lowercase());

    items
        .iter()
        .filter(|item| theme == ALL_THEMES || derive_category(item) == theme)
        .filter(|item| match &term {
            Some(term) => matches_search(item, term),
            None => true,
        })
        .collect()
}

fn matches_search(item: &Item, term: &str) -> bool {
    [&item.code, &item.requested_name, &item.resolved_name]
        .iter()
        .any(|field| field.to_lowercase().contains(term))
}

/// Items bucketed by theme. Themes are sorted; items keep their order.
pub fn group_by_theme<'a, I>(items: I) -> BTreeMap<String, Vec<&'a Item>>
where
    I: IntoIterator<Item = &'a Item>,
{
    let mut groups: BTreeMap<String, Vec<&'a Item>> = BTreeMap::new();
    for item in items {
        groups.entry(derive_category(item)).or_default().push(item);
    }
    groups
}

/// The thumbnail to show, falling back to a placeholder seeded by code.
pub fn display_image_url(item: &Item) -> String {
    item.image_url
        .clone()
        .filter(|url| !url.is_empty())
        .unwrap_or_else(|| placeholder_image_url(&item.code))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(code: &str, requested_name: &str, resolved_name: &str, category: Option<&str>) -> Item {
        Item {
            code: code.to_string(),
            requested_name: requested_name.to_string(),
            resolved_name: resolved_name.to_string(),
            product_url: String::new(),
            exists: true,
            category: category.map(str::to_string),
            note: None,
            image_url: None,
        }
    }

    fn collection() -> Vec<Item> {
        vec![
            item("75313", "LEGO Set 75313", "AT-AT", Some("Star Wars")),
            item("42115", "LEGO Technic 42115", "Lamborghini Sián", None),
            item("76240", "LEGO batman 76240", "Batmobile Tumbler", None),
            item("10294", "Titanic", "Loading...", None),
            item("75192", "LEGO Set 75192", "Millennium Falcon", Some("Star Wars")),
        ]
    }

    fn codes(items: &[&Item]) -> Vec<String> {
        items.iter().map(|i| i.code.clone()).collect()
    }

    #[test]
    fn test_all_themes_sorted_with_all_first() {
        assert_eq!(
            all_themes(&collection()),
            vec!["All", "Batman", "Star Wars", "Technic", "Uncategorized"]
        );
        assert_eq!(all_themes(&[]), vec!["All"]);
    }

    #[test]
    fn test_filter_by_theme() {
        let items = collection();
        assert_eq!(
            codes(&filter_items(&items, "Star Wars", "")),
            vec!["75313", "75192"]
        );
        assert_eq!(filter_items(&items, ALL_THEMES, "").len(), 5);
        assert!(filter_items(&items, "Ninjago", "").is_empty());
    }

    #[test]
    fn test_search_is_case_insensitive_over_names_and_code() {
        let items = collection();
        assert_eq!(codes(&filter_items(&items, ALL_THEMES, "falcon")), vec!["75192"]);
        assert_eq!(codes(&filter_items(&items, ALL_THEMES, "TECHNIC")), vec!["42115"]);
        assert_eq!(codes(&filter_items(&items, ALL_THEMES, "762")), vec!["76240"]);
        assert_eq!(filter_items(&items, ALL_THEMES, "   ").len(), 5);
    }

    #[test]
    fn test_search_combines_with_theme() {
        let items = collection();
        assert_eq!(codes(&filter_items(&items, "Star Wars", "at-at")), vec!["75313"]);
        assert!(filter_items(&items, "Technic", "falcon").is_empty());
    }

    #[test]
    fn test_group_by_theme() {
        let items = collection();
        let groups = group_by_theme(&items);

        let themes: Vec<&str> = groups.keys().map(String::as_str).collect();
        assert_eq!(themes, vec!["Batman", "Star Wars", "Technic", "Uncategorized"]);
        assert_eq!(codes(&groups["Star Wars"]), vec!["75313", "75192"]);
    }

    #[test]
    fn test_display_image_url() {
        let mut with_image = item("1", "LEGO Set 1", "One", None);
        with_image.image_url = Some("https://cdn.rebrickable.com/media/sets/1-1.jpg".into());
        assert_eq!(
            display_image_url(&with_image),
            "https://cdn.rebrickable.com/media/sets/1-1.jpg"
        );

        let without_image = item("2", "LEGO Set 2", "Two", None);
        assert_eq!(
            display_image_url(&without_image),
            "https://picsum.photos/seed/2/400/300"
        );
    }
}
