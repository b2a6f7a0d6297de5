use crate::item::Item;
use lazy_static::lazy_static;
use regex::Regex;

/// Bucket for items whose name gives no hint of a theme.
pub const UNCATEGORIZED: &str = "Uncategorized";

lazy_static! {
    static ref THEME_IN_NAME: Regex = Regex::new(r"^LEGO\s+([^\s(]+)").unwrap();
}

/// The theme an item is filed under.
///
/// Uses the resolved category when there is one, otherwise the first word
/// after "LEGO" in the requested name.
pub fn derive_category(item: &Item) -> String {
    if let Some(category) = item.category.as_deref().filter(|c| !c.is_empty()) {
        return category.to_string();
    }

    match THEME_IN_NAME
        .captures(&item.requested_name)
        .and_then(|captures| captures.get(1))
    {
        Some(token) if token.as_str().eq_ignore_ascii_case("batman") => "Batman".to_string(),
        Some(token) => token.as_str().to_string(),
        None => UNCATEGORIZED.to_string(),
    }
}
