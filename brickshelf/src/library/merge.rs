use crate::item::Item;
use std::collections::HashSet;

/// Result of comparing an import against the current collection.
#[derive(Debug, Clone, PartialEq)]
pub struct MergePlan {
    /// Imported items whose code is not in the collection yet, in file order.
    pub new_items: Vec<Item>,
    /// Imported entries skipped because their code was already known.
    pub duplicate_count: usize,
}

impl MergePlan {
    pub fn is_empty(&self) -> bool {
        self.new_items.is_empty()
    }
}

/// Splits `imported` into new items and duplicates of `existing`.
///
/// A code repeated within `imported` counts once; later repeats are
/// duplicates.
pub fn plan_merge(existing: &[Item], imported: Vec<Item>) -> MergePlan {
    let mut known: HashSet<String> = existing.iter().map(|item| item.code.clone()).collect();
    let imported_count = imported.len();

    let new_items: Vec<Item> = imported
        .into_iter()
        .filter(|item| known.insert(item.code.clone()))
        .collect();

    MergePlan {
        duplicate_count: imported_count - new_items.len(),
        new_items,
    }
}
