//! Library import, merge and export.
//!
//! Two document shapes are accepted on import: a full library written by
//! [`export_library`], and a bare list of set numbers (`lego_sets`).

mod export;
mod import;
mod merge;

pub use export::{default_export_file_name, export_library, ExportError, LibraryExport, EXPORT_VERSION};
pub use import::{parse_import, ImportDocument, ImportError};
pub use merge::{plan_merge, MergePlan};
