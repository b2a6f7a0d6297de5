//! Response bodies returned by the catalog API.
//!
//! Only the fields the tracker uses are modelled; every one of them may be
//! missing or null.

use serde::Deserialize;

/// `GET /sets/{key}/`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SetRecord {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub theme_id: Option<i64>,
    #[serde(default)]
    pub set_img_url: Option<String>,
    #[serde(default)]
    pub set_url: Option<String>,
}

/// `GET /themes/{id}/`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ThemeRecord {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub parent_id: Option<i64>,
}
