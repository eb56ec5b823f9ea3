//! Explorer configuration
//!
//! Loaded from an optional JSON file; command line flags override it.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A configured image view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewSpec {
    pub key: String,
    pub label: String,
}

impl ViewSpec {
    pub fn new(key: &str, label: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub views: Vec<ViewSpec>,
    /// Lower-case extensions picked up by the folder scan.
    pub image_extensions: Vec<String>,
    /// Keep non-numeric cells in each item's `text` map.
    pub keep_text_columns: bool,
    /// Column holding record ids. When unset, a column named `id` (any
    /// case) is detected. The column is reported and left out of the
    /// parameters; item ids stay positional.
    pub id_column: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            views: vec![
                ViewSpec::new("front", "Front view"),
                ViewSpec::new("top", "Top view"),
                ViewSpec::new("iso", "Isometric view"),
                ViewSpec::new("deformation", "Truss deformation"),
            ],
            image_extensions: ["png", "jpg", "jpeg", "gif", "webp", "bmp", "svg"]
                .iter()
                .map(|e| e.to_string())
                .collect(),
            keep_text_columns: false,
            id_column: None,
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let config = serde_json::from_str(&text)?;
        log::debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn view(&self, key: &str) -> Option<&ViewSpec> {
        self.views.iter().find(|v| v.key == key)
    }

    /// Label for `key`: the configured one, else the key itself.
    pub fn label_for(&self, key: &str) -> String {
        self.view(key)
            .map(|v| v.label.clone())
            .unwrap_or_else(|| key.to_string())
    }

    pub fn accepts_extension(&self, ext: &str) -> bool {
        let ext = ext.to_ascii_lowercase();
        self.image_extensions.iter().any(|e| *e == ext)
    }
}
