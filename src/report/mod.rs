//! Export of explored items
//!
//! Output formatters for the items currently displayed:
//!
//! - **JSON**: `data.json`-shaped records, loadable again as a prebuilt dataset
//! - **CSV**: one row per item with parameters and image files
//! - **HTML**: static gallery with a parallel-coordinates overview
//!
//! # Usage
//!
//! ```ignore
//! use morpho::report;
//!
//! // Picks the format from the extension
//! report::generate("designs.html", session.displayed(), &meta, &[])?;
//! report::generate("designs.json", session.displayed(), &meta, &[])?;
//! report::generate("designs.csv", session.displayed(), &meta, &[])?;
//! ```

pub mod csv;
pub mod html;
pub mod json;

use crate::dataset::{DatasetMeta, Item};
use crate::error::{Error, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write a report, choosing the format from the file extension (CSV when
/// unknown).
pub fn generate<P: AsRef<Path>>(
    path: P,
    items: &[Item],
    meta: &DatasetMeta,
    captions: &[String],
) -> Result<()> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let file = std::fs::File::create(path).map_err(|e| Error::io(path, e))?;
    let mut writer = BufWriter::new(file);

    let written = match ext.as_str() {
        "html" | "htm" => html::write(&mut writer, items, meta, captions),
        "json" => json::write(&mut writer, items, meta),
        _ => csv::write(&mut writer, items, meta),
    };
    written.map_err(|e| Error::io(path, e))?;

    writer.flush().map_err(|e| Error::io(path, e))
}

/// Image coverage statistics for a set of items.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub total: usize,
    /// Items with an image in every view.
    pub complete: usize,
    /// Items without any image.
    pub no_image: usize,
    /// View key → items with an image in that view.
    pub per_view: BTreeMap<String, usize>,
}

impl Summary {
    pub fn from_items(items: &[Item], meta: &DatasetMeta) -> Self {
        let mut summary = Self {
            total: items.len(),
            ..Self::default()
        };
        for view in &meta.views {
            summary.per_view.insert(view.key.clone(), 0);
        }

        for item in items {
            let mut resolved = 0;
            for (view, url) in &item.images {
                if !url.is_empty() {
                    resolved += 1;
                    *summary.per_view.entry(view.clone()).or_insert(0) += 1;
                }
            }
            if resolved == 0 {
                summary.no_image += 1;
            }
            if resolved == meta.views.len() {
                summary.complete += 1;
            }
        }

        summary
    }
}
