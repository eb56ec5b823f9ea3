//! JSON export and prebuilt dataset loading

use crate::dataset::{DatasetMeta, Item, PrebuiltRecord};
use crate::error::{Error, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::Path;

#[derive(Serialize)]
struct Record<'a> {
    id: u64,
    key: &'a str,
    params: &'a BTreeMap<String, f64>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    text: &'a BTreeMap<String, String>,
    /// View key → image file, empty when the item has none.
    views: BTreeMap<&'a str, &'a str>,
}

pub fn write<W: Write>(writer: &mut W, items: &[Item], meta: &DatasetMeta) -> io::Result<()> {
    let records: Vec<Record> = items
        .iter()
        .map(|item| Record {
            id: item.id,
            key: &item.key,
            params: &item.params,
            text: &item.text,
            views: meta
                .views
                .iter()
                .map(|v| {
                    let file = item.files.get(&v.key).map(String::as_str).unwrap_or("");
                    (v.key.as_str(), file)
                })
                .collect(),
        })
        .collect();

    serde_json::to_writer_pretty(&mut *writer, &records)?;
    writeln!(writer)
}

/// Parse prebuilt records (`[{id, params, views}]`).
pub fn read<P: AsRef<Path>>(path: P) -> Result<Vec<PrebuiltRecord>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    Ok(serde_json::from_str(&text)?)
}
