//! Dataset construction
//!
//! Turns parameter rows plus per-view image folders into the canonical list
//! of [`Item`]s, one per row.
//!
//! # Pairing rules
//!
//! For the row at position `i` (0-based) the item gets `id = i + 1`, whatever
//! an ID column may say. For each view the image is resolved by:
//!
//! 1. **Position**: entry `i` of the view's name-sorted sequence.
//! 2. **Id**: the file whose trailing number equals `id`, when the sequence
//!    is too short.
//! 3. Otherwise the empty string, meaning "no image".
//!
//! A missing image is never an error. The builder always emits exactly one
//! item per row.

use crate::config::Config;
use crate::indexer::{index_view, ViewFiles, ViewIndex, ViewResource};
use crate::resource::{ByteSource, ResourceRegistry};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// One raw cell of a parameter row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
    Empty,
    /// Booleans, arrays and objects from JSON input. Never numeric.
    Other(serde_json::Value),
}

impl Cell {
    /// Numeric coercion: trimmed text that parses to a finite number.
    pub fn as_number(&self) -> Option<f64> {
        let n = match self {
            Cell::Number(n) => *n,
            Cell::Text(s) => s.trim().parse::<f64>().ok()?,
            Cell::Empty | Cell::Other(_) => return None,
        };
        n.is_finite().then_some(n)
    }

    /// Non-empty text content, if this cell carries any.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) if !s.trim().is_empty() => Some(s.as_str()),
            _ => None,
        }
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

/// Column name → cell, one per record.
pub type ParameterRow = BTreeMap<String, Cell>;

/// Rows as delivered by the CSV collaborator, with the header list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<ParameterRow>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<ParameterRow>) -> Self {
        Self { headers, rows }
    }

    /// Build a table from rows alone, taking headers in first-seen order.
    pub fn from_rows(rows: Vec<ParameterRow>) -> Self {
        let mut headers: Vec<String> = Vec::new();
        for row in &rows {
            for column in row.keys() {
                if !headers.contains(column) {
                    headers.push(column.clone());
                }
            }
        }
        Self { headers, rows }
    }
}

/// Stable identity of an item within one dataset.
pub fn item_key(row_index: usize, id: u64) -> String {
    format!("{}-{}", row_index, id)
}

/// One design record: numeric parameters plus one image per view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Item {
    pub id: u64,
    pub row_index: usize,
    pub key: String,
    pub params: BTreeMap<String, f64>,
    /// Non-numeric cells, only filled when explicitly requested.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub text: BTreeMap<String, String>,
    /// View key → display reference (empty string when no image was found).
    pub images: BTreeMap<String, String>,
    /// View key → location of the originating file.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub files: BTreeMap<String, String>,
}

impl Item {
    pub fn new(row_index: usize, id: u64) -> Self {
        Self {
            id,
            row_index,
            key: item_key(row_index, id),
            params: BTreeMap::new(),
            text: BTreeMap::new(),
            images: BTreeMap::new(),
            files: BTreeMap::new(),
        }
    }

    pub fn param(&self, name: &str) -> Option<f64> {
        self.params.get(name).copied()
    }

    /// Image shown for `view`: that view's reference, or the first non-empty
    /// image of the item, or empty.
    pub fn image_for(&self, view: &str) -> &str {
        match self.images.get(view) {
            Some(url) if !url.is_empty() => url,
            _ => self
                .images
                .values()
                .find(|url| !url.is_empty())
                .map(String::as_str)
                .unwrap_or(""),
        }
    }

    /// Originating file of the image [`Item::image_for`] picks, if any.
    pub fn file_for(&self, view: &str) -> Option<&str> {
        match self.files.get(view) {
            Some(file) if !file.is_empty() => Some(file),
            _ => self
                .files
                .values()
                .find(|file| !file.is_empty())
                .map(String::as_str),
        }
    }

    pub fn has_image(&self) -> bool {
        self.images.values().any(|url| !url.is_empty())
    }

    /// Label carried by plot points, parsed back by click resolution.
    pub fn label(&self) -> String {
        format!("ID: {}", self.id)
    }

    /// `name: value` lines for the chosen caption parameters.
    pub fn caption(&self, params: &[String]) -> Vec<String> {
        params
            .iter()
            .map(|p| match self.param(p) {
                Some(v) => format!("{}: {}", p, v),
                None => format!("{}: -", p),
            })
            .collect()
    }
}

/// Per-view summary reported with a dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewMeta {
    pub key: String,
    /// Display label: picked folder name, configured label, or `Folder {n}`.
    pub label: String,
    pub files: usize,
    /// Items that ended up with an image for this view.
    pub resolved: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DatasetMeta {
    /// Numeric parameters present in at least one item, header order first.
    pub parameters: Vec<String>,
    pub views: Vec<ViewMeta>,
    pub id_column: Option<String>,
    pub rows: usize,
}

impl DatasetMeta {
    pub fn folder_labels(&self) -> Vec<String> {
        self.views.iter().map(|v| v.label.clone()).collect()
    }

    pub fn view_keys(&self) -> Vec<String> {
        self.views.iter().map(|v| v.key.clone()).collect()
    }

    pub fn has_parameter(&self, name: &str) -> bool {
        self.parameters.iter().any(|p| p == name)
    }
}

/// A fully built dataset. Its display references belong to `generation`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Dataset {
    pub items: Vec<Item>,
    pub meta: DatasetMeta,
    #[serde(skip)]
    pub generation: Option<u32>,
}

impl Dataset {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

/// Index every view and build the items of a freshly loaded dataset.
///
/// All display references are acquired in a new registry generation, recorded
/// in [`Dataset::generation`] so the caller can release them together.
pub fn build_dataset(
    table: &Table,
    views: &[ViewFiles],
    config: &Config,
    registry: &mut ResourceRegistry,
) -> Dataset {
    let generation = registry.begin_generation();
    let indexes: Vec<ViewIndex> = views.iter().map(|v| index_view(v, registry)).collect();
    let id_column = detect_id_column(&table.headers, config.id_column.as_deref());
    let items = build_items(
        &table.rows,
        &indexes,
        id_column.as_deref(),
        config.keep_text_columns,
    );

    let view_meta = views
        .iter()
        .enumerate()
        .map(|(i, view)| ViewMeta {
            key: view.key.clone(),
            label: view
                .folder_label()
                .or_else(|| view.label.clone())
                .unwrap_or_else(|| format!("Folder {}", i + 1)),
            files: view.files.len(),
            resolved: count_resolved(&items, &view.key),
        })
        .collect();

    let meta = DatasetMeta {
        parameters: discover_parameters(&table.headers, &items),
        views: view_meta,
        id_column,
        rows: table.rows.len(),
    };
    log::info!(
        "built {} item(s) with {} parameter(s) across {} view(s)",
        items.len(),
        meta.parameters.len(),
        meta.views.len()
    );

    Dataset {
        items,
        meta,
        generation: Some(generation),
    }
}

/// The Item Builder proper: one item per row, in row order.
pub fn build_items(
    rows: &[ParameterRow],
    views: &[ViewIndex],
    id_column: Option<&str>,
    keep_text: bool,
) -> Vec<Item> {
    rows.iter()
        .enumerate()
        .map(|(row_index, row)| {
            let mut item = Item::new(row_index, row_index as u64 + 1);
            coerce_row(row, id_column, keep_text, &mut item);

            for view in views {
                match resolve_image(view, row_index, item.id) {
                    Some(resource) => {
                        item.images.insert(view.key.clone(), resource.display_ref());
                        item.files.insert(view.key.clone(), resource.location.clone());
                    }
                    None => {
                        item.images.insert(view.key.clone(), String::new());
                    }
                }
            }
            item
        })
        .collect()
}

/// Positional lookup first, id lookup as fallback.
pub fn resolve_image(view: &ViewIndex, row_index: usize, id: u64) -> Option<&ViewResource> {
    if let Some(resource) = view.at(row_index) {
        return Some(resource);
    }
    let by_id = view.by_id(id);
    match by_id {
        Some(resource) => log::debug!(
            "row {} / view '{}': no positional image, matched '{}' by id {}",
            row_index,
            view.key,
            resource.file_name,
            id
        ),
        None => log::debug!("row {} / view '{}': no image", row_index, view.key),
    }
    by_id
}

fn coerce_row(row: &ParameterRow, id_column: Option<&str>, keep_text: bool, item: &mut Item) {
    for (column, cell) in row {
        if Some(column.as_str()) == id_column {
            continue;
        }
        if let Some(n) = cell.as_number() {
            item.params.insert(column.clone(), n);
        } else if keep_text {
            if let Some(text) = cell.as_text() {
                item.text.insert(column.clone(), text.to_string());
            }
        }
    }
}

/// Pick the ID column: the explicit one if the CSV has it, else a header
/// called `id` in any case.
pub fn detect_id_column(headers: &[String], explicit: Option<&str>) -> Option<String> {
    if let Some(explicit) = explicit.map(str::trim).filter(|s| !s.is_empty()) {
        if let Some(found) = headers.iter().find(|h| h.as_str() == explicit) {
            return Some(found.clone());
        }
        log::warn!("ID column '{}' not found in CSV headers", explicit);
    }
    headers.iter().find(|h| h.eq_ignore_ascii_case("id")).cloned()
}

/// Union of numeric parameters across items, in header order, followed by
/// any column missing from the header list.
pub fn discover_parameters(headers: &[String], items: &[Item]) -> Vec<String> {
    let present: BTreeSet<&String> = items.iter().flat_map(|i| i.params.keys()).collect();

    let mut parameters: Vec<String> = headers
        .iter()
        .filter(|h| present.contains(h))
        .cloned()
        .collect();
    for name in present {
        if !parameters.contains(name) {
            parameters.push(name.clone());
        }
    }
    parameters
}

fn count_resolved(items: &[Item], view: &str) -> usize {
    items
        .iter()
        .filter(|i| i.images.get(view).map_or(false, |url| !url.is_empty()))
        .count()
}

/// A record of a prebuilt `data.json` dataset.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PrebuiltRecord {
    #[serde(default)]
    pub params: ParameterRow,
    /// View key → image path relative to the JSON file.
    #[serde(default, alias = "images")]
    pub views: BTreeMap<String, String>,
}

/// Build a dataset from prebuilt records. Ids are renumbered positionally
/// and image paths are registered as display references when the file
/// exists under `base_dir`.
pub fn build_prebuilt(
    records: &[PrebuiltRecord],
    base_dir: &Path,
    config: &Config,
    registry: &mut ResourceRegistry,
) -> Dataset {
    let generation = registry.begin_generation();

    // Configured views first, then whatever else the records name.
    let mut keys: Vec<String> = config
        .views
        .iter()
        .map(|v| v.key.clone())
        .filter(|k| records.iter().any(|r| r.views.contains_key(k)))
        .collect();
    for record in records {
        for key in record.views.keys() {
            if !keys.contains(key) {
                keys.push(key.clone());
            }
        }
    }

    let headers = Table::from_rows(records.iter().map(|r| r.params.clone()).collect()).headers;
    let id_column = detect_id_column(&headers, config.id_column.as_deref());

    let mut items = Vec::with_capacity(records.len());
    for (row_index, record) in records.iter().enumerate() {
        let mut item = Item::new(row_index, row_index as u64 + 1);
        coerce_row(&record.params, id_column.as_deref(), config.keep_text_columns, &mut item);

        for key in &keys {
            let path = record
                .views
                .get(key)
                .filter(|p| !p.is_empty())
                .map(|p| base_dir.join(p))
                .filter(|p| p.is_file());

            match path {
                Some(path) => {
                    let name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    let location = path.display().to_string();
                    let handle = registry.acquire(&name, ByteSource::File(path));
                    item.images.insert(key.clone(), handle.url());
                    item.files.insert(key.clone(), location);
                }
                None => {
                    log::debug!("record {} / view '{}': no image on disk", row_index, key);
                    item.images.insert(key.clone(), String::new());
                }
            }
        }
        items.push(item);
    }

    let views = keys
        .iter()
        .map(|key| ViewMeta {
            key: key.clone(),
            label: config.label_for(key),
            files: records.iter().filter(|r| r.views.contains_key(key)).count(),
            resolved: count_resolved(&items, key),
        })
        .collect();

    let meta = DatasetMeta {
        parameters: discover_parameters(&headers, &items),
        views,
        id_column,
        rows: records.len(),
    };

    Dataset {
        items,
        meta,
        generation: Some(generation),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::SourceFile;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn row(cells: &[(&str, &str)]) -> ParameterRow {
        cells
            .iter()
            .map(|(k, v)| (k.to_string(), Cell::from(*v)))
            .collect()
    }

    fn view(key: &str, names: &[&str]) -> ViewFiles {
        ViewFiles::new(
            key,
            names
                .iter()
                .map(|n| SourceFile::new(*n, ByteSource::Memory(Arc::from(&b""[..]))))
                .collect(),
        )
    }

    fn file_of<'a>(registry: &'a ResourceRegistry, item: &Item, view: &str) -> Option<&'a str> {
        registry
            .resolve_url(&item.images[view])
            .map(|r| r.name.as_str())
    }

    // ==========================================================================
    // NUMERIC COERCION
    // ==========================================================================
    //
    // Only cells that trim and parse to a finite number become parameters.
    // Everything else is silently dropped (or kept as text on request).
    // ==========================================================================

    #[test]
    fn test_cell_as_number() {
        assert_eq!(Cell::from(" 12.5 ").as_number(), Some(12.5));
        assert_eq!(Cell::from("-3").as_number(), Some(-3.0));
        assert_eq!(Cell::from("1e3").as_number(), Some(1000.0));
        assert_eq!(Cell::from(7.0).as_number(), Some(7.0));
        assert_eq!(Cell::from("").as_number(), None);
        assert_eq!(Cell::from("steel").as_number(), None);
        assert_eq!(Cell::from("inf").as_number(), None);
        assert_eq!(Cell::from("NaN").as_number(), None);
        assert_eq!(Cell::Number(f64::NAN).as_number(), None);
        assert_eq!(Cell::Empty.as_number(), None);
        assert_eq!(Cell::Other(serde_json::Value::Bool(true)).as_number(), None);
        assert_eq!(Cell::Other(serde_json::json!([1])).as_text(), None);
    }

    #[test]
    fn test_non_numeric_dropped() {
        let rows = vec![row(&[("mass", "4.2"), ("material", "steel")])];
        let items = build_items(&rows, &[], None, false);

        assert_eq!(items[0].param("mass"), Some(4.2));
        assert!(!items[0].params.contains_key("material"));
        assert!(items[0].text.is_empty());
    }

    #[test]
    fn test_text_kept_on_request() {
        let rows = vec![row(&[("mass", "4.2"), ("material", "steel"), ("note", " ")])];
        let items = build_items(&rows, &[], None, true);

        assert_eq!(items[0].text.get("material").map(String::as_str), Some("steel"));
        assert!(!items[0].text.contains_key("note"));
        assert!(!items[0].text.contains_key("mass"));
    }

    // ==========================================================================
    // IDENTITY
    // ==========================================================================

    #[test]
    fn test_one_item_per_row_without_images() {
        let rows: Vec<ParameterRow> = (0..5).map(|i| row(&[("x", &i.to_string())])).collect();
        let mut registry = ResourceRegistry::new();
        let views = vec![view("front", &[]), view("top", &[])];

        let dataset = build_dataset(&Table::from_rows(rows), &views, &Config::default(), &mut registry);

        assert_eq!(dataset.len(), 5);
        for (i, item) in dataset.items.iter().enumerate() {
            assert_eq!(item.row_index, i);
            assert_eq!(item.id, i as u64 + 1);
            assert!(item.images.values().all(|url| url.is_empty()));
            assert_eq!(item.images.len(), 2);
        }
    }

    #[test]
    fn test_keys_unique() {
        let rows: Vec<ParameterRow> = (0..50).map(|_| row(&[("id", "7")])).collect();
        let items = build_items(&rows, &[], Some("id"), false);

        let keys: HashSet<&str> = items.iter().map(|i| i.key.as_str()).collect();
        assert_eq!(keys.len(), 50);
        assert_eq!(items[3].key, "3-4");
    }

    #[test]
    fn test_id_column_ignored_for_ids_but_excluded() {
        let table = Table::new(
            vec!["ID".to_string(), "x".to_string()],
            vec![row(&[("ID", "42"), ("x", "1")]), row(&[("ID", "17"), ("x", "2")])],
        );
        let mut registry = ResourceRegistry::new();
        let dataset = build_dataset(&table, &[], &Config::default(), &mut registry);

        assert_eq!(dataset.meta.id_column.as_deref(), Some("ID"));
        assert_eq!(dataset.items[0].id, 1);
        assert_eq!(dataset.items[1].id, 2);
        assert!(!dataset.items[0].params.contains_key("ID"));
        assert_eq!(dataset.meta.parameters, vec!["x"]);
    }

    #[test]
    fn test_detect_id_column() {
        let headers = vec!["Design".to_string(), "id".to_string()];
        assert_eq!(detect_id_column(&headers, None).as_deref(), Some("id"));
        assert_eq!(detect_id_column(&headers, Some("Design")).as_deref(), Some("Design"));
        assert_eq!(detect_id_column(&headers, Some("missing")).as_deref(), Some("id"));
        assert_eq!(detect_id_column(&["x".to_string()], None), None);
    }

    #[test]
    fn test_empty_rows_empty_items() {
        let mut registry = ResourceRegistry::new();
        let dataset = build_dataset(&Table::default(), &[view("front", &["1.png"])], &Config::default(), &mut registry);
        assert!(dataset.is_empty());
        assert_eq!(dataset.meta.rows, 0);
    }

    // ==========================================================================
    // IMAGE PAIRING
    // ==========================================================================
    //
    // Position first: row i takes the i-th image by natural filename order.
    // When a view has fewer images than rows, the id parsed from the file
    // name is tried before giving up with an empty reference.
    // ==========================================================================

    #[test]
    fn test_positional_then_id_fallback_then_empty() {
        let rows: Vec<ParameterRow> = (0..3).map(|i| row(&[("x", &i.to_string())])).collect();
        let mut registry = ResourceRegistry::new();
        let views = vec![view("front", &["img_10.png", "img_2.png"])];

        let dataset = build_dataset(&Table::from_rows(rows), &views, &Config::default(), &mut registry);
        let items = &dataset.items;

        assert_eq!(file_of(&registry, &items[0], "front"), Some("img_2.png"));
        assert_eq!(file_of(&registry, &items[1], "front"), Some("img_10.png"));
        // No third image and no file numbered 3.
        assert_eq!(items[2].images["front"], "");
        assert_eq!(dataset.meta.views[0].resolved, 2);
    }

    #[test]
    fn test_id_fallback_hit() {
        let rows: Vec<ParameterRow> = (0..3).map(|i| row(&[("x", &i.to_string())])).collect();
        let mut registry = ResourceRegistry::new();
        let views = vec![view("front", &["shot_3.png", "shot_1.png"])];

        let dataset = build_dataset(&Table::from_rows(rows), &views, &Config::default(), &mut registry);

        assert_eq!(file_of(&registry, &dataset.items[2], "front"), Some("shot_3.png"));
        assert!(dataset.items[2].files["front"].contains("shot_3.png"));
    }

    #[test]
    fn test_views_resolve_independently() {
        let rows: Vec<ParameterRow> = (0..2).map(|i| row(&[("x", &i.to_string())])).collect();
        let mut registry = ResourceRegistry::new();
        let views = vec![view("front", &["1.png", "2.png"]), view("top", &["1.png"])];

        let dataset = build_dataset(&Table::from_rows(rows), &views, &Config::default(), &mut registry);
        let second = &dataset.items[1];

        assert!(!second.images["front"].is_empty());
        assert_eq!(second.images["top"], "");
        assert_eq!(second.image_for("top"), second.images["front"]);
        assert!(second.has_image());
    }

    #[test]
    fn test_handles_in_dataset_generation() {
        let mut registry = ResourceRegistry::new();
        let rows = vec![row(&[("x", "1")])];
        let dataset = build_dataset(&Table::from_rows(rows), &[view("front", &["1.png"])], &Config::default(), &mut registry);

        let generation = dataset.generation.unwrap();
        assert_eq!(registry.release_generation(generation), 1);
        assert!(registry.resolve_url(&dataset.items[0].images["front"]).is_none());
    }

    // ==========================================================================
    // METADATA
    // ==========================================================================

    #[test]
    fn test_parameters_union_in_header_order() {
        let table = Table::new(
            vec!["b".into(), "a".into(), "label".into(), "c".into()],
            vec![
                row(&[("b", "1"), ("a", "x"), ("label", "t")]),
                row(&[("a", "2"), ("c", "3"), ("label", "u")]),
            ],
        );
        let items = build_items(&table.rows, &[], None, false);
        assert_eq!(discover_parameters(&table.headers, &items), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_folder_labels() {
        let mut registry = ResourceRegistry::new();
        let labelled = ViewFiles {
            key: "front".into(),
            label: Some("Front view".into()),
            files: vec![SourceFile::new("1.png", ByteSource::Memory(Arc::from(&b""[..])))
                .with_relative_path("Front_view/1.png")],
        };
        let configured = ViewFiles {
            key: "top".into(),
            label: Some("Top view".into()),
            files: vec![],
        };
        let bare = view("iso", &[]);

        let dataset = build_dataset(
            &Table::from_rows(vec![row(&[("x", "1")])]),
            &[labelled, configured, bare],
            &Config::default(),
            &mut registry,
        );
        assert_eq!(dataset.meta.folder_labels(), vec!["Front_view", "Top view", "Folder 3"]);
    }

    #[test]
    fn test_file_for_falls_back_to_first_image() {
        let mut item = Item::new(0, 1);
        assert_eq!(item.file_for("front"), None);

        item.files.insert("top".into(), "/renders/top/1.png".into());
        assert_eq!(item.file_for("front"), Some("/renders/top/1.png"));

        item.files.insert("front".into(), "/renders/front/1.png".into());
        assert_eq!(item.file_for("front"), Some("/renders/front/1.png"));
    }

    #[test]
    fn test_item_caption_and_label() {
        let mut item = Item::new(0, 1);
        item.params.insert("mass".into(), 12.0);
        item.params.insert("span".into(), 2.5);

        assert_eq!(item.label(), "ID: 1");
        assert_eq!(
            item.caption(&["mass".into(), "span".into(), "cost".into()]),
            vec!["mass: 12", "span: 2.5", "cost: -"]
        );
    }

    // ==========================================================================
    // PREBUILT DATASETS
    // ==========================================================================

    #[test]
    fn test_prebuilt_renumbers_and_resolves_paths() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("Front_view")).unwrap();
        std::fs::write(dir.path().join("Front_view/1.png"), b"png").unwrap();

        let records: Vec<PrebuiltRecord> = serde_json::from_str(
            r#"[
                {"id": 10, "params": {"x": 1.5, "name": "a"}, "views": {"front": "Front_view/1.png", "top": "Top_view/1.png"}},
                {"id": 10, "params": {"x": "2"}, "views": {"front": "Front_view/2.png"}}
            ]"#,
        )
        .unwrap();

        let mut registry = ResourceRegistry::new();
        let dataset = build_prebuilt(&records, dir.path(), &Config::default(), &mut registry);

        assert_eq!(dataset.items[0].id, 1);
        assert_eq!(dataset.items[1].id, 2);
        assert_eq!(dataset.items[1].param("x"), Some(2.0));
        assert_eq!(file_of(&registry, &dataset.items[0], "front"), Some("1.png"));
        assert_eq!(dataset.items[0].images["top"], "");
        assert_eq!(dataset.items[1].images["front"], "");
        assert_eq!(dataset.meta.view_keys(), vec!["front", "top"]);
        assert_eq!(dataset.meta.views[0].label, "Front view");
        assert_eq!(registry.live_count(), 1);
    }
}
