//! Explorer session state
//!
//! A [`Session`] owns the installed dataset, the display references of that
//! dataset, and the user's current query state (filter, sort, selected
//! item, shown view, caption parameters). The CLI and the HTTP server both
//! drive the engines through it; nothing in the core keeps global state.
//!
//! Loading is all-or-nothing: a new dataset is fully built before it
//! replaces the current one, and the previous dataset's display references
//! are released right after the swap. A load that yields no rows leaves the
//! current dataset untouched.

use crate::brush::{resolve_click, select_by_brush, BrushConstraint, BrushSelection, ClickPayload};
use crate::config::Config;
use crate::dataset::{build_dataset, build_prebuilt, Dataset, Item, PrebuiltRecord, Table};
use crate::error::{Error, Result};
use crate::indexer::ViewFiles;
use crate::query::{apply_filter, apply_sort, FilterSpec};
use crate::resource::{Resource, ResourceRegistry};
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// How a filter request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "count")]
pub enum FilterStatus {
    /// No condition was given; the full dataset is shown.
    Inactive,
    /// The filter matched this many items, now displayed.
    Matched(usize),
    /// Nothing matched; the previous display is kept.
    NoResults,
}

/// Shown vs. total counts for the result badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResultCount {
    pub shown: usize,
    pub total: usize,
    pub filtered: bool,
}

impl fmt::Display for ResultCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.filtered {
            write!(f, "{} / {} results", self.shown, self.total)
        } else {
            write!(f, "{} results", self.total)
        }
    }
}

#[derive(Debug, Default)]
pub struct Session {
    config: Config,
    registry: ResourceRegistry,
    dataset: Option<Dataset>,
    /// Filtered and/or sorted view of the dataset, when one is active.
    displayed: Option<Vec<Item>>,
    filter: FilterSpec,
    sort: Option<String>,
    no_results: bool,
    selected: Option<Item>,
    view: Option<String>,
    captions: Vec<String>,
}

impl Session {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    /// Build a dataset from CSV rows and view folders and install it.
    pub fn load(&mut self, table: &Table, views: &[ViewFiles]) -> Result<&Dataset> {
        let dataset = build_dataset(table, views, &self.config, &mut self.registry);
        self.install(dataset)
    }

    /// Install a prebuilt `data.json` dataset whose image paths are relative
    /// to `base_dir`.
    pub fn load_prebuilt(&mut self, records: &[PrebuiltRecord], base_dir: &Path) -> Result<&Dataset> {
        let dataset = build_prebuilt(records, base_dir, &self.config, &mut self.registry);
        self.install(dataset)
    }

    fn install(&mut self, dataset: Dataset) -> Result<&Dataset> {
        if dataset.is_empty() {
            if let Some(generation) = dataset.generation {
                self.registry.release_generation(generation);
            }
            log::warn!("dataset has no rows, keeping the current one");
            return Err(Error::EmptyDataset);
        }

        let previous = self.dataset.replace(dataset);
        if let Some(generation) = previous.and_then(|d| d.generation) {
            self.registry.release_generation(generation);
        }

        self.clear_query();
        self.view = self.dataset.as_ref().and_then(|d| d.meta.views.first()).map(|v| v.key.clone());
        self.captions
            .retain(|c| self.dataset.as_ref().map_or(false, |d| d.meta.has_parameter(c)));

        let dataset = self.dataset.as_ref().ok_or(Error::EmptyDataset)?;
        log::info!("installed dataset with {} item(s)", dataset.len());
        Ok(dataset)
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    /// Every item of the installed dataset.
    pub fn items(&self) -> &[Item] {
        self.dataset.as_ref().map_or(&[], |d| d.items.as_slice())
    }

    pub fn parameters(&self) -> &[String] {
        self.dataset.as_ref().map_or(&[], |d| d.meta.parameters.as_slice())
    }

    /// Items currently shown: the filtered/sorted list when one is active,
    /// otherwise the whole dataset.
    pub fn displayed(&self) -> &[Item] {
        match &self.displayed {
            Some(items) => items,
            None => self.items(),
        }
    }

    pub fn is_filtered(&self) -> bool {
        self.displayed.is_some()
    }

    pub fn count(&self) -> ResultCount {
        ResultCount {
            shown: self.displayed().len(),
            total: self.items().len(),
            filtered: self.is_filtered(),
        }
    }

    // ------------------------------------------------------------------
    // Query
    // ------------------------------------------------------------------

    /// Filter the full dataset. On zero matches the current display is kept
    /// and [`FilterStatus::NoResults`] is returned.
    pub fn apply_filter(&mut self, spec: FilterSpec) -> FilterStatus {
        if !spec.is_active() {
            self.filter = spec;
            self.displayed = None;
            self.sort = None;
            self.no_results = false;
            return FilterStatus::Inactive;
        }

        let result = apply_filter(self.items(), &spec);
        if result.is_empty {
            self.no_results = true;
            return FilterStatus::NoResults;
        }

        let count = result.items.len();
        self.filter = spec;
        self.displayed = Some(result.items);
        self.sort = None;
        self.no_results = false;
        FilterStatus::Matched(count)
    }

    /// Sort what is displayed (the full dataset when nothing is filtered).
    /// A blank parameter is ignored.
    pub fn apply_sort(&mut self, parameter: &str) {
        let parameter = parameter.trim();
        if parameter.is_empty() {
            return;
        }
        let sorted = apply_sort(self.displayed(), parameter);
        self.displayed = Some(sorted);
        self.sort = Some(parameter.to_string());
    }

    /// Drop filter, sort, no-results flag and selection.
    pub fn reset(&mut self) {
        self.clear_query();
    }

    fn clear_query(&mut self) {
        self.displayed = None;
        self.filter = FilterSpec::default();
        self.sort = None;
        self.no_results = false;
        self.selected = None;
    }

    pub fn filter(&self) -> &FilterSpec {
        &self.filter
    }

    pub fn sort(&self) -> Option<&str> {
        self.sort.as_deref()
    }

    /// True after a filter matched nothing, until the next successful query.
    pub fn no_results(&self) -> bool {
        self.no_results
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    /// Brush the displayed items. When exactly one item remains it becomes
    /// the selected item.
    pub fn brush(&mut self, constraints: &[BrushConstraint]) -> BrushSelection {
        let selection = select_by_brush(self.displayed(), constraints);
        if let Some(index) = selection.single() {
            self.selected = self.displayed().get(index).cloned();
        }
        selection
    }

    /// The item a brush collapsed to: set only when exactly one displayed
    /// item matched. An earlier click or gallery selection is not reported.
    pub fn brushed(&self, selection: &BrushSelection) -> Option<&Item> {
        selection.single().and_then(|index| self.displayed().get(index))
    }

    /// Resolve a plot click against the displayed items. Ignored while an
    /// item is already selected.
    pub fn click(&mut self, payload: &ClickPayload) -> Option<&Item> {
        if self.selected.is_some() {
            return None;
        }
        self.selected = resolve_click(payload, self.displayed()).cloned();
        self.selected.as_ref()
    }

    /// Select an item by its key (gallery click).
    pub fn select(&mut self, key: &str) -> Option<&Item> {
        self.selected = self.items().iter().find(|i| i.key == key).cloned();
        self.selected.as_ref()
    }

    pub fn selected(&self) -> Option<&Item> {
        self.selected.as_ref()
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    // ------------------------------------------------------------------
    // Presentation
    // ------------------------------------------------------------------

    pub fn view(&self) -> Option<&str> {
        self.view.as_deref()
    }

    pub fn set_view(&mut self, key: &str) -> Result<()> {
        let known = self
            .dataset
            .as_ref()
            .map_or(false, |d| d.meta.views.iter().any(|v| v.key == key));
        if !known {
            return Err(Error::UnknownView(key.to_string()));
        }
        self.view = Some(key.to_string());
        Ok(())
    }

    pub fn captions(&self) -> &[String] {
        &self.captions
    }

    /// Choose caption parameters; unknown names are dropped.
    pub fn set_captions(&mut self, params: Vec<String>) {
        let captions = params
            .into_iter()
            .filter(|p| self.parameters().contains(p))
            .collect();
        self.captions = captions;
    }

    /// Look up a live display reference.
    pub fn resource(&self, url: &str) -> Option<&Resource> {
        self.registry.resolve_url(url)
    }

    pub fn live_resources(&self) -> usize {
        self.registry.live_count()
    }
}
