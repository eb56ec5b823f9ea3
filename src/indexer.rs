//! Resource indexing for one view folder
//!
//! A view (e.g. "front", or any user-picked folder) arrives as an unordered
//! bag of files. Two lookup structures are derived from it:
//!
//! - a **sequence** sorted by file name with numeric-aware comparison, so
//!   `img_2.png` comes before `img_10.png`. Row `i` of the CSV is paired
//!   with entry `i` of the sequence.
//! - an **id index** keyed by the last run of digits in each file name
//!   (`render_017.png` → 17), used when positional pairing finds nothing.
//!
//! Each file gets exactly one display reference from the
//! [`ResourceRegistry`]; the sequence and the id index share it.

use crate::resource::{ByteSource, ResourceHandle, ResourceRegistry};
use std::cmp::Ordering;
use std::collections::HashMap;

/// One file as delivered by the file-picker collaborator.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Bare file name, e.g. `17.png`.
    pub name: String,
    /// Path relative to the picked folder, including the folder itself
    /// (`Front_view/17.png`), when the picker discloses it.
    pub relative_path: Option<String>,
    pub source: ByteSource,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, source: ByteSource) -> Self {
        Self {
            name: name.into(),
            relative_path: None,
            source,
        }
    }

    pub fn with_relative_path(mut self, path: impl Into<String>) -> Self {
        self.relative_path = Some(path.into());
        self
    }
}

/// All files picked for one configured view.
#[derive(Debug, Clone, Default)]
pub struct ViewFiles {
    pub key: String,
    /// Configured display label, used when no folder name is available.
    pub label: Option<String>,
    pub files: Vec<SourceFile>,
}

impl ViewFiles {
    pub fn new(key: impl Into<String>, files: Vec<SourceFile>) -> Self {
        Self {
            key: key.into(),
            label: None,
            files,
        }
    }

    /// Folder name disclosed by the first file's relative path, if any.
    pub fn folder_label(&self) -> Option<String> {
        self.files.iter().find_map(|f| {
            let path = f.relative_path.as_deref()?;
            let (folder, _) = path.split_once('/')?;
            if folder.is_empty() {
                None
            } else {
                Some(folder.to_string())
            }
        })
    }
}

/// One indexed image of a view.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewResource {
    pub file_name: String,
    /// Where the file lives, for exports and terminal output.
    pub location: String,
    pub handle: ResourceHandle,
}

impl ViewResource {
    pub fn display_ref(&self) -> String {
        self.handle.url()
    }
}

/// Indexer output for a single view.
#[derive(Debug, Clone, Default)]
pub struct ViewIndex {
    pub key: String,
    pub sequence: Vec<ViewResource>,
    pub by_id: HashMap<u64, ViewResource>,
}

impl ViewIndex {
    /// Positional lookup.
    pub fn at(&self, position: usize) -> Option<&ViewResource> {
        self.sequence.get(position)
    }

    /// Id-based lookup.
    pub fn by_id(&self, id: u64) -> Option<&ViewResource> {
        self.by_id.get(&id)
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}

/// Index one view: sort, register a display reference per file, and build
/// the id index. An empty file list yields an empty index.
pub fn index_view(view: &ViewFiles, registry: &mut ResourceRegistry) -> ViewIndex {
    let sequence = build_sequence(&view.files, registry);
    let by_id = build_id_index(&sequence);
    log::debug!(
        "view '{}': {} file(s), {} with a numeric id",
        view.key,
        sequence.len(),
        by_id.len()
    );

    ViewIndex {
        key: view.key.clone(),
        sequence,
        by_id,
    }
}

/// Sort files by name (numeric-aware, ascending) and acquire one display
/// reference per file.
pub fn build_sequence(files: &[SourceFile], registry: &mut ResourceRegistry) -> Vec<ViewResource> {
    let mut sorted: Vec<&SourceFile> = files.iter().collect();
    sorted.sort_by(|a, b| natural_cmp(&a.name, &b.name));

    sorted
        .into_iter()
        .map(|file| ViewResource {
            file_name: file.name.clone(),
            location: file.source.location(&file.name),
            handle: registry.acquire(&file.name, file.source.clone()),
        })
        .collect()
}

/// Map the trailing number of each file name to its resource. Files without
/// any digit are left out.
///
/// The sequence is walked in its sorted order, so when two files carry the
/// same number the one sorting last wins, independent of the order in which
/// the environment enumerated the folder.
pub fn build_id_index(sequence: &[ViewResource]) -> HashMap<u64, ViewResource> {
    let mut by_id = HashMap::new();
    for resource in sequence {
        if let Some(id) = trailing_number(&resource.file_name) {
            if let Some(previous) = by_id.insert(id, resource.clone()) {
                log::debug!(
                    "id {} claimed by both '{}' and '{}', keeping the latter",
                    id,
                    previous.file_name,
                    resource.file_name
                );
            }
        }
    }
    by_id
}

/// Last maximal run of ASCII digits in `name`, parsed as an integer.
///
/// `"img_2.png"` → 2, `"v3_shot_0017.png"` → 17, `"front.png"` → none.
/// Runs too long to fit in a `u64` are treated as absent.
pub fn trailing_number(name: &str) -> Option<u64> {
    let end = name.rfind(|c: char| c.is_ascii_digit())? + 1;
    let start = name[..end]
        .char_indices()
        .rev()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    name[start..end].parse().ok()
}

/// Numeric-aware, case-insensitive file name ordering.
///
/// Names are split into alternating digit and non-digit chunks; digit chunks
/// compare by value, the rest compare case-insensitively. Names that are
/// equal under those rules fall back to plain byte order so the result is a
/// total order.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = chunks(a);
    let mut right = chunks(b);

    loop {
        match (left.next(), right.next()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = compare_chunks(x, y);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

fn chunks(s: &str) -> impl Iterator<Item = &str> {
    let mut rest = s;
    std::iter::from_fn(move || {
        let first = rest.chars().next()?;
        let digits = first.is_ascii_digit();
        let end = rest
            .find(|c: char| c.is_ascii_digit() != digits)
            .unwrap_or(rest.len());
        let (chunk, tail) = rest.split_at(end);
        rest = tail;
        Some(chunk)
    })
}

fn is_digits(chunk: &str) -> bool {
    chunk.bytes().all(|b| b.is_ascii_digit())
}

fn compare_chunks(x: &str, y: &str) -> Ordering {
    if is_digits(x) && is_digits(y) {
        // Compare by magnitude without parsing, so arbitrarily long runs work.
        let x = x.trim_start_matches('0');
        let y = y.trim_start_matches('0');
        x.len().cmp(&y.len()).then_with(|| x.cmp(y))
    } else {
        x.to_lowercase().cmp(&y.to_lowercase())
    }
}
