//! Input collaborators: CSV rows and image folders
//!
//! The engine consumes ready-made rows and file lists. This module produces
//! them from disk: the CSV reader trims header names and skips rows whose
//! cells are all empty, and the folder scan walks a directory tree for image
//! files the way a browser folder picker would (recursively, with the picked
//! folder's name as the first component of each relative path).

use crate::config::{Config, ViewSpec};
use crate::dataset::{Cell, ParameterRow, Table};
use crate::error::{Error, Result};
use crate::indexer::{SourceFile, ViewFiles};
use crate::resource::ByteSource;
use crate::session::Session;
use rayon::prelude::*;
use std::io::Read;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Read CSV text with a header row.
pub fn read_csv<R: Read>(reader: R) -> Result<Table> {
    let mut csv = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = csv.headers()?.iter().map(|h| h.trim().to_string()).collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(Error::MissingHeaders);
    }

    let mut rows = Vec::new();
    for record in csv.records() {
        let record = record?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }

        let row: ParameterRow = headers
            .iter()
            .zip(record.iter())
            .filter(|(header, _)| !header.is_empty())
            .map(|(header, cell)| (header.clone(), Cell::from(cell)))
            .collect();
        rows.push(row);
    }

    log::debug!("read {} row(s) with {} column(s)", rows.len(), headers.len());
    Ok(Table::new(headers, rows))
}

pub fn read_csv_file<P: AsRef<Path>>(path: P) -> Result<Table> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|e| Error::io(path, e))?;
    read_csv(file)
}

/// Collect the image files below `dir`.
pub fn scan_folder(dir: &Path, config: &Config) -> Result<Vec<SourceFile>> {
    if !dir.is_dir() {
        return Err(Error::io(
            dir,
            std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
        ));
    }
    let folder = dir
        .canonicalize()
        .unwrap_or_else(|_| dir.to_path_buf())
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let files: Vec<SourceFile> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| config.accepts_extension(ext))
                .unwrap_or(false)
        })
        .map(|e| {
            let name = e.file_name().to_string_lossy().into_owned();
            let relative = e
                .path()
                .strip_prefix(dir)
                .map(|p| p.to_string_lossy().replace('\\', "/"))
                .unwrap_or_else(|_| name.clone());
            let file = SourceFile::new(name, ByteSource::File(e.path().to_path_buf()));
            if folder.is_empty() {
                file
            } else {
                file.with_relative_path(format!("{}/{}", folder, relative))
            }
        })
        .collect();

    log::debug!("{}: {} image file(s)", dir.display(), files.len());
    Ok(files)
}

/// Parse a `key=folder` command line argument.
pub fn parse_view_arg(arg: &str) -> Result<(String, PathBuf)> {
    let (key, dir) = arg
        .split_once('=')
        .ok_or_else(|| Error::InvalidView(arg.to_string()))?;
    let key = key.trim();
    if key.is_empty() || dir.trim().is_empty() {
        return Err(Error::InvalidView(arg.to_string()));
    }
    Ok((key.to_string(), PathBuf::from(dir.trim())))
}

/// Scan every view folder in parallel. Output order follows `views`.
///
/// Views named in the configuration get its label; unknown keys are
/// accepted as ad-hoc user folders.
pub fn scan_views(views: &[(String, PathBuf)], config: &Config) -> Result<Vec<ViewFiles>> {
    let mut seen: Vec<&str> = Vec::new();
    for (key, _) in views {
        if seen.contains(&key.as_str()) {
            return Err(Error::InvalidView(format!("{} (given twice)", key)));
        }
        seen.push(key);
    }

    views
        .par_iter()
        .map(|(key, dir)| {
            let files = scan_folder(dir, config)?;
            Ok(ViewFiles {
                key: key.clone(),
                label: config.view(key).map(|v: &ViewSpec| v.label.clone()),
                files,
            })
        })
        .collect()
}

/// Where a dataset comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    /// CSV rows plus `(key, folder)` image views.
    Csv {
        path: PathBuf,
        views: Vec<(String, PathBuf)>,
    },
    /// A prebuilt `data.json`; its image paths are relative to its folder.
    Prebuilt(PathBuf),
}

/// Read `source` and install it into `session`. Returns the item count.
///
/// Any failure leaves the session's current dataset in place.
pub fn load(session: &mut Session, source: &Source) -> Result<usize> {
    match source {
        Source::Csv { path, views } => {
            let table = read_csv_file(path)?;
            let views = scan_views(views, session.config())?;
            Ok(session.load(&table, &views)?.len())
        }
        Source::Prebuilt(path) => {
            let records = crate::report::json::read(path)?;
            let base = path.parent().unwrap_or_else(|| Path::new("."));
            Ok(session.load_prebuilt(&records, base)?.len())
        }
    }
}
