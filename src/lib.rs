//! Morpho - Explore parametric design datasets
//!
//! Morpho pairs a table of design parameters (one CSV row per design) with
//! folders of rendered images (one folder per camera view) and lets you
//! narrow the set down: filter on numeric conditions, sort, brush ranges on
//! parallel coordinates, click points on scatter plots.
//!
//! # Overview
//!
//! Loading turns raw rows and image files into [`Item`]s:
//!
//! 1. **Indexing**: each view folder is sorted in natural order
//!    (`2.png` before `10.png`) and indexed by the last number in each file
//!    name. Every file gets a revocable display reference (`/res/{gen}/{slot}`).
//!
//! 2. **Pairing**: row `i` becomes item `i + 1`. Its image for a view is the
//!    file at position `i` in that view, else the file whose name carries
//!    the item's id, else nothing.
//!
//! 3. **Querying**: filters AND every condition and fail closed on missing
//!    values; brushes OR ranges within a parameter and AND across
//!    parameters.
//!
//! # Quick Start
//!
//! ```no_run
//! use morpho::{ingest, Condition, Config, FilterSpec, Operator, Session};
//!
//! let mut session = Session::new(Config::default());
//! let table = ingest::read_csv_file("designs.csv")?;
//! let views = ingest::scan_views(
//!     &[("front".to_string(), "renders/front".into())],
//!     session.config(),
//! )?;
//! session.load(&table, &views)?;
//!
//! let spec = FilterSpec::new().with(Condition::new("mass", Operator::Le, 12.5));
//! session.apply_filter(spec);
//! session.apply_sort("span");
//!
//! for item in session.displayed() {
//!     println!("{} {}", item.label(), item.image_for("front"));
//! }
//! # Ok::<(), morpho::Error>(())
//! ```
//!
//! # Modules
//!
//! - [`resource`]: display references and their generations
//! - [`indexer`]: natural sort and id index per view
//! - [`dataset`]: items, metadata and the item builder
//! - [`query`]: filter and sort
//! - [`brush`]: brush ranges and click resolution
//! - [`session`]: the explorer state driving all of the above
//! - [`report`]: output formatters (JSON, CSV, HTML)
//! - [`serve`]: local web UI

pub mod brush;
pub mod config;
pub mod dataset;
pub mod error;
pub mod indexer;
pub mod ingest;
pub mod plot;
pub mod query;
pub mod report;
pub mod resource;
pub mod serve;
pub mod session;

pub use brush::{BrushConstraint, BrushRange, BrushSelection, ClickPayload};
pub use config::{Config, ViewSpec};
pub use dataset::{Cell, Dataset, DatasetMeta, Item, ParameterRow, Table};
pub use error::{Error, Result};
pub use query::{Condition, FilterSpec, Filtered, Operator};
pub use resource::{ResourceHandle, ResourceRegistry};
pub use session::{FilterStatus, ResultCount, Session};
