//! Cross-view selection
//!
//! Maps interactions on the plots back to items:
//!
//! - **Brushing** on a parallel-coordinates plot leaves one range (or
//!   several disjoint ranges) per axis. An item is selected when, on every
//!   constrained axis, its value lies in at least one of that axis' ranges.
//!   Union within an axis, intersection across axes.
//! - **Clicking** a scatter point yields either the point text (`"ID: 17"`)
//!   or the point's position in the displayed sequence.

use crate::dataset::Item;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Ranges drawn on one axis. Bounds are inclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BrushRange {
    Single([f64; 2]),
    Multi(Vec<[f64; 2]>),
}

impl BrushRange {
    pub fn contains(&self, value: f64) -> bool {
        match self {
            BrushRange::Single(range) => in_range(range, value),
            BrushRange::Multi(ranges) => ranges.iter().any(|r| in_range(r, value)),
        }
    }

    /// A range list with no band constrains nothing.
    pub fn is_unconstrained(&self) -> bool {
        matches!(self, BrushRange::Multi(ranges) if ranges.is_empty())
    }
}

fn in_range(range: &[f64; 2], value: f64) -> bool {
    let (low, high) = if range[0] <= range[1] {
        (range[0], range[1])
    } else {
        (range[1], range[0])
    };
    value >= low && value <= high
}

/// The brush state of one axis. `range: None` means the axis is not brushed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrushConstraint {
    pub parameter: String,
    #[serde(default, alias = "constraintrange")]
    pub range: Option<BrushRange>,
}

impl BrushConstraint {
    pub fn new(parameter: &str, range: BrushRange) -> Self {
        Self {
            parameter: parameter.to_string(),
            range: Some(range),
        }
    }

    pub fn single(parameter: &str, low: f64, high: f64) -> Self {
        Self::new(parameter, BrushRange::Single([low, high]))
    }

    pub fn is_active(&self) -> bool {
        self.range.as_ref().map_or(false, |r| !r.is_unconstrained())
    }

    /// Items lacking the parameter never fall inside a band.
    pub fn admits(&self, item: &Item) -> bool {
        match &self.range {
            Some(range) if !range.is_unconstrained() => {
                item.param(&self.parameter).map_or(false, |v| range.contains(v))
            }
            _ => true,
        }
    }
}

impl FromStr for BrushConstraint {
    type Err = Error;

    /// Parse `name=low:high` or `name=low:high;low:high`.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidBrush(s.to_string());
        let (parameter, bands) = s.split_once('=').ok_or_else(invalid)?;
        let parameter = parameter.trim();
        if parameter.is_empty() {
            return Err(invalid());
        }

        let mut ranges = Vec::new();
        for band in bands.split(';').filter(|b| !b.trim().is_empty()) {
            let (low, high) = band.split_once(':').ok_or_else(invalid)?;
            let low: f64 = low.trim().parse().map_err(|_| invalid())?;
            let high: f64 = high.trim().parse().map_err(|_| invalid())?;
            ranges.push([low, high]);
        }

        let range = match ranges.len() {
            0 => return Err(invalid()),
            1 => BrushRange::Single(ranges[0]),
            _ => BrushRange::Multi(ranges),
        };
        Ok(BrushConstraint::new(parameter, range))
    }
}

/// Result of [`select_by_brush`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BrushSelection {
    /// Positions (in the brushed sequence) of the matching items.
    pub indices: Vec<usize>,
}

impl BrushSelection {
    /// The one matching position when the brush isolates exactly one item.
    pub fn single(&self) -> Option<usize> {
        match self.indices.as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Positions of the items admitted by every active constraint. With no
/// active constraint, every position is selected.
pub fn select_by_brush(items: &[Item], constraints: &[BrushConstraint]) -> BrushSelection {
    let active: Vec<&BrushConstraint> = constraints.iter().filter(|c| c.is_active()).collect();
    let indices = items
        .iter()
        .enumerate()
        .filter(|(_, item)| active.iter().all(|c| c.admits(item)))
        .map(|(i, _)| i)
        .collect();
    BrushSelection { indices }
}

/// What the plot layer reports for a clicked point.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClickPayload {
    /// Point text, expected to contain `ID: {id}`.
    #[serde(default)]
    pub text: Option<String>,
    /// Position of the point in the displayed sequence.
    #[serde(default, alias = "pointNumber")]
    pub point_number: Option<usize>,
}

impl ClickPayload {
    pub fn with_text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            point_number: None,
        }
    }

    pub fn at(point_number: usize) -> Self {
        Self {
            text: None,
            point_number: Some(point_number),
        }
    }
}

/// Extract the id from a label such as `"ID: 17"` or `"ID: 17<br>mass: 3"`.
pub fn parse_id_label(text: &str) -> Option<u64> {
    let start = text.find("ID: ")? + "ID: ".len();
    let digits: &str = &text[start..];
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse().ok()
}

/// Resolve a click to an item of the displayed sequence.
///
/// The embedded id wins; the raw position is only used when the text holds
/// no id or the id matches nothing. Never fails: an unmatched click is `None`.
pub fn resolve_click<'a>(payload: &ClickPayload, items: &'a [Item]) -> Option<&'a Item> {
    let by_id = payload
        .text
        .as_deref()
        .and_then(parse_id_label)
        .and_then(|id| items.iter().find(|item| item.id == id));

    by_id.or_else(|| payload.point_number.and_then(|n| items.get(n)))
}
