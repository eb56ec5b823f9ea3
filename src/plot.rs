//! Chart payloads for the presentation layer
//!
//! Rendering is left to a charting library in the browser; this module only
//! shapes the displayed items into the series it consumes. Every point
//! carries the item's `"ID: {id}"` label so clicks can be mapped back with
//! [`crate::brush::resolve_click`].

use crate::dataset::Item;
use serde::{Deserialize, Serialize};

/// Axis choices for the three chart kinds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlotAxes {
    pub x: Option<String>,
    pub y: Option<String>,
    pub z: Option<String>,
    #[serde(default)]
    pub dims: Vec<String>,
}

impl PlotAxes {
    /// x = first parameter, y = second (or first), z = third (or first);
    /// parallel coordinates start with two or three parameters.
    pub fn defaults(parameters: &[String]) -> Self {
        let nth = |n: usize| parameters.get(n).or_else(|| parameters.first()).cloned();
        let dims = parameters.len().min(3).max(2).min(parameters.len());

        Self {
            x: nth(0),
            y: nth(1),
            z: nth(2),
            dims: parameters[..dims].to_vec(),
        }
    }

    /// Fill unset axes from the defaults, dropping unknown parameter names.
    pub fn resolve(self, parameters: &[String]) -> Self {
        let defaults = Self::defaults(parameters);
        let known = |name: Option<String>| name.filter(|n| parameters.contains(n));
        let dims: Vec<String> = self
            .dims
            .into_iter()
            .filter(|d| parameters.contains(d))
            .collect();

        Self {
            x: known(self.x).or(defaults.x),
            y: known(self.y).or(defaults.y),
            z: known(self.z).or(defaults.z),
            dims: if dims.len() < 2 { defaults.dims } else { dims },
        }
    }
}

/// A 2D or 3D scatter series. Missing values are `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Scatter {
    pub x: Vec<Option<f64>>,
    pub y: Vec<Option<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z: Option<Vec<Option<f64>>>,
    pub text: Vec<String>,
    pub keys: Vec<String>,
}

/// One parallel-coordinates axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dimension {
    pub label: String,
    pub values: Vec<Option<f64>>,
    /// `[min, max]` of the present values; `None` when there are none.
    pub range: Option<[f64; 2]>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlotPayload {
    pub axes: PlotAxes,
    pub scatter: Option<Scatter>,
    pub scatter3d: Option<Scatter>,
    pub parallel: Vec<Dimension>,
}

fn column(items: &[Item], parameter: &str) -> Vec<Option<f64>> {
    items.iter().map(|i| i.param(parameter)).collect()
}

pub fn scatter(items: &[Item], x: &str, y: &str) -> Scatter {
    Scatter {
        x: column(items, x),
        y: column(items, y),
        z: None,
        text: items.iter().map(Item::label).collect(),
        keys: items.iter().map(|i| i.key.clone()).collect(),
    }
}

pub fn scatter3d(items: &[Item], x: &str, y: &str, z: &str) -> Scatter {
    Scatter {
        z: Some(column(items, z)),
        ..scatter(items, x, y)
    }
}

pub fn parallel(items: &[Item], dims: &[String]) -> Vec<Dimension> {
    dims.iter()
        .map(|label| {
            let values = column(items, label);
            let range = values.iter().flatten().fold(None, |acc: Option<[f64; 2]>, &v| {
                Some(match acc {
                    Some([lo, hi]) => [lo.min(v), hi.max(v)],
                    None => [v, v],
                })
            });
            Dimension {
                label: label.clone(),
                values,
                range,
            }
        })
        .collect()
}

/// Everything the visualisation panel needs in one go.
pub fn build(items: &[Item], parameters: &[String], axes: PlotAxes) -> PlotPayload {
    let axes = axes.resolve(parameters);
    let scatter_2d = match (&axes.x, &axes.y) {
        (Some(x), Some(y)) => Some(scatter(items, x, y)),
        _ => None,
    };
    let scatter_3d = match (&axes.x, &axes.y, &axes.z) {
        (Some(x), Some(y), Some(z)) => Some(scatter3d(items, x, y, z)),
        _ => None,
    };

    PlotPayload {
        parallel: parallel(items, &axes.dims),
        scatter: scatter_2d,
        scatter3d: scatter_3d,
        axes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn item(id: u64, params: &[(&str, f64)]) -> Item {
        let mut item = Item::new(id as usize - 1, id);
        for (k, v) in params {
            item.params.insert(k.to_string(), *v);
        }
        item
    }

    #[test]
    fn test_default_axes() {
        let axes = PlotAxes::defaults(&names(&["a", "b", "c", "d"]));
        assert_eq!(axes.x.as_deref(), Some("a"));
        assert_eq!(axes.y.as_deref(), Some("b"));
        assert_eq!(axes.z.as_deref(), Some("c"));
        assert_eq!(axes.dims, names(&["a", "b", "c"]));
    }

    #[test]
    fn test_default_axes_few_parameters() {
        let one = PlotAxes::defaults(&names(&["a"]));
        assert_eq!(one.y.as_deref(), Some("a"));
        assert_eq!(one.z.as_deref(), Some("a"));
        assert_eq!(one.dims, names(&["a"]));

        let none = PlotAxes::defaults(&[]);
        assert_eq!(none.x, None);
        assert!(none.dims.is_empty());
    }

    #[test]
    fn test_resolve_drops_unknown() {
        let params = names(&["a", "b", "c"]);
        let axes = PlotAxes {
            x: Some("c".into()),
            y: Some("zzz".into()),
            z: None,
            dims: names(&["b", "zzz"]),
        }
        .resolve(&params);

        assert_eq!(axes.x.as_deref(), Some("c"));
        assert_eq!(axes.y.as_deref(), Some("b"));
        assert_eq!(axes.dims, names(&["a", "b", "c"]));
    }

    #[test]
    fn test_scatter_labels_match_click_format() {
        let items = vec![item(3, &[("a", 1.0), ("b", 2.0)]), item(4, &[("a", 5.0)])];
        let series = scatter(&items, "a", "b");

        assert_eq!(series.text, vec!["ID: 3", "ID: 4"]);
        assert_eq!(series.y, vec![Some(2.0), None]);
        assert_eq!(
            crate::brush::parse_id_label(&series.text[1]),
            Some(4)
        );
    }

    #[test]
    fn test_parallel_ranges() {
        let items = vec![
            item(1, &[("a", 3.0)]),
            item(2, &[("a", -1.0)]),
            item(3, &[]),
        ];
        let dims = parallel(&items, &names(&["a", "b"]));

        assert_eq!(dims[0].range, Some([-1.0, 3.0]));
        assert_eq!(dims[0].values, vec![Some(3.0), Some(-1.0), None]);
        assert_eq!(dims[1].range, None);
    }

    #[test]
    fn test_build_payload() {
        let items = vec![item(1, &[("a", 1.0), ("b", 2.0)])];
        let payload = build(&items, &names(&["a", "b"]), PlotAxes::default());

        assert!(payload.scatter.is_some());
        assert_eq!(payload.scatter3d.as_ref().unwrap().z, Some(vec![Some(1.0)]));
        assert_eq!(payload.parallel.len(), 2);
    }
}
