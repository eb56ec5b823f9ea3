//! Filter and sort over items
//!
//! A [`FilterSpec`] maps parameter names to lists of [`Condition`]s. Every
//! condition of every parameter must hold (pure conjunction), so a range is
//! just two conditions on the same parameter:
//!
//! ```
//! use morpho::query::{Condition, FilterSpec, Operator};
//!
//! let spec = FilterSpec::new()
//!     .with(Condition::new("span", Operator::Ge, 10.0))
//!     .with(Condition::new("span", Operator::Le, 20.0));
//! assert_eq!(spec.len(), 2);
//! ```
//!
//! Items lacking a parameter fail every condition on it.

use crate::dataset::Item;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Comparison kinds accepted in conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "=", alias = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
}

impl Operator {
    pub const ALL: [Operator; 6] = [
        Operator::Eq,
        Operator::Ne,
        Operator::Gt,
        Operator::Ge,
        Operator::Lt,
        Operator::Le,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::Lt => "<",
            Operator::Le => "<=",
        }
    }

    pub fn eval(&self, value: f64, threshold: f64) -> bool {
        match self {
            Operator::Eq => value == threshold,
            Operator::Ne => value != threshold,
            Operator::Gt => value > threshold,
            Operator::Ge => value >= threshold,
            Operator::Lt => value < threshold,
            Operator::Le => value <= threshold,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Operator {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "=" | "==" => Ok(Operator::Eq),
            "!=" => Ok(Operator::Ne),
            ">" => Ok(Operator::Gt),
            ">=" => Ok(Operator::Ge),
            "<" => Ok(Operator::Lt),
            "<=" => Ok(Operator::Le),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub parameter: String,
    pub operator: Operator,
    pub value: f64,
}

impl Condition {
    pub fn new(parameter: &str, operator: Operator, value: f64) -> Self {
        Self {
            parameter: parameter.to_string(),
            operator,
            value,
        }
    }

    /// Missing parameters fail closed.
    pub fn matches(&self, item: &Item) -> bool {
        item.param(&self.parameter)
            .map_or(false, |v| self.operator.eval(v, self.value))
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.parameter, self.operator, self.value)
    }
}

impl FromStr for Condition {
    type Err = Error;

    /// Parse `name<op>value`, e.g. `mass<=12.5` or `span != 3`.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidCondition(s.to_string());
        let start = s.find(&['=', '!', '<', '>'][..]).ok_or_else(invalid)?;
        let end = s[start..]
            .find(|c: char| !matches!(c, '=' | '!' | '<' | '>'))
            .map(|i| start + i)
            .ok_or_else(invalid)?;

        let parameter = s[..start].trim();
        let operator: Operator = s[start..end].parse().map_err(|_| invalid())?;
        let value: f64 = s[end..].trim().parse().map_err(|_| invalid())?;
        if parameter.is_empty() || !value.is_finite() {
            return Err(invalid());
        }
        Ok(Condition::new(parameter, operator, value))
    }
}

/// A condition as typed into a UI form: the threshold is still text.
#[derive(Debug, Clone, Deserialize)]
pub struct RawCondition {
    #[serde(default)]
    pub parameter: String,
    pub operator: Operator,
    #[serde(default)]
    pub value: serde_json::Value,
}

impl RawCondition {
    /// `None` when the parameter is blank or the value does not parse.
    pub fn parse(&self) -> Option<Condition> {
        let value = match &self.value {
            serde_json::Value::Number(n) => n.as_f64()?,
            serde_json::Value::String(s) => s.trim().parse().ok()?,
            _ => return None,
        };
        if self.parameter.trim().is_empty() || !value.is_finite() {
            return None;
        }
        Some(Condition::new(self.parameter.trim(), self.operator, value))
    }
}

/// Parameter name → conditions, all ANDed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSpec(BTreeMap<String, Vec<Condition>>);

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, condition: Condition) -> Self {
        self.push(condition);
        self
    }

    pub fn push(&mut self, condition: Condition) {
        self.0
            .entry(condition.parameter.clone())
            .or_default()
            .push(condition);
    }

    /// Build from form input, skipping conditions that do not parse.
    pub fn from_raw(raw: &[RawCondition]) -> Self {
        let mut spec = Self::new();
        for condition in raw {
            match condition.parse() {
                Some(c) => spec.push(c),
                None => log::warn!(
                    "ignoring condition on '{}': value {} is not a number",
                    condition.parameter,
                    condition.value
                ),
            }
        }
        spec
    }

    /// True when at least one condition is present.
    pub fn is_active(&self) -> bool {
        self.0.values().any(|c| !c.is_empty())
    }

    /// Total number of conditions.
    pub fn len(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn conditions(&self) -> impl Iterator<Item = &Condition> {
        self.0.values().flatten()
    }

    pub fn matches(&self, item: &Item) -> bool {
        self.conditions().all(|c| c.matches(item))
    }
}

/// Outcome of [`apply_filter`].
#[derive(Debug, Clone, PartialEq)]
pub struct Filtered {
    pub items: Vec<Item>,
    /// The filter had at least one condition.
    pub applied: bool,
    /// The filter was applied and nothing matched.
    pub is_empty: bool,
}

/// Keep the items satisfying every condition, in their original order.
pub fn apply_filter(items: &[Item], spec: &FilterSpec) -> Filtered {
    let matched: Vec<Item> = items
        .iter()
        .filter(|item| spec.matches(item))
        .cloned()
        .collect();
    let applied = spec.is_active();

    Filtered {
        is_empty: applied && matched.is_empty(),
        items: matched,
        applied,
    }
}

/// Stable ascending sort on one parameter. Items lacking it go last, in
/// their previous relative order.
pub fn apply_sort(items: &[Item], parameter: &str) -> Vec<Item> {
    let mut sorted = items.to_vec();
    sorted.sort_by(|a, b| compare_by(a, b, parameter));
    sorted
}

fn compare_by(a: &Item, b: &Item, parameter: &str) -> Ordering {
    match (a.param(parameter), b.param(parameter)) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: u64, params: &[(&str, f64)]) -> Item {
        let mut item = Item::new(id as usize - 1, id);
        for (k, v) in params {
            item.params.insert(k.to_string(), *v);
        }
        item
    }

    fn xs(items: &[Item]) -> Vec<f64> {
        items.iter().filter_map(|i| i.param("x")).collect()
    }

    fn ids(items: &[Item]) -> Vec<u64> {
        items.iter().map(|i| i.id).collect()
    }

    fn sample() -> Vec<Item> {
        vec![item(1, &[("x", 1.0)]), item(2, &[("x", 5.0)]), item(3, &[("x", 10.0)])]
    }

    // ==========================================================================
    // OPERATORS
    // ==========================================================================

    #[test]
    fn test_operator_eval() {
        assert!(Operator::Eq.eval(2.0, 2.0));
        assert!(Operator::Ne.eval(2.0, 3.0));
        assert!(Operator::Gt.eval(3.0, 2.0));
        assert!(!Operator::Gt.eval(2.0, 2.0));
        assert!(Operator::Ge.eval(2.0, 2.0));
        assert!(Operator::Lt.eval(1.0, 2.0));
        assert!(Operator::Le.eval(2.0, 2.0));
    }

    #[test]
    fn test_operator_symbols_round_trip() {
        for op in Operator::ALL {
            assert_eq!(op.symbol().parse::<Operator>(), Ok(op));
        }
        assert_eq!("==".parse::<Operator>(), Ok(Operator::Eq));
        assert!("=>".parse::<Operator>().is_err());
    }

    #[test]
    fn test_operator_serde() {
        let op: Operator = serde_json::from_str(r#"">=""#).unwrap();
        assert_eq!(op, Operator::Ge);
        assert_eq!(serde_json::to_string(&Operator::Ne).unwrap(), r#""!=""#);
    }

    // ==========================================================================
    // CONDITION PARSING
    // ==========================================================================

    #[test]
    fn test_condition_from_str() {
        assert_eq!(
            "mass<=12.5".parse::<Condition>().unwrap(),
            Condition::new("mass", Operator::Le, 12.5)
        );
        assert_eq!(
            " span != 3 ".parse::<Condition>().unwrap(),
            Condition::new("span", Operator::Ne, 3.0)
        );
        assert_eq!(
            "x>-1".parse::<Condition>().unwrap(),
            Condition::new("x", Operator::Gt, -1.0)
        );
    }

    #[test]
    fn test_condition_from_str_rejects() {
        for bad in ["mass", "<=3", "mass<=", "mass<=abc", "mass=>3", "x=inf"] {
            assert!(bad.parse::<Condition>().is_err(), "{} should not parse", bad);
        }
    }

    #[test]
    fn test_raw_conditions_skip_unparsable() {
        let raw: Vec<RawCondition> = serde_json::from_str(
            r#"[
                {"parameter": "x", "operator": ">", "value": "4"},
                {"parameter": "x", "operator": "<", "value": "abc"},
                {"parameter": "", "operator": "=", "value": 1},
                {"parameter": "y", "operator": "<=", "value": 2.5}
            ]"#,
        )
        .unwrap();

        let spec = FilterSpec::from_raw(&raw);
        assert_eq!(spec.len(), 2);
        let conditions: Vec<String> = spec.conditions().map(|c| c.to_string()).collect();
        assert_eq!(conditions, vec!["x > 4", "y <= 2.5"]);
    }

    // ==========================================================================
    // FILTERING
    // ==========================================================================

    #[test]
    fn test_filter_scenario_matches() {
        let spec = FilterSpec::new().with(Condition::new("x", Operator::Gt, 4.0));
        let result = apply_filter(&sample(), &spec);

        assert_eq!(xs(&result.items), vec![5.0, 10.0]);
        assert!(result.applied);
        assert!(!result.is_empty);
    }

    #[test]
    fn test_filter_scenario_no_results() {
        let spec = FilterSpec::new().with(Condition::new("x", Operator::Gt, 100.0));
        let result = apply_filter(&sample(), &spec);

        assert!(result.items.is_empty());
        assert!(result.is_empty);
    }

    #[test]
    fn test_filter_inactive_is_not_empty() {
        let result = apply_filter(&sample(), &FilterSpec::new());
        assert_eq!(result.items.len(), 3);
        assert!(!result.applied);
        assert!(!result.is_empty);

        let none = apply_filter(&[], &FilterSpec::new());
        assert!(!none.is_empty, "no filter active is distinct from zero matches");
    }

    #[test]
    fn test_filter_range_on_one_parameter() {
        let spec = FilterSpec::new()
            .with(Condition::new("x", Operator::Ge, 2.0))
            .with(Condition::new("x", Operator::Le, 9.0));
        assert_eq!(xs(&apply_filter(&sample(), &spec).items), vec![5.0]);
    }

    #[test]
    fn test_filter_across_parameters() {
        let items = vec![
            item(1, &[("x", 5.0), ("y", 1.0)]),
            item(2, &[("x", 5.0), ("y", 9.0)]),
        ];
        let spec = FilterSpec::new()
            .with(Condition::new("x", Operator::Eq, 5.0))
            .with(Condition::new("y", Operator::Lt, 5.0));
        assert_eq!(ids(&apply_filter(&items, &spec).items), vec![1]);
    }

    #[test]
    fn test_filter_missing_parameter_fails_closed() {
        let items = vec![item(1, &[("x", 1.0)]), item(2, &[])];
        let spec = FilterSpec::new().with(Condition::new("x", Operator::Ne, 7.0));
        assert_eq!(ids(&apply_filter(&items, &spec).items), vec![1]);
    }

    #[test]
    fn test_filter_idempotent() {
        let spec = FilterSpec::new().with(Condition::new("x", Operator::Ge, 5.0));
        let once = apply_filter(&sample(), &spec).items;
        let twice = apply_filter(&once, &spec).items;
        assert_eq!(once, twice);
    }

    // ==========================================================================
    // SORTING
    // ==========================================================================

    #[test]
    fn test_sort_ascending() {
        let items = vec![item(1, &[("x", 3.0)]), item(2, &[("x", -1.0)]), item(3, &[("x", 2.0)])];
        assert_eq!(ids(&apply_sort(&items, "x")), vec![2, 3, 1]);
    }

    #[test]
    fn test_sort_stable_on_ties() {
        let items = vec![
            item(1, &[("x", 1.0)]),
            item(2, &[("x", 0.0)]),
            item(3, &[("x", 1.0)]),
            item(4, &[("x", 0.0)]),
        ];
        assert_eq!(ids(&apply_sort(&items, "x")), vec![2, 4, 1, 3]);
    }

    #[test]
    fn test_sort_missing_last_in_prior_order() {
        let items = vec![
            item(1, &[]),
            item(2, &[("x", 9.0)]),
            item(3, &[]),
            item(4, &[("x", 1.0)]),
        ];
        assert_eq!(ids(&apply_sort(&items, "x")), vec![4, 2, 1, 3]);
    }

    #[test]
    fn test_sort_idempotent() {
        let items = vec![item(1, &[("x", 2.0)]), item(2, &[]), item(3, &[("x", 1.0)])];
        let once = apply_sort(&items, "x");
        assert_eq!(apply_sort(&once, "x"), once);
    }

    #[test]
    fn test_sort_unknown_parameter_keeps_order() {
        assert_eq!(ids(&apply_sort(&sample(), "nope")), vec![1, 2, 3]);
    }
}
