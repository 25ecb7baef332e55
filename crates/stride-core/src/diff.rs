//! Structural diff between two configs of the same type.
//!
//! Both sides are serialized to JSON and walked table by table. Arrays are
//! compared as single leaves.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::error::ConfigError;

/// One differing leaf.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldChange {
    /// Dotted field path.
    pub path: String,
    /// Value in the base config, `None` if absent there.
    pub base: Option<Value>,
    /// Value in the derived config, `None` if absent there.
    pub derived: Option<Value>,
}

impl fmt::Display for FieldChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |v: &Option<Value>| v.as_ref().map_or_else(|| "<absent>".to_string(), Value::to_string);
        write!(f, "{}: {} -> {}", self.path, show(&self.base), show(&self.derived))
    }
}

/// Diff two configs.
pub fn diff<T: Serialize>(base: &T, derived: &T) -> Result<Vec<FieldChange>, ConfigError> {
    let base = serde_json::to_value(base)?;
    let derived = serde_json::to_value(derived)?;
    Ok(diff_values(&base, &derived))
}

/// Diff two JSON trees.
pub fn diff_values(base: &Value, derived: &Value) -> Vec<FieldChange> {
    let mut changes = Vec::new();
    walk("", Some(base), Some(derived), &mut changes);
    changes
}

/// Just the changed paths, in walk order.
pub fn changed_paths(changes: &[FieldChange]) -> Vec<&str> {
    changes.iter().map(|c| c.path.as_str()).collect()
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

fn walk(path: &str, base: Option<&Value>, derived: Option<&Value>, out: &mut Vec<FieldChange>) {
    match (base, derived) {
        (Some(Value::Object(a)), Some(Value::Object(b))) => {
            for (key, va) in a {
                walk(&join(path, key), Some(va), b.get(key), out);
            }
            for (key, vb) in b {
                if !a.contains_key(key) {
                    walk(&join(path, key), None, Some(vb), out);
                }
            }
        }
        (a, b) if a == b => {}
        (a, b) => out.push(FieldChange {
            path: path.to_string(),
            base: a.cloned(),
            derived: b.cloned(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn identical_values_have_no_changes() {
        let v = json!({"a": 1, "b": {"c": [1, 2]}});
        assert!(diff_values(&v, &v).is_empty());
    }

    #[test]
    fn nested_leaf_change_reports_dotted_path() {
        let a = json!({"scene": {"height_scanner": {"enable_height_scan": false}}});
        let b = json!({"scene": {"height_scanner": {"enable_height_scan": true}}});
        let changes = diff_values(&a, &b);
        assert_eq!(changed_paths(&changes), vec!["scene.height_scanner.enable_height_scan"]);
        assert_eq!(changes[0].base, Some(json!(false)));
        assert_eq!(changes[0].derived, Some(json!(true)));
    }

    #[test]
    fn added_and_removed_keys() {
        let a = json!({"keep": 1, "gone": 2});
        let b = json!({"keep": 1, "new": 3});
        let changes = diff_values(&a, &b);
        assert_eq!(changed_paths(&changes), vec!["gone", "new"]);
        assert_eq!(changes[0].derived, None);
        assert_eq!(changes[1].base, None);
    }

    #[test]
    fn arrays_compare_as_leaves() {
        let a = json!({"dims": [512, 256, 128]});
        let b = json!({"dims": [512, 256]});
        let changes = diff_values(&a, &b);
        assert_eq!(changed_paths(&changes), vec!["dims"]);
    }

    #[test]
    fn table_replaced_by_null_is_one_change() {
        let a = json!({"terrain": {"rows": 10}});
        let b = json!({"terrain": null});
        let changes = diff_values(&a, &b);
        assert_eq!(changed_paths(&changes), vec!["terrain"]);
    }

    #[test]
    fn display_shows_both_sides() {
        let change = FieldChange {
            path: "reward.lin_vel_z_l2.weight".into(),
            base: Some(json!(-1.0)),
            derived: Some(json!(-0.25)),
        };
        assert_eq!(change.to_string(), "reward.lin_vel_z_l2.weight: -1.0 -> -0.25");
    }

    #[test]
    fn diff_typed_structs() {
        #[derive(Serialize)]
        struct Cfg {
            a: u32,
            b: String,
        }
        let changes = diff(
            &Cfg { a: 1, b: "x".into() },
            &Cfg { a: 2, b: "x".into() },
        )
        .unwrap();
        assert_eq!(changed_paths(&changes), vec!["a"]);
    }
}
