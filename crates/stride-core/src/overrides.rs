//! Dotted-path field overrides (`scene.num_envs=1024`).
//!
//! A config is serialized to JSON, each override replaces exactly one
//! existing field in order, and the result is deserialized back into the
//! typed config. Callers are expected to validate the result.
//!
//! Segments containing `.` or `=`, such as per-pattern gain keys, are
//! written in double quotes: `actuators.legs.damping.".*_knee_joint"=2.0`.

use std::str::FromStr;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::error::OverrideError;

/// A single `path=value` override.
#[derive(Debug, Clone, PartialEq)]
pub struct Override {
    pub path: Vec<String>,
    pub value: Value,
}

impl Override {
    /// Parse `path=value`. The value is read as a TOML value (numbers,
    /// booleans, arrays, inline tables, quoted strings); anything else is
    /// taken as a bare string.
    pub fn parse(text: &str) -> Result<Self, OverrideError> {
        let malformed = || OverrideError::Malformed(text.to_string());
        let (path, raw) = split_path(text.trim_start()).ok_or_else(malformed)?;
        if path.iter().any(String::is_empty) {
            return Err(malformed());
        }
        Ok(Self {
            path,
            value: parse_value(raw.trim()),
        })
    }

    /// The path as written, quoting segments that need it.
    pub fn dotted_path(&self) -> String {
        self.path
            .iter()
            .map(|segment| {
                if segment.contains(['.', '=']) {
                    format!("\"{segment}\"")
                } else {
                    segment.clone()
                }
            })
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Replace the target field inside `root`.
    pub fn apply(&self, root: &mut Value) -> Result<(), OverrideError> {
        let mut cursor = root;
        for (depth, segment) in self.path.iter().enumerate() {
            let here = || self.path[..=depth].join(".");
            cursor = match cursor {
                Value::Object(map) => map
                    .get_mut(segment)
                    .ok_or_else(|| OverrideError::UnknownPath(here()))?,
                Value::Array(items) => segment
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| items.get_mut(i))
                    .ok_or_else(|| OverrideError::UnknownPath(here()))?,
                _ => {
                    return Err(OverrideError::NotATable(self.path[..depth].join(".")));
                }
            };
        }
        *cursor = self.value.clone();
        Ok(())
    }
}

impl FromStr for Override {
    type Err = OverrideError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Split `path=value` at the first `=` outside quotes. `None` when there is
/// no such `=`, a quote is left open, or a quoted segment has text around it.
fn split_path(text: &str) -> Option<(Vec<String>, &str)> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut in_quotes = false;
    for (i, c) in text.char_indices() {
        if in_quotes {
            if c == '"' {
                in_quotes = false;
            } else {
                current.push(c);
            }
            continue;
        }
        match c {
            '"' if current.trim().is_empty() && !quoted => {
                current.clear();
                in_quotes = true;
                quoted = true;
            }
            '.' | '=' => {
                let segment = std::mem::take(&mut current);
                segments.push(if quoted { segment } else { segment.trim().to_string() });
                quoted = false;
                if c == '=' {
                    return Some((segments, &text[i + 1..]));
                }
            }
            _ if quoted => {
                if !c.is_whitespace() {
                    return None;
                }
            }
            _ => current.push(c),
        }
    }
    None
}

fn parse_value(raw: &str) -> Value {
    toml::from_str::<toml::Table>(&format!("v = {raw}"))
        .ok()
        .and_then(|mut table| table.remove("v"))
        .and_then(|v| serde_json::to_value(v).ok())
        .unwrap_or_else(|| Value::String(raw.to_string()))
}

/// Apply `overrides` in order to a copy of `cfg`.
pub fn apply_overrides<T: Serialize + DeserializeOwned>(
    cfg: &T,
    overrides: &[Override],
) -> Result<T, OverrideError> {
    let mut root = serde_json::to_value(cfg)?;
    for ov in overrides {
        debug!(path = %ov.dotted_path(), value = %ov.value, "applying override");
        ov.apply(&mut root)?;
    }
    Ok(serde_json::from_value(root)?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Scene {
        num_envs: u32,
        terrain_type: String,
        feet: Vec<String>,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Env {
        scene: Scene,
        weight: f32,
    }

    fn env() -> Env {
        Env {
            scene: Scene {
                num_envs: 4096,
                terrain_type: "generator".into(),
                feet: vec![".*foot.*".into()],
            },
            weight: 1.0,
        }
    }

    #[test]
    fn parse_number_and_bool() {
        let ov = Override::parse("scene.num_envs=1024").unwrap();
        assert_eq!(ov.path, vec!["scene", "num_envs"]);
        assert_eq!(ov.value, json!(1024));
        assert_eq!(Override::parse("a=true").unwrap().value, json!(true));
    }

    #[test]
    fn parse_bare_string_falls_back() {
        let ov = Override::parse("scene.terrain_type = plane").unwrap();
        assert_eq!(ov.value, json!("plane"));
    }

    #[test]
    fn parse_array() {
        let ov: Override = r#"robot.feet=[".*ankle.*", ".*toe.*"]"#.parse().unwrap();
        assert_eq!(ov.value, json!([".*ankle.*", ".*toe.*"]));
    }

    #[test]
    fn parse_rejects_missing_equals() {
        assert!(matches!(
            Override::parse("scene.num_envs"),
            Err(OverrideError::Malformed(_))
        ));
        assert!(Override::parse("scene..x=1").is_err());
    }

    #[test]
    fn quoted_segment_keeps_dots() {
        let ov = Override::parse(r#"actuators.legs.damping.".*_knee_joint"=2.0"#).unwrap();
        assert_eq!(ov.path, vec!["actuators", "legs", "damping", ".*_knee_joint"]);
        assert_eq!(ov.value, json!(2.0));
        assert_eq!(ov.dotted_path(), r#"actuators.legs.damping.".*_knee_joint""#);

        let ov = Override::parse(r#"gains."a=b".kp = 3"#).unwrap();
        assert_eq!(ov.path, vec!["gains", "a=b", "kp"]);
        assert_eq!(ov.value, json!(3));
    }

    #[test]
    fn quoted_segment_must_be_whole() {
        assert!(Override::parse(r#"a."b=1"#).is_err());
        assert!(Override::parse(r#"a."b"c=1"#).is_err());
        assert!(Override::parse(r#"a.""=1"#).is_err());
    }

    #[test]
    fn quoted_segment_addresses_map_key() {
        let mut root = json!({"damping": {".*_hip_joint": 1.5, ".*_knee_joint": 1.25}});
        Override::parse(r#"damping.".*_knee_joint"=2.0"#)
            .unwrap()
            .apply(&mut root)
            .unwrap();
        assert_eq!(root["damping"][".*_knee_joint"], json!(2.0));
        assert_eq!(root["damping"][".*_hip_joint"], json!(1.5));
    }

    #[test]
    fn overrides_apply_in_order() {
        let ovs = [
            Override::parse("scene.num_envs=8").unwrap(),
            Override::parse("scene.num_envs=16").unwrap(),
            Override::parse("weight=-0.25").unwrap(),
        ];
        let out = apply_overrides(&env(), &ovs).unwrap();
        assert_eq!(out.scene.num_envs, 16);
        assert!((out.weight + 0.25).abs() < f32::EPSILON);
        assert_eq!(out.scene.terrain_type, "generator");
    }

    #[test]
    fn array_index_segment() {
        let ovs = [Override::parse("scene.feet.0=left_foot").unwrap()];
        let out = apply_overrides(&env(), &ovs).unwrap();
        assert_eq!(out.scene.feet, vec!["left_foot".to_string()]);
    }

    #[test]
    fn unknown_path_is_an_error() {
        let ovs = [Override::parse("scene.num_env=8").unwrap()];
        let err = apply_overrides(&env(), &ovs).unwrap_err();
        match err {
            OverrideError::UnknownPath(p) => assert_eq!(p, "scene.num_env"),
            other => panic!("unexpected: {other}"),
        }
    }

    #[test]
    fn descending_into_leaf_is_an_error() {
        let ovs = [Override::parse("weight.x=1").unwrap()];
        assert!(matches!(
            apply_overrides(&env(), &ovs),
            Err(OverrideError::NotATable(_))
        ));
    }

    #[test]
    fn type_mismatch_is_an_error() {
        let ovs = [Override::parse("scene.num_envs=lots").unwrap()];
        assert!(matches!(
            apply_overrides(&env(), &ovs),
            Err(OverrideError::Json(_))
        ));
    }
}
