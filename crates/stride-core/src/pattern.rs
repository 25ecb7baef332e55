//! Name selectors for joints and bodies.
//!
//! Patterns are regular expressions matched against the *whole* name
//! (`.*_knee_joint` matches `left_knee_joint` but not `left_knee_joint_2`).
//! A pattern starting with `!` removes names instead of adding them; a
//! selector made only of exclusions starts from every name, so
//! `["!.*foot.*"]` selects all bodies except the feet.
//!
//! Resolution happens once, when a config is validated. Any pattern that
//! matches nothing is an error.

use std::fmt;
use std::marker::PhantomData;

use regex::Regex;
use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::warn;

use crate::error::ConfigError;

/// Prefix marking an exclusion pattern.
pub const EXCLUDE_PREFIX: char = '!';

/// Compile `pattern` as an anchored full-match regex.
pub fn compile(field: &str, pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(&format!("^(?:{pattern})$")).map_err(|source| ConfigError::InvalidPattern {
        field: field.to_string(),
        pattern: pattern.to_string(),
        source,
    })
}

/// Characters that give a name regex meaning.
const REGEX_SPECIAL: [char; 14] = ['\\', '.', '+', '*', '?', '(', ')', '|', '[', ']', '{', '}', '^', '$'];

/// Whether `name` is a plain name rather than a pattern.
pub fn is_literal(name: &str) -> bool {
    !name.starts_with(EXCLUDE_PREFIX) && !name.contains(REGEX_SPECIAL)
}

// ---------------------------------------------------------------------------
// NameSelector
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct CompiledPattern {
    source: String,
    regex: Regex,
    exclude: bool,
}

/// A compiled list of full-match name patterns with optional exclusions.
#[derive(Debug, Clone)]
pub struct NameSelector {
    field: String,
    patterns: Vec<CompiledPattern>,
}

impl NameSelector {
    /// Compile a selector. `field` is the dotted config path used in errors.
    pub fn new<S: AsRef<str>>(field: impl Into<String>, patterns: &[S]) -> Result<Self, ConfigError> {
        let field = field.into();
        let patterns = patterns
            .iter()
            .map(|p| {
                let raw = p.as_ref();
                let (exclude, body) = match raw.strip_prefix(EXCLUDE_PREFIX) {
                    Some(rest) => (true, rest),
                    None => (false, raw),
                };
                Ok(CompiledPattern {
                    source: raw.to_string(),
                    regex: compile(&field, body)?,
                    exclude,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;
        Ok(Self { field, patterns })
    }

    /// Dotted config path this selector was built for.
    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    fn has_inclusions(&self) -> bool {
        self.patterns.iter().any(|p| !p.exclude)
    }

    /// Whether `name` is selected.
    pub fn matches(&self, name: &str) -> bool {
        let included = !self.has_inclusions()
            || self
                .patterns
                .iter()
                .any(|p| !p.exclude && p.regex.is_match(name));
        included
            && !self
                .patterns
                .iter()
                .any(|p| p.exclude && p.regex.is_match(name))
    }

    /// Resolve against `names`, returning the selected indices in name order.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::MissingField`] if the selector has no patterns.
    /// - [`ConfigError::UnresolvedPattern`] if any single pattern matches no
    ///   name, or if exclusions remove every included name.
    pub fn resolve<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<usize>, ConfigError> {
        if self.patterns.is_empty() {
            return Err(ConfigError::MissingField(self.field.clone()));
        }
        for pattern in &self.patterns {
            if !names.iter().any(|n| pattern.regex.is_match(n.as_ref())) {
                return Err(ConfigError::UnresolvedPattern {
                    field: self.field.clone(),
                    pattern: pattern.source.clone(),
                });
            }
        }
        let selected: Vec<usize> = names
            .iter()
            .enumerate()
            .filter(|(_, n)| self.matches(n.as_ref()))
            .map(|(i, _)| i)
            .collect();
        if selected.is_empty() {
            return Err(ConfigError::UnresolvedPattern {
                field: self.field.clone(),
                pattern: self.sources().join(", "),
            });
        }
        Ok(selected)
    }

    /// Like [`resolve`](Self::resolve) but returns the selected names.
    pub fn resolve_names<'a, S: AsRef<str>>(&self, names: &'a [S]) -> Result<Vec<&'a str>, ConfigError> {
        Ok(self
            .resolve(names)?
            .into_iter()
            .map(|i| names[i].as_ref())
            .collect())
    }

    /// The raw pattern strings, in declaration order.
    pub fn sources(&self) -> Vec<&str> {
        self.patterns.iter().map(|p| p.source.as_str()).collect()
    }
}

/// Compile and resolve `patterns` against `names` in one step.
pub fn resolve_matching_names<'a, P: AsRef<str>, S: AsRef<str>>(
    field: &str,
    patterns: &[P],
    names: &'a [S],
) -> Result<Vec<&'a str>, ConfigError> {
    NameSelector::new(field, patterns)?.resolve_names(names)
}

// ---------------------------------------------------------------------------
// PatternMap
// ---------------------------------------------------------------------------

/// Ordered `pattern -> value` mapping.
///
/// Declaration order is kept through serde. When several keys match the same
/// name, the first one wins.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternMap<T> {
    entries: Vec<(String, T)>,
}

impl<T> Default for PatternMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PatternMap<T> {
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Insert or replace a value. Replacing keeps the original position.
    pub fn insert(&mut self, pattern: impl Into<String>, value: T) -> Option<T> {
        let pattern = pattern.into();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == pattern) {
            return Some(std::mem::replace(&mut slot.1, value));
        }
        self.entries.push((pattern, value));
        None
    }

    /// Builder: insert a value.
    #[must_use]
    pub fn with(mut self, pattern: impl Into<String>, value: T) -> Self {
        self.insert(pattern, value);
        self
    }

    pub fn get(&self, pattern: &str) -> Option<&T> {
        self.entries
            .iter()
            .find(|(k, _)| k == pattern)
            .map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, pattern: &str) -> Option<&mut T> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == pattern)
            .map(|(_, v)| v)
    }

    pub fn remove(&mut self, pattern: &str) -> Option<T> {
        let idx = self.entries.iter().position(|(k, _)| k == pattern)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Resolve against `names`: one entry per name holding the value of the
    /// first matching key, or `None` when no key matches.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnresolvedPattern`] if a key matches no name.
    pub fn resolve<S: AsRef<str>>(&self, field: &str, names: &[S]) -> Result<Vec<Option<&T>>, ConfigError> {
        let compiled = self
            .entries
            .iter()
            .map(|(k, v)| Ok((k.as_str(), compile(field, k)?, v)))
            .collect::<Result<Vec<_>, ConfigError>>()?;

        for (key, regex, _) in &compiled {
            if !names.iter().any(|n| regex.is_match(n.as_ref())) {
                return Err(ConfigError::UnresolvedPattern {
                    field: field.to_string(),
                    pattern: (*key).to_string(),
                });
            }
        }

        let resolved = names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                let mut hits = compiled.iter().filter(|(_, r, _)| r.is_match(name));
                let first = hits.next();
                if let Some((winner, _, _)) = first {
                    for (shadowed, _, _) in hits {
                        warn!(field, name, winner, shadowed, "pattern shadowed by earlier entry");
                    }
                }
                first.map(|(_, _, v)| *v)
            })
            .collect();
        Ok(resolved)
    }
}

impl<K: Into<String>, T> FromIterator<(K, T)> for PatternMap<T> {
    fn from_iter<I: IntoIterator<Item = (K, T)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl<T: Serialize> Serialize for PatternMap<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

struct PatternMapVisitor<T>(PhantomData<T>);

impl<'de, T: Deserialize<'de>> Visitor<'de> for PatternMapVisitor<T> {
    type Value = PatternMap<T>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a table of name patterns")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut entries: Vec<(String, T)> = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((key, value)) = access.next_entry::<String, T>()? {
            if entries.iter().any(|(k, _)| *k == key) {
                return Err(serde::de::Error::custom(format!("duplicate pattern '{key}'")));
            }
            entries.push((key, value));
        }
        Ok(PatternMap { entries })
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for PatternMap<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(PatternMapVisitor(PhantomData))
    }
}

// ---------------------------------------------------------------------------
// PatternValue
// ---------------------------------------------------------------------------

/// A gain or limit given either once for a whole group or per pattern.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum PatternValue<T> {
    /// Same value for every matched joint.
    Uniform(T),
    /// Value per pattern, first match wins.
    PerPattern(PatternMap<T>),
}

impl<T: Copy> PatternValue<T> {
    pub const fn uniform(value: T) -> Self {
        Self::Uniform(value)
    }

    pub fn per_pattern<K: Into<String>>(entries: impl IntoIterator<Item = (K, T)>) -> Self {
        Self::PerPattern(entries.into_iter().collect())
    }

    /// Every value mentioned, for range checks.
    pub fn values(&self) -> Vec<T> {
        match self {
            Self::Uniform(v) => vec![*v],
            Self::PerPattern(map) => map.values().copied().collect(),
        }
    }

    /// Resolve against `names`; a uniform value applies to all of them.
    pub fn resolve<S: AsRef<str>>(&self, field: &str, names: &[S]) -> Result<Vec<Option<T>>, ConfigError> {
        match self {
            Self::Uniform(v) => Ok(vec![Some(*v); names.len()]),
            Self::PerPattern(map) => Ok(map
                .resolve(field, names)?
                .into_iter()
                .map(|v| v.copied())
                .collect()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
