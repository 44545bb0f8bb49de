//! Path patterns and rule tables for the field mapper.
//!
//! A pattern such as `.fields.status` addresses one field at one nesting
//! level; `.fields.*` addresses every otherwise unmapped field directly
//! under `.fields`, and `.*` every unmapped field at the root.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

use crate::error::TaskError;
use crate::types::Record;

/// Field names traversed from the document root
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn child(&self, key: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(key.to_string());
        Self(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Segment-wise prefix test; `status` is not a prefix of `statusCategory`
    pub fn starts_with(&self, prefix: &FieldPath) -> bool {
        self.0.len() >= prefix.0.len() && self.0.iter().zip(&prefix.0).all(|(a, b)| a == b)
    }

    pub fn is_below(&self, ancestor: &FieldPath) -> bool {
        self.0.len() > ancestor.0.len() && self.starts_with(ancestor)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.0 {
            write!(f, ".{}", segment)?;
        }
        Ok(())
    }
}

/// A parsed rule pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPattern {
    /// One specific field
    Exact(FieldPath),
    /// Any unmapped field directly under the given parent
    Wildcard(FieldPath),
}

impl PathPattern {
    pub fn parse(pattern: &str) -> Result<Self, TaskError> {
        let body = pattern.strip_prefix('.').unwrap_or(pattern);
        if body.is_empty() {
            return Err(TaskError::InvalidArgs(format!(
                "empty rule pattern {:?}",
                pattern
            )));
        }
        let mut segments: Vec<String> = Vec::new();
        for segment in body.split('.') {
            if segment.is_empty() {
                return Err(TaskError::InvalidArgs(format!(
                    "empty segment in rule pattern {:?}",
                    pattern
                )));
            }
            segments.push(segment.to_string());
        }
        match segments.iter().position(|s| s == "*") {
            None => Ok(PathPattern::Exact(FieldPath(segments))),
            Some(pos) if pos == segments.len() - 1 => {
                segments.pop();
                Ok(PathPattern::Wildcard(FieldPath(segments)))
            }
            Some(_) => Err(TaskError::InvalidArgs(format!(
                "'*' may only end a rule pattern: {:?}",
                pattern
            ))),
        }
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathPattern::Exact(path) => write!(f, "{}", path),
            PathPattern::Wildcard(parent) => write!(f, "{}.*", parent),
        }
    }
}

/// Transform for an exact rule: `(target, whole source document)`
pub type FieldTransform = Box<dyn Fn(&mut Record, &Value) -> Result<(), String> + Send + Sync>;

/// Transform for a wildcard rule: `(target, whole source document, field name)`
pub type WildcardTransform =
    Box<dyn Fn(&mut Record, &Value, &str) -> Result<(), String> + Send + Sync>;

/// Caller-owned mapping rules, read-only while mapping
#[derive(Default)]
pub struct RuleTable {
    exact: BTreeMap<FieldPath, FieldTransform>,
    wildcard: BTreeMap<FieldPath, WildcardTransform>,
}

impl RuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an exact rule; the pattern must not end in `.*`
    pub fn field<F>(mut self, pattern: &str, transform: F) -> Result<Self, TaskError>
    where
        F: Fn(&mut Record, &Value) -> Result<(), String> + Send + Sync + 'static,
    {
        match PathPattern::parse(pattern)? {
            PathPattern::Exact(path) => {
                self.exact.insert(path, Box::new(transform));
                Ok(self)
            }
            PathPattern::Wildcard(_) => Err(TaskError::InvalidArgs(format!(
                "{:?} is a wildcard pattern, expected an exact field path",
                pattern
            ))),
        }
    }

    /// Add a wildcard rule; the pattern must end in `.*`
    pub fn wildcard<F>(mut self, pattern: &str, transform: F) -> Result<Self, TaskError>
    where
        F: Fn(&mut Record, &Value, &str) -> Result<(), String> + Send + Sync + 'static,
    {
        match PathPattern::parse(pattern)? {
            PathPattern::Wildcard(parent) => {
                self.wildcard.insert(parent, Box::new(transform));
                Ok(self)
            }
            PathPattern::Exact(_) => Err(TaskError::InvalidArgs(format!(
                "{:?} is an exact pattern, expected one ending in '.*'",
                pattern
            ))),
        }
    }

    pub fn exact_rule(&self, path: &FieldPath) -> Option<&FieldTransform> {
        self.exact.get(path)
    }

    pub fn wildcard_rule(&self, parent: &FieldPath) -> Option<&WildcardTransform> {
        self.wildcard.get(parent)
    }

    /// Whether any rule addresses a field strictly below `path`
    pub fn has_rule_below(&self, path: &FieldPath) -> bool {
        self.exact.keys().any(|p| p.is_below(path))
            || self.wildcard.keys().any(|parent| parent.starts_with(path))
    }

    pub fn len(&self) -> usize {
        self.exact.len() + self.wildcard.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn patterns(&self) -> Vec<PathPattern> {
        self.exact
            .keys()
            .cloned()
            .map(PathPattern::Exact)
            .chain(self.wildcard.keys().cloned().map(PathPattern::Wildcard))
            .collect()
    }
}

impl fmt::Debug for RuleTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let patterns: Vec<String> = self.patterns().iter().map(ToString::to_string).collect();
        f.debug_struct("RuleTable").field("patterns", &patterns).finish()
    }
}
