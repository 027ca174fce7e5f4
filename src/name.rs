//! Hierarchical binding names
//!
//! A `Name` is an immutable, ordered list of path segments written as
//! `a/b/c`. Segments are validated once at construction.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{BinderError, Result};

/// Separator between segments
pub const SEPARATOR: char = '/';

static SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").expect("segment regex is valid"));

/// Strongly-typed hierarchical name
///
/// Guarantees:
/// - At least one segment
/// - Every segment matches `[A-Za-z0-9][A-Za-z0-9._-]*`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name {
    segments: Arc<[Arc<str>]>,
}

impl Name {
    /// Parse a `/`-separated name
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.is_empty() {
            return Err(invalid(raw, "name cannot be empty"));
        }
        Self::from_segments(raw.split(SEPARATOR)).map_err(|e| match e {
            BinderError::InvalidName { reason, .. } => invalid(raw, &reason),
            other => other,
        })
    }

    /// Build a name from individual segments
    pub fn from_segments<I, S>(segments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let segments = segments
            .into_iter()
            .map(|s| validate_segment(s.as_ref()).map(Arc::from))
            .collect::<Result<Vec<Arc<str>>>>()?;

        if segments.is_empty() {
            return Err(invalid("", "name cannot be empty"));
        }
        Ok(Self {
            segments: segments.into(),
        })
    }

    /// Child name: `self/segment`
    pub fn append(&self, segment: &str) -> Result<Self> {
        let child = Name::parse(segment)?;
        let segments: Vec<Arc<str>> = self
            .segments
            .iter()
            .chain(child.segments.iter())
            .cloned()
            .collect();
        Ok(Self {
            segments: segments.into(),
        })
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(|s| s.as_ref())
    }

    /// Last segment
    pub fn leaf(&self) -> &str {
        // from_segments rejects empty names
        self.segments.last().map(|s| s.as_ref()).unwrap_or_default()
    }

    /// Number of segments
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Whole-segment prefix test: `env/jdbc` is under `env`, `envelope` is not
    pub fn starts_with(&self, prefix: &Name) -> bool {
        self.segments.starts_with(&prefix.segments)
    }
}

fn validate_segment(segment: &str) -> Result<&str> {
    if segment.is_empty() {
        return Err(invalid(segment, "empty segment"));
    }
    if !SEGMENT.is_match(segment) {
        return Err(invalid(
            segment,
            &format!("segment '{}' contains invalid characters", segment),
        ));
    }
    Ok(segment)
}

fn invalid(name: &str, reason: &str) -> BinderError {
    BinderError::InvalidName {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", SEPARATOR)?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}

impl FromStr for Name {
    type Err = BinderError;

    fn from_str(s: &str) -> Result<Self> {
        Name::parse(s)
    }
}

impl TryFrom<&str> for Name {
    type Error = BinderError;

    fn try_from(s: &str) -> Result<Self> {
        Name::parse(s)
    }
}

impl Serialize for Name {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Name {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Name::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_single_segment() {
        let name = Name::parse("global-binding").unwrap();
        assert_eq!(name.depth(), 1);
        assert_eq!(name.leaf(), "global-binding");
        assert_eq!(name.to_string(), "global-binding");
    }

    #[test]
    fn parse_nested_path() {
        let name = Name::parse("env/jdbc/orders.db").unwrap();
        assert_eq!(name.segments().collect::<Vec<_>>(), ["env", "jdbc", "orders.db"]);
        assert!(name.starts_with(&Name::parse("env/jdbc").unwrap()));
        assert!(!name.starts_with(&Name::parse("en").unwrap()));
    }

    #[test]
    fn rejects_empty_and_malformed() {
        assert!(matches!(Name::parse(""), Err(BinderError::InvalidName { .. })));
        assert!(Name::parse("a//b").is_err());
        assert!(Name::parse("/leading").is_err());
        assert!(Name::parse("trailing/").is_err());
        assert!(Name::parse("has space").is_err());
        assert!(Name::parse("-dash-first").is_err());
    }

    #[test]
    fn invalid_name_reports_full_input() {
        match Name::parse("ok/bad segment") {
            Err(BinderError::InvalidName { name, reason }) => {
                assert_eq!(name, "ok/bad segment");
                assert!(reason.contains("bad segment"));
            }
            other => panic!("expected InvalidName, got {:?}", other),
        }
    }

    #[test]
    fn append_builds_child() {
        let base = Name::parse("env").unwrap();
        let child = base.append("mail/session").unwrap();
        assert_eq!(child.to_string(), "env/mail/session");
        assert_eq!(child.depth(), 3);
        assert!(base.append("").is_err());
    }

    #[test]
    fn equal_names_hash_equal() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(Name::parse("a/b").unwrap());
        assert!(set.contains(&Name::from_segments(["a", "b"]).unwrap()));
    }

    #[test]
    fn serde_as_string() {
        let name: Name = serde_yaml::from_str("\"app/greeting\"").unwrap();
        assert_eq!(name.to_string(), "app/greeting");
        assert_eq!(serde_json::to_string(&name).unwrap(), "\"app/greeting\"");
        assert!(serde_yaml::from_str::<Name>("\"bad name\"").is_err());
    }
}
