//! Structured field paths (`applicant.addresses[0].city`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::PathError;

/// One step of a field path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Field(String),
    Index(usize),
}

/// Ordered list of field/index segments.
///
/// The string form joins fields with `.` and writes indices as `[n]`, which
/// is the format used by configuration files and PDF field names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath(Vec<Segment>);

impl FieldPath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    /// Append a field segment.
    pub fn child(&self, name: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(Segment::Field(name.to_string()));
        Self(segments)
    }

    /// Append an index segment.
    pub fn index(&self, i: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(Segment::Index(i));
        Self(segments)
    }

    /// Name of the last field segment (the "simple" field name).
    pub fn last_field(&self) -> Option<&str> {
        self.0.iter().rev().find_map(|s| match s {
            Segment::Field(name) => Some(name.as_str()),
            Segment::Index(_) => None,
        })
    }

    /// Field names only, with indices dropped.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.iter().filter_map(|s| match s {
            Segment::Field(name) => Some(name.as_str()),
            Segment::Index(_) => None,
        })
    }

    pub fn without_indices(&self) -> Self {
        Self(
            self.0
                .iter()
                .filter(|s| matches!(s, Segment::Field(_)))
                .cloned()
                .collect(),
        )
    }

    /// A name usable as a PDF form field (no `.`, which PDF reserves for hierarchy).
    pub fn field_name(&self) -> String {
        let mut out = String::new();
        for segment in &self.0 {
            if !out.is_empty() {
                out.push('_');
            }
            match segment {
                Segment::Field(name) => out.extend(name.chars().map(|c| {
                    if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                        c
                    } else {
                        '_'
                    }
                })),
                Segment::Index(i) => out.push_str(&i.to_string()),
            }
        }
        out
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                Segment::Field(name) if i == 0 => write!(f, "{}", name)?,
                Segment::Field(name) => write!(f, ".{}", name)?,
                Segment::Index(idx) => write!(f, "[{}]", idx)?,
            }
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut segments = Vec::new();
        if s.is_empty() {
            return Ok(Self(segments));
        }

        for part in s.split('.') {
            let (name, mut rest) = match part.find('[') {
                Some(idx) => (&part[..idx], &part[idx..]),
                None => (part, ""),
            };
            if name.is_empty() {
                return Err(PathError::EmptySegment { path: s.to_string() });
            }
            segments.push(Segment::Field(name.to_string()));

            while let Some(after_open) = rest.strip_prefix('[') {
                let close = after_open
                    .find(']')
                    .ok_or_else(|| PathError::UnclosedBracket { path: s.to_string() })?;
                let digits = &after_open[..close];
                let index = digits.parse::<usize>().map_err(|_| PathError::InvalidIndex {
                    path: s.to_string(),
                    index: digits.to_string(),
                })?;
                segments.push(Segment::Index(index));
                rest = &after_open[close + 1..];
            }
            if !rest.is_empty() {
                return Err(PathError::InvalidIndex {
                    path: s.to_string(),
                    index: rest.to_string(),
                });
            }
        }
        Ok(Self(segments))
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FieldPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
