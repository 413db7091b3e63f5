//! Core value types shared by the catalog, the graph and the expander

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Stable identity of a resource: type name plus title
///
/// The type name is stored lowercased, so `File[/tmp]` and `file[/tmp]`
/// are the same resource. Titles are compared verbatim.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceRef {
    type_name: String,
    title: String,
}

impl ResourceRef {
    /// Create a reference from a type name and a title
    pub fn new(type_name: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into().to_lowercase(),
            title: title.into(),
        }
    }

    /// Lowercased type name, e.g. "file" or "foo::bar"
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn title(&self) -> &str {
        &self.title
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let capitalized: Vec<String> = self
            .type_name
            .split("::")
            .map(|segment| {
                let mut chars = segment.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            })
            .collect();
        write!(f, "{}[{}]", capitalized.join("::"), self.title)
    }
}

impl FromStr for ResourceRef {
    type Err = Error;

    /// Parse a reference written as `Type[title]`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let open = s.find('[').ok_or_else(|| Error::InvalidRef(s.to_string()))?;
        if open == 0 || !s.ends_with(']') {
            return Err(Error::InvalidRef(s.to_string()));
        }
        let title = &s[open + 1..s.len() - 1];
        if title.is_empty() {
            return Err(Error::InvalidRef(s.to_string()));
        }
        Ok(Self::new(&s[..open], title))
    }
}

/// Set of lowercase labels attached to a resource
///
/// Tags are plain values. Merging copies labels across; two resources
/// never share a tag set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tags(BTreeSet<String>);

impl Tags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a string is usable as a tag
    ///
    /// Tags start with a letter, digit or underscore and may continue with
    /// letters, digits, `_`, `-`, `.` and `:`.
    pub fn is_valid(tag: &str) -> bool {
        let mut chars = tag.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphanumeric() || c == '_' => {}
            _ => return false,
        }
        chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ':'))
    }

    /// Add a tag, lowercasing it. Invalid tags are ignored.
    pub fn insert(&mut self, tag: &str) -> bool {
        let tag = tag.to_lowercase();
        if !Self::is_valid(&tag) {
            return false;
        }
        self.0.insert(tag)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.contains(&tag.to_lowercase())
    }

    /// Copy every tag from `other` into this set
    pub fn merge(&mut self, other: &Tags) {
        self.0.extend(other.0.iter().cloned());
    }

    /// Copy every tag from `other` except `excluded`
    pub fn merge_except(&mut self, other: &Tags, excluded: &str) {
        let excluded = excluded.to_lowercase();
        self.0
            .extend(other.0.iter().filter(|t| **t != excluded).cloned());
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for Tags {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut tags = Self::new();
        for tag in iter {
            tags.insert(tag.as_ref());
        }
        tags
    }
}

/// The relationship metaparameters a resource can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipParam {
    /// This resource runs before the referenced ones
    Before,
    /// This resource runs after the referenced ones
    Require,
    /// Like `Before`, and refreshes the referenced ones on change
    Notify,
    /// Like `Require`, and is refreshed when the referenced ones change
    Subscribe,
}

impl RelationshipParam {
    /// All metaparameters, in declaration order
    pub const ALL: [Self; 4] = [Self::Before, Self::Require, Self::Notify, Self::Subscribe];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::Require => "require",
            Self::Notify => "notify",
            Self::Subscribe => "subscribe",
        }
    }

    /// Whether the declaring resource is the source of the resulting edge
    pub fn is_outgoing(&self) -> bool {
        matches!(self, Self::Before | Self::Notify)
    }

    /// Whether the resulting edge carries a refresh label
    pub fn is_refresh(&self) -> bool {
        matches!(self, Self::Notify | Self::Subscribe)
    }
}

impl fmt::Display for RelationshipParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Event name matching every event
pub const ALL_EVENTS: &str = "ALL_EVENTS";

/// Label carried by a relationship graph edge
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeLabel {
    /// Event that triggers the callback
    pub event: Option<String>,
    /// Callback invoked on the target, e.g. "refresh"
    pub callback: Option<String>,
}

impl EdgeLabel {
    /// Label used by notify/subscribe edges
    pub fn refresh() -> Self {
        Self {
            event: Some(ALL_EVENTS.to_string()),
            callback: Some("refresh".to_string()),
        }
    }
}

/// Ordering key assigned to relationship graph vertices
///
/// Keys compare segment by segment, and a key sorts before every key it
/// prefixes: `[1] < [1, 1] < [1, 2] < [2]`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PriorityKey(Vec<u32>);

impl PriorityKey {
    /// A top-level key
    pub fn top(n: u32) -> Self {
        Self(vec![n])
    }

    /// A key nested directly under this one
    pub fn child(&self, n: u32) -> Self {
        let mut segments = self.0.clone();
        segments.push(n);
        Self(segments)
    }

    pub fn segments(&self) -> &[u32] {
        &self.0
    }
}

impl fmt::Display for PriorityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "{}", parts.join("."))
    }
}
