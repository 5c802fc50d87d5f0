//! Relationship table of the main document part
//! (`word/_rels/document.xml.rels`).

use std::fmt;

pub const HYPERLINK_RELATIONSHIP: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink";
pub const STYLES_RELATIONSHIP: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";

/// Opaque identifier (`rIdN`) referenced from markup via `r:id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RelationshipId(String);

impl RelationshipId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RelationshipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetMode {
    Internal,
    External,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: RelationshipId,
    pub kind: &'static str,
    pub target: String,
    pub mode: TargetMode,
}

/// Registers references to resources outside the package.
pub trait RelationshipRegistry {
    /// Adds a new external relationship and returns its identifier.
    ///
    /// Every call creates a fresh entry, even for a target that is already
    /// present.
    fn relate_external(&mut self, target: &str, kind: &'static str) -> RelationshipId;
}

/// The relationship table. The styles part is always related as `rId1`.
#[derive(Debug, Clone)]
pub struct Relationships {
    entries: Vec<Relationship>,
}

impl Default for Relationships {
    fn default() -> Self {
        Self::new()
    }
}

impl Relationships {
    pub fn new() -> Self {
        let mut relationships = Self {
            entries: Vec::new(),
        };
        relationships.push("styles.xml", STYLES_RELATIONSHIP, TargetMode::Internal);
        relationships
    }

    fn push(&mut self, target: &str, kind: &'static str, mode: TargetMode) -> RelationshipId {
        let id = RelationshipId(format!("rId{}", self.entries.len() + 1));
        self.entries.push(Relationship {
            id: id.clone(),
            kind,
            target: target.to_string(),
            mode,
        });
        id
    }

    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.entries.iter()
    }

    pub fn external(&self) -> impl Iterator<Item = &Relationship> {
        self.entries
            .iter()
            .filter(|entry| entry.mode == TargetMode::External)
    }

    pub fn get(&self, id: &RelationshipId) -> Option<&Relationship> {
        self.entries.iter().find(|entry| &entry.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl RelationshipRegistry for Relationships {
    fn relate_external(&mut self, target: &str, kind: &'static str) -> RelationshipId {
        self.push(target, kind, TargetMode::External)
    }
}
