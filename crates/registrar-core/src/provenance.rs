//! Provenance tracking for registry description values.
//!
//! Every value that flows through the pipeline carries a [`ProvenanceStack`]:
//! an ordered, append-only record of the stages that touched it. Each
//! [`ProvenanceEntry`] points at a [`ProvenanceOrigin`] (source file, line,
//! column and logical path) so diagnostics raised at any stage can name the
//! exact place in the YAML document a value came from.
//!
//! # Example
//!
//! ```
//! # use chrono::{TimeZone, Utc};
//! # use registrar_core::provenance::{
//! #     ProvenanceEntry, ProvenanceOrigin, ProvenanceStack, ProvenanceStage,
//! # };
//! let origin = ProvenanceOrigin::new("registry.yaml", "NamedInstances[0]");
//! let timestamp = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
//!
//! let stack = ProvenanceStack::new()
//!     .extended(ProvenanceEntry::new(origin, ProvenanceStage::Parser, "registrar", timestamp));
//!
//! assert!(stack.is_well_formed());
//! assert_eq!(stack.origin().unwrap().logical_path(), "NamedInstances[0]");
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Current version of the provenance stack layout.
pub const PROVENANCE_VERSION: u32 = 1;

/// A location in a source document.
///
/// Lines and columns are 1-based. A line of `0` means the position is unknown;
/// the logical path is always present and identifies the node structurally
/// (e.g. `NamedInstances[2].Assignments[0].Value`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ProvenanceOrigin {
    source_path: String,
    line: usize,
    column: Option<usize>,
    logical_path: String,
}

impl ProvenanceOrigin {
    /// Create an origin with an unknown position.
    pub fn new(source_path: impl Into<String>, logical_path: impl Into<String>) -> Self {
        Self {
            source_path: source_path.into(),
            line: 0,
            column: None,
            logical_path: logical_path.into(),
        }
    }

    /// Set the line and optional column of this origin.
    pub fn with_position(mut self, line: usize, column: Option<usize>) -> Self {
        self.line = line;
        self.column = column;
        self
    }

    pub fn source_path(&self) -> &str {
        &self.source_path
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn column(&self) -> Option<usize> {
        self.column
    }

    pub fn logical_path(&self) -> &str {
        &self.logical_path
    }

    /// Returns `true` if the origin points at a concrete line.
    pub fn has_position(&self) -> bool {
        self.line > 0
    }

    /// Origin of a named field below this one.
    ///
    /// The position is inherited; callers that know where the field starts
    /// replace it with [`with_position`](Self::with_position).
    pub fn field(&self, key: &str) -> Self {
        let logical_path = if self.logical_path.is_empty() {
            key.to_string()
        } else {
            format!("{}.{key}", self.logical_path)
        };
        Self {
            logical_path,
            ..self.clone()
        }
    }

    /// Origin of a sequence item below this one.
    pub fn item(&self, index: usize) -> Self {
        Self {
            logical_path: format!("{}[{index}]", self.logical_path),
            ..self.clone()
        }
    }
}

impl fmt::Display for ProvenanceOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source_path)?;
        if self.has_position() {
            write!(f, ":{}", self.line)?;
            if let Some(column) = self.column {
                write!(f, ":{column}")?;
            }
        }
        if !self.logical_path.is_empty() {
            write!(f, " ({})", self.logical_path)?;
        }
        Ok(())
    }
}

/// A pipeline stage that can touch a value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum ProvenanceStage {
    Parser,
    Normalizer,
    Resolver,
    Generator,
    /// A stage recorded by an upstream tool, kept verbatim.
    External(String),
}

impl ProvenanceStage {
    /// Map a stage name to a stage. Unknown names are kept as [`ProvenanceStage::External`].
    pub fn from_name(name: &str) -> Self {
        match name {
            "parser" => Self::Parser,
            "normalizer" => Self::Normalizer,
            "resolver" => Self::Resolver,
            "generator" => Self::Generator,
            other => Self::External(other.to_string()),
        }
    }
}

impl fmt::Display for ProvenanceStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parser => write!(f, "parser"),
            Self::Normalizer => write!(f, "normalizer"),
            Self::Resolver => write!(f, "resolver"),
            Self::Generator => write!(f, "generator"),
            Self::External(name) => write!(f, "{name}"),
        }
    }
}

/// A single record in a provenance stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvenanceEntry {
    origin: ProvenanceOrigin,
    stage: ProvenanceStage,
    tool: String,
    timestamp: DateTime<Utc>,
}

impl ProvenanceEntry {
    pub fn new(
        origin: ProvenanceOrigin,
        stage: ProvenanceStage,
        tool: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            origin,
            stage,
            tool: tool.into(),
            timestamp,
        }
    }

    pub fn origin(&self) -> &ProvenanceOrigin {
        &self.origin
    }

    pub fn stage(&self) -> &ProvenanceStage {
        &self.stage
    }

    pub fn tool(&self) -> &str {
        &self.tool
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Ordered, append-only record of the stages a value passed through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvenanceStack {
    version: u32,
    entries: Vec<ProvenanceEntry>,
}

impl Default for ProvenanceStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ProvenanceStack {
    /// Create an empty stack at the current layout version.
    pub fn new() -> Self {
        Self::with_version(PROVENANCE_VERSION)
    }

    /// Create an empty stack with an explicit version, as read from a document.
    pub fn with_version(version: u32) -> Self {
        Self {
            version,
            entries: Vec::new(),
        }
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn entries(&self) -> &[ProvenanceEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The most recent entry.
    pub fn latest(&self) -> Option<&ProvenanceEntry> {
        self.entries.last()
    }

    /// Origin of the most recent entry.
    pub fn origin(&self) -> Option<&ProvenanceOrigin> {
        self.latest().map(ProvenanceEntry::origin)
    }

    /// Append an entry.
    pub fn push(&mut self, entry: ProvenanceEntry) {
        self.entries.push(entry);
    }

    /// Return a copy of this stack with `entry` appended.
    pub fn extended(&self, entry: ProvenanceEntry) -> Self {
        let mut stack = self.clone();
        stack.push(entry);
        stack
    }

    /// Returns `true` if the stack is non-empty and its latest entry has a
    /// non-empty logical path.
    pub fn is_well_formed(&self) -> bool {
        self.origin()
            .is_some_and(|origin| !origin.logical_path().is_empty())
    }
}
