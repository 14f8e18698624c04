//! Source positions and the optional source-map overlay.
//!
//! Spans are byte offsets into the original, unmodified input. Line and
//! column numbers are 1-based; columns count chars, not bytes.

use serde::Serialize;
use std::fmt;

/// Half-open byte range `start..end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Zero-width span used for insertions.
    pub const fn empty(at: usize) -> Self {
        Self { start: at, end: at }
    }

    pub const fn len(self) -> usize {
        self.end - self.start
    }

    pub const fn is_empty(self) -> bool {
        self.start == self.end
    }

    pub const fn contains(self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }

    pub fn text(self, src: &str) -> &str {
        &src[self.start..self.end]
    }
}

/// A resolved location in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct Position {
    pub offset: usize,
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Pre-computed line start byte offsets for O(log n) position lookups.
#[derive(Debug, Clone)]
pub struct LineOffsetTable {
    line_starts: Vec<usize>,
}

impl LineOffsetTable {
    pub fn new(content: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, b) in content.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self { line_starts }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    fn line_index(&self, offset: usize) -> usize {
        self.line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1)
    }

    pub fn position(&self, content: &str, offset: usize) -> Position {
        let offset = offset.min(content.len());
        let line = self.line_index(offset);
        let line_start = self.line_starts[line];

        let column = content[line_start..offset].chars().count() as u32 + 1;

        Position {
            offset,
            line: line as u32 + 1,
            column,
        }
    }

    /// Byte offset where the line containing `offset` starts.
    pub fn line_start(&self, offset: usize) -> usize {
        self.line_starts[self.line_index(offset)]
    }

    /// Byte offset of the newline ending the line containing `offset`,
    /// or the end of the content for the last line.
    pub fn line_end(&self, content: &str, offset: usize) -> usize {
        let line = self.line_index(offset);
        self.line_starts
            .get(line + 1)
            .map_or(content.len(), |next| next - 1)
    }

    /// Leading whitespace of the line containing `offset`.
    pub fn indent_at<'a>(&self, content: &'a str, offset: usize) -> &'a str {
        let start = self.line_start(offset.min(content.len()));
        let line = &content[start..];
        let width = line.len() - line.trim_start_matches([' ', '\t']).len();
        &line[..width]
    }
}

/// Weak reference from a location back to the element it describes.
///
/// Indices point into the corresponding `Project` collection; the reference
/// never owns the element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "key", rename_all = "camelCase")]
pub enum ElementRef {
    Dependency(usize),
    Plugin(usize),
    Repository(usize),
    Property(String),
    DependencyBlock(usize),
}

/// Start and end of one recognized element in the original text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    pub element: ElementRef,
    pub start: Position,
    pub end: Position,
}

impl SourceLocation {
    pub const fn span(&self) -> Span {
        Span::new(self.start.offset, self.end.offset)
    }
}

/// Where a version lives, from the editor's point of view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum VersionAnchor {
    /// The version text itself, without quotes or separators.
    Literal(Span),
    /// The version interpolates or references a named property.
    Property(String),
    /// No version is declared; `prefix + version + suffix` goes at `at`.
    Insert {
        at: usize,
        prefix: String,
        suffix: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencySpans {
    pub location: SourceLocation,
    /// `None` when the version cannot be edited textually
    /// (project, file or catalog dependencies, computed expressions).
    pub version: Option<VersionAnchor>,
    /// Index into [`SourceMap::dependency_blocks`] for top-level blocks.
    pub block: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginSpans {
    pub location: SourceLocation,
    pub version: Option<VersionAnchor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertySpans {
    pub name: String,
    pub location: SourceLocation,
    /// Literal value bytes (string content or number), if the value is a literal.
    pub value: Option<Span>,
}

/// A top-level `dependencies { }` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockSpans {
    pub location: SourceLocation,
    /// Offset of `{`.
    pub open: usize,
    /// Offset of `}`.
    pub close: usize,
    /// Indentation of the line the block starts on.
    pub indent: String,
}

/// Position overlay produced by [`crate::GradleParser::parse_with_positions`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceMap {
    pub dependencies: Vec<DependencySpans>,
    pub plugins: Vec<PluginSpans>,
    pub repositories: Vec<SourceLocation>,
    pub properties: Vec<PropertySpans>,
    pub dependency_blocks: Vec<BlockSpans>,
}

impl SourceMap {
    /// Looks up the location recorded for an element.
    pub fn location_of(&self, element: &ElementRef) -> Option<&SourceLocation> {
        match element {
            ElementRef::Dependency(i) => self.dependencies.get(*i).map(|d| &d.location),
            ElementRef::Plugin(i) => self.plugins.get(*i).map(|p| &p.location),
            ElementRef::Repository(i) => self.repositories.get(*i),
            ElementRef::Property(name) => self.property(name).map(|p| &p.location),
            ElementRef::DependencyBlock(i) => self.dependency_blocks.get(*i).map(|b| &b.location),
        }
    }

    /// Last assignment of the named property; later assignments win.
    pub fn property(&self, name: &str) -> Option<&PropertySpans> {
        self.properties.iter().rev().find(|p| p.name == name)
    }
}
