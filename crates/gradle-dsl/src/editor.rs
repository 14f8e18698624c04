//! Structured, minimal-diff editing of build-script text.
//!
//! Every operation re-parses the input with positions, plans a set of
//! [`TextEdit`]s against the [`SourceMap`], and splices them into a copy of the
//! original text. Bytes outside the planned spans are never touched.

use crate::builder::property_key;
use crate::config::ParserConfig;
use crate::error::EditError;
use crate::parser::{Dialect, GradleParser, PositionedParse};
use crate::position::{LineOffsetTable, SourceMap, Span, VersionAnchor};
use crate::types::{Dependency, Project};

/// Replacement of `span` with `new_text`. An empty span is an insertion.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextEdit {
    pub span: Span,
    pub new_text: String,
}

impl TextEdit {
    pub fn replace(span: Span, new_text: impl Into<String>) -> Self {
        Self {
            span,
            new_text: new_text.into(),
        }
    }

    pub fn insert(at: usize, new_text: impl Into<String>) -> Self {
        Self::replace(Span::empty(at), new_text)
    }
}

/// Applies edits to `text`, last offset first.
///
/// Identical edits are applied once. Overlapping edits, and two insertions
/// at the same offset, are rejected.
pub fn apply_edits(text: &str, mut edits: Vec<TextEdit>) -> Result<String, EditError> {
    for edit in &edits {
        let Span { start, end } = edit.span;
        if start > end
            || end > text.len()
            || !text.is_char_boundary(start)
            || !text.is_char_boundary(end)
        {
            return Err(EditError::InvalidSpan { start, end });
        }
    }

    edits.sort_by(|a, b| b.span.cmp(&a.span).then_with(|| a.new_text.cmp(&b.new_text)));
    edits.dedup();

    for pair in edits.windows(2) {
        let (later, earlier) = (&pair[0], &pair[1]);
        if earlier.span.end > later.span.start || earlier.span.start == later.span.start {
            return Err(EditError::OverlappingEdits {
                offset: later.span.start,
            });
        }
    }

    let mut out = text.to_string();
    for edit in &edits {
        out.replace_range(edit.span.start..edit.span.end, &edit.new_text);
    }
    Ok(out)
}

/// One change to make to a build script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditRequest {
    /// Set the version of `group:name`, optionally only within `scope`.
    DependencyVersion {
        group: String,
        name: String,
        scope: Option<String>,
        version: String,
    },
    PluginVersion { id: String, version: String },
    AddDependency { scope: String, dependency: Dependency },
}

fn validate_literal(value: &str, what: &'static str) -> Result<(), EditError> {
    let reason = if value.trim().is_empty() {
        Some(what)
    } else if value.contains(['\'', '"', '\n', '\r', '$', '\\']) {
        Some("value must be a plain literal")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(EditError::InvalidValue {
            value: value.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

/// Plans edits against one parse of a document.
#[derive(Debug)]
pub struct StructuredEditor<'a> {
    text: &'a str,
    parsed: PositionedParse,
    table: LineOffsetTable,
}

impl<'a> StructuredEditor<'a> {
    /// Parses `text`; structural errors fail with [`EditError::Parse`].
    pub fn new(text: &'a str) -> Result<Self, EditError> {
        let parser = GradleParser::new(ParserConfig::default().with_collect_raw_content(false));
        let parsed = parser.parse_with_positions(text);
        if let Some(err) = parsed.result.errors.first() {
            return Err(err.clone().into());
        }
        Ok(Self {
            text,
            parsed,
            table: LineOffsetTable::new(text),
        })
    }

    pub const fn dialect(&self) -> Dialect {
        self.parsed.dialect
    }

    pub const fn project(&self) -> &Project {
        &self.parsed.result.project
    }

    pub const fn source_map(&self) -> &SourceMap {
        &self.parsed.source_map
    }

    /// Edits that would carry out `request`.
    pub fn plan(&self, request: &EditRequest) -> Result<TextEdit, EditError> {
        match request {
            EditRequest::DependencyVersion {
                group,
                name,
                scope,
                version,
            } => self.dependency_version(group, name, scope.as_deref(), version),
            EditRequest::PluginVersion { id, version } => self.plugin_version(id, version),
            EditRequest::AddDependency { scope, dependency } => {
                self.add_dependency(scope, dependency)
            }
        }
    }

    /// Plans every request against the same parse and applies them together.
    pub fn apply(&self, requests: &[EditRequest]) -> Result<String, EditError> {
        let mut edits: Vec<TextEdit> = Vec::with_capacity(requests.len());
        for request in requests {
            let edit = self.plan(request)?;
            // Insertions at one point are joined in request order.
            if edit.span.is_empty()
                && let Some(prev) = edits
                    .iter_mut()
                    .find(|e| e.span == edit.span && e.new_text != edit.new_text)
            {
                prev.new_text.push_str(&edit.new_text);
                continue;
            }
            edits.push(edit);
        }
        let count = edits.len();
        let out = apply_edits(self.text, edits)?;
        tracing::debug!(
            "applied {} edits for {} requests ({:?})",
            count,
            requests.len(),
            self.dialect()
        );
        Ok(out)
    }

    fn dependency_version(
        &self,
        group: &str,
        name: &str,
        scope: Option<&str>,
        version: &str,
    ) -> Result<TextEdit, EditError> {
        validate_literal(version, "version must not be empty")?;
        let key = format!("{group}:{name}");
        let matches: Vec<usize> = self
            .project()
            .dependencies
            .iter()
            .enumerate()
            .filter(|(_, d)| d.group == group && d.name == name)
            .filter(|(_, d)| scope.is_none_or(|s| d.scope == s))
            .map(|(i, _)| i)
            .collect();

        let idx = match matches.as_slice() {
            [] => {
                return Err(EditError::NotFound {
                    element: "dependency",
                    key,
                });
            }
            [idx] => *idx,
            many => {
                return Err(EditError::Ambiguous {
                    element: "dependency",
                    key,
                    count: many.len(),
                });
            }
        };

        let anchor = self
            .source_map()
            .dependencies
            .get(idx)
            .and_then(|d| d.version.as_ref());
        self.anchor_edit("dependency", &key, anchor, version)
    }

    fn plugin_version(&self, id: &str, version: &str) -> Result<TextEdit, EditError> {
        validate_literal(version, "version must not be empty")?;
        let matches: Vec<usize> = self
            .project()
            .plugins
            .iter()
            .enumerate()
            .filter(|(_, p)| p.id == id)
            .map(|(i, _)| i)
            .collect();

        let idx = match matches.as_slice() {
            [] => {
                return Err(EditError::NotFound {
                    element: "plugin",
                    key: id.to_string(),
                });
            }
            [idx] => *idx,
            many => {
                return Err(EditError::Ambiguous {
                    element: "plugin",
                    key: id.to_string(),
                    count: many.len(),
                });
            }
        };

        let anchor = self
            .source_map()
            .plugins
            .get(idx)
            .and_then(|p| p.version.as_ref());
        self.anchor_edit("plugin", id, anchor, version)
    }

    fn anchor_edit(
        &self,
        element: &'static str,
        key: &str,
        anchor: Option<&VersionAnchor>,
        version: &str,
    ) -> Result<TextEdit, EditError> {
        let not_editable = |reason: String| EditError::NotEditable {
            element,
            key: key.to_string(),
            reason,
        };

        match anchor {
            None => Err(not_editable(
                "declaration has no editable version".to_string(),
            )),
            Some(VersionAnchor::Literal(span)) => Ok(TextEdit::replace(*span, version)),
            Some(VersionAnchor::Insert { at, prefix, suffix }) => {
                Ok(TextEdit::insert(*at, format!("{prefix}{version}{suffix}")))
            }
            Some(VersionAnchor::Property(name)) => {
                let prop_name = property_key(name).unwrap_or_else(|| name.clone());
                let prop = self.source_map().property(&prop_name).ok_or_else(|| {
                    not_editable(format!("property '{name}' is not defined in this script"))
                })?;
                let span = prop.value.ok_or_else(|| {
                    not_editable(format!("property '{name}' is not a literal"))
                })?;
                let quoted = span.start > 0
                    && matches!(self.text.as_bytes()[span.start - 1], b'"' | b'\'');
                if quoted {
                    Ok(TextEdit::replace(span, version))
                } else {
                    Ok(TextEdit::replace(span, format!("\"{version}\"")))
                }
            }
        }
    }

    /// Declaration of `notation` under `scope`, shaped like the declarations
    /// already in the first `dependencies` block, or by dialect when there are
    /// none.
    fn statement(&self, scope: &str, notation: &str) -> String {
        let (parenthesized, quote) = self.declaration_style().unwrap_or(match self.dialect() {
            Dialect::Groovy => (false, '\''),
            Dialect::Kotlin => (true, '"'),
        });
        if parenthesized {
            format!("{scope}({quote}{notation}{quote})")
        } else {
            format!("{scope} {quote}{notation}{quote}")
        }
    }

    /// Whether neighbouring declarations wrap their argument in parentheses,
    /// and the quote character they use.
    fn declaration_style(&self) -> Option<(bool, char)> {
        let dependencies = &self.project().dependencies;
        let mut parenthesized = None;
        let mut quote = None;
        for (i, spans) in self.source_map().dependencies.iter().enumerate() {
            if spans.block != Some(0) {
                continue;
            }
            let text = spans.location.span().text(self.text);
            if parenthesized.is_none()
                && let Some(rest) = text.strip_prefix(dependencies[i].scope.as_str())
            {
                parenthesized = Some(rest.trim_start().starts_with('('));
            }
            if quote.is_none() {
                quote = text.chars().find(|c| matches!(c, '\'' | '"'));
            }
        }
        let parenthesized = parenthesized?;
        // Double quotes read as a string in both dialects.
        let fallback = if parenthesized { '"' } else { '\'' };
        Some((parenthesized, quote.unwrap_or(fallback)))
    }

    fn add_dependency(&self, scope: &str, dependency: &Dependency) -> Result<TextEdit, EditError> {
        let valid_scope = !scope.is_empty()
            && scope.chars().all(|c| c.is_alphanumeric() || c == '_');
        if !valid_scope {
            return Err(EditError::InvalidValue {
                value: scope.to_string(),
                reason: "scope must be an identifier",
            });
        }
        if !dependency.is_valid() {
            return Err(EditError::InvalidValue {
                value: dependency.coordinates(),
                reason: "dependency needs a group or name",
            });
        }
        let notation = dependency.coordinates();
        validate_literal(&notation, "dependency notation must not be empty")?;
        let statement = self.statement(scope, &notation);

        let map = self.source_map();
        let Some(block) = map.dependency_blocks.first() else {
            return Ok(self.append_block(&statement));
        };

        let in_block: Vec<(usize, Span)> = map
            .dependencies
            .iter()
            .enumerate()
            .filter(|(_, d)| d.block == Some(0))
            .map(|(i, d)| (i, d.location.span()))
            .collect();

        let same_scope = in_block
            .iter()
            .rev()
            .find(|(i, _)| self.project().dependencies[*i].scope == scope);

        if let Some((_, span)) = same_scope {
            let indent = self.table.indent_at(self.text, span.start);
            let line_end = self.table.line_end(self.text, span.end);
            let at = if line_end > block.close {
                span.end
            } else {
                line_end
            };
            return Ok(TextEdit::insert(at, format!("\n{indent}{statement}")));
        }

        let unit = if block.indent.contains('\t') { "\t" } else { "    " };
        let inner_indent = in_block.last().map_or_else(
            || format!("{}{unit}", block.indent),
            |(_, span)| self.table.indent_at(self.text, span.start).to_string(),
        );
        let close_line = self.table.line_start(block.close);
        if self.text[close_line..block.close].trim().is_empty() {
            Ok(TextEdit::insert(
                close_line,
                format!("{inner_indent}{statement}\n"),
            ))
        } else {
            Ok(TextEdit::insert(
                block.close,
                format!("\n{inner_indent}{statement}\n{}", block.indent),
            ))
        }
    }

    fn append_block(&self, statement: &str) -> TextEdit {
        let mut text = String::new();
        if !self.text.is_empty() && !self.text.ends_with('\n') {
            text.push('\n');
        }
        if !self.text.trim().is_empty() {
            text.push('\n');
        }
        text.push_str("dependencies {\n    ");
        text.push_str(statement);
        text.push_str("\n}\n");
        TextEdit::insert(self.text.len(), text)
    }
}

/// Sets the version of the single dependency `group:name`.
pub fn update_dependency_version(
    text: &str,
    group: &str,
    name: &str,
    new_version: &str,
) -> Result<String, EditError> {
    apply_requests(
        text,
        &[EditRequest::DependencyVersion {
            group: group.to_string(),
            name: name.to_string(),
            scope: None,
            version: new_version.to_string(),
        }],
    )
}

/// Like [`update_dependency_version`], restricted to one configuration.
pub fn update_dependency_version_in_scope(
    text: &str,
    scope: &str,
    group: &str,
    name: &str,
    new_version: &str,
) -> Result<String, EditError> {
    apply_requests(
        text,
        &[EditRequest::DependencyVersion {
            group: group.to_string(),
            name: name.to_string(),
            scope: Some(scope.to_string()),
            version: new_version.to_string(),
        }],
    )
}

pub fn update_plugin_version(
    text: &str,
    plugin_id: &str,
    new_version: &str,
) -> Result<String, EditError> {
    apply_requests(
        text,
        &[EditRequest::PluginVersion {
            id: plugin_id.to_string(),
            version: new_version.to_string(),
        }],
    )
}

/// Adds `dependency` under `scope`, next to existing declarations of that
/// scope when there are any.
pub fn add_dependency(text: &str, scope: &str, dependency: &Dependency) -> Result<String, EditError> {
    apply_requests(
        text,
        &[EditRequest::AddDependency {
            scope: scope.to_string(),
            dependency: dependency.clone(),
        }],
    )
}

pub fn apply_requests(text: &str, requests: &[EditRequest]) -> Result<String, EditError> {
    StructuredEditor::new(text)?.apply(requests)
}
