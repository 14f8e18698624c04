//! Build-script parser entry points.
//!
//! One token-level grammar serves both DSLs: the scanner produces tokens, the
//! block parser turns them into a statement tree, and the model builder
//! lifts recognized statements into a [`Project`](crate::types::Project).
//! [`Dialect`] only matters to the editor, which formats new text in the
//! notation of the surrounding script.

pub mod block;
pub mod dependency;
pub mod plugin;
pub mod repository;
pub mod task;

use crate::builder::ModelBuilder;
use crate::config::ParserConfig;
use crate::error::{GradleError, ParseError, Result};
use crate::position::{LineOffsetTable, SourceMap};
use crate::scanner::{Token, tokenize};
use crate::types::{Comment, ParseResult, Project};
use regex::Regex;
use std::io::Read;
use std::path::Path;
use std::sync::OnceLock;
use std::time::Instant;

static RE_KOTLIN_HINTS: OnceLock<Regex> = OnceLock::new();
static RE_GROOVY_HINTS: OnceLock<Regex> = OnceLock::new();

fn re_kotlin_hints() -> &'static Regex {
    RE_KOTLIN_HINTS.get_or_init(|| {
        Regex::new(
            r#"(?m)^\s*(?:val|var|fun)\s+\w|\b\w+\("[^"]*"\)|\bby\s+extra\b|\bextra\[|::class|\w+\s*=\s*uri\("|\bisTransitive\b"#,
        )
        .unwrap()
    })
}

fn re_groovy_hints() -> &'static Regex {
    RE_GROOVY_HINTS.get_or_init(|| {
        Regex::new(r#"(?m)^\s*def\s+\w|\b\w+\s+'[^'\n]*'|\b\w+\s*:\s*['"]|\bext\s*\{|\bext\.\w+\s*="#)
            .unwrap()
    })
}

/// Gradle build-script flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dialect {
    #[default]
    Groovy,
    Kotlin,
}

impl Dialect {
    /// Dialect implied by a file name: `*.kts` is Kotlin, `*.gradle` Groovy.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("kts") => Some(Self::Kotlin),
            Some("gradle") => Some(Self::Groovy),
            _ => None,
        }
    }

    /// Guesses the dialect of in-memory text. Ties resolve to Groovy.
    pub fn detect(content: &str) -> Self {
        let kotlin = re_kotlin_hints().find_iter(content).count();
        let groovy = re_groovy_hints().find_iter(content).count();
        if kotlin > groovy {
            Self::Kotlin
        } else {
            Self::Groovy
        }
    }
}

/// Parse result with the source-position overlay the editor works from.
#[derive(Debug, Clone)]
pub struct PositionedParse {
    pub result: ParseResult,
    /// Empty when the document had a fatal error.
    pub source_map: SourceMap,
    pub dialect: Dialect,
}

/// Parses Gradle build scripts into [`Project`] models.
///
/// Holds only its configuration; cheap to copy and safe to share between
/// threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct GradleParser {
    config: ParserConfig,
}

impl GradleParser {
    pub const fn new(config: ParserConfig) -> Self {
        Self { config }
    }

    pub const fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parses build-script text. Structural errors are reported in
    /// [`ParseResult::errors`] with an empty project.
    pub fn parse_str(&self, content: &str) -> ParseResult {
        self.run(content, Dialect::detect(content), false).result
    }

    /// Parses with an explicit dialect instead of sniffing the content.
    pub fn parse_with_dialect(&self, content: &str, dialect: Dialect) -> ParseResult {
        self.run(content, dialect, false).result
    }

    /// Parses and records a [`SourceMap`] for every element.
    pub fn parse_with_positions(&self, content: &str) -> PositionedParse {
        self.run(content, Dialect::detect(content), true)
    }

    /// Reads and parses a build file. The dialect comes from the extension.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<ParseResult> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| GradleError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let dialect = Dialect::from_path(path).unwrap_or_else(|| Dialect::detect(&content));
        let mut result = self.run(&content, dialect, false).result;
        result.project.file_path = path.display().to_string();
        Ok(result)
    }

    pub fn parse_reader<R: Read>(&self, mut reader: R) -> Result<ParseResult> {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;
        Ok(self.parse_str(&content))
    }

    /// Parses a multi-project build rooted at `dir`, attaching every project
    /// listed in the settings script as a sub-project.
    pub fn parse_project_dir(&self, dir: impl AsRef<Path>) -> Result<ParseResult> {
        crate::discovery::parse_project_dir(self, dir.as_ref())
    }

    fn run(&self, content: &str, dialect: Dialect, track_positions: bool) -> PositionedParse {
        let started = Instant::now();
        let table = LineOffsetTable::new(content);

        let outcome = tokenize(content).and_then(|tokens| {
            let comments = if self.config.skip_comments {
                Vec::new()
            } else {
                collect_comments(content, &tokens, &table)
            };
            let script = block::parse_script(content, &tokens, &table)?;
            Ok((script, comments))
        });

        let (project, warnings, source_map, comments, errors) = match outcome {
            Ok((script, comments)) => {
                let out =
                    ModelBuilder::new(content, self.config, &table, track_positions).build(&script);
                (
                    out.project,
                    out.warnings,
                    out.source_map.unwrap_or_default(),
                    comments,
                    Vec::new(),
                )
            }
            Err(err) => {
                tracing::debug!("structural error: {}", err);
                (
                    Project::default(),
                    Vec::new(),
                    SourceMap::default(),
                    Vec::new(),
                    vec![err],
                )
            }
        };

        let parse_time = started.elapsed();
        tracing::debug!(
            "parsed {:?} script: {} dependencies, {} plugins, {} repositories, {} warnings in {:?}",
            dialect,
            project.dependencies.len(),
            project.plugins.len(),
            project.repositories.len(),
            warnings.len(),
            parse_time
        );

        PositionedParse {
            result: ParseResult {
                project,
                raw_text: self.config.collect_raw_content.then(|| content.to_string()),
                errors,
                warnings,
                parse_time,
                comments,
            },
            source_map,
            dialect,
        }
    }
}

fn collect_comments(content: &str, tokens: &[Token], table: &LineOffsetTable) -> Vec<Comment> {
    tokens
        .iter()
        .filter(|t| t.kind.is_comment())
        .map(|t| Comment {
            text: t.text(content).to_string(),
            at: table.position(content, t.span.start),
        })
        .collect()
}

/// Parses `content` with the default configuration.
pub fn parse_gradle(content: &str) -> ParseResult {
    GradleParser::default().parse_str(content)
}

/// First statement of `src` as a call chain.
#[cfg(test)]
pub(crate) fn parse_chain(src: &str) -> block::CallChain {
    let tokens = tokenize(src).unwrap();
    let table = LineOffsetTable::new(src);
    let script = block::parse_script(src, &tokens, &table).unwrap();
    match script.statements.into_iter().next() {
        Some(block::Statement::Call(chain)) => chain,
        other => panic!("expected a call, got {other:?}"),
    }
}

/// Returns the structural error of `src`, if any.
pub fn check_structure(src: &str) -> std::result::Result<(), ParseError> {
    let tokens = tokenize(src)?;
    block::parse_script(src, &tokens, &LineOffsetTable::new(src)).map(|_| ())
}
