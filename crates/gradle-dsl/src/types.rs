//! Domain types for parsed Gradle build scripts.
//!
//! All records are plain values created once per parse. Field names serialize
//! as camelCase.

use crate::error::{ParseError, Warning};
use crate::position::Position;
use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use std::time::Duration;

/// One Gradle project, as declared by a single build script.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub group: String,
    pub name: String,
    pub version: String,
    pub description: String,
    pub source_compatibility: String,
    pub target_compatibility: String,
    pub properties: IndexMap<String, String>,
    pub plugins: Vec<Plugin>,
    pub dependencies: Vec<Dependency>,
    pub repositories: Vec<Repository>,
    pub sub_projects: Vec<Self>,
    pub tasks: Vec<Task>,
    /// Unmodeled DSL blocks: name to verbatim body (array when repeated).
    pub extensions: IndexMap<String, serde_json::Value>,
    pub file_path: String,
}

/// Dependencies of one configuration, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencySet<'a> {
    pub scope: &'a str,
    pub dependencies: Vec<&'a Dependency>,
}

impl Project {
    /// Groups dependencies by scope, ordered by first appearance.
    pub fn dependency_sets(&self) -> Vec<DependencySet<'_>> {
        let mut sets: Vec<DependencySet<'_>> = Vec::new();
        for dep in &self.dependencies {
            match sets.iter_mut().find(|s| s.scope == dep.scope) {
                Some(set) => set.dependencies.push(dep),
                None => sets.push(DependencySet {
                    scope: &dep.scope,
                    dependencies: vec![dep],
                }),
            }
        }
        sets
    }

    pub fn find_dependency(&self, group: &str, name: &str) -> Option<&Dependency> {
        self.dependencies
            .iter()
            .find(|d| d.group == group && d.name == name)
    }

    pub fn plugin(&self, id: &str) -> Option<&Plugin> {
        self.plugins.iter().find(|p| p.id == id)
    }
}

/// What a dependency declaration refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    /// External module coordinates.
    #[default]
    Module,
    /// Another project of the same build: `project(":core")`.
    Project,
    /// Local files: `files(...)`, `fileTree(...)` or a path string.
    File,
    /// Version catalog accessor: `libs.guava`.
    Catalog,
    /// A variable or expression the parser does not evaluate.
    Reference,
    /// Gradle-provided: `gradleApi()`, `localGroovy()`, `gradleTestKit()`.
    Builtin,
    /// Unrecognized notation; only `raw` is populated.
    Invalid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependency {
    pub group: String,
    pub name: String,
    pub version: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub classifier: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub extension: String,
    pub scope: String,
    pub transitive: bool,
    pub kind: DependencyKind,
    pub raw: String,
}

impl Default for Dependency {
    fn default() -> Self {
        Self {
            group: String::new(),
            name: String::new(),
            version: String::new(),
            classifier: String::new(),
            extension: String::new(),
            scope: String::new(),
            transitive: true,
            kind: DependencyKind::Module,
            raw: String::new(),
        }
    }
}

impl Dependency {
    pub fn new(group: impl Into<String>, name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
            version: version.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    /// `group:name[:version[:classifier]][@ext]`, skipping empty parts.
    pub fn coordinates(&self) -> String {
        let mut out = format!("{}:{}", self.group, self.name);
        if !self.version.is_empty() || !self.classifier.is_empty() {
            out.push(':');
            out.push_str(&self.version);
        }
        if !self.classifier.is_empty() {
            out.push(':');
            out.push_str(&self.classifier);
        }
        if !self.extension.is_empty() {
            out.push('@');
            out.push_str(&self.extension);
        }
        out
    }

    /// A dependency is valid when it names something.
    pub fn is_valid(&self) -> bool {
        !self.group.is_empty() || !self.name.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Plugin {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub apply: bool,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub config: IndexMap<String, String>,
}

impl Plugin {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: None,
            apply: true,
            config: IndexMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RepositoryType {
    MavenCentral,
    Google,
    Jcenter,
    MavenLocal,
    GradlePluginPortal,
    Jitpack,
    Maven,
    Ivy,
    FlatDir,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Repository {
    pub name: String,
    #[serde(rename = "type")]
    pub repo_type: RepositoryType,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub name: String,
    #[serde(rename = "type")]
    pub task_type: String,
    /// Closure body, trimmed but otherwise verbatim.
    pub configuration: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub group: String,
}

/// A source comment, collected when `skipComments` is off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comment {
    pub text: String,
    pub at: Position,
}

/// Outcome of one parse call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseResult {
    pub project: Project,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
    #[serde(serialize_with = "display_strings")]
    pub errors: Vec<ParseError>,
    #[serde(serialize_with = "display_strings")]
    pub warnings: Vec<Warning>,
    #[serde(serialize_with = "duration_string")]
    pub parse_time: Duration,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<Comment>,
}

impl ParseResult {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the project, or the first fatal error.
    pub fn into_result(self) -> Result<Project, ParseError> {
        match self.errors.into_iter().next() {
            Some(err) => Err(err),
            None => Ok(self.project),
        }
    }
}

fn display_strings<S, T>(items: &[T], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: std::fmt::Display,
{
    serializer.collect_seq(items.iter().map(ToString::to_string))
}

fn duration_string<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{value:?}"))
}
