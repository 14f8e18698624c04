//! `settings.gradle(.kts)` reader for multi-project builds.

use crate::error::ParseError;
use crate::parser::block::{self, Expr, Statement};
use crate::position::LineOffsetTable;
use crate::scanner::tokenize;
use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Settings file names, in lookup order.
pub const SETTINGS_FILES: &[&str] = &["settings.gradle.kts", "settings.gradle"];

static RE_PROJECT_DIR: OnceLock<Regex> = OnceLock::new();
static RE_LAST_QUOTED: OnceLock<Regex> = OnceLock::new();

fn re_project_dir() -> &'static Regex {
    RE_PROJECT_DIR.get_or_init(|| {
        Regex::new(r#"^project\(\s*['"]([^'"]+)['"]\s*\)\s*\.\s*projectDir$"#).unwrap()
    })
}

fn re_last_quoted() -> &'static Regex {
    RE_LAST_QUOTED.get_or_init(|| Regex::new(r#"['"]([^'"]+)['"]\s*\)\s*$"#).unwrap())
}

/// A project listed by `include`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncludedProject {
    /// Gradle project path, always starting with `:`.
    pub path: String,
    /// Directory relative to the settings file.
    pub dir: PathBuf,
}

impl IncludedProject {
    fn new(path: &str) -> Self {
        let path = normalize_project_path(path);
        let dir = PathBuf::from(path.trim_start_matches(':').replace(':', "/"));
        Self { path, dir }
    }

    /// Last segment of the project path.
    pub fn name(&self) -> &str {
        self.path.rsplit(':').next().unwrap_or_default()
    }
}

/// Path of the project enclosing `path` (`:` for top-level projects).
pub(crate) fn parent_path(path: &str) -> &str {
    match path.rfind(':') {
        Some(0) | None => ":",
        Some(idx) => &path[..idx],
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Empty when the settings file does not name the root project.
    pub root_project_name: String,
    pub includes: Vec<IncludedProject>,
}

fn normalize_project_path(path: &str) -> String {
    let path = path.trim();
    if path.starts_with(':') {
        path.to_string()
    } else {
        format!(":{path}")
    }
}

fn normalize_dir(dir: &str) -> PathBuf {
    let mut dir = dir.trim().replace('\\', "/");
    while let Some(rest) = dir.strip_prefix("./") {
        dir = rest.to_string();
    }
    while dir.ends_with('/') {
        dir.pop();
    }
    PathBuf::from(dir)
}

/// Directory given to `projectDir = file('x')` or `new File(settingsDir, 'x')`.
fn project_dir_value(src: &str, value: &Expr) -> Option<PathBuf> {
    if let Expr::Call(inv) = value
        && matches!(inv.name.as_str(), "file" | "File" | "java.io.File")
    {
        return inv
            .positional()
            .last()
            .and_then(|a| a.value.scalar(src))
            .map(normalize_dir);
    }
    re_last_quoted()
        .captures(value.text(src))
        .map(|caps| normalize_dir(&caps[1]))
}

/// Parses a settings script.
///
/// Duplicate includes are kept once, in first-seen order. `projectDir`
/// overrides apply regardless of where they appear.
pub fn parse_settings(text: &str) -> Result<Settings, ParseError> {
    let tokens = tokenize(text)?;
    let script = block::parse_script(text, &tokens, &LineOffsetTable::new(text))?;

    let mut settings = Settings::default();
    let mut overrides = Vec::new();

    for stmt in &script.statements {
        match stmt {
            Statement::Assign(a) if a.target == "rootProject.name" => {
                if let Some(name) = a.value.scalar(text) {
                    settings.root_project_name = name.to_string();
                }
            }
            Statement::Assign(a) => {
                if let Some(caps) = re_project_dir().captures(&a.target)
                    && let Some(dir) = project_dir_value(text, &a.value)
                {
                    overrides.push((normalize_project_path(&caps[1]), dir));
                }
            }
            Statement::Call(chain) if chain.head.name == "include" => {
                for arg in &chain.head.args {
                    let paths: Vec<&str> = match &arg.value {
                        Expr::List(items, _) => items.iter().filter_map(|e| e.scalar(text)).collect(),
                        other => other.scalar(text).into_iter().collect(),
                    };
                    for path in paths {
                        let project = IncludedProject::new(path);
                        if !settings.includes.iter().any(|p| p.path == project.path) {
                            settings.includes.push(project);
                        }
                    }
                }
            }
            _ => {}
        }
    }

    for (path, dir) in overrides {
        if let Some(project) = settings.includes.iter_mut().find(|p| p.path == path) {
            project.dir = dir;
        }
    }

    tracing::debug!(
        "settings: root '{}', {} included projects",
        settings.root_project_name,
        settings.includes.len()
    );
    Ok(settings)
}

/// First settings file present in `dir`.
pub fn find_settings(dir: &Path) -> Option<PathBuf> {
    SETTINGS_FILES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}
