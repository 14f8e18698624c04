//! Build-file discovery and multi-project loading.

use crate::error::{GradleError, Result, Warning};
use crate::parser::GradleParser;
use crate::settings::{IncludedProject, find_settings, parent_path, parse_settings};
use crate::types::{ParseResult, Project};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;
use walkdir::WalkDir;

/// Build script names, in lookup order.
pub const BUILD_FILES: &[&str] = &["build.gradle.kts", "build.gradle"];

const SKIP_DIRS: &[&str] = &["build", ".gradle", ".git", ".idea", "node_modules", "out"];

/// Whether `path` names a Gradle build script (settings and init scripts
/// excluded).
pub fn is_build_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let is_script = name.ends_with(".gradle") || name.ends_with(".gradle.kts");
    let is_settings = name.starts_with("settings.gradle") || name.starts_with("init.gradle");
    is_script && !is_settings
}

/// Build scripts under `root`, sorted by path. Build output and tool
/// directories are not descended into.
pub fn find_build_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 || !entry.file_type().is_dir() {
                return true;
            }
            let name = entry.file_name().to_string_lossy();
            !SKIP_DIRS.contains(&name.as_ref())
        })
    {
        let entry = entry.map_err(|err| GradleError::Io {
            path: err.path().unwrap_or(root).to_path_buf(),
            source: err.into(),
        })?;
        if entry.file_type().is_file() && is_build_file(entry.path()) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    tracing::debug!("found {} build files under {}", files.len(), root.display());
    Ok(files)
}

/// Parses every file in parallel. Results keep the order of `paths`.
pub fn parse_all(parser: &GradleParser, paths: &[PathBuf]) -> Vec<(PathBuf, Result<ParseResult>)> {
    paths
        .par_iter()
        .map(|path| (path.clone(), parser.parse_file(path)))
        .collect()
}

fn find_build_file(dir: &Path) -> Option<PathBuf> {
    BUILD_FILES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

/// Nearest included ancestor of `project`, or `:` for the root.
fn owner<'a>(project: &IncludedProject, includes: &'a [IncludedProject]) -> &'a str {
    let mut path = parent_path(&project.path);
    while path != ":" {
        if let Some(parent) = includes.iter().find(|p| p.path == path) {
            return &parent.path;
        }
        path = parent_path(path);
    }
    ":"
}

struct Loader<'a> {
    parser: &'a GradleParser,
    root: &'a Path,
    includes: &'a [IncludedProject],
    warnings: Vec<Warning>,
}

impl Loader<'_> {
    fn children(&mut self, parent: &str) -> Vec<Project> {
        let includes = self.includes;
        includes
            .iter()
            .filter(|p| owner(p, includes) == parent)
            .map(|p| self.load(p))
            .collect()
    }

    fn load(&mut self, included: &IncludedProject) -> Project {
        let dir = self.root.join(&included.dir);
        let mut project = match find_build_file(&dir) {
            Some(path) => match self.parser.parse_file(&path) {
                Ok(result) => {
                    for warning in result.warnings {
                        self.warnings
                            .push(Warning::detached(format!("{}: {warning}", included.path)));
                    }
                    for err in result.errors {
                        self.warnings
                            .push(Warning::detached(format!("{}: {err}", included.path)));
                    }
                    result.project
                }
                Err(err) => {
                    self.warnings
                        .push(Warning::detached(format!("{}: {err}", included.path)));
                    Project::default()
                }
            },
            None => Project::default(),
        };
        if project.name.is_empty() {
            project.name = included.name().to_string();
        }
        project.sub_projects = self.children(&included.path);
        project
    }
}

/// Parses the build rooted at `dir` together with every project its
/// settings script includes.
///
/// Problems in sub-project scripts do not fail the call; they are reported
/// as warnings prefixed with the project path.
pub(crate) fn parse_project_dir(parser: &GradleParser, dir: &Path) -> Result<ParseResult> {
    let started = Instant::now();
    let build_file = find_build_file(dir);
    let settings_file = find_settings(dir);
    if build_file.is_none() && settings_file.is_none() {
        return Err(GradleError::NoBuildScript {
            dir: dir.to_path_buf(),
        });
    }

    let mut result = match &build_file {
        Some(path) => parser.parse_file(path)?,
        None => ParseResult {
            project: Project::default(),
            raw_text: None,
            errors: Vec::new(),
            warnings: Vec::new(),
            parse_time: started.elapsed(),
            comments: Vec::new(),
        },
    };

    let settings = match &settings_file {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|source| GradleError::Io {
                path: path.clone(),
                source,
            })?;
            parse_settings(&text)?
        }
        None => Default::default(),
    };

    result.project.name = if settings.root_project_name.is_empty() {
        dir.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    } else {
        settings.root_project_name.clone()
    };

    let mut loader = Loader {
        parser,
        root: dir,
        includes: &settings.includes,
        warnings: Vec::new(),
    };
    result.project.sub_projects = loader.children(":");
    result.warnings.extend(loader.warnings);
    result.parse_time = started.elapsed();

    tracing::debug!(
        "loaded project '{}' with {} included projects in {:?}",
        result.project.name,
        settings.includes.len(),
        result.parse_time
    );
    Ok(result)
}
