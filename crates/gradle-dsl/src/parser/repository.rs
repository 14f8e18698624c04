//! Repository declarations inside `repositories { }`.

use super::block::{Block, CallChain, Expr, Statement};
use crate::types::{Repository, RepositoryType};

const WELL_KNOWN: &[(&str, RepositoryType, &str)] = &[
    (
        "mavenCentral",
        RepositoryType::MavenCentral,
        "https://repo.maven.apache.org/maven2/",
    ),
    (
        "google",
        RepositoryType::Google,
        "https://dl.google.com/dl/android/maven2/",
    ),
    (
        "jcenter",
        RepositoryType::Jcenter,
        "https://jcenter.bintray.com/",
    ),
    (
        "gradlePluginPortal",
        RepositoryType::GradlePluginPortal,
        "https://plugins.gradle.org/m2/",
    ),
    ("mavenLocal", RepositoryType::MavenLocal, ""),
];

/// String value of a URL-ish expression: `"..."`, `uri("...")`, `file("...")`.
fn url_value(src: &str, expr: &Expr) -> String {
    match expr {
        Expr::Call(inv) if matches!(inv.name.as_str(), "uri" | "file" | "URI") => inv
            .first_arg()
            .map_or_else(String::new, |arg| url_value(src, arg)),
        other => other
            .scalar(src)
            .map_or_else(|| other.text(src).to_string(), str::to_string),
    }
}

/// Reads `key value`, `key = value` or `setKey(value)` from a closure body.
fn closure_setting(src: &str, block: &Block, key: &str) -> Option<String> {
    let setter = format!("set{}{}", key[..1].to_ascii_uppercase(), &key[1..]);
    block.statements.iter().rev().find_map(|stmt| match stmt {
        Statement::Assign(a) if a.target == key => Some(url_value(src, &a.value)),
        Statement::Call(c) if c.head.name == key || c.head.name == setter => {
            c.head.first_arg().map(|arg| url_value(src, arg))
        }
        _ => None,
    })
}

fn credentials(block: &Block) -> Option<&Block> {
    block.statements.iter().find_map(|stmt| match stmt {
        Statement::Call(c) if c.head.name == "credentials" => c.closure(),
        _ => None,
    })
}

/// Parses one statement of a `repositories { }` block.
///
/// Unknown statements come back as `Err` with a warning message.
pub fn parse_repository(src: &str, chain: &CallChain) -> Result<Repository, String> {
    let head = &chain.head;
    let closure = chain.closure();

    if let Some((name, repo_type, url)) = WELL_KNOWN.iter().find(|(n, ..)| *n == head.name) {
        return Ok(Repository {
            name: (*name).to_string(),
            repo_type: *repo_type,
            url: (*url).to_string(),
            username: None,
            password: None,
        });
    }

    match head.name.as_str() {
        "maven" | "ivy" => {
            let mut url = head
                .named("url")
                .map(|a| &a.value)
                .or_else(|| head.positional().next().map(|a| &a.value))
                .map(|e| url_value(src, e))
                .unwrap_or_default();
            let mut name = head.name.clone();
            let mut username = None;
            let mut password = None;

            if let Some(block) = closure {
                if let Some(value) = closure_setting(src, block, "url") {
                    url = value;
                }
                if let Some(value) = closure_setting(src, block, "name") {
                    name = value;
                }
                if let Some(creds) = credentials(block) {
                    username = closure_setting(src, creds, "username");
                    password = closure_setting(src, creds, "password");
                }
            }

            let repo_type = if url.contains("jitpack.io") {
                RepositoryType::Jitpack
            } else if head.name == "ivy" {
                RepositoryType::Ivy
            } else {
                RepositoryType::Maven
            };

            Ok(Repository {
                name,
                repo_type,
                url,
                username,
                password,
            })
        }
        "flatDir" => {
            let dirs = head
                .named("dirs")
                .map(|a| &a.value)
                .or_else(|| head.first_arg())
                .map(|e| first_dir(src, e))
                .or_else(|| closure.and_then(|b| closure_setting(src, b, "dirs")))
                .unwrap_or_default();
            let name = closure
                .and_then(|b| closure_setting(src, b, "name"))
                .unwrap_or_else(|| "flatDir".to_string());
            Ok(Repository {
                name,
                repo_type: RepositoryType::FlatDir,
                url: dirs,
                username: None,
                password: None,
            })
        }
        other => {
            // Vendor repository helpers (`artifactory { url = ... }`) are kept
            // when they name a URL.
            let url = head
                .named("url")
                .map(|a| url_value(src, &a.value))
                .or_else(|| closure.and_then(|b| closure_setting(src, b, "url")))
                .filter(|url| !url.is_empty())
                .ok_or_else(|| format!("unrecognized repository declaration '{other}'"))?;
            Ok(Repository {
                name: other.to_string(),
                repo_type: RepositoryType::Custom,
                url,
                username: None,
                password: None,
            })
        }
    }
}

fn first_dir(src: &str, expr: &Expr) -> String {
    match expr {
        Expr::List(items, _) => items.first().map_or_else(String::new, |e| url_value(src, e)),
        other => url_value(src, other),
    }
}
