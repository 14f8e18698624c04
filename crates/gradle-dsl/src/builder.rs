//! Aggregates recognized statements into a [`Project`].
//!
//! Walks the top level of the statement tree, dispatching well-known blocks
//! to their sub-parsers. Closures the builder has no model for are kept
//! verbatim in `Project::extensions`.

use crate::config::ParserConfig;
use crate::error::Warning;
use crate::parser::block::{AssignOp, Assignment, Block, CallChain, Expr, Script, Statement};
use crate::parser::dependency::parse_declaration;
use crate::parser::plugin::{ParsedPlugin, parse_apply, parse_plugin};
use crate::parser::repository::parse_repository;
use crate::parser::task::{parse_task, parse_tasks_member};
use crate::position::{
    BlockSpans, DependencySpans, ElementRef, LineOffsetTable, PluginSpans, PropertySpans,
    SourceLocation, SourceMap, Span,
};
use crate::types::Project;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

static RE_JAVA_VERSION: OnceLock<Regex> = OnceLock::new();
static RE_LANGUAGE_VERSION: OnceLock<Regex> = OnceLock::new();
static RE_EXTRA_INDEX: OnceLock<Regex> = OnceLock::new();

fn re_java_version() -> &'static Regex {
    RE_JAVA_VERSION
        .get_or_init(|| Regex::new(r"^(?:JavaVersion\.)?VERSION_(\d+)(?:_(\d+))?$").unwrap())
}

fn re_language_version() -> &'static Regex {
    RE_LANGUAGE_VERSION.get_or_init(|| {
        Regex::new(r#"JavaLanguageVersion\.of\(\s*["']?(\d+)["']?\s*\)"#).unwrap()
    })
}

fn re_extra_index() -> &'static Regex {
    RE_EXTRA_INDEX.get_or_init(|| {
        Regex::new(r#"^(?:(?:root)?[pP]roject\.)?(?:extra|ext)\[\s*["']([^"']+)["']\s*\]$"#)
            .unwrap()
    })
}

/// Statements that never describe project model data.
const CONTROL_KEYWORDS: &[&str] = &[
    "if", "else", "for", "while", "try", "catch", "finally", "when", "import", "package", "fun",
    "return", "throw", "println",
];

const SETTERS: &[&str] = &[
    "set",
    "ext.set",
    "extra.set",
    "project.ext.set",
    "project.extra.set",
    "rootProject.ext.set",
    "rootProject.extra.set",
];

/// `JavaVersion.VERSION_1_8` becomes `1.8`, `JavaLanguageVersion.of(17)`
/// becomes `17`; anything else is returned trimmed.
pub(crate) fn normalize_java_version(raw: &str) -> String {
    let raw = raw.trim().trim_matches(['"', '\'']);
    if let Some(caps) = re_java_version().captures(raw) {
        return match caps.get(2) {
            Some(minor) => format!("{}.{}", &caps[1], minor.as_str()),
            None => caps[1].to_string(),
        };
    }
    if let Some(caps) = re_language_version().captures(raw) {
        return caps[1].to_string();
    }
    raw.to_string()
}

/// Maps an assignment target or interpolated reference to the property key
/// it defines: `ext.v`, `project.ext.v`, `extra["v"]` and `v` all become `v`.
pub(crate) fn property_key(target: &str) -> Option<String> {
    if let Some(caps) = re_extra_index().captures(target) {
        return Some(caps[1].to_string());
    }
    let mut key = target;
    for prefix in ["rootProject.", "project."] {
        key = key.strip_prefix(prefix).unwrap_or(key);
    }
    for prefix in ["ext.", "extra."] {
        if let Some(rest) = key.strip_prefix(prefix) {
            key = rest;
            break;
        }
    }
    let simple = key
        .chars()
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && key.chars().all(|c| c.is_alphanumeric() || c == '_');
    simple.then(|| key.to_string())
}

pub(crate) struct BuildOutput {
    pub(crate) project: Project,
    pub(crate) warnings: Vec<Warning>,
    pub(crate) source_map: Option<SourceMap>,
}

pub(crate) struct ModelBuilder<'a> {
    src: &'a str,
    config: ParserConfig,
    table: &'a LineOffsetTable,
    project: Project,
    warnings: Vec<Warning>,
    map: Option<SourceMap>,
    toolchain: Option<String>,
}

impl<'a> ModelBuilder<'a> {
    pub(crate) fn new(
        src: &'a str,
        config: ParserConfig,
        table: &'a LineOffsetTable,
        track_positions: bool,
    ) -> Self {
        Self {
            src,
            config,
            table,
            project: Project::default(),
            warnings: Vec::new(),
            map: track_positions.then(SourceMap::default),
            toolchain: None,
        }
    }

    pub(crate) fn build(mut self, script: &Script) -> BuildOutput {
        for stmt in &script.statements {
            match stmt {
                Statement::Assign(a) => self.assignment(a, false),
                Statement::Call(chain) => self.top_level_call(chain),
                Statement::Other(span) => {
                    let text = span.text(self.src);
                    if !text.starts_with("import ") && !text.starts_with("package ") {
                        self.warn(format!("unrecognized statement '{text}'"), span.start);
                    }
                }
            }
        }

        if let Some(version) = self.toolchain.take() {
            if self.project.source_compatibility.is_empty() {
                self.project.source_compatibility.clone_from(&version);
            }
            if self.project.target_compatibility.is_empty() {
                self.project.target_compatibility = version;
            }
        }

        BuildOutput {
            project: self.project,
            warnings: self.warnings,
            source_map: self.map,
        }
    }

    fn location(&self, element: ElementRef, span: Span) -> SourceLocation {
        SourceLocation {
            element,
            start: self.table.position(self.src, span.start),
            end: self.table.position(self.src, span.end),
        }
    }

    fn warn(&mut self, message: String, offset: usize) {
        let at = self.table.position(self.src, offset);
        tracing::trace!("warning at {}: {}", at, message);
        self.warnings.push(Warning::new(message, at));
    }

    fn top_level_call(&mut self, chain: &CallChain) {
        let head = &chain.head;
        let closure = chain.closure();

        match (head.name.as_str(), closure) {
            ("plugins", Some(block)) => {
                if self.config.parse_plugins {
                    self.plugins_block(block);
                }
            }
            ("dependencies", Some(block)) => {
                if self.config.parse_dependencies {
                    let idx = self.record_block(chain, block);
                    self.dependencies_block(block, idx);
                }
            }
            ("repositories", Some(block)) => {
                if self.config.parse_repositories {
                    self.repositories_block(block);
                }
            }
            ("buildscript", Some(block)) => self.buildscript_block(block),
            ("ext", Some(block)) => self.ext_block(block),
            ("java", Some(block)) => {
                self.java_block(block);
                self.extension(chain, block);
            }
            ("tasks", Some(block)) => {
                if self.config.parse_tasks {
                    self.tasks_block(block);
                }
            }
            ("task" | "tasks.register" | "tasks.create", _) => {
                if self.config.parse_tasks {
                    match parse_task(self.src, chain) {
                        Some(task) => {
                            tracing::trace!("task {}", task.name);
                            self.project.tasks.push(task);
                        }
                        None => self.warn(
                            format!("unrecognized task declaration '{}'", chain.span.text(self.src)),
                            chain.span.start,
                        ),
                    }
                }
            }
            ("apply", None) => {
                if self.config.parse_plugins
                    && let Some(parsed) = parse_apply(self.src, chain)
                {
                    self.push_plugin(parsed);
                }
            }
            (name, None) if SETTERS.contains(&name) => self.setter(chain),
            (name, None) if head.args.len() == 1 && chain.tail.is_empty() => {
                if let Some(value) = head.first_arg() {
                    self.core_field(name, value, chain.span);
                }
            }
            (name, Some(block)) if !CONTROL_KEYWORDS.contains(&name) => {
                self.extension(chain, block);
            }
            _ => {}
        }
    }

    /// Sets a core field and records where it was assigned.
    fn core_field(&mut self, field: &str, value: &Expr, span: Span) -> bool {
        if !self.set_core(field, value) {
            return false;
        }
        self.record_spans(field.to_string(), span, value);
        true
    }

    fn set_core(&mut self, field: &str, value: &Expr) -> bool {
        let text = value
            .scalar(self.src)
            .map_or_else(|| value.text(self.src).to_string(), str::to_string);
        let project = &mut self.project;
        match field {
            "group" => project.group = text,
            "version" => project.version = text,
            "description" => project.description = text,
            "sourceCompatibility" => project.source_compatibility = normalize_java_version(&text),
            "targetCompatibility" => project.target_compatibility = normalize_java_version(&text),
            _ => return false,
        }
        true
    }

    fn assignment(&mut self, a: &Assignment, in_ext: bool) {
        if !in_ext && a.op == AssignOp::Set {
            let field = a.target.strip_prefix("project.").unwrap_or(&a.target);
            let field = field
                .strip_prefix("java.")
                .filter(|f| f.ends_with("Compatibility"))
                .unwrap_or(field);
            if self.core_field(field, &a.value, a.span) {
                return;
            }
        }

        let key = match a.op {
            AssignOp::Append | AssignOp::Remove => None,
            AssignOp::Declare | AssignOp::Delegate => Some(a.target.clone()),
            AssignOp::Set => property_key(&a.target),
        };
        let Some(key) = key else {
            self.warn(
                format!("unrecognized assignment target '{}'", a.target),
                a.span.start,
            );
            return;
        };

        let value = match (a.op, &a.value) {
            (AssignOp::Delegate, Expr::Call(inv)) if inv.name == "extra" => inv.first_arg(),
            (AssignOp::Delegate, _) => None,
            (_, value) => Some(value),
        };
        if let Some(value) = value {
            self.record_property(key, a.span, value);
        }
    }

    /// `set("key", value)` on `ext`/`extra`.
    fn setter(&mut self, chain: &CallChain) {
        let mut args = chain.head.positional();
        let (Some(key), Some(value)) = (args.next(), args.next()) else {
            return;
        };
        if let Some(key) = key.value.scalar(self.src) {
            self.record_property(key.to_string(), chain.span, &value.value);
        }
    }

    fn record_property(&mut self, key: String, span: Span, value: &Expr) {
        let text = value
            .scalar(self.src)
            .map_or_else(|| value.text(self.src).to_string(), str::to_string);
        tracing::trace!("property {} = {}", key, text);
        self.record_spans(key.clone(), span, value);
        self.project.properties.insert(key, text);
    }

    fn record_spans(&mut self, key: String, span: Span, value: &Expr) {
        if self.map.is_none() {
            return;
        }
        let literal = match value {
            Expr::Str(lit) if !lit.interpolated => Some(lit.content),
            Expr::Number(span) => Some(*span),
            _ => None,
        };
        let location = self.location(ElementRef::Property(key.clone()), span);
        if let Some(map) = self.map.as_mut() {
            map.properties.push(PropertySpans {
                name: key,
                location,
                value: literal,
            });
        }
    }

    fn ext_block(&mut self, block: &Block) {
        for stmt in &block.statements {
            match stmt {
                Statement::Assign(a) => self.assignment(a, true),
                Statement::Call(chain) if chain.head.name == "set" => self.setter(chain),
                _ => {}
            }
        }
    }

    fn buildscript_block(&mut self, block: &Block) {
        for stmt in &block.statements {
            match stmt {
                Statement::Assign(a) => self.assignment(a, false),
                Statement::Call(chain) => match (chain.head.name.as_str(), chain.closure()) {
                    ("dependencies", Some(inner)) if self.config.parse_dependencies => {
                        self.dependencies_block(inner, None);
                    }
                    ("ext", Some(inner)) => self.ext_block(inner),
                    (name, None) if SETTERS.contains(&name) => self.setter(chain),
                    _ => {}
                },
                Statement::Other(_) => {}
            }
        }
    }

    fn java_block(&mut self, block: &Block) {
        for stmt in &block.statements {
            match stmt {
                Statement::Assign(a) if a.target.ends_with("Compatibility") => {
                    self.core_field(&a.target, &a.value, a.span);
                }
                Statement::Call(chain) if chain.head.name.ends_with("Compatibility") => {
                    if let Some(value) = chain.head.first_arg() {
                        self.core_field(&chain.head.name, value, chain.span);
                    }
                }
                Statement::Call(chain) if chain.head.name == "toolchain" => {
                    if let Some(inner) = chain.closure() {
                        self.toolchain_block(inner);
                    }
                }
                _ => {}
            }
        }
    }

    fn toolchain_block(&mut self, block: &Block) {
        for stmt in &block.statements {
            let value = match stmt {
                Statement::Assign(a) if a.target == "languageVersion" => Some(&a.value),
                Statement::Call(chain) if chain.head.name == "languageVersion.set" => {
                    chain.head.first_arg()
                }
                _ => None,
            };
            if let Some(value) = value {
                self.toolchain = Some(normalize_java_version(value.text(self.src)));
            }
        }
    }

    fn extension(&mut self, chain: &CallChain, block: &Block) {
        let key = Span::new(chain.span.start, block.open)
            .text(self.src)
            .trim()
            .to_string();
        let body = Value::String(block.body(self.src).trim().to_string());
        tracing::trace!("extension block {}", key);

        match self.project.extensions.get_mut(&key) {
            Some(Value::Array(items)) => items.push(body),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, body]);
            }
            None => {
                self.project.extensions.insert(key, body);
            }
        }
    }

    fn record_block(&mut self, chain: &CallChain, block: &Block) -> Option<usize> {
        if self.map.is_none() {
            return None;
        }
        let idx = self.map.as_ref().map_or(0, |m| m.dependency_blocks.len());
        let location = self.location(ElementRef::DependencyBlock(idx), chain.span);
        let indent = self.table.indent_at(self.src, chain.span.start).to_string();
        let map = self.map.as_mut()?;
        map.dependency_blocks.push(BlockSpans {
            location,
            open: block.open,
            close: block.close,
            indent,
        });
        Some(idx)
    }

    fn dependencies_block(&mut self, block: &Block, block_idx: Option<usize>) {
        for stmt in &block.statements {
            let chain = match stmt {
                Statement::Call(chain) => chain,
                Statement::Assign(_) => continue,
                Statement::Other(span) => {
                    self.warn(
                        format!("unrecognized dependency statement '{}'", span.text(self.src)),
                        span.start,
                    );
                    continue;
                }
            };

            if chain.head.name == "constraints"
                && let Some(inner) = chain.closure()
            {
                self.dependencies_block(inner, None);
                continue;
            }

            let Some(parsed) = parse_declaration(self.src, chain) else {
                self.warn(
                    format!(
                        "unrecognized dependency declaration '{}'",
                        chain.span.text(self.src)
                    ),
                    chain.span.start,
                );
                continue;
            };

            for dep in parsed {
                if let Some(message) = dep.warning {
                    self.warn(message, dep.span.start);
                }
                let idx = self.project.dependencies.len();
                if self.map.is_some() {
                    let location = self.location(ElementRef::Dependency(idx), dep.span);
                    if let Some(map) = self.map.as_mut() {
                        map.dependencies.push(DependencySpans {
                            location,
                            version: dep.version,
                            block: block_idx,
                        });
                    }
                }
                tracing::trace!("dependency {}", dep.dependency.coordinates());
                self.project.dependencies.push(dep.dependency);
            }
        }
    }

    fn plugins_block(&mut self, block: &Block) {
        for stmt in &block.statements {
            match stmt {
                Statement::Call(chain) => match parse_plugin(self.src, chain) {
                    Some(parsed) => self.push_plugin(parsed),
                    None => self.warn(
                        format!(
                            "unrecognized plugin declaration '{}'",
                            chain.span.text(self.src)
                        ),
                        chain.span.start,
                    ),
                },
                Statement::Other(span) => self.warn(
                    format!("unrecognized plugin declaration '{}'", span.text(self.src)),
                    span.start,
                ),
                Statement::Assign(_) => {}
            }
        }
    }

    fn push_plugin(&mut self, parsed: ParsedPlugin) {
        let idx = self.project.plugins.len();
        if self.map.is_some() {
            let location = self.location(ElementRef::Plugin(idx), parsed.span);
            if let Some(map) = self.map.as_mut() {
                map.plugins.push(PluginSpans {
                    location,
                    version: parsed.version,
                });
            }
        }
        tracing::trace!("plugin {}", parsed.plugin.id);
        self.project.plugins.push(parsed.plugin);
    }

    fn repositories_block(&mut self, block: &Block) {
        for stmt in &block.statements {
            match stmt {
                Statement::Call(chain) => match parse_repository(self.src, chain) {
                    Ok(repo) => {
                        let idx = self.project.repositories.len();
                        if self.map.is_some() {
                            let location = self.location(ElementRef::Repository(idx), chain.span);
                            if let Some(map) = self.map.as_mut() {
                                map.repositories.push(location);
                            }
                        }
                        self.project.repositories.push(repo);
                    }
                    Err(message) => self.warn(message, chain.span.start),
                },
                Statement::Other(span) => self.warn(
                    format!("unrecognized repository declaration '{}'", span.text(self.src)),
                    span.start,
                ),
                Statement::Assign(_) => {}
            }
        }
    }

    fn tasks_block(&mut self, block: &Block) {
        for stmt in &block.statements {
            if let Statement::Call(chain) = stmt
                && let Some(task) = parse_tasks_member(self.src, chain)
            {
                self.project.tasks.push(task);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::block::parse_script;
    use crate::scanner::tokenize;
    use crate::types::DependencyKind;

    fn build_with(src: &str, config: ParserConfig) -> BuildOutput {
        let tokens = tokenize(src).unwrap();
        let table = LineOffsetTable::new(src);
        let script = parse_script(src, &tokens, &table).unwrap();
        ModelBuilder::new(src, config, &table, true).build(&script)
    }

    fn build(src: &str) -> BuildOutput {
        build_with(src, ParserConfig::default())
    }

    #[test]
    fn test_normalize_java_version() {
        assert_eq!(normalize_java_version("JavaVersion.VERSION_1_8"), "1.8");
        assert_eq!(normalize_java_version("JavaVersion.VERSION_17"), "17");
        assert_eq!(normalize_java_version("VERSION_11"), "11");
        assert_eq!(normalize_java_version("JavaLanguageVersion.of(21)"), "21");
        assert_eq!(normalize_java_version("'1.8'"), "1.8");
    }

    #[test]
    fn test_property_key() {
        assert_eq!(property_key("ext.springVersion").as_deref(), Some("springVersion"));
        assert_eq!(property_key("project.ext.v").as_deref(), Some("v"));
        assert_eq!(property_key("extra[\"v\"]").as_deref(), Some("v"));
        assert_eq!(property_key("rootProject.extra['v']").as_deref(), Some("v"));
        assert_eq!(property_key("kotlinVersion").as_deref(), Some("kotlinVersion"));
        assert_eq!(property_key("compileJava.options.encoding"), None);
    }

    #[test]
    fn test_core_fields() {
        let out = build("group = 'com.example'\nversion '1.0.0'\ndescription = \"Demo\"\nsourceCompatibility = JavaVersion.VERSION_1_8\n");
        assert_eq!(out.project.group, "com.example");
        assert_eq!(out.project.version, "1.0.0");
        assert_eq!(out.project.description, "Demo");
        assert_eq!(out.project.source_compatibility, "1.8");
        assert!(out.project.target_compatibility.is_empty());
    }

    #[test]
    fn test_java_block_and_toolchain() {
        let out = build("java {\n    toolchain {\n        languageVersion.set(JavaLanguageVersion.of(17))\n    }\n}\n");
        assert_eq!(out.project.source_compatibility, "17");
        assert_eq!(out.project.target_compatibility, "17");
        assert!(out.project.extensions.contains_key("java"));

        let out = build("java {\n    sourceCompatibility = JavaVersion.VERSION_11\n}\njava.targetCompatibility = JavaVersion.VERSION_11");
        assert_eq!(out.project.source_compatibility, "11");
        assert_eq!(out.project.target_compatibility, "11");
    }

    #[test]
    fn test_properties() {
        let src = "ext {\n    springVersion = '3.2.0'\n    set('lombok', '1.18.30')\n}\next.junit = '5.10.0'\ndef local = 1\nval kotlinVersion by extra(\"1.9.22\")\nextra[\"guava\"] = \"33.0\"\n";
        let out = build(src);
        let keys: Vec<_> = out.project.properties.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            ["springVersion", "lombok", "junit", "local", "kotlinVersion", "guava"]
        );
        assert_eq!(out.project.properties["kotlinVersion"], "1.9.22");

        let map = out.source_map.unwrap();
        let spring = map.property("springVersion").unwrap();
        assert_eq!(spring.value.unwrap().text(src), "3.2.0");
    }

    #[test]
    fn test_dependencies_and_block_spans() {
        let src = "dependencies {\n    implementation 'a:b:1'\n    constraints {\n        implementation('c:d:2')\n    }\n}\n";
        let out = build(src);
        assert_eq!(out.project.dependencies.len(), 2);
        let map = out.source_map.unwrap();
        assert_eq!(map.dependency_blocks.len(), 1);
        assert_eq!(map.dependency_blocks[0].open, 13);
        assert_eq!(map.dependencies[0].block, Some(0));
        assert_eq!(map.dependencies[1].block, None);
        assert_eq!(map.dependencies[0].location.start.line, 2);
        assert_eq!(map.dependencies[0].location.start.column, 5);
    }

    #[test]
    fn test_buildscript_classpath() {
        let out = build("buildscript {\n    ext.kotlin_version = '1.9.0'\n    repositories { mavenCentral() }\n    dependencies {\n        classpath \"org.jetbrains.kotlin:kotlin-gradle-plugin:$kotlin_version\"\n    }\n}\n");
        assert_eq!(out.project.dependencies[0].scope, "classpath");
        assert_eq!(out.project.properties["kotlin_version"], "1.9.0");
        assert!(out.project.repositories.is_empty());
        assert!(out.source_map.unwrap().dependency_blocks.is_empty());
    }

    #[test]
    fn test_warnings_for_unrecognized_statements() {
        let out = build("dependencies {\n    implementation 'guava'\n    \"kapt\"(libs.x)\n}\nrepositories {\n    artifactory()\n}\n");
        assert_eq!(out.warnings.len(), 3);
        assert_eq!(out.warnings[0].at.unwrap().line, 2);
        assert_eq!(out.project.dependencies.len(), 1);
        assert_eq!(out.project.dependencies[0].kind, DependencyKind::Invalid);
    }

    #[test]
    fn test_core_fields_are_located() {
        let src = "group = 'com.example'\nversion '1.0.0'\ndescription = \"x\"\next.foo = '1'\n";
        let out = build(src);
        let map = out.source_map.unwrap();
        let names: Vec<_> = map.properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["group", "version", "description", "foo"]);

        let group = map.property("group").unwrap();
        assert_eq!(group.location.span(), Span::new(0, 21));
        assert_eq!(group.value, Some(Span::new(9, 20)));
        let version = map.property("version").unwrap();
        assert_eq!(version.location.span(), Span::new(22, 37));
        assert_eq!(version.value.unwrap().text(src), "1.0.0");
        let description = map.property("description").unwrap();
        assert_eq!(description.location.start.line, 3);
        assert_eq!(description.value, Some(Span::new(53, 54)));

        assert!(!out.project.properties.contains_key("group"));
        assert_eq!(out.project.properties["foo"], "1");
    }

    #[test]
    fn test_unrecognized_top_level_statements_warn() {
        let src = "import org.example.Foo\ncompileJava.options.encoding = 'UTF-8'\n1 + 2\ngroup = 'a'\n";
        let out = build(src);
        let messages: Vec<_> = out.warnings.iter().map(|w| w.message.as_str()).collect();
        assert_eq!(
            messages,
            [
                "unrecognized assignment target 'compileJava.options.encoding'",
                "unrecognized statement '1 + 2'",
            ]
        );
        assert_eq!(out.warnings[0].at.unwrap().line, 2);
        assert_eq!(out.warnings[1].at.unwrap().line, 3);
        assert_eq!(out.project.group, "a");
    }

    #[test]
    fn test_extensions_collect_repeated_blocks() {
        let out = build("android {\n    compileSdk 34\n}\ntest { useJUnitPlatform() }\ntest { maxParallelForks = 2 }\n");
        assert_eq!(out.project.extensions["android"], Value::String("compileSdk 34".into()));
        assert_eq!(
            out.project.extensions["test"],
            serde_json::json!(["useJUnitPlatform()", "maxParallelForks = 2"])
        );
    }

    #[test]
    fn test_control_flow_is_not_an_extension() {
        let out = build("if (project.hasProperty('x')) {\n    apply plugin: 'maven'\n}\n");
        assert!(out.project.extensions.is_empty());
    }

    #[test]
    fn test_disabled_sections_are_skipped() {
        let src = "plugins { id 'java' }\ndependencies { implementation 'a:b:1' }\nrepositories { mavenCentral() }\ntask hello\n";
        let config = ParserConfig::default()
            .with_parse_plugins(false)
            .with_parse_dependencies(false)
            .with_parse_repositories(false)
            .with_parse_tasks(false);
        let out = build_with(src, config);
        assert!(out.project.plugins.is_empty());
        assert!(out.project.dependencies.is_empty());
        assert!(out.project.repositories.is_empty());
        assert!(out.project.tasks.is_empty());
        assert!(out.project.extensions.is_empty());
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_apply_plugin_and_tasks_block() {
        let out = build("apply plugin: 'java'\ntasks {\n    register(\"hello\") { group = \"demo\" }\n}\n");
        assert_eq!(out.project.plugins[0].id, "java");
        assert_eq!(out.project.tasks[0].name, "hello");
        assert_eq!(out.project.tasks[0].group, "demo");
    }
}
