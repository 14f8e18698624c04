//! Dependency declarations: `scope notation`, `scope(group = .., name = ..)`,
//! `add("scope", ..)` and the call wrappers Gradle offers.

use super::block::{
    ArgStyle, Argument, CallChain, Expr, Invocation, Statement, StrLit, interpolation_reference,
};
use crate::position::{Span, VersionAnchor};
use crate::types::{Dependency, DependencyKind};

const KOTLIN_GROUP: &str = "org.jetbrains.kotlin";

/// Parts of a `group:name[:version[:classifier]][@ext]` string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Coordinates {
    pub group: String,
    pub name: String,
    pub version: String,
    pub classifier: String,
    pub extension: String,
}

/// A dependency recognized in a declaration, with its edit anchor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDependency {
    pub dependency: Dependency,
    pub version: Option<VersionAnchor>,
    pub span: Span,
    pub warning: Option<String>,
}

struct Notation {
    parts: Vec<Span>,
    ext: Option<Span>,
}

/// Splits on `:` and `@` outside `${ ... }` templates. Spans are relative.
fn split_notation(raw: &str) -> Notation {
    let bytes = raw.as_bytes();
    let mut depth = 0usize;
    let mut parts = Vec::new();
    let mut start = 0;
    let mut at = None;

    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'{' if depth > 0 || (i > 0 && bytes[i - 1] == b'$') => depth += 1,
            b'}' if depth > 0 => depth -= 1,
            b':' if depth == 0 => {
                parts.push(Span::new(start, i));
                start = i + 1;
            }
            b'@' if depth == 0 => at = Some(i),
            _ => {}
        }
    }

    let mut last = Span::new(start, raw.len());
    let mut ext = None;
    if let Some(at) = at.filter(|&at| at >= start) {
        ext = Some(Span::new(at + 1, raw.len()));
        last.end = at;
    }
    parts.push(last);
    Notation { parts, ext }
}

fn coordinates(raw: &str, notation: &Notation) -> Option<Coordinates> {
    if !(2..=4).contains(&notation.parts.len()) {
        return None;
    }
    let part = |i: usize| {
        notation
            .parts
            .get(i)
            .map_or_else(String::new, |s| s.text(raw).to_string())
    };
    let coords = Coordinates {
        group: part(0),
        name: part(1),
        version: part(2),
        classifier: part(3),
        extension: notation
            .ext
            .map_or_else(String::new, |s| s.text(raw).to_string()),
    };
    (!coords.group.is_empty() || !coords.name.is_empty()).then_some(coords)
}

/// Parses shorthand dependency notation.
///
/// Returns `None` for strings without a colon or with more than three.
pub fn parse_notation(raw: &str) -> Option<Coordinates> {
    coordinates(raw, &split_notation(raw))
}

fn is_path_like(raw: &str) -> bool {
    raw.contains('/') || raw.contains('\\') || raw.ends_with(".jar") || raw.ends_with(".aar")
}

/// Anchor for a version given as an expression.
pub(crate) fn expr_anchor(src: &str, value: &Expr) -> Option<VersionAnchor> {
    match value {
        Expr::Str(lit) => string_anchor(src, lit, lit.content),
        Expr::Ref(path, _) => Some(VersionAnchor::Property(path.clone())),
        _ => None,
    }
}

/// Anchor for version text occupying `span` inside a string literal.
pub(crate) fn string_anchor(src: &str, lit: &StrLit, span: Span) -> Option<VersionAnchor> {
    let text = span.text(src);
    if !lit.interpolated || !text.contains('$') {
        return Some(VersionAnchor::Literal(span));
    }
    interpolation_reference(text).map(|name| VersionAnchor::Property(name.to_string()))
}

struct Context<'a> {
    src: &'a str,
    scope: &'a str,
    transitive: bool,
}

impl Context<'_> {
    fn record(&self, kind: DependencyKind, raw: &str) -> Dependency {
        Dependency {
            scope: self.scope.to_string(),
            transitive: self.transitive,
            kind,
            raw: raw.to_string(),
            ..Dependency::default()
        }
    }

    fn from_expr(&self, expr: &Expr, raw: &str, span: Span) -> ParsedDependency {
        let mut version = None;
        let mut warning = None;

        let dependency = match expr {
            Expr::Str(lit) => {
                let content = lit.content.text(self.src);
                let notation = split_notation(content);
                match coordinates(content, &notation) {
                    Some(c) => {
                        version = match notation.parts.get(2) {
                            Some(part) => {
                                let abs = Span::new(
                                    lit.content.start + part.start,
                                    lit.content.start + part.end,
                                );
                                string_anchor(self.src, lit, abs)
                            }
                            None => Some(VersionAnchor::Insert {
                                at: lit.content.start + notation.parts[1].end,
                                prefix: ":".to_string(),
                                suffix: String::new(),
                            }),
                        };
                        Dependency {
                            group: c.group,
                            name: c.name,
                            version: c.version,
                            classifier: c.classifier,
                            extension: c.extension,
                            ..self.record(DependencyKind::Module, raw)
                        }
                    }
                    None if notation.parts.len() == 1 && is_path_like(&lit.value) => Dependency {
                        name: lit.value.clone(),
                        ..self.record(DependencyKind::File, raw)
                    },
                    None => {
                        warning = Some(format!(
                            "unrecognized dependency notation '{}'",
                            lit.value
                        ));
                        self.record(DependencyKind::Invalid, raw)
                    }
                }
            }
            Expr::Call(inv) => return self.from_call(inv, raw, span),
            Expr::Ref(path, _) => {
                let kind = if path.starts_with("libs.") {
                    DependencyKind::Catalog
                } else {
                    DependencyKind::Reference
                };
                Dependency {
                    name: path.clone(),
                    ..self.record(kind, raw)
                }
            }
            Expr::Map(args, _) => return self.from_named(args, raw, span),
            _ => {
                warning = Some(format!(
                    "unrecognized dependency notation '{}'",
                    expr.text(self.src)
                ));
                self.record(DependencyKind::Invalid, raw)
            }
        };

        ParsedDependency {
            dependency,
            version,
            span,
            warning,
        }
    }

    fn from_call(&self, inv: &Invocation, raw: &str, span: Span) -> ParsedDependency {
        let plain = |dependency| ParsedDependency {
            dependency,
            version: None,
            span,
            warning: None,
        };

        match inv.name.as_str() {
            "platform" | "enforcedPlatform" | "testFixtures" => match inv.first_arg() {
                Some(inner) => self.from_expr(inner, raw, span),
                None => plain(self.record(DependencyKind::Invalid, raw)),
            },
            "project" => {
                let path = inv
                    .named("path")
                    .map(|a| &a.value)
                    .or_else(|| inv.first_arg())
                    .and_then(|e| e.scalar(self.src))
                    .unwrap_or_default();
                plain(Dependency {
                    name: path.to_string(),
                    ..self.record(DependencyKind::Project, raw)
                })
            }
            "kotlin" => {
                let module = inv
                    .first_arg()
                    .and_then(|e| e.scalar(self.src))
                    .unwrap_or_default();
                let version_arg = inv.args.get(1).map(|a| &a.value);
                let version = match version_arg {
                    Some(value) => expr_anchor(self.src, value),
                    None => inv.args.first().map(|first| VersionAnchor::Insert {
                        at: first.span.end,
                        prefix: ", \"".to_string(),
                        suffix: "\"".to_string(),
                    }),
                };
                ParsedDependency {
                    dependency: Dependency {
                        group: KOTLIN_GROUP.to_string(),
                        name: format!("kotlin-{module}"),
                        version: version_arg
                            .and_then(|e| e.scalar(self.src))
                            .unwrap_or_default()
                            .to_string(),
                        ..self.record(DependencyKind::Module, raw)
                    },
                    version,
                    span,
                    warning: None,
                }
            }
            "files" | "file" | "fileTree" => {
                let name = inv
                    .named("dir")
                    .map(|a| &a.value)
                    .or_else(|| inv.first_arg())
                    .and_then(|e| e.scalar(self.src))
                    .map_or_else(|| inv.span.text(self.src).to_string(), str::to_string);
                plain(Dependency {
                    name,
                    ..self.record(DependencyKind::File, raw)
                })
            }
            "gradleApi" | "localGroovy" | "gradleTestKit" => plain(Dependency {
                name: inv.name.clone(),
                ..self.record(DependencyKind::Builtin, raw)
            }),
            _ => plain(Dependency {
                name: inv.span.text(self.src).to_string(),
                ..self.record(DependencyKind::Reference, raw)
            }),
        }
    }

    /// `group: 'g', name: 'n', version: 'v'` or the Kotlin `=` form.
    fn from_named(&self, args: &[Argument], raw: &str, span: Span) -> ParsedDependency {
        let find = |key: &str| args.iter().find(|a| a.name.as_deref() == Some(key));
        let text = |key: &str| {
            find(key)
                .and_then(|a| a.value.scalar(self.src))
                .unwrap_or_default()
                .to_string()
        };

        let mut dependency = Dependency {
            group: text("group"),
            name: text("name"),
            version: text("version"),
            classifier: text("classifier"),
            extension: find("ext")
                .or_else(|| find("extension"))
                .and_then(|a| a.value.scalar(self.src))
                .unwrap_or_default()
                .to_string(),
            ..self.record(DependencyKind::Module, raw)
        };
        if find("transitive").and_then(|a| a.value.as_bool()) == Some(false) {
            dependency.transitive = false;
        }

        let version = match find("version") {
            Some(arg) => expr_anchor(self.src, &arg.value),
            None => find("name").or_else(|| find("group")).map(|arg| {
                let quote = arg.value.as_str().map_or(
                    if arg.style == ArgStyle::Colon { '\'' } else { '"' },
                    |lit| lit.quote.quote_char(),
                );
                let prefix = match arg.style {
                    ArgStyle::Equals => format!(", version = {quote}"),
                    _ => format!(", version: {quote}"),
                };
                VersionAnchor::Insert {
                    at: arg.span.end,
                    prefix,
                    suffix: quote.to_string(),
                }
            }),
        };

        let warning = (!dependency.is_valid())
            .then(|| format!("dependency declaration without group or name: '{raw}'"));
        if warning.is_some() {
            dependency.kind = DependencyKind::Invalid;
        }

        ParsedDependency {
            dependency,
            version,
            span,
            warning,
        }
    }
}

/// `transitive = false` or `isTransitive = false` inside a trailing closure.
fn closure_disables_transitive(chain: &CallChain) -> bool {
    chain.closure().is_some_and(|block| {
        block.statements.iter().any(|stmt| match stmt {
            Statement::Assign(a) => {
                matches!(a.target.as_str(), "transitive" | "isTransitive")
                    && a.value.as_bool() == Some(false)
            }
            Statement::Call(c) => {
                c.head.name == "transitive"
                    && c.head.first_arg().and_then(Expr::as_bool) == Some(false)
            }
            Statement::Other(_) => false,
        })
    })
}

/// Parses one statement of a `dependencies { }` block.
///
/// Returns `None` when the statement is not a declaration at all (a bare
/// name without arguments).
pub fn parse_declaration(src: &str, chain: &CallChain) -> Option<Vec<ParsedDependency>> {
    let head = &chain.head;
    let (scope, args): (&str, &[Argument]) = if head.name == "add" && head.args.len() >= 2 {
        let scope = head.args[0].value.as_str()?;
        (scope.value.as_str(), &head.args[1..])
    } else {
        (head.name.as_str(), &head.args)
    };
    if args.is_empty() {
        return None;
    }

    let ctx = Context {
        src,
        scope,
        transitive: !closure_disables_transitive(chain),
    };
    let stmt_raw = chain.span.text(src).trim();

    if args.iter().any(|a| a.name.is_some()) {
        return Some(vec![ctx.from_named(args, stmt_raw, chain.span)]);
    }

    let single = args.len() == 1;
    let parsed = args
        .iter()
        .map(|arg| {
            if single {
                ctx.from_expr(&arg.value, stmt_raw, chain.span)
            } else {
                ctx.from_expr(&arg.value, arg.span.text(src), arg.span)
            }
        })
        .collect();
    Some(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::LineOffsetTable;
    use crate::scanner::tokenize;
    use crate::parser::block::parse_script;

    fn declare(src: &str) -> Vec<ParsedDependency> {
        let tokens = tokenize(src).unwrap();
        let script = parse_script(src, &tokens, &LineOffsetTable::new(src)).unwrap();
        match &script.statements[0] {
            Statement::Call(chain) => parse_declaration(src, chain).unwrap(),
            other => panic!("expected call, got {other:?}"),
        }
    }

    fn anchor_text<'a>(src: &'a str, parsed: &ParsedDependency) -> &'a str {
        match parsed.version.as_ref().unwrap() {
            VersionAnchor::Literal(span) => span.text(src),
            other => panic!("expected literal anchor, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_notation_full() {
        let c = parse_notation("org.springframework.boot:spring-boot-starter-web:2.7.0").unwrap();
        assert_eq!(c.group, "org.springframework.boot");
        assert_eq!(c.name, "spring-boot-starter-web");
        assert_eq!(c.version, "2.7.0");
    }

    #[test]
    fn test_parse_notation_classifier_and_ext() {
        let c = parse_notation("org.lwjgl:lwjgl:3.3.1:natives-linux@jar").unwrap();
        assert_eq!(c.classifier, "natives-linux");
        assert_eq!(c.extension, "jar");
        assert_eq!(c.version, "3.3.1");

        let c = parse_notation("com.example:widget:1.0@aar").unwrap();
        assert_eq!(c.version, "1.0");
        assert_eq!(c.extension, "aar");
    }

    #[test]
    fn test_parse_notation_rejects() {
        assert!(parse_notation("guava").is_none());
        assert!(parse_notation("a:b:c:d:e").is_none());
        assert!(parse_notation(":").is_none());
        let c = parse_notation("org.springframework.boot:spring-boot-starter").unwrap();
        assert!(c.version.is_empty());
    }

    #[test]
    fn test_notation_ignores_colons_in_templates() {
        let c = parse_notation("g:n:${props[\"a:b\"]}").unwrap();
        assert_eq!(c.version, "${props[\"a:b\"]}");
    }

    #[test]
    fn test_shorthand_with_literal_anchor() {
        let src = "implementation 'mysql:mysql-connector-java:8.0.28'";
        let parsed = declare(src);
        assert_eq!(parsed.len(), 1);
        let dep = &parsed[0].dependency;
        assert_eq!(dep.scope, "implementation");
        assert_eq!(dep.group, "mysql");
        assert_eq!(dep.version, "8.0.28");
        assert_eq!(dep.raw, src);
        assert_eq!(anchor_text(src, &parsed[0]), "8.0.28");
        assert_eq!(parsed[0].span, Span::new(0, src.len()));
    }

    #[test]
    fn test_interpolated_version_references_property() {
        let parsed = declare("implementation \"org.jetbrains.kotlin:kotlin-stdlib:$kotlinVersion\"");
        assert_eq!(
            parsed[0].version,
            Some(VersionAnchor::Property("kotlinVersion".into()))
        );
        let parsed = declare("implementation \"a:b:${versions.b}\"");
        assert_eq!(
            parsed[0].version,
            Some(VersionAnchor::Property("versions.b".into()))
        );
        let parsed = declare("implementation \"a:b:${v}-SNAPSHOT\"");
        assert_eq!(parsed[0].version, None);
    }

    #[test]
    fn test_missing_version_inserts_after_name() {
        let src = "implementation(\"org.springframework.boot:spring-boot-starter\")";
        let parsed = declare(src);
        match parsed[0].version.as_ref().unwrap() {
            VersionAnchor::Insert { at, prefix, .. } => {
                assert_eq!(&src[..*at], "implementation(\"org.springframework.boot:spring-boot-starter");
                assert_eq!(prefix, ":");
            }
            other => panic!("unexpected anchor {other:?}"),
        }
    }

    #[test]
    fn test_path_and_invalid_strings() {
        let parsed = declare("implementation 'libs/local.jar'");
        assert_eq!(parsed[0].dependency.kind, DependencyKind::File);
        assert_eq!(parsed[0].dependency.name, "libs/local.jar");
        assert!(parsed[0].warning.is_none());

        let parsed = declare("implementation 'guava'");
        assert_eq!(parsed[0].dependency.kind, DependencyKind::Invalid);
        assert!(parsed[0].dependency.group.is_empty());
        assert!(parsed[0].dependency.name.is_empty());
        assert!(parsed[0].dependency.version.is_empty());
        assert_eq!(parsed[0].dependency.scope, "implementation");
        assert_eq!(parsed[0].dependency.raw, "implementation 'guava'");
        assert!(parsed[0].warning.as_ref().unwrap().contains("guava"));
    }

    #[test]
    fn test_groovy_named_arguments() {
        let src = "testImplementation group: 'junit', name: 'junit', version: '4.13.2', transitive: false";
        let parsed = declare(src);
        let dep = &parsed[0].dependency;
        assert_eq!(dep.group, "junit");
        assert_eq!(dep.version, "4.13.2");
        assert!(!dep.transitive);
        assert_eq!(anchor_text(src, &parsed[0]), "4.13.2");
    }

    #[test]
    fn test_kotlin_named_arguments_without_version() {
        let src = r#"implementation(group = "com.acme", name = "core")"#;
        let parsed = declare(src);
        match parsed[0].version.as_ref().unwrap() {
            VersionAnchor::Insert { at, prefix, suffix } => {
                assert_eq!(&src[..*at], r#"implementation(group = "com.acme", name = "core""#);
                assert_eq!(prefix, ", version = \"");
                assert_eq!(suffix, "\"");
            }
            other => panic!("unexpected anchor {other:?}"),
        }
    }

    #[test]
    fn test_project_dependency() {
        for src in [
            "implementation project(':core')",
            "implementation(project(\":core\"))",
            "implementation project(path: ':core')",
        ] {
            let parsed = declare(src);
            let dep = &parsed[0].dependency;
            assert_eq!(dep.kind, DependencyKind::Project, "{src}");
            assert_eq!(dep.name, ":core");
            assert!(dep.group.is_empty());
            assert!(parsed[0].version.is_none());
        }
    }

    #[test]
    fn test_wrappers() {
        let src = "implementation(platform(\"org.springframework.boot:spring-boot-dependencies:3.2.0\"))";
        let parsed = declare(src);
        assert_eq!(parsed[0].dependency.name, "spring-boot-dependencies");
        assert_eq!(anchor_text(src, &parsed[0]), "3.2.0");

        let parsed = declare("implementation(kotlin(\"stdlib\"))");
        assert_eq!(parsed[0].dependency.group, "org.jetbrains.kotlin");
        assert_eq!(parsed[0].dependency.name, "kotlin-stdlib");

        let parsed = declare("implementation fileTree(dir: 'libs', include: ['*.jar'])");
        assert_eq!(parsed[0].dependency.kind, DependencyKind::File);
        assert_eq!(parsed[0].dependency.name, "libs");

        let parsed = declare("implementation gradleApi()");
        assert_eq!(parsed[0].dependency.kind, DependencyKind::Builtin);
    }

    #[test]
    fn test_catalog_and_reference() {
        let parsed = declare("implementation(libs.androidx.core)");
        assert_eq!(parsed[0].dependency.kind, DependencyKind::Catalog);
        assert_eq!(parsed[0].dependency.name, "libs.androidx.core");

        let parsed = declare("implementation deps.guava");
        assert_eq!(parsed[0].dependency.kind, DependencyKind::Reference);
    }

    #[test]
    fn test_add_form() {
        let parsed = declare(r#"add("runtimeOnly", "org.postgresql:postgresql:42.7.1")"#);
        assert_eq!(parsed[0].dependency.scope, "runtimeOnly");
        assert_eq!(parsed[0].dependency.name, "postgresql");
    }

    #[test]
    fn test_closure_transitive_flag() {
        let parsed = declare("implementation('a:b:1') {\n    transitive = false\n}");
        assert!(!parsed[0].dependency.transitive);
        let parsed = declare("implementation(\"a:b:1\") {\n    isTransitive = false\n}");
        assert!(!parsed[0].dependency.transitive);
        let parsed = declare("implementation('a:b:1') {\n    exclude group: 'x'\n}");
        assert!(parsed[0].dependency.transitive);
    }

    #[test]
    fn test_multiple_positional_arguments() {
        let src = "implementation 'a:b:1', 'c:d:2'";
        let parsed = declare(src);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1].dependency.raw, "'c:d:2'");
        assert_eq!(parsed[1].span.text(src), "'c:d:2'");
        assert_eq!(anchor_text(src, &parsed[1]), "2");
    }

    #[test]
    fn test_bare_scope_is_not_a_declaration() {
        let src = "implementation";
        let tokens = tokenize(src).unwrap();
        let script = parse_script(src, &tokens, &LineOffsetTable::new(src)).unwrap();
        let Statement::Call(chain) = &script.statements[0] else {
            panic!("expected call");
        };
        assert!(parse_declaration(src, chain).is_none());
    }
}
