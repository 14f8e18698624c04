//! Plugin declarations inside `plugins { }` and legacy `apply plugin:`.

use super::block::{CallChain, Expr};
use super::dependency::expr_anchor;
use crate::position::{Span, VersionAnchor};
use crate::types::Plugin;

const KOTLIN_PLUGIN_PREFIX: &str = "org.jetbrains.kotlin.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPlugin {
    pub plugin: Plugin,
    pub version: Option<VersionAnchor>,
    pub span: Span,
}

fn non_blank(id: Option<&str>) -> Option<&str> {
    id.filter(|id| !id.trim().is_empty())
}

/// Parses one statement of a `plugins { }` block.
pub fn parse_plugin(src: &str, chain: &CallChain) -> Option<ParsedPlugin> {
    let head = &chain.head;
    let arg = head.first_arg();

    let mut plugin = match head.name.as_str() {
        "id" => Plugin::new(non_blank(arg?.scalar(src))?),
        "kotlin" => Plugin::new(format!("{KOTLIN_PLUGIN_PREFIX}{}", non_blank(arg?.scalar(src))?)),
        "alias" => {
            let path = arg?.text(src).to_string();
            let mut plugin = Plugin::new(path.clone());
            plugin.config.insert("alias".to_string(), path);
            plugin
        }
        name if head.args.is_empty() && !head.parenthesized && head.closure.is_none() => {
            Plugin::new(name)
        }
        _ => return None,
    };

    let mut version = None;
    if let Some(value) = chain.find("version").and_then(|v| v.first_arg()) {
        plugin.version = value.scalar(src).map(str::to_string);
        version = expr_anchor(src, value);
    } else if matches!(head.name.as_str(), "id" | "kotlin") {
        let quote = arg
            .and_then(Expr::as_str)
            .map_or('"', |lit| lit.quote.quote_char());
        let method_style = chain.tail.iter().any(|c| c.parenthesized);
        let (prefix, suffix) = if method_style {
            (format!(".version({quote}"), format!("{quote})"))
        } else {
            (format!(" version {quote}"), quote.to_string())
        };
        version = Some(VersionAnchor::Insert {
            at: head.span.end,
            prefix,
            suffix,
        });
    }

    if let Some(apply) = chain
        .find("apply")
        .and_then(|a| a.first_arg())
        .and_then(Expr::as_bool)
    {
        plugin.apply = apply;
    }

    Some(ParsedPlugin {
        plugin,
        version,
        span: chain.span,
    })
}

/// `apply plugin: 'java'` or `apply(plugin = "java")`.
pub fn parse_apply(src: &str, chain: &CallChain) -> Option<ParsedPlugin> {
    if chain.head.name != "apply" {
        return None;
    }
    let id = non_blank(chain.head.named("plugin")?.value.scalar(src))?;
    Some(ParsedPlugin {
        plugin: Plugin::new(id),
        version: None,
        span: chain.span,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_chain;

    fn plugin(src: &str) -> ParsedPlugin {
        parse_plugin(src, &parse_chain(src)).unwrap()
    }

    #[test]
    fn test_groovy_id() {
        let parsed = plugin("id 'org.springframework.boot' version '3.2.0'");
        assert_eq!(parsed.plugin.id, "org.springframework.boot");
        assert_eq!(parsed.plugin.version.as_deref(), Some("3.2.0"));
        assert!(parsed.plugin.apply);
        let Some(VersionAnchor::Literal(span)) = parsed.version else {
            panic!("expected literal anchor");
        };
        assert_eq!(span, Span::new(39, 44));
    }

    #[test]
    fn test_apply_false() {
        let parsed = plugin("id 'com.android.application' version '8.2.0' apply false");
        assert!(!parsed.plugin.apply);
        let parsed = plugin(r#"id("com.android.application").version("8.2.0").apply(false)"#);
        assert!(!parsed.plugin.apply);
        assert_eq!(parsed.plugin.version.as_deref(), Some("8.2.0"));
    }

    #[test]
    fn test_kotlin_shortcut() {
        let parsed = plugin(r#"kotlin("jvm") version "1.9.22""#);
        assert_eq!(parsed.plugin.id, "org.jetbrains.kotlin.jvm");
        assert_eq!(parsed.plugin.version.as_deref(), Some("1.9.22"));
    }

    #[test]
    fn test_bare_identifiers() {
        assert_eq!(plugin("java").plugin.id, "java");
        assert_eq!(plugin("`java-library`").plugin.id, "java-library");
        assert!(plugin("java").version.is_none());
    }

    #[test]
    fn test_alias() {
        let parsed = plugin("alias(libs.plugins.spring.boot)");
        assert_eq!(parsed.plugin.id, "libs.plugins.spring.boot");
        assert_eq!(
            parsed.plugin.config.get("alias").map(String::as_str),
            Some("libs.plugins.spring.boot")
        );
        assert!(parsed.version.is_none());
    }

    #[test]
    fn test_missing_version_insert_point() {
        let src = "id 'java-gradle-plugin'";
        match plugin(src).version {
            Some(VersionAnchor::Insert { at, prefix, suffix }) => {
                assert_eq!(at, src.len());
                assert_eq!(prefix, " version '");
                assert_eq!(suffix, "'");
            }
            other => panic!("unexpected anchor {other:?}"),
        }

        let src = r#"id("x").apply(false)"#;
        match plugin(src).version {
            Some(VersionAnchor::Insert { at, prefix, .. }) => {
                assert_eq!(at, 7);
                assert_eq!(prefix, ".version(\"");
            }
            other => panic!("unexpected anchor {other:?}"),
        }
    }

    #[test]
    fn test_version_from_property() {
        let parsed = plugin("id 'org.jetbrains.kotlin.jvm' version \"$kotlinVersion\"");
        assert_eq!(
            parsed.version,
            Some(VersionAnchor::Property("kotlinVersion".into()))
        );
    }

    #[test]
    fn test_unknown_call_is_rejected() {
        let src = "foo('bar')";
        assert!(parse_plugin(src, &parse_chain(src)).is_none());
    }

    #[test]
    fn test_blank_id_is_rejected() {
        for src in ["id ''", "id(\"\")", "kotlin(\" \")", "apply plugin: ''"] {
            let chain = parse_chain(src);
            assert!(parse_plugin(src, &chain).is_none(), "{src}");
            assert!(parse_apply(src, &chain).is_none(), "{src}");
        }
    }

    #[test]
    fn test_apply_plugin() {
        let src = "apply plugin: 'java'";
        assert_eq!(parse_apply(src, &parse_chain(src)).unwrap().plugin.id, "java");
        let src = r#"apply(plugin = "idea")"#;
        assert_eq!(parse_apply(src, &parse_chain(src)).unwrap().plugin.id, "idea");
        let src = "apply from: 'other.gradle'";
        assert!(parse_apply(src, &parse_chain(src)).is_none());
    }
}
