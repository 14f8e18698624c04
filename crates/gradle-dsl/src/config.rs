//! Parser feature flags.

use serde::{Deserialize, Serialize};

/// Controls which parts of a build script are extracted.
///
/// Disabled sections leave their collection empty and skip the matching
/// statements entirely. Deserializes from camelCase JSON; missing fields
/// default to `true`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParserConfig {
    pub skip_comments: bool,
    pub collect_raw_content: bool,
    pub parse_plugins: bool,
    pub parse_dependencies: bool,
    pub parse_repositories: bool,
    pub parse_tasks: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            skip_comments: true,
            collect_raw_content: true,
            parse_plugins: true,
            parse_dependencies: true,
            parse_repositories: true,
            parse_tasks: true,
        }
    }
}

impl ParserConfig {
    #[must_use]
    pub const fn with_skip_comments(mut self, value: bool) -> Self {
        self.skip_comments = value;
        self
    }

    #[must_use]
    pub const fn with_collect_raw_content(mut self, value: bool) -> Self {
        self.collect_raw_content = value;
        self
    }

    #[must_use]
    pub const fn with_parse_plugins(mut self, value: bool) -> Self {
        self.parse_plugins = value;
        self
    }

    #[must_use]
    pub const fn with_parse_dependencies(mut self, value: bool) -> Self {
        self.parse_dependencies = value;
        self
    }

    #[must_use]
    pub const fn with_parse_repositories(mut self, value: bool) -> Self {
        self.parse_repositories = value;
        self
    }

    #[must_use]
    pub const fn with_parse_tasks(mut self, value: bool) -> Self {
        self.parse_tasks = value;
        self
    }
}
