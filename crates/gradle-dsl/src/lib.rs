//! Gradle build-script parser, source-position tracker and structured editor.
//!
//! Reads Groovy (`build.gradle`) and Kotlin (`build.gradle.kts`) build
//! scripts into a [`Project`] model and edits them in place with minimal
//! diffs:
//!
//! ```
//! use gradle_dsl::{parse_gradle, update_dependency_version};
//!
//! let script = "dependencies {\n    implementation 'mysql:mysql-connector-java:8.0.28'\n}\n";
//! let result = parse_gradle(script);
//! assert_eq!(result.project.dependencies[0].version, "8.0.28");
//!
//! let bumped = update_dependency_version(script, "mysql", "mysql-connector-java", "8.0.31").unwrap();
//! assert!(bumped.contains("8.0.31"));
//! ```

mod builder;
pub mod config;
pub mod discovery;
pub mod editor;
pub mod error;
pub mod parser;
pub mod position;
pub mod scanner;
pub mod settings;
pub mod types;

pub use config::ParserConfig;
pub use editor::{
    EditRequest, StructuredEditor, TextEdit, add_dependency, apply_edits, apply_requests,
    update_dependency_version, update_dependency_version_in_scope, update_plugin_version,
};
pub use error::{EditError, GradleError, ParseError, Result, Warning};
pub use parser::{Dialect, GradleParser, PositionedParse, parse_gradle};
pub use position::{LineOffsetTable, Position, SourceLocation, SourceMap, Span};
pub use settings::{Settings, parse_settings};
pub use types::{
    Dependency, DependencyKind, DependencySet, ParseResult, Plugin, Project, Repository,
    RepositoryType, Task,
};
