//! Integration tests for gradle-dsl using fixture build scripts.

use gradle_dsl::{
    Dependency, DependencyKind, Dialect, EditError, GradleParser, ParseError, ParserConfig,
    RepositoryType, add_dependency, parse_gradle, update_dependency_version,
    update_plugin_version,
};
use std::collections::BTreeSet;

const GROOVY: &str = include_str!("fixtures/build.gradle");
const KOTLIN: &str = include_str!("fixtures/build.gradle.kts");
const SETTINGS: &str = include_str!("fixtures/settings.gradle");

fn coordinate_set(content: &str) -> BTreeSet<(String, String, String, String)> {
    parse_gradle(content)
        .project
        .dependencies
        .into_iter()
        .map(|d| (d.scope, d.group, d.name, d.version))
        .collect()
}

/// Characters that differ between `a` and `b`, as one `(start, end_a, end_b)`
/// region after trimming the common prefix and suffix.
fn diff_region(a: &str, b: &str) -> (usize, usize, usize) {
    let prefix = a
        .bytes()
        .zip(b.bytes())
        .take_while(|(x, y)| x == y)
        .count();
    let suffix = a[prefix..]
        .bytes()
        .rev()
        .zip(b[prefix..].bytes().rev())
        .take_while(|(x, y)| x == y)
        .count();
    (prefix, a.len() - suffix, b.len() - suffix)
}

// --- Groovy fixture ---

#[test]
fn test_groovy_fixture() {
    let result = parse_gradle(GROOVY);
    assert!(result.is_ok(), "{:?}", result.errors);
    assert!(result.warnings.is_empty(), "{:?}", result.warnings);

    let project = &result.project;
    assert_eq!(project.group, "com.example");
    assert_eq!(project.version, "1.0.0");
    assert_eq!(project.description, "Order service");
    assert_eq!(project.source_compatibility, "17");
    assert_eq!(project.target_compatibility, "17");
    assert_eq!(project.properties["lombokVersion"], "1.18.30");

    let ids: Vec<_> = project.plugins.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(
        ids,
        [
            "java",
            "org.springframework.boot",
            "io.spring.dependency-management"
        ]
    );

    assert_eq!(project.repositories.len(), 2);
    assert_eq!(project.repositories[0].repo_type, RepositoryType::MavenCentral);
    assert_eq!(project.repositories[1].url, "https://repo.example.com/releases");
    assert_eq!(project.repositories[1].username.as_deref(), Some("deploy"));

    assert_eq!(project.dependencies.len(), 9);
    let guava = project.find_dependency("com.google.guava", "guava").unwrap();
    assert_eq!(guava.version, "33.0.0-jre");

    let hibernate = project
        .find_dependency("org.hibernate", "hibernate-core")
        .unwrap();
    assert!(!hibernate.transitive);

    let common = project
        .dependencies
        .iter()
        .find(|d| d.kind == DependencyKind::Project)
        .unwrap();
    assert_eq!(common.name, ":common");

    let legacy = project
        .dependencies
        .iter()
        .find(|d| d.kind == DependencyKind::File)
        .unwrap();
    assert_eq!(legacy.name, "libs/legacy.jar");
    assert_eq!(legacy.scope, "runtimeOnly");

    assert_eq!(project.tasks.len(), 1);
    assert_eq!(project.tasks[0].name, "integrationTest");
    assert_eq!(project.tasks[0].task_type, "Test");
    assert_eq!(project.tasks[0].group, "verification");

    assert!(project.extensions.contains_key("java"));
    assert!(project.extensions.contains_key("test"));
}

#[test]
fn test_kotlin_fixture() {
    let parsed = GradleParser::default().parse_with_positions(KOTLIN);
    assert_eq!(parsed.dialect, Dialect::Kotlin);
    let result = parsed.result;
    assert!(result.is_ok(), "{:?}", result.errors);
    assert!(result.warnings.is_empty(), "{:?}", result.warnings);
    assert_eq!(result.project.properties["lombokVersion"], "1.18.30");
    assert_eq!(result.project.tasks[0].task_type, "Test");
    assert!(
        !result
            .project
            .find_dependency("org.hibernate", "hibernate-core")
            .unwrap()
            .transitive
    );
}

#[test]
fn test_groovy_and_kotlin_are_equivalent() {
    let groovy = parse_gradle(GROOVY).project;
    let kotlin = parse_gradle(KOTLIN).project;

    assert_eq!(groovy.group, kotlin.group);
    assert_eq!(groovy.version, kotlin.version);
    assert_eq!(groovy.source_compatibility, kotlin.source_compatibility);
    assert_eq!(coordinate_set(GROOVY), coordinate_set(KOTLIN));

    let plugins = |p: &gradle_dsl::Project| {
        p.plugins
            .iter()
            .map(|p| (p.id.clone(), p.version.clone()))
            .collect::<BTreeSet<_>>()
    };
    assert_eq!(plugins(&groovy), plugins(&kotlin));
}

#[test]
fn test_parsing_is_deterministic() {
    let mut first = parse_gradle(GROOVY);
    let mut second = parse_gradle(GROOVY);
    first.parse_time = Default::default();
    second.parse_time = Default::default();
    assert_eq!(first.project, second.project);
    assert_eq!(first.warnings, second.warnings);
    assert_eq!(
        serde_json::to_value(&first).unwrap(),
        serde_json::to_value(&second).unwrap()
    );
}

// --- Behaviors from the public contract ---

#[test]
fn test_spring_boot_notation() {
    let result =
        parse_gradle("dependencies {\n    implementation 'org.springframework.boot:spring-boot-starter-web:2.7.0'\n}\n");
    let dep = &result.project.dependencies[0];
    assert_eq!(dep.group, "org.springframework.boot");
    assert_eq!(dep.name, "spring-boot-starter-web");
    assert_eq!(dep.version, "2.7.0");
    assert_eq!(dep.scope, "implementation");
}

#[test]
fn test_plugins_group_version() {
    let result = parse_gradle("plugins { id 'java' }\ngroup = 'com.example'\nversion = '1.0.0'\n");
    assert_eq!(result.project.group, "com.example");
    assert_eq!(result.project.version, "1.0.0");
    assert_eq!(result.project.plugins.len(), 1);
    assert_eq!(result.project.plugins[0].id, "java");
}

#[test]
fn test_plugins_group_version_on_one_line() {
    let result = parse_gradle("plugins { id 'java' } group = 'com.example' version = '1.0.0'");
    assert!(result.is_ok());
    assert!(result.warnings.is_empty(), "{:?}", result.warnings);
    assert_eq!(result.project.group, "com.example");
    assert_eq!(result.project.version, "1.0.0");
    let ids: Vec<_> = result.project.plugins.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, ["java"]);
}

#[test]
fn test_core_fields_have_source_locations() {
    let src = "group = 'com.example'\nversion = '1.0.0'\n";
    let parsed = GradleParser::default().parse_with_positions(src);
    let version = parsed.source_map.property("version").unwrap();
    assert_eq!(version.location.start.line, 2);
    assert_eq!(version.value.unwrap().text(src), "1.0.0");
}

#[test]
fn test_add_dependency_to_hint_free_kotlin_script() {
    let src = "plugins {\n    java\n}\n\ndependencies {\n    implementation(libs.guava)\n}\n";
    let out = add_dependency(src, "implementation", &Dependency::new("c", "d", "1")).unwrap();
    assert!(out.contains("    implementation(libs.guava)\n    implementation(\"c:d:1\")\n"));
}

#[test]
fn test_unrecognized_top_level_statement_is_a_warning() {
    let result = parse_gradle("group = 'a'\nfoo.bar.baz = 1\n");
    assert_eq!(result.project.group, "a");
    assert_eq!(result.warnings.len(), 1);
    assert_eq!(result.warnings[0].at.unwrap().line, 2);
}

#[test]
fn test_dependency_sets_by_scope() {
    let result = parse_gradle(
        "dependencies {\n    implementation 'a:one:1'\n    testImplementation 'a:two:1'\n    implementation 'a:three:1'\n}\n",
    );
    let sets = result.project.dependency_sets();
    assert_eq!(sets.len(), 2);
    assert_eq!(sets[0].scope, "implementation");
    let names: Vec<_> = sets[0].dependencies.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, ["one", "three"]);
    assert_eq!(sets[1].scope, "testImplementation");
    assert_eq!(sets[1].dependencies.len(), 1);
}

#[test]
fn test_unmatched_brace_is_fatal() {
    let src = "plugins {\n    id 'java'\n}\ndependencies {\n    implementation 'a:b:1'\n";
    let result = parse_gradle(src);
    assert_eq!(result.errors.len(), 1);
    assert!(result.project.dependencies.is_empty());
    assert!(result.project.plugins.is_empty());
    match &result.errors[0] {
        ParseError::UnmatchedOpen { delimiter, at } => {
            assert_eq!(*delimiter, '{');
            assert_eq!(at.offset, src.find("dependencies {").unwrap() + 13);
            assert_eq!(at.line, 4);
            assert_eq!(at.column, 14);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_mysql_bump_changes_only_the_version() {
    let updated =
        update_dependency_version(GROOVY, "mysql", "mysql-connector-java", "8.0.31").unwrap();
    let (start, end_old, end_new) = diff_region(GROOVY, &updated);
    assert_eq!(&GROOVY[start..end_old], "28");
    assert_eq!(&updated[start..end_new], "31");

    let reparsed = parse_gradle(&updated).project;
    assert_eq!(
        reparsed
            .find_dependency("mysql", "mysql-connector-java")
            .unwrap()
            .version,
        "8.0.31"
    );
}

#[test]
fn test_kotlin_bump_and_plugin_bump() {
    let updated =
        update_dependency_version(KOTLIN, "mysql", "mysql-connector-java", "8.0.31").unwrap();
    assert_eq!(updated, KOTLIN.replace("8.0.28", "8.0.31"));

    let updated = update_plugin_version(KOTLIN, "org.springframework.boot", "3.2.1").unwrap();
    assert_eq!(
        updated,
        KOTLIN.replace(
            "id(\"org.springframework.boot\") version \"3.2.0\"",
            "id(\"org.springframework.boot\") version \"3.2.1\""
        )
    );
}

#[test]
fn test_bump_through_property_in_both_dialects() {
    let groovy = update_dependency_version(GROOVY, "org.projectlombok", "lombok", "1.18.32").unwrap();
    assert_eq!(groovy, GROOVY.replace("'1.18.30'", "'1.18.32'"));

    let kotlin = update_dependency_version(KOTLIN, "org.projectlombok", "lombok", "1.18.32").unwrap();
    assert_eq!(kotlin, KOTLIN.replace("\"1.18.30\"", "\"1.18.32\""));
}

#[test]
fn test_edit_errors() {
    assert!(matches!(
        update_dependency_version(GROOVY, "com.example", "missing", "1"),
        Err(EditError::NotFound { .. })
    ));
    assert!(matches!(
        update_dependency_version(GROOVY, "", ":common", "1"),
        Err(EditError::NotEditable { .. })
    ));
    assert!(matches!(
        update_dependency_version("dependencies {", "a", "b", "1"),
        Err(EditError::Parse(_))
    ));
}

#[test]
fn test_add_dependency_in_each_dialect() {
    let dep = Dependency::new("org.postgresql", "postgresql", "42.7.1");

    let groovy = add_dependency(GROOVY, "runtimeOnly", &dep).unwrap();
    assert!(groovy.contains(
        "    runtimeOnly files('libs/legacy.jar')\n    runtimeOnly 'org.postgresql:postgresql:42.7.1'\n"
    ));

    let kotlin = add_dependency(KOTLIN, "runtimeOnly", &dep).unwrap();
    assert!(kotlin.contains(
        "    runtimeOnly(files(\"libs/legacy.jar\"))\n    runtimeOnly(\"org.postgresql:postgresql:42.7.1\")\n"
    ));

    for updated in [&groovy, &kotlin] {
        let project = parse_gradle(updated).project;
        assert_eq!(project.dependencies.len(), 10);
        assert!(project.find_dependency("org.postgresql", "postgresql").is_some());
    }
}

#[test]
fn test_disabled_sections() {
    let parser = GradleParser::new(
        ParserConfig::default()
            .with_parse_dependencies(false)
            .with_parse_repositories(false),
    );
    let result = parser.parse_str(GROOVY);
    assert!(result.project.dependencies.is_empty());
    assert!(result.project.repositories.is_empty());
    assert_eq!(result.project.plugins.len(), 3);
}

#[test]
fn test_config_from_json() {
    let config: ParserConfig = serde_json::from_str(r#"{"parseTasks": false}"#).unwrap();
    assert!(!config.parse_tasks);
    assert!(config.parse_plugins);
    assert!(config.skip_comments);
}

#[test]
fn test_parse_result_json_shape() {
    let result = parse_gradle("group = 'com.example'\n");
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["project"]["group"], "com.example");
    assert_eq!(json["rawText"], "group = 'com.example'\n");
    assert!(json["errors"].as_array().unwrap().is_empty());
    assert!(json["parseTime"].is_string());
    assert!(json.get("comments").is_none());
    assert!(json["project"].get("sourceCompatibility").is_some());
    assert!(json["project"].get("subProjects").is_some());
}

#[test]
fn test_warning_json_is_positioned() {
    let result = parse_gradle("dependencies {\n    implementation 'guava'\n}\n");
    let messages: Vec<String> = result.warnings.iter().map(ToString::to_string).collect();
    insta::assert_json_snapshot!(messages, @r#"
    [
      "line 2, column 5: unrecognized dependency notation 'guava'"
    ]
    "#);
}

// --- Files and multi-project builds ---

#[test]
fn test_parse_file_sets_path_and_dialect() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("build.gradle.kts");
    std::fs::write(&path, KOTLIN).unwrap();

    let result = GradleParser::default().parse_file(&path).unwrap();
    assert_eq!(result.project.file_path, path.display().to_string());
    assert_eq!(result.project.dependencies.len(), 9);
}

#[test]
fn test_multi_project_fixture() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    std::fs::write(root.join("settings.gradle"), SETTINGS).unwrap();
    std::fs::write(root.join("build.gradle"), GROOVY).unwrap();
    std::fs::create_dir_all(root.join("common")).unwrap();
    std::fs::write(
        root.join("common/build.gradle"),
        "dependencies {\n    api 'org.slf4j:slf4j-api:2.0.9'\n}\n",
    )
    .unwrap();
    std::fs::create_dir_all(root.join("clients/java")).unwrap();
    std::fs::write(
        root.join("clients/java/build.gradle.kts"),
        "version = \"0.3.0\"\n",
    )
    .unwrap();

    let result = GradleParser::default().parse_project_dir(root).unwrap();
    let project = &result.project;
    assert_eq!(project.name, "order-service");
    assert_eq!(project.dependencies.len(), 9);

    let names: Vec<_> = project.sub_projects.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["common", "api"]);
    assert_eq!(project.sub_projects[0].dependencies[0].name, "slf4j-api");

    let client = &project.sub_projects[1].sub_projects[0];
    assert_eq!(client.name, "client");
    assert_eq!(client.version, "0.3.0");
}
