use std::{fs, path::Path};

use rewrite_imports::{
    driver::{expand_pattern, process_file, run, Options, Summary},
    DriverError,
};
use tempfile::TempDir;

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn read(root: &Path, rel: &str) -> String {
    fs::read_to_string(root.join(rel)).unwrap()
}

fn fixture() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "src/a.ts", "import * as s3 from '@aws-cdk/aws-s3';\n");
    write(root, "src/b.ts", "import { Construct } from 'constructs';\n");
    write(root, "src/types.d.ts", "import '@aws-cdk/core';\n");
    write(root, "src/nested/c.ts", "require('@aws-cdk/core');\n");
    write(root, "lib/d.js", "require('@aws-cdk/aws-sns');\n");
    write(root, "node_modules/pkg/index.ts", "import '@aws-cdk/core';\n");
    write(root, ".cache/e.ts", "import '@aws-cdk/core';\n");
    dir
}

fn relative(root: &Path, files: Vec<std::path::PathBuf>) -> Vec<String> {
    files
        .into_iter()
        .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
        .collect()
}

#[test]
fn expands_globstar_with_ignores() {
    let dir = fixture();
    let files = expand_pattern(dir.path(), "**/*.ts").unwrap();
    assert_eq!(relative(dir.path(), files), vec!["src/a.ts", "src/b.ts", "src/nested/c.ts"]);
}

#[test]
fn bare_patterns_match_base_names() {
    let dir = fixture();
    let files = expand_pattern(dir.path(), "*.js").unwrap();
    assert_eq!(relative(dir.path(), files), vec!["lib/d.js"]);

    let files = expand_pattern(dir.path(), "c.ts").unwrap();
    assert!(files.is_empty(), "literal paths are resolved from the root");
}

#[test]
fn expands_alternations_and_literals() {
    let dir = fixture();
    let files = expand_pattern(dir.path(), "src/{a,b}.ts").unwrap();
    assert_eq!(relative(dir.path(), files), vec!["src/a.ts", "src/b.ts"]);

    let files = expand_pattern(dir.path(), "./lib/d.js").unwrap();
    assert_eq!(relative(dir.path(), files), vec!["lib/d.js"]);

    let files = expand_pattern(dir.path(), "src/types.d.ts").unwrap();
    assert!(files.is_empty());
}

#[test]
fn missing_base_yields_nothing() {
    let dir = fixture();
    assert!(expand_pattern(dir.path(), "missing/**/*.ts").unwrap().is_empty());
}

#[test]
fn bad_pattern_is_reported() {
    let dir = fixture();
    let err = expand_pattern(dir.path(), "src/a**.ts").unwrap_err();
    assert!(matches!(err, DriverError::Pattern { .. }), "{err}");
    assert!(err.to_string().contains("src/a**.ts"));

    assert!(expand_pattern(dir.path(), "src/{a,b.ts").unwrap().is_empty());
}

#[test]
fn rewrites_matching_files_once() {
    let dir = fixture();
    let root = dir.path();
    let patterns = vec!["**/*.ts".to_string(), "src/a.ts".to_string(), "*.js".to_string()];

    let mut reports = vec![];
    let summary = run(root, &patterns, &Options::default(), |report| reports.push(report.clone())).unwrap();

    assert_eq!(summary, Summary { files: 4, changed: 3 });
    assert_eq!(reports.len(), 4);
    assert!(reports.iter().filter(|r| r.changed).all(|r| r.written));

    assert_eq!(read(root, "src/a.ts"), "import * as s3 from 'monocdk/aws-s3';\n");
    assert_eq!(read(root, "src/b.ts"), "import { Construct } from 'constructs';\n");
    assert_eq!(read(root, "src/nested/c.ts"), "require('monocdk');\n");
    assert_eq!(read(root, "lib/d.js"), "require('monocdk/aws-sns');\n");
    assert_eq!(read(root, "src/types.d.ts"), "import '@aws-cdk/core';\n");
    assert_eq!(read(root, "node_modules/pkg/index.ts"), "import '@aws-cdk/core';\n");
    assert_eq!(read(root, ".cache/e.ts"), "import '@aws-cdk/core';\n");
}

#[test]
fn dry_run_leaves_files_alone() {
    let dir = fixture();
    let root = dir.path();
    let options = Options { dry_run: true };

    let report = process_file(&root.join("src/a.ts"), &options).unwrap();
    assert!(report.changed);
    assert!(!report.written);
    assert_eq!(report.rewrites.len(), 1);
    assert_eq!(report.rewrites[0].to, "monocdk/aws-s3");
    assert_eq!(read(root, "src/a.ts"), "import * as s3 from '@aws-cdk/aws-s3';\n");
}

#[test]
fn report_serializes_to_json() {
    let dir = fixture();
    let report = process_file(&dir.path().join("src/nested/c.ts"), &Options { dry_run: true }).unwrap();
    let json: serde_json::Value = serde_json::to_value(&report).unwrap();
    assert_eq!(json["changed"], true);
    assert_eq!(json["rewrites"][0]["shape"], "require");
    assert_eq!(json["rewrites"][0]["from"], "@aws-cdk/core");
    assert_eq!(json["rewrites"][0]["to"], "monocdk");
    assert_eq!(json["rewrites"][0]["line"], 1);
}

#[test]
fn unreadable_file_is_an_error() {
    let dir = fixture();
    let missing = dir.path().join("src/missing.ts");
    let err = process_file(&missing, &Options::default()).unwrap_err();
    assert!(matches!(err, DriverError::Read { .. }));
    assert!(err.to_string().contains("missing.ts"));
}
