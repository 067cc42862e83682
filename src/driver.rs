//! File driver: expands glob patterns, runs every match through the rewrite
//! core and writes back files whose content actually changed.

use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use glob::{MatchOptions, Pattern};
use serde::Serialize;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::{
    error::{DriverError, DriverResult},
    rewrite_with, AppliedRewrite, RewriteRules,
};

/// Files matching these are never touched.
const IGNORED_FILES: &[&str] = &["**/*.d.ts"];
/// Directory trees that are never walked.
const IGNORED_DIRECTORIES: &[&str] = &["node_modules"];

// -----------------------------------------------------------------------------
// Reports
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Report changes without writing them.
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: String,
    pub changed: bool,
    pub written: bool,
    pub rewrites: Vec<AppliedRewrite>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub files: usize,
    pub changed: usize,
}

// -----------------------------------------------------------------------------
// Driver
// -----------------------------------------------------------------------------

/// Processes every file matched by `patterns` (relative to `root`), pattern by
/// pattern. A file matched twice is only processed once. Stops at the first
/// error; files written before it stay written.
pub fn run(
    root: &Path,
    patterns: &[String],
    options: &Options,
    mut on_report: impl FnMut(&FileReport),
) -> DriverResult<Summary> {
    let mut seen = HashSet::new();
    let mut summary = Summary::default();

    for pattern in patterns {
        for path in expand_pattern(root, pattern)? {
            if !seen.insert(path.clone()) {
                continue;
            }
            let report = process_file(&path, options)?;
            summary.files += 1;
            if report.changed {
                summary.changed += 1;
            }
            on_report(&report);
        }
    }
    Ok(summary)
}

/// Rewrites one file. The file is written only when the trimmed output differs
/// from the trimmed input.
pub fn process_file(path: &Path, options: &Options) -> DriverResult<FileReport> {
    let input = fs::read_to_string(path).map_err(|source| DriverError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let file_name = path.to_string_lossy();
    let rewrite = rewrite_with(&RewriteRules::MONOCDK, &input, &file_name);
    let changed = rewrite.text.trim() != input.trim();

    let written = changed && !options.dry_run;
    if written {
        fs::write(path, &rewrite.text).map_err(|source| DriverError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        info!(file = %file_name, rewrites = rewrite.applied.len(), "rewrote imports");
    } else if changed {
        info!(file = %file_name, rewrites = rewrite.applied.len(), "would rewrite imports");
    } else {
        debug!(file = %file_name, "nothing to rewrite");
    }

    Ok(FileReport {
        path: file_name.into_owned(),
        changed,
        written,
        rewrites: rewrite.applied,
    })
}

// -----------------------------------------------------------------------------
// Pattern expansion
// -----------------------------------------------------------------------------

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

fn has_magic(s: &str) -> bool {
    s.contains(['*', '?', '[', '{'])
}

fn normalize(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// A glob with `{a,b}` alternations expanded into one [`Pattern`] each.
struct Glob(Vec<Pattern>);

impl Glob {
    fn new(glob: &str) -> DriverResult<Self> {
        expand_braces(glob)
            .iter()
            .map(|alternative| {
                Pattern::new(alternative).map_err(|source| DriverError::Pattern {
                    pattern: glob.to_string(),
                    source,
                })
            })
            .collect::<DriverResult<Vec<_>>>()
            .map(Glob)
    }

    fn matches(&self, path: &str) -> bool {
        self.0.iter().any(|pattern| pattern.matches_with(path, MATCH_OPTIONS))
    }
}

/// Expands the first balanced `{..}` group holding a top-level `,`, then the
/// rest of each result. Unbalanced braces are left as literal characters.
fn expand_braces(glob: &str) -> Vec<String> {
    let bytes = glob.as_bytes();
    for open in (0..bytes.len()).filter(|i| bytes[*i] == b'{') {
        let mut depth = 0usize;
        let mut commas = vec![];
        let mut close = None;
        for (i, b) in bytes.iter().enumerate().skip(open) {
            match b {
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        close = Some(i);
                        break;
                    }
                }
                b',' if depth == 1 => commas.push(i),
                _ => {}
            }
        }
        let Some(close) = close else { continue };
        if commas.is_empty() {
            continue;
        }

        let (prefix, suffix) = (&glob[..open], &glob[close + 1..]);
        let mut bounds = vec![open];
        bounds.extend(commas);
        bounds.push(close);
        return bounds
            .windows(2)
            .flat_map(|w| expand_braces(&format!("{prefix}{}{suffix}", &glob[w[0] + 1..w[1]])))
            .collect();
    }
    vec![glob.to_string()]
}

/// Expands one glob pattern to the sorted list of files it matches under
/// `root`. A pattern without `/` is matched against file base names anywhere
/// in the tree.
pub fn expand_pattern(root: &Path, pattern: &str) -> DriverResult<Vec<PathBuf>> {
    let ignored = IGNORED_FILES
        .iter()
        .map(|glob| Glob::new(glob))
        .collect::<DriverResult<Vec<_>>>()?;
    let is_ignored = |rel: &str| ignored.iter().any(|glob| glob.matches(rel));

    let pattern = pattern.replace('\\', "/");
    let pattern = pattern.strip_prefix("./").unwrap_or(&pattern);

    if !has_magic(pattern) {
        let path = root.join(pattern);
        let keep = path.is_file() && !is_ignored(&normalize(Path::new(pattern)));
        return Ok(if keep { vec![path] } else { vec![] });
    }

    let matcher = Glob::new(pattern)?;
    let match_base = !pattern.contains('/');
    let allow_dot = pattern.starts_with('.') || pattern.contains("/.");

    let segments: Vec<&str> = pattern.split('/').collect();
    let literal = segments[..segments.len() - 1]
        .iter()
        .take_while(|seg| !has_magic(seg))
        .copied()
        .collect::<Vec<_>>();
    let base = match literal.join("/") {
        b if b.is_empty() && pattern.starts_with('/') => "/".to_string(),
        b => b,
    };

    let walk_root = root.join(&base);
    if !walk_root.exists() {
        debug!(pattern, "pattern base does not exist");
        return Ok(vec![]);
    }

    let walker = WalkDir::new(&walk_root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 {
                return true;
            }
            let name = entry.file_name().to_string_lossy();
            if name.starts_with('.') && !allow_dot {
                return false;
            }
            !(entry.file_type().is_dir() && IGNORED_DIRECTORIES.iter().any(|dir| name == *dir))
        });

    let mut files = vec![];
    for entry in walker {
        let entry = entry.map_err(|source| DriverError::Walk {
            pattern: pattern.to_string(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let rel = normalize(entry.path().strip_prefix(root).unwrap_or(entry.path()));
        let candidate = if match_base {
            normalize(Path::new(entry.file_name()))
        } else {
            rel.clone()
        };
        if matcher.matches(&candidate) && !is_ignored(&rel) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}
