//! Re-writes "hyper-modular" CDK imports (most packages in `@aws-cdk/*`) to the
//! matching `monocdk` import path. Only the imported module path is touched;
//! quote style, whitespace and comments are preserved byte for byte.
//!
//! Syntax errors in the processed source may cause some import statements to
//! be left as they are.

pub mod driver;
pub mod error;
pub mod locate;
pub mod logging;
pub mod parse;
pub mod rules;
pub mod splice;

use serde::Serialize;

pub use error::DriverError;
pub use locate::{ImportShape, LocatedImport, ModulePathLiteral};
pub use rules::RewriteRules;
pub use splice::{splice, Replacement};

/// File name handed to the parser when the caller has none.
pub const DEFAULT_FILE_NAME: &str = "index.ts";

// -----------------------------------------------------------------------------
// Rewrite results
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedRewrite {
    pub shape: ImportShape,
    /// 1-based line of the literal in the input.
    pub line: usize,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub text: String,
    pub applied: Vec<AppliedRewrite>,
}

impl Rewrite {
    fn unchanged(source: &str) -> Self {
        Rewrite {
            text: source.to_string(),
            applied: vec![],
        }
    }
}

// -----------------------------------------------------------------------------
// Entrypoints
// -----------------------------------------------------------------------------

/// Rewrites `@aws-cdk/*` module paths in `source` using the built-in rules.
/// `file_name` only affects dialect selection and diagnostics. Never fails:
/// unparsable input comes back unchanged.
pub fn rewrite_imports(source: &str, file_name: &str) -> String {
    rewrite_with(&RewriteRules::MONOCDK, source, file_name).text
}

/// Like [`rewrite_imports`], with explicit rules and a record of every rewrite.
pub fn rewrite_with(rules: &RewriteRules, source: &str, file_name: &str) -> Rewrite {
    let Some(parsed) = parse::parse(source, file_name) else {
        return Rewrite::unchanged(source);
    };

    let mut applied = vec![];
    let mut replacements = vec![];
    for located in locate::locate(&parsed) {
        let Some(updated) = rules.updated_location(&located.literal.value) else {
            continue;
        };
        applied.push(AppliedRewrite {
            shape: located.shape,
            line: line_of(source, located.literal.span.start),
            from: located.literal.value.clone(),
            to: updated.clone(),
        });
        replacements.push(Replacement {
            literal: located.literal,
            updated,
        });
    }

    Rewrite {
        text: splice(source, replacements),
        applied,
    }
}

fn line_of(source: &str, offset: usize) -> usize {
    source.as_bytes()[..offset.min(source.len())]
        .iter()
        .filter(|b| **b == b'\n')
        .count()
        + 1
}
