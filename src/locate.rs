//! Finds the module-path literal of every top-level import-like statement.
//!
//! Recognised forms:
//! - `import 'lib';`
//! - `import * as lib from 'lib';` / `import { Type } from 'lib';`
//! - `import lib = require('lib');`
//! - `import { Type } = require('lib');`
//! - `require('lib');`
//!
//! Matching is structural only. A locally shadowed `require` looks the same
//! as the real one, and nested statements are never visited.

use std::ops::Range;

use serde::Serialize;
use swc_core::ecma::ast::*;
use tracing::debug;

use crate::parse::ParsedSource;

// -----------------------------------------------------------------------------
// Located imports
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImportShape {
    /// `import 'lib';`
    SideEffect,
    /// `import <bindings> from 'lib';`
    From,
    /// `import lib = require('lib');`
    ImportEquals,
    /// `import { <names> } = require('lib');`
    DestructuringRequire,
    /// `require('lib');`
    Require,
}

/// A quoted module path. `span` covers the quote characters too.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModulePathLiteral {
    pub span: Range<usize>,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedImport {
    pub shape: ImportShape,
    pub literal: ModulePathLiteral,
}

/// Every import-like top-level statement of `parsed`, in source order.
pub fn locate(parsed: &ParsedSource) -> Vec<LocatedImport> {
    let located: Vec<LocatedImport> = parsed
        .module
        .body
        .iter()
        .filter_map(|item| module_specifier(parsed, item))
        .map(|(shape, s)| LocatedImport {
            shape,
            literal: ModulePathLiteral {
                span: parsed.range_of(s.span),
                value: s.value.to_string(),
            },
        })
        .filter(|import| {
            let real = parsed.is_source_token(&import.literal.span);
            if !real {
                debug!(path = %import.literal.value, span = ?import.literal.span, "literal is not code in the original text");
            }
            real
        })
        .collect();

    for import in &located {
        debug!(shape = ?import.shape, path = %import.literal.value, span = ?import.literal.span, "located import");
    }
    located
}

// -----------------------------------------------------------------------------
// Shape matching
// -----------------------------------------------------------------------------

fn module_specifier<'a>(parsed: &ParsedSource, item: &'a ModuleItem) -> Option<(ImportShape, &'a Str)> {
    match item {
        // import 'lib';
        // import * as lib from 'lib';
        ModuleItem::ModuleDecl(ModuleDecl::Import(decl)) => {
            let shape = if decl.specifiers.is_empty() {
                ImportShape::SideEffect
            } else {
                ImportShape::From
            };
            Some((shape, &*decl.src))
        }
        // import lib = require('lib');
        ModuleItem::ModuleDecl(ModuleDecl::TsImportEquals(decl)) => match &decl.module_ref {
            TsModuleRef::TsExternalModuleRef(ext) => Some((ImportShape::ImportEquals, &ext.expr)),
            _ => None,
        },
        // require('lib');
        ModuleItem::Stmt(Stmt::Expr(stmt)) => {
            let arg = require_argument(&stmt.expr)?;
            let shape = if parsed.is_destructured_require(parsed.offset_of(stmt.span.lo)) {
                ImportShape::DestructuringRequire
            } else {
                ImportShape::Require
            };
            Some((shape, arg))
        }
        _ => None,
    }
}

// require('lib'), with exactly one plain string argument.
fn require_argument(expr: &Expr) -> Option<&Str> {
    let Expr::Call(call) = expr else { return None };
    let Callee::Expr(callee) = &call.callee else { return None };
    match &**callee {
        Expr::Ident(id) if id.sym.as_ref() == "require" => {}
        _ => return None,
    }

    match call.args.as_slice() {
        [arg] if arg.spread.is_none() => match &*arg.expr {
            Expr::Lit(Lit::Str(s)) => Some(s),
            _ => None,
        },
        _ => None,
    }
}
