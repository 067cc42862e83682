//! Parser adapter: turns file text into an swc [`Module`] whose spans can be
//! mapped back to byte offsets in the original text.
//!
//! Fatal syntax errors do not abort the parse. The offending region is blanked
//! (every byte replaced with a space, line breaks kept) and the text is parsed
//! again, so spans in the final tree still line up with the original input.
//! Blanking can pull text out of a comment or template literal, so a tree
//! built from blanked text is checked against the tokens of the original.

use std::ops::Range;

use swc_core::{
    common::{sync::Lrc, BytePos, FileName, SourceMap, Span, Spanned},
    ecma::{
        ast::{EsVersion, Module},
        parser::{lexer::Lexer, parse_file_as_module, StringInput, Syntax, TsSyntax},
    },
};
use tracing::{debug, warn};

const MAX_RECOVERY_ATTEMPTS: usize = 64;

// -----------------------------------------------------------------------------
// Parsed tree
// -----------------------------------------------------------------------------

pub struct ParsedSource {
    pub module: Module,
    base: BytePos,
    // Start offsets of `require(...)` calls uncovered by blanking an
    // `import <bindings> =` prefix.
    destructured_requires: Vec<usize>,
    // Token ranges of the original text, sorted by start. Only kept when the
    // tree was built from blanked text.
    source_tokens: Option<Vec<Range<usize>>>,
}

impl ParsedSource {
    pub fn offset_of(&self, pos: BytePos) -> usize {
        pos.0.saturating_sub(self.base.0) as usize
    }

    /// Byte range of `span` in the original text.
    pub fn range_of(&self, span: Span) -> Range<usize> {
        self.offset_of(span.lo)..self.offset_of(span.hi)
    }

    /// Whether the statement starting at `offset` was reached by unwrapping an
    /// `import { .. } = require(..)` declaration.
    pub fn is_destructured_require(&self, offset: usize) -> bool {
        self.destructured_requires.contains(&offset)
    }

    /// Whether `range` is exactly one token of the original text, as opposed
    /// to text that only became code once part of the input was blanked.
    pub fn is_source_token(&self, range: &Range<usize>) -> bool {
        let Some(tokens) = &self.source_tokens else {
            return true;
        };
        tokens
            .binary_search_by_key(&range.start, |token| token.start)
            .is_ok_and(|i| tokens[i].end == range.end)
    }
}

/// Picks the dialect from the file name. Everything goes through the
/// TypeScript grammar; the extension only toggles JSX and declaration mode.
pub fn syntax_for(file_name: &str) -> Syntax {
    let name = file_name.to_ascii_lowercase();
    Syntax::Typescript(TsSyntax {
        tsx: name.ends_with(".tsx") || name.ends_with(".jsx"),
        decorators: true,
        dts: [".d.ts", ".d.mts", ".d.cts"].iter().any(|ext| name.ends_with(ext)),
        ..Default::default()
    })
}

/// Parses `source`, recovering from fatal errors by blanking the failing
/// statement. Returns `None` when nothing sensible could be salvaged.
pub fn parse(source: &str, file_name: &str) -> Option<ParsedSource> {
    let syntax = syntax_for(file_name);
    let mut text = source.to_string();
    let mut destructured_requires = Vec::new();

    for attempt in 0..=MAX_RECOVERY_ATTEMPTS {
        let cm: Lrc<SourceMap> = Default::default();
        let fm = cm.new_source_file(FileName::Custom(file_name.to_string()).into(), text.clone());

        let mut recovered = vec![];
        let err = match parse_file_as_module(&fm, syntax, EsVersion::latest(), None, &mut recovered) {
            Ok(module) => {
                for err in &recovered {
                    debug!(file = file_name, error = ?err, "recovered syntax error");
                }
                let source_tokens = (text != source).then(|| token_ranges(source, file_name, syntax));
                return Some(ParsedSource {
                    module,
                    base: fm.start_pos,
                    destructured_requires,
                    source_tokens,
                });
            }
            Err(err) => err,
        };

        if attempt == MAX_RECOVERY_ATTEMPTS {
            break;
        }

        let offset = (err.span().lo.0.saturating_sub(fm.start_pos.0) as usize).min(text.len());
        match recovery_for(&text, offset) {
            Some(Recovery::BindingClause { blank, call }) => {
                debug!(file = file_name, offset, "unwrapping `import .. = require(..)`");
                blank_out(&mut text, blank);
                destructured_requires.push(call);
            }
            Some(Recovery::Line(line)) => {
                debug!(file = file_name, offset, error = ?err, "skipping unparsable line");
                blank_out(&mut text, line);
            }
            None => break,
        }
    }

    warn!(file = file_name, "could not parse source; leaving it untouched");
    None
}

// Lexes `source` on its own. The lexer keeps comments and template contents
// out of the token stream, which a parse of blanked text cannot.
fn token_ranges(source: &str, file_name: &str, syntax: Syntax) -> Vec<Range<usize>> {
    let cm: Lrc<SourceMap> = Default::default();
    let fm = cm.new_source_file(FileName::Custom(file_name.to_string()).into(), source.to_string());
    let base = fm.start_pos.0;
    let offset = |pos: BytePos| pos.0.saturating_sub(base) as usize;

    let mut ranges: Vec<Range<usize>> = Lexer::new(syntax, EsVersion::latest(), StringInput::from(&*fm), None)
        .map(|token| offset(token.span.lo)..offset(token.span.hi))
        .collect();
    ranges.sort_by_key(|range| range.start);
    ranges.dedup_by_key(|range| range.start);
    ranges
}

// -----------------------------------------------------------------------------
// Recovery
// -----------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq)]
enum Recovery {
    /// Blank `import <bindings> =` and keep the `require(..)` call at `call`.
    BindingClause { blank: Range<usize>, call: usize },
    /// Blank a whole line.
    Line(Range<usize>),
}

fn recovery_for(text: &str, offset: usize) -> Option<Recovery> {
    binding_clause_at(text, offset).or_else(|| non_blank_line_at(text, offset).map(Recovery::Line))
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

// import { A, B } = require('x');
fn binding_clause_at(text: &str, offset: usize) -> Option<Recovery> {
    let import_at = text.get(..offset)?.rfind("import")?;
    let bytes = text.as_bytes();
    if import_at > 0 && is_ident_byte(bytes[import_at - 1]) {
        return None;
    }

    let clause_start = import_at + "import".len();
    if !matches!(bytes.get(clause_start), Some(b) if b.is_ascii_whitespace() || *b == b'{' || *b == b'*') {
        return None;
    }

    let eq = clause_start + text[clause_start..].find('=')?;
    if matches!(bytes.get(eq + 1), Some(b'=' | b'>')) {
        return None;
    }
    let clause = &text[clause_start..eq];
    if clause.trim().is_empty() || clause.contains([';', '\'', '"', '`', '(', ')']) {
        return None;
    }

    let rest = &text[eq + 1..];
    let call = eq + 1 + (rest.len() - rest.trim_start().len());
    if offset > call {
        return None;
    }
    let after_callee = text[call..].strip_prefix("require")?;
    if !after_callee.trim_start().starts_with('(') {
        return None;
    }

    Some(Recovery::BindingClause {
        blank: import_at..eq + 1,
        call,
    })
}

// The line holding `offset`, or the closest non-blank line above it.
fn non_blank_line_at(text: &str, offset: usize) -> Option<Range<usize>> {
    let mut end = offset.min(text.len());
    loop {
        let start = text.get(..end)?.rfind('\n').map_or(0, |i| i + 1);
        let line_end = text[start..].find('\n').map_or(text.len(), |i| start + i);
        if !text[start..line_end].trim().is_empty() {
            return Some(start..line_end);
        }
        if start == 0 {
            return None;
        }
        end = start - 1;
    }
}

// Replaces every byte in `range` with a space, keeping line breaks so that
// all offsets stay valid.
fn blank_out(text: &mut String, range: Range<usize>) {
    let blank: String = text[range.clone()]
        .bytes()
        .map(|b| if b == b'\n' || b == b'\r' { b as char } else { ' ' })
        .collect();
    text.replace_range(range, &blank);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_dialect_from_file_name() {
        let Syntax::Typescript(ts) = syntax_for("component.tsx") else { panic!("expected typescript") };
        assert!(ts.tsx && !ts.dts);
        let Syntax::Typescript(ts) = syntax_for("lib/index.d.ts") else { panic!("expected typescript") };
        assert!(ts.dts && !ts.tsx);
        let Syntax::Typescript(ts) = syntax_for("index") else { panic!("expected typescript") };
        assert!(!ts.dts && !ts.tsx && ts.decorators);
    }

    #[test]
    fn parses_clean_module() {
        let parsed = parse("import 'a';\nrequire('b');\n", "index.ts").unwrap();
        assert_eq!(parsed.module.body.len(), 2);
        assert_eq!(parsed.range_of(parsed.module.body[0].span()), 0..11);
    }

    #[test]
    fn unwraps_destructuring_require() {
        let source = "import { A } = require('x');\n";
        let parsed = parse(source, "index.ts").unwrap();
        assert_eq!(parsed.module.body.len(), 1);
        assert!(parsed.is_destructured_require(15));
        assert_eq!(&source[15..22], "require");
    }

    #[test]
    fn skips_broken_lines() {
        let parsed = parse("import 'a';\n);\nimport 'b';\n", "index.ts").unwrap();
        assert_eq!(parsed.module.body.len(), 2);
        assert_eq!(parsed.range_of(parsed.module.body[1].span()).start, 15);
    }

    #[test]
    fn keeps_source_tokens_only_after_blanking() {
        let clean = parse("import 'a';\n", "index.ts").unwrap();
        assert!(clean.source_tokens.is_none());
        assert!(clean.is_source_token(&(0..1)));

        let source = "let a = ); /*\nimport 'x';\n*/\nimport 'y';\n";
        let parsed = parse(source, "index.ts").unwrap();
        let inner = source.find("'x'").unwrap();
        let outer = source.find("'y'").unwrap();
        assert!(!parsed.is_source_token(&(inner..inner + 3)));
        assert!(parsed.is_source_token(&(outer..outer + 3)));
        assert!(!parsed.is_source_token(&(outer..outer + 2)));
    }

    #[test]
    fn gives_up_eventually() {
        let source = ")\n".repeat(MAX_RECOVERY_ATTEMPTS + 10);
        assert!(parse(&source, "index.ts").is_none());
    }

    #[test]
    fn binding_clause_detection() {
        let text = "import {\n  A,\n  B,\n} = require(\"x\");";
        let eq = text.find('=').unwrap();
        assert_eq!(
            binding_clause_at(text, eq),
            Some(Recovery::BindingClause { blank: 0..eq + 1, call: eq + 2 })
        );
        assert_eq!(binding_clause_at("import x from 'y';\nlet = 1;", 23), None);
        assert_eq!(binding_clause_at("reimport { a } = require('x')", 15), None);
        assert_eq!(binding_clause_at("import { a } = load('x')", 13), None);
    }

    #[test]
    fn walks_up_from_blank_lines() {
        let text = "a\nbroken\n\n   \n";
        assert_eq!(non_blank_line_at(text, text.len()), Some(2..8));
        assert_eq!(non_blank_line_at("\n  \n", 3), None);
    }

    #[test]
    fn blanking_preserves_offsets() {
        let mut text = String::from("x = 'é';\r\ny");
        let len = text.len();
        let end = text.len() - 1;
        blank_out(&mut text, 0..end);
        assert_eq!(text.len(), len);
        assert_eq!(text, format!("{}\r\ny", " ".repeat(len - 3)));
    }
}
