//! The fixed table that maps legacy `@aws-cdk/*` module paths onto `monocdk`.

// -----------------------------------------------------------------------------
// Rule table
// -----------------------------------------------------------------------------

/// Static, read-only rewrite rules. Shared by reference across every rewrite
/// call; nothing here is mutated after construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewriteRules {
    /// Legacy namespace prefix, trailing slash included.
    pub namespace: &'static str,
    /// Consolidated package that absorbs the namespace.
    pub consolidated: &'static str,
    /// Legacy path that maps onto the bare consolidated package.
    pub core: &'static str,
    /// `(legacy, replacement)` pairs matched exactly, ahead of the prefix rule.
    pub renames: &'static [(&'static str, &'static str)],
    /// Exact paths that are never rewritten even though they carry the prefix.
    pub exemptions: &'static [&'static str],
}

impl RewriteRules {
    pub const MONOCDK: RewriteRules = RewriteRules {
        namespace: "@aws-cdk/",
        consolidated: "monocdk",
        core: "@aws-cdk/core",
        renames: &[
            ("@aws-cdk/assert", "@monocdk-experiment/assert"),
            ("@aws-cdk/assert/jest", "@monocdk-experiment/assert/jest"),
        ],
        exemptions: &["@aws-cdk/cloudformation-diff"],
    };

    /// Returns the new module path for `module_path`, or `None` when it must be
    /// left alone. First matching rule wins.
    pub fn updated_location(&self, module_path: &str) -> Option<String> {
        let remainder = module_path.strip_prefix(self.namespace)?;
        if self.is_exempt(module_path) {
            return None;
        }

        if module_path == self.core {
            return Some(self.consolidated.to_string());
        }

        if let Some((_, renamed)) = self.renames.iter().find(|(legacy, _)| *legacy == module_path) {
            return Some((*renamed).to_string());
        }

        Some(format!("{}/{}", self.consolidated, remainder))
    }

    pub fn is_exempt(&self, module_path: &str) -> bool {
        self.exemptions.contains(&module_path)
    }
}
