//! Stock loaders.
//!
//! These are ordinary [`Loader`](crate::Loader) implementations shipped for
//! convenience; the engine does not treat them specially. Both are
//! regex-based passes, not lexers: they are meant for straightforward
//! sources and will happily mangle comment-like text inside string literals.

use regex::Regex;
use rustc_hash::FxHashSet;

use crate::transform::Loader;
use crate::{Error, Result};

/// Strips `//` line comments and `/* */` block comments.
pub struct StripComments;

impl Loader for StripComments {
    fn name(&self) -> &str {
        "strip-comments"
    }

    fn transform(&self, source: String) -> Result<String> {
        let block = Regex::new(r"(?s)/\*.*?\*/").expect("static pattern");
        let line = Regex::new(r"//[^\n\r]*").expect("static pattern");
        let source = block.replace_all(&source, "");
        Ok(line.replace_all(&source, "").into_owned())
    }
}

/// Rewrites default-import / default-export ESM syntax to CommonJS:
/// `import x from 's'` becomes `const x = require('s')` and
/// `export default` becomes `module.exports =`.
///
/// Introducing the same binding name twice cannot be rewritten safely and is
/// reported as a duplicate-binding error.
pub struct EsmToCjs;

impl Loader for EsmToCjs {
    fn name(&self) -> &str {
        "esm-to-cjs"
    }

    fn transform(&self, source: String) -> Result<String> {
        let import =
            Regex::new(r#"import\s+([A-Za-z$_][A-Za-z0-9$_]*)\s+from\s+['"]([^'"]+)['"]"#)
                .expect("static pattern");

        let mut bindings = FxHashSet::default();
        for capture in import.captures_iter(&source) {
            let name = &capture[1];
            if !bindings.insert(name.to_string()) {
                return Err(Error::DuplicateBinding {
                    name: name.to_string(),
                });
            }
        }

        let source = import.replace_all(&source, "const $1 = require('$2')");
        let export = Regex::new(r"export\s+default").expect("static pattern");
        Ok(export.replace_all(&source, "module.exports =").into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_line_and_block_comments() {
        let source = "// header\nconst a = 1; /* inline */ const b = 2;\n".to_string();
        let out = StripComments.transform(source).unwrap();
        assert!(!out.contains("header"));
        assert!(!out.contains("inline"));
        assert!(out.contains("const a = 1;"));
        assert!(out.contains("const b = 2;"));
    }

    #[test]
    fn rewrites_default_imports_and_exports() {
        let source = "import app from './app'\nexport default app;\n".to_string();
        let out = EsmToCjs.transform(source).unwrap();
        assert!(out.contains("const app = require('./app')"));
        assert!(out.contains("module.exports = app;"));
    }

    #[test]
    fn double_quoted_specifiers_are_accepted() {
        let source = r#"import util from "./util""#.to_string();
        let out = EsmToCjs.transform(source).unwrap();
        assert!(out.contains("const util = require('./util')"));
    }

    #[test]
    fn duplicate_import_binding_is_rejected() {
        let source = "import a from './x'\nimport a from './y'\n".to_string();
        let err = EsmToCjs.transform(source).unwrap_err();
        match err {
            Error::DuplicateBinding { name } => assert_eq!(name, "a"),
            other => panic!("expected duplicate binding, got {other:?}"),
        }
    }
}
