//! Bundle rendering and output writing.
//!
//! The emitter renders the module map and entry key into a bootstrap runtime:
//! an IIFE holding the module registry (key to factory), a caching `require`
//! with module singleton semantics, and the entry invocation. The module
//! object is installed in the instance cache before its factory runs, so a
//! circular require observes the partially initialized exports instead of
//! re-invoking the factory.
//!
//! Output is written atomically (temp file + rename) after validating that
//! the file name cannot escape the output directory.

use std::fs;
use std::path::{Path, PathBuf};

use minijinja::{AutoEscape, Environment, context};
use path_clean::PathClean;
use serde::Serialize;

use crate::graph::{ModuleGraph, ModuleKey};
use crate::rewrite::RUNTIME_REQUIRE;
use crate::{Error, Result};

const BOOTSTRAP_TEMPLATE: &str = r#"(function (modules) {
  var installed = {};
  function {{ require_ident }}(key) {
    var hit = installed[key];
    if (hit) {
      return hit.exports;
    }
    var module = installed[key] = { key: key, loaded: false, exports: {} };
    modules[key].call(module.exports, module, module.exports, {{ require_ident }});
    module.loaded = true;
    return module.exports;
  }
  return {{ require_ident }}({{ entry | tojson }});
})({
{%- for module in modules %}
  {{ module.key | tojson }}: function (module, exports, {{ require_ident }}) {
{{ module.code }}
  }{% if not loop.last %},{% endif %}
{%- endfor %}
});
"#;

#[derive(Serialize)]
struct BundleModule<'a> {
    key: &'a str,
    code: &'a str,
}

/// Render the bootstrap runtime for `graph` with `entry` as the module the
/// bundle executes.
pub fn render(entry: &ModuleKey, graph: &ModuleGraph) -> Result<String> {
    let mut env = Environment::new();
    // the template emits JavaScript source; minijinja's name-based escaping
    // would render every interpolation as a quoted JSON string
    env.set_auto_escape_callback(|_| AutoEscape::None);
    env.add_template("bundle.js", BOOTSTRAP_TEMPLATE)?;
    let template = env.get_template("bundle.js")?;

    let modules: Vec<BundleModule<'_>> = graph
        .records()
        .map(|record| BundleModule {
            key: record.key.as_str(),
            code: &record.code,
        })
        .collect();

    let code = template.render(context! {
        require_ident => RUNTIME_REQUIRE,
        entry => entry.as_str(),
        modules => modules,
    })?;
    Ok(code)
}

/// Write the rendered bundle to `<output_dir>/<file_name>`.
///
/// The write goes to a temp file first and is renamed into place, so a
/// previously emitted bundle is never left half-overwritten. Failures are
/// reported, not retried.
pub fn write_bundle(output_dir: &Path, file_name: &str, code: &str) -> Result<PathBuf> {
    let target = validate_output_path(output_dir, file_name)?;

    fs::create_dir_all(output_dir).map_err(|e| {
        Error::WriteFailure(format!(
            "failed to create output directory '{}': {}",
            output_dir.display(),
            e
        ))
    })?;

    let temp = target.with_extension("tmp");
    fs::write(&temp, code).map_err(|e| {
        Error::WriteFailure(format!(
            "failed to write temporary file '{}': {}",
            temp.display(),
            e
        ))
    })?;
    fs::rename(&temp, &target).map_err(|e| {
        let _ = fs::remove_file(&temp);
        Error::WriteFailure(format!(
            "failed to rename '{}' to '{}': {}",
            temp.display(),
            target.display(),
            e
        ))
    })?;

    Ok(target)
}

/// Reject file names that would land outside the output directory.
fn validate_output_path(output_dir: &Path, file_name: &str) -> Result<PathBuf> {
    if file_name.contains('\0') {
        return Err(Error::InvalidOutputPath(
            "file name contains a null byte".to_string(),
        ));
    }

    let base = output_dir.clean();
    let target = base.join(Path::new(file_name).clean()).clean();
    if !target.starts_with(&base) {
        return Err(Error::InvalidOutputPath(format!(
            "'{}' escapes output directory '{}'",
            file_name,
            base.display()
        )));
    }
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ModuleRecord;

    fn record(key: &str, code: &str, deps: &[&str]) -> ModuleRecord {
        ModuleRecord {
            key: ModuleKey::new(key),
            code: code.to_string(),
            dependencies: deps.iter().map(|d| ModuleKey::new(*d)).collect(),
            content_hash: "00".to_string(),
        }
    }

    fn two_module_graph() -> (ModuleKey, ModuleGraph) {
        let mut graph = ModuleGraph::default();
        graph.insert(record(
            "./src/main.js",
            r#"const a = __bindle_require__("./src/a.js");"#,
            &["./src/a.js"],
        ));
        graph.insert(record("./src/a.js", "module.exports = 1;", &[]));
        (ModuleKey::new("./src/main.js"), graph)
    }

    #[test]
    fn bundle_contains_registry_and_entry_invocation() {
        let (entry, graph) = two_module_graph();
        let code = render(&entry, &graph).unwrap();

        assert!(code.contains(r#""./src/main.js": function (module, exports, __bindle_require__)"#));
        assert!(code.contains(r#""./src/a.js": function (module, exports, __bindle_require__)"#));
        assert!(code.contains(r#"return __bindle_require__("./src/main.js");"#));
        assert!(code.contains("module.exports = 1;"));
    }

    #[test]
    fn interpolations_render_as_raw_source() {
        let (entry, graph) = two_module_graph();
        let code = render(&entry, &graph).unwrap();

        // identifiers and module code must come through unquoted; only keys
        // pass through tojson
        assert!(code.contains("function __bindle_require__(key)"));
        assert!(!code.contains(r#"function "__bindle_require__""#));
        assert!(code.contains("\nmodule.exports = 1;\n"));
        assert!(!code.contains(r#""module.exports = 1;""#));
    }

    #[test]
    fn runtime_installs_module_before_running_its_factory() {
        let (entry, graph) = two_module_graph();
        let code = render(&entry, &graph).unwrap();

        // circular-require safety: the cache entry must exist before the
        // factory is invoked
        let install = code.find("var module = installed[key]").unwrap();
        let invoke = code.find("modules[key].call").unwrap();
        assert!(install < invoke);
    }

    #[test]
    fn bundle_is_written_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("dist");
        let path = write_bundle(&out, "bundle.js", "// bundle").unwrap();

        assert_eq!(path, out.join("bundle.js"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "// bundle");
        assert!(!out.join("bundle.tmp").exists());
    }

    #[test]
    fn traversal_file_name_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = write_bundle(dir.path(), "../escape.js", "").unwrap_err();
        assert!(matches!(err, Error::InvalidOutputPath(_)));
    }
}
