//! Module specifier resolution.
//!
//! Turns a specifier plus its referencing directory into a canonical
//! root-relative [`ModuleKey`]. Resolution happens in two steps:
//!
//! 1. [`resolve`] does pure path math: bare identifiers become shallow
//!    `./node_modules/<name>` package keys, everything else is normalized
//!    against the referencing directory and re-expressed relative to the
//!    project root.
//! 2. [`complete`] applies extension and `index` inference exactly once,
//!    probing the filesystem so that every completed key names an existing
//!    file. Completed keys are the only keys that enter the module graph or
//!    the rewritten code.

use std::path::Path;

use path_clean::PathClean;

use crate::graph::ModuleKey;
use crate::{Error, Result};

/// True when a specifier names a package rather than a file: it starts the
/// way an identifier does (`lodash`, `$lib`, `_internal`).
fn is_bare(specifier: &str) -> bool {
    specifier
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '$' || c == '_')
}

/// Resolve `specifier` as referenced from `referencing_dir` (itself
/// root-relative, e.g. `./src`) into a root-relative module key.
///
/// Package references resolve shallowly to `./node_modules/<specifier>` with
/// no existence check; [`complete`] performs the probe later. Relative and
/// absolute file references are cleaned and must stay inside `root`.
pub fn resolve(referencing_dir: &str, specifier: &str, root: &Path) -> Result<ModuleKey> {
    if is_bare(specifier) {
        return Ok(ModuleKey::new(format!("./node_modules/{specifier}")));
    }

    let specifier_path = Path::new(specifier);
    let absolute = if specifier_path.is_absolute() {
        specifier_path.clean()
    } else {
        let dir = referencing_dir.strip_prefix("./").unwrap_or(referencing_dir);
        let dir = if dir == "." { Path::new("") } else { Path::new(dir) };
        root.join(dir).join(specifier_path).clean()
    };

    let relative = absolute.strip_prefix(root).map_err(|_| Error::Resolution {
        specifier: specifier.to_string(),
        from: referencing_dir.to_string(),
        reason: format!("path escapes the project root '{}'", root.display()),
    })?;

    if relative.as_os_str().is_empty() {
        return Err(Error::Resolution {
            specifier: specifier.to_string(),
            from: referencing_dir.to_string(),
            reason: "specifier names the project root, not a file".to_string(),
        });
    }

    Ok(ModuleKey::new(format!("./{}", slashed(relative))))
}

/// Apply extension and `index` inference to a resolved key.
///
/// Probes, in order: the key as written, `<key>.js`, `<key>/index.js`. The
/// first that exists on disk wins; none existing is a resolution error. The
/// returned key is final and never re-derived.
pub fn complete(root: &Path, key: ModuleKey) -> Result<ModuleKey> {
    let path = key.to_path(root);
    if path.is_file() {
        return Ok(key);
    }

    let with_ext = path.with_file_name(format!(
        "{}.js",
        path.file_name().and_then(|n| n.to_str()).unwrap_or_default()
    ));
    if with_ext.is_file() {
        return Ok(ModuleKey::new(format!("{key}.js")));
    }

    let as_index = path.join("index.js");
    if as_index.is_file() {
        return Ok(ModuleKey::new(format!("{key}/index.js")));
    }

    Err(Error::Resolution {
        specifier: key.to_string(),
        from: root.display().to_string(),
        reason: "no file at this path, nor with a '.js' extension, nor an 'index.js' inside it"
            .to_string(),
    })
}

/// Resolve and complete the entry path of a build. The entry is referenced
/// from the project root itself.
pub fn resolve_entry(root: &Path, entry: &Path) -> Result<ModuleKey> {
    let specifier = entry.to_str().ok_or_else(|| Error::Resolution {
        specifier: entry.display().to_string(),
        from: ".".to_string(),
        reason: "entry path is not valid UTF-8".to_string(),
    })?;
    // the entry always names a file, never a package
    let specifier = if specifier.starts_with("./")
        || specifier.starts_with("../")
        || specifier.starts_with('/')
    {
        specifier.to_string()
    } else {
        format!("./{specifier}")
    };
    let key = resolve(".", &specifier, root)?;
    complete(root, key)
}

fn slashed(path: &Path) -> String {
    let mut out = String::new();
    for component in path.components() {
        if !out.is_empty() {
            out.push('/');
        }
        out.push_str(&component.as_os_str().to_string_lossy());
    }
    out
}
