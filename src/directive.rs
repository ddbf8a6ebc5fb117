//! Directive scanner and script expansion
//!
//! Source scripts pull in helper and library code through in-source
//! directive lines:
//!
//! ```text
//! #@ embed helpers.py
//! #@ include license_header.py
//! ```
//!
//! `embed` appends the referenced file to the script bundle as its own
//! unit; `include` splices the referenced file's fully expanded text into
//! the requesting script at the directive site. Both expand recursively,
//! depth-first, so a unit's text never contains an unexpanded directive.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::bundle::{ScriptBundle, ScriptUnit};
use crate::error::{OdpackError, OdpackResult};

/// Fixed marker identifying a directive line
pub const DIRECTIVE_MARKER: &str = "#@";

/// Logical name of the import-support helper scheduled by `embed`
pub const IMPORT_HELPER_NAME: &str = "pkgimport.py";

/// Import-support helper shipped with the binary
const IMPORT_HELPER_SOURCE: &str = include_str!("pkgimport.py");

/// Closed set of directive variants, keyed by trigger token.
///
/// Adding a directive means adding one variant here plus one arm in
/// [`Directive::from_token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// Add the referenced file to the bundle as a separate unit
    Embed,
    /// Inline the referenced file's expanded text at the directive site
    Include,
}

impl Directive {
    /// Resolve a trigger token to its variant
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "embed" => Some(Directive::Embed),
            "include" => Some(Directive::Include),
            _ => None,
        }
    }
}

/// Expands directives across a script tree into a [`ScriptBundle`].
///
/// Created fresh per build. The scripts root is the only context the
/// processor needs; there is no ambient state.
pub struct DirectiveProcessor {
    scripts_root: PathBuf,
    bundle: ScriptBundle,
    // Stack of files currently expanding; re-entry means a cycle.
    expanding: Vec<PathBuf>,
    // Fully expanded files, served from cache on later references.
    cache: HashMap<PathBuf, String>,
}

impl DirectiveProcessor {
    pub fn new(scripts_root: impl Into<PathBuf>) -> Self {
        Self {
            scripts_root: scripts_root.into(),
            bundle: ScriptBundle::new(),
            expanding: Vec::new(),
            cache: HashMap::new(),
        }
    }

    /// Expand every top-level `.py` file under the scripts root.
    ///
    /// Roots are embedded in lexicographic file-name order, so the
    /// resulting bundle order is deterministic for a given tree. Scripts
    /// in subdirectories only enter the bundle when a directive names
    /// them.
    pub fn expand(mut self) -> OdpackResult<ScriptBundle> {
        let entries = fs::read_dir(&self.scripts_root).map_err(|_| {
            OdpackError::DirectoryNotFound {
                path: self.scripts_root.clone(),
            }
        })?;

        let mut roots = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("py") {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    roots.push(name.to_string());
                }
            }
        }
        roots.sort();

        let root_dir = self.scripts_root.clone();
        for name in &roots {
            self.embed(name, &root_dir)?;
        }
        Ok(self.bundle)
    }

    /// Embed one script by logical name.
    ///
    /// Schedules the import helper exactly once, then expands and appends
    /// the named file unless it is already in the bundle. Re-embedding a
    /// known name is a no-op.
    fn embed(&mut self, name: &str, requested_from: &Path) -> OdpackResult<()> {
        if !self.bundle.contains(IMPORT_HELPER_NAME) {
            self.bundle.insert(ScriptUnit::new(
                IMPORT_HELPER_NAME,
                IMPORT_HELPER_SOURCE,
                PathBuf::from("<built-in>"),
            ));
        }

        if self.bundle.contains(name) {
            return Ok(());
        }

        let path = self.scripts_root.join(name);
        let source = self.expand_file(&path, requested_from)?;
        self.bundle.insert(ScriptUnit::new(name, source, path));
        Ok(())
    }

    /// Fully expand one file, depth-first, with cycle detection.
    fn expand_file(&mut self, path: &Path, requested_from: &Path) -> OdpackResult<String> {
        if let Some(done) = self.cache.get(path) {
            return Ok(done.clone());
        }
        if self.expanding.iter().any(|p| p == path) {
            let mut cycle = self.expanding.clone();
            cycle.push(path.to_path_buf());
            return Err(OdpackError::CyclicDirective { cycle });
        }

        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(OdpackError::MissingDependency {
                    path: path.to_path_buf(),
                    file: requested_from.to_path_buf(),
                })
            }
            Err(e) => return Err(e.into()),
        };

        self.expanding.push(path.to_path_buf());
        let expanded = self.expand_text(&raw, path);
        self.expanding.pop();
        let expanded = expanded?;

        self.cache.insert(path.to_path_buf(), expanded.clone());
        Ok(expanded)
    }

    fn expand_text(&mut self, raw: &str, file: &Path) -> OdpackResult<String> {
        let mut out = String::with_capacity(raw.len());
        for (idx, line) in raw.lines().enumerate() {
            if let Some(rest) = line.trim_start().strip_prefix(DIRECTIVE_MARKER) {
                self.process_directive(rest, file, idx + 1, &mut out)?;
            } else {
                out.push_str(line);
                out.push('\n');
            }
        }
        Ok(out)
    }

    /// Dispatch one directive line. `rest` is the line after the marker.
    fn process_directive(
        &mut self,
        rest: &str,
        file: &Path,
        line: usize,
        out: &mut String,
    ) -> OdpackResult<()> {
        let mut tokens = rest.split_whitespace();
        let token = tokens.next().unwrap_or("");
        let directive =
            Directive::from_token(token).ok_or_else(|| OdpackError::UnknownDirective {
                token: token.to_string(),
                file: file.to_path_buf(),
                line,
            })?;
        let name = tokens.next().ok_or_else(|| OdpackError::DirectiveSyntax {
            token: token.to_string(),
            file: file.to_path_buf(),
            line,
        })?;

        match directive {
            Directive::Embed => self.embed(name, file)?,
            Directive::Include => {
                let path = self.scripts_root.join(name);
                let text = self.expand_file(&path, file)?;
                out.push_str(&text);
            }
        }
        Ok(())
    }
}
