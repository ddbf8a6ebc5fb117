//! Standard pipeline callbacks
//!
//! The building blocks the document build wires into the archive
//! pipeline: a veto for stale script entries and the after callbacks
//! that inject the expanded bundle and the loaded assets.

use crate::archive::{AfterCallback, ArchiveEntry, ArchiveStaging, ItemCallback, ItemDecision};
use crate::assets::DestinationAsset;
use crate::bundle::ScriptBundle;
use crate::error::OdpackResult;

/// Fixed internal path prefix for injected scripts
pub const SCRIPT_PATH_PREFIX: &str = "Scripts/python/";

/// Vetoes template entries under a path prefix.
///
/// Used to discard stale `Scripts/python/` entries from a template that
/// was itself produced by an earlier pack run.
#[derive(Debug, Clone)]
pub struct DropPrefix {
    prefix: String,
}

impl DropPrefix {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Veto for the standard script prefix
    pub fn scripts() -> Self {
        Self::new(SCRIPT_PATH_PREFIX)
    }
}

impl ItemCallback for DropPrefix {
    fn decide(&mut self, entry: &ArchiveEntry) -> ItemDecision {
        if entry.filename.starts_with(&self.prefix) {
            ItemDecision::Drop
        } else {
            ItemDecision::Keep
        }
    }
}

/// Appends one entry per bundle unit under the script path prefix.
pub struct AddScripts {
    bundle: ScriptBundle,
    prefix: String,
}

impl AddScripts {
    pub fn new(bundle: ScriptBundle, prefix: impl Into<String>) -> Self {
        Self {
            bundle,
            prefix: prefix.into(),
        }
    }
}

impl AfterCallback for AddScripts {
    fn run(&mut self, staging: &mut ArchiveStaging) -> OdpackResult<()> {
        for unit in self.bundle.iter() {
            staging.append(ArchiveEntry::new(
                format!("{}{}", self.prefix, unit.name),
                unit.source.as_bytes().to_vec(),
            ))?;
        }
        Ok(())
    }
}

/// Appends loaded destination assets.
pub struct AddAssets {
    assets: Vec<DestinationAsset>,
}

impl AddAssets {
    pub fn new(assets: Vec<DestinationAsset>) -> Self {
        Self { assets }
    }
}

impl AfterCallback for AddAssets {
    fn run(&mut self, staging: &mut ArchiveStaging) -> OdpackResult<()> {
        for asset in self.assets.drain(..) {
            staging.append(ArchiveEntry::new(asset.path, asset.content))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::ScriptUnit;
    use crate::error::OdpackError;

    #[test]
    fn drop_prefix_decisions() {
        let mut cb = DropPrefix::scripts();
        let script = ArchiveEntry::new("Scripts/python/old.py", Vec::new());
        let content = ArchiveEntry::new("content.xml", Vec::new());

        assert_eq!(cb.decide(&script), ItemDecision::Drop);
        assert_eq!(cb.decide(&content), ItemDecision::Keep);
    }

    #[test]
    fn add_scripts_appends_in_bundle_order() {
        let mut bundle = ScriptBundle::new();
        bundle.insert(ScriptUnit::new("b.py", "B = 1\n", "scripts/b.py"));
        bundle.insert(ScriptUnit::new("a.py", "A = 1\n", "scripts/a.py"));

        let mut staging = ArchiveStaging::default();
        AddScripts::new(bundle, SCRIPT_PATH_PREFIX)
            .run(&mut staging)
            .unwrap();

        let names: Vec<&str> = staging.entries().map(|e| e.filename.as_str()).collect();
        assert_eq!(names, vec!["Scripts/python/b.py", "Scripts/python/a.py"]);
        assert_eq!(
            staging.get("Scripts/python/a.py").unwrap().content,
            b"A = 1\n"
        );
    }

    #[test]
    fn add_scripts_collision_with_staged_entry_fails() {
        let mut bundle = ScriptBundle::new();
        bundle.insert(ScriptUnit::new("a.py", "A = 1\n", "scripts/a.py"));

        let mut staging = ArchiveStaging::default();
        staging
            .append(ArchiveEntry::new("Scripts/python/a.py", Vec::new()))
            .unwrap();

        let err = AddScripts::new(bundle, SCRIPT_PATH_PREFIX)
            .run(&mut staging)
            .unwrap_err();
        assert!(matches!(err, OdpackError::DuplicateEntry { .. }));
    }

    #[test]
    fn add_assets_appends_entries() {
        let assets = vec![
            DestinationAsset {
                path: "assets/logo.png".to_string(),
                content: b"\x89PNG".to_vec(),
            },
            DestinationAsset {
                path: "assets/data.csv".to_string(),
                content: b"1,2\n".to_vec(),
            },
        ];

        let mut staging = ArchiveStaging::default();
        AddAssets::new(assets).run(&mut staging).unwrap();

        let names: Vec<&str> = staging.entries().map(|e| e.filename.as_str()).collect();
        assert_eq!(names, vec!["assets/logo.png", "assets/data.csv"]);
    }
}
