//! Asset collection and transform
//!
//! Assets are opaque files (images, data tables) shipped alongside the
//! scripts. Each source asset maps to exactly one destination entry:
//! its path relative to the assets root, re-rooted under the configured
//! destination prefix. The transform is pure; loading is parallelized
//! across assets since no two transforms share state.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::error::{OdpackError, OdpackResult};

/// A file inside the assets directory, not yet loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceAsset {
    pub path: PathBuf,
    pub assets_dir: PathBuf,
}

/// An asset ready for injection: archive path plus raw bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct DestinationAsset {
    /// Zip-internal path, forward-slash separated
    pub path: String,
    pub content: Vec<u8>,
}

impl SourceAsset {
    pub fn new(path: impl Into<PathBuf>, assets_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            assets_dir: assets_dir.into(),
        }
    }

    /// Map this asset to its destination entry.
    ///
    /// The destination path is the asset's path relative to the assets
    /// root, re-rooted under `destination_root`. Reads the full file
    /// content into memory.
    pub fn to_dest(&self, destination_root: &str) -> OdpackResult<DestinationAsset> {
        let rel = self
            .path
            .strip_prefix(&self.assets_dir)
            .map_err(|_| OdpackError::AssetOutsideRoot {
                path: self.path.clone(),
                root: self.assets_dir.clone(),
            })?;

        let mut dest = String::from(destination_root.trim_end_matches('/'));
        for part in rel.components() {
            if !dest.is_empty() {
                dest.push('/');
            }
            dest.push_str(&part.as_os_str().to_string_lossy());
        }

        let content = fs::read(&self.path)?;
        Ok(DestinationAsset {
            path: dest,
            content,
        })
    }
}

/// Collect every file under `assets_dir`, sorted by path for
/// deterministic output order.
pub fn collect_assets(assets_dir: &Path) -> OdpackResult<Vec<SourceAsset>> {
    if !assets_dir.is_dir() {
        return Err(OdpackError::DirectoryNotFound {
            path: assets_dir.to_path_buf(),
        });
    }

    let mut found = Vec::new();
    for result in ignore::WalkBuilder::new(assets_dir).build() {
        let entry = result.map_err(|e| OdpackError::Io(io::Error::other(e)))?;
        if entry.file_type().is_some_and(|t| t.is_file()) {
            found.push(SourceAsset::new(entry.into_path(), assets_dir));
        }
    }
    found.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(found)
}

/// Load and transform assets in parallel.
///
/// Each transform touches only its own input file, so the work is
/// distributed across assets without shared state. Result order matches
/// the input order.
pub fn load_assets(
    assets: &[SourceAsset],
    destination_root: &str,
) -> OdpackResult<Vec<DestinationAsset>> {
    assets
        .par_iter()
        .map(|asset| asset.to_dest(destination_root))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn to_dest_reroots_relative_path() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("img/logo.png");
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(&file, b"\x89PNG").unwrap();

        let asset = SourceAsset::new(&file, dir.path());
        let dest = asset.to_dest("assets/").unwrap();

        assert_eq!(dest.path, "assets/img/logo.png");
        assert_eq!(dest.content, b"\x89PNG");
    }

    #[test]
    fn to_dest_with_empty_root_keeps_relative_path() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("data.csv");
        fs::write(&file, b"1,2\n").unwrap();

        let asset = SourceAsset::new(&file, dir.path());
        let dest = asset.to_dest("").unwrap();

        assert_eq!(dest.path, "data.csv");
    }

    #[test]
    fn to_dest_rejects_path_outside_root() {
        let asset = SourceAsset::new("/elsewhere/file.bin", "/assets");
        let err = asset.to_dest("assets/").unwrap_err();
        assert!(matches!(err, OdpackError::AssetOutsideRoot { .. }));
    }

    #[test]
    fn collect_assets_is_sorted_and_recursive() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("b.bin"), b"b").unwrap();
        fs::write(dir.path().join("a.bin"), b"a").unwrap();
        fs::write(dir.path().join("sub/c.bin"), b"c").unwrap();

        let found = collect_assets(dir.path()).unwrap();
        let names: Vec<String> = found
            .iter()
            .map(|a| {
                a.path
                    .strip_prefix(dir.path())
                    .unwrap()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect();
        assert_eq!(names, vec!["a.bin", "b.bin", "sub/c.bin"]);
    }

    #[test]
    fn collect_assets_missing_dir_fails() {
        let err = collect_assets(Path::new("/nonexistent/assets")).unwrap_err();
        assert!(matches!(err, OdpackError::DirectoryNotFound { .. }));
    }

    #[test]
    fn load_assets_preserves_input_order() {
        let dir = tempdir().unwrap();
        for name in ["x.bin", "y.bin", "z.bin"] {
            fs::write(dir.path().join(name), name.as_bytes()).unwrap();
        }

        let found = collect_assets(dir.path()).unwrap();
        let loaded = load_assets(&found, "assets").unwrap();

        let paths: Vec<&str> = loaded.iter().map(|a| a.path.as_str()).collect();
        assert_eq!(paths, vec!["assets/x.bin", "assets/y.bin", "assets/z.bin"]);
        assert_eq!(loaded[0].content, b"x.bin");
    }

    #[test]
    fn load_assets_missing_file_fails() {
        let dir = tempdir().unwrap();
        let assets = vec![SourceAsset::new(dir.path().join("gone.bin"), dir.path())];
        assert!(load_assets(&assets, "assets").is_err());
    }
}
