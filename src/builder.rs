//! Build orchestration
//!
//! Wires the pieces into one pass: directive expansion, asset loading,
//! callback registration, archive rewrite. The callback registration
//! order here is part of the output contract: stale scripts are vetoed
//! per item, then scripts, assets and the manifest rewrite run in that
//! order in the after phase.

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::archive::ArchivePipeline;
use crate::assets::{collect_assets, load_assets};
use crate::bundle::ScriptBundle;
use crate::callbacks::{AddAssets, AddScripts, DropPrefix};
use crate::config::Config;
use crate::directive::DirectiveProcessor;
use crate::error::OdpackResult;
use crate::manifest::RewriteManifest;

/// Resolved inputs for one build invocation
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub scripts_dir: PathBuf,
    pub template: PathBuf,
    pub output: PathBuf,
    pub assets_dir: Option<PathBuf>,
    pub script_prefix: String,
    pub script_media_type: String,
    pub assets_dest: String,
}

impl BuildOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            scripts_dir: config.scripts.dir.clone(),
            template: config.package.template.clone(),
            output: config.package.output.clone(),
            assets_dir: config.assets.dir.clone(),
            script_prefix: config.package.script_prefix.clone(),
            script_media_type: config.package.script_media_type.clone(),
            assets_dest: config.assets.dest.clone(),
        }
    }
}

/// Outcome of a successful build
#[derive(Debug, Clone)]
pub struct BuildResult {
    /// Logical names packed, in bundle order
    pub scripts: Vec<String>,
    /// Asset destination paths packed
    pub assets: Vec<String>,
    /// Output archive entry names, in archive order
    pub entries: Vec<String>,
    /// Content hash of the output document
    pub output_hash: String,
}

/// One-shot document build
pub struct DocumentBuilder {
    options: BuildOptions,
}

impl DocumentBuilder {
    pub fn new(options: BuildOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Expand directives without touching the template.
    pub fn expand(&self) -> OdpackResult<ScriptBundle> {
        DirectiveProcessor::new(&self.options.scripts_dir).expand()
    }

    /// Run the full pipeline and write the output document.
    pub fn build(&self) -> OdpackResult<BuildResult> {
        let bundle = self.expand()?;

        let assets = match &self.options.assets_dir {
            Some(dir) => {
                let found = collect_assets(dir)?;
                load_assets(&found, &self.options.assets_dest)?
            }
            None => Vec::new(),
        };

        let scripts: Vec<String> = bundle.names().map(str::to_string).collect();
        let asset_paths: Vec<String> = assets.iter().map(|a| a.path.clone()).collect();

        let pipeline = ArchivePipeline::new()
            .with_item(DropPrefix::new(&self.options.script_prefix))
            .with_after(AddScripts::new(bundle.clone(), &self.options.script_prefix))
            .with_after(AddAssets::new(assets))
            .with_after(RewriteManifest::new(
                &bundle,
                &self.options.script_prefix,
                &self.options.script_media_type,
            ));

        let entries = pipeline.run(&self.options.template, &self.options.output)?;
        let output_hash = hash_file(&self.options.output)?;

        Ok(BuildResult {
            scripts,
            assets: asset_paths,
            entries,
            output_hash,
        })
    }
}

/// Compute the SHA-256 content hash of a file
pub fn hash_file(path: &Path) -> OdpackResult<String> {
    let content = fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&content);
    Ok(format!("sha256:{:x}", hasher.finalize()))
}
