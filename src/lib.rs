//! odpack - macro packager for OpenDocument files
//!
//! odpack flattens a plain tree of Python macro sources into a script
//! bundle by expanding in-source directives, then rewrites a template
//! document archive to carry the bundle: scripts are injected under
//! `Scripts/python/`, optional assets land alongside them, and the
//! package manifest is patched to register every new script so the
//! hosting runtime can resolve them by name.

pub mod archive;
pub mod assets;
pub mod builder;
pub mod bundle;
pub mod callbacks;
pub mod config;
pub mod directive;
pub mod error;
pub mod manifest;

// Re-exports for convenience
pub use archive::{
    read_archive, AfterCallback, ArchiveEntry, ArchivePipeline, ArchiveStaging, BeforeCallback,
    ItemCallback, ItemDecision, MIMETYPE_ENTRY,
};
pub use assets::{collect_assets, load_assets, DestinationAsset, SourceAsset};
pub use builder::{hash_file, BuildOptions, BuildResult, DocumentBuilder};
pub use bundle::{ScriptBundle, ScriptUnit};
pub use callbacks::{AddAssets, AddScripts, DropPrefix, SCRIPT_PATH_PREFIX};
pub use config::Config;
pub use directive::{Directive, DirectiveProcessor, DIRECTIVE_MARKER, IMPORT_HELPER_NAME};
pub use error::{OdpackError, OdpackResult};
pub use manifest::{RewriteManifest, MANIFEST_ENTRY};
