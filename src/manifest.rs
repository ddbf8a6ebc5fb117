//! Document manifest rewrite
//!
//! `META-INF/manifest.xml` is the package's registry of its parts. The
//! hosting runtime only resolves an embedded script once the manifest
//! declares its full path, so the final pipeline step patches the
//! template's manifest to register every injected script.
//!
//! The rewrite preserves every pre-existing node and its order, and
//! appends the new registrations sorted by logical script name, so the
//! same injected set always produces byte-identical manifest output.

use std::collections::HashSet;
use std::fmt::Display;

use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::archive::{AfterCallback, ArchiveStaging};
use crate::bundle::ScriptBundle;
use crate::error::{OdpackError, OdpackResult};

/// Zip-internal path of the package manifest
pub const MANIFEST_ENTRY: &str = "META-INF/manifest.xml";

const MANIFEST_ROOT: &[u8] = b"manifest:manifest";
const FILE_ENTRY: &[u8] = b"manifest:file-entry";
const FULL_PATH_ATTR: &[u8] = b"manifest:full-path";

/// Media type used for script directory registrations
const DIR_MEDIA_TYPE: &str = "application/binary";

/// After callback that patches the staged manifest entry to register
/// the injected scripts.
pub struct RewriteManifest {
    // Logical names sorted for stable registration order
    script_names: Vec<String>,
    prefix: String,
    media_type: String,
}

impl RewriteManifest {
    pub fn new(
        bundle: &ScriptBundle,
        prefix: impl Into<String>,
        media_type: impl Into<String>,
    ) -> Self {
        let mut script_names: Vec<String> = bundle.names().map(str::to_string).collect();
        script_names.sort();
        Self {
            script_names,
            prefix: prefix.into(),
            media_type: media_type.into(),
        }
    }

    /// Produce the patched manifest bytes from the template's manifest.
    pub fn patched(&self, original: &[u8]) -> OdpackResult<Vec<u8>> {
        let mut reader = Reader::from_reader(original);
        let mut writer = Writer::new(Vec::new());
        let mut registered: HashSet<String> = HashSet::new();
        let mut saw_root = false;
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf).map_err(parse_err)? {
                Event::Eof => break,
                Event::End(end) if end.name().as_ref() == MANIFEST_ROOT => {
                    saw_root = true;
                    self.inject(&mut writer, &registered)?;
                    writer.write_event(Event::End(end)).map_err(parse_err)?;
                }
                event @ (Event::Start(_) | Event::Empty(_)) => {
                    if let Event::Start(ref e) | Event::Empty(ref e) = event {
                        if e.name().as_ref() == FILE_ENTRY {
                            if let Some(path) = full_path(e)? {
                                registered.insert(path);
                            }
                        }
                    }
                    writer.write_event(event).map_err(parse_err)?;
                }
                event => writer.write_event(event).map_err(parse_err)?,
            }
            buf.clear();
        }

        if !saw_root {
            return Err(OdpackError::ManifestParse {
                message: "missing manifest:manifest root element".to_string(),
            });
        }
        Ok(writer.into_inner())
    }

    /// Write the new registrations just before the closing root tag.
    fn inject(
        &self,
        writer: &mut Writer<Vec<u8>>,
        registered: &HashSet<String>,
    ) -> OdpackResult<()> {
        let mut additions: Vec<(String, &str)> = Vec::new();

        for dir in prefix_dirs(&self.prefix) {
            if !registered.contains(&dir) {
                additions.push((dir, DIR_MEDIA_TYPE));
            }
        }
        for name in &self.script_names {
            let full_path = format!("{}{}", self.prefix, name);
            if registered.contains(&full_path) {
                return Err(OdpackError::DuplicateManifestEntry { path: full_path });
            }
            additions.push((full_path, &self.media_type));
        }

        for (full_path, media_type) in additions {
            let mut entry = BytesStart::new("manifest:file-entry");
            entry.push_attribute(("manifest:full-path", full_path.as_str()));
            entry.push_attribute(("manifest:media-type", media_type));
            writer
                .write_event(Event::Text(BytesText::new(" ")))
                .map_err(parse_err)?;
            writer.write_event(Event::Empty(entry)).map_err(parse_err)?;
            writer
                .write_event(Event::Text(BytesText::new("\n")))
                .map_err(parse_err)?;
        }
        Ok(())
    }
}

impl AfterCallback for RewriteManifest {
    fn run(&mut self, staging: &mut ArchiveStaging) -> OdpackResult<()> {
        let original = match staging.get(MANIFEST_ENTRY) {
            Some(entry) => entry.content.clone(),
            None => {
                return Err(OdpackError::ManifestParse {
                    message: format!("template has no {MANIFEST_ENTRY} entry"),
                })
            }
        };
        let next = self.patched(&original)?;
        staging.replace(MANIFEST_ENTRY, next);
        Ok(())
    }
}

/// Directory registrations implied by a script prefix:
/// `Scripts/python/` yields `Scripts/` and `Scripts/python/`.
fn prefix_dirs(prefix: &str) -> Vec<String> {
    let mut dirs = Vec::new();
    let mut acc = String::new();
    for part in prefix.split('/').filter(|p| !p.is_empty()) {
        acc.push_str(part);
        acc.push('/');
        dirs.push(acc.clone());
    }
    dirs
}

fn full_path(entry: &BytesStart) -> OdpackResult<Option<String>> {
    for attr in entry.attributes() {
        let attr = attr.map_err(parse_err)?;
        if attr.key.as_ref() == FULL_PATH_ATTR {
            let value = attr.unescape_value().map_err(parse_err)?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn parse_err(error: impl Display) -> OdpackError {
    OdpackError::ManifestParse {
        message: error.to_string(),
    }
}
