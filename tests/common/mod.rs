//! Common test utilities for odpack integration tests.
//!
//! Provides `TestEnv` - an isolated temp project with helpers to write
//! script trees, build template documents, run the odpack CLI, and read
//! entries back out of packed documents.

#![allow(dead_code)]

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

/// A minimal text-document manifest for template fixtures
pub const TEMPLATE_MANIFEST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<manifest:manifest xmlns:manifest="urn:oasis:names:tc:opendocument:xmlns:manifest:1.0" manifest:version="1.2">
 <manifest:file-entry manifest:full-path="/" manifest:media-type="application/vnd.oasis.opendocument.text"/>
 <manifest:file-entry manifest:full-path="content.xml" manifest:media-type="text/xml"/>
</manifest:manifest>
"#;

/// Result of running an odpack CLI command
#[derive(Debug)]
pub struct TestResult {
    pub success: bool,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl TestResult {
    /// Combine stdout and stderr
    pub fn combined_output(&self) -> String {
        format!("{}\n{}", self.stdout, self.stderr)
    }
}

/// Isolated test environment with a temp project directory.
pub struct TestEnv {
    pub project_root: TempDir,
    odpack_bin: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            project_root: TempDir::new().expect("Failed to create temp dir"),
            odpack_bin: PathBuf::from(env!("CARGO_BIN_EXE_odpack")),
        }
    }

    /// Get path relative to project root
    pub fn project_path(&self, relative: &str) -> PathBuf {
        self.project_root.path().join(relative)
    }

    /// Write a file under the project root
    pub fn write_file(&self, relative: &str, content: &str) {
        let path = self.project_path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create directories");
        }
        fs::write(&path, content).expect("Failed to write file");
    }

    /// Write a script file under `scripts/`
    pub fn write_script(&self, name: &str, content: &str) {
        self.write_file(&format!("scripts/{name}"), content);
    }

    /// Build a minimal template document at the given relative path.
    ///
    /// Entries: `mimetype` (stored), `content.xml`, `META-INF/manifest.xml`.
    pub fn write_template(&self, relative: &str) {
        let path = self.project_path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create directories");
        }

        let file = fs::File::create(&path).expect("Failed to create template");
        let mut zip = zip::ZipWriter::new(file);
        let stored = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);
        let deflated = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);

        zip.start_file("mimetype", stored).unwrap();
        zip.write_all(b"application/vnd.oasis.opendocument.text")
            .unwrap();
        zip.start_file("content.xml", deflated).unwrap();
        zip.write_all(b"<office:document-content/>").unwrap();
        zip.start_file("META-INF/manifest.xml", deflated).unwrap();
        zip.write_all(TEMPLATE_MANIFEST.as_bytes()).unwrap();
        zip.finish().unwrap();
    }

    /// Read entry names and contents from a packed document, in
    /// archive order.
    pub fn read_entries(&self, relative: &str) -> Vec<(String, Vec<u8>)> {
        let file = fs::File::open(self.project_path(relative)).expect("Failed to open document");
        let mut archive = zip::ZipArchive::new(file).expect("Failed to read document");

        let mut entries = Vec::new();
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i).unwrap();
            let mut content = Vec::new();
            entry.read_to_end(&mut content).unwrap();
            entries.push((entry.name().to_string(), content));
        }
        entries
    }

    /// Read one entry's content as UTF-8 text
    pub fn read_entry_text(&self, relative: &str, name: &str) -> String {
        let entries = self.read_entries(relative);
        let entry = entries
            .iter()
            .find(|(n, _)| n == name)
            .unwrap_or_else(|| panic!("entry '{name}' not found in {relative}"));
        String::from_utf8(entry.1.clone()).expect("entry is not UTF-8")
    }

    /// Run odpack in this environment from the project root
    pub fn run(&self, args: &[&str]) -> TestResult {
        self.run_from(self.project_root.path(), args)
    }

    /// Run odpack from a specific directory
    pub fn run_from(&self, cwd: &Path, args: &[&str]) -> TestResult {
        let output = Command::new(&self.odpack_bin)
            .current_dir(cwd)
            .args(args)
            .output()
            .expect("Failed to execute odpack");
        self.output_to_result(output)
    }

    fn output_to_result(&self, output: Output) -> TestResult {
        TestResult {
            success: output.status.success(),
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}
