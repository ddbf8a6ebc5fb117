//! odpack CLI - macro packager for OpenDocument files
//!
//! Usage: odpack <COMMAND>
//!
//! Commands:
//!   build    Expand scripts and pack them into a document
//!   expand   Expand directives and show the resulting bundle
//!   inspect  List the entries of a packed document

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use odpack::builder::{BuildOptions, DocumentBuilder};
use odpack::config::Config;

/// odpack - macro packager for OpenDocument files
#[derive(Parser, Debug)]
#[command(name = "odpack")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Output format for CI
    #[arg(long)]
    json: bool,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Expand scripts and pack them into a document
    Build {
        /// Path to the scripts directory
        #[arg(short, long)]
        scripts: Option<PathBuf>,

        /// Template document to rewrite
        #[arg(short, long)]
        template: Option<PathBuf>,

        /// Output document path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Directory of assets to inject
        #[arg(short, long)]
        assets: Option<PathBuf>,

        /// Overwrite an existing output document
        #[arg(short, long)]
        force: bool,

        /// Dry run - expand and report without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// Expand directives and show the resulting bundle (debugging)
    Expand {
        /// Path to the scripts directory
        #[arg(short, long)]
        scripts: Option<PathBuf>,
    },

    /// List the entries of a packed document
    Inspect {
        /// Document to inspect
        document: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            scripts,
            template,
            output,
            assets,
            force,
            dry_run,
        } => cmd_build(scripts, template, output, assets, force, dry_run, cli.json),
        Commands::Expand { scripts } => cmd_expand(scripts, cli.json),
        Commands::Inspect { document } => cmd_inspect(&document, cli.json),
    }
}

/// Resolve CLI flags over `odpack.toml` over defaults.
fn resolve_options(
    scripts: Option<PathBuf>,
    template: Option<PathBuf>,
    output: Option<PathBuf>,
    assets: Option<PathBuf>,
) -> Result<BuildOptions> {
    let config = Config::load_dir(std::path::Path::new("."))?;
    let mut options = BuildOptions::from_config(&config);
    if let Some(scripts) = scripts {
        options.scripts_dir = scripts;
    }
    if let Some(template) = template {
        options.template = template;
    }
    if let Some(output) = output {
        options.output = output;
    }
    if let Some(assets) = assets {
        options.assets_dir = Some(assets);
    }
    Ok(options)
}

fn cmd_build(
    scripts: Option<PathBuf>,
    template: Option<PathBuf>,
    output: Option<PathBuf>,
    assets: Option<PathBuf>,
    force: bool,
    dry_run: bool,
    json: bool,
) -> Result<()> {
    let options = resolve_options(scripts, template, output, assets)?;

    if !json {
        println!("📦 odpack Build");
        println!("Scripts: {}", options.scripts_dir.display());
        println!("Template: {}", options.template.display());
        println!("Output: {}", options.output.display());
        if let Some(assets) = &options.assets_dir {
            println!("Assets: {}", assets.display());
        }
        if dry_run {
            println!("Mode: Dry run");
        }
    }

    if !force && !dry_run && options.output.exists() {
        anyhow::bail!(
            "output {} already exists (use --force to overwrite)",
            options.output.display()
        );
    }

    let builder = DocumentBuilder::new(options);

    if dry_run {
        let bundle = builder.expand()?;
        if json {
            let output = serde_json::json!({
                "event": "build",
                "dry_run": true,
                "scripts": bundle.names().collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string(&output)?);
        } else {
            println!("\n✓ Expanded {} scripts (nothing written)", bundle.len());
            for name in bundle.names() {
                println!("  - {name}");
            }
        }
        return Ok(());
    }

    let result = builder.build()?;

    if json {
        let output = serde_json::json!({
            "event": "build",
            "status": "success",
            "scripts": result.scripts,
            "assets": result.assets,
            "entries": result.entries.len(),
            "hash": result.output_hash,
        });
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("\n✓ Packed {} scripts", result.scripts.len());
        for name in &result.scripts {
            println!("  - {name}");
        }
        if !result.assets.is_empty() {
            println!("✓ Packed {} assets", result.assets.len());
            for path in &result.assets {
                println!("  - {path}");
            }
        }
        println!(
            "✓ Wrote {} ({} entries)",
            builder.options().output.display(),
            result.entries.len()
        );
        println!("  {}", result.output_hash);
    }

    Ok(())
}

fn cmd_expand(scripts: Option<PathBuf>, json: bool) -> Result<()> {
    let options = resolve_options(scripts, None, None, None)?;

    if !json {
        println!("🔍 Expanding scripts: {}", options.scripts_dir.display());
    }

    let bundle = DocumentBuilder::new(options).expand()?;

    if json {
        for unit in bundle.iter() {
            let output = serde_json::json!({
                "event": "script",
                "name": unit.name,
                "origin": unit.origin.display().to_string(),
                "lines": unit.source.lines().count(),
            });
            println!("{}", serde_json::to_string(&output)?);
        }
    } else {
        println!("\nFound {} scripts:\n", bundle.len());
        for unit in bundle.iter() {
            println!("┌─ {}", unit.name);
            println!("│  Origin: {}", unit.origin.display());
            println!("│  Lines: {}", unit.source.lines().count());
            println!("└─");
        }
    }

    Ok(())
}

fn cmd_inspect(document: &PathBuf, json: bool) -> Result<()> {
    let entries = odpack::archive::read_archive(document)?;
    let total: usize = entries.iter().map(|e| e.content.len()).sum();

    if json {
        let output = serde_json::json!({
            "event": "inspect",
            "document": document.display().to_string(),
            "entries": entries
                .iter()
                .map(|e| serde_json::json!({ "name": e.filename, "size": e.content.len() }))
                .collect::<Vec<_>>(),
            "uncompressed_size": total,
        });
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("🔍 {}", document.display());
        println!("\n{} entries ({total} bytes uncompressed):\n", entries.len());
        for entry in &entries {
            println!("  {:>8}  {}", entry.content.len(), entry.filename);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_build() {
        let cli = Cli::try_parse_from(["odpack", "build"]).unwrap();
        assert!(matches!(cli.command, Commands::Build { .. }));
    }

    #[test]
    fn test_cli_parse_build_with_args() {
        let cli = Cli::try_parse_from([
            "odpack", "build", "--scripts", "macros", "--template", "blank.odt", "--force",
            "--dry-run",
        ])
        .unwrap();

        if let Commands::Build {
            scripts,
            template,
            force,
            dry_run,
            ..
        } = cli.command
        {
            assert_eq!(scripts, Some(PathBuf::from("macros")));
            assert_eq!(template, Some(PathBuf::from("blank.odt")));
            assert!(force);
            assert!(dry_run);
        } else {
            panic!("Expected Build command");
        }
    }

    #[test]
    fn test_cli_parse_expand() {
        let cli = Cli::try_parse_from(["odpack", "expand", "--scripts", "macros"]).unwrap();
        if let Commands::Expand { scripts } = cli.command {
            assert_eq!(scripts, Some(PathBuf::from("macros")));
        } else {
            panic!("Expected Expand command");
        }
    }

    #[test]
    fn test_cli_parse_inspect() {
        let cli = Cli::try_parse_from(["odpack", "inspect", "out.odt"]).unwrap();
        if let Commands::Inspect { document } = cli.command {
            assert_eq!(document, PathBuf::from("out.odt"));
        } else {
            panic!("Expected Inspect command");
        }
    }

    #[test]
    fn test_cli_json_flag() {
        let cli = Cli::try_parse_from(["odpack", "--json", "build"]).unwrap();
        assert!(cli.json);
    }

    #[test]
    fn test_cli_verbose_flag() {
        let cli = Cli::try_parse_from(["odpack", "-vvv", "build"]).unwrap();
        assert_eq!(cli.verbose, 3);
    }
}
