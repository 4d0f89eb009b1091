//! Inspect blobs and model mappings, optionally deleting orphans

use anyhow::Result;
use clap::{Args, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use ollama_inspect_core::blobs::list_blobs;
use ollama_inspect_core::manifest::scan_manifests;
use ollama_inspect_core::report::{parse_columns, reconcile};
use ollama_inspect_core::{BlobOwners, Column, Config, ModelPaths, Report, SizeUnit, View};
use std::io;
use std::path::PathBuf;

use crate::output::{self, CsvTarget, TablePresenter};
use crate::prune::{self, StdinConfirm};

#[derive(Args, Debug, Default)]
pub struct InspectArgs {
    /// Ollama models directory (default: ~/.ollama/models)
    #[arg(long, env = "OLLAMA_MODELS")]
    pub models_root: Option<PathBuf>,

    /// Write CSV instead of a table
    #[arg(long)]
    pub as_csv: bool,

    /// CSV destination ("-" for stdout)
    #[arg(short, long, default_value = "-")]
    pub output: String,

    /// Comma-separated columns: blob, models, size_bytes, size, is_orphan
    #[arg(long)]
    pub columns: Option<String>,

    /// Sort by blob identifier
    #[arg(long)]
    pub sort_by_blob: bool,

    /// Sort by model list (unreferenced blobs last)
    #[arg(long)]
    pub sort_by_model: bool,

    /// Sort by size in bytes
    #[arg(long)]
    pub sort_by_size: bool,

    /// Sort ascending (default)
    #[arg(long)]
    pub sort_asc: bool,

    /// Sort descending
    #[arg(long)]
    pub sort_desc: bool,

    /// Unit for the size column
    #[arg(long, value_enum)]
    pub format: Option<SizeFormat>,

    /// Disable orphan highlighting
    #[arg(long)]
    pub no_color: bool,

    /// Only show blobs no manifest references
    #[arg(long)]
    pub only_orphans: bool,

    /// Delete orphan blobs after listing them
    #[arg(long)]
    pub delete_orphans: bool,

    /// Do not ask for confirmation before deleting
    #[arg(long)]
    pub force: bool,

    /// Show a progress bar while processing blobs
    #[arg(long)]
    pub progress: bool,

    /// Print debug information (paths, blob count)
    #[arg(long)]
    pub debug: bool,

    /// Hash prefix (without "sha256-") to look for among the blobs
    #[arg(long, default_value = "")]
    pub debug_blob: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SizeFormat {
    /// Mebibytes
    Mb,
    /// Gibibytes
    Gb,
}

impl From<SizeFormat> for SizeUnit {
    fn from(format: SizeFormat) -> Self {
        match format {
            SizeFormat::Mb => SizeUnit::Mb,
            SizeFormat::Gb => SizeUnit::Gb,
        }
    }
}

/// Options resolved from flags and the config file, validated before any scan.
#[derive(Debug)]
pub struct Settings {
    pub paths: ModelPaths,
    pub columns: Vec<Column>,
    pub view: View,
    pub unit: SizeUnit,
    pub color: bool,
}

impl Settings {
    pub fn resolve(args: &InspectArgs, config: &Config) -> Result<Self> {
        let view = View::from_flags(
            args.only_orphans,
            args.sort_by_blob,
            args.sort_by_model,
            args.sort_by_size,
            args.sort_asc,
            args.sort_desc,
        )?;
        let columns = parse_columns(args.columns.as_deref().unwrap_or(&config.output.columns))?;
        let root = args.models_root.as_ref().unwrap_or(&config.models.root);

        Ok(Self {
            paths: ModelPaths::new(root),
            columns,
            view,
            unit: args.format.map(SizeUnit::from).unwrap_or(config.output.size_unit),
            color: config.output.color && !args.no_color,
        })
    }
}

pub fn execute(args: &InspectArgs) -> Result<()> {
    let config = Config::load()?;
    let settings = Settings::resolve(args, &config)?;
    let paths = &settings.paths;

    if args.debug {
        println!("DEBUG: models_root   = {}", paths.root.display());
        println!("DEBUG: manifest_root = {}", paths.manifests.display());
        println!("DEBUG: blobs_root    = {}", paths.blobs.display());
    }

    let owners = scan_manifests(&paths.manifests);
    let hashes = list_blobs(&paths.blobs);
    tracing::debug!(manifest_blobs = owners.len(), blobs = hashes.len(), "Scan complete");

    if args.debug {
        println!("DEBUG: total blobs found in blobs/ = {}", hashes.len());
        if !args.debug_blob.is_empty() {
            let prefix = args.debug_blob.to_lowercase();
            let present = hashes.iter().any(|h| h.starts_with(&prefix));
            println!("DEBUG: debug-blob '{prefix}' present in blobs list: {present}");
        }
    }

    let report = build_report(&owners, &hashes, &settings, args.progress)?;
    let rows = settings.view.apply(&report.rows);

    if args.as_csv {
        if rows.is_empty() {
            println!("{}", output::EMPTY_MESSAGE);
        } else {
            CsvTarget::parse(&args.output).write(&rows, &settings.columns)?;
        }
    } else {
        let stdout = io::stdout();
        let presenter = TablePresenter::new(&settings.columns, settings.color, &stdout);
        presenter.render(&mut stdout.lock(), &rows)?;
        if !rows.is_empty() {
            println!();
            println!("{}", output::summary(&report, settings.unit));
        }
    }

    if args.delete_orphans {
        prune::delete_orphans(
            &report.orphans,
            args.force,
            &mut StdinConfirm,
            &mut io::stdout(),
        )?;
    }

    Ok(())
}

fn build_report(
    owners: &BlobOwners,
    hashes: &[String],
    settings: &Settings,
    show_progress: bool,
) -> Result<Report> {
    if !show_progress || hashes.is_empty() {
        return Ok(reconcile(owners, hashes, &settings.paths.blobs, settings.unit, |_| {}));
    }

    println!("Processing {} blobs...", hashes.len());
    let pb = ProgressBar::new(hashes.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("Blobs: [{bar:30}] {pos}/{len}")?
            .progress_chars("#-"),
    );

    let report = reconcile(owners, hashes, &settings.paths.blobs, settings.unit, |_| {
        pb.inc(1)
    });
    pb.finish();
    Ok(report)
}
