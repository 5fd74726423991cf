use clap::{Parser, Subcommand, ValueEnum};
use photo_mat::config::{self, DEFAULT_CONFIG_FILE, MatConfig};
use photo_mat::export::{DirectoryTarget, ExportReceipt};
use photo_mat::session::{LoadMode, LoadOutcome, Session};
use photo_mat::types::{DisplayOption, DisplayOptions, MatTone};
use photo_mat::{output, scan};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "photo-mat")]
#[command(about = "Frame photographs on a mat with rounded corners, glow and exposure overlay")]
#[command(long_about = "\
Frame photographs on a mat with rounded corners, glow and exposure overlay

Each photo is fitted onto a square canvas (1440x1440 by default) over a
light or dark mat. Corners are rounded unless --square-corners is given.
--overlay prints the exposure line read from the camera tags:

  50mm | f/2.8 | ISO200 | 1/250s

Inputs may be files or directories. A directory contributes its images
(jpg, png, tiff, webp) sorted by name; subdirectories are not searched.

Frames are written as <name>_mat.jpeg into the output directory, next to a
manifest.json describing them.

Run 'photo-mat gen-config' to generate a documented mat.toml.")]
#[command(version)]
struct Cli {
    /// Config file [default: ./mat.toml when present]
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum MatArg {
    Light,
    Dark,
}

impl From<MatArg> for MatTone {
    fn from(value: MatArg) -> Self {
        match value {
            MatArg::Light => MatTone::Light,
            MatArg::Dark => MatTone::Dark,
        }
    }
}

#[derive(clap::Args)]
struct RenderArgs {
    /// Photos or directories to load
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Photos or directories appended after the first batch
    #[arg(long, num_args = 1..)]
    append: Vec<PathBuf>,

    /// Output directory
    #[arg(long, default_value = "mat-out")]
    out: PathBuf,

    /// Keep the photo corners square
    #[arg(long)]
    square_corners: bool,

    /// Show the exposure line under the photo
    #[arg(long)]
    overlay: bool,

    /// Mat colour
    #[arg(long, value_enum, default_value = "dark")]
    mat: MatArg,

    /// Draw a soft halo behind the photo
    #[arg(long)]
    glow: bool,

    /// Export only the photo at this 1-based position
    #[arg(long)]
    select: Option<usize>,
}

#[derive(Subcommand)]
enum Command {
    /// Load photos and export framed JPEGs
    Render(RenderArgs),
    /// Load photos and show their fitted size and exposure line
    Inspect {
        /// Photos or directories to load
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
    /// Print a stock mat.toml with all options documented
    GenConfig,
}

/// Written next to the exported frames.
#[derive(Serialize)]
struct ExportManifest<'a> {
    options: &'a DisplayOptions,
    frames: &'a [ExportReceipt],
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Render(args) => {
            let config = resolve_config(cli.config.as_deref())?;
            let mut session = Session::from_config(&config)?;

            load_batch(&mut session, &args.inputs, LoadMode::Replace)?;
            if !args.append.is_empty() {
                load_batch(&mut session, &args.append, LoadMode::Append)?;
            }
            if session.store().is_empty() {
                return Err("no photos could be loaded".into());
            }

            for option in [
                DisplayOption::RoundedCorners(!args.square_corners),
                DisplayOption::MetadataOverlay(args.overlay),
                DisplayOption::Mat(args.mat.into()),
                DisplayOption::Glow(args.glow),
            ] {
                session.set_option(option)?;
            }

            let positions: Vec<usize> = match args.select {
                Some(n) => vec![n.saturating_sub(1).min(session.store().len() - 1)],
                None => (0..session.store().len()).collect(),
            };

            let mut target = DirectoryTarget::new(&args.out)?;
            let mut frames = Vec::new();
            let mut failed = 0;
            for pos in positions {
                session.select_photo(pos)?;
                match session.export_current(&mut target) {
                    Ok(receipt) => {
                        println!("{}", output::format_export_line(pos, &receipt));
                        frames.push(receipt);
                    }
                    Err(e) => {
                        let name = session
                            .store()
                            .selected()
                            .map(|photo| photo.name())
                            .unwrap_or_default();
                        println!("{}", output::format_export_failure(pos, &name, &e));
                        failed += 1;
                    }
                }
            }

            let manifest = ExportManifest {
                options: session.options(),
                frames: &frames,
            };
            let json = serde_json::to_string_pretty(&manifest)?;
            std::fs::write(target.dir().join("manifest.json"), json)?;

            println!();
            println!(
                "{}",
                output::format_export_summary(frames.len(), failed, target.dir())
            );
        }
        Command::Inspect { inputs } => {
            let config = resolve_config(cli.config.as_deref())?;
            let mut session = Session::from_config(&config)?;
            load_batch(&mut session, &inputs, LoadMode::Replace)?;
            output::print_inspect(&session.store().snapshot());
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// An explicit `--config` must exist; the implicit `./mat.toml` is optional.
fn resolve_config(path: Option<&Path>) -> Result<MatConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) if !path.exists() => {
            Err(format!("config file not found: {}", path.display()).into())
        }
        Some(path) => Ok(config::load_config(path)?),
        None => Ok(config::load_config(Path::new(DEFAULT_CONFIG_FILE))?),
    }
}

/// Expand `inputs`, load them and print the batch report.
fn load_batch(
    session: &mut Session,
    inputs: &[PathBuf],
    mode: LoadMode,
) -> Result<(), Box<dyn std::error::Error>> {
    let files = scan::collect_inputs(inputs)?;
    match session.load(files, mode)? {
        LoadOutcome::Ignored => println!("No photos found ({mode})"),
        LoadOutcome::Started { .. } => {
            if let Some(report) = session.wait() {
                output::print_batch_report(&report);
            }
        }
    }
    Ok(())
}
