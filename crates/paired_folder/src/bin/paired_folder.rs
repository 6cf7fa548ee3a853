use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use image::{imageops::FilterType, GenericImageView};
use paired_folder::config::PairedFolderConfig;
use paired_folder::transforms::vision::Resize;
use paired_folder::{ImageBackend, PairedImageFolder};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "paired-folder",
    about = "Inspect folder-per-class datasets where each image has a metadata sidecar"
)]
struct Cli {
    /// Log at debug level (RUST_LOG overrides).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the index and print a summary with per-class counts.
    Scan(DatasetArgs),
    /// Decode one sample and print its label and dimensions.
    Get {
        #[command(flatten)]
        dataset: DatasetArgs,
        /// Position of the sample in the index.
        #[arg(long)]
        index: usize,
        /// Resize to WIDTHxHEIGHT before reporting.
        #[arg(long, value_parser = parse_size)]
        resize: Option<(u32, u32)>,
        /// Also print the metadata sidecar.
        #[arg(long)]
        metadata: bool,
    },
}

#[derive(Args, Debug)]
struct DatasetArgs {
    /// Dataset root; each subdirectory is one class.
    root: Option<PathBuf>,
    /// JSON config file; command-line flags override its fields.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    image_ext: Option<String>,
    #[arg(long)]
    metadata_ext: Option<String>,
    /// Decoder backend: image or turbojpeg.
    #[arg(long)]
    backend: Option<ImageBackend>,
}

impl DatasetArgs {
    fn resolve(&self) -> Result<PairedFolderConfig> {
        let mut config = match (&self.config, &self.root) {
            (Some(path), _) => PairedFolderConfig::from_json_file(path)?,
            (None, Some(root)) => PairedFolderConfig::new(root),
            (None, None) => return Err(anyhow!("either a dataset root or --config is required")),
        };
        if let Some(root) = &self.root {
            config.root = root.clone();
        }
        if let Some(ext) = &self.image_ext {
            config.image_extension = ext.clone();
        }
        if let Some(ext) = &self.metadata_ext {
            config.metadata_extension = ext.clone();
        }
        if let Some(backend) = self.backend {
            config.backend = backend;
        }
        config.validate()?;
        Ok(config)
    }
}

fn parse_size(s: &str) -> std::result::Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
    let w = w.trim().parse::<u32>().map_err(|e| format!("bad width '{w}': {e}"))?;
    let h = h.trim().parse::<u32>().map_err(|e| format!("bad height '{h}': {e}"))?;
    Ok((w, h))
}

fn setup_logging(verbose: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logger: {e}"))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match cli.command {
        Command::Scan(args) => scan(&args),
        Command::Get {
            dataset,
            index,
            resize,
            metadata,
        } => get(&dataset, index, resize, metadata),
    }
}

fn scan(args: &DatasetArgs) -> Result<()> {
    let config = args.resolve()?;
    let dataset = PairedImageFolder::new(&config)
        .with_context(|| format!("build dataset at {}", config.root.display()))?;

    println!("{}", dataset);
    println!();
    println!("Classes:");
    let counts = dataset.index().class_counts();
    for (i, label) in dataset.index().class_map().iter() {
        println!("  {:>3}  {:<24} {}", i, label, counts[i]);
    }
    println!();
    println!("Missing counterparts: {}", dataset.missing_count());
    Ok(())
}

fn get(args: &DatasetArgs, index: usize, resize: Option<(u32, u32)>, metadata: bool) -> Result<()> {
    let config = args.resolve()?;
    let mut dataset = PairedImageFolder::new(&config)
        .with_context(|| format!("build dataset at {}", config.root.display()))?;
    if let Some((w, h)) = resize {
        dataset = dataset.with_transform(Resize::new(w, h, FilterType::Triangle)?);
    }

    let (image, target) = dataset.get(index)?;
    let sample = dataset.sample(index)?;
    let label = dataset
        .index()
        .class_map()
        .label_of(sample.class_index)
        .unwrap_or("?");
    let (w, h) = image.dimensions();

    println!("image:  {}", sample.image_path.display());
    println!("meta:   {}", sample.metadata_path.display());
    println!("class:  {} ({})", target, label);
    println!("size:   {}x{}", w, h);
    if metadata {
        let value = dataset.read_metadata(index)?;
        println!("{}", serde_json::to_string_pretty(&value)?);
    }
    Ok(())
}
