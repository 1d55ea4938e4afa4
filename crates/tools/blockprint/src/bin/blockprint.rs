//! Blockprint CLI - images to block palettes, fill commands and structures
//!
//! Reads a source image, builds a block palette from its colors (or from its
//! grid slices), prints optional art with that palette and writes every
//! generated file into an output directory.

use anyhow::{bail, Context, Result};
use blockart::{
    decode_frames, extract_palette, palette_entries, print_art, slice_entries, srgb_entries,
    Alignment, AuxMaps, BlockEntry, Bundle, GenerationConfig,
};
use clap::{Parser, Subcommand};
use image::RgbaImage;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "blockprint")]
#[command(author, version, about = "Convert images into block palettes and printable structures")]
struct Cli {
    /// Log at debug level (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// TOML generation config; BLOCKART_* variables still apply on top
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract and print the color palette of an image
    Palette {
        /// Input image (PNG, GIF, JPEG, ...)
        image: PathBuf,

        /// Print block listings as JSON instead of hex colors
        #[arg(long)]
        json: bool,
    },

    /// Build a palette and write command units and structures
    Generate {
        /// Palette source image
        #[arg(short, long, required_unless_present = "srgb")]
        source: Option<PathBuf>,

        /// Sample the RGB cube every STEP values instead of reading a source
        #[arg(long, value_name = "STEP", conflicts_with = "source")]
        srgb: Option<u32>,

        /// Art to print with the palette
        #[arg(short, long)]
        art: Option<PathBuf>,

        /// Cut the source into N×N slices instead of extracting colors
        #[arg(long, value_name = "N")]
        slices: Option<u32>,

        /// Metalness/emissive/roughness map cropped alongside slices
        #[arg(long, requires = "slices")]
        mer: Option<PathBuf>,

        /// Normal map cropped alongside slices
        #[arg(long, requires = "slices")]
        normal: Option<PathBuf>,

        /// Block namespace
        #[arg(short, long)]
        namespace: Option<String>,

        /// Comma-separated material ids (glossy, emissive, metal)
        #[arg(short, long, value_delimiter = ',')]
        materials: Option<Vec<String>>,

        /// Frame placement for animated art (e2e, b2b, even, odd, none)
        #[arg(long)]
        alignment: Option<Alignment>,

        /// Name of the generated units and structures
        #[arg(long, default_value = blockart::config::ART_SOURCE_ID)]
        name: String,

        /// Output directory
        #[arg(short, long)]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = match &cli.config {
        Some(path) => GenerationConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => GenerationConfig::from_env()?,
    };

    match cli.command {
        Commands::Palette { image, json } => {
            let frames = read_frames(&image)?;

            if json {
                let entries = palette_entries(&config, &frames);
                let listing: Vec<_> = entries.iter().map(BlockEntry::listing).collect();
                println!("{}", serde_json::to_string_pretty(&listing)?);
            } else {
                let palette = extract_palette(&frames, &config.palette_options());
                for color in &palette.colors {
                    println!("{}", color.hex());
                }
                if palette.truncated {
                    eprintln!("Palette truncated at {} colors", config.max_palette_size);
                }
            }
        }

        Commands::Generate {
            source,
            srgb,
            art,
            slices,
            mer,
            normal,
            namespace,
            materials,
            alignment,
            name,
            out,
        } => {
            if let Some(namespace) = namespace {
                config.namespace = namespace;
            }
            if let Some(materials) = materials {
                config.materials = materials;
            }
            if let Some(alignment) = alignment {
                config.alignment = alignment;
            }
            if let Some(slices) = slices {
                config.slice_count = slices;
            }
            config.validate()?;

            let progress = ProgressBar::new_spinner();
            progress.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} {msg}")?
                    .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
            );
            progress.enable_steady_tick(Duration::from_millis(100));

            progress.set_message("Building palette...");
            let palette = match (source, srgb) {
                (_, Some(step)) => srgb_entries(&config, step),
                (Some(source), None) => {
                    let frames = read_frames(&source)?;
                    if slices.is_some() {
                        let mer = mer.as_deref().map(read_single).transpose()?;
                        let normal = normal.as_deref().map(read_single).transpose()?;
                        let aux = AuxMaps {
                            mer: mer.as_ref(),
                            normal: normal.as_ref(),
                        };
                        slice_entries(&config, &frames, aux)
                    } else {
                        palette_entries(&config, &frames)
                    }
                }
                (None, None) => bail!("Either --source or --srgb is required"),
            };
            info!("Palette has {} entries", palette.len());

            let art_frames = art.as_deref().map(read_frames).transpose()?;

            progress.set_message("Printing...");
            let mut bundle = Bundle::new();
            let report = print_art(
                &mut bundle,
                &config,
                &palette,
                art_frames.as_deref(),
                &name,
            )?;

            progress.set_message("Writing files...");
            bundle
                .write_to_dir(&out)
                .with_context(|| format!("Failed to write output to {}", out.display()))?;
            progress.finish_with_message(format!("Wrote {} file(s)", bundle.len()));

            println!();
            println!("Statistics:");
            println!("  Palette:     {} entries", palette.len());
            println!("  Units:       {}", report.units.len());
            println!("  Split:       {}", report.split_units);
            println!("  Failures:    {}", report.failures.len());
            for failure in &report.failures {
                println!("    {}: {}", failure.unit, failure.reason);
            }
            println!("  Output:      {}", out.display());
        }
    }

    Ok(())
}

fn read_frames(path: &Path) -> Result<Vec<RgbaImage>> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    decode_frames(&bytes).with_context(|| format!("Failed to decode {}", path.display()))
}

fn read_single(path: &Path) -> Result<RgbaImage> {
    let mut frames = read_frames(path)?;
    Ok(frames.swap_remove(0))
}
