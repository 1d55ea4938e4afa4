//! Blockart - raster images to block palettes, fill commands and structures
//!
//! Converts a still or animated image into a palette of block candidates,
//! resolves pixels to block identifiers and emits the result in two forms:
//! textual `fill` command units and binary structure records.
//!
//! ## Pipeline
//!
//! ```text
//! image bytes
//!     ↓ frames::decode_frames
//! RGBA frames
//!     ├─ palette::extract_palette → HueBlock per color
//!     └─ slice::slice_frames      → ImageBlock per grid cell
//!     ↓ block::compile_materials
//! BlockEntry palette
//!     ↓ resolve::BlockResolver (per pixel)
//!     ├─ emit::CommandEmitter      → functions/<ns>/*.mcfunction
//!     └─ structure::StructureRecord → structures/<name>.mcstructure
//!     ↓
//! bundle::Bundle
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use blockart::{decode_frames, palette_entries, print_art, Bundle, GenerationConfig};
//!
//! fn main() -> blockart::Result<()> {
//!     let config = GenerationConfig::from_env()?;
//!     let frames = decode_frames(&std::fs::read("art.png")?)?;
//!
//!     let palette = palette_entries(&config, &frames);
//!     let mut bundle = Bundle::new();
//!     let report = print_art(&mut bundle, &config, &palette, Some(frames.as_slice()), "art")?;
//!
//!     println!("{} units", report.units.len());
//!     bundle.write_to_dir(std::path::Path::new("out"))?;
//!     Ok(())
//! }
//! ```

pub mod axis;
pub mod block;
pub mod bundle;
pub mod color;
pub mod config;
pub mod emit;
pub mod error;
pub mod frames;
pub mod nbt;
pub mod palette;
pub mod printer;
pub mod resolve;
pub mod slice;
pub mod structure;

// Re-export main types for convenience
pub use axis::Axis;
pub use block::{
    compile_materials, materials_from_ids, printable_palette, BlockEntry, BlockListing,
    BlockTexture, Candidate, HueBlock, ImageBlock, Material,
};
pub use bundle::{Bundle, Payload};
pub use color::{Color, Tolerance, EXACT_MATCH_TOLERANCE, PALETTE_TOLERANCE};
pub use config::GenerationConfig;
pub use emit::{Alignment, CommandEmitter, EmitReport, UnitFailure};
pub use error::{BlockArtError, Result};
pub use frames::{decode_frames, fit_frame, fit_within, limit_frames};
pub use palette::{extract_palette, srgb_grid, PaletteExtraction, PaletteOptions};
pub use printer::{palette_entries, print_art, slice_entries, srgb_entries};
pub use resolve::{BlockResolver, ResolverConfig};
pub use slice::{flipbook_frames, slice_frames, AuxMaps, Slice, SliceOptions};
pub use structure::StructureRecord;
