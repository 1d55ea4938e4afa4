use crate::color::EXACT_MATCH_TOLERANCE;
use crate::emit::Alignment;
use crate::error::{BlockArtError, Result};
use crate::palette::{PaletteOptions, BOUNDARY, MAX_FRAME_DEPTH, MAX_PALETTE_SIZE};
use crate::resolve::ResolverConfig;
use crate::slice::SliceOptions;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path};

/// Minimum pixel alpha value allowed in a palette (half of 255, rounded)
pub const MIN_ALPHA: u8 = 128;

pub const DEFAULT_NAMESPACE: &str = "art";
pub const DEFAULT_SLICE_COUNT: u32 = 16;
pub const CHUNK_SIZE: u32 = 16;
pub const MAX_PRINT_CHUNKS: u32 = CHUNK_SIZE;
/// Widest decoded print, in blocks
pub const MAX_PRINT_SIZE: u32 = 24 * CHUNK_SIZE;
/// Longest command unit some consumers accept
pub const MAX_FUNCTION_LINES: usize = 10_000;
pub const MIN_PALETTE_LENGTH: usize = 1;
pub const DEFAULT_PRINT_BLOCK: &str = "minecraft:stone";
pub const TRANSPARENT_PRINT_BLOCK: &str = "minecraft:air";
/// Fraction of full alpha below which a pixel prints as the transparent block
pub const TRANSPARENT_PRINT_BLOCK_THRESHOLD: f32 = 0.5;
pub const FUNCTIONS_NAMESPACE: &str = "print";
pub const BLOCK_ENGINE_VERSION: i32 = 17_959_425;
pub const ART_SOURCE_ID: &str = "input";

/// Settings for one generation request
///
/// Loaded from TOML (every field optional), then overridden by `BLOCKART_*`
/// environment variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub namespace: String,
    /// Palette sample threshold; alpha must be strictly above it
    pub min_alpha: u8,
    pub max_frames: usize,
    /// Palette downsample bound per axis
    pub boundary: u32,
    pub max_palette_size: usize,
    pub min_palette_length: usize,
    pub slice_count: u32,
    pub max_function_lines: usize,
    pub chunk_size: u32,
    pub max_print_chunks: u32,
    pub max_print_size: u32,
    pub default_block: String,
    pub transparent_block: String,
    pub transparent_threshold: f32,
    pub functions_namespace: String,
    pub block_engine_version: i32,
    pub alignment: Alignment,
    pub materials: Vec<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            min_alpha: MIN_ALPHA,
            max_frames: MAX_FRAME_DEPTH,
            boundary: BOUNDARY,
            max_palette_size: MAX_PALETTE_SIZE,
            min_palette_length: MIN_PALETTE_LENGTH,
            slice_count: DEFAULT_SLICE_COUNT,
            max_function_lines: MAX_FUNCTION_LINES,
            chunk_size: CHUNK_SIZE,
            max_print_chunks: MAX_PRINT_CHUNKS,
            max_print_size: MAX_PRINT_SIZE,
            default_block: DEFAULT_PRINT_BLOCK.to_string(),
            transparent_block: TRANSPARENT_PRINT_BLOCK.to_string(),
            transparent_threshold: TRANSPARENT_PRINT_BLOCK_THRESHOLD,
            functions_namespace: FUNCTIONS_NAMESPACE.to_string(),
            block_engine_version: BLOCK_ENGINE_VERSION,
            alignment: Alignment::B2b,
            materials: vec!["glossy".to_string()],
        }
    }
}

impl GenerationConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML file, then apply environment overrides
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&text)?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Defaults with environment overrides applied
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Override fields from `BLOCKART_*` variables; unparsable values are ignored
    pub fn apply_env(&mut self) {
        if let Ok(ns) = env::var("BLOCKART_NAMESPACE") {
            self.namespace = ns;
        }
        if let Some(v) = parse_env("BLOCKART_MIN_ALPHA") {
            self.min_alpha = v;
        }
        if let Some(v) = parse_env("BLOCKART_MAX_FRAMES") {
            self.max_frames = v;
        }
        if let Some(v) = parse_env("BLOCKART_SLICE_COUNT") {
            self.slice_count = v;
        }
        if let Some(v) = parse_env("BLOCKART_MAX_FUNCTION_LINES") {
            self.max_function_lines = v;
        }
        if let Some(v) = parse_env("BLOCKART_MAX_PRINT_SIZE") {
            self.max_print_size = v;
        }
        if let Ok(block) = env::var("BLOCKART_DEFAULT_BLOCK") {
            self.default_block = block;
        }
        if let Ok(block) = env::var("BLOCKART_TRANSPARENT_BLOCK") {
            self.transparent_block = block;
        }
        if let Ok(materials) = env::var("BLOCKART_MATERIALS") {
            self.materials = materials.split(',').map(|m| m.trim().to_string()).collect();
        }
    }

    pub fn validate(&self) -> Result<()> {
        let fail = |msg: &str| Err(BlockArtError::InvalidConfig(msg.to_string()));

        if self.slice_count == 0 {
            return fail("slice count must be >= 1");
        }
        if self.max_function_lines == 0 {
            return fail("max function lines must be >= 1");
        }
        if self.chunk_size == 0 || self.max_print_chunks == 0 || self.max_print_size == 0 {
            return fail("print sizes must be >= 1");
        }
        if self.max_frames == 0 {
            return fail("max frames must be >= 1");
        }
        if self.boundary == 0 {
            return fail("palette boundary must be >= 1");
        }
        if self.default_block.trim().is_empty() || self.transparent_block.trim().is_empty() {
            return fail("block identifiers must not be empty");
        }
        if !(0.0..=1.0).contains(&self.transparent_threshold) {
            return fail("transparent threshold must be within 0..=1");
        }
        Ok(())
    }

    pub fn palette_options(&self) -> PaletteOptions {
        PaletteOptions {
            min_alpha: self.min_alpha,
            max_frames: self.max_frames,
            max_width: self.boundary,
            max_height: self.boundary,
            max_size: self.max_palette_size,
            ..Default::default()
        }
    }

    pub fn slice_options(&self) -> SliceOptions {
        SliceOptions {
            canvas_size: None,
            slice_count: self.slice_count,
            max_frames: self.max_frames,
        }
    }

    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            exact_tolerance: EXACT_MATCH_TOLERANCE,
            transparent_threshold: self.transparent_threshold,
            transparent_block: self.transparent_block.clone(),
            fallback_block: self.default_block.clone(),
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}
