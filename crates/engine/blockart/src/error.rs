use thiserror::Error;

/// Errors surfaced by a generation request
#[derive(Debug, Error)]
pub enum BlockArtError {
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Unsupported image format")]
    UnsupportedFormat,

    #[error("Image contains no frames")]
    EmptyImage,

    #[error("Palette source is too small: {found} usable colors, at least {minimum} required")]
    PaletteTooSmall { found: usize, minimum: usize },

    #[error("No blocks available in palette")]
    NoPrintableBlocks,

    #[error("Failed emitting unit {unit}: {reason}")]
    Emission { unit: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for blockart operations
pub type Result<T> = std::result::Result<T, BlockArtError>;
