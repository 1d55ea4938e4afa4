//! Block candidates: single-color blocks, image slices and the material
//! variants that turn them into placeable entries
//!
//! Resolution and emission only ever look at the [`Candidate`] capability
//! set. Identifiers are computed once when an entry is built and never
//! change afterwards.

use crate::axis::Axis;
use crate::color::{
    dominant_color, is_fully_transparent, is_translucent, region_is_translucent, Color,
};
use crate::config::{DEFAULT_NAMESPACE, MIN_ALPHA};
use crate::error::{BlockArtError, Result};
use crate::slice::flipbook_frames;
use glam::IVec3;
use image::RgbaImage;
use serde::Serialize;

/// What the resolver and emitters need from a block
pub trait Candidate {
    /// Fully qualified block identifier (`namespace:id`)
    fn identifier(&self) -> &str;
    fn reference_color(&self) -> Color;
    fn material_label(&self) -> &str;
    fn is_translucent(&self) -> bool;
    fn is_transparent(&self) -> bool;
}

impl<T: Candidate + ?Sized> Candidate for &T {
    fn identifier(&self) -> &str {
        (**self).identifier()
    }

    fn reference_color(&self) -> Color {
        (**self).reference_color()
    }

    fn material_label(&self) -> &str {
        (**self).material_label()
    }

    fn is_translucent(&self) -> bool {
        (**self).is_translucent()
    }

    fn is_transparent(&self) -> bool {
        (**self).is_transparent()
    }
}

/// A block textured with one flat color
#[derive(Debug, Clone, PartialEq)]
pub struct HueBlock {
    color: Color,
    title: Option<String>,
}

impl HueBlock {
    pub fn new(color: impl Into<Color>) -> Self {
        Self {
            color: color.into(),
            title: None,
        }
    }

    pub fn titled(color: impl Into<Color>, title: impl Into<String>) -> Self {
        Self {
            color: color.into(),
            title: Some(title.into()),
        }
    }

    /// Display title; defaults to the uppercase hex value without `#`
    pub fn title(&self) -> String {
        match &self.title {
            Some(title) => title.clone(),
            None => self.color.hex().trim_start_matches('#').to_uppercase(),
        }
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn is_translucent(&self) -> bool {
        is_translucent(self.color)
    }

    pub fn is_transparent(&self) -> bool {
        self.color.alpha() < MIN_ALPHA
    }
}

/// A block textured with a region of the source image
#[derive(Debug, Clone)]
pub struct ImageBlock {
    texture: RgbaImage,
    position: IVec3,
    title: String,
    color: Color,
    frame_count: u32,
    translucent: bool,
    transparent: bool,
    /// Metalness/emissive/roughness crop
    pub mer: Option<RgbaImage>,
    pub normal: Option<RgbaImage>,
}

impl ImageBlock {
    pub fn new(texture: RgbaImage, position: IVec3, title: impl Into<String>) -> Self {
        let color = dominant_color(&texture);
        let translucent = region_is_translucent(texture.pixels().map(Color::from));
        let transparent = is_fully_transparent(texture.pixels().map(Color::from), MIN_ALPHA);

        Self {
            texture,
            position,
            title: title.into(),
            color,
            frame_count: 1,
            translucent,
            transparent,
            mer: None,
            normal: None,
        }
    }

    /// Mark the texture as a vertical strip of `frame_count` animation frames
    pub fn with_frame_count(mut self, frame_count: u32) -> Self {
        assert!(frame_count > 0, "flipbook needs at least one frame");
        self.frame_count = frame_count;
        self
    }

    pub fn texture(&self) -> &RgbaImage {
        &self.texture
    }

    pub fn position(&self) -> IVec3 {
        self.position
    }

    /// Position with coordinates ordered for the given axis
    pub fn orientation(&self, axis: Axis) -> IVec3 {
        axis.orient(self.position)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    pub fn is_flipbook(&self) -> bool {
        self.frame_count > 1
    }

    pub fn is_translucent(&self) -> bool {
        self.translucent
    }

    pub fn is_transparent(&self) -> bool {
        self.transparent
    }
}

/// The texture family a block entry is built from
#[derive(Debug, Clone)]
pub enum BlockTexture {
    Hue(HueBlock),
    Image(ImageBlock),
}

impl BlockTexture {
    pub fn title(&self) -> String {
        match self {
            BlockTexture::Hue(hue) => hue.title(),
            BlockTexture::Image(img) => img.title().to_string(),
        }
    }

    /// Title with whitespace runs replaced by `_`
    pub fn name(&self) -> String {
        self.title()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("_")
    }

    pub fn color(&self) -> Color {
        match self {
            BlockTexture::Hue(hue) => hue.color(),
            BlockTexture::Image(img) => img.color(),
        }
    }

    pub fn is_translucent(&self) -> bool {
        match self {
            BlockTexture::Hue(hue) => hue.is_translucent(),
            BlockTexture::Image(img) => img.is_translucent(),
        }
    }

    pub fn is_transparent(&self) -> bool {
        match self {
            BlockTexture::Hue(hue) => hue.is_transparent(),
            BlockTexture::Image(img) => img.is_transparent(),
        }
    }

    /// Spatial position, only known for image slices
    pub fn position(&self) -> Option<IVec3> {
        match self {
            BlockTexture::Hue(_) => None,
            BlockTexture::Image(img) => Some(img.position()),
        }
    }

    pub fn as_image(&self) -> Option<&ImageBlock> {
        match self {
            BlockTexture::Image(img) => Some(img),
            BlockTexture::Hue(_) => None,
        }
    }
}

impl From<HueBlock> for BlockTexture {
    fn from(hue: HueBlock) -> Self {
        BlockTexture::Hue(hue)
    }
}

impl From<ImageBlock> for BlockTexture {
    fn from(img: ImageBlock) -> Self {
        BlockTexture::Image(img)
    }
}

/// Surface finish applied to every texture; its label partitions output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Material {
    pub label: String,
    pub title: String,
    /// `Some(false)` opts translucent textures out of blending
    pub translucent: Option<bool>,
}

impl Material {
    pub fn new(label: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            title: title.into(),
            translucent: None,
        }
    }

    pub fn glossy() -> Self {
        Self::new("glossy", "Glossy Plastic")
    }

    pub fn emissive() -> Self {
        Self::new("emissive", "Glowing")
    }

    pub fn metal() -> Self {
        Self::new("metal", "Rough Metal")
    }

    /// Look up a built-in material by id
    pub fn from_id(id: &str) -> Option<Self> {
        match id.trim() {
            "glossy" | "plastic" => Some(Self::glossy()),
            "emissive" | "glowing" => Some(Self::emissive()),
            "metal" | "rough_metal" => Some(Self::metal()),
            _ => None,
        }
    }
}

/// Resolve material ids, skipping unknown ones and falling back to glossy
pub fn materials_from_ids<S: AsRef<str>>(ids: &[S]) -> Vec<Material> {
    let mut materials: Vec<Material> = Vec::new();
    for id in ids {
        match Material::from_id(id.as_ref()) {
            Some(material) if !materials.iter().any(|m| m.label == material.label) => {
                materials.push(material)
            }
            Some(_) => {}
            None => tracing::warn!("Unknown material id {:?}", id.as_ref()),
        }
    }
    if materials.is_empty() {
        materials.push(Material::glossy());
    }
    materials
}

/// A texture paired with a material under a namespace
#[derive(Debug, Clone)]
pub struct BlockEntry {
    namespace: String,
    texture: BlockTexture,
    material: Material,
    id: String,
    behavior_id: String,
    /// Entries marked unprintable are never placed by the pixel printer
    pub printable: bool,
}

impl BlockEntry {
    pub fn new(namespace: &str, texture: impl Into<BlockTexture>, material: Material) -> Self {
        let namespace = sanitize_namespace(namespace);
        let texture = texture.into();

        let hash: String = namespace.chars().take(2).collect();
        let id = format!("{}{}_{}", hash.trim(), material.label, texture.name()).to_lowercase();
        let behavior_id = format!("{}:{}", namespace, id);

        Self {
            namespace,
            texture,
            material,
            id,
            behavior_id,
            printable: true,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn behavior_id(&self) -> &str {
        &self.behavior_id
    }

    pub fn texture(&self) -> &BlockTexture {
        &self.texture
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    /// Translucent texture on a material that allows blending
    pub fn translucent(&self) -> bool {
        self.texture.is_translucent() && self.material.translucent != Some(false)
    }

    pub fn listing(&self) -> BlockListing {
        let flipbook = self.texture.as_image().filter(|img| img.is_flipbook());
        BlockListing {
            identifier: self.behavior_id.clone(),
            color: self.texture.color().hex(),
            material: self.material.label.clone(),
            position: self.texture.position().map(|p| p.to_array()),
            flipbook_frames: flipbook.map(ImageBlock::frame_count),
            frames: flipbook.map(|img| flipbook_frames(img.frame_count())),
        }
    }
}

impl Candidate for BlockEntry {
    fn identifier(&self) -> &str {
        &self.behavior_id
    }

    fn reference_color(&self) -> Color {
        self.texture.color()
    }

    fn material_label(&self) -> &str {
        &self.material.label
    }

    fn is_translucent(&self) -> bool {
        self.texture.is_translucent()
    }

    fn is_transparent(&self) -> bool {
        self.texture.is_transparent()
    }
}

/// Serializable summary handed to packaging
#[derive(Debug, Clone, Serialize)]
pub struct BlockListing {
    pub identifier: String,
    pub color: String,
    pub material: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<[i32; 3]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flipbook_frames: Option<u32>,
    /// Playback order of a flipbook's frames
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frames: Option<Vec<u32>>,
}

/// Cross every material with every texture, material-major
pub fn compile_materials(
    namespace: &str,
    textures: &[BlockTexture],
    materials: &[Material],
) -> Vec<BlockEntry> {
    materials
        .iter()
        .flat_map(|material| {
            textures
                .iter()
                .map(move |texture| BlockEntry::new(namespace, texture.clone(), material.clone()))
        })
        .collect()
}

/// Entries still allowed in printed output
pub fn printable_palette(entries: &[BlockEntry]) -> Result<Vec<&BlockEntry>> {
    let printable: Vec<&BlockEntry> = entries.iter().filter(|e| e.printable).collect();
    if printable.is_empty() {
        return Err(BlockArtError::NoPrintableBlocks);
    }
    Ok(printable)
}

/// Lowercase, non-alphanumerics collapsed to `_`, short results fall back
/// to the default namespace
pub fn sanitize_namespace(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.trim().chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    let out = out.trim_matches('_').to_string();
    if out.len() < 2 {
        DEFAULT_NAMESPACE.to_string()
    } else {
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_hue_block_flags() {
        let opaque = HueBlock::new([10u8, 20, 30]);
        assert!(!opaque.is_translucent());
        assert!(!opaque.is_transparent());

        let glass = HueBlock::new([10u8, 20, 30, 200]);
        assert!(glass.is_translucent());
        assert!(!glass.is_transparent());

        let ghost = HueBlock::new([10u8, 20, 30, 10]);
        assert!(ghost.is_transparent());
    }

    #[test]
    fn test_hue_block_title_defaults_to_hex() {
        assert_eq!(HueBlock::new([255u8, 0, 16]).title(), "FF0010FF");
        assert_eq!(HueBlock::titled([0u8, 0, 0], "R0 G0 B0").title(), "R0 G0 B0");
    }

    #[test]
    fn test_entry_identifier() {
        let entry = BlockEntry::new(
            "Pixel Art",
            HueBlock::titled([1u8, 2, 3], "R1 G2  B3"),
            Material::glossy(),
        );
        assert_eq!(entry.namespace(), "pixel_art");
        assert_eq!(entry.id(), "piglossy_r1_g2_b3");
        assert_eq!(entry.behavior_id(), "pixel_art:piglossy_r1_g2_b3");
        assert_eq!(entry.identifier(), entry.behavior_id());
        assert_eq!(entry.material_label(), "glossy");
    }

    #[test]
    fn test_image_block_flags() {
        let clear = ImageBlock::new(RgbaImage::new(2, 2), IVec3::ZERO, "X0 Y0 Z0");
        assert!(clear.is_transparent());
        assert!(!clear.is_translucent());

        let mut img = RgbaImage::from_pixel(2, 2, Rgba([40, 50, 60, 255]));
        img.put_pixel(0, 0, Rgba([40, 50, 60, 100]));
        let block = ImageBlock::new(img, IVec3::new(1, 2, 0), "X1 Y2 Z0");
        assert!(block.is_translucent());
        assert!(!block.is_transparent());
        assert_eq!(block.color(), Color::rgb(40, 50, 60));
        assert_eq!(block.orientation(Axis::Z), IVec3::new(1, 0, 2));
    }

    #[test]
    fn test_translucent_respects_material() {
        let glass = HueBlock::new([10u8, 20, 30, 200]);
        let mut opaque_only = Material::glossy();
        opaque_only.translucent = Some(false);

        assert!(BlockEntry::new("art", glass.clone(), Material::glossy()).translucent());
        assert!(!BlockEntry::new("art", glass, opaque_only).translucent());
    }

    #[test]
    fn test_compile_materials_is_material_major() {
        let textures: Vec<BlockTexture> = vec![
            HueBlock::titled([0u8, 0, 0], "a").into(),
            HueBlock::titled([9u8, 9, 9], "b").into(),
        ];
        let entries = compile_materials("art", &textures, &[Material::glossy(), Material::metal()]);
        let ids: Vec<&str> = entries.iter().map(|e| e.id()).collect();
        assert_eq!(ids, ["arglossy_a", "arglossy_b", "armetal_a", "armetal_b"]);
    }

    #[test]
    fn test_materials_from_ids() {
        let materials = materials_from_ids(&["metal", "nope", "metal", "emissive"]);
        let labels: Vec<&str> = materials.iter().map(|m| m.label.as_str()).collect();
        assert_eq!(labels, ["metal", "emissive"]);

        let fallback = materials_from_ids::<&str>(&[]);
        assert_eq!(fallback, vec![Material::glossy()]);
    }

    #[test]
    fn test_printable_palette() {
        let mut entry = BlockEntry::new("art", HueBlock::new([0u8, 0, 0]), Material::glossy());
        assert_eq!(printable_palette(std::slice::from_ref(&entry)).unwrap().len(), 1);

        entry.printable = false;
        assert!(matches!(
            printable_palette(&[entry]),
            Err(BlockArtError::NoPrintableBlocks)
        ));
    }

    #[test]
    fn test_sanitize_namespace() {
        assert_eq!(sanitize_namespace("My  Cool--Art!"), "my_cool_art");
        assert_eq!(sanitize_namespace("x"), DEFAULT_NAMESPACE);
        assert_eq!(sanitize_namespace("  "), DEFAULT_NAMESPACE);
    }
}
