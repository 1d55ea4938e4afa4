//! Placement command emission
//!
//! Commands are grouped into units, one per `(material label, axis)` pair,
//! and written into the [`Bundle`] as CRLF-joined `.mcfunction` files under
//! `functions/<functions namespace>/`. Units longer than the configured
//! line budget are split into numbered parts behind a parent unit.

use crate::axis::Axis;
use crate::block::{BlockEntry, BlockTexture, Candidate};
use crate::bundle::Bundle;
use crate::color::Color;
use crate::config::GenerationConfig;
use crate::error::{BlockArtError, Result};
use crate::frames::{fit_frame, limit_frames};
use crate::resolve::{BlockResolver, ResolverConfig};
use glam::IVec3;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{error, info, warn};

pub const LINE_ENDING: &str = "\r\n";

/// Placement of consecutive frames of a decoded print
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    /// Side by side, like a sprite sheet row
    E2e,
    /// Stacked back to back, one layer per frame
    #[default]
    B2b,
    /// Stacked, odd frames pushed one layer further
    Even,
    /// Stacked, even frames pushed one layer further
    Odd,
    /// Every frame in place
    None,
}

impl Alignment {
    /// Offset of frame `idx`
    ///
    /// Frame 0 sits at the origin, so every frame gets its own layer.
    pub fn offset(self, idx: u32, frame_width: u32) -> IVec3 {
        let idx = idx as i32;
        match self {
            Alignment::E2e => IVec3::new(idx * frame_width as i32, 0, 0),
            Alignment::B2b => IVec3::new(0, 0, idx),
            Alignment::Even => IVec3::new(0, 0, if idx % 2 == 0 { idx } else { idx + 1 }),
            Alignment::Odd => IVec3::new(0, 0, if idx % 2 == 1 { idx } else { idx + 1 }),
            Alignment::None => IVec3::ZERO,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Alignment::E2e => "e2e",
            Alignment::B2b => "b2b",
            Alignment::Even => "even",
            Alignment::Odd => "odd",
            Alignment::None => "none",
        }
    }
}

impl FromStr for Alignment {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "e2e" => Ok(Alignment::E2e),
            "b2b" => Ok(Alignment::B2b),
            "even" => Ok(Alignment::Even),
            "odd" => Ok(Alignment::Odd),
            "none" => Ok(Alignment::None),
            other => Err(format!("unknown alignment '{}'", other)),
        }
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One fill command placing `block` at `pos`, ordered for `axis`
pub fn write_fill(pos: IVec3, block: &str, axis: Axis) -> String {
    let IVec3 { x, y, z } = axis.orient(pos);
    format!("fill ~{x} ~{y} ~{z} ~{x} ~{y} ~{z} {block} 0 keep")
}

/// Split command lines into consecutive parts of at most `max_lines`
pub fn split_unit(lines: &[String], max_lines: usize) -> Vec<&[String]> {
    assert!(max_lines > 0, "line budget must be positive");
    lines.chunks(max_lines).collect()
}

/// A unit written for one `(label, axis)` pair
#[derive(Debug, Clone, PartialEq)]
pub struct PrintedUnit {
    pub label: String,
    pub axis: Axis,
    /// Function reference, `<functions namespace>/<path>`
    pub reference: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnitFailure {
    pub unit: String,
    pub reason: String,
}

/// Outcome of an emission pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmitReport {
    /// Top-level function references, in emission order
    pub units: Vec<String>,
    /// Units that exceeded the line budget and were split
    pub split_units: usize,
    pub failures: Vec<UnitFailure>,
}

/// Writes command units into a bundle
pub struct CommandEmitter<'a> {
    bundle: &'a mut Bundle,
    config: &'a GenerationConfig,
    resolver: ResolverConfig,
    report: EmitReport,
}

impl<'a> CommandEmitter<'a> {
    pub fn new(bundle: &'a mut Bundle, config: &'a GenerationConfig) -> Self {
        Self {
            bundle,
            config,
            resolver: config.resolver_config(),
            report: EmitReport::default(),
        }
    }

    pub fn report(&self) -> &EmitReport {
        &self.report
    }

    /// Place every positioned slice entry at its grid position, one unit per
    /// `(label, axis)`
    pub fn position_printer(&mut self, name: &str, entries: &[BlockEntry]) {
        for axis in Axis::ALL {
            let mut groups: Vec<(&str, Vec<String>)> = Vec::new();

            for entry in entries {
                let BlockTexture::Image(block) = entry.texture() else {
                    continue;
                };
                let fill_with = if block.is_transparent() {
                    self.config.transparent_block.as_str()
                } else {
                    entry.behavior_id()
                };
                let IVec3 { x, y, z } = block.orientation(axis);
                let line = format!(
                    "fill ~{x} ~{} ~{z} ~{x} ~{} ~{z} {fill_with} 0 keep",
                    -y, -y
                );

                let label = entry.material_label();
                match groups.iter_mut().find(|(l, _)| *l == label) {
                    Some((_, lines)) => lines.push(line),
                    None => groups.push((label, vec![line])),
                }
            }

            for (label, lines) in groups {
                let unit = format!("{}_{}_{}", name, label, axis);
                let reference = self.write_unit(None, &unit, &lines);
                self.register(reference);
            }
        }
    }

    /// Print decoded frames block by block
    ///
    /// Frames wider than `min(max_print_size, chunks * chunk_size)` are
    /// downscaled first and at most `max_frames` frames are printed. Only
    /// single-color entries take part. A frame that fails is logged and
    /// recorded; the remaining frames still print.
    pub fn pixel_printer(
        &mut self,
        name: &str,
        frames: &[RgbaImage],
        palette: &[&BlockEntry],
        chunks: u32,
        alignment: Alignment,
    ) {
        let size = self
            .config
            .max_print_size
            .min(chunks.max(1) * self.config.chunk_size);
        let frames = limit_frames(frames, self.config.max_frames);
        let multi = frames.len() > 1;

        let hues: Vec<&BlockEntry> = palette
            .iter()
            .copied()
            .filter(|e| matches!(e.texture(), BlockTexture::Hue(_)))
            .collect();
        if hues.is_empty() {
            warn!("No single-color blocks to print {} with", name);
        }

        let mut printed = Vec::new();
        for (idx, frame) in frames.iter().enumerate() {
            let frame = fit_frame(frame, size, u32::MAX);

            let (file_name, subdir) = if multi {
                (format!("{}_{:02}", name, idx), Some(name))
            } else {
                (name.to_string(), None)
            };
            let offset = alignment.offset(idx as u32, frame.width());

            match self.print_decoded(&file_name, &frame, &hues, offset, subdir) {
                Ok(units) => printed.extend(units),
                Err(err) => self.record_failure(&file_name, err),
            }
        }

        if !multi {
            for unit in printed {
                self.register(unit.reference);
            }
            return;
        }

        // One parent per (label, axis) listing that pair's frames in order
        let mut parents: Vec<(String, Vec<String>)> = Vec::new();
        for unit in printed {
            let key = format!("{}_{}", unit.label, unit.axis);
            let line = format!("function {}", unit.reference);
            match parents.iter_mut().find(|(k, _)| *k == key) {
                Some((_, lines)) => lines.push(line),
                None => parents.push((key, vec![line])),
            }
        }
        for (key, lines) in parents {
            let reference = self.write_unit(None, &format!("{}_{}", name, key), &lines);
            self.register(reference);
        }
    }

    /// Print one frame, a unit per material label and axis
    ///
    /// Each label prints with the entries of that label plus every
    /// translucent entry. Pixel coordinates are flipped on both axes so the
    /// print is not mirrored and starts at the top row.
    pub fn print_decoded(
        &mut self,
        file_name: &str,
        frame: &RgbaImage,
        palette: &[&BlockEntry],
        offset: IVec3,
        subdir: Option<&str>,
    ) -> Result<Vec<PrintedUnit>> {
        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 {
            return Err(BlockArtError::Emission {
                unit: file_name.to_string(),
                reason: "frame has no pixels".to_string(),
            });
        }

        let mut labels: Vec<&str> = Vec::new();
        for entry in palette {
            if !labels.contains(&entry.material_label()) {
                labels.push(entry.material_label());
            }
        }

        let resolver_config = self.resolver.clone();
        let mut units = Vec::with_capacity(labels.len() * Axis::ALL.len());

        for label in labels {
            let materials: Vec<&BlockEntry> = palette
                .iter()
                .copied()
                .filter(|e| e.translucent() || e.material_label() == label)
                .collect();
            let resolver = BlockResolver::new(&materials, &resolver_config);

            let placements: Vec<(IVec3, &str)> = frame
                .enumerate_pixels()
                .map(|(x, y, pixel)| {
                    let pos = IVec3::new(
                        (x as i32 + offset.x - width as i32).abs(),
                        (y as i32 + offset.y - height as i32).abs(),
                        offset.z,
                    );
                    (pos, resolver.resolve(Color::from(pixel)))
                })
                .collect();

            for axis in Axis::ALL {
                let lines: Vec<String> = placements
                    .iter()
                    .map(|(pos, block)| write_fill(*pos, block, axis))
                    .collect();
                let unit = format!("{}_{}_{}", file_name, label, axis);
                let reference = self.write_unit(subdir, &unit, &lines);
                units.push(PrintedUnit {
                    label: label.to_string(),
                    axis,
                    reference,
                });
            }
        }

        Ok(units)
    }

    /// Write the aggregate unit `<name>` and hand back the report
    pub fn finish(mut self, name: &str) -> EmitReport {
        let lines: Vec<String> = self
            .report
            .units
            .iter()
            .map(|reference| format!("function {}", reference))
            .collect();
        self.write_unit(None, name, &lines);

        info!(
            "Emitted {} unit(s), {} split, {} failed",
            self.report.units.len(),
            self.report.split_units,
            self.report.failures.len()
        );
        self.report
    }

    pub fn record_failure(&mut self, unit: &str, err: BlockArtError) {
        error!("Failed printing {}: {}", unit, err);
        self.report.failures.push(UnitFailure {
            unit: unit.to_string(),
            reason: err.to_string(),
        });
    }

    fn register(&mut self, reference: String) {
        if !self.report.units.contains(&reference) {
            self.report.units.push(reference);
        }
    }

    fn reference(&self, subdir: Option<&str>, unit: &str) -> String {
        match subdir {
            Some(dir) => format!("{}/{}/{}", self.config.functions_namespace, dir, unit),
            None => format!("{}/{}", self.config.functions_namespace, unit),
        }
    }

    /// Write a unit, splitting it when over budget; returns its reference
    fn write_unit(&mut self, subdir: Option<&str>, unit: &str, lines: &[String]) -> String {
        let reference = self.reference(subdir, unit);
        let path = format!("functions/{}.mcfunction", reference);
        let max_lines = self.config.max_function_lines;

        if lines.len() <= max_lines {
            self.bundle.insert_text(path, lines.join(LINE_ENDING));
            return reference;
        }

        let parts = split_unit(lines, max_lines);
        warn!(
            "Unit {} has {} lines, splitting into {} parts",
            unit,
            lines.len(),
            parts.len()
        );
        self.report.split_units += 1;

        let mut parent = Vec::with_capacity(parts.len());
        for (n, part) in parts.iter().enumerate() {
            let part_reference = format!("{}_{}", reference, n + 1);
            self.bundle.insert_text(
                format!("functions/{}.mcfunction", part_reference),
                part.join(LINE_ENDING),
            );
            parent.push(format!("function {}", part_reference));
        }
        self.bundle.insert_text(path, parent.join(LINE_ENDING));

        reference
    }
}
