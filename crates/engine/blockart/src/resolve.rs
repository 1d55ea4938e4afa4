//! Pixel color to block identifier resolution
//!
//! Resolution order, first match wins:
//! 1. the transparent block when the pixel alpha is below the threshold
//! 2. a candidate whose reference color fuzzy-equals the pixel
//! 3. the nearest eligible candidate by RGB distance, or the fallback block

use crate::block::Candidate;
use crate::color::{distance, fuzzy_equals, Color, Tolerance, EXACT_MATCH_TOLERANCE};
use crate::config::{
    DEFAULT_PRINT_BLOCK, TRANSPARENT_PRINT_BLOCK, TRANSPARENT_PRINT_BLOCK_THRESHOLD,
};

/// Fixed inputs of a resolver
#[derive(Debug, Clone, PartialEq)]
pub struct ResolverConfig {
    pub exact_tolerance: Tolerance,
    /// Fraction of full alpha
    pub transparent_threshold: f32,
    pub transparent_block: String,
    pub fallback_block: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            exact_tolerance: EXACT_MATCH_TOLERANCE,
            transparent_threshold: TRANSPARENT_PRINT_BLOCK_THRESHOLD,
            transparent_block: TRANSPARENT_PRINT_BLOCK.to_string(),
            fallback_block: DEFAULT_PRINT_BLOCK.to_string(),
        }
    }
}

/// Resolves colors against an ordered candidate list
pub struct BlockResolver<'a, C> {
    candidates: &'a [C],
    config: &'a ResolverConfig,
}

impl<'a, C: Candidate> BlockResolver<'a, C> {
    pub fn new(candidates: &'a [C], config: &'a ResolverConfig) -> Self {
        Self { candidates, config }
    }

    /// Identifier of the block a pixel of `color` becomes
    ///
    /// A pixel below the transparency threshold never reaches a candidate,
    /// not even one matching its color exactly.
    pub fn resolve(&self, color: Color) -> &'a str {
        if self.is_below_threshold(color) {
            return &self.config.transparent_block;
        }

        if let Some(exact) = self.exact(color) {
            return exact.identifier();
        }

        match self.nearest(color) {
            Some(candidate) => candidate.identifier(),
            None => &self.config.fallback_block,
        }
    }

    /// First non-transparent candidate within the exact-match tolerance
    pub fn exact(&self, color: Color) -> Option<&'a C> {
        self.candidates.iter().find(|c| {
            !c.is_transparent()
                && fuzzy_equals(color, c.reference_color(), self.config.exact_tolerance)
        })
    }

    /// Closest candidate sharing the pixel's translucency
    ///
    /// Opaque pixels consider only opaque candidates, anything else only
    /// translucent ones. Ties keep the earlier candidate.
    pub fn nearest(&self, color: Color) -> Option<&'a C> {
        let opaque = color.alpha() == 255;

        self.candidates
            .iter()
            .filter(|c| c.is_translucent() != opaque)
            .fold(None, |best: Option<(f32, &'a C)>, candidate| {
                let d = distance(color, candidate.reference_color());
                match best {
                    Some((best_d, _)) if best_d <= d => best,
                    _ => Some((d, candidate)),
                }
            })
            .map(|(_, candidate)| candidate)
    }

    fn is_below_threshold(&self, color: Color) -> bool {
        (color.alpha() as f32) < self.config.transparent_threshold * 255.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Swatch {
        id: &'static str,
        color: Color,
    }

    impl Candidate for Swatch {
        fn identifier(&self) -> &str {
            self.id
        }
        fn reference_color(&self) -> Color {
            self.color
        }
        fn material_label(&self) -> &str {
            "test"
        }
        fn is_translucent(&self) -> bool {
            self.color.alpha() != 255
        }
        fn is_transparent(&self) -> bool {
            self.color.alpha() < 128
        }
    }

    fn swatch(id: &'static str, c: [u8; 4]) -> Swatch {
        Swatch { id, color: Color(c) }
    }

    #[test]
    fn test_exact_match_wins() {
        let palette = [
            swatch("red", [250, 0, 0, 255]),
            swatch("red2", [255, 0, 0, 255]),
        ];
        let config = ResolverConfig::default();
        let resolver = BlockResolver::new(&palette, &config);
        assert_eq!(resolver.resolve(Color::rgb(255, 0, 0)), "red");
    }

    #[test]
    fn test_transparent_pixel_resolves_to_air() {
        let palette = [swatch("blue", [0, 0, 255, 255])];
        let config = ResolverConfig::default();
        let resolver = BlockResolver::new(&palette, &config);
        assert_eq!(resolver.resolve(Color::rgba(0, 0, 255, 0)), "minecraft:air");
        assert_eq!(resolver.resolve(Color::rgba(0, 0, 255, 127)), "minecraft:air");
    }

    #[test]
    fn test_transparent_pixel_ignores_exact_candidate_when_alpha_differs() {
        // The alpha tolerance keeps an opaque candidate from matching a clear pixel
        let palette = [swatch("white", [255, 255, 255, 255])];
        let config = ResolverConfig::default();
        let resolver = BlockResolver::new(&palette, &config);
        assert_eq!(resolver.resolve(Color::rgba(255, 255, 255, 10)), "minecraft:air");
    }

    #[test]
    fn test_transparent_pixel_beats_identical_candidate() {
        let palette = [
            swatch("ghost", [0, 0, 0, 0]),
            swatch("faint", [255, 0, 0, 40]),
        ];
        let config = ResolverConfig::default();
        let resolver = BlockResolver::new(&palette, &config);
        assert_eq!(resolver.resolve(Color::rgba(0, 0, 0, 0)), "minecraft:air");
        assert_eq!(resolver.resolve(Color::rgba(255, 0, 0, 40)), "minecraft:air");
    }

    #[test]
    fn test_pixel_below_threshold_skips_close_candidate() {
        // 129 is the lowest alpha palette extraction keeps, 127 is below 127.5
        let palette = [swatch("barely", [10, 20, 30, 129])];
        let config = ResolverConfig::default();
        let resolver = BlockResolver::new(&palette, &config);

        assert!(resolver.exact(Color::rgba(10, 20, 30, 127)).is_some());
        assert_eq!(resolver.resolve(Color::rgba(10, 20, 30, 127)), "minecraft:air");
        assert_eq!(resolver.resolve(Color::rgba(10, 20, 30, 129)), "barely");
    }

    #[test]
    fn test_nearest_tie_keeps_first() {
        let palette = [
            swatch("low", [90, 100, 100, 255]),
            swatch("high", [110, 100, 100, 255]),
        ];
        let config = ResolverConfig {
            exact_tolerance: Tolerance([0.0; 4]),
            ..Default::default()
        };
        let resolver = BlockResolver::new(&palette, &config);
        assert_eq!(resolver.resolve(Color::rgb(100, 100, 100)), "low");
    }

    #[test]
    fn test_nearest_uses_all_rgb_channels() {
        let palette = [
            swatch("same_rg", [10, 10, 250, 255]),
            swatch("close", [20, 20, 20, 255]),
        ];
        let config = ResolverConfig {
            exact_tolerance: Tolerance([0.0; 4]),
            ..Default::default()
        };
        let resolver = BlockResolver::new(&palette, &config);
        assert_eq!(resolver.resolve(Color::rgb(10, 10, 10)), "close");
    }

    #[test]
    fn test_translucent_pixel_prefers_translucent_candidates() {
        let palette = [
            swatch("solid", [200, 200, 200, 255]),
            swatch("glass", [0, 0, 0, 200]),
        ];
        let config = ResolverConfig::default();
        let resolver = BlockResolver::new(&palette, &config);
        assert_eq!(resolver.resolve(Color::rgba(200, 200, 200, 200)), "glass");
    }

    #[test]
    fn test_fallback_when_nothing_eligible() {
        let palette = [swatch("glass", [0, 0, 0, 200])];
        let config = ResolverConfig::default();
        let resolver = BlockResolver::new(&palette, &config);
        assert_eq!(resolver.resolve(Color::rgb(250, 250, 250)), "minecraft:stone");

        let empty: [Swatch; 0] = [];
        let resolver = BlockResolver::new(&empty, &config);
        assert_eq!(resolver.resolve(Color::rgb(1, 2, 3)), "minecraft:stone");
    }
}
