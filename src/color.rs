//! Color Extraction - Dominant Palette Port
//!
//! The palette port may be backed by a network service or the built-in
//! quantizer. Whatever happens, the pipeline always ends up with exactly
//! five hex colors; extraction failure substitutes the fixed fallback.

use async_trait::async_trait;
use thiserror::Error;

use crate::ingest::PixelSurface;

/// Number of dominant colors in a palette.
pub const PALETTE_SIZE: usize = 5;

/// Grayscale ramp used when extraction fails. The first entry doubles as the
/// primary text color fallback.
pub const FALLBACK_PALETTE: [&str; PALETTE_SIZE] =
    ["#ffffff", "#cccccc", "#999999", "#666666", "#333333"];

/// Palette failures stay inside the color branch; the pipeline substitutes
/// the fallback instead of aborting.
#[derive(Debug, Error)]
#[error("palette extraction failed: {0}")]
pub struct PaletteFailure(pub String);

/// Narrow color contract: `k` dominant hex colors, most dominant first.
#[async_trait]
pub trait PaletteSource: Send + Sync {
    async fn extract_palette(
        &self,
        surface: &PixelSurface,
        k: usize,
    ) -> Result<Vec<String>, PaletteFailure>;
}

/// In-process palette extraction by frequency-counting 4-bit RGB buckets and
/// averaging the pixels in the top `k`.
pub struct QuantizingPalette;

#[async_trait]
impl PaletteSource for QuantizingPalette {
    async fn extract_palette(
        &self,
        surface: &PixelSurface,
        k: usize,
    ) -> Result<Vec<String>, PaletteFailure> {
        let pixels = surface.pixels();
        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(PaletteFailure("empty image".into()));
        }

        // bucket key -> (count, r sum, g sum, b sum)
        let mut buckets: std::collections::HashMap<u16, (u64, u64, u64, u64)> =
            std::collections::HashMap::new();
        for p in pixels.pixels() {
            let [r, g, b, a] = p.0;
            if a < 128 {
                continue;
            }
            let key = ((r as u16 >> 4) << 8) | ((g as u16 >> 4) << 4) | (b as u16 >> 4);
            let entry = buckets.entry(key).or_default();
            entry.0 += 1;
            entry.1 += r as u64;
            entry.2 += g as u64;
            entry.3 += b as u64;
        }
        if buckets.is_empty() {
            return Err(PaletteFailure("no opaque pixels".into()));
        }

        let mut ranked: Vec<_> = buckets.into_iter().collect();
        // Stable order for equal counts to keep the palette deterministic.
        ranked.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then(a.0.cmp(&b.0)));

        let mut palette: Vec<String> = ranked
            .iter()
            .take(k)
            .map(|(_, (count, r, g, b))| {
                format!("#{:02x}{:02x}{:02x}", r / count, g / count, b / count)
            })
            .collect();
        // Fewer distinct buckets than k: pad by repeating the dominant color.
        while palette.len() < k {
            let first = palette[0].clone();
            palette.push(first);
        }
        Ok(palette)
    }
}

/// Run the palette port; on any failure, or a result of the wrong length,
/// substitute the fixed fallback. Always returns exactly [`PALETTE_SIZE`]
/// entries.
pub async fn extract_palette(source: &dyn PaletteSource, surface: &PixelSurface) -> Vec<String> {
    match source.extract_palette(surface, PALETTE_SIZE).await {
        Ok(colors) if colors.len() == PALETTE_SIZE => colors,
        Ok(colors) => {
            tracing::warn!(
                got = colors.len(),
                expected = PALETTE_SIZE,
                "palette source returned wrong length, using fallback"
            );
            FALLBACK_PALETTE.iter().map(|c| c.to_string()).collect()
        }
        Err(err) => {
            tracing::warn!(%err, "palette extraction failed, using fallback");
            FALLBACK_PALETTE.iter().map(|c| c.to_string()).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn solid_surface(r: u8, g: u8, b: u8) -> PixelSurface {
        let img = RgbaImage::from_pixel(8, 8, Rgba([r, g, b, 255]));
        PixelSurface::from_image(image::DynamicImage::ImageRgba8(img))
    }

    struct FailingSource;

    #[async_trait]
    impl PaletteSource for FailingSource {
        async fn extract_palette(
            &self,
            _surface: &PixelSurface,
            _k: usize,
        ) -> Result<Vec<String>, PaletteFailure> {
            Err(PaletteFailure("service unavailable".into()))
        }
    }

    struct ShortSource;

    #[async_trait]
    impl PaletteSource for ShortSource {
        async fn extract_palette(
            &self,
            _surface: &PixelSurface,
            _k: usize,
        ) -> Result<Vec<String>, PaletteFailure> {
            Ok(vec!["#123456".to_string()])
        }
    }

    #[tokio::test]
    async fn test_failure_substitutes_fallback() {
        let surface = solid_surface(10, 20, 30);
        let palette = extract_palette(&FailingSource, &surface).await;
        assert_eq!(palette, FALLBACK_PALETTE.to_vec());
    }

    #[tokio::test]
    async fn test_wrong_length_substitutes_fallback() {
        let surface = solid_surface(10, 20, 30);
        let palette = extract_palette(&ShortSource, &surface).await;
        assert_eq!(palette.len(), PALETTE_SIZE);
        assert_eq!(palette, FALLBACK_PALETTE.to_vec());
    }

    #[tokio::test]
    async fn test_quantizer_always_returns_five() {
        let surface = solid_surface(200, 100, 50);
        let palette = extract_palette(&QuantizingPalette, &surface).await;
        assert_eq!(palette.len(), PALETTE_SIZE);
        assert_eq!(palette[0], "#c86432");
    }

    #[tokio::test]
    async fn test_quantizer_dominant_color_first() {
        let mut img = RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255]));
        // A minority of blue pixels.
        for x in 0..3 {
            img.put_pixel(x, 0, Rgba([0, 0, 255, 255]));
        }
        let surface = PixelSurface::from_image(image::DynamicImage::ImageRgba8(img));
        let palette = extract_palette(&QuantizingPalette, &surface).await;
        assert_eq!(palette[0], "#ff0000");
    }
}
