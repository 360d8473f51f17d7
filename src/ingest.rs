//! Image Ingestion - Decoded Pixel Surfaces
//!
//! Every pipeline branch works from its own decoded copy; nothing here is
//! shared or mutated after construction.

use image::{DynamicImage, GrayImage, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::pipeline::PipelineError;

/// Axis-aligned rectangle in image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// A decoded source image plus its dimensions.
#[derive(Debug, Clone)]
pub struct PixelSurface {
    pixels: RgbaImage,
}

impl PixelSurface {
    /// Decode raw image bytes (PNG/JPEG/…) into an addressable surface.
    ///
    /// Decode failures are fatal for the whole pipeline.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PipelineError> {
        let decoded = image::load_from_memory(bytes).map_err(PipelineError::ImageLoad)?;
        Ok(Self::from_image(decoded))
    }

    pub fn from_image(image: DynamicImage) -> Self {
        Self { pixels: image.to_rgba8() }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Grayscale view of the surface (Rec. 601 luma, as `image` computes it).
    pub fn to_grayscale(&self) -> GrayImage {
        image::imageops::grayscale(&self.pixels)
    }

    /// Inverse binary threshold: luma at or below `cutoff` becomes foreground
    /// (255), anything brighter becomes background (0). This isolates printed
    /// UI elements and text blocks against a photographic background.
    pub fn threshold_inverse(&self, cutoff: u8) -> GrayImage {
        let gray = self.to_grayscale();
        let mut out = GrayImage::new(gray.width(), gray.height());
        for (src, dst) in gray.pixels().zip(out.pixels_mut()) {
            dst.0[0] = if src.0[0] <= cutoff { 255 } else { 0 };
        }
        out
    }
}
