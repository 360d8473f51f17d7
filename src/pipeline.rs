//! Analysis Pipeline - Single Entry Point
//!
//! Sequences layout analysis, text extraction, and color extraction as a
//! three-branch fork/join, then synthesizes the template. Recoverable branch
//! errors (OCR, palette) never reach the join point; only fatal errors
//! terminate the run.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::color::{extract_palette, PaletteSource, QuantizingPalette};
use crate::ingest::PixelSurface;
use crate::layout::{self, LayoutAnalysis};
use crate::rewrite::rewrite_lines;
use crate::shapes::detect_banners;
use crate::template::{synthesize, BrandAssets, ContentOverrides, SynthesisInputs, Template};
use crate::text::{extract_text, DisabledOcr, OcrEngine};

/// The one failure message shown to end users, whatever went wrong.
pub const USER_FACING_FAILURE: &str =
    "Failed to analyze the competitor post. Please try again with a different image.";

/// Fatal pipeline errors. Branch-local OCR/palette failures are converted to
/// defaults before they get here.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Image load failed: {0}")]
    ImageLoad(#[source] image::ImageError),

    #[error("Render context unavailable: {0}")]
    RenderContext(String),

    #[error("Synthesis failed: {0}")]
    Synthesis(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Template version {0} requires engine >= {1}, current is {2}")]
    EngineVersionMismatch(String, String, String),
}

impl PipelineError {
    /// Human-readable message safe to surface to end users.
    pub fn user_message(&self) -> &'static str {
        USER_FACING_FAILURE
    }
}

/// JSON payload for one analysis run (CLI bridge format).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub brand: BrandAssets,
    #[serde(default)]
    pub content: ContentOverrides,
    /// Base64-encoded source image, used when no file path is given.
    #[serde(default)]
    pub image_base64: Option<String>,
    #[serde(default)]
    pub cover_image_url: Option<String>,
}

/// The analysis pipeline. Holds the OCR and palette ports; everything else
/// is per-invocation state, so concurrent runs are fully independent.
pub struct AnalysisPipeline {
    ocr: Arc<dyn OcrEngine>,
    palette: Arc<dyn PaletteSource>,
}

impl AnalysisPipeline {
    pub fn new(ocr: Arc<dyn OcrEngine>, palette: Arc<dyn PaletteSource>) -> Self {
        Self { ocr, palette }
    }

    /// Pipeline with the built-in ports: no OCR (content falls back to
    /// defaults) and the in-process palette quantizer.
    pub fn with_builtin_ports() -> Self {
        Self::new(Arc::new(DisabledOcr), Arc::new(QuantizingPalette))
    }

    /// Analyze a competitor post screenshot and synthesize a reusable
    /// template.
    ///
    /// Layout, text, and color branches run concurrently, each on its own
    /// decoded copy of the image; the join waits for all three before
    /// synthesis.
    pub async fn analyze_and_synthesize(
        &self,
        image_bytes: &[u8],
        brand: &BrandAssets,
        overrides: Option<&ContentOverrides>,
        cover_image_url: Option<String>,
    ) -> Result<Template, PipelineError> {
        let surface = PixelSurface::from_bytes(image_bytes)?;
        tracing::debug!(width = surface.width(), height = surface.height(), "image decoded");

        let layout_surface = surface.clone();
        let layout_task = tokio::task::spawn_blocking(move || layout::analyze(&layout_surface));

        let text_surface = surface.clone();
        let color_surface = surface;

        let (layout_joined, lines, palette) = tokio::join!(
            layout_task,
            extract_text(self.ocr.as_ref(), &text_surface),
            extract_palette(self.palette.as_ref(), &color_surface),
        );
        let analysis: LayoutAnalysis = layout_joined
            .map_err(|e| PipelineError::RenderContext(format!("layout branch failed: {e}")))?;

        let banners = detect_banners(&analysis.regions);
        let rewritten = rewrite_lines(&lines, &brand.name);

        let default_overrides = ContentOverrides::default();
        synthesize(SynthesisInputs {
            regions: &analysis.regions,
            banners: &banners,
            palette: &palette,
            lines: &rewritten,
            brand,
            overrides: overrides.unwrap_or(&default_overrides),
            cover_image_url,
        })
    }
}

impl Default for AnalysisPipeline {
    fn default() -> Self {
        Self::with_builtin_ports()
    }
}
