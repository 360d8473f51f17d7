//! Text Extraction - OCR Port and Font Approximation
//!
//! OCR runs over the whole image, independently of layout analysis. Font
//! style is approximated from text shape alone; no glyph measurement.
//!
//! Note: `sequence_id` is assigned purely by OCR reading order and is later
//! mapped positionally onto content roles. On inputs with an unusual reading
//! order this can mis-assign text to roles; the behavior is intentional.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ingest::PixelSurface;

/// Display typeface used for shouted, all-caps lines.
const DISPLAY_FONT: &str = "Raleway";
/// Typeface for everything else.
const BODY_FONT: &str = "Open Sans";

/// Line length above which text is treated as running body copy.
const LONG_LINE_LEN: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FontSize {
    #[serde(rename = "lg")]
    Lg,
    #[serde(rename = "2xl")]
    TwoXl,
    #[serde(rename = "5xl")]
    FiveXl,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontStyle {
    pub family: String,
    pub weight: String,
    pub size: FontSize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextLine {
    pub text: String,
    /// 0-based index in OCR reading order.
    pub sequence_id: u32,
    pub font_style: FontStyle,
}

/// OCR failures stay inside the text branch; the pipeline degrades to an
/// empty line list instead of aborting.
#[derive(Debug, Error)]
#[error("OCR failed: {0}")]
pub struct OcrFailure(pub String);

/// Narrow OCR contract: recognize line-delimited text in an image. Any
/// implementation (native library, network service, in-process model) is
/// substitutable.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn recognize(&self, surface: &PixelSurface) -> Result<String, OcrFailure>;
}

/// No-op OCR engine. Recognizes nothing, so every downstream content field
/// falls back to its default.
pub struct DisabledOcr;

#[async_trait]
impl OcrEngine for DisabledOcr {
    async fn recognize(&self, _surface: &PixelSurface) -> Result<String, OcrFailure> {
        Ok(String::new())
    }
}

/// Approximate a font style from text content only.
///
/// All-caps lines read as display headlines; long lines read as body copy;
/// everything else is a medium-weight label.
pub fn approximate_font_style(line: &str) -> FontStyle {
    if !line.is_empty() && line == line.to_uppercase() {
        FontStyle {
            family: DISPLAY_FONT.to_string(),
            weight: "800".to_string(),
            size: FontSize::FiveXl,
        }
    } else if line.chars().count() > LONG_LINE_LEN {
        FontStyle {
            family: BODY_FONT.to_string(),
            weight: "400".to_string(),
            size: FontSize::TwoXl,
        }
    } else {
        FontStyle {
            family: BODY_FONT.to_string(),
            weight: "600".to_string(),
            size: FontSize::Lg,
        }
    }
}

/// Split raw OCR output into non-blank lines in reading order, each with a
/// sequence id and an approximated font style.
pub fn lines_from_raw(raw: &str) -> Vec<TextLine> {
    raw.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .enumerate()
        .map(|(i, line)| TextLine {
            text: line.to_string(),
            sequence_id: i as u32,
            font_style: approximate_font_style(line),
        })
        .collect()
}

/// Run the OCR port over the whole image. Engine errors are caught here and
/// degrade to an empty line list.
pub async fn extract_text(engine: &dyn OcrEngine, surface: &PixelSurface) -> Vec<TextLine> {
    match engine.recognize(surface).await {
        Ok(raw) => lines_from_raw(&raw),
        Err(err) => {
            tracing::warn!(%err, "OCR failed, continuing with no text");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_caps_is_display_style() {
        let style = approximate_font_style("50% OFF SALE");
        assert_eq!(style.family, DISPLAY_FONT);
        assert_eq!(style.weight, "800");
        assert_eq!(style.size, FontSize::FiveXl);
    }

    #[test]
    fn test_long_line_is_body_style() {
        let style =
            approximate_font_style("This is a fairly long descriptive sentence about a product.");
        assert_eq!(style.family, BODY_FONT);
        assert_eq!(style.weight, "400");
        assert_eq!(style.size, FontSize::TwoXl);
    }

    #[test]
    fn test_short_mixed_case_is_label_style() {
        let style = approximate_font_style("Shop now");
        assert_eq!(style.weight, "600");
        assert_eq!(style.size, FontSize::Lg);
    }

    #[test]
    fn test_lines_from_raw_skips_blanks_and_orders() {
        let lines = lines_from_raw("HEADLINE\n\n  Body line here  \n\nFooter");
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].text, "HEADLINE");
        assert_eq!(lines[0].sequence_id, 0);
        assert_eq!(lines[1].text, "Body line here");
        assert_eq!(lines[1].sequence_id, 1);
        assert_eq!(lines[2].sequence_id, 2);
    }

    #[test]
    fn test_size_serializes_to_tailwind_names() {
        assert_eq!(serde_json::to_string(&FontSize::FiveXl).unwrap(), "\"5xl\"");
        assert_eq!(serde_json::to_string(&FontSize::TwoXl).unwrap(), "\"2xl\"");
        assert_eq!(serde_json::to_string(&FontSize::Lg).unwrap(), "\"lg\"");
    }

    struct FailingOcr;

    #[async_trait]
    impl OcrEngine for FailingOcr {
        async fn recognize(&self, _surface: &PixelSurface) -> Result<String, OcrFailure> {
            Err(OcrFailure("engine crashed".into()))
        }
    }

    #[tokio::test]
    async fn test_ocr_failure_degrades_to_empty() {
        let surface = PixelSurface::from_image(image::DynamicImage::new_rgba8(2, 2));
        let lines = extract_text(&FailingOcr, &surface).await;
        assert!(lines.is_empty());
    }
}
