//! Postloom Core - Competitor Post Analysis & Template Re-Synthesis
//!
//! Given a screenshot of a competitor's social post, the pipeline detects
//! the visual layout (header/footer/CTA/logo/product regions), extracts and
//! rebrands the text, pulls a dominant color palette, and fuses everything
//! into a serializable [`template::Template`] with a deterministic rendering
//! contract.
//!
//! # Guarantees
//! 1. Templates are plain data; rendering is a pure function.
//! 2. Region classification is a pure function of geometry.
//! 3. Recoverable branch failures (OCR, palette) degrade to defaults.
//! 4. Fatal failures abort the run; no partial template is returned.

pub mod color;
pub mod hashing;
pub mod ingest;
pub mod layout;
pub mod pipeline;
pub mod render;
pub mod rewrite;
pub mod shapes;
pub mod store;
pub mod template;
pub mod text;

pub use color::{PaletteSource, QuantizingPalette, FALLBACK_PALETTE, PALETTE_SIZE};
pub use ingest::{PixelSurface, Rect};
pub use layout::{LayoutAnalysis, Region, RegionKind, Role};
pub use pipeline::{AnalysisPipeline, AnalyzeRequest, PipelineError, USER_FACING_FAILURE};
pub use render::{render_slide, render_template_slide, VisualNode, VisualTree};
pub use shapes::Banner;
pub use store::TemplateStore;
pub use template::{BrandAssets, ContentAssets, ContentOverrides, Slide, Template};
pub use text::{FontStyle, OcrEngine, TextLine};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const TEMPLATE_SCHEMA_VERSION: &str = "1.0.0";
