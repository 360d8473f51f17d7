//! Template Synthesis - Fusing Analysis into a Reusable Contract
//!
//! Templates are plain immutable data. Rendering lives in [`crate::render`];
//! serializing a template to JSON is the only persisted artifact the core
//! produces.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::color::PALETTE_SIZE;
use crate::hashing::compute_fingerprint;
use crate::ingest::Rect;
use crate::layout::{Region, Role};
use crate::pipeline::PipelineError;
use crate::shapes::Banner;
use crate::text::TextLine;
use crate::{ENGINE_VERSION, TEMPLATE_SCHEMA_VERSION};

pub const DEFAULT_TITLE: &str = "Your Headline Here";
pub const DEFAULT_BODY: &str = "Tell your audience what makes you different.";
pub const DEFAULT_CTA_TEXT: &str = "Shop Now";
pub const DEFAULT_FOOTER: &str = "@yourbrand";

/// Fallback rectangle for a role the layout analysis did not detect.
pub const fn default_role_rect(role: Role) -> Rect {
    match role {
        Role::Logo => Rect { x: 50, y: 50, width: 150, height: 60 },
        Role::Header => Rect { x: 300, y: 50, width: 500, height: 100 },
        Role::Body => Rect { x: 340, y: 400, width: 400, height: 200 },
        Role::Cta => Rect { x: 800, y: 900, width: 200, height: 80 },
        Role::Footer => Rect { x: 50, y: 900, width: 200, height: 80 },
        Role::Product => Rect { x: 340, y: 200, width: 400, height: 400 },
    }
}

/// Fallback rectangles for all six roles.
pub const DEFAULT_ROLE_RECTS: [(Role, Rect); 6] = [
    (Role::Logo, default_role_rect(Role::Logo)),
    (Role::Header, default_role_rect(Role::Header)),
    (Role::Body, default_role_rect(Role::Body)),
    (Role::Cta, default_role_rect(Role::Cta)),
    (Role::Footer, default_role_rect(Role::Footer)),
    (Role::Product, default_role_rect(Role::Product)),
];

/// Caller-supplied brand identity, immutable per run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandAssets {
    pub logo_url: String,
    pub primary_color: String,
    pub font: String,
    pub name: String,
}

/// Content slots for one slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentAssets {
    pub title: String,
    pub body: String,
    pub cta_text: String,
    pub cta_url: String,
    pub footer: String,
    #[serde(default)]
    pub product_image: Option<String>,
}

/// Optional caller overrides, applied before OCR-derived text and defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentOverrides {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub cta_text: Option<String>,
    #[serde(default)]
    pub cta_url: Option<String>,
    #[serde(default)]
    pub footer: Option<String>,
    #[serde(default)]
    pub product_image: Option<String>,
}

/// One instantiation of a template's content.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slide {
    pub slide_number: u32,
    pub content: ContentAssets,
}

/// Role → rectangle map resolved from detected regions plus defaults.
/// Every role always has a rectangle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedPositions(HashMap<Role, Rect>);

impl ResolvedPositions {
    /// Use the first detected region carrying each role; fall back to the
    /// fixed default rectangle otherwise.
    pub fn resolve(regions: &[Region]) -> Self {
        let mut map = HashMap::with_capacity(DEFAULT_ROLE_RECTS.len());
        for (role, default_rect) in DEFAULT_ROLE_RECTS {
            let rect = regions
                .iter()
                .find(|r| r.role_id == role)
                .map(|r| r.coordinates)
                .unwrap_or(default_rect);
            map.insert(role, rect);
        }
        Self(map)
    }

    /// Rectangle for a role. Stored templates deserialize without
    /// completeness validation, so absent roles fall back to their default
    /// rectangle instead of panicking.
    pub fn rect(&self, role: Role) -> Rect {
        self.0.get(&role).copied().unwrap_or_else(|| default_role_rect(role))
    }
}

/// Serializable template: resolved positions, rewritten content, palette,
/// and brand identity. The rendering contract is reconstructed from this
/// data by [`crate::render::render_slide`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: String,
    pub name: String,
    pub template_version: String,
    pub engine_min_version: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub cover_image_url: Option<String>,
    pub brand: BrandAssets,
    pub palette: Vec<String>,
    pub positions: ResolvedPositions,
    pub banners: Vec<Banner>,
    pub slides: Vec<Slide>,
    /// SHA-256 over the canonical JSON of everything above.
    pub fingerprint: String,
}

fn text_for_sequence(lines: &[TextLine], sequence_id: u32) -> Option<String> {
    lines
        .iter()
        .find(|l| l.sequence_id == sequence_id)
        .map(|l| l.text.clone())
}

/// Fuse rewritten text, caller overrides, and defaults into content slots.
/// Precedence per slot: override, then OCR-derived line, then default.
pub fn fuse_content(lines: &[TextLine], overrides: &ContentOverrides) -> ContentAssets {
    ContentAssets {
        title: overrides
            .title
            .clone()
            .or_else(|| text_for_sequence(lines, 0))
            .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        body: overrides
            .body
            .clone()
            .or_else(|| text_for_sequence(lines, 1))
            .unwrap_or_else(|| DEFAULT_BODY.to_string()),
        cta_text: overrides
            .cta_text
            .clone()
            .or_else(|| text_for_sequence(lines, 2))
            .unwrap_or_else(|| DEFAULT_CTA_TEXT.to_string()),
        cta_url: overrides.cta_url.clone().unwrap_or_default(),
        footer: overrides
            .footer
            .clone()
            .or_else(|| text_for_sequence(lines, 3))
            .unwrap_or_else(|| DEFAULT_FOOTER.to_string()),
        product_image: overrides.product_image.clone(),
    }
}

/// Inputs for one synthesis run.
#[derive(Debug, Clone)]
pub struct SynthesisInputs<'a> {
    pub regions: &'a [Region],
    pub banners: &'a [Banner],
    pub palette: &'a [String],
    pub lines: &'a [TextLine],
    pub brand: &'a BrandAssets,
    pub overrides: &'a ContentOverrides,
    pub cover_image_url: Option<String>,
}

/// Build the final template. Missing mandatory inputs (empty palette, blank
/// brand name) are fatal; every other gap is filled by defaults.
pub fn synthesize(inputs: SynthesisInputs<'_>) -> Result<Template, PipelineError> {
    if inputs.brand.name.trim().is_empty() {
        return Err(PipelineError::Synthesis("brand name is required".into()));
    }
    if inputs.palette.len() != PALETTE_SIZE {
        return Err(PipelineError::Synthesis(format!(
            "palette must have exactly {PALETTE_SIZE} colors, got {}",
            inputs.palette.len()
        )));
    }

    let positions = ResolvedPositions::resolve(inputs.regions);
    let content = fuse_content(inputs.lines, inputs.overrides);

    let mut template = Template {
        id: Uuid::new_v4().to_string(),
        name: format!("Recreated Competitor Template - {}", inputs.brand.name),
        template_version: TEMPLATE_SCHEMA_VERSION.to_string(),
        engine_min_version: ENGINE_VERSION.to_string(),
        created_at: Utc::now(),
        cover_image_url: inputs.cover_image_url,
        brand: inputs.brand.clone(),
        palette: inputs.palette.to_vec(),
        positions,
        banners: inputs.banners.to_vec(),
        slides: vec![Slide { slide_number: 1, content }],
        fingerprint: String::new(),
    };
    template.fingerprint = compute_fingerprint(&template)?;

    tracing::debug!(id = %template.id, fingerprint = %template.fingerprint, "template synthesized");
    Ok(template)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::RegionKind;
    use crate::text::lines_from_raw;

    fn brand() -> BrandAssets {
        BrandAssets {
            logo_url: "https://cdn.example.com/logo.png".into(),
            primary_color: "#ff6600".into(),
            font: "Raleway".into(),
            name: "Acme".into(),
        }
    }

    fn palette() -> Vec<String> {
        crate::color::FALLBACK_PALETTE.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_empty_regions_resolve_to_defaults_verbatim() {
        let positions = ResolvedPositions::resolve(&[]);
        for (role, rect) in DEFAULT_ROLE_RECTS {
            assert_eq!(positions.rect(role), rect, "default rect for {role:?}");
        }
    }

    #[test]
    fn test_detected_region_overrides_default() {
        let detected = Region {
            kind: RegionKind::Text,
            coordinates: Rect::new(12, 8, 700, 90),
            role_id: Role::Header,
        };
        let positions = ResolvedPositions::resolve(&[detected]);
        assert_eq!(positions.rect(Role::Header), Rect::new(12, 8, 700, 90));
        // Other roles still fall back.
        assert_eq!(positions.rect(Role::Logo), Rect::new(50, 50, 150, 60));
    }

    #[test]
    fn test_first_region_wins_for_duplicate_roles() {
        let mk = |x| Region {
            kind: RegionKind::Text,
            coordinates: Rect::new(x, 10, 400, 80),
            role_id: Role::Header,
        };
        let positions = ResolvedPositions::resolve(&[mk(10), mk(600)]);
        assert_eq!(positions.rect(Role::Header).x, 10);
    }

    #[test]
    fn test_fuse_content_maps_sequence_ids() {
        let lines = lines_from_raw("BIG SALE\nEverything must go\nShop today\nterms apply");
        let content = fuse_content(&lines, &ContentOverrides::default());
        assert_eq!(content.title, "BIG SALE");
        assert_eq!(content.body, "Everything must go");
        assert_eq!(content.cta_text, "Shop today");
        assert_eq!(content.footer, "terms apply");
    }

    #[test]
    fn test_fuse_content_defaults_for_missing_lines() {
        let lines = lines_from_raw("ONLY A TITLE");
        let content = fuse_content(&lines, &ContentOverrides::default());
        assert_eq!(content.title, "ONLY A TITLE");
        assert_eq!(content.body, DEFAULT_BODY);
        assert_eq!(content.cta_text, DEFAULT_CTA_TEXT);
        assert_eq!(content.footer, DEFAULT_FOOTER);
        assert_eq!(content.product_image, None);
    }

    #[test]
    fn test_overrides_beat_ocr_text() {
        let lines = lines_from_raw("OCR TITLE");
        let overrides = ContentOverrides {
            title: Some("Caller Title".into()),
            cta_url: Some("https://acme.example/shop".into()),
            product_image: Some("https://cdn.example.com/p.png".into()),
            ..Default::default()
        };
        let content = fuse_content(&lines, &overrides);
        assert_eq!(content.title, "Caller Title");
        assert_eq!(content.cta_url, "https://acme.example/shop");
        assert_eq!(content.product_image.as_deref(), Some("https://cdn.example.com/p.png"));
    }

    #[test]
    fn test_stored_positions_missing_role_falls_back_to_default() {
        // A template persisted by an older build may lack a role in its
        // positions map; lookup must degrade, not panic.
        let template = synthesize(SynthesisInputs {
            regions: &[],
            banners: &[],
            palette: &palette(),
            lines: &[],
            brand: &brand(),
            overrides: &ContentOverrides::default(),
            cover_image_url: None,
        })
        .unwrap();

        let mut value = serde_json::to_value(&template).unwrap();
        value["positions"].as_object_mut().unwrap().remove("logo");
        let reloaded: Template = serde_json::from_value(value).unwrap();

        assert_eq!(reloaded.positions.rect(Role::Logo), default_role_rect(Role::Logo));
        // Intact roles are unaffected.
        assert_eq!(reloaded.positions.rect(Role::Header), template.positions.rect(Role::Header));
    }

    #[test]
    fn test_synthesis_requires_brand_name() {
        let mut b = brand();
        b.name = "  ".into();
        let err = synthesize(SynthesisInputs {
            regions: &[],
            banners: &[],
            palette: &palette(),
            lines: &[],
            brand: &b,
            overrides: &ContentOverrides::default(),
            cover_image_url: None,
        })
        .unwrap_err();
        assert!(matches!(err, PipelineError::Synthesis(_)));
    }

    #[test]
    fn test_synthesis_requires_full_palette() {
        let err = synthesize(SynthesisInputs {
            regions: &[],
            banners: &[],
            palette: &["#ffffff".to_string()],
            lines: &[],
            brand: &brand(),
            overrides: &ContentOverrides::default(),
            cover_image_url: None,
        })
        .unwrap_err();
        assert!(matches!(err, PipelineError::Synthesis(_)));
    }

    #[test]
    fn test_synthesized_template_has_fingerprint_and_slide() {
        let template = synthesize(SynthesisInputs {
            regions: &[],
            banners: &[],
            palette: &palette(),
            lines: &lines_from_raw("HELLO"),
            brand: &brand(),
            overrides: &ContentOverrides::default(),
            cover_image_url: Some("https://cdn.example.com/source.png".into()),
        })
        .unwrap();
        assert!(!template.fingerprint.is_empty());
        assert_eq!(template.slides.len(), 1);
        assert_eq!(template.slides[0].slide_number, 1);
        assert_eq!(template.slides[0].content.title, "HELLO");
    }
}
