//! Stateless Slide Rendering
//!
//! `render_slide` is pure: identical (slide, positions, palette, brand)
//! inputs always yield an identical visual tree. The tree is what a
//! downstream `rasterize` capability turns into pixels; the core never
//! touches a raster surface here.

use serde::{Deserialize, Serialize};

use crate::ingest::Rect;
use crate::layout::Role;
use crate::template::{BrandAssets, ResolvedPositions, Slide, Template};
use crate::text::{approximate_font_style, FontStyle};

pub const Z_BACKGROUND: u8 = 0;
pub const Z_OVERLAY: u8 = 10;
pub const Z_BANNER: u8 = 15;
pub const Z_CONTENT: u8 = 20;

const OVERLAY_COLOR: &str = "#000000";
const OVERLAY_OPACITY: f32 = 0.3;
const BANNER_OPACITY: f32 = 0.9;

/// One layer of the rendered slide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualNode {
    pub z: u8,
    pub frame: Rect,
    #[serde(flatten)]
    pub kind: NodeKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum NodeKind {
    BackgroundImage {
        url: Option<String>,
    },
    Overlay {
        color: String,
        opacity: f32,
    },
    BannerShape {
        fill: String,
        opacity: f32,
    },
    LogoImage {
        url: String,
    },
    ProductImage {
        url: String,
    },
    TitleBlock {
        text: String,
        font: FontStyle,
        color: String,
        underline_color: String,
    },
    BodyText {
        text: String,
        font: FontStyle,
        color: String,
    },
    CtaButton {
        text: String,
        url: String,
        fill: String,
        text_color: String,
    },
    FooterText {
        text: String,
        font: FontStyle,
        color: String,
    },
}

/// Ordered layers, background first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualTree {
    pub canvas: Rect,
    pub nodes: Vec<VisualNode>,
}

/// Render one slide against resolved positions. Fixed z-order: background,
/// dark overlay, tinted banners, then logo/product/text layers.
pub fn render_slide(
    slide: &Slide,
    positions: &ResolvedPositions,
    banners: &[Rect],
    palette: &[String],
    brand: &BrandAssets,
    background_url: Option<&str>,
    add_logo: bool,
    logo_url: &str,
) -> VisualTree {
    let text_color = palette.first().cloned().unwrap_or_else(|| "#ffffff".to_string());
    let accent = brand.primary_color.clone();

    let canvas = canvas_bounds(positions, banners);
    let mut nodes = Vec::new();

    nodes.push(VisualNode {
        z: Z_BACKGROUND,
        frame: canvas,
        kind: NodeKind::BackgroundImage { url: background_url.map(str::to_string) },
    });
    nodes.push(VisualNode {
        z: Z_OVERLAY,
        frame: canvas,
        kind: NodeKind::Overlay {
            color: OVERLAY_COLOR.to_string(),
            opacity: OVERLAY_OPACITY,
        },
    });
    for banner in banners {
        nodes.push(VisualNode {
            z: Z_BANNER,
            frame: *banner,
            kind: NodeKind::BannerShape { fill: accent.clone(), opacity: BANNER_OPACITY },
        });
    }
    if add_logo {
        nodes.push(VisualNode {
            z: Z_CONTENT,
            frame: positions.rect(Role::Logo),
            kind: NodeKind::LogoImage { url: logo_url.to_string() },
        });
    }
    if let Some(product_url) = &slide.content.product_image {
        nodes.push(VisualNode {
            z: Z_CONTENT,
            frame: positions.rect(Role::Product),
            kind: NodeKind::ProductImage { url: product_url.clone() },
        });
    }
    nodes.push(VisualNode {
        z: Z_CONTENT,
        frame: positions.rect(Role::Header),
        kind: NodeKind::TitleBlock {
            text: slide.content.title.clone(),
            font: approximate_font_style(&slide.content.title),
            color: text_color.clone(),
            underline_color: accent.clone(),
        },
    });
    nodes.push(VisualNode {
        z: Z_CONTENT,
        frame: positions.rect(Role::Body),
        kind: NodeKind::BodyText {
            text: slide.content.body.clone(),
            font: approximate_font_style(&slide.content.body),
            color: text_color.clone(),
        },
    });
    nodes.push(VisualNode {
        z: Z_CONTENT,
        frame: positions.rect(Role::Cta),
        kind: NodeKind::CtaButton {
            text: slide.content.cta_text.clone(),
            url: slide.content.cta_url.clone(),
            fill: accent,
            text_color: "#ffffff".to_string(),
        },
    });
    nodes.push(VisualNode {
        z: Z_CONTENT,
        frame: positions.rect(Role::Footer),
        kind: NodeKind::FooterText {
            text: slide.content.footer.clone(),
            font: approximate_font_style(&slide.content.footer),
            color: text_color,
        },
    });

    VisualTree { canvas, nodes }
}

/// Render a slide of a stored template using its own positions, banners,
/// palette, and brand.
pub fn render_template_slide(template: &Template, slide: &Slide, add_logo: bool) -> VisualTree {
    let banner_rects: Vec<Rect> = template.banners.iter().map(|b| b.coordinates).collect();
    render_slide(
        slide,
        &template.positions,
        &banner_rects,
        &template.palette,
        &template.brand,
        template.cover_image_url.as_deref(),
        add_logo,
        &template.brand.logo_url,
    )
}

/// Smallest canvas covering every placed rectangle.
fn canvas_bounds(positions: &ResolvedPositions, banners: &[Rect]) -> Rect {
    let all_roles = [Role::Logo, Role::Header, Role::Body, Role::Cta, Role::Footer, Role::Product];
    let mut width = 0;
    let mut height = 0;
    for rect in all_roles.iter().map(|r| positions.rect(*r)).chain(banners.iter().copied()) {
        width = width.max(rect.x + rect.width);
        height = height.max(rect.y + rect.height);
    }
    Rect::new(0, 0, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{ContentAssets, ResolvedPositions};

    fn brand() -> BrandAssets {
        BrandAssets {
            logo_url: "https://cdn.example.com/logo.png".into(),
            primary_color: "#ff6600".into(),
            font: "Raleway".into(),
            name: "Acme".into(),
        }
    }

    fn slide(product_image: Option<&str>) -> Slide {
        Slide {
            slide_number: 1,
            content: ContentAssets {
                title: "BIG NEWS".into(),
                body: "Something worth reading.".into(),
                cta_text: "Shop Now".into(),
                cta_url: "https://acme.example".into(),
                footer: "@acme".into(),
                product_image: product_image.map(str::to_string),
            },
        }
    }

    fn palette() -> Vec<String> {
        crate::color::FALLBACK_PALETTE.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_render_is_deterministic() {
        let positions = ResolvedPositions::resolve(&[]);
        let a = render_slide(&slide(None), &positions, &[], &palette(), &brand(), None, true, "u");
        let b = render_slide(&slide(None), &positions, &[], &palette(), &brand(), None, true, "u");
        assert_eq!(a, b);
    }

    #[test]
    fn test_z_order_is_monotonic() {
        let positions = ResolvedPositions::resolve(&[]);
        let banners = [Rect::new(0, 300, 500, 100)];
        let tree = render_slide(
            &slide(Some("https://cdn.example.com/p.png")),
            &positions,
            &banners,
            &palette(),
            &brand(),
            Some("https://cdn.example.com/bg.png"),
            true,
            "https://cdn.example.com/logo.png",
        );
        let zs: Vec<u8> = tree.nodes.iter().map(|n| n.z).collect();
        let mut sorted = zs.clone();
        sorted.sort_unstable();
        assert_eq!(zs, sorted, "layers must already be in z-order");
        assert_eq!(zs[0], Z_BACKGROUND);
        assert_eq!(zs[1], Z_OVERLAY);
        assert!(zs.contains(&Z_BANNER));
    }

    #[test]
    fn test_missing_logo_region_uses_default_rect() {
        // No detected regions at all, addLogo on: logo lands on the default.
        let positions = ResolvedPositions::resolve(&[]);
        let tree = render_slide(&slide(None), &positions, &[], &palette(), &brand(), None, true, "u");
        let logo = tree
            .nodes
            .iter()
            .find(|n| matches!(n.kind, NodeKind::LogoImage { .. }))
            .expect("logo node present");
        assert_eq!(logo.frame, Rect::new(50, 50, 150, 60));
    }

    #[test]
    fn test_logo_and_product_are_conditional() {
        let positions = ResolvedPositions::resolve(&[]);
        let tree = render_slide(&slide(None), &positions, &[], &palette(), &brand(), None, false, "u");
        assert!(!tree.nodes.iter().any(|n| matches!(n.kind, NodeKind::LogoImage { .. })));
        assert!(!tree.nodes.iter().any(|n| matches!(n.kind, NodeKind::ProductImage { .. })));
    }

    #[test]
    fn test_text_color_and_accent_sources() {
        let positions = ResolvedPositions::resolve(&[]);
        let banners = [Rect::new(0, 300, 500, 100)];
        let tree =
            render_slide(&slide(None), &positions, &banners, &palette(), &brand(), None, false, "u");
        for node in &tree.nodes {
            match &node.kind {
                NodeKind::TitleBlock { color, underline_color, .. } => {
                    assert_eq!(color, "#ffffff");
                    assert_eq!(underline_color, "#ff6600");
                }
                NodeKind::BannerShape { fill, opacity } => {
                    assert_eq!(fill, "#ff6600");
                    assert!((opacity - 0.9).abs() < f32::EPSILON);
                }
                NodeKind::Overlay { opacity, .. } => {
                    assert!((opacity - 0.3).abs() < f32::EPSILON);
                }
                _ => {}
            }
        }
    }
}
