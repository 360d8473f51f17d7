//! Layout Analysis - Contour Regions and Role Classification
//!
//! Thresholds the source image, extracts external contours, and classifies
//! each surviving bounding rectangle with an ordered rule list. Later rules
//! overwrite earlier assignments, so precedence is auditable in one place.

use imageproc::contours::{find_contours, BorderType, Contour};
use serde::{Deserialize, Serialize};

use crate::ingest::{PixelSurface, Rect};

/// Inverse-binary threshold cutoff: luma above this is background.
pub const THRESHOLD_CUTOFF: u8 = 200;

/// Rectangles at or below this area are discarded as noise.
pub const MIN_REGION_AREA: u64 = 500;

/// Width of the header/footer bands at the image edges.
const EDGE_BAND: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionKind {
    Text,
    Logo,
    Product,
    Banner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Header,
    Footer,
    Cta,
    Body,
    Logo,
    Product,
}

/// A classified rectangular area of the source image.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    #[serde(rename = "type")]
    pub kind: RegionKind,
    pub coordinates: Rect,
    pub role_id: Role,
}

/// Output of layout analysis over one image.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutAnalysis {
    pub regions: Vec<Region>,
    pub product_region: Option<Region>,
}

/// One classification rule. Rules are evaluated in declaration order and the
/// last matching rule wins.
struct ClassRule {
    name: &'static str,
    kind: RegionKind,
    role: Role,
    matches: fn(&Rect, u32, u32) -> bool,
}

/// The header/footer/cta band checks are mutually exclusive by construction:
/// each later predicate re-asserts that the earlier bands did not match.
const CLASS_RULES: &[ClassRule] = &[
    ClassRule {
        name: "header_band",
        kind: RegionKind::Text,
        role: Role::Header,
        matches: |r, _w, _h| r.y < EDGE_BAND,
    },
    ClassRule {
        name: "footer_band",
        kind: RegionKind::Text,
        role: Role::Footer,
        matches: |r, _w, h| r.y >= EDGE_BAND && r.y > h.saturating_sub(EDGE_BAND),
    },
    ClassRule {
        name: "cta_sized",
        kind: RegionKind::Text,
        role: Role::Cta,
        matches: |r, _w, h| {
            r.y >= EDGE_BAND
                && r.y <= h.saturating_sub(EDGE_BAND)
                && r.width < 300
                && r.height < 100
        },
    },
    ClassRule {
        name: "logo_corner",
        kind: RegionKind::Logo,
        role: Role::Logo,
        matches: |r, w, _h| {
            r.width < 200
                && r.height < 100
                && (r.x < 100 || r.x > w.saturating_sub(300))
                && r.y < 100
        },
    },
    ClassRule {
        name: "product_center",
        kind: RegionKind::Product,
        role: Role::Product,
        matches: |r, w, h| {
            r.width > 300
                && r.height > 300
                && r.x > 200
                && r.x < w.saturating_sub(200)
                && r.y > 200
                && r.y < h.saturating_sub(200)
        },
    },
];

/// Classify a bounding rectangle. Pure: identical inputs always yield the
/// identical `(kind, role)` pair.
pub fn classify(rect: &Rect, image_width: u32, image_height: u32) -> (RegionKind, Role) {
    let mut assigned = (RegionKind::Text, Role::Body);
    for rule in CLASS_RULES {
        if (rule.matches)(rect, image_width, image_height) {
            tracing::trace!(rule = rule.name, ?rect, "classification rule matched");
            assigned = (rule.kind, rule.role);
        }
    }
    assigned
}

fn bounding_rect(contour: &Contour<u32>) -> Option<Rect> {
    let first = contour.points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in &contour.points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    Some(Rect::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1))
}

/// Threshold the surface and extract classified regions from its external
/// contours. The last region qualifying as a product becomes the singleton
/// `product_region`.
pub fn analyze(surface: &PixelSurface) -> LayoutAnalysis {
    let mask = surface.threshold_inverse(THRESHOLD_CUTOFF);
    let (width, height) = (surface.width(), surface.height());

    let mut regions = Vec::new();
    let mut product_region = None;

    for contour in find_contours::<u32>(&mask) {
        // External contours only; holes and their children are ignored.
        if contour.border_type != BorderType::Outer || contour.parent.is_some() {
            continue;
        }
        let Some(rect) = bounding_rect(&contour) else { continue };
        if rect.area() <= MIN_REGION_AREA {
            continue;
        }

        let (kind, role) = classify(&rect, width, height);
        let region = Region { kind, coordinates: rect, role_id: role };
        if role == Role::Product {
            product_region = Some(region.clone());
        }
        regions.push(region);
    }

    tracing::debug!(
        regions = regions.len(),
        has_product = product_region.is_some(),
        "layout analysis complete"
    );
    LayoutAnalysis { regions, product_region }
}
