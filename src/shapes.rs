//! Banner Shape Detection
//!
//! A pure filter over classified regions: wide, short regions that carry no
//! text/logo/product role are re-tagged as banner shapes for the renderer to
//! tint with the brand color.

use serde::{Deserialize, Serialize};

use crate::ingest::Rect;
use crate::layout::{Region, RegionKind};

const MIN_BANNER_WIDTH: u32 = 400;
const MIN_BANNER_HEIGHT: u32 = 50;
const MAX_BANNER_HEIGHT: u32 = 200;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Banner {
    #[serde(rename = "type")]
    pub kind: RegionKind,
    pub coordinates: Rect,
}

/// Derive banner shapes from classified regions. No failure modes.
pub fn detect_banners(regions: &[Region]) -> Vec<Banner> {
    regions
        .iter()
        .filter(|r| {
            !matches!(
                r.kind,
                RegionKind::Text | RegionKind::Logo | RegionKind::Product
            )
        })
        .filter(|r| {
            r.coordinates.width > MIN_BANNER_WIDTH
                && r.coordinates.height > MIN_BANNER_HEIGHT
                && r.coordinates.height < MAX_BANNER_HEIGHT
        })
        .map(|r| Banner { kind: RegionKind::Banner, coordinates: r.coordinates })
        .collect()
}
