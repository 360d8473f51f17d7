//! Content Rewriting - Brand Substitution
//!
//! Rewrites OCR-extracted lines to replace the competitor's brand with the
//! caller's. All matching is case-insensitive. Lines containing none of the
//! trigger tokens pass through unchanged.

use crate::text::TextLine;

const COMPETITOR_TOKEN: &str = "competitor";
const COMPETITOR_HANDLE: &str = "@competitor";
const SALE_PHRASE: &str = "50% off sale";
const SHOP_PHRASE: &str = "shop now";

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_ascii_lowercase().contains(needle)
}

/// Case-insensitive token replacement. When `skip_after_at` is set,
/// occurrences immediately preceded by `@` are left alone so the handle rule
/// can still see them.
fn replace_token_ci(input: &str, token: &str, replacement: &str, skip_after_at: bool) -> String {
    let lower = input.to_ascii_lowercase();
    let mut out = String::with_capacity(input.len());
    let mut cursor = 0;
    while let Some(offset) = lower[cursor..].find(token) {
        let start = cursor + offset;
        let end = start + token.len();
        if skip_after_at && start > 0 && lower.as_bytes()[start - 1] == b'@' {
            out.push_str(&input[cursor..end]);
        } else {
            out.push_str(&input[cursor..start]);
            out.push_str(replacement);
        }
        cursor = end;
    }
    out.push_str(&input[cursor..]);
    out
}

/// Rewrite a single line for the target brand.
pub fn rewrite_line(line: &str, brand_name: &str) -> String {
    let brand_upper = brand_name.to_uppercase();

    let mut text = replace_token_ci(line, COMPETITOR_TOKEN, &brand_upper, true);
    text = replace_token_ci(
        &text,
        COMPETITOR_HANDLE,
        &format!("@{}", brand_name.to_lowercase()),
        false,
    );

    if contains_ci(&text, SALE_PHRASE) {
        format!("Huge 50% Off Sale at {brand_upper}!")
    } else if contains_ci(&text, SHOP_PHRASE) {
        format!("Discover Deals at {brand_name}!")
    } else {
        text
    }
}

/// Rewrite every line, preserving length, order, sequence ids, and font
/// styles.
pub fn rewrite_lines(lines: &[TextLine], brand_name: &str) -> Vec<TextLine> {
    lines
        .iter()
        .map(|line| TextLine {
            text: rewrite_line(&line.text, brand_name),
            sequence_id: line.sequence_id,
            font_style: line.font_style.clone(),
        })
        .collect()
}
