// SPDX-FileCopyrightText: 2026 Faxline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fax number normalization.

/// Offset between a full-width ASCII variant (U+FF01..=U+FF5E) and its
/// half-width counterpart.
const FULLWIDTH_OFFSET: u32 = 0xFEE0;

/// Maps one full-width ASCII variant to half-width; other chars pass through.
pub fn to_halfwidth(c: char) -> char {
    match c {
        '\u{FF01}'..='\u{FF5E}' => char::from_u32(c as u32 - FULLWIDTH_OFFSET).unwrap_or(c),
        '\u{3000}' => ' ',
        _ => c,
    }
}

/// Half-width conversion, then drops whitespace and hyphens.
///
/// `"０３－１２３４ ５６７８"` becomes `"0312345678"`.
pub fn normalize_number(raw: &str) -> String {
    raw.chars()
        .map(to_halfwidth)
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect()
}

/// The directory key for a raw fax number: `[normalized]`.
///
/// Brackets already present in `raw` are not doubled.
pub fn directory_key(raw: &str) -> String {
    let trimmed = raw.trim();
    let inner = trimmed
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(trimmed);
    format!("[{}]", normalize_number(inner))
}
