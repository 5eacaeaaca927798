use crate::foundation::core::Rgb8;

// Sorted by name for binary search.
const NAMED: &[(&str, Rgb8)] = &[
    ("aqua", Rgb8::new(0, 255, 255)),
    ("beige", Rgb8::new(245, 245, 220)),
    ("black", Rgb8::new(0, 0, 0)),
    ("blue", Rgb8::new(0, 0, 255)),
    ("brown", Rgb8::new(165, 42, 42)),
    ("coral", Rgb8::new(255, 127, 80)),
    ("crimson", Rgb8::new(220, 20, 60)),
    ("cyan", Rgb8::new(0, 255, 255)),
    ("fuchsia", Rgb8::new(255, 0, 255)),
    ("gold", Rgb8::new(255, 215, 0)),
    ("gray", Rgb8::new(128, 128, 128)),
    ("green", Rgb8::new(0, 128, 0)),
    ("grey", Rgb8::new(128, 128, 128)),
    ("indigo", Rgb8::new(75, 0, 130)),
    ("khaki", Rgb8::new(240, 230, 140)),
    ("lavender", Rgb8::new(230, 230, 250)),
    ("lime", Rgb8::new(0, 255, 0)),
    ("magenta", Rgb8::new(255, 0, 255)),
    ("maroon", Rgb8::new(128, 0, 0)),
    ("navy", Rgb8::new(0, 0, 128)),
    ("olive", Rgb8::new(128, 128, 0)),
    ("orange", Rgb8::new(255, 165, 0)),
    ("pink", Rgb8::new(255, 192, 203)),
    ("purple", Rgb8::new(128, 0, 128)),
    ("red", Rgb8::new(255, 0, 0)),
    ("salmon", Rgb8::new(250, 128, 114)),
    ("silver", Rgb8::new(192, 192, 192)),
    ("skyblue", Rgb8::new(135, 206, 235)),
    ("teal", Rgb8::new(0, 128, 128)),
    ("tomato", Rgb8::new(255, 99, 71)),
    ("turquoise", Rgb8::new(64, 224, 208)),
    ("violet", Rgb8::new(238, 130, 238)),
    ("white", Rgb8::new(255, 255, 255)),
    ("yellow", Rgb8::new(255, 255, 0)),
];

/// Parse a color option value: a CSS-style name or a 6-digit hex (with or without `#`).
///
/// Returns `None` for anything else; callers fall back to the default color.
pub fn parse_color(s: &str) -> Option<Rgb8> {
    let s = s.trim();
    let hex = s.strip_prefix('#').unwrap_or(s);
    if hex.len() == 6 && hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        let v = u32::from_str_radix(hex, 16).ok()?;
        return Some(Rgb8::new((v >> 16) as u8, (v >> 8) as u8, v as u8));
    }

    let name = s.to_ascii_lowercase();
    NAMED
        .binary_search_by(|(n, _)| n.cmp(&name.as_str()))
        .ok()
        .map(|i| NAMED[i].1)
}

#[cfg(test)]
#[path = "../../tests/unit/script/color.rs"]
mod tests;
