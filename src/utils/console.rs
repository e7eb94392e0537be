// src/utils/console.rs

//! Operator-facing console output.
//!
//! Diagnostics go through the `log` facade; this module renders the things
//! an operator reads directly: headers, lists, summaries and the rank badge.

use chrono::Local;

/// Print a header.
pub fn header(title: &str) {
    let border = "═".repeat(60);
    println!("{border}");
    println!("  {title}");
    println!("{border}");
}

/// Print a sub-item (indented).
pub fn sub_item(message: &str) {
    println!("    {message}");
}

/// Print a titled list, or a dash when it is empty.
pub fn list(title: &str, items: &[String]) {
    println!("{title} ({})", items.len());
    if items.is_empty() {
        sub_item("-");
    }
    for item in items {
        sub_item(item);
    }
}

/// Print a summary section.
pub fn summary(title: &str, items: &[(&str, String)]) {
    println!();
    println!("[{}] [SUMMARY] {}", Local::now().format("%H:%M:%S"), title);
    for (key, value) in items {
        println!("    {key}: {value}");
    }
}

/// Render badge pieces with 24-bit ANSI colors.
pub fn paint(pieces: &[(String, &str)]) -> String {
    pieces
        .iter()
        .map(|(text, hex)| match parse_hex(hex) {
            Some((r, g, b)) => format!("\x1b[1;38;2;{r};{g};{b}m{text}\x1b[0m"),
            None => text.clone(),
        })
        .collect()
}

/// Parse `#rrggbb`.
fn parse_hex(hex: &str) -> Option<(u8, u8, u8)> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(digits.get(i..i + 2)?, 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex("#aa6600"), Some((0xaa, 0x66, 0x00)));
        assert_eq!(parse_hex("aa6600"), None);
        assert_eq!(parse_hex("#zz0000"), None);
    }

    #[test]
    fn test_paint_wraps_each_piece() {
        let out = paint(&[("[".to_string(), "#ff0000"), ("1".to_string(), "bogus")]);
        assert_eq!(out, "\x1b[1;38;2;255;0;0m[\x1b[0m1");
    }
}
