//! Utility functions and helpers.

pub mod console;
pub mod http;
pub mod url;

use std::sync::LazyLock;

use regex::Regex;

static TIME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:0+:)?(\d+\.\d+)").expect("time pattern is valid"));

/// Normalize a record time by dropping an all-zero minutes prefix.
///
/// `00:12.345` becomes `12.345`. Times the pattern doesn't match, such as
/// `1:02:12.345`, come back unchanged.
pub fn normalize_time(raw: &str) -> String {
    TIME_PATTERN
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| raw.to_string())
}

/// Whether `html` carries the `pid=<pid>` marker for exactly this player.
///
/// `pid=12` must not match inside `pid=123`.
pub fn has_identity_marker(html: &str, pid: &str) -> bool {
    let marker = format!("pid={pid}");
    html.match_indices(&marker).any(|(at, _)| {
        !html[at + marker.len()..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_digit())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_time() {
        assert_eq!(normalize_time("00:12.345"), "12.345");
        assert_eq!(normalize_time("0:07.010"), "07.010");
        assert_eq!(normalize_time("12.345"), "12.345");
    }

    #[test]
    fn test_normalize_time_keeps_leading_zero_on_seconds() {
        assert_eq!(normalize_time("00:09.001"), "09.001");
        assert_eq!(normalize_time("000:05.500"), "05.500");
        assert_eq!(normalize_time("09.001"), "09.001");
    }

    #[test]
    fn test_normalize_time_leaves_unmatched_input() {
        assert_eq!(normalize_time("1:02:12.345"), "1:02:12.345");
        assert_eq!(normalize_time("01:12.345"), "01:12.345");
        assert_eq!(normalize_time("DNF"), "DNF");
        assert_eq!(normalize_time(""), "");
    }

    #[test]
    fn test_identity_marker() {
        let cell = r#"<a href="players.php?pid=42&amp;edition=0">Alice</a>"#;
        assert!(has_identity_marker(cell, "42"));
        assert!(!has_identity_marker(cell, "4"));
        assert!(!has_identity_marker(cell, "420"));
        assert!(has_identity_marker("players.php?pid=7", "7"));
    }
}
