//! Rank tiers derived from a clear count.
//!
//! Thresholds are fractions of the total map count, rounded up, checked from
//! the top tier down. A count equal to a threshold belongs to that tier.

use std::fmt;

use unicode_segmentation::UnicodeSegmentation;

use crate::models::{Ledger, RankConfig};

/// Top-tier ramp for the positive palette.
pub const KACKY_POSITIVE: [&str; 5] = ["#aa0000", "#aa0000", "#aa6600", "#aaaa00", "#00aa00"];

/// Top-tier ramp for the negative palette.
pub const KACKY_NEGATIVE: [&str; 5] = ["#aa0066", "#aa0066", "#aa3300", "#aa6600", "#ff4400"];

/// Progress bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RankTier {
    NoRank,
    Plastic,
    Bronze,
    Silver,
    Gold,
    Kacky,
}

impl RankTier {
    /// Tiers with a threshold, best first.
    pub const LADDER: [RankTier; 5] = [
        RankTier::Kacky,
        RankTier::Gold,
        RankTier::Silver,
        RankTier::Bronze,
        RankTier::Plastic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RankTier::NoRank => "norank",
            RankTier::Plastic => "plastic",
            RankTier::Bronze => "bronze",
            RankTier::Silver => "silver",
            RankTier::Gold => "gold",
            RankTier::Kacky => "kacky",
        }
    }

    /// Share of the total map count the tier requires.
    pub fn fraction(&self) -> f64 {
        match self {
            RankTier::NoRank => 0.0,
            RankTier::Plastic => 0.133333,
            RankTier::Bronze => 0.333333,
            RankTier::Silver => 0.666666,
            RankTier::Gold => 0.866666,
            RankTier::Kacky => 1.0,
        }
    }

    /// Minimum clear count for this tier given `total_maps`.
    pub fn threshold(&self, total_maps: u32) -> u32 {
        (f64::from(total_maps) * self.fraction()).ceil() as u32
    }
}

impl fmt::Display for RankTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a tier is colored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpec {
    /// One color for the whole badge
    Flat(&'static str),
    /// Per-character ramp; characters past the end reuse the last color
    Ramp(&'static [&'static str; 5]),
}

impl ColorSpec {
    /// Color for the `index`-th badge character.
    pub fn color_at(&self, index: usize) -> &'static str {
        match *self {
            ColorSpec::Flat(color) => color,
            ColorSpec::Ramp(ramp) => ramp[index.min(ramp.len() - 1)],
        }
    }
}

/// Classify a clear count into a tier and its colors.
pub fn classify(clear_count: u32, total_maps: u32, positive_ramp: bool) -> (RankTier, ColorSpec) {
    let tier = RankTier::LADDER
        .into_iter()
        .find(|tier| clear_count >= tier.threshold(total_maps))
        .unwrap_or(RankTier::NoRank);

    let color = match tier {
        RankTier::Kacky if positive_ramp => ColorSpec::Ramp(&KACKY_POSITIVE),
        RankTier::Kacky => ColorSpec::Ramp(&KACKY_NEGATIVE),
        RankTier::Gold => ColorSpec::Flat("#ffdd00"),
        RankTier::Silver => ColorSpec::Flat("#cccccc"),
        RankTier::Bronze => ColorSpec::Flat("#cc8844"),
        RankTier::Plastic => ColorSpec::Flat("#bbffee"),
        RankTier::NoRank => ColorSpec::Flat("#ffffff"),
    };
    (tier, color)
}

/// Colored pieces of a `[count] ` badge.
///
/// Ramps color each symbol separately; flat colors produce a single piece.
pub fn badge(clear_count: u32, color: ColorSpec) -> Vec<(String, &'static str)> {
    let text = format!("[{clear_count}] ");
    match color {
        ColorSpec::Flat(c) => vec![(text, c)],
        ColorSpec::Ramp(_) => text
            .graphemes(true)
            .enumerate()
            .map(|(i, symbol)| (symbol.to_string(), color.color_at(i)))
            .collect(),
    }
}

/// A player's tier as shown to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankSummary {
    pub clear_count: u32,
    pub tier: RankTier,
    pub color: ColorSpec,
}

impl RankSummary {
    /// Classify a ledger's clear count under `config`.
    pub fn of(ledger: &Ledger, config: &RankConfig) -> Self {
        let clear_count = u32::try_from(ledger.len()).unwrap_or(u32::MAX);
        let (tier, color) = classify(clear_count, config.total_maps, config.positive_ramp());
        Self {
            clear_count,
            tier,
            color,
        }
    }

    pub fn badge(&self) -> Vec<(String, &'static str)> {
        badge(self.clear_count, self.color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tier(count: u32, total: u32) -> RankTier {
        classify(count, total, true).0
    }

    #[test]
    fn test_thresholds_for_526() {
        assert_eq!(RankTier::Kacky.threshold(526), 526);
        assert_eq!(RankTier::Gold.threshold(526), 456);
        assert_eq!(RankTier::Silver.threshold(526), 351);
        assert_eq!(RankTier::Bronze.threshold(526), 176);
        assert_eq!(RankTier::Plastic.threshold(526), 71);
    }

    #[test]
    fn test_boundaries_belong_to_higher_tier() {
        for total in [75, 100, 526] {
            for expected in RankTier::LADDER {
                let threshold = expected.threshold(total);
                assert_eq!(tier(threshold, total), expected, "total={total}");
                assert_ne!(tier(threshold - 1, total), expected, "total={total}");
            }
        }
    }

    #[test]
    fn test_below_plastic_is_norank() {
        let plastic = RankTier::Plastic.threshold(526);
        assert_eq!(tier(plastic - 1, 526), RankTier::NoRank);
        assert_eq!(tier(0, 526), RankTier::NoRank);
    }

    #[test]
    fn test_one_below_each_threshold_is_next_tier_down() {
        assert_eq!(tier(525, 526), RankTier::Gold);
        assert_eq!(tier(455, 526), RankTier::Silver);
        assert_eq!(tier(350, 526), RankTier::Bronze);
        assert_eq!(tier(175, 526), RankTier::Plastic);
    }

    #[test]
    fn test_kacky_palettes() {
        let (tier, color) = classify(526, 526, true);
        assert_eq!(tier, RankTier::Kacky);
        assert_eq!(color, ColorSpec::Ramp(&KACKY_POSITIVE));

        let (tier, color) = classify(526, 526, false);
        assert_eq!(tier, RankTier::Kacky);
        assert_eq!(color, ColorSpec::Ramp(&KACKY_NEGATIVE));
    }

    #[test]
    fn test_flat_tiers_ignore_palette() {
        assert_eq!(classify(460, 526, true).1, ColorSpec::Flat("#ffdd00"));
        assert_eq!(classify(460, 526, false).1, ColorSpec::Flat("#ffdd00"));
        assert_eq!(classify(10, 526, false).1, ColorSpec::Flat("#ffffff"));
    }

    #[test]
    fn test_flat_badge_is_one_piece() {
        let pieces = badge(200, ColorSpec::Flat("#cc8844"));
        assert_eq!(pieces, vec![("[200] ".to_string(), "#cc8844")]);
    }

    #[test]
    fn test_ramp_badge_colors_each_symbol() {
        let pieces = badge(526, ColorSpec::Ramp(&KACKY_POSITIVE));
        let symbols: Vec<&str> = pieces.iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(symbols, vec!["[", "5", "2", "6", "]", " "]);

        let colors: Vec<&str> = pieces.iter().map(|(_, c)| *c).collect();
        assert_eq!(
            colors,
            vec!["#aa0000", "#aa0000", "#aa6600", "#aaaa00", "#00aa00", "#00aa00"]
        );
    }

    #[test]
    fn test_summary_counts_ledger_entries() {
        let ledger = Ledger::parse("A\t1.000\t1\nB\tN/A\t2\n");
        let config = RankConfig {
            total_maps: 2,
            kacky_color: "negative".into(),
        };
        let summary = RankSummary::of(&ledger, &config);
        assert_eq!(summary.clear_count, 2);
        assert_eq!(summary.tier, RankTier::Kacky);
        assert_eq!(summary.badge()[0], ("[".to_string(), "#aa0066"));
    }
}
