//! Release quality scoring.
//!
//! Scores are additive over three categories. Resolution points are an order
//! of magnitude above everything else, so resolution always dominates the
//! final ordering. Within a category only the highest matching tier counts,
//! except codecs whose bonuses add up.
//!
//! Cam, telesync and screener releases receive a penalty large enough that
//! they can never outrank a properly sourced release.

use once_cell::sync::Lazy;
use regex_lite::Regex;

/// Penalty applied to cam/telesync/screener releases.
pub const LOW_QUALITY_PENALTY: i32 = -10_000;

/// One scoring tier: a label, the regex it is detected by and its points.
struct QualityTier {
    label: &'static str,
    pattern: Regex,
    points: i32,
}

impl QualityTier {
    fn new(label: &'static str, alternatives: &str, points: i32) -> Self {
        Self {
            label,
            pattern: token_regex(alternatives),
            points,
        }
    }
}

/// Compile `alternatives` so that it only matches as a standalone token.
///
/// Release names separate tokens with dots, dashes, spaces and underscores,
/// none of which `\b` handles uniformly, so the boundary is spelled out.
fn token_regex(alternatives: &str) -> Regex {
    let pattern = format!(r"(?i)(?:^|[^a-z0-9])(?:{})(?:[^a-z0-9]|$)", alternatives);
    Regex::new(&pattern).expect("quality token pattern must compile")
}

/// Highest tier first.
static RESOLUTIONS: Lazy<Vec<QualityTier>> = Lazy::new(|| {
    vec![
        QualityTier::new("4K", r"2160p|4k|uhd", 3000),
        QualityTier::new("1080p", r"1080p|1080i", 2000),
        QualityTier::new("720p", r"720p", 1000),
    ]
});

/// Highest tier first.
static SOURCES: Lazy<Vec<QualityTier>> = Lazy::new(|| {
    vec![
        QualityTier::new("REMUX", r"remux|bdremux", 250),
        QualityTier::new("BluRay", r"blu-?ray|bdrip|brrip", 200),
        QualityTier::new("WEB-DL", r"web-?dl|web\.dl", 150),
        QualityTier::new("WEB", r"web|webrip|web-rip", 100),
        QualityTier::new("HDTV", r"hdtv", 50),
    ]
});

/// Additive.
static CODECS: Lazy<Vec<QualityTier>> = Lazy::new(|| {
    vec![
        QualityTier::new("HEVC", r"hevc|x265|h\.?265", 30),
        QualityTier::new("H264", r"avc|x264|h\.?264", 20),
    ]
});

/// Rip tags that never occur as title words.
static LOW_QUALITY: Lazy<Regex> = Lazy::new(|| {
    token_regex(r"cam-?rip|hdcam|hdts|ts-?rip|telesync|telecine|scr|screener|dvdscr|hdtc|hdtv-?cam")
});

/// Short tags that can be title words ("Cam", "TC"). They only count after
/// the year or resolution, where the release tags begin.
static SHORT_LOW_QUALITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:^|[^a-z0-9])(?:(?:19|20)\d{2}|\d{3,4}p)[^a-z0-9](?:.*[^a-z0-9])?(?:cam|ts|tc)(?:[^a-z0-9]|$)",
    )
    .expect("short low quality pattern must compile")
});

fn first_match<'a>(tiers: &'a [QualityTier], name: &str) -> Option<&'a QualityTier> {
    tiers.iter().find(|tier| tier.pattern.is_match(name))
}

/// Score a release name. Unknown names score 0; never fails.
pub fn score(name: &str) -> i32 {
    let mut total = 0;

    if let Some(tier) = first_match(&RESOLUTIONS, name) {
        total += tier.points;
    }
    if let Some(tier) = first_match(&SOURCES, name) {
        total += tier.points;
    }
    total += CODECS
        .iter()
        .filter(|tier| tier.pattern.is_match(name))
        .map(|tier| tier.points)
        .sum::<i32>();

    if is_low_quality_source(name) {
        total += LOW_QUALITY_PENALTY;
    }

    total
}

/// Whether the release is a cam, telesync or screener rip.
pub fn is_low_quality_source(name: &str) -> bool {
    LOW_QUALITY.is_match(name) || SHORT_LOW_QUALITY.is_match(name)
}

/// Human-readable resolution label ("4K", "1080p", "720p").
pub fn resolution_label(name: &str) -> Option<&'static str> {
    first_match(&RESOLUTIONS, name).map(|tier| tier.label)
}

/// Human-readable source label ("REMUX", "BluRay", ...).
pub fn source_label(name: &str) -> Option<&'static str> {
    first_match(&SOURCES, name).map(|tier| tier.label)
}
