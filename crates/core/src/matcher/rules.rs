//! Named pattern rules, one ordered list per predicate.
//!
//! Templates may reference `{s}` (season) and `{e}` (episode); both are
//! substituted unpadded and every template tolerates leading zeros itself,
//! so `S3E8`, `S03E08` and `S003E008` are all accepted. Every numeric
//! placeholder is followed by a non-digit guard so that episode 1 never
//! matches inside 10, 11 or 100.

use std::collections::HashMap;
use std::sync::Mutex;

use once_cell::sync::Lazy;
use regex_lite::Regex;

/// Compiled rules keyed by template and rendered target.
static COMPILED: Lazy<Mutex<HashMap<(&'static str, u32, u32), Regex>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Entries kept before the compiled-rule cache is reset.
const COMPILED_CAPACITY: usize = 4096;

/// A single named heuristic.
#[derive(Debug, Clone, Copy)]
pub struct PatternRule {
    /// Stable identifier, used in logs and tests.
    pub name: &'static str,
    template: &'static str,
}

impl PatternRule {
    pub const fn new(name: &'static str, template: &'static str) -> Self {
        Self { name, template }
    }

    /// Raw template text.
    pub fn template(&self) -> &'static str {
        self.template
    }

    /// Cache key for a target. Placeholders the template lacks are zeroed,
    /// so season-independent rules share one entry.
    fn key(&self, season: u32, episode: u32) -> (&'static str, u32, u32) {
        let template = self.template();
        let season = if template.contains("{s}") { season } else { 0 };
        let episode = if template.contains("{e}") { episode } else { 0 };
        (template, season, episode)
    }

    /// Compile the rule for a concrete season/episode target.
    ///
    /// Compiled patterns are cached process-wide. Returns `None` if the
    /// rendered pattern does not compile.
    pub fn compile(&self, season: u32, episode: u32) -> Option<Regex> {
        let key = self.key(season, episode);
        if let Ok(cache) = COMPILED.lock() {
            if let Some(re) = cache.get(&key) {
                return Some(re.clone());
            }
        }

        let pattern = key
            .0
            .replace("{s}", &key.1.to_string())
            .replace("{e}", &key.2.to_string());
        let re = Regex::new(&format!("(?i){}", pattern)).ok()?;

        if let Ok(mut cache) = COMPILED.lock() {
            if cache.len() >= COMPILED_CAPACITY {
                cache.clear();
            }
            cache.insert(key, re.clone());
        }
        Some(re)
    }

    #[cfg(test)]
    fn is_cached(&self, season: u32, episode: u32) -> bool {
        COMPILED
            .lock()
            .map(|cache| cache.contains_key(&self.key(season, episode)))
            .unwrap_or(false)
    }

    /// Whether `text` matches this rule for the given target.
    pub fn is_match(&self, text: &str, season: u32, episode: u32) -> bool {
        self.compile(season, episode)
            .map(|re| re.is_match(text))
            .unwrap_or(false)
    }
}

/// Exact season + episode, most common convention first.
pub const EPISODE_RULES: &[PatternRule] = &[
    // Show.S03E08, Show S3 E8, show_s03.e08
    PatternRule::new(
        "sxxeyy",
        r"(?:^|[^a-z0-9])s0*{s}[ ._-]?e0*{e}(?:[^0-9]|$)",
    ),
    // Show.3x08, Show 03x08
    PatternRule::new("nxm", r"(?:^|[^0-9])0*{s}x0*{e}(?:[^0-9]|$)"),
    // Show Season 3 Episode 8
    PatternRule::new(
        "season_episode_words",
        r"(?:^|[^a-z])season[ ._-]*0*{s}[ ._-]*episode[ ._-]*0*{e}(?:[^0-9]|$)",
    ),
];

/// Complete-season markers for one season. `{e}` is unused.
pub const SEASON_PACK_RULES: &[PatternRule] = &[
    // Show.Season.2, Show Season 02 1080p
    PatternRule::new("season_word", r"(?:^|[^a-z])season[ ._-]*0*{s}(?:[^0-9]|$)"),
    // Show.S02.Complete, Show S2Complete
    PatternRule::new("sxx_complete", r"(?:^|[^a-z0-9])s0*{s}[ ._-]*complete"),
    // Show.Complete.Season.2, Show.Complete.S02
    PatternRule::new(
        "complete_season",
        r"complete[ ._-]*s(?:eason)?[ ._-]*0*{s}(?:[^0-9]|$)",
    ),
    // Show.S02E00: the zero episode stands for the whole season
    PatternRule::new("sxx_e00", r"(?:^|[^a-z0-9])s0*{s}[ ._-]?e0+(?:[^0-9]|$)"),
    // Show.S02.1080p
    PatternRule::new("bare_sxx", r"(?:^|[^a-z0-9])s0*{s}(?:[^0-9e]|$)"),
];

/// Markers of one specific, non-zero episode. Season-independent.
pub const SPECIFIC_EPISODE_RULES: &[PatternRule] = &[
    PatternRule::new("sxxeyy", r"(?:^|[^a-z0-9])s\d{1,3}[ ._-]?e0*[1-9]"),
    PatternRule::new("nxm", r"(?:^|[^0-9])\d{1,2}x0*[1-9]\d{0,2}(?:[^0-9]|$)"),
    PatternRule::new("episode_word", r"(?:^|[^a-z])episode[ ._-]*0*[1-9]"),
];

/// Whole-series phrases. Season-independent.
pub const SERIES_PACK_RULES: &[PatternRule] = &[
    PatternRule::new("complete_series", r"complete[ ._-]*series|series[ ._-]*complete"),
    PatternRule::new("all_seasons", r"all[ ._-]*seasons"),
    // S01-S05, S01-05, S1~S3
    PatternRule::new(
        "season_range",
        r"(?:^|[^a-z0-9])s\d{1,2}[ ._]*(?:-|~|to)[ ._]*s?\d{1,2}(?:[^0-9e]|$)",
    ),
    // Seasons 1-3, Season 1 to 5
    PatternRule::new(
        "season_word_range",
        r"seasons?[ ._-]*\d{1,2}[ ._]*(?:-|~|to)[ ._]*\d{1,2}(?:[^0-9]|$)",
    ),
];

/// A path segment naming the target season folder. `{e}` is unused.
pub const SEASON_FOLDER_RULES: &[PatternRule] = &[
    PatternRule::new("season_word", r"(?:^|[^a-z])season[ ._-]*0*{s}(?:[^0-9]|$)"),
    PatternRule::new("sxx", r"(?:^|[^a-z0-9])s0*{s}(?:[^0-9e]|$)"),
];

/// Per-file episode number extraction, tried in order. Group 1 is the number.
pub const EPISODE_NUMBER_RULES: &[PatternRule] = &[
    PatternRule::new("e_marker", r"(?:^|[^a-z])e0*(\d{1,3})(?:[^0-9]|$)"),
    PatternRule::new("ep_word", r"(?:^|[^a-z])ep[ ._-]*0*(\d{1,3})(?:[^0-9]|$)"),
    PatternRule::new("episode_word", r"episode[ ._-]*0*(\d{1,3})(?:[^0-9]|$)"),
    PatternRule::new("leading_number", r"^0*(\d{1,3})(?:[^0-9]|$)"),
];

/// Season numbers mentioned anywhere in a name. Group 1 is the number.
///
/// These carry no trailing guard so that adjacent tokens (`S01.S02`) are
/// all found by a non-overlapping scan; callers reject a group that is
/// directly followed by another digit.
pub const SEASON_NUMBER_RULES: &[PatternRule] = &[
    PatternRule::new("sxx", r"(?:^|[^a-z0-9])s0*(\d{1,2})"),
    PatternRule::new("season_word", r"(?:^|[^a-z])season[ ._-]*0*(\d{1,2})"),
];
