//! Episode and season classification of release names.
//!
//! Each predicate walks an ordered list of named [`PatternRule`]s (see
//! [`rules`]); the first matching rule wins. Release naming in the wild is
//! inconsistent, so the lists are independent heuristics rather than one
//! grammar. All predicates are pure and case-insensitive.

pub mod rules;

pub use rules::PatternRule;

use rules::{
    EPISODE_NUMBER_RULES, EPISODE_RULES, SEASON_FOLDER_RULES, SEASON_NUMBER_RULES,
    SEASON_PACK_RULES, SERIES_PACK_RULES, SPECIFIC_EPISODE_RULES,
};

/// First rule of `rules` matching `text`, if any.
pub fn first_matching_rule(
    rules: &'static [PatternRule],
    text: &str,
    season: u32,
    episode: u32,
) -> Option<&'static PatternRule> {
    rules.iter().find(|rule| rule.is_match(text, season, episode))
}

/// True if `name` encodes exactly `season` + `episode`.
pub fn matches_episode(name: &str, season: u32, episode: u32) -> bool {
    first_matching_rule(EPISODE_RULES, name, season, episode).is_some()
}

/// True if `name` carries a marker of one specific, non-zero episode.
pub fn has_specific_episode(name: &str) -> bool {
    first_matching_rule(SPECIFIC_EPISODE_RULES, name, 0, 0).is_some()
}

/// True if `name` looks like a complete pack of `season`.
///
/// A name that also encodes a specific non-zero episode is never a pack;
/// `E00` counts as a pack marker.
pub fn is_season_pack(name: &str, season: u32) -> bool {
    if has_specific_episode(name) {
        return false;
    }
    first_matching_rule(SEASON_PACK_RULES, name, season, 0).is_some()
}

/// True if `name` bundles the whole series.
///
/// Checked in order: the phrase rules in [`rules::SERIES_PACK_RULES`], then
/// two or more distinct season numbers, then a bare "complete" with no
/// season number at all.
pub fn is_complete_series_pack(name: &str) -> bool {
    if has_specific_episode(name) {
        return false;
    }
    if first_matching_rule(SERIES_PACK_RULES, name, 0, 0).is_some() {
        return true;
    }
    let seasons = season_numbers(name);
    if seasons.len() >= 2 {
        return true;
    }
    seasons.is_empty() && name.to_lowercase().contains("complete")
}

/// Distinct season numbers mentioned in `name`, ascending.
pub fn season_numbers(name: &str) -> Vec<u32> {
    let mut seasons: Vec<u32> = SEASON_NUMBER_RULES
        .iter()
        .filter_map(|rule| rule.compile(0, 0))
        .flat_map(|re| {
            re.captures_iter(name)
                .filter_map(|caps| caps.get(1))
                .filter(|m| {
                    !name[m.end()..]
                        .chars()
                        .next()
                        .is_some_and(|c| c.is_ascii_digit())
                })
                .filter_map(|m| m.as_str().parse::<u32>().ok())
                .collect::<Vec<_>>()
        })
        .collect();
    seasons.sort_unstable();
    seasons.dedup();
    seasons
}

/// True if a single path segment names the folder of `season`.
pub fn is_season_folder(segment: &str, season: u32) -> bool {
    first_matching_rule(SEASON_FOLDER_RULES, segment, season, 0).is_some()
}

/// Extract an episode number from a file basename.
///
/// Tries `Eyy`, `epN`, `episode N`, then a leading bare number.
pub fn extract_episode_number(basename: &str) -> Option<u32> {
    EPISODE_NUMBER_RULES.iter().find_map(|rule| {
        rule.compile(0, 0)
            .and_then(|re| re.captures(basename))
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<u32>().ok())
    })
}
