//! Parsing helpers shared by indexer adapters.

use once_cell::sync::Lazy;
use regex_lite::Regex;

static SIZE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d+(?:[.,]\d+)?)\s*(b|kb|mb|gb|tb|kib|mib|gib|tib)\b").unwrap()
});

static MAGNET_HASH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)xt=urn:btih:([0-9a-f]{40})(?:[^0-9a-f]|$)").unwrap());

/// Parse a human-readable size ("1.5 GB", "700 MiB") into bytes.
///
/// Decimal and binary suffixes are both treated as powers of 1024, which is
/// what torrent sites mean by either.
pub fn parse_size(text: &str) -> Option<u64> {
    let caps = SIZE.captures(text)?;
    let value: f64 = caps.get(1)?.as_str().replace(',', ".").parse().ok()?;
    let unit = caps.get(2)?.as_str().to_lowercase();
    let exponent = match unit.trim_end_matches("ib").trim_end_matches('b') {
        "" => 0,
        "k" => 1,
        "m" => 2,
        "g" => 3,
        "t" => 4,
        _ => return None,
    };
    Some((value * 1024f64.powi(exponent)).round() as u64)
}

/// Extract the lowercase info hash from a magnet URI.
pub fn info_hash_from_magnet(magnet: &str) -> Option<String> {
    MAGNET_HASH
        .captures(magnet)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_lowercase())
}

/// Whether `hash` is a 40-character hex string.
pub fn is_valid_info_hash(hash: &str) -> bool {
    hash.len() == 40 && hash.chars().all(|c| c.is_ascii_hexdigit())
}
