//! Picks the one file to stream out of a torrent's file list.
//!
//! Stages, first success wins:
//! 1. keep video files only (by extension, no samples), largest first
//! 2. exact episode marker in the basename
//! 3. season folder + extracted episode number
//! 4. position inside the season folder (natural filename order)
//! 5. no episode target: the largest video file

use std::cmp::Ordering;

use crate::debrid::FileEntry;
use crate::matcher::{
    extract_episode_number, is_complete_series_pack, is_season_folder, matches_episode,
    season_numbers,
};

/// Extensions treated as playable video.
pub const VIDEO_EXTENSIONS: &[&str] = &[
    "mkv", "mp4", "avi", "mov", "wmv", "m4v", "webm", "ts", "m2ts",
];

/// What the release name told us about the torrent before its files were known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReleaseHint {
    /// The release name matched the requested episode.
    Episode,
    /// The release is a pack of the requested season; files may sit at the
    /// root without a season folder.
    SeasonPack,
    /// Nothing known (movies, series packs).
    #[default]
    Other,
}

/// Whether `path` is a playable video (and not a sample).
pub fn is_video_file(path: &str) -> bool {
    let lower = path.to_lowercase();
    if lower.contains("sample") {
        return false;
    }
    let ext = lower.rsplit('.').next().unwrap_or("");
    lower.contains('.') && VIDEO_EXTENSIONS.contains(&ext)
}

/// Last path component.
pub fn basename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Directory components of `path`, without the basename.
fn directories(path: &str) -> Vec<&str> {
    let mut parts: Vec<&str> = path
        .split(['/', '\\'])
        .filter(|segment| !segment.is_empty())
        .collect();
    parts.pop();
    parts
}

/// Whether `path` sits in the folder of `season`.
///
/// The deepest directory naming exactly one season decides. Directories
/// naming several seasons ("Show.S01-S03", "Seasons 1-3") say nothing about
/// the file and are skipped.
fn in_season_folder(path: &str, season: u32) -> bool {
    directories(path)
        .into_iter()
        .rev()
        .find(|dir| season_numbers(dir).len() == 1 && !is_complete_series_pack(dir))
        .is_some_and(|dir| is_season_folder(dir, season))
}

/// Video files of `files`, largest first. Equal sizes keep input order.
pub fn video_files(files: &[FileEntry]) -> Vec<&FileEntry> {
    let mut videos: Vec<&FileEntry> = files.iter().filter(|f| is_video_file(&f.path)).collect();
    videos.sort_by(|a, b| b.size_bytes.cmp(&a.size_bytes));
    videos
}

/// Select the best file for an optional season/episode target.
pub fn select_file(
    files: &[FileEntry],
    season: Option<u32>,
    episode: Option<u32>,
) -> Option<&FileEntry> {
    select_file_with_hint(files, season, episode, ReleaseHint::Other)
}

/// [`select_file`] with knowledge about the release the files came from.
///
/// For [`ReleaseHint::SeasonPack`] the whole list counts as the season
/// folder when no directory names the season. For [`ReleaseHint::Episode`]
/// the largest video file is the last resort.
pub fn select_file_with_hint(
    files: &[FileEntry],
    season: Option<u32>,
    episode: Option<u32>,
    hint: ReleaseHint,
) -> Option<&FileEntry> {
    let videos = video_files(files);
    if videos.is_empty() {
        return None;
    }

    let (season, episode) = match (season, episode) {
        (Some(s), Some(e)) => (s, e),
        _ => return videos.first().copied(),
    };

    if let Some(file) = videos
        .iter()
        .copied()
        .find(|f| matches_episode(basename(&f.path), season, episode))
    {
        return Some(file);
    }

    let mut folder: Vec<&FileEntry> = videos
        .iter()
        .copied()
        .filter(|f| in_season_folder(&f.path, season))
        .collect();
    if folder.is_empty() && hint == ReleaseHint::SeasonPack {
        folder = videos.clone();
    }

    if let Some(file) = by_extracted_number(&folder, episode) {
        return Some(file);
    }

    if let Some(file) = by_position(&folder, episode) {
        return Some(file);
    }

    if hint == ReleaseHint::Episode {
        return videos.first().copied();
    }

    None
}

fn by_extracted_number<'a>(folder: &[&'a FileEntry], episode: u32) -> Option<&'a FileEntry> {
    let mut numbered: Vec<(u32, &FileEntry)> = folder
        .iter()
        .filter_map(|f| extract_episode_number(basename(&f.path)).map(|n| (n, *f)))
        .collect();
    numbered.sort_by_key(|(n, _)| *n);
    numbered
        .into_iter()
        .find(|(n, _)| *n == episode)
        .map(|(_, f)| f)
}

fn by_position<'a>(folder: &[&'a FileEntry], episode: u32) -> Option<&'a FileEntry> {
    if episode == 0 || folder.len() < episode as usize {
        return None;
    }
    let mut ordered = folder.to_vec();
    ordered.sort_by(|a, b| natural_cmp(basename(&a.path), basename(&b.path)));
    ordered.get(episode as usize - 1).copied()
}

/// Compare strings treating digit runs as numbers ("ep2" < "ep10").
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = Chunks::new(a);
    let mut right = Chunks::new(b);
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = match (x, y) {
                    (Chunk::Number(m), Chunk::Number(n)) => {
                        let m_trim = m.trim_start_matches('0');
                        let n_trim = n.trim_start_matches('0');
                        m_trim
                            .len()
                            .cmp(&n_trim.len())
                            .then_with(|| m_trim.cmp(n_trim))
                    }
                    (Chunk::Number(_), Chunk::Text(_)) => Ordering::Less,
                    (Chunk::Text(_), Chunk::Number(_)) => Ordering::Greater,
                    (Chunk::Text(s), Chunk::Text(t)) => s.to_lowercase().cmp(&t.to_lowercase()),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

enum Chunk<'a> {
    Number(&'a str),
    Text(&'a str),
}

struct Chunks<'a> {
    rest: &'a str,
}

impl<'a> Chunks<'a> {
    fn new(s: &'a str) -> Self {
        Self { rest: s }
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Chunk<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let first = self.rest.chars().next()?;
        let digits = first.is_ascii_digit();
        let end = self
            .rest
            .find(|c: char| c.is_ascii_digit() != digits)
            .unwrap_or(self.rest.len());
        let (chunk, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(if digits {
            Chunk::Number(chunk)
        } else {
            Chunk::Text(chunk)
        })
    }
}
