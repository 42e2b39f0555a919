//! Merging of indexer results by info hash.

use std::collections::HashMap;

use super::TorrentRecord;

/// Merge records sharing an info hash and drop records without a valid one.
///
/// The first occurrence keeps its position, name and source; seeders and
/// leechers take the maximum across duplicates (indexers often mirror the
/// same tracker stats), and missing size, magnet or publish date are filled
/// from later duplicates. Every surviving record carries its canonical
/// lowercase hash.
pub fn dedup_records(records: Vec<TorrentRecord>) -> Vec<TorrentRecord> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut merged: Vec<TorrentRecord> = Vec::new();

    for mut record in records {
        let Some(hash) = record.resolved_info_hash() else {
            continue;
        };

        match index.get(&hash) {
            Some(&pos) => {
                let existing = &mut merged[pos];
                existing.seeds = existing.seeds.max(record.seeds);
                existing.leeches = existing.leeches.max(record.leeches);
                if existing.size_bytes.is_none() {
                    existing.size_bytes = record.size_bytes;
                }
                if existing.magnet_link.is_none() {
                    existing.magnet_link = record.magnet_link;
                }
                if let Some(date) = record.published_at {
                    existing.published_at = Some(match existing.published_at {
                        Some(existing_date) => existing_date.min(date),
                        None => date,
                    });
                }
            }
            None => {
                record.info_hash = hash.clone();
                index.insert(hash, merged.len());
                merged.push(record);
            }
        }
    }

    merged
}
