//! Quantitative aggregation over diary entries
//!
//! Pure functions, no model calls. These give the session brief its
//! objective anchor before any text is sent to a generation backend.

use crate::models::{DiaryEntry, MoodPoint, TagFrequency};

/// Entries with a mood strictly below this score are low-mood days
pub const LOW_MOOD_THRESHOLD: u8 = 4;

/// Separator placed between entry texts when they are joined for a prompt
const ENTRY_SEPARATOR: &str = "\n\n";

/// Map every entry to a mood point, preserving order
///
/// Entries without a mood are kept with `mood: None`.
pub fn mood_trajectory(entries: &[DiaryEntry]) -> Vec<MoodPoint> {
    entries
        .iter()
        .map(|e| MoodPoint {
            date: e.date.clone(),
            mood: e.mood,
        })
        .collect()
}

/// Count tag occurrences across all entries
///
/// Tags are compared by exact string equality.
pub fn tag_frequency(entries: &[DiaryEntry]) -> TagFrequency {
    let mut counts = TagFrequency::new();
    for tag in entries.iter().flat_map(|e| e.tags.iter()) {
        *counts.entry(tag.clone()).or_insert(0) += 1;
    }
    counts
}

/// All entry texts joined with a blank line
pub fn joined_responses(entries: &[DiaryEntry]) -> String {
    join(entries.iter())
}

/// Texts of low-mood entries joined with a blank line
///
/// Empty when no entry qualifies.
pub fn low_mood_text(entries: &[DiaryEntry]) -> String {
    join(
        entries
            .iter()
            .filter(|e| e.is_low_mood(LOW_MOOD_THRESHOLD)),
    )
}

fn join<'a>(entries: impl Iterator<Item = &'a DiaryEntry>) -> String {
    entries
        .map(|e| e.response.as_str())
        .collect::<Vec<_>>()
        .join(ENTRY_SEPARATOR)
}
