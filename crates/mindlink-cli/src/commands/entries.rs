//! Diary entry command implementations

use anyhow::{Context, Result};
use mindlink_core::aggregate::{mood_trajectory, tag_frequency, LOW_MOOD_THRESHOLD};
use mindlink_core::safety::{matched_crisis_keywords, CRISIS_RESOURCES};
use mindlink_core::store::EntryStore;
use mindlink_core::NewEntry;

use super::truncate;

/// List the most recent entries, newest first
pub async fn cmd_entries_list(store: &dyn EntryStore, limit: usize) -> Result<()> {
    let entries = store
        .list_entries()
        .await
        .context("Failed to read diary entries")?;

    if entries.is_empty() {
        println!("No entries yet. Add one with: mindlink entries add --text \"...\"");
        return Ok(());
    }

    println!("{:<12} {:>5}  {:<24}  TEXT", "DATE", "MOOD", "TAGS");
    println!("{}", "-".repeat(90));

    for entry in entries.iter().rev().take(limit) {
        let mood = entry
            .mood
            .map(|m| format!("{}/10", m))
            .unwrap_or_else(|| "-".to_string());
        let tags = entry
            .tags
            .iter()
            .map(|t| format!("#{}", t))
            .collect::<Vec<_>>()
            .join(" ");
        println!(
            "{:<12} {:>5}  {:<24}  {}",
            entry.date,
            mood,
            truncate(&tags, 24),
            truncate(&entry.response.replace('\n', " "), 45)
        );
    }

    if entries.len() > limit {
        println!("\n... and {} more", entries.len() - limit);
    }

    Ok(())
}

/// Write a new entry dated today
pub async fn cmd_entries_add(
    store: &dyn EntryStore,
    text: String,
    mood: Option<u8>,
    tags: Vec<String>,
    prompt: Option<String>,
) -> Result<()> {
    let notice = crisis_notice(&text);
    let entry = NewEntry {
        response: text,
        mood,
        tags,
        prompt,
    };

    let key = store
        .save_entry(&entry)
        .await
        .context("Could not save entry")?;
    println!("✅ Saved entry {}", key);

    if let Some(notice) = notice {
        tracing::warn!("Crisis language detected in new entry");
        println!("\n{}", notice);
    }

    Ok(())
}

/// Hotline text to show when `text` contains crisis language
pub fn crisis_notice(text: &str) -> Option<String> {
    if matched_crisis_keywords(text).is_empty() {
        return None;
    }
    let mut lines = vec!["⚠️  You're not alone.".to_string()];
    lines.extend(CRISIS_RESOURCES.iter().map(|line| format!("  {}", line)));
    Some(lines.join("\n"))
}

/// Mood trajectory and tag counts without any model calls
pub async fn cmd_entries_stats(store: &dyn EntryStore) -> Result<()> {
    let entries = store
        .list_entries()
        .await
        .context("Failed to read diary entries")?;
    print!("{}", render_stats(&entries));
    Ok(())
}

pub fn render_stats(entries: &[mindlink_core::DiaryEntry]) -> String {
    if entries.is_empty() {
        return "No entries yet.\n".to_string();
    }

    let mut out = format!("📈 Mood Trajectory ({} entries)\n\n", entries.len());
    for point in mood_trajectory(entries) {
        match point.mood {
            Some(mood) => {
                let marker = if mood < LOW_MOOD_THRESHOLD { "  ← low" } else { "" };
                out.push_str(&format!(
                    "  {}: {:>2}/10 {}{}\n",
                    point.date,
                    mood,
                    "█".repeat(mood as usize),
                    marker
                ));
            }
            None => out.push_str(&format!("  {}:  -\n", point.date)),
        }
    }

    let tags = tag_frequency(entries);
    out.push_str("\n🏷️  Tag Frequency\n\n");
    if tags.is_empty() {
        out.push_str("  (no tags)\n");
    }
    let mut by_count: Vec<_> = tags.into_iter().collect();
    by_count.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    for (tag, count) in by_count {
        out.push_str(&format!("  #{}: {} times\n", tag, count));
    }
    out
}
