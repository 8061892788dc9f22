//! Data models for MindLink

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

/// Lowest mood score a diary entry may carry
pub const MIN_MOOD: u8 = 1;

/// Highest mood score a diary entry may carry
pub const MAX_MOOD: u8 = 10;

/// A persisted diary entry
///
/// Entries are written by the journaling flow and are read-only to the
/// insight pipeline. Several entries may share the same date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiaryEntry {
    /// Calendar date (`YYYY-MM-DD`)
    pub date: String,
    /// Free-form journal text, may be empty
    #[serde(default, deserialize_with = "null_as_default")]
    pub response: String,
    /// Mood score 1-10, `None` when the entry has no mood data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<u8>,
    /// Short labels chosen by the user
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    /// The journaling prompt this entry answered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

impl DiaryEntry {
    /// Check the invariants a stored record must satisfy to be usable
    pub fn validate(&self) -> Result<()> {
        if self.date.trim().is_empty() {
            return Err(Error::InvalidData("entry has no date".into()));
        }
        if let Some(mood) = self.mood {
            validate_mood(mood)?;
        }
        Ok(())
    }

    /// Whether this entry counts as a low-mood day
    pub fn is_low_mood(&self, threshold: u8) -> bool {
        self.mood.is_some_and(|m| m < threshold)
    }
}

/// Input for writing a new diary entry
#[derive(Debug, Clone, Default)]
pub struct NewEntry {
    pub response: String,
    pub mood: Option<u8>,
    pub tags: Vec<String>,
    pub prompt: Option<String>,
}

impl NewEntry {
    /// Reject entries the journaling flow would refuse to save
    pub fn validate(&self) -> Result<()> {
        if self.response.trim().is_empty() {
            return Err(Error::InvalidData(
                "Please write something before saving.".into(),
            ));
        }
        if let Some(mood) = self.mood {
            validate_mood(mood)?;
        }
        Ok(())
    }
}

fn validate_mood(mood: u8) -> Result<()> {
    if (MIN_MOOD..=MAX_MOOD).contains(&mood) {
        Ok(())
    } else {
        Err(Error::InvalidData(format!(
            "mood {} is outside {}..={}",
            mood, MIN_MOOD, MAX_MOOD
        )))
    }
}

/// One point of the mood trajectory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodPoint {
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<u8>,
}

/// Tag → number of entries carrying it
///
/// Ordered so rendered reports and prompt payloads are stable.
pub type TagFrequency = BTreeMap<String, usize>;

/// Treat an explicit JSON `null` like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
