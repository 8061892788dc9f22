//! Crisis language detection
//!
//! A fixed keyword list matched as case-insensitive substrings. It is a
//! prompt to show hotline information, not a classifier.

/// Phrases that trigger the crisis resources
pub const CRISIS_KEYWORDS: &[&str] = &[
    "suicide",
    "kill myself",
    "end my life",
    "can't go on",
    "want to die",
    "hopeless",
    "worthless",
    "no way out",
    "give up",
    "self-harm",
    "cut myself",
    "hurt myself",
    "overdose",
    "jump off",
    "hang myself",
    "take my life",
    "死",
    "自殺",
];

/// Lines shown to the user when crisis language is detected
pub const CRISIS_RESOURCES: &[&str] = &[
    "If you are in crisis or need urgent help:",
    "Please reach out immediately to a trusted adult or one of these 24/7 hotlines:",
    "Suicide Prevention Hotline: 2896 0000",
    "Samaritans 24hr Hotline: 2382 0000",
];

/// Keywords found in `text`, in list order
pub fn matched_crisis_keywords(text: &str) -> Vec<&'static str> {
    let lower = text.to_lowercase();
    CRISIS_KEYWORDS
        .iter()
        .copied()
        .filter(|keyword| lower.contains(keyword))
        .collect()
}

pub fn contains_crisis_language(text: &str) -> bool {
    let lower = text.to_lowercase();
    CRISIS_KEYWORDS.iter().any(|keyword| lower.contains(keyword))
}
