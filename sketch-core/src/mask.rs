//! Word masking and guess normalization.
//!
//! Masks substitute an underscore per unrevealed letter and keep whitespace
//! in place, so the pattern always has the same shape as the secret word.
//! Normalization (trim + lowercase) applies to comparison only, never to
//! what gets displayed.

/// Canonical form used for guess comparison.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Case-insensitive, whitespace-trimmed exact match.
pub fn matches(guess: &str, word: &str) -> bool {
    normalize(guess) == normalize(word)
}

/// The round-start pattern: every letter hidden.
pub fn fully_masked(word: &str) -> String {
    word.chars()
        .map(|c| if c.is_whitespace() { c } else { '_' })
        .collect()
}

/// The mid-round checkpoint pattern: every third letter visible
/// (index % 3 == 0), the rest hidden.
pub fn partially_revealed(word: &str) -> String {
    word.chars()
        .enumerate()
        .map(|(i, c)| {
            if c.is_whitespace() || i % 3 == 0 {
                c
            } else {
                '_'
            }
        })
        .collect()
}
