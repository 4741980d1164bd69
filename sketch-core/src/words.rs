use anyhow::{Context, Result, anyhow};
use rand::seq::SliceRandom;
use std::path::Path;

/// The word source: a flat list picked from uniformly at random.
///
/// An empty bank is representable (the file may be missing words) but a
/// pick from it fails, which aborts the start-round request upstream.
pub struct WordBank {
    words: Vec<String>,
}

impl WordBank {
    /// Parse a newline-separated word list. Blank lines and `#` comments
    /// are skipped; words are trimmed and lowercased.
    pub fn new(word_list: &str) -> Self {
        let words = word_list
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_lowercase)
            .collect();

        Self { words }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read word list {}", path.display()))?;
        Ok(Self::new(&contents))
    }

    /// Draw one word uniformly at random.
    pub fn pick(&self) -> Result<String> {
        self.words
            .choose(&mut rand::thread_rng())
            .cloned()
            .ok_or_else(|| anyhow!("word bank is empty"))
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}
