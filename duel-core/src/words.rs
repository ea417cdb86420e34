use anyhow::{Result, anyhow};
use rand::seq::SliceRandom;
use std::collections::HashSet;
use std::path::Path;

const DEFAULT_WORDS: &str = include_str!("default_words.txt");

/// Dictionary of playable words. Backs both guess validation and target-word
/// selection for new matches.
pub struct WordList {
    words: HashSet<String>,
}

impl WordList {
    /// Build a word list from newline-separated text. Blank lines and `#`
    /// comments are skipped; words are lowercased and must be alphabetic.
    pub fn from_list(list: &str) -> Self {
        let words = list
            .lines()
            .map(|line| line.trim().to_lowercase())
            .filter(|word| !word.is_empty() && !word.starts_with('#'))
            .filter(|word| word.chars().all(|c| c.is_alphabetic()))
            .filter(|word| (4..=8).contains(&word.chars().count()))
            .collect();

        Self { words }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            anyhow!("failed to read word list {}: {}", path.as_ref().display(), e)
        })?;
        let list = Self::from_list(&contents);
        if list.is_empty() {
            return Err(anyhow!(
                "word list {} contains no usable words",
                path.as_ref().display()
            ));
        }
        Ok(list)
    }

    /// The word list compiled into the binary, used when WORDS_FILE is unset.
    pub fn embedded() -> Self {
        Self::from_list(DEFAULT_WORDS)
    }

    /// Small fixed dictionary for deterministic tests.
    pub fn with_test_words() -> Self {
        Self::from_list("kalem\nkamer\nmalek\nhello\nworld\ncrane\nslate\nbabes\nabbey\nzebra")
    }

    pub fn is_valid_word(&self, word: &str) -> bool {
        self.words.contains(&word.trim().to_lowercase())
    }

    /// Pick a random target word of the given length.
    pub fn random_word(&self, length: usize) -> Result<String> {
        let candidates: Vec<&String> = self
            .words
            .iter()
            .filter(|word| word.chars().count() == length)
            .collect();

        candidates
            .choose(&mut rand::thread_rng())
            .map(|word| (*word).clone())
            .ok_or_else(|| anyhow!("no words available of length {}", length))
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parsing_skips_comments_and_junk() {
        let list = WordList::from_list("hello\n# comment\n\n  WORLD  \nab\nnot-a-word\nx1x2x\n");
        assert!(list.is_valid_word("hello"));
        assert!(list.is_valid_word("world")); // lowercased
        assert!(list.is_valid_word("WORLD")); // case insensitive lookup
        assert!(!list.is_valid_word("ab")); // too short
        assert!(!list.is_valid_word("not-a-word"));
        assert!(!list.is_valid_word("x1x2x"));
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_random_word_respects_length() {
        let list = WordList::with_test_words();
        for _ in 0..20 {
            let word = list.random_word(5).unwrap();
            assert_eq!(word.chars().count(), 5);
            assert!(list.is_valid_word(&word));
        }
    }

    #[test]
    fn test_random_word_missing_length() {
        let list = WordList::with_test_words();
        assert!(list.random_word(8).is_err());
    }

    #[test]
    fn test_embedded_list_has_five_letter_words() {
        let list = WordList::embedded();
        assert!(!list.is_empty());
        assert!(list.random_word(5).is_ok());
    }
}
