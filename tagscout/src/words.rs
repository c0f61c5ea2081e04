use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::errors::TagScoutResult;

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\p{L}\p{N}]+").unwrap());

/// A word and how often it occurs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordCount {
    pub word: String,
    pub count: usize,
}

/// Counts words in `text`, case-insensitively
///
/// A word is a maximal run of letters and digits. The result is sorted by
/// count descending, then by word.
pub fn count_words(text: &str) -> Vec<WordCount> {
    let normalized = text.to_lowercase();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for word in WORD.find_iter(&normalized) {
        *counts.entry(word.as_str()).or_default() += 1;
    }

    let mut sorted: Vec<WordCount> = counts
        .into_iter()
        .map(|(word, count)| WordCount {
            word: word.to_string(),
            count,
        })
        .collect();
    sorted.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.word.cmp(&b.word)));

    debug!("Counted {} distinct words", sorted.len());
    sorted
}

/// Counts words in the file at `path`
pub fn count_words_in_file(path: impl AsRef<Path>) -> TagScoutResult<Vec<WordCount>> {
    let text = fs::read_to_string(path)?;
    Ok(count_words(&text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn pairs(counts: &[WordCount]) -> Vec<(&str, usize)> {
        counts.iter().map(|c| (c.word.as_str(), c.count)).collect()
    }

    #[test]
    fn test_counts_and_orders() {
        let counts = count_words("The cat, the dog; THE end. Dog!");
        assert_eq!(
            pairs(&counts),
            vec![("the", 3), ("dog", 2), ("cat", 1), ("end", 1)]
        );
    }

    #[test]
    fn test_digits_and_unicode() {
        let counts = count_words("route66 Über über 42-42");
        assert_eq!(pairs(&counts), vec![("42", 2), ("über", 2), ("route66", 1)]);
    }

    #[test]
    fn test_empty_input() {
        assert!(count_words("").is_empty());
        assert!(count_words(" ,.;!? ").is_empty());
    }

    #[test]
    fn test_count_words_in_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("text.txt");
        fs::write(&path, "one two two").unwrap();

        let counts = count_words_in_file(&path).unwrap();
        assert_eq!(pairs(&counts), vec![("two", 2), ("one", 1)]);

        assert!(count_words_in_file(dir.path().join("missing.txt")).is_err());
    }
}
