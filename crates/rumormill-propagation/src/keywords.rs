use std::sync::LazyLock;

use regex::Regex;

const MAX_KEYWORDS: usize = 10;

static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[a-zA-Z]{3,}\b").expect("word pattern must compile"));

const STOPWORDS: &[&str] = &[
    "the", "a", "an", "is", "are", "was", "were", "be", "been", "have", "has", "had", "do", "does",
    "did", "will", "would", "could", "should", "may", "might", "must", "shall", "can", "to", "of",
    "in", "for", "on", "with", "at", "by", "from", "that", "this", "these", "those", "it", "its",
    "as", "or", "and", "but", "if", "so", "than", "too", "very", "just",
];

fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(&word)
}

/// Matching keywords for `text`: content words first, then adjacent word
/// pairs with at least one content word. At most ten, duplicates kept.
pub fn extract_keywords(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let words: Vec<&str> = WORD.find_iter(&lower).map(|m| m.as_str()).collect();

    let mut keywords: Vec<String> = words
        .iter()
        .filter(|w| !is_stopword(w))
        .map(|w| w.to_string())
        .collect();

    for pair in words.windows(2) {
        if !is_stopword(pair[0]) || !is_stopword(pair[1]) {
            keywords.push(format!("{} {}", pair[0], pair[1]));
        }
    }

    keywords.truncate(MAX_KEYWORDS);
    keywords
}
