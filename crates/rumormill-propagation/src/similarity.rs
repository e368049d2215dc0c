use similar::{Algorithm, TextDiff};

use crate::keywords::extract_keywords;

const MUTATION_SAMPLE: usize = 3;

/// Character-level match ratio of the lowercased texts, in `[0, 1]`.
pub fn similarity(content: &str, secret: &str) -> f64 {
    let content = content.to_lowercase();
    let secret = secret.to_lowercase();
    let diff = TextDiff::configure()
        .algorithm(Algorithm::Myers)
        .diff_chars(&content, &secret);
    f64::from(diff.ratio())
}

/// How many of `keywords` occur as substrings of `content_lower`.
pub fn keyword_hits(content_lower: &str, keywords: &[String]) -> usize {
    keywords
        .iter()
        .filter(|kw| content_lower.contains(kw.as_str()))
        .count()
}

/// Describe keyword drift between a retelling and the original.
pub fn mutation_descriptor(content: &str, original: &str) -> String {
    let content_keywords = unique(extract_keywords(content));
    let original_keywords = unique(extract_keywords(original));

    let added: Vec<&str> = content_keywords
        .iter()
        .filter(|k| !original_keywords.contains(k))
        .take(MUTATION_SAMPLE)
        .map(String::as_str)
        .collect();
    let lost: Vec<&str> = original_keywords
        .iter()
        .filter(|k| !content_keywords.contains(k))
        .take(MUTATION_SAMPLE)
        .map(String::as_str)
        .collect();

    let mut parts = Vec::new();
    if !added.is_empty() {
        parts.push(format!("added: {}", added.join(", ")));
    }
    if !lost.is_empty() {
        parts.push(format!("lost: {}", lost.join(", ")));
    }
    if parts.is_empty() {
        "minimal drift".to_string()
    } else {
        parts.join("; ")
    }
}

fn unique(keywords: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(keywords.len());
    for k in keywords {
        if !out.contains(&k) {
            out.push(k);
        }
    }
    out
}
