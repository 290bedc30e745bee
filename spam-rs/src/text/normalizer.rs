//! Text normalization pipeline
//!
//! Converts raw message text to the canonical token sequence used for
//! feature extraction. The step order is fixed: the vectorizer vocabulary was
//! built from tokens produced in exactly this order.

use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;
use std::sync::OnceLock;

use super::stopwords;

fn non_alphanumeric() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-z0-9\s]").expect("static regex"))
}

fn whitespace_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("static regex"))
}

/// Lowercase, punctuation-stripping, stopword-removing, stemming normalizer
pub struct TextNormalizer {
    stemmer: Stemmer,
    stopwords: HashSet<&'static str>,
}

impl TextNormalizer {
    /// Create a normalizer with the English stemmer and stopword set
    pub fn new() -> Self {
        Self {
            stemmer: Stemmer::create(Algorithm::English),
            stopwords: stopwords::english(),
        }
    }

    /// Process-wide instance, built on first use
    pub fn shared() -> &'static TextNormalizer {
        static SHARED: OnceLock<TextNormalizer> = OnceLock::new();
        SHARED.get_or_init(TextNormalizer::new)
    }

    /// Steps 1-4: lowercase, strip punctuation and other symbols, collapse whitespace
    pub fn clean_characters(&self, text: &str) -> String {
        let lowered = text.to_lowercase();

        let without_punctuation: String = lowered
            .chars()
            .filter(|c| !c.is_ascii_punctuation())
            .collect();

        let alphanumeric = non_alphanumeric().replace_all(&without_punctuation, "");

        whitespace_run()
            .replace_all(&alphanumeric, " ")
            .trim()
            .to_string()
    }

    /// Full pipeline: returns stemmed, stopword-filtered tokens
    pub fn normalize(&self, text: &str) -> Vec<String> {
        let cleaned = self.clean_characters(text);

        cleaned
            .split_whitespace()
            .filter(|token| !self.stopwords.contains(token))
            .map(|token| self.stemmer.stem(token).into_owned())
            .collect()
    }

    /// Normalized tokens joined by single spaces (offline "clean text" form)
    pub fn clean(&self, text: &str) -> String {
        self.normalize(text).join(" ")
    }
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalize with the shared instance
pub fn normalize(text: &str) -> Vec<String> {
    TextNormalizer::shared().normalize(text)
}
