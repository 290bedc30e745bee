//! TF-IDF feature extraction
//!
//! The vectorizer is a frozen artifact: vocabulary and IDF weights are fixed
//! when it is fitted and never grow at serving time. The analyzer mode
//! (raw text vs. normalized tokens) is stored in the artifact and the same
//! `analyze` path is used by both `fit` and `transform`.
//!
//! ```text
//! tf(t, d)    = count of t in d           (or 1 + ln(count) when sublinear)
//! idf(t)      = ln((1 + n) / (1 + df(t))) + 1
//! tfidf(t, d) = tf(t, d) * idf(t), then L2-normalised per document
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::OnceLock;
use tracing::debug;

use super::types::FeatureVector;
use crate::error::{Result, SpamError};
use crate::text::TextNormalizer;

/// Artifact format understood by this build
pub const VECTORIZER_FORMAT_VERSION: u32 = 1;

fn word_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b\w\w+\b").expect("static regex"))
}

/// How documents are turned into terms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Analyzer {
    /// Word tokens (two or more word characters) taken from the raw text
    Raw,
    /// Tokens from the text normalizer (stopwords removed, stemmed)
    Normalized,
}

/// Per-document vector normalisation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    L2,
}

fn default_true() -> bool {
    true
}

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

fn default_norm() -> Option<Norm> {
    Some(Norm::L2)
}

/// Frozen TF-IDF vectorizer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    format_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bundle_version: Option<String>,
    analyzer: Analyzer,
    #[serde(default = "default_true")]
    lowercase: bool,
    #[serde(default = "default_ngram_range")]
    ngram_range: (usize, usize),
    #[serde(default)]
    sublinear_tf: bool,
    #[serde(default = "default_norm")]
    norm: Option<Norm>,
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
}

/// Settings for fitting a vectorizer from a corpus
#[derive(Debug, Clone)]
pub struct FitOptions {
    pub analyzer: Analyzer,
    pub ngram_range: (usize, usize),
    pub sublinear_tf: bool,
    pub norm: Option<Norm>,
    /// Terms must appear in at least this many documents
    pub min_df: usize,
    /// Keep only the most frequent terms
    pub max_features: Option<usize>,
    pub bundle_version: Option<String>,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            analyzer: Analyzer::Raw,
            ngram_range: (1, 1),
            sublinear_tf: false,
            norm: Some(Norm::L2),
            min_df: 1,
            max_features: None,
            bundle_version: None,
        }
    }
}

impl TfidfVectorizer {
    /// Fit vocabulary and IDF weights on a corpus
    pub fn fit<S: AsRef<str>>(documents: &[S], options: FitOptions) -> Result<Self> {
        if documents.is_empty() {
            return Err(SpamError::InvalidInput(
                "Cannot fit on empty documents".to_string(),
            ));
        }

        let (min_n, max_n) = options.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(SpamError::InvalidInput(format!(
                "Invalid ngram range ({}, {})",
                min_n, max_n
            )));
        }

        let mut vectorizer = Self {
            format_version: VECTORIZER_FORMAT_VERSION,
            bundle_version: options.bundle_version,
            analyzer: options.analyzer,
            lowercase: true,
            ngram_range: options.ngram_range,
            sublinear_tf: options.sublinear_tf,
            norm: options.norm,
            vocabulary: HashMap::new(),
            idf: Vec::new(),
        };

        let mut term_freq: HashMap<String, usize> = HashMap::new();
        let mut doc_freq: HashMap<String, usize> = HashMap::new();

        for doc in documents {
            let terms = vectorizer.analyze(doc.as_ref());
            let mut seen: HashSet<&str> = HashSet::new();
            for term in &terms {
                *term_freq.entry(term.clone()).or_insert(0) += 1;
                if seen.insert(term.as_str()) {
                    *doc_freq.entry(term.clone()).or_insert(0) += 1;
                }
            }
        }

        let mut kept: Vec<(String, usize)> = term_freq
            .into_iter()
            .filter(|(term, _)| doc_freq.get(term).copied().unwrap_or(0) >= options.min_df)
            .collect();

        if let Some(max_features) = options.max_features {
            kept.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            kept.truncate(max_features);
        }

        if kept.is_empty() {
            return Err(SpamError::InvalidInput(
                "Empty vocabulary; documents contain no usable terms".to_string(),
            ));
        }

        let mut terms: Vec<String> = kept.into_iter().map(|(term, _)| term).collect();
        terms.sort();

        let n_docs = documents.len() as f64;
        vectorizer.idf = terms
            .iter()
            .map(|term| {
                let df = doc_freq.get(term).copied().unwrap_or(0) as f64;
                ((1.0 + n_docs) / (1.0 + df)).ln() + 1.0
            })
            .collect();
        vectorizer.vocabulary = terms
            .into_iter()
            .enumerate()
            .map(|(index, term)| (term, index))
            .collect();

        debug!(
            "Fitted TF-IDF vectorizer: {} documents, {} terms",
            documents.len(),
            vectorizer.vocabulary.len()
        );

        Ok(vectorizer)
    }

    /// Load a vectorizer artifact from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SpamError::ModelLoad(format!(
                "Failed to read vectorizer artifact {}: {}",
                path.display(),
                e
            ))
        })?;

        let vectorizer: Self = serde_json::from_str(&content).map_err(|e| {
            SpamError::ModelLoad(format!(
                "Corrupt vectorizer artifact {}: {}",
                path.display(),
                e
            ))
        })?;

        vectorizer.validate().map_err(|e| match e {
            SpamError::ModelLoad(msg) => {
                SpamError::ModelLoad(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })?;

        Ok(vectorizer)
    }

    /// Write the artifact as JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(std::io::BufWriter::new(file), self)?;
        Ok(())
    }

    /// Check internal consistency of a deserialized artifact
    pub fn validate(&self) -> Result<()> {
        if self.format_version != VECTORIZER_FORMAT_VERSION {
            return Err(SpamError::ModelLoad(format!(
                "Unsupported vectorizer format version {} (expected {})",
                self.format_version, VECTORIZER_FORMAT_VERSION
            )));
        }

        self.check_ngram_range()?;

        if self.vocabulary.is_empty() {
            return Err(SpamError::ModelLoad("Vectorizer vocabulary is empty".to_string()));
        }

        if self.idf.len() != self.vocabulary.len() {
            return Err(SpamError::ModelLoad(format!(
                "Vectorizer has {} IDF weights for {} vocabulary terms",
                self.idf.len(),
                self.vocabulary.len()
            )));
        }

        let mut used = vec![false; self.idf.len()];
        for (term, &index) in &self.vocabulary {
            if index >= used.len() || used[index] {
                return Err(SpamError::ModelLoad(format!(
                    "Invalid vocabulary index {} for term '{}'",
                    index, term
                )));
            }
            used[index] = true;
        }

        if self.idf.iter().any(|w| !w.is_finite()) {
            return Err(SpamError::ModelLoad(
                "Vectorizer IDF weights must be finite".to_string(),
            ));
        }

        Ok(())
    }

    fn check_ngram_range(&self) -> Result<()> {
        let (min_n, max_n) = self.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(SpamError::ModelLoad(format!(
                "Invalid ngram range ({}, {})",
                min_n, max_n
            )));
        }
        Ok(())
    }

    /// Turn a document into the terms counted against the vocabulary
    pub fn analyze(&self, text: &str) -> Vec<String> {
        let tokens: Vec<String> = match self.analyzer {
            Analyzer::Raw => {
                let text = if self.lowercase {
                    text.to_lowercase()
                } else {
                    text.to_string()
                };
                word_pattern()
                    .find_iter(&text)
                    .map(|m| m.as_str().to_string())
                    .collect()
            }
            Analyzer::Normalized => TextNormalizer::shared().normalize(text),
        };

        let (min_n, max_n) = self.ngram_range;
        if min_n == 1 && max_n == 1 {
            return tokens;
        }

        let mut terms = Vec::new();
        for n in min_n..=max_n {
            for window in tokens.windows(n) {
                terms.push(window.join(" "));
            }
        }
        terms
    }

    /// Transform a batch of documents into feature vectors
    ///
    /// Terms outside the vocabulary are ignored.
    pub fn transform<S: AsRef<str>>(&self, documents: &[S]) -> Result<Vec<FeatureVector>> {
        documents
            .iter()
            .map(|doc| self.transform_one(doc.as_ref()))
            .collect()
    }

    fn transform_one(&self, text: &str) -> Result<FeatureVector> {
        let mut counts: HashMap<usize, f64> = HashMap::new();
        for term in self.analyze(text) {
            if let Some(&index) = self.vocabulary.get(&term) {
                *counts.entry(index).or_insert(0.0) += 1.0;
            }
        }

        let entries = counts
            .into_iter()
            .map(|(index, count)| {
                let tf = if self.sublinear_tf { 1.0 + count.ln() } else { count };
                (index, tf * self.idf[index])
            })
            .collect();

        let mut vector = FeatureVector::from_entries(self.dim(), entries)?;
        if self.norm == Some(Norm::L2) {
            vector.normalize_l2();
        }
        Ok(vector)
    }

    /// Vectorize a single document (wrapped as a one-element batch)
    pub fn vectorize(&self, text: &str) -> Result<FeatureVector> {
        self.transform(&[text])?
            .pop()
            .ok_or_else(|| SpamError::Internal("Vectorizer returned an empty batch".to_string()))
    }

    /// Number of output features
    pub fn dim(&self) -> usize {
        self.idf.len()
    }

    pub fn analyzer(&self) -> Analyzer {
        self.analyzer
    }

    pub fn bundle_version(&self) -> Option<&str> {
        self.bundle_version.as_deref()
    }

    pub fn vocabulary(&self) -> &HashMap<String, usize> {
        &self.vocabulary
    }

    /// Feature index of a term, if it is in the vocabulary
    pub fn term_index(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(term).copied()
    }

    pub fn idf(&self) -> &[f64] {
        &self.idf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<&'static str> {
        vec![
            "win money now",
            "win a free prize now",
            "hello friend",
            "see you at lunch friend",
        ]
    }

    #[test]
    fn test_fit_builds_sorted_vocabulary() {
        let v = TfidfVectorizer::fit(&corpus(), FitOptions::default()).unwrap();
        // "a" is a single character and is skipped by the raw analyzer
        assert_eq!(v.dim(), 11);
        assert_eq!(v.term_index("at"), Some(0));
        assert_eq!(v.term_index("win"), Some(9));
        assert_eq!(v.term_index("you"), Some(10));
        assert_eq!(v.term_index("a"), None);
    }

    #[test]
    fn test_idf_weights() {
        let v = TfidfVectorizer::fit(&corpus(), FitOptions::default()).unwrap();
        let n = 4.0f64;
        let win = v.idf()[v.term_index("win").unwrap()];
        let money = v.idf()[v.term_index("money").unwrap()];
        assert!((win - (((1.0 + n) / 3.0).ln() + 1.0)).abs() < 1e-12);
        assert!((money - (((1.0 + n) / 2.0).ln() + 1.0)).abs() < 1e-12);
        assert!(money > win);
    }

    #[test]
    fn test_transform_ignores_unknown_terms() {
        let v = TfidfVectorizer::fit(&corpus(), FitOptions::default()).unwrap();
        let vector = v.vectorize("zebra quantum xylophone").unwrap();
        assert_eq!(vector.dim(), v.dim());
        assert!(vector.is_zero());
    }

    #[test]
    fn test_transform_is_l2_normalised() {
        let v = TfidfVectorizer::fit(&corpus(), FitOptions::default()).unwrap();
        let vector = v.vectorize("WIN money, win money!").unwrap();
        assert_eq!(vector.nnz(), 2);
        assert!((vector.l2_norm() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_transform_batch_matches_single() {
        let v = TfidfVectorizer::fit(&corpus(), FitOptions::default()).unwrap();
        let batch = v.transform(&["hello friend", "win now"]).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0], v.vectorize("hello friend").unwrap());
        assert_eq!(batch[1], v.vectorize("win now").unwrap());
    }

    #[test]
    fn test_normalized_analyzer_uses_stems() {
        let options = FitOptions {
            analyzer: Analyzer::Normalized,
            ..FitOptions::default()
        };
        let v = TfidfVectorizer::fit(&["Winning the lottery", "hello friends"], options).unwrap();
        assert!(v.term_index("win").is_some());
        assert!(v.term_index("lotteri").is_some());
        assert!(v.term_index("the").is_none());

        let vector = v.vectorize("They won? No, WINNING!").unwrap();
        assert_eq!(vector.nnz(), 1);
        assert!(vector.get(v.term_index("win").unwrap()) > 0.0);
    }

    #[test]
    fn test_bigrams() {
        let options = FitOptions {
            ngram_range: (1, 2),
            ..FitOptions::default()
        };
        let v = TfidfVectorizer::fit(&["click here now"], options).unwrap();
        assert!(v.term_index("click here").is_some());
        assert!(v.term_index("here now").is_some());
        assert_eq!(v.dim(), 5);
    }

    #[test]
    fn test_max_features_and_min_df() {
        let options = FitOptions {
            min_df: 2,
            ..FitOptions::default()
        };
        let v = TfidfVectorizer::fit(&corpus(), options).unwrap();
        let mut terms: Vec<&String> = v.vocabulary().keys().collect();
        terms.sort();
        assert_eq!(terms, vec!["friend", "now", "win"]);

        let options = FitOptions {
            max_features: Some(1),
            ..FitOptions::default()
        };
        let v = TfidfVectorizer::fit(&corpus(), options).unwrap();
        assert_eq!(v.dim(), 1);
        assert_eq!(v.term_index("friend"), Some(0));
    }

    #[test]
    fn test_fit_rejects_empty_corpus() {
        let empty: Vec<&str> = Vec::new();
        assert!(TfidfVectorizer::fit(&empty, FitOptions::default()).is_err());
        assert!(TfidfVectorizer::fit(&["!!! ?"], FitOptions::default()).is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vectorizer.json");
        let v = TfidfVectorizer::fit(&corpus(), FitOptions::default()).unwrap();
        v.save(&path).unwrap();

        let loaded = TfidfVectorizer::load(&path).unwrap();
        assert_eq!(loaded.dim(), v.dim());
        assert_eq!(
            loaded.vectorize("win money").unwrap(),
            v.vectorize("win money").unwrap()
        );
    }

    #[test]
    fn test_load_rejects_inconsistent_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vectorizer.json");
        std::fs::write(
            &path,
            r#"{"format_version": 1, "analyzer": "raw",
                "vocabulary": {"win": 0, "money": 0}, "idf": [1.0, 1.0]}"#,
        )
        .unwrap();
        assert!(matches!(
            TfidfVectorizer::load(&path),
            Err(SpamError::ModelLoad(_))
        ));

        std::fs::write(
            &path,
            r#"{"format_version": 7, "analyzer": "raw",
                "vocabulary": {"win": 0}, "idf": [1.0]}"#,
        )
        .unwrap();
        match TfidfVectorizer::load(&path) {
            Err(SpamError::ModelLoad(msg)) => assert!(msg.contains("format version")),
            other => panic!("expected ModelLoad, got {:?}", other),
        }
    }

    #[test]
    fn test_artifact_defaults() {
        let v: TfidfVectorizer = serde_json::from_str(
            r#"{"format_version": 1, "analyzer": "normalized",
                "vocabulary": {"win": 0}, "idf": [1.5]}"#,
        )
        .unwrap();
        assert!(v.validate().is_ok());
        assert_eq!(v.analyzer(), Analyzer::Normalized);
        assert_eq!(v.ngram_range, (1, 1));
        assert_eq!(v.norm, Some(Norm::L2));
        assert!(v.bundle_version().is_none());
    }
}
