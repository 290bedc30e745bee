//! Spam types and data structures

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, SpamError};

/// Binary classification label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    /// Legitimate message (0)
    Ham,
    /// Unwanted message (1)
    Spam,
}

impl Label {
    /// Numeric score: 1 for spam, 0 for ham
    pub fn score(self) -> u8 {
        match self {
            Label::Ham => 0,
            Label::Spam => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Label::Ham => "ham",
            Label::Spam => "spam",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of classifying one message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub label: Label,
    /// 1 = spam, 0 = ham
    pub score: u8,
    /// Probability of `label`, when the classifier provides one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl PredictionResult {
    pub fn new(label: Label, confidence: Option<f64>) -> Self {
        Self {
            label,
            score: label.score(),
            confidence,
        }
    }
}

/// Validated message text: a string that is non-empty after trimming
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawText(String);

impl RawText {
    /// Validate a string input
    pub fn new(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(SpamError::InvalidInput(
                "Input text cannot be empty".to_string(),
            ));
        }
        Ok(Self(text))
    }

    /// Validate dynamically-typed input (anything but a JSON string is rejected)
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::String(s) => Self::new(s.as_str()),
            _ => Err(SpamError::InvalidInput("Input must be a string".to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for RawText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Fixed-dimension feature vector in sparse form
///
/// Entries are sorted by index and every index is below `dim`.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    dim: usize,
    entries: Vec<(usize, f64)>,
}

impl FeatureVector {
    /// Build from (index, value) pairs; duplicate indices are summed
    pub fn from_entries(dim: usize, mut entries: Vec<(usize, f64)>) -> Result<Self> {
        if let Some(&(index, _)) = entries.iter().find(|(i, _)| *i >= dim) {
            return Err(SpamError::DimensionMismatch {
                expected: dim,
                actual: index + 1,
            });
        }

        entries.sort_by_key(|(i, _)| *i);
        let mut merged: Vec<(usize, f64)> = Vec::with_capacity(entries.len());
        for (index, value) in entries {
            match merged.last_mut() {
                Some((last, acc)) if *last == index => *acc += value,
                _ => merged.push((index, value)),
            }
        }
        merged.retain(|(_, v)| *v != 0.0);

        Ok(Self {
            dim,
            entries: merged,
        })
    }

    /// All-zero vector
    pub fn zeros(dim: usize) -> Self {
        Self {
            dim,
            entries: Vec::new(),
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Non-zero (index, value) pairs in index order
    pub fn entries(&self) -> &[(usize, f64)] {
        &self.entries
    }

    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    pub fn is_zero(&self) -> bool {
        self.entries.is_empty()
    }

    /// Value at `index` (zero when absent)
    pub fn get(&self, index: usize) -> f64 {
        self.entries
            .binary_search_by_key(&index, |(i, _)| *i)
            .map(|pos| self.entries[pos].1)
            .unwrap_or(0.0)
    }

    /// Dot product with a dense weight vector of the same dimension
    pub fn dot(&self, weights: &[f64]) -> Result<f64> {
        if weights.len() != self.dim {
            return Err(SpamError::DimensionMismatch {
                expected: weights.len(),
                actual: self.dim,
            });
        }
        Ok(self.entries.iter().map(|&(i, v)| weights[i] * v).sum())
    }

    pub fn l2_norm(&self) -> f64 {
        self.entries.iter().map(|(_, v)| v * v).sum::<f64>().sqrt()
    }

    /// Scale to unit L2 norm; zero vectors are left unchanged
    pub fn normalize_l2(&mut self) {
        let norm = self.l2_norm();
        if norm > 0.0 {
            for (_, v) in &mut self.entries {
                *v /= norm;
            }
        }
    }

    /// Dense copy
    pub fn to_dense(&self) -> Vec<f64> {
        let mut dense = vec![0.0; self.dim];
        for &(i, v) in &self.entries {
            dense[i] = v;
        }
        dense
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_label_scores() {
        assert_eq!(Label::Spam.score(), 1);
        assert_eq!(Label::Ham.score(), 0);
        assert_eq!(Label::Spam.to_string(), "spam");
    }

    #[test]
    fn test_prediction_result_serialization() {
        let result = PredictionResult::new(Label::Spam, None);
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value, json!({"label": "spam", "score": 1}));

        let result = PredictionResult::new(Label::Ham, Some(0.75));
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["confidence"], 0.75);
        assert_eq!(value["score"], 0);
    }

    #[test]
    fn test_raw_text_validation() {
        assert!(RawText::new("hello").is_ok());
        assert!(matches!(RawText::new(""), Err(SpamError::InvalidInput(_))));
        assert!(matches!(RawText::new(" \t\n "), Err(SpamError::InvalidInput(_))));
    }

    #[test]
    fn test_raw_text_from_json() {
        assert_eq!(
            RawText::from_json(&json!("win money")).unwrap().as_str(),
            "win money"
        );

        for value in [json!(null), json!(42), json!(["a"]), json!({"text": "a"})] {
            match RawText::from_json(&value) {
                Err(SpamError::InvalidInput(msg)) => assert!(msg.contains("string")),
                other => panic!("expected InvalidInput for {}, got {:?}", value, other),
            }
        }
    }

    #[test]
    fn test_feature_vector_merges_and_sorts() {
        let v = FeatureVector::from_entries(5, vec![(3, 1.0), (1, 2.0), (3, 0.5)]).unwrap();
        assert_eq!(v.entries(), &[(1, 2.0), (3, 1.5)]);
        assert_eq!(v.get(3), 1.5);
        assert_eq!(v.get(0), 0.0);
        assert_eq!(v.to_dense(), vec![0.0, 2.0, 0.0, 1.5, 0.0]);
    }

    #[test]
    fn test_feature_vector_rejects_out_of_range() {
        let result = FeatureVector::from_entries(2, vec![(2, 1.0)]);
        assert!(matches!(result, Err(SpamError::DimensionMismatch { .. })));
    }

    #[test]
    fn test_dot_checks_dimension() {
        let v = FeatureVector::from_entries(3, vec![(0, 1.0), (2, 2.0)]).unwrap();
        assert_eq!(v.dot(&[1.0, 5.0, 0.5]).unwrap(), 2.0);
        assert!(v.dot(&[1.0, 2.0]).is_err());
    }

    #[test]
    fn test_normalize_l2() {
        let mut v = FeatureVector::from_entries(2, vec![(0, 3.0), (1, 4.0)]).unwrap();
        v.normalize_l2();
        assert!((v.get(0) - 0.6).abs() < 1e-12);
        assert!((v.get(1) - 0.8).abs() < 1e-12);

        let mut zero = FeatureVector::zeros(4);
        zero.normalize_l2();
        assert!(zero.is_zero());
    }
}
