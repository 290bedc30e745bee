//! Text preprocessing
//!
//! Deterministic normalization shared by offline cleaning and the
//! `normalized` vectorizer analyzer.

pub mod normalizer;
pub mod stopwords;

pub use normalizer::{normalize, TextNormalizer};
