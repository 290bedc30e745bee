//! Spam detector
//!
//! Single entry point for classifying message text: validates input,
//! vectorizes it with the bundle's own analyzer and returns the label.

use std::sync::Arc;
use tracing::debug;

use super::bundle::ModelBundle;
use super::types::{PredictionResult, RawText};
use crate::error::Result;

/// Classifier façade over a shared, read-only model bundle
#[derive(Debug, Clone)]
pub struct SpamDetector {
    bundle: Arc<ModelBundle>,
}

impl SpamDetector {
    pub fn new(bundle: Arc<ModelBundle>) -> Self {
        Self { bundle }
    }

    pub fn bundle(&self) -> &ModelBundle {
        &self.bundle
    }

    /// Classify a message
    ///
    /// Fails with `InvalidInput` when the text is empty after trimming.
    pub fn predict(&self, text: &str) -> Result<PredictionResult> {
        let text = RawText::new(text)?;
        self.predict_raw(&text)
    }

    /// Classify already-validated text
    pub fn predict_raw(&self, text: &RawText) -> Result<PredictionResult> {
        let features = self.bundle.vectorize(text.as_str())?;
        debug!(
            "Vectorized {} chars into {} non-zero features",
            text.as_str().len(),
            features.nnz()
        );
        self.bundle.classify(features)
    }

    /// Classify and return the bare label: 1 = spam, 0 = ham
    pub fn predict_label(&self, text: &str) -> Result<u8> {
        Ok(self.predict(text)?.score)
    }
}

/// Join an optional subject line and a body the way the mail check endpoint does
pub fn combine_title_and_message(title: &str, message: &str) -> String {
    format!("{} {}", title, message).trim().to_string()
}
