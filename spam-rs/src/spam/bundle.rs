//! Frozen vectorizer + classifier pair
//!
//! Both artifacts are loaded together at startup and validated as one unit:
//! the vectorizer output dimension must equal the classifier input dimension,
//! and declared bundle versions must agree.

use std::path::Path;
use tracing::{info, warn};

use super::classifier::{Classifier, ClassifierArtifact};
use super::types::{FeatureVector, PredictionResult};
use super::vectorizer::TfidfVectorizer;
use crate::error::{Result, SpamError};

pub struct ModelBundle {
    vectorizer: TfidfVectorizer,
    classifier: Box<dyn Classifier>,
    version: Option<String>,
}

impl ModelBundle {
    /// Pair an in-memory vectorizer and classifier
    pub fn new<C>(vectorizer: TfidfVectorizer, classifier: C) -> Result<Self>
    where
        C: Classifier + 'static,
    {
        if vectorizer.dim() != classifier.n_features() {
            return Err(SpamError::ModelLoad(format!(
                "Vectorizer produces {} features but {} expects {}",
                vectorizer.dim(),
                classifier.name(),
                classifier.n_features()
            )));
        }

        let version = vectorizer.bundle_version().map(str::to_string);
        Ok(Self {
            vectorizer,
            classifier: Box::new(classifier),
            version,
        })
    }

    /// Load both artifacts from disk
    ///
    /// Any failure here is fatal for the service.
    pub fn load(model_path: &Path, vectorizer_path: &Path) -> Result<Self> {
        info!("Loading model from {}", model_path.display());
        let classifier = ClassifierArtifact::load(model_path)?;

        info!("Loading vectorizer from {}", vectorizer_path.display());
        let vectorizer = TfidfVectorizer::load(vectorizer_path)?;

        match (classifier.bundle_version(), vectorizer.bundle_version()) {
            (Some(model), Some(vec)) if model != vec => {
                return Err(SpamError::ModelLoad(format!(
                    "Artifact version mismatch: model is '{}', vectorizer is '{}'",
                    model, vec
                )));
            }
            (Some(_), None) | (None, Some(_)) => {
                warn!("Only one artifact declares a bundle version; pairing cannot be verified");
            }
            _ => {}
        }

        let version = classifier
            .bundle_version()
            .or(vectorizer.bundle_version())
            .map(str::to_string);

        let mut bundle = Self::new(vectorizer, classifier)?;
        bundle.version = version;

        info!(
            "Model bundle ready: {} over {} features ({:?} analyzer, version {})",
            bundle.classifier.name(),
            bundle.vectorizer.dim(),
            bundle.vectorizer.analyzer(),
            bundle.version.as_deref().unwrap_or("unversioned")
        );

        Ok(bundle)
    }

    pub fn vectorizer(&self) -> &TfidfVectorizer {
        &self.vectorizer
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Vectorize one document as a single-item batch
    pub fn vectorize(&self, text: &str) -> Result<FeatureVector> {
        self.vectorizer.vectorize(text)
    }

    /// Run the classifier on one vector and extract the single result
    pub fn classify(&self, features: FeatureVector) -> Result<PredictionResult> {
        self.classifier
            .predict(std::slice::from_ref(&features))?
            .into_iter()
            .next()
            .ok_or_else(|| SpamError::Internal("Classifier returned an empty batch".to_string()))
    }
}

impl std::fmt::Debug for ModelBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelBundle")
            .field("classifier", &self.classifier.name())
            .field("n_features", &self.vectorizer.dim())
            .field("analyzer", &self.vectorizer.analyzer())
            .field("version", &self.version)
            .finish()
    }
}
