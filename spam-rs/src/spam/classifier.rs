//! Pre-trained binary classifiers
//!
//! Classifiers are deserialized from a JSON artifact and never change after
//! load. Every model works on batches; single-message callers wrap their
//! vector in a one-element slice.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::types::{FeatureVector, Label, PredictionResult};
use crate::error::{Result, SpamError};

/// Artifact format understood by this build
pub const CLASSIFIER_FORMAT_VERSION: u32 = 1;

/// A frozen spam/ham classifier
pub trait Classifier: Send + Sync {
    /// Short model name for logs
    fn name(&self) -> &'static str;

    /// Input dimension the model was trained on
    fn n_features(&self) -> usize;

    /// Classify a batch of feature vectors
    fn predict(&self, batch: &[FeatureVector]) -> Result<Vec<PredictionResult>>;
}

/// Linear decision function `w·x + b`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearModel {
    pub coef: Vec<f64>,
    #[serde(default)]
    pub intercept: f64,
}

impl LinearModel {
    pub fn new(coef: Vec<f64>, intercept: f64) -> Self {
        Self { coef, intercept }
    }

    pub fn decision(&self, x: &FeatureVector) -> Result<f64> {
        Ok(x.dot(&self.coef)? + self.intercept)
    }
}

/// Multinomial naive Bayes parameters, index 0 = ham, 1 = spam
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NaiveBayesModel {
    pub class_log_prior: [f64; 2],
    pub feature_log_prob: [Vec<f64>; 2],
}

impl NaiveBayesModel {
    /// Joint log likelihood for (ham, spam)
    pub fn joint_log_likelihood(&self, x: &FeatureVector) -> Result<(f64, f64)> {
        let ham = self.class_log_prior[0] + x.dot(&self.feature_log_prob[0])?;
        let spam = self.class_log_prior[1] + x.dot(&self.feature_log_prob[1])?;
        Ok((ham, spam))
    }
}

/// Supported model families
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClassifierModel {
    LogisticRegression(LinearModel),
    LinearSvc(LinearModel),
    MultinomialNb(NaiveBayesModel),
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

impl ClassifierModel {
    fn predict_one(&self, x: &FeatureVector) -> Result<PredictionResult> {
        match self {
            ClassifierModel::LogisticRegression(model) => {
                let decision = model.decision(x)?;
                let p_spam = sigmoid(decision);
                Ok(if decision > 0.0 {
                    PredictionResult::new(Label::Spam, Some(p_spam))
                } else {
                    PredictionResult::new(Label::Ham, Some(1.0 - p_spam))
                })
            }
            ClassifierModel::LinearSvc(model) => {
                let label = if model.decision(x)? > 0.0 {
                    Label::Spam
                } else {
                    Label::Ham
                };
                Ok(PredictionResult::new(label, None))
            }
            ClassifierModel::MultinomialNb(model) => {
                let (ham, spam) = model.joint_log_likelihood(x)?;
                let p_spam = sigmoid(spam - ham);
                Ok(if spam > ham {
                    PredictionResult::new(Label::Spam, Some(p_spam))
                } else {
                    PredictionResult::new(Label::Ham, Some(1.0 - p_spam))
                })
            }
        }
    }

    fn weight_vectors(&self) -> Vec<&[f64]> {
        match self {
            ClassifierModel::LogisticRegression(m) | ClassifierModel::LinearSvc(m) => {
                vec![m.coef.as_slice()]
            }
            ClassifierModel::MultinomialNb(m) => vec![
                m.feature_log_prob[0].as_slice(),
                m.feature_log_prob[1].as_slice(),
            ],
        }
    }
}

/// Classifier artifact as stored on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierArtifact {
    format_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bundle_version: Option<String>,
    n_features: usize,
    model: ClassifierModel,
}

impl ClassifierArtifact {
    pub fn new(model: ClassifierModel, bundle_version: Option<String>) -> Result<Self> {
        let n_features = model
            .weight_vectors()
            .first()
            .map(|w| w.len())
            .unwrap_or(0);
        let artifact = Self {
            format_version: CLASSIFIER_FORMAT_VERSION,
            bundle_version,
            n_features,
            model,
        };
        artifact.validate()?;
        Ok(artifact)
    }

    /// Load a classifier artifact from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SpamError::ModelLoad(format!(
                "Failed to read model artifact {}: {}",
                path.display(),
                e
            ))
        })?;

        let artifact: Self = serde_json::from_str(&content).map_err(|e| {
            SpamError::ModelLoad(format!("Corrupt model artifact {}: {}", path.display(), e))
        })?;

        artifact.validate().map_err(|e| match e {
            SpamError::ModelLoad(msg) => {
                SpamError::ModelLoad(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })?;

        Ok(artifact)
    }

    /// Write the artifact as JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(std::io::BufWriter::new(file), self)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.format_version != CLASSIFIER_FORMAT_VERSION {
            return Err(SpamError::ModelLoad(format!(
                "Unsupported model format version {} (expected {})",
                self.format_version, CLASSIFIER_FORMAT_VERSION
            )));
        }

        if self.n_features == 0 {
            return Err(SpamError::ModelLoad("Model has no input features".to_string()));
        }

        for weights in self.model.weight_vectors() {
            if weights.len() != self.n_features {
                return Err(SpamError::ModelLoad(format!(
                    "Model declares {} features but has {} weights",
                    self.n_features,
                    weights.len()
                )));
            }
            if weights.iter().any(|w| !w.is_finite()) {
                return Err(SpamError::ModelLoad(
                    "Model weights must be finite".to_string(),
                ));
            }
        }

        Ok(())
    }

    pub fn bundle_version(&self) -> Option<&str> {
        self.bundle_version.as_deref()
    }

    pub fn model(&self) -> &ClassifierModel {
        &self.model
    }
}

impl Classifier for ClassifierArtifact {
    fn name(&self) -> &'static str {
        match self.model {
            ClassifierModel::LogisticRegression(_) => "logistic_regression",
            ClassifierModel::LinearSvc(_) => "linear_svc",
            ClassifierModel::MultinomialNb(_) => "multinomial_nb",
        }
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, batch: &[FeatureVector]) -> Result<Vec<PredictionResult>> {
        batch
            .iter()
            .map(|x| {
                if x.dim() != self.n_features {
                    return Err(SpamError::DimensionMismatch {
                        expected: self.n_features,
                        actual: x.dim(),
                    });
                }
                self.model.predict_one(x)
            })
            .collect()
    }
}
