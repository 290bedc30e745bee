//! Spam classification module
//!
//! TF-IDF feature extraction over a frozen vocabulary, pre-trained binary
//! classifiers, and the detector that ties them into `predict(text)`.

pub mod bundle;
pub mod classifier;
pub mod detector;
pub mod types;
pub mod vectorizer;

pub use bundle::ModelBundle;
pub use classifier::{Classifier, ClassifierArtifact, ClassifierModel, LinearModel, NaiveBayesModel};
pub use detector::{combine_title_and_message, SpamDetector};
pub use types::*;
pub use vectorizer::{Analyzer, FitOptions, Norm, TfidfVectorizer};
