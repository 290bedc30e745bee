//! spam-rs: Spam/ham classification service
//!
//! Classifies email text as spam or ham with a frozen TF-IDF vectorizer and
//! a pre-trained linear or naive Bayes classifier, served over HTTP.
//!
//! # Features
//!
//! - **Text normalization**: lowercase, punctuation stripping, stopword
//!   removal and Snowball stemming, shared by offline cleaning and serving
//! - **Feature extraction**: TF-IDF over a fixed vocabulary
//! - **Classification**: logistic regression, linear SVM or multinomial NB
//! - **HTTP API**: `/`, `/check-mail` and `/health` with per-client rate limiting
//!
//! # Example
//!
//! ```no_run
//! use spam_rs::spam::{ModelBundle, SpamDetector};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bundle = ModelBundle::load(
//!         Path::new("models/model.json"),
//!         Path::new("models/vectorizer.json"),
//!     )?;
//!     let detector = SpamDetector::new(Arc::new(bundle));
//!
//!     let result = detector.predict("You win money now!!!")?;
//!     println!("{} ({})", result.label, result.score);
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration management
//! - [`error`]: Error types and handling
//! - [`text`]: Text normalization
//! - [`spam`]: Vectorizer, classifiers and the detector
//! - [`security`]: Rate limiting
//! - [`api`]: HTTP API

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod security;
pub mod spam;
pub mod text;

// Re-export commonly used types
pub use config::Config;
pub use error::{Result, SpamError};
