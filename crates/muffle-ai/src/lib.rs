pub mod classifier;
pub mod error;
pub mod http;
pub mod provider;
pub mod providers;
pub mod types;

pub use classifier::{default_examples, Classifier, Verdict};
pub use error::ClassifyError;
pub use provider::{create_provider, ClassificationProvider, ServiceConfig};
pub use types::{ClassificationExample, ClassificationRequest, ClassificationResult, Truncate};
