//! Wire types of the few-shot classify endpoint.

use serde::{Deserialize, Serialize};

/// A labelled `(text, label)` pair sent as few-shot context with every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationExample {
    pub text: String,
    pub label: String,
}

impl ClassificationExample {
    #[must_use]
    pub fn new(text: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            label: label.into(),
        }
    }
}

/// Which end of an over-long input the service may cut.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Truncate {
    None,
    Start,
    #[default]
    End,
}

/// Request body: `{ inputs, examples, truncate, model }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationRequest {
    pub inputs: Vec<String>,
    pub examples: Vec<ClassificationExample>,
    pub truncate: Truncate,
    pub model: String,
}

/// One prediction. Providers may send more fields; only these are read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub prediction: String,
    #[serde(default)]
    pub confidence: Option<f32>,
}

/// Response body. A missing `classifications` key decodes as empty.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ClassifyResponse {
    #[serde(default)]
    pub classifications: Vec<ClassificationResult>,
}
