use crate::error::ClassifyError;
use crate::provider::{create_provider, ClassificationProvider, ServiceConfig};
use crate::types::{ClassificationExample, ClassificationRequest, ClassificationResult, Truncate};

/// Few-shot examples used when the configuration supplies none.
#[must_use]
pub fn default_examples() -> Vec<ClassificationExample> {
    vec![
        ClassificationExample::new(
            "Warning to all people: keep your social distancing from me",
            "Toxic",
        ),
        ClassificationExample::new("Chelsea is just a bunch of losers", "Benign"),
        ClassificationExample::new(
            "piece of junk is what this is, doesn't work at all",
            "Benign",
        ),
    ]
}

/// Decision derived from the top-ranked prediction for one input.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub prediction: String,
    pub confidence: Option<f32>,
    /// `prediction` equals the violating label exactly (case-sensitive)
    pub violating: bool,
}

/// Turns text into a [`Verdict`] using a fixed example set and model.
pub struct Classifier {
    provider: Box<dyn ClassificationProvider>,
    examples: Vec<ClassificationExample>,
    model: String,
    violating_label: String,
}

impl Classifier {
    #[must_use]
    pub fn new(
        provider: Box<dyn ClassificationProvider>,
        examples: Vec<ClassificationExample>,
        model: impl Into<String>,
        violating_label: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            examples,
            model: model.into(),
            violating_label: violating_label.into(),
        }
    }

    /// Build a classifier backed by the configured HTTP provider
    ///
    /// # Errors
    ///
    /// Returns an error if no API key is available.
    pub fn from_config(
        config: &ServiceConfig,
        examples: Vec<ClassificationExample>,
    ) -> Result<Self, ClassifyError> {
        let provider = create_provider(config)?;
        log::info!(
            "Classifier using {} model '{}' with {} example(s)",
            provider.name(),
            config.model,
            examples.len()
        );
        Ok(Self::new(
            provider,
            examples,
            config.model.clone(),
            config.violating_label.clone(),
        ))
    }

    #[must_use]
    pub fn violating_label(&self) -> &str {
        &self.violating_label
    }

    /// One request carrying `inputs`, the example set, end truncation and the model.
    #[must_use]
    pub fn build_request(&self, inputs: Vec<String>) -> ClassificationRequest {
        ClassificationRequest {
            inputs,
            examples: self.examples.clone(),
            truncate: Truncate::End,
            model: self.model.clone(),
        }
    }

    /// Classify a single text, consuming only the top-ranked prediction.
    ///
    /// # Errors
    ///
    /// Returns the provider's error, or [`ClassifyError::NoPredictions`] if the
    /// service answered without any prediction.
    pub async fn classify(&self, text: &str) -> Result<Verdict, ClassifyError> {
        let request = self.build_request(vec![text.to_string()]);
        let top = self
            .provider
            .classify(&request)
            .await?
            .into_iter()
            .next()
            .ok_or(ClassifyError::NoPredictions)?;
        Ok(self.verdict_for(top))
    }

    /// Classify several texts in one request, one result per returned prediction.
    ///
    /// # Errors
    ///
    /// Returns the provider's error, or [`ClassifyError::NoPredictions`] if the
    /// service answered without any prediction.
    pub async fn classify_many(&self, texts: &[String]) -> Result<Vec<Verdict>, ClassifyError> {
        let request = self.build_request(texts.to_vec());
        let results = self.provider.classify(&request).await?;
        if results.is_empty() {
            return Err(ClassifyError::NoPredictions);
        }
        Ok(results.into_iter().map(|r| self.verdict_for(r)).collect())
    }

    #[must_use]
    pub fn verdict_for(&self, result: ClassificationResult) -> Verdict {
        let violating = result.prediction == self.violating_label;
        Verdict {
            prediction: result.prediction,
            confidence: result.confidence,
            violating,
        }
    }
}
