use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ClassifyError;
use crate::providers::cohere::CohereProvider;
use crate::types::{ClassificationRequest, ClassificationResult};

/// Environment variable that takes precedence over a configured API key.
pub const API_KEY_ENV: &str = "MUFFLE_API_KEY";

pub const DEFAULT_ENDPOINT: &str = "https://api.cohere.ai/v1/classify";
pub const DEFAULT_MODEL: &str = "large";
pub const DEFAULT_VIOLATING_LABEL: &str = "Toxic";

/// Trait for few-shot classification backends
#[async_trait]
pub trait ClassificationProvider: Send + Sync {
    /// Classify every input of the request, returning predictions in the
    /// order the service ranked them.
    async fn classify(
        &self,
        request: &ClassificationRequest,
    ) -> Result<Vec<ClassificationResult>, ClassifyError>;

    /// Human-readable backend name, used in logs and error messages
    fn name(&self) -> &str;
}

/// Connection settings for the classification service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub violating_label: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            violating_label: DEFAULT_VIOLATING_LABEL.to_string(),
        }
    }
}

impl ServiceConfig {
    /// API key from the environment, falling back to the configured one.
    #[must_use]
    pub fn effective_api_key(&self) -> Option<String> {
        pick_api_key(std::env::var(API_KEY_ENV).ok(), self.api_key.as_deref())
    }
}

fn pick_api_key(from_env: Option<String>, configured: Option<&str>) -> Option<String> {
    from_env
        .filter(|key| !key.trim().is_empty())
        .or_else(|| {
            configured
                .filter(|key| !key.trim().is_empty())
                .map(str::to_string)
        })
}

/// Create the HTTP provider described by the configuration
///
/// # Errors
///
/// Returns [`ClassifyError::MissingApiKey`] if neither the environment nor
/// the configuration supplies an API key.
pub fn create_provider(
    config: &ServiceConfig,
) -> Result<Box<dyn ClassificationProvider>, ClassifyError> {
    let api_key = config
        .effective_api_key()
        .ok_or(ClassifyError::MissingApiKey)?;
    Ok(Box::new(CohereProvider::new(&api_key, Some(&config.endpoint))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_key_wins_over_configured() {
        let key = pick_api_key(Some("from-env".to_string()), Some("from-file"));
        assert_eq!(key.as_deref(), Some("from-env"));
    }

    #[test]
    fn test_blank_env_key_falls_back() {
        let key = pick_api_key(Some("  ".to_string()), Some("from-file"));
        assert_eq!(key.as_deref(), Some("from-file"));
    }

    #[test]
    fn test_no_key_anywhere() {
        assert!(pick_api_key(None, None).is_none());
        assert!(pick_api_key(None, Some("")).is_none());
    }

    #[test]
    fn test_default_service_config() {
        let config = ServiceConfig::default();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.model, "large");
        assert_eq!(config.violating_label, "Toxic");
        assert!(config.api_key.is_none());
    }
}
