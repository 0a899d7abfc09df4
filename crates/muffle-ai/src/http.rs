//! HTTP utilities for the classification service.

use crate::error::ClassifyError;

/// Extension trait for `reqwest::Response` to handle common error patterns.
#[async_trait::async_trait]
pub trait ResponseExt {
    /// Ensure the response status is successful, returning an error with details if not.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifyError::Api`] if the response status is not successful (2xx),
    /// carrying the status code and response body.
    async fn ensure_success(self, service: &str) -> Result<Self, ClassifyError>
    where
        Self: Sized;
}

#[async_trait::async_trait]
impl ResponseExt for reqwest::Response {
    async fn ensure_success(self, service: &str) -> Result<Self, ClassifyError> {
        if !self.status().is_success() {
            let status = self.status().as_u16();
            let body = self.text().await.unwrap_or_default();
            return Err(ClassifyError::Api {
                service: service.to_string(),
                status,
                body,
            });
        }
        Ok(self)
    }
}
