use thiserror::Error;

/// Failure modes of a single classification attempt.
///
/// Every variant is local to the request that produced it; callers decide
/// whether a failure matters (the feed pipeline treats all of them as
/// "leave the item alone").
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("request to {service} failed: {source}")]
    Transport {
        service: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} API error ({status}): {body}")]
    Api {
        service: String,
        status: u16,
        body: String,
    },

    #[error("failed to decode {service} response: {source}")]
    Decode {
        service: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("classification response contained no predictions")]
    NoPredictions,

    #[error("API key required for the classification service")]
    MissingApiKey,
}
