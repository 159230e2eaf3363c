//! Provider client configuration with sensible defaults.
//!
//! Both the embedding and chat providers speak the OpenAI-compatible API;
//! a custom base URL can point them at any compatible endpoint.

use crate::error::NovaError;
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Default timeout for provider API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Create a provider client with the default timeout.
pub fn create_client() -> Client<OpenAIConfig> {
    create_client_with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
}

/// Create a provider client with a custom timeout.
///
/// Every provider call runs under this bound so a stuck request cannot
/// hang an ingestion or query indefinitely.
pub fn create_client_with_timeout(timeout: Duration) -> Client<OpenAIConfig> {
    let http_client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .expect("Failed to create HTTP client");

    Client::with_config(OpenAIConfig::default()).with_http_client(http_client)
}

/// Map an async-openai error into the Nova taxonomy.
///
/// Quota exhaustion becomes `RateLimited` and transport failures become
/// `Http`; both are retryable. Everything else from the provider surface
/// is `ProviderUnavailable`, surfaced as-is.
pub fn map_api_error(context: &str, err: async_openai::error::OpenAIError) -> NovaError {
    use async_openai::error::OpenAIError;

    match err {
        OpenAIError::ApiError(api) => {
            let rate_limited = api
                .code
                .as_deref()
                .map(|c| c.contains("rate_limit"))
                .unwrap_or(false)
                || api.message.to_lowercase().contains("rate limit");
            if rate_limited {
                NovaError::RateLimited(format!("{}: {}", context, api.message))
            } else {
                NovaError::ProviderUnavailable(format!("{}: {}", context, api.message))
            }
        }
        OpenAIError::Reqwest(e) => NovaError::Http(e),
        other => NovaError::ProviderUnavailable(format!("{}: {}", context, other)),
    }
}
