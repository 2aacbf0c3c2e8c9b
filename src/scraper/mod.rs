//! Scrape collaborator boundary
//!
//! The core never inspects platform payloads. Collaborators hand back
//! canonical video records as JSON items through the [`ScraperSource`]
//! capability; ingestion decodes and validates each item on its own.

mod remote;
mod target;

pub use remote::{DisabledScraperSource, HttpScraperSource};
pub use target::{ScrapeTarget, TargetKind};

use async_trait::async_trait;

use crate::error::AppError;

/// Fetches normalized video records for a profile or video target.
///
/// Each item is a JSON object in the `VideoRecord` shape. A malformed item
/// fails alone at ingestion. Implementations own their rate limiting.
/// Failures are reported as [`AppError::UpstreamUnavailable`] for the single
/// target only.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ScraperSource: Send + Sync {
    async fn fetch(
        &self,
        target: &ScrapeTarget,
        limit: u32,
    ) -> Result<Vec<serde_json::Value>, AppError>;
}

/// Build the configured collaborator, or a disabled one when no endpoint is set.
pub fn from_config(
    config: &crate::config::ScraperConfig,
) -> Result<std::sync::Arc<dyn ScraperSource>, AppError> {
    match config.endpoint.as_deref().map(str::trim) {
        Some(endpoint) if !endpoint.is_empty() => {
            let source = HttpScraperSource::new(config)?;
            tracing::info!(endpoint, "Scraper gateway configured");
            Ok(std::sync::Arc::new(source))
        }
        _ => Ok(std::sync::Arc::new(DisabledScraperSource)),
    }
}
