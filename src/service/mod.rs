//! Data-service seams for the dashboard.
//!
//! Both the HTTP backend and the built-in mock dataset sit behind the same
//! traits, so the controller never knows which one it is talking to.

pub mod http;
pub mod mock;
pub mod retry;

use crate::error::FetchError;
use crate::records::{AssessmentRecord, ExplainOptions, ExplanationRecord, UserProfile};
use async_trait::async_trait;

/// Source of explanation records.
#[async_trait]
pub trait ExplanationService: Send + Sync {
    /// Fetch a stored explanation by its canonical id.
    async fn fetch(&self, explanation_id: &str) -> Result<ExplanationRecord, FetchError>;

    /// Run explanation generation against a scoring result and return the
    /// freshly produced record.
    async fn generate(
        &self,
        scoring_id: &str,
        options: &ExplainOptions,
    ) -> Result<ExplanationRecord, FetchError>;
}

/// Source of user profile and assessment history records. The two fetches
/// are separate methods so their failures stay independent.
#[async_trait]
pub trait ProfileService: Send + Sync {
    async fn fetch_profile(&self, user_id: &str) -> Result<UserProfile, FetchError>;

    async fn fetch_assessments(&self, user_id: &str) -> Result<Vec<AssessmentRecord>, FetchError>;
}
