//! Wire data model shared with the scoring service and the profile
//! collaborator. Field names follow the backend's camelCase JSON.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Response envelope used by every scoring-service endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImprovementTrend {
    Improving,
    Stable,
    Declining,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Pdf,
    Json,
    Csv,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub notifications_enabled: bool,
    pub data_sharing: bool,
    pub report_format: ReportFormat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    pub total_assessments: u32,
    /// Mean risk score across assessments, in [0,1].
    pub average_score: f64,
    pub improvement_trend: ImprovementTrend,
    pub preferences: Preferences,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssessmentType {
    Speech,
    Text,
    Comprehensive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentStatus {
    Completed,
    InProgress,
    Failed,
}

/// The four cognitive sub-scores produced per assessment, each in [0,1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureScores {
    pub memory: f64,
    pub attention: f64,
    pub language: f64,
    pub executive: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentRecord {
    pub assessment_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: AssessmentType,
    pub risk_score: f64,
    pub confidence: f64,
    /// Session length in seconds.
    pub duration: u64,
    pub features: FeatureScores,
    pub status: AssessmentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportanceLevel {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyFinding {
    pub finding: String,
    pub importance: ImportanceLevel,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insights {
    pub top_positive_features: Vec<String>,
    pub top_negative_features: Vec<String>,
    pub key_findings: Vec<KeyFinding>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interpretability {
    pub global_importance: f64,
    pub local_explanation: String,
    pub uncertainty: f64,
}

/// One generated visualization artifact, as reported by the explainer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualizationPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    pub status: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Structured output of the model-interpretability service: why a risk
/// score was produced, as per-feature attributions plus ranked insights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplanationRecord {
    pub explanation_id: String,
    pub timestamp: DateTime<Utc>,
    pub risk_score: f64,
    pub confidence: f64,
    /// Feature name -> SHAP attribution. BTreeMap keeps serialized output
    /// deterministic for export round-trips.
    pub shap_values: BTreeMap<String, f64>,
    pub visualizations: BTreeMap<String, VisualizationPayload>,
    pub insights: Insights,
    pub interpretability: Interpretability,
}

/// Options payload for the POST generate call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplainOptions {
    pub types: Vec<String>,
    pub include_visualizations: bool,
}

impl Default for ExplainOptions {
    fn default() -> Self {
        Self {
            types: ["waterfall", "bar", "force", "summary"]
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            include_visualizations: true,
        }
    }
}
