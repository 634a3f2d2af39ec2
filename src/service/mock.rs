//! Deterministic in-process dataset behind the service traits.
//!
//! Used by the binary when no backend is configured and by tests that need
//! predictable records and call accounting.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::error::FetchError;
use crate::query::CURRENT_USER;
use crate::records::{
    AssessmentRecord, AssessmentStatus, AssessmentType, ExplainOptions, ExplanationRecord,
    FeatureScores, ImportanceLevel, ImprovementTrend, Insights, Interpretability, KeyFinding,
    Preferences, ReportFormat, UserProfile, VisualizationPayload,
};
use crate::service::{ExplanationService, ProfileService};

/// Per-feature attribution weights used to synthesize SHAP values.
const FEATURE_WEIGHTS: &[(&str, f64)] = &[
    ("cognitiveHealthScore", 0.25),
    ("syntacticComplexity", 0.18),
    ("lexicalDiversity", 0.15),
    ("informationDensity", 0.12),
    ("hesitationRatio", -0.10),
    ("vocabularySize", 0.08),
    ("typeTokenRatio", 0.06),
    ("complexWordRatio", 0.04),
    ("sentimentScore", 0.04),
    ("averageWordLength", 0.03),
    ("averageWordsPerSentence", 0.02),
    ("wordCount", 0.02),
    ("sentenceCount", 0.01),
];

const BASE_VALUE: f64 = 0.5;

pub struct MockDataService {
    anchor: DateTime<Utc>,
    pub fetch_calls: AtomicU32,
    pub generate_calls: AtomicU32,
    pub profile_calls: AtomicU32,
    pub assessment_calls: AtomicU32,
    /// Explanation ids that respond with a network failure, for tests.
    failing_ids: Vec<String>,
}

impl MockDataService {
    pub fn new() -> Self {
        Self {
            anchor: Utc::now(),
            fetch_calls: AtomicU32::new(0),
            generate_calls: AtomicU32::new(0),
            profile_calls: AtomicU32::new(0),
            assessment_calls: AtomicU32::new(0),
            failing_ids: Vec::new(),
        }
    }

    pub fn failing_on(ids: &[&str]) -> Self {
        let mut svc = Self::new();
        svc.failing_ids = ids.iter().map(|s| (*s).to_string()).collect();
        svc
    }

    fn explanation(&self, explanation_id: &str, risk_score: f64) -> ExplanationRecord {
        let shap_values: BTreeMap<String, f64> = FEATURE_WEIGHTS
            .iter()
            .map(|(name, weight)| ((*name).to_string(), weight * (risk_score - BASE_VALUE) * 2.0))
            .collect();

        let mut ranked: Vec<(&str, f64)> = shap_values
            .iter()
            .map(|(k, v)| (k.as_str(), *v))
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        let top_positive = ranked
            .iter()
            .filter(|(_, v)| *v > 0.0)
            .take(3)
            .map(|(k, _)| (*k).to_string())
            .collect();
        let top_negative = ranked
            .iter()
            .rev()
            .filter(|(_, v)| *v < 0.0)
            .take(3)
            .map(|(k, _)| (*k).to_string())
            .collect();

        let visualizations = ["waterfall", "bar", "force", "summary"]
            .iter()
            .map(|kind| {
                (
                    (*kind).to_string(),
                    VisualizationPayload {
                        filename: Some(format!("{}_{}.png", kind, explanation_id)),
                        status: "generated".to_string(),
                        kind: (*kind).to_string(),
                        error: None,
                    },
                )
            })
            .collect();

        ExplanationRecord {
            explanation_id: explanation_id.to_string(),
            timestamp: self.anchor,
            risk_score,
            confidence: 0.9,
            shap_values,
            visualizations,
            insights: Insights {
                top_positive_features: top_positive,
                top_negative_features: top_negative,
                key_findings: vec![KeyFinding {
                    finding: "Lexical diversity within expected range".to_string(),
                    importance: ImportanceLevel::Medium,
                    category: "language".to_string(),
                }],
            },
            interpretability: Interpretability {
                global_importance: 0.72,
                local_explanation: format!(
                    "Score driven primarily by cognitiveHealthScore for {}",
                    explanation_id
                ),
                uncertainty: 0.08,
            },
        }
    }

    fn assessment(
        &self,
        idx: u32,
        kind: AssessmentType,
        risk_score: f64,
        duration: u64,
    ) -> AssessmentRecord {
        AssessmentRecord {
            assessment_id: format!("asm-{:03}", idx),
            timestamp: self.anchor - Duration::days(i64::from(idx) * 7),
            kind,
            risk_score,
            confidence: 0.85,
            duration,
            features: FeatureScores {
                memory: (risk_score + 0.05).min(1.0),
                attention: risk_score,
                language: (risk_score + 0.02).min(1.0),
                executive: (risk_score - 0.04).max(0.0),
            },
            status: AssessmentStatus::Completed,
            notes: None,
        }
    }
}

impl Default for MockDataService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExplanationService for MockDataService {
    async fn fetch(&self, explanation_id: &str) -> Result<ExplanationRecord, FetchError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_ids.iter().any(|id| id == explanation_id) {
            return Err(FetchError::Network("connection timed out".to_string()));
        }
        if explanation_id.is_empty() || explanation_id == "missing" {
            return Err(FetchError::NotFound);
        }
        // Deterministic score derived from the id so repeat fetches agree.
        let seed = explanation_id
            .bytes()
            .fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(u32::from(b)));
        let risk_score = 0.55 + f64::from(seed % 40) / 100.0;
        Ok(self.explanation(explanation_id, risk_score))
    }

    async fn generate(
        &self,
        scoring_id: &str,
        _options: &ExplainOptions,
    ) -> Result<ExplanationRecord, FetchError> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        if scoring_id.is_empty() {
            return Err(FetchError::Server("scoring id required".to_string()));
        }
        Ok(self.explanation(&format!("exp-{}", scoring_id), 0.78))
    }
}

#[async_trait]
impl ProfileService for MockDataService {
    async fn fetch_profile(&self, user_id: &str) -> Result<UserProfile, FetchError> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        if user_id != CURRENT_USER {
            return Err(FetchError::NotFound);
        }
        Ok(UserProfile {
            user_id: user_id.to_string(),
            name: "Jordan Lee".to_string(),
            email: "jordan.lee@example.com".to_string(),
            age: Some(67),
            gender: None,
            total_assessments: 3,
            average_score: 0.81,
            improvement_trend: ImprovementTrend::Improving,
            preferences: Preferences {
                notifications_enabled: true,
                data_sharing: false,
                report_format: ReportFormat::Json,
            },
        })
    }

    async fn fetch_assessments(&self, user_id: &str) -> Result<Vec<AssessmentRecord>, FetchError> {
        self.assessment_calls.fetch_add(1, Ordering::SeqCst);
        if user_id != CURRENT_USER {
            return Err(FetchError::NotFound);
        }
        // Most recent first.
        Ok(vec![
            self.assessment(0, AssessmentType::Comprehensive, 0.86, 1260),
            self.assessment(1, AssessmentType::Speech, 0.79, 840),
            self.assessment(2, AssessmentType::Text, 0.77, 600),
        ])
    }
}
