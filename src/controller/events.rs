//! Event and command vocabulary for the dashboard controller.
//!
//! Events flow in (navigation, fetch completions, UI intents, system ticks),
//! the reducer folds them into state, and commands flow out to the effect
//! runner. Every fetch completion carries the generation it was issued
//! under, so completions for an abandoned target can be dropped.

use crate::error::FetchError;
use crate::export::ExportFormat;
use crate::query::QueryParams;
use crate::records::{AssessmentRecord, ExplainOptions, ExplanationRecord, UserProfile};

/// Monotonic counter identifying one resolved view target. Bumped whenever
/// the target changes; in-flight work tagged with an older value is stale.
pub type Generation = u64;

#[derive(Debug, Clone)]
pub enum Event {
    Nav(NavEvent),
    Fetch(FetchEvent),
    Ui(UiEvent),
    Sys(SysEvent),
}

/// Navigation input: the full set of query parameters for the view.
#[derive(Debug, Clone)]
pub enum NavEvent {
    QueryChanged { params: QueryParams },
}

/// Completions from the data services. The `refresh` flag echoes the one
/// on the issuing command: only refresh-issued completions count against
/// the manual-refresh indicator.
#[derive(Debug, Clone)]
pub enum FetchEvent {
    ProfileLoaded {
        generation: Generation,
        refresh: bool,
        profile: UserProfile,
    },
    ProfileFailed {
        generation: Generation,
        refresh: bool,
        error: FetchError,
    },
    AssessmentsLoaded {
        generation: Generation,
        refresh: bool,
        assessments: Vec<AssessmentRecord>,
    },
    AssessmentsFailed {
        generation: Generation,
        refresh: bool,
        error: FetchError,
    },
    ExplanationLoaded {
        generation: Generation,
        refresh: bool,
        record: ExplanationRecord,
        /// True when the record came from a generate run rather than a
        /// plain fetch; the canonical id is synced from it.
        generated: bool,
    },
    ExplanationFailed {
        generation: Generation,
        refresh: bool,
        error: FetchError,
    },
}

/// User intents from the rendered dashboards.
#[derive(Debug, Clone)]
pub enum UiEvent {
    ProfileTabSelected(crate::controller::state::ProfileTab),
    ExplanationTabSelected(crate::controller::state::ExplanationTab),
    DateRangeChanged { days: u32 },
    VisualizationSelected { kind: String },
    ComparisonAdded,
    ComparisonRemoved { explanation_id: String },
    OptionsChanged { auto_refresh: bool, refresh_interval_secs: u64 },
    RefreshRequested,
    ResetSections,
    ExportRequested { format: ExportFormat },
    ShareRequested,
}

/// Runtime-originated events.
#[derive(Debug, Clone)]
pub enum SysEvent {
    /// Auto-refresh timer fired.
    PollTick,
    /// An export/share side effect finished; notice is user-facing.
    SideEffectDone { notice: String },
    SideEffectFailed { what: String, error: String },
    Teardown,
}

/// Side effects requested by the reducer, executed by the runtime.
#[derive(Debug, Clone)]
pub enum Command {
    FetchProfile {
        user_id: String,
        generation: Generation,
        refresh: bool,
    },
    FetchAssessments {
        user_id: String,
        generation: Generation,
        refresh: bool,
    },
    FetchExplanation {
        explanation_id: String,
        generation: Generation,
        refresh: bool,
    },
    GenerateExplanation {
        scoring_id: String,
        options: ExplainOptions,
        generation: Generation,
        refresh: bool,
    },
    /// Propagate a server-assigned explanation id outward (URL bar, links).
    SyncCanonicalId { explanation_id: String },
    ArmPollTimer { interval_secs: u64 },
    DisarmPollTimer,
    Export {
        format: ExportFormat,
        record: Box<ExplanationRecord>,
    },
    Share { explanation_id: String },
    /// A completion arrived for an abandoned key; surfaced for the trace.
    NoteStaleDrop {
        what: &'static str,
        completion_generation: Generation,
        current_generation: Generation,
    },
}

impl Command {
    /// Whether executing this command produces a fetch completion event.
    pub fn is_fetch(&self) -> bool {
        matches!(
            self,
            Command::FetchProfile { .. }
                | Command::FetchAssessments { .. }
                | Command::FetchExplanation { .. }
                | Command::GenerateExplanation { .. }
        )
    }
}
