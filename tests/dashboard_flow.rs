//! End-to-end controller flows against the in-process dataset: navigation,
//! refresh, generation, polling, and export/share side effects.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::time::{advance, Duration};

use cogdash::config::Config;
use cogdash::controller::{ControllerRuntime, Event, NavEvent, SysEvent, UiEvent};
use cogdash::error::FetchError;
use cogdash::export::{ExportFormat, MemoryPlatform};
use cogdash::metrics;
use cogdash::query::{QueryParams, ViewTarget};
use cogdash::records::{AssessmentRecord, ExplainOptions, ExplanationRecord, UserProfile};
use cogdash::service::mock::MockDataService;
use cogdash::service::{ExplanationService, ProfileService};

/// Delegates to the fixed dataset but can be switched into a failure mode
/// for explanation fetches, to exercise stale-record handling.
struct FlakyService {
    inner: MockDataService,
    fail_explanations: AtomicBool,
}

impl FlakyService {
    fn new() -> Self {
        Self {
            inner: MockDataService::new(),
            fail_explanations: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl ExplanationService for FlakyService {
    async fn fetch(&self, explanation_id: &str) -> Result<ExplanationRecord, FetchError> {
        if self.fail_explanations.load(Ordering::SeqCst) {
            return Err(FetchError::Network("connection timed out".to_string()));
        }
        self.inner.fetch(explanation_id).await
    }

    async fn generate(
        &self,
        scoring_id: &str,
        options: &ExplainOptions,
    ) -> Result<ExplanationRecord, FetchError> {
        self.inner.generate(scoring_id, options).await
    }
}

#[async_trait]
impl ProfileService for FlakyService {
    async fn fetch_profile(&self, user_id: &str) -> Result<UserProfile, FetchError> {
        self.inner.fetch_profile(user_id).await
    }

    async fn fetch_assessments(&self, user_id: &str) -> Result<Vec<AssessmentRecord>, FetchError> {
        self.inner.fetch_assessments(user_id).await
    }
}

fn runtime(svc: Arc<FlakyService>) -> ControllerRuntime {
    ControllerRuntime::new(
        Config::default(),
        svc.clone(),
        svc,
        Arc::new(MemoryPlatform::new()),
    )
}

fn nav(explanation: Option<&str>, scoring: Option<&str>) -> Event {
    Event::Nav(NavEvent::QueryChanged {
        params: QueryParams {
            explanation_id: explanation.map(String::from),
            scoring_id: scoring.map(String::from),
            ..QueryParams::default()
        },
    })
}

// ---------------------------------------------------------------------------
// Navigation, refresh, and stale-record handling
// ---------------------------------------------------------------------------

#[tokio::test]
async fn dashboard_loads_and_survives_failed_refresh() {
    let svc = Arc::new(FlakyService::new());
    let mut rt = runtime(svc.clone());

    rt.dispatch(nav(Some("exp-42"), None));
    rt.settle().await;

    let record = rt.state().explanation.value().unwrap().clone();
    assert_eq!(record.explanation_id, "exp-42");
    assert!(rt.state().profile.value().is_some());
    assert!(!rt.state().is_refreshing());

    // The rendered score uses one shared bucketing rule.
    let bucket = metrics::score_bucket(record.risk_score);
    assert_eq!(
        bucket,
        metrics::score_bucket(rt.state().explanation.value().unwrap().risk_score)
    );

    // Backend goes down; a manual refresh must not blank the dashboard.
    svc.fail_explanations.store(true, Ordering::SeqCst);
    rt.dispatch(Event::Ui(UiEvent::RefreshRequested));
    assert!(rt.state().is_refreshing());
    rt.settle().await;

    assert!(!rt.state().is_refreshing());
    let slot = &rt.state().explanation;
    assert!(slot.error().unwrap().contains("timed out"));
    assert_eq!(slot.value().unwrap().explanation_id, "exp-42");
    // The profile fetcher is independent and stays healthy.
    assert!(rt.state().profile.error().is_none());

    // Retry affordance: once the backend recovers a refresh clears the error.
    svc.fail_explanations.store(false, Ordering::SeqCst);
    rt.dispatch(Event::Ui(UiEvent::RefreshRequested));
    rt.settle().await;
    assert!(rt.state().explanation.error().is_none());
}

#[tokio::test]
async fn rapid_navigation_keeps_only_latest_target() {
    let svc = Arc::new(FlakyService::new());
    let mut rt = runtime(svc);

    rt.dispatch(nav(Some("exp-a"), None));
    rt.dispatch(nav(Some("exp-b"), None));
    rt.settle().await;

    assert_eq!(
        rt.state()
            .explanation
            .value()
            .map(|r| r.explanation_id.as_str()),
        Some("exp-b")
    );
    assert_eq!(rt.state().target, ViewTarget::ViewById("exp-b".to_string()));
}

#[tokio::test]
async fn derived_summary_from_assessments() {
    let svc = Arc::new(FlakyService::new());
    let mut rt = runtime(svc);

    rt.dispatch(nav(None, None));
    rt.settle().await;

    let assessments = rt.state().assessments.value().unwrap();
    assert_eq!(metrics::completed_count(assessments), 3);
    assert_eq!(metrics::total_minutes(assessments), 45);
    assert_eq!(metrics::best_score_pct(assessments), Some(86.0));
}

// ---------------------------------------------------------------------------
// Generation flow
// ---------------------------------------------------------------------------

#[tokio::test]
async fn generation_syncs_canonical_id_and_refresh_targets_it() {
    let svc = Arc::new(FlakyService::new());
    let mut rt = runtime(svc.clone());

    rt.dispatch(nav(None, Some("score-7")));
    rt.settle().await;

    assert_eq!(svc.inner.generate_calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        rt.state().params.explanation_id.as_deref(),
        Some("exp-score-7")
    );
    assert_eq!(
        rt.state().target,
        ViewTarget::ViewById("exp-score-7".to_string())
    );

    // A later refresh fetches the generated record, it does not regenerate.
    rt.dispatch(Event::Ui(UiEvent::RefreshRequested));
    rt.settle().await;
    assert_eq!(svc.inner.generate_calls.load(Ordering::SeqCst), 1);
    assert!(svc.inner.fetch_calls.load(Ordering::SeqCst) >= 1);
}

// ---------------------------------------------------------------------------
// Auto-refresh timer
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn poll_timer_fires_refetches_and_never_stacks() {
    let svc = Arc::new(FlakyService::new());
    let mut rt = runtime(svc.clone());

    rt.dispatch(nav(Some("exp-1"), None));
    rt.settle().await;
    assert_eq!(svc.inner.fetch_calls.load(Ordering::SeqCst), 1);

    rt.dispatch(Event::Ui(UiEvent::OptionsChanged {
        auto_refresh: true,
        refresh_interval_secs: 5,
    }));
    assert!(rt.poll_timer_active());

    // Let the spawned timer task register its sleep before time moves.
    tokio::task::yield_now().await;
    advance(Duration::from_secs(5)).await;
    rt.settle().await;
    assert_eq!(svc.inner.fetch_calls.load(Ordering::SeqCst), 2);

    // Setting the same options again must not add a second timer.
    rt.dispatch(Event::Ui(UiEvent::OptionsChanged {
        auto_refresh: true,
        refresh_interval_secs: 5,
    }));
    advance(Duration::from_secs(5)).await;
    rt.settle().await;
    assert_eq!(svc.inner.fetch_calls.load(Ordering::SeqCst), 3);

    // Disarm stops the ticks entirely.
    rt.dispatch(Event::Ui(UiEvent::OptionsChanged {
        auto_refresh: false,
        refresh_interval_secs: 5,
    }));
    assert!(!rt.poll_timer_active());
    advance(Duration::from_secs(30)).await;
    rt.settle().await;
    assert_eq!(svc.inner.fetch_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn target_change_disarms_running_timer() {
    let svc = Arc::new(FlakyService::new());
    let mut rt = runtime(svc.clone());

    rt.dispatch(nav(Some("exp-1"), None));
    rt.settle().await;
    rt.dispatch(Event::Ui(UiEvent::OptionsChanged {
        auto_refresh: true,
        refresh_interval_secs: 5,
    }));
    assert!(rt.poll_timer_active());

    // Section config, including auto-refresh, resets with the target.
    rt.dispatch(nav(Some("exp-2"), None));
    rt.settle().await;
    assert!(!rt.poll_timer_active());

    let before = svc.inner.fetch_calls.load(Ordering::SeqCst);
    advance(Duration::from_secs(30)).await;
    rt.settle().await;
    assert_eq!(svc.inner.fetch_calls.load(Ordering::SeqCst), before);
}

#[tokio::test(start_paused = true)]
async fn teardown_cancels_timer_for_good() {
    let svc = Arc::new(FlakyService::new());
    let mut rt = runtime(svc.clone());

    rt.dispatch(nav(Some("exp-1"), None));
    rt.settle().await;
    rt.dispatch(Event::Ui(UiEvent::OptionsChanged {
        auto_refresh: true,
        refresh_interval_secs: 5,
    }));

    rt.dispatch(Event::Sys(SysEvent::Teardown));
    assert!(!rt.poll_timer_active());

    // Even a direct tick after teardown stays inert.
    rt.dispatch(Event::Sys(SysEvent::PollTick));
    rt.settle().await;
    assert_eq!(svc.inner.fetch_calls.load(Ordering::SeqCst), 1);
}

// ---------------------------------------------------------------------------
// Export and share
// ---------------------------------------------------------------------------

#[tokio::test]
async fn export_and_share_report_notices_not_failures() {
    let svc = Arc::new(FlakyService::new());
    let platform = Arc::new(MemoryPlatform::new());
    let mut rt = ControllerRuntime::new(
        Config::default(),
        svc.clone(),
        svc,
        platform.clone(),
    );

    rt.dispatch(nav(Some("exp-9"), None));
    rt.settle().await;

    rt.dispatch(Event::Ui(UiEvent::ExportRequested {
        format: ExportFormat::Json,
    }));
    rt.settle().await;
    {
        let downloads = platform.downloads.lock().unwrap();
        assert_eq!(downloads[0].0, "explanation_exp-9.json");
        let decoded: ExplanationRecord = serde_json::from_slice(&downloads[0].1).unwrap();
        assert_eq!(decoded.explanation_id, "exp-9");
    }

    // Unsupported format: a notice, and the dashboard keeps working.
    rt.dispatch(Event::Ui(UiEvent::ExportRequested {
        format: ExportFormat::Pdf,
    }));
    rt.settle().await;
    assert!(rt.state().notice.as_deref().unwrap().contains("pdf"));
    assert!(rt.state().explanation.value().is_some());

    // No native share target on this platform: clipboard fallback.
    rt.dispatch(Event::Ui(UiEvent::ShareRequested));
    rt.settle().await;
    assert!(platform
        .clipboard
        .lock()
        .unwrap()
        .as_deref()
        .unwrap()
        .contains("explanationId=exp-9"));
    assert!(rt.state().notice.as_deref().unwrap().contains("clipboard"));
}
