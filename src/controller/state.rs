//! Controller state: fetch slots, tab selections, section config, poll state.

use crate::query::{QueryParams, ViewTarget};
use crate::records::{AssessmentRecord, ExplanationRecord, UserProfile};

/// Lifecycle of one independently fetched record.
///
/// A failed refresh keeps the previously loaded value so the view can keep
/// rendering it, flagged stale, alongside the error message.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchSlot<T> {
    Idle,
    Loading { prev: Option<T> },
    Ready(T),
    Error { message: String, stale: Option<T> },
}

impl<T> FetchSlot<T> {
    /// The best record currently available, stale or not.
    pub fn value(&self) -> Option<&T> {
        match self {
            FetchSlot::Idle => None,
            FetchSlot::Loading { prev } => prev.as_ref(),
            FetchSlot::Ready(v) => Some(v),
            FetchSlot::Error { stale, .. } => stale.as_ref(),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, FetchSlot::Loading { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            FetchSlot::Error { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Transition into Loading, carrying the current value along.
    pub fn begin_loading(&mut self) {
        let prev = std::mem::replace(self, FetchSlot::Idle);
        *self = FetchSlot::Loading {
            prev: match prev {
                FetchSlot::Idle => None,
                FetchSlot::Loading { prev } => prev,
                FetchSlot::Ready(v) => Some(v),
                FetchSlot::Error { stale, .. } => stale,
            },
        };
    }

    /// Transition into Error, retaining whatever record was held.
    pub fn fail(&mut self, message: String) {
        let prev = std::mem::replace(self, FetchSlot::Idle);
        *self = FetchSlot::Error {
            message,
            stale: match prev {
                FetchSlot::Idle => None,
                FetchSlot::Loading { prev } => prev,
                FetchSlot::Ready(v) => Some(v),
                FetchSlot::Error { stale, .. } => stale,
            },
        };
    }
}

impl<T> Default for FetchSlot<T> {
    fn default() -> Self {
        FetchSlot::Idle
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Polling { interval_secs: u64 },
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileTab {
    Overview,
    History,
    Trends,
    Reports,
    Profile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExplanationTab {
    Overview,
    Visualizations,
    Features,
    Insights,
    Comparison,
}

/// Dashboard options the user can change at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardOptions {
    pub auto_refresh: bool,
    pub refresh_interval_secs: u64,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            auto_refresh: false,
            refresh_interval_secs: 30,
        }
    }
}

/// Per-section view configuration. Survives tab navigation; reset only on
/// target change or an explicit reset.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionConfig {
    pub date_range_days: u32,
    pub visualization_kind: String,
    /// Comparison snapshots, owned copies never aliasing the live slot.
    pub comparison: Vec<ExplanationRecord>,
    pub options: DashboardOptions,
}

impl SectionConfig {
    pub fn new(date_range_days: u32, auto_refresh: bool, refresh_interval_secs: u64) -> Self {
        Self {
            date_range_days,
            visualization_kind: "waterfall".to_string(),
            comparison: Vec::new(),
            options: DashboardOptions {
                auto_refresh,
                refresh_interval_secs,
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct ControllerState {
    pub params: QueryParams,
    pub target: ViewTarget,
    /// Bumped on target change; gates explanation completions.
    pub generation: u64,
    /// Bumped on user change; gates profile/assessment completions.
    pub user_generation: u64,

    pub profile: FetchSlot<UserProfile>,
    pub assessments: FetchSlot<Vec<AssessmentRecord>>,
    pub explanation: FetchSlot<ExplanationRecord>,

    /// Outstanding fetches from a manual refresh. The refreshing indicator
    /// shows until every one of them settles.
    pub refresh_pending: u8,

    pub profile_tab: ProfileTab,
    pub explanation_tab: ExplanationTab,
    pub sections: SectionConfig,

    pub poll: PollState,
    /// Latest user-facing notice from a side effect.
    pub notice: Option<String>,
    pub seq: u64,
}

impl ControllerState {
    pub fn new(date_range_days: u32, auto_refresh: bool, refresh_interval_secs: u64) -> Self {
        Self {
            params: QueryParams::default(),
            target: ViewTarget::Empty,
            generation: 0,
            user_generation: 0,
            profile: FetchSlot::Idle,
            assessments: FetchSlot::Idle,
            explanation: FetchSlot::Idle,
            refresh_pending: 0,
            profile_tab: ProfileTab::Overview,
            explanation_tab: ExplanationTab::Overview,
            sections: SectionConfig::new(date_range_days, auto_refresh, refresh_interval_secs),
            poll: PollState::Idle,
            notice: None,
            seq: 0,
        }
    }

    pub fn is_refreshing(&self) -> bool {
        self.refresh_pending > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_keeps_value_through_loading_and_error() {
        let mut slot: FetchSlot<u32> = FetchSlot::Ready(7);
        slot.begin_loading();
        assert!(slot.is_loading());
        assert_eq!(slot.value(), Some(&7));

        slot.fail("timeout".to_string());
        assert_eq!(slot.error(), Some("timeout"));
        assert_eq!(slot.value(), Some(&7));
    }

    #[test]
    fn test_slot_idle_has_nothing() {
        let slot: FetchSlot<u32> = FetchSlot::Idle;
        assert!(slot.value().is_none());
        assert!(slot.error().is_none());
        assert!(!slot.is_loading());
    }

    #[test]
    fn test_error_from_idle_has_no_stale_value() {
        let mut slot: FetchSlot<u32> = FetchSlot::Idle;
        slot.begin_loading();
        slot.fail("503".to_string());
        assert_eq!(slot.value(), None);
        assert_eq!(slot.error(), Some("503"));
    }

    #[test]
    fn test_default_options() {
        let opts = DashboardOptions::default();
        assert!(!opts.auto_refresh);
        assert_eq!(opts.refresh_interval_secs, 30);
    }
}
