//! Identifier resolution: which record(s) drive the view.
//!
//! Navigation state is passed in as an explicit struct so the controller
//! is testable without a routing host.

/// Sentinel used when the navigation layer supplies no user id.
pub const CURRENT_USER: &str = "current-user";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Single,
    Comparison,
}

impl ViewMode {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "comparison" => ViewMode::Comparison,
            _ => ViewMode::Single,
        }
    }
}

/// Query parameters handed over by the navigation layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pub user_id: Option<String>,
    pub explanation_id: Option<String>,
    pub scoring_id: Option<String>,
    pub mode: ViewMode,
}

impl QueryParams {
    pub fn user_id(&self) -> &str {
        self.user_id.as_deref().unwrap_or(CURRENT_USER)
    }
}

/// The view's operating mode, resolved from the parameter set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewTarget {
    /// Look up an existing explanation record.
    ViewById(String),
    /// Ask the scoring service to generate an explanation for a score.
    GenerateFromScore(String),
    /// Nothing selected: a call-to-action state, not an error.
    Empty,
}

impl ViewTarget {
    /// An explanation id takes precedence over a scoring id.
    pub fn resolve(params: &QueryParams) -> Self {
        if let Some(id) = params.explanation_id.as_deref() {
            if !id.is_empty() {
                return ViewTarget::ViewById(id.to_string());
            }
        }
        if let Some(id) = params.scoring_id.as_deref() {
            if !id.is_empty() {
                return ViewTarget::GenerateFromScore(id.to_string());
            }
        }
        ViewTarget::Empty
    }

    /// The explanation id this target currently points at, if any.
    pub fn explanation_id(&self) -> Option<&str> {
        match self {
            ViewTarget::ViewById(id) => Some(id),
            _ => None,
        }
    }
}
