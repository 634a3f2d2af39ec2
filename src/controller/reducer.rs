//! Pure reducer: (State, Event) -> Vec<Command>
//!
//! All state transitions happen here. The runtime executes the returned
//! commands and feeds completions back in as events, so every behavior is
//! testable without tasks or timers.

use crate::config::Config;
use crate::controller::events::*;
use crate::controller::state::*;
use crate::query::ViewTarget;

pub fn reduce(state: &mut ControllerState, event: Event, cfg: &Config) -> Vec<Command> {
    let mut commands = Vec::new();
    state.seq += 1;

    match event {
        Event::Nav(nav_event) => handle_nav_event(state, nav_event, cfg, &mut commands),
        Event::Fetch(fetch_event) => handle_fetch_event(state, fetch_event, &mut commands),
        Event::Ui(ui_event) => handle_ui_event(state, ui_event, cfg, &mut commands),
        Event::Sys(sys_event) => handle_sys_event(state, sys_event, &mut commands),
    }

    commands
}

fn handle_nav_event(
    state: &mut ControllerState,
    event: NavEvent,
    cfg: &Config,
    commands: &mut Vec<Command>,
) {
    match event {
        NavEvent::QueryChanged { params } => {
            let new_target = ViewTarget::resolve(&params);
            let user_changed = params.user_id() != state.params.user_id()
                || matches!(state.profile, FetchSlot::Idle);
            let target_changed = new_target != state.target || state.generation == 0;

            state.params = params;

            if !target_changed && !user_changed {
                return;
            }

            if target_changed {
                state.generation += 1;
                state.target = new_target;
                state.refresh_pending = 0;
                state.notice = None;
                reset_sections(state, cfg, commands);
            }

            if user_changed {
                state.user_generation += 1;
                state.profile.begin_loading();
                state.assessments.begin_loading();
                commands.push(Command::FetchProfile {
                    user_id: state.params.user_id().to_string(),
                    generation: state.user_generation,
                    refresh: false,
                });
                commands.push(Command::FetchAssessments {
                    user_id: state.params.user_id().to_string(),
                    generation: state.user_generation,
                    refresh: false,
                });
            }

            if target_changed {
                issue_target_fetch(state, state.generation, commands);
            }
        }
    }
}

/// Start the fetch matching the resolved target. Empty targets leave the
/// explanation slot idle; that is a call-to-action state, not an error.
fn issue_target_fetch(state: &mut ControllerState, generation: u64, commands: &mut Vec<Command>) {
    match &state.target {
        ViewTarget::ViewById(id) => {
            state.explanation.begin_loading();
            commands.push(Command::FetchExplanation {
                explanation_id: id.clone(),
                generation,
                refresh: false,
            });
        }
        ViewTarget::GenerateFromScore(scoring_id) => {
            state.explanation.begin_loading();
            commands.push(Command::GenerateExplanation {
                scoring_id: scoring_id.clone(),
                options: Default::default(),
                generation,
                refresh: false,
            });
        }
        ViewTarget::Empty => {
            state.explanation = FetchSlot::Idle;
        }
    }
}

fn handle_fetch_event(state: &mut ControllerState, event: FetchEvent, commands: &mut Vec<Command>) {
    // Profile fetches are keyed by the user, explanation fetches by the
    // view target; each completion is checked against its own counter.
    let (what, completion_generation, current_generation) = match &event {
        FetchEvent::ProfileLoaded { generation, .. }
        | FetchEvent::ProfileFailed { generation, .. } => {
            ("profile", *generation, state.user_generation)
        }
        FetchEvent::AssessmentsLoaded { generation, .. }
        | FetchEvent::AssessmentsFailed { generation, .. } => {
            ("assessments", *generation, state.user_generation)
        }
        FetchEvent::ExplanationLoaded { generation, .. }
        | FetchEvent::ExplanationFailed { generation, .. } => {
            ("explanation", *generation, state.generation)
        }
    };

    // Completions for an abandoned key are discarded untouched.
    if completion_generation != current_generation {
        commands.push(Command::NoteStaleDrop {
            what,
            completion_generation,
            current_generation,
        });
        return;
    }

    let refreshed = match &event {
        FetchEvent::ProfileLoaded { refresh, .. }
        | FetchEvent::ProfileFailed { refresh, .. }
        | FetchEvent::AssessmentsLoaded { refresh, .. }
        | FetchEvent::AssessmentsFailed { refresh, .. }
        | FetchEvent::ExplanationLoaded { refresh, .. }
        | FetchEvent::ExplanationFailed { refresh, .. } => *refresh,
    };

    match event {
        FetchEvent::ProfileLoaded { profile, .. } => {
            state.profile = FetchSlot::Ready(profile);
        }
        FetchEvent::ProfileFailed { error, .. } => {
            state.profile.fail(error.display_message());
        }
        FetchEvent::AssessmentsLoaded { assessments, .. } => {
            state.assessments = FetchSlot::Ready(assessments);
        }
        FetchEvent::AssessmentsFailed { error, .. } => {
            state.assessments.fail(error.display_message());
        }
        FetchEvent::ExplanationLoaded {
            record, generated, ..
        } => {
            if generated {
                // The server assigned the canonical id; subsequent refreshes
                // target the generated record. The generation stays put, the
                // target is still the same logical view.
                state.params.explanation_id = Some(record.explanation_id.clone());
                state.target = ViewTarget::ViewById(record.explanation_id.clone());
                commands.push(Command::SyncCanonicalId {
                    explanation_id: record.explanation_id.clone(),
                });
            }
            state.explanation = FetchSlot::Ready(record);
        }
        FetchEvent::ExplanationFailed { error, .. } => {
            state.explanation.fail(error.display_message());
        }
    }

    // Only fetches issued by the manual refresh count it down; a poll tick
    // settling mid-refresh must not clear the indicator early.
    if refreshed && state.refresh_pending > 0 {
        state.refresh_pending -= 1;
    }
}

fn handle_ui_event(
    state: &mut ControllerState,
    event: UiEvent,
    cfg: &Config,
    commands: &mut Vec<Command>,
) {
    match event {
        UiEvent::ProfileTabSelected(tab) => {
            state.profile_tab = tab;
        }
        UiEvent::ExplanationTabSelected(tab) => {
            state.explanation_tab = tab;
        }
        UiEvent::DateRangeChanged { days } => {
            state.sections.date_range_days = days;
        }
        UiEvent::VisualizationSelected { kind } => {
            state.sections.visualization_kind = kind;
        }
        UiEvent::ComparisonAdded => {
            let Some(record) = state.explanation.value() else {
                state.notice = Some("No explanation loaded to compare".to_string());
                return;
            };
            let already_held = state
                .sections
                .comparison
                .iter()
                .any(|r| r.explanation_id == record.explanation_id);
            if already_held {
                state.notice = Some("Already in comparison".to_string());
            } else if state.sections.comparison.len() >= cfg.max_comparisons {
                state.notice = Some(format!("Comparison holds at most {}", cfg.max_comparisons));
            } else {
                let snapshot = record.clone();
                state.sections.comparison.push(snapshot);
            }
        }
        UiEvent::ComparisonRemoved { explanation_id } => {
            state
                .sections
                .comparison
                .retain(|r| r.explanation_id != explanation_id);
        }
        UiEvent::OptionsChanged {
            auto_refresh,
            refresh_interval_secs,
        } => {
            let before = state.sections.options;
            state.sections.options = DashboardOptions {
                auto_refresh,
                refresh_interval_secs,
            };
            apply_poll_transition(state, before, commands);
        }
        UiEvent::RefreshRequested => {
            let generation = state.generation;
            let mut issued: u8 = 0;

            state.profile.begin_loading();
            state.assessments.begin_loading();
            commands.push(Command::FetchProfile {
                user_id: state.params.user_id().to_string(),
                generation: state.user_generation,
                refresh: true,
            });
            commands.push(Command::FetchAssessments {
                user_id: state.params.user_id().to_string(),
                generation: state.user_generation,
                refresh: true,
            });
            issued += 2;

            match &state.target {
                ViewTarget::ViewById(id) => {
                    state.explanation.begin_loading();
                    commands.push(Command::FetchExplanation {
                        explanation_id: id.clone(),
                        generation,
                        refresh: true,
                    });
                    issued += 1;
                }
                ViewTarget::GenerateFromScore(scoring_id) => {
                    state.explanation.begin_loading();
                    commands.push(Command::GenerateExplanation {
                        scoring_id: scoring_id.clone(),
                        options: Default::default(),
                        generation,
                        refresh: true,
                    });
                    issued += 1;
                }
                ViewTarget::Empty => {}
            }

            state.refresh_pending = issued;
        }
        UiEvent::ResetSections => {
            reset_sections(state, cfg, commands);
        }
        UiEvent::ExportRequested { format } => match state.explanation.value() {
            Some(record) => commands.push(Command::Export {
                format,
                record: Box::new(record.clone()),
            }),
            None => {
                state.notice = Some("No explanation loaded to export".to_string());
            }
        },
        UiEvent::ShareRequested => {
            let id = state
                .explanation
                .value()
                .map(|r| r.explanation_id.clone())
                .or_else(|| state.target.explanation_id().map(String::from));
            match id {
                Some(explanation_id) => commands.push(Command::Share { explanation_id }),
                None => {
                    state.notice = Some("No explanation loaded to share".to_string());
                }
            }
        }
    }
}

fn handle_sys_event(state: &mut ControllerState, event: SysEvent, commands: &mut Vec<Command>) {
    match event {
        SysEvent::PollTick => {
            if !matches!(state.poll, PollState::Polling { .. }) {
                return;
            }
            // Auto-refresh re-fetches the explanation record only.
            let id = state
                .target
                .explanation_id()
                .map(String::from)
                .or_else(|| state.explanation.value().map(|r| r.explanation_id.clone()));
            if let Some(explanation_id) = id {
                state.explanation.begin_loading();
                commands.push(Command::FetchExplanation {
                    explanation_id,
                    generation: state.generation,
                    refresh: false,
                });
            }
        }
        SysEvent::SideEffectDone { notice } => {
            state.notice = Some(notice);
        }
        SysEvent::SideEffectFailed { what, error } => {
            state.notice = Some(format!("{} failed: {}", what, error));
        }
        SysEvent::Teardown => {
            state.poll = PollState::Cancelled;
            commands.push(Command::DisarmPollTimer);
        }
    }
}

/// Reset per-section config to its configured defaults and reconcile the
/// poll timer with the restored options.
fn reset_sections(state: &mut ControllerState, cfg: &Config, commands: &mut Vec<Command>) {
    let before = state.sections.options;
    state.sections = SectionConfig::new(
        cfg.default_date_range_days,
        cfg.auto_refresh,
        cfg.refresh_interval_secs,
    );
    apply_poll_transition(state, before, commands);
}

/// Reconcile the poll timer with the current options. At most one timer is
/// ever armed: re-arming replaces, never stacks.
fn apply_poll_transition(
    state: &mut ControllerState,
    before: DashboardOptions,
    commands: &mut Vec<Command>,
) {
    if state.poll == PollState::Cancelled {
        return;
    }
    let after = state.sections.options;
    let was_polling = matches!(state.poll, PollState::Polling { .. });

    if after.auto_refresh {
        let interval_changed = before.refresh_interval_secs != after.refresh_interval_secs;
        if !was_polling || interval_changed {
            state.poll = PollState::Polling {
                interval_secs: after.refresh_interval_secs,
            };
            commands.push(Command::ArmPollTimer {
                interval_secs: after.refresh_interval_secs,
            });
        }
    } else if was_polling {
        state.poll = PollState::Idle;
        commands.push(Command::DisarmPollTimer);
    }
}
