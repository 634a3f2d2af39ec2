//! Effect runner: owns the state, executes reducer commands, feeds
//! completions back in as events.
//!
//! Fetches run as spawned tasks tagged with the generation they were issued
//! under; the reducer drops completions whose generation no longer matches.
//! The poll timer is a single task handle, so arming always replaces and
//! never stacks.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};

use crate::config::Config;
use crate::controller::events::{Command, Event, FetchEvent, SysEvent, UiEvent};
use crate::controller::reducer::reduce;
use crate::controller::state::ControllerState;
use crate::export::{export_as, share_explanation, Platform, ShareOutcome};
use crate::logging;
use crate::service::{ExplanationService, ProfileService};

pub struct ControllerRuntime {
    state: ControllerState,
    cfg: Config,
    explanations: Arc<dyn ExplanationService>,
    profiles: Arc<dyn ProfileService>,
    platform: Arc<dyn Platform>,
    tx: mpsc::UnboundedSender<Event>,
    rx: mpsc::UnboundedReceiver<Event>,
    poll_handle: Option<JoinHandle<()>>,
}

impl ControllerRuntime {
    pub fn new(
        cfg: Config,
        explanations: Arc<dyn ExplanationService>,
        profiles: Arc<dyn ProfileService>,
        platform: Arc<dyn Platform>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let state = ControllerState::new(
            cfg.default_date_range_days,
            cfg.auto_refresh,
            cfg.refresh_interval_secs,
        );
        Self {
            state,
            cfg,
            explanations,
            profiles,
            platform,
            tx,
            rx,
            poll_handle: None,
        }
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    /// Sender for external event sources (navigation host, signal handler).
    pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
        self.tx.clone()
    }

    pub fn poll_timer_active(&self) -> bool {
        self.poll_handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Reduce one event and execute whatever commands fall out.
    pub fn dispatch(&mut self, event: Event) {
        match &event {
            Event::Ui(UiEvent::ProfileTabSelected(tab)) => {
                logging::log_tab("profile", &format!("{:?}", tab).to_lowercase());
            }
            Event::Ui(UiEvent::ExplanationTabSelected(tab)) => {
                logging::log_tab("explanation", &format!("{:?}", tab).to_lowercase());
            }
            _ => {}
        }
        let commands = reduce(&mut self.state, event, &self.cfg);
        for command in commands {
            self.execute(command);
        }
    }

    /// Drain queued events until the channel stays empty. Test helper and
    /// shutdown aid; spawned fetches get a chance to complete between drains.
    pub async fn settle(&mut self) {
        for _ in 0..32 {
            tokio::task::yield_now().await;
            while let Ok(event) = self.rx.try_recv() {
                self.dispatch(event);
            }
        }
    }

    /// Main loop: consume events until every sender (including our own
    /// internal one) is gone or a teardown has been processed.
    pub async fn run(&mut self) {
        loop {
            let Some(event) = self.rx.recv().await else {
                break;
            };
            let teardown = matches!(event, Event::Sys(SysEvent::Teardown));
            self.dispatch(event);
            if teardown {
                break;
            }
        }
    }

    fn execute(&mut self, command: Command) {
        match command {
            Command::FetchProfile {
                user_id,
                generation,
                refresh,
            } => {
                logging::log_fetch_start("profile", &user_id, generation);
                let profiles = self.profiles.clone();
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let event = match profiles.fetch_profile(&user_id).await {
                        Ok(profile) => FetchEvent::ProfileLoaded {
                            generation,
                            refresh,
                            profile,
                        },
                        Err(error) => FetchEvent::ProfileFailed {
                            generation,
                            refresh,
                            error,
                        },
                    };
                    let _ = tx.send(Event::Fetch(event));
                });
            }
            Command::FetchAssessments {
                user_id,
                generation,
                refresh,
            } => {
                logging::log_fetch_start("assessments", &user_id, generation);
                let profiles = self.profiles.clone();
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let event = match profiles.fetch_assessments(&user_id).await {
                        Ok(assessments) => FetchEvent::AssessmentsLoaded {
                            generation,
                            refresh,
                            assessments,
                        },
                        Err(error) => FetchEvent::AssessmentsFailed {
                            generation,
                            refresh,
                            error,
                        },
                    };
                    let _ = tx.send(Event::Fetch(event));
                });
            }
            Command::FetchExplanation {
                explanation_id,
                generation,
                refresh,
            } => {
                logging::log_fetch_start("explanation", &explanation_id, generation);
                let explanations = self.explanations.clone();
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let event = match explanations.fetch(&explanation_id).await {
                        Ok(record) => {
                            logging::log_fetch_done("explanation", &explanation_id, generation);
                            FetchEvent::ExplanationLoaded {
                                generation,
                                refresh,
                                record,
                                generated: false,
                            }
                        }
                        Err(error) => {
                            logging::log_fetch_failed(
                                "explanation",
                                &explanation_id,
                                generation,
                                &error.to_string(),
                            );
                            FetchEvent::ExplanationFailed {
                                generation,
                                refresh,
                                error,
                            }
                        }
                    };
                    let _ = tx.send(Event::Fetch(event));
                });
            }
            Command::GenerateExplanation {
                scoring_id,
                options,
                generation,
                refresh,
            } => {
                logging::log_fetch_start("generate", &scoring_id, generation);
                let explanations = self.explanations.clone();
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let event = match explanations.generate(&scoring_id, &options).await {
                        Ok(record) => {
                            logging::log_fetch_done("generate", &scoring_id, generation);
                            FetchEvent::ExplanationLoaded {
                                generation,
                                refresh,
                                record,
                                generated: true,
                            }
                        }
                        Err(error) => {
                            logging::log_fetch_failed(
                                "generate",
                                &scoring_id,
                                generation,
                                &error.to_string(),
                            );
                            FetchEvent::ExplanationFailed {
                                generation,
                                refresh,
                                error,
                            }
                        }
                    };
                    let _ = tx.send(Event::Fetch(event));
                });
            }
            Command::SyncCanonicalId { explanation_id } => {
                logging::log_target_resolved("view", Some(&explanation_id), self.state.generation);
            }
            Command::ArmPollTimer { interval_secs } => {
                if let Some(handle) = self.poll_handle.take() {
                    handle.abort();
                }
                logging::log_poll("timer_armed", interval_secs);
                let tx = self.tx.clone();
                self.poll_handle = Some(tokio::spawn(async move {
                    loop {
                        sleep(Duration::from_secs(interval_secs)).await;
                        if tx.send(Event::Sys(SysEvent::PollTick)).is_err() {
                            break;
                        }
                    }
                }));
            }
            Command::DisarmPollTimer => {
                if let Some(handle) = self.poll_handle.take() {
                    handle.abort();
                    logging::log_poll("timer_disarmed", 0);
                }
            }
            Command::Export { format, record } => {
                let result = export_as(&record, format, self.platform.as_ref());
                let event = match &result {
                    Ok(path) => {
                        logging::log_export(format.as_str(), &record.explanation_id, "ok");
                        SysEvent::SideEffectDone {
                            notice: format!("Exported {} to {}", format.as_str(), path),
                        }
                    }
                    Err(error) => {
                        logging::log_export(format.as_str(), &record.explanation_id, "failed");
                        SysEvent::SideEffectFailed {
                            what: "Export".to_string(),
                            error: error.to_string(),
                        }
                    }
                };
                let _ = self.tx.send(Event::Sys(event));
            }
            Command::Share { explanation_id } => {
                let result = share_explanation(
                    &explanation_id,
                    &self.cfg.share_base,
                    self.platform.as_ref(),
                );
                let event = match result {
                    Ok(ShareOutcome::Shared) => {
                        logging::log_share(&explanation_id, "shared");
                        SysEvent::SideEffectDone {
                            notice: "Explanation link shared".to_string(),
                        }
                    }
                    Ok(ShareOutcome::CopiedToClipboard) => {
                        logging::log_share(&explanation_id, "clipboard");
                        SysEvent::SideEffectDone {
                            notice: "Link copied to clipboard".to_string(),
                        }
                    }
                    Err(error) => {
                        logging::log_share(&explanation_id, "failed");
                        SysEvent::SideEffectFailed {
                            what: "Share".to_string(),
                            error: error.to_string(),
                        }
                    }
                };
                let _ = self.tx.send(Event::Sys(event));
            }
            Command::NoteStaleDrop {
                what,
                completion_generation,
                current_generation,
            } => {
                logging::log_stale_drop(what, completion_generation, current_generation);
            }
        }
    }
}

impl Drop for ControllerRuntime {
    fn drop(&mut self) {
        if let Some(handle) = self.poll_handle.take() {
            handle.abort();
        }
    }
}
