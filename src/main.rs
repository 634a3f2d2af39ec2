use std::sync::Arc;

use anyhow::Result;

use cogdash::config::Config;
use cogdash::controller::{ControllerRuntime, Event, NavEvent, SysEvent};
use cogdash::export::DiskPlatform;
use cogdash::logging::{self, obj, v_str, Domain, Level};
use cogdash::query::{QueryParams, ViewMode};
use cogdash::service::http::{HttpBackend, HttpExplanationService, HttpProfileService};
use cogdash::service::mock::MockDataService;
use cogdash::service::retry::RetryConfig;
use cogdash::service::{ExplanationService, ProfileService};

fn params_from_env() -> QueryParams {
    QueryParams {
        user_id: std::env::var("USER_ID").ok().filter(|s| !s.is_empty()),
        explanation_id: std::env::var("EXPLANATION_ID").ok().filter(|s| !s.is_empty()),
        scoring_id: std::env::var("SCORING_ID").ok().filter(|s| !s.is_empty()),
        mode: std::env::var("VIEW_MODE")
            .map(|v| ViewMode::parse(&v))
            .unwrap_or_default(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env();
    let retry = RetryConfig {
        max_retries: cfg.retry_max_attempts,
        base_delay_ms: cfg.retry_base_delay_ms,
        max_delay_ms: cfg.retry_max_delay_ms,
        ..RetryConfig::default()
    };

    // Use the HTTP backend when configured, otherwise the built-in dataset
    let (explanations, profiles): (Arc<dyn ExplanationService>, Arc<dyn ProfileService>) =
        match &cfg.api_base {
            Some(base) => {
                logging::log(
                    Level::Info,
                    Domain::System,
                    "backend",
                    obj(&[("kind", v_str("http")), ("base", v_str(base))]),
                );
                let backend = HttpBackend::new(base, cfg.http_timeout_secs, retry)?;
                (
                    Arc::new(HttpExplanationService::new(backend.clone())),
                    Arc::new(HttpProfileService::new(backend)),
                )
            }
            None => {
                logging::log(
                    Level::Info,
                    Domain::System,
                    "backend",
                    obj(&[("kind", v_str("mock"))]),
                );
                let svc = Arc::new(MockDataService::new());
                (svc.clone(), svc)
            }
        };

    let platform = Arc::new(DiskPlatform::new(cfg.download_dir.clone()));
    let mut runtime = ControllerRuntime::new(cfg, explanations, profiles, platform);

    let tx = runtime.sender();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = tx.send(Event::Sys(SysEvent::Teardown));
        }
    });

    runtime.dispatch(Event::Nav(NavEvent::QueryChanged {
        params: params_from_env(),
    }));
    runtime.run().await;

    logging::log(
        Level::Info,
        Domain::System,
        "shutdown",
        obj(&[("msg", v_str("controller stopped"))]),
    );
    Ok(())
}
