//! Structured JSON logging for the dashboard controller.
//!
//! Entries are written as jsonl under a per-run directory (LOG_DIR) and
//! mirrored to stdout. Levels come from LOG_LEVEL, domain filtering from
//! LOG_DOMAINS (comma-separated or "all").

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};

// =============================================================================
// Log Levels
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
    Fatal = 5,
}

impl Level {
    pub fn from_env() -> Self {
        match std::env::var("LOG_LEVEL").as_deref() {
            Ok("trace") => Level::Trace,
            Ok("debug") => Level::Debug,
            Ok("info") => Level::Info,
            Ok("warn") => Level::Warn,
            Ok("error") => Level::Error,
            Ok("fatal") => Level::Fatal,
            _ => Level::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Fatal => "fatal",
        }
    }
}

// =============================================================================
// Log Domains (categories for filtering)
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Query,  // Identifier resolution, navigation
    Fetch,  // Record loads, generation runs
    Poll,   // Auto-refresh timer lifecycle
    Tabs,   // View-state transitions
    Export, // Export/share side effects
    System, // Startup, shutdown, recovery
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Query => "query",
            Domain::Fetch => "fetch",
            Domain::Poll => "poll",
            Domain::Tabs => "tabs",
            Domain::Export => "export",
            Domain::System => "system",
        }
    }

    pub fn is_enabled(&self) -> bool {
        // Check LOG_DOMAINS env var (comma-separated list or "all")
        match std::env::var("LOG_DOMAINS").as_deref() {
            Ok("all") | Err(_) => true,
            Ok(domains) => domains.split(',').any(|d| d.trim() == self.as_str()),
        }
    }
}

// =============================================================================
// Sequence counter for ordering
// =============================================================================

static LOG_SEQ: AtomicU64 = AtomicU64::new(0);
static RUN_CONTEXT: OnceLock<RunContext> = OnceLock::new();

fn next_seq() -> u64 {
    LOG_SEQ.fetch_add(1, Ordering::SeqCst)
}

#[derive(Debug)]
struct RunContext {
    run_id: String,
    events: Mutex<BufWriter<File>>,
    trace: Mutex<BufWriter<File>>,
}

fn ensure_run_context() -> &'static RunContext {
    RUN_CONTEXT.get_or_init(|| {
        let run_id = std::env::var("RUN_ID")
            .unwrap_or_else(|_| format!("r-{}-{}", ts_epoch_ms(), process::id()));
        let base = std::env::var("LOG_DIR").unwrap_or_else(|_| "out/runs".to_string());
        let mut run_dir = PathBuf::from(base);
        run_dir.push(&run_id);
        if let Err(err) = create_dir_all(&run_dir) {
            eprintln!("[log] failed to create run dir: {}", err);
        }
        let events_path = run_dir.join("events.jsonl");
        let trace_path = run_dir.join("trace.jsonl");
        let manifest_path = run_dir.join("manifest.json");

        let _ = std::fs::write(
            manifest_path,
            json!({
                "run_id": run_id,
                "ts": ts_now(),
                "pid": process::id(),
                "log_dir": run_dir.to_string_lossy(),
            })
            .to_string(),
        );

        let events = File::create(events_path).unwrap_or_else(|err| {
            eprintln!("[log] failed to create events log: {}", err);
            File::create("/tmp/cogdash-events.jsonl").expect("events fallback")
        });
        let trace = File::create(trace_path).unwrap_or_else(|err| {
            eprintln!("[log] failed to create trace log: {}", err);
            File::create("/tmp/cogdash-trace.jsonl").expect("trace fallback")
        });

        RunContext {
            run_id,
            events: Mutex::new(BufWriter::new(events)),
            trace: Mutex::new(BufWriter::new(trace)),
        }
    })
}

fn sanitize_fields(mut fields: Map<String, Value>) -> Map<String, Value> {
    let redacted = Value::String("[REDACTED]".to_string());
    for key in ["authorization", "Authorization", "api_key", "email", "token"] {
        if fields.contains_key(key) {
            fields.insert(key.to_string(), redacted.clone());
        }
    }
    fields
}

fn split_fields(mut fields: Map<String, Value>) -> (Map<String, Value>, Map<String, Value>) {
    let mut top = Map::new();
    for key in ["explanation_id", "scoring_id", "user_id", "generation", "msg"] {
        if let Some(value) = fields.remove(key) {
            top.insert(key.to_string(), value);
        }
    }
    (top, fields)
}

fn write_line(writer: &Mutex<BufWriter<File>>, line: &str) {
    if let Ok(mut w) = writer.lock() {
        let _ = writeln!(w, "{}", line);
    }
}

// =============================================================================
// Core logging functions
// =============================================================================

/// RFC3339 timestamp with milliseconds
pub fn ts_now() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Epoch milliseconds
pub fn ts_epoch_ms() -> u64 {
    Utc::now().timestamp_millis() as u64
}

/// Emit a structured log entry
pub fn log(level: Level, domain: Domain, event: &str, fields: Map<String, Value>) {
    let min_level = Level::from_env();
    if level < min_level || !domain.is_enabled() {
        return;
    }

    emit_record(level, domain.as_str(), event, fields);
}

fn emit_record(level: Level, component: &str, event: &str, fields: Map<String, Value>) {
    let ctx = ensure_run_context();
    let fields = sanitize_fields(fields);
    let (mut top, data) = split_fields(fields);

    let msg = top.remove("msg").unwrap_or(Value::String(String::new()));
    let mut entry = Map::new();
    entry.insert("ts".to_string(), json!(ts_now()));
    entry.insert("run_id".to_string(), json!(ctx.run_id.clone()));
    entry.insert("seq".to_string(), json!(next_seq()));
    entry.insert("lvl".to_string(), json!(level.as_str().to_uppercase()));
    entry.insert("component".to_string(), json!(component));
    entry.insert("event".to_string(), json!(event));
    entry.insert("msg".to_string(), msg);
    for (k, v) in top {
        entry.insert(k, v);
    }
    entry.insert("data".to_string(), Value::Object(data));

    let line = Value::Object(entry).to_string();
    match level {
        Level::Trace | Level::Debug => write_line(&ctx.trace, &line),
        _ => write_line(&ctx.events, &line),
    }
    println!("{}", line);
}

// =============================================================================
// Domain-Specific Logging Helpers
// =============================================================================

pub fn log_target_resolved(target: &str, explanation_id: Option<&str>, generation: u64) {
    log(
        Level::Info,
        Domain::Query,
        "target_resolved",
        obj(&[
            ("target", v_str(target)),
            (
                "explanation_id",
                explanation_id.map(v_str).unwrap_or(Value::Null),
            ),
            ("generation", json!(generation)),
        ]),
    );
}

pub fn log_fetch_start(what: &str, id: &str, generation: u64) {
    log(
        Level::Debug,
        Domain::Fetch,
        "fetch_start",
        obj(&[
            ("what", v_str(what)),
            ("id", v_str(id)),
            ("generation", json!(generation)),
        ]),
    );
}

pub fn log_fetch_done(what: &str, id: &str, generation: u64) {
    log(
        Level::Info,
        Domain::Fetch,
        "fetch_done",
        obj(&[
            ("what", v_str(what)),
            ("id", v_str(id)),
            ("generation", json!(generation)),
        ]),
    );
}

pub fn log_fetch_failed(what: &str, id: &str, generation: u64, error: &str) {
    log(
        Level::Warn,
        Domain::Fetch,
        "fetch_failed",
        obj(&[
            ("what", v_str(what)),
            ("id", v_str(id)),
            ("generation", json!(generation)),
            ("error", v_str(error)),
        ]),
    );
}

pub fn log_stale_drop(what: &str, completion_generation: u64, current_generation: u64) {
    log(
        Level::Debug,
        Domain::Fetch,
        "stale_completion_dropped",
        obj(&[
            ("what", v_str(what)),
            ("completion_generation", json!(completion_generation)),
            ("generation", json!(current_generation)),
        ]),
    );
}

pub fn log_poll(event: &str, interval_secs: u64) {
    log(
        Level::Debug,
        Domain::Poll,
        event,
        obj(&[("interval_secs", json!(interval_secs))]),
    );
}

pub fn log_tab(which: &str, tab: &str) {
    log(
        Level::Trace,
        Domain::Tabs,
        "tab_selected",
        obj(&[("which", v_str(which)), ("tab", v_str(tab))]),
    );
}

pub fn log_export(format: &str, explanation_id: &str, outcome: &str) {
    log(
        Level::Info,
        Domain::Export,
        "export",
        obj(&[
            ("format", v_str(format)),
            ("explanation_id", v_str(explanation_id)),
            ("outcome", v_str(outcome)),
        ]),
    );
}

pub fn log_share(explanation_id: &str, outcome: &str) {
    log(
        Level::Info,
        Domain::Export,
        "share",
        obj(&[
            ("explanation_id", v_str(explanation_id)),
            ("outcome", v_str(outcome)),
        ]),
    );
}

// =============================================================================
// Utility Functions
// =============================================================================

pub fn obj(pairs: &[(&str, Value)]) -> Map<String, Value> {
    let mut map = Map::new();
    for (k, v) in pairs {
        map.insert((*k).to_string(), v.clone());
    }
    map
}

pub fn v_str(s: &str) -> Value {
    Value::String(s.to_string())
}

pub fn v_num(n: f64) -> Value {
    json!(n)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(Level::Trace < Level::Debug);
        assert!(Level::Debug < Level::Info);
        assert!(Level::Info < Level::Warn);
        assert!(Level::Warn < Level::Error);
        assert!(Level::Error < Level::Fatal);
    }

    #[test]
    fn test_obj_helper() {
        let m = obj(&[("key", v_str("value")), ("num", v_num(42.0))]);
        assert_eq!(m.get("key").unwrap(), "value");
        assert_eq!(m.get("num").unwrap(), 42.0);
    }

    #[test]
    fn test_sanitize_redacts_sensitive_keys() {
        let fields = obj(&[("email", v_str("a@b.c")), ("what", v_str("profile"))]);
        let clean = sanitize_fields(fields);
        assert_eq!(clean.get("email").unwrap(), "[REDACTED]");
        assert_eq!(clean.get("what").unwrap(), "profile");
    }

    #[test]
    fn test_split_promotes_identifiers() {
        let fields = obj(&[("explanation_id", v_str("exp-1")), ("extra", v_num(1.0))]);
        let (top, data) = split_fields(fields);
        assert!(top.contains_key("explanation_id"));
        assert!(data.contains_key("extra"));
    }

    #[test]
    fn test_seq_increments() {
        let s1 = next_seq();
        let s2 = next_seq();
        assert!(s2 > s1);
    }
}
