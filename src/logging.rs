//! Structured logging for the dashboard pipeline.
//!
//! Every record is a single JSON line carrying a run id and a sequence
//! number so a page session can be replayed from the log alone:
//! which endpoint was hit, how long it took, which prediction responses
//! were applied and which were discarded as stale.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};
use std::time::Instant;

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
        Self::parse(std::env::var("LOG_LEVEL").as_deref().unwrap_or("info"))
    }

    pub fn parse(raw: &str) -> Self {
        match raw {
            "trace" => Level::Trace,
            "debug" => Level::Debug,
            "warn" => Level::Warn,
            "error" => Level::Error,
            "fatal" => Level::Fatal,
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
    Api,        // Backend round trips
    Controller, // Page state transitions
    View,       // Derived-view builders
    Render,     // Text/HTML output
    Config,     // Environment resolution
    System,     // Startup, shutdown
    Profile,    // Timing scopes
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Api => "api",
            Domain::Controller => "controller",
            Domain::View => "view",
            Domain::Render => "render",
            Domain::Config => "config",
            Domain::System => "system",
            Domain::Profile => "profile",
        }
    }

    pub fn is_enabled(&self) -> bool {
        // LOG_DOMAINS is a comma-separated list or "all"
        match std::env::var("LOG_DOMAINS").as_deref() {
            Ok("all") | Err(_) => true,
            Ok(domains) => domains.split(',').any(|d| d.trim() == self.as_str()),
        }
    }
}

// =============================================================================
// Run context
// =============================================================================

static LOG_SEQ: AtomicU64 = AtomicU64::new(0);
static PROFILE_SEQ: AtomicU64 = AtomicU64::new(0);
static RUN_CONTEXT: OnceLock<RunContext> = OnceLock::new();

fn next_seq() -> u64 {
    LOG_SEQ.fetch_add(1, Ordering::SeqCst)
}

#[derive(Debug)]
struct RunContext {
    run_id: String,
    events: Option<Mutex<BufWriter<File>>>,
    trace: Option<Mutex<BufWriter<File>>>,
}

fn open_sink(path: PathBuf) -> Option<Mutex<BufWriter<File>>> {
    match File::create(&path) {
        Ok(file) => Some(Mutex::new(BufWriter::new(file))),
        Err(err) => {
            eprintln!("[log] failed to create {}: {}", path.display(), err);
            None
        }
    }
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

        let _ = std::fs::write(
            run_dir.join("manifest.json"),
            json!({
                "run_id": run_id,
                "ts": ts_now(),
                "pid": process::id(),
                "log_dir": run_dir.to_string_lossy(),
            })
            .to_string(),
        );

        RunContext {
            events: open_sink(run_dir.join("events.jsonl")),
            trace: open_sink(run_dir.join("trace.jsonl")),
            run_id,
        }
    })
}

fn sanitize_fields(mut fields: Map<String, Value>) -> Map<String, Value> {
    let redacted = Value::String("[REDACTED]".to_string());
    for key in ["authorization", "Authorization", "api_key", "cookie"] {
        if fields.contains_key(key) {
            fields.insert(key.to_string(), redacted.clone());
        }
    }
    fields
}

fn split_fields(mut fields: Map<String, Value>) -> (Map<String, Value>, Map<String, Value>) {
    let mut top = Map::new();
    for key in ["page", "endpoint", "model", "req_seq", "msg"] {
        if let Some(value) = fields.remove(key) {
            top.insert(key.to_string(), value);
        }
    }
    (top, fields)
}

fn write_line(writer: &Option<Mutex<BufWriter<File>>>, line: &str) {
    if let Some(writer) = writer {
        if let Ok(mut w) = writer.lock() {
            let _ = writeln!(w, "{}", line);
            let _ = w.flush();
        }
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
    if level < Level::from_env() || !domain.is_enabled() {
        return;
    }
    emit_record(level, domain.as_str(), event, fields);
}

fn build_record(
    run_id: &str,
    level: Level,
    component: &str,
    event: &str,
    fields: Map<String, Value>,
) -> Value {
    let fields = sanitize_fields(fields);
    let (mut top, data) = split_fields(fields);

    let msg = top.remove("msg").unwrap_or(Value::String(String::new()));
    let mut entry = Map::new();
    entry.insert("ts".to_string(), json!(ts_now()));
    entry.insert("run_id".to_string(), json!(run_id));
    entry.insert("seq".to_string(), json!(next_seq()));
    entry.insert("lvl".to_string(), json!(level.as_str().to_uppercase()));
    entry.insert("component".to_string(), json!(component));
    entry.insert("event".to_string(), json!(event));
    entry.insert("msg".to_string(), msg);
    for (k, v) in top {
        entry.insert(k, v);
    }
    entry.insert("data".to_string(), Value::Object(data));
    Value::Object(entry)
}

fn emit_record(level: Level, component: &str, event: &str, fields: Map<String, Value>) {
    let ctx = ensure_run_context();
    let line = build_record(&ctx.run_id, level, component, event, fields).to_string();
    match level {
        Level::Trace | Level::Debug => write_line(&ctx.trace, &line),
        _ => write_line(&ctx.events, &line),
    }
    // stdout carries rendered pages
    eprintln!("{}", line);
}

// =============================================================================
// Pipeline logs
// =============================================================================

/// One backend round trip.
pub fn log_request(method: &str, endpoint: &str, status: Option<u16>, elapsed_ms: f64) {
    let level = match status {
        Some(code) if (200..300).contains(&code) => Level::Debug,
        _ => Level::Warn,
    };
    log(
        level,
        Domain::Api,
        "request",
        obj(&[
            ("method", v_str(method)),
            ("endpoint", v_str(endpoint)),
            ("status", status.map(|s| json!(s)).unwrap_or(Value::Null)),
            ("elapsed_ms", v_num(elapsed_ms)),
        ]),
    );
}

/// A prediction response that lost the race against a newer request.
pub fn log_stale_response(page: &str, req_seq: u64, last_applied: u64) {
    log(
        Level::Info,
        Domain::Controller,
        "stale_response",
        obj(&[
            ("page", v_str(page)),
            ("req_seq", json!(req_seq)),
            ("last_applied", json!(last_applied)),
            ("msg", v_str("discarded response older than last applied")),
        ]),
    );
}

/// A page degraded to its placeholder state.
pub fn log_page_error(page: &str, stage: &str, error: &str) {
    log(
        Level::Error,
        Domain::Controller,
        "page_error",
        obj(&[
            ("page", v_str(page)),
            ("stage", v_str(stage)),
            ("msg", v_str(error)),
        ]),
    );
}

// =============================================================================
// Field helpers
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
// Profiling Scope
// =============================================================================

/// Profiling scope that emits structured timing on drop.
pub struct ProfileScope {
    label: &'static str,
    context: Option<Map<String, Value>>,
    started: Instant,
    enabled: bool,
}

impl ProfileScope {
    pub fn new(label: &'static str) -> Self {
        Self::with_context(label, &[])
    }

    pub fn with_context(label: &'static str, fields: &[(&str, Value)]) -> Self {
        let enabled = Self::should_sample();
        Self {
            label,
            context: if enabled { Some(obj(fields)) } else { None },
            started: Instant::now(),
            enabled,
        }
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.started.elapsed().as_secs_f64() * 1000.0
    }

    fn should_sample() -> bool {
        std::env::var("PROFILE_SAMPLE")
            .ok()
            .and_then(|v| v.parse::<f64>().ok())
            .map(|p| {
                if p >= 1.0 {
                    true
                } else if p <= 0.0 {
                    false
                } else {
                    let seq = PROFILE_SEQ.fetch_add(1, Ordering::SeqCst);
                    let bucket = (seq % 10_000) as f64 / 10_000.0;
                    bucket < p
                }
            })
            .unwrap_or(true)
    }
}

impl Drop for ProfileScope {
    fn drop(&mut self) {
        if !self.enabled {
            return;
        }
        let mut fields = self.context.take().unwrap_or_default();
        fields.insert("label".to_string(), v_str(self.label));
        fields.insert("elapsed_ms".to_string(), v_num(self.elapsed_ms()));
        log(Level::Trace, Domain::Profile, "profile", fields);
    }
}

// =============================================================================
// Tests
// =============================================================================
