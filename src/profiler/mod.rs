//! Per-request profiling: what was logged, which queries ran and how long
//! they took, and how much memory and time the request used.

pub mod capture;
pub mod metrics;
pub mod quote;
pub mod render;
pub mod sql;

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::config::ProfilerSection;
use crate::error::Result;

pub use capture::{record_log, record_query, CaptureLayer};
pub use metrics::{FixedMetrics, ProcessMetrics, SystemMetrics};
pub use quote::{Binding, Dialect, Quote};
pub use render::{TemplateSource, ToolbarTemplate};

// ─── Session data ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub level: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryRecord {
    /// Statement with its bindings interpolated, for display only.
    pub sql: String,
    pub elapsed_ms: f64,
}

/// Memory and time figures taken when the toolbar is rendered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    pub memory_bytes: u64,
    pub memory_peak_bytes: u64,
    pub elapsed_ms: f64,
}

/// Everything profiled for one request. Owned by the request that created
/// it; `logs` and `queries` only ever grow.
#[derive(Debug)]
pub struct ProfileSession {
    id: Uuid,
    started: Instant,
    started_at: DateTime<Utc>,
    dialect: Dialect,
    logs: Vec<LogEntry>,
    queries: Vec<QueryRecord>,
    snapshot: Option<Snapshot>,
}

impl ProfileSession {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            id: Uuid::new_v4(),
            started: Instant::now(),
            started_at: Utc::now(),
            dialect,
            logs: Vec::new(),
            queries: Vec::new(),
            snapshot: None,
        }
    }

    pub fn record_log(&mut self, level: impl Into<String>, message: impl Into<String>) {
        self.logs.push(LogEntry {
            level: level.into(),
            message: message.into(),
        });
    }

    /// Record an executed statement. Bindings fill `?` placeholders left to
    /// right; placeholders without a binding are kept as `?`.
    pub fn record_query(&mut self, sql: &str, bindings: &[Binding], elapsed_ms: f64) {
        let sql = sql::interpolate(sql, bindings, &self.dialect);
        self.queries.push(QueryRecord { sql, elapsed_ms });
    }

    /// Render the toolbar for this request.
    ///
    /// Returns `Ok(None)` for non-interactive requests without touching the
    /// session. Otherwise the memory/time snapshot is taken, stored, and the
    /// template rendered; recorded logs and queries are left as they are.
    pub fn render(
        &mut self,
        interactive: bool,
        metrics: &dyn ProcessMetrics,
        template: &TemplateSource,
    ) -> Result<Option<String>> {
        if !interactive {
            return Ok(None);
        }

        let template = template.load()?;
        self.snapshot = Some(Snapshot {
            memory_bytes: metrics.current_bytes(),
            memory_peak_bytes: metrics.peak_bytes(),
            elapsed_ms: self.started.elapsed().as_secs_f64() * 1000.0,
        });
        Ok(Some(template.render(self)))
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// First eight hex digits of the id.
    pub fn short_id(&self) -> String {
        self.id.simple().to_string()[..8].to_owned()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn logs(&self) -> &[LogEntry] {
        &self.logs
    }

    pub fn queries(&self) -> &[QueryRecord] {
        &self.queries
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }
}

// ─── Profiler ────────────────────────────────────────────────────

/// Process-wide profiler settings; hands out one session per request.
pub struct Profiler {
    enabled: bool,
    dialect: Dialect,
    template: TemplateSource,
    metrics: Arc<dyn ProcessMetrics>,
}

impl Profiler {
    pub fn new(section: &ProfilerSection) -> Self {
        let template = match &section.template_path {
            Some(path) => TemplateSource::File(path.clone()),
            None => TemplateSource::Bundled,
        };
        Self {
            enabled: section.enabled,
            dialect: section.dialect,
            template,
            metrics: Arc::new(SystemMetrics),
        }
    }

    /// Replace the memory source, e.g. with `FixedMetrics` in tests.
    pub fn with_metrics(mut self, metrics: Arc<dyn ProcessMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn start_session(&self) -> ProfileSession {
        ProfileSession::new(self.dialect)
    }

    pub fn render(&self, session: &mut ProfileSession, interactive: bool) -> Result<Option<String>> {
        session.render(interactive, self.metrics.as_ref(), &self.template)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXED: FixedMetrics = FixedMetrics {
        current: 2_621_440,
        peak: 4 * 1024 * 1024,
    };

    #[test]
    fn logs_keep_call_order() {
        let mut session = ProfileSession::new(Dialect::Sqlite);
        session.record_log("info", "first");
        session.record_log("error", "second");
        session.record_log("info", "third");

        let seen: Vec<_> = session
            .logs()
            .iter()
            .map(|e| (e.level.as_str(), e.message.as_str()))
            .collect();
        assert_eq!(seen, vec![("info", "first"), ("error", "second"), ("info", "third")]);
    }

    #[test]
    fn queries_keep_order_and_elapsed_time() {
        let mut session = ProfileSession::new(Dialect::Sqlite);
        session.record_query("SELECT 1", &[], 0.25);
        session.record_query("SELECT * FROM t WHERE a = ? AND b = ?", &["x".into(), 5.into()], 12.5);

        let queries = session.queries();
        assert_eq!(queries.len(), 2);
        assert_eq!(queries[0], QueryRecord { sql: "SELECT 1".into(), elapsed_ms: 0.25 });
        assert_eq!(queries[1].sql, "SELECT * FROM t WHERE a = 'x' AND b = '5'");
        assert_eq!(queries[1].elapsed_ms, 12.5);
    }

    #[test]
    fn session_dialect_drives_quoting() {
        let mut session = ProfileSession::new(Dialect::MySql);
        session.record_query("SELECT ?", &["it's".into()], 1.0);
        assert_eq!(session.queries()[0].sql, "SELECT 'it\\'s'");
    }

    #[test]
    fn session_dialect_drives_literal_scanning() {
        let template = r"SELECT * FROM t WHERE path = 'C:\' AND id = ?";

        let mut session = ProfileSession::new(Dialect::Postgres);
        session.record_query(template, &[3.into()], 1.0);
        assert_eq!(session.queries()[0].sql, r"SELECT * FROM t WHERE path = 'C:\' AND id = '3'");

        // MySQL reads `\'` as an escaped quote, so the literal never closes.
        let mut session = ProfileSession::new(Dialect::MySql);
        session.record_query(template, &[3.into()], 1.0);
        assert_eq!(session.queries()[0].sql, template);
    }

    #[test]
    fn non_interactive_render_is_silent() {
        let mut session = ProfileSession::new(Dialect::Sqlite);
        session.record_log("info", "hello");
        session.record_query("SELECT 1", &[], 1.0);

        let out = session.render(false, &FIXED, &TemplateSource::Bundled).expect("render");
        assert!(out.is_none());
        assert!(session.snapshot().is_none());
    }

    #[test]
    fn interactive_render_contains_entries_and_snapshot() {
        let mut session = ProfileSession::new(Dialect::Sqlite);
        session.record_log("warn", "disk nearly full");
        session.record_query("SELECT * FROM users WHERE id = ?", &[7.into()], 3.0);

        let html = session
            .render(true, &FIXED, &TemplateSource::Bundled)
            .expect("render")
            .expect("interactive output");

        assert!(html.contains("disk nearly full"));
        assert!(html.contains("SELECT * FROM users WHERE id = &#39;7&#39;"));
        assert!(html.contains("2.5 MB"));
        assert!(html.contains("peak 4 MB"));

        let snap = session.snapshot().expect("snapshot");
        assert_eq!(snap.memory_bytes, FIXED.current);
        assert_eq!(snap.memory_peak_bytes, FIXED.peak);
        assert!(snap.elapsed_ms >= 0.0);
    }

    #[test]
    fn rendering_twice_does_not_duplicate_entries() {
        let mut session = ProfileSession::new(Dialect::Sqlite);
        session.record_log("info", "once");
        session.record_query("SELECT 1", &[], 1.0);

        let first = session.render(true, &FIXED, &TemplateSource::Bundled).expect("render");
        let second = session.render(true, &FIXED, &TemplateSource::Bundled).expect("render");

        assert_eq!(session.logs().len(), 1);
        assert_eq!(session.queries().len(), 1);
        let second = second.expect("output");
        assert_eq!(second.matches("once").count(), 1);
        assert!(first.is_some());
    }

    #[test]
    fn missing_template_fails_render_without_snapshot() {
        let mut session = ProfileSession::new(Dialect::Sqlite);
        let source = TemplateSource::File("/nonexistent/toolbar.html".into());
        assert!(session.render(true, &FIXED, &source).is_err());
        assert!(session.snapshot().is_none());
    }

    #[test]
    fn profiler_uses_configured_dialect() {
        let section = ProfilerSection {
            dialect: Dialect::Postgres,
            ..ProfilerSection::default()
        };
        let profiler = Profiler::new(&section);
        assert_eq!(profiler.start_session().dialect(), Dialect::Postgres);
    }
}
