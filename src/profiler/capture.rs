//! Routing of log and query events into the current request's session.
//!
//! The session lives in a task-local slot for the duration of the request,
//! so it is confined to the request's task and never locked. Events raised
//! outside a profiled request, or from tasks spawned off it, are dropped.

use std::cell::RefCell;
use std::fmt::{self, Write as _};
use std::future::Future;

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

use super::quote::Binding;
use super::ProfileSession;

tokio::task_local! {
    static CURRENT: RefCell<ProfileSession>;
}

/// Events from these targets describe the profiler itself and are not shown
/// in its own toolbar.
const OWN_TARGETS: [&str; 2] = ["request_profiler::profiler", "request_profiler::middleware"];

/// Run `fut` with `session` as the current task's profile session.
pub async fn scope<F: Future>(session: ProfileSession, fut: F) -> F::Output {
    CURRENT.scope(RefCell::new(session), fut).await
}

/// Synchronous variant of [`scope`].
pub fn sync_scope<R>(session: ProfileSession, f: impl FnOnce() -> R) -> R {
    CURRENT.sync_scope(RefCell::new(session), f)
}

/// Apply `f` to the current session. `None` outside a profiled request or
/// while the session is already borrowed further up the stack.
pub fn with_current<R>(f: impl FnOnce(&mut ProfileSession) -> R) -> Option<R> {
    CURRENT
        .try_with(|cell| cell.try_borrow_mut().ok().map(|mut session| f(&mut *session)))
        .ok()
        .flatten()
}

/// Record a log entry on the current request, if any.
pub fn record_log(level: impl Into<String>, message: impl Into<String>) {
    with_current(|session| session.record_log(level, message));
}

/// Record an executed query on the current request, if any.
pub fn record_query(sql: &str, bindings: &[Binding], elapsed_ms: f64) {
    with_current(|session| session.record_query(sql, bindings, elapsed_ms));
}

// ─── tracing integration ─────────────────────────────────────────

/// `tracing` layer that copies events into the current request's session.
///
/// Pair it with a per-layer filter to choose which levels are captured:
///
/// ```ignore
/// registry().with(CaptureLayer::new().with_filter(LevelFilter::DEBUG))
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct CaptureLayer;

impl CaptureLayer {
    pub fn new() -> Self {
        Self
    }
}

impl<S: Subscriber> Layer<S> for CaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        if OWN_TARGETS.iter().any(|t| meta.target().starts_with(t)) {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        let level = meta.level().as_str().to_ascii_lowercase();
        record_log(level, visitor.finish());
    }
}

/// Collects the `message` field, then any other fields as `key=value`.
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl MessageVisitor {
    fn finish(self) -> String {
        match (self.message.is_empty(), self.fields.is_empty()) {
            (_, true) => self.message,
            (true, false) => self.fields,
            (false, false) => format!("{} {}", self.message, self.fields),
        }
    }

    fn push_field(&mut self, name: &str, value: fmt::Arguments<'_>) {
        if !self.fields.is_empty() {
            self.fields.push(' ');
        }
        let _ = write!(self.fields, "{name}={value}");
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            self.push_field(field.name(), format_args!("{value}"));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{value:?}");
        } else {
            self.push_field(field.name(), format_args!("{value:?}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use tracing_subscriber::layer::SubscriberExt;

    use super::*;
    use crate::profiler::quote::Dialect;

    fn logs_in_session(f: impl FnOnce()) -> Vec<(String, String)> {
        let subscriber = tracing_subscriber::registry().with(CaptureLayer::new());
        tracing::subscriber::with_default(subscriber, || {
            sync_scope(ProfileSession::new(Dialect::Sqlite), || {
                f();
                with_current(|s| {
                    s.logs()
                        .iter()
                        .map(|e| (e.level.clone(), e.message.clone()))
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default()
            })
        })
    }

    #[test]
    fn tracing_events_become_log_entries() {
        let logs = logs_in_session(|| {
            tracing::info!("user loaded");
            tracing::warn!(user_id = 7, "slow lookup");
        });
        assert_eq!(
            logs,
            vec![
                ("info".to_owned(), "user loaded".to_owned()),
                ("warn".to_owned(), "slow lookup user_id=7".to_owned()),
            ]
        );
    }

    #[test]
    fn string_fields_are_unquoted() {
        let logs = logs_in_session(|| tracing::error!(table = "users", "write failed"));
        assert_eq!(logs[0].1, "write failed table=users");
    }

    #[test]
    fn profiler_own_events_are_skipped() {
        let logs = logs_in_session(|| {
            tracing::info!(target: "request_profiler::middleware::profiler", "rendered");
        });
        assert!(logs.is_empty());
    }

    #[test]
    fn recording_outside_a_request_is_a_no_op() {
        record_log("info", "nobody listening");
        record_query("SELECT 1", &[], 1.0);
        assert!(with_current(|_| ()).is_none());
    }

    #[test]
    fn free_functions_reach_the_current_session() {
        let queries = sync_scope(ProfileSession::new(Dialect::Sqlite), || {
            record_query("SELECT ? + ?", &[1.into()], 0.5);
            with_current(|s| s.queries().to_vec()).unwrap_or_default()
        });
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].sql, "SELECT '1' + ?");
    }

    #[test]
    fn events_during_a_borrow_are_dropped() {
        let logs = logs_in_session(|| {
            with_current(|_| tracing::info!("re-entrant"));
        });
        assert!(logs.is_empty());
    }
}
