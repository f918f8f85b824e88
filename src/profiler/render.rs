use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::error::{ProfilerError, Result};

use super::metrics::{format_millis, format_size};
use super::ProfileSession;

/// Marker the rendered panels are written into.
pub const SLOT: &str = "{{ toolbar }}";

const BUNDLED: &str = include_str!("../../assets/toolbar.html");
const BUNDLED_NAME: &str = "<bundled>/toolbar.html";

// ─── Template source ─────────────────────────────────────────────

/// Where the toolbar's HTML/CSS/script shell comes from.
#[derive(Debug, Clone, Default)]
pub enum TemplateSource {
    /// The asset compiled into the crate.
    #[default]
    Bundled,
    /// A file read on every render, so it can be edited while the
    /// server runs.
    File(PathBuf),
}

impl TemplateSource {
    pub fn load(&self) -> Result<ToolbarTemplate> {
        match self {
            Self::Bundled => ToolbarTemplate::parse(BUNDLED, Path::new(BUNDLED_NAME)),
            Self::File(path) => ToolbarTemplate::from_file(path),
        }
    }
}

/// A toolbar shell split around its slot.
#[derive(Debug, Clone)]
pub struct ToolbarTemplate {
    head: String,
    tail: String,
}

impl ToolbarTemplate {
    pub fn from_file(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|source| ProfilerError::TemplateRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&source, path)
    }

    /// `origin` only names the template in errors.
    pub fn parse(source: &str, origin: &Path) -> Result<Self> {
        let (head, tail) = source.split_once(SLOT).ok_or_else(|| ProfilerError::TemplateSlot {
            path: origin.to_path_buf(),
        })?;
        Ok(Self {
            head: head.to_owned(),
            tail: tail.to_owned(),
        })
    }

    /// Render the session's logs, queries and snapshot into the shell.
    pub fn render(&self, session: &ProfileSession) -> String {
        let mut out = String::with_capacity(self.head.len() + self.tail.len() + 2048);
        out.push_str(&self.head);
        write_panels(&mut out, session);
        out.push_str(&self.tail);
        out
    }
}

// ─── Panels ──────────────────────────────────────────────────────

fn write_panels(out: &mut String, session: &ProfileSession) {
    let logs = session.logs();
    let queries = session.queries();
    let query_ms: f64 = queries.iter().map(|q| q.elapsed_ms).sum();

    // Logs
    out.push_str("<div class=\"rp-panel\" id=\"rp-logs\">");
    if logs.is_empty() {
        out.push_str("<div class=\"rp-empty\">There are no log entries.</div>");
    } else {
        out.push_str("<table><tr><th>Level</th><th>Message</th></tr>");
        for entry in logs {
            let level = escape_html(&entry.level);
            let _ = write!(
                out,
                "<tr><td class=\"rp-level rp-level-{level}\">{level}</td><td><pre>{}</pre></td></tr>",
                escape_html(&entry.message),
            );
        }
        out.push_str("</table>");
    }
    out.push_str("</div>");

    // Queries
    out.push_str("<div class=\"rp-panel\" id=\"rp-queries\">");
    if queries.is_empty() {
        out.push_str("<div class=\"rp-empty\">There have been no SQL queries executed.</div>");
    } else {
        out.push_str("<table><tr><th>Time (ms)</th><th>Query</th></tr>");
        for query in queries {
            let _ = write!(
                out,
                "<tr><td class=\"rp-num\">{}</td><td><pre>{}</pre></td></tr>",
                format_millis(query.elapsed_ms),
                escape_html(&query.sql),
            );
        }
        out.push_str("</table>");
    }
    out.push_str("</div>");

    // Tab bar
    out.push_str("<div class=\"rp-bar\">");
    let _ = write!(
        out,
        "<button class=\"rp-tab\" data-rp-panel=\"rp-logs\">Log<span class=\"rp-count\">{}</span></button>",
        logs.len(),
    );
    let _ = write!(
        out,
        "<button class=\"rp-tab\" data-rp-panel=\"rp-queries\">SQL<span class=\"rp-count\">{}</span> {} ms</button>",
        queries.len(),
        format_millis(query_ms),
    );
    if let Some(snap) = session.snapshot() {
        let _ = write!(
            out,
            "<span class=\"rp-tab rp-static\">{} ms</span>\
             <span class=\"rp-tab rp-static\" title=\"peak {}\">{}</span>",
            format_millis(snap.elapsed_ms),
            format_size(snap.memory_peak_bytes),
            format_size(snap.memory_bytes),
        );
    }
    let _ = write!(
        out,
        "<span class=\"rp-tab rp-static\" title=\"started {}\">#{}</span>",
        session.started_at().format("%Y-%m-%d %H:%M:%S%.3f UTC"),
        session.short_id(),
    );
    out.push_str("</div>");
}

/// Escape text for use in HTML element content and quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
