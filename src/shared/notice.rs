//! Usage: Notice (toast) payloads and the sink the engine reports through.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoticePayload {
    pub level: NoticeLevel,
    pub title: String,
    pub body: String,
}

fn default_title(level: NoticeLevel) -> &'static str {
    match level {
        NoticeLevel::Info => "Notice",
        NoticeLevel::Success => "Saved",
        NoticeLevel::Warning => "Warning",
        NoticeLevel::Error => "Error",
    }
}

pub fn build(level: NoticeLevel, title: Option<&str>, body: impl Into<String>) -> NoticePayload {
    let title = title
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| default_title(level));
    NoticePayload {
        level,
        title: title.to_string(),
        body: body.into(),
    }
}

/// Where notices go. The console wires this to its toast layer; the default
/// sink just logs, so the engine works headless.
pub trait NoticeSink: Send + Sync {
    fn notify(&self, payload: NoticePayload);
}

/// Default sink: forwards notices to tracing at a level matching severity.
#[derive(Debug, Default)]
pub struct TracingNoticeSink;

impl NoticeSink for TracingNoticeSink {
    fn notify(&self, payload: NoticePayload) {
        match payload.level {
            NoticeLevel::Info | NoticeLevel::Success => {
                tracing::info!(title = %payload.title, body = %payload.body, "notice")
            }
            NoticeLevel::Warning => {
                tracing::warn!(title = %payload.title, body = %payload.body, "notice")
            }
            NoticeLevel::Error => {
                tracing::error!(title = %payload.title, body = %payload.body, "notice")
            }
        }
    }
}
