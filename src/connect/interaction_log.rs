//! Interaction log spans
//!
//! Every exchange with the provider within one inbound request is recorded as
//! a span. Only one span is open at a time: entering a new span archives the
//! previous one, and [`InteractionLogs::into_inner`] archives whatever is still
//! open before handing the trail back to the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Gateway name stamped on every log entry
pub const GATEWAY_NAME: &str = "stbl";

/// Outbound request as recorded in the log
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggedRequest {
    pub url: String,
    /// Masked request body (empty for body-less requests)
    pub params: String,
}

/// One finalized span, as returned to the platform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionLog {
    pub gateway: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<LoggedRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    pub kind: String,
    pub created_at: DateTime<Utc>,
    /// Seconds between span creation and archival
    pub duration: f64,
}

/// The currently open span
#[derive(Debug)]
pub struct InteractionSpan {
    kind: String,
    created_at: DateTime<Utc>,
    started: Instant,
    status: Option<u16>,
    request: Option<LoggedRequest>,
    response: Option<String>,
}

impl InteractionSpan {
    fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            created_at: Utc::now(),
            started: Instant::now(),
            status: None,
            request: None,
            response: None,
        }
    }

    pub fn set_status(&mut self, status: u16) {
        self.status = Some(status);
    }

    pub fn set_request(&mut self, params: impl Into<String>, url: impl Into<String>) {
        self.request = Some(LoggedRequest {
            url: url.into(),
            params: params.into(),
        });
    }

    pub fn set_response(&mut self, response: impl Into<String>) {
        self.response = Some(response.into());
    }

    fn finish(self) -> InteractionLog {
        InteractionLog {
            gateway: GATEWAY_NAME.to_string(),
            request: self.request,
            status: self.status,
            response: self.response,
            kind: self.kind,
            created_at: self.created_at,
            duration: self.started.elapsed().as_secs_f64(),
        }
    }
}

/// Ordered, append-only log for a single inbound request
#[derive(Debug, Default)]
pub struct InteractionLogs {
    logs: Vec<InteractionLog>,
    current: Option<InteractionSpan>,
}

impl InteractionLogs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter a new span, archiving the one that was open.
    pub fn enter(&mut self, kind: impl Into<String>) -> &mut InteractionSpan {
        if let Some(previous) = self.current.take() {
            self.logs.push(previous.finish());
        }
        self.current.insert(InteractionSpan::new(kind))
    }

    /// Number of spans recorded so far, including the open one
    pub fn len(&self) -> usize {
        self.logs.len() + usize::from(self.current.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Finalize the log. The open span is archived last.
    pub fn into_inner(mut self) -> Vec<InteractionLog> {
        if let Some(current) = self.current.take() {
            self.logs.push(current.finish());
        }
        self.logs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_logs() {
        let logs = InteractionLogs::new();
        assert!(logs.is_empty());
        assert!(logs.into_inner().is_empty());
    }

    #[test]
    fn test_into_inner_includes_open_span() {
        let mut logs = InteractionLogs::new();
        let span = logs.enter("payment");
        span.set_request("{}", "https://provider.test/pay");
        span.set_status(201);
        span.set_response(r#"{"id":"abc"}"#);

        let entries = logs.into_inner();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, "payment");
        assert_eq!(entries[0].gateway, GATEWAY_NAME);
        assert_eq!(entries[0].status, Some(201));
        assert_eq!(entries[0].response.as_deref(), Some(r#"{"id":"abc"}"#));
        assert_eq!(
            entries[0].request.as_ref().map(|r| r.url.as_str()),
            Some("https://provider.test/pay")
        );
    }

    #[test]
    fn test_enter_archives_exactly_one_prior_span() {
        let mut logs = InteractionLogs::new();
        logs.enter("login").set_status(201);
        assert_eq!(logs.len(), 1);

        logs.enter("payment").set_status(201);
        assert_eq!(logs.len(), 2);

        logs.enter("status");
        assert_eq!(logs.len(), 3);

        let kinds: Vec<String> = logs.into_inner().into_iter().map(|l| l.kind).collect();
        assert_eq!(kinds, vec!["login", "payment", "status"]);
    }

    #[test]
    fn test_serialization_skips_missing_fields() {
        let mut logs = InteractionLogs::new();
        logs.enter("status");
        let entries = logs.into_inner();

        let json = serde_json::to_value(&entries[0]).unwrap();
        assert_eq!(json["kind"], "status");
        assert_eq!(json["gateway"], "stbl");
        assert!(json.get("request").is_none());
        assert!(json.get("status").is_none());
        assert!(json.get("response").is_none());
        assert!(json["duration"].as_f64().unwrap() >= 0.0);
    }
}
