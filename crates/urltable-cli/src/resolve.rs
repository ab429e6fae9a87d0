use std::fmt;

use serde::Serialize;
use urltable::{PatternError, Table};

/// The outcome of resolving one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub request: String,
    /// `None` when no registered pattern handles the request.
    pub pattern: Option<String>,
}

impl Resolution {
    pub fn resolve(table: &Table, request: &str) -> Result<Self, PatternError> {
        let pattern = table.mapping(request)?;
        urltable_telemetry::log_request_resolved!(
            request = %request,
            pattern = ?pattern,
            "request resolved"
        );
        Ok(Self {
            request: request.to_string(),
            pattern,
        })
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.pattern {
            Some(pattern) => write!(f, "{} -> {}", self.request, pattern),
            None => write!(f, "{} -> (no match)", self.request),
        }
    }
}

/// Resolve every request, stopping at the first malformed one.
pub fn resolve_all<S: AsRef<str>>(
    table: &Table,
    requests: &[S],
) -> Result<Vec<Resolution>, PatternError> {
    requests
        .iter()
        .map(|request| Resolution::resolve(table, request.as_ref()))
        .collect()
}
