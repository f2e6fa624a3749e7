use thiserror::Error;

/// Errors reported by the DNSDB API server or the transport beneath it.
#[derive(Error, Debug)]
pub enum DnsdbError {
    /// API key invalid or expired, or the client address is not
    /// authorized for this key. Not retryable without operator action.
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Offset beyond the maximum allowed for this key, or offset used
    /// where not permitted.
    #[error("Offset not allowed: {0}")]
    Offset(String),

    /// Time, block or burst quota exhausted. Retryable once the quota
    /// window resets; the library never waits on the caller's behalf.
    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Too many simultaneous queries for this key.
    #[error("Concurrency limit exceeded: {0}")]
    ConcurrencyExceeded(String),

    /// Malformed request, or a generic server or communication fault.
    #[error("Query error: {0}")]
    Query(String),

    /// The server reported a failure while producing results. Records
    /// yielded before the failure remain valid; the remainder is lost.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// The row limit was reached. Suppressible per call via
    /// `QueryOptions::ignore_limited`.
    #[error("Query limited: {0}")]
    QueryLimited(String),

    /// The stream ended without a terminal sentinel; the result set is
    /// known incomplete.
    #[error("Query truncated")]
    QueryTruncated,

    /// The response violated the streaming framework contract. Fatal for
    /// the remainder of the call.
    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl From<reqwest::Error> for DnsdbError {
    fn from(e: reqwest::Error) -> Self {
        DnsdbError::Query(e.to_string())
    }
}
