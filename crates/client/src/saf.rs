//! Streaming Application Framework (SAF) response decoding.
//!
//! DNSDB v2 streams results as newline-delimited JSON. Each line is either
//! a data record (an `obj` member) or a sentinel carrying a `cond` member
//! that opens, continues, or terminates the stream. [`SafStream`] decodes
//! one line at a time as the caller pulls, so limit/failure conditions can
//! surface after any number of records has already been yielded.

use std::io;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use bytes::Bytes;
use futures::stream::{BoxStream, Stream};
use serde::Deserialize;
use serde_json::Value;
use tokio_util::codec::{FramedRead, LinesCodec};
use tokio_util::io::StreamReader;
use tracing::{debug, trace};

use crate::errors::DnsdbError;

const COND_BEGIN: &str = "begin";
const COND_ONGOING: &str = "ongoing";
const COND_SUCCEEDED: &str = "succeeded";
const COND_LIMITED: &str = "limited";
const COND_FAILED: &str = "failed";

/// Response body bytes, already divorced from the transport type.
pub(crate) type ByteStream = BoxStream<'static, io::Result<Bytes>>;

type LineReader = FramedRead<StreamReader<ByteStream, Bytes>, LinesCodec>;

/// Decoder state. Terminal states are absorbing: once entered, the stream
/// is fused and yields nothing further.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// No line seen yet; waiting for the `begin` sentinel.
    AwaitingHeader,
    /// Data lines are being yielded.
    Streaming,
    /// Terminated by `succeeded`, an empty result, or a suppressed limit.
    Completed,
    /// Row cap reached and surfaced to the caller.
    Limited,
    /// Stream ended without a terminal sentinel.
    Truncated,
    /// Server reported an in-stream failure.
    Failed,
    /// A line violated the framing contract.
    ProtocolBroken,
}

impl StreamState {
    fn is_terminal(self) -> bool {
        !matches!(self, Self::AwaitingHeader | Self::Streaming)
    }
}

/// One line of the stream. Anything that is not a JSON object with this
/// shape breaks the protocol.
#[derive(Debug, Deserialize)]
struct SafMessage {
    cond: Option<String>,
    obj: Option<Value>,
    msg: Option<String>,
}

/// A lazy, forward-only stream of result records.
///
/// Yields `Ok(record)` for each data line and a single `Err` if the
/// stream terminates abnormally; records yielded before the error remain
/// valid. Dropping the stream at any point releases the underlying
/// connection.
pub struct SafStream {
    lines: Option<LineReader>,
    state: StreamState,
    ignore_limited: bool,
    /// Outcome of a sentinel that shared its line with a data record,
    /// delivered on the poll after that record.
    pending: Option<DnsdbError>,
}

impl std::fmt::Debug for SafStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SafStream")
            .field("state", &self.state)
            .field("ignore_limited", &self.ignore_limited)
            .finish_non_exhaustive()
    }
}

impl SafStream {
    pub(crate) fn new(body: ByteStream, ignore_limited: bool) -> Self {
        Self {
            lines: Some(FramedRead::new(StreamReader::new(body), LinesCodec::new())),
            state: StreamState::AwaitingHeader,
            ignore_limited,
            pending: None,
        }
    }

    /// A stream with zero records, used for empty results (HTTP 404).
    pub(crate) fn empty() -> Self {
        Self {
            lines: None,
            state: StreamState::Completed,
            ignore_limited: false,
            pending: None,
        }
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Enter a terminal state and release the connection.
    fn terminate(&mut self, state: StreamState) {
        debug!(state = ?state, "saf stream terminated");
        self.state = state;
        self.lines = None;
    }
}

impl Stream for SafStream {
    type Item = Result<Value, DnsdbError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        if let Some(err) = this.pending.take() {
            return Poll::Ready(Some(Err(err)));
        }
        if this.state.is_terminal() {
            return Poll::Ready(None);
        }

        loop {
            let next = match this.lines.as_mut() {
                Some(lines) => ready!(Pin::new(lines).poll_next(cx)),
                None => None,
            };

            let line = match next {
                Some(Ok(line)) => line,
                Some(Err(e)) => {
                    this.terminate(StreamState::Failed);
                    return Poll::Ready(Some(Err(DnsdbError::Query(format!(
                        "error reading response stream: {e}"
                    )))));
                }
                // EOF without a terminal sentinel: known incomplete.
                None => {
                    this.terminate(StreamState::Truncated);
                    return Poll::Ready(Some(Err(DnsdbError::QueryTruncated)));
                }
            };

            if line.is_empty() {
                continue;
            }

            let msg: SafMessage = match serde_json::from_str(&line) {
                Ok(msg) => msg,
                Err(_) => {
                    this.terminate(StreamState::ProtocolBroken);
                    return Poll::Ready(Some(Err(DnsdbError::Protocol(format!(
                        "could not decode json: {line}"
                    )))));
                }
            };
            trace!(cond = ?msg.cond, has_obj = msg.obj.is_some(), "saf line");

            match msg.cond.as_deref() {
                Some(COND_BEGIN) => {
                    this.state = StreamState::Streaming;
                    continue;
                }
                Some(COND_SUCCEEDED) => {
                    this.terminate(StreamState::Completed);
                    return Poll::Ready(None);
                }
                _ => {}
            }
            if this.state == StreamState::AwaitingHeader {
                this.state = StreamState::Streaming;
            }

            // A terminal sentinel may carry a final record; the record is
            // yielded first and the outcome delivered on the next poll.
            let outcome = match msg.cond.as_deref() {
                None | Some(COND_ONGOING) => None,
                Some(COND_LIMITED) if this.ignore_limited => {
                    this.terminate(StreamState::Completed);
                    None
                }
                Some(COND_LIMITED) => {
                    this.terminate(StreamState::Limited);
                    Some(DnsdbError::QueryLimited(msg.msg.unwrap_or_default()))
                }
                Some(COND_FAILED) => {
                    this.terminate(StreamState::Failed);
                    Some(DnsdbError::QueryFailed(msg.msg.unwrap_or_default()))
                }
                Some(other) => {
                    let err = DnsdbError::Protocol(format!("invalid cond: {other}"));
                    this.terminate(StreamState::ProtocolBroken);
                    Some(err)
                }
            };

            return match (msg.obj, outcome) {
                (Some(obj), Some(err)) => {
                    this.pending = Some(err);
                    Poll::Ready(Some(Ok(obj)))
                }
                (Some(obj), None) => Poll::Ready(Some(Ok(obj))),
                (None, Some(err)) => Poll::Ready(Some(Err(err))),
                (None, None) => {
                    if this.state.is_terminal() {
                        // Suppressed limit with no trailing record.
                        Poll::Ready(None)
                    } else {
                        continue;
                    }
                }
            };
        }
    }
}
