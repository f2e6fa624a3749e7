//! In-process mock DNSDB server. Responses are queued ahead of time and
//! served in order; every request is recorded for wire-level assertions.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::Response;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use dnsdb2_client::Client;

pub const TEST_API_KEY: &str = "abcdef-ghijkl-mnopqrstuvwxyz";
pub const NDJSON: &str = "application/x-ndjson";

#[derive(Debug, Clone)]
pub struct CannedResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub params: Vec<(String, String)>,
    pub api_key: Option<String>,
    pub accept: Option<String>,
}

#[derive(Default)]
struct ServerState {
    responses: Mutex<VecDeque<CannedResponse>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

pub struct MockDnsdb {
    addr: SocketAddr,
    state: Arc<ServerState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockDnsdb {
    pub async fn start() -> Self {
        let state = Arc::new(ServerState::default());
        let app = Router::new()
            .fallback(handle)
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock server");
        let addr = listener.local_addr().expect("local addr");

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let server = axum::serve(listener, app).with_graceful_shutdown(async move {
            shutdown_rx.await.ok();
        });
        tokio::spawn(async move {
            let _ = server.await;
        });

        Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// A client pointed at this server with fixed identification, so
    /// tests can assert the exact wire parameters.
    pub fn client(&self) -> Client {
        Client::builder(TEST_API_KEY)
            .with_server(self.url())
            .with_swclient("abc-client", "v1.2.3.4")
            .build()
            .expect("build client")
    }

    pub fn enqueue(&self, status: u16, content_type: &'static str, body: impl Into<String>) {
        self.state
            .responses
            .lock()
            .unwrap()
            .push_back(CannedResponse {
                status,
                content_type,
                body: body.into(),
            });
    }

    /// Queues a 200 NDJSON response from raw SAF lines.
    pub fn enqueue_saf<S: AsRef<str>>(&self, lines: &[S]) {
        let mut body = lines
            .iter()
            .map(|l| l.as_ref())
            .collect::<Vec<_>>()
            .join("\n");
        body.push('\n');
        self.enqueue(200, NDJSON, body);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> RecordedRequest {
        self.requests().last().cloned().expect("no request recorded")
    }
}

impl Drop for MockDnsdb {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

async fn handle(
    State(state): State<Arc<ServerState>>,
    uri: Uri,
    Query(params): Query<Vec<(String, String)>>,
    headers: HeaderMap,
) -> Response {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    state.requests.lock().unwrap().push(RecordedRequest {
        path: uri.path().to_string(),
        params,
        api_key: header("x-api-key"),
        accept: header("accept"),
    });

    let canned = state.responses.lock().unwrap().pop_front();
    match canned {
        Some(res) => Response::builder()
            .status(StatusCode::from_u16(res.status).expect("canned status"))
            .header("content-type", res.content_type)
            .body(Body::from(res.body))
            .expect("canned response"),
        None => Response::builder()
            .status(StatusCode::INTERNAL_SERVER_ERROR)
            .body(Body::from("no canned response queued"))
            .expect("error response"),
    }
}

/// Wraps data records in a begin header and the requested trailer,
/// mirroring how the server frames a stream.
pub fn saf_wrap(records: &[serde_json::Value], trailer: Option<&str>) -> Vec<String> {
    let mut lines = vec![r#"{"cond": "begin"}"#.to_string()];
    for obj in records {
        lines.push(format!(r#"{{"obj": {obj}}}"#));
    }
    if let Some(trailer) = trailer {
        lines.push(trailer.to_string());
    }
    lines
}
