//! Loopback HTTP server standing in for the hosted backend.
//!
//! Every request is recorded. A per-test responder picks the reply.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::Router;
use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{HeaderMap, Method, Uri};
use axum::response::Response;
use serde_json::Value;
use team_sync::outbound::supabase::{SupabaseClient, SupabaseConfig};
use tokio::net::TcpListener;
use url::Url;

pub const ANON_KEY: &str = "anon-key";

/// One request as the server saw it.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub authorization: Option<String>,
    pub apikey: Option<String>,
    pub prefer: Option<String>,
    pub body: Option<Value>,
}

impl Recorded {
    /// Decoded value of the first query parameter called `key`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn is_data_call(&self) -> bool {
        self.path.starts_with("/rest/v1/")
    }
}

/// Reply produced by a responder.
#[derive(Debug, Clone)]
pub struct Reply {
    status: u16,
    headers: Vec<(&'static str, String)>,
    body: String,
}

impl Reply {
    pub fn json(status: u16, body: &Value) -> Self {
        Self {
            status,
            headers: vec![("content-type", "application/json".to_owned())],
            body: body.to_string(),
        }
    }

    pub fn empty(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: String::new(),
        }
    }

    pub fn with_header(mut self, name: &'static str, value: &str) -> Self {
        self.headers.push((name, value.to_owned()));
        self
    }
}

type Responder = dyn Fn(&Recorded) -> Reply + Send + Sync;

struct StubState {
    requests: Mutex<Vec<Recorded>>,
    respond: Box<Responder>,
}

/// Running stub server. Dropping it leaves the task to die with the runtime.
pub struct HttpStub {
    base: Url,
    state: Arc<StubState>,
}

impl HttpStub {
    pub async fn start(respond: impl Fn(&Recorded) -> Reply + Send + Sync + 'static) -> Self {
        let state = Arc::new(StubState {
            requests: Mutex::new(Vec::new()),
            respond: Box::new(respond),
        });
        let app = Router::new()
            .fallback(record_and_reply)
            .with_state(Arc::clone(&state));
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
        let addr = listener.local_addr().expect("stub address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve stub");
        });
        let base = Url::parse(&format!("http://{addr}")).expect("stub url");
        Self { base, state }
    }

    pub fn client(&self) -> SupabaseClient {
        SupabaseClient::new(SupabaseConfig {
            url: self.base.clone(),
            anon_key: ANON_KEY.to_owned(),
            timeout: Duration::from_secs(5),
        })
        .expect("client")
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|req| req.path == path)
            .collect()
    }

    /// The only request made to `path`.
    pub fn single(&self, path: &str) -> Recorded {
        let mut hits = self.requests_to(path);
        assert_eq!(hits.len(), 1, "expected one request to {path}, got {hits:?}");
        hits.pop().expect("one request")
    }
}

async fn record_and_reply(
    State(state): State<Arc<StubState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
    };
    let recorded = Recorded {
        method,
        path: uri.path().to_owned(),
        query: url::form_urlencoded::parse(uri.query().unwrap_or_default().as_bytes())
            .into_owned()
            .collect(),
        authorization: header("authorization"),
        apikey: header("apikey"),
        prefer: header("prefer"),
        body: serde_json::from_slice(&body).ok(),
    };
    let reply = (state.respond)(&recorded);
    state
        .requests
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(recorded);

    let mut builder = Response::builder().status(reply.status);
    for (name, value) in reply.headers {
        builder = builder.header(name, value);
    }
    builder.body(Body::from(reply.body)).expect("stub response")
}
