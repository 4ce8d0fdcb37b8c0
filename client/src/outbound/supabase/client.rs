//! Shared HTTP plumbing for the hosted backend.
//!
//! One [`SupabaseClient`] serves both the auth API and the data API. It owns
//! the current session so data requests can attach a fresh bearer token.

use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use reqwest::header::{self, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::{Mutex, broadcast};
use tracing::debug;
use url::Url;
use zeroize::Zeroizing;

use super::auth::Freshness;
use super::dto::ErrorBodyDto;
use super::query::RestQuery;
use crate::domain::ports::RemoteStoreError;
use crate::domain::{AuthEvent, Session};

/// Header carrying the project's publishable key.
const API_KEY_HEADER: &str = "apikey";
/// Capacity of the auth event channel. Slow listeners see `Lagged`.
const EVENT_CAPACITY: usize = 16;

/// Connection settings for [`SupabaseClient`].
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://abc.supabase.co`.
    pub url: Url,
    /// Publishable (anon) API key.
    pub anon_key: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

/// Auth and data client for one hosted project.
pub struct SupabaseClient {
    pub(super) http: Client,
    base: Url,
    anon_key: Zeroizing<String>,
    session: RwLock<Option<Session>>,
    pub(super) refresh_lock: Mutex<()>,
    events: broadcast::Sender<AuthEvent>,
}

impl SupabaseClient {
    /// Build a client with the configured request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(config: SupabaseConfig) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(config.timeout).build()?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Ok(Self {
            http,
            base: with_trailing_slash(config.url),
            anon_key: Zeroizing::new(config.anon_key),
            session: RwLock::new(None),
            refresh_lock: Mutex::new(()),
            events,
        })
    }

    pub(super) fn stored_session(&self) -> Option<Session> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(super) fn store_session(&self, next: Option<Session>) {
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = next;
    }

    pub(super) fn subscribe_events(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    pub(super) fn publish(&self, event: AuthEvent) {
        if self.events.send(event).is_err() {
            debug!("auth event dropped: no listeners");
        }
    }

    pub(super) fn anon_key(&self) -> &str {
        self.anon_key.as_str()
    }

    pub(super) fn auth_url(&self, path: &str) -> Result<Url, url::ParseError> {
        self.base.join(&format!("auth/v1/{path}"))
    }

    /// Bearer for data requests: the session token, refreshed when stale,
    /// or the anon key when nobody signed in.
    ///
    /// A session whose refresh was refused fails the request instead of
    /// falling back to the anon key.
    async fn bearer(&self) -> Result<String, RemoteStoreError> {
        let freshness = self
            .fresh_session()
            .await
            .map_err(|err| RemoteStoreError::unauthorized(err.to_string()))?;
        match freshness {
            Freshness::Live(session) => Ok(session.access_token().to_owned()),
            Freshness::Anonymous => Ok(self.anon_key().to_owned()),
            Freshness::Revoked => Err(RemoteStoreError::unauthorized(
                "session expired; sign in again",
            )),
        }
    }

    /// Authorised request against a data table.
    pub(super) async fn rest_request(
        &self,
        method: Method,
        query: &RestQuery,
        prefer: Option<&'static str>,
    ) -> Result<RequestBuilder, RemoteStoreError> {
        let url = query
            .url(&self.base)
            .map_err(|err| RemoteStoreError::rejected(err.to_string()))?;
        let bearer = self.bearer().await?;
        let mut request = self
            .http
            .request(method, url)
            .header(API_KEY_HEADER, self.anon_key())
            .bearer_auth(bearer)
            .header(header::ACCEPT, "application/json");
        if let Some(preference) = prefer {
            request = request.header("Prefer", preference);
        }
        Ok(request)
    }

    /// Send a data request and return the body of a successful response.
    pub(super) async fn send_rest(
        &self,
        request: RequestBuilder,
    ) -> Result<Vec<u8>, RemoteStoreError> {
        let response = request.send().await.map_err(map_store_transport)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_store_transport)?;
        if !status.is_success() {
            return Err(map_store_status(status, body.as_ref()));
        }
        Ok(body.to_vec())
    }

    /// Fetch rows matching `query`.
    pub(super) async fn select<T: DeserializeOwned>(
        &self,
        query: &RestQuery,
    ) -> Result<Vec<T>, RemoteStoreError> {
        let request = self.rest_request(Method::GET, query, None).await?;
        let body = self.send_rest(request).await?;
        decode_rows(&body)
    }

    /// Exact row count via a `HEAD` request.
    pub(super) async fn count(&self, query: &RestQuery) -> Result<u64, RemoteStoreError> {
        let request = self
            .rest_request(Method::HEAD, query, Some("count=exact"))
            .await?;
        let response = request.send().await.map_err(map_store_transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(map_store_status(status, &[]));
        }
        let range = response
            .headers()
            .get(header::CONTENT_RANGE)
            .map(HeaderValue::to_str)
            .transpose()
            .map_err(|err| RemoteStoreError::decode(err.to_string()))?;
        parse_content_range(range)
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

pub(super) fn decode_rows<T: DeserializeOwned>(body: &[u8]) -> Result<Vec<T>, RemoteStoreError> {
    serde_json::from_slice(body).map_err(|err| RemoteStoreError::decode(err.to_string()))
}

/// First row of a `return=representation` response.
pub(super) fn single_row<T: DeserializeOwned>(
    body: &[u8],
    what: &str,
) -> Result<T, RemoteStoreError> {
    decode_rows(body)?
        .into_iter()
        .next()
        .ok_or_else(|| RemoteStoreError::not_found(format!("{what} was not returned")))
}

/// Total from `Content-Range`, which reads `*/7` or `0-6/7`.
fn parse_content_range(range: Option<&str>) -> Result<u64, RemoteStoreError> {
    let raw = range.ok_or_else(|| RemoteStoreError::decode("missing Content-Range header"))?;
    raw.rsplit_once('/')
        .and_then(|(_, total)| total.trim().parse().ok())
        .ok_or_else(|| RemoteStoreError::decode(format!("malformed Content-Range: {raw}")))
}

fn map_store_transport(error: reqwest::Error) -> RemoteStoreError {
    RemoteStoreError::transport(error.to_string())
}

fn map_store_status(status: StatusCode, body: &[u8]) -> RemoteStoreError {
    let message = error_message(status, body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RemoteStoreError::unauthorized(message),
        StatusCode::NOT_FOUND => RemoteStoreError::not_found(message),
        _ if status.is_client_error() => RemoteStoreError::rejected(message),
        _ => RemoteStoreError::transport(message),
    }
}

/// Human-readable message for a failed response. Falls back to a compact
/// preview of the raw body.
pub(super) fn error_message(status: StatusCode, body: &[u8]) -> String {
    if let Some(message) = serde_json::from_slice::<ErrorBodyDto>(body)
        .ok()
        .and_then(ErrorBodyDto::into_message)
    {
        return message;
    }
    let preview = body_preview(body);
    if preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {preview}", status.as_u16())
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let mut preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        preview.push_str("...");
    }
    preview
}
