// ABOUTME: Cookie-based session middleware that loads session data before a handler and saves it after.
// ABOUTME: Handlers reach the session through the `Session` extractor, mainly to put and pop flash messages.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use std::time::Duration;

use axum::body::Body;
use axum::extract::FromRequestParts;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue, Request, Response};
use axum::response::IntoResponse;
use chrono::Utc;
use snippetbox_store::{SessionData, SessionStore};
use tower::{Layer, Service};
use ulid::Ulid;

use crate::error::AppError;

pub const SESSION_COOKIE: &str = "session";

#[derive(Debug, Default)]
struct SessionState {
    data: SessionData,
    modified: bool,
}

/// Per-request handle on the current session's data.
#[derive(Debug, Clone, Default)]
pub struct Session {
    state: Arc<Mutex<SessionState>>,
}

impl Session {
    fn from_data(data: SessionData) -> Self {
        Self {
            state: Arc::new(Mutex::new(SessionState {
                data,
                modified: false,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        // Session state is plain data, so a poisoned lock is still usable.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn put(&self, key: impl Into<String>, value: impl Into<String>) {
        let mut state = self.lock();
        state.data.insert(key.into(), value.into());
        state.modified = true;
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.lock().data.get(key).cloned()
    }

    /// Read and remove a value, e.g. a flash message shown once.
    pub fn pop(&self, key: &str) -> Option<String> {
        let mut state = self.lock();
        let value = state.data.remove(key);
        if value.is_some() {
            state.modified = true;
        }
        value
    }

    fn is_modified(&self) -> bool {
        self.lock().modified
    }

    fn snapshot(&self) -> SessionData {
        self.lock().data.clone()
    }
}

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::internal_msg("session layer is not installed on this route"))
    }
}

/// A tower Layer that loads and saves sessions around the wrapped routes.
#[derive(Clone)]
pub struct SessionLayer {
    store: SessionStore,
    lifetime: Duration,
}

impl SessionLayer {
    pub fn new(store: SessionStore, lifetime: Duration) -> Self {
        Self { store, lifetime }
    }
}

impl<S> Layer<S> for SessionLayer {
    type Service = SessionMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SessionMiddleware {
            inner,
            store: self.store.clone(),
            lifetime: self.lifetime,
        }
    }
}

#[derive(Clone)]
pub struct SessionMiddleware<S> {
    inner: S,
    store: SessionStore,
    lifetime: Duration,
}

impl<S> Service<Request<Body>> for SessionMiddleware<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let mut inner = self.inner.clone();
        let store = self.store.clone();
        let lifetime = self.lifetime;

        Box::pin(async move {
            let presented = session_token(req.headers());

            // Only a token that maps to a live session is reused; anything else
            // gets a fresh token on commit.
            let (token, data) = match presented {
                Some(token) => match store.find(&token).await {
                    Ok(Some(data)) => (Some(token), data),
                    Ok(None) => (None, SessionData::new()),
                    Err(e) => return Ok(AppError::from(e).into_response()),
                },
                None => (None, SessionData::new()),
            };

            let session = Session::from_data(data);
            req.extensions_mut().insert(session.clone());

            let mut resp = inner.call(req).await?;

            if session.is_modified() {
                let token = token.unwrap_or_else(|| Ulid::new().to_string());
                let Some(expiry) = chrono::Duration::from_std(lifetime)
                    .ok()
                    .and_then(|ttl| Utc::now().checked_add_signed(ttl))
                else {
                    return Ok(AppError::internal_msg("session lifetime is out of range").into_response());
                };
                if let Err(e) = store.commit(&token, &session.snapshot(), expiry).await {
                    return Ok(AppError::from(e).into_response());
                }
                match session_cookie(&token, lifetime) {
                    Ok(cookie) => {
                        resp.headers_mut().append(SET_COOKIE, cookie);
                    }
                    Err(e) => return Ok(AppError::internal("invalid session cookie", e).into_response()),
                }
            }

            Ok(resp)
        })
    }
}

/// Extract the session token from the request's Cookie headers.
fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

fn session_cookie(
    token: &str,
    lifetime: Duration,
) -> Result<HeaderValue, axum::http::header::InvalidHeaderValue> {
    HeaderValue::from_str(&format!(
        "{SESSION_COOKIE}={token}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
        lifetime.as_secs()
    ))
}
