//! Password hashing, cookie sessions and the middleware that guards routes.
//!
//! Sessions live in memory, keyed by a random token, and expire after a
//! configurable time. The token travels in a cookie signed with a key derived
//! from the session secret, so a cookie minted for one secret is rejected by a
//! server running with another.

use crate::error::AppError;
use crate::AppState;
use anyhow::anyhow;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, Key, SameSite, SignedCookieJar};
use sha2::{Digest, Sha512};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "repolens_session";

/// The signed-in user, inserted into request extensions by the middleware
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: i64,
    pub username: String,
}

/// Hash a password with Argon2id and a fresh random salt
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("Failed to hash password: {}", e))?;
    Ok(hash.to_string())
}

/// Check a password against a stored PHC-format hash.
///
/// Hashes that do not parse are rejected.
pub fn verify_password(password: &str, stored: &str) -> bool {
    PasswordHash::new(stored)
        .and_then(|hash| Argon2::default().verify_password(password.as_bytes(), &hash))
        .is_ok()
}

struct Session {
    context: AuthContext,
    /// `None` when the TTL is too large to represent
    expires_at: Option<Instant>,
}

impl Session {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| now < at)
    }
}

/// In-memory session table
pub struct SessionStore {
    key: Key,
    ttl: Duration,
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        let key = if secret.is_empty() {
            Key::generate()
        } else {
            Key::from(Sha512::digest(secret.as_bytes()).as_slice())
        };

        Self {
            key,
            ttl,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// The request's cookies, verified against the signing key
    pub fn jar(&self, headers: &HeaderMap) -> SignedCookieJar {
        SignedCookieJar::from_headers(headers, self.key.clone())
    }

    /// Start a session and add its cookie to `jar`.
    ///
    /// Expired sessions are dropped first.
    pub async fn create(&self, jar: SignedCookieJar, context: AuthContext) -> SignedCookieJar {
        let token = Uuid::new_v4().simple().to_string();
        let now = Instant::now();

        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, session| session.is_live(now));
        sessions.insert(
            token.clone(),
            Session {
                context,
                expires_at: now.checked_add(self.ttl),
            },
        );
        drop(sessions);

        jar.add(
            Cookie::build((SESSION_COOKIE, token))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax),
        )
    }

    /// Resolve the request's session
    pub async fn authenticate(&self, headers: &HeaderMap) -> Option<AuthContext> {
        let cookie = self.jar(headers).get(SESSION_COOKIE)?;
        let token = cookie.value();
        let now = Instant::now();

        {
            let sessions = self.sessions.read().await;
            match sessions.get(token) {
                Some(session) if session.is_live(now) => return Some(session.context.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        self.sessions.write().await.remove(token);
        None
    }

    /// End the request's session, if any, and remove its cookie
    pub async fn destroy(&self, headers: &HeaderMap) -> SignedCookieJar {
        let jar = self.jar(headers);
        if let Some(cookie) = jar.get(SESSION_COOKIE) {
            self.sessions.write().await.remove(cookie.value());
        }
        jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

/// Guard for HTML pages: redirect to the login page without a session
pub async fn require_page_session(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    match state.sessions.authenticate(request.headers()).await {
        Some(context) => {
            request.extensions_mut().insert(context);
            next.run(request).await
        }
        None => Redirect::to("/login").into_response(),
    }
}

/// Guard for JSON endpoints: answer 401 without a session
pub async fn require_api_session(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let context = state
        .sessions
        .authenticate(request.headers())
        .await
        .ok_or(AppError::Unauthorized)?;

    request.extensions_mut().insert(context);
    Ok(next.run(request).await)
}
