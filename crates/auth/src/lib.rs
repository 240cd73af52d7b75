//! Auth client for the point-of-sale
//!
//! Email/password sign-in against the hosted auth service (`/auth/v1`),
//! an in-memory session store and a subscription to session changes.

use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;
use tokio::sync::broadcast;

/// Error type
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("API error: {message} (Status: {status})")]
    ApiError { message: String, status: u16 },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Missing session")]
    MissingSession,
}

/// Authenticated user as reported by the auth service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub app_metadata: serde_json::Value,
    #[serde(default)]
    pub user_metadata: serde_json::Value,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Session information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub token_type: String,
    pub user: User,
}

/// What happened to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthChangeEvent {
    SignedIn,
    SignedOut,
    TokenRefreshed,
}

/// Notification sent to [`Auth::on_auth_state_change`] subscribers
#[derive(Debug, Clone)]
pub struct AuthStateChange {
    pub event: AuthChangeEvent,
    pub session: Option<Session>,
}

/// Client options
#[derive(Debug, Clone)]
pub struct AuthOptions {
    /// Keep the session returned by sign-in / refresh in memory
    pub persist_session: bool,
}

impl Default for AuthOptions {
    fn default() -> Self {
        Self {
            persist_session: true,
        }
    }
}

const EVENT_CAPACITY: usize = 16;

/// Auth client. Clones share the same session and subscribers.
#[derive(Debug, Clone)]
pub struct Auth {
    url: String,
    key: String,
    http_client: Client,
    options: AuthOptions,
    current_session: Arc<RwLock<Option<Session>>>,
    events: broadcast::Sender<AuthStateChange>,
}

impl Auth {
    /// Create a new auth client
    pub fn new(url: &str, key: &str, http_client: Client, options: AuthOptions) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            url: url.trim_end_matches('/').to_string(),
            key: key.to_string(),
            http_client,
            options,
            current_session: Arc::new(RwLock::new(None)),
            events,
        }
    }

    /// Sign in with email and password
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        let url = format!("{}/auth/v1/token?grant_type=password", self.url);

        let payload = serde_json::json!({
            "email": email,
            "password": password,
        });

        let response = self
            .http_client
            .post(&url)
            .header("apikey", &self.key)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        let session: Session = parse_response(response).await?;
        log::info!("signed in as {}", session.user.id);

        self.store_session(Some(session.clone()));
        self.notify(AuthChangeEvent::SignedIn, Some(session.clone()));

        Ok(session)
    }

    /// Current session, if any
    pub fn get_session(&self) -> Option<Session> {
        self.current_session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Install a session obtained elsewhere (e.g. restored from disk)
    pub fn set_session(&self, session: Session) {
        self.store_session(Some(session.clone()));
        self.notify(AuthChangeEvent::SignedIn, Some(session));
    }

    /// Fetch the current user from the auth service
    pub async fn get_user(&self) -> Result<User, AuthError> {
        let session = self.get_session().ok_or(AuthError::MissingSession)?;

        let url = format!("{}/auth/v1/user", self.url);

        let response = self
            .http_client
            .get(&url)
            .header("apikey", &self.key)
            .header("Authorization", format!("Bearer {}", session.access_token))
            .send()
            .await?;

        parse_response(response).await
    }

    /// Exchange the refresh token for a new session
    pub async fn refresh_session(&self) -> Result<Session, AuthError> {
        let session = self.get_session().ok_or(AuthError::MissingSession)?;

        let url = format!("{}/auth/v1/token?grant_type=refresh_token", self.url);

        let payload = serde_json::json!({
            "refresh_token": session.refresh_token,
        });

        let response = self
            .http_client
            .post(&url)
            .header("apikey", &self.key)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        let new_session: Session = parse_response(response).await?;
        log::debug!("session refreshed for {}", new_session.user.id);

        self.store_session(Some(new_session.clone()));
        self.notify(AuthChangeEvent::TokenRefreshed, Some(new_session.clone()));

        Ok(new_session)
    }

    /// Sign out. The local session is cleared even when the server call fails.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        let session = self.get_session().ok_or(AuthError::MissingSession)?;

        let url = format!("{}/auth/v1/logout", self.url);

        let result = self
            .http_client
            .post(&url)
            .header("apikey", &self.key)
            .header("Authorization", format!("Bearer {}", session.access_token))
            .send()
            .await;

        *self
            .current_session
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
        self.notify(AuthChangeEvent::SignedOut, None);

        let response = result?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        Ok(())
    }

    /// Subscribe to sign-in, sign-out and refresh notifications
    pub fn on_auth_state_change(&self) -> broadcast::Receiver<AuthStateChange> {
        self.events.subscribe()
    }

    /// Access token of the current session
    pub fn access_token(&self) -> Option<String> {
        self.get_session().map(|s| s.access_token)
    }

    fn store_session(&self, session: Option<Session>) {
        if !self.options.persist_session {
            return;
        }
        *self
            .current_session
            .write()
            .unwrap_or_else(PoisonError::into_inner) = session;
    }

    fn notify(&self, event: AuthChangeEvent, session: Option<Session>) {
        // No subscribers is fine
        let _ = self.events.send(AuthStateChange { event, session });
    }
}

async fn parse_response<T: for<'de> Deserialize<'de>>(response: Response) -> Result<T, AuthError> {
    if !response.status().is_success() {
        return Err(api_error(response).await);
    }
    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}

async fn api_error(response: Response) -> AuthError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();

    #[derive(Deserialize)]
    struct ErrorBody {
        error_description: Option<String>,
        msg: Option<String>,
        message: Option<String>,
    }

    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.error_description.or(b.msg).or(b.message))
        .unwrap_or(body);

    log::warn!("auth request failed with {}: {}", status, message);
    AuthError::ApiError { message, status }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn session_body(token: &str) -> serde_json::Value {
        json!({
            "access_token": token,
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "refresh-1",
            "user": { "id": "user-1", "email": "caja@example.com" }
        })
    }

    #[tokio::test]
    async fn sign_in_stores_session_and_notifies() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "password"))
            .and(header("apikey", "anon"))
            .and(body_json(
                json!({ "email": "caja@example.com", "password": "secret" }),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(session_body("token-1")))
            .mount(&mock_server)
            .await;

        let auth = Auth::new(
            &mock_server.uri(),
            "anon",
            Client::new(),
            AuthOptions::default(),
        );
        let mut changes = auth.on_auth_state_change();

        let session = auth
            .sign_in_with_password("caja@example.com", "secret")
            .await
            .unwrap();

        assert_eq!(session.user.id, "user-1");
        assert_eq!(auth.access_token().as_deref(), Some("token-1"));

        let change = changes.recv().await.unwrap();
        assert_eq!(change.event, AuthChangeEvent::SignedIn);
        assert_eq!(change.session.unwrap().access_token, "token-1");
    }

    #[tokio::test]
    async fn bad_credentials_surface_the_service_message() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid login credentials"
            })))
            .mount(&mock_server)
            .await;

        let auth = Auth::new(
            &mock_server.uri(),
            "anon",
            Client::new(),
            AuthOptions::default(),
        );

        match auth.sign_in_with_password("x@example.com", "nope").await {
            Err(AuthError::ApiError { message, status }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "Invalid login credentials");
            }
            other => panic!("expected ApiError, got {:?}", other),
        }
        assert!(auth.get_session().is_none());
    }

    #[tokio::test]
    async fn refresh_replaces_session() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "refresh_token"))
            .and(body_json(json!({ "refresh_token": "refresh-1" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(session_body("token-2")))
            .mount(&mock_server)
            .await;

        let auth = Auth::new(
            &mock_server.uri(),
            "anon",
            Client::new(),
            AuthOptions::default(),
        );
        let initial: Session = serde_json::from_value(session_body("token-1")).unwrap();
        auth.set_session(initial);
        let mut changes = auth.on_auth_state_change();

        let refreshed = auth.refresh_session().await.unwrap();

        assert_eq!(refreshed.access_token, "token-2");
        assert_eq!(auth.access_token().as_deref(), Some("token-2"));
        assert_eq!(
            changes.recv().await.unwrap().event,
            AuthChangeEvent::TokenRefreshed
        );
    }

    #[test]
    fn operations_without_session_fail() {
        tokio_test::block_on(async {
            let auth = Auth::new(
                "http://localhost:9",
                "anon",
                Client::new(),
                AuthOptions::default(),
            );

            assert!(matches!(
                auth.get_user().await,
                Err(AuthError::MissingSession)
            ));
            assert!(matches!(
                auth.refresh_session().await,
                Err(AuthError::MissingSession)
            ));
            assert!(matches!(auth.sign_out().await, Err(AuthError::MissingSession)));
        });
    }

    #[tokio::test]
    async fn sign_out_clears_session() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/v1/logout"))
            .and(header("Authorization", "Bearer token-1"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&mock_server)
            .await;

        let auth = Auth::new(
            &mock_server.uri(),
            "anon",
            Client::new(),
            AuthOptions::default(),
        );
        auth.set_session(serde_json::from_value(session_body("token-1")).unwrap());
        let mut changes = auth.on_auth_state_change();

        auth.sign_out().await.unwrap();

        assert!(auth.get_session().is_none());
        let change = changes.recv().await.unwrap();
        assert_eq!(change.event, AuthChangeEvent::SignedOut);
        assert!(change.session.is_none());
    }

    #[tokio::test]
    async fn session_not_kept_when_persistence_disabled() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(session_body("token-1")))
            .mount(&mock_server)
            .await;

        let auth = Auth::new(
            &mock_server.uri(),
            "anon",
            Client::new(),
            AuthOptions {
                persist_session: false,
            },
        );

        let session = auth
            .sign_in_with_password("caja@example.com", "secret")
            .await
            .unwrap();

        assert_eq!(session.access_token, "token-1");
        assert!(auth.get_session().is_none());
    }
}
