//! FitCooker account client
//!
//! Email/password accounts on the hosted auth service (GoTrue): sign up,
//! sign in, session management and password recovery.

use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("API error: {0}")]
    ApiError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Missing session")]
    MissingSession,

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Account as returned by the auth service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub app_metadata: Value,
    #[serde(default)]
    pub user_metadata: Value,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl User {
    /// Display name stored at sign-up, if any
    pub fn name(&self) -> Option<&str> {
        self.user_metadata.get("name").and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub token_type: String,
    pub user: User,
}

/// Result of a sign-up
///
/// `session` is `None` when the project requires email confirmation.
#[derive(Debug, Clone)]
pub struct SignUpResponse {
    pub user: User,
    pub session: Option<Session>,
}

#[derive(Debug, Clone)]
pub struct AuthOptions {
    /// Keep the session returned by sign-in/sign-up in memory
    pub persist_session: bool,
}

impl Default for AuthOptions {
    fn default() -> Self {
        Self {
            persist_session: true,
        }
    }
}

/// Minimum password length accepted by the auth service
pub const MIN_PASSWORD_LENGTH: usize = 6;

pub struct Auth {
    url: String,
    key: String,
    http_client: Client,
    options: AuthOptions,
    current_session: Arc<RwLock<Option<Session>>>,
}

impl Auth {
    pub fn new(url: &str, key: &str, http_client: Client, options: AuthOptions) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            key: key.to_string(),
            http_client,
            options,
            current_session: Arc::new(RwLock::new(None)),
        }
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.http_client
            .post(format!("{}/auth/v1/{}", self.url, path))
            .header("apikey", &self.key)
            .header("Content-Type", "application/json")
    }

    fn store_session(&self, session: &Session) {
        if self.options.persist_session {
            let mut write_guard = self
                .current_session
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            *write_guard = Some(session.clone());
        }
    }

    fn clear_session(&self) {
        let mut write_guard = self
            .current_session
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *write_guard = None;
    }

    /// Register a new account; `name` is stored in the user metadata
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<SignUpResponse, AuthError> {
        validate_credentials(email, password)?;

        let payload = serde_json::json!({
            "email": email.trim(),
            "password": password,
            "data": { "name": name.trim() },
        });

        let response = self.post("signup").json(&payload).send().await?;
        let body: Value = read_body(response).await?;

        // With email confirmation enabled only the user comes back.
        if body.get("access_token").is_some() {
            let session: Session = serde_json::from_value(body)?;
            self.store_session(&session);
            log::info!("signed up {}", session.user.id);
            Ok(SignUpResponse {
                user: session.user.clone(),
                session: Some(session),
            })
        } else {
            let user: User = match body.get("user") {
                Some(user) => serde_json::from_value(user.clone())?,
                None => serde_json::from_value(body)?,
            };
            log::info!("signed up {} (confirmation pending)", user.id);
            Ok(SignUpResponse {
                user,
                session: None,
            })
        }
    }

    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        validate_credentials(email, password)?;

        let payload = serde_json::json!({
            "email": email.trim(),
            "password": password,
        });

        let response = self
            .post("token?grant_type=password")
            .json(&payload)
            .send()
            .await?;
        let session: Session = read_body(response).await?;

        self.store_session(&session);
        log::debug!("signed in {}", session.user.id);
        Ok(session)
    }

    pub fn get_session(&self) -> Option<Session> {
        let read_guard = self
            .current_session
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        read_guard.clone()
    }

    /// Restore a session persisted elsewhere
    pub fn set_session(&self, session: Session) {
        self.store_session(&session);
    }

    /// Bearer token of the current session
    pub fn access_token(&self) -> Option<String> {
        self.get_session().map(|s| s.access_token)
    }

    pub async fn get_user(&self) -> Result<User, AuthError> {
        let session = self.get_session().ok_or(AuthError::MissingSession)?;

        let response = self
            .http_client
            .get(format!("{}/auth/v1/user", self.url))
            .header("apikey", &self.key)
            .header("Authorization", format!("Bearer {}", session.access_token))
            .send()
            .await?;

        read_body(response).await
    }

    pub async fn refresh_session(&self) -> Result<Session, AuthError> {
        let session = self.get_session().ok_or(AuthError::MissingSession)?;

        let payload = serde_json::json!({
            "refresh_token": session.refresh_token,
        });

        let response = self
            .post("token?grant_type=refresh_token")
            .json(&payload)
            .send()
            .await?;
        let new_session: Session = read_body(response).await?;

        self.store_session(&new_session);
        Ok(new_session)
    }

    /// End the session on the server and forget it locally
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        let session = self.get_session().ok_or(AuthError::MissingSession)?;

        let response = self
            .post("logout")
            .header("Authorization", format!("Bearer {}", session.access_token))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AuthError::ApiError(error_message(response).await));
        }

        self.clear_session();
        Ok(())
    }

    pub async fn reset_password_for_email(&self, email: &str) -> Result<(), AuthError> {
        if !is_valid_email(email) {
            return Err(AuthError::InvalidInput(format!("invalid email: {}", email)));
        }

        let payload = serde_json::json!({
            "email": email.trim(),
        });

        let response = self.post("recover").json(&payload).send().await?;

        if !response.status().is_success() {
            return Err(AuthError::ApiError(error_message(response).await));
        }

        Ok(())
    }

    /// Change the password of the signed-in user
    pub async fn update_password(&self, new_password: &str) -> Result<User, AuthError> {
        if new_password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::InvalidInput(format!(
                "password must have at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }
        let session = self.get_session().ok_or(AuthError::MissingSession)?;

        let payload = serde_json::json!({
            "password": new_password,
        });

        let response = self
            .http_client
            .put(format!("{}/auth/v1/user", self.url))
            .header("apikey", &self.key)
            .header("Authorization", format!("Bearer {}", session.access_token))
            .json(&payload)
            .send()
            .await?;

        read_body(response).await
    }
}

fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    }
}

fn validate_credentials(email: &str, password: &str) -> Result<(), AuthError> {
    if !is_valid_email(email) {
        return Err(AuthError::InvalidInput(format!("invalid email: {}", email)));
    }
    if password.is_empty() {
        return Err(AuthError::InvalidInput("password is required".to_string()));
    }
    Ok(())
}

async fn read_body<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<T, AuthError> {
    if !response.status().is_success() {
        return Err(AuthError::ApiError(error_message(response).await));
    }
    Ok(response.json::<T>().await?)
}

/// Human readable message of an auth error body
async fn error_message(response: reqwest::Response) -> String {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    let parsed = serde_json::from_str::<Value>(&text).ok().and_then(|body| {
        ["error_description", "msg", "message", "error"]
            .iter()
            .find_map(|key| body.get(*key).and_then(Value::as_str).map(str::to_string))
    });
    match parsed {
        Some(message) => message,
        None if text.is_empty() => status.to_string(),
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn session_body() -> Value {
        serde_json::json!({
            "access_token": "test_access_token",
            "refresh_token": "test_refresh_token",
            "expires_in": 3600,
            "token_type": "bearer",
            "user": {
                "id": "test_user_id",
                "email": "cook@example.com",
                "phone": null,
                "app_metadata": {},
                "user_metadata": { "name": "Ana" },
                "created_at": "2024-01-01T00:00:00Z",
                "updated_at": "2024-01-01T00:00:00Z"
            }
        })
    }

    fn auth(server: &MockServer) -> Auth {
        Auth::new(&server.uri(), "test_key", Client::new(), AuthOptions::default())
    }

    #[test]
    fn test_sign_up_stores_name() {
        tokio_test::block_on(async {
            let mock_server = MockServer::start().await;

            Mock::given(method("POST"))
                .and(path("/auth/v1/signup"))
                .and(body_json(serde_json::json!({
                    "email": "cook@example.com",
                    "password": "password123",
                    "data": { "name": "Ana" }
                })))
                .respond_with(ResponseTemplate::new(200).set_body_json(session_body()))
                .mount(&mock_server)
                .await;

            let auth = auth(&mock_server);
            let result = auth.sign_up("cook@example.com", "password123", " Ana ").await;

            assert!(result.is_ok(), "sign up failed: {:?}", result.err());
            let response = result.unwrap();
            assert_eq!(response.user.name(), Some("Ana"));
            assert!(response.session.is_some());
            assert_eq!(auth.access_token().as_deref(), Some("test_access_token"));
        });
    }

    #[test]
    fn test_sign_up_pending_confirmation() {
        tokio_test::block_on(async {
            let mock_server = MockServer::start().await;

            Mock::given(method("POST"))
                .and(path("/auth/v1/signup"))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "id": "new_user",
                    "email": "cook@example.com",
                    "user_metadata": { "name": "Ana" }
                })))
                .mount(&mock_server)
                .await;

            let auth = auth(&mock_server);
            let response = auth
                .sign_up("cook@example.com", "password123", "Ana")
                .await
                .unwrap();

            assert_eq!(response.user.id, "new_user");
            assert!(response.session.is_none());
            assert!(auth.get_session().is_none());
        });
    }

    #[test]
    fn test_sign_in_error_message() {
        tokio_test::block_on(async {
            let mock_server = MockServer::start().await;

            Mock::given(method("POST"))
                .and(path("/auth/v1/token"))
                .and(query_param("grant_type", "password"))
                .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                    "error": "invalid_grant",
                    "error_description": "Invalid login credentials"
                })))
                .mount(&mock_server)
                .await;

            let result = auth(&mock_server)
                .sign_in_with_password("cook@example.com", "wrong")
                .await;

            match result {
                Err(AuthError::ApiError(message)) => {
                    assert_eq!(message, "Invalid login credentials")
                }
                other => panic!("Expected ApiError, got {:?}", other),
            }
        });
    }

    #[test]
    fn test_invalid_input_skips_request() {
        tokio_test::block_on(async {
            let mock_server = MockServer::start().await;
            Mock::given(method("POST"))
                .respond_with(ResponseTemplate::new(500))
                .expect(0)
                .mount(&mock_server)
                .await;

            let auth = auth(&mock_server);
            assert!(matches!(
                auth.sign_in_with_password("not-an-email", "secret").await,
                Err(AuthError::InvalidInput(_))
            ));
            assert!(matches!(
                auth.sign_up("cook@example.com", "", "Ana").await,
                Err(AuthError::InvalidInput(_))
            ));
            assert!(matches!(
                auth.reset_password_for_email("cook@").await,
                Err(AuthError::InvalidInput(_))
            ));
        });
    }

    #[test]
    fn test_update_password() {
        tokio_test::block_on(async {
            let mock_server = MockServer::start().await;

            Mock::given(method("PUT"))
                .and(path("/auth/v1/user"))
                .and(header("Authorization", "Bearer test_access_token"))
                .and(body_json(serde_json::json!({ "password": "new-secret" })))
                .respond_with(
                    ResponseTemplate::new(200).set_body_json(session_body()["user"].clone()),
                )
                .mount(&mock_server)
                .await;

            let auth = auth(&mock_server);
            assert!(matches!(
                auth.update_password("new-secret").await,
                Err(AuthError::MissingSession)
            ));

            let session: Session = serde_json::from_value(session_body()).unwrap();
            auth.set_session(session);
            assert!(matches!(
                auth.update_password("123").await,
                Err(AuthError::InvalidInput(_))
            ));

            let user = auth.update_password("new-secret").await.unwrap();
            assert_eq!(user.id, "test_user_id");
        });
    }

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("cook@example.com"));
        assert!(is_valid_email("  cook@example.com "));
        assert!(!is_valid_email("cook@example"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("cook@.com"));
        assert!(!is_valid_email("cook.example.com"));
    }
}
