use fitcooker_auth::{Auth, AuthError, AuthOptions};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn session_json(access: &str, refresh: &str) -> serde_json::Value {
    json!({
        "access_token": access,
        "token_type": "bearer",
        "expires_in": 3600,
        "refresh_token": refresh,
        "user": {
            "id": "test_user_id",
            "email": "test@example.com",
            "role": "authenticated"
        }
    })
}

fn auth_client(server: &MockServer) -> Auth {
    Auth::new(
        &server.uri(),
        "test_anon_key",
        reqwest::Client::new(),
        AuthOptions::default(),
    )
}

#[tokio::test]
async fn test_sign_in_with_password() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .and(header("apikey", "test_anon_key"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(session_json("test_access_token", "test_refresh_token")),
        )
        .mount(&mock_server)
        .await;

    let auth = auth_client(&mock_server);
    let result = auth
        .sign_in_with_password("test@example.com", "password123")
        .await;

    assert!(result.is_ok());
    if let Ok(session) = result {
        assert_eq!(session.access_token, "test_access_token");
        assert_eq!(session.user.id, "test_user_id");
        assert_eq!(session.user.email, Some("test@example.com".to_string()));
    }
    assert!(auth.get_session().is_some());
}

#[tokio::test]
async fn test_sign_in_without_persistence() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(session_json("test_access_token", "test_refresh_token")),
        )
        .mount(&mock_server)
        .await;

    let auth = Auth::new(
        &mock_server.uri(),
        "test_anon_key",
        reqwest::Client::new(),
        AuthOptions {
            persist_session: false,
        },
    );
    auth.sign_in_with_password("test@example.com", "password123")
        .await
        .unwrap();
    assert!(auth.get_session().is_none());
}

#[tokio::test]
async fn test_refresh_then_sign_out() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(session_json("old_access", "old_refresh")),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "refresh_token"))
        .and(body_json(json!({ "refresh_token": "old_refresh" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(session_json("new_access", "new_refresh")),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .and(header("Authorization", "Bearer new_access"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let auth = auth_client(&mock_server);
    auth.sign_in_with_password("test@example.com", "password123")
        .await
        .unwrap();

    let refreshed = auth.refresh_session().await.unwrap();
    assert_eq!(refreshed.access_token, "new_access");
    assert_eq!(refreshed.refresh_token, "new_refresh");

    auth.sign_out().await.unwrap();
    assert!(auth.get_session().is_none());
}

#[tokio::test]
async fn test_calls_without_session() {
    let mock_server = MockServer::start().await;
    let auth = auth_client(&mock_server);

    assert!(matches!(auth.get_user().await, Err(AuthError::MissingSession)));
    assert!(matches!(auth.refresh_session().await, Err(AuthError::MissingSession)));
    assert!(matches!(auth.sign_out().await, Err(AuthError::MissingSession)));
}

#[tokio::test]
async fn test_reset_password_for_email() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/recover"))
        .and(body_json(json!({ "email": "test@example.com" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = auth_client(&mock_server)
        .reset_password_for_email(" test@example.com ")
        .await;
    assert!(result.is_ok(), "recover failed: {:?}", result.err());
}
