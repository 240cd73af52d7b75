use mesa_auth::{Auth, AuthOptions};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_sign_in_then_get_user() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "test_access_token",
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "test_refresh_token",
            "user": {
                "id": "test_user_id",
                "email": "mozo@example.com",
                "role": "authenticated"
            }
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .and(header("Authorization", "Bearer test_access_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "test_user_id",
            "email": "mozo@example.com",
            "role": "authenticated",
            "app_metadata": { "provider": "email" },
            "user_metadata": {},
            "created_at": "2024-05-01T10:00:00Z",
            "updated_at": "2024-05-01T10:00:00Z"
        })))
        .mount(&mock_server)
        .await;

    let auth = Auth::new(
        &mock_server.uri(),
        "test_anon_key",
        reqwest::Client::new(),
        AuthOptions::default(),
    );

    let session = auth
        .sign_in_with_password("mozo@example.com", "password123")
        .await
        .unwrap();
    assert_eq!(session.user.role.as_deref(), Some("authenticated"));

    let user = auth.get_user().await.unwrap();
    assert_eq!(user.id, "test_user_id");
    assert_eq!(user.email, Some("mozo@example.com".to_string()));
    assert_eq!(user.app_metadata["provider"], "email");
}

#[tokio::test]
async fn test_clones_share_session() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "shared",
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "r",
            "user": { "id": "u" }
        })))
        .mount(&mock_server)
        .await;

    let auth = Auth::new(
        &mock_server.uri(),
        "anon",
        reqwest::Client::new(),
        AuthOptions::default(),
    );
    let other = auth.clone();

    auth.sign_in_with_password("a@b.c", "pw").await.unwrap();

    assert_eq!(other.access_token().as_deref(), Some("shared"));
}
