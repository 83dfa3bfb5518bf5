//! Session bootstrap, login and logout against a mock backend

use jobtrack_http::types::AccountType;
use jobtrack_http::{Access, JobTrackClient, MemoryTokenStore, Session, TokenStore};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn me_body(account_type: &str) -> serde_json::Value {
    json!({"id": 4, "username": "sam", "email": "sam@example.com", "account_type": account_type})
}

fn client(server: &MockServer, store: MemoryTokenStore) -> JobTrackClient {
    JobTrackClient::builder()
        .base_url(server.uri())
        .token_store(Arc::new(store))
        .build()
        .unwrap()
}

#[tokio::test]
async fn bootstrap_loads_identity_when_token_stored() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/auth/me/"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(me_body("AP")))
        .expect(1)
        .mount(&server)
        .await;

    let session = Session::bootstrap(client(
        &server,
        MemoryTokenStore::with_tokens("A1", "R1"),
    ))
    .await;

    assert!(!session.is_loading());
    assert_eq!(session.account_type(), Some(AccountType::Applicant));
    assert_eq!(session.require_role(AccountType::Applicant), Access::Allow);
    assert_eq!(
        session.require_role(AccountType::Employer),
        Access::RedirectTo("/applicant/jobs")
    );
}

#[tokio::test]
async fn bootstrap_without_token_skips_identity_fetch() {
    let server = MockServer::start().await;

    let session = Session::bootstrap(client(&server, MemoryTokenStore::new())).await;

    assert!(!session.is_loading());
    assert_eq!(session.me(), None);
    assert_eq!(session.home_route(), Some("/login"));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn bootstrap_failure_clears_identity_and_tokens() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/auth/me/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let session = Session::bootstrap(client(
        &server,
        MemoryTokenStore::with_tokens("A1", "R1"),
    ))
    .await;

    assert!(!session.is_loading());
    assert_eq!(session.me(), None);
    assert!(!session.is_authenticated());
    assert_eq!(session.client().tokens().refresh(), None);
}

#[tokio::test]
async fn bootstrap_recovers_expired_access_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/auth/me/"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me/"))
        .and(header("authorization", "Bearer A2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(me_body("EM")))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "A2"})))
        .expect(1)
        .mount(&server)
        .await;

    let session = Session::bootstrap(client(
        &server,
        MemoryTokenStore::with_tokens("A1", "R1"),
    ))
    .await;

    assert_eq!(session.account_type(), Some(AccountType::Employer));
    assert_eq!(session.client().tokens().access().as_deref(), Some("A2"));
}

#[tokio::test]
async fn login_then_logout() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"access": "A1", "refresh": "R1"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me/"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(me_body("EM")))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/logout/"))
        .respond_with(ResponseTemplate::new(205))
        .expect(1)
        .mount(&server)
        .await;

    let session = Session::bootstrap(client(&server, MemoryTokenStore::new())).await;
    let me = session.login("sam", "hunter2").await.unwrap();

    assert_eq!(me.account_type, AccountType::Employer);
    assert_eq!(session.home_route(), Some("/employer/jobs"));
    assert_eq!(session.require_auth(), Access::Allow);

    session.mark_new_application_draft(true);
    session.logout().await.unwrap();

    assert_eq!(session.me(), None);
    assert!(!session.has_new_application_draft());
    assert_eq!(session.require_auth(), Access::RedirectToLogin);
    assert_eq!(session.client().tokens().access(), None);
}
