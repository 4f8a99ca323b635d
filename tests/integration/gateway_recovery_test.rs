//! Resilient gateway behavior against a scriptable backend: bounded 401
//! recovery, pass-through of other failures, and terminal sign-in-required
//! handling.

mod common;

use std::sync::Arc;

use lablink_api::{build, LabLinkClient};
use lablink_auth::{MockCredentialSource, ScriptedPrompt};
use lablink_common::Error;

use common::{mint_id_token, seed_credential_file, spawn_backend, TestBackend};

fn client_with_seeded_token(
    backend: &TestBackend,
    dir: &tempfile::TempDir,
    token: &str,
) -> (LabLinkClient, MockCredentialSource, std::path::PathBuf) {
    let path = dir.path().join("credentials.json");
    seed_credential_file(&path, token);
    let source = MockCredentialSource::new();
    let client = build(
        &common::test_config(backend, Some(path.clone())),
        Arc::new(source.clone()),
    )
    .unwrap();
    (client, source, path)
}

#[tokio::test]
async fn test_authorized_request_needs_no_recovery() {
    let backend = spawn_backend().await;
    let dir = tempfile::tempdir().unwrap();
    let token = mint_id_token("student@ucdavis.edu", 3600);
    backend.allow_bearer(&token);
    let (client, _source, _path) = client_with_seeded_token(&backend, &dir, &token);

    let professors = client.api.professors().await.unwrap();
    assert_eq!(professors.len(), 2);

    let control = backend.lock();
    assert_eq!(control.professors_calls, 1);
    assert_eq!(control.login_calls, 0);
}

#[tokio::test]
async fn test_401_refresh_and_retry_surfaces_only_the_success() {
    let backend = spawn_backend().await;
    let dir = tempfile::tempdir().unwrap();
    let token = mint_id_token("student@ucdavis.edu", 3600);
    // The bearer is not accepted directly, but the backend will exchange
    // it for a session cookie.
    backend.accept_token(&token);
    let (client, _source, _path) = client_with_seeded_token(&backend, &dir, &token);

    let professors = client.api.professors().await.unwrap();
    assert_eq!(professors[0].name, "Professor 1");

    let control = backend.lock();
    // Initial 401 + one retry; exactly one refresh exchange.
    assert_eq!(control.professors_calls, 2);
    assert_eq!(control.login_calls, 1);
}

#[tokio::test]
async fn test_fresh_credential_recovers_when_stored_one_is_stale() {
    let backend = spawn_backend().await;
    let dir = tempfile::tempdir().unwrap();
    let stale = mint_id_token("student@ucdavis.edu", 3600);
    let fresh = mint_id_token("student@ucdavis.edu", 7200);
    backend.accept_token(&fresh);

    let (client, source, path) = client_with_seeded_token(&backend, &dir, &stale);
    source.script(ScriptedPrompt::Credential(fresh.clone()));

    let professors = client.api.professors().await.unwrap();
    assert_eq!(professors.len(), 2);

    {
        let control = backend.lock();
        // Stale exchange failed, fresh exchange succeeded.
        assert_eq!(control.login_calls, 2);
    }

    // The fresh credential replaced the stale one on disk.
    let record: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(record["id_token"], serde_json::json!(fresh));
}

#[tokio::test]
async fn test_exhausted_recovery_clears_credentials_and_reports_destination() {
    let backend = spawn_backend().await;
    let dir = tempfile::tempdir().unwrap();
    let stale = mint_id_token("student@ucdavis.edu", 3600);
    // Nothing is exchangeable and the provider has nothing to offer.
    let (client, source, path) = client_with_seeded_token(&backend, &dir, &stale);
    source.script(ScriptedPrompt::Unavailable);

    // Degraded sign-in first, so the exhausted recovery has a session
    // state to tear down.
    client.session.handle_credential(&stale).await;
    assert!(client.session.is_signed_in());

    let err = client.api.professors().await.unwrap_err();
    match err {
        Error::SignInRequired { return_to } => assert_eq!(return_to, "/api/professors"),
        other => panic!("expected SignInRequired, got {other:?}"),
    }

    assert!(!path.exists(), "credential file should be cleared");
    assert!(!client.session.is_signed_in(), "session must drop to signed-out");

    let control = backend.lock();
    // Only the initial request hit the endpoint: the failed refresh and
    // the failed prompt never earn a retry. One exchange during intake,
    // one during recovery.
    assert_eq!(control.professors_calls, 1);
    assert_eq!(control.login_calls, 2);
}

#[tokio::test]
async fn test_persistent_401_is_bounded_not_a_loop() {
    let backend = spawn_backend().await;
    let dir = tempfile::tempdir().unwrap();
    let token = mint_id_token("student@ucdavis.edu", 3600);
    let fresh = mint_id_token("student@ucdavis.edu", 7200);
    backend.accept_token(&token);
    backend.accept_token(&fresh);
    // Exchanges succeed, but the endpoint keeps answering 401.
    backend.lock().force_unauthorized = true;

    let (client, source, _path) = client_with_seeded_token(&backend, &dir, &token);
    source.script(ScriptedPrompt::Credential(fresh));

    let err = client.api.professors().await.unwrap_err();
    assert!(err.is_sign_in_required());

    let control = backend.lock();
    // Initial attempt plus exactly one retry per recovery stage.
    assert_eq!(control.professors_calls, 3);
    assert_eq!(control.login_calls, 2);
}

#[tokio::test]
async fn test_hung_prompt_is_bounded_by_the_timeout() {
    let backend = spawn_backend().await;
    let dir = tempfile::tempdir().unwrap();
    let stale = mint_id_token("student@ucdavis.edu", 3600);
    let (client, source, _path) = client_with_seeded_token(&backend, &dir, &stale);
    source.script(ScriptedPrompt::Hang);

    let started = std::time::Instant::now();
    let err = client.api.professors().await.unwrap_err();
    assert!(err.is_sign_in_required());
    // Configured prompt timeout is 1s; leave generous slack.
    assert!(started.elapsed() < std::time::Duration::from_secs(5));
}

#[tokio::test]
async fn test_non_401_failures_pass_through_untouched() {
    let backend = spawn_backend().await;
    let dir = tempfile::tempdir().unwrap();
    let token = mint_id_token("student@ucdavis.edu", 3600);
    backend.allow_bearer(&token);
    let (client, _source, _path) = client_with_seeded_token(&backend, &dir, &token);

    let err = client.api.professor(999).await.unwrap_err();
    match err {
        Error::Api { status, message } => {
            assert_eq!(status, 404);
            assert!(message.contains("not found"));
        }
        other => panic!("expected Api error, got {other:?}"),
    }

    // No recovery was attempted for a non-auth failure.
    assert_eq!(backend.lock().login_calls, 0);
}

#[tokio::test]
async fn test_doubled_leading_slashes_are_normalized() {
    let backend = spawn_backend().await;
    let source = MockCredentialSource::new();
    let client = build(
        &common::test_config(&backend, None),
        Arc::new(source),
    )
    .unwrap();

    let departments: Vec<String> = client
        .api
        .gateway()
        .get_json("//api/departments")
        .await
        .unwrap();
    assert_eq!(departments, vec!["Computer Science", "Statistics"]);
}
