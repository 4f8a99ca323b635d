//! Typed endpoint surface: request/response shapes for every backend
//! route the client consumes.

mod common;

use std::sync::Arc;

use lablink_api::{build, types::*, LabLinkClient};
use lablink_auth::MockCredentialSource;

use common::{mint_id_token, seed_credential_file, spawn_backend, TestBackend};

/// Client already signed in via a directly accepted bearer token.
fn signed_in_client(backend: &TestBackend, dir: &tempfile::TempDir) -> LabLinkClient {
    let token = mint_id_token("student@ucdavis.edu", 3600);
    backend.allow_bearer(&token);
    let path = dir.path().join("credentials.json");
    seed_credential_file(&path, &token);
    build(
        &common::test_config(backend, Some(path)),
        Arc::new(MockCredentialSource::new()),
    )
    .unwrap()
}

#[tokio::test]
async fn test_health_probe() {
    let backend = spawn_backend().await;
    let dir = tempfile::tempdir().unwrap();
    let client = signed_in_client(&backend, &dir);
    assert!(client.api.health().await.unwrap());
}

#[tokio::test]
async fn test_departments_need_no_auth() {
    let backend = spawn_backend().await;
    let client = build(
        &common::test_config(&backend, None),
        Arc::new(MockCredentialSource::new()),
    )
    .unwrap();

    let departments = client.api.departments().await.unwrap();
    assert_eq!(departments, vec!["Computer Science", "Statistics"]);
}

#[tokio::test]
async fn test_professor_listing_and_detail() {
    let backend = spawn_backend().await;
    let dir = tempfile::tempdir().unwrap();
    let client = signed_in_client(&backend, &dir);

    let professors = client.api.professors().await.unwrap();
    assert_eq!(professors.len(), 2);
    assert_eq!(professors[0].skills, vec!["python", "ml"]);

    let professor = client.api.professor(1).await.unwrap();
    assert_eq!(professor.name, "Professor 1");
    assert_eq!(professor.department.as_deref(), Some("Computer Science"));
}

#[tokio::test]
async fn test_match_unwraps_envelope_and_passes_department() {
    let backend = spawn_backend().await;
    let dir = tempfile::tempdir().unwrap();
    let client = signed_in_client(&backend, &dir);

    let profile = StudentProfile {
        interests: "computer vision".to_string(),
        skills: Some("python".to_string()),
        ..Default::default()
    };
    let matches = client
        .api
        .match_professors(&profile, Some("Computer Science"))
        .await
        .unwrap();

    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].score_percent, 82.0);
    assert_eq!(matches[0].professor.id, 1);
    assert_eq!(
        matches[0].why.interests_hits,
        vec!["computer vision".to_string()]
    );
    assert_eq!(
        backend.lock().last_match_department.as_deref(),
        Some("Computer Science")
    );
}

#[tokio::test]
async fn test_match_without_department_sends_no_query() {
    let backend = spawn_backend().await;
    let dir = tempfile::tempdir().unwrap();
    let client = signed_in_client(&backend, &dir);

    let profile = StudentProfile {
        interests: "robotics".to_string(),
        ..Default::default()
    };
    client.api.match_professors(&profile, None).await.unwrap();
    assert_eq!(backend.lock().last_match_department, None);
}

#[tokio::test]
async fn test_email_generate_and_send() {
    let backend = spawn_backend().await;
    let dir = tempfile::tempdir().unwrap();
    let client = signed_in_client(&backend, &dir);

    let draft = client
        .api
        .generate_email(&EmailRequest {
            student_name: "Test Student".to_string(),
            student_skills: Some("python".to_string()),
            availability: None,
            professor_name: "Professor 1".to_string(),
            professor_email: Some("prof1@ucdavis.edu".to_string()),
            paper_title: None,
            topic: Some("computer vision".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(draft.subject, "Interest in your research, Professor 1");
    assert!(!draft.body.is_empty());

    let send = SendEmailRequest::new(
        "prof1@ucdavis.edu".to_string(),
        draft.subject,
        draft.body,
    )
    .with_attachment("cv.pdf".to_string(), "JVBERi0=".to_string());
    client.api.send_email(&send).await.unwrap();
}
