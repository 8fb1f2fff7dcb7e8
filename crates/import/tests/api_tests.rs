//! HTTP-level tests for [`RenkuApi`] against a mock server.

use assert_matches::assert_matches;
use mockito::Matcher;

use renku_core::import::JobState;
use renku_import::{ImportApiError, ImportRequest, RenkuApi};

#[tokio::test]
async fn project_compatibility_parses_the_payload() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/projects/42/migration-status")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "metadataVersion": "9",
                "gitUrl": "https://gitlab.example.org/alice/flights.git",
                "defaultBranch": "main"
            }"#,
        )
        .create_async()
        .await;

    let api = RenkuApi::new(server.url());
    let compatibility = api.project_compatibility("42").await.unwrap();

    assert_eq!(compatibility.metadata_version, 9);
    assert_eq!(
        compatibility.git_url,
        "https://gitlab.example.org/alice/flights.git"
    );
    assert_eq!(compatibility.default_branch, "main");
    mock.assert_async().await;
}

#[tokio::test]
async fn error_envelope_is_surfaced_even_with_a_2xx_status() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/projects/42/migration-status")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"error": {"reason": "no_renku_project",
                         "userMessage": "This repository is not a Renku project"}}"#,
        )
        .create_async()
        .await;

    let api = RenkuApi::new(server.url());
    let err = api.project_compatibility("42").await.unwrap_err();

    assert_matches!(err, ImportApiError::Backend(_));
    assert_eq!(err.to_string(), "This repository is not a Renku project");
}

#[tokio::test]
async fn submit_import_posts_the_request_body_and_returns_the_job_id() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/datasets/import")
        .match_body(Matcher::Json(serde_json::json!({
            "sourceDatasetUrl": "https://gitlab.example.org/alice/flights/datasets/2020",
            "destinationGitUrl": "https://gitlab.example.org/bob/weather.git",
            "branch": "master",
            "metadataVersion": 9,
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"jobId": "job-42"}"#)
        .create_async()
        .await;

    let api = RenkuApi::new(server.url());
    let job_id = api
        .submit_import(&ImportRequest {
            source_dataset_url: "https://gitlab.example.org/alice/flights/datasets/2020".into(),
            destination_git_url: "https://gitlab.example.org/bob/weather.git".into(),
            branch: "master".into(),
            metadata_version: 9,
        })
        .await
        .unwrap();

    assert_eq!(job_id, "job-42");
    mock.assert_async().await;
}

#[tokio::test]
async fn job_status_maps_the_wire_state() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/jobs/job-42")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"state": "IN_PROGRESS"}"#)
        .create_async()
        .await;

    let api = RenkuApi::new(server.url());
    let status = api.job_status("job-42").await.unwrap();

    assert_eq!(status.state, JobState::InProgress);
    assert_eq!(status.error(), None);
}

#[tokio::test]
async fn non_2xx_responses_carry_status_and_body() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/jobs/job-42")
        .with_status(502)
        .with_body("bad gateway")
        .create_async()
        .await;

    let api = RenkuApi::new(server.url());
    let err = api.job_status("job-42").await.unwrap_err();

    assert_matches!(err, ImportApiError::Http { status: 502, ref body } if body.contains("bad gateway"));
}
