use std::time::Duration;

use docfinder_core::{ActionKind, IngestFolderReport, PendingAction, RemoteFolder, SearchQuery};
use docfinder_engine::{FailureKind, ServiceClient, ServiceSettings};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> ServiceClient {
    ServiceClient::new(ServiceSettings {
        base_url: server.uri(),
        ..ServiceSettings::default()
    })
    .expect("client")
}

#[tokio::test]
async fn inventory_maps_file_records_to_names() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/folders/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "totalFolders": 1,
            "totalFiles": 2,
            "folders": [{
                "name": "docs",
                "path": "/home/me/docs",
                "fileCount": 2,
                "files": [
                    {"file_name": "a.pdf", "file_path": "/home/me/docs/a.pdf"},
                    {"file_name": "b.md", "file_path": "/home/me/docs/b.md"}
                ]
            }]
        })))
        .mount(&server)
        .await;

    let folders = client_for(&server).list_folders().await.expect("inventory");
    assert_eq!(
        folders,
        vec![RemoteFolder {
            path: "/home/me/docs".to_string(),
            name: "docs".to_string(),
            files: vec!["a.pdf".to_string(), "b.md".to_string()],
        }]
    );
}

#[tokio::test]
async fn ingest_sends_batch_and_reads_report() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/dir/"))
        .and(body_json(json!({"folderPath": ["/a", "/b"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "folderPaths": ["/a", "/b"],
            "results": [{
                "folderPath": "/a",
                "status": "completed",
                "processedCount": 2,
                "totalAttempted": 3,
                "failedFiles": ["/a/bad.pdf"]
            }],
            "totalFolders": 2
        })))
        .expect(1)
        .mount(&server)
        .await;

    let report = client_for(&server)
        .ingest(&["/a".to_string(), "/b".to_string()])
        .await
        .expect("ingest");
    assert_eq!(report.completed, vec!["/a".to_string(), "/b".to_string()]);
    assert_eq!(
        report.folders,
        vec![IngestFolderReport {
            path: "/a".to_string(),
            status: "completed".to_string(),
            processed_count: 2,
            total_attempted: 3,
            failed_files: vec!["/a/bad.pdf".to_string()],
        }]
    );
    assert_eq!(report.failed_file_count(), 1);
}

#[tokio::test]
async fn delete_sends_path_in_body() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/folder/"))
        .and(body_json(json!({"folderPath": "/docs"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "folderPath": "/docs",
            "deletedCount": 7
        })))
        .mount(&server)
        .await;

    let deleted = client_for(&server)
        .delete_folder("/docs")
        .await
        .expect("delete");
    assert_eq!(deleted, 7);
}

#[tokio::test]
async fn query_encodes_limit_and_exclusions() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/query"))
        .and(query_param("query_text", "tax forms"))
        .and(query_param("match_count", "5"))
        .and(query_param("archived_folders", "[\"/old\"]"))
        .and(query_param("folders", "[\"/docs\"]"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "query": "tax forms",
            "results": [{
                "file_name": "w2.pdf",
                "file_path": "/docs/w2.pdf",
                "similarity": 0.87,
                "last_modified_at": "2024-03-01T10:00:00Z"
            }],
            "confirm_required": false
        })))
        .mount(&server)
        .await;

    let results = client_for(&server)
        .query(&SearchQuery {
            text: "tax forms".to_string(),
            match_count: 5,
            folders: vec!["/docs".to_string()],
            archived_folders: vec!["/old".to_string()],
        })
        .await
        .expect("query");
    assert_eq!(results.results.len(), 1);
    assert_eq!(results.results[0].file_name, "w2.pdf");
    assert_eq!(
        results.results[0].last_modified_at.as_deref(),
        Some("2024-03-01T10:00:00Z")
    );
    assert!(results.confirmable().is_empty());
}

#[tokio::test]
async fn query_omits_empty_folder_lists() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/query"))
        .and(query_param_is_missing("archived_folders"))
        .and(query_param_is_missing("folders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .expect(1)
        .mount(&server)
        .await;

    let results = client_for(&server)
        .query(&SearchQuery {
            text: "anything".to_string(),
            match_count: 10,
            folders: Vec::new(),
            archived_folders: Vec::new(),
        })
        .await
        .expect("query");
    assert!(results.results.is_empty());
}

#[tokio::test]
async fn execute_forwards_descriptor_verbatim() {
    let descriptor = json!({
        "action": "tag_files",
        "tag": "urgent",
        "files": ["/docs/a.pdf"],
        "extra": {"nested": [1, 2, 3]}
    });
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/actions/execute"))
        .and(body_json(descriptor.clone()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "message": "Tagged 1 file",
            "color": 6,
            "taggedCount": 1
        })))
        .mount(&server)
        .await;

    let pending = PendingAction::from_json(descriptor);
    assert_eq!(pending.declared_kind(), Some(ActionKind::TagFiles.key()));
    let outcome = client_for(&server)
        .execute_action(&pending)
        .await
        .expect("execute");
    assert_eq!(outcome.status, "success");
    assert_eq!(outcome.message.as_deref(), Some("Tagged 1 file"));
    assert_eq!(outcome.color, Some(6));
    assert_eq!(outcome.tagged_count, Some(1));
}

#[tokio::test]
async fn non_success_status_carries_code_and_detail() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/folder/"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"detail": "folder not indexed"})),
        )
        .mount(&server)
        .await;

    let err = client_for(&server)
        .delete_folder("/missing")
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(404));
    assert_eq!(err.to_string(), "HTTP 404: folder not indexed");
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/folders/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("not json", "application/json"))
        .mount(&server)
        .await;

    let err = client_for(&server).list_folders().await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Decode);
}

#[tokio::test]
async fn slow_backend_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/folders/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_json(json!({"folders": []})),
        )
        .mount(&server)
        .await;

    let client = ServiceClient::new(ServiceSettings {
        base_url: server.uri(),
        request_timeout: Duration::from_millis(50),
        ..ServiceSettings::default()
    })
    .expect("client");
    let err = client.list_folders().await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
}

#[test]
fn invalid_base_url_is_rejected() {
    let err = ServiceClient::new(ServiceSettings {
        base_url: "not a url".to_string(),
        ..ServiceSettings::default()
    })
    .unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidUrl);
}

#[test]
fn base_url_with_prefix_keeps_it() {
    let client = ServiceClient::new(ServiceSettings {
        base_url: "http://localhost:7777/api".to_string(),
        ..ServiceSettings::default()
    })
    .expect("client");
    assert_eq!(client.base_url().as_str(), "http://localhost:7777/api/");
}
