//! Integration tests for the HTTP side endpoints.
//!
//! Exercises the multipart upload intake, static retrieval of stored
//! attachments, and the reset endpoint's store-clear-plus-resync behavior.
//!
//! Verification command: `cargo test --test http_api`

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite;

use taskboard_proto::codec;
use taskboard_proto::protocol::{ClientIntent, ServerFact};
use taskboard_proto::task::{Attachment, TaskDraft, TaskId};
use taskboard_server::board::{BoardState, start_server_with_state};
use taskboard_server::uploads::AttachmentStore;

// =============================================================================
// Helpers
// =============================================================================

/// Starts a board server with a throwaway uploads directory.
async fn start_board() -> (std::net::SocketAddr, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let state = Arc::new(BoardState::with_uploads(AttachmentStore::new(dir.path())));
    let (addr, _handle) = start_server_with_state("127.0.0.1:0", state)
        .await
        .expect("failed to start test board");
    (addr, dir)
}

/// Posts a multipart upload with the given file metadata and body.
async fn upload(
    addr: std::net::SocketAddr,
    filename: &str,
    content_type: &str,
    data: Vec<u8>,
) -> reqwest::Response {
    let part = reqwest::multipart::Part::bytes(data)
        .file_name(filename.to_string())
        .mime_str(content_type)
        .unwrap();
    let form = reqwest::multipart::Form::new().part("file", part);

    reqwest::Client::new()
        .post(format!("http://{addr}/api/upload"))
        .multipart(form)
        .send()
        .await
        .unwrap()
}

/// Receives and decodes the next fact from a WebSocket.
async fn recv_fact(
    ws: &mut tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >,
) -> ServerFact {
    let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
        .await
        .expect("recv timed out")
        .unwrap()
        .unwrap();
    codec::decode_fact(msg.to_text().unwrap()).unwrap()
}

// =============================================================================
// Upload intake
// =============================================================================

#[tokio::test]
async fn valid_pdf_upload_returns_descriptor() {
    let (addr, _dir) = start_board().await;

    let response = upload(addr, "report.pdf", "application/pdf", vec![0u8; 1024]).await;
    assert_eq!(response.status(), 200);

    let att: Attachment = response.json().await.unwrap();
    assert!(att.filename.ends_with("-report.pdf"));
    assert_eq!(att.path, format!("/uploads/{}", att.filename));
    assert_eq!(att.size, 1024);
}

#[tokio::test]
async fn oversized_upload_rejected_with_size_error() {
    let (addr, _dir) = start_board().await;

    let response = upload(addr, "big.pdf", "application/pdf", vec![0u8; 6 * 1024 * 1024]).await;
    assert_eq!(response.status(), 400);

    let body: serde_json::Value = response.json().await.unwrap();
    let error = body["error"].as_str().unwrap();
    assert!(error.contains("File too large"), "got: {error}");
}

#[tokio::test]
async fn disallowed_type_rejected() {
    let (addr, _dir) = start_board().await;

    let response = upload(addr, "payload.exe", "application/x-msdownload", vec![0u8; 64]).await;
    assert_eq!(response.status(), 400);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Invalid file type");
}

#[tokio::test]
async fn missing_file_field_rejected() {
    let (addr, _dir) = start_board().await;

    let form = reqwest::multipart::Form::new().text("note", "no file here");
    let response = reqwest::Client::new()
        .post(format!("http://{addr}/api/upload"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "No file uploaded");
}

#[tokio::test]
async fn stored_attachment_is_served_back() {
    let (addr, _dir) = start_board().await;
    let data = b"%PDF-1.4 fake but faithful".to_vec();

    let response = upload(addr, "manual.pdf", "application/pdf", data.clone()).await;
    let att: Attachment = response.json().await.unwrap();

    let served = reqwest::get(format!("http://{addr}{}", att.path))
        .await
        .unwrap();
    assert_eq!(served.status(), 200);
    assert_eq!(served.bytes().await.unwrap().to_vec(), data);
}

#[tokio::test]
async fn uploaded_descriptor_attaches_to_a_task() {
    let (addr, _dir) = start_board().await;

    let response = upload(addr, "shot.png", "image/png", vec![1, 2, 3]).await;
    let att: Attachment = response.json().await.unwrap();

    // Attach via a create intent and check the broadcast task carries it.
    let url = format!("ws://{addr}/ws");
    let (mut ws, _) = tokio_tungstenite::connect_async(&url).await.unwrap();
    let _sync = recv_fact(&mut ws).await;

    let intent = ClientIntent::Create(TaskDraft {
        title: "with screenshot".to_string(),
        attachments: vec![att.clone()],
        ..TaskDraft::default()
    });
    ws.send(tungstenite::Message::Text(
        codec::encode_intent(&intent).unwrap().into(),
    ))
    .await
    .unwrap();

    match recv_fact(&mut ws).await {
        ServerFact::Created(task) => assert_eq!(task.attachments, vec![att]),
        other => panic!("expected task:created, got {other:?}"),
    }
}

// =============================================================================
// Reset endpoint
// =============================================================================

#[tokio::test]
async fn reset_clears_store_and_resyncs_observers() {
    let (addr, _dir) = start_board().await;

    let url = format!("ws://{addr}/ws");
    let (mut ws, _) = tokio_tungstenite::connect_async(&url).await.unwrap();
    let _sync = recv_fact(&mut ws).await;

    let intent = ClientIntent::Create(TaskDraft {
        title: "doomed".to_string(),
        ..TaskDraft::default()
    });
    ws.send(tungstenite::Message::Text(
        codec::encode_intent(&intent).unwrap().into(),
    ))
    .await
    .unwrap();
    let _created = recv_fact(&mut ws).await;

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/api/reset"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Tasks reset");

    // Connected observers converge on the empty collection.
    assert_eq!(recv_fact(&mut ws).await, ServerFact::Sync(vec![]));

    // The id counter rewound: the next create starts over at 1.
    let intent = ClientIntent::Create(TaskDraft {
        title: "fresh".to_string(),
        ..TaskDraft::default()
    });
    ws.send(tungstenite::Message::Text(
        codec::encode_intent(&intent).unwrap().into(),
    ))
    .await
    .unwrap();
    match recv_fact(&mut ws).await {
        ServerFact::Created(task) => assert_eq!(task.id, TaskId::new(1)),
        other => panic!("expected task:created, got {other:?}"),
    }
}
