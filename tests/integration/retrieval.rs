//! Retrieval service degradation and wire format.

use super::test_utils::{workspace_with_notes, FakeModel, CAMPAIGN_PLAN};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use taleweaver::run::{run_story, GenerateRequest};
use taleweaver::sources::RetrievalClient;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Serve one HTTP request with `body` as JSON and record the request text.
async fn serve_once(body: &'static str) -> (String, Arc<Mutex<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen = Arc::new(Mutex::new(String::new()));
    let recorded = seen.clone();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf).to_string();
            if let Some(header_end) = text.find("\r\n\r\n") {
                let length = text[..header_end]
                    .lines()
                    .find_map(|l| {
                        let lower = l.to_ascii_lowercase();
                        lower
                            .strip_prefix("content-length:")
                            .map(|v| v.trim().parse::<usize>().unwrap_or(0))
                    })
                    .unwrap_or(0);
                if buf.len() >= header_end + 4 + length {
                    break;
                }
            }
        }
        *recorded.lock() = String::from_utf8_lossy(&buf).to_string();

        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
    });

    (format!("http://{}", addr), seen)
}

/// Accept connections and never answer them.
async fn serve_silence() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_retrieval_timeout_does_not_fail_the_run() {
    let base_url = serve_silence().await;
    let (workspace, mut config) = workspace_with_notes("A dragon cult rises.");
    config.retrieval.enabled = true;
    config.retrieval.base_url = base_url;
    config.retrieval.timeout_secs = 1;
    let model = FakeModel::new(CAMPAIGN_PLAN).into_shared();

    let request = GenerateRequest {
        notes: PathBuf::from("dictation-1.txt"),
        ..GenerateRequest::default()
    };
    let started = std::time::Instant::now();
    let report = run_story(&config, model.clone(), workspace.path(), &request)
        .await
        .unwrap();

    assert!(started.elapsed() >= Duration::from_secs(1));
    assert!(report.output_path.exists());
    assert!(model
        .calls()
        .iter()
        .all(|c| !c.system_prompt.contains("RAG Context")));
}

#[tokio::test]
async fn test_silent_service_times_out_to_none() {
    let base_url = serve_silence().await;
    let client = RetrievalClient::new(&base_url, 5, Duration::from_millis(300));
    assert!(client.retrieve("anything").await.is_none());
}

#[tokio::test]
async fn test_unreachable_retrieval_service_does_not_fail_the_run() {
    let (workspace, mut config) = workspace_with_notes("A dragon cult rises.");
    config.retrieval.enabled = true;
    config.retrieval.base_url = "http://127.0.0.1:9".to_string();
    config.retrieval.timeout_secs = 1;
    let model = FakeModel::new(CAMPAIGN_PLAN).into_shared();

    let request = GenerateRequest {
        notes: PathBuf::from("dictation-1.txt"),
        ..GenerateRequest::default()
    };
    let report = run_story(&config, model.clone(), workspace.path(), &request)
        .await
        .unwrap();

    assert!(report.output_path.exists());
    assert!(model
        .calls()
        .iter()
        .all(|c| !c.system_prompt.contains("RAG Context")));
}

#[tokio::test]
async fn test_retrieved_snippets_reach_section_writers() {
    let (base_url, seen) = serve_once(
        r#"{"contexts": [{"title": "Cult of the Dragon", "content": "They venerate dracoliches.", "source": "lore.md"}]}"#,
    )
    .await;
    let (workspace, mut config) = workspace_with_notes("A dragon cult rises.");
    config.retrieval.enabled = true;
    config.retrieval.base_url = base_url;
    config.retrieval.top_k = 3;
    let model = FakeModel::new(CAMPAIGN_PLAN).into_shared();

    let request = GenerateRequest {
        notes: PathBuf::from("dictation-1.txt"),
        ..GenerateRequest::default()
    };
    run_story(&config, model.clone(), workspace.path(), &request)
        .await
        .unwrap();

    let request_text = seen.lock().clone();
    assert!(request_text.starts_with("POST /retrieve"));
    assert!(request_text.contains("\"topK\":3"));
    assert!(request_text.contains("A dragon cult rises."));

    let chapter = model.prompt_for("Chapter 1: The Heroes").unwrap();
    assert!(chapter.contains("RAG Context:\n---\nSnippet 1 (Cult of the Dragon)\nSource: lore.md"));
    let prologue = model.prompt_for("Prologue: The Gathering").unwrap();
    assert!(prologue.contains("They venerate dracoliches."));
}

#[tokio::test]
async fn test_empty_contexts_yield_no_block() {
    let (base_url, _) = serve_once(r#"{"contexts": []}"#).await;
    let client = RetrievalClient::new(&base_url, 5, Duration::from_secs(5));
    assert!(client.retrieve("anything").await.is_none());
}

#[tokio::test]
async fn test_malformed_response_yields_none() {
    let (base_url, _) = serve_once("not json").await;
    let client = RetrievalClient::new(&base_url, 5, Duration::from_secs(5));
    assert!(client.retrieve("anything").await.is_none());
}
