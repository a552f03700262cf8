//! Stub servers and fixtures shared by the unit tests.

use crate::auth::SessionStore;
use crate::config::{Config, Secrets};
use crate::db::Database;
use crate::github::GitHubClient;
use crate::llm::ChatClient;
use crate::AppState;
use axum::{routing::post, Json, Router};
use serde_json::{json, Value};
use std::io::{Cursor, Write};
use std::sync::{Arc, Mutex};
use zip::write::SimpleFileOptions;

/// Serve a router on an ephemeral local port and return its base URL
pub async fn spawn_stub(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Build an in-memory zip. Names ending in `/` become directory entries.
pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();

    for (name, content) in entries {
        if name.ends_with('/') {
            writer.add_directory(*name, options).unwrap();
        } else {
            writer.start_file(*name, options).unwrap();
            writer.write_all(content).unwrap();
        }
    }

    writer.finish().unwrap().into_inner()
}

/// Requests received by an LLM stub
pub type RecordedRequests = Arc<Mutex<Vec<Value>>>;

/// An OpenAI-compatible stub that answers every completion with `reply`
pub async fn spawn_llm_stub(reply: &str) -> (String, RecordedRequests) {
    let reply = reply.to_string();
    let recorded: RecordedRequests = Arc::default();
    let sink = recorded.clone();

    let router = Router::new().route(
        "/chat/completions",
        post(move |Json(body): Json<Value>| {
            let reply = reply.clone();
            let sink = sink.clone();
            async move {
                sink.lock().unwrap().push(body);
                Json(json!({
                    "id": "stub",
                    "choices": [
                        {"index": 0, "message": {"role": "assistant", "content": reply}}
                    ]
                }))
            }
        }),
    );

    (spawn_stub(router).await, recorded)
}

/// Application state backed by a temporary database and the given stubs
pub async fn test_state(
    github_url: &str,
    llm_url: &str,
) -> (Arc<AppState>, tempfile::TempDir) {
    let temp_dir = tempfile::TempDir::new().unwrap();

    let mut config = Config {
        data_dir: Some(temp_dir.path().join("data")),
        ..Default::default()
    };
    config.web.static_dir = temp_dir.path().join("static");
    config.github.api_url = github_url.to_string();
    config.github.archive_url = github_url.to_string();
    config.llm.base_url = llm_url.to_string();

    let secrets = Secrets {
        llm_api_key: "sk-test".to_string(),
        session_secret: "test-secret".to_string(),
    };

    let db = Database::new(&config.database_path()).await.unwrap();
    db.run_migrations().await.unwrap();

    let state = AppState {
        db,
        github: GitHubClient::new(&config.github).unwrap(),
        llm: ChatClient::new(&config.llm, &secrets.llm_api_key).unwrap(),
        sessions: SessionStore::new(
            &secrets.session_secret,
            config.web.session_ttl(),
        ),
        last_sync: tokio::sync::RwLock::new(None),
        config,
    };

    (Arc::new(state), temp_dir)
}
