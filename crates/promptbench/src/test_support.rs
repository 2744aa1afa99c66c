//! Shared fixtures for unit tests

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::domain::errors::DomainError;
use crate::domain::value_objects::Provider;
use crate::ports::{CompletionProvider, CompletionRequest};

const COMPLETIONS_PATH: &str = "/v1/chat/completions";

/// Serve `router` on an ephemeral local port and return the completions URL
pub(crate) async fn spawn_stub(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}{}", addr, COMPLETIONS_PATH)
}

/// Answers with `auth|model|role:content|...|temperature|max_tokens`
pub(crate) fn echo_router() -> Router {
    Router::new().route(COMPLETIONS_PATH, post(echo))
}

async fn echo(headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
    let auth = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let messages = body["messages"]
        .as_array()
        .map(|messages| {
            messages
                .iter()
                .map(|m| {
                    format!(
                        "{}:{}",
                        m["role"].as_str().unwrap_or_default(),
                        m["content"].as_str().unwrap_or_default()
                    )
                })
                .collect::<Vec<_>>()
                .join("|")
        })
        .unwrap_or_default();
    let content = format!(
        "{}|{}|{}|{}|{}",
        auth,
        body["model"].as_str().unwrap_or_default(),
        messages,
        body["temperature"],
        body["max_tokens"]
    );
    Json(json!({ "choices": [{ "message": { "role": "assistant", "content": content } }] }))
}

/// Always answers with the given status and body
pub(crate) fn fixed_response_router(status: StatusCode, body: &'static str) -> Router {
    Router::new().route(COMPLETIONS_PATH, post(move || async move { (status, body) }))
}

/// In-process provider that records call order
#[derive(Clone, Default)]
pub(crate) struct RecordingProvider {
    pub events: Arc<Mutex<Vec<String>>>,
    pub fail_with: Option<String>,
}

impl RecordingProvider {
    pub fn failing(message: &str) -> Self {
        Self {
            events: Arc::default(),
            fail_with: Some(message.to_string()),
        }
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionProvider for RecordingProvider {
    fn provider(&self) -> Provider {
        Provider::OpenAI
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, DomainError> {
        let user = request.messages[1].content.clone();
        self.events.lock().unwrap().push(format!("start:{}", user));
        tokio::task::yield_now().await;
        self.events.lock().unwrap().push(format!("end:{}", user));
        match &self.fail_with {
            Some(message) => Err(DomainError::ExternalService(message.clone())),
            None => Ok(format!("{}|{}", request.model, user)),
        }
    }
}
