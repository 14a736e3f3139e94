use agentstream_core::CredentialProvider;
use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use std::sync::{Arc, Mutex};

/// A request the stub server received.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub uri: String,
    pub body: serde_json::Value,
}

/// A local stand-in for the Gemini endpoint that answers every request with
/// the same canned response.
pub struct StubServer {
    pub base_url: String,
    pub requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

struct Reply {
    status: StatusCode,
    content_type: &'static str,
    body: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

async fn answer(State(reply): State<Arc<Reply>>, uri: Uri, body: String) -> Response {
    reply.requests.lock().unwrap().push(RecordedRequest {
        uri: uri.to_string(),
        body: serde_json::from_str(&body).unwrap_or(serde_json::Value::Null),
    });

    (
        reply.status,
        [(header::CONTENT_TYPE, reply.content_type)],
        Body::from(reply.body.clone()),
    )
        .into_response()
}

impl StubServer {
    pub async fn start(
        status: StatusCode,
        content_type: &'static str,
        body: impl Into<String>,
    ) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let reply = Arc::new(Reply {
            status,
            content_type,
            body: body.into(),
            requests: requests.clone(),
        });
        let app = Router::new().fallback(answer).with_state(reply);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}/v1beta"),
            requests,
        }
    }

    #[allow(dead_code)]
    pub async fn json(status: StatusCode, body: serde_json::Value) -> Self {
        Self::start(status, "application/json", body.to_string()).await
    }

    #[allow(dead_code)]
    pub async fn sse(events: &[String]) -> Self {
        let body: String = events.iter().map(|e| format!("data: {e}\r\n\r\n")).collect();
        Self::start(StatusCode::OK, "text/event-stream", body).await
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

/// A fixed credential for the client under test.
pub struct StaticKey(pub Option<&'static str>);

impl CredentialProvider for StaticKey {
    fn api_key(&self) -> Option<String> {
        self.0.map(str::to_string)
    }
}

/// A `generateContent` response body carrying `text`.
pub fn text_response(text: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{"content": {"parts": [{"text": text}], "role": "model"}}]
    })
}
