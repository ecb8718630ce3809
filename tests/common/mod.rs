#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use conversary::api::{ApiError, ConversationApi, ConversationTurn, Reply};
use conversary::tui::AppEvent;
use reqwest::StatusCode;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc::UnboundedReceiver, Notify};

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("request body is JSON")
    }
}

#[derive(Clone)]
struct Route {
    method: &'static str,
    path: &'static str,
    status: u16,
    body: String,
}

/// Minimal HTTP/1.1 server answering canned responses, one request per connection.
pub struct StubServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

pub struct StubBuilder {
    routes: Vec<Route>,
}

impl StubServer {
    pub fn builder() -> StubBuilder {
        StubBuilder { routes: Vec::new() }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl StubBuilder {
    pub fn route(mut self, method: &'static str, path: &'static str, status: u16, body: impl Into<String>) -> Self {
        self.routes.push(Route {
            method,
            path,
            status,
            body: body.into(),
        });
        self
    }

    pub async fn start(self) -> StubServer {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let routes = Arc::new(self.routes);

        let recorded = Arc::clone(&requests);
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let routes = Arc::clone(&routes);
                let recorded = Arc::clone(&recorded);
                tokio::spawn(async move {
                    let _ = serve(stream, &routes, &recorded).await;
                });
            }
        });

        StubServer {
            base_url: format!("http://{addr}/api"),
            requests,
        }
    }
}

async fn serve(
    mut stream: TcpStream,
    routes: &[Route],
    recorded: &Mutex<Vec<RecordedRequest>>,
) -> std::io::Result<()> {
    let Some(request) = read_request(&mut stream).await? else {
        return Ok(());
    };

    let (status, body) = routes
        .iter()
        .find(|route| route.method == request.method && route.path == request.path)
        .map(|route| (route.status, route.body.clone()))
        .unwrap_or((404, r#"{"detail":"Not Found"}"#.to_string()));
    recorded.lock().unwrap().push(request);

    let response = format!(
        "HTTP/1.1 {status} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|window| window == b"\r\n\r\n").map(|pos| pos + 4)
}

async fn read_request(stream: &mut TcpStream) -> std::io::Result<Option<RecordedRequest>> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        if let Some(end) = find_header_end(&buf) {
            break end;
        }
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(None);
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.lines();
    let mut request_line = lines.next().unwrap_or_default().split_whitespace();
    let method = request_line.next().unwrap_or_default().to_string();
    let path = request_line.next().unwrap_or_default().to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim().to_ascii_lowercase(), value.trim().to_string()))
        .collect();

    let content_length = headers
        .iter()
        .find(|(key, _)| key == "content-length")
        .and_then(|(_, value)| value.parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let body_end = buf.len().min(header_end + content_length);
    let body = String::from_utf8_lossy(&buf[header_end..body_end]).to_string();

    Ok(Some(RecordedRequest {
        method,
        path,
        headers,
        body,
    }))
}

/// A base URL nothing is listening on.
pub async fn dead_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/api")
}

/// How the scripted backend answers `submit_message`
pub enum SubmitScript {
    Echo(&'static str),
    Fail(StatusCode),
    Panic,
    /// Replies only after the gate is notified
    Gated(Arc<Notify>),
}

pub struct ScriptedApi {
    submit: SubmitScript,
    history: Option<Vec<ConversationTurn>>,
    pub submitted: Mutex<Vec<String>>,
    pub history_calls: Mutex<usize>,
}

impl ScriptedApi {
    pub fn new(submit: SubmitScript) -> Self {
        Self {
            submit,
            history: Some(Vec::new()),
            submitted: Mutex::new(Vec::new()),
            history_calls: Mutex::new(0),
        }
    }

    /// `None` makes `list_conversations` fail
    pub fn with_history(mut self, history: Option<Vec<ConversationTurn>>) -> Self {
        self.history = history;
        self
    }

    pub fn submitted(&self) -> Vec<String> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConversationApi for ScriptedApi {
    async fn submit_message(&self, text: &str) -> Result<Reply, ApiError> {
        self.submitted.lock().unwrap().push(text.to_string());
        match &self.submit {
            SubmitScript::Echo(prefix) => Ok(Reply {
                ai_response: format!("{prefix}{text}"),
                id: None,
                date: None,
            }),
            SubmitScript::Fail(status) => Err(ApiError::Status {
                status: *status,
                body: None,
            }),
            SubmitScript::Panic => panic!("backend exploded"),
            SubmitScript::Gated(gate) => {
                gate.notified().await;
                Ok(Reply {
                    ai_response: "released".to_string(),
                    id: None,
                    date: None,
                })
            }
        }
    }

    async fn list_conversations(&self) -> Result<Vec<ConversationTurn>, ApiError> {
        *self.history_calls.lock().unwrap() += 1;
        self.history.clone().ok_or(ApiError::Status {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: None,
        })
    }
}

pub fn turn(user: &str, ai: &str) -> ConversationTurn {
    ConversationTurn {
        user_message: user.to_string(),
        ai_response: ai.to_string(),
        id: None,
        date: None,
    }
}

pub async fn next_event(rx: &mut UnboundedReceiver<AppEvent>) -> AppEvent {
    tokio::time::timeout(Duration::from_secs(10), rx.recv())
        .await
        .expect("timed out waiting for an app event")
        .expect("event channel closed")
}
