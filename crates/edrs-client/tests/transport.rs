//! `UreqTransport` against a local socket serving canned HTTP responses.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use edrs_client::{
    ApiClient, ApiError, ApiRequest, BaseUrl, Method, RequestContext, RetryPolicy, Session,
    Sleeper, Transport, TransportError, UreqTransport,
};
use pretty_assertions::assert_eq;

/// Head and body of one received request.
struct Received {
    request_line: String,
    headers: Vec<(String, String)>,
    body: String,
}

/// Serve `responses` in order, one per connection, reporting what arrived.
fn serve(responses: Vec<&'static str>) -> (String, mpsc::Receiver<Received>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let origin = format!("http://{}", listener.local_addr().unwrap());
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        for response in responses {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());

            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();

            let mut headers = Vec::new();
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                let line = line.trim_end();
                if line.is_empty() {
                    break;
                }
                if let Some((name, value)) = line.split_once(':') {
                    headers.push((name.trim().to_ascii_lowercase(), value.trim().to_owned()));
                }
            }

            let length = headers
                .iter()
                .find(|(n, _)| n == "content-length")
                .and_then(|(_, v)| v.parse::<usize>().ok())
                .unwrap_or(0);
            let mut body = vec![0; length];
            reader.read_exact(&mut body).unwrap();

            let mut stream = stream;
            stream.write_all(response.as_bytes()).unwrap();
            stream.flush().unwrap();

            tx.send(Received {
                request_line: request_line.trim_end().to_owned(),
                headers,
                body: String::from_utf8(body).unwrap(),
            })
            .unwrap();
        }
    });

    (origin, rx)
}

fn header<'a>(received: &'a Received, name: &str) -> Option<&'a str> {
    received
        .headers
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, v)| v.as_str())
}

struct NoSleep;

impl Sleeper for NoSleep {
    fn sleep(&self, _: Duration) {}
}

const OK_JSON: &str = "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 20\r\nConnection: close\r\n\r\n{\"status\":\"healthy\"}";
const SERVER_ERROR: &str = "HTTP/1.1 500 Internal Server Error\r\nContent-Type: application/json\r\nContent-Length: 21\r\nConnection: close\r\n\r\n{\"message\":\"db down\"}";
const UNAUTHORIZED: &str = "HTTP/1.1 401 Unauthorized\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";

#[test]
fn test_non_success_status_is_a_response() {
    let (origin, _rx) = serve(vec![SERVER_ERROR]);
    let transport = UreqTransport::new(Duration::from_secs(5));
    let ctx = RequestContext::new(
        ApiRequest::get("/"),
        format!("{origin}/api/core/database/health/"),
        0,
    );

    let response = transport.send(&ctx).unwrap();

    assert_eq!(response.status, 500);
    assert_eq!(response.server_message().as_deref(), Some("db down"));
    assert_eq!(response.headers.get("content-type"), Some("application/json"));
}

#[test]
fn test_connection_refused_is_network_error() {
    let port = TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let transport = UreqTransport::new(Duration::from_secs(5));
    let ctx = RequestContext::new(
        ApiRequest::get("/"),
        format!("http://127.0.0.1:{port}/health/"),
        0,
    );

    let err = transport.send(&ctx).unwrap_err();

    assert!(matches!(
        err,
        TransportError::Connect(_) | TransportError::Io(_) | TransportError::Other(_)
    ));
}

#[test]
fn test_client_sends_augmented_headers() {
    let (origin, rx) = serve(vec![OK_JSON]);
    let client = ApiClient::builder(BaseUrl::new(&origin, "/api"))
        .timeout(Duration::from_secs(5))
        .build();
    let session = Session::in_memory();
    session.store_login("tok-abc", None).unwrap();

    let health = client.health(&session).unwrap();
    let received = rx.recv().unwrap();

    assert_eq!(health.status.as_deref(), Some("healthy"));
    assert_eq!(received.request_line, "GET /health/ HTTP/1.1");
    assert_eq!(header(&received, "authorization"), Some("Bearer tok-abc"));
    assert_eq!(header(&received, "accept"), Some("application/json"));
    assert!(header(&received, "x-request-id").is_some());
}

#[test]
fn test_client_posts_json_body() {
    let (origin, rx) = serve(vec![OK_JSON]);
    let client = ApiClient::builder(BaseUrl::new(&origin, "/api"))
        .timeout(Duration::from_secs(5))
        .build();

    let response = client
        .execute(
            &Session::in_memory(),
            ApiRequest::post("/auth/login/")
                .json(&serde_json::json!({"username": "clerk"}))
                .unwrap(),
        )
        .unwrap();
    let received = rx.recv().unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(received.request_line, "POST /api/auth/login/ HTTP/1.1");
    assert_eq!(received.body, r#"{"username":"clerk"}"#);
    assert_eq!(header(&received, "content-type"), Some("application/json"));
}

#[test]
fn test_client_retries_server_error_over_the_wire() {
    let (origin, rx) = serve(vec![SERVER_ERROR, OK_JSON]);
    let client = ApiClient::builder(BaseUrl::new(&origin, "/api"))
        .timeout(Duration::from_secs(5))
        .policy(RetryPolicy::new(2))
        .sleeper(NoSleep)
        .build();

    let response = client
        .execute(&Session::in_memory(), ApiRequest::get("/core/categories/"))
        .unwrap();
    let first = rx.recv().unwrap();
    let second = rx.recv().unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(
        header(&first, "x-request-id"),
        header(&second, "x-request-id")
    );
}

#[test]
fn test_client_unauthorized_clears_session() {
    let (origin, _rx) = serve(vec![UNAUTHORIZED]);
    let client = ApiClient::builder(BaseUrl::new(&origin, "/api"))
        .timeout(Duration::from_secs(5))
        .build();
    let session = Session::in_memory();
    session.store_login("expired", None).unwrap();

    let err = client
        .execute(&session, ApiRequest::new(Method::Get, "/auth/user/"))
        .unwrap_err();

    assert!(matches!(err, ApiError::Unauthorized { .. }));
    assert!(session.token().is_none());
}
