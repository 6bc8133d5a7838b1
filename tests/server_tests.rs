mod common;

use common::tracing_util::TestTracing;
use portico::cli::DemoRoutes;
use portico::runtime_config::RuntimeConfig;
use portico::server::{AppService, HttpServer, ServerHandle};
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::time::Duration;

fn start_service() -> (TestTracing, ServerHandle) {
    let tracing = TestTracing::init();
    let config = RuntimeConfig::default();
    config.apply();
    let routes = DemoRoutes::new(&config).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let handle = HttpServer(AppService::new(routes)).start(addr).unwrap();
    handle.wait_ready().unwrap();
    (tracing, handle)
}

fn send_request(handle: &ServerHandle, req: &str) -> String {
    let mut stream = TcpStream::connect(handle.addr()).unwrap();
    stream.write_all(req.as_bytes()).unwrap();
    stream
        .set_read_timeout(Some(Duration::from_millis(200)))
        .unwrap();
    let mut buf = Vec::new();
    loop {
        let mut tmp = [0u8; 1024];
        match stream.read(&mut tmp) {
            Ok(0) => break,
            Ok(n) => buf.extend_from_slice(&tmp[..n]),
            Err(ref e)
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                break
            }
            Err(e) => panic!("read error: {e:?}"),
        }
    }
    String::from_utf8_lossy(&buf).to_string()
}

struct Reply {
    status: u16,
    headers: Vec<(String, String)>,
    body: String,
}

impl Reply {
    fn parse(raw: &str) -> Self {
        let (head, body) = raw.split_once("\r\n\r\n").unwrap_or((raw, ""));
        let mut lines = head.lines();
        let status = lines
            .next()
            .and_then(|l| l.split_whitespace().nth(1))
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);
        let headers = lines
            .filter_map(|l| l.split_once(": "))
            .map(|(k, v)| (k.to_ascii_lowercase(), v.to_string()))
            .collect();
        Self {
            status,
            headers,
            body: body.to_string(),
        }
    }

    fn header_values(&self, name: &str) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap_or_default()
    }
}

#[test]
fn test_health_endpoint() {
    let (_tracing, handle) = start_service();
    let reply = Reply::parse(&send_request(
        &handle,
        "GET /health HTTP/1.1\r\nHost: localhost\r\n\r\n",
    ));
    handle.stop();
    assert_eq!(reply.status, 200);
    assert_eq!(reply.json()["status"], "ok");
}

#[test]
fn test_unknown_path_is_json_404() {
    let (_tracing, handle) = start_service();
    let reply = Reply::parse(&send_request(
        &handle,
        "DELETE /nope HTTP/1.1\r\nHost: localhost\r\n\r\n",
    ));
    handle.stop();
    assert_eq!(reply.status, 404);
    assert_eq!(
        reply.header_values("content-type"),
        vec!["application/json"]
    );
    let body = reply.json();
    assert_eq!(body["error"], "Not Found");
    assert_eq!(body["method"], "DELETE");
    assert_eq!(body["path"], "/nope");
}

#[test]
fn test_unparseable_uri_is_json_400() {
    let (_tracing, handle) = start_service();
    let reply = Reply::parse(&send_request(
        &handle,
        "GET /a<b> HTTP/1.1\r\nHost: localhost\r\n\r\n",
    ));
    handle.stop();
    assert_eq!(reply.status, 400);
    assert_eq!(reply.json()["error"], "Bad Request");
}

#[test]
fn test_page_render_carries_single_content_length() {
    let (_tracing, handle) = start_service();
    let reply = Reply::parse(&send_request(
        &handle,
        "GET /?name=Ada HTTP/1.1\r\nHost: localhost\r\n\r\n",
    ));
    handle.stop();
    assert_eq!(reply.status, 200);
    assert!(reply.body.contains("Hello Ada!"), "{}", reply.body);
    let lengths = reply.header_values("content-length");
    assert_eq!(lengths.len(), 1);
    assert_eq!(lengths[0], reply.body.len().to_string());
    assert_eq!(
        reply.header_values("content-type"),
        vec!["text/html; charset=utf-8"]
    );
}

#[test]
fn test_guarded_page_redirects_then_sets_cookie() {
    let (_tracing, handle) = start_service();
    let denied = Reply::parse(&send_request(
        &handle,
        "GET /account HTTP/1.1\r\nHost: localhost\r\n\r\n",
    ));
    let allowed = Reply::parse(&send_request(
        &handle,
        "GET /account HTTP/1.1\r\nHost: localhost\r\nx-demo-token: letmein\r\n\r\n",
    ));
    handle.stop();

    assert_eq!(denied.status, 302);
    assert_eq!(denied.header_values("location"), vec!["/login"]);

    assert_eq!(allowed.status, 200);
    assert_eq!(
        allowed.header_values("set-cookie"),
        vec!["seen=1; Path=/; HttpOnly"]
    );
    assert!(allowed.body.contains("Signed in."));
}

#[test]
fn test_api_request_body_reaches_handler() {
    let (_tracing, handle) = start_service();
    let body = r#"{"name":"lamp"}"#;
    let reply = Reply::parse(&send_request(
        &handle,
        &format!(
            "PUT /api/items/7 HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{body}",
            body.len()
        ),
    ));
    handle.stop();
    assert_eq!(reply.status, 200);
    let item = reply.json();
    assert_eq!(item["id"], 7);
    assert_eq!(item["name"], "lamp");
}
