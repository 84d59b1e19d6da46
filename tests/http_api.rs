//! Tests de integración para el servidor HTTP
//! tests/http_api.rs
//!
//! Cada test levanta su propio servidor en un puerto efímero, así que no
//! hace falta tener nada corriendo.

use reqwest::blocking::Client;
use serde_json::{json, Value};
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use wordcount_server::config::Config;
use wordcount_server::jobs::{EngineConfig, FnWorkload, JobEngine, Workload};
use wordcount_server::server::{Server, SERVER_NAME};
use wordcount_server::wordcount::WordCountWorkload;

/// Response parseada: status, headers crudos y body JSON
struct Reply {
    status: u16,
    head: String,
    body: Value,
}

impl Reply {
    fn header(&self, name: &str) -> Option<&str> {
        self.head.lines().find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.eq_ignore_ascii_case(name).then(|| value.trim())
        })
    }
}

fn start_server<W>(engine: Arc<JobEngine<W>>, base_path: &str) -> SocketAddr
where
    W: Workload<Payload = String>,
    W::Output: serde::Serialize,
{
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let config = Config {
        base_path: base_path.to_string(),
        ..Config::default()
    };

    let server = Server::new(config, engine);
    thread::spawn(move || server.serve(listener));

    addr
}

/// Helper: envía un request HTTP/1.0 y retorna la response
fn send(addr: SocketAddr, method: &str, path: &str) -> Reply {
    let mut stream = TcpStream::connect(addr).unwrap();
    stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();

    write!(stream, "{} {} HTTP/1.0\r\nHost: test\r\n\r\n", method, path).unwrap();
    stream.flush().unwrap();

    let mut raw = String::new();
    stream.read_to_string(&mut raw).unwrap();

    let (head, body) = raw.split_once("\r\n\r\n").unwrap();
    let status = head
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse().ok())
        .unwrap();

    Reply {
        status,
        head: head.to_string(),
        body: serde_json::from_str(body).unwrap_or(Value::Null),
    }
}

fn submit(addr: SocketAddr, target: &str) -> String {
    let reply = send(addr, "GET", &format!("/api/url/{}", target));
    assert_eq!(reply.status, 202);
    reply.body["id"].as_str().unwrap().to_string()
}

/// Consulta hasta que el status deje de ser 202
fn poll(addr: SocketAddr, token: &str, query: &str) -> Reply {
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        let reply = send(addr, "GET", &format!("/api/count/{}{}", token, query));
        if reply.status != 202 {
            return reply;
        }
        assert!(Instant::now() < deadline, "job {token} never finished");
        thread::sleep(Duration::from_millis(10));
    }
}

type ShoutWorkload = FnWorkload<fn(String) -> Result<String, String>, String, String, String>;

fn shout(target: String) -> Result<String, String> {
    if target.starts_with("bad") {
        return Err(format!("refusing {}", target));
    }
    Ok(target.to_uppercase())
}

fn shout_engine() -> Arc<JobEngine<ShoutWorkload>> {
    let workload = FnWorkload::new(shout as fn(String) -> Result<String, String>);
    Arc::new(JobEngine::new(workload, EngineConfig::default().with_workers(2)).unwrap())
}

// ==================== Submit & Count ====================

#[test]
fn test_submit_then_count() {
    let addr = start_server(shout_engine(), "/api");

    let reply = send(addr, "GET", "/api/url/example.com");
    assert_eq!(reply.status, 202);
    assert_eq!(reply.body["message"], "enqueued");

    let token = reply.body["id"].as_str().unwrap();
    let reply = poll(addr, token, "");
    assert_eq!(reply.status, 200);
    assert_eq!(reply.body, json!("EXAMPLE.COM"));
}

#[test]
fn test_put_submits_too() {
    let addr = start_server(shout_engine(), "/api");

    let reply = send(addr, "PUT", "/api/url/put.example");
    assert_eq!(reply.status, 202);

    let token = reply.body["id"].as_str().unwrap();
    assert_eq!(poll(addr, token, "").body, json!("PUT.EXAMPLE"));
}

#[test]
fn test_target_may_contain_scheme_and_path() {
    let addr = start_server(shout_engine(), "/api");

    let token = submit(addr, "http://example.com/a/b");
    assert_eq!(poll(addr, &token, "").body, json!("HTTP://EXAMPLE.COM/A/B"));
}

#[test]
fn test_failed_job_reports_error() {
    let addr = start_server(shout_engine(), "/api");

    let token = submit(addr, "bad.example");
    let reply = poll(addr, &token, "");

    assert_eq!(reply.status, 200);
    assert_eq!(reply.body, json!({"error": "refusing bad.example"}));
}

#[test]
fn test_debug_returns_full_record() {
    let addr = start_server(shout_engine(), "/api");

    let token = submit(addr, "abc");
    let reply = poll(addr, &token, "?debug=true");

    assert_eq!(reply.status, 200);
    assert_eq!(reply.body["token"], token.as_str());
    assert_eq!(reply.body["payload"], "abc");
    assert_eq!(reply.body["result"], json!({"completed": "ABC"}));
    assert!(reply.body["enqueued_at"].is_string());
    assert!(reply.body["finished_at"].is_string());
}

#[test]
fn test_unknown_token_is_404() {
    let addr = start_server(shout_engine(), "/api");

    let reply = send(addr, "GET", "/api/count/does-not-exist");
    assert_eq!(reply.status, 404);
    assert_eq!(reply.body, json!({"error": "Token not found"}));
}

#[test]
fn test_pending_job_is_202() {
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let release_rx = Mutex::new(release_rx);
    let workload = FnWorkload::new(move |target: String| {
        release_rx.lock().unwrap().recv().unwrap();
        Ok::<_, String>(target.len())
    });
    let engine = Arc::new(JobEngine::new(workload, EngineConfig::default().with_workers(1)).unwrap());
    let addr = start_server(Arc::clone(&engine), "/api");

    let token = submit(addr, "slow.example");

    let reply = send(addr, "GET", &format!("/api/count/{}", token));
    assert_eq!(reply.status, 202);
    assert_eq!(reply.body["status"], "pending");

    let reply = send(addr, "GET", &format!("/api/count/{}?debug=true", token));
    assert_eq!(reply.status, 202);
    assert_eq!(reply.body["payload"], "slow.example");
    assert!(reply.body["result"].is_null());

    release_tx.send(()).unwrap();
    assert_eq!(poll(addr, &token, "").body, json!(12));
}

// ==================== Protocol ====================

#[test]
fn test_common_headers() {
    let addr = start_server(shout_engine(), "/api");

    let first = send(addr, "GET", "/api/count/x");
    let second = send(addr, "GET", "/api/count/x");

    assert_eq!(first.header("Server"), Some(SERVER_NAME));
    assert_eq!(first.header("Content-Type"), Some("application/json"));

    let first_id = first.header("X-Request-Id").unwrap();
    let second_id = second.header("X-Request-Id").unwrap();
    assert_eq!(first_id.len(), 36);
    assert_ne!(first_id, second_id);
}

#[test]
fn test_unknown_route_and_method() {
    let addr = start_server(shout_engine(), "/api");

    assert_eq!(send(addr, "GET", "/nothing/here").status, 404);
    assert_eq!(send(addr, "PUT", "/api/count/abc").status, 405);
    assert_eq!(send(addr, "DELETE", "/api/url/x").status, 400);
}

#[test]
fn test_empty_target_is_400() {
    let addr = start_server(shout_engine(), "/api");
    assert_eq!(send(addr, "GET", "/api/url/").status, 400);
}

#[test]
fn test_custom_base_path() {
    let addr = start_server(shout_engine(), "/v2");

    let reply = send(addr, "GET", "/v2/url/example.com");
    assert_eq!(reply.status, 202);
    assert_eq!(send(addr, "GET", "/api/url/example.com").status, 404);
}

#[test]
fn test_metrics_endpoint() {
    let engine = shout_engine();
    let addr = start_server(Arc::clone(&engine), "/api");

    let token = submit(addr, "one");
    poll(addr, &token, "");

    let reply = send(addr, "GET", "/metrics");
    assert_eq!(reply.status, 200);
    assert_eq!(reply.body["jobs"]["submitted"], 1);
    assert_eq!(reply.body["jobs"]["completed"], 1);
    assert_eq!(reply.body["jobs"]["workers"], 2);
    assert!(reply.body["http"]["requests"]["total"].as_u64().unwrap() >= 2);
}

#[test]
fn test_submit_after_shutdown_is_503() {
    let engine = shout_engine();
    let addr = start_server(Arc::clone(&engine), "/api");

    let token = submit(addr, "before");
    engine.shutdown();

    assert_eq!(send(addr, "GET", "/api/url/after").status, 503);
    // Los resultados siguen disponibles
    assert_eq!(poll(addr, &token, "").body, json!("BEFORE"));
}

#[test]
fn test_concurrent_clients() {
    let addr = start_server(shout_engine(), "/api");

    let handles: Vec<_> = (0..20)
        .map(|i| {
            thread::spawn(move || {
                let target = format!("host{}.example", i);
                let token = submit(addr, &target);
                (target, poll(addr, &token, "").body)
            })
        })
        .collect();

    for handle in handles {
        let (target, body) = handle.join().unwrap();
        assert_eq!(body, json!(target.to_uppercase()));
    }
}

// ==================== Word Count ====================

/// Sirve `page` a cualquier request, indefinidamente
fn page_server(page: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { continue };
            let mut buf = [0u8; 4096];
            let _ = stream.read(&mut buf);
            let _ = write!(
                stream,
                "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                page.len(),
                page
            );
        }
    });

    addr
}

fn wordcount_engine() -> Arc<JobEngine<WordCountWorkload>> {
    let client = Client::builder()
        .timeout(Duration::from_secs(5))
        .no_proxy()
        .build()
        .unwrap();
    let workload = WordCountWorkload::with_client(client);
    Arc::new(JobEngine::new(workload, EngineConfig::default().with_workers(2)).unwrap())
}

#[test]
fn test_wordcount_end_to_end() {
    let page = page_server(
        "<html><head><title>ignored title</title></head>\
         <body><h1>Hello World</h1><p>three more words</p>\
         <script>var hidden = 1;</script></body></html>",
    );
    let addr = start_server(wordcount_engine(), "/api");

    let token = submit(addr, &format!("{}/index.html", page));
    let reply = poll(addr, &token, "");

    assert_eq!(reply.status, 200);
    assert_eq!(reply.body["count"], 5);
    assert_eq!(
        reply.body["counts_by_heuristic"],
        json!([
            {"heuristic": "data_segments", "count": 9},
            {"heuristic": "visible_text", "count": 5},
            {"heuristic": "rendered_body", "count": 5},
        ])
    );
}

#[test]
fn test_wordcount_unreachable_host() {
    let closed = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let addr = start_server(wordcount_engine(), "/api");

    let token = submit(addr, &format!("http://{}/", closed));
    let reply = poll(addr, &token, "");

    assert_eq!(reply.status, 200);
    let message = reply.body["error"].as_str().unwrap();
    assert!(message.contains("request to"), "{message}");
}
