use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::process::{Child, Command, Stdio};
use std::time::Duration;

fn reserve_addr() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("reserve addr");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    addr.to_string()
}

fn wait_for_http(addr: &str) {
    for _ in 0..80 {
        if TcpStream::connect(addr).is_ok() {
            return;
        }
        std::thread::sleep(Duration::from_millis(25));
    }
    panic!("http server not ready on {addr}");
}

fn send_http(addr: &str, method: &str, path: &str, body: &str) -> String {
    let mut stream = TcpStream::connect(addr).expect("connect http");
    let request = format!(
        "{method} {path} HTTP/1.1\r\nHost: {addr}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    );
    stream.write_all(request.as_bytes()).expect("write request");
    stream.flush().expect("flush");
    let mut buf = String::new();
    stream.read_to_string(&mut buf).expect("read response");
    buf
}

fn response_body(response: &str) -> &str {
    response.split("\r\n\r\n").nth(1).unwrap_or("")
}

struct Daemon(Child);

impl Drop for Daemon {
    fn drop(&mut self) {
        let _ = self.0.kill();
        let _ = self.0.wait();
    }
}

fn spawn_daemon(addr: &str) -> Daemon {
    let child = Command::new(env!("CARGO_BIN_EXE_clearslotd"))
        .env("CLEARSLOT_TRANSPORT", "http")
        .env("CLEARSLOT_HTTP_ADDR", addr)
        .env("CLEARSLOT_WEATHER_PROVIDER", "mock")
        .env("CLEARSLOT_LOG", "warn")
        .env_remove("CLEARSLOT_POLICY_PATH")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn clearslotd");
    Daemon(child)
}

#[test]
fn http_health_rpc_and_metrics_work() {
    let addr = reserve_addr();
    let _daemon = spawn_daemon(&addr);
    wait_for_http(&addr);

    let health = send_http(&addr, "GET", "/health", "");
    assert!(health.starts_with("HTTP/1.1 200"));
    assert!(response_body(&health).contains("\"status\":\"ok\""));

    let check = r#"{"jsonrpc":"2.0","id":1,"method":"flyability/check","params":{"site_id":"IFR_FIELD","pilot":{"licence_type":"PPL(A)","total_hours":200},"aircraft":{"max_demonstrated_crosswind_kt":15,"min_runway_length_m":300}}}"#;
    let response = send_http(&addr, "POST", "/rpc", check);
    assert!(response.starts_with("HTTP/1.1 200"));
    let body = response_body(&response);
    assert!(body.contains("\"status\":\"NO_GO\""));
    assert!(body.contains("CLOUD_BASE_LIMIT"));

    let summary = send_http(&addr, "GET", "/metrics/summary", "");
    assert!(summary.starts_with("HTTP/1.1 200"));
    let summary_body = response_body(&summary);
    assert!(summary_body.contains("\"NO_GO\":1"));
    assert!(summary_body.contains("flyability/check"));
}

#[test]
fn http_rejects_bad_bodies_and_routes() {
    let addr = reserve_addr();
    let _daemon = spawn_daemon(&addr);
    wait_for_http(&addr);

    let parse = send_http(&addr, "POST", "/rpc", "{not json");
    assert!(parse.starts_with("HTTP/1.1 400"));
    assert!(response_body(&parse).contains("-32700"));

    let missing = send_http(&addr, "POST", "/bookings", "{}");
    assert!(missing.starts_with("HTTP/1.1 404"));

    let wrong_method = send_http(&addr, "DELETE", "/rpc", "");
    assert!(wrong_method.starts_with("HTTP/1.1 405"));
}

#[test]
fn http_refuses_oversized_content_length() {
    let addr = reserve_addr();
    let _daemon = spawn_daemon(&addr);
    wait_for_http(&addr);

    let mut stream = TcpStream::connect(&addr).expect("connect http");
    let request = format!(
        "POST /rpc HTTP/1.1\r\nHost: {addr}\r\nContent-Length: {}\r\n\r\n",
        u64::MAX
    );
    stream.write_all(request.as_bytes()).expect("write request");
    stream.flush().expect("flush");
    let mut response = String::new();
    stream.read_to_string(&mut response).expect("read response");
    assert!(response.starts_with("HTTP/1.1 413"), "{response}");
    assert!(response_body(&response).contains("payload_too_large"));

    let health = send_http(&addr, "GET", "/health", "");
    assert!(health.starts_with("HTTP/1.1 200"));
}
