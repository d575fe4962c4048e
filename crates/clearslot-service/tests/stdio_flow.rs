use std::io::Cursor;

use clearslot_core::ClearslotPolicy;
use clearslot_service::framing::MAX_BODY_BYTES;
use clearslot_service::ClearslotServer;
use clearslot_weather::WeatherProviderConfig;
use serde_json::Value;

fn server() -> ClearslotServer {
    ClearslotServer::with_config(WeatherProviderConfig::Mock, ClearslotPolicy::default())
        .expect("server with mock weather")
}

fn run(input: &str) -> String {
    let mut out = Vec::new();
    server()
        .serve_io(Cursor::new(input.as_bytes().to_vec()), &mut out)
        .expect("serve");
    String::from_utf8(out).expect("utf8 output")
}

#[test]
fn line_delimited_requests_get_line_responses() {
    let input = concat!(
        r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#,
        "\n\n",
        r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
        "\n",
        "not json\n",
        r#"{"jsonrpc":"2.0","id":2,"method":"policy/get"}"#,
        "\n"
    );
    let output = run(input);
    let lines = output.lines().collect::<Vec<_>>();
    assert_eq!(lines.len(), 3);

    let ping: Value = serde_json::from_str(lines[0]).expect("ping json");
    assert_eq!(ping["id"], 1);
    let parse: Value = serde_json::from_str(lines[1]).expect("error json");
    assert_eq!(parse["error"]["code"], -32700);
    let policy: Value = serde_json::from_str(lines[2]).expect("policy json");
    assert_eq!(policy["result"]["flyability"]["min_cloud_base_ft"], 1500.0);
}

#[test]
fn content_length_frames_are_answered_in_kind() {
    let body = r#"{"jsonrpc":"2.0","id":"a","method":"flyability/evaluate","params":{"weather":{"wind_gusts_kt":5,"cloud_base_ft":3500},"pilot":{"licence_type":"PPL(A)","total_hours":100},"aircraft":{"max_demonstrated_crosswind_kt":15,"min_runway_length_m":300}}}"#;
    let input = format!("Content-Length: {}\r\n\r\n{body}", body.len());
    let output = run(&input);

    let (header, payload) = output.split_once("\r\n\r\n").expect("framed output");
    let declared = header
        .trim()
        .strip_prefix("Content-Length: ")
        .and_then(|v| v.parse::<usize>().ok())
        .expect("content length");
    assert_eq!(declared, payload.len());

    let response: Value = serde_json::from_str(payload).expect("response json");
    assert_eq!(response["id"], "a");
    assert_eq!(response["result"]["status"], "GO");
    assert_eq!(response["result"]["score"], 90);
}

fn framed_responses(output: &str) -> Vec<Value> {
    output
        .split("Content-Length: ")
        .filter(|chunk| !chunk.is_empty())
        .map(|chunk| {
            let (_, payload) = chunk.split_once("\r\n\r\n").expect("framed output");
            serde_json::from_str(payload).expect("response json")
        })
        .collect()
}

#[test]
fn absurd_content_length_is_answered_with_parse_error() {
    let output = run("Content-Length: 18446744073709551615\r\n\r\n{}");
    let responses = framed_responses(&output);
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0]["error"]["code"], -32700);
    assert!(responses[0]["error"]["message"]
        .as_str()
        .is_some_and(|m| m.contains("exceeds")));
}

#[test]
fn stream_recovers_after_oversized_frame() {
    let oversized = MAX_BODY_BYTES + 1;
    let ping = r#"{"jsonrpc":"2.0","id":7,"method":"ping"}"#;
    let input = format!(
        "Content-Length: {oversized}\r\n\r\n{}Content-Length: {}\r\n\r\n{ping}",
        " ".repeat(oversized),
        ping.len()
    );
    let responses = framed_responses(&run(&input));
    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0]["error"]["code"], -32700);
    assert_eq!(responses[1]["id"], 7);
    assert!(responses[1]["result"].is_object());
}

#[test]
fn truncated_frame_is_a_parse_error() {
    let output = run("Content-Length: 50\r\n\r\n{}");
    let responses = framed_responses(&output);
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0]["error"]["code"], -32700);
}
