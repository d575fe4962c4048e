use std::time::{Duration, Instant};

use clearslot_core::ClearslotPolicy;
use clearslot_service::protocol::JsonRpcRequest;
use clearslot_service::ClearslotServer;
use clearslot_weather::WeatherProviderConfig;
use serde_json::{json, Value};

fn server() -> ClearslotServer {
    ClearslotServer::with_config(WeatherProviderConfig::Mock, ClearslotPolicy::default())
        .expect("server with mock weather")
}

fn call(server: &ClearslotServer, method: &str, params: Value) -> Value {
    let response = server
        .handle_request(JsonRpcRequest::new(1, method, params))
        .expect("response");
    assert!(
        response.error.is_none(),
        "{method} failed: {:?}",
        response.error
    );
    response.result.expect("result")
}

fn call_error(server: &ClearslotServer, method: &str, params: Value) -> (i64, String) {
    let response = server
        .handle_request(JsonRpcRequest::new(1, method, params))
        .expect("response");
    let error = response.error.expect("error");
    (error.code, error.message)
}

fn pilot() -> Value {
    json!({
        "licence_type": "NPPL(A)",
        "total_hours": 60,
        "supervised_solo_hours": 12,
        "ratings": ["Microlight"],
        "logbook": [{"date": "2026-06-01", "hours_pic": 1.2, "takeoff_landings": 3}]
    })
}

fn aircraft() -> Value {
    json!({"registration": "G-CDEF", "max_demonstrated_crosswind_kt": 15, "min_runway_length_m": 300})
}

#[test]
fn initialize_lists_methods() {
    let result = call(&server(), "initialize", json!({}));
    assert_eq!(result["serverInfo"]["name"], "clearslot-service");
    assert_eq!(result["weatherProvider"], "mock");
    let methods = result["capabilities"]["methods"]
        .as_array()
        .expect("methods");
    assert!(methods.iter().any(|m| m == "flyability/slots"));
}

#[test]
fn evaluate_reports_wind_limit_with_value() {
    let result = call(
        &server(),
        "flyability/evaluate",
        json!({
            "weather": {"wind_gusts_kt": 30, "cloud_base_ft": 3000, "runway_surface": "firm"},
            "pilot": pilot(),
            "aircraft": aircraft()
        }),
    );
    assert_eq!(result["status"], "NO_GO");
    assert_eq!(result["reasons"][0]["rule"], "WIND_LIMIT");
    assert_eq!(result["reasons"][0]["value"], 30.0);
    let texts = result["reason_texts"].as_array().expect("texts");
    assert!(texts.iter().any(|t| t.as_str().is_some_and(|s| s.contains("30"))));
}

#[test]
fn check_uses_site_weather_and_surface_override() {
    let server = server();
    let safe = call(
        &server,
        "flyability/check",
        json!({"site_id": "SAFE_STRIP", "pilot": pilot(), "aircraft": aircraft()}),
    );
    assert_eq!(safe["status"], "GO");
    assert_eq!(safe["weather"]["cloud_base_ft"], 4000.0);

    let wet = call(
        &server,
        "flyability/check",
        json!({
            "site_id": "SAFE_STRIP",
            "time": "2026-06-15T10:00:00",
            "pilot": pilot(),
            "aircraft": aircraft(),
            "runway_surface": "wet"
        }),
    );
    assert_eq!(wet["status"], "CHECK");
    assert_eq!(wet["reasons"][0]["rule"], "RUNWAY_SURFACE");

    let windy = call(
        &server,
        "flyability/check",
        json!({"site_id": "WINDY_HILL", "pilot": pilot(), "aircraft": aircraft()}),
    );
    assert_eq!(windy["status"], "NO_GO");
}

#[test]
fn slots_cover_the_range_in_order() {
    let result = call(
        &server(),
        "flyability/slots",
        json!({
            "site_id": "SAFE_STRIP",
            "start": "2026-06-15T09:00:00",
            "end": "2026-06-15T11:30:00",
            "pilot": pilot(),
            "aircraft": aircraft()
        }),
    );
    assert_eq!(result["count"], 3);
    let slots = result["slots"].as_array().expect("slots");
    assert_eq!(slots[0]["start"], "2026-06-15T09:00:00");
    assert_eq!(slots[2]["end"], "2026-06-15T11:30:00");
    assert!(slots.iter().all(|s| s["status"] == "GO"));
}

#[test]
fn oversized_slot_range_is_rejected() {
    let (code, _) = call_error(
        &server(),
        "flyability/slots",
        json!({
            "site_id": "SAFE_STRIP",
            "start": "2026-06-01T00:00:00",
            "end": "2026-06-30T00:00:00",
            "slot_duration_minutes": 15,
            "pilot": pilot(),
            "aircraft": aircraft()
        }),
    );
    assert_eq!(code, -32602);
}

#[test]
fn multi_year_minute_slots_are_refused_up_front() {
    let server = server();
    let started = Instant::now();
    let (code, message) = call_error(
        &server,
        "flyability/slots",
        json!({
            "site_id": "SAFE_STRIP",
            "start": "2000-01-01T00:00:00",
            "end": "2020-01-01T00:00:00",
            "slot_duration_minutes": 1,
            "pilot": pilot(),
            "aircraft": aircraft()
        }),
    );
    assert_eq!(code, -32602);
    assert!(message.contains("10519200"), "{message}");
    assert!(started.elapsed() < Duration::from_millis(500));

    let (code, _) = call_error(
        &server,
        "flyability/slots",
        json!({
            "site_id": "SAFE_STRIP",
            "start": "0001-01-01T00:00:00",
            "end": "9999-12-31T23:59:00",
            "slot_duration_minutes": 1,
            "pilot": pilot(),
            "aircraft": aircraft()
        }),
    );
    assert_eq!(code, -32602);
}

#[test]
fn legality_reports_rule_and_reason() {
    let server = server();
    let short = call(
        &server,
        "legality/check",
        json!({"pilot": {"licence_type": "NPPL(A)", "total_hours": 15}, "date": "2026-06-15"}),
    );
    assert_eq!(short["legal"], false);
    assert_eq!(short["rule"], "minimum_total_hours");

    let current = call(
        &server,
        "legality/check",
        json!({"pilot": pilot(), "date": "2026-06-15", "aircraft": aircraft()}),
    );
    assert_eq!(current["legal"], true);
    assert!(current["reason"].is_null());

    let stale = call(
        &server,
        "legality/check",
        json!({"pilot": pilot(), "date": "2026-12-01"}),
    );
    assert_eq!(stale["legal"], false);
    assert_eq!(stale["reason"], "Recency: <1 landings in 90 days");
}

#[test]
fn malformed_profile_is_invalid_params() {
    let (code, message) = call_error(
        &server(),
        "flyability/evaluate",
        json!({
            "weather": {"wind_gusts_kt": 5, "cloud_base_ft": 3000},
            "pilot": pilot(),
            "aircraft": {"max_demonstrated_crosswind_kt": 15, "min_runway_length_m": -1}
        }),
    );
    assert_eq!(code, -32602);
    assert!(message.contains("could not evaluate"));
}

#[test]
fn club_score_and_policy_are_served() {
    let server = server();
    let score = call(
        &server,
        "club/score",
        json!({"portal_adoption_rate": 1.0, "rag_usage_percent": 1.0, "calendar_sync_active": true}),
    );
    assert_eq!(score["score"], 100);
    assert_eq!(score["band"], "Modernised");

    let policy = call(&server, "policy/get", Value::Null);
    assert_eq!(policy["flyability"]["max_gust_kt"], 25.0);
    assert_eq!(policy["legality"]["recency_window_days"], 90);
}

#[test]
fn protocol_errors_use_jsonrpc_codes() {
    let server = server();
    let (code, _) = call_error(&server, "bookings/create", json!({}));
    assert_eq!(code, -32601);

    let bad_version = JsonRpcRequest {
        jsonrpc: "1.0".to_string(),
        id: Some(json!(7)),
        method: "ping".to_string(),
        params: Value::Null,
    };
    let response = server.handle_request(bad_version).expect("response");
    assert_eq!(response.error.map(|e| e.code), Some(-32600));

    let notification = JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        id: None,
        method: "notifications/initialized".to_string(),
        params: Value::Null,
    };
    assert!(server.handle_request(notification).is_none());
}

#[test]
fn provider_failure_maps_to_server_error() {
    let server = ClearslotServer::with_config(
        WeatherProviderConfig::AviationWeather(clearslot_weather::AviationWeatherConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout: std::time::Duration::from_secs(2),
            fallback_on_error: false,
        }),
        ClearslotPolicy::default(),
    )
    .expect("server");
    let (code, message) = call_error(
        &server,
        "flyability/check",
        json!({"site_id": "EGPF", "pilot": pilot(), "aircraft": aircraft()}),
    );
    assert_eq!(code, -32000);
    assert!(message.starts_with("weather unavailable"));

    let summary = server.render_metrics_summary();
    assert_eq!(summary["provider_failures"], 1);
    assert_eq!(summary["rpc"]["methods"]["flyability/check"]["err"], 1);
}
