use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::{Local, NaiveDate, NaiveDateTime};
use clearslot_core::{
    compute_club_operational_score, count_slots, evaluate_windows, plan_slots, AircraftProfile,
    ClearslotPolicy, ClubMetrics, FlyabilityEvaluator, FlyabilityStatus, LegalityEvaluator,
    PilotProfile, PolicyError, RunwaySurface, Slot, ValidationError, WeatherSnapshot,
};
use clearslot_weather::{
    build_weather_provider, ForecastRequest, ProviderError, WeatherProvider,
    WeatherProviderConfig,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::runtime::Runtime;
use tracing::{debug, info, warn};

use crate::error::ServerError;
use crate::framing::{
    content_length, discard_body, is_header_line, read_body, read_headers, read_http_request,
    write_http_response, write_stdio_response, FrameError, HttpInbound, HttpRequest, HttpResponse,
    StdioFrame,
};
use crate::protocol::{
    JsonRpcRequest, JsonRpcResponse, INVALID_PARAMS, INVALID_REQUEST, METHOD_NOT_FOUND,
    PARSE_ERROR, PROVIDER_ERROR,
};

const SERVER_NAME: &str = "clearslot-service";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
const INTERNAL_ERROR: i64 = -32603;
const DEFAULT_SLOT_MINUTES: u32 = 60;
const MAX_SLOTS_PER_REQUEST: u64 = 96;
const METHODS: [&str; 8] = [
    "initialize",
    "ping",
    "flyability/check",
    "flyability/evaluate",
    "flyability/slots",
    "legality/check",
    "club/score",
    "policy/get",
];

pub struct ClearslotServer {
    weather: Arc<dyn WeatherProvider>,
    policy: ClearslotPolicy,
    flyability: FlyabilityEvaluator,
    pilot_legality: LegalityEvaluator,
    aircraft_legality: LegalityEvaluator,
    runtime: Runtime,
    metrics: Mutex<MetricsRegistry>,
}

#[derive(Debug, Default)]
struct MethodMetric {
    ok: u64,
    err: u64,
    total_latency_ms: f64,
    max_latency_ms: f64,
}

#[derive(Debug, Default)]
struct MetricsRegistry {
    methods: BTreeMap<String, MethodMetric>,
    statuses: BTreeMap<&'static str, u64>,
    legal: u64,
    illegal: u64,
    provider_failures: u64,
}

#[derive(Debug)]
struct RpcFailure {
    code: i64,
    message: String,
}

impl RpcFailure {
    fn invalid_params(message: impl Into<String>) -> Self {
        Self {
            code: INVALID_PARAMS,
            message: message.into(),
        }
    }

    fn validation(err: ValidationError) -> Self {
        Self::invalid_params(format!("could not evaluate: {err}"))
    }

    fn provider(err: &ProviderError) -> Self {
        Self {
            code: PROVIDER_ERROR,
            message: format!("weather unavailable: {err}"),
        }
    }

    fn internal(err: &serde_json::Error) -> Self {
        Self {
            code: INTERNAL_ERROR,
            message: format!("failed to encode result: {err}"),
        }
    }
}

type RpcResult = Result<Value, RpcFailure>;

#[derive(Debug, Deserialize)]
struct CheckParams {
    site_id: String,
    #[serde(default)]
    time: Option<NaiveDateTime>,
    pilot: PilotProfile,
    aircraft: AircraftProfile,
    #[serde(default)]
    runway_surface: Option<RunwaySurface>,
}

#[derive(Debug, Deserialize)]
struct EvaluateParams {
    weather: WeatherSnapshot,
    pilot: PilotProfile,
    aircraft: AircraftProfile,
}

fn default_slot_minutes() -> u32 {
    DEFAULT_SLOT_MINUTES
}

#[derive(Debug, Deserialize)]
struct SlotsParams {
    #[serde(flatten)]
    slot: Slot,
    #[serde(default = "default_slot_minutes")]
    slot_duration_minutes: u32,
    #[serde(default)]
    runway_surface: Option<RunwaySurface>,
}

#[derive(Debug, Deserialize)]
struct LegalityParams {
    pilot: PilotProfile,
    #[serde(default)]
    date: Option<NaiveDate>,
    #[serde(default)]
    aircraft: Option<AircraftProfile>,
}

impl ClearslotServer {
    /// Weather provider from `CLEARSLOT_WEATHER_*`, policy from the optional
    /// `CLEARSLOT_POLICY_PATH` JSON file.
    pub fn from_env() -> Result<Self, ServerError> {
        let policy = match std::env::var("CLEARSLOT_POLICY_PATH") {
            Ok(path) if !path.trim().is_empty() => ClearslotPolicy::from_json_file(path.trim())?,
            _ => ClearslotPolicy::default(),
        };
        Self::with_config(WeatherProviderConfig::from_env()?, policy)
    }

    pub fn with_config(
        weather: WeatherProviderConfig,
        policy: ClearslotPolicy,
    ) -> Result<Self, ServerError> {
        Self::with_provider(build_weather_provider(weather)?, policy)
    }

    pub fn with_provider(
        weather: Arc<dyn WeatherProvider>,
        policy: ClearslotPolicy,
    ) -> Result<Self, ServerError> {
        policy.legality.validate().map_err(PolicyError::from)?;
        Ok(Self {
            flyability: FlyabilityEvaluator::new(policy.flyability.clone())
                .map_err(PolicyError::from)?,
            pilot_legality: LegalityEvaluator::pilot_rules(&policy.legality),
            aircraft_legality: LegalityEvaluator::with_aircraft_rules(&policy.legality),
            runtime: Runtime::new()?,
            metrics: Mutex::new(MetricsRegistry::default()),
            weather,
            policy,
        })
    }

    pub fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::error(
                request.id.unwrap_or(Value::Null),
                INVALID_REQUEST,
                "invalid jsonrpc version",
            ));
        }

        let is_notification = request.id.is_none();
        let id = request.id.clone().unwrap_or(Value::Null);

        if is_notification && request.method.starts_with("notifications/") {
            return None;
        }

        let started = Instant::now();
        let outcome = match request.method.as_str() {
            "initialize" => Ok(self.initialize_result()),
            "ping" => Ok(json!({})),
            "flyability/check" => self.handle_flyability_check(request.params),
            "flyability/evaluate" => self.handle_flyability_evaluate(request.params),
            "flyability/slots" => self.handle_flyability_slots(request.params),
            "legality/check" => self.handle_legality_check(request.params),
            "club/score" => self.handle_club_score(request.params),
            "policy/get" => {
                serde_json::to_value(&self.policy).map_err(|e| RpcFailure::internal(&e))
            }
            _ => {
                return Some(JsonRpcResponse::error(
                    id,
                    METHOD_NOT_FOUND,
                    "method not found",
                ))
            }
        };
        self.record_method(&request.method, started.elapsed(), outcome.is_err());

        let response = match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(failure) => {
                debug!(
                    method = %request.method,
                    code = failure.code,
                    message = %failure.message,
                    "rpc failed"
                );
                JsonRpcResponse::error(id, failure.code, failure.message)
            }
        };
        Some(response)
    }

    fn initialize_result(&self) -> Value {
        json!({
            "serverInfo": {"name": SERVER_NAME, "version": SERVER_VERSION},
            "capabilities": {"methods": METHODS},
            "weatherProvider": self.weather.name()
        })
    }

    fn fetch_weather(&self, request: ForecastRequest) -> Result<WeatherSnapshot, RpcFailure> {
        let site = request.site_id.clone();
        self.runtime
            .block_on(self.weather.forecast(request))
            .map_err(|err| {
                warn!(
                    site = %site,
                    provider = self.weather.name(),
                    error = %err,
                    "weather fetch failed"
                );
                self.record_provider_failure();
                RpcFailure::provider(&err)
            })
    }

    fn handle_flyability_check(&self, params: Value) -> RpcResult {
        let args: CheckParams = parse_params(params)?;
        let request = match args.time {
            Some(t) => {
                let end = t.checked_add_signed(chrono::Duration::hours(1)).unwrap_or(t);
                ForecastRequest::window(args.site_id.clone(), t, end)
            }
            None => ForecastRequest::current(args.site_id.clone()),
        };
        let weather = with_surface_override(self.fetch_weather(request)?, args.runway_surface);

        let result = self
            .flyability
            .evaluate(&weather, &args.pilot, &args.aircraft)
            .map_err(RpcFailure::validation)?;
        self.record_status(result.status);

        Ok(json!({
            "site_id": args.site_id,
            "status": result.status,
            "score": result.score,
            "reasons": result.reasons,
            "reason_texts": result.reason_texts(),
            "weather": weather,
            "provider": self.weather.name()
        }))
    }

    fn handle_flyability_evaluate(&self, params: Value) -> RpcResult {
        let args: EvaluateParams = parse_params(params)?;
        let result = self
            .flyability
            .evaluate(&args.weather, &args.pilot, &args.aircraft)
            .map_err(RpcFailure::validation)?;
        self.record_status(result.status);
        Ok(json!({
            "status": result.status,
            "score": result.score,
            "reasons": result.reasons,
            "reason_texts": result.reason_texts()
        }))
    }

    fn handle_flyability_slots(&self, params: Value) -> RpcResult {
        let args: SlotsParams = parse_params(params)?;
        let slot = &args.slot;
        let count = count_slots(slot.start, slot.end, args.slot_duration_minutes)
            .map_err(RpcFailure::validation)?;
        if count > MAX_SLOTS_PER_REQUEST {
            return Err(RpcFailure::invalid_params(format!(
                "range produces {count} slots, limit is {MAX_SLOTS_PER_REQUEST}"
            )));
        }
        let windows = plan_slots(slot.start, slot.end, args.slot_duration_minutes)
            .map_err(RpcFailure::validation)?;

        let mut inputs = Vec::with_capacity(windows.len());
        for window in windows {
            let weather = self.fetch_weather(ForecastRequest::window(
                slot.site_id.clone(),
                window.start,
                window.end,
            ))?;
            inputs.push((window, with_surface_override(weather, args.runway_surface)));
        }

        let evaluations = evaluate_windows(&self.flyability, &inputs, &slot.pilot, &slot.aircraft)
            .map_err(RpcFailure::validation)?;
        for evaluation in &evaluations {
            self.record_status(evaluation.status);
        }

        let slots = evaluations
            .iter()
            .map(|e| {
                json!({
                    "start": e.start,
                    "end": e.end,
                    "status": e.status,
                    "score": e.score,
                    "reasons": e.reasons,
                    "reason_texts": e.reasons.iter().map(ToString::to_string).collect::<Vec<_>>()
                })
            })
            .collect::<Vec<_>>();
        Ok(json!({
            "site_id": slot.site_id,
            "count": slots.len(),
            "slots": slots
        }))
    }

    fn handle_legality_check(&self, params: Value) -> RpcResult {
        let args: LegalityParams = parse_params(params)?;
        let date = args.date.unwrap_or_else(|| Local::now().date_naive());
        let result = match &args.aircraft {
            Some(aircraft) => self
                .aircraft_legality
                .evaluate(&args.pilot, Some(aircraft), date),
            None => self.pilot_legality.evaluate(&args.pilot, None, date),
        }
        .map_err(RpcFailure::validation)?;
        self.record_legality(result.legal);

        Ok(json!({
            "legal": result.legal,
            "reason": result.reason,
            "rule": result.rule,
            "date": date
        }))
    }

    fn handle_club_score(&self, params: Value) -> RpcResult {
        let metrics: ClubMetrics = parse_params(params)?;
        serde_json::to_value(compute_club_operational_score(&metrics))
            .map_err(|e| RpcFailure::internal(&e))
    }

    fn record_method(&self, method: &str, latency: Duration, is_error: bool) {
        let mut locked = match self.metrics.lock() {
            Ok(v) => v,
            Err(_) => return,
        };
        let latency_ms = latency.as_secs_f64() * 1000.0;
        let metric = locked.methods.entry(method.to_string()).or_default();
        if is_error {
            metric.err = metric.err.saturating_add(1);
        } else {
            metric.ok = metric.ok.saturating_add(1);
        }
        metric.total_latency_ms += latency_ms;
        metric.max_latency_ms = metric.max_latency_ms.max(latency_ms);
    }

    fn record_status(&self, status: FlyabilityStatus) {
        if let Ok(mut locked) = self.metrics.lock() {
            let count = locked.statuses.entry(status.as_str()).or_default();
            *count = count.saturating_add(1);
        }
    }

    fn record_legality(&self, legal: bool) {
        if let Ok(mut locked) = self.metrics.lock() {
            if legal {
                locked.legal = locked.legal.saturating_add(1);
            } else {
                locked.illegal = locked.illegal.saturating_add(1);
            }
        }
    }

    fn record_provider_failure(&self) {
        if let Ok(mut locked) = self.metrics.lock() {
            locked.provider_failures = locked.provider_failures.saturating_add(1);
        }
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn render_metrics_summary(&self) -> Value {
        let locked = match self.metrics.lock() {
            Ok(v) => v,
            Err(_) => {
                return json!({
                    "status": "error",
                    "message": "metrics lock poisoned"
                })
            }
        };

        let (total_calls, total_errors) = locked
            .methods
            .values()
            .fold((0_u64, 0_u64), |acc, m| (acc.0 + m.ok + m.err, acc.1 + m.err));
        let error_ratio = if total_calls == 0 {
            0.0
        } else {
            total_errors as f64 / total_calls as f64
        };

        let methods = locked
            .methods
            .iter()
            .map(|(name, m)| {
                let calls = m.ok + m.err;
                let avg = if calls == 0 {
                    0.0
                } else {
                    m.total_latency_ms / calls as f64
                };
                (
                    name.clone(),
                    json!({
                        "ok": m.ok,
                        "err": m.err,
                        "avg_latency_ms": avg,
                        "max_latency_ms": m.max_latency_ms
                    }),
                )
            })
            .collect::<serde_json::Map<_, _>>();

        json!({
            "status": "ok",
            "weather_provider": self.weather.name(),
            "rpc": {
                "calls": total_calls,
                "errors": total_errors,
                "error_ratio": error_ratio,
                "methods": methods
            },
            "flyability": locked.statuses,
            "legality": {"legal": locked.legal, "illegal": locked.illegal},
            "provider_failures": locked.provider_failures
        })
    }

    pub fn serve_stdio(&self) -> io::Result<()> {
        let stdin = io::stdin();
        self.serve_io(stdin.lock(), io::stdout())
    }

    /// Answers requests from `reader` until EOF. Each request may be a bare
    /// JSON line or a `Content-Length` framed body; the answer uses the same
    /// framing.
    pub fn serve_io<R: BufRead, W: Write>(&self, mut reader: R, mut writer: W) -> io::Result<()> {
        let mut line = String::new();

        loop {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                break;
            }

            let trimmed = line.trim_end_matches(['\r', '\n']).trim_start();
            if trimmed.is_empty() {
                continue;
            }

            let (payload, frame) = if is_header_line(trimmed) {
                match read_stdio_frame(&mut reader, trimmed) {
                    Ok(body) => (body, StdioFrame::ContentLength),
                    Err(err) => {
                        warn!(error = %err, "rejected stdio frame");
                        let response = JsonRpcResponse::error(
                            Value::Null,
                            PARSE_ERROR,
                            format!("invalid stdio frame: {err}"),
                        );
                        write_stdio_response(&mut writer, &response, StdioFrame::ContentLength)?;
                        continue;
                    }
                }
            } else {
                (trimmed.as_bytes().to_vec(), StdioFrame::LineDelimited)
            };

            let response = match serde_json::from_slice::<JsonRpcRequest>(&payload) {
                Ok(request) => self.handle_request(request),
                Err(err) => Some(JsonRpcResponse::error(
                    Value::Null,
                    PARSE_ERROR,
                    format!("parse error: {err}"),
                )),
            };
            if let Some(response) = response {
                write_stdio_response(&mut writer, &response, frame)?;
            }
        }

        Ok(())
    }

    pub fn serve_http(&self, addr: &str) -> io::Result<()> {
        let listener = TcpListener::bind(addr)?;
        info!(
            addr = %listener.local_addr()?,
            provider = self.weather.name(),
            "clearslot http listening"
        );
        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    if let Err(err) = self.handle_http_connection(stream) {
                        warn!(error = %err, "http request error");
                    }
                }
                Err(err) => {
                    warn!(error = %err, "http accept error");
                }
            }
        }
        Ok(())
    }

    fn handle_http_connection(&self, mut stream: TcpStream) -> io::Result<()> {
        let mut reader = io::BufReader::new(stream.try_clone()?);
        let response = match read_http_request(&mut reader)? {
            HttpInbound::Closed => return Ok(()),
            HttpInbound::Request(req) => self.dispatch_http_request(&req),
            HttpInbound::Rejected(response) => {
                warn!(status = response.status, "rejected http request");
                response
            }
        };
        write_http_response(&mut stream, &response)
    }

    fn dispatch_http_request(&self, req: &HttpRequest) -> HttpResponse {
        match (req.method.as_str(), req.path.as_str()) {
            ("GET", "/health") => HttpResponse::json(200, &json!({"status": "ok"})),
            ("GET", "/metrics/summary") => {
                HttpResponse::json(200, &self.render_metrics_summary())
            }
            ("POST", "/rpc" | "/") => self.dispatch_rpc_body(&req.body),
            ("POST", _) => HttpResponse::json(
                404,
                &json!({"error": "not_found", "message": "use POST /rpc"}),
            ),
            _ => HttpResponse::json(
                405,
                &json!({
                    "error": "method_not_allowed",
                    "message": "supported endpoints: GET /health, GET /metrics/summary, POST /rpc"
                }),
            ),
        }
    }

    fn dispatch_rpc_body(&self, body: &[u8]) -> HttpResponse {
        let rpc: JsonRpcRequest = match serde_json::from_slice(body) {
            Ok(v) => v,
            Err(err) => {
                let response =
                    JsonRpcResponse::error(Value::Null, PARSE_ERROR, format!("parse error: {err}"));
                return HttpResponse::rpc(400, &response);
            }
        };
        match self.handle_request(rpc) {
            Some(response) => HttpResponse::rpc(200, &response),
            None => HttpResponse::no_content(),
        }
    }
}

fn with_surface_override(
    weather: WeatherSnapshot,
    surface: Option<RunwaySurface>,
) -> WeatherSnapshot {
    match surface {
        Some(surface) => weather.with_surface(surface),
        None => weather,
    }
}

fn parse_params<T: DeserializeOwned>(params: Value) -> Result<T, RpcFailure> {
    if params.is_null() {
        return Err(RpcFailure::invalid_params("missing params"));
    }
    serde_json::from_value(params)
        .map_err(|err| RpcFailure::invalid_params(format!("invalid params: {err}")))
}

/// Headers and body of one `Content-Length` frame whose first header line
/// has already been read. A refused body is skipped so the stream stays
/// aligned on frame boundaries.
fn read_stdio_frame<R: BufRead>(
    reader: &mut R,
    first_line: &str,
) -> Result<Vec<u8>, FrameError> {
    let declared =
        read_headers(reader, content_length(first_line))?.ok_or(FrameError::MissingLength)?;
    match read_body(reader, declared) {
        Err(err @ FrameError::TooLarge { .. }) => {
            discard_body(reader, declared)?;
            Err(err)
        }
        other => other,
    }
}
