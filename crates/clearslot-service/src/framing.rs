//! Wire framing for the stdio and HTTP transports.
//!
//! Both transports carry a header block terminated by a blank line, with the
//! body length taken from `Content-Length`. Bodies are read through
//! [`Read::take`] and never pre-allocated from the declared length, so a
//! peer cannot size our buffers.

use std::io::{self, BufRead, Read, Write};

use serde_json::Value;
use thiserror::Error;

use crate::protocol::JsonRpcResponse;

/// Largest request body accepted on either transport.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("missing content-length header")]
    MissingLength,
    #[error("declared body of {declared} bytes exceeds the {MAX_BODY_BYTES} byte limit")]
    TooLarge { declared: usize },
    #[error("body ended after {read} of {declared} bytes")]
    Truncated { read: usize, declared: usize },
    #[error("unexpected eof while reading frame headers")]
    HeadersEof,
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// How a stdio request arrived; the reply goes back the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdioFrame {
    LineDelimited,
    ContentLength,
}

pub fn is_header_line(line: &str) -> bool {
    ["content-length", "content-type"]
        .iter()
        .any(|name| header_named(line, name).is_some())
}

fn header_named<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    let (key, value) = line.split_once(':')?;
    key.trim().eq_ignore_ascii_case(name).then_some(value.trim())
}

/// `Some(n)` for a well-formed `Content-Length: n` line.
pub fn content_length(line: &str) -> Option<usize> {
    header_named(line, "content-length")?.parse().ok()
}

/// Consumes header lines up to and including the blank separator and returns
/// the last `Content-Length` seen, starting from `seen` for a header line the
/// caller already read.
pub fn read_headers<R: BufRead>(
    reader: &mut R,
    seen: Option<usize>,
) -> Result<Option<usize>, FrameError> {
    let mut length = seen;
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Err(FrameError::HeadersEof);
        }
        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed.is_empty() {
            return Ok(length);
        }
        if let Some(v) = content_length(trimmed) {
            length = Some(v);
        }
    }
}

fn limit_u64(len: usize) -> u64 {
    u64::try_from(len).unwrap_or(u64::MAX)
}

/// Reads exactly `declared` bytes, refusing anything over [`MAX_BODY_BYTES`]
/// before touching the stream.
pub fn read_body<R: Read>(reader: &mut R, declared: usize) -> Result<Vec<u8>, FrameError> {
    if declared > MAX_BODY_BYTES {
        return Err(FrameError::TooLarge { declared });
    }
    let mut body = Vec::new();
    reader.take(limit_u64(declared)).read_to_end(&mut body)?;
    if body.len() < declared {
        return Err(FrameError::Truncated {
            read: body.len(),
            declared,
        });
    }
    Ok(body)
}

/// Skips up to `declared` bytes of a refused body so the next frame starts
/// at a header line.
pub fn discard_body<R: Read>(reader: &mut R, declared: usize) -> io::Result<u64> {
    io::copy(&mut reader.take(limit_u64(declared)), &mut io::sink())
}

pub fn write_stdio_response<W: Write>(
    writer: &mut W,
    response: &JsonRpcResponse,
    frame: StdioFrame,
) -> io::Result<()> {
    let serialized = serde_json::to_vec(response)?;
    match frame {
        StdioFrame::LineDelimited => {
            writer.write_all(&serialized)?;
            writer.write_all(b"\n")?;
        }
        StdioFrame::ContentLength => {
            write!(writer, "Content-Length: {}\r\n\r\n", serialized.len())?;
            writer.write_all(&serialized)?;
        }
    }
    writer.flush()
}

pub struct HttpRequest {
    pub method: String,
    pub path: String,
    pub body: Vec<u8>,
}

pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn json(status: u16, value: &Value) -> Self {
        let body = serde_json::to_vec(value).unwrap_or_else(|_| b"{}".to_vec());
        Self { status, body }
    }

    pub fn rpc(status: u16, response: &JsonRpcResponse) -> Self {
        match serde_json::to_vec(response) {
            Ok(body) => Self { status, body },
            Err(_) => Self::json(
                500,
                &serde_json::json!({
                    "error": "internal_error",
                    "message": "failed to serialize rpc response"
                }),
            ),
        }
    }

    pub fn no_content() -> Self {
        Self {
            status: 204,
            body: Vec::new(),
        }
    }
}

/// Outcome of reading one HTTP request off a connection.
pub enum HttpInbound {
    Closed,
    Request(HttpRequest),
    Rejected(HttpResponse),
}

pub fn read_http_request<R: BufRead>(reader: &mut R) -> io::Result<HttpInbound> {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Ok(HttpInbound::Closed);
    }
    let first = line.trim_end_matches(['\r', '\n']);
    if first.is_empty() {
        return Ok(HttpInbound::Closed);
    }

    let mut parts = first.split_whitespace();
    let (Some(method), Some(target)) = (parts.next(), parts.next()) else {
        return Ok(HttpInbound::Rejected(bad_request("invalid http request line")));
    };
    let method = method.to_ascii_uppercase();
    let path = request_path(target).to_string();

    let declared = match read_headers(reader, None) {
        Ok(length) => length.unwrap_or(0),
        Err(FrameError::Io(err)) => return Err(err),
        Err(err) => return Ok(HttpInbound::Rejected(bad_request(&err.to_string()))),
    };
    match read_body(reader, declared) {
        Ok(body) => Ok(HttpInbound::Request(HttpRequest { method, path, body })),
        Err(err @ FrameError::TooLarge { .. }) => Ok(HttpInbound::Rejected(HttpResponse::json(
            413,
            &serde_json::json!({"error": "payload_too_large", "message": err.to_string()}),
        ))),
        Err(FrameError::Io(err)) => Err(err),
        Err(err) => Ok(HttpInbound::Rejected(bad_request(&err.to_string()))),
    }
}

fn bad_request(message: &str) -> HttpResponse {
    HttpResponse::json(400, &serde_json::json!({"error": "bad_request", "message": message}))
}

pub fn request_path(target: &str) -> &str {
    target.split_once('?').map_or(target, |(path, _)| path)
}

pub fn write_http_response<W: Write>(writer: &mut W, response: &HttpResponse) -> io::Result<()> {
    write!(
        writer,
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        response.status,
        reason_phrase(response.status),
        response.body.len()
    )?;
    writer.write_all(&response.body)?;
    writer.flush()
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        204 => "No Content",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        413 => "Payload Too Large",
        500 => "Internal Server Error",
        _ => "OK",
    }
}
