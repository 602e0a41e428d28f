//! Minimal HTTP surface for the converter.
//!
//! One thread per connection over a plain `TcpListener`; requests never share
//! state, so there is nothing to lock. Both routes convert with
//! [`EmbedOptions::default`] — callers cannot customize the output here.
//!
//! Set `MXEMBED_HTTP_LOG=1` to log a line per request to stderr.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::OnceLock;
use std::time::Duration;

use mxembed::{DiagramFile, EmbedOptions, render_embed_html};

const READ_TIMEOUT: Duration = Duration::from_secs(15);

/// Deadline for the whole outbound fetch on the GET route, so a stalled
/// remote cannot pin a handler thread forever.
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Cap on the fetched response body (10 MiB).
const MAX_FETCH_BYTES: u64 = 10 * 1024 * 1024;

/// Cap on inbound request headers (1 MiB).
const MAX_HEADER_BYTES: usize = 1024 * 1024;

const TEXT_HTML: &str = "text/html";
const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

struct HttpRequest {
    method: String,
    path: String,
    body: Vec<u8>,
}

fn http_log_enabled() -> bool {
    static ENABLED: OnceLock<bool> = OnceLock::new();
    *ENABLED.get_or_init(|| {
        matches!(
            std::env::var("MXEMBED_HTTP_LOG").as_deref(),
            Ok("1") | Ok("true")
        )
    })
}

/// Binds `0.0.0.0:<port>` and serves until the process exits.
///
/// Only the bind itself can fail; per-request errors are reported to stderr
/// and the accept loop keeps going. Port `0` binds an ephemeral port — the
/// banner line carries the actual address.
pub fn serve(port: u16) -> std::io::Result<()> {
    let listener = TcpListener::bind(("0.0.0.0", port))?;
    let addr = listener.local_addr()?;
    println!("listening on http://{addr}");

    for incoming in listener.incoming() {
        let mut stream = match incoming {
            Ok(stream) => stream,
            Err(err) => {
                eprintln!("accept error: {err}");
                continue;
            }
        };
        std::thread::spawn(move || {
            if let Err(err) = stream.set_read_timeout(Some(READ_TIMEOUT)) {
                eprintln!("set read timeout failed: {err}");
            }
            if let Err(err) = handle_connection(&mut stream) {
                eprintln!("request error: {err}");
            }
        });
    }

    Ok(())
}

fn handle_connection(stream: &mut TcpStream) -> Result<(), String> {
    let req = read_http_request(stream)?;
    if http_log_enabled() {
        eprintln!(
            "[http] {} {} body_bytes={}",
            req.method,
            req.path,
            req.body.len()
        );
    }

    let path = req.path.split('?').next().unwrap_or(&req.path);
    match (req.method.as_str(), path) {
        ("GET", "/convert") => convert_get(stream, &req.path),
        ("POST", "/convert") => convert_post(stream, &req.body),
        (_, "/convert") => write_http_response(
            stream,
            "405 Method Not Allowed",
            TEXT_PLAIN,
            b"method not allowed\n",
        ),
        _ => write_http_response(stream, "404 Not Found", TEXT_PLAIN, b"not found\n"),
    }
}

fn convert_get(stream: &mut TcpStream, raw_path: &str) -> Result<(), String> {
    let query = raw_path.splitn(2, '?').nth(1).unwrap_or("");
    let Some(file_uri) = query_param(query, "fileUri") else {
        return write_http_response(
            stream,
            "400 Bad Request",
            TEXT_PLAIN,
            b"fileUri parameter is required\n",
        );
    };

    let xml = match fetch_text(&file_uri) {
        Ok(xml) => xml,
        Err(err) => {
            return write_http_response(
                stream,
                "500 Internal Server Error",
                TEXT_PLAIN,
                format!("failed to fetch {file_uri}: {err}\n").as_bytes(),
            );
        }
    };

    // No well-formedness gate on this route; the fetched content is embedded
    // verbatim.
    respond_with_embed(stream, &xml)
}

fn convert_post(stream: &mut TcpStream, body: &[u8]) -> Result<(), String> {
    let Ok(text) = std::str::from_utf8(body) else {
        return write_http_response(
            stream,
            "400 Bad Request",
            TEXT_PLAIN,
            b"request body is not valid UTF-8\n",
        );
    };

    if let Err(err) = DiagramFile::parse(text) {
        return write_http_response(
            stream,
            "400 Bad Request",
            TEXT_PLAIN,
            format!("invalid diagram file: {err}\n").as_bytes(),
        );
    }

    respond_with_embed(stream, text)
}

fn respond_with_embed(stream: &mut TcpStream, xml: &str) -> Result<(), String> {
    match render_embed_html(xml, &EmbedOptions::default()) {
        Ok(html) => write_http_response(stream, "200 OK", TEXT_HTML, html.as_bytes()),
        Err(err) => write_http_response(
            stream,
            "500 Internal Server Error",
            TEXT_PLAIN,
            format!("conversion failed: {err}\n").as_bytes(),
        ),
    }
}

fn query_param(query: &str, name: &str) -> Option<String> {
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        if key == name {
            return Some(value.into_owned());
        }
    }
    None
}

fn fetch_agent() -> ureq::Agent {
    ureq::Agent::config_builder()
        .timeout_global(Some(FETCH_TIMEOUT))
        .build()
        .into()
}

/// Fetches `uri` and returns the response body as text. Connection errors,
/// timeouts and non-2xx statuses all surface as `Err`.
fn fetch_text(uri: &str) -> Result<String, String> {
    fetch_agent()
        .get(uri)
        .header("User-Agent", "mxembed")
        .call()
        .map_err(|e| e.to_string())?
        .into_body()
        .with_config()
        .limit(MAX_FETCH_BYTES)
        .read_to_string()
        .map_err(|e| e.to_string())
}

fn read_http_request(stream: &mut TcpStream) -> Result<HttpRequest, String> {
    let mut buf = Vec::with_capacity(4096);
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        if let Some(idx) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break idx;
        }
        if buf.len() > MAX_HEADER_BYTES {
            return Err("request header too large".to_string());
        }
        let n = stream.read(&mut chunk).map_err(|e| e.to_string())?;
        if n == 0 {
            return Err("connection closed mid-request".to_string());
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let header = String::from_utf8_lossy(&buf[..header_end]).into_owned();
    let mut lines = header.split("\r\n");
    let request_line = lines
        .next()
        .ok_or_else(|| "missing request line".to_string())?;
    let mut parts = request_line.split_whitespace();
    let method = parts
        .next()
        .ok_or_else(|| "missing method".to_string())?
        .to_string();
    let path = parts
        .next()
        .ok_or_else(|| "missing request path".to_string())?
        .to_string();

    let mut content_length = 0usize;
    for line in lines {
        if let Some((key, value)) = line.split_once(':') {
            if key.trim().eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().unwrap_or(0);
            }
        }
    }

    let mut body = buf[(header_end + 4).min(buf.len())..].to_vec();
    while body.len() < content_length {
        let n = stream.read(&mut chunk).map_err(|e| e.to_string())?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }
    body.truncate(content_length);

    Ok(HttpRequest { method, path, body })
}

fn write_http_response(
    stream: &mut TcpStream,
    status: &str,
    content_type: &str,
    body: &[u8],
) -> Result<(), String> {
    let header = format!(
        "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );
    stream
        .write_all(header.as_bytes())
        .map_err(|e| e.to_string())?;
    stream.write_all(body).map_err(|e| e.to_string())
}
