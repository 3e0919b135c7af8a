//! Minimal HTTP/1.1 server for integration tests.
//!
//! One request per connection (`Connection: close`). Routes:
//! - `/body`: 200 with the configured body, `Content-Type: text/plain` and two
//!   `X-Dup` headers; honours `Range: bytes=X-Y` with 206.
//! - `/redirect`: 302 to `/body`.
//! - `/status/<code>`: that status with a short body.
//! - `/echo-headers`: the raw request head as the body.
//! - `/echo-body`: the request body (Content-Length framed) as the body.
//! - `/slow`: the body in 1 KiB chunks with a pause between them.
//!
//! HEAD gets the same headers as GET and no body.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Starts a server in a background thread serving `body`. Returns the base URL
/// without a trailing slash (e.g. "http://127.0.0.1:12345"). The server runs
/// until the process exits.
pub fn start(body: Vec<u8>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let body = Arc::new(body);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let body = Arc::clone(&body);
            thread::spawn(move || handle(stream, &body));
        }
    });
    format!("http://127.0.0.1:{}", port)
}

struct Request {
    method: String,
    path: String,
    head: String,
    range: Option<(u64, u64)>,
    body: Vec<u8>,
}

fn handle(mut stream: TcpStream, body: &[u8]) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let Some(req) = read_request(&mut stream) else {
        return;
    };
    let head_only = req.method.eq_ignore_ascii_case("HEAD");

    match req.path.as_str() {
        "/body" => serve_body(&mut stream, &req, body, head_only),
        "/redirect" => {
            respond(&mut stream, "302 Found", &["Location: /body"], b"", head_only);
        }
        "/echo-headers" => {
            respond(&mut stream, "200 OK", &[], req.head.as_bytes(), head_only);
        }
        "/echo-body" => {
            respond(&mut stream, "200 OK", &[], &req.body, head_only);
        }
        "/slow" => serve_slow(&mut stream, body),
        path => {
            let status = path
                .strip_prefix("/status/")
                .and_then(|c| c.parse::<u16>().ok())
                .map(|c| format!("{} Test", c))
                .unwrap_or_else(|| "404 Not Found".to_string());
            respond(&mut stream, &status, &[], b"status body", head_only);
        }
    }
}

fn serve_body(stream: &mut TcpStream, req: &Request, body: &[u8], head_only: bool) {
    let total = body.len() as u64;
    let mut extra = vec![
        "Content-Type: text/plain".to_string(),
        "X-Dup: first".to_string(),
        "X-Dup: second".to_string(),
        "Accept-Ranges: bytes".to_string(),
    ];
    let (status, slice) = match req.range {
        Some((start, end_incl)) => {
            let end_incl = end_incl.min(total.saturating_sub(1));
            if start > end_incl {
                extra.push(format!("Content-Range: bytes */{}", total));
                ("416 Range Not Satisfiable", &body[0..0])
            } else {
                extra.push(format!("Content-Range: bytes {}-{}/{}", start, end_incl, total));
                ("206 Partial Content", &body[start as usize..=end_incl as usize])
            }
        }
        None => ("200 OK", body),
    };
    let extra: Vec<&str> = extra.iter().map(String::as_str).collect();
    respond(stream, status, &extra, slice, head_only);
}

fn serve_slow(stream: &mut TcpStream, body: &[u8]) {
    let head = format!(
        "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );
    if stream.write_all(head.as_bytes()).is_err() {
        return;
    }
    for chunk in body.chunks(1024) {
        if stream.write_all(chunk).is_err() {
            return;
        }
        let _ = stream.flush();
        thread::sleep(Duration::from_millis(50));
    }
}

fn respond(stream: &mut TcpStream, status: &str, headers: &[&str], body: &[u8], head_only: bool) {
    let mut response = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n",
        status,
        body.len()
    );
    for h in headers {
        response.push_str(h);
        response.push_str("\r\n");
    }
    response.push_str("\r\n");
    let _ = stream.write_all(response.as_bytes());
    if !head_only {
        let _ = stream.write_all(body);
    }
}

fn read_request(stream: &mut TcpStream) -> Option<Request> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let head_end = loop {
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos + 4;
        }
        let n = stream.read(&mut chunk).ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    };
    let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();
    let mut lines = head.lines();
    let mut first = lines.next()?.split_whitespace();
    let method = first.next()?.to_string();
    let path = first.next()?.to_string();

    let mut range = None;
    let mut content_length = 0usize;
    for line in lines {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        if name.trim().eq_ignore_ascii_case("range") {
            range = parse_range(value);
        } else if name.trim().eq_ignore_ascii_case("content-length") {
            content_length = value.parse().unwrap_or(0);
        }
    }

    let mut body = buf[head_end..].to_vec();
    while body.len() < content_length {
        let n = stream.read(&mut chunk).ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }
    body.truncate(content_length);

    Some(Request {
        method,
        path,
        head,
        range,
        body,
    })
}

/// Parses `bytes=X-Y` or `bytes=X-` into (start, end_inclusive).
fn parse_range(value: &str) -> Option<(u64, u64)> {
    let part = value.strip_prefix("bytes=")?;
    let (a, b) = part.split_once('-')?;
    let start = a.trim().parse::<u64>().ok()?;
    let end = b.trim();
    let end_incl = if end.is_empty() {
        u64::MAX
    } else {
        end.parse::<u64>().ok()?
    };
    Some((start, end_incl))
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
