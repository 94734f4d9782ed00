//! Minimal HTTP/1.1 object server for integration tests.
//!
//! Serves a fixed set of objects at `/{bucket}/{key}`. HEAD returns size and
//! ETag; GET honours open-ended `Range: bytes=N-` with 206, or 416 when N is
//! at or past the end. Unknown paths get 404. Options can drop the HEAD
//! `Content-Length` or stall a GET partway through its body.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct ObjectServerOptions {
    /// If false, GET ignores Range and always returns 200 with the full body.
    pub support_ranges: bool,
    /// If true, HEAD responses omit `Content-Length`.
    pub head_without_length: bool,
    /// Send only this many body bytes on GET, then hold the connection open.
    pub stall_after: Option<usize>,
}

impl Default for ObjectServerOptions {
    fn default() -> Self {
        Self {
            support_ranges: true,
            head_without_length: false,
            stall_after: None,
        }
    }
}

pub struct ObjectServer {
    /// Base URL, e.g. "http://127.0.0.1:12345/".
    pub endpoint: String,
    gets: Arc<AtomicUsize>,
}

impl ObjectServer {
    /// Number of GET requests served so far.
    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }
}

/// Serve `objects` (keyed by "bucket/key") in a background thread until the process exits.
pub fn start(objects: &[(&str, Vec<u8>)]) -> ObjectServer {
    start_with_options(objects, ObjectServerOptions::default())
}

pub fn start_with_options(objects: &[(&str, Vec<u8>)], opts: ObjectServerOptions) -> ObjectServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let objects: Arc<HashMap<String, Vec<u8>>> = Arc::new(
        objects
            .iter()
            .map(|(path, body)| (format!("/{path}"), body.clone()))
            .collect(),
    );
    let gets = Arc::new(AtomicUsize::new(0));
    let gets_srv = Arc::clone(&gets);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let objects = Arc::clone(&objects);
            let gets = Arc::clone(&gets_srv);
            thread::spawn(move || handle(stream, &objects, &gets, opts));
        }
    });
    ObjectServer {
        endpoint: format!("http://127.0.0.1:{}/", port),
        gets,
    }
}

fn handle(
    mut stream: TcpStream,
    objects: &HashMap<String, Vec<u8>>,
    gets: &AtomicUsize,
    opts: ObjectServerOptions,
) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let Ok(request) = std::str::from_utf8(&buf[..n]) else {
        return;
    };
    let (method, path, range_start) = parse_request(request);

    let Some(body) = objects.get(path) else {
        let _ = stream
            .write_all(b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
        return;
    };
    let total = body.len() as u64;
    let etag = format!("\"etag-{}\"", total);

    if method.eq_ignore_ascii_case("HEAD") {
        let length = if opts.head_without_length {
            String::new()
        } else {
            format!("Content-Length: {}\r\n", total)
        };
        let response = format!(
            "HTTP/1.1 200 OK\r\n{}ETag: {}\r\nContent-Type: application/octet-stream\r\nAccept-Ranges: bytes\r\nConnection: close\r\n\r\n",
            length, etag
        );
        let _ = stream.write_all(response.as_bytes());
        return;
    }
    if !method.eq_ignore_ascii_case("GET") {
        let _ = stream.write_all(b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\n\r\n");
        return;
    }
    gets.fetch_add(1, Ordering::SeqCst);

    let (status, content_range, slice) = match range_start {
        Some(start) if opts.support_ranges => {
            if start >= total {
                ("416 Range Not Satisfiable", format!("bytes */{}", total), &body[0..0])
            } else {
                (
                    "206 Partial Content",
                    format!("bytes {}-{}/{}", start, total - 1, total),
                    &body[start as usize..],
                )
            }
        }
        _ => (
            "200 OK",
            format!("bytes 0-{}/{}", total.saturating_sub(1), total),
            &body[..],
        ),
    };
    let content_range = if status.starts_with("200") {
        String::new()
    } else {
        format!("Content-Range: {}\r\n", content_range)
    };
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\n{}ETag: {}\r\nConnection: close\r\n\r\n",
        status,
        slice.len(),
        content_range,
        etag
    );
    let _ = stream.write_all(response.as_bytes());
    match opts.stall_after {
        Some(n) => {
            let _ = stream.write_all(&slice[..n.min(slice.len())]);
            let _ = stream.flush();
            thread::sleep(Duration::from_secs(60));
        }
        None => {
            let _ = stream.write_all(slice);
        }
    }
}

/// Returns (method, path, optional start of `Range: bytes=N-`).
fn parse_request(request: &str) -> (&str, &str, Option<u64>) {
    let mut method = "";
    let mut path = "";
    let mut range = None;
    for line in request.lines() {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if method.is_empty() {
            let mut parts = line.split_whitespace();
            method = parts.next().unwrap_or("");
            path = parts.next().unwrap_or("");
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("range") {
                let value = value.trim();
                if let Some(ranges) = value.strip_prefix("bytes=") {
                    if let Some((start, _)) = ranges.split_once('-') {
                        range = start.trim().parse::<u64>().ok();
                    }
                }
            }
        }
    }
    (method, path, range)
}
