//! Minimal HTTP/1.1 server for fetcher integration tests.
//!
//! Serves a single static body for any GET path except `/missing...`,
//! which answers 404, and `/chunked...`, which streams the body in
//! `Transfer-Encoding: chunked` pieces of [`CHUNK`] bytes, [`CHUNK_DELAY`]
//! apart, with no Content-Length. Runs until the process exits.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

pub const CHUNK: usize = 1024;
pub const CHUNK_DELAY: Duration = Duration::from_millis(100);

/// Starts a server in a background thread and returns its base URL
/// (e.g. "http://127.0.0.1:12345/").
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
    format!("http://127.0.0.1:{}/", port)
}

fn handle(mut stream: TcpStream, body: &[u8]) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let (method, path) = parse_request_line(request);
    if !method.eq_ignore_ascii_case("GET") {
        let _ = stream.write_all(b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\n\r\n");
        return;
    }
    if path.starts_with("/missing") {
        let _ = stream.write_all(b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n\r\n");
        return;
    }
    if path.starts_with("/chunked") {
        write_chunked(&mut stream, body);
        return;
    }
    let header = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: video/mp4\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );
    let _ = stream.write_all(header.as_bytes());
    let _ = stream.write_all(body);
}

fn write_chunked(stream: &mut TcpStream, body: &[u8]) {
    let header = "HTTP/1.1 200 OK\r\nContent-Type: video/mp4\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n";
    if stream.write_all(header.as_bytes()).is_err() {
        return;
    }
    for piece in body.chunks(CHUNK) {
        let framed = format!("{:x}\r\n", piece.len());
        if stream.write_all(framed.as_bytes()).is_err()
            || stream.write_all(piece).is_err()
            || stream.write_all(b"\r\n").is_err()
            || stream.flush().is_err()
        {
            return;
        }
        thread::sleep(CHUNK_DELAY);
    }
    let _ = stream.write_all(b"0\r\n\r\n");
}

/// Returns (method, path) from the request line.
fn parse_request_line(request: &str) -> (&str, &str) {
    let line = request.lines().next().unwrap_or("");
    let mut parts = line.split_whitespace();
    let method = parts.next().unwrap_or("");
    let path = parts.next().unwrap_or("/");
    (method, path)
}
