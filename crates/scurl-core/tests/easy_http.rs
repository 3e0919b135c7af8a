//! Integration tests: single easy transfers against a loopback HTTP server.

mod common;

use std::net::TcpListener;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::{collect_body, http_server, pattern_body};
use scurl_core::{Easy, InfoType, Origin};

#[test]
fn get_body_and_info() {
    let body = pattern_body();
    let base = http_server::start(body.clone());
    let url = format!("{base}/body");

    let mut easy = Easy::new().unwrap();
    easy.url(&url).unwrap();
    let out = collect_body(&mut easy);
    easy.perform().unwrap();

    assert_eq!(*out.lock().unwrap(), body);
    assert_eq!(easy.response_code().unwrap(), 200);
    assert_eq!(easy.effective_url().unwrap().as_deref(), Some(url.as_str()));
}

#[test]
fn header_lookup_after_transfer() {
    let base = http_server::start(b"hi".to_vec());
    let mut easy = Easy::new().unwrap();
    easy.url(&format!("{base}/body")).unwrap();
    let _out = collect_body(&mut easy);
    easy.perform().unwrap();

    let ct = easy.header("content-type").unwrap();
    assert_eq!(ct.value, "text/plain");
    assert_eq!(ct.amount, 1);
    assert_eq!(ct.origin, Origin::HEADER);

    let second = easy.header_at("X-Dup", 1, Origin::HEADER, -1).unwrap();
    assert_eq!(second.value, "second");
    assert_eq!(second.amount, 2);
    assert_eq!(second.index, 1);

    assert!(easy.header_at("X-Dup", 2, Origin::HEADER, -1).is_err());
    assert!(easy.header("X-Not-There").unwrap_err().is_header_missing());

    let all = easy.headers(Origin::HEADER, -1);
    let names: Vec<&str> = all.iter().map(|h| h.name.as_str()).collect();
    assert!(names.contains(&"Content-Type"));
    assert_eq!(names.iter().filter(|n| **n == "X-Dup").count(), 2);
}

#[test]
fn redirects_follow_or_stop() {
    let base = http_server::start(b"target".to_vec());

    let mut easy = Easy::new().unwrap();
    easy.url(&format!("{base}/redirect")).unwrap();
    easy.follow_location(true).unwrap();
    easy.max_redirections(3).unwrap();
    let out = collect_body(&mut easy);
    easy.perform().unwrap();
    assert_eq!(&*out.lock().unwrap(), b"target");
    assert_eq!(easy.response_code().unwrap(), 200);
    assert!(easy.effective_url().unwrap().unwrap().ends_with("/body"));
    // The first request in the chain carried the Location header.
    let location = easy.header_at("Location", 0, Origin::HEADER, 0).unwrap();
    assert_eq!(location.value, "/body");

    let mut easy = Easy::new().unwrap();
    easy.url(&format!("{base}/redirect")).unwrap();
    easy.follow_location(false).unwrap();
    let _out = collect_body(&mut easy);
    easy.perform().unwrap();
    assert_eq!(easy.response_code().unwrap(), 302);
}

#[test]
fn custom_headers_and_user_agent_are_sent() {
    let base = http_server::start(Vec::new());
    let mut easy = Easy::new().unwrap();
    easy.url(&format!("{base}/echo-headers")).unwrap();
    easy.http_headers(&["X-Custom: yes", "X-Other: 2"]).unwrap();
    easy.user_agent("scurl-it/1").unwrap();
    let out = collect_body(&mut easy);
    easy.perform().unwrap();

    let head = String::from_utf8(out.lock().unwrap().clone()).unwrap();
    assert!(head.starts_with("GET /echo-headers HTTP/1.1"), "{head}");
    assert!(head.contains("X-Custom: yes"));
    assert!(head.contains("X-Other: 2"));
    assert!(head.contains("User-Agent: scurl-it/1"));
}

#[test]
fn fail_on_error_maps_http_status() {
    let base = http_server::start(Vec::new());
    let mut easy = Easy::new().unwrap();
    easy.url(&format!("{base}/status/404")).unwrap();
    easy.fail_on_error(true).unwrap();
    let _out = collect_body(&mut easy);
    let err = easy.perform().unwrap_err();
    assert!(err.is_http_returned_error(), "{err}");
    assert_eq!(easy.response_code().unwrap(), 404);
}

#[test]
fn post_body_is_copied() {
    let base = http_server::start(Vec::new());
    let mut easy = Easy::new().unwrap();
    easy.url(&format!("{base}/echo-body")).unwrap();
    {
        let data = b"field=value&n=1".to_vec();
        easy.post_fields_copy(&data).unwrap();
    }
    let out = collect_body(&mut easy);
    easy.perform().unwrap();
    assert_eq!(&*out.lock().unwrap(), b"field=value&n=1");
}

#[test]
fn range_request_returns_partial_content() {
    let body = pattern_body();
    let base = http_server::start(body.clone());
    let mut easy = Easy::new().unwrap();
    easy.url(&format!("{base}/body")).unwrap();
    easy.range("10-19").unwrap();
    let out = collect_body(&mut easy);
    easy.perform().unwrap();
    assert_eq!(easy.response_code().unwrap(), 206);
    assert_eq!(&*out.lock().unwrap(), &body[10..20]);
}

#[test]
fn nobody_sends_head() {
    let base = http_server::start(pattern_body());
    let mut easy = Easy::new().unwrap();
    easy.url(&format!("{base}/body")).unwrap();
    easy.nobody(true).unwrap();
    let out = collect_body(&mut easy);
    easy.perform().unwrap();
    assert!(out.lock().unwrap().is_empty());
    assert_eq!(easy.header("Content-Length").unwrap().value, "65536");
}

#[test]
fn header_callback_sees_every_line() {
    let base = http_server::start(b"x".to_vec());
    let lines = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&lines);

    let mut easy = Easy::new().unwrap();
    easy.url(&format!("{base}/body")).unwrap();
    let _out = collect_body(&mut easy);
    easy.header_function(move |line| {
        sink.lock()
            .unwrap()
            .push(String::from_utf8_lossy(line).trim_end().to_string());
        true
    })
    .unwrap();
    easy.perform().unwrap();

    let lines = lines.lock().unwrap();
    assert_eq!(lines.first().map(String::as_str), Some("HTTP/1.1 200 OK"));
    assert!(lines.iter().any(|l| l == "Content-Type: text/plain"));
    assert_eq!(lines.last().map(String::as_str), Some(""));
}

#[test]
fn rejecting_header_callback_fails_transfer() {
    let base = http_server::start(b"x".to_vec());
    let mut easy = Easy::new().unwrap();
    easy.url(&format!("{base}/body")).unwrap();
    let _out = collect_body(&mut easy);
    easy.header_function(|_| false).unwrap();
    assert!(easy.perform().unwrap_err().is_write_error());
}

#[test]
fn panicking_header_callback_fails_transfer() {
    let base = http_server::start(b"x".to_vec());
    let mut easy = Easy::new().unwrap();
    easy.url(&format!("{base}/body")).unwrap();
    let out = collect_body(&mut easy);
    easy.header_function(|_| panic!("header parser exploded")).unwrap();
    assert!(easy.perform().unwrap_err().is_write_error());
    assert!(out.lock().unwrap().is_empty());
}

#[test]
fn panicking_progress_callback_aborts() {
    let base = http_server::start(pattern_body());
    let mut easy = Easy::new().unwrap();
    easy.url(&format!("{base}/slow")).unwrap();
    let _out = collect_body(&mut easy);
    easy.progress_function(|_| panic!("meter exploded")).unwrap();
    let err = easy.perform().unwrap_err();
    assert!(err.is_aborted_by_callback(), "{err}");
}

#[test]
fn panicking_read_callback_aborts_put() {
    let base = http_server::start(Vec::new());
    let mut easy = Easy::new().unwrap();
    easy.url(&format!("{base}/echo-body")).unwrap();
    easy.upload(true).unwrap();
    easy.in_filesize(16).unwrap();
    let _out = collect_body(&mut easy);
    easy.read_function(|_| panic!("source exploded")).unwrap();
    let err = easy.perform().unwrap_err();
    assert!(err.is_aborted_by_callback(), "{err}");
}

#[test]
fn progress_callback_can_abort() {
    let base = http_server::start(pattern_body());
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);

    let mut easy = Easy::new().unwrap();
    easy.url(&format!("{base}/slow")).unwrap();
    let _out = collect_body(&mut easy);
    easy.progress_function(move |p| {
        seen.fetch_add(1, Ordering::SeqCst);
        p.dlnow < 4096
    })
    .unwrap();
    let err = easy.perform().unwrap_err();
    assert!(err.is_aborted_by_callback(), "{err}");
    assert!(calls.load(Ordering::SeqCst) > 0);
}

#[test]
fn slow_transfer_times_out() {
    let base = http_server::start(pattern_body());
    let mut easy = Easy::new().unwrap();
    easy.url(&format!("{base}/slow")).unwrap();
    easy.timeout(Duration::from_millis(200)).unwrap();
    let _out = collect_body(&mut easy);
    let err = easy.perform().unwrap_err();
    assert!(err.is_operation_timedout(), "{err}");
    assert!(err.extra_description().is_some());
}

#[test]
fn debug_callback_sees_request_headers() {
    let base = http_server::start(b"x".to_vec());
    let outgoing = Arc::new(Mutex::new(String::new()));
    let sink = Arc::clone(&outgoing);

    let mut easy = Easy::new().unwrap();
    easy.url(&format!("{base}/body")).unwrap();
    let _out = collect_body(&mut easy);
    easy.verbose(true).unwrap();
    easy.debug_function(move |kind, data| {
        if kind == InfoType::HeaderOut {
            sink.lock().unwrap().push_str(&String::from_utf8_lossy(data));
        }
    })
    .unwrap();
    easy.perform().unwrap();
    assert!(outgoing.lock().unwrap().starts_with("GET /body HTTP/1.1"));
}

#[test]
fn trace_to_log_does_not_disturb_transfer() {
    let base = http_server::start(b"logged".to_vec());
    let mut easy = Easy::new().unwrap();
    easy.url(&format!("{base}/body")).unwrap();
    easy.trace_to_log().unwrap();
    let out = collect_body(&mut easy);
    easy.perform().unwrap();
    assert_eq!(&*out.lock().unwrap(), b"logged");
}

#[test]
fn clone_keeps_options_and_header_list() {
    let base = http_server::start(Vec::new());
    let mut original = Easy::new().unwrap();
    original.url(&format!("{base}/echo-headers")).unwrap();
    original.http_headers(&["X-Cloned: kept"]).unwrap();

    let mut copy = original.try_clone().unwrap();
    drop(original);

    let out = collect_body(&mut copy);
    copy.perform().unwrap();
    let head = String::from_utf8(out.lock().unwrap().clone()).unwrap();
    assert!(head.contains("X-Cloned: kept"), "{head}");
}

#[test]
fn reset_forgets_headers() {
    let base = http_server::start(Vec::new());
    let url = format!("{base}/echo-headers");
    let mut easy = Easy::new().unwrap();
    easy.url(&url).unwrap();
    easy.http_headers(&["X-Before: reset"]).unwrap();
    easy.reset().unwrap();

    easy.url(&url).unwrap();
    let out = collect_body(&mut easy);
    easy.perform().unwrap();
    let head = String::from_utf8(out.lock().unwrap().clone()).unwrap();
    assert!(!head.contains("X-Before"), "{head}");
}

#[test]
fn refused_connection_is_reported() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let mut easy = Easy::new().unwrap();
    easy.url(&format!("http://127.0.0.1:{port}/")).unwrap();
    let _out = collect_body(&mut easy);
    let err = easy.perform().unwrap_err();
    assert!(err.is_couldnt_connect(), "{err}");
    assert!(err.to_string().contains(": "), "detail is appended: {err}");
}

#[test]
fn handle_moves_between_threads() {
    let base = http_server::start(b"threaded".to_vec());
    let mut easy = Easy::new().unwrap();
    easy.url(&format!("{base}/body")).unwrap();
    let out = collect_body(&mut easy);
    let done = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&done);
    std::thread::spawn(move || {
        easy.perform().unwrap();
        flag.store(true, Ordering::SeqCst);
    })
    .join()
    .unwrap();
    assert!(done.load(Ordering::SeqCst));
    assert_eq!(&*out.lock().unwrap(), b"threaded");
}
