pub mod http_server;

use std::sync::{Arc, Mutex};

use scurl_core::Easy;

/// Installs a write callback that appends into the returned buffer.
pub fn collect_body(easy: &mut Easy) -> Arc<Mutex<Vec<u8>>> {
    let body = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&body);
    easy.write_function(move |data| {
        sink.lock().unwrap().extend_from_slice(data);
        Ok(data.len())
    })
    .unwrap();
    body
}

/// The test body served at `/body`: 64 KiB of a repeating byte pattern.
pub fn pattern_body() -> Vec<u8> {
    (0u8..100).cycle().take(64 * 1024).collect()
}
