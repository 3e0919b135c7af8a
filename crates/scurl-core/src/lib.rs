//! Resource-safe wrappers over libcurl's easy, multi and header-list handles.

pub mod config;
pub mod logging;

pub mod easy;
pub mod error;
pub mod escape;
pub mod header;
pub mod multi;
pub mod slist;
pub mod sys;

mod handle;

pub use easy::{Easy, EasyId, InfoType, Progress, ReadError, WriteError};
pub use error::{Error, Result};
pub use escape::{escape, unescape, unescape_str};
pub use header::{Header, Origin};
pub use multi::{AttachedEasy, Done, Multi};
pub use slist::List;

/// Runs libcurl's global initialization once per process. Handle
/// constructors call this themselves.
pub fn init() {
    curl::init();
}

/// Version string of the linked libcurl, e.g. `"8.5.0"`.
pub fn version() -> String {
    curl::Version::get().version().to_string()
}

/// One line describing the linked libcurl and its TLS backend.
pub fn version_info() -> String {
    let v = curl::Version::get();
    let mut line = format!("libcurl/{}", v.version());
    if let Some(ssl) = v.ssl_version() {
        line.push(' ');
        line.push_str(ssl);
    }
    if let Some(z) = v.libz_version() {
        line.push_str(" zlib/");
        line.push_str(z);
    }
    if v.feature_http2() {
        line.push_str(" http2");
    }
    line
}
