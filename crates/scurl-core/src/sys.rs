//! Native symbols and constants that `curl-sys` does not export.
//!
//! The header API (`curl_easy_header`, `curl_easy_nextheader`) and a few newer
//! constants are declared here against the libcurl that `curl-sys` links.

#![allow(non_camel_case_types)]

use libc::{c_char, c_int, c_uint, c_void, size_t};

pub use curl_sys::CURL;

pub type CURLHcode = c_int;

pub const CURLHE_OK: CURLHcode = 0;
pub const CURLHE_BADINDEX: CURLHcode = 1;
pub const CURLHE_MISSING: CURLHcode = 2;
pub const CURLHE_NOHEADERS: CURLHcode = 3;
pub const CURLHE_NOREQUEST: CURLHcode = 4;
pub const CURLHE_OUT_OF_MEMORY: CURLHcode = 5;
pub const CURLHE_BAD_ARGUMENT: CURLHcode = 6;
pub const CURLHE_NOT_BUILT_IN: CURLHcode = 7;

pub const CURLH_HEADER: c_uint = 1 << 0;
pub const CURLH_TRAILER: c_uint = 1 << 1;
pub const CURLH_CONNECT: c_uint = 1 << 2;
pub const CURLH_1XX: c_uint = 1 << 3;
pub const CURLH_PSEUDO: c_uint = 1 << 4;

/// Returned from a write callback to signal an error (libcurl >= 7.87).
pub const CURL_WRITEFUNC_ERROR: size_t = 0xFFFF_FFFF;

pub const CURLOPT_XFERINFOFUNCTION: curl_sys::CURLoption =
    curl_sys::CURLOPTTYPE_FUNCTIONPOINT + 219;
/// Shares its slot with the legacy progress data option.
pub const CURLOPT_XFERINFODATA: curl_sys::CURLoption = curl_sys::CURLOPT_PROGRESSDATA;

pub const CURLPAUSE_CONT: c_int = curl_sys::CURLPAUSE_RECV_CONT | curl_sys::CURLPAUSE_SEND_CONT;

pub const CURLMOPT_MAX_CONCURRENT_STREAMS: curl_sys::CURLMoption = 16;

pub const CURLM_BAD_FUNCTION_ARGUMENT: curl_sys::CURLMcode = 10;

#[repr(C)]
pub struct curl_header {
    pub name: *mut c_char,
    pub value: *mut c_char,
    pub amount: size_t,
    pub index: size_t,
    pub origin: c_uint,
    pub anchor: *mut c_void,
}

extern "C" {
    pub fn curl_easy_header(
        easy: *mut CURL,
        name: *const c_char,
        index: size_t,
        origin: c_uint,
        request: c_int,
        hout: *mut *mut curl_header,
    ) -> CURLHcode;

    pub fn curl_easy_nextheader(
        easy: *mut CURL,
        origin: c_uint,
        request: c_int,
        prev: *mut curl_header,
    ) -> *mut curl_header;
}
