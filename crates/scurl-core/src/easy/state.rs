//! Per-handle side table reachable from the native handle's private slot.

use std::ffi::CStr;
use std::ptr;

use libc::c_char;

use crate::slist::List;

use super::callbacks::Callbacks;

/// Which trampolines are currently installed on the native handle.
#[derive(Debug, Default, Clone, Copy)]
pub(super) struct Registered {
    pub(super) read: bool,
    pub(super) write: bool,
    pub(super) header: bool,
    pub(super) progress: bool,
    pub(super) debug: bool,
}

/// Lives at a fixed heap address for the whole life of an [`Easy`](super::Easy);
/// `CURLOPT_PRIVATE` and `CURLOPT_ERRORBUFFER` point into it.
pub(crate) struct State {
    error_buf: Vec<u8>,
    pub(super) callbacks: Callbacks,
    pub(super) header_list: List,
    pub(super) registered: Registered,
}

impl State {
    pub(super) fn new() -> State {
        State {
            error_buf: vec![0; curl_sys::CURL_ERROR_SIZE],
            callbacks: Callbacks::default(),
            header_list: List::new(),
            registered: Registered::default(),
        }
    }

    pub(super) fn error_buf_ptr(&mut self) -> *mut c_char {
        self.error_buf.as_mut_ptr() as *mut c_char
    }

    /// Takes the message libcurl left in the error buffer, if any.
    pub(super) fn take_error_message(&mut self) -> Option<String> {
        let msg = CStr::from_bytes_until_nul(&self.error_buf)
            .ok()
            .map(|s| s.to_string_lossy().trim_end().to_string())
            .filter(|s| !s.is_empty());
        self.error_buf[0] = 0;
        msg
    }

    pub(super) fn clear_error_message(&mut self) {
        self.error_buf[0] = 0;
    }

    /// Recovers the state linked to a native handle through `CURLINFO_PRIVATE`.
    ///
    /// # Safety
    ///
    /// `handle` must be null or a live easy handle whose private slot is
    /// either null or points at a live `State`, with no other reference to
    /// that state active for `'a`.
    pub(crate) unsafe fn from_handle<'a>(handle: *mut curl_sys::CURL) -> Option<&'a mut State> {
        if handle.is_null() {
            return None;
        }
        let mut private: *mut c_char = ptr::null_mut();
        let rc = curl_sys::curl_easy_getinfo(handle, curl_sys::CURLINFO_PRIVATE, &mut private);
        if rc != curl_sys::CURLE_OK || private.is_null() {
            return None;
        }
        Some(&mut *(private as *mut State))
    }
}
