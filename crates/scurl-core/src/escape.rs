//! URL percent-encoding through libcurl (`curl_easy_escape` / `curl_easy_unescape`).

use std::ptr;
use std::slice;

use libc::{c_char, c_int, c_void};

use crate::error::{Error, Result};

/// Percent-encodes every byte that is not an unreserved URL character.
pub fn escape(input: impl AsRef<[u8]>) -> Result<String> {
    let input = input.as_ref();
    // A zero length makes libcurl call strlen() on the input.
    if input.is_empty() {
        return Ok(String::new());
    }
    let len = c_int::try_from(input.len())
        .map_err(|_| Error::Message("failed to escape string".to_string()))?;
    crate::init();
    unsafe {
        let out = curl_sys::curl_easy_escape(ptr::null_mut(), input.as_ptr() as *const c_char, len);
        if out.is_null() {
            return Err(Error::Message("failed to escape string".to_string()));
        }
        let escaped = std::ffi::CStr::from_ptr(out).to_bytes().to_vec();
        curl_sys::curl_free(out as *mut c_void);
        // The escaped form is pure ASCII.
        String::from_utf8(escaped).map_err(|_| Error::InvalidUtf8)
    }
}

/// Decodes `%XX` sequences. The result may contain NUL bytes.
pub fn unescape(input: &str) -> Result<Vec<u8>> {
    if input.is_empty() {
        return Ok(Vec::new());
    }
    let len = c_int::try_from(input.len())
        .map_err(|_| Error::Message("failed to unescape string".to_string()))?;
    crate::init();
    unsafe {
        let mut out_len: c_int = 0;
        let out = curl_sys::curl_easy_unescape(
            ptr::null_mut(),
            input.as_ptr() as *const c_char,
            len,
            &mut out_len,
        );
        if out.is_null() {
            return Err(Error::Message("failed to unescape string".to_string()));
        }
        let decoded = slice::from_raw_parts(out as *const u8, out_len as usize).to_vec();
        curl_sys::curl_free(out as *mut c_void);
        Ok(decoded)
    }
}

/// [`unescape`], requiring the decoded bytes to be UTF-8.
pub fn unescape_str(input: &str) -> Result<String> {
    String::from_utf8(unescape(input)?).map_err(|_| Error::InvalidUtf8)
}
