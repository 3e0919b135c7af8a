//! Transfer information (`curl_easy_getinfo`) and parsed response headers.

use std::ffi::{CStr, CString};
use std::ptr;
use std::time::Duration;

use libc::{c_char, c_double, c_int, c_long};

use crate::error::{cvt, cvt_header, Error, Result};
use crate::header::{Header, Origin};
use crate::sys;

use super::Easy;

impl Easy {
    /// Last received response code; 0 when there was none.
    pub fn response_code(&self) -> Result<u32> {
        let mut code: c_long = 0;
        cvt(unsafe {
            curl_sys::curl_easy_getinfo(self.raw(), curl_sys::CURLINFO_RESPONSE_CODE, &mut code)
        })?;
        Ok(code.max(0) as u32)
    }

    /// Last URL used, after redirects.
    pub fn effective_url(&self) -> Result<Option<String>> {
        let mut url: *const c_char = ptr::null();
        cvt(unsafe {
            curl_sys::curl_easy_getinfo(self.raw(), curl_sys::CURLINFO_EFFECTIVE_URL, &mut url)
        })?;
        if url.is_null() {
            return Ok(None);
        }
        let url = unsafe { CStr::from_ptr(url) };
        Ok(Some(url.to_string_lossy().into_owned()))
    }

    pub fn total_time(&self) -> Result<Duration> {
        let mut secs: c_double = 0.0;
        cvt(unsafe {
            curl_sys::curl_easy_getinfo(self.raw(), curl_sys::CURLINFO_TOTAL_TIME, &mut secs)
        })?;
        Ok(Duration::from_secs_f64(secs.max(0.0)))
    }

    /// First plain response header named `name` (case-insensitive) from the
    /// last request.
    pub fn header(&self, name: &str) -> Result<Header> {
        self.header_at(name, 0, Origin::HEADER, -1)
    }

    /// Looks up the `index`-th header named `name` among those matching
    /// `origin`. `request` selects the request in a redirect chain: 0 is the
    /// first, -1 the last.
    pub fn header_at(&self, name: &str, index: usize, origin: Origin, request: i32) -> Result<Header> {
        let name = CString::new(name).map_err(|_| Error::Nul)?;
        let mut out: *mut sys::curl_header = ptr::null_mut();
        cvt_header(unsafe {
            sys::curl_easy_header(
                self.raw(),
                name.as_ptr(),
                index,
                origin.bits(),
                request as c_int,
                &mut out,
            )
        })?;
        if out.is_null() {
            return Err(Error::Header(sys::CURLHE_MISSING));
        }
        Ok(unsafe { Header::from_raw(out) })
    }

    /// Every header matching `origin` for `request`, in arrival order.
    pub fn headers(&self, origin: Origin, request: i32) -> Vec<Header> {
        let mut out = Vec::new();
        let mut prev: *mut sys::curl_header = ptr::null_mut();
        loop {
            prev = unsafe {
                sys::curl_easy_nextheader(self.raw(), origin.bits(), request as c_int, prev)
            };
            if prev.is_null() {
                break;
            }
            out.push(unsafe { Header::from_raw(prev) });
        }
        out
    }
}
