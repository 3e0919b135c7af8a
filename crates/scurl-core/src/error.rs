//! Status-code translation for easy, multi and header operations.
//!
//! Every native call that reports a status goes through [`cvt`], [`cvt_multi`]
//! or [`cvt_header`]; the resulting [`Error`] renders libcurl's own message,
//! plus the handle's error-buffer detail when one was captured.

use std::ffi::CStr;

use curl_sys::{CURLcode, CURLMcode};
use thiserror::Error;

use crate::sys::{self, CURLHcode};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// An easy-handle call returned a `CURLcode` other than `CURLE_OK`.
    #[error("{}", fmt_easy(.code, .extra))]
    Easy {
        code: CURLcode,
        /// Contents of the handle's error buffer, when libcurl filled it.
        extra: Option<String>,
    },

    /// A multi-handle call returned a `CURLMcode` other than `CURLM_OK`.
    #[error("{}", fmt_multi(.0))]
    Multi(CURLMcode),

    /// A header lookup returned a `CURLHcode` other than `CURLHE_OK`.
    #[error("{}", fmt_header(.0))]
    Header(CURLHcode),

    /// Handle allocation failed (`curl_easy_init`, `curl_multi_init`, ...).
    #[error("{0} failed")]
    Init(&'static str),

    /// A string argument contained an interior NUL byte.
    #[error("string argument contains an interior NUL byte")]
    Nul,

    /// Native data was not valid UTF-8.
    #[error("invalid UTF-8 in native string")]
    InvalidUtf8,

    #[error("{0}")]
    Message(String),
}

fn fmt_easy(code: &CURLcode, extra: &Option<String>) -> String {
    match extra {
        Some(detail) => format!("{}: {}", easy_strerror(*code), detail),
        None => easy_strerror(*code),
    }
}

fn fmt_multi(code: &CURLMcode) -> String {
    multi_strerror(*code)
}

fn fmt_header(code: &CURLHcode) -> String {
    header_strerror(*code)
}

impl Error {
    pub fn easy(code: CURLcode) -> Self {
        Error::Easy { code, extra: None }
    }

    pub(crate) fn out_of_memory() -> Self {
        Error::easy(curl_sys::CURLE_OUT_OF_MEMORY)
    }

    /// The easy `CURLcode`, if this error came from an easy-handle call.
    pub fn code(&self) -> Option<CURLcode> {
        match self {
            Error::Easy { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Error-buffer detail captured alongside an easy-handle failure.
    pub fn extra_description(&self) -> Option<&str> {
        match self {
            Error::Easy { extra, .. } => extra.as_deref(),
            _ => None,
        }
    }

    fn is_easy(&self, expected: CURLcode) -> bool {
        self.code() == Some(expected)
    }

    pub fn is_operation_timedout(&self) -> bool {
        self.is_easy(curl_sys::CURLE_OPERATION_TIMEDOUT)
    }

    pub fn is_couldnt_connect(&self) -> bool {
        self.is_easy(curl_sys::CURLE_COULDNT_CONNECT)
    }

    pub fn is_couldnt_resolve_host(&self) -> bool {
        self.is_easy(curl_sys::CURLE_COULDNT_RESOLVE_HOST)
    }

    pub fn is_write_error(&self) -> bool {
        self.is_easy(curl_sys::CURLE_WRITE_ERROR)
    }

    pub fn is_aborted_by_callback(&self) -> bool {
        self.is_easy(curl_sys::CURLE_ABORTED_BY_CALLBACK)
    }

    pub fn is_http_returned_error(&self) -> bool {
        self.is_easy(curl_sys::CURLE_HTTP_RETURNED_ERROR)
    }

    pub fn is_unsupported_protocol(&self) -> bool {
        self.is_easy(curl_sys::CURLE_UNSUPPORTED_PROTOCOL)
    }

    pub fn is_out_of_memory(&self) -> bool {
        self.is_easy(curl_sys::CURLE_OUT_OF_MEMORY)
    }

    /// True for a header lookup that found no header with the given name.
    pub fn is_header_missing(&self) -> bool {
        matches!(self, Error::Header(sys::CURLHE_MISSING))
    }
}

/// libcurl's description of an easy status code.
pub fn easy_strerror(code: CURLcode) -> String {
    // curl_easy_strerror never returns null; it falls back to "Unknown error".
    unsafe { CStr::from_ptr(curl_sys::curl_easy_strerror(code)) }
        .to_string_lossy()
        .into_owned()
}

/// libcurl's description of a multi status code.
pub fn multi_strerror(code: CURLMcode) -> String {
    unsafe { CStr::from_ptr(curl_sys::curl_multi_strerror(code)) }
        .to_string_lossy()
        .into_owned()
}

/// Description of a header-API status code. libcurl has no strerror for these.
pub fn header_strerror(code: CURLHcode) -> String {
    let msg = match code {
        sys::CURLHE_OK => "no error",
        sys::CURLHE_BADINDEX => "header exists but not with this index",
        sys::CURLHE_MISSING => "no such header exists",
        sys::CURLHE_NOHEADERS => "no headers at all exist",
        sys::CURLHE_NOREQUEST => "no request with this number was used",
        sys::CURLHE_OUT_OF_MEMORY => "out of memory while processing",
        sys::CURLHE_BAD_ARGUMENT => "a function argument was not okay",
        sys::CURLHE_NOT_BUILT_IN => "HEADER API was disabled in the build",
        _ => "invalid",
    };
    msg.to_string()
}

pub(crate) fn cvt(code: CURLcode) -> Result<()> {
    if code == curl_sys::CURLE_OK {
        Ok(())
    } else {
        Err(Error::easy(code))
    }
}

pub(crate) fn cvt_multi(code: CURLMcode) -> Result<()> {
    if code == curl_sys::CURLM_OK {
        Ok(())
    } else {
        Err(Error::Multi(code))
    }
}

pub(crate) fn cvt_header(code: CURLHcode) -> Result<()> {
    if code == sys::CURLHE_OK {
        Ok(())
    } else {
        Err(Error::Header(code))
    }
}
