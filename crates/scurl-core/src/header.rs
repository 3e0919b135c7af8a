//! Owned copy of a libcurl header record (`struct curl_header`).

use std::ffi::CStr;
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use libc::c_uint;
use serde::Serialize;

use crate::sys;

/// Where a header came from, as a bit set of libcurl's `CURLH_*` flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Origin(c_uint);

impl Origin {
    /// Plain server response headers.
    pub const HEADER: Origin = Origin(sys::CURLH_HEADER);
    /// Trailers after a chunked body.
    pub const TRAILER: Origin = Origin(sys::CURLH_TRAILER);
    /// Headers of a proxy CONNECT response.
    pub const CONNECT: Origin = Origin(sys::CURLH_CONNECT);
    /// Headers of 1xx informational responses.
    pub const INFORMATIONAL: Origin = Origin(sys::CURLH_1XX);
    /// HTTP/2 and HTTP/3 pseudo headers.
    pub const PSEUDO: Origin = Origin(sys::CURLH_PSEUDO);

    /// Every public `CURLH_*` bit.
    pub const ALL: Origin = Origin(
        sys::CURLH_HEADER | sys::CURLH_TRAILER | sys::CURLH_CONNECT | sys::CURLH_1XX | sys::CURLH_PSEUDO,
    );

    /// Keeps only the public `CURLH_*` bits; libcurl sets internal ones too.
    pub const fn from_bits(bits: c_uint) -> Origin {
        Origin(bits & Origin::ALL.0)
    }

    pub const fn bits(self) -> c_uint {
        self.0
    }

    pub const fn contains(self, other: Origin) -> bool {
        self.0 & other.0 == other.0
    }
}

impl Default for Origin {
    fn default() -> Self {
        Origin::HEADER
    }
}

impl BitOr for Origin {
    type Output = Origin;

    fn bitor(self, rhs: Origin) -> Origin {
        Origin(self.0 | rhs.0)
    }
}

impl BitOrAssign for Origin {
    fn bitor_assign(&mut self, rhs: Origin) {
        self.0 |= rhs.0;
    }
}

/// One response header, copied out of libcurl's storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Header {
    pub name: String,
    pub value: String,
    /// How many headers with this name exist in the response.
    pub amount: usize,
    /// Index of this one among them.
    pub index: usize,
    pub origin: Origin,
}

impl Header {
    /// Copies a native header record.
    ///
    /// # Safety
    ///
    /// `raw` must point at a live `curl_header` whose `name` and `value` are
    /// NUL-terminated strings.
    pub(crate) unsafe fn from_raw(raw: *const sys::curl_header) -> Header {
        let h = &*raw;
        Header {
            name: CStr::from_ptr(h.name).to_string_lossy().into_owned(),
            value: CStr::from_ptr(h.value).to_string_lossy().into_owned(),
            amount: h.amount,
            index: h.index,
            origin: Origin::from_bits(h.origin),
        }
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.value)
    }
}
