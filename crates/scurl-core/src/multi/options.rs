use curl_sys::CURLMoption;
use libc::c_long;

use crate::error::{cvt_multi, Error, Result};
use crate::sys;

use super::Multi;

impl Multi<'_> {
    /// Size of the connection cache (`CURLMOPT_MAXCONNECTS`).
    pub fn set_max_connects(&mut self, n: usize) -> Result<()> {
        self.setopt_long(curl_sys::CURLMOPT_MAXCONNECTS, n)
    }

    /// Streams per HTTP/2 connection.
    pub fn set_max_concurrent_streams(&mut self, n: usize) -> Result<()> {
        self.setopt_long(sys::CURLMOPT_MAX_CONCURRENT_STREAMS, n)
    }

    /// Connections per host; 0 is unlimited.
    pub fn set_max_host_connections(&mut self, n: usize) -> Result<()> {
        self.setopt_long(curl_sys::CURLMOPT_MAX_HOST_CONNECTIONS, n)
    }

    /// Connections overall; 0 is unlimited.
    pub fn set_max_total_connections(&mut self, n: usize) -> Result<()> {
        self.setopt_long(curl_sys::CURLMOPT_MAX_TOTAL_CONNECTIONS, n)
    }

    fn setopt_long(&mut self, opt: CURLMoption, n: usize) -> Result<()> {
        let n = c_long::try_from(n).map_err(|_| Error::Multi(sys::CURLM_BAD_FUNCTION_ARGUMENT))?;
        cvt_multi(unsafe { curl_sys::curl_multi_setopt(self.raw(), opt, n) })
    }
}
