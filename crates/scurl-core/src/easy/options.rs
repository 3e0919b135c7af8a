//! Typed option setters over `curl_easy_setopt`.

use std::ptr;
use std::time::Duration;

use libc::{c_long, c_void};

use crate::error::{Error, Result};
use crate::slist::List;

use super::Easy;

fn millis(d: Duration) -> Result<c_long> {
    c_long::try_from(d.as_millis()).map_err(|_| Error::easy(curl_sys::CURLE_BAD_FUNCTION_ARGUMENT))
}

fn secs(d: Duration) -> Result<c_long> {
    c_long::try_from(d.as_secs()).map_err(|_| Error::easy(curl_sys::CURLE_BAD_FUNCTION_ARGUMENT))
}

fn count(n: impl TryInto<c_long>) -> Result<c_long> {
    n.try_into()
        .map_err(|_| Error::easy(curl_sys::CURLE_BAD_FUNCTION_ARGUMENT))
}

impl Easy {
    pub fn url(&mut self, url: &str) -> Result<()> {
        self.setopt_str(curl_sys::CURLOPT_URL, url)
    }

    /// Clears `CURLOPT_URL`.
    pub fn unset_url(&mut self) -> Result<()> {
        self.setopt_ptr(curl_sys::CURLOPT_URL, ptr::null::<c_void>())
    }

    pub fn follow_location(&mut self, enable: bool) -> Result<()> {
        self.setopt_long(curl_sys::CURLOPT_FOLLOWLOCATION, enable as c_long)
    }

    pub fn max_redirections(&mut self, max: u32) -> Result<()> {
        self.setopt_long(curl_sys::CURLOPT_MAXREDIRS, count(max)?)
    }

    pub fn forbid_reuse(&mut self, enable: bool) -> Result<()> {
        self.setopt_long(curl_sys::CURLOPT_FORBID_REUSE, enable as c_long)
    }

    pub fn fresh_connect(&mut self, enable: bool) -> Result<()> {
        self.setopt_long(curl_sys::CURLOPT_FRESH_CONNECT, enable as c_long)
    }

    /// Replaces the custom request headers. An empty slice removes them.
    pub fn http_headers<S: AsRef<str>>(&mut self, headers: &[S]) -> Result<()> {
        let list = List::try_from_iter(headers)?;
        self.http_header_list(list)
    }

    /// Like [`Easy::http_headers`] with a prebuilt list; the handle keeps it.
    pub fn http_header_list(&mut self, list: List) -> Result<()> {
        tracing::trace!(id = %self.id(), headers = list.len(), "binding request headers");
        self.bind_header_list(list)
    }

    pub fn ssl_verify_peer(&mut self, enable: bool) -> Result<()> {
        self.setopt_long(curl_sys::CURLOPT_SSL_VERIFYPEER, enable as c_long)
    }

    /// `true` checks that the certificate names the host (libcurl value 2).
    pub fn ssl_verify_host(&mut self, enable: bool) -> Result<()> {
        self.setopt_long(curl_sys::CURLOPT_SSL_VERIFYHOST, if enable { 2 } else { 0 })
    }

    pub fn proxy_ssl_verify_peer(&mut self, enable: bool) -> Result<()> {
        self.setopt_long(curl_sys::CURLOPT_PROXY_SSL_VERIFYPEER, enable as c_long)
    }

    /// Proxy URL; an empty string disables proxies, including ones from the
    /// environment.
    pub fn proxy(&mut self, proxy: &str) -> Result<()> {
        self.setopt_str(curl_sys::CURLOPT_PROXY, proxy)
    }

    /// Comma-separated hosts that bypass the proxy; `"*"` matches all.
    pub fn noproxy(&mut self, hosts: &str) -> Result<()> {
        self.setopt_str(curl_sys::CURLOPT_NOPROXY, hosts)
    }

    pub fn http_proxy_tunnel(&mut self, enable: bool) -> Result<()> {
        self.setopt_long(curl_sys::CURLOPT_HTTPPROXYTUNNEL, enable as c_long)
    }

    /// Limit for the whole transfer; zero means none.
    pub fn timeout(&mut self, timeout: Duration) -> Result<()> {
        self.setopt_long(curl_sys::CURLOPT_TIMEOUT_MS, millis(timeout)?)
    }

    pub fn connect_timeout(&mut self, timeout: Duration) -> Result<()> {
        self.setopt_long(curl_sys::CURLOPT_CONNECTTIMEOUT_MS, millis(timeout)?)
    }

    /// Bytes per second below which the transfer counts as too slow.
    pub fn low_speed_limit(&mut self, bytes_per_sec: u32) -> Result<()> {
        self.setopt_long(curl_sys::CURLOPT_LOW_SPEED_LIMIT, count(bytes_per_sec)?)
    }

    /// How long the transfer may stay below [`Easy::low_speed_limit`]
    /// before it fails with `CURLE_OPERATION_TIMEDOUT`. Whole seconds.
    pub fn low_speed_time(&mut self, dur: Duration) -> Result<()> {
        self.setopt_long(curl_sys::CURLOPT_LOW_SPEED_TIME, secs(dur)?)
    }

    pub fn user_agent(&mut self, agent: &str) -> Result<()> {
        self.setopt_str(curl_sys::CURLOPT_USERAGENT, agent)
    }

    pub fn verbose(&mut self, enable: bool) -> Result<()> {
        self.setopt_long(curl_sys::CURLOPT_VERBOSE, enable as c_long)
    }

    /// Skips the body (a HEAD request for HTTP).
    pub fn nobody(&mut self, enable: bool) -> Result<()> {
        self.setopt_long(curl_sys::CURLOPT_NOBODY, enable as c_long)
    }

    /// Makes HTTP responses >= 400 fail with `CURLE_HTTP_RETURNED_ERROR`.
    pub fn fail_on_error(&mut self, enable: bool) -> Result<()> {
        self.setopt_long(curl_sys::CURLOPT_FAILONERROR, enable as c_long)
    }

    pub fn upload(&mut self, enable: bool) -> Result<()> {
        self.setopt_long(curl_sys::CURLOPT_UPLOAD, enable as c_long)
    }

    /// Size of the upload, when known ahead of time.
    pub fn in_filesize(&mut self, size: u64) -> Result<()> {
        let size = curl_sys::curl_off_t::try_from(size)
            .map_err(|_| Error::easy(curl_sys::CURLE_BAD_FUNCTION_ARGUMENT))?;
        self.setopt_off_t(curl_sys::CURLOPT_INFILESIZE_LARGE, size)
    }

    /// Byte range such as `"0-499"` or `"500-"`.
    pub fn range(&mut self, range: &str) -> Result<()> {
        self.setopt_str(curl_sys::CURLOPT_RANGE, range)
    }

    pub fn custom_request(&mut self, method: &str) -> Result<()> {
        self.setopt_str(curl_sys::CURLOPT_CUSTOMREQUEST, method)
    }

    /// Sets a POST body; libcurl keeps its own copy.
    pub fn post_fields_copy(&mut self, data: &[u8]) -> Result<()> {
        let len = curl_sys::curl_off_t::try_from(data.len())
            .map_err(|_| Error::easy(curl_sys::CURLE_BAD_FUNCTION_ARGUMENT))?;
        self.setopt_off_t(curl_sys::CURLOPT_POSTFIELDSIZE_LARGE, len)?;
        self.setopt_ptr(curl_sys::CURLOPT_COPYPOSTFIELDS, data.as_ptr() as *const c_void)
    }

    /// `Accept-Encoding` to advertise; an empty string offers every built-in
    /// decoder. Responses are decoded transparently.
    pub fn accept_encoding(&mut self, encoding: &str) -> Result<()> {
        self.setopt_str(curl_sys::CURLOPT_ACCEPT_ENCODING, encoding)
    }

    /// Stops libcurl from using signals, required for multithreaded use.
    pub fn nosignal(&mut self, enable: bool) -> Result<()> {
        self.setopt_long(curl_sys::CURLOPT_NOSIGNAL, enable as c_long)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_conversions() {
        assert_eq!(millis(Duration::from_millis(1500)).unwrap(), 1500);
        assert_eq!(secs(Duration::from_millis(2900)).unwrap(), 2);
        assert!(millis(Duration::MAX).is_err());
    }

    #[test]
    fn setters_accept_valid_values() {
        let mut easy = Easy::new().unwrap();
        easy.url("http://127.0.0.1:1/").unwrap();
        easy.unset_url().unwrap();
        easy.follow_location(true).unwrap();
        easy.max_redirections(5).unwrap();
        easy.forbid_reuse(false).unwrap();
        easy.fresh_connect(true).unwrap();
        easy.ssl_verify_peer(false).unwrap();
        easy.ssl_verify_host(false).unwrap();
        easy.proxy("").unwrap();
        easy.noproxy("localhost,127.0.0.1").unwrap();
        easy.http_proxy_tunnel(false).unwrap();
        easy.timeout(Duration::from_secs(30)).unwrap();
        easy.connect_timeout(Duration::from_secs(5)).unwrap();
        easy.low_speed_limit(1024).unwrap();
        easy.low_speed_time(Duration::from_secs(10)).unwrap();
        easy.user_agent("scurl-test").unwrap();
        easy.nobody(true).unwrap();
        easy.fail_on_error(true).unwrap();
        easy.in_filesize(42).unwrap();
        easy.range("0-99").unwrap();
        easy.custom_request("PUT").unwrap();
        easy.post_fields_copy(b"a=1&b=2").unwrap();
        easy.nosignal(true).unwrap();
    }

    #[test]
    fn string_option_with_nul_is_rejected() {
        let mut easy = Easy::new().unwrap();
        assert_eq!(easy.user_agent("bad\0agent"), Err(Error::Nul));
    }

    #[test]
    fn empty_header_slice_clears_list() {
        let mut easy = Easy::new().unwrap();
        easy.http_headers(&["X-One: 1", "X-Two: 2"]).unwrap();
        assert_eq!(easy.state().header_list.len(), 2);
        easy.http_headers::<&str>(&[]).unwrap();
        assert!(easy.state().header_list.raw().is_null());
    }

    #[test]
    fn bad_header_leaves_previous_list_bound() {
        let mut easy = Easy::new().unwrap();
        easy.http_headers(&["X-Keep: 1"]).unwrap();
        assert_eq!(easy.http_headers(&["X-Bad: \0"]), Err(Error::Nul));
        assert_eq!(easy.state().header_list.len(), 1);
    }
}
