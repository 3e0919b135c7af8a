use curl_sys::CURLcode;
use libc::c_int;

use crate::easy::EasyId;
use crate::error::Result;

use super::Multi;

/// A finished transfer.
#[derive(Debug)]
pub struct Done {
    pub id: EasyId,
    /// Outcome, with the handle's error-buffer detail on failure.
    pub result: Result<()>,
}

impl Multi<'_> {
    /// Drains libcurl's message queue and returns the transfers that
    /// finished since the last call. Handles stay attached; remove them with
    /// [`Multi::remove`] to reuse them.
    pub fn get_done(&mut self) -> Vec<Done> {
        let mut done = Vec::new();
        loop {
            let mut queued: c_int = 0;
            let msg = unsafe { curl_sys::curl_multi_info_read(self.raw(), &mut queued) };
            if msg.is_null() {
                break;
            }
            let msg = unsafe { &*msg };
            if msg.msg != curl_sys::CURLMSG_DONE {
                continue;
            }
            // `data` is a C union; for DONE messages it holds the CURLcode.
            let code = msg.data as usize as CURLcode;
            let id = EasyId::from_raw(msg.easy_handle);
            let Some(easy) = self.attached.get_mut(&id) else {
                tracing::debug!(%id, "completion for a handle this multi does not track");
                continue;
            };
            let result = easy.cvt(code);
            tracing::debug!(%id, ok = result.is_ok(), "transfer finished");
            done.push(Done { id, result });
        }
        done
    }
}
