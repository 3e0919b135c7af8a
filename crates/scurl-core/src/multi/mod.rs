//! Multi-handle wrapper driving several easy transfers at once.
//!
//! A [`Multi`] borrows every attached [`Easy`] mutably for its own lifetime,
//! so an attached handle can neither be dropped nor used elsewhere while
//! libcurl holds it. Dropping the multi detaches everything first.

mod message;
mod options;

use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;
use std::ptr::{self, NonNull};
use std::time::Duration;

use curl_sys::CURLM;
use libc::c_int;

use crate::easy::{Easy, EasyId};
use crate::error::{cvt_multi, Error, Result};
use crate::handle::{Owned, RawResource};

pub use message::Done;

pub(crate) struct MultiResource;

impl RawResource for MultiResource {
    type Target = CURLM;
    const NAME: &'static str = "multi";

    unsafe fn free(ptr: NonNull<CURLM>) {
        let rc = curl_sys::curl_multi_cleanup(ptr.as_ptr());
        if rc != curl_sys::CURLM_OK {
            tracing::warn!(code = rc, "curl_multi_cleanup failed");
        }
    }
}

pub struct Multi<'e> {
    raw: Owned<MultiResource>,
    attached: HashMap<EasyId, &'e mut Easy>,
}

// The multi handle may move between threads when not in use; the attached
// easies are `Send`.
unsafe impl Send for Multi<'_> {}

impl<'e> Multi<'e> {
    /// Creates a multi handle with `curl_multi_init`.
    pub fn new() -> Result<Multi<'e>> {
        let mut multi = Multi {
            raw: Owned::empty(),
            attached: HashMap::new(),
        };
        multi.create()?;
        Ok(multi)
    }

    /// Detaches every easy handle and replaces the native multi handle with
    /// a fresh one. Options set on the old one are lost.
    pub fn create(&mut self) -> Result<()> {
        crate::init();
        let raw = unsafe { curl_sys::curl_multi_init() };
        if raw.is_null() {
            return Err(Error::Init("curl_multi_init()"));
        }
        self.detach_all();
        self.raw = unsafe { Owned::from_raw(raw) };
        tracing::debug!(handle = ?raw, "created multi handle");
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.raw.is_valid()
    }

    pub fn raw(&self) -> *mut CURLM {
        self.raw.as_ptr()
    }

    /// Attaches `easy`; its transfer starts on the next [`Multi::perform`].
    pub fn add(&mut self, easy: &'e mut Easy) -> Result<EasyId> {
        let id = easy.id();
        if !easy.is_valid() {
            return Err(Error::Multi(curl_sys::CURLM_BAD_EASY_HANDLE));
        }
        cvt_multi(unsafe { curl_sys::curl_multi_add_handle(self.raw(), easy.raw()) })?;
        self.attached.insert(id, easy);
        tracing::debug!(%id, attached = self.attached.len(), "attached easy handle");
        Ok(id)
    }

    /// Detaches the handle and hands the borrow back. On failure the handle
    /// stays attached.
    pub fn remove(&mut self, id: EasyId) -> Result<&'e mut Easy> {
        let easy = self
            .attached
            .remove(&id)
            .ok_or(Error::Multi(curl_sys::CURLM_BAD_EASY_HANDLE))?;
        let rc = unsafe { curl_sys::curl_multi_remove_handle(self.raw(), easy.raw()) };
        if let Err(e) = cvt_multi(rc) {
            self.attached.insert(id, easy);
            return Err(e);
        }
        tracing::debug!(%id, attached = self.attached.len(), "detached easy handle");
        Ok(easy)
    }

    pub fn get(&self, id: EasyId) -> Option<&Easy> {
        self.attached.get(&id).map(|e| &**e)
    }

    /// Mutable access limited to what is safe while libcurl holds the
    /// handle. Use [`Multi::remove`] for anything else.
    pub fn get_mut(&mut self, id: EasyId) -> Option<AttachedEasy<'_>> {
        self.attached.get_mut(&id).map(|e| AttachedEasy(&mut **e))
    }

    pub fn len(&self) -> usize {
        self.attached.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attached.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = EasyId> + '_ {
        self.attached.keys().copied()
    }

    /// Drives every attached transfer as far as it can go without blocking.
    /// Returns how many are still running.
    pub fn perform(&mut self) -> Result<u32> {
        let mut running: c_int = 0;
        cvt_multi(unsafe { curl_sys::curl_multi_perform(self.raw(), &mut running) })?;
        Ok(running.max(0) as u32)
    }

    /// Waits up to `timeout` for activity on any transfer. Returns the number
    /// of file descriptors with activity; 0 means the timeout expired.
    pub fn wait(&mut self, timeout: Duration) -> Result<u32> {
        let ms = c_int::try_from(timeout.as_millis()).unwrap_or(c_int::MAX);
        let mut numfds: c_int = 0;
        cvt_multi(unsafe {
            curl_sys::curl_multi_wait(self.raw(), ptr::null_mut(), 0, ms, &mut numfds)
        })?;
        Ok(numfds.max(0) as u32)
    }

    fn detach_all(&mut self) {
        let raw = self.raw();
        for (id, easy) in self.attached.drain() {
            let rc = unsafe { curl_sys::curl_multi_remove_handle(raw, easy.raw()) };
            if rc != curl_sys::CURLM_OK {
                tracing::warn!(%id, code = rc, "failed to detach easy handle");
            }
        }
    }
}

/// An easy handle still attached to a [`Multi`].
///
/// Reads go through `Deref`. The handle cannot be destroyed, recreated or
/// swapped out from here, so the multi's bookkeeping stays valid.
pub struct AttachedEasy<'a>(&'a mut Easy);

impl AttachedEasy<'_> {
    pub fn pause(&mut self, pause_recv: bool, pause_send: bool) -> Result<()> {
        self.0.pause(pause_recv, pause_send)
    }

    pub fn unpause(&mut self) -> Result<()> {
        self.0.unpause()
    }
}

impl Deref for AttachedEasy<'_> {
    type Target = Easy;

    fn deref(&self) -> &Easy {
        self.0
    }
}

impl fmt::Debug for AttachedEasy<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AttachedEasy").field(&self.0.id()).finish()
    }
}

impl Drop for Multi<'_> {
    fn drop(&mut self) {
        self.detach_all();
    }
}

impl fmt::Debug for Multi<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Multi")
            .field("handle", &self.raw())
            .field("attached", &self.attached.keys().collect::<Vec<_>>())
            .finish()
    }
}
