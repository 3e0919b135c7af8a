//! Easy-handle wrapper: one transfer context plus its callback side table.
//!
//! The native handle is owned through [`Owned`]; the closures, error buffer
//! and custom header list live in a heap-pinned [`State`] that the handle's
//! private slot points at, so moving an `Easy` never invalidates what the
//! C trampolines recover.

mod callbacks;
mod info;
mod options;
mod state;

use std::fmt;
use std::ptr::{self, NonNull};

use curl_sys::{CURLcode, CURLoption, CURL};
use libc::{c_long, c_void};

use crate::error::{Error, Result};
use crate::handle::{Owned, RawResource};
use crate::slist::List;
use crate::sys;

pub use callbacks::{InfoType, Progress, ReadError, WriteError};
pub(crate) use state::State;

pub(crate) struct EasyResource;

impl RawResource for EasyResource {
    type Target = CURL;
    const NAME: &'static str = "easy";

    unsafe fn free(ptr: NonNull<CURL>) {
        curl_sys::curl_easy_cleanup(ptr.as_ptr());
    }
}

/// Identity of an easy handle, used to match multi completion messages with
/// the caller's handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EasyId(usize);

impl EasyId {
    pub(crate) fn from_raw(raw: *mut CURL) -> EasyId {
        EasyId(raw as usize)
    }
}

impl fmt::Display for EasyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "easy#{:x}", self.0)
    }
}

/// An owned libcurl easy handle.
pub struct Easy {
    raw: Owned<EasyResource>,
    state: NonNull<State>,
}

// libcurl allows a handle to move between threads as long as it is used from
// one thread at a time; every stored closure is `Send`.
unsafe impl Send for Easy {}

impl Easy {
    /// Creates a handle with `curl_easy_init`.
    pub fn new() -> Result<Easy> {
        let mut easy = Easy::empty();
        easy.create()?;
        Ok(easy)
    }

    /// A wrapper that owns no native handle yet. Every native call on it
    /// fails with `CURLE_BAD_FUNCTION_ARGUMENT`.
    pub fn empty() -> Easy {
        let state = Box::new(State::new());
        Easy {
            raw: Owned::empty(),
            state: NonNull::from(Box::leak(state)),
        }
    }

    /// Adopts a raw handle, linking it to a fresh side table.
    ///
    /// # Safety
    ///
    /// `raw` must be null or a live easy handle that nothing else owns and
    /// that is not attached to a multi handle.
    pub unsafe fn from_raw(raw: *mut CURL) -> Result<Easy> {
        let mut easy = Easy::empty();
        easy.acquire(raw)?;
        Ok(easy)
    }

    /// Replaces the native handle with a brand new one. Options, closures and
    /// the header list of the old handle are discarded.
    pub fn create(&mut self) -> Result<()> {
        crate::init();
        let raw = unsafe { curl_sys::curl_easy_init() };
        if raw.is_null() {
            return Err(Error::Init("curl_easy_init()"));
        }
        unsafe { self.acquire(raw) }?;
        tracing::debug!(id = %self.id(), "created easy handle");
        Ok(())
    }

    /// Duplicates the handle and all its options with `curl_easy_duphandle`.
    ///
    /// The copy gets its own error buffer and its own copy of the header list.
    /// Closures cannot be duplicated: until new ones are set, the copy's read
    /// callback aborts and its write callback reports an error.
    pub fn try_clone(&self) -> Result<Easy> {
        if !self.is_valid() {
            return Ok(Easy::empty());
        }
        let raw = unsafe { curl_sys::curl_easy_duphandle(self.raw()) };
        if raw.is_null() {
            return Err(Error::Init("curl_easy_duphandle()"));
        }
        let mut copy = unsafe { Easy::from_raw(raw) }?;

        // duphandle copied our list pointer; the copy must own its own list.
        let list = self.state().header_list.try_clone()?;
        copy.bind_header_list(list)?;

        // The *DATA options still point at this handle.
        let registered = self.state().registered;
        copy.state_mut().registered = registered;
        copy.retarget_callback_data()?;

        tracing::debug!(from = %self.id(), to = %copy.id(), "duplicated easy handle");
        Ok(copy)
    }

    /// Resets every option to its default (`curl_easy_reset`) and drops the
    /// closures and header list. The handle stays alive and linked.
    pub fn reset(&mut self) -> Result<()> {
        if !self.is_valid() {
            return Ok(());
        }
        unsafe { curl_sys::curl_easy_reset(self.raw()) };
        *self.state_mut() = State::new();
        self.link()
    }

    /// Frees the native handle now; the wrapper becomes empty.
    pub fn destroy(&mut self) {
        self.raw.destroy();
        *self.state_mut() = State::new();
    }

    /// Frees any current handle and adopts `raw`.
    ///
    /// # Safety
    ///
    /// Same contract as [`Easy::from_raw`].
    pub unsafe fn acquire(&mut self, raw: *mut CURL) -> Result<()> {
        if raw == self.raw() {
            return self.link();
        }
        self.destroy();
        self.raw.acquire(raw);
        self.link()
    }

    /// Gives up the native handle without freeing it. The handle is unlinked
    /// from this wrapper first (private slot, error buffer and header list),
    /// so any trampolines still installed on it abort instead of reaching
    /// freed memory.
    pub fn into_raw(mut self) -> *mut CURL {
        if self.is_valid() {
            let raw = self.raw();
            unsafe {
                curl_sys::curl_easy_setopt(raw, curl_sys::CURLOPT_PRIVATE, ptr::null::<c_void>());
                curl_sys::curl_easy_setopt(raw, curl_sys::CURLOPT_ERRORBUFFER, ptr::null::<c_void>());
                curl_sys::curl_easy_setopt(raw, curl_sys::CURLOPT_HTTPHEADER, ptr::null::<c_void>());
            }
        }
        self.raw.release()
    }

    pub fn is_valid(&self) -> bool {
        self.raw.is_valid()
    }

    /// The native handle; null when empty.
    pub fn raw(&self) -> *mut CURL {
        self.raw.as_ptr()
    }

    pub fn id(&self) -> EasyId {
        EasyId::from_raw(self.raw())
    }

    /// Runs the transfer to completion (`curl_easy_perform`).
    pub fn perform(&mut self) -> Result<()> {
        tracing::trace!(id = %self.id(), "perform");
        let rc = unsafe { curl_sys::curl_easy_perform(self.raw()) };
        self.cvt(rc)
    }

    /// Pauses receiving and/or sending (`curl_easy_pause`).
    pub fn pause(&mut self, pause_recv: bool, pause_send: bool) -> Result<()> {
        let mut bits = sys::CURLPAUSE_CONT;
        if pause_recv {
            bits |= curl_sys::CURLPAUSE_RECV;
        }
        if pause_send {
            bits |= curl_sys::CURLPAUSE_SEND;
        }
        let rc = unsafe { curl_sys::curl_easy_pause(self.raw(), bits) };
        self.cvt(rc)
    }

    pub fn unpause(&mut self) -> Result<()> {
        self.pause(false, false)
    }

    /// Points the private slot and the error buffer at this wrapper's state.
    fn link(&mut self) -> Result<()> {
        if !self.is_valid() {
            return Ok(());
        }
        let state = self.state.as_ptr();
        let buf = self.state_mut().error_buf_ptr();
        self.setopt_ptr(curl_sys::CURLOPT_PRIVATE, state as *const c_void)?;
        self.setopt_ptr(curl_sys::CURLOPT_ERRORBUFFER, buf as *const c_void)?;
        self.state_mut().clear_error_message();
        Ok(())
    }

    /// Binds `list` as `CURLOPT_HTTPHEADER` and keeps it alive; the previous
    /// list is freed only after the native handle stops referring to it.
    pub(crate) fn bind_header_list(&mut self, list: List) -> Result<()> {
        self.setopt_ptr(curl_sys::CURLOPT_HTTPHEADER, list.raw() as *const c_void)?;
        self.state_mut().header_list = list;
        Ok(())
    }

    fn state(&self) -> &State {
        unsafe { self.state.as_ref() }
    }

    fn state_mut(&mut self) -> &mut State {
        unsafe { self.state.as_mut() }
    }

    /// Translates a status code, attaching the error-buffer detail.
    pub(crate) fn cvt(&mut self, rc: CURLcode) -> Result<()> {
        if rc == curl_sys::CURLE_OK {
            return Ok(());
        }
        let extra = self.state_mut().take_error_message();
        Err(Error::Easy { code: rc, extra })
    }

    pub(crate) fn setopt_long(&mut self, opt: CURLoption, val: c_long) -> Result<()> {
        let rc = unsafe { curl_sys::curl_easy_setopt(self.raw(), opt, val) };
        self.cvt(rc)
    }

    pub(crate) fn setopt_off_t(&mut self, opt: CURLoption, val: curl_sys::curl_off_t) -> Result<()> {
        let rc = unsafe { curl_sys::curl_easy_setopt(self.raw(), opt, val) };
        self.cvt(rc)
    }

    pub(crate) fn setopt_ptr(&mut self, opt: CURLoption, val: *const c_void) -> Result<()> {
        let rc = unsafe { curl_sys::curl_easy_setopt(self.raw(), opt, val) };
        self.cvt(rc)
    }

    /// String options are copied by libcurl, so the temporary may go away.
    pub(crate) fn setopt_str(&mut self, opt: CURLoption, val: &str) -> Result<()> {
        let val = std::ffi::CString::new(val).map_err(|_| Error::Nul)?;
        self.setopt_ptr(opt, val.as_ptr() as *const c_void)
    }
}

impl Drop for Easy {
    fn drop(&mut self) {
        // The native handle goes first: it may still reference the header list.
        self.raw.destroy();
        unsafe { drop(Box::from_raw(self.state.as_ptr())) };
    }
}

impl fmt::Debug for Easy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Easy")
            .field("handle", &self.raw())
            .field("headers", &self.state().header_list)
            .finish()
    }
}
