//! Closure registration and the `extern "C"` trampolines libcurl calls.
//!
//! Every trampoline is handed the raw easy handle as its user data and finds
//! the closure through the handle's private slot. Panics never cross the FFI
//! boundary: they are logged and turned into the callback's failure value,
//! which makes the transfer fail.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::slice;

use curl_sys::{curl_infotype, curl_off_t, CURL};
use libc::{c_char, c_int, c_void, size_t};

use crate::error::Result;
use crate::sys;

use super::state::State;
use super::Easy;

/// Why a read callback produced no data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadError {
    /// Pause sending until [`Easy::unpause`] is called.
    Pause,
    /// Abort the transfer with `CURLE_ABORTED_BY_CALLBACK`.
    Abort,
}

/// Returned by a write callback to pause receiving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteError {
    Pause,
}

/// Transfer counters passed to the progress callback, in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    pub dltotal: u64,
    pub dlnow: u64,
    pub ultotal: u64,
    pub ulnow: u64,
}

/// Kind of data passed to the debug callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfoType {
    Text,
    HeaderIn,
    HeaderOut,
    DataIn,
    DataOut,
    SslDataIn,
    SslDataOut,
}

impl InfoType {
    fn from_raw(kind: curl_infotype) -> Option<InfoType> {
        Some(match kind {
            curl_sys::CURLINFO_TEXT => InfoType::Text,
            curl_sys::CURLINFO_HEADER_IN => InfoType::HeaderIn,
            curl_sys::CURLINFO_HEADER_OUT => InfoType::HeaderOut,
            curl_sys::CURLINFO_DATA_IN => InfoType::DataIn,
            curl_sys::CURLINFO_DATA_OUT => InfoType::DataOut,
            curl_sys::CURLINFO_SSL_DATA_IN => InfoType::SslDataIn,
            curl_sys::CURLINFO_SSL_DATA_OUT => InfoType::SslDataOut,
            _ => return None,
        })
    }
}

type ReadFn = Box<dyn FnMut(&mut [u8]) -> std::result::Result<usize, ReadError> + Send>;
type WriteFn = Box<dyn FnMut(&[u8]) -> std::result::Result<usize, WriteError> + Send>;
type HeaderFn = Box<dyn FnMut(&[u8]) -> bool + Send>;
type ProgressFn = Box<dyn FnMut(Progress) -> bool + Send>;
type DebugFn = Box<dyn FnMut(InfoType, &[u8]) + Send>;

#[derive(Default)]
pub(super) struct Callbacks {
    pub(super) read: Option<ReadFn>,
    pub(super) write: Option<WriteFn>,
    pub(super) header: Option<HeaderFn>,
    pub(super) progress: Option<ProgressFn>,
    pub(super) debug: Option<DebugFn>,
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    Read,
    Write,
    Header,
    Progress,
    Debug,
}

impl Slot {
    const ALL: [Slot; 5] = [Slot::Read, Slot::Write, Slot::Header, Slot::Progress, Slot::Debug];

    fn name(self) -> &'static str {
        match self {
            Slot::Read => "read",
            Slot::Write => "write",
            Slot::Header => "header",
            Slot::Progress => "progress",
            Slot::Debug => "debug",
        }
    }

    fn data_option(self) -> curl_sys::CURLoption {
        match self {
            Slot::Read => curl_sys::CURLOPT_READDATA,
            Slot::Write => curl_sys::CURLOPT_WRITEDATA,
            Slot::Header => curl_sys::CURLOPT_HEADERDATA,
            Slot::Progress => sys::CURLOPT_XFERINFODATA,
            Slot::Debug => curl_sys::CURLOPT_DEBUGDATA,
        }
    }

    fn function_option(self) -> curl_sys::CURLoption {
        match self {
            Slot::Read => curl_sys::CURLOPT_READFUNCTION,
            Slot::Write => curl_sys::CURLOPT_WRITEFUNCTION,
            Slot::Header => curl_sys::CURLOPT_HEADERFUNCTION,
            Slot::Progress => sys::CURLOPT_XFERINFOFUNCTION,
            Slot::Debug => curl_sys::CURLOPT_DEBUGFUNCTION,
        }
    }

    fn trampoline(self) -> *const c_void {
        match self {
            Slot::Read => read_cb as *const c_void,
            Slot::Write => write_cb as *const c_void,
            Slot::Header => header_cb as *const c_void,
            Slot::Progress => progress_cb as *const c_void,
            Slot::Debug => debug_cb as *const c_void,
        }
    }

    fn is_registered(self, state: &State) -> bool {
        let r = &state.registered;
        match self {
            Slot::Read => r.read,
            Slot::Write => r.write,
            Slot::Header => r.header,
            Slot::Progress => r.progress,
            Slot::Debug => r.debug,
        }
    }

    fn mark_registered(self, state: &mut State) {
        let r = &mut state.registered;
        match self {
            Slot::Read => r.read = true,
            Slot::Write => r.write = true,
            Slot::Header => r.header = true,
            Slot::Progress => r.progress = true,
            Slot::Debug => r.debug = true,
        }
    }
}

impl Easy {
    /// Supplies upload data. Return `Ok(0)` at end of input.
    pub fn read_function<F>(&mut self, f: F) -> Result<()>
    where
        F: FnMut(&mut [u8]) -> std::result::Result<usize, ReadError> + Send + 'static,
    {
        self.install(Slot::Read)?;
        self.state_mut().callbacks.read = Some(Box::new(f));
        Ok(())
    }

    /// Receives body data. Returning fewer bytes than given fails the
    /// transfer with `CURLE_WRITE_ERROR`.
    pub fn write_function<F>(&mut self, f: F) -> Result<()>
    where
        F: FnMut(&[u8]) -> std::result::Result<usize, WriteError> + Send + 'static,
    {
        self.install(Slot::Write)?;
        self.state_mut().callbacks.write = Some(Box::new(f));
        Ok(())
    }

    /// Receives each raw header line, including the status line and the
    /// final blank line. Returning `false` fails the transfer.
    pub fn header_function<F>(&mut self, f: F) -> Result<()>
    where
        F: FnMut(&[u8]) -> bool + Send + 'static,
    {
        self.install(Slot::Header)?;
        self.state_mut().callbacks.header = Some(Box::new(f));
        Ok(())
    }

    /// Called periodically during the transfer; returning `false` aborts it
    /// with `CURLE_ABORTED_BY_CALLBACK`. Also turns progress reporting on.
    pub fn progress_function<F>(&mut self, f: F) -> Result<()>
    where
        F: FnMut(Progress) -> bool + Send + 'static,
    {
        self.install(Slot::Progress)?;
        self.setopt_long(curl_sys::CURLOPT_NOPROGRESS, 0)?;
        self.state_mut().callbacks.progress = Some(Box::new(f));
        Ok(())
    }

    /// Receives verbose output. Only called when [`Easy::verbose`] is on.
    pub fn debug_function<F>(&mut self, f: F) -> Result<()>
    where
        F: FnMut(InfoType, &[u8]) + Send + 'static,
    {
        self.install(Slot::Debug)?;
        self.state_mut().callbacks.debug = Some(Box::new(f));
        Ok(())
    }

    /// Routes libcurl's verbose output to `tracing` under the `scurl::wire`
    /// target: informational text at debug level, header lines at trace.
    pub fn trace_to_log(&mut self) -> Result<()> {
        let id = self.id();
        self.debug_function(move |kind, data| {
            let text = String::from_utf8_lossy(data);
            let text = text.trim_end();
            match kind {
                InfoType::Text => tracing::debug!(target: "scurl::wire", %id, "* {text}"),
                InfoType::HeaderIn => tracing::trace!(target: "scurl::wire", %id, "< {text}"),
                InfoType::HeaderOut => tracing::trace!(target: "scurl::wire", %id, "> {text}"),
                _ => {}
            }
        })?;
        self.verbose(true)
    }

    fn install(&mut self, slot: Slot) -> Result<()> {
        let raw = self.raw() as *const c_void;
        self.setopt_ptr(slot.function_option(), slot.trampoline())?;
        self.setopt_ptr(slot.data_option(), raw)?;
        slot.mark_registered(self.state_mut());
        Ok(())
    }

    /// After `curl_easy_duphandle` the copied `*DATA` options still name the
    /// source handle; point every installed one at this handle instead.
    pub(super) fn retarget_callback_data(&mut self) -> Result<()> {
        let raw = self.raw() as *const c_void;
        for slot in Slot::ALL {
            if slot.is_registered(self.state()) {
                self.setopt_ptr(slot.data_option(), raw)?;
                tracing::trace!(id = %self.id(), callback = slot.name(), "retargeted callback data");
            }
        }
        Ok(())
    }
}

/// Runs `f` against the state linked to `handle`. `on_failure` is returned
/// when no state is linked or `f` panics.
fn dispatch<T>(handle: *mut CURL, slot: Slot, on_failure: T, f: impl FnOnce(&mut State) -> T) -> T {
    let Some(state) = (unsafe { State::from_handle(handle) }) else {
        tracing::warn!(callback = slot.name(), "callback fired on a handle with no linked state");
        return on_failure;
    };
    match panic::catch_unwind(AssertUnwindSafe(|| f(state))) {
        Ok(v) => v,
        Err(payload) => {
            tracing::error!(
                callback = slot.name(),
                panic = panic_message(payload.as_ref()),
                "callback panicked; failing the transfer"
            );
            on_failure
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "<non-string panic payload>"
    }
}

unsafe fn buffer<'a>(ptr: *mut c_char, size: size_t, nmemb: size_t) -> &'a mut [u8] {
    let len = size.saturating_mul(nmemb);
    if ptr.is_null() || len == 0 {
        return &mut [];
    }
    slice::from_raw_parts_mut(ptr as *mut u8, len)
}

extern "C" fn read_cb(ptr: *mut c_char, size: size_t, nmemb: size_t, data: *mut c_void) -> size_t {
    dispatch(data as *mut CURL, Slot::Read, curl_sys::CURL_READFUNC_ABORT, |state| {
        let Some(f) = state.callbacks.read.as_mut() else {
            return curl_sys::CURL_READFUNC_ABORT;
        };
        let buf = unsafe { buffer(ptr, size, nmemb) };
        let len = buf.len();
        match f(buf) {
            Ok(n) => n.min(len),
            Err(ReadError::Pause) => curl_sys::CURL_READFUNC_PAUSE,
            Err(ReadError::Abort) => curl_sys::CURL_READFUNC_ABORT,
        }
    })
}

extern "C" fn write_cb(ptr: *mut c_char, size: size_t, nmemb: size_t, data: *mut c_void) -> size_t {
    dispatch(data as *mut CURL, Slot::Write, sys::CURL_WRITEFUNC_ERROR, |state| {
        let Some(f) = state.callbacks.write.as_mut() else {
            return sys::CURL_WRITEFUNC_ERROR;
        };
        match f(unsafe { buffer(ptr, size, nmemb) }) {
            Ok(n) => n,
            Err(WriteError::Pause) => curl_sys::CURL_WRITEFUNC_PAUSE,
        }
    })
}

extern "C" fn header_cb(ptr: *mut c_char, size: size_t, nmemb: size_t, data: *mut c_void) -> size_t {
    dispatch(data as *mut CURL, Slot::Header, 0, |state| {
        let line = unsafe { buffer(ptr, size, nmemb) };
        match state.callbacks.header.as_mut() {
            Some(f) => {
                if f(line) {
                    line.len()
                } else {
                    0
                }
            }
            None => line.len(),
        }
    })
}

extern "C" fn progress_cb(
    data: *mut c_void,
    dltotal: curl_off_t,
    dlnow: curl_off_t,
    ultotal: curl_off_t,
    ulnow: curl_off_t,
) -> c_int {
    dispatch(data as *mut CURL, Slot::Progress, 1, |state| {
        let Some(f) = state.callbacks.progress.as_mut() else {
            return 0;
        };
        let progress = Progress {
            dltotal: dltotal.max(0) as u64,
            dlnow: dlnow.max(0) as u64,
            ultotal: ultotal.max(0) as u64,
            ulnow: ulnow.max(0) as u64,
        };
        if f(progress) {
            0
        } else {
            1
        }
    })
}

extern "C" fn debug_cb(
    handle: *mut CURL,
    kind: curl_infotype,
    ptr: *mut c_char,
    size: size_t,
    _data: *mut c_void,
) -> c_int {
    dispatch(handle, Slot::Debug, 0, |state| {
        if let (Some(f), Some(kind)) = (state.callbacks.debug.as_mut(), InfoType::from_raw(kind)) {
            f(kind, unsafe { buffer(ptr, 1, size) });
        }
        0
    })
}
