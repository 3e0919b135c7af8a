//! Generic owner of a single native libcurl pointer.
//!
//! `Owned<R>` holds at most one pointer of resource kind `R` and frees it
//! exactly once: on `destroy`, on `acquire` of a different pointer, or on drop.
//! `release` hands the pointer back out without freeing it.

use std::fmt;
use std::marker::PhantomData;
use std::ptr::{self, NonNull};

/// A kind of native resource: the pointee type and how to free it.
pub(crate) trait RawResource {
    type Target;

    /// Name used in log lines.
    const NAME: &'static str;

    /// Frees a pointer obtained from libcurl.
    ///
    /// # Safety
    ///
    /// `ptr` must be live and not owned by anything else.
    unsafe fn free(ptr: NonNull<Self::Target>);
}

pub(crate) struct Owned<R: RawResource> {
    ptr: Option<NonNull<R::Target>>,
    _kind: PhantomData<R>,
}

impl<R: RawResource> Owned<R> {
    pub(crate) const fn empty() -> Self {
        Self {
            ptr: None,
            _kind: PhantomData,
        }
    }

    /// Takes ownership of `raw`; a null pointer yields an empty owner.
    ///
    /// # Safety
    ///
    /// `raw` must be null or a live pointer of kind `R` owned by nobody else.
    pub(crate) unsafe fn from_raw(raw: *mut R::Target) -> Self {
        Self {
            ptr: NonNull::new(raw),
            _kind: PhantomData,
        }
    }

    pub(crate) fn is_valid(&self) -> bool {
        self.ptr.is_some()
    }

    /// The owned pointer, or null when empty. Ownership is kept.
    pub(crate) fn as_ptr(&self) -> *mut R::Target {
        self.ptr.map_or(ptr::null_mut(), NonNull::as_ptr)
    }

    /// Gives up ownership without freeing; the owner becomes empty.
    pub(crate) fn release(&mut self) -> *mut R::Target {
        self.ptr.take().map_or(ptr::null_mut(), NonNull::as_ptr)
    }

    /// Frees the current pointer (if any, and if different) and adopts `raw`.
    ///
    /// # Safety
    ///
    /// Same contract as [`Owned::from_raw`].
    pub(crate) unsafe fn acquire(&mut self, raw: *mut R::Target) {
        if self.as_ptr() == raw {
            return;
        }
        self.destroy();
        self.ptr = NonNull::new(raw);
    }

    pub(crate) fn destroy(&mut self) {
        if let Some(ptr) = self.ptr.take() {
            tracing::trace!(resource = R::NAME, ?ptr, "freeing native handle");
            unsafe { R::free(ptr) }
        }
    }
}

impl<R: RawResource> Default for Owned<R> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<R: RawResource> Drop for Owned<R> {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl<R: RawResource> fmt::Debug for Owned<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple(R::NAME).field(&self.as_ptr()).finish()
    }
}
