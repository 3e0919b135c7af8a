//! Owned `curl_slist`, the linked list libcurl takes for custom headers.

use std::ffi::{CStr, CString};
use std::fmt;
use std::marker::PhantomData;
use std::ptr::NonNull;

use curl_sys::curl_slist;

use crate::error::{Error, Result};
use crate::handle::{Owned, RawResource};

pub(crate) struct ListResource;

impl RawResource for ListResource {
    type Target = curl_slist;
    const NAME: &'static str = "curl_slist";

    unsafe fn free(ptr: NonNull<curl_slist>) {
        curl_sys::curl_slist_free_all(ptr.as_ptr());
    }
}

/// A list of strings owned by libcurl's allocator.
///
/// The head pointer only changes when the first entry is appended, so a list
/// bound to a handle with `CURLOPT_HTTPHEADER` stays valid while it grows.
pub struct List {
    raw: Owned<ListResource>,
    len: usize,
}

// A curl_slist is plain heap data with no thread affinity.
unsafe impl Send for List {}

impl List {
    pub fn new() -> Self {
        Self {
            raw: Owned::empty(),
            len: 0,
        }
    }

    /// Builds a list from an iterator of entries, failing on the first bad one.
    pub fn try_from_iter<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = List::new();
        for entry in entries {
            list.append(entry.as_ref())?;
        }
        Ok(list)
    }

    /// Appends a copy of `entry`.
    pub fn append(&mut self, entry: &str) -> Result<()> {
        self.append_bytes(entry.as_bytes())
    }

    fn append_bytes(&mut self, entry: &[u8]) -> Result<()> {
        let entry = CString::new(entry).map_err(|_| Error::Nul)?;
        let head = unsafe { curl_sys::curl_slist_append(self.raw.as_ptr(), entry.as_ptr()) };
        if head.is_null() {
            return Err(Error::out_of_memory());
        }
        if !self.raw.is_valid() {
            unsafe { self.raw.acquire(head) };
        }
        self.len += 1;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Frees every entry; the list is empty afterwards.
    pub fn clear(&mut self) {
        self.raw.destroy();
        self.len = 0;
    }

    /// Deep copy through libcurl's allocator.
    pub fn try_clone(&self) -> Result<Self> {
        let mut copy = List::new();
        for entry in self.iter() {
            copy.append_bytes(entry)?;
        }
        Ok(copy)
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter {
            cur: self.raw.as_ptr(),
            _list: PhantomData,
        }
    }

    /// Head pointer for `CURLOPT_HTTPHEADER` and friends; null when empty.
    pub fn raw(&self) -> *mut curl_slist {
        self.raw.as_ptr()
    }
}

impl Default for List {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.iter().map(String::from_utf8_lossy))
            .finish()
    }
}

impl<'a> IntoIterator for &'a List {
    type Item = &'a [u8];
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

/// Borrowing iterator over the raw entries of a [`List`].
pub struct Iter<'a> {
    cur: *mut curl_slist,
    _list: PhantomData<&'a List>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        if self.cur.is_null() {
            return None;
        }
        unsafe {
            let node = &*self.cur;
            self.cur = node.next;
            Some(CStr::from_ptr(node.data).to_bytes())
        }
    }
}
