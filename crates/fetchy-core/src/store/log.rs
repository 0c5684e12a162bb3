//! Append-only job log shared between record snapshots.
//!
//! A [`JobLog`] is a view of the first `len` bytes of a shared buffer. Bytes
//! below `len` are never changed, so a cloned record keeps seeing exactly the
//! text it was cloned with while newer records append past it. Cloning is O(1)
//! and appending from the newest view does not copy the existing text.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

#[derive(Clone, Default)]
pub struct JobLog {
    buf: Arc<RwLock<String>>,
    len: usize,
}

impl JobLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Copy of this view with `line` and a newline appended.
    ///
    /// When this view ends where the shared buffer ends, the text is pushed in
    /// place. Otherwise another view has already appended past it (for example
    /// an update the store rejected), and this view's text is moved to a fresh
    /// buffer first.
    pub fn with_line(&self, line: &str) -> Self {
        {
            let mut buf = self.buf.write().unwrap_or_else(PoisonError::into_inner);
            if buf.len() == self.len {
                buf.push_str(line);
                buf.push('\n');
                return Self {
                    buf: Arc::clone(&self.buf),
                    len: buf.len(),
                };
            }
        }
        let mut fresh = String::with_capacity(self.len + line.len() + 1);
        self.with_text(|text| fresh.push_str(text));
        fresh.push_str(line);
        fresh.push('\n');
        Self::from(fresh)
    }

    /// Run `f` on the text of this view without copying it.
    pub fn with_text<R>(&self, f: impl FnOnce(&str) -> R) -> R {
        let buf = self.buf.read().unwrap_or_else(PoisonError::into_inner);
        f(&buf[..self.len])
    }

    pub fn contains(&self, pattern: &str) -> bool {
        self.with_text(|text| text.contains(pattern))
    }

    #[cfg(test)]
    pub(crate) fn shares_buffer_with(&self, other: &JobLog) -> bool {
        Arc::ptr_eq(&self.buf, &other.buf)
    }
}

impl From<String> for JobLog {
    fn from(text: String) -> Self {
        let len = text.len();
        Self {
            buf: Arc::new(RwLock::new(text)),
            len,
        }
    }
}

impl From<&str> for JobLog {
    fn from(text: &str) -> Self {
        Self::from(text.to_string())
    }
}

impl fmt::Display for JobLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.with_text(|text| f.write_str(text))
    }
}

impl fmt::Debug for JobLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobLog").field("len", &self.len).finish()
    }
}

impl PartialEq for JobLog {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len
            && (Arc::ptr_eq(&self.buf, &other.buf)
                || self.with_text(|a| other.with_text(|b| a == b)))
    }
}

impl PartialEq<&str> for JobLog {
    fn eq(&self, other: &&str) -> bool {
        self.with_text(|text| text == *other)
    }
}
