//! Lock-protected circular queue for newline-terminated text messages.
//!
//! The queue hands diagnostic text from interrupt context to a consumer
//! task without loss or corruption: producers (including interrupt
//! handlers) append whole messages, the consumer drains them one at a
//! time. The mutual-exclusion lock is held for the full duration of each
//! append or drain call and never across an I/O wait.
//!
//! Appends are atomic: a message is either fully written or not written at
//! all, so the buffer always contains zero or more complete messages.
//!
//! ## Example
//!
//! ```rust,no_run
//! use knx_tpuart::queue::MessageQueue;
//!
//! let queue: MessageQueue<64> = MessageQueue::new();
//! queue.push(b"PH state -> 02\n").unwrap();
//!
//! let mut buf = [0u8; 32];
//! let n = queue.pop(&mut buf).unwrap();
//! assert_eq!(&buf[..n], b"PH state -> 02\n");
//! ```

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

use crate::error::{Result, TpuartError};

/// Capacity of the diagnostic trace queue in bytes.
pub const TRACE_QUEUE_CAPACITY: usize = 4096;

/// Queue profile used for diagnostic trace lines.
pub type TraceQueue = MessageQueue<TRACE_QUEUE_CAPACITY>;

struct Inner<const N: usize> {
    data: [u8; N],
    /// Read cursor: start of the oldest stored message.
    read: usize,
    /// Write cursor: one past the newest stored byte.
    write: usize,
    free: usize,
    used: usize,
}

impl<const N: usize> Inner<N> {
    const fn new() -> Self {
        Self {
            data: [0; N],
            read: 0,
            write: 0,
            free: N,
            used: 0,
        }
    }
}

/// Fixed-capacity circular byte buffer holding newline-terminated messages.
///
/// Safe for multiple producers (including interrupt context) and one
/// consumer; every operation runs under a critical-section mutex. The
/// invariant `free_bytes() + used_bytes() == N` holds after every call.
pub struct MessageQueue<const N: usize> {
    inner: Mutex<CriticalSectionRawMutex, RefCell<Inner<N>>>,
}

impl<const N: usize> MessageQueue<N> {
    /// Create an empty queue.
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Inner::new())),
        }
    }

    /// Append one message, up to and including its first `\n`.
    ///
    /// Returns a Full error without touching the buffer when the message
    /// does not fit in the current free space, and a MissingTerminator
    /// error when `msg` contains no `\n` at all.
    pub fn push(&self, msg: &[u8]) -> Result<()> {
        let len = msg
            .iter()
            .position(|&b| b == b'\n')
            .ok_or_else(TpuartError::missing_terminator)?
            + 1;

        self.inner.lock(|cell| {
            let mut inner = cell.borrow_mut();
            if len > inner.free {
                return Err(TpuartError::queue_full());
            }

            let mut write = inner.write;
            for &byte in &msg[..len] {
                inner.data[write] = byte;
                write += 1;
                if write == N {
                    write = 0;
                }
            }
            inner.write = write;
            inner.free -= len;
            inner.used += len;
            Ok(())
        })
    }

    /// Drain the oldest complete message into `buf`, returning its length
    /// (terminator included).
    ///
    /// Returns `Ok(0)` when no complete message is stored. When `buf` is
    /// smaller than the next message, returns a TooSmall error and leaves
    /// the read cursor in place, so a later call with a larger buffer
    /// returns the same message.
    pub fn pop(&self, buf: &mut [u8]) -> Result<usize> {
        self.inner.lock(|cell| {
            let mut inner = cell.borrow_mut();
            if inner.used == 0 {
                return Ok(0);
            }

            // Length of the oldest message, terminator included.
            let mut len = 0;
            let mut idx = inner.read;
            let mut found = false;
            while len < inner.used {
                len += 1;
                if inner.data[idx] == b'\n' {
                    found = true;
                    break;
                }
                idx += 1;
                if idx == N {
                    idx = 0;
                }
            }
            if !found {
                return Ok(0);
            }
            if len > buf.len() {
                return Err(TpuartError::queue_too_small());
            }

            let mut read = inner.read;
            for slot in buf.iter_mut().take(len) {
                *slot = inner.data[read];
                read += 1;
                if read == N {
                    read = 0;
                }
            }
            inner.read = read;
            inner.free += len;
            inner.used -= len;
            Ok(len)
        })
    }

    /// Total capacity in bytes.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Bytes currently free.
    pub fn free_bytes(&self) -> usize {
        self.inner.lock(|cell| cell.borrow().free)
    }

    /// Bytes currently holding message data.
    pub fn used_bytes(&self) -> usize {
        self.inner.lock(|cell| cell.borrow().used)
    }
}

impl<const N: usize> Default for MessageQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> core::fmt::Debug for MessageQueue<N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MessageQueue")
            .field("capacity", &N)
            .field("used", &self.used_bytes())
            .finish()
    }
}
