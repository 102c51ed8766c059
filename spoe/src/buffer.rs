use std::collections::VecDeque;
use std::sync::Mutex;

use tokio::sync::oneshot;

use crate::context::StreamId;
use crate::runtime::AppletId;

/// Identifies who is waiting for a buffer to become available.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferWaiter {
    Context(StreamId),
    Applet(AppletId),
}

/// A fixed-capacity pool of reserved I/O buffers, mirroring HAProxy's global buffer pool.
///
/// Acquisition is wait-free while buffers are available; once exhausted, callers
/// queue in FIFO order and are woken by [`BufferPool::release`] via `offer_buffers`.
#[derive(Debug)]
pub struct BufferPool {
    inner: Mutex<Inner>,
}

#[derive(Debug)]
struct Inner {
    available: usize,
    waiters: VecDeque<(BufferWaiter, oneshot::Sender<Buffer>)>,
}

/// A single reserved buffer checked out of the pool; returns to the pool on drop.
#[derive(Debug)]
pub struct Buffer {
    data: Vec<u8>,
}

impl Buffer {
    pub fn as_mut(&mut self) -> &mut Vec<u8> {
        &mut self.data
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
}

impl BufferPool {
    pub fn new(capacity: usize) -> Self {
        BufferPool {
            inner: Mutex::new(Inner {
                available: capacity,
                waiters: VecDeque::new(),
            }),
        }
    }

    /// Acquires a buffer, queuing behind any earlier waiter if none is free.
    pub async fn acquire(&self, waiter: BufferWaiter) -> Buffer {
        let rx = {
            let mut inner = self.inner.lock().unwrap();

            if inner.available > 0 {
                inner.available -= 1;

                None
            } else {
                trace!(?waiter, "buffer unavailable, queuing");

                let (tx, rx) = oneshot::channel();

                inner.waiters.push_back((waiter, tx));

                Some(rx)
            }
        };

        match rx {
            Some(rx) => rx.await.unwrap_or_else(|_| Buffer { data: Vec::new() }),
            None => Buffer { data: Vec::new() },
        }
    }

    /// Returns a buffer to the pool, then offers it to the longest-waiting caller.
    pub fn release(&self, mut buf: Buffer) {
        buf.data.clear();

        self.offer(buf);
    }

    fn offer(&self, buf: Buffer) {
        let mut inner = self.inner.lock().unwrap();

        match inner.waiters.pop_front() {
            Some((waiter, tx)) => {
                trace!(?waiter, "buffer offered");

                if tx.send(buf).is_err() {
                    // the waiter gave up (e.g. stream detached); the buffer it would
                    // have received goes back into circulation instead of being lost.
                    inner.available += 1;
                }
            }
            None => inner.available += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn acquire_is_immediate_while_capacity_remains() {
        let pool = BufferPool::new(1);

        let buf = pool.acquire(BufferWaiter::Context(1)).await;

        pool.release(buf);
    }

    #[tokio::test]
    async fn queued_waiter_is_served_on_release() {
        let pool = BufferPool::new(1);

        let first = pool.acquire(BufferWaiter::Context(1)).await;

        let pool = std::sync::Arc::new(pool);
        let waiting_pool = pool.clone();
        let waiter = tokio::spawn(async move { waiting_pool.acquire(BufferWaiter::Context(2)).await });

        // give the spawned task a chance to queue before releasing.
        tokio::task::yield_now().await;

        pool.release(first);

        let second = waiter.await.unwrap();
        pool.release(second);
    }
}
