//! Thin platform adapters.
//!
//! On the target embedded kernel these would be real shims over the host's
//! atomics, spinlocks, thread priorities, and logging. Here they are the
//! closest portable Rust equivalents: `std::thread` for workers, a
//! hand-rolled spin guard for the analyzer's short critical section, and
//! `tracing` for logging (no module-scoped or global logger object — see
//! crate docs).

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::WorkerPriority;

/// Best-effort hint applied to the calling thread before it enters a
/// worker loop. Real thread-priority classes are kernel-specific; this is
/// a no-op placeholder that a platform integration swaps for the target's
/// scheduler API. Logged once so the gap is visible rather than silent.
pub fn apply_priority_hint(priority: WorkerPriority) {
    tracing::trace!(priority = priority.0, "worker priority hint (no-op on this platform)");
}

/// A short, non-parking mutual-exclusion guard.
///
/// Suitable only for critical sections held for tens to hundreds of
/// nanoseconds, such as the spectrum analyzer's result-field copy. Unlike
/// `std::sync::Mutex`, a stalled holder spins the waiter rather than
/// parking it — the right trade when the critical section never blocks or
/// allocates.
pub struct SpinLock<T> {
    locked: AtomicBool,
    value: UnsafeCell<T>,
}

unsafe impl<T: Send> Sync for SpinLock<T> {}

impl<T> SpinLock<T> {
    pub const fn new(value: T) -> Self {
        Self {
            locked: AtomicBool::new(false),
            value: UnsafeCell::new(value),
        }
    }

    pub fn lock(&self) -> SpinLockGuard<'_, T> {
        while self
            .locked
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            std::hint::spin_loop();
        }
        SpinLockGuard { lock: self }
    }
}

pub struct SpinLockGuard<'a, T> {
    lock: &'a SpinLock<T>,
}

impl<T> std::ops::Deref for SpinLockGuard<'_, T> {
    type Target = T;
    fn deref(&self) -> &T {
        unsafe { &*self.lock.value.get() }
    }
}

impl<T> std::ops::DerefMut for SpinLockGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        unsafe { &mut *self.lock.value.get() }
    }
}

impl<T> Drop for SpinLockGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.locked.store(false, Ordering::Release);
    }
}
