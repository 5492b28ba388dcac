//! Usage: Poison-recovering lock helper for std mutexes held only across short critical sections.

use std::sync::{Mutex, MutexGuard};

pub(crate) trait MutexExt<T> {
    /// A poisoned mutex here only means another thread panicked mid-section;
    /// the guarded maps stay structurally valid, so recover instead of
    /// cascading the panic.
    fn lock_or_recover(&self) -> MutexGuard<'_, T>;
}

impl<T> MutexExt<T> for Mutex<T> {
    fn lock_or_recover(&self) -> MutexGuard<'_, T> {
        match self.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
