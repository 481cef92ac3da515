use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::warn;

pub(crate) fn rw_read<'a, T>(
    lock: &'a RwLock<T>,
    store: &'static str,
    op: &'static str,
) -> RwLockReadGuard<'a, T> {
    match lock.read() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn!(
                op,
                store,
                lock_kind = "rwlock.read",
                result = "poisoned_recovered",
                "Index lock poisoned by a panicked writer; continuing with recovered guard"
            );
            poisoned.into_inner()
        }
    }
}

pub(crate) fn rw_write<'a, T>(
    lock: &'a RwLock<T>,
    store: &'static str,
    op: &'static str,
) -> RwLockWriteGuard<'a, T> {
    match lock.write() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn!(
                op,
                store,
                lock_kind = "rwlock.write",
                result = "poisoned_recovered",
                "Index lock poisoned by a panicked writer; continuing with recovered guard"
            );
            poisoned.into_inner()
        }
    }
}
