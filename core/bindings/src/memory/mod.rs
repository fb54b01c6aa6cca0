//! In-memory bindings for testing.
//!
//! Useful for tests and local development. All data is stored in memory
//! and lost on drop. Clones share the same storage.

mod blob;
mod database;
mod kv;

pub use blob::MemoryBlob;
pub use database::{DatabaseCall, MemoryDatabase};
pub use kv::MemoryKv;

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// Slice one page out of an ordered key sequence.
///
/// The cursor is the last key of the previous page; the next page starts
/// strictly after it. Returns the page and the cursor for the following
/// page, if any.
fn paginate<'a, I>(
    keys: I,
    prefix: Option<&str>,
    limit: usize,
    cursor: Option<&str>,
) -> (Vec<&'a String>, Option<String>)
where
    I: Iterator<Item = &'a String>,
{
    let mut matching = keys
        .filter(|key| prefix.map_or(true, |p| key.starts_with(p)))
        .filter(|key| cursor.map_or(true, |c| key.as_str() > c))
        .peekable();

    let mut page = Vec::new();
    while page.len() < limit {
        match matching.next() {
            Some(key) => page.push(key),
            None => break,
        }
    }

    let next_cursor = if matching.peek().is_some() {
        page.last().map(|key| (*key).clone())
    } else {
        None
    };
    (page, next_cursor)
}
