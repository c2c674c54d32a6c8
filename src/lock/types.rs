//! Ownership bookkeeping for lock holdings.

use crate::backend::LockHandle;
use crate::config::Reentrancy;
use std::thread::{self, ThreadId};

/// Key of a holding entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Owner {
    /// The holding belongs to one thread.
    Thread(ThreadId),
    /// The holding belongs to the lock instance as a whole.
    Instance,
}

impl Owner {
    /// Owner key for the calling thread under the given reentrancy scope.
    pub(crate) fn current(reentrancy: Reentrancy) -> Self {
        match reentrancy {
            Reentrancy::PerThread => Owner::Thread(thread::current().id()),
            Reentrancy::Shared => Owner::Instance,
        }
    }
}

/// An OS lock held by one owner, with its reentrancy depth.
///
/// `depth` is at least 1 for as long as the entry exists.
#[derive(Debug)]
pub(crate) struct Holding {
    pub(crate) handle: LockHandle,
    pub(crate) depth: usize,
}
