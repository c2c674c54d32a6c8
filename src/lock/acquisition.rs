//! The acquisition poll loop, written once for every scheduling model.
//!
//! [`Acquisition::step`] performs one round of the loop and tells the driver
//! either that the lock is held or how long to wait before the next round.
//! The blocking driver sleeps the thread; the async driver awaits a timer.
//! Everything else (reentrancy, probing, timeouts) is decided here.

use super::FileLock;
use super::types::Owner;
use crate::backend::Attempt;
use crate::error::{LockError, Result};
use crate::probe;
use log::{debug, trace};
use std::time::{Duration, Instant};

/// What the driver should do after a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    /// The lock is held by this owner; its depth has been incremented.
    Done(Owner),
    /// The lock is busy; wait this long and step again.
    Wait(Duration),
}

/// State of one in-flight acquisition.
#[derive(Debug)]
pub(crate) struct Acquisition<'a> {
    lock: &'a FileLock,
    timeout: Option<Duration>,
    poll_interval: Duration,
    started: Instant,
    attempts: u32,
}

impl<'a> Acquisition<'a> {
    pub(crate) fn new(lock: &'a FileLock, timeout: Option<Duration>, poll_interval: Duration) -> Self {
        Self {
            lock,
            timeout,
            poll_interval,
            started: Instant::now(),
            attempts: 0,
        }
    }

    /// Run one round of the poll loop.
    ///
    /// A successful backend attempt is bound to the owner before this
    /// returns, so a driver that is cancelled between steps never holds an
    /// unbound handle.
    pub(crate) fn step(&mut self) -> Result<Step> {
        let owner = Owner::current(self.lock.reentrancy);

        if let Some(depth) = self.lock.reenter(owner) {
            trace!("re-entered '{}' (depth {})", self.lock.path.display(), depth);
            return Ok(Step::Done(owner));
        }

        if self.attempts == 0 {
            probe::check_would_fail(&self.lock.path)?;
        }
        self.attempts += 1;

        trace!(
            "attempt {} to lock '{}' ({})",
            self.attempts,
            self.lock.path.display(),
            self.lock.mode
        );

        match self.lock.backend.try_acquire(&self.lock.path, self.lock.mode)? {
            Attempt::Acquired(handle) => {
                self.lock.bind(owner, handle);
                debug!(
                    "acquired {} lock on '{}' after {} attempt(s)",
                    self.lock.effective_mode(),
                    self.lock.path.display(),
                    self.attempts
                );
                Ok(Step::Done(owner))
            }
            Attempt::WouldBlock => {
                let waited = self.started.elapsed();
                if let Some(timeout) = self.timeout
                    && waited >= timeout
                {
                    debug!(
                        "timed out on '{}' after {} attempt(s)",
                        self.lock.path.display(),
                        self.attempts
                    );
                    return Err(LockError::Timeout {
                        path: self.lock.path.clone(),
                        waited,
                    });
                }
                Ok(Step::Wait(self.poll_interval))
            }
        }
    }

    /// Number of backend attempts made so far.
    #[cfg(test)]
    pub(crate) fn attempts(&self) -> u32 {
        self.attempts
    }
}
