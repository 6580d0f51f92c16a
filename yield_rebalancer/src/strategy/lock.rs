//! Tick Locking System
//!
//! A timeout-based lock that rejects a tick while the previous one is still
//! in flight. A lock held longer than the timeout is treated as abandoned.
//!
//! ```plain
//!                   ┌──────────┐
//!              ┌────► Unlocked │◄─────┐
//!              │    └──────────┘      │
//!              │         │            │
//! Auto-Unlock  │     try_lock        unlock
//! (Timeout)    │         │            │
//!              │         ▼            │
//!              │    ┌─────────┐       │
//!              └────┤ Locked  ├───────┘
//!                   └─────────┘
//!
//! Timeout = TICK_LOCK_TIMEOUT (3600s)
//! ```

use crate::{
    constants::TICK_LOCK_TIMEOUT,
    state::TICK_LOCK,
    utils::error::{ManagerError, ManagerResult},
};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Lock {
    /// Current lock state
    pub is_locked: bool,
    /// Last successful acquisition, in seconds
    pub last_locked_at: Option<u64>,
}

impl Lock {
    /// Acquires the lock if it is free or its holder timed out.
    pub fn try_lock(&mut self, now: u64) -> ManagerResult<()> {
        if let Some(last_locked_at) = self.last_locked_at {
            if self.is_locked && now.saturating_sub(last_locked_at) > TICK_LOCK_TIMEOUT {
                self.is_locked = false;
            }
        }

        if self.is_locked {
            return Err(ManagerError::Locked);
        }

        self.is_locked = true;
        self.last_locked_at = Some(now);
        Ok(())
    }

    pub fn unlock(&mut self) -> &mut Self {
        self.is_locked = false;
        self.last_locked_at = None;
        self
    }
}

/// Holds the canister tick lock and releases it when dropped.
pub struct TickGuard {
    _private: (),
}

impl TickGuard {
    /// `now` is the current time in seconds
    pub fn acquire(now: u64) -> ManagerResult<Self> {
        TICK_LOCK.with(|lock| lock.borrow_mut().try_lock(now))?;
        Ok(Self { _private: () })
    }
}

impl Drop for TickGuard {
    fn drop(&mut self) {
        TICK_LOCK.with(|lock| {
            lock.borrow_mut().unlock();
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquisition_fails_until_unlocked() {
        let mut lock = Lock::default();
        assert!(lock.try_lock(100).is_ok());
        assert_eq!(lock.try_lock(101), Err(ManagerError::Locked));

        lock.unlock();
        assert!(lock.try_lock(102).is_ok());
        assert_eq!(lock.last_locked_at, Some(102));
    }

    #[test]
    fn abandoned_lock_times_out() {
        let mut lock = Lock::default();
        lock.try_lock(0).unwrap();
        assert_eq!(lock.try_lock(TICK_LOCK_TIMEOUT), Err(ManagerError::Locked));
        assert!(lock.try_lock(TICK_LOCK_TIMEOUT + 1).is_ok());
    }

    #[test]
    fn guard_releases_on_drop() {
        {
            let _guard = TickGuard::acquire(10).unwrap();
            assert!(matches!(TickGuard::acquire(11), Err(ManagerError::Locked)));
        }
        assert!(TickGuard::acquire(12).is_ok());
    }
}
