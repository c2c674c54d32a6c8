//! Exit code constants for the pathlock CLI.
//!
//! - 0: Success
//! - 1: User error (bad args, invalid config)
//! - 2: Timed out waiting for the lock
//! - 3: Lock path is unusable (permission denied, directory)
//! - 4: Backend failure (I/O error, unsupported filesystem)
//! - 5: Protocol misuse (release without holding, upgrade)
//!
//! `pathlock run` exits with the child's own code when the child ran.

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments or invalid configuration.
pub const USER_ERROR: i32 = 1;

/// The lock stayed held for the whole timeout.
pub const TIMEOUT: i32 = 2;

/// The lock path can never be acquired.
pub const UNUSABLE_PATH: i32 = 3;

/// The locking backend failed for a reason other than contention.
pub const BACKEND_FAILURE: i32 = 4;

/// The acquire/release protocol was violated.
pub const PROTOCOL_MISUSE: i32 = 5;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct() {
        let codes = [
            SUCCESS,
            USER_ERROR,
            TIMEOUT,
            UNUSABLE_PATH,
            BACKEND_FAILURE,
            PROTOCOL_MISUSE,
        ];
        for (i, &a) in codes.iter().enumerate() {
            for (j, &b) in codes.iter().enumerate() {
                if i != j {
                    assert_ne!(a, b, "Exit codes must be distinct");
                }
            }
        }
    }
}
