//! Wall-clock access.

use std::time::{SystemTime, UNIX_EPOCH};

use super::RealRuntime;

impl RealRuntime {
    pub(crate) fn now_ms_impl(&self) -> u64 {
        // A clock set before 1970 reads as the epoch.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use crate::runtime::{RealRuntime, Runtime};

    #[test]
    fn test_real_runtime_clock_moves_forward() {
        let runtime = RealRuntime;

        let first = runtime.now_ms();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = runtime.now_ms();

        // 2020-01-01T00:00:00Z
        assert!(first > 1_577_836_800_000);
        assert!(second >= first);
    }
}
