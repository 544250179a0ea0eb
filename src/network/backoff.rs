//! Exponential reconnect backoff.

use std::time::Duration;

/// Shift ceiling; 2^32 seconds is already far beyond any sane cap.
const MAX_EXPONENT: u32 = 32;

/// Reconnect backoff state carried from one connection instance to its
/// replacement after an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Backoff {
    exponent: u32,
}

impl Backoff {
    /// Number of consecutive waits since the last reset.
    pub fn attempts(&self) -> u32 {
        self.exponent
    }

    /// Delay for the next reconnect, `min(2^n, max)` seconds, advancing `n`.
    pub fn next_delay(&mut self, max: Duration) -> Duration {
        let delay = Duration::from_secs(1u64 << self.exponent).min(max);
        self.exponent = (self.exponent + 1).min(MAX_EXPONENT);
        delay
    }

    /// Called once a connection has registered successfully.
    pub fn reset(&mut self) {
        self.exponent = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grows_exponentially_until_cap() {
        let max = Duration::from_secs(10);
        let mut backoff = Backoff::default();
        let delays: Vec<u64> = (0..6).map(|_| backoff.next_delay(max).as_secs()).collect();
        assert_eq!(delays, vec![1, 2, 4, 8, 10, 10]);
        assert_eq!(backoff.attempts(), 6);
    }

    #[test]
    fn test_reset() {
        let mut backoff = Backoff::default();
        backoff.next_delay(Duration::from_secs(60));
        backoff.next_delay(Duration::from_secs(60));
        backoff.reset();
        assert_eq!(backoff, Backoff::default());
    }

    #[test]
    fn test_exponent_saturates() {
        let mut backoff = Backoff::default();
        for _ in 0..100 {
            backoff.next_delay(Duration::from_secs(3600));
        }
        assert_eq!(backoff.attempts(), MAX_EXPONENT);
        assert_eq!(
            backoff.next_delay(Duration::from_secs(3600)),
            Duration::from_secs(3600)
        );
    }
}
