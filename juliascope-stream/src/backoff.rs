use std::time::Duration;

/// Capped exponential backoff with jitter for reconnect attempts.
///
/// Delays start at `base`, double per consecutive failure up to `cap`,
/// and each is scattered by ±25% so a fleet of clients recovering from a
/// renderer restart does not reconnect in lockstep.
#[derive(Debug)]
pub struct Backoff {
    base: Duration,
    cap: Duration,
    attempt: u32,
    rng: fastrand::Rng,
}

impl Backoff {
    /// Default reconnect policy: 250 ms doubling to a 10 s ceiling.
    pub fn for_reconnect() -> Self {
        Self::new(Duration::from_millis(250), Duration::from_secs(10))
    }

    pub fn new(base: Duration, cap: Duration) -> Self {
        Self {
            base,
            cap,
            attempt: 0,
            rng: fastrand::Rng::new(),
        }
    }

    /// Seeded constructor for deterministic tests.
    #[cfg(test)]
    fn with_seed(base: Duration, cap: Duration, seed: u64) -> Self {
        Self {
            base,
            cap,
            attempt: 0,
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    /// The delay to sleep before the next attempt, advancing the attempt
    /// counter.
    pub fn next_delay(&mut self) -> Duration {
        let exp = self
            .base
            .saturating_mul(1u32 << self.attempt.min(16))
            .min(self.cap);
        self.attempt = self.attempt.saturating_add(1);

        // ±25% jitter.
        let factor = 0.75 + self.rng.f64() * 0.5;
        exp.mul_f64(factor)
    }

    /// Forget the failure streak after a successful connection.
    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn delays_double_within_jitter_bounds() {
        let mut b = Backoff::with_seed(ms(250), Duration::from_secs(10), 42);
        for attempt in 0..5 {
            let nominal = ms(250 * (1 << attempt));
            let d = b.next_delay();
            assert!(
                d >= nominal.mul_f64(0.75) && d <= nominal.mul_f64(1.25),
                "attempt {attempt}: {d:?} outside jitter bounds of {nominal:?}"
            );
        }
    }

    #[test]
    fn delay_caps_out() {
        let mut b = Backoff::with_seed(ms(250), Duration::from_secs(10), 7);
        for _ in 0..30 {
            let d = b.next_delay();
            assert!(d <= Duration::from_secs(10).mul_f64(1.25));
        }
    }

    #[test]
    fn reset_restarts_the_streak() {
        let mut b = Backoff::with_seed(ms(250), Duration::from_secs(10), 3);
        let _ = b.next_delay();
        let _ = b.next_delay();
        assert_eq!(b.attempt(), 2);
        b.reset();
        assert_eq!(b.attempt(), 0);
        let d = b.next_delay();
        assert!(d <= ms(250).mul_f64(1.25));
    }
}
