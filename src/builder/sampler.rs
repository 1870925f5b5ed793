use rand::Rng;

/// Decide whether a metric call sampled at `rate` should be emitted.
///
/// A rate of `1.0` (or more) short-circuits to `true` without consuming the
/// random source. Rates are not validated here; callers keep them in the
/// range `(0.0, 1.0]` before asking.
pub(crate) fn should_sample(rate: f64) -> bool {
    should_sample_with(rate, &mut rand::thread_rng())
}

pub(crate) fn should_sample_with<R>(rate: f64, rng: &mut R) -> bool
where
    R: Rng,
{
    rate >= 1.0 || rng.gen_bool(rate)
}

#[cfg(test)]
mod tests {
    use super::{should_sample, should_sample_with};
    use rand::{RngCore, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    struct CountingRng {
        inner: ChaCha8Rng,
        draws: u64,
    }

    impl CountingRng {
        fn new(seed: u64) -> Self {
            CountingRng {
                inner: ChaCha8Rng::seed_from_u64(seed),
                draws: 0,
            }
        }
    }

    impl RngCore for CountingRng {
        fn next_u32(&mut self) -> u32 {
            self.draws += 1;
            self.inner.next_u32()
        }

        fn next_u64(&mut self) -> u64 {
            self.draws += 1;
            self.inner.next_u64()
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            self.draws += 1;
            self.inner.fill_bytes(dest)
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
            self.draws += 1;
            self.inner.try_fill_bytes(dest)
        }
    }

    #[test]
    fn test_rate_of_one_never_consumes_rng() {
        let mut rng = CountingRng::new(42);
        for _ in 0..100 {
            assert!(should_sample_with(1.0, &mut rng));
        }
        assert_eq!(0, rng.draws);
    }

    #[test]
    fn test_rate_of_zero_never_samples() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..100 {
            assert!(!should_sample_with(0.0, &mut rng));
        }
    }

    #[test]
    fn test_fractional_rate_samples_roughly_in_proportion() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let sampled = (0..10_000)
            .filter(|_| should_sample_with(0.5, &mut rng))
            .count();
        assert!(
            sampled > 4_500 && sampled < 5_500,
            "sampled {} calls of 10000 at rate 0.5",
            sampled
        );
    }

    #[test]
    fn test_thread_rng_entry_point() {
        assert!(should_sample(1.0));
    }
}
