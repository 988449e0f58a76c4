//! Closed numeric ranges used for randomized tuning values

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Inclusive `[min, max]` range of `f32`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub min: f32,
    pub max: f32,
}

impl Span {
    #[must_use]
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Degenerate range holding a single value
    #[must_use]
    pub const fn fixed(value: f32) -> Self {
        Self::new(value, value)
    }

    /// Draw a value uniformly from the range
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        if self.min >= self.max {
            return self.min;
        }
        rng.gen_range(self.min..=self.max)
    }

    #[must_use]
    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }

    /// Finite and ordered
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_sample_stays_in_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let span = Span::new(8.0, 23.0);
        for _ in 0..1000 {
            assert!(span.contains(span.sample(&mut rng)));
        }
    }

    #[test]
    fn test_fixed_span() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        assert_eq!(Span::fixed(2.5).sample(&mut rng), 2.5);
    }

    #[test]
    fn test_validity() {
        assert!(Span::new(0.0, 1.0).is_valid());
        assert!(!Span::new(1.0, 0.0).is_valid());
        assert!(!Span::new(f32::NAN, 1.0).is_valid());
    }
}
