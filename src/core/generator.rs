//! Random value drawing.
//!
//! Values are drawn as `min + ceil(r * (max - min))` with `r` uniform in
//! `[0, 1)`. For `max > min` this yields integers in `(min, max]`: `min`
//! itself only comes out when `r` is exactly zero.

use rand::Rng;

/// Integer bounds for generated values.
///
/// `min <= max` is expected but not required; with `min > max` values fall
/// in `(max, min]` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueRange {
    pub min: i64,
    pub max: i64,
}

impl ValueRange {
    pub fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    /// Draws one value using `rng`.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> i64 {
        self.sample_from(rng.gen::<f64>())
    }

    /// Maps a unit sample `r` in `[0, 1)` onto the range.
    pub fn sample_from(&self, r: f64) -> i64 {
        let span = self.max as f64 - self.min as f64;
        self.min.saturating_add((r * span).ceil() as i64)
    }
}
