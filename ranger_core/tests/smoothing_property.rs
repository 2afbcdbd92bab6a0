//! Property test: the smoothing output always equals the exact mean of the
//! most recent `window` samples, however many were pushed.

use proptest::prelude::*;
use ranger_core::SmoothingFilter;

proptest! {
    #[test]
    fn mean_matches_the_trailing_window(
        values in proptest::collection::vec(0u16..=2000, 1..40),
        window in 1usize..=12,
    ) {
        let mut filter = SmoothingFilter::new(window);
        let mut out = 0.0;
        for &v in &values {
            out = filter.push(v);
        }
        let tail: Vec<u16> = values.iter().rev().take(window).copied().collect();
        let expect = tail.iter().map(|&v| f64::from(v)).sum::<f64>() / tail.len() as f64;
        prop_assert!(
            (out - expect).abs() < 1e-9,
            "got {out}, expected {expect} over tail {tail:?}"
        );
    }

    #[test]
    fn output_is_bounded_by_window_extremes(
        values in proptest::collection::vec(0u16..=u16::MAX, 1..30),
    ) {
        let mut filter = SmoothingFilter::new(10);
        let mut out = 0.0;
        for &v in &values {
            out = filter.push(v);
        }
        let tail: Vec<u16> = values.iter().rev().take(10).copied().collect();
        let lo = f64::from(*tail.iter().min().unwrap());
        let hi = f64::from(*tail.iter().max().unwrap());
        prop_assert!(out >= lo && out <= hi);
    }
}
