//! Property-based tests for the statistics engine
//!
//! Core properties:
//! 1. Quantile summaries are ordered
//! 2. Base-10 significant digits are the base-2 estimate scaled by log10(2)
//! 3. Estimation method switches exactly at the normality threshold
//! 4. Sample-weighted means reduce to arithmetic means for equal weights
//! 5. Run labels are reproducible after a reset
//! 6. Hex-float rendering is parsed back bit-exactly

use numrepro::aggregate::weighted_mean;
use numrepro::hexfloat::{format_hex_f64, parse_hex_f64};
use numrepro::keys::SampleKey;
use numrepro::labels::RunLabeler;
use numrepro::outliers::remove_outliers;
use numrepro::run_stats::StatisticsComputer;
use numrepro::sigdigits::{Method, SignificantDigits};
use numrepro::stats::{mean, Distribution};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_distribution_is_ordered(values in prop::collection::vec(-1e6f64..1e6, 1..60)) {
        let d = Distribution::from_values(&values).unwrap();
        prop_assert!(d.min <= d.q25);
        prop_assert!(d.q25 <= d.q50);
        prop_assert!(d.q50 <= d.q75);
        prop_assert!(d.q75 <= d.max);
    }

    #[test]
    fn prop_base10_digits_follow_base2(values in prop::collection::vec(0.5f64..2.0, 1..40)) {
        let key = SampleKey::new("prop", "x", "mca");
        let row = StatisticsComputer::default().compute(&key, 0, &values).unwrap();

        match (row.s_base2, row.s_base10) {
            (SignificantDigits::Digits(s2), SignificantDigits::Digits(s10)) => {
                let expected = s2 * std::f64::consts::LOG10_2;
                prop_assert!((s10 - expected).abs() <= 1e-12 * expected.abs().max(1.0));
            }
            (SignificantDigits::Maximal, SignificantDigits::Maximal) => {}
            (SignificantDigits::Undefined, SignificantDigits::Undefined) => {}
            (s2, s10) => prop_assert!(false, "mismatched kinds {:?} / {:?}", s2, s10),
        }
    }

    #[test]
    fn prop_method_threshold(p in 0.0f64..=1.0, threshold in 0.001f64..0.999) {
        let method = Method::select(Some(p), threshold);
        if p < threshold {
            prop_assert_eq!(method, Method::General);
        } else {
            prop_assert_eq!(method, Method::Cnh);
        }
    }

    #[test]
    fn prop_equal_weights_give_arithmetic_mean(
        values in prop::collection::vec(-1e3f64..1e3, 1..50),
        weight in 1usize..100,
    ) {
        let weighted = weighted_mean(values.iter().map(|v| (*v, weight))).unwrap();
        let plain = mean(&values).unwrap();
        prop_assert!((weighted - plain).abs() <= 1e-9 * plain.abs().max(1.0));
    }

    #[test]
    fn prop_labels_reproducible_after_reset(
        offsets in prop::collection::vec(0i64..400 * 86_400, 1..20),
    ) {
        let now = 1_700_000_000;
        let mut timestamps: Vec<i64> = offsets.iter().map(|o| now - o).collect();
        timestamps.sort_unstable();

        let mut labeler = RunLabeler::new();
        let first: Vec<String> = timestamps.iter().map(|t| labeler.label(*t, None, now)).collect();
        labeler.reset();
        let second: Vec<String> = timestamps.iter().map(|t| labeler.label(*t, None, now)).collect();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_hex_float_is_bit_exact(
        value in prop::num::f64::NORMAL | prop::num::f64::SUBNORMAL | prop::num::f64::ZERO,
    ) {
        let parsed = parse_hex_f64(&format_hex_f64(value)).unwrap();
        prop_assert_eq!(parsed.to_bits(), value.to_bits());
    }

    #[test]
    fn prop_outlier_removal_keeps_a_subsequence(
        values in prop::collection::vec(-1e3f64..1e3, 0..40),
        zscore in 0.5f64..5.0,
    ) {
        let kept = remove_outliers(&values, zscore);
        prop_assert!(kept.len() <= values.len());
        let mut rest = values.iter();
        for v in &kept {
            prop_assert!(rest.any(|x| x == v));
        }
    }
}

#[test]
fn test_method_boundary_at_default_threshold() {
    assert_eq!(Method::select(Some(0.04999), 0.05), Method::General);
    assert_eq!(Method::select(Some(0.05), 0.05), Method::Cnh);
    assert_eq!(Method::select(None, 0.05), Method::General);
}

#[test]
fn test_constant_samples_are_maximal() {
    let key = SampleKey::new("dot", "result", "mca");
    let row = StatisticsComputer::default()
        .compute(&key, 0, &[1.0, 1.0, 1.0, 1.0])
        .unwrap();
    assert_eq!(row.mu, 1.0);
    assert_eq!(row.sigma, 0.0);
    assert_eq!(row.s_base2, SignificantDigits::Maximal);
    assert_eq!(row.s_base10, SignificantDigits::Maximal);
}

#[test]
fn test_weighted_mean_example() {
    let mu = weighted_mean([(1.0, 10), (2.0, 10), (3.0, 20)]).unwrap();
    assert!((mu - 2.25).abs() < 1e-12);
}
