//! Shapiro-Wilk normality test
//!
//! Royston's AS R94 approximation (coefficients, W statistic and p-value),
//! valid for 3 ≤ n ≤ 5000. The p-value decides which significant-digits
//! estimator a sample set gets: data that looks normal can use the sharper
//! Centered Normal Hypothesis bound.

use statrs::distribution::{ContinuousCDF, Normal};
use std::f64::consts::{FRAC_1_SQRT_2, PI};

/// Result of a Shapiro-Wilk test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapiroWilk {
    /// W statistic in (0, 1]; 1 for a perfectly normal-looking sample
    pub w: f64,
    /// Probability of a W this small under normality
    pub pvalue: f64,
}

/// Minimum sample size for which the test is defined
pub const MIN_SAMPLES: usize = 3;

const C1: [f64; 6] = [0.0, 0.221157, -0.147981, -2.07119, 4.434685, -2.706056];
const C2: [f64; 6] = [0.0, 0.042981, -0.293762, -1.752461, 5.682633, -3.582633];
const C3: [f64; 4] = [0.544, -0.39978, 0.025054, -6.714e-4];
const C4: [f64; 4] = [1.3822, -0.77857, 0.062767, -0.0020322];
const C5: [f64; 4] = [-1.5861, -0.31082, -0.083751, 0.0038915];
const C6: [f64; 3] = [-0.4803, -0.082676, 0.0030302];
const G: [f64; 2] = [-2.273, 0.459];

/// p-value reported when W falls below the small-sample lower bound
const PVALUE_FLOOR: f64 = 1e-99;

/// Run the test on `samples` (any order)
///
/// Returns `None` for fewer than [`MIN_SAMPLES`] values or non-finite input.
/// A constant sample has W = 1 and p = 1.
pub fn shapiro_wilk(samples: &[f64]) -> Option<ShapiroWilk> {
    let n = samples.len();
    if n < MIN_SAMPLES || samples.iter().any(|v| !v.is_finite()) {
        return None;
    }

    let mut x = samples.to_vec();
    x.sort_by(f64::total_cmp);

    let range = x[n - 1] - x[0];
    if range == 0.0 {
        return Some(ShapiroWilk { w: 1.0, pvalue: 1.0 });
    }

    let normal = Normal::new(0.0, 1.0).ok()?;
    let a = coefficients(n, &normal);

    // W is affine invariant: work on (x - min) / range for conditioning
    let scaled: Vec<f64> = x.iter().map(|v| (v - x[0]) / range).collect();
    let mean = scaled.iter().sum::<f64>() / n as f64;
    let ssq: f64 = scaled.iter().map(|v| (v - mean) * (v - mean)).sum();

    let numerator: f64 = a
        .iter()
        .enumerate()
        .map(|(i, ai)| ai * (scaled[n - 1 - i] - scaled[i]))
        .sum();
    let w = (numerator * numerator / ssq).min(1.0);

    Some(ShapiroWilk {
        w,
        pvalue: pvalue(w, n, &normal),
    })
}

/// Antisymmetric weights a_1..a_{n/2} (positive, lower half mirrored)
fn coefficients(n: usize, normal: &Normal) -> Vec<f64> {
    let half = n / 2;
    let mut a = vec![0.0; half];

    if n == 3 {
        a[0] = FRAC_1_SQRT_2;
        return a;
    }

    let an25 = n as f64 + 0.25;
    let m: Vec<f64> = (1..=half)
        .map(|i| normal.inverse_cdf((i as f64 - 0.375) / an25))
        .collect();

    let summ2 = 2.0 * m.iter().map(|mi| mi * mi).sum::<f64>();
    let ssumm2 = summ2.sqrt();
    let rsn = 1.0 / (n as f64).sqrt();
    let a1 = poly(&C1, rsn) - m[0] / ssumm2;

    let (first_plain, fac) = if n > 5 {
        let a2 = -m[1] / ssumm2 + poly(&C2, rsn);
        a[1] = a2;
        let fac = ((summ2 - 2.0 * m[0] * m[0] - 2.0 * m[1] * m[1])
            / (1.0 - 2.0 * a1 * a1 - 2.0 * a2 * a2))
            .sqrt();
        (2, fac)
    } else {
        let fac = ((summ2 - 2.0 * m[0] * m[0]) / (1.0 - 2.0 * a1 * a1)).sqrt();
        (1, fac)
    };
    a[0] = a1;

    for i in first_plain..half {
        a[i] = -m[i] / fac;
    }

    a
}

fn pvalue(w: f64, n: usize, normal: &Normal) -> f64 {
    if n == 3 {
        // Exact distribution for n = 3
        let stqr = (0.75f64).sqrt().asin();
        let pw = 6.0 / PI * (w.sqrt().asin() - stqr);
        return pw.clamp(0.0, 1.0);
    }

    let w1 = 1.0 - w;
    if w1 <= 0.0 {
        return 1.0;
    }

    let an = n as f64;
    let mut y = w1.ln();
    let (m, s) = if n <= 11 {
        let gamma = poly(&G, an);
        if y >= gamma {
            return PVALUE_FLOOR;
        }
        y = -(gamma - y).ln();
        (poly(&C3, an), poly(&C4, an).exp())
    } else {
        let xx = an.ln();
        (poly(&C5, xx), poly(&C6, xx).exp())
    };

    // Upper tail of the standard normal
    normal.cdf(-(y - m) / s)
}

/// c[0] + c[1]·x + c[2]·x² + ...
fn poly(c: &[f64], x: f64) -> f64 {
    c.iter().rev().fold(0.0, |acc, ci| acc * x + ci)
}
