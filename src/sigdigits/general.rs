// Distribution-free estimator

/// Largest k in 1..=53 such that every |z| ≤ 2^-k, counting up from 1
pub(super) fn significant_bits(errors: &[f64]) -> f64 {
    let worst = errors.iter().fold(0.0_f64, |acc, z| acc.max(z.abs()));

    let mut bits = 0;
    let mut bound = 1.0_f64;
    for k in 1..=super::MAX_BITS as u32 {
        bound /= 2.0;
        if worst > bound {
            break;
        }
        bits = k;
    }

    f64::from(bits)
}
