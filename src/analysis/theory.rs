//! Exact success probability of the cycle-following strategy.
//!
//! K_i: The group goes free iff the permutation has no cycle longer than the
//! open limit. Prisoner 0's cycle has each length k in 1..=m with
//! probability 1/m, and what remains is a uniform permutation of m - k
//! elements, which gives
//!
//! ```text
//! p(0) = 1
//! p(m) = (1/m) * sum_{k=1..min(m, limit)} p(m - k)
//! ```

/// `1 - ln 2`, the limit of the success probability as `n` grows with
/// `limit = n / 2`.
pub fn asymptotic_success_rate() -> f64 {
    1.0 - std::f64::consts::LN_2
}

/// Probability that a uniformly random permutation of size `n` has every
/// cycle of length at most `limit`.
pub fn group_success_probability(n: usize, limit: usize) -> f64 {
    if limit >= n {
        return 1.0;
    }
    if limit == 0 {
        return 0.0;
    }

    let mut p = Vec::with_capacity(n + 1);
    p.push(1.0_f64);
    // sum of the last `limit` entries
    let mut window = 0.0_f64;

    for m in 1..=n {
        window += p[m - 1];
        if m > limit {
            window -= p[m - 1 - limit];
        }
        p.push(window / m as f64);
    }

    p[n]
}
