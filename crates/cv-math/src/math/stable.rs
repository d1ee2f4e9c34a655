//! Numerically stable primitives for probability-domain math.

/// Probabilities are clamped into `[EPS, 1 - EPS]` before taking logs.
pub const PROB_EPS: f64 = 1e-15;

/// Logistic function that never overflows.
///
/// For large negative inputs `exp(-x)` would overflow, so the
/// algebraically equivalent `exp(x) / (1 + exp(x))` is used instead.
pub fn sigmoid(x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Stable log(1 + exp(x)).
pub fn log1p_exp(x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    if x > 0.0 {
        x + (-x).exp().ln_1p()
    } else {
        x.exp().ln_1p()
    }
}

/// Log-odds of a probability, clamped away from 0 and 1.
pub fn logit(p: f64) -> f64 {
    let p = clamp_probability(p);
    (p / (1.0 - p)).ln()
}

/// Clamp a probability into `[PROB_EPS, 1 - PROB_EPS]`.
pub fn clamp_probability(p: f64) -> f64 {
    p.clamp(PROB_EPS, 1.0 - PROB_EPS)
}

/// Binary cross-entropy of one prediction, computed from the raw margin.
///
/// `log(1 + exp(-m))` for positives and `log(1 + exp(m))` for negatives,
/// which stays finite for any finite margin.
pub fn log_loss_from_margin(margin: f64, positive: bool) -> f64 {
    if positive {
        log1p_exp(-margin)
    } else {
        log1p_exp(margin)
    }
}
