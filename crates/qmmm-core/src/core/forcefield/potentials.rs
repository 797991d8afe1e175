/// 12-6 Lennard-Jones term for a squared separation `d2`.
///
/// Returns `(energy, force_scale)` where `energy = 4ε[(σ/r)^12 - (σ/r)^6]` and the force on
/// the second atom is `force_scale * r_vec`, with `r_vec` pointing from the first atom to
/// the second. `d2` must be strictly positive.
#[inline]
pub fn lennard_jones_12_6(d2: f64, sigma: f64, epsilon: f64) -> (f64, f64) {
    let c6 = (sigma * sigma / d2).powi(3);
    let c12 = c6 * c6;
    let energy = 4.0 * epsilon * (c12 - c6);
    let force_scale = 24.0 * epsilon * (2.0 * c12 - c6) / d2;
    (energy, force_scale)
}

/// Smooth cutoff switch `t(d)` and its derivative `dt/dd`.
///
/// `t = 1` up to `cutoff - width`, `t = 0` from `cutoff` on, and `1 - y²(3 - 2y)` with
/// `y = (d - cutoff + width) / width` in between. Value and first derivative are continuous
/// at both ends. An infinite `cutoff` disables switching.
#[inline]
pub fn cutoff_switch(distance: f64, cutoff: f64, width: f64) -> (f64, f64) {
    if distance >= cutoff {
        return (0.0, 0.0);
    }
    let onset = cutoff - width;
    if distance <= onset {
        return (1.0, 0.0);
    }
    let y = (distance - onset) / width;
    (1.0 - y * y * (3.0 - 2.0 * y), -6.0 / width * y * (1.0 - y))
}
