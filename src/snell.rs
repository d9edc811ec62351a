//! Snell's law for light crossing a boundary between two clear media.
//!
//! Refractive indices are real here: absorption inside a medium is handled
//! separately by the Beer-Lambert term in [`crate::radiometry`].


/// Computes the refraction angle for a ray leaving a medium of index `n1`
/// at `theta_i` (radians from the normal) into a medium of index `n2`.
///
/// Returns `None` on total internal reflection, i.e. when `sin θt` would
/// exceed one.
pub fn get_theta_t(theta_i: f32, n1: f32, n2: f32) -> Option<f32> {
    if n1 == n2 {
        return Some(theta_i);
    }

    let sin_theta_t = n1 / n2 * theta_i.sin();
    if sin_theta_t.abs() > 1.0 {
        return None;
    }

    Some(sin_theta_t.asin())
}

/// Critical angle for total internal reflection going from `n1` into `n2`.
/// Only exists when the light leaves the optically denser medium.
pub fn critical_angle(n1: f32, n2: f32) -> Option<f32> {
    if n2 >= n1 {
        return None;
    }
    Some((n2 / n1).asin())
}
