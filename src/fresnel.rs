//! Fresnel equations at a boundary between two clear media.
//!
//! Lighting only cares about energy, so the amplitude coefficients are
//! squared into reflectance and averaged over the s and p polarizations
//! (unpolarized light from ordinary fixtures).


/// Fresnel amplitude reflection coefficients `(r_s, r_p)`.
pub fn refl(n1: f32, n2: f32, theta_i: f32, theta_t: f32) -> (f32, f32) {
    let cti = theta_i.cos();
    let ctt = theta_t.cos();
    let rs = (n1 * cti - n2 * ctt) / (n1 * cti + n2 * ctt);
    let rp = (n2 * cti - n1 * ctt) / (n2 * cti + n1 * ctt);
    (rs, rp)
}

/// Fresnel amplitude transmission coefficients `(t_s, t_p)`.
pub fn refr(n1: f32, n2: f32, theta_i: f32, theta_t: f32) -> (f32, f32) {
    let cti = theta_i.cos();
    let ctt = theta_t.cos();
    let ts = (2.0 * n1 * cti) / (n1 * cti + n2 * ctt);
    let tp = (2.0 * n1 * cti) / (n2 * cti + n1 * ctt);
    (ts, tp)
}

/// Fraction of unpolarized power reflected at the boundary.
pub fn reflectance(n1: f32, n2: f32, theta_i: f32, theta_t: f32) -> f32 {
    let (rs, rp) = refl(n1, n2, theta_i, theta_t);
    (rs * rs + rp * rp) / 2.0
}

/// Fraction of unpolarized power transmitted across the boundary.
///
/// Uses the amplitude coefficients with the impedance factor
/// `n2 cos θt / (n1 cos θi)`, so `reflectance + transmittance == 1`.
pub fn transmittance(n1: f32, n2: f32, theta_i: f32, theta_t: f32) -> f32 {
    let (ts, tp) = refr(n1, n2, theta_i, theta_t);
    let impedance = (n2 * theta_t.cos()) / (n1 * theta_i.cos());
    impedance * (ts * ts + tp * tp) / 2.0
}
