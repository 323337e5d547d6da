//! Numerical helpers shared by the projection algorithms.
use crate::error::{Error, Result};
use std::f64::consts::{FRAC_PI_2, PI, TAU};

pub(crate) const EPS10: f64 = 1e-10;
pub(crate) const EPS7: f64 = 1e-7;

/// Iteration budget for latitude recovery.
const N_ITER: usize = 15;
const TOL: f64 = 1e-10;

/// Bring a longitude back into `[-π, π]`.
pub fn normalize_longitude(lon: f64) -> f64 {
    if (-PI..=PI).contains(&lon) {
        return lon;
    }
    lon - TAU * ((lon + PI) / TAU).floor()
}

/// Radius of the parallel at `phi`, divided by the semi-major axis.
pub(crate) fn msfn(sinphi: f64, cosphi: f64, es: f64) -> f64 {
    cosphi / (1.0 - es * sinphi * sinphi).sqrt()
}

/// Authalic latitude function `q`.
pub(crate) fn qsfn(sinphi: f64, e: f64, one_es: f64) -> f64 {
    if e >= EPS7 {
        let con = e * sinphi;
        one_es * (sinphi / (1.0 - con * con) - (0.5 / e) * ((1.0 - con) / (1.0 + con)).ln())
    } else {
        sinphi + sinphi
    }
}

/// Isometric latitude helper used by Mercator.
pub(crate) fn tsfn(phi: f64, sinphi: f64, e: f64) -> f64 {
    let con = sinphi * e;
    (0.5 * (FRAC_PI_2 - phi)).tan() / ((1.0 - con) / (1.0 + con)).powf(0.5 * e)
}

/// Invert [`tsfn`] by fixed-point iteration.
pub(crate) fn phi2(ts: f64, e: f64) -> Result<f64> {
    let half_e = 0.5 * e;
    let mut phi = FRAC_PI_2 - 2.0 * ts.atan();
    for _ in 0..N_ITER {
        let con = e * phi.sin();
        let dphi =
            FRAC_PI_2 - 2.0 * (ts * ((1.0 - con) / (1.0 + con)).powf(half_e)).atan() - phi;
        phi += dphi;
        if dphi.abs() <= TOL {
            return Ok(phi);
        }
    }
    Err(Error::convergence(format!(
        "latitude from isometric value {ts} after {N_ITER} iterations"
    )))
}

/// Invert [`qsfn`] by Newton iteration.
pub(crate) fn authalic_phi(qs: f64, e: f64, one_es: f64) -> Result<f64> {
    let mut phi = (0.5 * qs).asin();
    if e < EPS7 {
        return Ok(phi);
    }
    for _ in 0..N_ITER {
        let (sinphi, cosphi) = phi.sin_cos();
        let con = e * sinphi;
        let com = 1.0 - con * con;
        let dphi = 0.5 * com * com / cosphi
            * (qs / one_es - sinphi / com + 0.5 / e * ((1.0 - con) / (1.0 + con)).ln());
        phi += dphi;
        if dphi.abs() <= TOL {
            return Ok(phi);
        }
    }
    Err(Error::convergence(format!(
        "latitude from authalic value {qs} after {N_ITER} iterations"
    )))
}

const C00: f64 = 1.0;
const C02: f64 = 0.25;
const C04: f64 = 0.046875;
const C06: f64 = 0.01953125;
const C08: f64 = 0.01068115234375;
const C22: f64 = 0.75;
const C44: f64 = 0.46875;
const C46: f64 = 0.013_020_833_333_333_334;
const C48: f64 = 0.007_120_768_229_166_667;
const C66: f64 = 0.364_583_333_333_333_3;
const C68: f64 = 0.005_696_614_583_333_333;
const C88: f64 = 0.3076171875;

/// Series coefficients for the meridional distance.
pub(crate) fn enfn(es: f64) -> [f64; 5] {
    let mut en = [0.0; 5];
    en[0] = C00 - es * (C02 + es * (C04 + es * (C06 + es * C08)));
    en[1] = es * (C22 - es * (C04 + es * (C06 + es * C08)));
    let mut t = es * es;
    en[2] = t * (C44 - es * (C46 + es * C48));
    t *= es;
    en[3] = t * (C66 - es * C68);
    en[4] = t * es * C88;
    en
}

/// Meridional distance from the equator to `phi`, on a unit semi-major axis.
pub(crate) fn mlfn(phi: f64, sphi: f64, cphi: f64, en: &[f64; 5]) -> f64 {
    let cphi = cphi * sphi;
    let sphi = sphi * sphi;
    en[0] * phi - cphi * (en[1] + sphi * (en[2] + sphi * (en[3] + sphi * en[4])))
}

const MLFN_ITER: usize = 10;
const MLFN_EPS: f64 = 1e-11;

/// Latitude for a meridional distance, by Newton iteration.
pub(crate) fn inv_mlfn(arg: f64, es: f64, en: &[f64; 5]) -> Result<f64> {
    let k = 1.0 / (1.0 - es);
    let mut phi = arg;
    for _ in 0..MLFN_ITER {
        let (s, c) = phi.sin_cos();
        let t = 1.0 - es * s * s;
        let t = (mlfn(phi, s, c, en) - arg) * (t * t.sqrt()) * k;
        phi -= t;
        if t.abs() < MLFN_EPS {
            return Ok(phi);
        }
    }
    Err(Error::convergence(format!(
        "latitude from meridional distance {arg} after {MLFN_ITER} iterations"
    )))
}
