//! 投影共用的数学工具。

use std::f64::consts::FRAC_PI_2;

use tracing::debug;

/// 等量纬度迭代的收敛阈值（弧度）。
pub const LATITUDE_TOLERANCE: f64 = 1e-12;
/// 迭代次数上限，超过后返回当前最优估计。
pub const MAX_ITERATIONS: usize = 50;

/// 等量纬度 L(φ) = atanh(sin φ) - e·atanh(e·sin φ)
#[inline]
pub fn isometric_latitude(lat: f64, e: f64) -> f64 {
    let s = lat.sin();
    s.atanh() - e * (e * s).atanh()
}

/// 由等量纬度反求纬度（Newton 迭代）。
///
/// 通常 3~5 次收敛；若达到上限仍未收敛，记录日志并返回当前估计。
pub fn latitude_from_isometric(iso: f64, e: f64) -> f64 {
    if iso.is_infinite() {
        return FRAC_PI_2.copysign(iso);
    }
    let e2 = e * e;
    let mut lat = 2.0 * iso.exp().atan() - FRAC_PI_2;
    for _ in 0..MAX_ITERATIONS {
        let s = lat.sin();
        let residual = isometric_latitude(lat, e) - iso;
        let derivative = (1.0 - e2) / ((1.0 - e2 * s * s) * lat.cos());
        if !derivative.is_finite() {
            return lat;
        }
        let step = residual / derivative;
        lat -= step;
        if step.abs() < LATITUDE_TOLERANCE {
            return lat;
        }
    }
    debug!(iso, lat, "等量纬度反算未收敛，返回当前估计");
    lat
}

/// 经度归一化到 [-180, 180)（度）。
#[inline]
pub fn normalize_longitude(lon: f64) -> f64 {
    let mut x = lon % 360.0;
    if x < -180.0 {
        x += 360.0;
    }
    if x >= 180.0 {
        x -= 360.0;
    }
    x
}
