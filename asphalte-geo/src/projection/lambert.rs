//! Lambert 正形圆锥投影（单/双标准纬线）。
//!
//! 采用 IGN 算法记法：锥常数 n、投影常数 c 与极点坐标 (Xs, Ys)。

use std::f64::consts::FRAC_PI_2;

use super::PlanarProjection;
use super::math::{isometric_latitude, latitude_from_isometric};
use crate::definition::{LambertParams, LambertVariant};

#[derive(Debug, Clone, Copy)]
pub struct LambertConic {
    e: f64,
    lon_0: f64,
    n: f64,
    c: f64,
    xs: f64,
    ys: f64,
}

impl LambertConic {
    pub fn new(params: &LambertParams) -> Self {
        let ellipsoid = params.datum.ellipsoid;
        let e = ellipsoid.e();
        let lat_0 = params.lat_0.to_radians();

        let (n, c) = match params.variant {
            LambertVariant::TwoStandardParallels { lat_1, lat_2 } => {
                let lat_1 = lat_1.to_radians();
                let lat_2 = lat_2.to_radians();
                let m1 = ellipsoid.prime_vertical_radius(lat_1) * lat_1.cos();
                let l1 = isometric_latitude(lat_1, e);
                let n = if (lat_1 - lat_2).abs() > 1e-12 {
                    let m2 = ellipsoid.prime_vertical_radius(lat_2) * lat_2.cos();
                    let l2 = isometric_latitude(lat_2, e);
                    (m2 / m1).ln() / (l1 - l2)
                } else {
                    lat_1.sin()
                };
                (n, m1 / n * (n * l1).exp())
            }
            LambertVariant::OneStandardParallel { scale_factor } => {
                let n = lat_0.sin();
                let m0 = ellipsoid.prime_vertical_radius(lat_0) * lat_0.cos();
                let l0 = isometric_latitude(lat_0, e);
                (n, scale_factor * m0 / n * (n * l0).exp())
            }
        };

        let rho_0 = if (FRAC_PI_2 - lat_0.abs()).abs() < 1e-12 {
            0.0
        } else {
            c * (-n * isometric_latitude(lat_0, e)).exp()
        };

        Self {
            e,
            lon_0: params.lon_0.to_radians(),
            n,
            c,
            xs: params.false_easting,
            ys: params.false_northing + rho_0,
        }
    }
}

impl PlanarProjection for LambertConic {
    fn forward(&self, lon: f64, lat: f64) -> (f64, f64) {
        let rho = self.c * (-self.n * isometric_latitude(lat, self.e)).exp();
        let gamma = self.n * (lon - self.lon_0);
        (
            self.xs + rho * gamma.sin(),
            self.ys - rho * gamma.cos(),
        )
    }

    fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        let dx = x - self.xs;
        let dy = self.ys - y;
        let sign = self.n.signum();
        let rho = sign * dx.hypot(dy);
        let gamma = (sign * dx).atan2(sign * dy);
        let lon = self.lon_0 + gamma / self.n;
        let iso = -(rho / self.c).abs().ln() / self.n;
        (lon, latitude_from_isometric(iso, self.e))
    }
}
