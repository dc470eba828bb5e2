//! 斜轴双重球面投影（EPSG 9809，荷兰 RD）。

use super::PlanarProjection;
use super::math::{isometric_latitude, latitude_from_isometric};
use crate::definition::StereographicParams;

#[derive(Debug, Clone, Copy)]
pub struct ObliqueStereographic {
    e: f64,
    lon_0: f64,
    n: f64,
    /// ln c，保角球纬度的偏移
    ln_c: f64,
    chi_0: f64,
    /// 2 · R · k0
    diameter: f64,
    false_easting: f64,
    false_northing: f64,
}

impl ObliqueStereographic {
    pub fn new(params: &StereographicParams) -> Self {
        let ellipsoid = params.datum.ellipsoid;
        let e = ellipsoid.e();
        let e2 = ellipsoid.e2();
        let lat_0 = params.lat_0.to_radians();
        let sin_0 = lat_0.sin();

        let radius =
            (ellipsoid.meridian_radius(lat_0) * ellipsoid.prime_vertical_radius(lat_0)).sqrt();
        let n = (1.0 + e2 * lat_0.cos().powi(4) / (1.0 - e2)).sqrt();

        let w1 = (2.0 * n * isometric_latitude(lat_0, e)).exp();
        let sin_chi_00 = (w1 - 1.0) / (w1 + 1.0);
        let c = (n + sin_0) * (1.0 - sin_chi_00) / ((n - sin_0) * (1.0 + sin_chi_00));
        let w2 = c * w1;

        Self {
            e,
            lon_0: params.lon_0.to_radians(),
            n,
            ln_c: c.ln(),
            chi_0: ((w2 - 1.0) / (w2 + 1.0)).asin(),
            diameter: 2.0 * radius * params.scale_factor,
            false_easting: params.false_easting,
            false_northing: params.false_northing,
        }
    }

    /// 椭球纬度 → 保角球纬度 χ
    fn conformal_latitude(&self, lat: f64) -> f64 {
        let ln_w = self.ln_c + 2.0 * self.n * isometric_latitude(lat, self.e);
        (ln_w / 2.0).tanh().asin()
    }
}

impl PlanarProjection for ObliqueStereographic {
    fn forward(&self, lon: f64, lat: f64) -> (f64, f64) {
        let chi = self.conformal_latitude(lat);
        let d_lon = self.n * (lon - self.lon_0);
        let (sin_chi, cos_chi) = chi.sin_cos();
        let (sin_0, cos_0) = self.chi_0.sin_cos();
        let b = 1.0 + sin_chi * sin_0 + cos_chi * cos_0 * d_lon.cos();
        (
            self.false_easting + self.diameter * cos_chi * d_lon.sin() / b,
            self.false_northing + self.diameter * (sin_chi * cos_0 - cos_chi * sin_0 * d_lon.cos()) / b,
        )
    }

    fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        let dx = x - self.false_easting;
        let dy = y - self.false_northing;
        let rho = dx.hypot(dy);
        let (sin_0, cos_0) = self.chi_0.sin_cos();

        let (chi, d_lon) = if rho < 1e-12 {
            (self.chi_0, 0.0)
        } else {
            let c = 2.0 * (rho / self.diameter).atan();
            let (sin_c, cos_c) = c.sin_cos();
            (
                (cos_c * sin_0 + dy * sin_c * cos_0 / rho).asin(),
                (dx * sin_c).atan2(rho * cos_0 * cos_c - dy * sin_0 * sin_c),
            )
        };

        let iso = (2.0 * chi.sin().atanh() - self.ln_c) / (2.0 * self.n);
        (
            self.lon_0 + d_lon / self.n,
            latitude_from_isometric(iso, self.e),
        )
    }
}
