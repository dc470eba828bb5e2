//! 瑞士斜轴正形圆柱投影（swisstopo 严密公式）。
//!
//! 椭球 → 高斯球 → 以伯尔尼为极的斜轴旋转 → 球面墨卡托。

use std::f64::consts::FRAC_PI_4;

use super::PlanarProjection;
use super::math::{isometric_latitude, latitude_from_isometric};
use crate::definition::SwissParams;

#[derive(Debug, Clone, Copy)]
pub struct SwissObliqueMercator {
    e: f64,
    lon_0: f64,
    alpha: f64,
    /// 高斯球上的原点纬度 b0
    b_0: f64,
    k: f64,
    radius: f64,
    false_easting: f64,
    false_northing: f64,
}

impl SwissObliqueMercator {
    pub fn new(params: &SwissParams) -> Self {
        let ellipsoid = params.datum.ellipsoid;
        let e = ellipsoid.e();
        let e2 = ellipsoid.e2();
        let lat_0 = params.lat_0.to_radians();
        let (sin_0, cos_0) = lat_0.sin_cos();

        let alpha = (1.0 + e2 / (1.0 - e2) * cos_0.powi(4)).sqrt();
        let b_0 = (sin_0 / alpha).asin();
        let k = (FRAC_PI_4 + b_0 / 2.0).tan().ln() - alpha * isometric_latitude(lat_0, e);
        let radius = ellipsoid.a * (1.0 - e2).sqrt() / (1.0 - e2 * sin_0 * sin_0);

        Self {
            e,
            lon_0: params.lon_0.to_radians(),
            alpha,
            b_0,
            k,
            radius,
            false_easting: params.false_easting,
            false_northing: params.false_northing,
        }
    }
}

impl PlanarProjection for SwissObliqueMercator {
    fn forward(&self, lon: f64, lat: f64) -> (f64, f64) {
        let s = self.alpha * isometric_latitude(lat, self.e) + self.k;
        let b = 2.0 * (s.exp().atan() - FRAC_PI_4);
        let l = self.alpha * (lon - self.lon_0);

        let (sin_b0, cos_b0) = self.b_0.sin_cos();
        let l_bar = l.sin().atan2(sin_b0 * b.tan() + cos_b0 * l.cos());
        let b_bar = (cos_b0 * b.sin() - sin_b0 * b.cos() * l.cos()).asin();

        (
            self.false_easting + self.radius * l_bar,
            self.false_northing + self.radius * b_bar.sin().atanh(),
        )
    }

    fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        let l_bar = (x - self.false_easting) / self.radius;
        let b_bar = 2.0 * (((y - self.false_northing) / self.radius).exp().atan() - FRAC_PI_4);

        let (sin_b0, cos_b0) = self.b_0.sin_cos();
        let b = (cos_b0 * b_bar.sin() + sin_b0 * b_bar.cos() * l_bar.cos()).asin();
        let l = l_bar.sin().atan2(cos_b0 * l_bar.cos() - sin_b0 * b_bar.tan());

        let iso = ((FRAC_PI_4 + b / 2.0).tan().ln() - self.k) / self.alpha;
        (
            self.lon_0 + l / self.alpha,
            latitude_from_isometric(iso, self.e),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datum::Datum;
    use crate::ellipsoid::Ellipsoid;

    const BERN_LAT: f64 = 46.952_405_555_555_56;
    const BERN_LON: f64 = 7.439_583_333_333_333;

    fn lv95() -> SwissObliqueMercator {
        SwissObliqueMercator::new(&SwissParams {
            datum: Datum::new(Ellipsoid::BESSEL_1841, None),
            lat_0: BERN_LAT,
            lon_0: BERN_LON,
            false_easting: 2_600_000.0,
            false_northing: 1_200_000.0,
        })
    }

    #[test]
    fn swisstopo_projection_constants() {
        let projection = lv95();
        // swisstopo: α = 1.00072913843038, b0 = 46°54'27.83324844", R = 6378815.90365 m
        assert!((projection.alpha - 1.000_729_138_430_38).abs() < 1e-12);
        let b0 = 46.0 + 54.0 / 60.0 + 27.833_248_44 / 3600.0;
        assert!((projection.b_0.to_degrees() - b0).abs() < 1e-9);
        assert!((projection.radius - 6_378_815.903_65).abs() < 1e-3);
    }

    #[test]
    fn bern_maps_to_false_origin() {
        let (x, y) = lv95().forward(BERN_LON.to_radians(), BERN_LAT.to_radians());
        assert!((x - 2_600_000.0).abs() < 1e-6);
        assert!((y - 1_200_000.0).abs() < 1e-6);
    }

    #[test]
    fn round_trip_across_switzerland() {
        let projection = lv95();
        for (lon, lat) in [(6.14, 46.2), (8.54, 47.37), (10.45, 46.6), (9.0, 45.85)] {
            let (x, y) = projection.forward(f64::to_radians(lon), f64::to_radians(lat));
            let (lon2, lat2) = projection.inverse(x, y);
            assert!((lon2.to_degrees() - lon).abs() < 1e-10);
            assert!((lat2.to_degrees() - lat).abs() < 1e-10);
        }
    }

    #[test]
    fn east_of_bern_increases_easting() {
        let projection = lv95();
        let (x, y) = projection.forward(8.0_f64.to_radians(), BERN_LAT.to_radians());
        assert!(x > 2_600_000.0);
        assert!((y - 1_200_000.0).abs() < 1_000.0);
    }
}
