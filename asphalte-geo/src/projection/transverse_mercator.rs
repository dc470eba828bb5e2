//! 横轴墨卡托投影（6 阶 Krüger 级数），UTM 为其特例。
//!
//! 正算使用 α 系数，反算使用 β 系数；纬度经由保角纬度的等量纬度恢复。

use super::PlanarProjection;
use super::math::{isometric_latitude, latitude_from_isometric};
use crate::definition::TransverseMercatorParams;

const ORDER: usize = 6;

#[derive(Debug, Clone, Copy)]
pub struct TransverseMercator {
    e: f64,
    lon_0: f64,
    /// k0 · A（A 为子午线等距半径）
    scaled_radius: f64,
    alpha: [f64; ORDER],
    beta: [f64; ORDER],
    /// 原点纬度处的 ξ
    xi_0: f64,
    false_easting: f64,
    false_northing: f64,
}

fn alpha_coefficients(n: f64) -> [f64; ORDER] {
    let n2 = n * n;
    let n3 = n2 * n;
    let n4 = n3 * n;
    let n5 = n4 * n;
    let n6 = n5 * n;
    [
        n / 2.0 - 2.0 * n2 / 3.0 + 5.0 * n3 / 16.0 + 41.0 * n4 / 180.0 - 127.0 * n5 / 288.0
            + 7891.0 * n6 / 37800.0,
        13.0 * n2 / 48.0 - 3.0 * n3 / 5.0 + 557.0 * n4 / 1440.0 + 281.0 * n5 / 630.0
            - 1_983_433.0 * n6 / 1_935_360.0,
        61.0 * n3 / 240.0 - 103.0 * n4 / 140.0 + 15061.0 * n5 / 26880.0
            + 167_603.0 * n6 / 181_440.0,
        49561.0 * n4 / 161_280.0 - 179.0 * n5 / 168.0 + 6_601_661.0 * n6 / 7_257_600.0,
        34729.0 * n5 / 80640.0 - 3_418_889.0 * n6 / 1_995_840.0,
        212_378_941.0 * n6 / 319_334_400.0,
    ]
}

fn beta_coefficients(n: f64) -> [f64; ORDER] {
    let n2 = n * n;
    let n3 = n2 * n;
    let n4 = n3 * n;
    let n5 = n4 * n;
    let n6 = n5 * n;
    [
        n / 2.0 - 2.0 * n2 / 3.0 + 37.0 * n3 / 96.0 - n4 / 360.0 - 81.0 * n5 / 512.0
            + 96199.0 * n6 / 604_800.0,
        n2 / 48.0 + n3 / 15.0 - 437.0 * n4 / 1440.0 + 46.0 * n5 / 105.0
            - 1_118_711.0 * n6 / 3_870_720.0,
        17.0 * n3 / 480.0 - 37.0 * n4 / 840.0 - 209.0 * n5 / 4480.0 + 5569.0 * n6 / 90720.0,
        4397.0 * n4 / 161_280.0 - 11.0 * n5 / 504.0 - 830_251.0 * n6 / 7_257_600.0,
        4583.0 * n5 / 161_280.0 - 108_847.0 * n6 / 3_991_680.0,
        20_648_693.0 * n6 / 638_668_800.0,
    ]
}

/// 高斯-克吕格级数：返回 (ξ + Σ, η + Σ)。`sign` 为 +1 时用于正算，-1 时用于反算。
fn kruger_series(coeffs: &[f64; ORDER], xi: f64, eta: f64, sign: f64) -> (f64, f64) {
    let mut xi_sum = xi;
    let mut eta_sum = eta;
    for (j, coeff) in coeffs.iter().enumerate() {
        let k = 2.0 * (j + 1) as f64;
        xi_sum += sign * coeff * (k * xi).sin() * (k * eta).cosh();
        eta_sum += sign * coeff * (k * xi).cos() * (k * eta).sinh();
    }
    (xi_sum, eta_sum)
}

impl TransverseMercator {
    pub fn new(params: &TransverseMercatorParams) -> Self {
        let ellipsoid = params.datum.ellipsoid;
        let n = ellipsoid.n();
        let n2 = n * n;
        let rectifying = ellipsoid.a / (1.0 + n) * (1.0 + n2 / 4.0 + n2 * n2 / 64.0 + n2 * n2 * n2 / 256.0);
        let alpha = alpha_coefficients(n);
        let e = ellipsoid.e();

        let conformal_0 = isometric_latitude(params.lat_0.to_radians(), e).sinh().atan();
        let (xi_0, _) = kruger_series(&alpha, conformal_0, 0.0, 1.0);

        Self {
            e,
            lon_0: params.lon_0.to_radians(),
            scaled_radius: params.scale_factor * rectifying,
            alpha,
            beta: beta_coefficients(n),
            xi_0,
            false_easting: params.false_easting,
            false_northing: params.false_northing,
        }
    }
}

impl PlanarProjection for TransverseMercator {
    fn forward(&self, lon: f64, lat: f64) -> (f64, f64) {
        let d_lon = lon - self.lon_0;
        let t = isometric_latitude(lat, self.e).sinh();
        let xi_prime = t.atan2(d_lon.cos());
        let eta_prime = (d_lon.sin() / (1.0 + t * t).sqrt()).atanh();
        let (xi, eta) = kruger_series(&self.alpha, xi_prime, eta_prime, 1.0);
        (
            self.false_easting + self.scaled_radius * eta,
            self.false_northing + self.scaled_radius * (xi - self.xi_0),
        )
    }

    fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        let xi = (y - self.false_northing) / self.scaled_radius + self.xi_0;
        let eta = (x - self.false_easting) / self.scaled_radius;
        let (xi_prime, eta_prime) = kruger_series(&self.beta, xi, eta, -1.0);
        let chi = (xi_prime.sin() / eta_prime.cosh()).asin();
        let d_lon = eta_prime.sinh().atan2(xi_prime.cos());
        let lat = latitude_from_isometric(chi.tan().asinh(), self.e);
        (self.lon_0 + d_lon, lat)
    }
}
