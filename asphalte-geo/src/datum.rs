//! 大地基准：椭球 + 到 WGS84 的七参数转换。
//!
//! 平面位置的基准转换在本地椭球面（h = 0）上求值，高程不参与，
//! 因此正反向转换互为精确逆运算（误差仅来自浮点）。

use glam::{DMat3, DVec3};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ellipsoid::Ellipsoid;

const ARC_SECOND: f64 = std::f64::consts::PI / (180.0 * 3600.0);
const GEOCENTRIC_TOLERANCE: f64 = 1e-14;
const GEOCENTRIC_MAX_ITERATIONS: usize = 30;
const INVERSE_TOLERANCE: f64 = 1e-15;
const INVERSE_MAX_ITERATIONS: usize = 20;

/// 七参数相似变换（位置矢量约定）：平移 (m)、旋转 (角秒)、尺度 (ppm)。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Helmert7 {
    pub tx: f64,
    pub ty: f64,
    pub tz: f64,
    pub rx: f64,
    pub ry: f64,
    pub rz: f64,
    pub ds: f64,
}

impl Helmert7 {
    /// 仅含平移的三参数转换。
    pub const fn translation(tx: f64, ty: f64, tz: f64) -> Self {
        Self {
            tx,
            ty,
            tz,
            rx: 0.0,
            ry: 0.0,
            rz: 0.0,
            ds: 0.0,
        }
    }

    /// 参数按 `+towgs84` 的顺序与约定：平移 (m)、旋转 (角秒)、尺度 (ppm)。
    pub const fn from_position_vector(params: [f64; 7]) -> Self {
        Self {
            tx: params[0],
            ty: params[1],
            tz: params[2],
            rx: params[3],
            ry: params[4],
            rz: params[5],
            ds: params[6],
        }
    }

    fn translation_vector(&self) -> DVec3 {
        DVec3::new(self.tx, self.ty, self.tz)
    }

    fn linear_part(&self) -> DMat3 {
        let rx = self.rx * ARC_SECOND;
        let ry = self.ry * ARC_SECOND;
        let rz = self.rz * ARC_SECOND;
        let scale = 1.0 + self.ds * 1e-6;
        // 按列给出 [[1, -rz, ry], [rz, 1, -rx], [-ry, rx, 1]]
        DMat3::from_cols(
            DVec3::new(1.0, rz, -ry),
            DVec3::new(-rz, 1.0, rx),
            DVec3::new(ry, -rx, 1.0),
        ) * scale
    }

    pub fn apply(&self, xyz: DVec3) -> DVec3 {
        self.translation_vector() + self.linear_part() * xyz
    }

    /// 精确逆变换（矩阵求逆），不使用参数取反的近似。
    pub fn apply_inverse(&self, xyz: DVec3) -> DVec3 {
        self.linear_part().inverse() * (xyz - self.translation_vector())
    }

    pub fn is_identity(&self) -> bool {
        [self.tx, self.ty, self.tz, self.rx, self.ry, self.rz, self.ds]
            .iter()
            .all(|value| *value == 0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Datum {
    pub ellipsoid: Ellipsoid,
    /// `None` 表示与 WGS84 视为等同（RGF93、ETRS89 等）。
    pub to_wgs84: Option<Helmert7>,
}

impl Datum {
    pub const WGS84: Self = Self {
        ellipsoid: Ellipsoid::WGS84,
        to_wgs84: None,
    };

    /// RGF93 / ETRS89：GRS80 椭球，与 WGS84 不做转换。
    pub const RGF93: Self = Self {
        ellipsoid: Ellipsoid::GRS80,
        to_wgs84: None,
    };

    pub const fn new(ellipsoid: Ellipsoid, to_wgs84: Option<Helmert7>) -> Self {
        Self {
            ellipsoid,
            to_wgs84,
        }
    }

    fn shift(&self) -> Option<&Helmert7> {
        self.to_wgs84.as_ref().filter(|helmert| !helmert.is_identity())
    }

    /// 本地基准经纬度（弧度）→ WGS84 经纬度（弧度）。
    pub fn to_wgs84(&self, lon: f64, lat: f64) -> (f64, f64) {
        let Some(helmert) = self.shift() else {
            return (lon, lat);
        };
        let local = geodetic_to_geocentric(&self.ellipsoid, lon, lat, 0.0);
        let (lon_w, lat_w, _) = geocentric_to_geodetic(&Ellipsoid::WGS84, helmert.apply(local));
        (lon_w, lat_w)
    }

    /// WGS84 经纬度（弧度）→ 本地基准经纬度（弧度）。
    ///
    /// 先以矩阵逆给出初值，再迭代修正，使 `to_wgs84` 的结果与输入一致。
    pub fn from_wgs84(&self, lon: f64, lat: f64) -> (f64, f64) {
        let Some(helmert) = self.shift() else {
            return (lon, lat);
        };
        let wgs = geodetic_to_geocentric(&Ellipsoid::WGS84, lon, lat, 0.0);
        let (mut lon_l, mut lat_l, _) =
            geocentric_to_geodetic(&self.ellipsoid, helmert.apply_inverse(wgs));

        for iteration in 0..INVERSE_MAX_ITERATIONS {
            let (lon_f, lat_f) = self.to_wgs84(lon_l, lat_l);
            let d_lon = lon - lon_f;
            let d_lat = lat - lat_f;
            lon_l += d_lon;
            lat_l += d_lat;
            if d_lon.abs() < INVERSE_TOLERANCE && d_lat.abs() < INVERSE_TOLERANCE {
                return (lon_l, lat_l);
            }
            if iteration + 1 == INVERSE_MAX_ITERATIONS {
                debug!(d_lon, d_lat, "基准反算未收敛，返回当前估计");
            }
        }
        (lon_l, lat_l)
    }
}

/// 大地坐标（弧度、米）→ 地心直角坐标。
pub fn geodetic_to_geocentric(ellipsoid: &Ellipsoid, lon: f64, lat: f64, height: f64) -> DVec3 {
    let n = ellipsoid.prime_vertical_radius(lat);
    let (sin_lat, cos_lat) = lat.sin_cos();
    let (sin_lon, cos_lon) = lon.sin_cos();
    DVec3::new(
        (n + height) * cos_lat * cos_lon,
        (n + height) * cos_lat * sin_lon,
        (n * (1.0 - ellipsoid.e2()) + height) * sin_lat,
    )
}

/// 地心直角坐标 → 大地坐标（弧度、米），迭代求纬度。
pub fn geocentric_to_geodetic(ellipsoid: &Ellipsoid, xyz: DVec3) -> (f64, f64, f64) {
    let e2 = ellipsoid.e2();
    let p = xyz.x.hypot(xyz.y);
    let lon = xyz.y.atan2(xyz.x);

    if p <= f64::EPSILON {
        let lat = std::f64::consts::FRAC_PI_2.copysign(xyz.z);
        return (lon, lat, xyz.z.abs() - ellipsoid.b());
    }

    let mut lat = xyz.z.atan2(p * (1.0 - e2));
    let mut height = 0.0;
    for _ in 0..GEOCENTRIC_MAX_ITERATIONS {
        let n = ellipsoid.prime_vertical_radius(lat);
        height = p / lat.cos() - n;
        let next = xyz.z.atan2(p * (1.0 - e2 * n / (n + height)));
        let delta = (next - lat).abs();
        lat = next;
        if delta < GEOCENTRIC_TOLERANCE {
            break;
        }
    }
    (lon, lat, height)
}
