//! 近似换算：以范围中心为锚点的局部等距矩形映射。
//!
//! 仅用于没有内建算法的投影族，误差随离锚点距离增大，不可用于测量成果。

use crate::definition::ProjectionDefinition;
use crate::ellipsoid::Ellipsoid;

/// 无适用范围时使用的换算因子（米/度，赤道处一度子午线弧长的近似值）。
pub const METERS_PER_DEGREE: f64 = 111_320.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalApproximation {
    anchor_x: f64,
    anchor_y: f64,
    anchor_lon: f64,
    anchor_lat: f64,
    meters_per_degree_lon: f64,
    meters_per_degree_lat: f64,
}

impl LocalApproximation {
    pub fn new(definition: &ProjectionDefinition) -> Self {
        let (anchor_x, anchor_y) = definition.bounds().center();
        match definition.area_of_use() {
            Some(area) => {
                let (anchor_lon, anchor_lat) = area.center();
                let lat = anchor_lat.to_radians();
                let wgs84 = Ellipsoid::WGS84;
                Self {
                    anchor_x,
                    anchor_y,
                    anchor_lon,
                    anchor_lat,
                    meters_per_degree_lon: (wgs84.prime_vertical_radius(lat) * lat.cos())
                        .to_radians()
                        .max(1.0),
                    meters_per_degree_lat: wgs84.meridian_radius(lat).to_radians(),
                }
            }
            None => Self {
                anchor_x,
                anchor_y,
                anchor_lon: 0.0,
                anchor_lat: 0.0,
                meters_per_degree_lon: METERS_PER_DEGREE,
                meters_per_degree_lat: METERS_PER_DEGREE,
            },
        }
    }

    /// 平面坐标 → 经纬度（度）
    pub fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.anchor_lon + (x - self.anchor_x) / self.meters_per_degree_lon,
            self.anchor_lat + (y - self.anchor_y) / self.meters_per_degree_lat,
        )
    }

    /// 经纬度（度）→ 平面坐标
    pub fn forward(&self, lon: f64, lat: f64) -> (f64, f64) {
        (
            self.anchor_x + (lon - self.anchor_lon) * self.meters_per_degree_lon,
            self.anchor_y + (lat - self.anchor_lat) * self.meters_per_degree_lat,
        )
    }
}
