use serde::{Deserialize, Serialize};

use crate::definition::ProjectionDefinition;

/// WGS84 经纬度（十进制度）。高程只做透传，不参与任何转换。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeodeticPoint {
    pub longitude: f64,
    pub latitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
}

impl GeodeticPoint {
    #[inline]
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
            altitude: None,
        }
    }

    #[inline]
    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = Some(altitude);
        self
    }
}

/// 某个投影定义下的平面坐标（原生单位）。
///
/// 点本身不记录所属投影，调用方需自行保持配对，或使用 [`Located`]。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectedPoint {
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
}

impl ProjectedPoint {
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            altitude: None,
        }
    }

    #[inline]
    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = Some(altitude);
        self
    }

    /// 到原点 (0, 0) 的平面距离。
    #[inline]
    pub fn distance_from_origin(&self) -> f64 {
        self.x.hypot(self.y)
    }
}

impl From<(f64, f64)> for ProjectedPoint {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

/// 平面坐标与其投影定义的显式配对。
#[derive(Debug, Clone, Copy)]
pub struct Located<'a> {
    pub point: ProjectedPoint,
    pub definition: &'a ProjectionDefinition,
}

impl<'a> Located<'a> {
    pub fn new(point: ProjectedPoint, definition: &'a ProjectionDefinition) -> Self {
        Self { point, definition }
    }

    /// 点是否落在所属投影的有效范围内。
    pub fn is_within_bounds(&self) -> bool {
        self.definition.bounds().contains(self.point.x, self.point.y)
    }
}
