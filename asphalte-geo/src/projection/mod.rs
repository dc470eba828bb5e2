//! 正反算引擎：按投影族分派，统一经 WGS84 经纬度中转。
//!
//! 转换路径永不返回错误：没有内建算法的投影族退化为近似换算，
//! 并通过 [`Accuracy::Approximate`] 标记。

pub mod approximate;
pub mod lambert;
pub mod math;
pub mod stereographic;
pub mod swiss;
pub mod transverse_mercator;

use serde::Serialize;
use tracing::warn;

use crate::datum::Datum;
use crate::definition::{
    Hemisphere, ProjectionDefinition, ProjectionMethod, Unit, utm_zone_for_longitude,
};
use crate::point::{GeodeticPoint, ProjectedPoint};

use approximate::LocalApproximation;
use lambert::LambertConic;
use math::normalize_longitude;
use stereographic::ObliqueStereographic;
use swiss::SwissObliqueMercator;
use transverse_mercator::TransverseMercator;

/// 单一投影族在本地基准上的正反算，角度均为弧度。
pub trait PlanarProjection {
    /// (经度, 纬度) → (x, y)
    fn forward(&self, lon: f64, lat: f64) -> (f64, f64);
    /// (x, y) → (经度, 纬度)
    fn inverse(&self, x: f64, y: f64) -> (f64, f64);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Accuracy {
    /// 闭式算法，往返误差在 1e-6 m / 1e-9° 以内
    Exact,
    /// 局部线性近似，精度无保证
    Approximate,
}

impl Accuracy {
    /// 两段转换串联后的精度取较差者。
    pub fn worst(self, other: Accuracy) -> Accuracy {
        match (self, other) {
            (Accuracy::Exact, Accuracy::Exact) => Accuracy::Exact,
            _ => Accuracy::Approximate,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Accuracy::Exact => "exact",
            Accuracy::Approximate => "approximate",
        }
    }
}

/// 转换结果及其精度标记。
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Conversion<T> {
    pub value: T,
    pub accuracy: Accuracy,
}

impl<T> Conversion<T> {
    pub fn exact(value: T) -> Self {
        Self {
            value,
            accuracy: Accuracy::Exact,
        }
    }

    pub fn approximate(value: T) -> Self {
        Self {
            value,
            accuracy: Accuracy::Approximate,
        }
    }

    #[inline]
    pub fn is_exact(&self) -> bool {
        self.accuracy == Accuracy::Exact
    }
}

/// 已预计算常数的精确投影族。
#[derive(Debug, Clone, Copy)]
pub enum Family {
    Lambert(LambertConic),
    TransverseMercator(TransverseMercator),
    Swiss(SwissObliqueMercator),
    Stereographic(ObliqueStereographic),
}

impl Family {
    fn as_planar(&self) -> &dyn PlanarProjection {
        match self {
            Family::Lambert(p) => p,
            Family::TransverseMercator(p) => p,
            Family::Swiss(p) => p,
            Family::Stereographic(p) => p,
        }
    }
}

/// 针对某个定义预先计算好的转换器，批量转换时只构造一次。
#[derive(Debug, Clone, Copy)]
pub enum Projector {
    /// 以度存储的定义：坐标即经纬度
    Identity,
    Exact { family: Family, datum: Datum },
    Approximate(LocalApproximation),
}

impl Projector {
    pub fn new(definition: &ProjectionDefinition) -> Self {
        if definition.unit() == Unit::Degree {
            return Projector::Identity;
        }
        match definition.method() {
            ProjectionMethod::Geographic => Projector::Identity,
            ProjectionMethod::LambertConic(params) => Projector::Exact {
                family: Family::Lambert(LambertConic::new(params)),
                datum: params.datum,
            },
            ProjectionMethod::TransverseMercator(params) => Projector::Exact {
                family: Family::TransverseMercator(TransverseMercator::new(params)),
                datum: params.datum,
            },
            ProjectionMethod::SwissObliqueMercator(params) => Projector::Exact {
                family: Family::Swiss(SwissObliqueMercator::new(params)),
                datum: params.datum,
            },
            ProjectionMethod::ObliqueStereographic(params) => Projector::Exact {
                family: Family::Stereographic(ObliqueStereographic::new(params)),
                datum: params.datum,
            },
            ProjectionMethod::Unsupported { method } => {
                warn!(
                    code = definition.code(),
                    method = method.as_str(),
                    "投影族无内建算法，使用局部近似换算（精度降级）"
                );
                Projector::Approximate(LocalApproximation::new(definition))
            }
        }
    }

    pub fn accuracy(&self) -> Accuracy {
        match self {
            Projector::Approximate(_) => Accuracy::Approximate,
            _ => Accuracy::Exact,
        }
    }

    pub fn to_geodetic(&self, point: ProjectedPoint) -> Conversion<GeodeticPoint> {
        let (longitude, latitude) = match self {
            Projector::Identity => (point.x, point.y),
            Projector::Exact { family, datum } => {
                let (lon, lat) = family.as_planar().inverse(point.x, point.y);
                let (lon, lat) = datum.to_wgs84(lon, lat);
                (normalize_longitude(lon.to_degrees()), lat.to_degrees())
            }
            Projector::Approximate(approximation) => approximation.inverse(point.x, point.y),
        };
        let value = GeodeticPoint {
            longitude,
            latitude,
            altitude: point.altitude,
        };
        Conversion {
            value,
            accuracy: self.accuracy(),
        }
    }

    pub fn to_projected(&self, point: GeodeticPoint) -> Conversion<ProjectedPoint> {
        let (x, y) = match self {
            Projector::Identity => (point.longitude, point.latitude),
            Projector::Exact { family, datum } => {
                let (lon, lat) =
                    datum.from_wgs84(point.longitude.to_radians(), point.latitude.to_radians());
                family.as_planar().forward(lon, lat)
            }
            Projector::Approximate(approximation) => {
                approximation.forward(point.longitude, point.latitude)
            }
        };
        let value = ProjectedPoint {
            x,
            y,
            altitude: point.altitude,
        };
        Conversion {
            value,
            accuracy: self.accuracy(),
        }
    }
}

/// 平面坐标 → WGS84 经纬度。
pub fn to_geodetic(point: ProjectedPoint, definition: &ProjectionDefinition) -> Conversion<GeodeticPoint> {
    Projector::new(definition).to_geodetic(point)
}

/// WGS84 经纬度 → 平面坐标。
pub fn to_projected(point: GeodeticPoint, definition: &ProjectionDefinition) -> Conversion<ProjectedPoint> {
    Projector::new(definition).to_projected(point)
}

/// 批量反算，精度标记对整批一致。
pub fn to_geodetic_many(
    points: &[ProjectedPoint],
    definition: &ProjectionDefinition,
) -> Conversion<Vec<GeodeticPoint>> {
    let projector = Projector::new(definition);
    let values = points
        .iter()
        .map(|point| projector.to_geodetic(*point).value)
        .collect();
    Conversion {
        value: values,
        accuracy: projector.accuracy(),
    }
}

pub fn to_projected_many(
    points: &[GeodeticPoint],
    definition: &ProjectionDefinition,
) -> Conversion<Vec<ProjectedPoint>> {
    let projector = Projector::new(definition);
    let values = points
        .iter()
        .map(|point| projector.to_projected(*point).value)
        .collect();
    Conversion {
        value: values,
        accuracy: projector.accuracy(),
    }
}

/// 两个投影之间的平面坐标转换（经 WGS84 中转）。
pub fn convert(
    point: ProjectedPoint,
    from: &ProjectionDefinition,
    to: &ProjectionDefinition,
) -> Conversion<ProjectedPoint> {
    let geodetic = to_geodetic(point, from);
    let projected = to_projected(geodetic.value, to);
    Conversion {
        value: projected.value,
        accuracy: geodetic.accuracy.worst(projected.accuracy),
    }
}

/// 给定 WGS84 经纬度所在 UTM 带的目录代码，如 `UTM31N`。
pub fn utm_zone_for(longitude: f64, latitude: f64) -> String {
    let zone = utm_zone_for_longitude(normalize_longitude(longitude));
    let hemisphere = if latitude >= 0.0 {
        Hemisphere::North
    } else {
        Hemisphere::South
    };
    utm_code(zone, hemisphere)
}

/// UTM 定义的目录代码。
pub fn utm_code(zone: u8, hemisphere: Hemisphere) -> String {
    let suffix = match hemisphere {
        Hemisphere::North => 'N',
        Hemisphere::South => 'S',
    };
    format!("UTM{zone}{suffix}")
}
