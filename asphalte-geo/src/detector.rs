//! 投影探测：根据一组未知投影的平面点猜测其所属定义。

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::Catalog;
use crate::definition::{ProjectionDefinition, Unit};
use crate::point::ProjectedPoint;

/// 绝对值不超过该值的质心视为经纬度。
const DEGREE_MAGNITUDE: f64 = 180.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorSettings {
    /// 离原点小于该距离的点视为未地理参考的图纸原点，不参与质心计算
    pub origin_threshold: f64,
    /// 过滤后至少需要的点数
    pub min_points: usize,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            origin_threshold: 1000.0,
            min_points: 1,
        }
    }
}

/// 探测结果：质心与全部命中的定义（目录顺序）。
#[derive(Debug, Clone)]
pub struct Detection<'a> {
    pub centroid: ProjectedPoint,
    pub unit: Unit,
    pub matches: Vec<&'a ProjectionDefinition>,
}

impl<'a> Detection<'a> {
    /// 首个命中，即 `detect` 的结果。
    pub fn best(&self) -> Option<&'a ProjectionDefinition> {
        self.matches.first().copied()
    }

    pub fn is_ambiguous(&self) -> bool {
        self.matches.len() > 1
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Detector<'a> {
    catalog: &'a Catalog,
    settings: DetectorSettings,
}

impl<'a> Detector<'a> {
    pub fn new(catalog: &'a Catalog, settings: DetectorSettings) -> Self {
        Self { catalog, settings }
    }

    pub fn settings(&self) -> &DetectorSettings {
        &self.settings
    }

    /// 过滤原点附近的点后计算质心；存活点数不足时返回 `None`。
    ///
    /// 坐标先排序再求和，结果与输入顺序无关。
    pub fn centroid(&self, points: &[ProjectedPoint]) -> Option<ProjectedPoint> {
        let threshold = self.settings.origin_threshold;
        let (mut xs, mut ys): (Vec<f64>, Vec<f64>) = points
            .iter()
            .filter(|point| point.x.is_finite() && point.y.is_finite())
            .filter(|point| point.distance_from_origin() >= threshold)
            .map(|point| (point.x, point.y))
            .unzip();

        let kept = xs.len();
        debug!(
            total = points.len(),
            kept,
            threshold,
            "过滤原点附近的点"
        );
        if kept == 0 || kept < self.settings.min_points {
            return None;
        }

        xs.sort_by(f64::total_cmp);
        ys.sort_by(f64::total_cmp);
        let count = kept as f64;
        Some(ProjectedPoint::new(
            xs.iter().sum::<f64>() / count,
            ys.iter().sum::<f64>() / count,
        ))
    }

    /// 返回目录中第一个范围包含质心的定义。
    pub fn detect(&self, points: &[ProjectedPoint]) -> Option<&'a ProjectionDefinition> {
        self.detect_all(points).and_then(|detection| detection.best())
    }

    /// 返回质心及全部命中定义，供调用方展示歧义。
    pub fn detect_all(&self, points: &[ProjectedPoint]) -> Option<Detection<'a>> {
        let centroid = self.centroid(points)?;
        let unit = if centroid.x.abs() <= DEGREE_MAGNITUDE && centroid.y.abs() <= DEGREE_MAGNITUDE {
            Unit::Degree
        } else {
            Unit::Meter
        };
        let matches: Vec<&'a ProjectionDefinition> = self
            .catalog
            .iter()
            .filter(|definition| definition.unit() == unit)
            .filter(|definition| definition.bounds().contains(centroid.x, centroid.y))
            .collect();
        debug!(
            x = centroid.x,
            y = centroid.y,
            unit = unit.as_str(),
            matches = matches.len(),
            "投影探测"
        );
        Some(Detection {
            centroid,
            unit,
            matches,
        })
    }
}
