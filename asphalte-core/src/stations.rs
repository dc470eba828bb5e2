//! 里程桩（station）集合的计算。
//!
//! 给定参考曲线与起止里程，生成排好序、已去重的里程序列，供标注放置使用。

use serde::{Deserialize, Serialize};

/// 去重容差（曲线长度单位）。
pub const STATION_TOLERANCE: f64 = 1e-6;

/// 单次请求最多生成的等距桩数。
pub const MAX_EVEN_STATIONS: usize = 100_000;

/// 里程计算所需的曲线能力：总长、顶点里程与圆弧中点里程。
pub trait CurveMeasure {
    fn length(&self) -> f64;

    /// 每个顶点（含终点）自起点的曲线长度，升序。
    fn vertex_distances(&self) -> Vec<f64>;

    /// 每个圆弧段中点自起点的曲线长度，升序。
    fn arc_midpoint_distances(&self) -> Vec<f64>;
}

/// 仅由长度描述的直线参考，只有首尾两个顶点。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StraightCurve {
    pub length: f64,
}

impl CurveMeasure for StraightCurve {
    fn length(&self) -> f64 {
        self.length
    }

    fn vertex_distances(&self) -> Vec<f64> {
        vec![0.0, self.length]
    }

    fn arc_midpoint_distances(&self) -> Vec<f64> {
        Vec::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StationRequest {
    pub start: f64,
    pub end: f64,
    /// 等距里程间隔，`<= 0` 表示不插入等距桩。
    pub interdistance: f64,
    pub include_vertex_distances: bool,
}

/// 单调的里程序列，总是包含请求的起止里程。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationSet {
    stations: Vec<f64>,
    descending: bool,
}

impl StationSet {
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.stations
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.stations.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.stations.iter().copied()
    }

    /// 请求的起点里程大于终点时为真。
    #[inline]
    pub fn is_descending(&self) -> bool {
        self.descending
    }

    #[inline]
    pub fn first(&self) -> Option<f64> {
        self.stations.first().copied()
    }

    #[inline]
    pub fn last(&self) -> Option<f64> {
        self.stations.last().copied()
    }

}

impl<'a> IntoIterator for &'a StationSet {
    type Item = &'a f64;
    type IntoIter = std::slice::Iter<'a, f64>;

    fn into_iter(self) -> Self::IntoIter {
        self.stations.iter()
    }
}

/// 计算 `[min(start,end), max(start,end)]` 区间内的里程集合。
///
/// 等距桩落在开区间内；启用顶点里程时加入区间内的顶点以及圆弧段中点。
/// 结果升序去重，起点大于终点时整体反转。
///
/// 间距不小于 [`STATION_TOLERANCE`]，且等距桩不超过 [`MAX_EVEN_STATIONS`] 个，
/// 过小的间距按这两个下限放宽。
pub fn build_stations<C>(curve: &C, request: &StationRequest) -> StationSet
where
    C: CurveMeasure + ?Sized,
{
    let descending = request.start > request.end;
    let min = request.start.min(request.end);
    let max = request.start.max(request.end);

    let inside = |value: f64| value > min + STATION_TOLERANCE && value < max - STATION_TOLERANCE;
    let mut interior: Vec<f64> = Vec::new();

    if request.interdistance > 0.0 && request.interdistance.is_finite() {
        let step = request
            .interdistance
            .max(STATION_TOLERANCE)
            .max((max - min) / MAX_EVEN_STATIONS as f64);
        for k in 1..=MAX_EVEN_STATIONS {
            let station = min + k as f64 * step;
            if station >= max - STATION_TOLERANCE {
                break;
            }
            if inside(station) {
                interior.push(station);
            }
        }
    }

    if request.include_vertex_distances {
        interior.extend(
            curve
                .vertex_distances()
                .into_iter()
                .chain(curve.arc_midpoint_distances())
                .filter(|value| value.is_finite() && inside(*value)),
        );
    }

    interior.sort_by(f64::total_cmp);

    let mut stations = Vec::with_capacity(interior.len() + 2);
    stations.push(min);
    for value in interior {
        let last = stations[stations.len() - 1];
        if value - last >= STATION_TOLERANCE {
            stations.push(value);
        }
    }
    if max - min >= STATION_TOLERANCE {
        stations.push(max);
    }

    if descending {
        stations.reverse();
    }
    StationSet {
        stations,
        descending,
    }
}

/// 只有长度信息时的里程计算：参考曲线视为直线。
pub fn build_stations_for_length(
    curve_length: f64,
    start: f64,
    end: f64,
    interdistance: f64,
    include_vertex_distances: bool,
) -> StationSet {
    build_stations(
        &StraightCurve {
            length: curve_length,
        },
        &StationRequest {
            start,
            end,
            interdistance,
            include_vertex_distances,
        },
    )
}
