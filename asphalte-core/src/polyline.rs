//! 带 bulge 的二维多段线：弧长参数化、按里程取点以及最近点投影。
//!
//! bulge 的定义与 DXF 一致：`bulge = tan(θ / 4)`，θ 为圆弧圆心角，
//! 正值表示逆时针。

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::geometry::{Point2, Vector2};
use crate::stations::CurveMeasure;

/// 小于该值的 bulge 视为直线段。
const BULGE_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolylineVertex {
    pub position: Point2,
    pub bulge: f64,
}

impl PolylineVertex {
    #[inline]
    pub fn new(position: Point2) -> Self {
        Self {
            position,
            bulge: 0.0,
        }
    }

    #[inline]
    pub fn with_bulge(position: Point2, bulge: f64) -> Self {
        Self { position, bulge }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    pub vertices: Vec<PolylineVertex>,
    pub is_closed: bool,
}

/// 多段线中的单个段，直线或圆弧。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Segment {
    Line {
        start: Point2,
        end: Point2,
    },
    Arc {
        start: Point2,
        end: Point2,
        center: Point2,
        radius: f64,
        start_angle: f64,
        /// 带符号的圆心角，正值为逆时针。
        sweep: f64,
    },
}

impl Segment {
    /// 由起终点与 bulge 构造段，弦长为零或 bulge 近零时退化为直线。
    pub fn from_bulge(start: Point2, end: Point2, bulge: f64) -> Self {
        let chord = Vector2::from_points(start, end);
        let chord_len = chord.length();
        if bulge.abs() <= BULGE_EPSILON || chord_len <= f64::EPSILON {
            return Segment::Line { start, end };
        }

        let sweep = 4.0 * bulge.atan();
        let radius = chord_len * (1.0 + bulge * bulge) / (4.0 * bulge.abs());
        // 弦中点沿左法向偏移 c·(1 - b²) / (4b) 即为圆心。
        let offset = chord_len * (1.0 - bulge * bulge) / (4.0 * bulge);
        let normal = chord.perp().as_vec2() / chord_len;
        let center = Point2::from_vec(start.midpoint(end).as_vec2() + normal * offset);
        let start_dir = center.vector_to(start);
        let start_angle = start_dir.y().atan2(start_dir.x());

        Segment::Arc {
            start,
            end,
            center,
            radius,
            start_angle,
            sweep,
        }
    }

    #[inline]
    pub fn start(&self) -> Point2 {
        match self {
            Segment::Line { start, .. } | Segment::Arc { start, .. } => *start,
        }
    }

    #[inline]
    pub fn end(&self) -> Point2 {
        match self {
            Segment::Line { end, .. } | Segment::Arc { end, .. } => *end,
        }
    }

    #[inline]
    pub fn is_arc(&self) -> bool {
        matches!(self, Segment::Arc { .. })
    }

    pub fn length(&self) -> f64 {
        match self {
            Segment::Line { start, end } => start.distance(*end),
            Segment::Arc { radius, sweep, .. } => radius * sweep.abs(),
        }
    }

    /// 段内按弧长取点，`distance` 会被限制在 `[0, length]`。
    pub fn point_at(&self, distance: f64) -> Point2 {
        let length = self.length();
        let t = if length <= f64::EPSILON {
            0.0
        } else {
            (distance / length).clamp(0.0, 1.0)
        };
        match self {
            Segment::Line { start, end } => {
                Point2::from_vec(start.as_vec2().lerp(end.as_vec2(), t))
            }
            Segment::Arc {
                center,
                radius,
                start_angle,
                sweep,
                ..
            } => {
                let angle = start_angle + sweep * t;
                Point2::new(
                    center.x() + radius * angle.cos(),
                    center.y() + radius * angle.sin(),
                )
            }
        }
    }

    /// 段上距 `point` 最近的点及其段内弧长。
    pub fn closest(&self, point: Point2) -> (Point2, f64) {
        match self {
            Segment::Line { start, end } => {
                let dir = Vector2::from_points(*start, *end);
                let len_sq = dir.length_squared();
                if len_sq <= f64::EPSILON {
                    return (*start, 0.0);
                }
                let t = (start.vector_to(point).as_vec2().dot(dir.as_vec2()) / len_sq)
                    .clamp(0.0, 1.0);
                (
                    Point2::from_vec(start.as_vec2() + dir.as_vec2() * t),
                    t * len_sq.sqrt(),
                )
            }
            Segment::Arc {
                start,
                end,
                center,
                radius,
                start_angle,
                sweep,
            } => {
                let to_point = center.vector_to(point);
                if to_point.length_squared() > f64::EPSILON {
                    let angle = to_point.y().atan2(to_point.x());
                    let relative = ((angle - start_angle) * sweep.signum()).rem_euclid(TAU);
                    if relative <= sweep.abs() {
                        let dir = to_point.as_vec2() / to_point.length();
                        let on_arc = Point2::from_vec(center.as_vec2() + dir * *radius);
                        return (on_arc, radius * relative);
                    }
                }
                if point.distance(*start) <= point.distance(*end) {
                    (*start, 0.0)
                } else {
                    (*end, self.length())
                }
            }
        }
    }
}

/// 最近点投影结果。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosestPoint {
    pub point: Point2,
    /// 投影点的里程（自起点起算的曲线长度）。
    pub distance_along: f64,
    /// 输入点到投影点的距离。
    pub offset: f64,
}

impl Polyline {
    pub fn new(vertices: Vec<PolylineVertex>, is_closed: bool) -> Self {
        Self {
            vertices,
            is_closed,
        }
    }

    /// 由纯顶点构造不含圆弧的多段线。
    pub fn from_points<I>(points: I, is_closed: bool) -> Self
    where
        I: IntoIterator<Item = Point2>,
    {
        Self {
            vertices: points.into_iter().map(PolylineVertex::new).collect(),
            is_closed,
        }
    }

    pub fn segment_count(&self) -> usize {
        match self.vertices.len() {
            0 | 1 => 0,
            n if self.is_closed => n,
            n => n - 1,
        }
    }

    pub fn segment(&self, index: usize) -> Option<Segment> {
        if index >= self.segment_count() {
            return None;
        }
        let start = self.vertices[index];
        let end = self.vertices[(index + 1) % self.vertices.len()];
        Some(Segment::from_bulge(start.position, end.position, start.bulge))
    }

    pub fn segments(&self) -> impl Iterator<Item = Segment> + '_ {
        (0..self.segment_count()).filter_map(|index| self.segment(index))
    }

    pub fn segment_length(&self, index: usize) -> Option<f64> {
        self.segment(index).map(|segment| segment.length())
    }

    pub fn length(&self) -> f64 {
        self.segments().map(|segment| segment.length()).sum()
    }

    /// 按里程取点；超出 `[0, length]` 时返回 `None`。
    pub fn point_at_distance(&self, distance: f64) -> Option<Point2> {
        if !distance.is_finite() || distance < 0.0 {
            return None;
        }
        let mut travelled = 0.0;
        let mut last = None;
        for segment in self.segments() {
            let length = segment.length();
            if distance <= travelled + length {
                return Some(segment.point_at(distance - travelled));
            }
            travelled += length;
            last = Some(segment);
        }
        // 浮点累积误差内视为终点。
        match last {
            Some(segment) if distance - travelled <= 1e-9 => Some(segment.end()),
            _ => None,
        }
    }

    /// 最近点投影，空多段线返回 `None`。
    pub fn closest_point(&self, point: Point2) -> Option<ClosestPoint> {
        if self.vertices.len() == 1 {
            let only = self.vertices[0].position;
            return Some(ClosestPoint {
                point: only,
                distance_along: 0.0,
                offset: only.distance(point),
            });
        }

        let mut best: Option<ClosestPoint> = None;
        let mut travelled = 0.0;
        for segment in self.segments() {
            let (candidate, along) = segment.closest(point);
            let offset = candidate.distance(point);
            if best.is_none_or(|current| offset < current.offset) {
                best = Some(ClosestPoint {
                    point: candidate,
                    distance_along: travelled + along,
                    offset,
                });
            }
            travelled += segment.length();
        }
        best
    }

    /// 点在曲线上投影位置的里程。
    pub fn distance_at_point(&self, point: Point2) -> Option<f64> {
        self.closest_point(point).map(|closest| closest.distance_along)
    }
}

impl CurveMeasure for Polyline {
    fn length(&self) -> f64 {
        Polyline::length(self)
    }

    fn vertex_distances(&self) -> Vec<f64> {
        if self.vertices.is_empty() {
            return Vec::new();
        }
        let mut distances = Vec::with_capacity(self.segment_count() + 1);
        let mut travelled = 0.0;
        distances.push(travelled);
        for segment in self.segments() {
            travelled += segment.length();
            distances.push(travelled);
        }
        distances
    }

    fn arc_midpoint_distances(&self) -> Vec<f64> {
        let mut distances = Vec::new();
        let mut travelled = 0.0;
        for segment in self.segments() {
            let length = segment.length();
            if segment.is_arc() {
                distances.push(travelled + length / 2.0);
            }
            travelled += length;
        }
        distances
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use super::*;

    fn l_shape_with_arc() -> Polyline {
        // 直线 10 -> 半圆（直径 10）-> 直线 10
        Polyline::new(
            vec![
                PolylineVertex::new(Point2::new(0.0, 0.0)),
                PolylineVertex::with_bulge(Point2::new(10.0, 0.0), 1.0),
                PolylineVertex::new(Point2::new(10.0, 10.0)),
                PolylineVertex::new(Point2::new(0.0, 10.0)),
            ],
            false,
        )
    }

    #[test]
    fn semicircle_bulge_has_half_circumference() {
        let segment = Segment::from_bulge(Point2::new(10.0, 0.0), Point2::new(10.0, 10.0), 1.0);
        match segment {
            Segment::Arc { center, radius, .. } => {
                assert!((center.x() - 10.0).abs() < 1e-12);
                assert!((center.y() - 5.0).abs() < 1e-12);
                assert!((radius - 5.0).abs() < 1e-12);
            }
            other => panic!("expected arc, got {other:?}"),
        }
        assert!((segment.length() - 5.0 * PI).abs() < 1e-12);

        // 逆时针半圆从 (10,0) 到 (10,10)，中点在右侧 (15,5)。
        let mid = segment.point_at(segment.length() / 2.0);
        assert!((mid.x() - 15.0).abs() < 1e-9);
        assert!((mid.y() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn quarter_arc_center_lies_left_of_chord() {
        let bulge = (PI / 8.0).tan();
        let segment = Segment::from_bulge(Point2::new(1.0, 0.0), Point2::new(0.0, 1.0), bulge);
        match segment {
            Segment::Arc { center, radius, sweep, .. } => {
                assert!(center.x().abs() < 1e-12);
                assert!(center.y().abs() < 1e-12);
                assert!((radius - 1.0).abs() < 1e-12);
                assert!((sweep - PI / 2.0).abs() < 1e-12);
            }
            other => panic!("expected arc, got {other:?}"),
        }
    }

    #[test]
    fn polyline_length_and_measures() {
        let polyline = l_shape_with_arc();
        let expected = 10.0 + 5.0 * PI + 10.0;
        assert_eq!(polyline.segment_count(), 3);
        assert!((polyline.length() - expected).abs() < 1e-9);

        let vertices = polyline.vertex_distances();
        assert_eq!(vertices.len(), 4);
        assert!((vertices[1] - 10.0).abs() < 1e-12);
        assert!((vertices[2] - (10.0 + 5.0 * PI)).abs() < 1e-9);
        assert!((vertices[3] - expected).abs() < 1e-9);

        let midpoints = polyline.arc_midpoint_distances();
        assert_eq!(midpoints.len(), 1);
        assert!((midpoints[0] - (10.0 + 2.5 * PI)).abs() < 1e-9);
    }

    #[test]
    fn closed_polyline_adds_closing_segment() {
        let square = Polyline::from_points(
            [
                Point2::new(0.0, 0.0),
                Point2::new(4.0, 0.0),
                Point2::new(4.0, 4.0),
                Point2::new(0.0, 4.0),
            ],
            true,
        );
        assert_eq!(square.segment_count(), 4);
        assert!((square.length() - 16.0).abs() < 1e-12);
        assert_eq!(square.vertex_distances().len(), 5);
        assert!(square.arc_midpoint_distances().is_empty());
    }

    #[test]
    fn point_at_distance_walks_segments() {
        let polyline = l_shape_with_arc();
        let p = polyline.point_at_distance(5.0).expect("on first segment");
        assert!((p.x() - 5.0).abs() < 1e-12 && p.y().abs() < 1e-12);

        let end = polyline
            .point_at_distance(polyline.length())
            .expect("end point");
        assert!(end.x().abs() < 1e-9 && (end.y() - 10.0).abs() < 1e-9);

        assert!(polyline.point_at_distance(-1.0).is_none());
        assert!(polyline.point_at_distance(polyline.length() + 1.0).is_none());
    }

    #[test]
    fn closest_point_projects_on_line_and_arc() {
        let polyline = l_shape_with_arc();

        let on_line = polyline
            .closest_point(Point2::new(3.0, -2.0))
            .expect("projection");
        assert!((on_line.distance_along - 3.0).abs() < 1e-12);
        assert!((on_line.offset - 2.0).abs() < 1e-12);

        // 圆弧最右侧点 (15,5) 外侧 2 个单位。
        let on_arc = polyline
            .closest_point(Point2::new(17.0, 5.0))
            .expect("projection");
        assert!((on_arc.point.x() - 15.0).abs() < 1e-9);
        assert!((on_arc.point.y() - 5.0).abs() < 1e-9);
        assert!((on_arc.distance_along - (10.0 + 2.5 * PI)).abs() < 1e-9);
        assert!((on_arc.offset - 2.0).abs() < 1e-9);

        let along = polyline
            .distance_at_point(Point2::new(5.0, 12.0))
            .expect("projection");
        assert!((along - (10.0 + 5.0 * PI + 5.0)).abs() < 1e-9);

        assert!(Polyline::default().closest_point(Point2::new(0.0, 0.0)).is_none());
    }
}
