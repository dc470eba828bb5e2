//! 文本坐标文件读取。
//!
//! 每行一个点，分隔符可为空格、逗号、分号或制表符；`#` 之后为注释，空行忽略。

use std::fs;
use std::path::Path;

use asphalte_core::geometry::Point2;
use asphalte_core::polyline::{Polyline, PolylineVertex};
use asphalte_geo::ProjectedPoint;
use tracing::debug;

use crate::errors::LoadError;

fn read(path: &Path) -> Result<String, LoadError> {
    fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// 逐行拆出数值，返回 `(行号, 数值)`。
fn records(text: &str) -> impl Iterator<Item = Result<(usize, Vec<f64>), LoadError>> + '_ {
    text.lines().enumerate().filter_map(|(index, raw)| {
        let line = index + 1;
        let content = raw.split('#').next().unwrap_or_default().trim();
        if content.is_empty() {
            return None;
        }
        let values = content
            .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
            .filter(|token| !token.is_empty())
            .map(|token| {
                token
                    .parse::<f64>()
                    .ok()
                    .filter(|value| value.is_finite())
                    .ok_or_else(|| LoadError::Parse {
                        line,
                        message: format!("无法解析数值 `{token}`"),
                    })
            })
            .collect::<Result<Vec<f64>, LoadError>>();
        Some(values.map(|values| (line, values)))
    })
}

fn arity_error(line: usize, found: usize, expected: &str) -> LoadError {
    LoadError::Parse {
        line,
        message: format!("需要 {expected} 个数值，实际 {found} 个"),
    }
}

/// 解析 `x y [z]` 点列表。
pub fn parse_points(text: &str) -> Result<Vec<ProjectedPoint>, LoadError> {
    let mut points = Vec::new();
    for record in records(text) {
        let (line, values) = record?;
        let point = match values.as_slice() {
            &[x, y] => ProjectedPoint::new(x, y),
            &[x, y, z] => ProjectedPoint::new(x, y).with_altitude(z),
            other => return Err(arity_error(line, other.len(), "2 或 3")),
        };
        points.push(point);
    }
    if points.is_empty() {
        return Err(LoadError::Empty);
    }
    Ok(points)
}

pub fn read_points(path: impl AsRef<Path>) -> Result<Vec<ProjectedPoint>, LoadError> {
    let path = path.as_ref();
    let points = parse_points(&read(path)?)?;
    debug!(path = %path.display(), count = points.len(), "已读取坐标点");
    Ok(points)
}

/// 解析 `x y [bulge]` 顶点列表为开放多段线，bulge 作用于该顶点到下一顶点的段。
pub fn parse_polyline(text: &str) -> Result<Polyline, LoadError> {
    let mut vertices = Vec::new();
    for record in records(text) {
        let (line, values) = record?;
        let vertex = match values.as_slice() {
            &[x, y] => PolylineVertex::new(Point2::new(x, y)),
            &[x, y, bulge] => PolylineVertex::with_bulge(Point2::new(x, y), bulge),
            other => return Err(arity_error(line, other.len(), "2 或 3")),
        };
        vertices.push(vertex);
    }
    if vertices.len() < 2 {
        return Err(LoadError::Empty);
    }
    Ok(Polyline::new(vertices, false))
}

pub fn read_polyline(path: impl AsRef<Path>) -> Result<Polyline, LoadError> {
    let path = path.as_ref();
    let polyline = parse_polyline(&read(path)?)?;
    debug!(
        path = %path.display(),
        vertices = polyline.vertices.len(),
        length = polyline.length(),
        "已读取多段线"
    );
    Ok(polyline)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixed_separators_and_comments() {
        let text = "# relevé chantier\n\n700000 6600000\n700100,6600050 # borne\n700200;6600100;35.5\n700300\t6600150\n";
        let points = parse_points(text).unwrap();
        assert_eq!(points.len(), 4);
        assert!((points[1].x - 700_100.0).abs() < f64::EPSILON);
        assert_eq!(points[2].altitude, Some(35.5));
        assert!((points[3].y - 6_600_150.0).abs() < f64::EPSILON);
    }

    #[test]
    fn parse_error_carries_line_number() {
        let err = parse_points("1 2\n\n3 abc\n").unwrap_err();
        match err {
            LoadError::Parse { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error {other:?}"),
        }

        let err = parse_points("1 2 3 4\n").unwrap_err();
        assert!(matches!(err, LoadError::Parse { line: 1, .. }));
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(parse_points("# rien\n\n"), Err(LoadError::Empty)));
        assert!(matches!(parse_polyline("0 0\n"), Err(LoadError::Empty)));
    }

    #[test]
    fn polyline_vertices_take_optional_bulge() {
        let polyline = parse_polyline("0 0\n10 0 1\n10 10\n").unwrap();
        assert_eq!(polyline.vertices.len(), 3);
        assert!((polyline.vertices[1].bulge - 1.0).abs() < f64::EPSILON);
        let expected = 10.0 + 5.0 * std::f64::consts::PI;
        assert!((polyline.length() - expected).abs() < 1e-9);
    }
}
