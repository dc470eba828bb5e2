use asphalte_geo::projection::{to_geodetic, to_projected, utm_zone_for};
use asphalte_geo::{Catalog, Detector, DetectorSettings, GeodeticPoint, Located, ProjectedPoint};

#[test]
fn lambert93_false_origin_round_trips() {
    let lambert93 = Catalog::builtin().find_by_code("LAMBERT93").unwrap();
    let origin = ProjectedPoint::new(700_000.0, 6_600_000.0);

    let geodetic = to_geodetic(origin, lambert93);
    assert!(geodetic.is_exact());
    assert!((geodetic.value.longitude - 3.0).abs() < 1e-9);
    assert!((geodetic.value.latitude - 46.5).abs() < 1e-9);

    let back = to_projected(geodetic.value, lambert93).value;
    assert!((back.x - origin.x).abs() < 1e-6);
    assert!((back.y - origin.y).abs() < 1e-6);
}

#[test]
fn paris_in_lambert93() {
    // Notre-Dame de Paris，RGF93 / Lambert-93 约 (652 200, 6 861 700)
    let lambert93 = Catalog::builtin().find_by_code("LAMBERT93").unwrap();
    let projected = to_projected(GeodeticPoint::new(2.3499, 48.8530), lambert93).value;
    assert!((projected.x - 652_200.0).abs() < 500.0, "x={}", projected.x);
    assert!((projected.y - 6_861_700.0).abs() < 500.0, "y={}", projected.y);
    assert!(Located::new(projected, lambert93).is_within_bounds());
}

#[test]
fn detect_two_lambert93_points() {
    let detector = Detector::new(Catalog::builtin(), DetectorSettings::default());
    let points = [
        ProjectedPoint::new(700_000.0, 6_600_000.0),
        ProjectedPoint::new(700_100.0, 6_600_050.0),
    ];
    let definition = detector.detect(&points).expect("应识别为 Lambert-93");
    assert_eq!(definition.code(), "LAMBERT93");
    assert_eq!(definition.epsg(), Some(2154));
}

#[test]
fn detected_definition_converts_the_cloud() {
    let catalog = Catalog::builtin();
    let detector = Detector::new(catalog, DetectorSettings::default());
    let points = [
        ProjectedPoint::new(0.0, 0.0),
        ProjectedPoint::new(155_000.0, 463_000.0),
        ProjectedPoint::new(155_200.0, 463_100.0),
    ];
    let rd = detector.detect(&points).unwrap();
    assert_eq!(rd.code(), "RDNEW");
    let amersfoort = to_geodetic(points[1], rd).value;
    assert!((amersfoort.longitude - 5.387).abs() < 0.01);
    assert!((amersfoort.latitude - 52.155).abs() < 0.01);
}

/// 两个 WGS84 经纬度之间的近似地面距离（m）。
fn ground_offset(a: GeodeticPoint, b: GeodeticPoint) -> (f64, f64) {
    let metres_per_degree = 111_320.0;
    let east = (a.longitude - b.longitude) * metres_per_degree * a.latitude.to_radians().cos();
    let north = (a.latitude - b.latitude) * metres_per_degree;
    (east, north)
}

#[test]
fn rd_origin_lands_on_amersfoort_in_wgs84() {
    // RDNAPTRANS 参考：RD (155 000, 463 000) → 52.1551744 N, 5.3872062 E
    let rd = Catalog::builtin().find_by_code("RDNEW").unwrap();
    let conversion = to_geodetic(ProjectedPoint::new(155_000.0, 463_000.0), rd);
    assert!(conversion.is_exact());
    let (east, north) = ground_offset(conversion.value, GeodeticPoint::new(5.387_206_2, 52.155_174_4));
    assert!(east.abs() < 1.0 && north.abs() < 1.0, "east={east} north={north}");
}

#[test]
fn belge72_and_belge2008_agree_on_the_ground() {
    // Lambert 2008 与 Lambert 72 在比利时境内仅差 (500 000, 500 000) 的平移
    let catalog = Catalog::builtin();
    let bd72 = catalog.find_by_code("BELGE72").unwrap();
    let etrs = catalog.find_by_code("BELGE2008").unwrap();
    let from_72 = to_geodetic(ProjectedPoint::new(150_000.0, 170_000.0), bd72).value;
    let from_2008 = to_geodetic(ProjectedPoint::new(650_000.0, 670_000.0), etrs).value;
    let (east, north) = ground_offset(from_72, from_2008);
    assert!(east.abs() < 1.0 && north.abs() < 1.0, "east={east} north={north}");
}

#[test]
fn utm_zone_code_resolves_in_catalog() {
    let catalog = Catalog::builtin();
    let code = utm_zone_for(2.35, 48.85);
    let utm = catalog.find_by_code(&code).unwrap();
    let projected = to_projected(GeodeticPoint::new(3.0, 0.0), utm).value;
    assert!((projected.x - 500_000.0).abs() < 1e-6);
    assert!(projected.y.abs() < 1e-6);
}
